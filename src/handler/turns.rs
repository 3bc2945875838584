// handler/turns.rs
use std::sync::Arc;

use axum::{extract::Path, response::IntoResponse, routing::get, Extension, Json, Router};
use tracing::warn;
use validator::Validate;

use crate::{
    dtos::turndtos::*,
    error::{ErrorMessage, HttpError},
    models::turnmodel::TicketViewModel,
    service::error::{ErrorReason, ResolutionError},
    AppState,
};

pub fn turns_handler() -> Router {
    Router::new()
        .route("/now-serving", get(get_now_serving))
        .route("/:code", get(get_turn))
}

pub async fn get_turn(
    Path(code): Path<String>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let body = TicketCodeDto::new(&code);
    body.validate()
        .map_err(|_| HttpError::bad_request(ErrorMessage::EmptyTicketCode.to_string()))?;

    let view = app_state
        .turn_service
        .resolve_ticket(&body.code)
        .await
        .map_err(|e| log_failure(&body.code, e))?;

    Ok(Json(turn_response(&app_state, &view)))
}

pub async fn get_now_serving(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let view = app_state
        .turn_service
        .resolve_now_serving()
        .await
        .map_err(|e| log_failure("now-serving", e))?;

    Ok(Json(turn_response(&app_state, &view)))
}

fn turn_response(app_state: &AppState, view: &TicketViewModel) -> TurnResponseDto {
    TurnResponseDto {
        status: "success".to_string(),
        data: TurnData {
            turn: FilterTurnDto::filter_turn(view, &app_state.env.display_offset),
        },
    }
}

fn log_failure(code: &str, error: ResolutionError) -> HttpError {
    if error.reason() == ErrorReason::Connection {
        warn!(code, error = %error, "ticket store unavailable");
    }
    error.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        db::memorydb::MemoryTurnStore,
        models::schemamodel::SchemaGeneration,
        routes::create_router,
        service::{ticket_fetcher::TicketFetcher, turn_service::TurnService},
    };
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(store: Arc<MemoryTurnStore>) -> Router {
        let env = Config::from_lookup(|key| match key {
            "DISPLAY_UTC_OFFSET_MINUTES" => Some("-300".to_string()),
            _ => None,
        });
        let fetcher = TicketFetcher::new(store, env.schema_mappings());
        let turn_service = TurnService::new(fetcher, env.poll_settings());
        create_router(Arc::new(AppState { env, turn_service }))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn returns_resolved_turn() {
        let store = Arc::new(MemoryTurnStore::new());
        store.insert(
            SchemaGeneration::Current,
            json!({
                "numero": "A-121",
                "estado": "en_espera",
                "tiempo_espera": 1860,
                "fecha_creacion": "2024-05-02T14:40:00Z",
                "categorias": {"nombre": "Caja", "tiempo_promedio": 300}
            }),
        );

        let (status, body) = get_json(app(store), "/api/turns/A-121").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        let turn = &body["data"]["turn"];
        assert_eq!(turn["number"], "A-121");
        assert_eq!(turn["waitMinutes"], 31);
        assert_eq!(turn["tier"], "normal");
        assert_eq!(turn["appointmentTime"], "2024-05-02T15:11:00+00:00");
        assert_eq!(turn["appointmentClock"], "10:11");
        assert_eq!(turn["categoryName"], "Caja");
    }

    #[tokio::test]
    async fn unknown_code_is_404_with_user_message() {
        let store = Arc::new(MemoryTurnStore::new());
        let (status, body) = get_json(app(store), "/api/turns/Z-999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "fail");
        assert_eq!(body["message"], ResolutionError::NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn store_failure_is_503() {
        let store = Arc::new(MemoryTurnStore::new());
        store.set_failing(true);
        let (status, body) = get_json(app(store), "/api/turns/A-1").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["message"], ResolutionError::CONNECTION_MESSAGE);
    }

    #[tokio::test]
    async fn blank_code_is_bad_request() {
        let store = Arc::new(MemoryTurnStore::new());
        let (status, body) = get_json(app(store.clone()), "/api/turns/%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], ErrorMessage::EmptyTicketCode.to_string());
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn long_codes_are_looked_up() {
        let code = "Z".repeat(70);
        let store = Arc::new(MemoryTurnStore::new());
        store.insert(
            SchemaGeneration::Current,
            json!({"numero": &code, "estado": "emitido"}),
        );

        let (status, body) = get_json(app(store), &format!("/api/turns/{code}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["turn"]["number"], code.as_str());
    }

    #[tokio::test]
    async fn now_serving_route_is_not_a_ticket_code() {
        let store = Arc::new(MemoryTurnStore::new());
        store.insert(
            SchemaGeneration::Legacy,
            json!({"number": "7", "status": "current", "tiempo_espera": 5}),
        );

        let (status, body) = get_json(app(store), "/api/turns/now-serving").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["turn"]["number"], "7");
        assert_eq!(body["data"]["turn"]["status"], "unknown");
    }
}
