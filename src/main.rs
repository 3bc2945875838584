use std::sync::Arc;

use axum::http::{header::{ACCEPT, CONTENT_TYPE}, Method};
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;

use turnstatus::{
    config::Config,
    db::{db::DBClient, turndb::{OfflineTurnStore, TurnExt}},
    routes::create_router,
    service::{ticket_fetcher::TicketFetcher, turn_service::TurnService},
    AppState,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = Config::init();

    let store: Arc<dyn TurnExt> = match &config.database_url {
        Some(database_url) => match PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                info!("Connection to the database is successful");
                Arc::new(DBClient::new(pool))
            }
            Err(err) => {
                error!("Failed to connect to the database: {:?}", err);
                std::process::exit(1);
            }
        },
        None => {
            warn!("DATABASE_URL is not set, every lookup will report the store as unavailable");
            Arc::new(OfflineTurnStore)
        }
    };

    let fetcher = TicketFetcher::new(store, config.schema_mappings())
        .with_query_timeout(config.fetch_timeout);
    let turn_service = TurnService::new(fetcher, config.poll_settings());

    // Kept alive for the lifetime of the server.
    let _watch = config.watch_ticket_code.as_deref().map(|code| {
        info!(code, "watching ticket");
        turn_service.start_polling(
            code,
            |view| {
                info!(
                    code = %view.number,
                    status = view.status.to_str(),
                    tier = view.tier.to_str(),
                    wait_minutes = view.wait_minutes,
                    appointment = %view.appointment_time,
                    "{}",
                    view.headline()
                );
            },
            |failure| {
                warn!(
                    reason = ?failure.reason(),
                    consecutive = failure.consecutive_failures,
                    persistent = failure.persistent,
                    "{}",
                    failure.error.user_message()
                );
            },
        )
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .allow_methods([Method::GET]);

    let app_state = AppState {
        env: config.clone(),
        turn_service,
    };

    let app = create_router(Arc::new(app_state)).layer(cors);

    info!("Server is running on http://localhost:{}", config.port);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Failed to bind port {}: {:?}", config.port, err);
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).await {
        error!("Server error: {:?}", err);
    }
}
