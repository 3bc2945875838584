use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::error::HttpError;

/// The adapter could not establish the ticket's identity.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("row is not an object")]
    NotAnObject,

    #[error("ticket code column `{0}` is missing or empty")]
    MissingCode(&'static str),

    #[error("row matches no known schema generation")]
    UnknownGeneration,
}

/// Named reason a resolution failed, as handed to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
    NotFound,
    Connection,
    Schema,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    #[error("Ticket {0} not found")]
    NotFound(String),

    #[error("Ticket store unavailable: {0}")]
    Connection(String),

    #[error("Ticket {code} has an unreadable row: {source}")]
    Schema {
        code: String,
        #[source]
        source: SchemaError,
    },
}

impl ResolutionError {
    pub const NOT_FOUND_MESSAGE: &'static str =
        "Ticket not found. Check the code or scan your QR again.";
    pub const CONNECTION_MESSAGE: &'static str =
        "We cannot reach the turn system right now. Retrying shortly.";

    pub fn reason(&self) -> ErrorReason {
        match self {
            ResolutionError::NotFound(_) => ErrorReason::NotFound,
            ResolutionError::Connection(_) => ErrorReason::Connection,
            ResolutionError::Schema { .. } => ErrorReason::Schema,
        }
    }

    /// Text safe to show the ticket holder. Schema details never leave the service.
    pub fn user_message(&self) -> &'static str {
        match self {
            ResolutionError::NotFound(_) | ResolutionError::Schema { .. } => Self::NOT_FOUND_MESSAGE,
            ResolutionError::Connection(_) => Self::CONNECTION_MESSAGE,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ResolutionError::NotFound(_) | ResolutionError::Schema { .. } => StatusCode::NOT_FOUND,
            ResolutionError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<sqlx::Error> for ResolutionError {
    fn from(err: sqlx::Error) -> Self {
        ResolutionError::Connection(err.to_string())
    }
}

impl From<ResolutionError> for HttpError {
    fn from(error: ResolutionError) -> Self {
        HttpError::new(error.user_message(), error.status_code())
    }
}
