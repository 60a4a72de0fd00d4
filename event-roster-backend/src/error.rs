use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use event_roster_config::ConfigError;
use event_roster_database::{Collection, DatabaseError, InvalidRecordId};
use event_roster_database::models::RecordId;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    CapacityExceeded,
    InvalidInput,
    StoreError,
}

#[derive(thiserror::Error, Debug)]
pub enum RosterError {
    #[error("{} {id} not found", .collection.noun())]
    NotFound { collection: Collection, id: RecordId },
    #[error("teacher {teacher_id} is already assigned to role {role_id} in event {event_id}")]
    Conflict {
        teacher_id: RecordId,
        role_id: RecordId,
        event_id: RecordId,
    },
    #[error("role {role_id} has reached its maximum head count of {head_count}")]
    CapacityExceeded { role_id: RecordId, head_count: u32 },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("store error: {0}")]
    Store(#[from] DatabaseError),
}

impl RosterError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Store(_) => ErrorKind::StoreError,
        }
    }

    pub(crate) const fn not_found(collection: Collection, id: RecordId) -> Self {
        Self::NotFound { collection, id }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } | Self::CapacityExceeded { .. } => StatusCode::CONFLICT,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Store(error) if error.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<InvalidRecordId> for RosterError {
    fn from(value: InvalidRecordId) -> Self {
        Self::InvalidInput(value.to_string())
    }
}

impl From<JsonRejection> for RosterError {
    fn from(value: JsonRejection) -> Self {
        Self::InvalidInput(value.body_text())
    }
}

impl IntoResponse for RosterError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (
            status,
            Json(json!({ "error": self.to_string(), "kind": self.kind() })),
        )
            .into_response()
    }
}

/// Failures while bringing the server up or down.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid log filter: {0}")]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),
    #[error("tracing setup failed: {0}")]
    Tracing(#[from] tracing_subscriber::util::TryInitError),
}
