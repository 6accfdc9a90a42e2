use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pokedex_store::StoreError;

pub const NOT_FOUND_MESSAGE: &str = "Pokemon not found";
pub const INTERNAL_MESSAGE: &str = "Internal Server Error";

/// Errors surfaced by route handlers.
///
/// Only two outcomes reach the caller for record operations: not found, or a
/// generic internal error. The cause of an internal error is logged, never
/// returned.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Pokemon not found")]
    NotFound,

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// The path identifier has no leading digits and cannot be cast to a number.
    #[error("cannot cast '{0}' to a number")]
    InvalidId(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE),
            ApiError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "Invalid JSON body"),
            ApiError::InvalidId(_) | ApiError::Store(_) | ApiError::Task(_) => {
                tracing::error!(error = %self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

/// Startup and shutdown failures of the server process.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("seed '{path}': {source}")]
    Seed {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serve: {0}")]
    Serve(#[source] std::io::Error),
}
