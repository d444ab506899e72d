use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use trove_db::DbError;
use trove_types::api::MessageResponse;

/// Handler error rendered as `{"message": ...}` with a coarse status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(MessageResponse::new(self.message))).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::InvalidArgument(msg) => Self::bad_request(msg),
            DbError::NotFound(msg) => Self::not_found(msg),
            // Uniqueness and stale-version conflicts keep the 500 status
            // clients already handle, with the explanation in the body.
            DbError::Conflict(msg) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg),
            DbError::Internal(e) => {
                error!("store error: {:#}", e);
                Self::internal()
            }
        }
    }
}

/// Malformed or mistyped request bodies keep axum's status but get the
/// usual `{"message"}` body.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}
