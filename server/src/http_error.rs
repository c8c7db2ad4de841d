use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Error half of the wire contract: failed requests answer with HTTP 200
/// and `{"status": "error", "message": ...}`, because the pages look at the
/// status field in the body, not at the HTTP status code.
#[derive(Debug)]
pub struct ApiError(eyre::Error);

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            Json(ErrorBody {
                status: "error",
                message: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

impl ApiError {
    pub fn message(message: impl Into<String>) -> ApiError {
        ApiError(eyre::eyre!(message.into()))
    }
}

macro_rules! impl_from {
    ($from:ty) => {
        impl From<$from> for ApiError {
            fn from(err: $from) -> Self {
                Self(err.into())
            }
        }
    };
}

impl_from!(std::io::Error);
impl_from!(color_eyre::Report);
impl_from!(grabtube_core::error::ExtractError);

pub type ApiResult<T> = Result<T, ApiError>;

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
