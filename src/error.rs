use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Geocoding returned something other than a hit; `status` is shown to the user.
    #[error("Geocode was not successful for the following reason: {status}")]
    Geocode { status: String },
    #[error("unknown marker {0}")]
    UnknownMarker(usize),
    #[error("preference store error: {0}")]
    Preferences(#[from] sqlx::Error),
    #[error("template error: {0}")]
    Template(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Geocode { .. } => (StatusCode::BAD_GATEWAY, axum::Json(json!({ "alert": self.to_string() }))).into_response(),
            AppError::UnknownMarker(_) => (StatusCode::NOT_FOUND, self.to_string()).into_response(),
            AppError::Preferences(_) | AppError::Template(_) => {
                tracing::error!("{}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
        }
    }
}
