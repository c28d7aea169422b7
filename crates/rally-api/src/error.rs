use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use rally_core::RegistryError;

/// Wrapper mapping core errors onto HTTP responses. The JSON body carries a
/// stable `error` code so the client can explain *why* an action failed —
/// "event full" and "already registered" get different messages.
pub struct ApiError(pub RegistryError);

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RegistryError::CapacityExceeded
            | RegistryError::TeamFull
            | RegistryError::AlreadyRegistered
            | RegistryError::AlreadyMember
            | RegistryError::InvalidTransition { .. }
            | RegistryError::LeaderMustTransferOrDisband => StatusCode::CONFLICT,
            RegistryError::Forbidden(_) => StatusCode::FORBIDDEN,
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::Store(e) => {
                error!("store error: {e:#}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(serde_json::json!({
            "error": self.0.code(),
            "message": self.0.to_string(),
        }));

        (status, body).into_response()
    }
}
