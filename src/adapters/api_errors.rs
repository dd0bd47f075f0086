use crate::domain::error::SessionError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Session error rendered as a static message plus one recovery action.
pub struct ApiError {
    pub error: SessionError,
    pub return_to: Arc<str>,
}

impl ApiError {
    pub fn new(error: SessionError, return_to: Arc<str>) -> Self {
        Self { error, return_to }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.error {
            SessionError::MissingIdentifier => (StatusCode::BAD_REQUEST, "missing_identifier"),
            SessionError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            SessionError::DetailsFetch(_) => (StatusCode::BAD_GATEWAY, "details_unavailable"),
            SessionError::StatusFetch(err) => {
                tracing::error!("status fetch error: {err}");
                (StatusCode::BAD_GATEWAY, "status_unavailable")
            }
            SessionError::Http(err) => {
                tracing::error!("upstream http error: {err}");
                (StatusCode::BAD_GATEWAY, "upstream_error")
            }
            SessionError::Serialization(err) => {
                tracing::error!("serialization error: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            SessionError::Config(err) => {
                tracing::error!("config error: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let body = serde_json::json!({
            "error_code": error_code,
            "message": self.error.user_message(),
            "action": {
                "label": "Return to Shop",
                "href": &*self.return_to,
            },
        });

        (status, Json(body)).into_response()
    }
}
