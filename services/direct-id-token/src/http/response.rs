//! Response bodies and error-to-response mapping.

use axum::Json;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::{ErrorResponse, IssuanceError};
use crate::metrics;

/// Successful issuance: `{ "token": "<jwt>" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed compact JWT
    pub token: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests
    pub status: String,
    /// Whether every required Direct ID variable is set
    pub configured: bool,
}

impl IntoResponse for IssuanceError {
    fn into_response(self) -> Response {
        let code = self.code();
        if code.is_server_error() {
            error!(error_code = code.as_str(), error = %self, "Token issuance failed");
        } else {
            warn!(error_code = code.as_str(), error = %self, "Token request rejected");
        }
        metrics::record_issuance_failure(code.as_str());

        let status = self.status();
        let body = Json(ErrorResponse::from(&self));
        match self {
            Self::MethodNotAllowed { allow, .. } => {
                (status, [(header::ALLOW, allow)], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}
