//! HTTP adapter.
//!
//! The token route accepts every verb and does its own dispatch so that the
//! configuration check always runs first, then the method check, then body
//! parsing.

pub mod response;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::error::IssuanceError;
use crate::issuer::{IssueRequest, TokenIssuer};
use crate::metrics;

pub use response::{HealthResponse, TokenResponse};

/// Shared, read-only handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    issuer: Arc<TokenIssuer>,
    allow_get: bool,
}

impl AppState {
    /// Create state around an issuer.
    pub const fn new(issuer: Arc<TokenIssuer>, allow_get: bool) -> Self {
        Self { issuer, allow_get }
    }

    /// Value for the `Allow` header on 405 responses.
    pub const fn allow_header(&self) -> &'static str {
        if self.allow_get { "POST, GET" } else { "POST" }
    }
}

/// POST body of the token endpoint.
#[derive(Debug, Deserialize)]
struct IssueTokenBody {
    #[serde(rename = "visitorId")]
    visitor_id: Option<String>,
}

/// Build the service router.
pub fn router(state: AppState, endpoint_path: &str) -> Router {
    Router::new()
        .route(endpoint_path, any(issue_token))
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn issue_token(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> Result<Json<TokenResponse>, IssuanceError> {
    state.issuer.ensure_configured()?;

    let request = match method {
        Method::POST => IssueRequest::Visitor(parse_visitor_id(&body)?),
        Method::GET if state.allow_get => IssueRequest::Mock,
        other => {
            return Err(IssuanceError::MethodNotAllowed {
                method: other.to_string(),
                allow: state.allow_header(),
            });
        }
    };

    let signed = state.issuer.issue(&request)?;
    Ok(Json(TokenResponse {
        token: signed.token,
    }))
}

/// Extract `visitorId` from a JSON body.
fn parse_visitor_id(body: &[u8]) -> Result<String, IssuanceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(IssuanceError::MissingVisitorId);
    }

    let parsed: IssueTokenBody = serde_json::from_slice(body)
        .map_err(|e| IssuanceError::invalid_request(format!("malformed JSON body: {e}")))?;

    parsed.visitor_id.ok_or(IssuanceError::MissingVisitorId)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        configured: state.issuer.config().is_complete(),
    })
}

async fn prometheus_metrics() -> Response {
    match metrics::render() {
        Ok(text) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], text).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_visitor_id() {
        assert_eq!(parse_visitor_id(br#"{"visitorId":"abc"}"#).unwrap(), "abc");
    }

    #[test]
    fn test_parse_visitor_id_missing() {
        assert!(matches!(
            parse_visitor_id(b"").unwrap_err(),
            IssuanceError::MissingVisitorId
        ));
        assert!(matches!(
            parse_visitor_id(b"{}").unwrap_err(),
            IssuanceError::MissingVisitorId
        ));
        assert!(matches!(
            parse_visitor_id(br#"{"visitorId":null}"#).unwrap_err(),
            IssuanceError::MissingVisitorId
        ));
    }

    #[test]
    fn test_parse_visitor_id_malformed() {
        assert!(matches!(
            parse_visitor_id(b"{not json").unwrap_err(),
            IssuanceError::InvalidRequest { .. }
        ));
        assert!(matches!(
            parse_visitor_id(br#"{"visitorId":42}"#).unwrap_err(),
            IssuanceError::InvalidRequest { .. }
        ));
    }

    #[test]
    fn test_allow_header() {
        let issuer = Arc::new(TokenIssuer::new(crate::config::DirectIdConfig::new()));
        assert_eq!(AppState::new(issuer.clone(), true).allow_header(), "POST, GET");
        assert_eq!(AppState::new(issuer, false).allow_header(), "POST");
    }
}
