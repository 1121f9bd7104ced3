//! Error types for token issuance.
//!
//! Every failure path ends in an [`IssuanceError`], which knows its stable
//! [`ErrorCode`], its HTTP status and the message that is safe to hand back
//! to a caller. Internal details stay in the `Display` impl and are only ever
//! logged.

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Failures while turning key material and claims into a signed token.
///
/// A key that fails to load keeps its error, which is returned on every
/// request.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum SigningError {
    /// The private key is not parseable PEM
    #[error("private key is not valid PEM: {reason}")]
    InvalidPem {
        /// Parser message
        reason: String,
    },

    /// PEM label we cannot sign with
    #[error("unsupported private key format '{label}'; expected PKCS#8 'PRIVATE KEY' or 'RSA PRIVATE KEY'")]
    UnsupportedKeyFormat {
        /// The PEM label found in the key
        label: String,
    },

    /// `PRIVATE KEY` body is not a DER `PrivateKeyInfo`
    #[error("malformed PKCS#8 private key: {reason}")]
    MalformedPkcs8 {
        /// Decoder message
        reason: String,
    },

    /// PKCS#8 key whose algorithm is neither EC (P-256/P-384) nor RSA
    #[error("unsupported private key type")]
    UnsupportedKeyType,

    /// The configured algorithm cannot be used with this key
    #[error("algorithm {algorithm} does not match the configured key type")]
    AlgorithmMismatch {
        /// Algorithm that was requested
        algorithm: &'static str,
    },

    /// `jsonwebtoken` rejected the key or failed to sign
    #[error("JWT encoding error: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

impl From<pem::PemError> for SigningError {
    fn from(err: pem::PemError) -> Self {
        Self::InvalidPem {
            reason: err.to_string(),
        }
    }
}

impl From<pkcs8::Error> for SigningError {
    fn from(err: pkcs8::Error) -> Self {
        Self::MalformedPkcs8 {
            reason: err.to_string(),
        }
    }
}

/// Errors returned by the token issuer and the HTTP adapter.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum IssuanceError {
    /// Required deployment configuration is absent
    #[error("missing required configuration: {}", .missing.join(", "))]
    Configuration {
        /// Environment variable names that are missing or blank
        missing: Vec<&'static str>,
    },

    /// The request did not carry a visitor id
    #[error("visitorId is required")]
    MissingVisitorId,

    /// The request body could not be understood
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// What was wrong with the body
        reason: String,
    },

    /// The endpoint was called with an unsupported verb
    #[error("method {method} not allowed")]
    MethodNotAllowed {
        /// The method that was used
        method: String,
        /// Value for the `Allow` response header
        allow: &'static str,
    },

    /// Signing failed
    #[error("token signing failed: {0}")]
    Signing(#[from] SigningError),
}

/// Stable error codes for responses and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Required configuration missing
    ConfigurationError,
    /// No usable `visitorId` in the body
    VisitorIdRequired,
    /// Body could not be parsed
    InvalidRequest,
    /// Verb not accepted on the token route
    MethodNotAllowed,
    /// Key loading or signing failed
    SigningFailed,
}

impl ErrorCode {
    /// Get the string representation of the error code
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigurationError => "SERVER_CONFIGURATION_ERROR",
            Self::VisitorIdRequired => "VISITOR_ID_REQUIRED",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::SigningFailed => "TOKEN_SIGNING_FAILED",
        }
    }

    /// HTTP status for this error
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::ConfigurationError | Self::SigningFailed => StatusCode::INTERNAL_SERVER_ERROR,
            Self::VisitorIdRequired | Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Whether the failure is on the server side
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::ConfigurationError | Self::SigningFailed)
    }
}

impl IssuanceError {
    /// Shorthand for an [`IssuanceError::InvalidRequest`].
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Get the error code for this error
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration { .. } => ErrorCode::ConfigurationError,
            Self::MissingVisitorId => ErrorCode::VisitorIdRequired,
            Self::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            Self::MethodNotAllowed { .. } => ErrorCode::MethodNotAllowed,
            Self::Signing(_) => ErrorCode::SigningFailed,
        }
    }

    /// HTTP status for this error
    pub const fn status(&self) -> StatusCode {
        self.code().status()
    }

    /// Message that may be returned to the caller.
    ///
    /// Server-side failures collapse to fixed strings; client errors keep
    /// their reason after sanitization.
    pub fn public_message(&self) -> String {
        match self {
            Self::Configuration { .. } => "Server configuration error.".to_string(),
            Self::MissingVisitorId => "visitorId is required.".to_string(),
            Self::InvalidRequest { reason } => sanitize_message(reason),
            Self::MethodNotAllowed { .. } => "Method not allowed.".to_string(),
            Self::Signing(_) => "Failed to generate authentication token.".to_string(),
        }
    }
}

/// JSON error body: `{ "error": "<message>" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// Client-safe message
    pub error: String,
}

impl From<&IssuanceError> for ErrorResponse {
    fn from(err: &IssuanceError) -> Self {
        Self {
            error: err.public_message(),
        }
    }
}

/// Patterns that must never be echoed back in a client message
const SENSITIVE_PATTERNS: &[&str] = &["private", "secret", "-----begin", "key", "credential"];

fn sanitize_message(message: &str) -> String {
    if contains_sensitive_info(message) {
        return "Invalid request body.".to_string();
    }
    message.to_string()
}

/// Check if a string mentions key material or secrets.
pub fn contains_sensitive_info(text: &str) -> bool {
    let lower = text.to_lowercase();
    SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
}
