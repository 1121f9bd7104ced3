//! Direct ID token service library.
//!
//! Mints short-lived JWTs that the customer-engagement platform uses to
//! verify a visitor's identity: claim construction, key handling and
//! signing, plus the HTTP adapter that exposes them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod http;
pub mod issuer;
pub mod jwt;
pub mod metrics;
pub mod shutdown;

// Re-exports for convenience
pub use config::{Config, DirectIdConfig};
pub use error::{IssuanceError, SigningError};
pub use issuer::{IssueRequest, SignedToken, TokenIssuer, issue_token};
