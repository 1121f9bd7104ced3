//! Shared library for cross-cutting concerns in the Direct ID Rust services.
//!
//! Currently provides structured logging setup driven by environment
//! variables.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod tracing_config;

pub use tracing_config::{LogFormat, TracingConfig, init_tracing};
