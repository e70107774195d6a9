//! Utility modules for common functionality.
//!
//! - constants: Defaults for paths, namespaces and addresses
//! - http: Retryable HTTP client construction
//! - logging: Logging setup and structured error context
//! - metrics: Prometheus metrics and the metrics server
//! - parsing: Parsing helpers
//! - tests: Test builders

pub mod constants;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod parsing;
pub mod tests;

pub use constants::*;
pub use http::*;
pub use parsing::*;
