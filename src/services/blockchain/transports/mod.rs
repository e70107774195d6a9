//! JSON-RPC transport over HTTP with weighted endpoint failover.

mod endpoint_manager;
mod error;
mod http;

pub use endpoint_manager::EndpointManager;
pub use error::TransportError;
pub use http::HttpTransportClient;

use reqwest_retry::{default_on_request_failure, default_on_request_success, Retryable, RetryableStrategy};
use serde_json::Value;

/// HTTP status codes that trigger RPC endpoint rotation
/// - 429: Too Many Requests - indicates rate limiting from the current endpoint
pub const ROTATE_ON_ERROR_CODES: [u16; 1] = [429];

/// Sends JSON-RPC requests to a chain node
#[async_trait::async_trait]
pub trait BlockchainTransport: Send + Sync {
	/// URL requests are currently sent to
	async fn get_current_url(&self) -> String;

	/// Sends `method` with `params` (defaults to `[]`) and returns the full JSON-RPC response
	async fn send_raw_request(
		&self,
		method: &str,
		params: Option<Value>,
	) -> Result<Value, TransportError>;
}

/// Retry classification for RPC requests.
///
/// Rate limiting is not retried in place; it is left to the endpoint manager, which
/// rotates to another endpoint instead.
pub struct TransientErrorRetryStrategy;

impl RetryableStrategy for TransientErrorRetryStrategy {
	fn handle(
		&self,
		res: &Result<reqwest::Response, reqwest_middleware::Error>,
	) -> Option<Retryable> {
		match res {
			Ok(response) if ROTATE_ON_ERROR_CODES.contains(&response.status().as_u16()) => {
				Some(Retryable::Fatal)
			}
			Ok(success) => default_on_request_success(success),
			Err(error) => default_on_request_failure(error),
		}
	}
}
