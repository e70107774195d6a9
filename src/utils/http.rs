//! Retryable HTTP client construction shared by the JSON-RPC transport.

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
	policies::ExponentialBackoff, Jitter, RetryTransientMiddleware, RetryableStrategy,
};
use std::time::Duration;

/// In-place retry policy for one RPC endpoint.
///
/// Retries happen before the endpoint manager gives up on the endpoint and rotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
	/// Retries after the first attempt; zero disables retrying
	pub max_retries: u32,
	/// Growth factor of the exponential backoff
	pub backoff_base: u32,
	pub initial_backoff: Duration,
	pub max_backoff: Duration,
	/// Randomise every wait between zero and the computed backoff
	pub full_jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_retries: 3,
			backoff_base: 2,
			initial_backoff: Duration::from_millis(250),
			max_backoff: Duration::from_secs(10),
			full_jitter: true,
		}
	}
}

/// Wraps `base_client` with exponential-backoff retries.
///
/// `custom_strategy` decides which responses count as transient; without it the
/// `reqwest-retry` default classification is used.
pub fn create_retryable_http_client<S>(
	config: &RetryConfig,
	base_client: reqwest::Client,
	custom_strategy: Option<S>,
) -> ClientWithMiddleware
where
	S: RetryableStrategy + Send + Sync + 'static,
{
	let jitter = if config.full_jitter {
		Jitter::Full
	} else {
		Jitter::None
	};
	let retry_policy = ExponentialBackoff::builder()
		.jitter(jitter)
		.base(config.backoff_base)
		.retry_bounds(config.initial_backoff, config.max_backoff)
		.build_with_max_retries(config.max_retries);

	let builder = ClientBuilder::new(base_client);
	match custom_strategy {
		Some(strategy) => builder.with(RetryTransientMiddleware::new_with_policy_and_strategy(
			retry_policy,
			strategy,
		)),
		None => builder.with(RetryTransientMiddleware::new_with_policy(retry_policy)),
	}
	.build()
}
