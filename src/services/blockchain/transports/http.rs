//! HTTP JSON-RPC transport.
//!
//! Endpoints come from the chain configuration: zero-weight entries are dropped, the rest are
//! ordered by descending weight. The heaviest becomes the active endpoint and the others
//! are fallbacks for [`EndpointManager`].

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;
use std::{collections::HashMap, time::Duration};
use url::Url;

use crate::{
	models::ChainConfig,
	services::blockchain::transports::{
		BlockchainTransport, EndpointManager, TransientErrorRetryStrategy, TransportError,
	},
	utils::http::{create_retryable_http_client, RetryConfig},
};

#[derive(Clone, Debug)]
pub struct HttpTransportClient {
	endpoint_manager: EndpointManager,
}

impl HttpTransportClient {
	/// Builds a transport for `chain` with the default retry policy.
	pub fn new(chain: &ChainConfig) -> Result<Self, TransportError> {
		let base_client = reqwest::ClientBuilder::new()
			.pool_idle_timeout(Duration::from_secs(90))
			.pool_max_idle_per_host(32)
			.timeout(Duration::from_secs(30))
			.connect_timeout(Duration::from_secs(20))
			.build()
			.map_err(|e| {
				TransportError::config(
					"Failed to create base HTTP client",
					Some(Box::new(e)),
					None,
				)
			})?;

		let client = create_retryable_http_client(
			&RetryConfig::default(),
			base_client,
			Some(TransientErrorRetryStrategy),
		);

		Self::new_with_client(chain, client)
	}

	/// Builds a transport for `chain` on top of an existing client.
	pub fn new_with_client(
		chain: &ChainConfig,
		client: ClientWithMiddleware,
	) -> Result<Self, TransportError> {
		let urls = ordered_endpoints(chain);

		let Some((active, fallbacks)) = urls.split_first() else {
			return Err(TransportError::config(
				"No usable RPC URL configured",
				None,
				Some(HashMap::from([("chain".to_string(), chain.slug.clone())])),
			));
		};

		Ok(Self {
			endpoint_manager: EndpointManager::new(client, active, fallbacks.to_vec()),
		})
	}
}

/// Valid `rpc` endpoints with a positive weight, heaviest first.
fn ordered_endpoints(chain: &ChainConfig) -> Vec<String> {
	let mut rpc_urls: Vec<_> = chain
		.rpc_urls
		.iter()
		.filter(|rpc_url| rpc_url.type_ == "rpc" && rpc_url.weight > 0)
		.filter(|rpc_url| Url::parse(&rpc_url.url).is_ok())
		.collect();

	// Stable sort keeps file order between equal weights
	rpc_urls.sort_by(|a, b| b.weight.cmp(&a.weight));

	rpc_urls
		.into_iter()
		.map(|rpc_url| rpc_url.url.trim_end_matches('/').to_string())
		.collect()
}

#[async_trait]
impl BlockchainTransport for HttpTransportClient {
	async fn get_current_url(&self) -> String {
		self.endpoint_manager.active_url.read().await.clone()
	}

	async fn send_raw_request(
		&self,
		method: &str,
		params: Option<Value>,
	) -> Result<Value, TransportError> {
		self.endpoint_manager.send_raw_request(method, params).await
	}
}
