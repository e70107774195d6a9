use serde::{Deserialize, Serialize};

/// Default backoff between two attempts to fetch the same block.
const DEFAULT_FETCH_RETRY_MS: u64 = 1000;

/// Watch configuration for a single EVM chain.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
	/// Human-readable name of the chain
	pub name: String,

	/// Unique identifier used in logs, metrics and file names
	pub slug: String,

	/// EVM chain id, also used as the checkpoint key
	pub chain_id: u64,

	/// RPC endpoints with their weights for endpoint selection
	pub rpc_urls: Vec<RpcUrl>,

	/// Router contract whose inbound calls are classified
	pub router_address: String,

	/// Expected block production interval in milliseconds
	pub block_time_ms: u64,

	/// Timing slack subtracted from the block interval when pacing
	#[serde(default)]
	pub deviation_ms: u64,

	/// Block to (re)start from when it is ahead of the stored checkpoint
	#[serde(default)]
	pub start_block: Option<u64>,

	/// Backoff after a failed block fetch
	#[serde(default)]
	pub fetch_retry_ms: Option<u64>,
}

impl ChainConfig {
	/// Backoff applied after a failed fetch, falling back to one second.
	pub fn fetch_retry_ms(&self) -> u64 {
		self.fetch_retry_ms.unwrap_or(DEFAULT_FETCH_RETRY_MS)
	}
}

/// RPC endpoint with a selection weight
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RpcUrl {
	/// Type of endpoint, only "rpc" is supported
	pub type_: String,

	/// Endpoint URL
	pub url: String,

	/// Weight (0-100); zero-weight endpoints are never used
	pub weight: u32,
}
