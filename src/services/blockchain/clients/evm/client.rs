//! EVM JSON-RPC client.

use alloy::primitives::Address;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::instrument;

use crate::{
	models::{ChainConfig, EvmBlock, EvmTransaction},
	services::blockchain::{
		client::ChainClient,
		clients::recover_signer,
		transports::{BlockchainTransport, HttpTransportClient},
		BlockChainError,
	},
};

/// Client for EVM-compatible chains over any [`BlockchainTransport`].
#[derive(Clone)]
pub struct EvmClient<T: Send + Sync + Clone> {
	transport: T,
}

impl<T: Send + Sync + Clone> EvmClient<T> {
	pub fn new_with_transport(transport: T) -> Self {
		Self { transport }
	}
}

impl EvmClient<HttpTransportClient> {
	/// Creates a client for `chain` over HTTP.
	pub fn new(chain: &ChainConfig) -> Result<Self, BlockChainError> {
		let transport = HttpTransportClient::new(chain).map_err(|e| {
			BlockChainError::internal_error(
				"Failed to create HTTP transport",
				Some(Box::new(e)),
				Some(HashMap::from([("chain".to_string(), chain.slug.clone())])),
			)
		})?;
		Ok(Self::new_with_transport(transport))
	}
}

fn parse_hex_u64(value: &Value, field: &str) -> Result<u64, BlockChainError> {
	let hex_str = value.as_str().ok_or_else(|| {
		BlockChainError::request_error(format!("'{}' is not a hex string", field), None, None)
	})?;
	u64::from_str_radix(hex_str.trim_start_matches("0x"), 16).map_err(|e| {
		BlockChainError::request_error(
			format!("Failed to parse {}", field),
			Some(Box::new(e)),
			Some(HashMap::from([("value".to_string(), hex_str.to_string())])),
		)
	})
}

impl<T: Send + Sync + Clone + BlockchainTransport> EvmClient<T> {
	/// Sends a request and returns its `result`, mapping JSON-RPC error objects.
	async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, BlockChainError> {
		let mut response = self
			.transport
			.send_raw_request(method, params)
			.await
			.map_err(|e| {
				BlockChainError::connection_error(
					format!("Failed to call {}", method),
					Some(Box::new(e)),
					None,
				)
			})?;

		if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
			let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
			let message = error
				.get("message")
				.and_then(Value::as_str)
				.unwrap_or("unknown error");
			return Err(BlockChainError::request_error(
				format!("{} returned error {}: {}", method, code, message),
				None,
				None,
			));
		}

		response
			.get_mut("result")
			.map(Value::take)
			.ok_or_else(|| {
				BlockChainError::request_error(
					format!("Missing 'result' field in {} response", method),
					None,
					None,
				)
			})
	}
}

#[async_trait]
impl<T: Send + Sync + Clone + BlockchainTransport> ChainClient for EvmClient<T> {
	#[instrument(skip(self))]
	async fn get_chain_id(&self) -> Result<u64, BlockChainError> {
		let result = self.request("eth_chainId", None).await?;
		parse_hex_u64(&result, "chain id")
	}

	#[instrument(skip(self))]
	async fn get_block_by_number(&self, number: Option<u64>) -> Result<EvmBlock, BlockChainError> {
		let tag = number.map_or_else(|| "latest".to_string(), |n| format!("0x{:x}", n));
		let result = self
			.request("eth_getBlockByNumber", Some(json!([tag, true])))
			.await?;

		if result.is_null() {
			return Err(BlockChainError::block_not_found(
				"Block not found",
				None,
				Some(HashMap::from([("block".to_string(), tag)])),
			));
		}

		serde_json::from_value(result).map_err(|e| {
			BlockChainError::request_error(
				"Failed to parse block",
				Some(Box::new(e)),
				Some(HashMap::from([("block".to_string(), tag)])),
			)
		})
	}

	fn recover_sender(&self, transaction: &EvmTransaction) -> Result<Address, BlockChainError> {
		recover_signer(transaction)
	}
}
