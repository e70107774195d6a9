//! EVM block as returned by `eth_getBlockByNumber` with full transactions.

use alloy::primitives::{B256, U64};
use serde::{Deserialize, Serialize};

use super::EvmTransaction;

/// Read-only block view. Fields the watcher does not need are ignored on deserialization.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Block {
	/// Block number. None if pending.
	pub number: Option<U64>,
	/// Hash of the block. None if pending.
	#[serde(default)]
	pub hash: Option<B256>,
	/// Unix timestamp in seconds
	pub timestamp: U64,
	/// Transactions in block order
	#[serde(default)]
	pub transactions: Vec<EvmTransaction>,
}

impl Block {
	pub fn number(&self) -> Option<u64> {
		self.number.map(|n| n.to::<u64>())
	}

	/// Block time in seconds.
	pub fn timestamp(&self) -> u64 {
		self.timestamp.to::<u64>()
	}
}
