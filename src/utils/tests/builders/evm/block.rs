use crate::models::{EvmBlock, EvmTransaction};
use alloy::primitives::{B256, U64};

/// A builder for creating test EVM blocks.
#[derive(Debug, Default)]
pub struct BlockBuilder {
	number: Option<u64>,
	hash: Option<B256>,
	timestamp: u64,
	transactions: Vec<EvmTransaction>,
}

impl BlockBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn number(mut self, number: u64) -> Self {
		self.number = Some(number);
		self
	}

	pub fn hash(mut self, hash: B256) -> Self {
		self.hash = Some(hash);
		self
	}

	/// Block time in seconds.
	pub fn timestamp(mut self, timestamp: u64) -> Self {
		self.timestamp = timestamp;
		self
	}

	pub fn transaction(mut self, transaction: EvmTransaction) -> Self {
		self.transactions.push(transaction);
		self
	}

	pub fn transactions(mut self, transactions: Vec<EvmTransaction>) -> Self {
		self.transactions = transactions;
		self
	}

	pub fn build(self) -> EvmBlock {
		EvmBlock {
			number: self.number.map(U64::from),
			hash: self.hash,
			timestamp: U64::from(self.timestamp),
			transactions: self.transactions,
		}
	}
}
