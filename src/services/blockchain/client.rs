//! Chain client interface consumed by the watcher.

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::{
	models::{EvmBlock, EvmTransaction},
	services::blockchain::BlockChainError,
};

/// Read access to one chain plus sender recovery.
#[async_trait]
pub trait ChainClient: Send + Sync {
	/// Chain id reported by the node
	async fn get_chain_id(&self) -> Result<u64, BlockChainError>;

	/// Fetches a block with full transactions; `None` requests the latest block.
	///
	/// A block that does not exist yet is reported as [`BlockChainError::BlockNotFound`].
	async fn get_block_by_number(&self, number: Option<u64>) -> Result<EvmBlock, BlockChainError>;

	/// Recovers the signer of `transaction` from its signature.
	///
	/// Malformed or unsupported signature data yields [`BlockChainError::RecoveryError`].
	fn recover_sender(&self, transaction: &EvmTransaction) -> Result<Address, BlockChainError>;
}
