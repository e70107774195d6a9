//! Sender recovery for EVM transactions.
//!
//! The transaction JSON returned by the node is re-read as a signed envelope (legacy,
//! EIP-2930, EIP-1559, EIP-4844 or EIP-7702) and the secp256k1 signer is recovered from the
//! signature. The node-reported `from` field is never trusted.

use alloy::{
	consensus::{transaction::SignerRecoverable, TxEnvelope},
	primitives::Address,
};
use std::collections::HashMap;

use crate::{models::EvmTransaction, services::blockchain::BlockChainError};

pub fn recover_signer(transaction: &EvmTransaction) -> Result<Address, BlockChainError> {
	let metadata = || {
		Some(HashMap::from([(
			"tx_hash".to_string(),
			transaction.hash.to_string(),
		)]))
	};

	let value = serde_json::to_value(transaction).map_err(|e| {
		BlockChainError::recovery_error(
			"Failed to serialize transaction",
			Some(Box::new(e)),
			metadata(),
		)
	})?;

	let envelope: TxEnvelope = serde_json::from_value(value).map_err(|e| {
		BlockChainError::recovery_error(
			"Malformed signed transaction",
			Some(Box::new(e)),
			metadata(),
		)
	})?;

	envelope.recover_signer().map_err(|e| {
		BlockChainError::recovery_error(
			"Invalid transaction signature",
			Some(Box::new(e)),
			metadata(),
		)
	})
}
