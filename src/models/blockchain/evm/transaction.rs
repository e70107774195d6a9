//! EVM transaction view.
//!
//! Only the fields used for classification are typed. Everything else the node returned
//! (signature, nonce, gas fields, type) is kept in `extra` so the signed envelope can be
//! rebuilt for sender recovery.

use alloy::primitives::{Address, Bytes, B256, U64};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Transaction {
	/// Hash
	#[serde(default)]
	pub hash: B256,
	/// Sender as reported by the node. Not trusted; the signer is recovered instead.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub from: Option<Address>,
	/// Recipient (None when contract creation)
	#[serde(default)]
	pub to: Option<Address>,
	/// Call data
	#[serde(default)]
	pub input: Bytes,
	/// Chain id (absent for pre EIP-155 legacy transactions)
	#[serde(rename = "chainId", default, skip_serializing_if = "Option::is_none")]
	pub chain_id: Option<U64>,
	/// Remaining fields, untouched
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Transaction {
	/// First four bytes of the call data, if present.
	pub fn selector(&self) -> Option<[u8; 4]> {
		self.input.get(..4).and_then(|s| s.try_into().ok())
	}

	/// Whether the transaction targets `router`.
	pub fn is_addressed_to(&self, router: &Address) -> bool {
		self.to.as_ref() == Some(router)
	}

	pub fn chain_id(&self) -> Option<u64> {
		self.chain_id.map(|id| id.to::<u64>())
	}
}
