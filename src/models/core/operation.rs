use alloy::primitives::{Address, B256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Semantic kind of a classified router call.
///
/// The numeric codes are what gets persisted in the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OperationKind {
	AddLiquidity = 1,
	RemoveLiquidity = 2,
	Swap = 3,
}

impl OperationKind {
	/// Persisted integer code.
	pub fn code(self) -> u8 {
		self as u8
	}

	/// Looks up a kind from its persisted code.
	pub fn from_code(code: u8) -> Option<Self> {
		match code {
			1 => Some(Self::AddLiquidity),
			2 => Some(Self::RemoveLiquidity),
			3 => Some(Self::Swap),
			_ => None,
		}
	}

	/// Lowercase label used for metrics and logs.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::AddLiquidity => "add_liquidity",
			Self::RemoveLiquidity => "remove_liquidity",
			Self::Swap => "swap",
		}
	}
}

impl fmt::Display for OperationKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for OperationKind {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u8(self.code())
	}
}

impl<'de> Deserialize<'de> for OperationKind {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let code = u8::deserialize(deserializer)?;
		Self::from_code(code).ok_or_else(|| {
			serde::de::Error::custom(format!("unknown operation type code: {}", code))
		})
	}
}

/// One classified router call, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderOperation {
	/// Recovered signer of the transaction
	pub from: Address,
	/// Router the call was addressed to
	pub to: Address,
	pub tx_hash: B256,
	pub chain_id: u64,
	pub block_number: u64,
	/// Block timestamp in seconds
	pub block_time: u64,
	#[serde(rename = "type")]
	pub kind: OperationKind,
}
