//! Method selector classification.
//!
//! Maps the 4-byte selector of a router call to an [`OperationKind`]. The table is plain data:
//! supply a different one through [`MethodClassifier::new`] to watch another router ABI.

use std::collections::HashMap;

use crate::{models::OperationKind, utils::normalize_hex};

/// Selectors of the Uniswap V2 style router functions that are recorded.
pub const DEFAULT_METHOD_TABLE: &[(&str, OperationKind)] = &[
	// addLiquidity, addLiquidityETH
	("e8e33700", OperationKind::AddLiquidity),
	("f305d719", OperationKind::AddLiquidity),
	// removeLiquidity, removeLiquidityETH and their permit / fee-on-transfer variants
	("baa2abde", OperationKind::RemoveLiquidity),
	("02751cec", OperationKind::RemoveLiquidity),
	("af2979eb", OperationKind::RemoveLiquidity),
	("ded9382a", OperationKind::RemoveLiquidity),
	("5b0d5984", OperationKind::RemoveLiquidity),
	("2195995c", OperationKind::RemoveLiquidity),
	// swap*: ETH/token combinations, exact in/out, fee-on-transfer
	("fb3bdb41", OperationKind::Swap),
	("7ff36ab5", OperationKind::Swap),
	("b6f9de95", OperationKind::Swap),
	("18cbafe5", OperationKind::Swap),
	("791ac947", OperationKind::Swap),
	("38ed1739", OperationKind::Swap),
	("5c11d795", OperationKind::Swap),
	("4a25d94a", OperationKind::Swap),
	("8803dbee", OperationKind::Swap),
];

/// Immutable selector lookup, shared read-only between chain watchers.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodClassifier {
	table: HashMap<String, OperationKind>,
}

impl Default for MethodClassifier {
	fn default() -> Self {
		Self::new(DEFAULT_METHOD_TABLE.iter().copied())
	}
}

impl MethodClassifier {
	/// Builds a classifier from `(selector, kind)` pairs. Selectors may carry `0x` and any case.
	pub fn new<I, S>(table: I) -> Self
	where
		I: IntoIterator<Item = (S, OperationKind)>,
		S: AsRef<str>,
	{
		Self {
			table: table
				.into_iter()
				.map(|(selector, kind)| (normalize_hex(selector.as_ref()), kind))
				.collect(),
		}
	}

	/// Looks up a hex selector, with or without `0x`, in any case.
	pub fn classify(&self, selector_hex: &str) -> Option<OperationKind> {
		self.table.get(&normalize_hex(selector_hex)).copied()
	}

	/// Classifies raw call data by its first four bytes. Shorter input is never classified.
	pub fn classify_input(&self, input: &[u8]) -> Option<OperationKind> {
		let selector = input.get(..4)?;
		self.table.get(&hex::encode(selector)).copied()
	}

	pub fn len(&self) -> usize {
		self.table.len()
	}

	pub fn is_empty(&self) -> bool {
		self.table.is_empty()
	}
}
