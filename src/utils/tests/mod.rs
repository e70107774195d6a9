//! Test helper utilities
//!
//! - `builders`: Builders for chain configs, blocks and transactions
//! - `http`: Retryable HTTP client for transport tests

pub mod builders {
	pub mod evm {
		pub mod block;
		pub mod transaction;
	}

	pub mod chain;
}


pub use builders::*;
pub use http::*;
