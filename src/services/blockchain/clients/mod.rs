//! Chain client implementations.

mod evm {
	pub mod client;
	pub mod signer;
}

pub use evm::client::EvmClient;
pub use evm::signer::recover_signer;
