//! Chain access: client trait, EVM client, JSON-RPC transport and client pool.

mod client;
mod clients;
mod error;
mod pool;
mod transports;

pub use client::ChainClient;
pub use clients::{recover_signer, EvmClient};
pub use error::BlockChainError;
pub use pool::{ClientPool, ClientPoolTrait};
pub use transports::{
	BlockchainTransport, EndpointManager, HttpTransportClient, TransientErrorRetryStrategy,
	TransportError,
};
