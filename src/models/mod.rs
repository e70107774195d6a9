//! Domain models shared by the watcher services.
//!
//! - `blockchain`: EVM block and transaction views returned by the chain client
//! - `config`: Configuration loading and validation
//! - `core`: Chain configuration, sender operations and operation kinds

mod blockchain;
mod config;
mod core;

pub use blockchain::evm::{EvmBlock, EvmTransaction};

pub use core::{ChainConfig, OperationKind, RpcUrl, SenderOperation};

pub use config::{ConfigError, ConfigLoader};
