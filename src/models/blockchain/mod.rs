//! Blockchain data as returned by the chain client.

pub mod evm;
