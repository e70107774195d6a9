//! Core services.
//!
//! - `blockchain`: Chain client trait, EVM JSON-RPC client and transports
//! - `blockwatcher`: Per-chain watch loop, checkpoints and supervision
//! - `classifier`: Method selector to operation kind lookup
//! - `sink`: Destinations for extracted sender operations

pub mod blockchain;
pub mod blockwatcher;
pub mod classifier;
pub mod sink;
