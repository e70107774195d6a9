//! Router sender-operation watcher.
//!
//! Polls EVM chains block by block, picks out calls to a configured router contract whose
//! method selector is known, recovers each caller and stores one record per call. Progress is
//! checkpointed per chain so a restart resumes where the previous run stopped.
//!
//! # Module Structure
//!
//! - `bootstrap`: Wires configuration, clients, stores and the watcher service together
//! - `models`: Chain configuration, EVM block views and sender operations
//! - `repositories`: Chain configuration loading
//! - `services`: Chain access, classification, block watching and sinks
//! - `utils`: Logging, metrics, HTTP retry client and helpers

pub mod bootstrap;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
