//! Core domain models.
//!
//! - Chains: which router to watch on which chain, and how fast that chain produces blocks
//! - Operations: the records extracted from classified router calls

mod chain;
mod operation;

pub use chain::{ChainConfig, RpcUrl};
pub use operation::{OperationKind, SenderOperation};
