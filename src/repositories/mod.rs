//! Repositories over configuration stored on disk.
//!
//! - Chain: loads and validates the chain descriptions the watchers are started from

mod chain;
mod error;

pub use chain::{ChainRepository, ChainRepositoryTrait, ChainService};
pub use error::RepositoryError;
