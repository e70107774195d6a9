//! Block watching.
//!
//! - `watcher`: the per-chain loop (resume resolution, fetch, extraction, pacing)
//! - `service`: supervision of one watcher task per chain
//! - `storage`: durable per-chain checkpoints (file and Redis)

mod error;
mod service;
mod storage;
mod watcher;

pub use error::{BlockWatcherError, CheckpointError};
pub use service::BlockWatcherService;
pub use storage::{checkpoint_key, CheckpointStore, FileCheckpointStore, RedisCheckpointStore};
pub use watcher::{
	classify_transactions, extract_operations, pacing_delay, resolve_next_block, ChainWatcher,
	IterationOutcome,
};
