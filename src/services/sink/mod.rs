//! Durable destinations for extracted sender operations.
//!
//! - `FileOperationSink`: JSON lines appended to a local file
//! - `MySqlOperationSink`: multi-row inserts into the `sender_operations` table

use async_trait::async_trait;

use crate::models::SenderOperation;

mod error;
mod file;
mod mysql;

pub use error::SinkError;
pub use file::FileOperationSink;
pub use mysql::{MySqlOperationSink, CREATE_SENDER_OPERATIONS_TABLE};

/// Batch append of sender operations.
///
/// A failure must be reported to the caller; records are never dropped silently.
/// Appending an empty batch succeeds without touching the store.
#[async_trait]
pub trait OperationSink: Send + Sync {
	async fn append_batch(&self, operations: &[SenderOperation]) -> Result<(), SinkError>;
}
