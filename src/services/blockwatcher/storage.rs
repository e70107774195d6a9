//! Checkpoint stores for the block watcher.
//!
//! A checkpoint is the last block number fully processed for a chain, stored under
//! `"<namespace>:<chainId>"` as a decimal string without expiry. Two backends are provided:
//! - File-based storage, one small file per key, replaced atomically on every write
//! - Redis, through a shared connection manager

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use std::{collections::HashMap, path::PathBuf};

use crate::{
	services::blockwatcher::error::CheckpointError,
	utils::constants::{DEFAULT_CHECKPOINT_DIR, DEFAULT_CHECKPOINT_NAMESPACE},
};

/// Builds the storage key for a chain's checkpoint.
pub fn checkpoint_key(namespace: &str, chain_id: u64) -> String {
	format!("{}:{}", namespace, chain_id)
}

/// Parses a stored checkpoint; anything that is not a decimal block number counts as absent.
fn parse_checkpoint(key: &str, raw: &str) -> Option<u64> {
	match raw.trim().parse::<u64>() {
		Ok(block) => Some(block),
		Err(e) => {
			tracing::warn!(
				key = %key,
				value = %raw,
				error = %e,
				"Ignoring unparsable checkpoint"
			);
			None
		}
	}
}

/// Durable last-processed-block per chain
#[async_trait]
pub trait CheckpointStore: Send + Sync {
	/// Returns the stored checkpoint, or `None` when there is none or it cannot be parsed.
	async fn get(&self, chain_id: u64) -> Result<Option<u64>, CheckpointError>;

	/// Overwrites the checkpoint for `chain_id`.
	async fn set(&self, chain_id: u64, block_number: u64) -> Result<(), CheckpointError>;
}

/// File-based checkpoint store
///
/// The key's `:` separators are replaced by `_` to form the file name, so the default
/// namespace produces files such as `CACHES_LISTEN_OLD_BLOCK_56.txt`.
#[derive(Clone)]
pub struct FileCheckpointStore {
	storage_path: PathBuf,
	namespace: String,
}

impl FileCheckpointStore {
	pub fn new(storage_path: PathBuf, namespace: impl Into<String>) -> Self {
		Self {
			storage_path,
			namespace: namespace.into(),
		}
	}

	fn file_path(&self, chain_id: u64) -> PathBuf {
		let key = checkpoint_key(&self.namespace, chain_id);
		self.storage_path
			.join(format!("{}.txt", key.replace(':', "_")))
	}

	fn metadata(&self, chain_id: u64) -> Option<HashMap<String, String>> {
		Some(HashMap::from([(
			"key".to_string(),
			checkpoint_key(&self.namespace, chain_id),
		)]))
	}
}

impl Default for FileCheckpointStore {
	fn default() -> Self {
		Self::new(
			PathBuf::from(DEFAULT_CHECKPOINT_DIR),
			DEFAULT_CHECKPOINT_NAMESPACE,
		)
	}
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
	async fn get(&self, chain_id: u64) -> Result<Option<u64>, CheckpointError> {
		let file_path = self.file_path(chain_id);

		let content = match tokio::fs::read_to_string(&file_path).await {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(e) => {
				return Err(CheckpointError::read_error(
					"Failed to read checkpoint file",
					Some(Box::new(e)),
					self.metadata(chain_id),
				))
			}
		};

		Ok(parse_checkpoint(
			&checkpoint_key(&self.namespace, chain_id),
			&content,
		))
	}

	/// Writes to a temporary file first and renames it over the old checkpoint.
	async fn set(&self, chain_id: u64, block_number: u64) -> Result<(), CheckpointError> {
		tokio::fs::create_dir_all(&self.storage_path)
			.await
			.map_err(|e| {
				CheckpointError::connection_error(
					"Failed to create checkpoint directory",
					Some(Box::new(e)),
					self.metadata(chain_id),
				)
			})?;

		let file_path = self.file_path(chain_id);
		let temp_path = file_path.with_extension("txt.tmp");

		tokio::fs::write(&temp_path, block_number.to_string())
			.await
			.map_err(|e| {
				CheckpointError::write_error(
					"Failed to write checkpoint",
					Some(Box::new(e)),
					self.metadata(chain_id),
				)
			})?;

		tokio::fs::rename(&temp_path, &file_path)
			.await
			.map_err(|e| {
				CheckpointError::write_error(
					"Failed to replace checkpoint",
					Some(Box::new(e)),
					self.metadata(chain_id),
				)
			})?;

		Ok(())
	}
}

/// Redis-backed checkpoint store
#[derive(Clone)]
pub struct RedisCheckpointStore {
	connection: ConnectionManager,
	namespace: String,
}

impl RedisCheckpointStore {
	/// Connects to `redis_url`; the connection manager reconnects on its own afterwards.
	pub async fn connect(
		redis_url: &str,
		namespace: impl Into<String>,
	) -> Result<Self, CheckpointError> {
		let client = redis::Client::open(redis_url).map_err(|e| {
			CheckpointError::connection_error("Invalid Redis URL", Some(Box::new(e)), None)
		})?;
		let connection = ConnectionManager::new(client).await.map_err(|e| {
			CheckpointError::connection_error("Failed to connect to Redis", Some(Box::new(e)), None)
		})?;

		Ok(Self {
			connection,
			namespace: namespace.into(),
		})
	}
}

#[async_trait]
impl CheckpointStore for RedisCheckpointStore {
	async fn get(&self, chain_id: u64) -> Result<Option<u64>, CheckpointError> {
		let key = checkpoint_key(&self.namespace, chain_id);
		let mut connection = self.connection.clone();

		let value: Option<String> = connection.get(&key).await.map_err(|e| {
			CheckpointError::read_error(
				"Failed to read checkpoint from Redis",
				Some(Box::new(e)),
				Some(HashMap::from([("key".to_string(), key.clone())])),
			)
		})?;

		Ok(value.and_then(|raw| parse_checkpoint(&key, &raw)))
	}

	async fn set(&self, chain_id: u64, block_number: u64) -> Result<(), CheckpointError> {
		let key = checkpoint_key(&self.namespace, chain_id);
		let mut connection = self.connection.clone();

		let _: () = connection
			.set(&key, block_number.to_string())
			.await
			.map_err(|e| {
				CheckpointError::write_error(
					"Failed to write checkpoint to Redis",
					Some(Box::new(e)),
					Some(HashMap::from([("key".to_string(), key.clone())])),
				)
			})?;

		Ok(())
	}
}
