//! JSON lines sink.

use async_trait::async_trait;
use std::{collections::HashMap, path::PathBuf};
use tokio::{io::AsyncWriteExt, sync::Mutex};

use crate::{
	models::SenderOperation,
	services::sink::{OperationSink, SinkError},
	utils::constants::DEFAULT_SINK_PATH,
};

/// Appends every operation as one JSON object per line.
///
/// The file and its parent directory are created on first write. Writes from different
/// chains are serialised so that lines never interleave.
pub struct FileOperationSink {
	path: PathBuf,
	lock: Mutex<()>,
}

impl FileOperationSink {
	pub fn new(path: PathBuf) -> Self {
		Self {
			path,
			lock: Mutex::new(()),
		}
	}

	pub fn path(&self) -> &PathBuf {
		&self.path
	}

	fn metadata(&self) -> Option<HashMap<String, String>> {
		Some(HashMap::from([(
			"path".to_string(),
			self.path.display().to_string(),
		)]))
	}
}

impl Default for FileOperationSink {
	fn default() -> Self {
		Self::new(PathBuf::from(DEFAULT_SINK_PATH))
	}
}

#[async_trait]
impl OperationSink for FileOperationSink {
	async fn append_batch(&self, operations: &[SenderOperation]) -> Result<(), SinkError> {
		if operations.is_empty() {
			return Ok(());
		}

		let mut buffer = String::new();
		for operation in operations {
			let line = serde_json::to_string(operation).map_err(|e| {
				SinkError::serialization_error(
					"Failed to serialize sender operation",
					Some(Box::new(e)),
					Some(HashMap::from([(
						"tx_hash".to_string(),
						operation.tx_hash.to_string(),
					)])),
				)
			})?;
			buffer.push_str(&line);
			buffer.push('\n');
		}

		let _guard = self.lock.lock().await;

		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			tokio::fs::create_dir_all(parent).await.map_err(|e| {
				SinkError::connection_error(
					"Failed to create sink directory",
					Some(Box::new(e)),
					self.metadata(),
				)
			})?;
		}

		let mut file = tokio::fs::OpenOptions::new()
			.create(true)
			.append(true)
			.open(&self.path)
			.await
			.map_err(|e| {
				SinkError::connection_error(
					"Failed to open sink file",
					Some(Box::new(e)),
					self.metadata(),
				)
			})?;

		file.write_all(buffer.as_bytes()).await.map_err(|e| {
			SinkError::write_error(
				format!("Failed to append {} operations", operations.len()),
				Some(Box::new(e)),
				self.metadata(),
			)
		})?;
		file.flush().await.map_err(|e| {
			SinkError::write_error("Failed to flush sink file", Some(Box::new(e)), self.metadata())
		})?;

		Ok(())
	}
}
