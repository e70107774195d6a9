//! MySQL sink writing to the `sender_operations` table.

use async_trait::async_trait;
use sqlx::{
	mysql::{MySqlPool, MySqlPoolOptions},
	MySql, QueryBuilder,
};
use std::collections::HashMap;
use tracing::instrument;

use crate::{
	models::SenderOperation,
	services::sink::{OperationSink, SinkError},
};

const MAX_CONNECTIONS: u32 = 100;
const MIN_CONNECTIONS: u32 = 10;

/// Rows per INSERT statement; larger batches are split inside one transaction.
const INSERT_CHUNK_SIZE: usize = 1000;

pub const CREATE_SENDER_OPERATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sender_operations (
	id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT,
	`from` VARCHAR(42) NOT NULL,
	`to` VARCHAR(42) NOT NULL,
	tx_hash VARCHAR(66) NOT NULL,
	chain_id BIGINT UNSIGNED NOT NULL,
	block_number BIGINT UNSIGNED NOT NULL,
	block_time BIGINT UNSIGNED NOT NULL,
	`type` TINYINT UNSIGNED NOT NULL,
	created_at DATETIME(3) NOT NULL DEFAULT CURRENT_TIMESTAMP(3),
	updated_at DATETIME(3) NOT NULL DEFAULT CURRENT_TIMESTAMP(3) ON UPDATE CURRENT_TIMESTAMP(3),
	deleted_at DATETIME(3) NULL,
	is_delete TINYINT(1) NOT NULL DEFAULT 0,
	PRIMARY KEY (id),
	KEY idx_sender_operations_tx_hash (tx_hash),
	KEY idx_sender_operations_chain_block (chain_id, block_number)
)
"#;

/// Persists operations as multi-row inserts.
///
/// Addresses are stored checksummed, hashes as lowercase `0x` hex and the kind as its
/// numeric code.
#[derive(Clone)]
pub struct MySqlOperationSink {
	pool: MySqlPool,
}

impl MySqlOperationSink {
	pub fn new(pool: MySqlPool) -> Self {
		Self { pool }
	}

	/// Opens a pool against `database_url` and makes sure the table exists.
	pub async fn connect(database_url: &str) -> Result<Self, SinkError> {
		let pool = MySqlPoolOptions::new()
			.max_connections(MAX_CONNECTIONS)
			.min_connections(MIN_CONNECTIONS)
			.connect(database_url)
			.await
			.map_err(|e| {
				SinkError::connection_error("Failed to connect to MySQL", Some(Box::new(e)), None)
			})?;

		let sink = Self::new(pool);
		sink.ensure_schema().await?;
		Ok(sink)
	}

	pub async fn ensure_schema(&self) -> Result<(), SinkError> {
		sqlx::query(CREATE_SENDER_OPERATIONS_TABLE)
			.execute(&self.pool)
			.await
			.map_err(|e| {
				SinkError::write_error(
					"Failed to create sender_operations table",
					Some(Box::new(e)),
					None,
				)
			})?;
		Ok(())
	}

	pub fn pool(&self) -> &MySqlPool {
		&self.pool
	}
}

/// Builds one INSERT statement covering every operation in `operations`.
pub(crate) fn build_insert(operations: &[SenderOperation]) -> QueryBuilder<'static, MySql> {
	let mut query = QueryBuilder::new(
		"INSERT INTO sender_operations (`from`, `to`, tx_hash, chain_id, block_number, \
		 block_time, `type`) ",
	);

	query.push_values(operations, |mut row, operation| {
		row.push_bind(operation.from.to_checksum(None))
			.push_bind(operation.to.to_checksum(None))
			.push_bind(operation.tx_hash.to_string())
			.push_bind(operation.chain_id)
			.push_bind(operation.block_number)
			.push_bind(operation.block_time)
			.push_bind(operation.kind.code());
	});

	query
}

#[async_trait]
impl OperationSink for MySqlOperationSink {
	#[instrument(skip_all, fields(rows = operations.len()))]
	async fn append_batch(&self, operations: &[SenderOperation]) -> Result<(), SinkError> {
		if operations.is_empty() {
			return Ok(());
		}

		let metadata = || {
			Some(HashMap::from([(
				"rows".to_string(),
				operations.len().to_string(),
			)]))
		};

		let mut tx = self.pool.begin().await.map_err(|e| {
			SinkError::connection_error("Failed to begin transaction", Some(Box::new(e)), metadata())
		})?;

		for chunk in operations.chunks(INSERT_CHUNK_SIZE) {
			let mut query = build_insert(chunk);
			query.build().execute(&mut *tx).await.map_err(|e| {
				SinkError::write_error(
					"Failed to insert sender operations",
					Some(Box::new(e)),
					metadata(),
				)
			})?;
		}

		tx.commit().await.map_err(|e| {
			SinkError::write_error("Failed to commit sender operations", Some(Box::new(e)), metadata())
		})?;

		Ok(())
	}
}
