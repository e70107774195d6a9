//! Per-chain watch loop.
//!
//! One [`ChainWatcher`] drives one chain: it resolves where to resume, fetches blocks in strictly
//! increasing order, turns router calls into [`SenderOperation`]s, hands them to the sink,
//! advances the checkpoint and paces itself to the chain's block interval.
//!
//! Delivery is at-least-once. The checkpoint only moves past a block once its batch was accepted
//! by the sink, so a block may be processed twice after a crash but is never skipped.

use alloy::primitives::Address;
use futures::future::join_all;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::instrument;

use crate::{
	models::{ChainConfig, EvmBlock, EvmTransaction, OperationKind, SenderOperation},
	services::{
		blockchain::{BlockChainError, ChainClient},
		blockwatcher::{error::BlockWatcherError, storage::CheckpointStore},
		classifier::MethodClassifier,
		sink::OperationSink,
	},
	utils::metrics,
};

/// Decides which block to fetch first.
///
/// The configured start block wins when there is no checkpoint or when it is strictly ahead of
/// the checkpoint; otherwise the block after the checkpoint is next. `None` means "fetch the
/// latest block".
pub fn resolve_next_block(checkpoint: Option<u64>, start_block: Option<u64>) -> Option<u64> {
	match (checkpoint, start_block) {
		(None, Some(start)) => Some(start),
		(Some(last), Some(start)) if start > last => Some(start),
		(Some(last), _) => Some(last.saturating_add(1)),
		(None, None) => None,
	}
}

/// Time left before the next block is expected, if any.
///
/// `block_time_ms - deviation_ms - (now_ms - block_timestamp_s * 1000)`; zero or negative
/// budgets return `None` so the caller never sleeps a negative duration.
pub fn pacing_delay(
	block_time_ms: u64,
	deviation_ms: u64,
	now_ms: i64,
	block_timestamp_s: u64,
) -> Option<Duration> {
	let elapsed_ms = i128::from(now_ms) - i128::from(block_timestamp_s) * 1000;
	let budget_ms = i128::from(block_time_ms) - i128::from(deviation_ms) - elapsed_ms;
	if budget_ms <= 0 {
		return None;
	}
	Some(Duration::from_millis(
		u64::try_from(budget_ms).unwrap_or(u64::MAX),
	))
}

/// Router calls in `block` whose selector is known, in block order.
pub fn classify_transactions<'a>(
	block: &'a EvmBlock,
	router: &Address,
	classifier: &MethodClassifier,
) -> Vec<(&'a EvmTransaction, OperationKind)> {
	block
		.transactions
		.iter()
		.filter(|tx| tx.is_addressed_to(router))
		.filter_map(|tx| classifier.classify_input(&tx.input).map(|kind| (tx, kind)))
		.collect()
}

/// Builds the sender operations for one block.
///
/// Sender recovery runs on the blocking pool, one task per candidate transaction. Each task
/// owns its result and the results are merged in block order once all of them finished.
/// Transactions whose sender cannot be recovered are logged and skipped.
pub async fn extract_operations<C>(
	client: &Arc<C>,
	chain: &ChainConfig,
	router: &Address,
	classifier: &MethodClassifier,
	block: &EvmBlock,
	block_number: u64,
) -> Vec<SenderOperation>
where
	C: ChainClient + ?Sized + 'static,
{
	let candidates = classify_transactions(block, router, classifier);
	if candidates.is_empty() {
		return Vec::new();
	}

	let handles = candidates.iter().map(|(tx, _)| {
		let client = Arc::clone(client);
		let tx = (*tx).clone();
		tokio::task::spawn_blocking(move || client.recover_sender(&tx))
	});
	let recovered = join_all(handles).await;

	let block_time = block.timestamp();
	candidates
		.into_iter()
		.zip(recovered)
		.filter_map(|((tx, kind), result)| match result {
			Ok(Ok(from)) => Some(SenderOperation {
				from,
				to: *router,
				tx_hash: tx.hash,
				chain_id: chain.chain_id,
				block_number,
				block_time,
				kind,
			}),
			Ok(Err(e)) => {
				tracing::warn!(
					tx_hash = %tx.hash,
					error = %e,
					"Skipping transaction, sender recovery failed"
				);
				None
			}
			Err(e) => {
				tracing::warn!(
					tx_hash = %tx.hash,
					error = %e,
					"Skipping transaction, sender recovery task failed"
				);
				None
			}
		})
		.collect()
}

/// Result of one pass through the loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
	/// The block was persisted and checkpointed
	Processed {
		block_number: u64,
		operations: usize,
		/// Sleep before fetching the next block
		pacing: Option<Duration>,
	},
	/// The block could not be fetched; the same number is requested again
	FetchFailed,
	/// The sink rejected the batch; `block_number` is requested again
	PersistFailed { block_number: u64 },
}

/// Watches a single chain.
pub struct ChainWatcher<C, K, S>
where
	C: ChainClient + ?Sized + 'static,
	K: CheckpointStore + ?Sized,
	S: OperationSink + ?Sized,
{
	chain: ChainConfig,
	router: Address,
	client: Arc<C>,
	classifier: Arc<MethodClassifier>,
	checkpoints: Arc<K>,
	sink: Arc<S>,
}

impl<C, K, S> ChainWatcher<C, K, S>
where
	C: ChainClient + ?Sized + 'static,
	K: CheckpointStore + ?Sized,
	S: OperationSink + ?Sized,
{
	pub fn new(
		chain: ChainConfig,
		client: Arc<C>,
		classifier: Arc<MethodClassifier>,
		checkpoints: Arc<K>,
		sink: Arc<S>,
	) -> Result<Self, BlockWatcherError> {
		let router = chain.router().map_err(|e| {
			BlockWatcherError::config_error(
				"Invalid router address",
				Some(Box::new(e)),
				Some(chain_metadata(&chain)),
			)
		})?;

		Ok(Self {
			chain,
			router,
			client,
			classifier,
			checkpoints,
			sink,
		})
	}

	pub fn chain(&self) -> &ChainConfig {
		&self.chain
	}

	fn fetch_backoff(&self) -> Duration {
		Duration::from_millis(self.chain.fetch_retry_ms())
	}

	/// Fails when the node is unreachable or serves a different chain.
	pub async fn verify_chain_id(&self) -> Result<(), BlockWatcherError> {
		let reported = self.client.get_chain_id().await.map_err(|e| {
			BlockWatcherError::config_error(
				"Failed to read chain id from node",
				Some(Box::new(e)),
				Some(chain_metadata(&self.chain)),
			)
		})?;

		if reported != self.chain.chain_id {
			return Err(BlockWatcherError::config_error(
				format!(
					"Node reports chain id {} but {} is configured",
					reported, self.chain.chain_id
				),
				None,
				Some(chain_metadata(&self.chain)),
			));
		}
		Ok(())
	}

	/// Reads the checkpoint and resolves the first block to fetch.
	pub async fn resolve_start(&self) -> Result<Option<u64>, BlockWatcherError> {
		let checkpoint = self.checkpoints.get(self.chain.chain_id).await.map_err(|e| {
			BlockWatcherError::storage_error(
				"Failed to read checkpoint",
				Some(Box::new(e)),
				Some(chain_metadata(&self.chain)),
			)
		})?;

		let next = resolve_next_block(checkpoint, self.chain.start_block);
		tracing::info!(
			chain = %self.chain.slug,
			checkpoint = ?checkpoint,
			start_block = ?self.chain.start_block,
			next_block = ?next,
			"Resolved resume point"
		);
		Ok(next)
	}

	/// Fetches, extracts, persists and checkpoints one block.
	pub async fn iterate(&self, next: Option<u64>) -> IterationOutcome {
		let slug = self.chain.slug.as_str();

		let block = match self.client.get_block_by_number(next).await {
			Ok(block) => block,
			Err(e) => {
				metrics::record_fetch_failure(slug);
				match e {
					BlockChainError::BlockNotFound(_) => {
						tracing::debug!(block = ?next, "Block not available yet")
					}
					e => tracing::warn!(block = ?next, error = %e, "Failed to fetch block"),
				}
				return IterationOutcome::FetchFailed;
			}
		};

		let Some(block_number) = block.number().or(next) else {
			metrics::record_fetch_failure(slug);
			tracing::warn!("Latest block has no number, retrying");
			return IterationOutcome::FetchFailed;
		};

		let operations = extract_operations(
			&self.client,
			&self.chain,
			&self.router,
			&self.classifier,
			&block,
			block_number,
		)
		.await;

		if !operations.is_empty() {
			if let Err(e) = self.sink.append_batch(&operations).await {
				metrics::record_persist_failure(slug);
				tracing::error!(
					block = block_number,
					operations = operations.len(),
					error = %e,
					"Failed to persist sender operations, block will be retried"
				);
				return IterationOutcome::PersistFailed { block_number };
			}
		}

		if let Err(e) = self.checkpoints.set(self.chain.chain_id, block_number).await {
			metrics::record_persist_failure(slug);
			tracing::error!(block = block_number, error = %e, "Failed to save checkpoint");
		} else {
			tracing::debug!(block = block_number, "Checkpoint advanced");
		}

		let kinds: Vec<OperationKind> = operations.iter().map(|op| op.kind).collect();
		metrics::record_block_processed(slug, block_number, &kinds);

		IterationOutcome::Processed {
			block_number,
			operations: operations.len(),
			pacing: pacing_delay(
				self.chain.block_time_ms,
				self.chain.deviation_ms,
				chrono::Utc::now().timestamp_millis(),
				block.timestamp(),
			),
		}
	}

	/// Runs until `shutdown` flips to `true` or its sender is dropped.
	///
	/// Only startup failures are returned; everything after that is logged and retried.
	#[instrument(skip_all, fields(chain = %self.chain.slug))]
	pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), BlockWatcherError> {
		self.verify_chain_id().await?;

		let mut next = loop {
			match self.resolve_start().await {
				Ok(next) => break next,
				Err(e) => {
					tracing::error!(error = %e, "Could not resolve resume point, retrying");
					if sleep_or_shutdown(self.fetch_backoff(), &mut shutdown).await {
						return Ok(());
					}
				}
			}
		};

		tracing::info!("Chain watcher started");

		while !*shutdown.borrow() {
			let wait = match self.iterate(next).await {
				IterationOutcome::Processed {
					block_number,
					pacing,
					..
				} => {
					next = Some(block_number.saturating_add(1));
					pacing
				}
				IterationOutcome::FetchFailed => Some(self.fetch_backoff()),
				IterationOutcome::PersistFailed { block_number } => {
					next = Some(block_number);
					Some(self.fetch_backoff())
				}
			};

			if let Some(wait) = wait {
				if sleep_or_shutdown(wait, &mut shutdown).await {
					break;
				}
			}
		}

		tracing::info!(next_block = ?next, "Chain watcher stopped");
		Ok(())
	}
}

/// Sleeps for `duration`; returns `true` when shutdown was requested meanwhile.
async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
	if *shutdown.borrow() {
		return true;
	}
	tokio::select! {
		_ = tokio::time::sleep(duration) => false,
		changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
	}
}

fn chain_metadata(chain: &ChainConfig) -> HashMap<String, String> {
	HashMap::from([
		("chain".to_string(), chain.slug.clone()),
		("chain_id".to_string(), chain.chain_id.to_string()),
	])
}
