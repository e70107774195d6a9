//! Block watcher service.
//!
//! Starts one [`ChainWatcher`] task per chain and keeps track of them so they can be stopped
//! individually or all at once. Chains share nothing but the read-only classifier and the
//! external stores; a watcher that fails is logged and leaves the others running.

use std::{collections::HashMap, sync::Arc};
use tokio::{
	sync::{watch, RwLock},
	task::JoinHandle,
};

use crate::{
	models::ChainConfig,
	services::{
		blockchain::ChainClient,
		blockwatcher::{error::BlockWatcherError, storage::CheckpointStore, watcher::ChainWatcher},
		classifier::MethodClassifier,
		sink::OperationSink,
	},
};

/// A running watcher task and the channel that stops it
struct WatcherHandle {
	shutdown: watch::Sender<bool>,
	task: JoinHandle<()>,
}

/// Map of running watchers keyed by chain slug
type WatchersMap = HashMap<String, WatcherHandle>;

/// Supervises the per-chain watchers.
///
/// # Type Parameters
/// * `K` - Checkpoint store shared by all watchers
/// * `S` - Operation sink shared by all watchers
pub struct BlockWatcherService<K, S>
where
	K: CheckpointStore + ?Sized + 'static,
	S: OperationSink + ?Sized + 'static,
{
	classifier: Arc<MethodClassifier>,
	checkpoints: Arc<K>,
	sink: Arc<S>,
	active_watchers: Arc<RwLock<WatchersMap>>,
}

impl<K, S> BlockWatcherService<K, S>
where
	K: CheckpointStore + ?Sized + 'static,
	S: OperationSink + ?Sized + 'static,
{
	pub fn new(classifier: Arc<MethodClassifier>, checkpoints: Arc<K>, sink: Arc<S>) -> Self {
		Self {
			classifier,
			checkpoints,
			sink,
			active_watchers: Arc::new(RwLock::new(HashMap::new())),
		}
	}

	/// Spawns a watcher for `chain`.
	///
	/// Fails with [`BlockWatcherError::AlreadyRunning`] when a watcher for the same slug is
	/// still alive. A finished watcher (for example after a chain id mismatch) may be restarted.
	pub async fn start_chain_watcher<C>(
		&self,
		chain: &ChainConfig,
		client: Arc<C>,
	) -> Result<(), BlockWatcherError>
	where
		C: ChainClient + ?Sized + 'static,
	{
		let mut watchers = self.active_watchers.write().await;

		if let Some(existing) = watchers.get(&chain.slug) {
			if !existing.task.is_finished() {
				return Err(BlockWatcherError::already_running(
					format!("Block watcher already running for chain: {}", chain.slug),
					None,
					Some(HashMap::from([("chain".to_string(), chain.slug.clone())])),
				));
			}
			watchers.remove(&chain.slug);
		}

		let watcher = ChainWatcher::new(
			chain.clone(),
			client,
			self.classifier.clone(),
			self.checkpoints.clone(),
			self.sink.clone(),
		)?;

		let (shutdown, shutdown_rx) = watch::channel(false);
		let slug = chain.slug.clone();
		let task = tokio::spawn(async move {
			if let Err(e) = watcher.run(shutdown_rx).await {
				tracing::error!(chain = %slug, error = %e, "Chain watcher exited with error");
			}
		});

		watchers.insert(chain.slug.clone(), WatcherHandle { shutdown, task });
		tracing::info!("Started block watcher for chain: {}", chain.slug);
		Ok(())
	}

	/// Signals the watcher for `slug` to stop and waits for it to finish its current step.
	pub async fn stop_chain_watcher(&self, slug: &str) -> Result<(), BlockWatcherError> {
		let handle = self.active_watchers.write().await.remove(slug);

		if let Some(handle) = handle {
			stop_handle(slug, handle).await?;
			tracing::info!("Stopped block watcher for chain: {}", slug);
		}

		Ok(())
	}

	/// Stops every watcher. Failures are logged so that one bad task does not block the rest.
	pub async fn stop_all(&self) {
		let handles: Vec<(String, WatcherHandle)> =
			self.active_watchers.write().await.drain().collect();

		for (slug, handle) in handles {
			if let Err(e) = stop_handle(&slug, handle).await {
				tracing::error!(chain = %slug, error = %e, "Failed to stop chain watcher");
			}
		}
	}

	/// Slugs of watchers whose task is still alive, sorted.
	pub async fn running_chains(&self) -> Vec<String> {
		let watchers = self.active_watchers.read().await;
		let mut slugs: Vec<String> = watchers
			.iter()
			.filter(|(_, handle)| !handle.task.is_finished())
			.map(|(slug, _)| slug.clone())
			.collect();
		slugs.sort();
		slugs
	}

	pub async fn is_running(&self, slug: &str) -> bool {
		self.active_watchers
			.read()
			.await
			.get(slug)
			.is_some_and(|handle| !handle.task.is_finished())
	}
}

async fn stop_handle(slug: &str, handle: WatcherHandle) -> Result<(), BlockWatcherError> {
	// The receiver is gone when the task already ended
	let _ = handle.shutdown.send(true);

	handle.task.await.map_err(|e| {
		BlockWatcherError::processing_error(
			"Chain watcher task panicked or was cancelled",
			Some(Box::new(e)),
			Some(HashMap::from([("chain".to_string(), slug.to_string())])),
		)
	})
}
