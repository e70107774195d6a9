//! Bootstrap: turns configuration into running services.
//!
//! - Process settings are read from the environment (`CHECKPOINT_*`, `SINK_*`, `REDIS_URL`,
//!   `DATABASE_URL`, `CHAIN_CONFIG_DIR`)
//! - Chain configurations are loaded through the chain repository
//! - The checkpoint store and the operation sink are created for the selected backends
//! - One watcher per chain is started on the block watcher service

use std::{
	collections::HashMap,
	env,
	error::Error,
	path::{Path, PathBuf},
	sync::Arc,
};
use tokio::sync::Mutex;

use crate::{
	models::{ChainConfig, ConfigError},
	repositories::{ChainRepository, ChainRepositoryTrait, ChainService},
	services::{
		blockchain::ClientPoolTrait,
		blockwatcher::{
			BlockWatcherService, CheckpointError, CheckpointStore, FileCheckpointStore,
			RedisCheckpointStore,
		},
		classifier::MethodClassifier,
		sink::{FileOperationSink, MySqlOperationSink, OperationSink, SinkError},
	},
	utils::constants::{
		DEFAULT_CHAIN_CONFIG_DIR, DEFAULT_CHECKPOINT_DIR, DEFAULT_CHECKPOINT_NAMESPACE,
		DEFAULT_SINK_PATH,
	},
};

/// Type alias for handling ServiceResult
pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Watcher service over runtime-selected backends
pub type DynBlockWatcherService = BlockWatcherService<dyn CheckpointStore, dyn OperationSink>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointBackend {
	File { dir: PathBuf },
	Redis { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkBackend {
	File { path: PathBuf },
	MySql { url: String },
}

/// Process-level settings that are not part of any chain configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
	pub config_dir: PathBuf,
	pub checkpoint_namespace: String,
	pub checkpoint_backend: CheckpointBackend,
	pub sink_backend: SinkBackend,
}

impl RuntimeSettings {
	/// Reads settings from the process environment.
	pub fn from_env() -> std::result::Result<Self, ConfigError> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	/// Reads settings through `lookup`; empty values count as unset.
	pub fn from_lookup<F>(lookup: F) -> std::result::Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| {
			lookup(key)
				.map(|v| v.trim().to_string())
				.filter(|v| !v.is_empty())
		};
		let require = |key: &str, backend: &str| {
			get(key).ok_or_else(|| {
				ConfigError::validation_error(
					format!("{} is required for the {} backend", key, backend),
					None,
					None,
				)
			})
		};

		let checkpoint_backend = match get("CHECKPOINT_BACKEND")
			.unwrap_or_else(|| "file".to_string())
			.to_lowercase()
			.as_str()
		{
			"file" => CheckpointBackend::File {
				dir: PathBuf::from(
					get("CHECKPOINT_DIR").unwrap_or_else(|| DEFAULT_CHECKPOINT_DIR.to_string()),
				),
			},
			"redis" => CheckpointBackend::Redis {
				url: require("REDIS_URL", "redis")?,
			},
			other => {
				return Err(ConfigError::validation_error(
					format!("Unknown CHECKPOINT_BACKEND '{}', expected file or redis", other),
					None,
					None,
				))
			}
		};

		let sink_backend = match get("SINK_BACKEND")
			.unwrap_or_else(|| "file".to_string())
			.to_lowercase()
			.as_str()
		{
			"file" => SinkBackend::File {
				path: PathBuf::from(
					get("SINK_PATH").unwrap_or_else(|| DEFAULT_SINK_PATH.to_string()),
				),
			},
			"mysql" => SinkBackend::MySql {
				url: require("DATABASE_URL", "mysql")?,
			},
			other => {
				return Err(ConfigError::validation_error(
					format!("Unknown SINK_BACKEND '{}', expected file or mysql", other),
					None,
					None,
				))
			}
		};

		Ok(Self {
			config_dir: PathBuf::from(
				get("CHAIN_CONFIG_DIR").unwrap_or_else(|| DEFAULT_CHAIN_CONFIG_DIR.to_string()),
			),
			checkpoint_namespace: get("CHECKPOINT_NAMESPACE")
				.unwrap_or_else(|| DEFAULT_CHECKPOINT_NAMESPACE.to_string()),
			checkpoint_backend,
			sink_backend,
		})
	}
}

/// Loads chain configurations, unless a service is supplied.
///
/// # Returns
/// The chains keyed by slug and a shareable handle to the chain service
pub async fn initialize_services<R>(
	chain_service: Option<ChainService<R>>,
	config_dir: Option<&Path>,
) -> Result<(HashMap<String, ChainConfig>, Arc<Mutex<ChainService<R>>>)>
where
	R: ChainRepositoryTrait + Send + Sync + 'static,
{
	let chain_service = match chain_service {
		Some(service) => service,
		None => {
			let repository = R::new(config_dir).await?;
			ChainService::<R>::new_with_repository(repository)?
		}
	};

	let chains = chain_service.get_all();
	Ok((chains, Arc::new(Mutex::new(chain_service))))
}

/// Loads chains from `config_dir` with the file-backed repository.
pub async fn load_chains(config_dir: &Path) -> Result<Arc<Mutex<ChainService<ChainRepository>>>> {
	let (_, service) = initialize_services::<ChainRepository>(None, Some(config_dir)).await?;
	Ok(service)
}

pub async fn create_checkpoint_store(
	settings: &RuntimeSettings,
) -> std::result::Result<Arc<dyn CheckpointStore>, CheckpointError> {
	let store: Arc<dyn CheckpointStore> = match &settings.checkpoint_backend {
		CheckpointBackend::File { dir } => Arc::new(FileCheckpointStore::new(
			dir.clone(),
			settings.checkpoint_namespace.clone(),
		)),
		CheckpointBackend::Redis { url } => Arc::new(
			RedisCheckpointStore::connect(url, settings.checkpoint_namespace.clone()).await?,
		),
	};
	Ok(store)
}

pub async fn create_operation_sink(
	settings: &RuntimeSettings,
) -> std::result::Result<Arc<dyn OperationSink>, SinkError> {
	let sink: Arc<dyn OperationSink> = match &settings.sink_backend {
		SinkBackend::File { path } => Arc::new(FileOperationSink::new(path.clone())),
		SinkBackend::MySql { url } => Arc::new(MySqlOperationSink::connect(url).await?),
	};
	Ok(sink)
}

pub fn create_block_watcher_service(
	classifier: Arc<MethodClassifier>,
	checkpoints: Arc<dyn CheckpointStore>,
	sink: Arc<dyn OperationSink>,
) -> DynBlockWatcherService {
	BlockWatcherService::new(classifier, checkpoints, sink)
}

/// Starts a watcher for every chain, in the given order.
///
/// A chain whose client or watcher cannot be created is logged and skipped; the number of
/// started watchers is returned.
pub async fn start_watchers<K, S, P>(
	service: &BlockWatcherService<K, S>,
	chains: &[ChainConfig],
	client_pool: &P,
) -> usize
where
	K: CheckpointStore + ?Sized + 'static,
	S: OperationSink + ?Sized + 'static,
	P: ClientPoolTrait,
{
	let mut started = 0;
	for chain in chains {
		let client = match client_pool.get_evm_client(chain).await {
			Ok(client) => client,
			Err(e) => {
				tracing::error!(chain = %chain.slug, error = %e, "Failed to create chain client");
				continue;
			}
		};

		match service.start_chain_watcher(chain, client).await {
			Ok(()) => started += 1,
			Err(e) => {
				tracing::error!(chain = %chain.slug, error = %e, "Failed to start chain watcher")
			}
		}
	}
	started
}
