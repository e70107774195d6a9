//! Router watcher entry point.
//!
//! Loads the chain configurations, creates the checkpoint store and the operation sink selected
//! by the environment, starts one watcher per chain and runs until Ctrl+C.
//!
//! # Flow
//! 1. Applies CLI flags on top of the environment (and `.env`)
//! 2. Sets up logging
//! 3. Loads and validates chain configurations (`--check` stops here)
//! 4. Starts the optional metrics server and the chain watchers
//! 5. Stops every watcher cooperatively on shutdown

use router_watcher::{
	bootstrap::{
		create_block_watcher_service, create_checkpoint_store, create_operation_sink,
		load_chains, start_watchers, Result, RuntimeSettings,
	},
	services::{blockchain::ClientPool, classifier::MethodClassifier},
	utils::{
		constants::DEFAULT_METRICS_ADDRESS, logging::setup_logging,
		metrics::server::create_metrics_server, parse_string_to_bytes_size,
	},
};

use clap::Parser;
use dotenvy::dotenv_override;
use std::env::{set_var, var};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
	name = "router-watcher",
	about = "Watches EVM chains for router calls and records the sender of every classified operation.",
	version
)]
struct Cli {
	/// Write logs to file instead of stdout
	#[arg(long)]
	log_file: bool,

	/// Set log level (trace, debug, info, warn, error)
	#[arg(long, value_name = "LEVEL")]
	log_level: Option<String>,

	/// Path to store log files (default: logs/)
	#[arg(long, value_name = "PATH")]
	log_path: Option<String>,

	/// Maximum log file size before rolling (e.g., "1GB", "500MB", "1024KB")
	#[arg(long, value_name = "SIZE", value_parser = parse_string_to_bytes_size)]
	log_max_size: Option<u64>,

	/// Address to start the metrics server on (default: 127.0.0.1:8081)
	#[arg(long, value_name = "HOST:PORT")]
	metrics_address: Option<String>,

	/// Enable metrics server
	#[arg(long)]
	metrics: bool,

	/// Directory with one JSON file per chain (default: config/chains)
	#[arg(long, value_name = "PATH")]
	config_dir: Option<String>,

	/// Validate configuration files without starting the service
	#[arg(long)]
	check: bool,
}

impl Cli {
	/// Apply CLI options to environment variables, overriding any existing values
	fn apply_to_env(&self) {
		// Values from .env override the inherited environment; CLI flags override both
		dotenv_override().ok();

		if self.log_file {
			set_var("LOG_MODE", "file");
		}

		if let Ok(level) = var("RUST_LOG") {
			set_var("LOG_LEVEL", level);
		}

		if let Some(level) = &self.log_level {
			set_var("LOG_LEVEL", level);
			set_var("RUST_LOG", level);
		}

		if let Some(path) = &self.log_path {
			set_var("LOG_DATA_DIR", path);
		}

		if let Some(max_size) = &self.log_max_size {
			set_var("LOG_MAX_SIZE", max_size.to_string());
		}

		if self.metrics {
			set_var("METRICS_ENABLED", "true");
		}

		if let Some(address) = &self.metrics_address {
			if let Some(port) = address.split(':').nth(1) {
				set_var("METRICS_PORT", port);
			}
		}

		if let Some(dir) = &self.config_dir {
			set_var("CHAIN_CONFIG_DIR", dir);
		}
	}
}

/// Address the metrics server binds to.
///
/// Inside a container the server listens on all interfaces at `METRICS_PORT`; otherwise the CLI
/// address or the default is used.
fn resolve_metrics_address(
	cli_address: Option<&str>,
	in_docker: bool,
	metrics_port: Option<&str>,
) -> String {
	if in_docker {
		return metrics_port
			.map(|port| format!("0.0.0.0:{}", port))
			.unwrap_or_else(|| "0.0.0.0:8081".to_string());
	}
	cli_address
		.map(str::to_string)
		.unwrap_or_else(|| DEFAULT_METRICS_ADDRESS.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	cli.apply_to_env();

	setup_logging().unwrap_or_else(|e| {
		error!("Failed to setup logging: {}", e);
	});

	let settings = RuntimeSettings::from_env()?;

	if cli.check {
		validate_configuration(&settings).await;
		return Ok(());
	}

	let chain_service = load_chains(&settings.config_dir).await.map_err(|e| {
		anyhow::anyhow!(
			"Failed to load chain configurations from {}: {}",
			settings.config_dir.display(),
			e
		)
	})?;

	let chains = chain_service.lock().await.get_sorted();
	if chains.is_empty() {
		info!("No chains configured. Exiting...");
		return Ok(());
	}

	let metrics_enabled =
		cli.metrics || var("METRICS_ENABLED").map(|v| v == "true").unwrap_or(false);

	let metrics_server = if metrics_enabled {
		let metrics_address = resolve_metrics_address(
			cli.metrics_address.as_deref(),
			var("IN_DOCKER").unwrap_or_default() == "true",
			var("METRICS_PORT").ok().as_deref(),
		);
		info!("Metrics server enabled, starting on {}", metrics_address);

		match create_metrics_server(metrics_address, chain_service.clone()) {
			Ok(server) => Some(server),
			Err(e) => {
				error!("Failed to create metrics server: {}", e);
				None
			}
		}
	} else {
		info!("Metrics server disabled. Use --metrics flag or METRICS_ENABLED=true to enable");
		None
	};

	let classifier = Arc::new(MethodClassifier::default());
	let checkpoints = create_checkpoint_store(&settings).await?;
	let sink = create_operation_sink(&settings).await?;
	let block_watcher = create_block_watcher_service(classifier, checkpoints, sink);

	let client_pool = ClientPool::new();
	let started = start_watchers(&block_watcher, &chains, &client_pool).await;
	if started == 0 {
		error!("No chain watcher could be started. Exiting...");
		return Ok(());
	}

	info!(
		"Service started with {} of {} chain watcher(s). Press Ctrl+C to shutdown",
		started,
		chains.len()
	);

	let ctrl_c = tokio::signal::ctrl_c();

	if let Some(metrics_future) = metrics_server {
		tokio::select! {
			result = ctrl_c => {
				if let Err(e) = result {
					error!("Error waiting for Ctrl+C: {}", e);
				}
				info!("Shutdown signal received, stopping services...");
			}
			result = metrics_future => {
				if let Err(e) = result {
					error!("Metrics server error: {}", e);
				}
				info!("Metrics server stopped, shutting down services...");
			}
		}
	} else {
		let _ = ctrl_c.await;
		info!("Shutdown signal received, stopping services...");
	}

	block_watcher.stop_all().await;

	info!("Shutdown complete");
	Ok(())
}

/// Validates configuration files and process settings
async fn validate_configuration(settings: &RuntimeSettings) {
	info!("Validating configuration files...");
	info!(
		"✓ Checkpoint backend: {:?}, sink backend: {:?}",
		settings.checkpoint_backend, settings.sink_backend
	);

	match load_chains(&settings.config_dir).await {
		Ok(service) => {
			let chains = service.lock().await.get_sorted();
			if chains.is_empty() {
				error!(
					"No chains found in {}. Add one JSON file per chain to watch.",
					settings.config_dir.display()
				);
				return;
			}
			for chain in &chains {
				info!(
					"✓ {} (chain id {}, router {})",
					chain.slug, chain.chain_id, chain.router_address
				);
			}
			info!("Configuration validation completed successfully!");
		}
		Err(e) => {
			error!("{}", e);
		}
	}
}
