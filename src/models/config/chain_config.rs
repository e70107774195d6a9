//! Chain configuration loading and validation.
//!
//! Each JSON file in the chains directory describes one chain to watch.

use alloy::primitives::Address;
use async_trait::async_trait;
use std::{collections::HashMap, path::Path, str::FromStr};

use crate::{
	models::{config::error::ConfigError, ChainConfig, ConfigLoader},
	utils::{normalize_string, DEFAULT_CHAIN_CONFIG_DIR},
};

fn path_metadata(path: &Path) -> Option<HashMap<String, String>> {
	Some(HashMap::from([(
		"path".to_string(),
		path.display().to_string(),
	)]))
}

impl ChainConfig {
	/// Parsed router address. Only fails for configs that skipped validation.
	pub fn router(&self) -> Result<Address, ConfigError> {
		Address::from_str(self.router_address.trim()).map_err(|e| {
			ConfigError::validation_error(
				format!("Invalid router address: {}", self.router_address),
				Some(Box::new(e)),
				Some(HashMap::from([("chain".to_string(), self.slug.clone())])),
			)
		})
	}
}

#[async_trait]
impl ConfigLoader for ChainConfig {
	async fn load_all<T>(path: Option<&Path>) -> Result<T, ConfigError>
	where
		T: FromIterator<(String, Self)>,
	{
		let chain_dir = path.unwrap_or(Path::new(DEFAULT_CHAIN_CONFIG_DIR));

		if !chain_dir.exists() {
			return Err(ConfigError::file_error(
				"chains directory not found",
				None,
				path_metadata(chain_dir),
			));
		}

		let mut entries = tokio::fs::read_dir(chain_dir).await.map_err(|e| {
			ConfigError::file_error(
				format!("failed to read chains directory: {}", e),
				Some(Box::new(e)),
				path_metadata(chain_dir),
			)
		})?;

		let mut pairs: Vec<(String, ChainConfig)> = Vec::new();
		while let Some(entry) = entries.next_entry().await.map_err(|e| {
			ConfigError::file_error(
				format!("failed to read directory entry: {}", e),
				Some(Box::new(e)),
				path_metadata(chain_dir),
			)
		})? {
			let path = entry.path();
			if !Self::is_json_file(&path) {
				continue;
			}

			let chain = Self::load_from_path(&path).await?;

			let existing: Vec<&ChainConfig> = pairs.iter().map(|(_, c)| c).collect();
			Self::validate_uniqueness(&existing, &chain, &path.display().to_string())?;

			pairs.push((chain.slug.clone(), chain));
		}

		Ok(T::from_iter(pairs))
	}

	async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
		let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::file_error(
				format!("failed to open chain config file: {}", e),
				Some(Box::new(e)),
				path_metadata(path),
			)
		})?;

		let config: ChainConfig = serde_json::from_str(&raw).map_err(|e| {
			ConfigError::parse_error(
				format!("failed to parse chain config: {}", e),
				Some(Box::new(e)),
				path_metadata(path),
			)
		})?;

		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.name.trim().is_empty() {
			return Err(ConfigError::validation_error(
				"Chain name is required",
				None,
				None,
			));
		}

		if self.slug.is_empty()
			|| !self
				.slug
				.chars()
				.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
		{
			return Err(ConfigError::validation_error(
				"Slug must contain only lowercase letters, numbers, and underscores",
				None,
				None,
			));
		}

		if self.rpc_urls.is_empty() {
			return Err(ConfigError::validation_error(
				"At least one RPC URL is required",
				None,
				None,
			));
		}

		if !self.rpc_urls.iter().all(|rpc_url| rpc_url.type_ == "rpc") {
			return Err(ConfigError::validation_error(
				"RPC URL type must be one of: rpc",
				None,
				None,
			));
		}

		if !self.rpc_urls.iter().all(|rpc_url| {
			rpc_url.url.starts_with("http://") || rpc_url.url.starts_with("https://")
		}) {
			return Err(ConfigError::validation_error(
				"All RPC URLs must start with http:// or https://",
				None,
				None,
			));
		}

		if !self.rpc_urls.iter().all(|rpc_url| rpc_url.weight <= 100) {
			return Err(ConfigError::validation_error(
				"All RPC URL weights must be between 0 and 100",
				None,
				None,
			));
		}

		self.router()?;

		if self.block_time_ms == 0 {
			return Err(ConfigError::validation_error(
				"Block time must be greater than 0",
				None,
				None,
			));
		}

		if self.deviation_ms > self.block_time_ms {
			tracing::warn!(
				"Chain '{}' deviation ({}ms) exceeds block time ({}ms); pacing will never sleep",
				self.slug,
				self.deviation_ms,
				self.block_time_ms
			);
		}

		self.validate_protocol();

		Ok(())
	}

	fn validate_protocol(&self) {
		for rpc_url in &self.rpc_urls {
			if rpc_url.url.starts_with("http://") {
				tracing::warn!(
					"Chain '{}' uses an insecure RPC URL: {}",
					self.slug,
					rpc_url.url
				);
			}
		}
	}

	fn validate_uniqueness(
		instances: &[&Self],
		current_instance: &Self,
		file_path: &str,
	) -> Result<(), ConfigError> {
		let duplicate = |field: &str, value: String| {
			ConfigError::validation_error(
				format!("Duplicate chain {} found: '{}'", field, value),
				None,
				Some(HashMap::from([
					(format!("chain_{}", field), value),
					("path".to_string(), file_path.to_string()),
				])),
			)
		};

		for existing in instances {
			if normalize_string(&existing.slug) == normalize_string(&current_instance.slug) {
				return Err(duplicate("slug", current_instance.slug.clone()));
			}
			if existing.chain_id == current_instance.chain_id {
				return Err(duplicate("chain_id", current_instance.chain_id.to_string()));
			}
		}
		Ok(())
	}
}
