//! Chain configuration repository.
//!
//! Loads every chain description from the chains directory once at startup and serves
//! read-only copies to the bootstrap code and the metrics endpoint.

#![allow(clippy::result_large_err)]

use std::{collections::HashMap, path::Path};

use async_trait::async_trait;

use crate::{
	models::{ChainConfig, ConfigLoader},
	repositories::error::RepositoryError,
};

/// Chain configurations keyed by slug
#[derive(Clone)]
pub struct ChainRepository {
	pub chains: HashMap<String, ChainConfig>,
}

impl ChainRepository {
	/// Loads all chain configurations from `path`, or from the default directory when `None`.
	pub async fn new(path: Option<&Path>) -> Result<Self, RepositoryError> {
		let chains = Self::load_all(path).await?;
		Ok(ChainRepository { chains })
	}
}

/// Interface for chain repository implementations
#[async_trait]
pub trait ChainRepositoryTrait: Clone {
	async fn new(path: Option<&Path>) -> Result<Self, RepositoryError>
	where
		Self: Sized;

	async fn load_all(path: Option<&Path>)
		-> Result<HashMap<String, ChainConfig>, RepositoryError>;

	/// Returns `None` when no chain uses `slug`.
	fn get(&self, slug: &str) -> Option<ChainConfig>;

	fn get_all(&self) -> HashMap<String, ChainConfig>;
}

#[async_trait]
impl ChainRepositoryTrait for ChainRepository {
	async fn new(path: Option<&Path>) -> Result<Self, RepositoryError> {
		ChainRepository::new(path).await
	}

	async fn load_all(
		path: Option<&Path>,
	) -> Result<HashMap<String, ChainConfig>, RepositoryError> {
		ChainConfig::load_all(path).await.map_err(|e| {
			RepositoryError::load_error(
				"Failed to load chains",
				Some(Box::new(e)),
				Some(HashMap::from([(
					"path".to_string(),
					path.map_or_else(|| "default".to_string(), |p| p.display().to_string()),
				)])),
			)
		})
	}

	fn get(&self, slug: &str) -> Option<ChainConfig> {
		self.chains.get(slug).cloned()
	}

	fn get_all(&self) -> HashMap<String, ChainConfig> {
		self.chains.clone()
	}
}

/// Service layer over a chain repository
#[derive(Clone)]
pub struct ChainService<T: ChainRepositoryTrait> {
	repository: T,
}

impl<T: ChainRepositoryTrait> ChainService<T> {
	pub async fn new(path: Option<&Path>) -> Result<ChainService<ChainRepository>, RepositoryError> {
		let repository = ChainRepository::new(path).await?;
		Ok(ChainService { repository })
	}

	pub fn new_with_repository(repository: T) -> Result<Self, RepositoryError> {
		Ok(ChainService { repository })
	}

	pub fn get(&self, slug: &str) -> Option<ChainConfig> {
		self.repository.get(slug)
	}

	pub fn get_all(&self) -> HashMap<String, ChainConfig> {
		self.repository.get_all()
	}

	/// Chains sorted by slug, for deterministic startup order.
	pub fn get_sorted(&self) -> Vec<ChainConfig> {
		let mut chains: Vec<ChainConfig> = self.get_all().into_values().collect();
		chains.sort_by(|a, b| a.slug.cmp(&b.slug));
		chains
	}
}
