//! Cache of chain clients keyed by chain slug.
//!
//! Clients are created lazily on first request and shared afterwards.

use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use crate::{
	models::ChainConfig,
	services::blockchain::{
		BlockChainError, ChainClient, EvmClient, HttpTransportClient,
	},
};

#[async_trait]
pub trait ClientPoolTrait: Send + Sync {
	type EvmClient: ChainClient + 'static;

	async fn get_evm_client(
		&self,
		chain: &ChainConfig,
	) -> Result<Arc<Self::EvmClient>, BlockChainError>;
}

#[derive(Default)]
pub struct ClientPool {
	clients: RwLock<HashMap<String, Arc<EvmClient<HttpTransportClient>>>>,
}

impl ClientPool {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn client_count(&self) -> usize {
		self.clients.read().await.len()
	}
}

#[async_trait]
impl ClientPoolTrait for ClientPool {
	type EvmClient = EvmClient<HttpTransportClient>;

	async fn get_evm_client(
		&self,
		chain: &ChainConfig,
	) -> Result<Arc<Self::EvmClient>, BlockChainError> {
		if let Some(client) = self.clients.read().await.get(&chain.slug) {
			return Ok(client.clone());
		}

		let mut clients = self.clients.write().await;
		// Another task may have created it while we waited for the write lock
		if let Some(client) = clients.get(&chain.slug) {
			return Ok(client.clone());
		}
		let client = Arc::new(EvmClient::new(chain)?);
		clients.insert(chain.slug.clone(), client.clone());
		Ok(client)
	}
}
