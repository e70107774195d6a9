//! Active/fallback endpoint bookkeeping and request dispatch with rotation.

use reqwest_middleware::ClientWithMiddleware;
use serde_json::{json, Value};
use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
};
use tokio::sync::RwLock;

use crate::services::blockchain::transports::{TransportError, ROTATE_ON_ERROR_CODES};

/// Tracks the active RPC endpoint and rotates through fallbacks on failure.
///
/// Rotation moves the first fallback to the active slot and appends the previously active URL
/// to the end of the fallback list, so repeated failures cycle through every endpoint.
#[derive(Clone, Debug)]
pub struct EndpointManager {
	pub active_url: Arc<RwLock<String>>,
	pub fallback_urls: Arc<RwLock<Vec<String>>>,
	client: ClientWithMiddleware,
	rotation_lock: Arc<tokio::sync::Mutex<()>>,
	request_id: Arc<AtomicU64>,
}

impl EndpointManager {
	pub fn new(client: ClientWithMiddleware, active_url: &str, fallback_urls: Vec<String>) -> Self {
		Self {
			active_url: Arc::new(RwLock::new(active_url.to_string())),
			fallback_urls: Arc::new(RwLock::new(fallback_urls)),
			client,
			rotation_lock: Arc::new(tokio::sync::Mutex::new(())),
			request_id: Arc::new(AtomicU64::new(1)),
		}
	}

	/// Rotates to the next fallback. Returns the new active URL.
	///
	/// `failed_url` guards against double rotation when several requests fail on the same
	/// endpoint at once: if another request already rotated away from it, nothing changes.
	pub async fn rotate_url(&self, failed_url: &str) -> Result<String, TransportError> {
		let _guard = self.rotation_lock.lock().await;

		let mut active = self.active_url.write().await;
		if active.as_str() != failed_url {
			return Ok(active.clone());
		}

		let mut fallbacks = self.fallback_urls.write().await;
		if fallbacks.is_empty() {
			return Err(TransportError::url_rotation(
				format!("No fallback URLs available. Current active: '{}'", active),
				None,
				None,
			));
		}

		let next = fallbacks.remove(0);
		fallbacks.push(active.clone());
		tracing::debug!(from = %active, to = %next, "Rotated RPC endpoint");
		*active = next.clone();

		Ok(next)
	}

	fn request_body(&self, method: &str, params: Option<Value>) -> Value {
		json!({
			"jsonrpc": "2.0",
			"id": self.request_id.fetch_add(1, Ordering::Relaxed),
			"method": method,
			"params": params.unwrap_or_else(|| json!([])),
		})
	}

	/// Sends a JSON-RPC request, rotating endpoints on rate limiting or network failure.
	///
	/// Every configured endpoint is tried at most once per call.
	pub async fn send_raw_request(
		&self,
		method: &str,
		params: Option<Value>,
	) -> Result<Value, TransportError> {
		let max_attempts = self.fallback_urls.read().await.len() + 1;
		let body = self.request_body(method, params);
		let mut attempt = 0;

		loop {
			attempt += 1;
			let url = self.active_url.read().await.clone();

			let error = match self.client.post(url.as_str()).json(&body).send().await {
				Ok(response) => {
					let status = response.status();
					if status.is_success() {
						return response.json().await.map_err(|e| {
							TransportError::response_parse(
								"Failed to parse JSON response",
								Some(Box::new(e)),
								Some(HashMap::from([
									("url".to_string(), url.clone()),
									("method".to_string(), method.to_string()),
								])),
							)
						});
					}

					let error_body = response.text().await.unwrap_or_default();
					let error = TransportError::http(status, url.clone(), error_body, None, None);
					if !ROTATE_ON_ERROR_CODES.contains(&status.as_u16()) {
						return Err(error);
					}
					error
				}
				Err(e) => TransportError::network(
					e.to_string(),
					Some(Box::new(e)),
					Some(HashMap::from([("url".to_string(), url.clone())])),
				),
			};

			tracing::warn!(url = %url, method, error = %error, "RPC request failed");

			if attempt >= max_attempts {
				return Err(error);
			}
			if self.rotate_url(&url).await.is_err() {
				return Err(error);
			}
		}
	}
}
