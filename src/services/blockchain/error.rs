//! Chain client error types.
//!
//! None of these log on construction. Block-not-found is routine while waiting for the next
//! block and recovery failures are per transaction; the watcher decides how loud to be.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

#[derive(ThisError, Debug)]
pub enum BlockChainError {
	/// Node unreachable or transport failure
	#[error("Connection error: {0}")]
	ConnectionError(ErrorContext),

	/// JSON-RPC error object or malformed response
	#[error("Request error: {0}")]
	RequestError(ErrorContext),

	/// The node returned `null` for the requested block
	#[error("Block not found: {0}")]
	BlockNotFound(ErrorContext),

	/// Sender could not be recovered from the transaction signature
	#[error("Recovery error: {0}")]
	RecoveryError(ErrorContext),

	/// Client construction failures
	#[error("Internal error: {0}")]
	InternalError(ErrorContext),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl BlockChainError {
	pub fn connection_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ConnectionError(ErrorContext::new(msg, source, metadata))
	}

	pub fn request_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::RequestError(ErrorContext::new(msg, source, metadata))
	}

	pub fn block_not_found(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::BlockNotFound(ErrorContext::new(msg, source, metadata))
	}

	pub fn recovery_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::RecoveryError(ErrorContext::new(msg, source, metadata))
	}

	pub fn internal_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InternalError(ErrorContext::new(msg, source, metadata))
	}
}

impl TraceableError for BlockChainError {
	fn trace_id(&self) -> String {
		match self {
			Self::ConnectionError(ctx)
			| Self::RequestError(ctx)
			| Self::BlockNotFound(ctx)
			| Self::RecoveryError(ctx)
			| Self::InternalError(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
