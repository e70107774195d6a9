//! Block watcher and checkpoint error types.
//!
//! Errors are built without logging; the watcher loop picks the level (a block that is not yet
//! mined is routine, a failed persist is not).

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Errors raised while running a chain watcher
#[derive(ThisError, Debug)]
pub enum BlockWatcherError {
	/// The chain client could not be reached or answered unexpectedly
	#[error("Network error: {0}")]
	NetworkError(ErrorContext),

	/// A block or its transactions could not be processed
	#[error("Processing error: {0}")]
	ProcessingError(ErrorContext),

	/// Checkpoint or sink failures
	#[error("Storage error: {0}")]
	StorageError(ErrorContext),

	/// Misconfigured chain, such as a chain id mismatch; fatal for that chain only
	#[error("Configuration error: {0}")]
	ConfigError(ErrorContext),

	/// Starting a second watcher for the same chain
	#[error("Watcher already running: {0}")]
	AlreadyRunning(ErrorContext),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl BlockWatcherError {
	pub fn network_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::NetworkError(ErrorContext::new(msg, source, metadata))
	}

	pub fn processing_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ProcessingError(ErrorContext::new(msg, source, metadata))
	}

	pub fn storage_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::StorageError(ErrorContext::new(msg, source, metadata))
	}

	pub fn config_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ConfigError(ErrorContext::new(msg, source, metadata))
	}

	pub fn already_running(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::AlreadyRunning(ErrorContext::new(msg, source, metadata))
	}
}

impl TraceableError for BlockWatcherError {
	fn trace_id(&self) -> String {
		match self {
			Self::NetworkError(ctx)
			| Self::ProcessingError(ctx)
			| Self::StorageError(ctx)
			| Self::ConfigError(ctx)
			| Self::AlreadyRunning(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}

/// Errors raised by checkpoint stores
#[derive(ThisError, Debug)]
pub enum CheckpointError {
	#[error("Checkpoint read error: {0}")]
	ReadError(ErrorContext),

	#[error("Checkpoint write error: {0}")]
	WriteError(ErrorContext),

	/// Backend unreachable (Redis down, directory missing)
	#[error("Checkpoint connection error: {0}")]
	ConnectionError(ErrorContext),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl CheckpointError {
	pub fn read_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ReadError(ErrorContext::new(msg, source, metadata))
	}

	pub fn write_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::WriteError(ErrorContext::new(msg, source, metadata))
	}

	pub fn connection_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ConnectionError(ErrorContext::new(msg, source, metadata))
	}
}

impl TraceableError for CheckpointError {
	fn trace_id(&self) -> String {
		match self {
			Self::ReadError(ctx) | Self::WriteError(ctx) | Self::ConnectionError(ctx) => {
				ctx.trace_id.clone()
			}
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
