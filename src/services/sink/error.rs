//! Operation sink error types.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Failures while persisting sender operations
#[derive(ThisError, Debug)]
pub enum SinkError {
	/// The backing store rejected or failed the write
	#[error("Write error: {0}")]
	WriteError(ErrorContext),

	/// The backing store could not be reached or opened
	#[error("Connection error: {0}")]
	ConnectionError(ErrorContext),

	/// A record could not be encoded
	#[error("Serialization error: {0}")]
	SerializationError(ErrorContext),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl SinkError {
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

	pub fn serialization_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::SerializationError(ErrorContext::new(msg, source, metadata))
	}
}

impl TraceableError for SinkError {
	fn trace_id(&self) -> String {
		match self {
			Self::WriteError(ctx) | Self::ConnectionError(ctx) | Self::SerializationError(ctx) => {
				ctx.trace_id.clone()
			}
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
