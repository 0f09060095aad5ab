use serde::Serialize;
use thiserror::Error;

use crate::{common::types::now_ms, protocol::tracks::SourceId};

/// Failures a source can surface to its callers.
///
/// Resolution never fails (an empty track list is a valid answer), so the
/// only variants here belong to adapter start-up and stream extraction.
#[derive(Debug, Error)]
pub enum SourceError {
  /// The provider session could not be established. The adapter is left
  /// out of the registry.
  #[error("{source_id} failed to initialize: {message}")]
  Initialization { source_id: SourceId, message: String },

  /// Every extraction strategy for the track has been exhausted.
  #[error("no playable stream for '{title}' ({source_id})")]
  StreamUnavailable { source_id: SourceId, title: String },

  /// The adapter that produced the track is not active anymore.
  #[error("source {0} is not active")]
  AdapterUnavailable(SourceId),
}

impl SourceError {
  pub fn init(source_id: SourceId, message: impl Into<String>) -> Self {
    Self::Initialization {
      source_id,
      message: message.into(),
    }
  }
}

/// JSON error body returned by the REST surface.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
  /// Unix timestamp in milliseconds.
  pub timestamp: u64,
  /// HTTP status code.
  pub status: u16,
  /// HTTP status reason phrase (e.g. "Not Found").
  pub error: String,
  /// Human-readable error message.
  pub message: String,
  /// The request path that caused the error.
  pub path: String,
}

impl ApiError {
  fn with_status(status: u16, error: &str, message: impl Into<String>, path: &str) -> Self {
    Self {
      timestamp: now_ms(),
      status,
      error: error.into(),
      message: message.into(),
      path: path.into(),
    }
  }

  pub fn not_found(message: impl Into<String>, path: &str) -> Self {
    Self::with_status(404, "Not Found", message, path)
  }

  pub fn bad_gateway(message: impl Into<String>, path: &str) -> Self {
    Self::with_status(502, "Bad Gateway", message, path)
  }
}
