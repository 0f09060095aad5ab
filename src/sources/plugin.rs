use std::sync::Arc;

use async_trait::async_trait;

use crate::{
  common::errors::SourceError,
  configs::Config,
  protocol::tracks::{SourceId, StreamLocator, TrackRecord},
};

pub type BoxedSource = Arc<dyn SourcePlugin>;

/// Trait that all source adapters must implement.
///
/// Each adapter wraps one provider (YouTube, SoundCloud, ...) and owns its
/// own session; nothing is shared between adapters.
#[async_trait]
pub trait SourcePlugin: Send + Sync {
  /// Identifier stamped on every track this adapter produces.
  fn id(&self) -> SourceId;

  fn name(&self) -> &'static str {
    self.id().as_str()
  }

  /// Establishes the provider session. Called once by the registry; on
  /// error the adapter is left out of the registry.
  async fn activate(&self, config: &Config) -> Result<(), SourceError>;

  /// Tears the session down.
  async fn deactivate(&self) {}

  /// Whether `resolve` is expected to handle the query. Must not do I/O.
  fn validate(&self, query: &str) -> bool;

  /// General-purpose text search provider, tried for free text even when
  /// it was not the first adapter to validate the query.
  fn is_search_fallback(&self) -> bool {
    false
  }

  /// Resolves a query into tracks. Provider failures degrade to an empty
  /// list; this never errors.
  async fn resolve(&self, query: &str) -> Vec<TrackRecord>;

  /// Produces a playable locator, trying every extraction strategy the
  /// adapter knows before failing.
  async fn stream(&self, track: &TrackRecord) -> Result<StreamLocator, SourceError>;

  /// Tracks related to `track`. Adapters without support return nothing.
  async fn related_tracks(
    &self,
    _track: &TrackRecord,
    _history: &[TrackRecord],
  ) -> Vec<TrackRecord> {
    Vec::new()
  }
}
