use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
  common::logger::preview,
  protocol::tracks::TrackRecord,
  sources::{SourceManager, query},
};

/// Turns user queries into tracks using the registry's priority order.
#[derive(Clone)]
pub struct QueryResolver {
  manager: Arc<SourceManager>,
}

impl QueryResolver {
  pub fn new(manager: Arc<SourceManager>) -> Self {
    Self { manager }
  }

  /// The first source that validates the query is asked first. If it comes
  /// back empty, the remaining sources that validate the query (or search
  /// fallbacks, for free text) are tried in order. The first non-empty
  /// result wins; an empty list means "no results".
  pub async fn resolve(&self, query: &str) -> Vec<TrackRecord> {
    let query = query.trim();
    if query.is_empty() {
      return Vec::new();
    }

    let sources = self.manager.all();
    let Some(primary_idx) = sources.iter().position(|s| s.validate(query)) else {
      debug!("No source could handle query: {}", preview(query));
      return Vec::new();
    };

    let primary = &sources[primary_idx];
    trace!("Resolving '{}' with source: {}", preview(query), primary.name());
    let tracks = primary.resolve(query).await;
    if !tracks.is_empty() {
      return tracks;
    }

    let is_text = query::is_text(query);
    for (idx, fallback) in sources.iter().enumerate() {
      if idx == primary_idx {
        continue;
      }
      if !(fallback.validate(query) || (is_text && fallback.is_search_fallback())) {
        continue;
      }

      debug!(
        "{} returned nothing for '{}', falling back to {}",
        primary.name(),
        preview(query),
        fallback.name()
      );
      let tracks = fallback.resolve(query).await;
      if !tracks.is_empty() {
        return tracks;
      }
    }

    debug!("No results for: {}", preview(query));
    Vec::new()
  }

  /// Related tracks from the source that produced `track`.
  pub async fn related(&self, track: &TrackRecord, history: &[TrackRecord]) -> Vec<TrackRecord> {
    match self.manager.get(track.source_id()) {
      Some(source) => source.related_tracks(track, history).await,
      None => Vec::new(),
    }
  }
}
