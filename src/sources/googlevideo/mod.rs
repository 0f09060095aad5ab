use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::{
  common::errors::SourceError,
  configs::Config,
  protocol::{
    format::RawUnit,
    tracks::{SourceId, StreamLocator, TrackRecord},
  },
  sources::{
    SourcePlugin,
    query::{self, QueryKind},
    youtube::{Session, extractor::extract_next, track::track_builder},
  },
};

const QUALITY_LABEL: &str = "SABR (High Quality)";

/// YouTube through googlevideo's direct media endpoints.
///
/// Unlike the YouTube adapter it also answers free-text searches, and it
/// can suggest "up next" tracks.
pub struct GoogleVideoSource {
  session: RwLock<Option<Arc<Session>>>,
}

impl GoogleVideoSource {
  pub fn new() -> Self {
    Self {
      session: RwLock::new(None),
    }
  }

  fn session(&self) -> Option<Arc<Session>> {
    self.session.read().clone()
  }

  fn to_track(payload: &Value) -> TrackRecord {
    track_builder(payload, SourceId::YouTubeSabr, RawUnit::Millis)
      .meta("quality", Some(&Value::from(QUALITY_LABEL)))
      .build()
  }
}

impl Default for GoogleVideoSource {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl SourcePlugin for GoogleVideoSource {
  fn id(&self) -> SourceId {
    SourceId::YouTubeSabr
  }

  async fn activate(&self, config: &Config) -> Result<(), SourceError> {
    let session = Session::open(self.id(), &config.googlevideo)?;
    *self.session.write() = Some(Arc::new(session));
    debug!("youtube-sabr: session ready");
    Ok(())
  }

  async fn deactivate(&self) {
    self.session.write().take();
    debug!("youtube-sabr: session closed");
  }

  /// YouTube URLs and free text; links to any other host are refused.
  fn validate(&self, q: &str) -> bool {
    match query::classify(q) {
      QueryKind::Empty => false,
      QueryKind::Link => query::is_youtube_url(q),
      QueryKind::Text => true,
    }
  }

  async fn resolve(&self, q: &str) -> Vec<TrackRecord> {
    let q = q.trim();
    let Some(session) = self.session() else {
      return Vec::new();
    };

    let payloads = match query::classify(q) {
      QueryKind::Link if query::is_youtube_url(q) => {
        session.load_video(q).await.into_iter().collect()
      }
      QueryKind::Text => session.search(q).await,
      _ => Vec::new(),
    };

    payloads.iter().map(Self::to_track).collect()
  }

  async fn stream(&self, track: &TrackRecord) -> Result<StreamLocator, SourceError> {
    let session = self
      .session()
      .ok_or(SourceError::AdapterUnavailable(self.id()))?;
    session.chain.run(track).await
  }

  async fn related_tracks(&self, track: &TrackRecord, history: &[TrackRecord]) -> Vec<TrackRecord> {
    let Some(session) = self.session() else {
      return Vec::new();
    };
    let Some(id) = track
      .payload()
      .get("videoId")
      .and_then(|v| v.as_str())
      .map(str::to_string)
      .or_else(|| query::youtube_video_id(track.url()))
    else {
      return Vec::new();
    };

    let seen = |candidate: &TrackRecord| {
      history.iter().any(|h| h.url() == candidate.url())
    };

    match session.client.next(&id).await {
      Ok(body) => extract_next(&body, &id)
        .iter()
        .map(Self::to_track)
        .filter(|t| !seen(t))
        .take(session.search_limit)
        .collect(),
      Err(e) => {
        debug!("youtube-sabr: related lookup failed for {}: {}", id, e);
        Vec::new()
      }
    }
  }
}
