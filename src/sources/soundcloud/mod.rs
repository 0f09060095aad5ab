pub mod api;
pub mod stream;
pub mod token;
pub mod track;

use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use self::{api::SoundCloudApi, api::id_string, track::to_track};
use crate::{
  common::{errors::SourceError, logger::preview},
  configs::Config,
  protocol::tracks::{SourceId, StreamLocator, TrackRecord},
  sources::{SourcePlugin, StreamChain, query},
};

struct Session {
  api: Arc<SoundCloudApi>,
  chain: StreamChain,
  search_limit: usize,
  playlist_load_limit: usize,
}

/// SoundCloud tracks, sets and free-text search.
///
/// Also the designated search fallback: free text that every other
/// adapter came back empty on ends up here.
pub struct SoundCloudSource {
  session: RwLock<Option<Arc<Session>>>,
}

impl SoundCloudSource {
  pub fn new() -> Self {
    Self {
      session: RwLock::new(None),
    }
  }

  fn session(&self) -> Option<Arc<Session>> {
    self.session.read().clone()
  }

  async fn load_url(&self, session: &Session, url: &str) -> Vec<TrackRecord> {
    let url = if url.contains("on.soundcloud.com") || url.contains("snd.sc") {
      match session.api.follow_redirects(url).await {
        Ok(target) => target,
        Err(e) => {
          warn!("SoundCloud: failed to follow short link {}: {}", url, e);
          return Vec::new();
        }
      }
    } else {
      url.to_string()
    };

    let json = match session.api.resolve_url(&url).await {
      Ok(json) => json,
      Err(e) => {
        debug!("SoundCloud: could not resolve {}: {}", url, e);
        return Vec::new();
      }
    };

    match json.get("kind").and_then(|v| v.as_str()) {
      Some("track") => vec![to_track(&json)],
      Some("playlist") => self.load_playlist(session, &json).await,
      other => {
        debug!("SoundCloud: unsupported resource kind {:?} for {}", other, url);
        Vec::new()
      }
    }
  }

  /// Set tracks beyond the first few come back as `{id}` stubs; those are
  /// hydrated in batches and put back in their original order.
  async fn load_playlist(&self, session: &Session, json: &Value) -> Vec<TrackRecord> {
    let items: Vec<&Value> = json
      .get("tracks")
      .and_then(|v| v.as_array())
      .map(|tracks| tracks.iter().take(session.playlist_load_limit).collect())
      .unwrap_or_default();

    let stub_ids: Vec<String> = items
      .iter()
      .filter(|t| t.get("title").is_none())
      .filter_map(|t| t.get("id").and_then(id_string))
      .collect();

    let mut hydrated: HashMap<String, Value> = HashMap::new();
    if !stub_ids.is_empty() {
      debug!("SoundCloud: hydrating {} playlist tracks", stub_ids.len());
      for full in session.api.tracks_by_ids(&stub_ids).await {
        if let Some(id) = full.get("id").and_then(id_string) {
          hydrated.insert(id, full);
        }
      }
    }

    items
      .into_iter()
      .filter_map(|item| {
        if item.get("title").is_some() {
          return Some(to_track(item));
        }
        let id = item.get("id").and_then(id_string)?;
        hydrated.get(&id).map(to_track)
      })
      .collect()
  }

  async fn search(&self, session: &Session, text: &str) -> Vec<TrackRecord> {
    match session.api.search_tracks(text, session.search_limit).await {
      Ok(items) => items
        .iter()
        .filter(|item| item.get("kind").and_then(|v| v.as_str()).is_none_or(|k| k == "track"))
        .map(to_track)
        .collect(),
      Err(e) => {
        warn!("SoundCloud: search failed for '{}': {}", preview(text), e);
        Vec::new()
      }
    }
  }
}

impl Default for SoundCloudSource {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl SourcePlugin for SoundCloudSource {
  fn id(&self) -> SourceId {
    SourceId::SoundCloud
  }

  async fn activate(&self, config: &Config) -> Result<(), SourceError> {
    let sc = &config.soundcloud;
    let api = SoundCloudApi::new(sc)
      .map(Arc::new)
      .map_err(|e| SourceError::init(self.id(), e.to_string()))?;

    api
      .client_id()
      .await
      .map_err(|_| SourceError::init(self.id(), "unable to obtain a client_id"))?;

    *self.session.write() = Some(Arc::new(Session {
      chain: stream::stream_chain(api.clone()),
      api,
      search_limit: sc.search_limit,
      playlist_load_limit: sc.playlist_load_limit,
    }));
    Ok(())
  }

  async fn deactivate(&self) {
    self.session.write().take();
  }

  fn validate(&self, q: &str) -> bool {
    query::is_soundcloud_url(q) || query::is_text(q)
  }

  fn is_search_fallback(&self) -> bool {
    true
  }

  async fn resolve(&self, q: &str) -> Vec<TrackRecord> {
    let q = q.trim();
    let Some(session) = self.session() else {
      return Vec::new();
    };

    if query::is_soundcloud_url(q) {
      self.load_url(&session, q).await
    } else if query::is_text(q) {
      self.search(&session, q).await
    } else {
      Vec::new()
    }
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
    let Some(id) = track.payload().get("id") else {
      return Vec::new();
    };

    let mut seen: HashSet<String> = history
      .iter()
      .filter_map(|h| h.payload().get("id").and_then(id_string))
      .collect();
    seen.extend(id_string(id));

    match session.api.related(id, session.search_limit).await {
      Ok(items) => items
        .iter()
        .filter(|item| {
          item
            .get("id")
            .and_then(id_string)
            .is_none_or(|related_id| !seen.contains(&related_id))
        })
        .map(to_track)
        .collect(),
      Err(e) => {
        debug!("SoundCloud: related lookup failed for '{}': {}", track.title(), e);
        Vec::new()
      }
    }
  }
}
