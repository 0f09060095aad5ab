pub mod extractor;
pub mod formats;
pub mod innertube;
pub mod stream;
pub mod track;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, warn};

use self::{
  extractor::{extract_from_player, extract_search},
  innertube::{ClientProfile, InnertubeClient},
  track::track_builder,
};
use crate::{
  common::{errors::SourceError, logger::preview},
  configs::{Config, InnertubeConfig},
  protocol::{
    format::RawUnit,
    tracks::{SourceId, StreamLocator, TrackRecord},
  },
  sources::{SourcePlugin, StreamChain, query},
};

pub(crate) struct Session {
  pub client: Arc<InnertubeClient>,
  pub chain: StreamChain,
  pub search_limit: usize,
}

impl Session {
  pub fn open(source_id: SourceId, config: &InnertubeConfig) -> Result<Self, SourceError> {
    let client = InnertubeClient::new(config)
      .map(Arc::new)
      .map_err(|e| SourceError::init(source_id, e.to_string()))?;
    Ok(Self {
      chain: stream::stream_chain(client.clone()),
      client,
      search_limit: config.search_limit,
    })
  }

  /// Player payload for a single video URL.
  pub async fn load_video(&self, url: &str) -> Option<serde_json::Value> {
    let id = query::youtube_video_id(url)?;
    match self.client.player(&id, ClientProfile::AndroidVr).await {
      Ok(body) => extract_from_player(&body),
      Err(e) => {
        debug!("YouTube: could not load {}: {}", id, e);
        None
      }
    }
  }

  /// Search payloads, capped at the configured limit.
  pub async fn search(&self, text: &str) -> Vec<serde_json::Value> {
    match self.client.search(text).await {
      Ok(body) => extract_search(&body)
        .into_iter()
        .take(self.search_limit)
        .collect(),
      Err(e) => {
        warn!("YouTube: search failed for '{}': {}", preview(text), e);
        Vec::new()
      }
    }
  }
}

/// YouTube videos by URL.
pub struct YouTubeSource {
  session: RwLock<Option<Arc<Session>>>,
}

impl YouTubeSource {
  pub fn new() -> Self {
    Self {
      session: RwLock::new(None),
    }
  }

  fn session(&self) -> Option<Arc<Session>> {
    self.session.read().clone()
  }
}

impl Default for YouTubeSource {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl SourcePlugin for YouTubeSource {
  fn id(&self) -> SourceId {
    SourceId::YouTube
  }

  async fn activate(&self, config: &Config) -> Result<(), SourceError> {
    let session = Session::open(self.id(), &config.youtube)?;
    *self.session.write() = Some(Arc::new(session));
    Ok(())
  }

  async fn deactivate(&self) {
    self.session.write().take();
  }

  fn validate(&self, q: &str) -> bool {
    query::is_youtube_url(q)
  }

  /// URLs load the single video. Free text is searched too, for callers
  /// that reach this adapter directly.
  async fn resolve(&self, q: &str) -> Vec<TrackRecord> {
    let q = q.trim();
    let Some(session) = self.session() else {
      return Vec::new();
    };

    let payloads = if query::is_youtube_url(q) {
      session.load_video(q).await.into_iter().collect()
    } else if query::is_text(q) {
      session.search(q).await
    } else {
      Vec::new()
    };

    payloads
      .iter()
      .map(|p| track_builder(p, SourceId::YouTube, RawUnit::Seconds).build())
      .collect()
  }

  async fn stream(&self, track: &TrackRecord) -> Result<StreamLocator, SourceError> {
    let session = self
      .session()
      .ok_or(SourceError::AdapterUnavailable(self.id()))?;
    session.chain.run(track).await
  }
}

#[cfg(test)]
mod tests {
  use axum::{Json, Router, routing::post};
  use serde_json::{Value, json};

  use super::*;
  use crate::sources::testing::{bind, spawn};

  async fn active_source() -> YouTubeSource {
    let (listener, base) = bind().await;
    let router = Router::new()
      .route(
        "/youtubei/v1/player",
        post(|Json(body): Json<Value>| async move {
          Json(json!({
            "playabilityStatus": { "status": "OK" },
            "videoDetails": {
              "videoId": body["videoId"],
              "title": "Never Gonna Give You Up",
              "author": "Rick Astley",
              "lengthSeconds": "213",
              "viewCount": "1500000000"
            },
            "streamingData": { "adaptiveFormats": [
              { "itag": 251, "mimeType": "audio/webm", "url": "https://rr1.googlevideo.com/251" }
            ]}
          }))
        }),
      )
      .route(
        "/youtubei/v1/search",
        post(|| async {
          let hits: Vec<Value> = (0..12)
            .map(|i| json!({ "videoRenderer": {
              "videoId": format!("vid{:08}", i),
              "title": { "simpleText": format!("Result {}", i) },
              "lengthText": { "simpleText": "4:01" }
            }}))
            .collect();
          Json(json!({ "contents": { "sectionListRenderer": { "contents": [
            { "itemSectionRenderer": { "contents": hits } }
          ]}}}))
        }),
      );
    spawn(listener, router);

    let mut config = Config::default();
    config.youtube.innertube_url = base;
    let source = YouTubeSource::new();
    source.activate(&config).await.unwrap();
    source
  }

  #[test]
  fn validates_youtube_links_only() {
    let source = YouTubeSource::new();
    assert!(source.validate("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
    assert!(source.validate("https://youtu.be/dQw4w9WgXcQ"));
    assert!(source.validate("https://www.youtube.com/shorts/dQw4w9WgXcQ"));
    assert!(!source.validate("never gonna give you up"));
    assert!(!source.validate("https://soundcloud.com/artist/song"));
    assert!(!source.validate("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC"));
    assert!(!source.validate(""));
  }

  #[tokio::test]
  async fn url_loads_player_details() {
    let source = active_source().await;
    let tracks = source
      .resolve("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
      .await;

    assert_eq!(tracks.len(), 1);
    let track = &tracks[0];
    assert_eq!(track.title(), "Never Gonna Give You Up");
    assert_eq!(track.duration_display(), "3:33");
    assert_eq!(track.view_count(), 1_500_000_000);
    assert_eq!(track.url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    assert_eq!(track.metadata()["videoId"], "dQw4w9WgXcQ");
    assert_eq!(track.payload()["streamUrl"], "https://rr1.googlevideo.com/251");

    let locator = source.stream(track).await.unwrap();
    assert_eq!(locator.url, "https://rr1.googlevideo.com/251");
  }

  #[tokio::test]
  async fn text_search_is_capped() {
    let source = active_source().await;
    let tracks = source.resolve("rick astley").await;
    assert_eq!(tracks.len(), 10);
    assert_eq!(tracks[0].duration_display(), "4:01");
    assert_eq!(tracks[0].source_id(), SourceId::YouTube);
  }

  #[tokio::test]
  async fn empty_query_yields_nothing() {
    let source = active_source().await;
    assert!(source.resolve("").await.is_empty());
    assert!(source.resolve("https://example.com/a.mp3").await.is_empty());
  }
}
