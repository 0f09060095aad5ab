use std::sync::Arc;

use async_trait::async_trait;

use super::{
  formats::stream_locator,
  innertube::{ClientProfile, InnertubeClient},
};
use crate::{
  protocol::tracks::{StreamLocator, TrackRecord},
  sources::{
    query,
    stream::{ExtractionFailure, StreamChain, StreamStrategy},
  },
};

/// Fallback order for InnerTube-backed tracks: a fresh player request, the
/// URL captured at resolve time, then a player request under another client.
pub fn stream_chain(client: Arc<InnertubeClient>) -> StreamChain {
  StreamChain::new()
    .then(PlayerRequest {
      name: "player",
      client: client.clone(),
      profile: ClientProfile::AndroidVr,
    })
    .then(CachedMediaUrl)
    .then(PlayerRequest {
      name: "player-refetch",
      client,
      profile: ClientProfile::Ios,
    })
}

fn video_id(track: &TrackRecord) -> Option<String> {
  track
    .payload()
    .get("videoId")
    .and_then(|v| v.as_str())
    .map(str::to_string)
    .or_else(|| query::youtube_video_id(track.url()))
}

pub struct PlayerRequest {
  name: &'static str,
  client: Arc<InnertubeClient>,
  profile: ClientProfile,
}

#[async_trait]
impl StreamStrategy for PlayerRequest {
  fn name(&self) -> &'static str {
    self.name
  }

  async fn extract(&self, track: &TrackRecord) -> Result<StreamLocator, ExtractionFailure> {
    let id = video_id(track).ok_or(ExtractionFailure::Missing("videoId"))?;
    let body = self.client.player(&id, self.profile).await?;

    let is_live = track.is_live()
      || body
        .pointer("/videoDetails/isLive")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let streaming_data = body
      .get("streamingData")
      .ok_or(ExtractionFailure::Missing("streamingData"))?;

    stream_locator(streaming_data, is_live).ok_or(ExtractionFailure::Missing("playable format"))
  }
}

/// The direct URL (or live manifest) stored on the payload at resolve time.
pub struct CachedMediaUrl;

#[async_trait]
impl StreamStrategy for CachedMediaUrl {
  fn name(&self) -> &'static str {
    "cached-url"
  }

  async fn extract(&self, track: &TrackRecord) -> Result<StreamLocator, ExtractionFailure> {
    let payload = track.payload();
    let field = |key: &str| {
      payload
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
    };

    if let Some(url) = field("streamUrl") {
      return Ok(StreamLocator::progressive(url).with_mime(field("mimeType")));
    }
    field("hlsManifestUrl")
      .map(StreamLocator::hls)
      .ok_or(ExtractionFailure::Missing("streamUrl"))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use axum::{Json, Router, extract::State, routing::post};
  use serde_json::{Value, json};

  use super::*;
  use crate::{
    configs::InnertubeConfig,
    protocol::tracks::{SourceId, StreamProtocol},
    sources::testing::{bind, spawn},
  };

  fn client_for(base: &str) -> Arc<InnertubeClient> {
    Arc::new(
      InnertubeClient::new(&InnertubeConfig {
        innertube_url: base.to_string(),
        ..Default::default()
      })
      .unwrap(),
    )
  }

  fn track(payload: Value) -> TrackRecord {
    TrackRecord::builder(SourceId::YouTube, payload)
      .title(Some("Song"))
      .url(Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ"))
      .build()
  }

  #[tokio::test]
  async fn cached_url_used_when_player_fails() {
    let (listener, base) = bind().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
      .route(
        "/youtubei/v1/player",
        post(|State(calls): State<Arc<AtomicUsize>>| async move {
          calls.fetch_add(1, Ordering::SeqCst);
          Json(json!({ "playabilityStatus": { "status": "UNPLAYABLE" } }))
        }),
      )
      .with_state(calls.clone());
    spawn(listener, router);

    let locator = stream_chain(client_for(&base))
      .run(&track(json!({
        "videoId": "dQw4w9WgXcQ",
        "streamUrl": "https://rr1.googlevideo.com/cached",
        "mimeType": "audio/webm"
      })))
      .await
      .unwrap();

    assert_eq!(locator.url, "https://rr1.googlevideo.com/cached");
    assert_eq!(locator.mime_type.as_deref(), Some("audio/webm"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn refetch_uses_second_client() {
    let (listener, base) = bind().await;
    let router = Router::new().route(
      "/youtubei/v1/player",
      post(|Json(body): Json<Value>| async move {
        if body["context"]["client"]["clientName"] == "IOS" {
          Json(json!({
            "playabilityStatus": { "status": "OK" },
            "streamingData": { "adaptiveFormats": [
              { "itag": 140, "mimeType": "audio/mp4", "url": "https://rr1.googlevideo.com/ios" }
            ]}
          }))
        } else {
          Json(json!({ "playabilityStatus": { "status": "LOGIN_REQUIRED" } }))
        }
      }),
    );
    spawn(listener, router);

    let locator = stream_chain(client_for(&base))
      .run(&track(json!({})))
      .await
      .unwrap();
    assert_eq!(locator.url, "https://rr1.googlevideo.com/ios");
  }

  #[tokio::test]
  async fn cached_manifest_for_live() {
    let locator = CachedMediaUrl
      .extract(&track(json!({ "hlsManifestUrl": "https://manifest.googlevideo.com/x.m3u8" })))
      .await
      .unwrap();
    assert_eq!(locator.protocol, StreamProtocol::Hls);
  }
}
