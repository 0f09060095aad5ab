use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifies the adapter that produced a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceId {
  #[serde(rename = "youtube")]
  YouTube,
  #[serde(rename = "soundcloud")]
  SoundCloud,
  #[serde(rename = "spotify-soundcloud")]
  SpotifySoundCloud,
  #[serde(rename = "youtube-sabr")]
  YouTubeSabr,
}

impl SourceId {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::YouTube => "youtube",
      Self::SoundCloud => "soundcloud",
      Self::SpotifySoundCloud => "spotify-soundcloud",
      Self::YouTubeSabr => "youtube-sabr",
    }
  }
}

impl fmt::Display for SourceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A provider-agnostic, playable track.
///
/// Built once by an adapter's normalization step and read-only afterwards.
/// The original provider object rides along as `payload` so the owning
/// adapter can re-derive a stream without searching again; it is skipped
/// when the record is serialized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRecord {
  title: String,
  author: String,
  url: String,
  thumbnail_url: Option<String>,
  duration_display: String,
  view_count: u64,
  source_id: SourceId,
  is_live: bool,
  #[serde(skip)]
  payload: Arc<Value>,
  metadata: Map<String, Value>,
}

impl TrackRecord {
  pub const UNKNOWN_TITLE: &'static str = "Unknown Title";
  pub const UNKNOWN_ARTIST: &'static str = "Unknown Artist";
  pub const UNKNOWN_DURATION: &'static str = "0:00";

  pub fn builder(source_id: SourceId, payload: Value) -> TrackBuilder {
    TrackBuilder {
      source_id,
      payload,
      title: None,
      author: None,
      url: None,
      thumbnail_url: None,
      duration_display: None,
      view_count: 0,
      is_live: false,
      metadata: Map::new(),
    }
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn author(&self) -> &str {
    &self.author
  }

  /// Canonical provider URL, empty when the provider gave no permalink.
  pub fn url(&self) -> &str {
    &self.url
  }

  pub fn thumbnail_url(&self) -> Option<&str> {
    self.thumbnail_url.as_deref()
  }

  pub fn duration_display(&self) -> &str {
    &self.duration_display
  }

  pub fn view_count(&self) -> u64 {
    self.view_count
  }

  pub fn source_id(&self) -> SourceId {
    self.source_id
  }

  pub fn is_live(&self) -> bool {
    self.is_live
  }

  /// Provider-native object. Only the owning adapter should look inside.
  pub fn payload(&self) -> &Value {
    &self.payload
  }

  pub fn metadata(&self) -> &Map<String, Value> {
    &self.metadata
  }
}

fn non_empty(value: Option<&str>) -> Option<String> {
  value
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
}

pub struct TrackBuilder {
  source_id: SourceId,
  payload: Value,
  title: Option<String>,
  author: Option<String>,
  url: Option<String>,
  thumbnail_url: Option<String>,
  duration_display: Option<String>,
  view_count: u64,
  is_live: bool,
  metadata: Map<String, Value>,
}

impl TrackBuilder {
  pub fn title(mut self, title: Option<&str>) -> Self {
    self.title = non_empty(title);
    self
  }

  pub fn author(mut self, author: Option<&str>) -> Self {
    self.author = non_empty(author);
    self
  }

  pub fn url(mut self, url: Option<&str>) -> Self {
    self.url = non_empty(url);
    self
  }

  pub fn thumbnail(mut self, thumbnail_url: Option<&str>) -> Self {
    self.thumbnail_url = non_empty(thumbnail_url);
    self
  }

  pub fn duration(mut self, display: impl Into<String>) -> Self {
    self.duration_display = non_empty(Some(&display.into()));
    self
  }

  pub fn views(mut self, views: u64) -> Self {
    self.view_count = views;
    self
  }

  pub fn live(mut self, is_live: bool) -> Self {
    self.is_live = is_live;
    self
  }

  /// Records an auxiliary field. Nulls are dropped.
  pub fn meta(mut self, key: &str, value: Option<&Value>) -> Self {
    if let Some(v) = value.filter(|v| !v.is_null()) {
      self.metadata.insert(key.to_string(), v.clone());
    }
    self
  }

  pub fn build(self) -> TrackRecord {
    TrackRecord {
      title: self
        .title
        .unwrap_or_else(|| TrackRecord::UNKNOWN_TITLE.to_string()),
      author: self
        .author
        .unwrap_or_else(|| TrackRecord::UNKNOWN_ARTIST.to_string()),
      url: self.url.unwrap_or_default(),
      thumbnail_url: self.thumbnail_url,
      duration_display: self
        .duration_display
        .unwrap_or_else(|| TrackRecord::UNKNOWN_DURATION.to_string()),
      view_count: self.view_count,
      source_id: self.source_id,
      is_live: self.is_live,
      payload: Arc::new(self.payload),
      metadata: self.metadata,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamProtocol {
  /// A single HTTP resource.
  Progressive,
  /// An HLS (m3u8) manifest.
  Hls,
}

/// Where the audio for a track can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamLocator {
  pub url: String,
  pub protocol: StreamProtocol,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub mime_type: Option<String>,
}

impl StreamLocator {
  pub fn progressive(url: impl Into<String>) -> Self {
    Self {
      url: url.into(),
      protocol: StreamProtocol::Progressive,
      mime_type: None,
    }
  }

  pub fn hls(url: impl Into<String>) -> Self {
    Self {
      url: url.into(),
      protocol: StreamProtocol::Hls,
      mime_type: None,
    }
  }

  pub fn with_mime(mut self, mime_type: Option<&str>) -> Self {
    self.mime_type = non_empty(mime_type);
    self
  }
}
