//! Query classification shared by the adapters' `validate` rules.

use std::sync::LazyLock;

use regex::Regex;

static LINK_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)^(?:[a-z][a-z0-9+.-]*://|spotify:)").unwrap());

static YOUTUBE_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"^https?://(?:(?:www\.|m\.|music\.)?youtube\.com/(?:watch\?(?:[^#\s]*&)?v=([\w-]+)|(?:embed|v|shorts|live)/([\w-]+))|youtu\.be/([\w-]+))",
  )
  .unwrap()
});

static SOUNDCLOUD_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^https?://(?:(?:www\.|m\.|on\.)?soundcloud\.com|snd\.sc)/\S+").unwrap()
});

static SPOTIFY_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"^(?:https?://(?:open\.)?spotify\.com/(?:intl-[a-z]{2}/)?(track|album|playlist)/([A-Za-z0-9]+)|spotify:(track|album|playlist):([A-Za-z0-9]+))",
  )
  .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
  Empty,
  /// Anything with a scheme, known provider or not.
  Link,
  /// Free-text search.
  Text,
}

pub fn classify(query: &str) -> QueryKind {
  let query = query.trim();
  if query.is_empty() {
    QueryKind::Empty
  } else if LINK_RE.is_match(query) {
    QueryKind::Link
  } else {
    QueryKind::Text
  }
}

pub fn is_text(query: &str) -> bool {
  classify(query) == QueryKind::Text
}

pub fn is_youtube_url(query: &str) -> bool {
  YOUTUBE_RE.is_match(query.trim())
}

pub fn is_soundcloud_url(query: &str) -> bool {
  SOUNDCLOUD_RE.is_match(query.trim())
}

pub fn is_spotify_url(query: &str) -> bool {
  SPOTIFY_RE.is_match(query.trim())
}

/// Video id from a watch/shorts/embed/short-link URL.
pub fn youtube_video_id(url: &str) -> Option<String> {
  let caps = YOUTUBE_RE.captures(url.trim())?;
  caps
    .get(1)
    .or_else(|| caps.get(2))
    .or_else(|| caps.get(3))
    .map(|m| m.as_str().to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotifyKind {
  Track,
  Album,
  Playlist,
}

impl SpotifyKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Track => "track",
      Self::Album => "album",
      Self::Playlist => "playlist",
    }
  }
}

/// `(kind, id)` from an `open.spotify.com` URL or a `spotify:` URI.
pub fn spotify_entity(query: &str) -> Option<(SpotifyKind, String)> {
  let caps = SPOTIFY_RE.captures(query.trim())?;
  let kind = caps.get(1).or_else(|| caps.get(3))?.as_str();
  let id = caps.get(2).or_else(|| caps.get(4))?.as_str().to_string();
  let kind = match kind {
    "track" => SpotifyKind::Track,
    "album" => SpotifyKind::Album,
    _ => SpotifyKind::Playlist,
  };
  Some((kind, id))
}
