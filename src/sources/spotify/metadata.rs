use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, trace};

use crate::sources::{query::SpotifyKind, stream::ExtractionFailure};

static NEXT_DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?s)<script[^>]*id="__NEXT_DATA__"[^>]*>(.*?)</script>"#).unwrap()
});

/// What the bridge needs from Spotify to find the song elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyMetadata {
  pub title: String,
  pub artist: Option<String>,
  pub thumbnail: Option<String>,
}

impl SpotifyMetadata {
  /// Text handed to the SoundCloud search.
  pub fn search_query(&self) -> String {
    format!("{} {}", self.title, self.artist.as_deref().unwrap_or(""))
      .trim()
      .to_string()
  }
}

/// Reads track metadata from the public embed page. No credentials needed.
pub struct EmbedScraper {
  client: reqwest::Client,
  embed_url: String,
}

impl EmbedScraper {
  pub fn new(client: reqwest::Client, embed_url: &str) -> Self {
    Self {
      client,
      embed_url: embed_url.trim_end_matches('/').to_string(),
    }
  }

  pub async fn fetch(&self, kind: SpotifyKind, id: &str) -> Result<SpotifyMetadata, ExtractionFailure> {
    let url = format!("{}/{}/{}", self.embed_url, kind.as_str(), id);
    debug!("Spotify: fetching embed {}", url);

    let resp = self
      .client
      .get(&url)
      .header("Accept-Language", "en-US,en;q=0.9")
      .header("Sec-Fetch-Dest", "iframe")
      .header("Sec-Fetch-Mode", "navigate")
      .header("Sec-Fetch-Site", "cross-site")
      .send()
      .await?;
    if !resp.status().is_success() {
      return Err(ExtractionFailure::Status(resp.status().as_u16()));
    }

    let html = resp.text().await?;
    parse_embed(&html, kind)
  }
}

/// Pulls the entity out of the embed page's `__NEXT_DATA__` blob. Albums and
/// playlists resolve to their first track.
pub fn parse_embed(html: &str, kind: SpotifyKind) -> Result<SpotifyMetadata, ExtractionFailure> {
  let raw = NEXT_DATA_RE
    .captures(html)
    .and_then(|c| c.get(1))
    .ok_or(ExtractionFailure::Missing("__NEXT_DATA__"))?;
  let data: Value = serde_json::from_str(raw.as_str())
    .map_err(|e| ExtractionFailure::Provider(format!("bad embed data: {}", e)))?;

  let entity = data
    .pointer("/props/pageProps/state/data/entity")
    .ok_or(ExtractionFailure::Missing("entity"))?;
  trace!("Spotify: embed entity {}", entity);

  let thumbnail = cover_art(entity);
  let source = match kind {
    SpotifyKind::Track => entity,
    SpotifyKind::Album | SpotifyKind::Playlist => entity
      .get("trackList")
      .and_then(|v| v.as_array())
      .and_then(|list| list.first())
      .ok_or(ExtractionFailure::Missing("trackList"))?,
  };

  let title = source
    .get("name")
    .or_else(|| source.get("title"))
    .and_then(|v| v.as_str())
    .filter(|s| !s.trim().is_empty())
    .ok_or(ExtractionFailure::Missing("title"))?
    .to_string();

  Ok(SpotifyMetadata {
    title,
    artist: artists(source),
    thumbnail,
  })
}

fn artists(entity: &Value) -> Option<String> {
  let names: Vec<&str> = entity
    .get("artists")
    .and_then(|v| v.as_array())
    .map(|list| {
      list
        .iter()
        .filter_map(|a| a.get("name").and_then(|v| v.as_str()))
        .collect()
    })
    .unwrap_or_default();

  if !names.is_empty() {
    return Some(names.join(", "));
  }

  entity
    .get("subtitle")
    .and_then(|v| v.as_str())
    .filter(|s| !s.trim().is_empty())
    .map(|s| s.replace('\u{a0}', " "))
}

fn cover_art(entity: &Value) -> Option<String> {
  let first_url = |list: Option<&Value>| {
    list
      .and_then(|v| v.as_array())
      .and_then(|images| {
        images
          .iter()
          .max_by_key(|img| img.get("maxWidth").or_else(|| img.get("width")).and_then(|v| v.as_u64()))
      })
      .and_then(|img| img.get("url"))
      .and_then(|v| v.as_str())
      .map(str::to_string)
  };

  first_url(entity.pointer("/visualIdentity/image"))
    .or_else(|| first_url(entity.pointer("/coverArt/sources")))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn page(entity: Value) -> String {
    let data = json!({ "props": { "pageProps": { "state": { "data": { "entity": entity } } } } });
    format!(
      r#"<html><body><script id="__NEXT_DATA__" type="application/json">{}</script></body></html>"#,
      data
    )
  }

  #[test]
  fn parses_track_embed() {
    let html = page(json!({
      "type": "track",
      "name": "Blinding Lights",
      "artists": [{ "name": "The Weeknd" }],
      "visualIdentity": { "image": [
        { "url": "https://i.scdn.co/image/small", "maxWidth": 64 },
        { "url": "https://i.scdn.co/image/large", "maxWidth": 640 }
      ]}
    }));

    let meta = parse_embed(&html, SpotifyKind::Track).unwrap();
    assert_eq!(meta.title, "Blinding Lights");
    assert_eq!(meta.artist.as_deref(), Some("The Weeknd"));
    assert_eq!(meta.thumbnail.as_deref(), Some("https://i.scdn.co/image/large"));
    assert_eq!(meta.search_query(), "Blinding Lights The Weeknd");
  }

  #[test]
  fn album_uses_first_track() {
    let html = page(json!({
      "type": "album",
      "name": "After Hours",
      "coverArt": { "sources": [{ "url": "https://i.scdn.co/image/cover", "width": 300 }] },
      "trackList": [
        { "title": "Alone Again", "subtitle": "The\u{a0}Weeknd" },
        { "title": "Too Late", "subtitle": "The Weeknd" }
      ]
    }));

    let meta = parse_embed(&html, SpotifyKind::Album).unwrap();
    assert_eq!(meta.title, "Alone Again");
    assert_eq!(meta.artist.as_deref(), Some("The Weeknd"));
    assert_eq!(meta.thumbnail.as_deref(), Some("https://i.scdn.co/image/cover"));
  }

  #[test]
  fn missing_artist_trims_query() {
    let meta = SpotifyMetadata {
      title: "Untitled".into(),
      artist: None,
      thumbnail: None,
    };
    assert_eq!(meta.search_query(), "Untitled");
  }

  #[test]
  fn page_without_data_is_rejected() {
    assert!(matches!(
      parse_embed("<html></html>", SpotifyKind::Track),
      Err(ExtractionFailure::Missing("__NEXT_DATA__"))
    ));
    assert!(parse_embed(&page(json!({ "trackList": [] })), SpotifyKind::Playlist).is_err());
  }
}
