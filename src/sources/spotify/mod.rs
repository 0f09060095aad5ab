pub mod metadata;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use self::metadata::{EmbedScraper, SpotifyMetadata};
use crate::{
  common::{errors::SourceError, http::HttpClient, logger::preview},
  configs::Config,
  protocol::{
    format::{RawUnit, format_duration},
    tracks::{SourceId, StreamLocator, TrackRecord},
  },
  sources::{
    SourcePlugin, StreamChain, query,
    soundcloud::{api::SoundCloudApi, stream::stream_chain, track::artwork},
  },
};

struct Session {
  embed: EmbedScraper,
  soundcloud: Arc<SoundCloudApi>,
  chain: StreamChain,
  search_limit: usize,
}

/// Plays Spotify links by finding the same song on SoundCloud.
///
/// Spotify only supplies the metadata; the audio, and the payload kept on
/// the track, come from the SoundCloud match.
pub struct SpotifyBridgeSource {
  session: RwLock<Option<Arc<Session>>>,
}

impl SpotifyBridgeSource {
  pub fn new() -> Self {
    Self {
      session: RwLock::new(None),
    }
  }

  fn session(&self) -> Option<Arc<Session>> {
    self.session.read().clone()
  }
}

impl Default for SpotifyBridgeSource {
  fn default() -> Self {
    Self::new()
  }
}

/// Merges the Spotify metadata over the SoundCloud match.
pub fn bridge_track(sc: &Value, spotify: &SpotifyMetadata) -> TrackRecord {
  let sc_str = |key: &str| sc.get(key).and_then(|v| v.as_str());
  let sc_author = sc
    .get("user")
    .and_then(|u| u.get("username"))
    .and_then(|v| v.as_str());

  TrackRecord::builder(SourceId::SpotifySoundCloud, sc.clone())
    .title(Some(spotify.title.as_str()).or(sc_str("title")))
    .author(spotify.artist.as_deref().or(sc_author))
    .url(sc_str("permalink_url"))
    .thumbnail(spotify.thumbnail.clone().or_else(|| artwork(sc)).as_deref())
    .duration(format_duration(
      sc.get("duration").unwrap_or(&Value::Null),
      RawUnit::Millis,
    ))
    .views(sc.get("playback_count").and_then(|v| v.as_u64()).unwrap_or(0))
    .meta("spotifyTitle", Some(&Value::from(spotify.title.as_str())))
    .meta("spotifyArtist", spotify.artist.as_deref().map(Value::from).as_ref())
    .meta("soundcloudTrack", sc.get("id"))
    .meta("genre", sc.get("genre"))
    .meta("likes", sc.get("likes_count"))
    .meta("reposts", sc.get("reposts_count"))
    .build()
}

#[async_trait]
impl SourcePlugin for SpotifyBridgeSource {
  fn id(&self) -> SourceId {
    SourceId::SpotifySoundCloud
  }

  async fn activate(&self, config: &Config) -> Result<(), SourceError> {
    let client = HttpClient::build(config.spotify.proxy.as_ref())
      .map_err(|e| SourceError::init(self.id(), e.to_string()))?;
    let soundcloud = SoundCloudApi::new(&config.soundcloud)
      .map(Arc::new)
      .map_err(|e| SourceError::init(self.id(), e.to_string()))?;

    soundcloud
      .client_id()
      .await
      .map_err(|_| SourceError::init(self.id(), "unable to obtain a SoundCloud client_id"))?;

    *self.session.write() = Some(Arc::new(Session {
      embed: EmbedScraper::new(client, &config.spotify.embed_url),
      chain: stream_chain(soundcloud.clone()),
      soundcloud,
      search_limit: config.spotify.search_limit,
    }));
    Ok(())
  }

  async fn deactivate(&self) {
    self.session.write().take();
  }

  fn validate(&self, q: &str) -> bool {
    query::is_spotify_url(q)
  }

  async fn resolve(&self, q: &str) -> Vec<TrackRecord> {
    let Some(session) = self.session() else {
      return Vec::new();
    };
    let Some((kind, id)) = query::spotify_entity(q.trim()) else {
      return Vec::new();
    };

    let spotify = match session.embed.fetch(kind, &id).await {
      Ok(meta) => meta,
      Err(e) => {
        debug!("Spotify: no metadata for {} {}: {}", kind.as_str(), id, e);
        return Vec::new();
      }
    };

    let search = spotify.search_query();
    debug!(
      "Spotify: '{}' by {:?}, searching SoundCloud for '{}'",
      spotify.title,
      spotify.artist,
      preview(&search)
    );

    match session.soundcloud.search_tracks(&search, session.search_limit).await {
      Ok(results) => match results.first() {
        Some(best) => vec![bridge_track(best, &spotify)],
        None => {
          debug!("Spotify: no SoundCloud match for '{}'", preview(&search));
          Vec::new()
        }
      },
      Err(e) => {
        warn!("Spotify: SoundCloud search failed for '{}': {}", preview(&search), e);
        Vec::new()
      }
    }
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
  use axum::{Json, Router, routing::get};
  use serde_json::json;

  use super::*;
  use crate::{
    configs::{SoundCloudConfig, SpotifyConfig},
    sources::testing::{bind, spawn},
  };

  fn embed_page() -> String {
    let data = json!({ "props": { "pageProps": { "state": { "data": { "entity": {
      "name": "Midnight City",
      "artists": [{ "name": "M83" }],
      "visualIdentity": { "image": [{ "url": "https://i.scdn.co/image/m83", "maxWidth": 640 }] }
    }}}}}});
    format!(r#"<script id="__NEXT_DATA__" type="application/json">{}</script>"#, data)
  }

  async fn active_bridge() -> SpotifyBridgeSource {
    let (listener, base) = bind().await;
    let router = Router::new()
      .route(
        "/embed/track/{id}",
        get(|| async { axum::response::Html(embed_page()) }),
      )
      .route(
        "/search/tracks",
        get(|| async {
          Json(json!({ "collection": [
            {
              "id": 77,
              "title": "M83 - Midnight City (Live Bootleg)",
              "user": { "username": "uploader" },
              "permalink_url": "https://soundcloud.com/uploader/midnight-city",
              "duration": 243000,
              "likes_count": 12
            },
            { "id": 78, "title": "Other", "user": { "username": "x" } }
          ]}))
        }),
      );
    spawn(listener, router);

    let config = Config {
      soundcloud: SoundCloudConfig {
        client_id: Some("TestClientId0000000000000".to_string()),
        api_url: base.clone(),
        site_url: base.clone(),
        ..Default::default()
      },
      spotify: SpotifyConfig {
        embed_url: format!("{}/embed", base),
        ..Default::default()
      },
      ..Default::default()
    };

    let source = SpotifyBridgeSource::new();
    source.activate(&config).await.unwrap();
    source
  }

  #[test]
  fn validates_spotify_links_only() {
    let source = SpotifyBridgeSource::new();
    assert!(source.validate("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC"));
    assert!(source.validate("spotify:album:1ATL5GLyefJaxhQzSPVrLX"));
    assert!(!source.validate("https://open.spotify.com/artist/0OdUWJ0sBjDrqHygGUXeCF"));
    assert!(!source.validate("https://soundcloud.com/artist/song"));
    assert!(!source.validate("midnight city"));
    assert!(!source.validate(""));
  }

  #[tokio::test]
  async fn track_link_yields_one_bridged_track() {
    let source = active_bridge().await;
    let tracks = source
      .resolve("https://open.spotify.com/track/6GyFP1nfCDB8lbD2bG0Hq9")
      .await;

    assert_eq!(tracks.len(), 1);
    let track = &tracks[0];
    assert_eq!(track.title(), "Midnight City");
    assert_eq!(track.author(), "M83");
    assert_eq!(track.thumbnail_url(), Some("https://i.scdn.co/image/m83"));
    assert_eq!(track.url(), "https://soundcloud.com/uploader/midnight-city");
    assert_eq!(track.duration_display(), "4:03");
    assert_eq!(track.source_id(), SourceId::SpotifySoundCloud);
    assert_eq!(track.metadata()["soundcloudTrack"], 77);
    assert_eq!(track.metadata()["spotifyArtist"], "M83");
    assert_eq!(track.payload()["id"], 77);
  }

  #[tokio::test]
  async fn non_spotify_query_yields_nothing() {
    let source = active_bridge().await;
    assert!(source.resolve("midnight city").await.is_empty());
    assert!(source.resolve("").await.is_empty());
  }

  #[test]
  fn soundcloud_fields_fill_gaps() {
    let sc = json!({
      "id": 1,
      "title": "SC Title",
      "user": { "username": "sc user", "avatar_url": "https://i1.sndcdn.com/avatar.jpg" }
    });
    let spotify = SpotifyMetadata {
      title: "Spotify Title".into(),
      artist: None,
      thumbnail: None,
    };

    let track = bridge_track(&sc, &spotify);
    assert_eq!(track.title(), "Spotify Title");
    assert_eq!(track.author(), "sc user");
    assert_eq!(track.thumbnail_url(), Some("https://i1.sndcdn.com/avatar.jpg"));
    assert!(track.metadata().get("spotifyArtist").is_none());
  }
}
