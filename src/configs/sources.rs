use serde::{Deserialize, Serialize};

fn default_true() -> bool {
  true
}

/// Which adapters the registry activates.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourcesConfig {
  #[serde(default = "default_true")]
  pub youtube: bool,
  #[serde(default = "default_true")]
  pub spotify: bool,
  #[serde(default = "default_true")]
  pub soundcloud: bool,
  /// Off by default: it accepts YouTube URLs too.
  #[serde(default)]
  pub googlevideo: bool,
}

impl Default for SourcesConfig {
  fn default() -> Self {
    Self {
      youtube: true,
      spotify: true,
      soundcloud: true,
      googlevideo: false,
    }
  }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct HttpProxyConfig {
  pub url: Option<String>,
  pub username: Option<String>,
  pub password: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SoundCloudConfig {
  pub client_id: Option<String>,
  pub oauth_token: Option<String>,
  #[serde(default = "default_sc_search_limit")]
  pub search_limit: usize,
  #[serde(default = "default_sc_playlist_load_limit")]
  pub playlist_load_limit: usize,
  #[serde(default = "default_sc_api_url")]
  pub api_url: String,
  #[serde(default = "default_sc_site_url")]
  pub site_url: String,
  pub proxy: Option<HttpProxyConfig>,
}

fn default_sc_search_limit() -> usize {
  10
}
fn default_sc_playlist_load_limit() -> usize {
  100
}
fn default_sc_api_url() -> String {
  "https://api-v2.soundcloud.com".to_string()
}
fn default_sc_site_url() -> String {
  "https://soundcloud.com".to_string()
}

impl Default for SoundCloudConfig {
  fn default() -> Self {
    Self {
      client_id: None,
      oauth_token: None,
      search_limit: default_sc_search_limit(),
      playlist_load_limit: default_sc_playlist_load_limit(),
      api_url: default_sc_api_url(),
      site_url: default_sc_site_url(),
      proxy: None,
    }
  }
}

/// Shared by the YouTube and Generic-video adapters; each reads its own
/// table (`[youtube]` / `[googlevideo]`).
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct InnertubeConfig {
  pub api_key: Option<String>,
  #[serde(default = "default_yt_search_limit")]
  pub search_limit: usize,
  #[serde(default = "default_innertube_url")]
  pub innertube_url: String,
  pub proxy: Option<HttpProxyConfig>,
}

fn default_yt_search_limit() -> usize {
  10
}
fn default_innertube_url() -> String {
  "https://youtubei.googleapis.com".to_string()
}

impl Default for InnertubeConfig {
  fn default() -> Self {
    Self {
      api_key: None,
      search_limit: default_yt_search_limit(),
      innertube_url: default_innertube_url(),
      proxy: None,
    }
  }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SpotifyConfig {
  #[serde(default = "default_sp_search_limit")]
  pub search_limit: usize,
  #[serde(default = "default_sp_embed_url")]
  pub embed_url: String,
  pub proxy: Option<HttpProxyConfig>,
}

fn default_sp_search_limit() -> usize {
  5
}
fn default_sp_embed_url() -> String {
  "https://open.spotify.com/embed".to_string()
}

impl Default for SpotifyConfig {
  fn default() -> Self {
    Self {
      search_limit: default_sp_search_limit(),
      embed_url: default_sp_embed_url(),
      proxy: None,
    }
  }
}
