use std::{
  sync::{Arc, LazyLock},
  time::{Duration, Instant},
};

use regex::Regex;
use tokio::sync::RwLock;
use tracing::{debug, info, trace, warn};

use crate::common::types::SharedRw;

const CLIENT_ID_REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

// asset JS script URLs in the page HTML
static ASSET_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#"https?://[^"'\s]+/assets/[a-zA-Z0-9_.-]+\.js"#).unwrap());

// client_id inside JS scripts
static CLIENT_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"[^_]client_id[:"=]+\s*"?([a-zA-Z0-9_-]{20,})"?"#).unwrap()
});

struct CachedClientId {
  value: Option<String>,
  last_updated: Option<Instant>,
  /// Configured ids never go stale on their own.
  pinned: bool,
}

impl CachedClientId {
  fn is_stale(&self) -> bool {
    match self.last_updated {
      None => true,
      Some(_) if self.pinned => false,
      Some(t) => t.elapsed() > CLIENT_ID_REFRESH_INTERVAL,
    }
  }
}

/// Keeps a usable SoundCloud `client_id`, scraping one from the public site
/// when none is configured or the current one was rejected.
pub struct ClientIdTracker {
  client: reqwest::Client,
  site_url: String,
  client_id: SharedRw<CachedClientId>,
}

impl ClientIdTracker {
  pub fn new(client: reqwest::Client, site_url: String, configured: Option<String>) -> Self {
    let pinned = configured.is_some();
    Self {
      client,
      site_url,
      client_id: Arc::new(RwLock::new(CachedClientId {
        last_updated: configured.as_ref().map(|_| Instant::now()),
        value: configured,
        pinned,
      })),
    }
  }

  pub async fn get_client_id(&self) -> Option<String> {
    {
      let guard = self.client_id.read().await;
      if !guard.is_stale() {
        if let Some(id) = &guard.value {
          return Some(id.clone());
        }
      }
    }

    self.refresh_client_id().await
  }

  pub async fn refresh_client_id(&self) -> Option<String> {
    debug!("Refreshing SoundCloud client_id from {}", self.site_url);

    let html = match self.fetch_text(&self.site_url).await {
      Some(t) => t,
      None => {
        warn!("SoundCloud: failed to fetch {}", self.site_url);
        return None;
      }
    };

    if let Some(id) = Self::find_client_id(&html) {
      trace!("SoundCloud: found client_id in main page");
      return Some(self.store_client_id(id).await);
    }

    let asset_urls: Vec<&str> = ASSET_RE.find_iter(&html).map(|m| m.as_str()).collect();
    if asset_urls.is_empty() {
      warn!("SoundCloud: no asset scripts found in main page");
      return None;
    }

    // the script carrying the id is usually one of the last ones
    for url in asset_urls.iter().rev().take(9) {
      let Some(js) = self.fetch_text(url).await else {
        continue;
      };
      if let Some(id) = Self::find_client_id(&js) {
        trace!("SoundCloud: found client_id in asset {}", url);
        return Some(self.store_client_id(id).await);
      }
    }

    warn!("SoundCloud: client_id not found in any asset scripts");
    None
  }

  /// Forces the next `get_client_id` to scrape a fresh id.
  pub async fn invalidate(&self) {
    let mut guard = self.client_id.write().await;
    guard.last_updated = None;
    guard.pinned = false;
  }

  fn find_client_id(text: &str) -> Option<String> {
    CLIENT_ID_RE
      .captures(text)
      .and_then(|caps| caps.get(1))
      .map(|m| m.as_str().to_string())
  }

  async fn fetch_text(&self, url: &str) -> Option<String> {
    let resp = self.client.get(url).send().await.ok()?;
    if !resp.status().is_success() {
      return None;
    }
    resp.text().await.ok()
  }

  async fn store_client_id(&self, id: String) -> String {
    let mut guard = self.client_id.write().await;
    guard.value = Some(id.clone());
    guard.last_updated = Some(Instant::now());
    info!("Successfully refreshed SoundCloud client_id");
    id
  }
}
