use serde_json::Value;
use tracing::{debug, trace, warn};

use super::token::ClientIdTracker;
use crate::{
  common::http::HttpClient,
  configs::SoundCloudConfig,
  sources::stream::ExtractionFailure,
};

/// Authenticated access to the SoundCloud v2 API.
///
/// One instance per adapter; the SoundCloud and Spotify-bridge adapters
/// each build their own at activation.
pub struct SoundCloudApi {
  client: reqwest::Client,
  api_url: String,
  oauth_token: Option<String>,
  tracker: ClientIdTracker,
}

impl SoundCloudApi {
  pub fn new(config: &SoundCloudConfig) -> Result<Self, reqwest::Error> {
    let client = HttpClient::build(config.proxy.as_ref())?;
    let tracker = ClientIdTracker::new(
      client.clone(),
      config.site_url.trim_end_matches('/').to_string(),
      config.client_id.clone().filter(|id| !id.is_empty()),
    );

    Ok(Self {
      client,
      api_url: config.api_url.trim_end_matches('/').to_string(),
      oauth_token: config.oauth_token.clone().filter(|t| !t.is_empty()),
      tracker,
    })
  }

  pub async fn client_id(&self) -> Result<String, ExtractionFailure> {
    self
      .tracker
      .get_client_id()
      .await
      .ok_or(ExtractionFailure::Missing("client_id"))
  }

  /// GETs `url` with the client id (and OAuth token, if any) attached.
  async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, ExtractionFailure> {
    let client_id = self.client_id().await?;
    let mut req = self
      .client
      .get(url)
      .query(query)
      .query(&[("client_id", client_id.as_str())]);
    if let Some(token) = &self.oauth_token {
      req = req.header("Authorization", format!("OAuth {}", token));
    }

    let resp = req.send().await?;
    let status = resp.status();
    if status.as_u16() == 401 {
      warn!("SoundCloud: client_id rejected, scheduling refresh");
      self.tracker.invalidate().await;
      return Err(ExtractionFailure::Status(401));
    }
    if !status.is_success() {
      return Err(ExtractionFailure::Status(status.as_u16()));
    }

    let json: Value = resp.json().await?;
    trace!("SoundCloud: {} -> {}", url, json);
    Ok(json)
  }

  /// Resolves a public permalink (track, set or user page) to its API object.
  pub async fn resolve_url(&self, url: &str) -> Result<Value, ExtractionFailure> {
    debug!("SoundCloud: resolving {}", url);
    self
      .get_json(
        &format!("{}/resolve", self.api_url),
        &[("url", url.to_string())],
      )
      .await
  }

  pub async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<Value>, ExtractionFailure> {
    let json = self
      .get_json(
        &format!("{}/search/tracks", self.api_url),
        &[
          ("q", query.to_string()),
          ("limit", limit.to_string()),
          ("offset", "0".to_string()),
        ],
      )
      .await?;
    Ok(collection(json))
  }

  pub async fn track(&self, id: &Value) -> Result<Value, ExtractionFailure> {
    let id = id_string(id).ok_or(ExtractionFailure::Missing("id"))?;
    self
      .get_json(&format!("{}/tracks/{}", self.api_url, id), &[])
      .await
  }

  /// Hydrates stub tracks (id only) in batches of 50.
  pub async fn tracks_by_ids(&self, ids: &[String]) -> Vec<Value> {
    let mut hydrated = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(50) {
      match self
        .get_json(
          &format!("{}/tracks", self.api_url),
          &[("ids", chunk.join(","))],
        )
        .await
      {
        Ok(Value::Array(items)) => hydrated.extend(items),
        Ok(_) => {}
        Err(e) => warn!("SoundCloud: batch track fetch failed: {}", e),
      }
    }
    hydrated
  }

  pub async fn related(&self, id: &Value, limit: usize) -> Result<Vec<Value>, ExtractionFailure> {
    let id = id_string(id).ok_or(ExtractionFailure::Missing("id"))?;
    let json = self
      .get_json(
        &format!("{}/tracks/{}/related", self.api_url, id),
        &[("limit", limit.to_string())],
      )
      .await?;
    Ok(collection(json))
  }

  /// Exchanges a transcoding lookup URL for the media URL it points at.
  pub async fn transcoding_url(&self, lookup_url: &str) -> Result<String, ExtractionFailure> {
    let json = self.get_json(lookup_url, &[]).await?;
    json
      .get("url")
      .and_then(|v| v.as_str())
      .map(str::to_string)
      .ok_or(ExtractionFailure::Missing("url"))
  }

  /// Follows a short link (snd.sc, on.soundcloud.com) to its canonical URL.
  pub async fn follow_redirects(&self, url: &str) -> Result<String, ExtractionFailure> {
    let resp = self.client.get(url).send().await?;
    Ok(resp.url().to_string())
  }

  /// Appends the current client id to a bare API URL.
  pub async fn with_client_id(&self, url: &str) -> Result<String, ExtractionFailure> {
    let client_id = self.client_id().await?;
    let sep = if url.contains('?') { '&' } else { '?' };
    Ok(format!("{}{}client_id={}", url, sep, client_id))
  }
}

/// Search/related responses wrap results in `collection`; some endpoints
/// return a bare array.
fn collection(json: Value) -> Vec<Value> {
  match json {
    Value::Array(items) => items,
    Value::Object(mut obj) => match obj.remove("collection") {
      Some(Value::Array(items)) => items,
      _ => Vec::new(),
    },
    _ => Vec::new(),
  }
}

pub(crate) fn id_string(id: &Value) -> Option<String> {
  match id {
    Value::Number(n) => Some(n.to_string()),
    Value::String(s) if !s.is_empty() => Some(s.clone()),
    _ => None,
  }
}
