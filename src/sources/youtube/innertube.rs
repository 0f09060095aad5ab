use serde_json::{Value, json};
use tracing::{debug, trace};

use crate::{
  common::http::HttpClient, configs::InnertubeConfig, sources::stream::ExtractionFailure,
};

/// Filters search results down to videos.
const SEARCH_PARAMS: &str = "EgIQAQ%3D%3D";

/// An InnerTube client identity. Player responses differ per client, so a
/// refetch under another identity can succeed where the first one failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientProfile {
  AndroidVr,
  Ios,
}

impl ClientProfile {
  fn client_name(self) -> &'static str {
    match self {
      Self::AndroidVr => "ANDROID_VR",
      Self::Ios => "IOS",
    }
  }

  fn client_id(self) -> &'static str {
    match self {
      Self::AndroidVr => "28",
      Self::Ios => "5",
    }
  }

  fn client_version(self) -> &'static str {
    match self {
      Self::AndroidVr => "1.61.48",
      Self::Ios => "21.02.1",
    }
  }

  fn user_agent(self) -> &'static str {
    match self {
      Self::AndroidVr => {
        "Mozilla/5.0 (Linux; Android 14; Pixel 8 Pro Build/UQ1A.240205.002; wv) \
         AppleWebKit/537.36 (KHTML, like Gecko) Version/4.0 \
         Chrome/121.0.6167.164 Mobile Safari/537.36 YouTubeVR/1.61.48 (gzip)"
      }
      Self::Ios => "com.google.ios.youtube/21.02.1 (iPhone16,2; U; CPU iOS 18_2 like Mac OS X;)",
    }
  }

  fn context(self) -> Value {
    let client = match self {
      Self::AndroidVr => json!({
        "clientName": self.client_name(),
        "clientVersion": self.client_version(),
        "userAgent": self.user_agent(),
        "androidSdkVersion": 34,
        "deviceMake": "Google",
        "deviceModel": "Pixel 8 Pro",
        "osName": "Android",
        "osVersion": "14",
        "hl": "en",
        "gl": "US"
      }),
      Self::Ios => json!({
        "clientName": self.client_name(),
        "clientVersion": self.client_version(),
        "userAgent": self.user_agent(),
        "deviceMake": "Apple",
        "deviceModel": "iPhone16,2",
        "osName": "iPhone",
        "osVersion": "18.2.22C152",
        "hl": "en",
        "gl": "US",
        "utcOffsetMinutes": 0
      }),
    };

    json!({
      "client": client,
      "user": { "lockedSafetyMode": false },
      "request": { "useSsl": true }
    })
  }
}

/// Minimal InnerTube API client: player, search and watch-next.
pub struct InnertubeClient {
  http: reqwest::Client,
  base_url: String,
  api_key: Option<String>,
}

impl InnertubeClient {
  pub fn new(config: &InnertubeConfig) -> Result<Self, reqwest::Error> {
    Ok(Self {
      http: HttpClient::build(config.proxy.as_ref())?,
      base_url: config.innertube_url.trim_end_matches('/').to_string(),
      api_key: config.api_key.clone().filter(|k| !k.is_empty()),
    })
  }

  async fn post(
    &self,
    endpoint: &str,
    profile: ClientProfile,
    mut body: Value,
  ) -> Result<Value, ExtractionFailure> {
    body["context"] = profile.context();
    let url = format!("{}/youtubei/v1/{}", self.base_url, endpoint);

    let mut req = self
      .http
      .post(&url)
      .query(&[("prettyPrint", "false")])
      .header("User-Agent", profile.user_agent())
      .header("X-YouTube-Client-Name", profile.client_id())
      .header("X-YouTube-Client-Version", profile.client_version())
      .json(&body);
    if let Some(key) = &self.api_key {
      req = req.query(&[("key", key.as_str())]);
    }

    let res = req.send().await?;
    let status = res.status();
    if !status.is_success() {
      debug!("InnerTube {} ({}) returned {}", endpoint, profile.client_name(), status);
      return Err(ExtractionFailure::Status(status.as_u16()));
    }

    let json: Value = res.json().await?;
    trace!("InnerTube {} response: {}", endpoint, json);
    Ok(json)
  }

  /// Player response for `video_id`. Fails unless the video is playable.
  pub async fn player(&self, video_id: &str, profile: ClientProfile) -> Result<Value, ExtractionFailure> {
    let body = self
      .post(
        "player",
        profile,
        json!({
          "videoId": video_id,
          "contentCheckOk": true,
          "racyCheckOk": true
        }),
      )
      .await?;

    let playability = body
      .get("playabilityStatus")
      .and_then(|p| p.get("status"))
      .and_then(|s| s.as_str())
      .unwrap_or("UNKNOWN");
    if playability != "OK" {
      let reason = body
        .get("playabilityStatus")
        .and_then(|p| p.get("reason"))
        .and_then(|r| r.as_str())
        .unwrap_or("no reason given");
      return Err(ExtractionFailure::Provider(format!(
        "video {} not playable ({}: {})",
        video_id, playability, reason
      )));
    }

    Ok(body)
  }

  pub async fn search(&self, query: &str) -> Result<Value, ExtractionFailure> {
    self
      .post(
        "search",
        ClientProfile::AndroidVr,
        json!({ "query": query, "params": SEARCH_PARAMS }),
      )
      .await
  }

  /// Watch-next response; its secondary results are the "up next" videos.
  pub async fn next(&self, video_id: &str) -> Result<Value, ExtractionFailure> {
    self
      .post(
        "next",
        ClientProfile::AndroidVr,
        json!({
          "videoId": video_id,
          "contentCheckOk": true,
          "racyCheckOk": true
        }),
      )
      .await
  }
}
