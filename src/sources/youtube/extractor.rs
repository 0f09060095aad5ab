//! Turns InnerTube responses into flat video payloads.
//!
//! Both YouTube-backed adapters keep the same payload shape on their
//! tracks, so either can re-derive a stream from the other's fields:
//!
//! `videoId, title, author, url, thumbnail, duration, durationMs, views,
//! isLive, uploadDate, genre, streamUrl, mimeType, hlsManifestUrl`

use serde_json::{Map, Value, json};

use super::formats::stream_locator;
use crate::protocol::tracks::StreamProtocol;

pub fn watch_url(video_id: &str) -> String {
  format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Payload from a `/player` response, including the best stream found in
/// its `streamingData`.
pub fn extract_from_player(body: &Value) -> Option<Value> {
  let details = body.get("videoDetails")?;
  let video_id = details.get("videoId")?.as_str()?;
  let microformat = body
    .get("microformat")
    .and_then(|m| m.get("playerMicroformatRenderer"));

  let is_live = details
    .get("isLive")
    .or_else(|| details.get("isLiveContent"))
    .and_then(|v| v.as_bool())
    .unwrap_or(false);
  let length_seconds = details
    .get("lengthSeconds")
    .and_then(|v| v.as_str())
    .and_then(|s| s.parse::<u64>().ok())
    .filter(|s| *s > 0);
  let approx_ms = body
    .pointer("/streamingData/adaptiveFormats/0/approxDurationMs")
    .and_then(|v| v.as_str())
    .and_then(|s| s.parse::<u64>().ok());

  let mut payload = Map::new();
  payload.insert("videoId".into(), json!(video_id));
  payload.insert("title".into(), details.get("title").cloned().unwrap_or(Value::Null));
  payload.insert("author".into(), details.get("author").cloned().unwrap_or(Value::Null));
  payload.insert("url".into(), json!(watch_url(video_id)));
  payload.insert("thumbnail".into(), json!(thumbnail(details)));
  payload.insert("duration".into(), json!(length_seconds));
  payload.insert(
    "durationMs".into(),
    json!(approx_ms.or(length_seconds.map(|s| s * 1000))),
  );
  payload.insert("views".into(), details.get("viewCount").cloned().unwrap_or(Value::Null));
  payload.insert("isLive".into(), json!(is_live));
  payload.insert(
    "uploadDate".into(),
    microformat
      .and_then(|m| m.get("publishDate").or_else(|| m.get("uploadDate")))
      .cloned()
      .unwrap_or(Value::Null),
  );
  payload.insert(
    "genre".into(),
    microformat
      .and_then(|m| m.get("category"))
      .cloned()
      .unwrap_or(Value::Null),
  );

  if let Some(locator) = body
    .get("streamingData")
    .and_then(|sd| stream_locator(sd, is_live))
  {
    let key = match locator.protocol {
      StreamProtocol::Hls => "hlsManifestUrl",
      StreamProtocol::Progressive => "streamUrl",
    };
    payload.insert(key.into(), json!(locator.url));
    payload.insert("mimeType".into(), json!(locator.mime_type));
  }

  Some(Value::Object(payload))
}

/// Payload from a search or watch-next renderer. Channels, playlists and
/// shelves yield `None`.
pub fn extract_video(item: &Value) -> Option<Value> {
  let renderer = item
    .get("videoRenderer")
    .or_else(|| item.get("compactVideoRenderer"))
    .or_else(|| item.get("videoWithContextRenderer"))?;

  let video_id = renderer.get("videoId").and_then(|v| v.as_str())?;
  let title = renderer.get("title").or_else(|| renderer.get("headline")).and_then(get_text)?;

  let author = ["longBylineText", "shortBylineText", "ownerText"]
    .iter()
    .find_map(|key| renderer.get(*key).and_then(get_text));

  let is_live = renderer.get("isLive").and_then(|v| v.as_bool()).unwrap_or(false)
    || renderer
      .get("badges")
      .and_then(|b| b.as_array())
      .is_some_and(|arr| {
        arr.iter().any(|badge| {
          badge
            .pointer("/metadataBadgeRenderer/label")
            .and_then(|l| l.as_str())
            .is_some_and(|s| s == "LIVE" || s == "LIVE NOW")
        })
      });

  let length = renderer.get("lengthText").and_then(get_text);

  Some(json!({
    "videoId": video_id,
    "title": title,
    "author": author,
    "url": watch_url(video_id),
    "thumbnail": thumbnail(renderer),
    "duration": length,
    "views": renderer
      .get("viewCountText")
      .or_else(|| renderer.get("shortViewCountText"))
      .and_then(get_text),
    "isLive": is_live,
    "uploadDate": renderer.get("publishedTimeText").and_then(get_text),
  }))
}

/// Every video renderer in a search response, in order.
pub fn extract_search(body: &Value) -> Vec<Value> {
  let mut items = Vec::new();
  collect_videos(body.get("contents").unwrap_or(body), &mut items);
  items
}

/// "Up next" videos from a watch-next response, excluding the current one.
pub fn extract_next(body: &Value, current_id: &str) -> Vec<Value> {
  let mut items = Vec::new();
  collect_videos(body.get("contents").unwrap_or(body), &mut items);
  items.retain(|v| v.get("videoId").and_then(|id| id.as_str()) != Some(current_id));
  items
}

fn collect_videos(value: &Value, out: &mut Vec<Value>) {
  match value {
    Value::Array(arr) => arr.iter().for_each(|v| collect_videos(v, out)),
    Value::Object(obj) => {
      if let Some(video) = extract_video(value) {
        out.push(video);
        return;
      }
      for (key, child) in obj {
        // playlists and mixes nest videos that are not results of their own
        if key == "playlistRenderer" || key == "radioRenderer" {
          continue;
        }
        collect_videos(child, out);
      }
    }
    _ => {}
  }
}

pub fn get_text(obj: &Value) -> Option<String> {
  if let Some(s) = obj.as_str() {
    return Some(s.to_string());
  }
  if let Some(simple_text) = obj.get("simpleText").and_then(|v| v.as_str()) {
    return Some(simple_text.to_string());
  }
  if let Some(runs) = obj.get("runs").and_then(|v| v.as_array()) {
    let text: String = runs
      .iter()
      .filter_map(|run| run.get("text").and_then(|v| v.as_str()))
      .collect();
    return Some(text);
  }
  None
}

/// Highest-quality thumbnail, without its sizing query.
fn thumbnail(obj: &Value) -> Option<String> {
  obj
    .get("thumbnail")
    .and_then(|t| t.get("thumbnails"))
    .and_then(|arr| arr.as_array())
    .and_then(|arr| arr.last())
    .and_then(|thumb| thumb.get("url"))
    .and_then(|url| url.as_str())
    .map(|s| s.split('?').next().unwrap_or(s).to_string())
}
