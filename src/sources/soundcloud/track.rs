use serde_json::Value;

use crate::protocol::{
  format::{RawUnit, format_duration},
  tracks::{SourceId, StreamLocator, TrackRecord},
};

/// Builds a track from a SoundCloud API track object.
pub fn to_track(json: &Value) -> TrackRecord {
  let user = json.get("user");
  let str_of = |key: &str| json.get(key).and_then(|v| v.as_str());

  TrackRecord::builder(SourceId::SoundCloud, json.clone())
    .title(str_of("title"))
    .author(user.and_then(|u| u.get("username")).and_then(|v| v.as_str()))
    .url(str_of("permalink_url"))
    .thumbnail(artwork(json).as_deref())
    .duration(format_duration(
      json.get("full_duration").or_else(|| json.get("duration")).unwrap_or(&Value::Null),
      RawUnit::Millis,
    ))
    .views(json.get("playback_count").and_then(|v| v.as_u64()).unwrap_or(0))
    .meta("genre", json.get("genre"))
    .meta("tags", json.get("tag_list"))
    .meta("createdAt", json.get("created_at"))
    .meta("likes", json.get("likes_count"))
    .meta("reposts", json.get("reposts_count"))
    .meta("comments", json.get("comment_count"))
    .build()
}

/// Track artwork upgraded to 500x500, else the uploader's avatar.
pub fn artwork(json: &Value) -> Option<String> {
  json
    .get("artwork_url")
    .and_then(|v| v.as_str())
    .map(|s| s.replace("-large", "-t500x500"))
    .or_else(|| {
      json
        .get("user")
        .and_then(|u| u.get("avatar_url"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
    })
}

pub fn transcodings(json: &Value) -> &[Value] {
  json
    .get("media")
    .and_then(|m| m.get("transcodings"))
    .and_then(|v| v.as_array())
    .map(Vec::as_slice)
    .unwrap_or(&[])
}

fn format_field<'a>(transcoding: &'a Value, key: &str) -> &'a str {
  transcoding
    .get("format")
    .and_then(|f| f.get(key))
    .and_then(|v| v.as_str())
    .unwrap_or("")
}

fn is_preview(transcoding: &Value) -> bool {
  let snipped = transcoding
    .get("snipped")
    .and_then(|v| v.as_bool())
    .unwrap_or(false);
  let url = transcoding.get("url").and_then(|v| v.as_str()).unwrap_or("");
  snipped || url.contains("/preview/") || url.contains("cf-preview-media.sndcdn.com")
}

/// Preference used by the stream utility: full-length progressive MP3, then
/// progressive AAC, then HLS (MP3, AAC, Opus), then whatever is left.
pub fn select_best(transcodings: &[Value]) -> Option<&Value> {
  let find = |protocol: &str, mime: &str| {
    transcodings.iter().find(|t| {
      !is_preview(t)
        && format_field(t, "protocol") == protocol
        && format_field(t, "mime_type").contains(mime)
    })
  };

  find("progressive", "mpeg")
    .or_else(|| find("progressive", "aac"))
    .or_else(|| find("progressive", "mp4"))
    .or_else(|| find("hls", "mpeg"))
    .or_else(|| find("hls", "aac"))
    .or_else(|| find("hls", "mp4"))
    .or_else(|| find("hls", "ogg"))
    .or_else(|| transcodings.iter().find(|t| !is_preview(t)))
    .or_else(|| transcodings.first())
}

/// Preference used after a re-fetch: any progressive audio transcoding,
/// else the first one listed.
pub fn select_progressive(transcodings: &[Value]) -> Option<&Value> {
  transcodings
    .iter()
    .find(|t| {
      format_field(t, "protocol") == "progressive" && format_field(t, "mime_type").contains("audio")
    })
    .or_else(|| transcodings.first())
}

/// Wraps a media URL resolved from `transcoding` in a locator.
pub fn locator_for(transcoding: &Value, media_url: String) -> StreamLocator {
  let mime = Some(format_field(transcoding, "mime_type"));
  if format_field(transcoding, "protocol") == "hls" {
    StreamLocator::hls(media_url).with_mime(mime)
  } else {
    StreamLocator::progressive(media_url).with_mime(mime)
  }
}
