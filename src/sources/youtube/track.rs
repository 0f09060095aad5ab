use serde_json::Value;

use crate::protocol::{
  format::{RawUnit, format_duration, parse_views},
  tracks::{SourceId, TrackBuilder, TrackRecord},
};

/// Starts a track from an extractor payload.
///
/// `unit` picks the duration field: `duration` (seconds, or a `m:ss`
/// string from search results) for the YouTube adapter, `durationMs` for
/// the SABR adapter, which falls back to the search-result string.
pub fn track_builder(payload: &Value, source_id: SourceId, unit: RawUnit) -> TrackBuilder {
  let str_of = |key: &str| payload.get(key).and_then(|v| v.as_str());
  let duration = match unit {
    RawUnit::Seconds => payload.get("duration"),
    RawUnit::Millis => payload
      .get("durationMs")
      .filter(|v| !v.is_null())
      .or_else(|| payload.get("duration").filter(|v| v.is_string())),
  };

  TrackRecord::builder(source_id, payload.clone())
    .title(str_of("title"))
    .author(str_of("author"))
    .url(str_of("url"))
    .thumbnail(str_of("thumbnail"))
    .duration(format_duration(duration.unwrap_or(&Value::Null), unit))
    .views(parse_views(payload.get("views").unwrap_or(&Value::Null)))
    .live(payload.get("isLive").and_then(|v| v.as_bool()).unwrap_or(false))
    .meta("videoId", payload.get("videoId"))
    .meta("channel", payload.get("author"))
    .meta("uploadDate", payload.get("uploadDate"))
    .meta("genre", payload.get("genre"))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn duration_field_follows_unit() {
    let player = json!({
      "videoId": "dQw4w9WgXcQ",
      "title": "Never Gonna Give You Up",
      "author": "Rick Astley",
      "duration": 213,
      "durationMs": 212091,
      "views": "1500000000",
    });

    let yt = track_builder(&player, SourceId::YouTube, RawUnit::Seconds).build();
    assert_eq!(yt.duration_display(), "3:33");
    assert_eq!(yt.view_count(), 1_500_000_000);
    assert_eq!(yt.metadata()["channel"], "Rick Astley");

    let sabr = track_builder(&player, SourceId::YouTubeSabr, RawUnit::Millis).build();
    assert_eq!(sabr.duration_display(), "3:32");
  }

  #[test]
  fn search_result_timestamp_passes_through() {
    let hit = json!({ "videoId": "x", "duration": "1:02:03", "views": "12,345 views", "durationMs": null });
    let sabr = track_builder(&hit, SourceId::YouTubeSabr, RawUnit::Millis).build();
    assert_eq!(sabr.duration_display(), "1:02:03");
    assert_eq!(sabr.view_count(), 12345);
    assert_eq!(sabr.title(), "Unknown Title");
  }
}
