use serde_json::Value;

use crate::protocol::tracks::StreamLocator;

/// 251 = Opus/WebM ~160 kbps, 250 = Opus/WebM ~70 kbps, 140 = AAC/m4a 128 kbps
pub const AUDIO_ITAG_PRIORITY: &[i64] = &[251, 250, 140];

/// 360p mp4 with audio, available on nearly every video.
pub const ITAG_FALLBACK: i64 = 18;

/// Priority-based audio format selector.
///
/// Only formats carrying a plain `url` are considered; ciphered formats
/// need a player script this crate does not run. Picks by itag priority,
/// then itag 18, then the highest-bitrate audio format.
pub fn select_best_audio_format<'a>(
  adaptive_formats: Option<&'a Vec<Value>>,
  formats: Option<&'a Vec<Value>>,
) -> Option<&'a Value> {
  let all: Vec<&Value> = adaptive_formats
    .into_iter()
    .flatten()
    .chain(formats.into_iter().flatten())
    .filter(|f| f.get("url").and_then(|u| u.as_str()).is_some())
    .collect();

  let itag = |f: &Value| f.get("itag").and_then(|v| v.as_i64()).unwrap_or(-1);
  let is_audio = |f: &Value| {
    f.get("mimeType")
      .and_then(|v| v.as_str())
      .is_some_and(|m| m.starts_with("audio/"))
  };

  for &target in AUDIO_ITAG_PRIORITY {
    if let Some(f) = all.iter().find(|f| itag(f) == target && is_audio(f)) {
      return Some(*f);
    }
  }

  if let Some(f) = all.iter().find(|f| itag(f) == ITAG_FALLBACK) {
    return Some(*f);
  }

  all
    .into_iter()
    .filter(|f| is_audio(f))
    .max_by_key(|f| f.get("bitrate").and_then(|v| v.as_i64()).unwrap_or(0))
}

/// Best locator in a `streamingData` block. Live videos go through their
/// HLS manifest; everything else through the best direct audio format.
pub fn stream_locator(streaming_data: &Value, is_live: bool) -> Option<StreamLocator> {
  let hls = streaming_data
    .get("hlsManifestUrl")
    .and_then(|v| v.as_str())
    .map(StreamLocator::hls);
  if is_live && hls.is_some() {
    return hls;
  }

  let adaptive = streaming_data.get("adaptiveFormats").and_then(|v| v.as_array());
  let formats = streaming_data.get("formats").and_then(|v| v.as_array());

  select_best_audio_format(adaptive, formats)
    .and_then(|f| {
      let url = f.get("url").and_then(|u| u.as_str())?;
      let mime = f.get("mimeType").and_then(|m| m.as_str());
      Some(StreamLocator::progressive(url).with_mime(mime))
    })
    .or(hls)
}
