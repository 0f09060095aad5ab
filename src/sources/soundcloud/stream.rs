use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use super::{
  api::SoundCloudApi,
  track::{locator_for, select_best, select_progressive, transcodings},
};
use crate::{
  protocol::tracks::{StreamLocator, TrackRecord},
  sources::stream::{ExtractionFailure, StreamChain, StreamStrategy},
};

/// The SoundCloud fallback order, shared with the Spotify bridge since its
/// tracks carry a SoundCloud payload.
pub fn stream_chain(api: Arc<SoundCloudApi>) -> StreamChain {
  StreamChain::new()
    .then(StreamUtility { api: api.clone() })
    .then(CachedStreamUrl { api: api.clone() })
    .then(Refetch { api })
}

fn payload_str<'a>(track: &'a TrackRecord, key: &'static str) -> Result<&'a str, ExtractionFailure> {
  track
    .payload()
    .get(key)
    .and_then(|v| v.as_str())
    .filter(|s| !s.is_empty())
    .ok_or(ExtractionFailure::Missing(key))
}

/// Resolves the permalink again and picks the best full-length transcoding.
pub struct StreamUtility {
  api: Arc<SoundCloudApi>,
}

#[async_trait]
impl StreamStrategy for StreamUtility {
  fn name(&self) -> &'static str {
    "stream-utility"
  }

  async fn extract(&self, track: &TrackRecord) -> Result<StreamLocator, ExtractionFailure> {
    let permalink = payload_str(track, "permalink_url")?;
    let json = self.api.resolve_url(permalink).await?;
    let transcoding =
      select_best(transcodings(&json)).ok_or(ExtractionFailure::Missing("transcodings"))?;
    let lookup = transcoding
      .get("url")
      .and_then(|v| v.as_str())
      .ok_or(ExtractionFailure::Missing("transcoding url"))?;

    trace!("SoundCloud: stream utility picked {}", lookup);
    let media_url = self.api.transcoding_url(lookup).await?;
    Ok(locator_for(transcoding, media_url))
  }
}

/// The legacy `stream_url` carried on the original object.
pub struct CachedStreamUrl {
  api: Arc<SoundCloudApi>,
}

#[async_trait]
impl StreamStrategy for CachedStreamUrl {
  fn name(&self) -> &'static str {
    "stream-url"
  }

  async fn extract(&self, track: &TrackRecord) -> Result<StreamLocator, ExtractionFailure> {
    let stream_url = payload_str(track, "stream_url")?;
    let url = self.api.with_client_id(stream_url).await?;
    Ok(StreamLocator::progressive(url))
  }
}

/// Fetches the track by id and uses its first progressive audio transcoding.
pub struct Refetch {
  api: Arc<SoundCloudApi>,
}

#[async_trait]
impl StreamStrategy for Refetch {
  fn name(&self) -> &'static str {
    "refetch"
  }

  async fn extract(&self, track: &TrackRecord) -> Result<StreamLocator, ExtractionFailure> {
    let id = track
      .payload()
      .get("id")
      .ok_or(ExtractionFailure::Missing("id"))?;
    let json = self.api.track(id).await?;
    let transcoding =
      select_progressive(transcodings(&json)).ok_or(ExtractionFailure::Missing("transcodings"))?;
    let lookup = transcoding
      .get("url")
      .and_then(|v| v.as_str())
      .ok_or(ExtractionFailure::Missing("transcoding url"))?;

    let media_url = self.api.transcoding_url(lookup).await?;
    Ok(locator_for(transcoding, media_url))
  }
}
