use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
  common::errors::SourceError,
  protocol::tracks::{StreamLocator, TrackRecord},
  sources::SourceManager,
};

/// Failure of one provider call or one extraction strategy.
///
/// Provider clients return it from every request; adapters log it and
/// degrade to an empty result on resolve paths. A `StreamChain` swallows
/// it per strategy and reports `SourceError::StreamUnavailable` instead.
#[derive(Debug, Error)]
pub enum ExtractionFailure {
  #[error("{0} not present")]
  Missing(&'static str),
  #[error(transparent)]
  Http(#[from] reqwest::Error),
  #[error("provider answered with status {0}")]
  Status(u16),
  #[error("{0}")]
  Provider(String),
}

/// One way of turning a track into a stream locator.
#[async_trait]
pub trait StreamStrategy: Send + Sync {
  fn name(&self) -> &'static str;

  async fn extract(&self, track: &TrackRecord) -> Result<StreamLocator, ExtractionFailure>;
}

/// Ordered list of strategies; the first success wins.
#[derive(Default)]
pub struct StreamChain {
  strategies: Vec<Box<dyn StreamStrategy>>,
}

impl StreamChain {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn then(mut self, strategy: impl StreamStrategy + 'static) -> Self {
    self.strategies.push(Box::new(strategy));
    self
  }

  pub fn names(&self) -> Vec<&'static str> {
    self.strategies.iter().map(|s| s.name()).collect()
  }

  /// Runs each strategy in order. Fails with `StreamUnavailable` only once
  /// all of them have failed.
  pub async fn run(&self, track: &TrackRecord) -> Result<StreamLocator, SourceError> {
    for strategy in &self.strategies {
      match strategy.extract(track).await {
        Ok(locator) => {
          debug!(
            "{}: stream for '{}' resolved via {}",
            track.source_id(),
            track.title(),
            strategy.name()
          );
          return Ok(locator);
        }
        Err(e) => {
          debug!(
            "{}: {} failed for '{}': {}",
            track.source_id(),
            strategy.name(),
            track.title(),
            e
          );
        }
      }
    }

    warn!(
      "{}: unable to extract stream for '{}'",
      track.source_id(),
      track.title()
    );
    Err(SourceError::StreamUnavailable {
      source_id: track.source_id(),
      title: track.title().to_string(),
    })
  }
}

/// Dispatches stream requests to the adapter that produced the track.
#[derive(Clone)]
pub struct StreamResolver {
  manager: Arc<SourceManager>,
}

impl StreamResolver {
  pub fn new(manager: Arc<SourceManager>) -> Self {
    Self { manager }
  }

  pub async fn stream(&self, track: &TrackRecord) -> Result<StreamLocator, SourceError> {
    let source = self
      .manager
      .get(track.source_id())
      .ok_or(SourceError::AdapterUnavailable(track.source_id()))?;
    source.stream(track).await
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use serde_json::json;

  use super::*;
  use crate::{
    configs::Config,
    protocol::tracks::SourceId,
    sources::testing::{FakeSource, sample_track},
  };

  struct Counting {
    name: &'static str,
    result: Option<&'static str>,
    calls: Arc<AtomicUsize>,
  }

  impl Counting {
    fn new(name: &'static str, result: Option<&'static str>) -> (Self, Arc<AtomicUsize>) {
      let calls = Arc::new(AtomicUsize::new(0));
      (
        Self {
          name,
          result,
          calls: calls.clone(),
        },
        calls,
      )
    }
  }

  #[async_trait]
  impl StreamStrategy for Counting {
    fn name(&self) -> &'static str {
      self.name
    }

    async fn extract(&self, _track: &TrackRecord) -> Result<StreamLocator, ExtractionFailure> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      match self.result {
        Some(url) => Ok(StreamLocator::progressive(url)),
        None => Err(ExtractionFailure::Provider(format!("{} broke", self.name))),
      }
    }
  }

  /// Mirrors the "cached direct URL" step: succeeds only if the payload has one.
  struct Cached;

  #[async_trait]
  impl StreamStrategy for Cached {
    fn name(&self) -> &'static str {
      "cached"
    }

    async fn extract(&self, track: &TrackRecord) -> Result<StreamLocator, ExtractionFailure> {
      track
        .payload()
        .get("stream_url")
        .and_then(|v| v.as_str())
        .map(StreamLocator::progressive)
        .ok_or(ExtractionFailure::Missing("stream_url"))
    }
  }

  #[tokio::test]
  async fn second_strategy_wins_without_running_third() {
    let (utility, utility_calls) = Counting::new("utility", None);
    let (refetch, refetch_calls) = Counting::new("refetch", Some("https://cdn/refetched"));
    let chain = StreamChain::new().then(utility).then(Cached).then(refetch);

    let track = TrackRecord::builder(
      SourceId::SoundCloud,
      json!({ "stream_url": "https://api.soundcloud.com/tracks/1/stream" }),
    )
    .title(Some("Say It"))
    .build();

    let locator = chain.run(&track).await.unwrap();
    assert_eq!(locator.url, "https://api.soundcloud.com/tracks/1/stream");
    assert_eq!(utility_calls.load(Ordering::SeqCst), 1);
    assert_eq!(refetch_calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn exhausted_chain_fails_once() {
    let (utility, utility_calls) = Counting::new("utility", None);
    let (refetch, refetch_calls) = Counting::new("refetch", None);
    let chain = StreamChain::new().then(utility).then(Cached).then(refetch);
    assert_eq!(chain.names(), vec!["utility", "cached", "refetch"]);

    let track = TrackRecord::builder(SourceId::SoundCloud, json!({}))
      .title(Some("Gone"))
      .build();

    let err = chain.run(&track).await.unwrap_err();
    assert!(matches!(
      err,
      SourceError::StreamUnavailable { source_id: SourceId::SoundCloud, ref title } if title == "Gone"
    ));
    assert_eq!(utility_calls.load(Ordering::SeqCst), 1);
    assert_eq!(refetch_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn resolver_dispatches_by_source_id() {
    let manager = Arc::new(SourceManager::new(Config::default()));
    let fake = FakeSource::new(SourceId::YouTube).streaming("https://cdn/yt.webm");
    let stream_calls = fake.stream_calls();
    manager.register(Arc::new(fake)).await;

    let resolver = StreamResolver::new(manager);
    let locator = resolver
      .stream(&sample_track(SourceId::YouTube, "a"))
      .await
      .unwrap();
    assert_eq!(locator.url, "https://cdn/yt.webm");
    assert_eq!(stream_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn resolver_rejects_tracks_of_inactive_sources() {
    let manager = Arc::new(SourceManager::new(Config::default()));
    manager
      .register(Arc::new(FakeSource::new(SourceId::SoundCloud)))
      .await;
    assert!(manager.deactivate(SourceId::SoundCloud).await);

    let resolver = StreamResolver::new(manager);
    let err = resolver
      .stream(&sample_track(SourceId::SoundCloud, "queued before shutdown"))
      .await
      .unwrap_err();
    assert!(matches!(
      err,
      SourceError::AdapterUnavailable(SourceId::SoundCloud)
    ));
  }
}
