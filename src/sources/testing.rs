//! In-process fakes shared by the registry, resolver and stream tests.

use std::sync::{
  Arc,
  atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use serde_json::json;

use crate::{
  common::errors::SourceError,
  configs::Config,
  protocol::tracks::{SourceId, StreamLocator, TrackRecord},
  sources::{SourcePlugin, query},
};

pub fn sample_track(source_id: SourceId, title: &str) -> TrackRecord {
  TrackRecord::builder(source_id, json!({ "title": title }))
    .title(Some(title))
    .build()
}

#[derive(Clone, Copy)]
pub enum Accepts {
  Everything,
  Text,
  Prefix(&'static str),
  Nothing,
}

pub struct FakeSource {
  id: SourceId,
  accepts: Accepts,
  search_fallback: bool,
  fail_activation: bool,
  results: Vec<String>,
  stream_url: Option<String>,
  active: AtomicBool,
  resolve_calls: Arc<AtomicUsize>,
  stream_calls: Arc<AtomicUsize>,
}

impl FakeSource {
  pub fn new(id: SourceId) -> Self {
    Self {
      id,
      accepts: Accepts::Everything,
      search_fallback: false,
      fail_activation: false,
      results: Vec::new(),
      stream_url: None,
      active: AtomicBool::new(false),
      resolve_calls: Arc::new(AtomicUsize::new(0)),
      stream_calls: Arc::new(AtomicUsize::new(0)),
    }
  }

  pub fn accepting(mut self, accepts: Accepts) -> Self {
    self.accepts = accepts;
    self
  }

  pub fn search_fallback(mut self) -> Self {
    self.search_fallback = true;
    self
  }

  pub fn failing_activation(mut self) -> Self {
    self.fail_activation = true;
    self
  }

  pub fn returning(mut self, titles: &[&str]) -> Self {
    self.results = titles.iter().map(|t| t.to_string()).collect();
    self
  }

  pub fn streaming(mut self, url: &str) -> Self {
    self.stream_url = Some(url.to_string());
    self
  }

  pub fn resolve_calls(&self) -> Arc<AtomicUsize> {
    self.resolve_calls.clone()
  }

  pub fn stream_calls(&self) -> Arc<AtomicUsize> {
    self.stream_calls.clone()
  }
}

#[async_trait]
impl SourcePlugin for FakeSource {
  fn id(&self) -> SourceId {
    self.id
  }

  async fn activate(&self, _config: &Config) -> Result<(), SourceError> {
    if self.fail_activation {
      return Err(SourceError::init(self.id, "missing credential"));
    }
    self.active.store(true, Ordering::SeqCst);
    Ok(())
  }

  async fn deactivate(&self) {
    self.active.store(false, Ordering::SeqCst);
  }

  fn validate(&self, q: &str) -> bool {
    if q.trim().is_empty() {
      return false;
    }
    match self.accepts {
      Accepts::Everything => true,
      Accepts::Text => query::is_text(q),
      Accepts::Prefix(prefix) => q.starts_with(prefix),
      Accepts::Nothing => false,
    }
  }

  fn is_search_fallback(&self) -> bool {
    self.search_fallback
  }

  async fn resolve(&self, _query: &str) -> Vec<TrackRecord> {
    self.resolve_calls.fetch_add(1, Ordering::SeqCst);
    self
      .results
      .iter()
      .map(|title| sample_track(self.id, title))
      .collect()
  }

  async fn stream(&self, track: &TrackRecord) -> Result<StreamLocator, SourceError> {
    self.stream_calls.fetch_add(1, Ordering::SeqCst);
    self
      .stream_url
      .as_deref()
      .map(StreamLocator::progressive)
      .ok_or_else(|| SourceError::StreamUnavailable {
        source_id: self.id,
        title: track.title().to_string(),
      })
  }
}

/// Binds an ephemeral local port; returns the listener and its base URL.
pub async fn bind() -> (tokio::net::TcpListener, String) {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let base = format!("http://{}", listener.local_addr().unwrap());
  (listener, base)
}

/// Serves `router` on `listener` for the rest of the test.
pub fn spawn(listener: tokio::net::TcpListener, router: axum::Router) {
  tokio::spawn(async move {
    axum::serve(listener, router).await.unwrap();
  });
}
