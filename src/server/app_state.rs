use std::sync::Arc;

use crate::{
  configs::ServerConfig,
  sources::{QueryResolver, SourceManager, StreamResolver},
};

/// Top-level application state.
pub struct AppState {
  pub source_manager: Arc<SourceManager>,
  pub resolver: QueryResolver,
  pub streams: StreamResolver,
  pub server: ServerConfig,
}

impl AppState {
  pub fn new(source_manager: Arc<SourceManager>) -> Self {
    Self {
      server: source_manager.config().server.clone(),
      resolver: QueryResolver::new(source_manager.clone()),
      streams: StreamResolver::new(source_manager.clone()),
      source_manager,
    }
  }
}
