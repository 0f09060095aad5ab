use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info, warn};

use super::{
  googlevideo::GoogleVideoSource, plugin::BoxedSource, soundcloud::SoundCloudSource,
  spotify::SpotifyBridgeSource, youtube::YouTubeSource,
};
use crate::{configs::Config, protocol::tracks::SourceId};

/// Ordered registry of active sources.
///
/// Priority is the registration order: the primary provider first, then
/// the bridge and the general-purpose search provider, generic video last.
pub struct SourceManager {
  config: Config,
  sources: RwLock<Vec<BoxedSource>>,
}

impl SourceManager {
  pub fn new(config: Config) -> Self {
    Self {
      config,
      sources: RwLock::new(Vec::new()),
    }
  }

  /// Registers every source enabled in the configuration.
  pub async fn from_config(config: Config) -> Self {
    let manager = Self::new(config);
    let toggles = manager.config.sources.clone();

    macro_rules! register_source {
      ($enabled:expr, $ctor:expr) => {
        if $enabled {
          manager.register(Arc::new($ctor)).await;
        }
      };
    }

    register_source!(toggles.youtube, YouTubeSource::new());
    register_source!(toggles.spotify, SpotifyBridgeSource::new());
    register_source!(toggles.soundcloud, SoundCloudSource::new());
    register_source!(toggles.googlevideo, GoogleVideoSource::new());

    if toggles.youtube && toggles.googlevideo {
      warn!("youtube and youtube-sabr both accept YouTube URLs; youtube takes precedence");
    }

    manager
  }

  /// Activates `source` and appends it to the active set. Returns false if
  /// activation failed or a source with the same id is already active.
  pub async fn register(&self, source: BoxedSource) -> bool {
    let id = source.id();
    if self.get(id).is_some() {
      warn!("Source {} is already registered, skipping", id);
      return false;
    }

    if let Err(e) = source.activate(&self.config).await {
      error!("{}", e);
      return false;
    }

    info!("Loaded source: {}", source.name());
    self.sources.write().push(source);
    true
  }

  /// Active sources in priority order.
  pub fn all(&self) -> Vec<BoxedSource> {
    self.sources.read().clone()
  }

  pub fn get(&self, id: SourceId) -> Option<BoxedSource> {
    self.sources.read().iter().find(|s| s.id() == id).cloned()
  }

  /// Removes a source from the active set and tears its session down.
  pub async fn deactivate(&self, id: SourceId) -> bool {
    let removed = {
      let mut sources = self.sources.write();
      sources
        .iter()
        .position(|s| s.id() == id)
        .map(|idx| sources.remove(idx))
    };

    match removed {
      Some(source) => {
        source.deactivate().await;
        info!("Unloaded source: {}", id);
        true
      }
      None => false,
    }
  }

  /// Get names of all active sources
  pub fn source_names(&self) -> Vec<&'static str> {
    self.sources.read().iter().map(|s| s.name()).collect()
  }

  pub fn config(&self) -> &Config {
    &self.config
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sources::testing::FakeSource;

  #[tokio::test]
  async fn keeps_registration_order() {
    let manager = SourceManager::new(Config::default());
    assert!(manager.register(Arc::new(FakeSource::new(SourceId::YouTube))).await);
    assert!(
      manager
        .register(Arc::new(FakeSource::new(SourceId::SpotifySoundCloud)))
        .await
    );
    assert!(manager.register(Arc::new(FakeSource::new(SourceId::SoundCloud))).await);

    assert_eq!(
      manager.source_names(),
      vec!["youtube", "spotify-soundcloud", "soundcloud"]
    );
  }

  #[tokio::test]
  async fn failed_activation_is_excluded() {
    let manager = SourceManager::new(Config::default());
    let registered = manager
      .register(Arc::new(
        FakeSource::new(SourceId::SpotifySoundCloud).failing_activation(),
      ))
      .await;

    assert!(!registered);
    assert!(manager.all().is_empty());
    assert!(manager.get(SourceId::SpotifySoundCloud).is_none());
  }

  #[tokio::test]
  async fn duplicate_ids_are_rejected() {
    let manager = SourceManager::new(Config::default());
    assert!(manager.register(Arc::new(FakeSource::new(SourceId::SoundCloud))).await);
    assert!(!manager.register(Arc::new(FakeSource::new(SourceId::SoundCloud))).await);
    assert_eq!(manager.all().len(), 1);
  }

  #[tokio::test]
  async fn config_registers_generic_video_last() {
    let mut config = Config::default();
    config.sources.googlevideo = true;
    config.soundcloud.client_id = Some("PinnedClientId0000000000".to_string());

    let manager = SourceManager::from_config(config).await;
    assert_eq!(
      manager.source_names(),
      vec!["youtube", "spotify-soundcloud", "soundcloud", "youtube-sabr"]
    );
  }

  #[tokio::test]
  async fn free_text_prefers_soundcloud_over_generic_video() {
    let mut config = Config::default();
    config.sources.googlevideo = true;
    config.soundcloud.client_id = Some("PinnedClientId0000000000".to_string());

    let manager = SourceManager::from_config(config).await;
    let primary = manager
      .all()
      .into_iter()
      .find(|s| s.validate("lofi hip hop"))
      .map(|s| s.id());
    assert_eq!(primary, Some(SourceId::SoundCloud));
  }

  #[tokio::test]
  async fn deactivate_removes_source() {
    let manager = SourceManager::new(Config::default());
    manager.register(Arc::new(FakeSource::new(SourceId::YouTube))).await;
    manager.register(Arc::new(FakeSource::new(SourceId::SoundCloud))).await;

    assert!(manager.deactivate(SourceId::YouTube).await);
    assert!(!manager.deactivate(SourceId::YouTube).await);
    assert_eq!(manager.source_names(), vec!["soundcloud"]);
  }
}
