use serde::{Deserialize, Serialize};

use crate::{common::types::AnyResult, configs::*};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
  #[serde(default)]
  pub server: ServerConfig,
  pub logging: Option<LoggingConfig>,
  #[serde(default)]
  pub sources: SourcesConfig,
  #[serde(default)]
  pub youtube: InnertubeConfig,
  #[serde(default)]
  pub googlevideo: InnertubeConfig,
  #[serde(default)]
  pub soundcloud: SoundCloudConfig,
  #[serde(default)]
  pub spotify: SpotifyConfig,
}

impl Config {
  pub fn load() -> AnyResult<Self> {
    let config_path = if std::path::Path::new("config.toml").exists() {
      "config.toml"
    } else if std::path::Path::new("config.default.toml").exists() {
      "config.default.toml"
    } else {
      return Err("config.toml or config.default.toml not found".into());
    };

    println!("Loading configuration from: {}", config_path);

    let config_str = std::fs::read_to_string(config_path)?;
    if config_str.is_empty() {
      return Err(format!("{} is empty", config_path).into());
    }

    let mut config: Config = toml::from_str(&config_str)?;
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
  }

  /// Fills credentials the file left empty from the process environment.
  pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    let fill = |slot: &mut Option<String>, key: &str| {
      if slot.as_deref().is_none_or(str::is_empty) {
        if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
          *slot = Some(value);
        }
      }
    };

    fill(&mut self.soundcloud.client_id, "SOUNDCLOUD_CLIENT_ID");
    fill(&mut self.soundcloud.oauth_token, "SOUNDCLOUD_OAUTH_TOKEN");
    fill(&mut self.youtube.api_key, "YOUTUBE_API_KEY");
    fill(&mut self.googlevideo.api_key, "YOUTUBE_API_KEY");
  }
}
