use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,
  /// Checked against the `Authorization` header when set.
  #[serde(default)]
  pub password: Option<String>,
}

fn default_host() -> String {
  "0.0.0.0".to_string()
}

fn default_port() -> u16 {
  2444
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host: default_host(),
      port: default_port(),
      password: None,
    }
  }
}
