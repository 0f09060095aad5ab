use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::configs::HttpProxyConfig;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36";

pub struct HttpClient;

impl HttpClient {
  /// Builds the per-adapter client. Every adapter owns one; nothing is
  /// shared across providers.
  pub fn build(proxy: Option<&HttpProxyConfig>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
      .user_agent(DEFAULT_USER_AGENT)
      .timeout(Duration::from_secs(15));

    if let Some(url) = proxy.and_then(|p| p.url.as_deref()) {
      debug!("Configuring proxy: {}", url);
      let mut proxy_cfg = reqwest::Proxy::all(url)?;
      if let Some(p) = proxy {
        if let (Some(user), Some(pass)) = (&p.username, &p.password) {
          proxy_cfg = proxy_cfg.basic_auth(user, pass);
        }
      }
      builder = builder.proxy(proxy_cfg);
    }

    builder.build()
  }
}
