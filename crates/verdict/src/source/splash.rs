use anyhow::{Context, Result};
use std::time::Duration;
use url::Url;

use crate::config::SplashConfig;
use crate::error::VerdictError;

/// Client for an HTML rendering proxy (Splash `render.html` endpoint)
#[derive(Debug, Clone)]
pub struct SplashClient {
  client: reqwest::Client,
  endpoint: Url,
  wait: u32,
}

impl SplashClient {
  pub fn new(config: &SplashConfig) -> crate::error::Result<Self> {
    let endpoint = Url::parse(&config.url)
      .map_err(|e| VerdictError::config(format!("invalid splash url '{}': {e}", config.url)))?;
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(u64::from(config.wait) + 90))
      .build()?;

    Ok(Self { client, endpoint, wait: config.wait })
  }

  /// Render `url` and return the resulting HTML. `render_all` asks the proxy
  /// to render the full page rather than the viewport.
  pub async fn render(&self, url: &str, render_all: bool) -> Result<String> {
    let mut request = self.endpoint.clone();
    request.query_pairs_mut().append_pair("url", url).append_pair("wait", &self.wait.to_string());
    if render_all {
      request.query_pairs_mut().append_pair("render_all", "1");
    }

    tracing::debug!(%url, render_all, "rendering page");
    let response = self.client.get(request).send().await.context("failed to reach the rendering proxy")?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(VerdictError::remote(status.as_u16(), body).into());
    }

    response.text().await.context("failed to read rendered page")
  }
}
