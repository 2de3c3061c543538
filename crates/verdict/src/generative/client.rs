use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::config::GenerativeConfig;
use crate::error::VerdictError;

/// Remote text generation used by the batch scorer
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeClient: Send + Sync {
  /// `Ok(None)` means the service answered but produced no usable text,
  /// e.g. because the prompt or the candidate was blocked.
  async fn generate(&self, prompt: &str) -> Result<Option<String>>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
  contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
  parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
  text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
  prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
  content: Option<CandidateContent>,
  finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
  text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
  block_reason: Option<String>,
}

impl GenerateResponse {
  fn first_text(self) -> Option<String> {
    let candidate = self.candidates.into_iter().next()?;
    if let Some(reason) = &candidate.finish_reason {
      tracing::debug!(finish_reason = %reason, "generation finished");
    }
    candidate.content?.parts.into_iter().find_map(|part| part.text).filter(|text| !text.trim().is_empty())
  }
}

/// `generateContent` REST client for Gemini models
pub struct GeminiClient {
  client: reqwest::Client,
  endpoint: Url,
}

impl GeminiClient {
  pub fn new(config: &GenerativeConfig) -> crate::error::Result<Self> {
    let api_key = config.resolve_api_key().ok_or_else(|| {
      VerdictError::config("no API key for the generative scorer; set generative.api_key or GEMINI_API_KEY")
    })?;

    let base = config.base_url.trim_end_matches('/');
    let mut endpoint = Url::parse(&format!("{base}/v1beta/models/{}:generateContent", config.model))
      .map_err(|e| VerdictError::config(format!("invalid generative base_url '{base}': {e}")))?;
    endpoint.query_pairs_mut().append_pair("key", &api_key);

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(concat!("verdict/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self { client, endpoint })
  }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
  async fn generate(&self, prompt: &str) -> Result<Option<String>> {
    let body = GenerateRequest { contents: vec![RequestContent { parts: vec![RequestPart { text: prompt }] }] };

    let response = self
      .client
      .post(self.endpoint.clone())
      .json(&body)
      .send()
      .await
      .context("failed to reach the generative service")?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(VerdictError::remote(status.as_u16(), body).into());
    }

    let parsed: GenerateResponse = response
      .json()
      .await
      .map_err(|e| VerdictError::malformed_response(format!("failed to parse generation response: {e}")))?;

    if let Some(reason) = parsed.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_deref()) {
      tracing::debug!(block_reason = %reason, "prompt blocked");
      return Ok(None);
    }

    Ok(parsed.first_text())
  }
}
