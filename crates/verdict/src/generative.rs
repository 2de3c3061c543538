//! Batch sentiment flags from a remote generative model.
//!
//! Records are sent in fixed-size batches as a JSON array of
//! `{cleaned_text, sentiment_category}` objects. The model is asked to fill
//! in `sentiment_category` with 1 (positive) or 0 (negative) and return the
//! array unchanged otherwise.

pub mod client;
pub mod pacing;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};

use crate::categorize::BinaryFlag;
use crate::config::GenerativeConfig;
use crate::error::{Result, VerdictError};
use crate::record::{Record, SentimentLabel};
use crate::scorer::ScoreResult;

pub use client::{GeminiClient, GenerativeClient};
pub use pacing::Pacer;

const PROMPT_HEADER: &str = "You are an expert in linguistic analysis specializing in sentiment classification. \
Your task is to classify the sentiment of customer reviews into two categories: Positive (label=1) and Negative (label=0).

Below is a JSON array of customer reviews under the key 'cleaned_text'. Update the 'sentiment_category' field of every \
entry with either 1 (Positive) or 0 (Negative) based on the sentiment expressed in the review.

Please follow these rules:
1. Only return the updated JSON array as output.
2. Do not alter the structure, order or length of the array.
3. If a review violates API policy or contains any content issues, assign it a sentiment of 0 (Negative).

Reviews:

";

/// What a record gets when the service produced no usable verdict for it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
  #[default]
  Negative,
  Neutral,
  /// Leave the record out of the output
  Skip,
}

impl fmt::Display for FallbackPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      FallbackPolicy::Negative => "negative",
      FallbackPolicy::Neutral => "neutral",
      FallbackPolicy::Skip => "skip",
    };
    write!(f, "{name}")
  }
}

/// One element of the request and response arrays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
  #[serde(default)]
  pub cleaned_text: String,
  #[serde(default)]
  pub sentiment_category: Value,
}

pub fn build_prompt(records: &[Record]) -> Result<String> {
  let entries: Vec<BatchEntry> = records
    .iter()
    .map(|r| BatchEntry { cleaned_text: r.cleaned_text().to_string(), sentiment_category: Value::from("") })
    .collect();

  Ok(format!("{PROMPT_HEADER}{}", serde_json::to_string(&entries)?))
}

/// Remove Markdown code fences and a leading `json` language tag
pub fn strip_fences(text: &str) -> &str {
  let trimmed = text.trim().trim_matches('`').trim();
  trimmed.strip_prefix("json").or_else(|| trimmed.strip_prefix("JSON")).unwrap_or(trimmed).trim()
}

pub fn parse_response(text: &str) -> Result<Vec<BatchEntry>> {
  serde_json::from_str(strip_fences(text)).map_err(|e| VerdictError::malformed_response(e.to_string()))
}

/// Accepts `1`, `0`, `"1"` and `"0"`; anything else has no verdict
pub fn parse_flag(value: &Value) -> Option<BinaryFlag> {
  match value {
    Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
    Value::String(s) => s.trim().parse::<i64>().ok(),
    _ => None,
  }
  .and_then(BinaryFlag::from_int)
}

/// Pair records with verdicts position by position, truncating both sides to
/// the shorter length. Records without a verdict get the fallback.
pub fn reconcile(records: Vec<Record>, verdicts: Vec<Option<BinaryFlag>>, fallback: FallbackPolicy) -> Vec<Record> {
  records
    .into_iter()
    .zip(verdicts)
    .filter_map(|(mut record, verdict)| {
      match (verdict, fallback) {
        (Some(flag), _) => record.apply(&ScoreResult::Flag(flag)),
        (None, FallbackPolicy::Negative) => record.apply_fallback(SentimentLabel::Negative),
        (None, FallbackPolicy::Neutral) => record.apply_fallback(SentimentLabel::Neutral),
        (None, FallbackPolicy::Skip) => return None,
      }
      Some(record)
    })
    .collect()
}

pub struct GenerativeBatchScorer {
  client: Box<dyn GenerativeClient>,
  batch_size: usize,
  pacer: Pacer,
  fallback: FallbackPolicy,
}

impl GenerativeBatchScorer {
  pub fn new(client: Box<dyn GenerativeClient>, batch_size: usize, pacer: Pacer, fallback: FallbackPolicy) -> Self {
    Self { client, batch_size: batch_size.max(1), pacer, fallback }
  }

  pub fn from_config(config: &GenerativeConfig) -> Result<Self> {
    if config.batch_size == 0 {
      return Err(VerdictError::config("generative.batch_size must be at least 1"));
    }
    let client = GeminiClient::new(config)?;
    let pacer = Pacer::new(Duration::from_millis(config.min_interval_ms));

    Ok(Self::new(Box::new(client), config.batch_size, pacer, config.fallback))
  }

  pub async fn score_batches(&mut self, records: Vec<Record>) -> Vec<Record> {
    let total = records.len().div_ceil(self.batch_size);
    let mut scored = Vec::with_capacity(records.len());
    let mut remaining = records.into_iter();

    for index in 0..total {
      let batch: Vec<Record> = remaining.by_ref().take(self.batch_size).collect();
      bentley::info!("Now processing batch {} of {}", index + 1, total);
      scored.extend(self.score_batch(batch).await);
    }

    scored
  }

  async fn score_batch(&mut self, batch: Vec<Record>) -> Vec<Record> {
    let prompt = match build_prompt(&batch) {
      Ok(prompt) => prompt,
      Err(e) => {
        bentley::warn!("Could not serialize batch: {}; applying {} fallback", e, self.fallback);
        let verdicts = vec![None; batch.len()];
        return reconcile(batch, verdicts, self.fallback);
      }
    };

    self.pacer.wait().await;
    let started = Instant::now();
    let response = self.client.generate(&prompt).await;
    tracing::debug!(records = batch.len(), elapsed_ms = started.elapsed().as_millis() as u64, "batch request finished");

    let verdicts: Vec<Option<BinaryFlag>> = match response {
      Ok(Some(text)) => match parse_response(&text) {
        Ok(entries) => entries.iter().map(|entry| parse_flag(&entry.sentiment_category)).collect(),
        Err(e) => {
          bentley::warn!("Error parsing response, dropping batch of {}: {}", batch.len(), e);
          return Vec::new();
        }
      },
      Ok(None) => {
        bentley::warn!("Response blocked or empty; applying {} fallback", self.fallback);
        vec![None; batch.len()]
      }
      Err(e) => {
        bentley::warn!("Error during API call: {:#}; applying {} fallback", e, self.fallback);
        vec![None; batch.len()]
      }
    };

    if verdicts.len() != batch.len() {
      bentley::warn!(
        "Length mismatch: sent {}, received {}; keeping {}",
        batch.len(),
        verdicts.len(),
        batch.len().min(verdicts.len())
      );
    }

    reconcile(batch, verdicts, self.fallback)
  }
}
