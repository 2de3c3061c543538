pub mod client;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::{RecordSource, SourceKind};
use crate::config::PlayStoreConfig;
use crate::error::VerdictError;
use crate::record::Record;

pub use client::{PlayReviewsClient, ReviewSort};

/// One app store review, from an export file or a fetched page
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppReview {
  #[serde(default)]
  pub review_id: Option<String>,
  pub at: String,
  #[serde(default)]
  pub score: Option<f32>,
  #[serde(default)]
  pub content: Option<String>,
}

enum Mode {
  Export(PathBuf),
  Live { client: PlayReviewsClient, count: usize },
}

/// App reviews, read from a JSON export when one is configured and fetched
/// page by page from the store otherwise
pub struct PlayStoreSource {
  mode: Mode,
  app_id: String,
}

impl PlayStoreSource {
  pub fn new(config: &PlayStoreConfig) -> crate::error::Result<Self> {
    if let Some(export) = &config.export {
      let app_id = if config.app_id.is_empty() {
        export.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
      } else {
        config.app_id.clone()
      };
      return Ok(Self { mode: Mode::Export(export.clone()), app_id });
    }

    if config.app_id.trim().is_empty() {
      return Err(VerdictError::config("set sources.play_store.app_id or sources.play_store.export"));
    }
    let client = PlayReviewsClient::new(config)?;
    Ok(Self { mode: Mode::Live { client, count: config.count }, app_id: config.app_id.clone() })
  }

  async fn read_export(&self, export: &Path) -> Result<Vec<AppReview>> {
    if !export.exists() {
      return Err(VerdictError::missing_resource("review export", export).into());
    }

    let content =
      tokio::fs::read_to_string(export).await.with_context(|| format!("failed to read {}", export.display()))?;
    let entries: Vec<serde_json::Value> =
      serde_json::from_str(&content).map_err(|e| VerdictError::malformed_response(format!("review export: {e}")))?;

    let mut reviews = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
      match serde_json::from_value(entry) {
        Ok(review) => reviews.push(review),
        Err(e) => bentley::warn!("Skipping review {}: {}", i + 1, e),
      }
    }
    Ok(reviews)
  }
}

#[async_trait]
impl RecordSource for PlayStoreSource {
  fn kind(&self) -> SourceKind {
    SourceKind::PlayStore
  }

  async fn collect(&mut self) -> Result<Vec<Record>> {
    let reviews = match &self.mode {
      Mode::Export(export) => self.read_export(export).await?,
      Mode::Live { client, count } => {
        bentley::info!("Fetching up to {} reviews for {}", count, self.app_id);
        client.fetch(*count).await.with_context(|| format!("failed to fetch reviews for {}", self.app_id))?
      }
    };

    let mut records = Vec::with_capacity(reviews.len());
    for review in reviews {
      let id = review.review_id.clone().unwrap_or_else(|| "(no id)".to_string());
      match to_record(review, &self.app_id) {
        Ok(record) => records.push(record),
        Err(e) => bentley::warn!("Skipping review {}: {}", id, e),
      }
    }

    bentley::info!("Loaded {} reviews for {}", records.len(), self.app_id);
    Ok(records)
  }
}

fn to_record(review: AppReview, app_id: &str) -> crate::error::Result<Record> {
  let date = parse_review_time(&review.at)?;
  let text = review.content.ok_or_else(|| VerdictError::extraction("content", "missing review text"))?;

  let mut record = Record::new(app_id, app_id, text).with_date(date);
  record.rating = review.score;
  Ok(record)
}

/// Accepts RFC 3339 timestamps, `YYYY-MM-DD HH:MM:SS` and plain dates
pub fn parse_review_time(at: &str) -> crate::error::Result<NaiveDate> {
  let at = at.trim();
  if let Ok(timestamp) = DateTime::parse_from_rfc3339(at) {
    return Ok(timestamp.date_naive());
  }
  for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(at, format) {
      return Ok(timestamp.date());
    }
  }
  NaiveDate::parse_from_str(at, "%Y-%m-%d")
    .map_err(|e| VerdictError::extraction("at", format!("unrecognised timestamp '{at}': {e}")))
}
