//! Review/post records flowing through the pipeline.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::categorize::categorize;
use crate::normalize::Normalizer;
use crate::scorer::ScoreResult;

/// Rendering used for the `date` column
pub const DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
  Positive,
  Negative,
  Neutral,
}

impl SentimentLabel {
  pub fn as_str(&self) -> &'static str {
    match self {
      SentimentLabel::Positive => "Positive",
      SentimentLabel::Negative => "Negative",
      SentimentLabel::Neutral => "Neutral",
    }
  }
}

impl fmt::Display for SentimentLabel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// One review or post.
///
/// `cleaned_text` is derived from `raw_text` and is only ever written by
/// [`Record::clean`], so it cannot drift from the text it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
  /// Product code, app id or profile URL the record came from
  pub source_id: String,
  /// Human readable name of the reviewed item
  pub name: String,
  pub date: Option<NaiveDate>,
  /// Platform rating, independent of computed sentiment
  pub rating: Option<f32>,
  raw_text: String,
  cleaned_text: String,
  pub sentiment_score: Option<f64>,
  pub confidence: Option<f32>,
  pub sentiment_label: Option<SentimentLabel>,
}

impl Record {
  pub fn new(source_id: impl Into<String>, name: impl Into<String>, raw_text: impl Into<String>) -> Self {
    Self {
      source_id: source_id.into(),
      name: name.into(),
      date: None,
      rating: None,
      raw_text: raw_text.into(),
      cleaned_text: String::new(),
      sentiment_score: None,
      confidence: None,
      sentiment_label: None,
    }
  }

  pub fn with_date(mut self, date: NaiveDate) -> Self {
    self.date = Some(date);
    self
  }

  pub fn with_rating(mut self, rating: f32) -> Self {
    self.rating = Some(rating);
    self
  }

  pub fn raw_text(&self) -> &str {
    &self.raw_text
  }

  pub fn cleaned_text(&self) -> &str {
    &self.cleaned_text
  }

  /// Replace the raw text; the cleaned text is recomputed and any earlier
  /// judgment is discarded because it no longer describes this text.
  pub fn set_raw_text(&mut self, raw_text: impl Into<String>, normalizer: &Normalizer) {
    self.raw_text = raw_text.into();
    self.sentiment_score = None;
    self.confidence = None;
    self.sentiment_label = None;
    self.clean(normalizer);
  }

  /// Recompute `cleaned_text` from `raw_text`
  pub fn clean(&mut self, normalizer: &Normalizer) {
    self.cleaned_text = normalizer.normalize(&self.raw_text);
  }

  pub fn year(&self) -> Option<i32> {
    self.date.map(|d| d.year())
  }

  pub fn formatted_date(&self) -> Option<String> {
    self.date.map(|d| d.format(DATE_FORMAT).to_string())
  }

  /// Record a scorer judgment; the label is always derived from the result
  pub fn apply(&mut self, result: &ScoreResult) {
    self.sentiment_score = match result {
      ScoreResult::Compound(score) => Some(*score),
      _ => None,
    };
    self.confidence = match result {
      ScoreResult::Classified(classification) => Some(classification.confidence),
      _ => None,
    };
    self.sentiment_label = Some(categorize(result));
  }

  /// Explicit failure fallback, used when a scorer produced no usable output
  pub fn apply_fallback(&mut self, label: SentimentLabel) {
    self.sentiment_score = None;
    self.confidence = None;
    self.sentiment_label = Some(label);
  }
}
