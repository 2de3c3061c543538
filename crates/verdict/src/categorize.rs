//! Mapping from raw scorer output to the three sentiment labels.

use crate::record::SentimentLabel;
use crate::scorer::ScoreResult;

/// Half-width of the dead zone around zero that counts as neutral
pub const NEUTRAL_BAND: f64 = 0.05;

/// Two-valued verdict returned by the generative service (1 = positive, 0 = negative)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryFlag {
  Negative = 0,
  Positive = 1,
}

impl BinaryFlag {
  pub fn from_int(value: i64) -> Option<Self> {
    match value {
      0 => Some(BinaryFlag::Negative),
      1 => Some(BinaryFlag::Positive),
      _ => None,
    }
  }
}

pub fn categorize(result: &ScoreResult) -> SentimentLabel {
  match result {
    ScoreResult::Compound(score) => categorize_score(*score),
    ScoreResult::Classified(classification) => categorize_label(&classification.label),
    ScoreResult::Flag(flag) => categorize_flag(*flag),
  }
}

/// Continuous compound score; the band edges themselves are neutral
pub fn categorize_score(score: f64) -> SentimentLabel {
  if score > NEUTRAL_BAND {
    SentimentLabel::Positive
  } else if score < -NEUTRAL_BAND {
    SentimentLabel::Negative
  } else {
    SentimentLabel::Neutral
  }
}

/// Classifier label space; unknown labels fall back to neutral
pub fn categorize_label(label: &str) -> SentimentLabel {
  match label.trim().to_ascii_uppercase().as_str() {
    "POSITIVE" | "POS" => SentimentLabel::Positive,
    "NEGATIVE" | "NEG" => SentimentLabel::Negative,
    "NEUTRAL" | "NEU" => SentimentLabel::Neutral,
    _ => SentimentLabel::Neutral,
  }
}

/// Binary flags have no neutral branch
pub fn categorize_flag(flag: BinaryFlag) -> SentimentLabel {
  match flag {
    BinaryFlag::Positive => SentimentLabel::Positive,
    BinaryFlag::Negative => SentimentLabel::Negative,
  }
}
