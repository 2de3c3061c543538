//! The three interchangeable scoring backends.

use anyhow::Result;
use clap::ValueEnum;

use crate::categorize::BinaryFlag;
use crate::classifier::{create_classifier, Classification, ClassifierScorer};
use crate::config::Config;
use crate::generative::GenerativeBatchScorer;
use crate::lexicon::LexiconScorer;
use crate::normalize::Profile;
use crate::record::{Record, SentimentLabel};

/// Raw scorer output before categorization
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreResult {
  /// Continuous score in [-1, 1]
  Compound(f64),
  Classified(Classification),
  Flag(BinaryFlag),
}

/// Per-text scoring, used by the backends that do not need batching
pub trait SentimentScorer: Send {
  fn score(&mut self, cleaned_text: &str) -> Result<ScoreResult>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScorerKind {
  Lexicon,
  Classifier,
  Generative,
}

impl ScorerKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ScorerKind::Lexicon => "lexicon",
      ScorerKind::Classifier => "classifier",
      ScorerKind::Generative => "generative",
    }
  }

  /// Lexicon lookup needs fully cleaned tokens; the models want natural text
  pub fn profile(&self) -> Profile {
    match self {
      ScorerKind::Lexicon => Profile::Full,
      ScorerKind::Classifier | ScorerKind::Generative => Profile::Light,
    }
  }
}

pub enum Scorer {
  Lexicon(LexiconScorer),
  Classifier(ClassifierScorer),
  Generative(GenerativeBatchScorer),
}

impl Scorer {
  pub fn from_config(kind: ScorerKind, config: &Config) -> Result<Self> {
    let scorer = match kind {
      ScorerKind::Lexicon => Scorer::Lexicon(LexiconScorer::load(&config.resources.lexicon)?),
      ScorerKind::Classifier => Scorer::Classifier(ClassifierScorer::new(create_classifier(&config.classifier)?)),
      ScorerKind::Generative => Scorer::Generative(GenerativeBatchScorer::from_config(&config.generative)?),
    };
    Ok(scorer)
  }

  pub fn kind(&self) -> ScorerKind {
    match self {
      Scorer::Lexicon(_) => ScorerKind::Lexicon,
      Scorer::Classifier(_) => ScorerKind::Classifier,
      Scorer::Generative(_) => ScorerKind::Generative,
    }
  }

  /// Score every record in order. The generative backend may return fewer
  /// records than it was given; the others return all of them.
  pub async fn score_records(&mut self, records: Vec<Record>) -> Vec<Record> {
    match self {
      Scorer::Lexicon(scorer) => score_each(scorer, records),
      Scorer::Classifier(scorer) => score_each(scorer, records),
      Scorer::Generative(scorer) => scorer.score_batches(records).await,
    }
  }
}

/// Score records one at a time. A failing record is logged and labelled
/// neutral; the rest of the run carries on.
pub fn score_each<S: SentimentScorer + ?Sized>(scorer: &mut S, mut records: Vec<Record>) -> Vec<Record> {
  for (i, record) in records.iter_mut().enumerate() {
    match scorer.score(record.cleaned_text()) {
      Ok(result) => record.apply(&result),
      Err(e) => {
        bentley::warn!("Scoring failed for record {} ({}): {:#}", i + 1, record.source_id, e);
        record.apply_fallback(SentimentLabel::Neutral);
      }
    }
  }
  records
}
