//! One run: collect, clean, score, write.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::Config;
use crate::normalize::Normalizer;
use crate::record::{Record, SentimentLabel};
use crate::scorer::{Scorer, ScorerKind};
use crate::sink::{self, CsvSink, COLUMNS};
use crate::source::{create_source, RecordSource, SourceKind};

const PREVIEW_WIDTH: usize = 32;

/// What a finished run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
  pub collected: usize,
  pub written: usize,
  pub positive: usize,
  pub negative: usize,
  pub neutral: usize,
  pub output: PathBuf,
}

impl RunSummary {
  fn tally(records: &[Record], collected: usize, output: PathBuf) -> Self {
    let count = |label: SentimentLabel| records.iter().filter(|r| r.sentiment_label == Some(label)).count();
    Self {
      collected,
      written: records.len(),
      positive: count(SentimentLabel::Positive),
      negative: count(SentimentLabel::Negative),
      neutral: count(SentimentLabel::Neutral),
      output,
    }
  }
}

pub struct Pipeline {
  source: Box<dyn RecordSource>,
  normalizer: Normalizer,
  scorer: Scorer,
  sink: CsvSink,
  preview: usize,
}

impl Pipeline {
  pub fn new(
    source: Box<dyn RecordSource>,
    normalizer: Normalizer,
    scorer: Scorer,
    sink: CsvSink,
    preview: usize,
  ) -> Self {
    Self { source, normalizer, scorer, sink, preview }
  }

  /// Assemble every stage from configuration. Resources are loaded here, so a
  /// missing lexicon fails before any record is fetched.
  pub fn from_config(source_kind: SourceKind, scorer_kind: ScorerKind, config: &Config) -> Result<Self> {
    config.validate(source_kind, scorer_kind)?;

    let normalizer = Normalizer::from_config(scorer_kind.profile(), config)?;
    let scorer = Scorer::from_config(scorer_kind, config).context("failed to set up scorer")?;
    let source = create_source(source_kind, config)?;
    let prefix = format!("{}_with_{}_sentiment", source_kind.output_prefix(), scorer_kind.as_str());
    let sink = CsvSink::new(&config.output.dir, prefix);

    Ok(Self::new(source, normalizer, scorer, sink, config.output.preview))
  }

  pub async fn run(&mut self) -> Result<RunSummary> {
    bentley::announce!("Collecting {} records", self.source.kind().output_prefix());
    let mut records = self.source.collect().await.context("failed to collect records")?;
    let collected = records.len();
    if records.is_empty() {
      bentley::warn!("No records collected");
    }

    for record in records.iter_mut() {
      record.clean(&self.normalizer);
    }
    self.show_preview("Before Sentiment Analysis", &records);

    bentley::announce!("Scoring with {} scorer", self.scorer.kind().as_str());
    let records = self.scorer.score_records(records).await;
    if records.len() < collected {
      bentley::warn!("{} of {} records were dropped during scoring", collected - records.len(), collected);
    }
    self.show_preview("After Sentiment Analysis", &records);

    let output = self.sink.write(&records).context("failed to write results")?;
    let summary = RunSummary::tally(&records, collected, output);

    bentley::flourish!("Saved {} records to {}", summary.written, summary.output.display());
    bentley::info!(
      "Positive: {}, Negative: {}, Neutral: {}",
      summary.positive,
      summary.negative,
      summary.neutral
    );

    Ok(summary)
  }

  fn show_preview(&self, stage: &str, records: &[Record]) {
    if self.preview == 0 || records.is_empty() {
      return;
    }

    let head: Vec<Vec<String>> = records.iter().take(self.preview).map(sink::row).collect();
    bentley::spotlight!("First {} Records {}", head.len(), stage);
    bentley::table(&COLUMNS, &head, PREVIEW_WIDTH);

    let skip = records.len().saturating_sub(self.preview);
    let tail: Vec<Vec<String>> = records.iter().skip(skip).map(sink::row).collect();
    bentley::spotlight!("Last {} Records {}", tail.len(), stage);
    bentley::table(&COLUMNS, &tail, PREVIEW_WIDTH);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lexicon::{Lexicon, LexiconScorer};
  use async_trait::async_trait;
  use tempfile::TempDir;

  struct FixedSource(Vec<Record>);

  #[async_trait]
  impl RecordSource for FixedSource {
    fn kind(&self) -> SourceKind {
      SourceKind::Posts
    }

    async fn collect(&mut self) -> Result<Vec<Record>> {
      Ok(std::mem::take(&mut self.0))
    }
  }

  fn lexicon_scorer() -> Scorer {
    Scorer::Lexicon(LexiconScorer::new(Lexicon::from_entries([("great", 3.1), ("broken", -2.1)])))
  }

  #[tokio::test]
  async fn test_run_writes_every_record() {
    let temp_dir = TempDir::new().unwrap();
    let source = FixedSource(vec![
      Record::new("p", "EurekaForbes", "Great product!! 😀 Works well.\n"),
      Record::new("p", "EurekaForbes", "Arrived broken"),
      Record::new("p", "EurekaForbes", "It is a purifier"),
    ]);
    let sink = CsvSink::new(temp_dir.path(), "social_posts_with_lexicon_sentiment");
    let mut pipeline = Pipeline::new(Box::new(source), Normalizer::builtin_full(), lexicon_scorer(), sink, 2);

    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.collected, 3);
    assert_eq!(summary.written, 3);
    assert_eq!((summary.positive, summary.negative, summary.neutral), (1, 1, 1));
    assert!(summary.output.exists());

    let content = std::fs::read_to_string(&summary.output).unwrap();
    assert!(content.contains("great product work well."));
  }

  #[tokio::test]
  async fn test_run_with_no_records_writes_header_only() {
    let temp_dir = TempDir::new().unwrap();
    let sink = CsvSink::new(temp_dir.path(), "empty");
    let mut pipeline = Pipeline::new(Box::new(FixedSource(Vec::new())), Normalizer::light(), lexicon_scorer(), sink, 5);

    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.written, 0);
    let content = std::fs::read_to_string(&summary.output).unwrap();
    assert_eq!(content.lines().count(), 1);
  }

  #[test]
  fn test_from_config_rejects_missing_lexicon() {
    let temp_dir = TempDir::new().unwrap();
    let export = temp_dir.path().join("reviews.json");
    std::fs::write(&export, "[]").unwrap();

    let mut config = Config::default();
    config.resources.lexicon = temp_dir.path().join("missing.txt");
    config.sources.play_store.export = Some(export);

    let err = Pipeline::from_config(SourceKind::PlayStore, ScorerKind::Lexicon, &config).err().unwrap();
    assert!(format!("{err:#}").contains("vader_lexicon"));
  }
}
