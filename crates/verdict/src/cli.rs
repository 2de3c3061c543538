use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::lexicon::Lexicon;
use crate::normalize::{Normalizer, Profile};
use crate::pipeline::Pipeline;
use crate::record::Record;
use crate::scorer::{Scorer, ScorerKind};
use crate::source::SourceKind;

#[derive(Parser)]
#[command(name = "verdict")]
#[command(about = "Verdict - Review Sentiment Pipeline\nCollect reviews, clean the text and label each one Positive, Negative or Neutral")]
#[command(version)]
pub struct Cli {
  /// Configuration file (defaults to verdict.yaml, .verdict.yaml or .verdict/config.yaml)
  #[arg(short, long, global = true)]
  pub config: Option<PathBuf>,

  /// Enable debug logging
  #[arg(short, long, global = true)]
  pub verbose: bool,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
  /// Collect, clean, score and write a CSV of records
  Run {
    /// Where records come from
    #[arg(short, long, value_enum)]
    source: SourceKind,
    /// Scoring backend
    #[arg(long, value_enum, default_value = "lexicon")]
    scorer: ScorerKind,
    /// Directory for the output file, overriding the config
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
  },
  /// Print the cleaned form of a piece of text
  Clean {
    text: String,
    /// Use the light profile instead of full cleaning
    #[arg(short, long)]
    light: bool,
  },
  /// Score a single piece of text
  Score {
    text: String,
    #[arg(long, value_enum, default_value = "lexicon")]
    scorer: ScorerKind,
  },
  /// Validate configuration and resources without running
  Check {
    #[arg(long, value_enum)]
    source: Option<SourceKind>,
    #[arg(long, value_enum)]
    scorer: Option<ScorerKind>,
  },
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
  match path {
    Some(path) => Config::load(path).with_context(|| format!("failed to load config from {}", path.display())),
    None => Config::discover().context("failed to load config"),
  }
}

pub async fn execute(cli: Cli) -> Result<()> {
  let config = load_config(cli.config.as_deref())?;

  match cli.command {
    Command::Run { source, scorer, output_dir } => run(config, source, scorer, output_dir).await,
    Command::Clean { text, light } => clean(&config, &text, light),
    Command::Score { text, scorer } => score(&config, &text, scorer).await,
    Command::Check { source, scorer } => check(&config, source, scorer),
  }
}

pub async fn run(
  mut config: Config,
  source: SourceKind,
  scorer: ScorerKind,
  output_dir: Option<PathBuf>,
) -> Result<()> {
  if let Some(dir) = output_dir {
    config.output.dir = dir;
  }

  let mut pipeline = Pipeline::from_config(source, scorer, &config)?;
  let summary = pipeline.run().await?;

  println!("{}", summary.output.display());
  Ok(())
}

pub fn clean(config: &Config, text: &str, light: bool) -> Result<()> {
  let profile = if light { Profile::Light } else { Profile::Full };
  let normalizer = Normalizer::from_config(profile, config)?;

  println!("{}", normalizer.normalize(text));
  Ok(())
}

pub async fn score(config: &Config, text: &str, kind: ScorerKind) -> Result<()> {
  let normalizer = Normalizer::from_config(kind.profile(), config)?;
  let mut scorer = Scorer::from_config(kind, config)?;

  let mut record = Record::new("", "", text);
  record.clean(&normalizer);
  let scored = scorer.score_records(vec![record]).await;

  let Some(record) = scored.first() else {
    bentley::warn!("The {} scorer returned no verdict", kind.as_str());
    return Ok(());
  };
  let label = record.sentiment_label.map(|l| l.as_str()).unwrap_or("Unlabelled");
  match (record.sentiment_score, record.confidence) {
    (Some(score), _) => println!("{label}\t{score:.4}"),
    (None, Some(confidence)) => println!("{label}\t{confidence:.4}"),
    (None, None) => println!("{label}"),
  }
  Ok(())
}

/// Load every resource a run would need and report what was found. Without
/// `--scorer` the lexicon scorer is assumed.
pub fn check(config: &Config, source: Option<SourceKind>, scorer: Option<ScorerKind>) -> Result<()> {
  let scorer = scorer.unwrap_or(ScorerKind::Lexicon);

  if let Some(source) = source {
    config.validate(source, scorer)?;
    bentley::success!("Source {:?} is configured", source);
  }

  Normalizer::from_config(scorer.profile(), config)?;
  match scorer {
    ScorerKind::Lexicon => {
      let lexicon = Lexicon::load(&config.resources.lexicon)?;
      bentley::success!("Lexicon loaded with {} entries", lexicon.len());
    }
    ScorerKind::Classifier | ScorerKind::Generative => {
      Scorer::from_config(scorer, config)?;
      bentley::success!("{} scorer is ready", scorer.as_str());
    }
  }

  println!("ok");
  Ok(())
}
