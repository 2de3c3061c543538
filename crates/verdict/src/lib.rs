//! Review sentiment pipeline.
//!
//! Records are collected from a [`source`], cleaned by a [`normalize::Normalizer`],
//! judged by one of the [`scorer`] backends, mapped to a three-way label by
//! [`categorize`] and written out by the [`sink`].

pub mod categorize;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod generative;
pub mod lexicon;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod scorer;
pub mod sink;
pub mod source;

pub use config::Config;
pub use error::{Result, VerdictError};
pub use normalize::{Normalizer, Profile};
pub use pipeline::{Pipeline, RunSummary};
pub use record::{Record, SentimentLabel};
pub use scorer::{ScoreResult, Scorer, ScorerKind, SentimentScorer};
pub use source::{RecordSource, SourceKind};
