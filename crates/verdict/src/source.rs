//! Record sources: where raw reviews and posts come from.

pub mod amazon;
pub mod html;
pub mod play_store;
pub mod posts;
pub mod splash;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::ValueEnum;

use crate::config::Config;
use crate::error::VerdictError;
use crate::record::Record;

pub use amazon::AmazonSource;
pub use play_store::PlayStoreSource;
pub use posts::PostsSource;
pub use splash::SplashClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
  Amazon,
  PlayStore,
  Posts,
}

impl SourceKind {
  /// Leading part of the output file name
  pub fn output_prefix(&self) -> &'static str {
    match self {
      SourceKind::Amazon => "amazon_product_reviews",
      SourceKind::PlayStore => "google_playstore_reviews",
      SourceKind::Posts => "social_posts",
    }
  }
}

#[async_trait]
pub trait RecordSource: Send {
  fn kind(&self) -> SourceKind;

  /// Gather every raw record this source can produce. Individual records or
  /// pages that fail are logged and skipped.
  async fn collect(&mut self) -> Result<Vec<Record>>;
}

pub fn create_source(kind: SourceKind, config: &Config) -> Result<Box<dyn RecordSource>> {
  let source: Box<dyn RecordSource> = match kind {
    SourceKind::Amazon => {
      let splash = SplashClient::new(&config.splash)?;
      Box::new(AmazonSource::new(splash, config.sources.amazon.clone()))
    }
    SourceKind::PlayStore => Box::new(PlayStoreSource::new(&config.sources.play_store)?),
    SourceKind::Posts => {
      let url = config
        .sources
        .posts
        .url
        .clone()
        .ok_or_else(|| VerdictError::config("sources.posts.url is not set"))?;
      let splash = SplashClient::new(&config.splash).context("failed to set up rendering proxy client")?;
      Box::new(PostsSource::new(splash, url))
    }
  };
  Ok(source)
}
