//! Run configuration for verdict
//!
//! Resource locations, scorer settings, source lists and output options.
//! Loaded from YAML; every field has a default so partial files work.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, VerdictError};
use crate::generative::FallbackPolicy;
use crate::normalize::DEFAULT_RETAINED;
use crate::scorer::ScorerKind;
use crate::source::play_store::ReviewSort;
use crate::source::SourceKind;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub resources: ResourceConfig,
  #[serde(default)]
  pub normalizer: NormalizerConfig,
  #[serde(default)]
  pub classifier: ClassifierConfig,
  #[serde(default)]
  pub generative: GenerativeConfig,
  #[serde(default)]
  pub splash: SplashConfig,
  #[serde(default)]
  pub sources: SourcesConfig,
  #[serde(default)]
  pub output: OutputConfig,
}

/// Local data files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
  /// Sentiment lexicon, required by the lexicon scorer
  #[serde(default = "default_lexicon")]
  pub lexicon: PathBuf,
  /// One-word-per-line stop-word list; built-in list when unset
  #[serde(default)]
  pub stopwords: Option<PathBuf>,
  /// WordNet dictionary directory; rule-based lemmatizer when unset
  #[serde(default)]
  pub wordnet: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
  #[serde(default = "default_retained_stopwords")]
  pub retained_stopwords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
  /// ONNX model, local path or URL
  #[serde(default = "default_classifier_model")]
  pub model: String,
  #[serde(default = "default_tokenizer")]
  pub tokenizer: PathBuf,
  /// Output index to label
  #[serde(default = "default_labels")]
  pub labels: Vec<String>,
  #[serde(default = "default_max_length")]
  pub max_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerativeConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  #[serde(default = "default_model")]
  pub model: String,
  /// Falls back to `GEMINI_API_KEY` when unset
  #[serde(default)]
  pub api_key: Option<String>,
  #[serde(default = "default_batch_size")]
  pub batch_size: usize,
  #[serde(default = "default_min_interval_ms")]
  pub min_interval_ms: u64,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  #[serde(default)]
  pub fallback: FallbackPolicy,
}

/// HTML rendering proxy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplashConfig {
  #[serde(default = "default_splash_url")]
  pub url: String,
  /// Seconds the proxy waits for scripts before snapshotting
  #[serde(default = "default_splash_wait")]
  pub wait: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
  #[serde(default)]
  pub amazon: AmazonConfig,
  #[serde(default)]
  pub play_store: PlayStoreConfig,
  #[serde(default)]
  pub posts: PostsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmazonConfig {
  #[serde(default)]
  pub asins: Vec<String>,
  /// Review pages fetched per ASIN
  #[serde(default = "default_pages")]
  pub pages: u32,
  #[serde(default = "default_domain")]
  pub domain: String,
  /// Locale text in front of every review date
  #[serde(default = "default_date_prefix")]
  pub date_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayStoreConfig {
  /// JSON export of app reviews; when set it is read instead of fetching live
  #[serde(default)]
  pub export: Option<PathBuf>,
  #[serde(default)]
  pub app_id: String,
  #[serde(default = "default_play_base_url")]
  pub base_url: String,
  #[serde(default = "default_play_lang")]
  pub lang: String,
  #[serde(default = "default_play_country")]
  pub country: String,
  #[serde(default)]
  pub sort: ReviewSort,
  /// Total reviews to fetch, across as many pages as needed
  #[serde(default = "default_play_count")]
  pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostsConfig {
  /// Profile page to render
  #[serde(default)]
  pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
  #[serde(default = "default_output_dir")]
  pub dir: PathBuf,
  /// Records shown from each end of the table before and after scoring
  #[serde(default = "default_preview")]
  pub preview: usize,
}

fn default_lexicon() -> PathBuf {
  dirs::home_dir()
    .unwrap_or_default()
    .join("nltk_data")
    .join("sentiment")
    .join("vader_lexicon")
    .join("vader_lexicon.txt")
}
fn default_retained_stopwords() -> Vec<String> {
  DEFAULT_RETAINED.iter().map(|w| w.to_string()).collect()
}
fn default_classifier_model() -> String {
  "https://huggingface.co/distilbert/distilbert-base-uncased-finetuned-sst-2-english/resolve/main/onnx/model.onnx"
    .to_string()
}
fn default_tokenizer() -> PathBuf {
  PathBuf::from("tokenizer.json")
}
fn default_labels() -> Vec<String> {
  vec!["NEGATIVE".to_string(), "POSITIVE".to_string()]
}
fn default_max_length() -> usize {
  512
}
fn default_base_url() -> String {
  "https://generativelanguage.googleapis.com".to_string()
}
fn default_model() -> String {
  "gemini-1.0-pro".to_string()
}
fn default_batch_size() -> usize {
  25
}
fn default_min_interval_ms() -> u64 {
  5000
}
fn default_timeout_secs() -> u64 {
  60
}
fn default_splash_url() -> String {
  "http://localhost:8050/render.html".to_string()
}
fn default_splash_wait() -> u32 {
  2
}
fn default_pages() -> u32 {
  2
}
fn default_domain() -> String {
  "www.amazon.co.in".to_string()
}
fn default_date_prefix() -> String {
  "Reviewed in India on ".to_string()
}
fn default_play_base_url() -> String {
  "https://play.google.com".to_string()
}
fn default_play_lang() -> String {
  "en".to_string()
}
fn default_play_country() -> String {
  "in".to_string()
}
fn default_play_count() -> usize {
  5000
}
fn default_output_dir() -> PathBuf {
  PathBuf::from(".")
}
fn default_preview() -> usize {
  5
}

impl Default for ResourceConfig {
  fn default() -> Self {
    Self { lexicon: default_lexicon(), stopwords: None, wordnet: None }
  }
}

impl Default for NormalizerConfig {
  fn default() -> Self {
    Self { retained_stopwords: default_retained_stopwords() }
  }
}

impl Default for ClassifierConfig {
  fn default() -> Self {
    Self {
      model: default_classifier_model(),
      tokenizer: default_tokenizer(),
      labels: default_labels(),
      max_length: default_max_length(),
    }
  }
}

impl Default for GenerativeConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      model: default_model(),
      api_key: None,
      batch_size: default_batch_size(),
      min_interval_ms: default_min_interval_ms(),
      timeout_secs: default_timeout_secs(),
      fallback: FallbackPolicy::default(),
    }
  }
}

impl GenerativeConfig {
  /// Configured key, or the environment key when the config leaves it empty
  pub fn resolve_api_key(&self) -> Option<String> {
    self
      .api_key
      .clone()
      .filter(|key| !key.trim().is_empty())
      .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|key| !key.trim().is_empty()))
  }
}

impl Default for SplashConfig {
  fn default() -> Self {
    Self { url: default_splash_url(), wait: default_splash_wait() }
  }
}

impl Default for AmazonConfig {
  fn default() -> Self {
    Self { asins: Vec::new(), pages: default_pages(), domain: default_domain(), date_prefix: default_date_prefix() }
  }
}

impl Default for PlayStoreConfig {
  fn default() -> Self {
    Self {
      export: None,
      app_id: String::new(),
      base_url: default_play_base_url(),
      lang: default_play_lang(),
      country: default_play_country(),
      sort: ReviewSort::default(),
      count: default_play_count(),
    }
  }
}

impl Default for OutputConfig {
  fn default() -> Self {
    Self { dir: default_output_dir(), preview: default_preview() }
  }
}

impl Config {
  /// Load configuration from a YAML file
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    if !path.exists() {
      return Err(VerdictError::missing_resource("config file", path));
    }
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_yaml::from_str(&content)?;
    Ok(config)
  }

  /// Load configuration from the current directory or defaults
  pub fn discover() -> Result<Self> {
    Self::discover_in(Path::new("."))
  }

  pub fn discover_in(dir: &Path) -> Result<Self> {
    let config_paths = ["verdict.yaml", ".verdict.yaml", ".verdict/config.yaml"];

    for path in &config_paths {
      let candidate = dir.join(path);
      if candidate.exists() {
        return Self::load(candidate);
      }
    }

    Ok(Config::default())
  }

  /// Check the settings a run with this source and scorer depends on
  pub fn validate(&self, source: SourceKind, scorer: ScorerKind) -> Result<()> {
    if scorer == ScorerKind::Generative && self.generative.batch_size == 0 {
      return Err(VerdictError::config("generative.batch_size must be at least 1"));
    }

    match source {
      SourceKind::Amazon => {
        if self.sources.amazon.asins.is_empty() {
          return Err(VerdictError::config("sources.amazon.asins is empty"));
        }
        if self.sources.amazon.pages == 0 {
          return Err(VerdictError::config("sources.amazon.pages must be at least 1"));
        }
      }
      SourceKind::PlayStore => {
        let play_store = &self.sources.play_store;
        if play_store.export.is_none() {
          if play_store.app_id.trim().is_empty() {
            return Err(VerdictError::config("set sources.play_store.app_id or sources.play_store.export"));
          }
          if play_store.count == 0 {
            return Err(VerdictError::config("sources.play_store.count must be at least 1"));
          }
        }
      }
      SourceKind::Posts => {
        if self.sources.posts.url.is_none() {
          return Err(VerdictError::config("sources.posts.url is not set"));
        }
      }
    }

    Ok(())
  }
}
