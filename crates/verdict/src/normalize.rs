//! Text cleaning ahead of scoring.
//!
//! Two profiles share one entry point. `Full` prepares text for lexicon
//! lookup: case-folded, ASCII only, digits and most punctuation removed, stop
//! words dropped and every word reduced to its lemma. `Light` only fixes
//! whitespace and drops non-ASCII, leaving casing and punctuation for models
//! that tokenize on their own.

pub mod lemma;
pub mod stopwords;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Config;
use crate::error::Result;

pub use lemma::Lemmatizer;
pub use stopwords::{StopWords, DEFAULT_RETAINED};

static NON_ASCII: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\x00-\x7F]+").unwrap());
static UNWANTED_PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s.,]").unwrap());
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static REPEATED_DOTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
  #[default]
  Full,
  Light,
}

#[derive(Debug, Clone)]
pub struct Normalizer {
  profile: Profile,
  stopwords: StopWords,
  lemmatizer: Lemmatizer,
}

enum Lexeme<'a> {
  Word(&'a str),
  Mark(char),
}

impl Normalizer {
  pub fn light() -> Self {
    Self { profile: Profile::Light, stopwords: StopWords::default(), lemmatizer: Lemmatizer::default() }
  }

  pub fn full(stopwords: StopWords, lemmatizer: Lemmatizer) -> Self {
    Self { profile: Profile::Full, stopwords, lemmatizer }
  }

  /// Full profile with the embedded stop-word list and rule-based lemmatizer
  pub fn builtin_full() -> Self {
    Self::full(StopWords::english(DEFAULT_RETAINED), Lemmatizer::rules())
  }

  /// Build a normalizer for `profile`, loading any resource files the config
  /// points at. A configured path that does not exist is a startup error.
  pub fn from_config(profile: Profile, config: &Config) -> Result<Self> {
    match profile {
      Profile::Light => Ok(Self::light()),
      Profile::Full => {
        let retained = &config.normalizer.retained_stopwords;
        let stopwords = match &config.resources.stopwords {
          Some(path) => StopWords::from_file(path, retained)?,
          None => StopWords::english(retained),
        };
        let lemmatizer = match &config.resources.wordnet {
          Some(dir) => Lemmatizer::from_wordnet(dir)?,
          None => Lemmatizer::rules(),
        };
        Ok(Self::full(stopwords, lemmatizer))
      }
    }
  }

  pub fn profile(&self) -> Profile {
    self.profile
  }

  pub fn normalize(&self, raw: &str) -> String {
    match self.profile {
      Profile::Full => self.full_clean(raw),
      Profile::Light => light_clean(raw),
    }
  }

  fn full_clean(&self, raw: &str) -> String {
    let text = raw.to_lowercase().replace('\n', " ");
    let text = NON_ASCII.replace_all(text.trim(), " ");
    let text = UNWANTED_PUNCTUATION.replace_all(&text, "");
    let text = DIGITS.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    let text = REPEATED_DOTS.replace_all(&text, ".");

    self.filter_tokens(&text)
  }

  /// Drop stop words, lemmatize the rest and rejoin. Marks attach to the word
  /// before them; a mark with nothing before it, or repeating the previous
  /// character, is dropped.
  fn filter_tokens(&self, text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for lexeme in lexemes(text) {
      match lexeme {
        Lexeme::Word(word) => {
          if self.stopwords.contains(word) {
            continue;
          }
          let lemma = self.lemmatizer.lemmatize(word);
          if lemma.is_empty() || self.stopwords.contains(&lemma) {
            continue;
          }
          if !out.is_empty() {
            out.push(' ');
          }
          out.push_str(&lemma);
        }
        Lexeme::Mark(mark) => {
          if out.is_empty() || out.ends_with(mark) {
            continue;
          }
          out.push(mark);
        }
      }
    }

    out
  }
}

fn light_clean(raw: &str) -> String {
  let text = raw.replace('\n', " ");
  let text = NON_ASCII.replace_all(text.trim(), " ");
  WHITESPACE.replace_all(&text, " ").trim().to_string()
}

fn lexemes(text: &str) -> Vec<Lexeme<'_>> {
  let mut out = Vec::new();
  let mut start: Option<usize> = None;

  for (i, c) in text.char_indices() {
    let is_word = c.is_ascii_alphanumeric() || c == '_';
    if is_word {
      start.get_or_insert(i);
      continue;
    }
    if let Some(s) = start.take() {
      out.push(Lexeme::Word(&text[s..i]));
    }
    if c == '.' || c == ',' {
      out.push(Lexeme::Mark(c));
    }
  }
  if let Some(s) = start {
    out.push(Lexeme::Word(&text[s..]));
  }

  out
}
