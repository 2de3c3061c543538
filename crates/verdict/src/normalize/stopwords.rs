use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{Result, VerdictError};

/// Stop words kept because they flip or modulate polarity
pub const DEFAULT_RETAINED: [&str; 6] = ["no", "not", "up", "down", "few", "more"];

/// Standard English stop-word list
pub const ENGLISH: &[&str] = &[
  "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've", "you'll",
  "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself", "she",
  "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them", "their",
  "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll", "these",
  "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
  "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or", "because",
  "as", "until", "while", "of", "at", "by", "for", "with", "about", "against", "between", "into",
  "through", "during", "before", "after", "above", "below", "to", "from", "up", "down", "in",
  "out", "on", "off", "over", "under", "again", "further", "then", "once", "here", "there",
  "when", "where", "why", "how", "all", "any", "both", "each", "few", "more", "most", "other",
  "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s",
  "t", "can", "will", "just", "don", "don't", "should", "should've", "now", "d", "ll", "m", "o",
  "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn", "didn't", "doesn",
  "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn", "isn't", "ma",
  "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't", "shouldn",
  "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn", "wouldn't",
];

/// Stop-word set with the retained words already subtracted
#[derive(Debug, Clone, Default)]
pub struct StopWords {
  words: HashSet<String>,
}

impl StopWords {
  pub fn from_words<I, S, R, T>(words: I, retained: R) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    R: IntoIterator<Item = T>,
    T: AsRef<str>,
  {
    let retained: HashSet<String> = retained.into_iter().map(|w| w.as_ref().to_lowercase()).collect();
    let words = words
      .into_iter()
      .map(|w| w.as_ref().trim().to_lowercase())
      .filter(|w| !w.is_empty() && !retained.contains(w))
      .collect();

    Self { words }
  }

  /// Built-in English list minus `retained`
  pub fn english<R, T>(retained: R) -> Self
  where
    R: IntoIterator<Item = T>,
    T: AsRef<str>,
  {
    Self::from_words(ENGLISH.iter(), retained)
  }

  /// Load a one-word-per-line list such as `corpora/stopwords/english`
  pub fn from_file<R, T>(path: &Path, retained: R) -> Result<Self>
  where
    R: IntoIterator<Item = T>,
    T: AsRef<str>,
  {
    if !path.exists() {
      return Err(VerdictError::missing_resource("stopwords", path));
    }

    let content = fs::read_to_string(path)?;
    Ok(Self::from_words(content.lines(), retained))
  }

  pub fn contains(&self, word: &str) -> bool {
    self.words.contains(word)
  }

  pub fn len(&self) -> usize {
    self.words.len()
  }

  pub fn is_empty(&self) -> bool {
    self.words.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;
  use tempfile::NamedTempFile;

  #[test]
  fn test_english_list_drops_retained_words() {
    let stopwords = StopWords::english(DEFAULT_RETAINED);

    assert!(stopwords.contains("the"));
    assert!(stopwords.contains("is"));
    for word in DEFAULT_RETAINED {
      assert!(!stopwords.contains(word), "{word} should be retained");
    }
    assert_eq!(stopwords.len(), ENGLISH.len() - DEFAULT_RETAINED.len());
  }

  #[test]
  fn test_from_file() -> anyhow::Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "the\nNot\n\n  a  ")?;

    let stopwords = StopWords::from_file(file.path(), ["not"])?;
    assert!(stopwords.contains("the"));
    assert!(stopwords.contains("a"));
    assert!(!stopwords.contains("not"));
    assert_eq!(stopwords.len(), 2);
    Ok(())
  }

  #[test]
  fn test_missing_file_is_fatal() {
    let err = StopWords::from_file(Path::new("/nonexistent/stopwords/english"), DEFAULT_RETAINED)
      .unwrap_err();
    assert!(err.is_fatal());
  }
}
