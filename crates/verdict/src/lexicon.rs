//! Rule-based valence scoring over a word lexicon.
//!
//! Each token found in the lexicon contributes its mean valence, adjusted by
//! the words just before it (boosters, dampeners, negations), by capitalised
//! emphasis and by a contrastive "but". The per-token valences are summed,
//! bumped for `!`/`?` emphasis and squashed into [-1, 1].

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, VerdictError};
use crate::scorer::{ScoreResult, SentimentScorer};

const B_INCR: f64 = 0.293;
const B_DECR: f64 = -0.293;
const C_INCR: f64 = 0.733;
const N_SCALAR: f64 = -0.74;
const ALPHA: f64 = 15.0;

const NEGATIONS: &[&str] = &[
  "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "ain't", "aren't", "can't",
  "couldn't", "daren't", "didn't", "doesn't", "dont", "hadnt", "hasnt", "havent", "isnt", "mightnt",
  "mustnt", "neither", "don't", "hadn't", "hasn't", "haven't", "isn't", "mightn't", "mustn't", "neednt",
  "needn't", "never", "none", "nope", "nor", "not", "nothing", "nowhere", "oughtnt", "shant", "shouldnt",
  "uhuh", "wasnt", "werent", "oughtn't", "shan't", "shouldn't", "uh-uh", "wasn't", "weren't", "without",
  "wont", "wouldnt", "won't", "wouldn't", "rarely", "seldom", "despite",
];

const BOOSTERS: &[&str] = &[
  "absolutely", "amazingly", "awfully", "completely", "considerable", "considerably", "decidedly",
  "deeply", "effing", "enormous", "enormously", "entirely", "especially", "exceptional",
  "exceptionally", "extreme", "extremely", "fabulously", "flipping", "flippin", "frackin", "fracking",
  "fricking", "frickin", "frigging", "friggin", "fully", "fuckin", "fucking", "fuggin", "fugging",
  "greatly", "hella", "highly", "hugely", "incredible", "incredibly", "intensely", "major", "majorly",
  "more", "most", "particularly", "purely", "quite", "really", "remarkably", "so", "substantially",
  "thoroughly", "total", "totally", "tremendous", "tremendously", "uber", "unbelievably", "unusually",
  "utter", "utterly", "very",
];

const DAMPENERS: &[&str] = &[
  "almost", "barely", "hardly", "kinda", "kindof", "kind-of", "less", "little", "marginal",
  "marginally", "occasional", "occasionally", "partly", "scarce", "scarcely", "slight", "slightly",
  "somewhat", "sorta", "sortof", "sort-of",
];

/// Token to mean valence
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
  entries: HashMap<String, f64>,
}

impl Lexicon {
  /// Load a `token<TAB>mean<TAB>...` file. Blank and malformed lines are
  /// skipped; a missing file is a startup error.
  pub fn load(path: &Path) -> Result<Self> {
    if !path.exists() {
      return Err(VerdictError::missing_resource("vader_lexicon", path));
    }

    let content = fs::read_to_string(path)?;
    let entries = content
      .lines()
      .filter_map(|line| {
        let mut fields = line.trim_end().split('\t');
        let token = fields.next()?.trim();
        let mean = fields.next()?.trim().parse::<f64>().ok()?;
        (!token.is_empty()).then(|| (token.to_string(), mean))
      })
      .collect();

    Ok(Self { entries })
  }

  pub fn from_entries<I, S>(entries: I) -> Self
  where
    I: IntoIterator<Item = (S, f64)>,
    S: Into<String>,
  {
    Self { entries: entries.into_iter().map(|(token, mean)| (token.into(), mean)).collect() }
  }

  pub fn get(&self, token: &str) -> Option<f64> {
    self.entries.get(token).copied()
  }

  pub fn contains(&self, token: &str) -> bool {
    self.entries.contains_key(token)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

/// Normalized score plus the positive/negative/neutral proportions
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PolarityScores {
  pub compound: f64,
  pub positive: f64,
  pub negative: f64,
  pub neutral: f64,
}

pub struct LexiconScorer {
  lexicon: Lexicon,
}

impl LexiconScorer {
  pub fn new(lexicon: Lexicon) -> Self {
    Self { lexicon }
  }

  pub fn load(path: &Path) -> Result<Self> {
    Ok(Self::new(Lexicon::load(path)?))
  }

  pub fn lexicon(&self) -> &Lexicon {
    &self.lexicon
  }

  pub fn polarity_scores(&self, text: &str) -> PolarityScores {
    let tokens = tokenize(text);
    let lower: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
    let cap_diff = cap_differential(&tokens);

    let mut sentiments = Vec::with_capacity(tokens.len());
    for (i, token) in lower.iter().enumerate() {
      let starts_kind_of = token == "kind" && lower.get(i + 1).is_some_and(|next| next == "of");
      if starts_kind_of || booster_scalar(token).is_some() {
        sentiments.push(0.0);
        continue;
      }
      sentiments.push(self.valence(&tokens, &lower, i, cap_diff));
    }

    but_check(&lower, &mut sentiments);
    score_valence(&sentiments, text)
  }

  fn valence(&self, tokens: &[&str], lower: &[String], i: usize, cap_diff: bool) -> f64 {
    let Some(mean) = self.lexicon.get(&lower[i]) else {
      return 0.0;
    };
    let mut valence = mean;

    // "no" next to another lexicon word acts as a negator, not a sentiment word
    if lower[i] == "no" && lower.get(i + 1).is_some_and(|next| self.lexicon.contains(next)) {
      valence = 0.0;
    }
    if (i > 0 && lower[i - 1] == "no")
      || (i > 1 && lower[i - 2] == "no")
      || (i > 2 && lower[i - 3] == "no" && (lower[i - 1] == "or" || lower[i - 1] == "nor"))
    {
      valence = mean * N_SCALAR;
    }

    if is_upper(tokens[i]) && cap_diff {
      valence += if valence > 0.0 { C_INCR } else { -C_INCR };
    }

    for distance in 0..3 {
      if i <= distance {
        break;
      }
      let prev = i - (distance + 1);
      if self.lexicon.contains(&lower[prev]) {
        continue;
      }
      let mut scalar = scalar_inc_dec(tokens[prev], &lower[prev], valence, cap_diff);
      if distance == 1 {
        scalar *= 0.95;
      } else if distance == 2 {
        scalar *= 0.9;
      }
      valence += scalar;
      valence = negation_check(valence, lower, distance, i);
    }

    least_check(valence, lower, i, &self.lexicon)
  }
}

impl SentimentScorer for LexiconScorer {
  fn score(&mut self, cleaned_text: &str) -> anyhow::Result<ScoreResult> {
    Ok(ScoreResult::Compound(self.polarity_scores(cleaned_text).compound))
  }
}

/// Whitespace tokens with surrounding punctuation removed; one-character
/// tokens carry no valence and are dropped.
fn tokenize(text: &str) -> Vec<&str> {
  text
    .split_whitespace()
    .filter(|token| token.chars().count() > 1)
    .map(|token| {
      let stripped = token.trim_matches(|c: char| c.is_ascii_punctuation());
      if stripped.chars().count() > 1 {
        stripped
      } else {
        token
      }
    })
    .collect()
}

fn is_upper(token: &str) -> bool {
  token.chars().any(char::is_alphabetic) && !token.chars().any(char::is_lowercase)
}

/// True when some, but not all, tokens are shouted
fn cap_differential(tokens: &[&str]) -> bool {
  let shouted = tokens.iter().filter(|t| is_upper(t)).count();
  shouted > 0 && shouted < tokens.len()
}

fn booster_scalar(lower: &str) -> Option<f64> {
  if BOOSTERS.contains(&lower) {
    Some(B_INCR)
  } else if DAMPENERS.contains(&lower) {
    Some(B_DECR)
  } else {
    None
  }
}

fn scalar_inc_dec(token: &str, lower: &str, valence: f64, cap_diff: bool) -> f64 {
  let Some(mut scalar) = booster_scalar(lower) else {
    return 0.0;
  };
  if valence < 0.0 {
    scalar = -scalar;
  }
  if is_upper(token) && cap_diff {
    scalar += if valence > 0.0 { C_INCR } else { -C_INCR };
  }
  scalar
}

fn is_negation(lower: &str) -> bool {
  NEGATIONS.contains(&lower) || lower.contains("n't")
}

fn negation_check(valence: f64, lower: &[String], distance: usize, i: usize) -> f64 {
  let word = |offset: usize| lower[i - offset].as_str();
  match distance {
    0 if is_negation(word(1)) => valence * N_SCALAR,
    1 => {
      if word(2) == "never" && (word(1) == "so" || word(1) == "this") {
        valence * 1.25
      } else if word(2) == "without" && word(1) == "doubt" {
        valence
      } else if is_negation(word(2)) {
        valence * N_SCALAR
      } else {
        valence
      }
    }
    2 => {
      if (word(3) == "never" && (word(2) == "so" || word(2) == "this")) || word(1) == "so" || word(1) == "this" {
        valence * 1.25
      } else if word(3) == "without" && (word(2) == "doubt" || word(1) == "doubt") {
        valence
      } else if is_negation(word(3)) {
        valence * N_SCALAR
      } else {
        valence
      }
    }
    _ => valence,
  }
}

fn least_check(valence: f64, lower: &[String], i: usize, lexicon: &Lexicon) -> f64 {
  if i > 1 && lower[i - 1] == "least" && !lexicon.contains(&lower[i - 1]) {
    if lower[i - 2] != "at" && lower[i - 2] != "very" {
      return valence * N_SCALAR;
    }
  } else if i > 0 && lower[i - 1] == "least" && !lexicon.contains(&lower[i - 1]) {
    return valence * N_SCALAR;
  }
  valence
}

/// Sentiment after "but" dominates: scale earlier tokens down, later ones up
fn but_check(lower: &[String], sentiments: &mut [f64]) {
  let Some(pivot) = lower.iter().position(|w| w == "but") else {
    return;
  };
  for (i, sentiment) in sentiments.iter_mut().enumerate() {
    if i < pivot {
      *sentiment *= 0.5;
    } else if i > pivot {
      *sentiment *= 1.5;
    }
  }
}

fn punctuation_emphasis(text: &str) -> f64 {
  let exclamations = text.matches('!').count().min(4) as f64 * 0.292;
  let questions = match text.matches('?').count() {
    n @ 2..=3 => n as f64 * 0.18,
    n if n > 3 => 0.96,
    _ => 0.0,
  };
  exclamations + questions
}

fn normalize(score: f64) -> f64 {
  (score / (score * score + ALPHA).sqrt()).clamp(-1.0, 1.0)
}

fn round_to(value: f64, places: i32) -> f64 {
  let factor = 10f64.powi(places);
  (value * factor).round() / factor
}

fn score_valence(sentiments: &[f64], text: &str) -> PolarityScores {
  if sentiments.is_empty() {
    return PolarityScores::default();
  }

  let emphasis = punctuation_emphasis(text);
  let mut sum: f64 = sentiments.iter().sum();
  if sum > 0.0 {
    sum += emphasis;
  } else if sum < 0.0 {
    sum -= emphasis;
  }
  let compound = normalize(sum);

  let mut pos_sum = 0.0;
  let mut neg_sum = 0.0;
  let mut neu_count = 0.0;
  for &s in sentiments {
    if s > 0.0 {
      pos_sum += s + 1.0;
    } else if s < 0.0 {
      neg_sum += s - 1.0;
    } else {
      neu_count += 1.0;
    }
  }
  if pos_sum > neg_sum.abs() {
    pos_sum += emphasis;
  } else if pos_sum < neg_sum.abs() {
    neg_sum -= emphasis;
  }

  let total = pos_sum + neg_sum.abs() + neu_count;
  PolarityScores {
    compound: round_to(compound, 4),
    positive: round_to((pos_sum / total).abs(), 3),
    negative: round_to((neg_sum / total).abs(), 3),
    neutral: round_to((neu_count / total).abs(), 3),
  }
}
