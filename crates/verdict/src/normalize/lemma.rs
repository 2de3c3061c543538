use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::{Result, VerdictError};

/// Noun detachment rules, applied to the inflected form in this order
const NOUN_SUFFIXES: [(&str, &str); 9] = [
  ("s", ""),
  ("ses", "s"),
  ("ves", "f"),
  ("xes", "x"),
  ("zes", "z"),
  ("ches", "ch"),
  ("shes", "sh"),
  ("men", "man"),
  ("ies", "y"),
];

const IRREGULAR: [(&str, &str); 26] = [
  ("men", "man"),
  ("women", "woman"),
  ("children", "child"),
  ("people", "person"),
  ("feet", "foot"),
  ("teeth", "tooth"),
  ("mice", "mouse"),
  ("geese", "goose"),
  ("lives", "life"),
  ("knives", "knife"),
  ("wives", "wife"),
  ("leaves", "leaf"),
  ("halves", "half"),
  ("shelves", "shelf"),
  ("thieves", "thief"),
  ("wolves", "wolf"),
  ("shoes", "shoe"),
  ("toes", "toe"),
  ("foes", "foe"),
  ("canoes", "canoe"),
  ("photos", "photo"),
  ("videos", "video"),
  ("logos", "logo"),
  ("memos", "memo"),
  ("demos", "demo"),
  ("combos", "combo"),
];

/// Words ending in `s` that are not plurals
const INVARIANT: [&str; 48] = [
  "always",
  "perhaps",
  "sometimes",
  "besides",
  "thanks",
  "news",
  "series",
  "species",
  "means",
  "less",
  "unless",
  "thus",
  "yes",
  "towards",
  "afterwards",
  "whereas",
  "various",
  "nowadays",
  "kudos",
  "chaos",
  "ethos",
  "pathos",
  "cosmos",
  "thermos",
  "pros",
  "bias",
  "alias",
  "atlas",
  "canvas",
  "christmas",
  "lens",
  "physics",
  "electronics",
  "mathematics",
  "economics",
  "politics",
  "ethics",
  "diabetes",
  "measles",
  "herpes",
  "rabies",
  "headquarters",
  "whereabouts",
  "goes",
  "does",
  "hers",
  "ours",
  "yours",
];

#[derive(Debug, Clone, Default)]
struct WordNet {
  nouns: HashSet<String>,
  exceptions: HashMap<String, String>,
}

/// Noun lemmatizer.
///
/// With a WordNet dictionary loaded this follows the usual morphy lookup:
/// exception list first, then every detachment rule whose result is a known
/// noun, keeping the shortest match. Without one it falls back to a small
/// irregular-plural table and guarded suffix rules.
#[derive(Debug, Clone, Default)]
pub struct Lemmatizer {
  wordnet: Option<WordNet>,
}

impl Lemmatizer {
  pub fn rules() -> Self {
    Self { wordnet: None }
  }

  /// Load `index.noun` (required) and `noun.exc` (optional) from a WordNet
  /// dictionary directory such as `nltk_data/corpora/wordnet`
  pub fn from_wordnet(dir: &Path) -> Result<Self> {
    let index = dir.join("index.noun");
    if !index.exists() {
      return Err(VerdictError::missing_resource("wordnet", &index));
    }

    let nouns = fs::read_to_string(&index)?
      .lines()
      .filter(|line| !line.starts_with(' ') && !line.is_empty())
      .filter_map(|line| line.split_whitespace().next())
      .map(str::to_string)
      .collect();

    let exc = dir.join("noun.exc");
    let exceptions = if exc.exists() {
      fs::read_to_string(&exc)?
        .lines()
        .filter_map(|line| {
          let mut fields = line.split_whitespace();
          Some((fields.next()?.to_string(), fields.next()?.to_string()))
        })
        .collect()
    } else {
      HashMap::new()
    };

    Ok(Self { wordnet: Some(WordNet { nouns, exceptions }) })
  }

  pub fn has_dictionary(&self) -> bool {
    self.wordnet.is_some()
  }

  pub fn lemmatize(&self, word: &str) -> String {
    match &self.wordnet {
      Some(wordnet) => morphy(wordnet, word),
      None => by_rules(word),
    }
  }
}

fn morphy(wordnet: &WordNet, word: &str) -> String {
  if let Some(base) = wordnet.exceptions.get(word) {
    return base.clone();
  }

  let mut candidates: Vec<String> = Vec::new();
  if wordnet.nouns.contains(word) {
    candidates.push(word.to_string());
  }
  for (suffix, replacement) in NOUN_SUFFIXES {
    if let Some(stem) = word.strip_suffix(suffix) {
      let candidate = format!("{stem}{replacement}");
      if wordnet.nouns.contains(&candidate) {
        candidates.push(candidate);
      }
    }
  }

  candidates.into_iter().min_by_key(|c| c.len()).unwrap_or_else(|| word.to_string())
}

fn by_rules(word: &str) -> String {
  if let Some((_, base)) = IRREGULAR.iter().find(|(plural, _)| *plural == word) {
    return base.to_string();
  }

  if word.len() <= 3
    || !word.ends_with('s')
    || INVARIANT.contains(&word)
    || word.ends_with("ss")
    || word.ends_with("us")
    || word.ends_with("is")
    || word.ends_with("ias")
    || word.ends_with("aos")
  {
    return word.to_string();
  }

  // potatoes, heroes, echoes; short stems such as goes are left alone
  if let Some(stem) = word.strip_suffix("oes") {
    return if stem.len() >= 3 { format!("{stem}o") } else { word.to_string() };
  }

  for (suffix, replacement) in [("ies", "y"), ("sses", "ss"), ("ches", "ch"), ("shes", "sh"), ("xes", "x"), ("zes", "z")] {
    if let Some(stem) = word.strip_suffix(suffix) {
      if stem.len() >= 2 {
        return format!("{stem}{replacement}");
      }
    }
  }

  word[..word.len() - 1].to_string()
}
