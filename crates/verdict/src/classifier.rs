use anyhow::{anyhow, Result};

use crate::config::ClassifierConfig;
use crate::scorer::{ScoreResult, SentimentScorer};

#[cfg(feature = "neural")]
use ort::session::{builder::GraphOptimizationLevel, Session};
#[cfg(feature = "neural")]
use ort::value::Tensor;

/// Label assigned by a pretrained model and the probability it gave that label
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
  pub label: String,
  pub confidence: f32,
}

impl Classification {
  pub fn neutral() -> Self {
    Self { label: "NEUTRAL".to_string(), confidence: 0.0 }
  }
}

#[cfg_attr(test, mockall::automock)]
pub trait Classifier: Send {
  fn classify(&mut self, text: &str) -> Result<Classification>;
}

/// Wraps any [`Classifier`] behind the common scorer contract
pub struct ClassifierScorer {
  classifier: Box<dyn Classifier>,
}

impl ClassifierScorer {
  pub fn new(classifier: Box<dyn Classifier>) -> Self {
    Self { classifier }
  }
}

impl SentimentScorer for ClassifierScorer {
  fn score(&mut self, cleaned_text: &str) -> Result<ScoreResult> {
    if cleaned_text.trim().is_empty() {
      return Ok(ScoreResult::Classified(Classification::neutral()));
    }
    Ok(ScoreResult::Classified(self.classifier.classify(cleaned_text)?))
  }
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
  let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
  let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
  let sum: f32 = exps.iter().sum();
  exps.into_iter().map(|e| e / sum).collect()
}

/// Arg-max over `probabilities`; indices past the end of `labels` are named
/// `LABEL_{i}` and later categorize as neutral
pub fn pick_label(probabilities: &[f32], labels: &[String]) -> Option<Classification> {
  let (index, confidence) = probabilities
    .iter()
    .copied()
    .enumerate()
    .max_by(|a, b| a.1.total_cmp(&b.1))?;

  let label = labels.get(index).cloned().unwrap_or_else(|| format!("LABEL_{index}"));
  Some(Classification { label, confidence })
}

#[cfg(feature = "neural")]
pub struct OnnxClassifier {
  session: Session,
  tokenizer: tokenizers::Tokenizer,
  labels: Vec<String>,
}

#[cfg(feature = "neural")]
impl OnnxClassifier {
  pub fn load(config: &ClassifierConfig) -> Result<Self> {
    let session = create_session(&config.model)?;

    if !config.tokenizer.exists() {
      return Err(crate::error::VerdictError::missing_resource("tokenizer", &config.tokenizer).into());
    }
    let mut tokenizer = tokenizers::Tokenizer::from_file(&config.tokenizer)
      .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
    tokenizer
      .with_truncation(Some(tokenizers::TruncationParams {
        max_length: config.max_length,
        ..Default::default()
      }))
      .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;

    Ok(Self { session, tokenizer, labels: config.labels.clone() })
  }
}

#[cfg(feature = "neural")]
#[cfg(not(tarpaulin_include))]
fn create_session(model: &str) -> Result<Session> {
  let builder = Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level1)?;

  if model.starts_with("http://") || model.starts_with("https://") {
    builder.commit_from_url(model).map_err(|e| anyhow!("Failed to load ONNX model from URL: {}", e))
  } else {
    let path = std::path::Path::new(model);
    if !path.exists() {
      return Err(crate::error::VerdictError::missing_resource("classifier model", path).into());
    }
    builder.commit_from_file(path).map_err(|e| anyhow!("Failed to load local ONNX model: {}", e))
  }
}

#[cfg(feature = "neural")]
#[cfg(not(tarpaulin_include))]
impl Classifier for OnnxClassifier {
  fn classify(&mut self, text: &str) -> Result<Classification> {
    let encoding = self.tokenizer.encode(text, true).map_err(|e| anyhow!("Failed to encode text: {}", e))?;

    let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
    let mask: Vec<i64> = encoding.get_attention_mask().iter().map(|&m| m as i64).collect();
    let length = ids.len();

    let ids = Tensor::from_array(([1usize, length], ids.into_boxed_slice()))?;
    let mask = Tensor::from_array(([1usize, length], mask.into_boxed_slice()))?;

    let outputs = self.session.run(ort::inputs![
      "input_ids" => ids,
      "attention_mask" => mask
    ])?;

    let logits = outputs.get("logits").ok_or_else(|| {
      anyhow!("No logits output - available outputs: {:?}", outputs.keys().collect::<Vec<_>>())
    })?;
    let (_shape, data) = logits.try_extract_tensor::<f32>()?;

    pick_label(&softmax(data), &self.labels).ok_or_else(|| anyhow!("Model returned empty logits"))
  }
}

#[cfg(feature = "neural")]
pub fn create_classifier(config: &ClassifierConfig) -> Result<Box<dyn Classifier>> {
  Ok(Box::new(OnnxClassifier::load(config)?))
}

#[cfg(not(feature = "neural"))]
pub fn create_classifier(_config: &ClassifierConfig) -> Result<Box<dyn Classifier>> {
  Err(anyhow!("The classifier scorer needs verdict built with the `neural` feature"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use mockall::predicate::*;

  #[test]
  fn test_softmax_sums_to_one() {
    let probabilities = softmax(&[-1.2, 2.3]);
    let sum: f32 = probabilities.iter().sum();
    assert!((sum - 1.0).abs() < 1e-6);
    assert!(probabilities[1] > probabilities[0]);
  }

  #[test]
  fn test_pick_label_uses_argmax() {
    let labels = vec!["NEGATIVE".to_string(), "POSITIVE".to_string()];
    let picked = pick_label(&[0.1, 0.9], &labels).unwrap();
    assert_eq!(picked.label, "POSITIVE");
    assert!((picked.confidence - 0.9).abs() < 1e-6);
  }

  #[test]
  fn test_pick_label_past_known_labels() {
    let labels = vec!["NEGATIVE".to_string()];
    assert_eq!(pick_label(&[0.2, 0.8], &labels).unwrap().label, "LABEL_1");
    assert!(pick_label(&[], &labels).is_none());
  }

  #[test]
  fn test_scorer_forwards_text_to_classifier() {
    let mut mock = MockClassifier::new();
    mock
      .expect_classify()
      .with(eq("Water tastes great"))
      .times(1)
      .returning(|_| Ok(Classification { label: "POSITIVE".to_string(), confidence: 0.99 }));

    let mut scorer = ClassifierScorer::new(Box::new(mock));
    let result = scorer.score("Water tastes great").unwrap();

    assert_eq!(
      result,
      ScoreResult::Classified(Classification { label: "POSITIVE".to_string(), confidence: 0.99 })
    );
  }

  #[test]
  fn test_empty_text_skips_model() {
    let mut mock = MockClassifier::new();
    mock.expect_classify().times(0);

    let mut scorer = ClassifierScorer::new(Box::new(mock));
    let result = scorer.score("   ").unwrap();

    assert_eq!(result, ScoreResult::Classified(Classification::neutral()));
  }

  #[test]
  fn test_classifier_errors_propagate() {
    let mut mock = MockClassifier::new();
    mock.expect_classify().returning(|_| Err(anyhow!("inference failed")));

    let mut scorer = ClassifierScorer::new(Box::new(mock));
    assert!(scorer.score("text").is_err());
  }

  #[cfg(not(feature = "neural"))]
  #[test]
  fn test_create_classifier_requires_feature() {
    let err = create_classifier(&ClassifierConfig::default()).err().unwrap();
    assert!(err.to_string().contains("neural"));
  }
}
