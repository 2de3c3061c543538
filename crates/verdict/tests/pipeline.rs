use mockito::{Matcher, Server};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use verdict::generative::FallbackPolicy;
use verdict::{Config, Pipeline, ScorerKind, SourceKind};

const LEXICON: &str = "great\t3.1\t0.83066\t[3, 3, 4, 4, 3, 2, 3, 3, 3, 3]\n\
broken\t-2.1\t0.7\t[-2, -2, -3, -2, -1, -2, -3, -2, -2, -2]\n\
slow\t-1.0\t0.63246\t[-1, -1, 0, -1, -2, -1, -1, -1, -2, 0]\n";

fn write_export(dir: &Path) -> PathBuf {
  let export = dir.join("com.efl.eurekaforbes.json");
  fs::write(
    &export,
    json!([
      {"reviewId": "r1", "at": "2024-06-14 09:30:00", "score": 5, "content": "Great product!! 😀 Works well.\n"},
      {"reviewId": "r2", "at": "2024-06-15T10:00:00+05:30", "score": 1, "content": "Arrived BROKEN, service slow"},
      {"reviewId": "r3", "at": "2023-12-01", "score": 3, "content": "It is a water purifier"},
      {"reviewId": "r4", "at": "not a date", "score": 2, "content": "Skipped"}
    ])
    .to_string(),
  )
  .unwrap();
  export
}

fn base_config(dir: &Path) -> Config {
  let lexicon = dir.join("vader_lexicon.txt");
  fs::write(&lexicon, LEXICON).unwrap();

  let mut config = Config::default();
  config.resources.lexicon = lexicon;
  config.sources.play_store.export = Some(write_export(dir));
  config.output.dir = dir.join("out");
  config.output.preview = 2;
  config
}

fn read_rows(path: &Path) -> Vec<csv::StringRecord> {
  let mut reader = csv::Reader::from_path(path).unwrap();
  reader.records().collect::<Result<_, _>>().unwrap()
}

#[tokio::test]
async fn test_lexicon_run_over_app_reviews() {
  let temp_dir = TempDir::new().unwrap();
  let config = base_config(temp_dir.path());

  let mut pipeline = Pipeline::from_config(SourceKind::PlayStore, ScorerKind::Lexicon, &config).unwrap();
  let summary = pipeline.run().await.unwrap();

  assert_eq!(summary.collected, 3);
  assert_eq!(summary.written, 3);
  assert_eq!((summary.positive, summary.negative, summary.neutral), (1, 1, 1));

  let file_name = summary.output.file_name().unwrap().to_string_lossy().into_owned();
  assert!(file_name.starts_with("google_playstore_reviews_with_lexicon_sentiment_"));
  assert!(file_name.ends_with(".csv"));

  let rows = read_rows(&summary.output);
  assert_eq!(&rows[0][0], "com.efl.eurekaforbes");
  assert_eq!(&rows[0][2], "2024");
  assert_eq!(&rows[0][3], "14-06-2024");
  assert_eq!(&rows[0][6], "great product work well.");
  assert_eq!(&rows[0][9], "Positive");
  assert_eq!(&rows[1][9], "Negative");
  assert_eq!(&rows[2][6], "water purifier");
  assert_eq!(&rows[2][9], "Neutral");
}

fn gemini_body(flags: &[i64]) -> String {
  let array: Vec<_> = flags.iter().map(|flag| json!({"cleaned_text": "", "sentiment_category": flag})).collect();
  let text = format!("```json\n{}\n```", serde_json::Value::Array(array));
  json!({
    "candidates": [{"content": {"parts": [{"text": text}], "role": "model"}, "finishReason": "STOP"}]
  })
  .to_string()
}

fn generative_config(dir: &Path, server: &Server) -> Config {
  let mut config = base_config(dir);
  config.generative.base_url = server.url();
  config.generative.api_key = Some("test-key".to_string());
  config.generative.batch_size = 2;
  config.generative.min_interval_ms = 0;
  config
}

#[tokio::test]
async fn test_generative_run_in_batches() {
  let temp_dir = TempDir::new().unwrap();
  let mut server = Server::new_async().await;
  let mock = server
    .mock("POST", "/v1beta/models/gemini-1.0-pro:generateContent")
    .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
    .match_body(Matcher::Regex("sentiment_category".to_string()))
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(gemini_body(&[1, 0]))
    .expect(2)
    .create_async()
    .await;

  let config = generative_config(temp_dir.path(), &server);
  let mut pipeline = Pipeline::from_config(SourceKind::PlayStore, ScorerKind::Generative, &config).unwrap();
  let summary = pipeline.run().await.unwrap();

  mock.assert_async().await;
  assert_eq!(summary.written, 3);
  assert_eq!((summary.positive, summary.negative, summary.neutral), (2, 1, 0));

  let rows = read_rows(&summary.output);
  // light profile keeps casing and punctuation
  assert_eq!(&rows[1][6], "Arrived BROKEN, service slow");
  assert_eq!(&rows[1][7], "");
}

#[tokio::test]
async fn test_generative_failure_uses_configured_fallback() {
  let temp_dir = TempDir::new().unwrap();
  let mut server = Server::new_async().await;
  let _mock = server
    .mock("POST", "/v1beta/models/gemini-1.0-pro:generateContent")
    .match_query(Matcher::Any)
    .with_status(503)
    .with_body("overloaded")
    .expect(2)
    .create_async()
    .await;

  let mut config = generative_config(temp_dir.path(), &server);
  config.generative.fallback = FallbackPolicy::Neutral;

  let mut pipeline = Pipeline::from_config(SourceKind::PlayStore, ScorerKind::Generative, &config).unwrap();
  let summary = pipeline.run().await.unwrap();

  assert_eq!(summary.written, 3);
  assert_eq!(summary.neutral, 3);
}

#[tokio::test]
async fn test_posts_run_through_rendering_proxy() {
  let temp_dir = TempDir::new().unwrap();
  let mut server = Server::new_async().await;
  let profile = "https://x.com/EurekaForbes/with_replies";
  let mock = server
    .mock("GET", "/render.html")
    .match_query(Matcher::AllOf(vec![
      Matcher::UrlEncoded("url".into(), profile.into()),
      Matcher::UrlEncoded("render_all".into(), "1".into()),
    ]))
    .with_status(200)
    .with_body(r#"<div class="tweet"><p>Great service</p></div><div class="tweet"><p>Still broken</p></div>"#)
    .create_async()
    .await;

  let mut config = base_config(temp_dir.path());
  config.splash.url = format!("{}/render.html", server.url());
  config.sources.posts.url = Some(profile.to_string());

  let mut pipeline = Pipeline::from_config(SourceKind::Posts, ScorerKind::Lexicon, &config).unwrap();
  let summary = pipeline.run().await.unwrap();

  mock.assert_async().await;
  assert_eq!((summary.positive, summary.negative), (1, 1));
  let rows = read_rows(&summary.output);
  assert_eq!(&rows[0][1], "EurekaForbes");
  assert_eq!(&rows[0][2], "");
}

#[test]
fn test_empty_amazon_asin_list_is_rejected() {
  let temp_dir = TempDir::new().unwrap();
  let config = base_config(temp_dir.path());

  let err = Pipeline::from_config(SourceKind::Amazon, ScorerKind::Lexicon, &config).err().unwrap();
  assert!(err.to_string().contains("asins"));
}
