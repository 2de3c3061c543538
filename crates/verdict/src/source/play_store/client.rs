use anyhow::{Context, Result};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use super::AppReview;
use crate::config::PlayStoreConfig;
use crate::error::VerdictError;

/// Largest page the review endpoint serves per request
pub const MAX_PAGE_SIZE: usize = 199;

const RPC_ID: &str = "UsvDTd";
const RESPONSE_PREFIX: &str = ")]}'";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSort {
  MostRelevant,
  #[default]
  Newest,
  Rating,
}

impl ReviewSort {
  fn code(&self) -> u8 {
    match self {
      ReviewSort::MostRelevant => 1,
      ReviewSort::Newest => 2,
      ReviewSort::Rating => 3,
    }
  }
}

/// One page of reviews and the token for the next, if any
#[derive(Debug, Default)]
pub struct ReviewPage {
  pub reviews: Vec<AppReview>,
  pub token: Option<String>,
}

/// Paged client for the store's review listing RPC
pub struct PlayReviewsClient {
  client: reqwest::Client,
  endpoint: Url,
  app_id: String,
  sort: ReviewSort,
}

impl PlayReviewsClient {
  pub fn new(config: &PlayStoreConfig) -> crate::error::Result<Self> {
    let base = config.base_url.trim_end_matches('/');
    let mut endpoint = Url::parse(&format!("{base}/_/PlayStoreUi/data/batchexecute"))
      .map_err(|e| VerdictError::config(format!("invalid play store base_url '{base}': {e}")))?;
    endpoint.query_pairs_mut().append_pair("hl", &config.lang).append_pair("gl", &config.country);

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
      .user_agent(concat!("verdict/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self { client, endpoint, app_id: config.app_id.clone(), sort: config.sort })
  }

  /// Fetch up to `count` reviews, following continuation tokens. A failing
  /// first page is an error; a later failure ends paging with what was
  /// already collected.
  pub async fn fetch(&self, count: usize) -> Result<Vec<AppReview>> {
    let mut reviews = Vec::new();
    let mut token: Option<String> = None;
    let mut page_number = 0;

    while reviews.len() < count {
      page_number += 1;
      let wanted = (count - reviews.len()).min(MAX_PAGE_SIZE);

      let page = match self.fetch_page(wanted, token.as_deref()).await {
        Ok(page) => page,
        Err(e) if page_number > 1 => {
          bentley::warn!("Stopping after page {}: {:#}", page_number - 1, e);
          break;
        }
        Err(e) => return Err(e),
      };

      let received = page.reviews.len();
      reviews.extend(page.reviews);
      bentley::info!("Fetched page {} for {} ({} reviews, {} total)", page_number, self.app_id, received, reviews.len());

      match page.token {
        Some(next) if received > 0 => token = Some(next),
        _ => break,
      }
    }

    reviews.truncate(count);
    Ok(reviews)
  }

  pub async fn fetch_page(&self, count: usize, token: Option<&str>) -> Result<ReviewPage> {
    let body = request_body(&self.app_id, self.sort, count, token);
    tracing::debug!(app_id = %self.app_id, count, has_token = token.is_some(), "fetching review page");

    let response = self
      .client
      .post(self.endpoint.clone())
      .form(&[("f.req", body)])
      .send()
      .await
      .context("failed to reach the app store")?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(VerdictError::remote(status.as_u16(), body).into());
    }

    let text = response.text().await.context("failed to read the review page")?;
    Ok(parse_page(&text)?)
  }
}

/// `f.req` form value asking for `count` reviews, optionally after `token`
pub fn request_body(app_id: &str, sort: ReviewSort, count: usize, token: Option<&str>) -> String {
  let inner = json!([null, null, [2, sort.code(), [count, null, token], null, []], [app_id, 7]]);
  json!([[[RPC_ID, inner.to_string(), null, "generic"]]]).to_string()
}

/// Decode a batchexecute response. The RPC payload is a JSON string nested
/// inside the envelope; reviews sit at `[0]` and the next token at `[-2][-1]`.
pub fn parse_page(body: &str) -> crate::error::Result<ReviewPage> {
  let trimmed = body.trim_start();
  let payload = trimmed.strip_prefix(RESPONSE_PREFIX).unwrap_or(trimmed).trim_start();
  let envelope: Value = serde_json::from_str(payload)
    .map_err(|e| VerdictError::malformed_response(format!("review page envelope: {e}")))?;

  let Some(data) = envelope.pointer("/0/2").and_then(Value::as_str) else {
    return Ok(ReviewPage::default());
  };
  let data: Value =
    serde_json::from_str(data).map_err(|e| VerdictError::malformed_response(format!("review page payload: {e}")))?;

  let reviews = data
    .get(0)
    .and_then(Value::as_array)
    .map(|items| items.iter().map(review_from).collect())
    .unwrap_or_default();

  let token = data
    .as_array()
    .and_then(|items| items.len().checked_sub(2).and_then(|i| items.get(i)))
    .and_then(Value::as_array)
    .and_then(|pair| pair.last())
    .and_then(Value::as_str)
    .map(str::to_string);

  Ok(ReviewPage { reviews, token })
}

/// A review without a timestamp keeps an empty `at` and is rejected later
/// with the other malformed reviews.
fn review_from(item: &Value) -> AppReview {
  let at = item
    .pointer("/5/0")
    .and_then(Value::as_i64)
    .and_then(|secs| DateTime::from_timestamp(secs, 0))
    .map(|at| at.to_rfc3339())
    .unwrap_or_default();

  AppReview {
    review_id: item.pointer("/0").and_then(Value::as_str).map(str::to_string),
    at,
    score: item.pointer("/2").and_then(Value::as_f64).map(|score| score as f32),
    content: item.pointer("/4").and_then(Value::as_str).map(str::to_string),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use mockito::{Matcher, Server};

  const BATCH_PATH: &str = "/_/PlayStoreUi/data/batchexecute";

  fn review(id: &str, at: i64, score: u8, content: &str) -> Value {
    json!([id, ["Asha", [null, 2, null, [null, null, "https://img"]]], score, null, content, [at, 0]])
  }

  fn page_body(reviews: Value, token: Option<&str>) -> String {
    let data = json!([reviews, null, [null, token], null]);
    let envelope = json!([["wrb.fr", RPC_ID, data.to_string(), null, null, null, "generic"], ["di", 42]]);
    format!(")]}}'\n\n{envelope}")
  }

  fn config_for(server: &Server) -> PlayStoreConfig {
    PlayStoreConfig { app_id: "com.efl.eurekaforbes".to_string(), base_url: server.url(), ..PlayStoreConfig::default() }
  }

  #[test]
  fn test_request_body_shape() {
    let first = request_body("com.efl.eurekaforbes", ReviewSort::Newest, 5, None);
    assert_eq!(
      first,
      r#"[[["UsvDTd","[null,null,[2,2,[5,null,null],null,[]],[\"com.efl.eurekaforbes\",7]]",null,"generic"]]]"#
    );

    let next = request_body("com.efl.eurekaforbes", ReviewSort::Rating, 2, Some("tok1"));
    assert!(next.contains(r#"[2,3,[2,null,\"tok1\"],null,[]]"#));
  }

  #[test]
  fn test_parse_page_reads_reviews_and_token() {
    let body = page_body(json!([review("gp:r1", 1718357400, 5, "Service was quick")]), Some("tok1"));
    let page = parse_page(&body).unwrap();

    assert_eq!(page.token.as_deref(), Some("tok1"));
    assert_eq!(page.reviews.len(), 1);
    assert_eq!(page.reviews[0].review_id.as_deref(), Some("gp:r1"));
    assert_eq!(page.reviews[0].at, "2024-06-14T09:30:00+00:00");
    assert_eq!(page.reviews[0].score, Some(5.0));
    assert_eq!(page.reviews[0].content.as_deref(), Some("Service was quick"));
  }

  #[test]
  fn test_parse_page_without_payload_is_empty() {
    let page = parse_page(")]}'\n\n[[\"wrb.fr\",\"UsvDTd\",null,null,null,[5],\"generic\"]]").unwrap();
    assert!(page.reviews.is_empty());
    assert_eq!(page.token, None);

    assert!(parse_page("<html>captcha</html>").is_err());
  }

  #[tokio::test]
  async fn test_fetch_follows_continuation_token() {
    let mut server = Server::new_async().await;
    let query = Matcher::AllOf(vec![
      Matcher::UrlEncoded("hl".into(), "en".into()),
      Matcher::UrlEncoded("gl".into(), "in".into()),
    ]);
    let first = server
      .mock("POST", BATCH_PATH)
      .match_query(query.clone())
      .match_body(Matcher::Regex("%5B5%2Cnull%2Cnull%5D".to_string()))
      .with_status(200)
      .with_body(page_body(
        json!([
          review("gp:r1", 1718357400, 5, "Service was quick"),
          review("gp:r2", 1718357400, 1, "Technician never came"),
          review("gp:r3", 1718357400, 4, "Good app"),
        ]),
        Some("tok1"),
      ))
      .expect(1)
      .create_async()
      .await;
    let second = server
      .mock("POST", BATCH_PATH)
      .match_query(query)
      .match_body(Matcher::Regex("tok1".to_string()))
      .with_status(200)
      .with_body(page_body(
        json!([review("gp:r4", 1704067200, 3, "Okay"), review("gp:r5", 1704067200, 2, "Slow")]),
        Some("tok2"),
      ))
      .expect(1)
      .create_async()
      .await;

    let client = PlayReviewsClient::new(&config_for(&server)).unwrap();
    let reviews = client.fetch(5).await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    let ids: Vec<_> = reviews.iter().filter_map(|r| r.review_id.as_deref()).collect();
    assert_eq!(ids, vec!["gp:r1", "gp:r2", "gp:r3", "gp:r4", "gp:r5"]);
  }

  #[tokio::test]
  async fn test_fetch_stops_when_token_runs_out() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("POST", BATCH_PATH)
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(page_body(json!([review("gp:r1", 1718357400, 5, "Fine")]), None))
      .expect(1)
      .create_async()
      .await;

    let client = PlayReviewsClient::new(&config_for(&server)).unwrap();
    let reviews = client.fetch(100).await.unwrap();

    mock.assert_async().await;
    assert_eq!(reviews.len(), 1);
  }

  #[tokio::test]
  async fn test_later_page_failure_keeps_earlier_reviews() {
    let mut server = Server::new_async().await;
    let _first = server
      .mock("POST", BATCH_PATH)
      .match_query(Matcher::Any)
      .match_body(Matcher::Regex("%5B4%2Cnull%2Cnull%5D".to_string()))
      .with_status(200)
      .with_body(page_body(json!([review("gp:r1", 1718357400, 5, "Fine")]), Some("tok1")))
      .create_async()
      .await;
    let _second = server
      .mock("POST", BATCH_PATH)
      .match_query(Matcher::Any)
      .match_body(Matcher::Regex("tok1".to_string()))
      .with_status(429)
      .with_body("slow down")
      .create_async()
      .await;

    let client = PlayReviewsClient::new(&config_for(&server)).unwrap();
    let reviews = client.fetch(4).await.unwrap();
    assert_eq!(reviews.len(), 1);
  }

  #[tokio::test]
  async fn test_first_page_failure_is_an_error() {
    let mut server = Server::new_async().await;
    let _mock = server.mock("POST", BATCH_PATH).match_query(Matcher::Any).with_status(503).create_async().await;

    let client = PlayReviewsClient::new(&config_for(&server)).unwrap();
    let err = client.fetch(10).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<VerdictError>(), Some(VerdictError::Remote { status: 503, .. })));
  }
}
