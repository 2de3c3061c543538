use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use url::Url;

use super::html::{normalize_ws, select, select_first, text_of, Selector};
use super::splash::SplashClient;
use super::{RecordSource, SourceKind};
use crate::config::AmazonConfig;
use crate::error::VerdictError;
use crate::record::Record;

const DATE_FORMAT: &str = "%d %B %Y";

/// Product reviews scraped from rendered Amazon review pages
pub struct AmazonSource {
  splash: SplashClient,
  config: AmazonConfig,
}

impl AmazonSource {
  pub fn new(splash: SplashClient, config: AmazonConfig) -> Self {
    Self { splash, config }
  }
}

#[async_trait]
impl RecordSource for AmazonSource {
  fn kind(&self) -> SourceKind {
    SourceKind::Amazon
  }

  async fn collect(&mut self) -> Result<Vec<Record>> {
    let mut records = Vec::new();

    for asin in &self.config.asins {
      for page in 1..=self.config.pages {
        let url = review_url(&self.config.domain, asin, page)?;
        bentley::info!("Getting page: {} for ASIN: {}", page, asin);

        let html = match self.splash.render(url.as_str(), false).await {
          Ok(html) => html,
          Err(e) => {
            bentley::warn!("Skipping page {} for ASIN {}: {:#}", page, asin, e);
            continue;
          }
        };

        for parsed in parse_reviews(&html, asin, &self.config.date_prefix) {
          match parsed {
            Ok(record) => records.push(record),
            Err(e) => bentley::warn!("Skipping review on page {} for ASIN {}: {}", page, asin, e),
          }
        }
        bentley::info!("Total reviews collected so far: {}", records.len());
      }
    }

    Ok(records)
  }
}

pub fn review_url(domain: &str, asin: &str, page: u32) -> crate::error::Result<Url> {
  let mut url = Url::parse(&format!("https://{domain}/product-reviews/{asin}/ref=cm_cr_arp_d_viewopt_srt"))
    .map_err(|e| VerdictError::config(format!("invalid review url for domain '{domain}': {e}")))?;
  url
    .query_pairs_mut()
    .append_pair("ie", "UTF8")
    .append_pair("reviewerType", "all_reviews")
    .append_pair("pageNumber", &page.to_string())
    .append_pair("sortBy", "recent");
  Ok(url)
}

/// One result per review block on the page; a block with a missing or
/// malformed field yields an error without affecting the others.
pub fn parse_reviews(html: &str, asin: &str, date_prefix: &str) -> Vec<crate::error::Result<Record>> {
  let name = product_name(html);

  select(html, &Selector::hook("div", "review"))
    .into_iter()
    .map(|block| parse_review(block, asin, name.as_deref(), date_prefix))
    .collect()
}

pub fn product_name(html: &str) -> Option<String> {
  let link = select_first(html, &Selector::hook("a", "product-link"))?;
  let name = normalize_ws(text_of(link).split('|').next().unwrap_or_default());
  (!name.is_empty()).then_some(name)
}

pub fn parse_review_date(text: &str, prefix: &str) -> crate::error::Result<NaiveDate> {
  let trimmed = text.trim();
  let date = trimmed.strip_prefix(prefix.trim_end()).unwrap_or(trimmed).trim();
  NaiveDate::parse_from_str(date, DATE_FORMAT)
    .map_err(|e| VerdictError::extraction("review-date", format!("'{date}': {e}")))
}

pub fn parse_star_rating(text: &str) -> crate::error::Result<f32> {
  let value = text.replace("out of 5 stars", "");
  let value = value.trim();
  value
    .parse::<f32>()
    .map_err(|e| VerdictError::extraction("review-star-rating", format!("'{value}': {e}")))
}

fn parse_review(block: &str, asin: &str, name: Option<&str>, date_prefix: &str) -> crate::error::Result<Record> {
  let field = |tag: &str, hook: &'static str| {
    select_first(block, &Selector::hook(tag, hook))
      .map(text_of)
      .ok_or_else(|| VerdictError::extraction(hook, "element missing"))
  };

  let date = parse_review_date(&field("span", "review-date")?, date_prefix)?;
  let name = name.ok_or_else(|| VerdictError::extraction("product-link", "element missing"))?;
  let body = field("span", "review-body")?;
  let rating = parse_star_rating(&field("i", "review-star-rating")?)?;

  Ok(Record::new(asin, name, body).with_date(date).with_rating(rating))
}

#[cfg(test)]
mod tests {
  use super::*;

  const PAGE: &str = r#"
    <html><body>
      <a data-hook="product-link" href="/dp/B0CW5YZ6VV">Aquaguard Aura RO+UV Water Purifier | 7L Storage | Black</a>
      <div id="cm_cr-review_list">
        <div data-hook="review" id="R1">
          <i data-hook="review-star-rating" class="a-icon"><span class="a-icon-alt">5.0 out of 5 stars</span></i>
          <span data-hook="review-date">Reviewed in India on 7 March 2024</span>
          <span data-hook="review-body"><span>Great product!! 😀<br>Works well.</span></span>
        </div>
        <div data-hook="review" id="R2">
          <i data-hook="review-star-rating"><span>2.0 out of 5 stars</span></i>
          <span data-hook="review-date">Reviewed in India on 31 February 2024</span>
          <span data-hook="review-body"><span>Leaks</span></span>
        </div>
        <div data-hook="review" id="R3">
          <span data-hook="review-date">Reviewed in India on 1 January 2023</span>
          <span data-hook="review-body"><span>No rating here</span></span>
        </div>
      </div>
    </body></html>
  "#;

  #[test]
  fn test_review_url() {
    let url = review_url("www.amazon.co.in", "B0CW5YZ6VV", 2).unwrap();
    assert_eq!(
      url.as_str(),
      "https://www.amazon.co.in/product-reviews/B0CW5YZ6VV/ref=cm_cr_arp_d_viewopt_srt?ie=UTF8&reviewerType=all_reviews&pageNumber=2&sortBy=recent"
    );
  }

  #[test]
  fn test_parse_reviews_keeps_good_blocks() {
    let parsed = parse_reviews(PAGE, "B0CW5YZ6VV", "Reviewed in India on ");
    assert_eq!(parsed.len(), 3);

    let record = parsed[0].as_ref().unwrap();
    assert_eq!(record.source_id, "B0CW5YZ6VV");
    assert_eq!(record.name, "Aquaguard Aura RO+UV Water Purifier");
    assert_eq!(record.formatted_date().as_deref(), Some("07-03-2024"));
    assert_eq!(record.rating, Some(5.0));
    assert_eq!(record.raw_text(), "Great product!! 😀\nWorks well.");

    assert!(matches!(parsed[1], Err(VerdictError::Extraction { ref field, .. }) if field == "review-date"));
    assert!(matches!(parsed[2], Err(VerdictError::Extraction { ref field, .. }) if field == "review-star-rating"));
  }

  #[test]
  fn test_missing_product_link_fails_each_review() {
    let html = r#"<div data-hook="review">
      <span data-hook="review-date">Reviewed in India on 7 March 2024</span>
      <span data-hook="review-body">ok</span>
      <i data-hook="review-star-rating">4.0 out of 5 stars</i>
    </div>"#;

    let parsed = parse_reviews(html, "B096NTB9XT", "Reviewed in India on ");
    assert!(matches!(parsed[0], Err(VerdictError::Extraction { ref field, .. }) if field == "product-link"));
  }

  #[test]
  fn test_parse_review_date_with_other_locale() {
    let date = parse_review_date("Reviewed in the United States on 12 January 2024", "Reviewed in the United States on ");
    assert_eq!(date.unwrap(), NaiveDate::from_ymd_opt(2024, 1, 12).unwrap());
  }

  #[test]
  fn test_parse_star_rating() {
    assert_eq!(parse_star_rating("4.0 out of 5 stars").unwrap(), 4.0);
    assert!(parse_star_rating("five stars").is_err());
  }
}
