use anyhow::Result;
use async_trait::async_trait;
use url::Url;

use super::html::{normalize_ws, select, text_of, Selector};
use super::splash::SplashClient;
use super::{RecordSource, SourceKind};
use crate::record::Record;

/// Posts scraped from a rendered social profile page
pub struct PostsSource {
  splash: SplashClient,
  url: String,
}

impl PostsSource {
  pub fn new(splash: SplashClient, url: impl Into<String>) -> Self {
    Self { splash, url: url.into() }
  }
}

#[async_trait]
impl RecordSource for PostsSource {
  fn kind(&self) -> SourceKind {
    SourceKind::Posts
  }

  async fn collect(&mut self) -> Result<Vec<Record>> {
    let html = match self.splash.render(&self.url, true).await {
      Ok(html) => {
        bentley::info!("Successfully fetched the webpage");
        html
      }
      Err(e) => {
        bentley::warn!("Failed to fetch the webpage: {:#}", e);
        return Ok(Vec::new());
      }
    };

    let records = parse_posts(&html, &self.url);
    if records.is_empty() {
      bentley::warn!("No posts found");
    } else {
      bentley::info!("Found {} posts", records.len());
    }
    Ok(records)
  }
}

pub fn parse_posts(html: &str, profile_url: &str) -> Vec<Record> {
  let name = profile_name(profile_url);

  select(html, &Selector::class("*", "tweet"))
    .into_iter()
    .map(|post| normalize_ws(&text_of(post)))
    .filter(|text| !text.is_empty())
    .map(|text| Record::new(profile_url, name.as_str(), text))
    .collect()
}

/// First path segment of the profile URL, e.g. the account handle
fn profile_name(profile_url: &str) -> String {
  Url::parse(profile_url)
    .ok()
    .and_then(|url| url.path_segments().and_then(|mut segments| segments.next().map(str::to_string)))
    .filter(|segment| !segment.is_empty())
    .unwrap_or_else(|| profile_url.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_posts() {
    let html = r#"
      <div class="timeline">
        <article class="tweet js-tweet"><p>Loving the new <b>purifier</b>!</p></article>
        <article class="tweet"> </article>
        <article class="tweet"><p>Service   delayed
          again</p></article>
      </div>"#;

    let posts = parse_posts(html, "https://x.com/EurekaForbes/with_replies");

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].raw_text(), "Loving the new purifier!");
    assert_eq!(posts[1].raw_text(), "Service delayed again");
    assert_eq!(posts[0].name, "EurekaForbes");
    assert_eq!(posts[0].date, None);
    assert_eq!(posts[0].rating, None);
  }

  #[test]
  fn test_profile_name_fallback() {
    assert_eq!(profile_name("https://x.com/EurekaForbes"), "EurekaForbes");
    assert_eq!(profile_name("not a url"), "not a url");
  }
}
