use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Client for a newsdata.io-compatible news search API.
///
/// One GET per keyword; failures are normalized to "no data for this call" so
/// a single bad keyword never aborts the batch.
pub struct NewsClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    language: String,
}

/// One page of provider results.
#[derive(Debug, Deserialize)]
pub struct NewsPage {
    #[serde(default)]
    pub results: Vec<NewsArticle>,
}

/// A single article; the provider omits or nulls `content` for some entries.
#[derive(Debug, Deserialize)]
pub struct NewsArticle {
    #[serde(default)]
    pub content: Option<String>,
}

impl NewsClient {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("newsdigest/0.1.0")
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            language: "en".to_string(),
        })
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Result<Self> {
        self.client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("newsdigest/0.1.0")
            .build()
            .context("failed to build reqwest client")?;
        Ok(self)
    }

    /// Build the query URL for one keyword. The keyword is percent-encoded by
    /// the `url` crate; the language filter is fixed per client.
    fn query_url(&self, keyword: &str, from_date: NaiveDate, to_date: NaiveDate) -> Result<Url> {
        let mut url = Url::parse(&self.api_url)
            .with_context(|| format!("invalid news API URL: {}", self.api_url))?;
        url.query_pairs_mut()
            .append_pair("apikey", &self.api_key)
            .append_pair("from_date", &from_date.to_string())
            .append_pair("to_date", &to_date.to_string())
            .append_pair("language", &self.language)
            .append_pair("q", keyword);
        Ok(url)
    }

    /// Fetch one result page. Any non-200 status or transport failure is
    /// logged and mapped to `None` so the caller can skip and continue.
    async fn fetch_page(&self, url: Url) -> Option<NewsPage> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("news fetch failed: {}", e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("news fetch returned status {}", status);
            return None;
        }

        match response.json::<NewsPage>().await {
            Ok(page) => Some(page),
            Err(e) => {
                warn!("failed to parse news response: {}", e);
                None
            }
        }
    }

    /// Fetch articles for every keyword in input order and flatten their
    /// bodies into one sequence.
    ///
    /// All of one keyword's articles precede the next keyword's; a keyword
    /// whose fetch fails contributes nothing and the batch continues. An empty
    /// keyword list yields an empty result.
    pub async fn fetch_articles(
        &self,
        keywords: &[String],
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Vec<String> {
        let mut articles = Vec::new();

        for keyword in keywords {
            let url = match self.query_url(keyword, from_date, to_date) {
                Ok(u) => u,
                Err(e) => {
                    warn!("skipping keyword '{}': {}", keyword, e);
                    continue;
                }
            };

            let Some(page) = self.fetch_page(url).await else {
                continue;
            };

            let before = articles.len();
            for item in page.results {
                if let Some(content) = item.content {
                    articles.push(content);
                }
            }
            info!(
                "keyword '{}' contributed {} articles",
                keyword,
                articles.len() - before
            );
        }

        articles
    }
}
