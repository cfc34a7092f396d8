//! Serper news search client

use crate::api::{NewsQuery, NewsSearch, Recency};
use crate::config::{ResearchConfig, SERPER_KEY_VAR};
use crate::error::{Result, ResearchError};
use crate::model::NewsItem;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

const NEWS_URL: &str = "https://google.serper.dev/news";
const SERVICE: &str = "Serper";

#[derive(Debug, Serialize)]
struct NewsRequest<'a> {
    q: &'a str,
    tbs: &'static str,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    news: Vec<SerperNewsItem>,
}

/// Serper news result
#[derive(Debug, Deserialize)]
struct SerperNewsItem {
    title: String,
    #[serde(default)]
    snippet: String,
    link: Option<String>,
    source: Option<String>,
    date: Option<String>,
}

/// Serper client for the news endpoint
#[derive(Debug, Clone)]
pub struct SerperClient {
    client: Client,
    api_key: String,
}

impl SerperClient {
    /// Create a new Serper client
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResearchError::ConfigError(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
        })
    }

    /// Create from a validated configuration
    pub fn from_config(config: &ResearchConfig) -> Result<Self> {
        let api_key = config.serper_api_key.clone().ok_or_else(|| {
            ResearchError::ConfigError(format!("{SERPER_KEY_VAR} is required but not set"))
        })?;
        Self::new(api_key, config.request_timeout)
    }

    /// Search recent news
    #[instrument(skip(self), fields(query = %query.text))]
    pub async fn news(&self, query: &NewsQuery) -> Result<Vec<NewsItem>> {
        let body = NewsRequest {
            q: &query.text,
            tbs: time_filter(query.recency),
            num: query.limit,
        };

        tracing::debug!("Sending Serper news request");

        let response = self
            .client
            .post(NEWS_URL)
            .header("X-API-KEY", self.api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| ResearchError::from_http(SERVICE, &e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ResearchError::unavailable(
                SERVICE,
                format!("API error {status}: {body}"),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ResearchError::from_http(SERVICE, &e))?;

        parse_news(&text, query.limit)
    }
}

#[async_trait]
impl NewsSearch for SerperClient {
    async fn search_news(&self, query: &NewsQuery) -> Result<Vec<NewsItem>> {
        self.news(query).await
    }
}

/// Google's `tbs` time filter
fn time_filter(recency: Recency) -> &'static str {
    match recency {
        Recency::PastDay => "qdr:d",
        Recency::PastWeek => "qdr:w",
        Recency::PastMonth => "qdr:m",
        Recency::PastYear => "qdr:y",
    }
}

fn parse_news(body: &str, limit: usize) -> Result<Vec<NewsItem>> {
    let response: NewsResponse =
        serde_json::from_str(body).map_err(|e| ResearchError::parse(SERVICE, e))?;

    Ok(response
        .news
        .into_iter()
        .take(limit)
        .map(|item| NewsItem {
            title: item.title,
            snippet: item.snippet,
            link: item.link,
            source: item.source,
            date: item.date,
        })
        .collect())
}
