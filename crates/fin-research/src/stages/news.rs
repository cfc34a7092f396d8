//! Recent news and its overall sentiment

use crate::api::{NewsQuery, NewsSearch, Recency};
use crate::cache::{CacheKey, TtlCache};
use crate::error::Result;
use crate::model::{NewsItem, NewsSentimentSummary, Sentiment};
use crate::narrative::{NarrativeGenerator, NarrativeRequest};
use std::sync::Arc;

/// "title: snippet", cut to `max_chars` characters with a trailing ellipsis
pub fn format_snippet(item: &NewsItem, max_chars: usize) -> String {
    let snippet = item.snippet.trim();
    let text = if snippet.is_empty() {
        item.title.trim().to_string()
    } else {
        format!("{}: {}", item.title.trim(), snippet)
    };

    if text.chars().count() <= max_chars {
        return text;
    }

    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// Searches recent news and classifies its tone
pub struct NewsGatherer {
    news: Arc<dyn NewsSearch>,
    cache: TtlCache,
    narrator: Arc<dyn NarrativeGenerator>,
    max_results: usize,
    snippet_max_chars: usize,
}

impl NewsGatherer {
    pub fn new(
        news: Arc<dyn NewsSearch>,
        cache: TtlCache,
        narrator: Arc<dyn NarrativeGenerator>,
        max_results: usize,
        snippet_max_chars: usize,
    ) -> Self {
        Self {
            news,
            cache,
            narrator,
            max_results,
            snippet_max_chars,
        }
    }

    /// Overall sentiment of the past month's news about a company
    ///
    /// No results is a neutral summary with no snippets; the classifier is not asked.
    pub async fn gather_sentiment(&self, company: &str) -> Result<NewsSentimentSummary> {
        let query = NewsQuery {
            text: format!("{company} stock news"),
            recency: Recency::PastMonth,
            limit: self.max_results,
        };

        let items: Vec<NewsItem> = self
            .cache
            .get_or_fetch(CacheKey::new("news_search", company), || {
                self.news.search_news(&query)
            })
            .await?;

        if items.is_empty() {
            tracing::info!("No recent news for {}, reporting neutral sentiment", company);
            return Ok(NewsSentimentSummary::empty());
        }

        let snippets: Vec<String> = items
            .iter()
            .take(self.max_results)
            .map(|item| format_snippet(item, self.snippet_max_chars))
            .collect();

        let reply = self
            .narrator
            .generate(&NarrativeRequest::NewsSentiment {
                company: company.to_string(),
                snippets: snippets.clone(),
            })
            .await?;

        let overall_sentiment = Sentiment::from_reply(&reply).unwrap_or_else(|| {
            tracing::warn!("Unrecognised sentiment reply '{}', using neutral", reply);
            Sentiment::Neutral
        });

        Ok(NewsSentimentSummary {
            overall_sentiment,
            supporting_snippets: snippets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::testing::{FakeNarrator, FakeNewsSearch, news_item};
    use std::time::Duration;

    fn gatherer(news: Arc<FakeNewsSearch>, narrator: Arc<FakeNarrator>) -> NewsGatherer {
        let cache = TtlCache::new(Duration::from_secs(1800), Arc::new(ManualClock::new()));
        NewsGatherer::new(news, cache, narrator, 5, 280)
    }

    #[test]
    fn test_format_snippet() {
        let item = news_item("Apple beats estimates", "Revenue rose 8%.");
        assert_eq!(format_snippet(&item, 280), "Apple beats estimates: Revenue rose 8%.");

        let item = news_item("Headline only", "  ");
        assert_eq!(format_snippet(&item, 280), "Headline only");
    }

    #[test]
    fn test_format_snippet_truncates_on_char_boundary() {
        let item = news_item("Café", "naïve résumé");
        let snippet = format_snippet(&item, 8);
        assert_eq!(snippet, "Café: n…");
        assert_eq!(snippet.chars().count(), 8);
    }

    #[tokio::test]
    async fn test_gather_sentiment() {
        let news = Arc::new(FakeNewsSearch::new(vec![
            news_item("Apple beats estimates", "Revenue rose."),
            news_item("Apple unveils device", "Analysts upbeat."),
        ]));
        let narrator = Arc::new(FakeNarrator::new("Positive"));
        let gatherer = gatherer(news.clone(), narrator.clone());

        let summary = gatherer.gather_sentiment("Apple Inc").await.unwrap();
        assert_eq!(summary.overall_sentiment, Sentiment::Positive);
        assert_eq!(summary.supporting_snippets.len(), 2);

        let queries = news.queries.lock().unwrap();
        assert_eq!(queries[0].text, "Apple Inc stock news");
        assert_eq!(queries[0].recency, Recency::PastMonth);
        assert_eq!(queries[0].limit, 5);
    }

    #[tokio::test]
    async fn test_zero_results_is_neutral_without_classifier() {
        let news = Arc::new(FakeNewsSearch::new(vec![]));
        let narrator = Arc::new(FakeNarrator::new("negative"));
        let gatherer = gatherer(news, narrator.clone());

        let summary = gatherer.gather_sentiment("Quiet Corp").await.unwrap();
        assert_eq!(summary, NewsSentimentSummary::empty());
        assert_eq!(narrator.count("news_sentiment"), 0);
    }

    #[tokio::test]
    async fn test_unrecognised_reply_is_neutral() {
        let news = Arc::new(FakeNewsSearch::new(vec![news_item("Mixed quarter", "Hard to say.")]));
        let narrator = Arc::new(FakeNarrator::new("It depends."));
        let gatherer = gatherer(news, narrator);

        let summary = gatherer.gather_sentiment("Acme").await.unwrap();
        assert_eq!(summary.overall_sentiment, Sentiment::Neutral);
        assert_eq!(summary.supporting_snippets.len(), 1);
    }

    #[tokio::test]
    async fn test_news_cached() {
        let news = Arc::new(FakeNewsSearch::new(vec![news_item("A", "b")]));
        let narrator = Arc::new(FakeNarrator::new("neutral"));
        let gatherer = gatherer(news.clone(), narrator);

        gatherer.gather_sentiment("Acme").await.unwrap();
        gatherer.gather_sentiment("Acme").await.unwrap();
        assert_eq!(news.calls(), 1);
    }
}
