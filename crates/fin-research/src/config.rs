//! Configuration for the research pipeline

use crate::error::{Result, ResearchError};
use fin_utils::optional_env;
use std::time::Duration;

/// Environment variable holding the Alpha Vantage key (ticker search and fundamentals)
pub const ALPHA_VANTAGE_KEY_VAR: &str = "ALPHA_VANTAGE_API_KEY";
/// Environment variable holding the Serper key (news search)
pub const SERPER_KEY_VAR: &str = "SERPER_API_KEY";
/// Environment variable holding the Gemini key (narrative generation)
pub const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";
/// Optional override for the Gemini model name
pub const GEMINI_MODEL_VAR: &str = "GEMINI_MODEL";

const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

/// Configuration for a research run
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    /// Alpha Vantage API key
    pub alpha_vantage_api_key: Option<String>,

    /// Serper API key
    pub serper_api_key: Option<String>,

    /// Gemini API key
    pub gemini_api_key: Option<String>,

    /// Gemini model used for narratives
    pub model: String,

    /// Maximum tokens per generated narrative
    pub max_tokens: usize,

    /// Sampling temperature for narratives
    pub temperature: f32,

    /// Timeout applied to every provider HTTP request
    pub request_timeout: Duration,

    /// TTL for cached ticker-search responses
    pub cache_ttl_search: Duration,

    /// TTL for cached profile, statement and price data
    pub cache_ttl_market: Duration,

    /// TTL for cached news results
    pub cache_ttl_news: Duration,

    /// Alpha Vantage requests per minute (free tier: 5)
    pub alpha_vantage_rate_limit: u32,

    /// Maximum news items kept for sentiment
    pub news_max_results: usize,

    /// Character budget per news snippet
    pub snippet_max_chars: usize,

    /// Trailing window of daily prices, in calendar days
    pub history_days: i64,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            alpha_vantage_api_key: None,
            serper_api_key: None,
            gemini_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1024,
            temperature: 0.3,
            request_timeout: Duration::from_secs(30),
            cache_ttl_search: Duration::from_secs(15 * 60),
            cache_ttl_market: Duration::from_secs(30 * 60),
            cache_ttl_news: Duration::from_secs(30 * 60),
            alpha_vantage_rate_limit: 5,
            news_max_results: 5,
            snippet_max_chars: 280,
            history_days: 365,
        }
    }
}

impl ResearchConfig {
    /// Create a new configuration builder
    pub fn builder() -> ResearchConfigBuilder {
        ResearchConfigBuilder::default()
    }

    /// Read keys (and the optional model override) from the environment and validate
    pub fn from_env() -> Result<Self> {
        Self::builder().with_env_keys().build()
    }

    /// Validate the configuration
    ///
    /// Every credential is required: a missing one is fatal before any stage runs.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            (ALPHA_VANTAGE_KEY_VAR, &self.alpha_vantage_api_key),
            (SERPER_KEY_VAR, &self.serper_api_key),
            (GEMINI_KEY_VAR, &self.gemini_api_key),
        ] {
            if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
                return Err(ResearchError::ConfigError(format!(
                    "{name} is required but not set"
                )));
            }
        }

        if self.model.trim().is_empty() {
            return Err(ResearchError::ConfigError("model must not be empty".to_string()));
        }

        if self.alpha_vantage_rate_limit == 0 {
            return Err(ResearchError::ConfigError(
                "alpha_vantage_rate_limit must be greater than 0".to_string(),
            ));
        }

        if self.news_max_results == 0 || self.snippet_max_chars == 0 {
            return Err(ResearchError::ConfigError(
                "news_max_results and snippet_max_chars must be greater than 0".to_string(),
            ));
        }

        if self.history_days < 2 {
            return Err(ResearchError::ConfigError(
                "history_days must be at least 2".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for ResearchConfig
#[derive(Debug, Default)]
pub struct ResearchConfigBuilder {
    alpha_vantage_api_key: Option<String>,
    serper_api_key: Option<String>,
    gemini_api_key: Option<String>,
    model: Option<String>,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
    request_timeout: Option<Duration>,
    cache_ttl_search: Option<Duration>,
    cache_ttl_market: Option<Duration>,
    cache_ttl_news: Option<Duration>,
    alpha_vantage_rate_limit: Option<u32>,
    news_max_results: Option<usize>,
    snippet_max_chars: Option<usize>,
    history_days: Option<i64>,
}

impl ResearchConfigBuilder {
    /// Set Alpha Vantage API key
    pub fn alpha_vantage_api_key(mut self, key: impl Into<String>) -> Self {
        self.alpha_vantage_api_key = Some(key.into());
        self
    }

    /// Set Serper API key
    pub fn serper_api_key(mut self, key: impl Into<String>) -> Self {
        self.serper_api_key = Some(key.into());
        self
    }

    /// Set Gemini API key
    pub fn gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.gemini_api_key = Some(key.into());
        self
    }

    /// Load all API keys, and the model override, from the environment
    pub fn with_env_keys(mut self) -> Self {
        if let Some(key) = optional_env(ALPHA_VANTAGE_KEY_VAR) {
            self.alpha_vantage_api_key = Some(key);
        }
        if let Some(key) = optional_env(SERPER_KEY_VAR) {
            self.serper_api_key = Some(key);
        }
        if let Some(key) = optional_env(GEMINI_KEY_VAR) {
            self.gemini_api_key = Some(key);
        }
        if let Some(model) = optional_env(GEMINI_MODEL_VAR) {
            self.model = Some(model);
        }
        self
    }

    /// Set the Gemini model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set max tokens per narrative
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set narrative temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set cache TTL for ticker searches
    pub fn cache_ttl_search(mut self, duration: Duration) -> Self {
        self.cache_ttl_search = Some(duration);
        self
    }

    /// Set cache TTL for market data
    pub fn cache_ttl_market(mut self, duration: Duration) -> Self {
        self.cache_ttl_market = Some(duration);
        self
    }

    /// Set cache TTL for news
    pub fn cache_ttl_news(mut self, duration: Duration) -> Self {
        self.cache_ttl_news = Some(duration);
        self
    }

    /// Set Alpha Vantage requests per minute
    pub fn alpha_vantage_rate_limit(mut self, per_minute: u32) -> Self {
        self.alpha_vantage_rate_limit = Some(per_minute);
        self
    }

    /// Set maximum news results
    pub fn news_max_results(mut self, limit: usize) -> Self {
        self.news_max_results = Some(limit);
        self
    }

    /// Set snippet character budget
    pub fn snippet_max_chars(mut self, chars: usize) -> Self {
        self.snippet_max_chars = Some(chars);
        self
    }

    /// Set the trailing price window in days
    pub fn history_days(mut self, days: i64) -> Self {
        self.history_days = Some(days);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ResearchConfig> {
        let defaults = ResearchConfig::default();

        let config = ResearchConfig {
            alpha_vantage_api_key: self.alpha_vantage_api_key,
            serper_api_key: self.serper_api_key,
            gemini_api_key: self.gemini_api_key,
            model: self.model.unwrap_or(defaults.model),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            cache_ttl_search: self.cache_ttl_search.unwrap_or(defaults.cache_ttl_search),
            cache_ttl_market: self.cache_ttl_market.unwrap_or(defaults.cache_ttl_market),
            cache_ttl_news: self.cache_ttl_news.unwrap_or(defaults.cache_ttl_news),
            alpha_vantage_rate_limit: self
                .alpha_vantage_rate_limit
                .unwrap_or(defaults.alpha_vantage_rate_limit),
            news_max_results: self.news_max_results.unwrap_or(defaults.news_max_results),
            snippet_max_chars: self.snippet_max_chars.unwrap_or(defaults.snippet_max_chars),
            history_days: self.history_days.unwrap_or(defaults.history_days),
        };

        config.validate()?;
        Ok(config)
    }
}
