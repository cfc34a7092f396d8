//! Error types for research pipeline operations

use std::fmt;
use thiserror::Error;

/// Research pipeline errors
#[derive(Debug, Error)]
pub enum ResearchError {
    /// Network failure, timeout or non-2xx status from an external provider
    #[error("{service} unavailable: {reason}")]
    ServiceUnavailable { service: String, reason: String },

    /// Provider answered with a body that does not match its documented shape
    #[error("Malformed {service} response: {reason}")]
    ParseError { service: String, reason: String },

    /// Ticker search produced no candidates
    #[error("No ticker found for '{query}'")]
    NotFound { query: String },

    /// The market-data provider does not know the symbol
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// A stage's data is entirely absent
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Too few price points to summarise
    #[error("Insufficient price data for {symbol}: {points} point(s), need at least 2")]
    InsufficientData { symbol: String, points: usize },

    /// Missing or invalid configuration, detected at startup
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Caller supplied an unusable query or selection
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ResearchError {
    /// Shorthand for [`ResearchError::ServiceUnavailable`]
    pub fn unavailable(service: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::ServiceUnavailable {
            service: service.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for [`ResearchError::ParseError`]
    pub fn parse(service: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::ParseError {
            service: service.into(),
            reason: reason.to_string(),
        }
    }

    /// Classify a reqwest failure: undecodable bodies are parse errors,
    /// everything else (connect, timeout, status) means the service is unavailable.
    pub fn from_http(service: impl Into<String>, err: &reqwest::Error) -> Self {
        if err.is_decode() {
            Self::parse(service, err)
        } else if err.is_timeout() {
            Self::unavailable(service, format!("request timed out: {err}"))
        } else {
            Self::unavailable(service, err)
        }
    }
}

/// Result type alias for research operations
pub type Result<T> = std::result::Result<T, ResearchError>;

impl From<fin_llm::LLMError> for ResearchError {
    fn from(err: fin_llm::LLMError) -> Self {
        if err.is_unavailable() {
            Self::unavailable("language model", err)
        } else {
            Self::parse("language model", err)
        }
    }
}

/// One step of the report pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    TickerResolution,
    CompanyProfile,
    FinancialAnalysis,
    PriceHistory,
    NewsSentiment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::TickerResolution => "Ticker resolution",
            Stage::CompanyProfile => "Company profile",
            Stage::FinancialAnalysis => "Financial analysis",
            Stage::PriceHistory => "Price history",
            Stage::NewsSentiment => "News sentiment",
        };
        f.write_str(label)
    }
}

/// An error tagged with the stage that raised it
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: ResearchError,
}

impl StageError {
    pub fn new(stage: Stage, source: ResearchError) -> Self {
        Self { stage, source }
    }
}

/// Outcome of one stage; a failed optional stage is reported, not fatal
pub type StageResult<T> = std::result::Result<T, StageError>;

/// Attach a stage to a research result
pub trait StageContext<T> {
    fn stage(self, stage: Stage) -> StageResult<T>;
}

impl<T> StageContext<T> for Result<T> {
    fn stage(self, stage: Stage) -> StageResult<T> {
        self.map_err(|source| StageError::new(stage, source))
    }
}
