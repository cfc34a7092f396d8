//! External data providers
//!
//! Each kind of data sits behind a trait so stages never see HTTP. The
//! concrete clients deserialize provider responses into the typed records
//! of [`crate::model`] at this boundary.

pub mod alpha_vantage;
pub mod market;
pub mod serper;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageClient;
pub use market::ProviderMarketData;
pub use serper::SerperClient;
pub use yahoo::YahooFinanceClient;

use crate::error::Result;
use crate::model::{CompanyProfile, FinancialStatementSet, NewsItem, PricePoint, TickerCandidate};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Free-text ticker search
#[async_trait]
pub trait SymbolSearch: Send + Sync {
    /// Candidates in provider order; ranking is the resolver's job
    async fn search(&self, query: &str) -> Result<Vec<TickerCandidate>>;
}

/// Company fundamentals and price history for a known symbol
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Descriptive metadata. An unknown symbol is `SymbolNotFound`.
    async fn profile(&self, symbol: &str) -> Result<CompanyProfile>;

    /// Annual income statement, balance sheet and cash flow
    async fn annual_statements(&self, symbol: &str) -> Result<FinancialStatementSet>;

    /// Daily closes between `start` and `end` inclusive, oldest first
    async fn daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>>;
}

/// How far back a news search looks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recency {
    PastDay,
    PastWeek,
    PastMonth,
    PastYear,
}

/// A news search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub text: String,
    pub recency: Recency,
    pub limit: usize,
}

/// Recent news search
#[async_trait]
pub trait NewsSearch: Send + Sync {
    /// Top results, at most `query.limit`
    async fn search_news(&self, query: &NewsQuery) -> Result<Vec<NewsItem>>;
}
