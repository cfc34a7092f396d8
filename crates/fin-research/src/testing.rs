//! Hand-written fake providers for unit tests

use crate::api::{MarketData, NewsQuery, NewsSearch, SymbolSearch};
use crate::error::{Result, ResearchError};
use crate::model::{
    CompanyProfile, FinancialStatementSet, NewsItem, PricePoint, Statement, TickerCandidate,
    line_items,
};
use crate::narrative::{NarrativeGenerator, NarrativeRequest};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) fn candidate(symbol: &str, name: &str, score: f64) -> TickerCandidate {
    TickerCandidate {
        symbol: symbol.to_string(),
        name: name.to_string(),
        region: "United States".to_string(),
        instrument_type: "Equity".to_string(),
        currency: "USD".to_string(),
        match_score: score,
    }
}

pub(crate) fn profile(symbol: &str, name: &str) -> CompanyProfile {
    CompanyProfile {
        long_name: name.to_string(),
        sector: "Technology".to_string(),
        industry: "Software".to_string(),
        website: "https://example.com".to_string(),
        summary_text: format!("{name} makes things."),
        ..CompanyProfile::placeholder(symbol)
    }
}

/// One fiscal year of statement data (values in dollars)
pub(crate) fn statements() -> FinancialStatementSet {
    let period = "2023-09-30";
    let mut income_statement = Statement::default();
    income_statement.insert(line_items::TOTAL_REVENUE, period, 400.0e9);
    income_statement.insert(line_items::COST_OF_REVENUE, period, 220.0e9);
    income_statement.insert(line_items::NET_INCOME, period, 100.0e9);
    income_statement.insert(line_items::TOTAL_REVENUE, "2022-09-30", 390.0e9);

    let mut balance_sheet = Statement::default();
    balance_sheet.insert(line_items::TOTAL_LIABILITIES, period, 300.0e9);
    balance_sheet.insert(line_items::TOTAL_SHAREHOLDER_EQUITY, period, 60.0e9);
    balance_sheet.insert(line_items::TOTAL_CURRENT_ASSETS, period, 150.0e9);
    balance_sheet.insert(line_items::TOTAL_CURRENT_LIABILITIES, period, 120.0e9);

    let mut cash_flow = Statement::default();
    cash_flow.insert(line_items::OPERATING_CASHFLOW, period, 110.0e9);

    FinancialStatementSet {
        income_statement,
        balance_sheet,
        cash_flow,
    }
}

/// Consecutive daily closes starting 2024-01-02
pub(crate) fn closes(values: &[f64]) -> Vec<PricePoint> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap_or_default();
    values
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: start
                .checked_add_days(Days::new(i as u64))
                .unwrap_or(start),
            close,
        })
        .collect()
}

pub(crate) fn news_item(title: &str, snippet: &str) -> NewsItem {
    NewsItem {
        title: title.to_string(),
        snippet: snippet.to_string(),
        link: Some("https://example.com/news".to_string()),
        source: Some("Example Wire".to_string()),
        date: Some("1 day ago".to_string()),
    }
}

/// Symbol search returning a fixed candidate list
#[derive(Debug, Default)]
pub(crate) struct FakeSymbolSearch {
    candidates: Vec<TickerCandidate>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeSymbolSearch {
    pub(crate) fn new(candidates: Vec<TickerCandidate>) -> Self {
        Self {
            candidates,
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SymbolSearch for FakeSymbolSearch {
    async fn search(&self, _query: &str) -> Result<Vec<TickerCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ResearchError::unavailable("fake search", "connection refused"));
        }
        Ok(self.candidates.clone())
    }
}

/// Market data with canned responses; `None` fields fail
#[derive(Debug)]
pub(crate) struct FakeMarketData {
    pub(crate) profile: Option<CompanyProfile>,
    pub(crate) statements: Option<FinancialStatementSet>,
    pub(crate) closes: Option<Vec<PricePoint>>,
    pub(crate) profile_calls: AtomicUsize,
    pub(crate) statement_calls: AtomicUsize,
    pub(crate) closes_calls: AtomicUsize,
}

impl FakeMarketData {
    /// A healthy company with a profile, statements and a rising price
    pub(crate) fn healthy(symbol: &str, name: &str) -> Self {
        Self {
            profile: Some(profile(symbol, name)),
            statements: Some(statements()),
            closes: Some(closes(&[100.0, 120.0, 90.0, 110.0])),
            profile_calls: AtomicUsize::new(0),
            statement_calls: AtomicUsize::new(0),
            closes_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MarketData for FakeMarketData {
    async fn profile(&self, symbol: &str) -> Result<CompanyProfile> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.profile
            .clone()
            .ok_or_else(|| ResearchError::SymbolNotFound(symbol.to_string()))
    }

    async fn annual_statements(&self, _symbol: &str) -> Result<FinancialStatementSet> {
        self.statement_calls.fetch_add(1, Ordering::SeqCst);
        self.statements
            .clone()
            .ok_or_else(|| ResearchError::unavailable("fake fundamentals", "HTTP error: 503"))
    }

    async fn daily_closes(
        &self,
        _symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<PricePoint>> {
        self.closes_calls.fetch_add(1, Ordering::SeqCst);
        self.closes
            .clone()
            .ok_or_else(|| ResearchError::unavailable("fake prices", "request timed out"))
    }
}

/// News search returning fixed items and recording queries
#[derive(Debug, Default)]
pub(crate) struct FakeNewsSearch {
    items: Vec<NewsItem>,
    pub(crate) queries: Mutex<Vec<NewsQuery>>,
}

impl FakeNewsSearch {
    pub(crate) fn new(items: Vec<NewsItem>) -> Self {
        Self {
            items,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.queries.lock().map(|q| q.len()).unwrap_or(0)
    }
}

#[async_trait]
impl NewsSearch for FakeNewsSearch {
    async fn search_news(&self, query: &NewsQuery) -> Result<Vec<NewsItem>> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }
        Ok(self.items.iter().take(query.limit).cloned().collect())
    }
}

/// Narrative generator with scripted replies
#[derive(Debug)]
pub(crate) struct FakeNarrator {
    sentiment_reply: String,
    /// Request kinds answered with a service error
    failing: Vec<&'static str>,
    pub(crate) requests: Mutex<Vec<NarrativeRequest>>,
}

impl FakeNarrator {
    pub(crate) fn new(sentiment_reply: &str) -> Self {
        Self {
            sentiment_reply: sentiment_reply.to_string(),
            failing: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail every request of this kind, e.g. "closing_summary"
    pub(crate) fn failing_on(mut self, kind: &'static str) -> Self {
        self.failing.push(kind);
        self
    }

    pub(crate) fn count(&self, kind: &str) -> usize {
        self.requests
            .lock()
            .map(|r| r.iter().filter(|req| req.kind() == kind).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl NarrativeGenerator for FakeNarrator {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if self.failing.contains(&request.kind()) {
            return Err(ResearchError::unavailable(
                "language model",
                "Rate limit exceeded: quota",
            ));
        }

        match request {
            NarrativeRequest::FinancialSummary { company, .. } => {
                Ok(format!("{company} is solidly profitable."))
            }
            NarrativeRequest::NewsSentiment { .. } => Ok(self.sentiment_reply.clone()),
            NarrativeRequest::ClosingSummary { .. } => {
                Ok("- Strong margins\n- Rising price\n- Neutral press".to_string())
            }
        }
    }
}
