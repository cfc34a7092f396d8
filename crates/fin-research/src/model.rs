//! Typed records passed between pipeline stages

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Placeholder for a profile field the provider did not report
pub const NOT_AVAILABLE: &str = "N/A";

/// One match returned by a ticker search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerCandidate {
    pub symbol: String,
    pub name: String,
    pub region: String,
    /// Instrument type, e.g. "Equity" or "ETF"
    pub instrument_type: String,
    pub currency: String,
    /// Provider relevance score in [0, 1]
    pub match_score: f64,
}

/// Deduplicate by symbol (keeping the best score) and sort for presentation:
/// score descending, ties broken by symbol ascending.
pub fn rank_candidates(candidates: Vec<TickerCandidate>) -> Vec<TickerCandidate> {
    let mut best: HashMap<String, TickerCandidate> = HashMap::new();

    for candidate in candidates {
        match best.get(&candidate.symbol) {
            Some(existing) if existing.match_score >= candidate.match_score => {}
            _ => {
                best.insert(candidate.symbol.clone(), candidate);
            }
        }
    }

    let mut ranked: Vec<TickerCandidate> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        b.match_score
            .total_cmp(&a.match_score)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    ranked
}

/// The single ticker a run is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTicker {
    pub symbol: String,
}

impl ResolvedTicker {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }
}

impl fmt::Display for ResolvedTicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// Descriptive company metadata; unreported fields hold [`NOT_AVAILABLE`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub symbol: String,
    pub long_name: String,
    pub sector: String,
    pub industry: String,
    pub website: String,
    pub summary_text: String,
    pub country: String,
    pub exchange: String,
    pub full_time_employees: String,
}

impl CompanyProfile {
    /// A profile with every descriptive field set to the placeholder
    pub fn placeholder(symbol: impl Into<String>) -> Self {
        let na = || NOT_AVAILABLE.to_string();
        Self {
            symbol: symbol.into(),
            long_name: na(),
            sector: na(),
            industry: na(),
            website: na(),
            summary_text: na(),
            country: na(),
            exchange: na(),
            full_time_employees: na(),
        }
    }

    /// Name to use in prose and news queries; falls back to the symbol
    pub fn display_name(&self) -> &str {
        if self.long_name == NOT_AVAILABLE {
            &self.symbol
        } else {
            &self.long_name
        }
    }
}

/// Line-item names as reported by the fundamentals provider
pub mod line_items {
    pub const TOTAL_REVENUE: &str = "totalRevenue";
    pub const COST_OF_REVENUE: &str = "costOfRevenue";
    pub const GROSS_PROFIT: &str = "grossProfit";
    pub const NET_INCOME: &str = "netIncome";
    pub const TOTAL_LIABILITIES: &str = "totalLiabilities";
    pub const TOTAL_SHAREHOLDER_EQUITY: &str = "totalShareholderEquity";
    pub const TOTAL_CURRENT_ASSETS: &str = "totalCurrentAssets";
    pub const TOTAL_CURRENT_LIABILITIES: &str = "totalCurrentLiabilities";
    pub const OPERATING_CASHFLOW: &str = "operatingCashflow";
}

/// One statement: line item -> fiscal period label -> value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub items: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Statement {
    pub fn insert(&mut self, item: impl Into<String>, period: impl Into<String>, value: f64) {
        self.items
            .entry(item.into())
            .or_default()
            .insert(period.into(), value);
    }

    pub fn value(&self, item: &str, period: &str) -> Option<f64> {
        self.items.get(item)?.get(period).copied()
    }

    /// Latest period label present in this statement
    ///
    /// Labels are ISO dates, so lexical order is chronological.
    pub fn latest_period(&self) -> Option<&str> {
        self.items
            .values()
            .filter_map(|periods| periods.keys().next_back())
            .max()
            .map(String::as_str)
    }

    /// Every period label reported by at least one line item
    pub fn periods(&self) -> BTreeSet<&str> {
        self.items
            .values()
            .flat_map(|periods| periods.keys().map(String::as_str))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.values().all(BTreeMap::is_empty)
    }
}

/// The three annual statements for one company
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatementSet {
    pub income_statement: Statement,
    pub balance_sheet: Statement,
    pub cash_flow: Statement,
}

impl FinancialStatementSet {
    pub fn is_empty(&self) -> bool {
        self.income_statement.is_empty() && self.balance_sheet.is_empty() && self.cash_flow.is_empty()
    }

    /// Fiscal period the ratios are computed from
    ///
    /// The latest period reported by both the income statement and the balance
    /// sheet. Without a shared period, the latest income statement period is
    /// used, then the balance sheet's, then the cash flow statement's.
    pub fn latest_period(&self) -> Option<&str> {
        let balance = self.balance_sheet.periods();
        self.income_statement
            .periods()
            .into_iter()
            .rev()
            .find(|period| balance.contains(period))
            .or_else(|| self.income_statement.latest_period())
            .or_else(|| self.balance_sheet.latest_period())
            .or_else(|| self.cash_flow.latest_period())
    }
}

/// A computed figure, or a marker that it could not be computed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Value(f64),
    Unavailable,
}

impl Metric {
    /// `numerator / denominator`, unavailable if either is missing or non-finite
    /// or the denominator is zero
    pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Self {
        match (numerator, denominator) {
            (Some(n), Some(d)) if n.is_finite() && d.is_finite() && d != 0.0 => {
                let value = n / d;
                if value.is_finite() {
                    Metric::Value(value)
                } else {
                    Metric::Unavailable
                }
            }
            _ => Metric::Unavailable,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(*v),
            Metric::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Metric::Value(_))
    }

    /// Render as a percentage, e.g. "43.31%"
    pub fn as_percent(&self) -> String {
        match self {
            Metric::Value(v) => format!("{:.2}%", v * 100.0),
            Metric::Unavailable => "unavailable".to_string(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Value(v) => write!(f, "{v:.2}"),
            Metric::Unavailable => f.write_str("unavailable"),
        }
    }
}

/// Standard ratios computed from the latest annual period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioReport {
    pub gross_margin: Metric,
    pub net_margin: Metric,
    pub debt_to_equity: Metric,
    pub current_ratio: Metric,
}

/// Output of the financial analysis stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialAnalysis {
    pub statements: FinancialStatementSet,
    /// Fiscal period the ratios were computed from
    pub period: String,
    pub ratios: RatioReport,
    /// Headline figures from the latest period, in display order
    pub key_figures: Vec<KeyFigure>,
    pub narrative: Narrative,
}

/// Generated prose for a stage, or the reason it could not be written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Narrative {
    Written { text: String },
    Unavailable { reason: String },
}

impl Narrative {
    pub fn text(&self) -> Option<&str> {
        match self {
            Narrative::Written { text } => Some(text),
            Narrative::Unavailable { .. } => None,
        }
    }
}

/// A named statement figure shown alongside the ratios
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFigure {
    pub label: String,
    pub value: f64,
}

/// One daily close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Summary statistics over a trailing price window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub period_high: f64,
    pub period_low: f64,
    pub earliest_close: f64,
    pub latest_close: f64,
    /// Percent change from earliest to latest close, rounded to 2 decimals
    pub percent_change: f64,
    pub points: usize,
}

/// Overall tone of recent news
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Parse a free-text classifier reply
    ///
    /// Picks the label that appears first in the reply, case-insensitively.
    /// Returns `None` when no label is present.
    pub fn from_reply(reply: &str) -> Option<Self> {
        let lowered = reply.to_lowercase();
        [
            (Sentiment::Positive, "positive"),
            (Sentiment::Neutral, "neutral"),
            (Sentiment::Negative, "negative"),
        ]
        .into_iter()
        .filter_map(|(sentiment, label)| lowered.find(label).map(|pos| (pos, sentiment)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, sentiment)| sentiment)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A news search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub snippet: String,
    pub link: Option<String>,
    pub source: Option<String>,
    /// Provider's relative or absolute date text, e.g. "3 days ago"
    pub date: Option<String>,
}

/// Aggregate sentiment with the snippets it was judged from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsSentimentSummary {
    pub overall_sentiment: Sentiment,
    pub supporting_snippets: Vec<String>,
}

impl NewsSentimentSummary {
    /// Neutral with no evidence, used when the search finds nothing
    pub fn empty() -> Self {
        Self {
            overall_sentiment: Sentiment::Neutral,
            supporting_snippets: Vec::new(),
        }
    }
}
