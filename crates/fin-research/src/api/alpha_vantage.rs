//! Alpha Vantage API client
//!
//! Ticker search (`SYMBOL_SEARCH`), company overview (`OVERVIEW`) and annual
//! statements (`INCOME_STATEMENT`, `BALANCE_SHEET`, `CASH_FLOW`).

use crate::api::SymbolSearch;
use crate::config::{ALPHA_VANTAGE_KEY_VAR, ResearchConfig};
use crate::error::{Result, ResearchError};
use crate::model::{CompanyProfile, FinancialStatementSet, NOT_AVAILABLE, Statement, TickerCandidate};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

const BASE_URL: &str = "https://www.alphavantage.co/query";
const SERVICE: &str = "Alpha Vantage";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Alpha Vantage API client
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

#[derive(Debug, Deserialize)]
struct SymbolSearchResponse {
    #[serde(rename = "bestMatches")]
    best_matches: Vec<SymbolMatch>,
}

#[derive(Debug, Deserialize)]
struct SymbolMatch {
    #[serde(rename = "1. symbol")]
    symbol: String,
    #[serde(rename = "2. name")]
    name: String,
    #[serde(rename = "3. type", default)]
    instrument_type: String,
    #[serde(rename = "4. region", default)]
    region: String,
    #[serde(rename = "8. currency", default)]
    currency: String,
    #[serde(rename = "9. matchScore")]
    match_score: String,
}

/// Company overview data
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CompanyOverview {
    symbol: Option<String>,
    name: Option<String>,
    description: Option<String>,
    exchange: Option<String>,
    country: Option<String>,
    sector: Option<String>,
    industry: Option<String>,
    official_site: Option<String>,
    full_time_employees: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResponse {
    #[serde(rename = "annualReports", default)]
    annual_reports: Vec<serde_json::Map<String, Value>>,
}

impl AlphaVantageClient {
    /// Create a new Alpha Vantage client
    ///
    /// # Arguments
    /// * `api_key` - Alpha Vantage API key
    /// * `rate_limit` - Maximum requests per minute (free tier: 5)
    /// * `timeout` - Per-request timeout
    pub fn new(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Result<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResearchError::ConfigError(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            rate_limiter,
        })
    }

    /// Create from a validated configuration
    pub fn from_config(config: &ResearchConfig) -> Result<Self> {
        let api_key = config.alpha_vantage_api_key.clone().ok_or_else(|| {
            ResearchError::ConfigError(format!("{ALPHA_VANTAGE_KEY_VAR} is required but not set"))
        })?;

        Self::new(
            api_key,
            config.alpha_vantage_rate_limit,
            config.request_timeout,
        )
    }

    /// Issue one rate-limited query and screen out API-level errors
    #[instrument(skip(self, params))]
    async fn query(&self, function: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.rate_limiter.until_ready().await;

        tracing::debug!("Sending Alpha Vantage request");

        let mut query: Vec<(&str, &str)> = vec![("function", function), ("apikey", self.api_key.as_str())];
        query.extend_from_slice(params);

        let response = self
            .client
            .get(BASE_URL)
            .query(&query)
            .send()
            .await
            .map_err(|e| ResearchError::from_http(SERVICE, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResearchError::unavailable(SERVICE, format!("HTTP error: {status}")));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| ResearchError::from_http(SERVICE, &e))?;

        check_api_errors(&data)?;
        Ok(data)
    }

    /// Search for symbols matching free text
    pub async fn search_symbols(&self, keywords: &str) -> Result<Vec<TickerCandidate>> {
        let data = self.query("SYMBOL_SEARCH", &[("keywords", keywords)]).await?;
        parse_symbol_search(data)
    }

    /// Get the company overview
    pub async fn company_overview(&self, symbol: &str) -> Result<CompanyProfile> {
        let data = self.query("OVERVIEW", &[("symbol", symbol)]).await?;
        parse_overview(symbol, data)
    }

    /// Get the three annual statements, one request each
    pub async fn annual_statements(&self, symbol: &str) -> Result<FinancialStatementSet> {
        let income_statement = self.annual_statement("INCOME_STATEMENT", symbol).await?;
        let balance_sheet = self.annual_statement("BALANCE_SHEET", symbol).await?;
        let cash_flow = self.annual_statement("CASH_FLOW", symbol).await?;

        Ok(FinancialStatementSet {
            income_statement,
            balance_sheet,
            cash_flow,
        })
    }

    async fn annual_statement(&self, function: &str, symbol: &str) -> Result<Statement> {
        let data = self.query(function, &[("symbol", symbol)]).await?;
        parse_annual_reports(data)
    }
}

#[async_trait]
impl SymbolSearch for AlphaVantageClient {
    async fn search(&self, query: &str) -> Result<Vec<TickerCandidate>> {
        self.search_symbols(query).await
    }
}

/// Alpha Vantage reports errors and throttling with a 200 status
fn check_api_errors(data: &Value) -> Result<()> {
    if let Some(error) = data.get("Error Message") {
        return Err(ResearchError::unavailable(SERVICE, error));
    }

    for key in ["Note", "Information"] {
        if let Some(note) = data.get(key) {
            return Err(ResearchError::unavailable(
                SERVICE,
                format!("rate limit reached: {note}"),
            ));
        }
    }

    Ok(())
}

fn parse_symbol_search(data: Value) -> Result<Vec<TickerCandidate>> {
    let response: SymbolSearchResponse =
        serde_json::from_value(data).map_err(|e| ResearchError::parse(SERVICE, e))?;

    response
        .best_matches
        .into_iter()
        .map(|m| -> Result<TickerCandidate> {
            let match_score = m
                .match_score
                .trim()
                .parse::<f64>()
                .map_err(|e| e.to_string())
                .and_then(|score| {
                    if score.is_finite() {
                        Ok(score)
                    } else {
                        Err("not a finite number".to_string())
                    }
                })
                .map_err(|e| {
                    ResearchError::parse(SERVICE, format!("bad matchScore '{}': {e}", m.match_score))
                })?;

            Ok(TickerCandidate {
                symbol: m.symbol.trim().to_string(),
                name: m.name,
                region: m.region,
                instrument_type: m.instrument_type,
                currency: m.currency,
                match_score,
            })
        })
        .collect()
}

fn parse_overview(symbol: &str, data: Value) -> Result<CompanyProfile> {
    match data.as_object() {
        Some(obj) if obj.is_empty() => {
            return Err(ResearchError::SymbolNotFound(symbol.to_string()));
        }
        Some(_) => {}
        None => return Err(ResearchError::parse(SERVICE, "overview is not an object")),
    }

    let overview: CompanyOverview =
        serde_json::from_value(data).map_err(|e| ResearchError::parse(SERVICE, e))?;

    if overview.symbol.is_none() && overview.name.is_none() {
        return Err(ResearchError::SymbolNotFound(symbol.to_string()));
    }

    Ok(CompanyProfile {
        symbol: symbol.to_string(),
        long_name: or_placeholder(overview.name),
        sector: or_placeholder(overview.sector),
        industry: or_placeholder(overview.industry),
        website: or_placeholder(overview.official_site),
        summary_text: or_placeholder(overview.description),
        country: or_placeholder(overview.country),
        exchange: or_placeholder(overview.exchange),
        full_time_employees: or_placeholder(overview.full_time_employees),
    })
}

fn or_placeholder(field: Option<String>) -> String {
    match field.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() && v != "None" && v != "-" => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn parse_annual_reports(data: Value) -> Result<Statement> {
    let response: StatementResponse =
        serde_json::from_value(data).map_err(|e| ResearchError::parse(SERVICE, e))?;

    let mut statement = Statement::default();

    for report in response.annual_reports {
        let Some(period) = report.get("fiscalDateEnding").and_then(Value::as_str) else {
            tracing::warn!("Skipping annual report without fiscalDateEnding");
            continue;
        };

        for (item, value) in &report {
            if item == "fiscalDateEnding" || item == "reportedCurrency" {
                continue;
            }
            if let Some(amount) = value.as_str().and_then(parse_amount) {
                statement.insert(item.as_str(), period, amount);
            }
        }
    }

    Ok(statement)
}

/// Statement values are strings; "None" marks an unreported item
fn parse_amount(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "None" {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}
