//! Yahoo Finance API client (daily price history)

use crate::config::ResearchConfig;
use crate::error::{Result, ResearchError};
use crate::model::PricePoint;
use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use std::time::Duration;
use time::OffsetDateTime;
use yahoo_finance_api as yahoo;

const SERVICE: &str = "Yahoo Finance";

/// Yahoo Finance API client
#[derive(Debug, Clone)]
pub struct YahooFinanceClient {
    timeout: Duration,
}

impl YahooFinanceClient {
    /// Create a client whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(config: &ResearchConfig) -> Self {
        Self::new(config.request_timeout)
    }

    /// Get daily closes between `start` and `end` inclusive, oldest first
    #[tracing::instrument(skip(self))]
    pub async fn daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>> {
        let provider = yahoo::YahooConnector::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ResearchError::unavailable(SERVICE, e))?;

        let start_odt = to_offset_datetime(start)?;
        // The history end bound is exclusive
        let end_odt = to_offset_datetime(end.checked_add_days(Days::new(1)).unwrap_or(end))?;

        tracing::debug!("Requesting Yahoo Finance quote history");

        let response = provider
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| ResearchError::unavailable(SERVICE, e))?;

        let quotes = response
            .quotes()
            .map_err(|e| ResearchError::parse(SERVICE, e))?;

        let raw: Vec<(i64, f64)> = quotes
            .iter()
            .map(|q| (q.timestamp as i64, q.close))
            .collect();

        Ok(to_price_points(&raw, start, end))
    }
}

fn to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime> {
    let timestamp = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| ResearchError::InvalidInput(format!("Invalid date {date}: {e}")))
}

/// Convert (unix timestamp, close) pairs into in-window points sorted by date
///
/// Non-finite closes are dropped.
fn to_price_points(raw: &[(i64, f64)], start: NaiveDate, end: NaiveDate) -> Vec<PricePoint> {
    let mut points: Vec<PricePoint> = raw
        .iter()
        .filter(|(_, close)| close.is_finite())
        .filter_map(|&(timestamp, close)| {
            let date = DateTime::from_timestamp(timestamp, 0)?.date_naive();
            Some(PricePoint { date, close })
        })
        .filter(|p| p.date >= start && p.date <= end)
        .collect();

    points.sort_by_key(|p| p.date);
    points
}
