//! Price history summary over a trailing window

use crate::api::MarketData;
use crate::cache::{CacheKey, TtlCache};
use crate::error::{Result, ResearchError};
use crate::model::{PricePoint, PriceSummary, ResolvedTicker};
use chrono::{Days, NaiveDate, Utc};
use std::sync::Arc;

/// Keep only points with a finite close
pub fn finite_closes(points: impl IntoIterator<Item = PricePoint>) -> Vec<PricePoint> {
    points.into_iter().filter(|p| p.close.is_finite()).collect()
}

/// Summary statistics for a close series
///
/// Non-finite closes are dropped first. Fewer than two remaining points, or an
/// earliest close of zero, is `InsufficientData`.
pub fn summarize_closes(symbol: &str, points: &[PricePoint]) -> Result<PriceSummary> {
    let mut points = finite_closes(points.iter().copied());
    points.sort_by_key(|p| p.date);

    let insufficient = |count| ResearchError::InsufficientData {
        symbol: symbol.to_string(),
        points: count,
    };

    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Err(insufficient(0));
    };
    if points.len() < 2 || first.close == 0.0 {
        return Err(insufficient(points.len()));
    }

    let period_high = points.iter().map(|p| p.close).fold(f64::MIN, f64::max);
    let period_low = points.iter().map(|p| p.close).fold(f64::MAX, f64::min);
    let change = (last.close - first.close) / first.close * 100.0;

    Ok(PriceSummary {
        symbol: symbol.to_string(),
        start_date: first.date,
        end_date: last.date,
        period_high,
        period_low,
        earliest_close: first.close,
        latest_close: last.close,
        percent_change: (change * 100.0).round() / 100.0,
        points: points.len(),
    })
}

/// Fetches daily closes and summarises them
pub struct PriceHistorySummarizer {
    market: Arc<dyn MarketData>,
    cache: TtlCache,
    history_days: u64,
}

impl PriceHistorySummarizer {
    pub fn new(market: Arc<dyn MarketData>, cache: TtlCache, history_days: i64) -> Self {
        Self {
            market,
            cache,
            history_days: history_days.max(0).unsigned_abs(),
        }
    }

    /// Summary of the trailing window ending today
    pub async fn summarize_history(&self, ticker: &ResolvedTicker) -> Result<PriceSummary> {
        self.summarize_window(ticker, Utc::now().date_naive()).await
    }

    /// Summary of the trailing window ending on `end`
    pub async fn summarize_window(
        &self,
        ticker: &ResolvedTicker,
        end: NaiveDate,
    ) -> Result<PriceSummary> {
        let symbol = ticker.symbol.as_str();
        let start = end
            .checked_sub_days(Days::new(self.history_days))
            .unwrap_or(NaiveDate::MIN);

        // Non-finite closes would not survive the JSON cache entry
        let points: Vec<PricePoint> = self
            .cache
            .get_or_fetch(
                CacheKey::new("daily_closes", format!("{symbol}:{start}:{end}")),
                || async move {
                    let points = self.market.daily_closes(symbol, start, end).await?;
                    Ok::<_, ResearchError>(finite_closes(points))
                },
            )
            .await?;

        tracing::debug!("{} daily closes for {}", points.len(), symbol);

        summarize_closes(symbol, &points)
    }
}
