//! Market data assembled from Alpha Vantage (fundamentals) and Yahoo Finance (prices)

use crate::api::{AlphaVantageClient, MarketData, YahooFinanceClient};
use crate::config::ResearchConfig;
use crate::error::Result;
use crate::model::{CompanyProfile, FinancialStatementSet, PricePoint};
use async_trait::async_trait;
use chrono::NaiveDate;

/// [`MarketData`] backed by the live providers
#[derive(Debug, Clone)]
pub struct ProviderMarketData {
    alpha_vantage: AlphaVantageClient,
    yahoo: YahooFinanceClient,
}

impl ProviderMarketData {
    pub fn new(alpha_vantage: AlphaVantageClient, yahoo: YahooFinanceClient) -> Self {
        Self {
            alpha_vantage,
            yahoo,
        }
    }

    pub fn from_config(config: &ResearchConfig) -> Result<Self> {
        Ok(Self::new(
            AlphaVantageClient::from_config(config)?,
            YahooFinanceClient::from_config(config),
        ))
    }
}

#[async_trait]
impl MarketData for ProviderMarketData {
    async fn profile(&self, symbol: &str) -> Result<CompanyProfile> {
        self.alpha_vantage.company_overview(symbol).await
    }

    async fn annual_statements(&self, symbol: &str) -> Result<FinancialStatementSet> {
        self.alpha_vantage.annual_statements(symbol).await
    }

    async fn daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>> {
        self.yahoo.daily_closes(symbol, start, end).await
    }
}
