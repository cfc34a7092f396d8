//! Company profile lookup

use crate::api::MarketData;
use crate::cache::{CacheKey, TtlCache};
use crate::error::Result;
use crate::model::{CompanyProfile, ResolvedTicker};
use std::sync::Arc;

pub struct ProfileFetcher {
    market: Arc<dyn MarketData>,
    cache: TtlCache,
}

impl ProfileFetcher {
    pub fn new(market: Arc<dyn MarketData>, cache: TtlCache) -> Self {
        Self { market, cache }
    }

    /// Descriptive metadata for a resolved ticker
    pub async fn fetch_profile(&self, ticker: &ResolvedTicker) -> Result<CompanyProfile> {
        let symbol = ticker.symbol.as_str();
        self.cache
            .get_or_fetch(CacheKey::new("company_profile", symbol), || {
                self.market.profile(symbol)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::error::ResearchError;
    use crate::model::NOT_AVAILABLE;
    use crate::testing::FakeMarketData;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn fetcher(market: Arc<FakeMarketData>) -> ProfileFetcher {
        let cache = TtlCache::new(Duration::from_secs(1800), Arc::new(ManualClock::new()));
        ProfileFetcher::new(market, cache)
    }

    #[tokio::test]
    async fn test_fetch_profile_cached() {
        let market = Arc::new(FakeMarketData::healthy("MSFT", "Microsoft Corporation"));
        let fetcher = fetcher(market.clone());
        let ticker = ResolvedTicker::new("MSFT");

        let first = fetcher.fetch_profile(&ticker).await.unwrap();
        let second = fetcher.fetch_profile(&ticker).await.unwrap();

        assert_eq!(first.long_name, "Microsoft Corporation");
        assert_eq!(first.exchange, NOT_AVAILABLE);
        assert_eq!(first, second);
        assert_eq!(market.profile_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_symbol() {
        let mut market = FakeMarketData::healthy("ZZZZ", "Nobody");
        market.profile = None;
        let fetcher = fetcher(Arc::new(market));

        let result = fetcher.fetch_profile(&ResolvedTicker::new("ZZZZ")).await;
        assert!(matches!(result, Err(ResearchError::SymbolNotFound(s)) if s == "ZZZZ"));
    }
}
