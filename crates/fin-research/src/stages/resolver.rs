//! Ticker resolution: free text to a single symbol

use crate::api::SymbolSearch;
use crate::cache::{CacheKey, TtlCache};
use crate::error::{Result, ResearchError};
use crate::model::{ResolvedTicker, TickerCandidate, rank_candidates};
use std::sync::Arc;

/// Outcome of resolving a query that matched at least one ticker
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(ResolvedTicker),
    NeedsDisambiguation(Disambiguation),
}

/// Several plausible tickers, awaiting a choice from outside the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Disambiguation {
    query: String,
    candidates: Vec<TickerCandidate>,
}

impl Disambiguation {
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Candidates ordered by score descending, then symbol
    pub fn candidates(&self) -> &[TickerCandidate] {
        &self.candidates
    }

    /// Choose a candidate by its 1-based position
    pub fn select(&self, index: usize) -> Result<ResolvedTicker> {
        index
            .checked_sub(1)
            .and_then(|i| self.candidates.get(i))
            .map(|c| ResolvedTicker::new(&c.symbol))
            .ok_or_else(|| {
                ResearchError::InvalidInput(format!(
                    "selection {index} is out of range 1..={}",
                    self.candidates.len()
                ))
            })
    }
}

/// Resolves free-text company names or symbols to a ticker
pub struct TickerResolver {
    search: Arc<dyn SymbolSearch>,
    cache: TtlCache,
}

impl TickerResolver {
    pub fn new(search: Arc<dyn SymbolSearch>, cache: TtlCache) -> Self {
        Self { search, cache }
    }

    /// Resolve a query
    ///
    /// A query equal to a returned symbol (ignoring case) resolves to it
    /// directly, as does a single candidate. No candidates is `NotFound`.
    pub async fn resolve(&self, query: &str) -> Result<Resolution> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ResearchError::InvalidInput(
                "query must not be empty".to_string(),
            ));
        }

        let raw: Vec<TickerCandidate> = self
            .cache
            .get_or_fetch(CacheKey::new("symbol_search", query), || {
                self.search.search(query)
            })
            .await?;

        if let Some(exact) = raw.iter().find(|c| c.symbol.eq_ignore_ascii_case(query)) {
            tracing::debug!("Query matches symbol {} exactly", exact.symbol);
            return Ok(Resolution::Resolved(ResolvedTicker::new(&exact.symbol)));
        }

        let mut ranked = rank_candidates(raw);

        match ranked.len() {
            0 => Err(ResearchError::NotFound {
                query: query.to_string(),
            }),
            1 => {
                let only = ranked.remove(0);
                Ok(Resolution::Resolved(ResolvedTicker::new(only.symbol)))
            }
            n => {
                tracing::info!("{} candidates for '{}', awaiting selection", n, query);
                Ok(Resolution::NeedsDisambiguation(Disambiguation {
                    query: query.to_string(),
                    candidates: ranked,
                }))
            }
        }
    }
}
