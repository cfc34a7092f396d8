//! The research pipeline: resolve, gather, synthesize
//!
//! A run starts with [`ReportPipeline::begin`]. An ambiguous query yields
//! [`PipelineStart::AwaitingSelection`]; the caller picks a candidate and
//! passes the resulting ticker to [`ReportPipeline::run`]. Nothing times out
//! while a selection is pending.

use crate::api::{
    AlphaVantageClient, MarketData, NewsSearch, ProviderMarketData, SerperClient, SymbolSearch,
};
use crate::cache::CacheManager;
use crate::config::ResearchConfig;
use crate::error::{ResearchError, Stage, StageContext, StageError, StageResult};
use crate::model::ResolvedTicker;
use crate::narrative::{LlmNarrator, NarrativeGenerator};
use crate::report::ReportDocument;
use crate::stages::{
    Disambiguation, FinancialAnalyzer, NewsGatherer, PriceHistorySummarizer, ProfileFetcher,
    ReportInputs, ReportSynthesizer, Resolution, TickerResolver,
};
use fin_llm::LLMProvider;
use std::sync::Arc;
use tracing::Instrument;

/// Where a run stands after ticker resolution
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStart {
    /// A single ticker; call [`ReportPipeline::run`]
    Ready(ResolvedTicker),
    /// Several candidates; select one and call [`ReportPipeline::run`]
    AwaitingSelection(Disambiguation),
}

/// External services a pipeline talks to
pub struct Providers {
    pub search: Arc<dyn SymbolSearch>,
    pub market: Arc<dyn MarketData>,
    pub news: Arc<dyn NewsSearch>,
    pub narrator: Arc<dyn NarrativeGenerator>,
}

impl Providers {
    /// Live providers: Alpha Vantage, Yahoo Finance, Serper and the given language model
    pub fn live(config: &ResearchConfig, llm: Arc<dyn LLMProvider>) -> Result<Self, ResearchError> {
        config.validate()?;

        Ok(Self {
            search: Arc::new(AlphaVantageClient::from_config(config)?),
            market: Arc::new(ProviderMarketData::from_config(config)?),
            news: Arc::new(SerperClient::from_config(config)?),
            narrator: Arc::new(LlmNarrator::new(llm, config)),
        })
    }
}

/// Sequential report pipeline
pub struct ReportPipeline {
    resolver: TickerResolver,
    profiles: ProfileFetcher,
    financials: FinancialAnalyzer,
    history: PriceHistorySummarizer,
    news: NewsGatherer,
    synthesizer: ReportSynthesizer,
    caches: CacheManager,
}

impl ReportPipeline {
    /// Assemble the stages over the given providers and caches
    pub fn new(config: &ResearchConfig, providers: Providers, caches: CacheManager) -> Self {
        let Providers {
            search,
            market,
            news,
            narrator,
        } = providers;

        Self {
            resolver: TickerResolver::new(search, caches.search.clone()),
            profiles: ProfileFetcher::new(Arc::clone(&market), caches.market.clone()),
            financials: FinancialAnalyzer::new(
                Arc::clone(&market),
                caches.market.clone(),
                Arc::clone(&narrator),
            ),
            history: PriceHistorySummarizer::new(market, caches.market.clone(), config.history_days),
            news: NewsGatherer::new(
                news,
                caches.news.clone(),
                Arc::clone(&narrator),
                config.news_max_results,
                config.snippet_max_chars,
            ),
            synthesizer: ReportSynthesizer::new(narrator),
            caches,
        }
    }

    /// Pipeline over live providers with system-clock caches
    pub fn from_config(
        config: &ResearchConfig,
        llm: Arc<dyn LLMProvider>,
    ) -> Result<Self, ResearchError> {
        let providers = Providers::live(config, llm)?;
        Ok(Self::new(config, providers, CacheManager::with_system_clock(config)))
    }

    pub fn caches(&self) -> &CacheManager {
        &self.caches
    }

    /// Resolve the query to a ticker or a pending choice
    pub async fn begin(&self, query: &str) -> StageResult<PipelineStart> {
        tracing::info!("Resolving ticker for '{}'", query.trim());

        let resolution = self
            .resolver
            .resolve(query)
            .await
            .stage(Stage::TickerResolution)?;

        Ok(match resolution {
            Resolution::Resolved(ticker) => PipelineStart::Ready(ticker),
            Resolution::NeedsDisambiguation(choice) => PipelineStart::AwaitingSelection(choice),
        })
    }

    /// Run every stage after resolution and build the report
    ///
    /// Only an unknown symbol at the profile stage halts the run. Other
    /// stage failures become unavailable sections.
    pub async fn run(&self, ticker: &ResolvedTicker) -> StageResult<ReportDocument> {
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("research_run", %run_id, symbol = %ticker.symbol);

        async move {
            tracing::info!("Fetching company profile");
            let profile = match self.profiles.fetch_profile(ticker).await {
                Err(e @ ResearchError::SymbolNotFound(_)) => {
                    return Err(StageError::new(Stage::CompanyProfile, e));
                }
                other => other.stage(Stage::CompanyProfile),
            };
            warn_if_failed(&profile);

            let company = match &profile {
                Ok(p) => p.display_name().to_string(),
                Err(_) => ticker.symbol.clone(),
            };

            tracing::info!("Analyzing financial statements");
            let financials = self
                .financials
                .analyze_financials(ticker, &company)
                .await
                .stage(Stage::FinancialAnalysis);
            warn_if_failed(&financials);

            tracing::info!("Summarizing price history");
            let price_summary = self
                .history
                .summarize_history(ticker)
                .await
                .stage(Stage::PriceHistory);
            warn_if_failed(&price_summary);

            tracing::info!("Gathering news sentiment");
            let sentiment = self
                .news
                .gather_sentiment(&company)
                .await
                .stage(Stage::NewsSentiment);
            warn_if_failed(&sentiment);

            tracing::info!("Synthesizing report");
            let report = self
                .synthesizer
                .synthesize(ReportInputs {
                    ticker,
                    profile: &profile,
                    financials: &financials,
                    price_summary: &price_summary,
                    sentiment: &sentiment,
                })
                .await;

            tracing::info!("Report complete");
            Ok(report)
        }
        .instrument(span)
        .await
    }
}

fn warn_if_failed<T>(outcome: &StageResult<T>) {
    if let Err(e) = outcome {
        tracing::warn!("{}; section will be marked unavailable", e);
    }
}
