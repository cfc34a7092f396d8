//! Company research report pipeline
//!
//! This crate turns a company name or ticker into a Markdown research report
//! through a fixed sequence of stages:
//!
//! - Ticker resolution, with disambiguation when a name matches several listings
//! - Company profile lookup
//! - Annual financial statements, standard ratios and a written analysis
//! - One-year price history summary
//! - Recent news and its overall sentiment
//! - Report synthesis with a closing summary
//!
//! # Architecture
//!
//! Providers sit behind traits (`SymbolSearch`, `MarketData`, `NewsSearch`,
//! `NarrativeGenerator`). Live implementations use Alpha Vantage, Yahoo
//! Finance, Serper and a language model from `fin-llm`. Provider responses are
//! cached in memory for a fixed TTL.
//!
//! # Example
//!
//! ```rust,ignore
//! use fin_llm::providers::GeminiProvider;
//! use fin_research::{PipelineStart, ReportPipeline, ResearchConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ResearchConfig::from_env()?;
//!     let llm = Arc::new(GeminiProvider::new(config.gemini_api_key.clone().unwrap_or_default())?);
//!     let pipeline = ReportPipeline::from_config(&config, llm)?;
//!
//!     let ticker = match pipeline.begin("Apple").await? {
//!         PipelineStart::Ready(ticker) => ticker,
//!         PipelineStart::AwaitingSelection(choice) => choice.select(1)?,
//!     };
//!
//!     let report = pipeline.run(&ticker).await?;
//!     println!("{}", report.to_markdown());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod narrative;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod stages;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use cache::{CacheKey, CacheManager, Clock, ManualClock, SystemClock, TtlCache};
pub use config::ResearchConfig;
pub use error::{Result, ResearchError, Stage, StageError, StageResult};
pub use model::{
    CompanyProfile, FinancialAnalysis, Metric, NewsSentimentSummary, PriceSummary, RatioReport,
    ResolvedTicker, Sentiment, TickerCandidate,
};
pub use narrative::{LlmNarrator, NarrativeGenerator, NarrativeRequest};
pub use pipeline::{PipelineStart, Providers, ReportPipeline};
pub use report::ReportDocument;
pub use stages::Disambiguation;
