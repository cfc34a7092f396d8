//! Pipeline stages
//!
//! Each stage is a small struct holding the providers it needs. Stages run
//! strictly in sequence, each taking the previous stage's typed output.

mod financials;
mod history;
mod news;
mod profile;
mod resolver;
mod synthesizer;

pub use financials::{FinancialAnalyzer, compute_ratios};
pub use history::{PriceHistorySummarizer, summarize_closes};
pub use news::{NewsGatherer, format_snippet};
pub use profile::ProfileFetcher;
pub use resolver::{Disambiguation, Resolution, TickerResolver};
pub use synthesizer::{ReportInputs, ReportSynthesizer};
