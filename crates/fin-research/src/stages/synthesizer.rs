//! Report synthesis: merge stage outputs into one document

use crate::error::StageResult;
use crate::model::{
    CompanyProfile, FinancialAnalysis, NewsSentimentSummary, PriceSummary, ResolvedTicker,
};
use crate::narrative::{NarrativeGenerator, NarrativeRequest};
use crate::report::{
    ReportDocument, ReportSection, SECTION_TITLES, SectionBody, render_financials,
    render_price_summary, render_profile, render_sentiment,
};
use chrono::Utc;
use std::fmt::Write as _;
use std::sync::Arc;

/// Everything the synthesizer reads; it retrieves nothing itself
#[derive(Debug)]
pub struct ReportInputs<'a> {
    pub ticker: &'a ResolvedTicker,
    pub profile: &'a StageResult<CompanyProfile>,
    pub financials: &'a StageResult<FinancialAnalysis>,
    pub price_summary: &'a StageResult<PriceSummary>,
    pub sentiment: &'a StageResult<NewsSentimentSummary>,
}

pub struct ReportSynthesizer {
    narrator: Arc<dyn NarrativeGenerator>,
}

impl ReportSynthesizer {
    pub fn new(narrator: Arc<dyn NarrativeGenerator>) -> Self {
        Self { narrator }
    }

    /// Build the report in fixed section order
    ///
    /// Failed stages appear as unavailable notices. A failed closing summary
    /// is also reported in place rather than failing the report.
    pub async fn synthesize(&self, inputs: ReportInputs<'_>) -> ReportDocument {
        let symbol = inputs.ticker.symbol.clone();
        let company = match inputs.profile {
            Ok(profile) => profile.display_name().to_string(),
            Err(_) => symbol.clone(),
        };

        let bodies = [
            SectionBody::from_stage(inputs.profile, render_profile),
            SectionBody::from_stage(inputs.financials, render_financials),
            SectionBody::from_stage(inputs.price_summary, render_price_summary),
            SectionBody::from_stage(inputs.sentiment, render_sentiment),
        ];

        let mut sections: Vec<ReportSection> = SECTION_TITLES
            .iter()
            .zip(bodies)
            .map(|(title, body)| ReportSection {
                title: (*title).to_string(),
                body,
            })
            .collect();

        let request = NarrativeRequest::ClosingSummary {
            company: company.clone(),
            symbol: symbol.clone(),
            findings: findings_text(&sections),
        };

        let closing = match self.narrator.generate(&request).await {
            Ok(text) => SectionBody::content(text),
            Err(e) => {
                tracing::warn!("Closing summary unavailable: {}", e);
                SectionBody::unavailable(e)
            }
        };

        sections.push(ReportSection {
            title: SECTION_TITLES[4].to_string(),
            body: closing,
        });

        ReportDocument {
            symbol,
            company,
            generated_at: Utc::now(),
            sections,
        }
    }
}

/// Plain-text digest of the sections, fed to the closing summary
fn findings_text(sections: &[ReportSection]) -> String {
    let mut out = String::new();
    for section in sections {
        let _ = writeln!(out, "## {}", section.title);
        match &section.body {
            SectionBody::Content { markdown } => {
                let _ = writeln!(out, "{}\n", markdown.trim_end());
            }
            SectionBody::Unavailable { reason } => {
                let _ = writeln!(out, "Unavailable: {reason}\n");
            }
        }
    }
    out
}
