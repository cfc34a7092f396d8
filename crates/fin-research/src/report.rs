//! The Markdown research report

use crate::error::StageError;
use crate::model::{
    CompanyProfile, FinancialAnalysis, Narrative, NewsSentimentSummary, PriceSummary, RatioReport,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{self, Write as _};

/// Section titles, in report order
pub const SECTION_TITLES: [&str; 5] = [
    "1. Company Overview",
    "2. Financial Highlights & Key Ratios",
    "3. Recent Stock Performance (1-Year)",
    "4. Recent News & Sentiment",
    "5. Concluding Summary",
];

/// Body of one report section
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionBody {
    Content { markdown: String },
    Unavailable { reason: String },
}

impl SectionBody {
    pub fn content(markdown: impl Into<String>) -> Self {
        SectionBody::Content {
            markdown: markdown.into(),
        }
    }

    pub fn unavailable(reason: impl fmt::Display) -> Self {
        SectionBody::Unavailable {
            reason: reason.to_string(),
        }
    }

    /// Content from a stage result; a failed stage becomes an unavailable notice
    pub fn from_stage<T>(
        outcome: &std::result::Result<T, StageError>,
        render: impl FnOnce(&T) -> String,
    ) -> Self {
        match outcome {
            Ok(value) => Self::content(render(value)),
            Err(err) => Self::unavailable(&err.source),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, SectionBody::Content { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub title: String,
    pub body: SectionBody,
}

/// A finished report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub symbol: String,
    pub company: String,
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<ReportSection>,
}

impl ReportDocument {
    pub fn section(&self, title: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.title == title)
    }

    /// Render the whole document as Markdown
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {} ({}) Research Report", self.company, self.symbol);
        let _ = writeln!(
            out,
            "\n_Generated {}_",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        );

        for section in &self.sections {
            let _ = writeln!(out, "\n## {}\n", section.title);
            match &section.body {
                SectionBody::Content { markdown } => {
                    let _ = writeln!(out, "{}", markdown.trim_end());
                }
                SectionBody::Unavailable { reason } => {
                    let _ = writeln!(out, "_This section is unavailable: {reason}_");
                }
            }
        }

        out
    }
}

impl fmt::Display for ReportDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markdown())
    }
}

/// Compact money formatting, e.g. "$383.29B"
pub fn format_amount(value: f64) -> String {
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    let (scaled, suffix) = if abs >= 1e12 {
        (abs / 1e12, "T")
    } else if abs >= 1e9 {
        (abs / 1e9, "B")
    } else if abs >= 1e6 {
        (abs / 1e6, "M")
    } else if abs >= 1e3 {
        (abs / 1e3, "K")
    } else {
        (abs, "")
    };
    format!("{sign}${scaled:.2}{suffix}")
}

/// Ratio lines in display order, shared by the report and the narrative prompt
pub fn ratio_lines(ratios: &RatioReport) -> Vec<(&'static str, String)> {
    vec![
        ("Gross margin", ratios.gross_margin.as_percent()),
        ("Net margin", ratios.net_margin.as_percent()),
        ("Debt to equity", ratios.debt_to_equity.to_string()),
        ("Current ratio", ratios.current_ratio.to_string()),
    ]
}

pub fn render_profile(profile: &CompanyProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "- **Name:** {}", profile.long_name);
    let _ = writeln!(out, "- **Symbol:** {}", profile.symbol);
    let _ = writeln!(out, "- **Exchange:** {}", profile.exchange);
    let _ = writeln!(out, "- **Sector:** {}", profile.sector);
    let _ = writeln!(out, "- **Industry:** {}", profile.industry);
    let _ = writeln!(out, "- **Country:** {}", profile.country);
    let _ = writeln!(out, "- **Employees:** {}", profile.full_time_employees);
    let _ = writeln!(out, "- **Website:** {}", profile.website);
    let _ = writeln!(out, "\n{}", profile.summary_text);
    out
}

pub fn render_financials(analysis: &FinancialAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Fiscal year ending {}.\n", analysis.period);

    let _ = writeln!(out, "| Ratio | Value |");
    let _ = writeln!(out, "|---|---|");
    for (label, value) in ratio_lines(&analysis.ratios) {
        let _ = writeln!(out, "| {label} | {value} |");
    }

    if !analysis.key_figures.is_empty() {
        out.push('\n');
        for figure in &analysis.key_figures {
            let _ = writeln!(out, "- **{}:** {}", figure.label, format_amount(figure.value));
        }
    }

    match &analysis.narrative {
        Narrative::Written { text } => {
            let _ = writeln!(out, "\n{text}");
        }
        Narrative::Unavailable { reason } => {
            let _ = writeln!(out, "\n_Narrative unavailable: {reason}_");
        }
    }
    out
}

pub fn render_price_summary(summary: &PriceSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Daily closes from {} to {} ({} trading days).\n",
        summary.start_date, summary.end_date, summary.points
    );
    let _ = writeln!(out, "- **Latest close:** {:.2}", summary.latest_close);
    let _ = writeln!(out, "- **Period high:** {:.2}", summary.period_high);
    let _ = writeln!(out, "- **Period low:** {:.2}", summary.period_low);
    let _ = writeln!(
        out,
        "- **Change over period:** {:+.2}% (from {:.2})",
        summary.percent_change, summary.earliest_close
    );
    out
}

pub fn render_sentiment(summary: &NewsSentimentSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "**Overall sentiment:** {}",
        summary.overall_sentiment
    );

    if summary.supporting_snippets.is_empty() {
        let _ = writeln!(out, "\nNo recent news found.");
    } else {
        out.push('\n');
        for snippet in &summary.supporting_snippets {
            let _ = writeln!(out, "- {snippet}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ResearchError, Stage};
    use crate::model::{Metric, Sentiment};

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(383_285_000_000.0), "$383.29B");
        assert_eq!(format_amount(-2_500_000.0), "-$2.50M");
        assert_eq!(format_amount(3.1e12), "$3.10T");
        assert_eq!(format_amount(950.0), "$950.00");
    }

    #[test]
    fn test_section_from_failed_stage() {
        let outcome: std::result::Result<PriceSummary, StageError> = Err(StageError::new(
            Stage::PriceHistory,
            ResearchError::InsufficientData {
                symbol: "NEWCO".to_string(),
                points: 1,
            },
        ));

        let body = SectionBody::from_stage(&outcome, render_price_summary);
        match body {
            SectionBody::Unavailable { reason } => assert!(reason.contains("NEWCO")),
            other => panic!("Expected unavailable section, got {other:?}"),
        }
    }

    #[test]
    fn test_financials_without_narrative_keeps_ratios() {
        let analysis = FinancialAnalysis {
            statements: crate::model::FinancialStatementSet::default(),
            period: "2023-09-30".to_string(),
            ratios: RatioReport {
                gross_margin: Metric::Value(0.45),
                net_margin: Metric::Value(0.25),
                debt_to_equity: Metric::Unavailable,
                current_ratio: Metric::Value(1.25),
            },
            key_figures: Vec::new(),
            narrative: Narrative::Unavailable {
                reason: "language model unavailable: HTTP 503".to_string(),
            },
        };

        let markdown = render_financials(&analysis);
        assert!(markdown.contains("| Gross margin | 45.00% |"));
        assert!(markdown.contains("| Debt to equity | unavailable |"));
        assert!(markdown.contains("_Narrative unavailable: language model unavailable: HTTP 503_"));
    }

    #[test]
    fn test_markdown_keeps_unavailable_sections() {
        let report = ReportDocument {
            symbol: "AAPL".to_string(),
            company: "Apple Inc".to_string(),
            generated_at: Utc::now(),
            sections: vec![
                ReportSection {
                    title: SECTION_TITLES[3].to_string(),
                    body: SectionBody::content(render_sentiment(&NewsSentimentSummary::empty())),
                },
                ReportSection {
                    title: SECTION_TITLES[4].to_string(),
                    body: SectionBody::unavailable("language model unavailable: timeout"),
                },
            ],
        };

        let markdown = report.to_markdown();
        assert!(markdown.starts_with("# Apple Inc (AAPL) Research Report"));
        assert!(markdown.contains("## 4. Recent News & Sentiment"));
        assert!(markdown.contains(&format!("**Overall sentiment:** {}", Sentiment::Neutral)));
        assert!(markdown.contains("## 5. Concluding Summary"));
        assert!(markdown.contains("_This section is unavailable: language model unavailable: timeout_"));
    }
}
