//! Prompt templates for narrative generation
//!
//! Templates use Jinja2 syntax and are rendered with MiniJinja against a
//! serializable context.

use crate::error::{Result, ResearchError};
use minijinja::Environment;
use minijinja::value::Value;
use serde::Serialize;

/// System prompt for the financial narrative
pub const FINANCIAL_ANALYST_SYSTEM: &str = r"You are a meticulous financial analyst.

You explain a company's financial position to an informed reader using only the figures you are given.
Do not invent numbers. If a ratio is marked unavailable, say so briefly and move on.
Write in plain prose without headings.";

/// Financial narrative request
pub const FINANCIAL_SUMMARY: &str = r"Write a short analysis (two or three paragraphs) of the financial health of {{ company }} ({{ symbol }}) for the fiscal year ending {{ period }}.

Figures:
{% for figure in figures %}- {{ figure }}
{% endfor %}
Cover profitability, leverage and liquidity.";

/// System prompt for sentiment classification
pub const SENTIMENT_CLASSIFIER_SYSTEM: &str = r"You classify the overall tone of news coverage about a company.

Answer with exactly one word: positive, neutral or negative.";

/// Sentiment classification request
pub const SENTIMENT_CLASSIFY: &str = r"What is the overall sentiment of these recent news items about {{ company }}?

{% for snippet in snippets %}{{ loop.index }}. {{ snippet }}
{% endfor %}
Answer with one word: positive, neutral or negative.";

/// System prompt for the closing summary
pub const REPORT_WRITER_SYSTEM: &str = r"You are a financial report writer.

You condense research findings into a short conclusion for investors.
Use only the findings provided. Do not give buy or sell advice.";

/// Closing summary request
pub const CLOSING_SUMMARY: &str = r"Below are research findings for {{ company }} ({{ symbol }}).

{{ findings }}

Write a concluding summary of 3 to 5 Markdown bullet points (each starting with '- ') covering the most important takeaways. Some sections may be marked unavailable; mention the gap only if it matters.";

/// Render a template against a serializable context
pub fn render<C: Serialize>(name: &str, template: &str, context: &C) -> Result<String> {
    let env = Environment::new();
    let value = Value::from_serialize(context);

    env.render_str(template, value)
        .map_err(|e| ResearchError::parse("prompt template", format!("{name}: {e}")))
}
