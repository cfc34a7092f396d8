//! Narrative generation
//!
//! Stages describe what they need written as a [`NarrativeRequest`]; the
//! [`NarrativeGenerator`] turns it into prose. [`LlmNarrator`] is the
//! language-model implementation.

use crate::config::ResearchConfig;
use crate::error::{Result, ResearchError};
use crate::prompts;
use async_trait::async_trait;
use fin_llm::{CompletionRequest, LLMProvider, Message};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// Structured input for one piece of generated text
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NarrativeRequest {
    /// Prose explanation of ratios and headline figures
    FinancialSummary {
        company: String,
        symbol: String,
        period: String,
        /// Pre-formatted lines such as "Net margin: 25.31%"
        figures: Vec<String>,
    },
    /// One-word sentiment label for a set of news snippets
    NewsSentiment {
        company: String,
        snippets: Vec<String>,
    },
    /// Bullet-point conclusion over the rendered report sections
    ClosingSummary {
        company: String,
        symbol: String,
        findings: String,
    },
}

impl NarrativeRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            NarrativeRequest::FinancialSummary { .. } => "financial_summary",
            NarrativeRequest::NewsSentiment { .. } => "news_sentiment",
            NarrativeRequest::ClosingSummary { .. } => "closing_summary",
        }
    }
}

/// Produces text for a structured request
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String>;
}

/// Narrative generator backed by an [`LLMProvider`]
pub struct LlmNarrator {
    provider: Arc<dyn LLMProvider>,
    model: String,
    max_tokens: usize,
    temperature: f32,
}

impl LlmNarrator {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ResearchConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    fn completion_request(&self, request: &NarrativeRequest) -> Result<CompletionRequest> {
        let (system, template, max_tokens) = match request {
            NarrativeRequest::FinancialSummary { .. } => (
                prompts::FINANCIAL_ANALYST_SYSTEM,
                prompts::FINANCIAL_SUMMARY,
                self.max_tokens,
            ),
            // A single label needs very few tokens
            NarrativeRequest::NewsSentiment { .. } => (
                prompts::SENTIMENT_CLASSIFIER_SYSTEM,
                prompts::SENTIMENT_CLASSIFY,
                16,
            ),
            NarrativeRequest::ClosingSummary { .. } => (
                prompts::REPORT_WRITER_SYSTEM,
                prompts::CLOSING_SUMMARY,
                self.max_tokens,
            ),
        };

        let prompt = prompts::render(request.kind(), template, request)?;

        let temperature = match request {
            NarrativeRequest::NewsSentiment { .. } => 0.0,
            _ => self.temperature,
        };

        let builder = CompletionRequest::builder(&self.model)
            .system(system)
            .add_message(Message::user(prompt))
            .max_tokens(max_tokens)
            .temperature(temperature);

        // The classifier answers with one label on one line
        let builder = match request {
            NarrativeRequest::NewsSentiment { .. } => builder.stop_sequences(vec!["\n".to_string()]),
            _ => builder,
        };

        Ok(builder.build())
    }
}

impl std::fmt::Debug for LlmNarrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmNarrator")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl NarrativeGenerator for LlmNarrator {
    #[instrument(skip(self, request), fields(kind = request.kind(), provider = self.provider.name()))]
    async fn generate(&self, request: &NarrativeRequest) -> Result<String> {
        let completion = self.completion_request(request)?;

        tracing::debug!("Requesting narrative");

        let response = self.provider.complete(completion).await?;
        let text = response.text().trim().to_string();

        if text.is_empty() {
            return Err(ResearchError::parse("language model", "empty completion"));
        }

        tracing::debug!(
            tokens = response.usage.total(),
            "Narrative generated"
        );

        Ok(text)
    }
}
