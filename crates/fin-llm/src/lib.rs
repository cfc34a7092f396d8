//! Language-model provider layer for fin-research
//!
//! This crate provides a provider-agnostic way to ask a large language model
//! for text. It includes:
//!
//! - Message types for plain-text conversations
//! - Completion request/response types
//! - The `LLMProvider` trait implemented by concrete backends
//! - A Gemini implementation (behind the `gemini` feature)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use provider::LLMProvider;

// Provider implementations (feature-gated)
#[cfg(feature = "gemini")]
pub mod providers;
