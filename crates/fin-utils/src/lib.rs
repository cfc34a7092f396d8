//! Shared utilities for fin-research
//!
//! This crate provides common functionality used across the workspace:
//! logging setup and environment-variable configuration helpers.

pub mod config;
pub mod logging;

pub use config::{load_dotenv, optional_env};
pub use logging::{LogFormat, init_tracing_with};
