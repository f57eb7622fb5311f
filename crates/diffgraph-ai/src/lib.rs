//! Per-file change analysis for DiffGraph
//!
//! This crate defines the analysis contract the pipeline calls for every
//! changed file, the providers that fulfil it (an OpenAI chat model or an
//! offline heuristic scanner), and the retry and budget machinery around
//! the call boundary.

pub mod bridge;
pub mod budget;
pub mod error;
pub mod parse;
pub mod prompt;
pub mod providers;
pub mod retry;

#[cfg(test)]
pub mod tests;

pub use bridge::*;
pub use budget::{Budget, BudgetWarning};
pub use error::AnalysisError;
pub use providers::{ProviderOptions, create_provider};
pub use retry::{RetryPolicy, RetryingProvider};
