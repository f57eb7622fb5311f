//! Run orchestration for DiffGraph
//!
//! Feeds discovered changes into the graph store, analyses one file at a
//! time through the configured provider, links the reported components and
//! renders the result.

pub mod pipeline;


pub use pipeline::{AnalysisPipeline, PipelineOptions, RunOutcome};
