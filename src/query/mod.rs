//! Translation, validation and execution for data-agent.
//!
//! This module isolates the question-to-rows flow from the command-line
//! surface so it can be tested independently.

pub mod executor;
pub mod pipeline;
pub mod translator;

pub use executor::SqlExecutor;
pub use pipeline::{ExecutionResult, QueryPipeline};
pub use translator::Translator;
