//! data-agent - natural-language questions to SQL, executed against a
//! warehouse or a relational database.
//!
//! This library exposes the core modules for use by the binary and in
//! integration tests.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod query;
pub mod safety;
