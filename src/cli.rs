//! Command-line argument parsing for data-agent.
//!
//! Uses clap to parse the `ask` and `sql` subcommands and the global flags.

use crate::config::Config;
use crate::db::ExecutionTarget;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ask questions about your data in plain language.
#[derive(Parser, Debug)]
#[command(name = "data-agent")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true, value_name = "PATH", env = "DATA_AGENT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip the hosted model and answer with rule-based SQL only
    #[arg(long, global = true)]
    pub offline: bool,

    /// Model identifier (overrides config)
    #[arg(long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Translate a question, validate the SQL and execute it
    Ask {
        /// The question, e.g. "count duplicates"
        #[arg(required = true, num_args = 1.., value_name = "QUESTION")]
        question: Vec<String>,

        /// Where to run the SQL: warehouse or relational-db
        #[arg(short, long, value_name = "TARGET", default_value = "relational-db")]
        target: ExecutionTarget,
    },
    /// Translate a question and print the SQL without executing it
    Sql {
        /// The question, e.g. "average external marks"
        #[arg(required = true, num_args = 1.., value_name = "QUESTION")]
        question: Vec<String>,

        /// SQL dialect to ask for: warehouse or relational-db
        #[arg(short, long, value_name = "TARGET", default_value = "relational-db")]
        target: ExecutionTarget,
    },
}

impl Command {
    /// Returns the question words joined with single spaces.
    pub fn question(&self) -> String {
        match self {
            Self::Ask { question, .. } | Self::Sql { question, .. } => question.join(" "),
        }
    }

    /// Returns the selected execution target.
    pub fn target(&self) -> ExecutionTarget {
        match self {
            Self::Ask { target, .. } | Self::Sql { target, .. } => *target,
        }
    }
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Applies flag overrides on top of the file and environment settings.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.model.model_id = Some(model.clone());
        }
    }
}
