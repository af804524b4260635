//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Siaga - Organizational risk and insight reports
#[derive(Parser)]
#[command(name = "siaga")]
#[command(about = "Fraud, compliance and financial risk reports for small organizations", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Analysis config file (defaults to the user config, then built-in thresholds)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a full risk report from record files
    Report {
        /// Transactions file (.json array or .csv)
        #[arg(short, long)]
        transactions: Option<PathBuf>,

        /// Attendance file (.json array or .csv)
        #[arg(short, long)]
        attendance: Option<PathBuf>,

        /// Active member count (defaults to members seen in the records)
        #[arg(short, long)]
        members: Option<usize>,

        /// Report date, YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS (defaults to the latest record)
        #[arg(long)]
        as_of: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Skip AI narrative enrichment even if AI_BACKEND / OLLAMA_HOST are set
        #[arg(long)]
        no_ai: bool,

        /// Language for AI-generated text
        #[arg(long, default_value = "English")]
        language: String,
    },

    /// Run a what-if scenario over a balance history
    Simulate {
        /// Monthly balances, comma-separated (e.g. 2500000,2600000,2550000)
        #[arg(long)]
        history: String,

        /// Income change in percent
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        income_change: f64,

        /// Expense change in percent
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        expense_change: f64,

        /// One-time income added at the start
        #[arg(long, default_value = "0")]
        one_time_income: f64,

        /// One-time cost paid at the start
        #[arg(long, default_value = "0")]
        one_time_cost: f64,

        /// Number of periods to project (defaults to the config value)
        #[arg(short, long)]
        periods: Option<usize>,

        /// Monthly income history, comma-separated (enables exact simulation with --expense)
        #[arg(long, requires = "expense")]
        income: Option<String>,

        /// Monthly expense history, comma-separated
        #[arg(long, requires = "income")]
        expense: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Train a Naive Bayes classifier on labeled examples and classify text
    Classify {
        /// Labeled examples with `text` and `label` fields (.json array or .csv)
        #[arg(short, long)]
        training: PathBuf,

        /// Text to classify
        text: String,
    },

    /// Score the sentiment of a piece of text
    Sentiment {
        /// Text to score
        text: String,
    },

    /// Rank lines of a text file by TF-IDF similarity to a query
    Search {
        /// Text file, one document per line
        #[arg(short, long)]
        file: PathBuf,

        /// Search query
        query: String,

        /// Maximum results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Print the effective analysis configuration
    Config {
        /// Print the user config path instead
        #[arg(long)]
        path: bool,
    },
}
