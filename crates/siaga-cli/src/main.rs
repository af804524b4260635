//! Siaga CLI - Organizational risk reports
//!
//! Usage:
//!   siaga report -t tx.csv -a attendance.csv   Full risk report
//!   siaga simulate --history 2500000,2600000   What-if scenario
//!   siaga classify -t labeled.csv "beli snack" Classify text
//!   siaga config                               Show thresholds

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Report {
            transactions,
            attendance,
            members,
            as_of,
            format,
            no_ai,
            language,
        } => {
            let config = commands::load_config(config_path)?;
            commands::cmd_report(
                config,
                &commands::ReportArgs {
                    transactions,
                    attendance,
                    members,
                    as_of,
                    no_ai,
                    language,
                },
                format,
            )
            .await
        }
        Commands::Simulate {
            history,
            income_change,
            expense_change,
            one_time_income,
            one_time_cost,
            periods,
            income,
            expense,
            format,
        } => {
            let config = commands::load_config(config_path)?;
            commands::cmd_simulate(
                &config,
                &commands::SimulateArgs {
                    history,
                    income_change,
                    expense_change,
                    one_time_income,
                    one_time_cost,
                    periods,
                    income,
                    expense,
                },
                format,
            )
        }
        Commands::Classify { training, text } => commands::cmd_classify(&training, &text),
        Commands::Sentiment { text } => commands::cmd_sentiment(&text),
        Commands::Search { file, query, limit } => commands::cmd_search(&file, &query, limit),
        Commands::Config { path } => commands::cmd_config(config_path, path),
    }
}
