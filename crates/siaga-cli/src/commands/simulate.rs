//! What-if scenario command

use anyhow::Result;
use siaga_core::analysis::format_rupiah;
use siaga_core::{
    simulate_scenario, simulate_scenario_with_flows, AnalysisConfig, ScenarioModifiers,
    ScenarioResult,
};

use super::parse_series;
use crate::cli::OutputFormat;

pub struct SimulateArgs {
    pub history: String,
    pub income_change: f64,
    pub expense_change: f64,
    pub one_time_income: f64,
    pub one_time_cost: f64,
    pub periods: Option<usize>,
    pub income: Option<String>,
    pub expense: Option<String>,
}

pub fn run_simulation(config: &AnalysisConfig, args: &SimulateArgs) -> Result<ScenarioResult> {
    let history = parse_series(&args.history)?;
    if history.is_empty() {
        anyhow::bail!("--history needs at least one balance");
    }

    let modifiers = ScenarioModifiers {
        income_change_percent: args.income_change,
        expense_change_percent: args.expense_change,
        one_time_income: args.one_time_income,
        one_time_cost: args.one_time_cost,
    };
    let periods = args.periods.unwrap_or(config.scenario.periods);

    let result = match (&args.income, &args.expense) {
        (Some(income), Some(expense)) => simulate_scenario_with_flows(
            &history,
            &parse_series(income)?,
            &parse_series(expense)?,
            &modifiers,
            periods,
        ),
        _ => simulate_scenario(&history, &modifiers, periods, &config.scenario),
    };
    Ok(result)
}

pub fn cmd_simulate(config: &AnalysisConfig, args: &SimulateArgs, format: OutputFormat) -> Result<()> {
    let result = run_simulation(config, args)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    println!(
        "🔮 What-if Scenario ({})",
        if result.exact { "income/expense flows" } else { "turnover estimate" }
    );
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   {:>6}  {:>18}  {:>18}", "Period", "Status quo", "Scenario");
    for (i, (base, projected)) in result.baseline.iter().zip(&result.projected).enumerate() {
        println!(
            "   {:>6}  {:>18}  {:>18}",
            i + 1,
            format_rupiah(*base),
            format_rupiah(*projected)
        );
    }
    println!();
    for insight in &result.insights {
        println!("   {}", insight);
    }
    println!();
    Ok(())
}
