//! Report command implementation

use std::path::PathBuf;

use anyhow::Result;
use siaga_core::analysis::format_rupiah;
use siaga_core::{AIClient, AnalysisConfig, ReportGenerator, ReportInput, RiskReport};

use super::{load_attendance, load_transactions, resolve_as_of, truncate};
use crate::cli::OutputFormat;

pub struct ReportArgs {
    pub transactions: Option<PathBuf>,
    pub attendance: Option<PathBuf>,
    pub members: Option<usize>,
    pub as_of: Option<String>,
    pub no_ai: bool,
    pub language: String,
}

/// Load records and generate the report
pub async fn generate_report(config: AnalysisConfig, args: &ReportArgs) -> Result<RiskReport> {
    let transactions = load_transactions(args.transactions.as_deref())?;
    let attendance = load_attendance(args.attendance.as_deref())?;
    let as_of = resolve_as_of(args.as_of.as_deref(), &transactions, &attendance)?;

    let mut input = ReportInput::new(&transactions, &attendance, as_of);
    if let Some(count) = args.members {
        input = input.with_member_count(count);
    }

    let mut generator = ReportGenerator::new(config).with_language(args.language.clone());
    if !args.no_ai {
        if let Some(ai) = AIClient::from_env() {
            generator = generator.with_ai(ai);
        }
    }

    Ok(generator.generate(&input).await)
}

pub async fn cmd_report(config: AnalysisConfig, args: &ReportArgs, format: OutputFormat) -> Result<()> {
    let report = generate_report(config, args).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &RiskReport) {
    let risk = &report.risk_score;

    println!();
    println!("📊 Risk Report as of {}", report.as_of.format("%Y-%m-%d"));
    println!(
        "   {} transactions, {} attendance records, {} members",
        report.counts.transactions, report.counts.attendance_records, report.counts.members
    );
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Overall risk:  {:>3.0}/100 ({})", risk.overall, risk.trend);
    println!("   Financial:     {:>3.0}  {}", risk.financial, risk.details.financial);
    println!("   Compliance:    {:>3.0}  {}", risk.compliance, risk.details.compliance);
    println!("   Operational:   {:>3.0}  {}", risk.operational, risk.details.operational);

    if !report.alerts.is_empty() {
        println!();
        println!("🚨 Alerts");
        for alert in &report.alerts {
            println!("   [{}] {}", alert.severity.as_str().to_uppercase(), alert.title);
            println!("      {}", truncate(&alert.message, 100));
        }
    }

    if !report.fraud_indicators.is_empty() {
        println!();
        println!("🔍 Flagged Transactions");
        for indicator in report.fraud_indicators.iter().take(10) {
            println!(
                "   {:>3}  {:<12} {:>16}  {}",
                indicator.risk_score,
                truncate(&indicator.transaction_id, 12),
                format_rupiah(indicator.amount),
                truncate(&indicator.signals.join("; "), 60)
            );
        }
        if report.fraud_indicators.len() > 10 {
            println!("   ... and {} more", report.fraud_indicators.len() - 10);
        }
    }

    let flagged: Vec<_> = report
        .compliance
        .iter()
        .filter(|c| !c.issues.is_empty())
        .collect();
    if !flagged.is_empty() {
        println!();
        println!("📋 Attendance Compliance");
        for status in flagged {
            println!(
                "   {:<16} {:>5.1}%  {}",
                truncate(status.member_name.as_deref().unwrap_or(&status.member_id), 16),
                status.attendance_rate * 100.0,
                status.status
            );
            for issue in &status.issues {
                println!("      - {}", issue);
            }
        }
    }

    let forecast = &report.financial_forecast;
    println!();
    println!("📈 Cash Flow Outlook");
    for insight in &forecast.insights {
        println!("   {}", insight);
    }
    if forecast.is_sufficient() {
        let projected: Vec<String> = forecast.forecast.iter().map(|v| format_rupiah(*v)).collect();
        println!("   Next months: {}", projected.join(", "));
        println!("   Confidence: {:.0}%", forecast.confidence * 100.0);
        println!("   Action plan:");
        for (i, step) in forecast.action_plan.iter().enumerate() {
            println!("      {}. {}", i + 1, step);
        }
    }

    if !report.habit_insights.is_empty() {
        println!();
        println!("💡 Habits");
        for insight in &report.habit_insights {
            println!("   {} ({})", insight.title, insight.metric);
            println!("      {}", insight.description);
        }
    }

    println!();
    println!("✅ Recommendations");
    for rec in &report.recommendations {
        println!("   - {}", rec);
    }
    println!();
    println!("💰 {}", report.budget_suggestion);
    if report.ai_enriched {
        println!("   (narrative enriched by AI)");
    }
    println!();
}
