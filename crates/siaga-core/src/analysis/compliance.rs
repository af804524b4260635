//! Attendance compliance over a trailing window

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};

use crate::config::ComplianceConfig;
use crate::models::{AttendanceRecord, AttendanceStatus};

use super::types::{ComplianceLevel, ComplianceStatus};

/// Per-member compliance for records in (as_of - window, as_of]
///
/// Sorted non_compliant, warning, compliant; then by rate ascending.
pub fn monitor_compliance(
    records: &[AttendanceRecord],
    as_of: NaiveDateTime,
    config: &ComplianceConfig,
) -> Vec<ComplianceStatus> {
    let window_start = as_of - Duration::days(config.window_days);

    let mut by_member: BTreeMap<&str, Vec<&AttendanceRecord>> = BTreeMap::new();
    for record in records
        .iter()
        .filter(|r| r.date > window_start && r.date <= as_of)
    {
        by_member.entry(record.member_id.as_str()).or_default().push(record);
    }

    let mut statuses: Vec<ComplianceStatus> = by_member
        .into_iter()
        .map(|(member_id, mut list)| {
            list.sort_by_key(|r| r.date);
            evaluate_member(member_id, &list, config)
        })
        .collect();

    statuses.sort_by(|a, b| {
        a.status
            .rank()
            .cmp(&b.status.rank())
            .then(a.attendance_rate.total_cmp(&b.attendance_rate))
            .then_with(|| a.member_id.cmp(&b.member_id))
    });

    tracing::debug!(
        members = statuses.len(),
        non_compliant = statuses
            .iter()
            .filter(|s| s.status == ComplianceLevel::NonCompliant)
            .count(),
        "Compliance evaluated"
    );
    statuses
}

/// Evaluate one member's date-sorted records
fn evaluate_member(
    member_id: &str,
    records: &[&AttendanceRecord],
    config: &ComplianceConfig,
) -> ComplianceStatus {
    let total = records.len();
    let present = records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Present)
        .count();
    let excused = records.iter().filter(|r| r.status.is_excused()).count();

    let attendance_rate =
        (present as f64 + config.excused_weight * excused as f64) / total.max(1) as f64;

    let status = if attendance_rate < config.non_compliant_below {
        ComplianceLevel::NonCompliant
    } else if attendance_rate < config.warning_below {
        ComplianceLevel::Warning
    } else {
        ComplianceLevel::Compliant
    };

    let mut issues = Vec::new();
    match status {
        ComplianceLevel::NonCompliant => issues.push(format!(
            "Attendance rate {:.0}% is below the {:.0}% minimum",
            attendance_rate * 100.0,
            config.non_compliant_below * 100.0
        )),
        ComplianceLevel::Warning => issues.push(format!(
            "Attendance rate {:.0}% is below the {:.0}% target",
            attendance_rate * 100.0,
            config.warning_below * 100.0
        )),
        ComplianceLevel::Compliant => {}
    }

    let run = longest_unexcused_run(records);
    if run >= config.consecutive_absence_limit {
        issues.push(format!("{} consecutive unexcused absences", run));
    }

    let excused_fraction = excused as f64 / total.max(1) as f64;
    if excused_fraction > config.excused_fraction_limit {
        issues.push(format!(
            "Excused absences make up {:.0}% of records",
            excused_fraction * 100.0
        ));
    }

    ComplianceStatus {
        member_id: member_id.to_string(),
        member_name: records.iter().find_map(|r| r.member_name.clone()),
        attendance_rate,
        missed_days: total - present,
        total_records: total,
        status,
        issues,
    }
}

fn longest_unexcused_run(records: &[&AttendanceRecord]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for record in records {
        if record.status == AttendanceStatus::UnexcusedAbsence {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}
