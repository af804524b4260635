//! Behavioral habit and persona insights
//!
//! Four independent heuristics run over the same records. Each may decline
//! (its precondition is unmet) and a failing heuristic never suppresses the
//! others.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{Datelike, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::cluster::{kmeans, KMeansConfig};
use crate::config::{ClusteringConfig, HabitsConfig};
use crate::error::Result;
use crate::models::{AttendanceRecord, AttendanceStatus, ClusterPoint, Direction, Transaction};

use super::types::{format_rupiah, HabitCategory, HabitInsight};

/// Records and settings shared by all heuristics
pub struct HabitContext<'a> {
    pub transactions: &'a [Transaction],
    pub attendance: &'a [AttendanceRecord],
    pub as_of: NaiveDateTime,
    pub habits: &'a HabitsConfig,
    pub clustering: &'a ClusteringConfig,
}

/// A single habit detector
pub trait HabitHeuristic: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the heuristic's precondition is not met
    fn analyze(&self, ctx: &HabitContext<'_>) -> Result<Option<HabitInsight>>;
}

/// Runs every registered heuristic with per-heuristic failure isolation
pub struct HabitEngine {
    heuristics: Vec<Box<dyn HabitHeuristic>>,
}

impl Default for HabitEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HabitEngine {
    /// Engine with the built-in heuristics
    pub fn new() -> Self {
        let mut engine = Self::empty();
        engine.register(Box::new(MeetingDayPeak));
        engine.register(Box::new(SpendingWeekPeak));
        engine.register(Box::new(ChurnRisk));
        engine.register(Box::new(PersonaSegmentation));
        engine
    }

    pub fn empty() -> Self {
        Self {
            heuristics: Vec::new(),
        }
    }

    pub fn register(&mut self, heuristic: Box<dyn HabitHeuristic>) {
        self.heuristics.push(heuristic);
    }

    pub fn analyze_all(&self, ctx: &HabitContext<'_>) -> Vec<HabitInsight> {
        let mut insights = Vec::new();
        for heuristic in &self.heuristics {
            match heuristic.analyze(ctx) {
                Ok(Some(insight)) => {
                    tracing::debug!(heuristic = heuristic.name(), "Habit insight produced");
                    insights.push(insight);
                }
                Ok(None) => {
                    tracing::debug!(heuristic = heuristic.name(), "Habit heuristic declined");
                }
                Err(e) => {
                    tracing::warn!(
                        heuristic = heuristic.name(),
                        error = %e,
                        "Habit heuristic failed"
                    );
                }
            }
        }
        insights
    }
}

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Day of week holding more than `meeting_peak_share` of attendance records
pub struct MeetingDayPeak;

impl HabitHeuristic for MeetingDayPeak {
    fn name(&self) -> &'static str {
        "meeting_day_peak"
    }

    fn analyze(&self, ctx: &HabitContext<'_>) -> Result<Option<HabitInsight>> {
        if ctx.attendance.is_empty() {
            return Ok(None);
        }

        let mut counts = [0usize; 7];
        for record in ctx.attendance {
            counts[record.date.weekday().num_days_from_monday() as usize] += 1;
        }

        // Earliest weekday wins ties
        let (peak_index, peak_count) = counts
            .iter()
            .enumerate()
            .fold((0, 0), |best, (i, &c)| if c > best.1 { (i, c) } else { best });

        let share = peak_count as f64 / ctx.attendance.len() as f64;
        if share <= ctx.habits.meeting_peak_share {
            return Ok(None);
        }

        let day = day_name(WEEKDAYS[peak_index]);

        Ok(Some(HabitInsight::new(
            HabitCategory::Meeting,
            format!("Activity peaks on {}", day),
            format!(
                "{:.0}% of attendance records ({} of {}) fall on {}",
                share * 100.0,
                peak_count,
                ctx.attendance.len(),
                day
            ),
            format!("{:.0}% of records", share * 100.0),
            share,
            format!("Schedule key meetings and announcements on {}", day),
        )))
    }
}

/// Week of month, 1 to 5
fn week_of_month(date: NaiveDateTime) -> usize {
    (date.day() as usize - 1) / 7 + 1
}

/// Week of the month with the largest outflow (inflow when there is none)
pub struct SpendingWeekPeak;

impl HabitHeuristic for SpendingWeekPeak {
    fn name(&self) -> &'static str {
        "spending_week_peak"
    }

    fn analyze(&self, ctx: &HabitContext<'_>) -> Result<Option<HabitInsight>> {
        if ctx.transactions.is_empty() {
            return Ok(None);
        }

        let mut outflow = [0.0f64; 5];
        let mut inflow = [0.0f64; 5];
        for tx in ctx.transactions {
            let week = week_of_month(tx.date) - 1;
            match tx.direction {
                Direction::Out => outflow[week] += tx.amount,
                Direction::In => inflow[week] += tx.amount,
            }
        }

        let has_outflow = outflow.iter().any(|v| *v > 0.0);
        let (totals, flow) = if has_outflow {
            (&outflow, "Spending")
        } else {
            (&inflow, "Income")
        };

        let grand_total: f64 = totals.iter().sum();
        let (peak, peak_total) = totals
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        let share = if grand_total > 0.0 {
            peak_total / grand_total
        } else {
            0.0
        };
        let week = peak + 1;

        let recommendation = if has_outflow {
            format!(
                "Keep enough cash on hand before week {} and review purchases planned for that week",
                week
            )
        } else {
            format!("Schedule dues reminders just before week {}", week)
        };

        Ok(Some(HabitInsight::new(
            HabitCategory::Spending,
            format!("{} peaks in week {} of the month", flow, week),
            format!(
                "{:.0}% of {} happens in week {} of the month",
                share * 100.0,
                flow.to_lowercase(),
                week
            ),
            format_rupiah(peak_total),
            share,
            recommendation,
        )))
    }
}

/// Share of members with no qualifying activity in the last `inactivity_days`
pub struct ChurnRisk;

impl HabitHeuristic for ChurnRisk {
    fn name(&self) -> &'static str {
        "churn_risk"
    }

    fn analyze(&self, ctx: &HabitContext<'_>) -> Result<Option<HabitInsight>> {
        let mut members: HashSet<&str> = HashSet::new();
        let mut last_active: HashMap<&str, NaiveDateTime> = HashMap::new();

        for tx in ctx.transactions {
            members.insert(tx.member_id.as_str());
            let entry = last_active.entry(tx.member_id.as_str()).or_insert(tx.date);
            *entry = (*entry).max(tx.date);
        }
        for record in ctx.attendance {
            members.insert(record.member_id.as_str());
            if record.status == AttendanceStatus::Present {
                let entry = last_active
                    .entry(record.member_id.as_str())
                    .or_insert(record.date);
                *entry = (*entry).max(record.date);
            }
        }

        let total = members.len();
        if total == 0 {
            return Ok(None);
        }

        let cutoff = ctx.as_of - chrono::Duration::days(ctx.habits.inactivity_days);
        let inactive = members
            .iter()
            .filter(|m| last_active.get(*m).map_or(true, |last| *last < cutoff))
            .count();
        let ratio = inactive as f64 / total as f64;

        if ratio > ctx.habits.churn_risk_ratio {
            Ok(Some(HabitInsight::new(
                HabitCategory::Activity,
                "Member churn risk",
                format!(
                    "{} of {} members ({:.0}%) have had no activity in the last {} days",
                    inactive,
                    total,
                    ratio * 100.0,
                    ctx.habits.inactivity_days
                ),
                format!("{:.0}% inactive", ratio * 100.0),
                0.8,
                "Reach out to inactive members personally and invite them to the next activity",
            )))
        } else if ratio < ctx.habits.retention_ratio && total > ctx.habits.retention_min_members {
            Ok(Some(HabitInsight::new(
                HabitCategory::Activity,
                "Strong member retention",
                format!(
                    "{} of {} members were active in the last {} days",
                    total - inactive,
                    total,
                    ctx.habits.inactivity_days
                ),
                format!("{:.0}% inactive", ratio * 100.0),
                0.8,
                "Keep the current engagement rhythm and recognize active members",
            )))
        } else {
            Ok(None)
        }
    }
}

/// Member archetype derived from cluster centroid statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    CorePillar,
    SteadyDonor,
    FieldActivist,
    Moderate,
    Passive,
}

impl Persona {
    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::CorePillar => "core_pillar",
            Persona::SteadyDonor => "steady_donor",
            Persona::FieldActivist => "field_activist",
            Persona::Moderate => "moderate",
            Persona::Passive => "passive",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Persona::CorePillar => "Core pillar",
            Persona::SteadyDonor => "Steady donor",
            Persona::FieldActivist => "Field activist",
            Persona::Moderate => "Moderate",
            Persona::Passive => "Passive",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Persona::CorePillar => "Involve core pillars in planning and mentoring newer members",
            Persona::SteadyDonor => "Thank steady donors publicly and invite them to activities",
            Persona::FieldActivist => "Give field activists visible roles in programs",
            Persona::Moderate => "Offer moderate members small, specific tasks",
            Persona::Passive => "Check in with passive members about barriers to joining",
        }
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
enum Condition {
    Both { attendance: f64, contribution: f64 },
    Attendance(f64),
    Contribution(f64),
    Either { attendance: f64, contribution: f64 },
}

impl Condition {
    fn matches(&self, attendance: f64, contribution: f64) -> bool {
        match *self {
            Condition::Both {
                attendance: a,
                contribution: c,
            } => attendance >= a && contribution >= c,
            Condition::Attendance(a) => attendance >= a,
            Condition::Contribution(c) => contribution >= c,
            Condition::Either {
                attendance: a,
                contribution: c,
            } => attendance >= a || contribution >= c,
        }
    }
}

/// Ordered persona rules; the first match wins, `Passive` otherwise
const PERSONA_RULES: &[(Condition, Persona)] = &[
    (
        Condition::Both {
            attendance: 0.75,
            contribution: 0.6,
        },
        Persona::CorePillar,
    ),
    (Condition::Contribution(0.6), Persona::SteadyDonor),
    (Condition::Attendance(0.75), Persona::FieldActivist),
    (
        Condition::Either {
            attendance: 0.4,
            contribution: 0.3,
        },
        Persona::Moderate,
    ),
];

/// Map centroid statistics (attendance rate, normalized contribution) to a persona
pub fn classify_persona(attendance: f64, contribution: f64) -> Persona {
    PERSONA_RULES
        .iter()
        .find(|(condition, _)| condition.matches(attendance, contribution))
        .map(|(_, persona)| *persona)
        .unwrap_or(Persona::Passive)
}

/// One member segment from persona clustering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaSegment {
    pub persona: Persona,
    pub member_ids: Vec<String>,
    pub attendance: f64,
    pub contribution: f64,
}

/// Per-member (attendance rate, inflow / max inflow) feature points
pub fn member_features(
    transactions: &[Transaction],
    attendance: &[AttendanceRecord],
) -> Vec<ClusterPoint> {
    let mut records: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for record in attendance {
        let entry = records.entry(record.member_id.as_str()).or_default();
        entry.1 += 1;
        if record.status == AttendanceStatus::Present {
            entry.0 += 1;
        }
    }

    let mut inflow: BTreeMap<&str, f64> = BTreeMap::new();
    for tx in transactions.iter().filter(|t| t.direction == Direction::In) {
        *inflow.entry(tx.member_id.as_str()).or_default() += tx.amount;
    }
    let max_inflow = inflow.values().copied().fold(0.0, f64::max);

    let members: BTreeSet<&str> =
        records.keys().chain(inflow.keys()).copied().collect();

    members
        .into_iter()
        .map(|member| {
            let rate = records
                .get(member)
                .map(|(present, total)| *present as f64 / (*total).max(1) as f64)
                .unwrap_or(0.0);
            let contribution = if max_inflow > 0.0 {
                inflow.get(member).copied().unwrap_or(0.0) / max_inflow
            } else {
                0.0
            };
            ClusterPoint::new(member, vec![rate, contribution])
        })
        .collect()
}

/// Cluster members and label each segment
///
/// Segments are ordered by size, largest first.
pub fn segment_members(
    points: &[ClusterPoint],
    config: &ClusteringConfig,
) -> Result<Vec<PersonaSegment>> {
    let kmeans_config = KMeansConfig {
        k: config.k,
        max_iterations: config.max_iterations,
        seed: config.seed,
    };
    let result = kmeans(points, &kmeans_config)?;

    let mut segments: Vec<PersonaSegment> = result
        .centroids
        .iter()
        .enumerate()
        .filter_map(|(cluster, centroid)| {
            let member_ids: Vec<String> = result
                .members(cluster)
                .into_iter()
                .map(str::to_string)
                .collect();
            if member_ids.is_empty() {
                return None;
            }
            let attendance = centroid.first().copied().unwrap_or(0.0);
            let contribution = centroid.get(1).copied().unwrap_or(0.0);
            Some(PersonaSegment {
                persona: classify_persona(attendance, contribution),
                member_ids,
                attendance,
                contribution,
            })
        })
        .collect();

    segments.sort_by(|a, b| b.member_ids.len().cmp(&a.member_ids.len()));
    Ok(segments)
}

/// K-means persona segmentation over attendance and contribution
pub struct PersonaSegmentation;

impl HabitHeuristic for PersonaSegmentation {
    fn name(&self) -> &'static str {
        "persona_segmentation"
    }

    fn analyze(&self, ctx: &HabitContext<'_>) -> Result<Option<HabitInsight>> {
        if ctx.attendance.len() < ctx.habits.persona_min_records {
            return Ok(None);
        }
        let points = member_features(ctx.transactions, ctx.attendance);
        if points.len() < ctx.habits.persona_min_points {
            return Ok(None);
        }

        let segments = segment_members(&points, ctx.clustering)?;
        let Some(largest) = segments.first() else {
            return Ok(None);
        };

        let summary: Vec<String> = segments
            .iter()
            .map(|s| format!("{} ({})", s.persona.label(), s.member_ids.len()))
            .collect();
        let plan: Vec<String> = segments
            .iter()
            .map(|s| format!("{}: {}", s.persona.label(), s.persona.recommendation()))
            .collect();

        Ok(Some(
            HabitInsight::new(
                HabitCategory::Activity,
                "Member personas",
                format!("Members fall into {} segments: {}", segments.len(), summary.join(", ")),
                format!("{} members in {} segments", points.len(), segments.len()),
                0.7,
                largest.persona.recommendation(),
            )
            .with_action_plan(plan),
        ))
    }
}
