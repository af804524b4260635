//! Organizational analysis pipelines
//!
//! Every pipeline is a pure function of the records passed in. `report`
//! composes them into a single `RiskReport`.

pub mod alerts;
pub mod compliance;
pub mod financial;
pub mod fraud;
pub mod habits;
pub mod report;
pub mod risk;
pub mod scenario;
pub mod types;

pub use alerts::generate_alerts;
pub use compliance::monitor_compliance;
pub use financial::{
    aggregate_monthly, default_action_plan, note_unusual_months, predict_financial_trend,
    unusual_months,
};
pub use fraud::detect_fraud;
pub use habits::{
    classify_persona, member_features, segment_members, HabitContext, HabitEngine,
    HabitHeuristic, Persona, PersonaSegment,
};
pub use report::{build_report, ReportGenerator, ReportInput, RiskReport};
pub use risk::{calculate_risk_score, RiskInputs};
pub use scenario::{
    simulate_scenario, simulate_scenario_with_flows, ScenarioModifiers, ScenarioResult,
};
pub use types::*;
