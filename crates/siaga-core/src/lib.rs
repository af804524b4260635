//! Siaga Core Library
//!
//! Analytics engine behind the Siaga organizational risk report:
//! - Text processing, sentiment, TF-IDF search and a Naive Bayes classifier
//! - Anomaly detection, trend/volatility patterns and forecasting
//! - K-means member segmentation
//! - Fraud, compliance, financial, risk, alert, habit and scenario pipelines
//! - Optional AI narrative enrichment behind a pluggable backend
//!
//! Every analysis is a pure function of the records passed to it.

pub mod ai;
pub mod analysis;
pub mod anomaly;
pub mod classifier;
pub mod cluster;
pub mod config;
pub mod error;
pub mod forecast;
pub mod models;
pub mod pattern;
pub mod prompts;
pub mod sentiment;
pub mod stats;
pub mod text;
pub mod tfidf;

pub use ai::{AIClient, MockBackend, NarrativeBackend, OllamaBackend};
pub use analysis::{
    build_report, simulate_scenario, simulate_scenario_with_flows, Alert, AlertSeverity,
    ComplianceStatus, FinancialForecast, FraudIndicator, HabitInsight, ReportGenerator,
    ReportInput, RiskReport, RiskScore, ScenarioModifiers, ScenarioResult,
};
pub use anomaly::{detect_iqr, detect_zscore, Anomaly, AnomalyMethod};
pub use classifier::{classify, Classification, NaiveBayesModel, TrainingExample};
pub use cluster::{kmeans, KMeansConfig, KMeansResult};
pub use config::AnalysisConfig;
pub use error::{Error, Result};
pub use forecast::{forecast, ForecastMethod};
pub use models::{
    AttendanceRecord, AttendanceStatus, ClusterPoint, DataPoint, Direction, Transaction,
    VerificationStatus,
};
pub use pattern::{detect_pattern, Pattern, TrendDirection, VolatilityLevel};
pub use prompts::{Prompt, PromptId};
pub use sentiment::{analyze_sentiment, Sentiment, SentimentLabel};
pub use tfidf::{SearchHit, TfIdfIndex};
