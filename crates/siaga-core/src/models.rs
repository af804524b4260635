//! Domain models for Siaga
//!
//! Records are immutable snapshots supplied by the caller for one analysis run.
//! Nothing here is persisted by the engine.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Money flow direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Income, dues, donations
    In,
    /// Expenses
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in" | "income" | "masuk" => Ok(Self::In),
            "out" | "expense" | "keluar" => Ok(Self::Out),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verification state of a transaction (receipt checked by a treasurer, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Unknown verification status: {}", s)),
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A financial transaction owned by a member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub member_id: String,
    #[serde(default)]
    pub member_name: Option<String>,
    /// Non-negative amount; the sign lives in `direction`
    pub amount: f64,
    pub direction: Direction,
    pub category: String,
    #[serde(with = "flexible_datetime")]
    pub date: NaiveDateTime,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub verification: Option<VerificationStatus>,
}

impl Transaction {
    /// Amount with sign applied (inflow positive, outflow negative)
    pub fn signed_amount(&self) -> f64 {
        match self.direction {
            Direction::In => self.amount,
            Direction::Out => -self.amount,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.verification == Some(VerificationStatus::Pending)
    }

    /// Reject amounts that would corrupt the statistics: negative, NaN or infinite
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(Error::InvalidData(format!(
                "Transaction {} has invalid amount {} (must be a non-negative number)",
                self.id, self.amount
            )));
        }
        Ok(())
    }
}

/// Attendance status for one meeting / duty day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    ExcusedLeave,
    ExcusedSick,
    UnexcusedAbsence,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::ExcusedLeave => "excused_leave",
            Self::ExcusedSick => "excused_sick",
            Self::UnexcusedAbsence => "unexcused_absence",
        }
    }

    pub fn is_excused(&self) -> bool {
        matches!(self, Self::ExcusedLeave | Self::ExcusedSick)
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "present" | "hadir" => Ok(Self::Present),
            "excused_leave" | "leave" | "izin" => Ok(Self::ExcusedLeave),
            "excused_sick" | "sick" | "sakit" => Ok(Self::ExcusedSick),
            "unexcused_absence" | "absent" | "alpha" | "alpa" => Ok(Self::UnexcusedAbsence),
            _ => Err(format!("Unknown attendance status: {}", s)),
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One attendance entry for a member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub member_id: String,
    #[serde(default)]
    pub member_name: Option<String>,
    #[serde(with = "flexible_datetime")]
    pub date: NaiveDateTime,
    pub status: AttendanceStatus,
}

/// Generic time-series unit fed to anomaly detection, pattern detection and forecasting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub value: f64,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl DataPoint {
    pub fn new(value: f64, timestamp: NaiveDateTime) -> Self {
        Self {
            value,
            timestamp,
            id: None,
            metadata: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

}

/// Build data points from a bare value series, one day apart starting at `start`
pub fn points_from_values(values: &[f64], start: NaiveDate) -> Vec<DataPoint> {
    let start = start.and_time(chrono::NaiveTime::MIN);
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| DataPoint::new(v, start + chrono::Duration::days(i as i64)))
        .collect()
}

/// A member's feature vector for clustering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterPoint {
    pub id: String,
    pub features: Vec<f64>,
    #[serde(default)]
    pub cluster: Option<usize>,
}

impl ClusterPoint {
    pub fn new(id: impl Into<String>, features: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            features,
            cluster: None,
        }
    }
}

/// Serde helpers accepting either `YYYY-MM-DD` or a full `YYYY-MM-DDTHH:MM:SS` timestamp
pub mod flexible_datetime {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    /// Parse a date or timestamp; date-only values become midnight
    pub fn parse(raw: &str) -> Result<NaiveDateTime, String> {
        let raw = raw.trim();
        // Zoned timestamps keep their wall-clock time
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.naive_local());
        }

        // Drop fractional seconds / timezone suffix if present
        let trimmed = raw
            .split(['.', 'Z', '+'])
            .next()
            .unwrap_or(raw);

        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                return Ok(dt);
            }
        }

        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(|d| d.and_time(chrono::NaiveTime::MIN))
            .map_err(|_| format!("Invalid date: {} (use YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)", raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_direction_parsing() {
        assert_eq!(Direction::from_str("in").unwrap(), Direction::In);
        assert_eq!(Direction::from_str("KELUAR").unwrap(), Direction::Out);
        assert!(Direction::from_str("sideways").is_err());
    }

    #[test]
    fn test_attendance_status_aliases() {
        assert_eq!(
            AttendanceStatus::from_str("izin").unwrap(),
            AttendanceStatus::ExcusedLeave
        );
        assert_eq!(
            AttendanceStatus::from_str("unexcused_absence").unwrap(),
            AttendanceStatus::UnexcusedAbsence
        );
        assert!(AttendanceStatus::ExcusedSick.is_excused());
        assert!(!AttendanceStatus::Present.is_excused());
    }

    #[test]
    fn test_flexible_datetime_parse() {
        let date_only = flexible_datetime::parse("2024-03-05").unwrap();
        assert_eq!(date_only.format("%H:%M").to_string(), "00:00");

        let full = flexible_datetime::parse("2024-03-05T14:30:00").unwrap();
        assert_eq!(full.format("%H:%M").to_string(), "14:30");

        let zoned = flexible_datetime::parse("2024-03-05T14:30:00.000Z").unwrap();
        assert_eq!(zoned, full);

        let west = flexible_datetime::parse("2024-03-05T14:30:00-05:00").unwrap();
        assert_eq!(west, full);
        let east = flexible_datetime::parse("2024-03-05T14:30:00+07:00").unwrap();
        assert_eq!(east, full);

        assert!(flexible_datetime::parse("05/03/2024").is_err());
    }

    #[test]
    fn test_transaction_json_roundtrip_with_date_only() {
        let json = r#"{
            "id": "t1",
            "member_id": "m1",
            "amount": 150000,
            "direction": "out",
            "category": "konsumsi",
            "date": "2024-02-10",
            "verification": "pending"
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.signed_amount(), -150000.0);
        assert!(tx.is_pending());
        assert!(tx.member_name.is_none());
        assert!(tx.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_amounts() {
        let base: Transaction = serde_json::from_str(
            r#"{"id": "t9", "member_id": "m1", "amount": 0, "direction": "in",
                "category": "iuran", "date": "2024-02-10"}"#,
        )
        .unwrap();
        assert!(base.validate().is_ok());

        for amount in [-1.0, f64::NAN, f64::INFINITY] {
            let tx = Transaction { amount, ..base.clone() };
            let err = tx.validate().unwrap_err();
            assert!(matches!(err, Error::InvalidData(_)));
            assert!(err.to_string().contains("t9"));
        }
    }
}
