//! Fraud screening over a transaction population
//!
//! Each transaction accumulates weighted signals (capped at 100):
//!
//! | Signal | Weight |
//! |---|---|
//! | IQR statistical outlier | 35 |
//! | Above the dynamic threshold max(static, mean + 3 std) | 30 |
//! | Above the static threshold only | 15 |
//! | Z-score > 3 against the member's own earlier transactions | 25 |
//! | Two or more other transactions by the member inside one hour-long window | 20 |
//! | Large round amount | 10 |

use std::collections::HashMap;

use chrono::Duration;

use crate::anomaly::iqr_bounds;
use crate::config::FraudConfig;
use crate::models::Transaction;
use crate::stats::{mean_std, EPSILON};

use super::types::{format_rupiah, FraudIndicator};

const WEIGHT_IQR: u32 = 35;
const WEIGHT_DYNAMIC: u32 = 30;
const WEIGHT_STATIC: u32 = 15;
const WEIGHT_MEMBER_ZSCORE: u32 = 25;
const WEIGHT_RAPID_FIRE: u32 = 20;
const WEIGHT_ROUND_NUMBER: u32 = 10;
const MAX_SCORE: u32 = 100;

pub const SIGNAL_IQR: &str = "Statistical outlier (IQR)";
pub const SIGNAL_ROUND_NUMBER: &str = "Large round-number amount";

/// Screen transactions for fraud signals
///
/// Returns only flagged transactions, highest score first. Fewer than
/// `min_transactions` records yields an empty result.
pub fn detect_fraud(transactions: &[Transaction], config: &FraudConfig) -> Vec<FraudIndicator> {
    if transactions.len() < config.min_transactions {
        tracing::debug!(
            count = transactions.len(),
            required = config.min_transactions,
            "Not enough transactions for fraud screening"
        );
        return Vec::new();
    }

    let amounts: Vec<f64> = transactions.iter().map(|t| t.amount).collect();
    let (mean, std) = mean_std(&amounts);
    let dynamic = mean + config.dynamic_sigma * std;
    let effective = config.static_threshold.max(dynamic);
    let bounds = iqr_bounds(&amounts);

    tracing::debug!(
        mean,
        std,
        dynamic_threshold = dynamic,
        effective_threshold = effective,
        iqr_upper = ?bounds.map(|b| b.upper),
        "Fraud thresholds"
    );

    let by_member = group_by_member(transactions);
    let window = Duration::minutes(config.rapid_fire_window_minutes);

    let mut indicators: Vec<FraudIndicator> = transactions
        .iter()
        .filter_map(|tx| {
            let mut score = 0u32;
            let mut signals = Vec::new();

            if bounds.is_some_and(|b| !b.contains(tx.amount)) {
                score += WEIGHT_IQR;
                signals.push(SIGNAL_IQR.to_string());
            }

            if tx.amount > effective {
                score += WEIGHT_DYNAMIC;
                signals.push(format!(
                    "Amount exceeds dynamic threshold ({})",
                    format_rupiah(effective)
                ));
            } else if tx.amount > config.static_threshold {
                score += WEIGHT_STATIC;
                signals.push(format!(
                    "Amount exceeds static threshold ({})",
                    format_rupiah(config.static_threshold)
                ));
            }

            let history = by_member
                .get(tx.member_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();

            if let Some(z) = member_zscore(tx, history, config.min_member_history) {
                if z > config.z_threshold {
                    score += WEIGHT_MEMBER_ZSCORE;
                    signals.push(format!("Unusual amount for this member (z-score {:.1})", z));
                }
            }

            let nearby = rapid_fire_count(tx, history, window);
            if nearby >= config.rapid_fire_min_others {
                score += WEIGHT_RAPID_FIRE;
                signals.push(format!(
                    "Rapid-fire: {} other transactions within {} minutes",
                    nearby, config.rapid_fire_window_minutes
                ));
            }

            if is_round_number(tx.amount, config) {
                score += WEIGHT_ROUND_NUMBER;
                signals.push(SIGNAL_ROUND_NUMBER.to_string());
            }

            if signals.is_empty() {
                return None;
            }

            let risk_score = score.min(MAX_SCORE);
            Some(FraudIndicator {
                transaction_id: tx.id.clone(),
                member_id: tx.member_id.clone(),
                amount: tx.amount,
                risk_score,
                explanation: explain(risk_score, &signals),
                signals,
            })
        })
        .collect();

    indicators.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));

    tracing::debug!(flagged = indicators.len(), "Fraud screening complete");
    indicators
}

/// Member transactions sorted by date
fn group_by_member(transactions: &[Transaction]) -> HashMap<&str, Vec<&Transaction>> {
    let mut map: HashMap<&str, Vec<&Transaction>> = HashMap::new();
    for tx in transactions {
        map.entry(tx.member_id.as_str()).or_default().push(tx);
    }
    for list in map.values_mut() {
        list.sort_by_key(|t| t.date);
    }
    map
}

/// Z-score of `tx` against the member's strictly earlier transactions
fn member_zscore(tx: &Transaction, history: &[&Transaction], min_history: usize) -> Option<f64> {
    let prior: Vec<f64> = history
        .iter()
        .filter(|t| t.date < tx.date)
        .map(|t| t.amount)
        .collect();
    if prior.len() < min_history {
        return None;
    }
    let (m, sd) = mean_std(&prior);
    (sd > EPSILON).then(|| (tx.amount - m) / sd)
}

/// Most other member transactions sharing one `window`-long span with `tx`
///
/// Windows slide over the member's timeline, so neighbours an hour before and
/// an hour after `tx` never count together.
fn rapid_fire_count(tx: &Transaction, history: &[&Transaction], window: Duration) -> usize {
    let others: Vec<&Transaction> = history
        .iter()
        .copied()
        .filter(|other| other.id != tx.id && (other.date - tx.date).abs() <= window)
        .collect();

    // Every maximal window can start at tx or at one of the earlier neighbours
    std::iter::once(tx.date)
        .chain(others.iter().map(|o| o.date).filter(|d| *d < tx.date))
        .map(|start| {
            let end = start + window;
            others
                .iter()
                .filter(|o| o.date >= start && o.date <= end)
                .count()
        })
        .max()
        .unwrap_or(0)
}

fn is_round_number(amount: f64, config: &FraudConfig) -> bool {
    if amount < config.round_number_min {
        return false;
    }
    let units = amount / config.round_number_unit;
    (units - units.round()).abs() < 1e-9
}

fn explain(score: u32, signals: &[String]) -> String {
    let severity = if score >= 75 {
        "Critical"
    } else if score >= 50 {
        "High"
    } else {
        "Moderate"
    };
    format!(
        "{} risk (score {}): {}",
        severity,
        score,
        signals.join("; ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use chrono::NaiveDate;

    fn tx(id: &str, member: &str, amount: f64, day: u32, hour: u32, minute: u32) -> Transaction {
        Transaction {
            id: id.to_string(),
            member_id: member.to_string(),
            member_name: None,
            amount,
            direction: Direction::Out,
            category: "operasional".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(hour, minute, 0)
                .unwrap(),
            notes: None,
            verification: None,
        }
    }

    #[test]
    fn test_requires_three_transactions() {
        let txs = vec![
            tx("a", "m1", 50_000_000.0, 1, 9, 0),
            tx("b", "m1", 100.0, 2, 9, 0),
        ];
        assert!(detect_fraud(&txs, &FraudConfig::default()).is_empty());
    }

    #[test]
    fn test_large_outlier_accumulates_signals() {
        let txs = vec![
            tx("t1", "m1", 100_000.0, 1, 9, 0),
            tx("t2", "m1", 120_000.0, 2, 9, 0),
            tx("t3", "m1", 110_000.0, 3, 9, 0),
            tx("t4", "m1", 130_000.0, 4, 9, 0),
            tx("t5", "m1", 115_000.0, 5, 9, 0),
            tx("t6", "m1", 50_000_000.0, 6, 9, 0),
        ];

        let indicators = detect_fraud(&txs, &FraudConfig::default());
        assert_eq!(indicators.len(), 1);

        let top = &indicators[0];
        assert_eq!(top.transaction_id, "t6");
        // IQR 35 + static-only 15 + member z-score 25 + round number 10
        assert_eq!(top.risk_score, 85);
        assert_eq!(top.signals[0], SIGNAL_IQR);
        assert!(top.signals[1].starts_with("Amount exceeds static threshold"));
        assert!(top.signals[2].starts_with("Unusual amount for this member"));
        assert_eq!(top.signals[3], SIGNAL_ROUND_NUMBER);
        assert!(top.explanation.starts_with("Critical risk (score 85)"));
        assert!(top.explanation.contains(SIGNAL_IQR));
    }

    #[test]
    fn test_rapid_fire() {
        let txs = vec![
            tx("r1", "m2", 75_000.0, 10, 10, 0),
            tx("r2", "m2", 82_500.0, 10, 10, 20),
            tx("r3", "m2", 91_250.0, 10, 10, 40),
            tx("x1", "m3", 80_000.0, 12, 8, 0),
        ];
        let indicators = detect_fraud(&txs, &FraudConfig::default());
        let ids: Vec<&str> = indicators.iter().map(|i| i.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2", "r3"]);
        for indicator in &indicators {
            assert_eq!(indicator.risk_score, 20);
            assert!(indicator.explanation.starts_with("Moderate"));
        }
    }

    #[test]
    fn test_rapid_fire_window_slides() {
        // Neighbours an hour either side span two hours: no single window holds three
        let txs = vec![
            tx("early", "m2", 75_000.0, 10, 9, 0),
            tx("mid", "m2", 82_500.0, 10, 10, 0),
            tx("late", "m2", 91_250.0, 10, 11, 0),
            tx("x1", "m3", 80_000.0, 12, 8, 0),
        ];
        assert!(detect_fraud(&txs, &FraudConfig::default()).is_empty());

        let history: Vec<&Transaction> = txs.iter().filter(|t| t.member_id == "m2").collect();
        let window = Duration::minutes(60);
        assert_eq!(rapid_fire_count(&txs[1], &history, window), 1);
        assert_eq!(rapid_fire_count(&txs[0], &history, window), 1);
        assert_eq!(rapid_fire_count(&txs[1], &history, Duration::minutes(120)), 2);
    }

    #[test]
    fn test_dynamic_threshold_signal() {
        // Ten ordinary payments by distinct members and one far outlier:
        // mean + 3 std is about Rp 23.96M, above the Rp 10M static threshold
        let mut txs: Vec<Transaction> = (0..10)
            .map(|i| {
                tx(
                    &format!("n{}", i),
                    &format!("m{}", i),
                    101_234.0 + i as f64 * 1_111.0,
                    i + 1,
                    9,
                    0,
                )
            })
            .collect();
        txs.push(tx("outlier", "m99", 25_123_456.0, 20, 9, 0));

        let indicators = detect_fraud(&txs, &FraudConfig::default());
        assert_eq!(indicators.len(), 1);

        let top = &indicators[0];
        assert_eq!(top.transaction_id, "outlier");
        // IQR 35 + dynamic 30
        assert_eq!(top.risk_score, WEIGHT_IQR + WEIGHT_DYNAMIC);
        assert_eq!(top.signals[0], SIGNAL_IQR);
        assert!(top.signals[1].starts_with("Amount exceeds dynamic threshold (Rp 23."));
        assert!(!top
            .signals
            .iter()
            .any(|s| s.starts_with("Amount exceeds static threshold")));
        assert!(top.explanation.starts_with("High risk (score 65)"));
    }

    #[test]
    fn test_static_threshold_only_when_dynamic_is_higher() {
        let config = FraudConfig {
            static_threshold: 100_000.0,
            ..FraudConfig::default()
        };
        let txs = vec![
            tx("a", "m1", 90_000.0, 1, 9, 0),
            tx("b", "m2", 95_000.0, 2, 9, 0),
            tx("c", "m3", 105_000.0, 3, 9, 0),
            tx("d", "m4", 98_000.0, 4, 9, 0),
            tx("e", "m5", 102_000.0, 5, 9, 0),
        ];
        let indicators = detect_fraud(&txs, &config);
        assert_eq!(indicators.len(), 2);
        for indicator in &indicators {
            assert_eq!(indicator.risk_score, WEIGHT_STATIC);
            assert!(indicator.signals[0].starts_with("Amount exceeds static threshold"));
        }
    }

    #[test]
    fn test_scores_sorted_and_capped() {
        let mut txs = vec![
            tx("burst1", "m9", 900_000.0, 20, 10, 0),
            tx("burst2", "m9", 800_000.0, 20, 10, 5),
            tx("burst3", "m9", 700_000.0, 20, 10, 10),
        ];
        for day in 1..=8 {
            txs.push(tx(&format!("n{}", day), "m1", 50_000.0 + day as f64 * 1_000.0, day, 9, 0));
        }
        txs.push(tx("huge", "m1", 90_000_000.0, 15, 9, 0));

        let indicators = detect_fraud(&txs, &FraudConfig::default());
        assert!(!indicators.is_empty());
        assert!(indicators
            .windows(2)
            .all(|w| w[0].risk_score >= w[1].risk_score));
        assert!(indicators.iter().all(|i| i.risk_score <= 100));
        assert_eq!(indicators[0].transaction_id, "huge");
    }

    #[test]
    fn test_round_number_rule() {
        let config = FraudConfig::default();
        assert!(is_round_number(500_000.0, &config));
        assert!(is_round_number(2_300_000.0, &config));
        assert!(!is_round_number(450_000.0, &config));
        assert!(!is_round_number(550_500.0, &config));
    }
}
