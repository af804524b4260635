//! Lexicon-based bilingual sentiment scoring
//!
//! Each polarity word looks back up to three tokens for modifiers. A negated
//! positive word contributes a flat -1 (harsher than any genuine negative
//! word); a negated negative word contributes only 0.8 of its magnitude, so
//! "tidak buruk" reads weaker than "bagus". Boosters scale by 1.5, diminishers
//! by 0.5. The final score is the mean contribution per polarity word,
//! clamped to [-1, 1].

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::text::tokenize;

const LOOKBACK: usize = 3;
const NEGATED_POSITIVE: f64 = -1.0;
const NEGATED_NEGATIVE_FACTOR: f64 = 0.8;
const BOOSTER: f64 = 1.5;
const DIMINISHER: f64 = 0.5;
const LABEL_THRESHOLD: f64 = 0.15;

/// Polarity weights stay below 1 / BOOSTER so a boosted word still ranks above a plain one after clamping
const POLARITY: &[(&str, f64)] = &[
    // Indonesian positive
    ("bagus", 0.6),
    ("baik", 0.5),
    ("hebat", 0.65),
    ("mantap", 0.6),
    ("senang", 0.55),
    ("puas", 0.55),
    ("lancar", 0.5),
    ("rapi", 0.4),
    ("aktif", 0.4),
    ("sukses", 0.65),
    ("berhasil", 0.6),
    ("terima", 0.2),
    ("kasih", 0.2),
    ("setuju", 0.4),
    ("ramah", 0.5),
    ("transparan", 0.55),
    ("meningkat", 0.45),
    ("untung", 0.5),
    ("solid", 0.5),
    // English positive
    ("good", 0.6),
    ("great", 0.65),
    ("excellent", 0.66),
    ("happy", 0.55),
    ("success", 0.65),
    ("helpful", 0.5),
    ("transparent", 0.55),
    ("improved", 0.45),
    // Indonesian negative
    ("buruk", -0.6),
    ("jelek", -0.6),
    ("kecewa", -0.6),
    ("lambat", -0.45),
    ("telat", -0.45),
    ("terlambat", -0.45),
    ("rugi", -0.55),
    ("gagal", -0.65),
    ("masalah", -0.5),
    ("curang", -0.66),
    ("korupsi", -0.66),
    ("bocor", -0.55),
    ("hilang", -0.5),
    ("marah", -0.6),
    ("malas", -0.5),
    ("menurun", -0.45),
    ("boros", -0.5),
    ("kacau", -0.6),
    // English negative
    ("bad", -0.6),
    ("poor", -0.55),
    ("late", -0.45),
    ("problem", -0.5),
    ("fraud", -0.66),
    ("failed", -0.65),
    ("angry", -0.6),
    ("waste", -0.5),
];

const NEGATIONS: &[&str] = &[
    "tidak", "tak", "bukan", "belum", "jangan", "tanpa", "gak", "nggak", "enggak", "kurang",
    "not", "never", "dont", "isnt", "wasnt",
];

const BOOSTERS: &[&str] = &[
    "sangat", "sekali", "amat", "banget", "paling", "terlalu", "benar", "very", "really",
    "extremely", "super", "highly",
];

const DIMINISHERS: &[&str] = &[
    "agak", "sedikit", "lumayan", "cukup", "slightly", "somewhat", "fairly", "bit",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    Negation,
    Booster,
    Diminisher,
}

fn polarity() -> &'static HashMap<&'static str, f64> {
    static MAP: OnceLock<HashMap<&'static str, f64>> = OnceLock::new();
    MAP.get_or_init(|| POLARITY.iter().copied().collect())
}

fn modifiers() -> &'static HashMap<&'static str, Modifier> {
    static MAP: OnceLock<HashMap<&'static str, Modifier>> = OnceLock::new();
    MAP.get_or_init(|| {
        let mut map = HashMap::new();
        map.extend(NEGATIONS.iter().map(|w| (*w, Modifier::Negation)));
        map.extend(BOOSTERS.iter().map(|w| (*w, Modifier::Booster)));
        map.extend(DIMINISHERS.iter().map(|w| (*w, Modifier::Diminisher)));
        map
    })
}

/// Coarse sentiment label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }

    pub fn from_score(score: f64) -> Self {
        if score > LABEL_THRESHOLD {
            Self::Positive
        } else if score < -LABEL_THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentiment {
    /// Mean contribution per polarity word, in [-1, 1]
    pub score: f64,
    pub label: SentimentLabel,
    /// Number of polarity words found
    pub matched: usize,
}

pub fn analyze_sentiment(text: &str) -> Sentiment {
    let tokens = tokenize(text);
    let lexicon = polarity();
    let mods = modifiers();

    let mut total = 0.0;
    let mut matched = 0usize;

    for (i, token) in tokens.iter().enumerate() {
        let Some(&weight) = lexicon.get(token.as_str()) else {
            continue;
        };
        matched += 1;

        let mut negated = false;
        let mut scale = 1.0;
        for prev in tokens[i.saturating_sub(LOOKBACK)..i].iter() {
            match mods.get(prev.as_str()) {
                Some(Modifier::Negation) => negated = !negated,
                Some(Modifier::Booster) => scale *= BOOSTER,
                Some(Modifier::Diminisher) => scale *= DIMINISHER,
                None => {}
            }
        }

        let base = match (negated, weight > 0.0) {
            (false, _) => weight,
            (true, true) => NEGATED_POSITIVE,
            (true, false) => NEGATED_NEGATIVE_FACTOR * weight.abs(),
        };
        total += base * scale;
    }

    let score = if matched == 0 {
        0.0
    } else {
        (total / matched as f64).clamp(-1.0, 1.0)
    };

    Sentiment {
        score,
        label: SentimentLabel::from_score(score),
        matched,
    }
}
