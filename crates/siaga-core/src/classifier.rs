//! Multinomial Naive Bayes text classifier
//!
//! `NaiveBayesModel::train` builds an immutable model; retraining produces a
//! new value instead of mutating the old one, so a model can be shared freely
//! between concurrent reports.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::text::analyze_terms;

/// A labeled training example
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingExample {
    pub text: String,
    pub label: String,
}

impl TrainingExample {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// Result of classifying one text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    /// Softmax-normalized probability of the winning class, in (0, 1]
    pub confidence: f64,
    /// Raw log-probability score per class
    pub scores: BTreeMap<String, f64>,
}

/// Trained model: class priors, smoothed word probabilities, vocabulary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaiveBayesModel {
    priors: BTreeMap<String, f64>,
    word_probs: HashMap<String, HashMap<String, f64>>,
    /// Smoothed probability for a word the class never saw
    unseen_probs: HashMap<String, f64>,
    vocabulary: HashSet<String>,
}

impl NaiveBayesModel {
    /// Train with add-one smoothing over the vocabulary of the training set
    pub fn train(examples: &[TrainingExample]) -> Result<Self> {
        if examples.is_empty() {
            return Err(Error::InsufficientData(
                "Naive Bayes needs at least one training example".into(),
            ));
        }

        let mut class_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut word_counts: HashMap<String, HashMap<String, usize>> = HashMap::new();
        let mut vocabulary = HashSet::new();

        for example in examples {
            *class_counts.entry(example.label.clone()).or_insert(0) += 1;
            let counts = word_counts.entry(example.label.clone()).or_default();
            for token in analyze_terms(&example.text) {
                vocabulary.insert(token.clone());
                *counts.entry(token).or_insert(0) += 1;
            }
        }

        let total = examples.len() as f64;
        let vocab_size = vocabulary.len() as f64;

        let priors = class_counts
            .iter()
            .map(|(label, &count)| (label.clone(), count as f64 / total))
            .collect();

        let mut word_probs = HashMap::new();
        let mut unseen_probs = HashMap::new();
        for label in class_counts.keys() {
            let counts = word_counts.remove(label).unwrap_or_default();
            let class_total: usize = counts.values().sum();
            let denom = class_total as f64 + vocab_size;

            let probs: HashMap<String, f64> = counts
                .into_iter()
                .map(|(word, count)| (word, (count as f64 + 1.0) / denom))
                .collect();

            unseen_probs.insert(label.clone(), 1.0 / denom);
            word_probs.insert(label.clone(), probs);
        }

        tracing::debug!(
            classes = class_counts.len(),
            vocabulary = vocabulary.len(),
            examples = examples.len(),
            "Trained Naive Bayes model"
        );

        Ok(Self {
            priors,
            word_probs,
            unseen_probs,
            vocabulary,
        })
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.priors.keys().map(String::as_str)
    }

    pub fn prior(&self, label: &str) -> Option<f64> {
        self.priors.get(label).copied()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    fn word_probability(&self, label: &str, word: &str) -> f64 {
        self.word_probs
            .get(label)
            .and_then(|probs| probs.get(word))
            .or_else(|| self.unseen_probs.get(label))
            .copied()
            .unwrap_or(f64::MIN_POSITIVE)
    }
}

/// Score text against a trained model and pick the argmax class
///
/// Ties go to the label that sorts first.
pub fn classify(model: &NaiveBayesModel, text: &str) -> Classification {
    let tokens = analyze_terms(text);

    let scores: BTreeMap<String, f64> = model
        .priors
        .iter()
        .map(|(label, &prior)| {
            let log_likelihood: f64 = tokens
                .iter()
                .map(|t| model.word_probability(label, t).ln())
                .sum();
            (label.clone(), prior.ln() + log_likelihood)
        })
        .collect();

    let (best_label, best_score) = scores
        .iter()
        .fold(None::<(&String, f64)>, |best, (label, &score)| match best {
            Some((_, s)) if s >= score => best,
            _ => Some((label, score)),
        })
        .map(|(l, s)| (l.clone(), s))
        .unwrap_or_default();

    // Softmax relative to the best score keeps exp() from underflowing
    let partition: f64 = scores.values().map(|s| (s - best_score).exp()).sum();
    let confidence = if partition > 0.0 { 1.0 / partition } else { 0.0 };

    Classification {
        label: best_label,
        confidence,
        scores,
    }
}
