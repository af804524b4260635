//! TF-IDF vectorization and cosine-similarity search
//!
//! Term frequency is raw count over document length. IDF uses the smoothed
//! form `ln((N + 1) / (df + 1)) + 1`, which stays positive and finite even for
//! terms present in every document.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::text::analyze_terms;

/// Sparse term -> weight vector
pub type TermVector = HashMap<String, f64>;

/// A ranked search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Index of the document in the fitted corpus
    pub index: usize,
    pub score: f64,
}

/// Fitted TF-IDF index over a corpus
#[derive(Debug, Clone, Default)]
pub struct TfIdfIndex {
    idf: HashMap<String, f64>,
    documents: Vec<TermVector>,
}

impl TfIdfIndex {
    /// Fit IDF weights on a corpus and pre-compute each document's vector
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let tokenized: Vec<Vec<String>> =
            documents.iter().map(|d| analyze_terms(d.as_ref())).collect();

        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for tokens in &tokenized {
            let unique: HashSet<&String> = tokens.iter().collect();
            for token in unique {
                *document_frequency.entry(token.clone()).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let idf = document_frequency
            .into_iter()
            .map(|(term, df)| {
                let weight = ((n + 1.0) / (df as f64 + 1.0)).ln() + 1.0;
                (term, weight)
            })
            .collect();

        let mut index = Self {
            idf,
            documents: Vec::with_capacity(tokenized.len()),
        };
        let documents = tokenized.iter().map(|t| index.weigh(t)).collect();
        index.documents = documents;
        index
    }

    /// IDF weight for a term; terms never seen get the weight of a df = 0 term
    pub fn idf(&self, term: &str) -> f64 {
        self.idf.get(term).copied().unwrap_or_else(|| {
            let n = self.documents.len() as f64;
            (n + 1.0).ln() + 1.0
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// TF-IDF vector for arbitrary text against this index's IDF table
    pub fn vectorize(&self, text: &str) -> TermVector {
        self.weigh(&analyze_terms(text))
    }

    fn weigh(&self, tokens: &[String]) -> TermVector {
        let mut vector = term_frequencies(tokens);
        for (term, tf) in vector.iter_mut() {
            *tf *= self.idf(term);
        }
        vector
    }

    /// Rank fitted documents by cosine similarity to the query
    ///
    /// Documents with zero similarity are omitted; ties keep corpus order.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        let query_vector = self.vectorize(query);
        if query_vector.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = self
            .documents
            .iter()
            .enumerate()
            .map(|(index, doc)| SearchHit {
                index,
                score: cosine_similarity(&query_vector, doc),
            })
            .filter(|hit| hit.score > 0.0)
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.index.cmp(&b.index)));
        hits.truncate(top_k);
        hits
    }
}

/// Raw count divided by document length
pub fn term_frequencies(tokens: &[String]) -> TermVector {
    let mut counts: TermVector = HashMap::new();
    if tokens.is_empty() {
        return counts;
    }
    for token in tokens {
        *counts.entry(token.clone()).or_insert(0.0) += 1.0;
    }
    let len = tokens.len() as f64;
    for count in counts.values_mut() {
        *count /= len;
    }
    counts
}

/// Cosine similarity of two sparse vectors; 0.0 if either is empty or zero
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|v| w * v))
        .sum();

    let norm_a = a.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b = b.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
