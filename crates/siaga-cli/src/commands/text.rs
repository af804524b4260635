//! Free-text commands: classify, sentiment, search

use std::path::Path;

use anyhow::{Context, Result};
use siaga_core::{
    analyze_sentiment, classify, Classification, NaiveBayesModel, SearchHit, TfIdfIndex,
    TrainingExample,
};

use super::{load_records, truncate};

pub fn classify_text(training: &Path, text: &str) -> Result<Classification> {
    let examples: Vec<TrainingExample> = load_records(training)?;
    let model = NaiveBayesModel::train(&examples)
        .with_context(|| format!("Failed to train on {}", training.display()))?;
    tracing::debug!(
        examples = examples.len(),
        vocabulary = model.vocabulary_size(),
        "Classifier trained"
    );
    Ok(classify(&model, text))
}

pub fn cmd_classify(training: &Path, text: &str) -> Result<()> {
    let result = classify_text(training, text)?;
    println!("{} ({:.0}% confidence)", result.label, result.confidence * 100.0);
    Ok(())
}

pub fn cmd_sentiment(text: &str) -> Result<()> {
    let sentiment = analyze_sentiment(text);
    println!(
        "{} (score {:+.2}, {} sentiment word(s))",
        sentiment.label, sentiment.score, sentiment.matched
    );
    Ok(())
}

/// Rank the lines of `file` against `query`; returns (hit, line) pairs
pub fn search_file(file: &Path, query: &str, limit: usize) -> Result<Vec<(SearchHit, String)>> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    let documents: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();

    let index = TfIdfIndex::fit(&documents);
    Ok(index
        .search(query, limit)
        .into_iter()
        .filter_map(|hit| {
            documents
                .get(hit.index)
                .map(|line| (hit, line.to_string()))
        })
        .collect())
}

pub fn cmd_search(file: &Path, query: &str, limit: usize) -> Result<()> {
    let results = search_file(file, query, limit)?;
    if results.is_empty() {
        println!("No matches for \"{}\"", query);
        return Ok(());
    }
    for (hit, line) in results {
        println!("   {:.3}  {}", hit.score, truncate(&line, 80));
    }
    Ok(())
}
