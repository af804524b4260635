//! Text primitives shared by search, classification and sentiment
//!
//! Tokens are lowercased, stripped of punctuation, split on whitespace, and
//! anything of two characters or fewer is dropped. Stopwords cover both
//! Indonesian and English since member notes mix the two freely.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

/// Tokens at or below this length carry no signal ("di", "ke", "rp", ...)
const MIN_TOKEN_LEN: usize = 3;

const STOPWORDS: &[&str] = &[
    // Indonesian
    "yang", "dan", "untuk", "dengan", "dari", "pada", "dalam", "ini", "itu", "akan", "atau",
    "juga", "karena", "oleh", "adalah", "sudah", "telah", "bisa", "dapat", "ada", "tersebut",
    "saya", "kami", "kita", "mereka", "dia", "anda", "agar", "supaya", "bahwa", "sebagai",
    "seperti", "saat", "ketika", "setelah", "sebelum", "masih", "hanya", "lebih", "para",
    "bagi", "tentang", "hingga", "sampai", "namun", "tetapi", "tapi", "lalu", "kemudian",
    "pun", "nya", "jika", "kalau", "maka", "serta", "antara", "secara",
    // English
    "the", "and", "for", "with", "from", "this", "that", "are", "was", "were", "been",
    "have", "has", "had", "will", "would", "can", "could", "should", "into", "onto", "about",
    "our", "your", "their", "they", "them", "his", "her", "its", "you", "but",
    "also", "than", "then", "there", "here", "when", "what", "which", "who", "all", "any",
    "each", "just", "only", "over", "such", "some", "out", "per",
];

fn punctuation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\p{L}\p{N}\s]").expect("valid regex"))
}

fn stopwords() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

/// Lowercase, strip punctuation, split on whitespace, drop short tokens
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned = punctuation().replace_all(&lowered, "");
    cleaned
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

pub fn is_stopword(token: &str) -> bool {
    stopwords().contains(token)
}

/// Remove bilingual stopwords, preserving order
pub fn remove_stopwords(tokens: Vec<String>) -> Vec<String> {
    tokens.into_iter().filter(|t| !is_stopword(t)).collect()
}

/// Tokenize and drop stopwords in one pass; the term stream used by TF-IDF and Naive Bayes
pub fn analyze_terms(text: &str) -> Vec<String> {
    remove_stopwords(tokenize(text))
}
