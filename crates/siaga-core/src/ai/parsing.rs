//! JSON extraction from model responses
//!
//! Models often wrap the JSON payload in prose or code fences; we take the
//! text between the first `{` and the last `}`.

use crate::error::{Error, Result};

const MAX_RAW_IN_ERROR: usize = 200;

/// Slice out the outermost JSON object, if any
pub fn find_json_object(response: &str) -> Option<&str> {
    let response = response.trim();
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (start < end).then(|| &response[start..=end])
}

/// Parse the outermost JSON object of a response
///
/// `Ok(None)` when the response contains no object at all.
pub fn extract_json(response: &str) -> Result<Option<serde_json::Value>> {
    let Some(json_str) = find_json_object(response) else {
        return Ok(None);
    };
    serde_json::from_str(json_str).map(Some).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid JSON from AI: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })
}

fn truncate(raw: &str) -> String {
    if raw.len() > MAX_RAW_IN_ERROR {
        let cut = raw
            .char_indices()
            .map(|(i, _)| i)
            .take_while(|&i| i <= MAX_RAW_IN_ERROR)
            .last()
            .unwrap_or(0);
        format!("{}...", &raw[..cut])
    } else {
        raw.to_string()
    }
}
