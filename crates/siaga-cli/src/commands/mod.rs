//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `config` - Config loading and the `config` command
//! - `load` - Record file loading (JSON arrays or CSV) and argument parsing
//! - `report` - Full risk report
//! - `simulate` - What-if scenarios
//! - `text` - Classification, sentiment and search over free text

pub mod config;
pub mod load;
pub mod report;
pub mod simulate;
pub mod text;

// Re-export command functions for main.rs
pub use config::*;
pub use load::*;
pub use report::*;
pub use simulate::*;
pub use text::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
