//! Prompt templates for narrative enrichment
//!
//! Templates are markdown files with `# System` and `# User` sections and
//! mustache-style `{{var}}` placeholders, compiled into the binary.

use std::collections::HashMap;

mod defaults {
    pub const ACTION_PLAN: &str = include_str!("../../../prompts/action_plan.md");
    pub const BUDGET_SUGGESTION: &str = include_str!("../../../prompts/budget_suggestion.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Three localized action-plan steps for a financial forecast
    ActionPlan,
    /// One-sentence budgeting suggestion for the report
    BudgetSuggestion,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActionPlan => "action_plan",
            Self::BudgetSuggestion => "budget_suggestion",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[Self::ActionPlan, Self::BudgetSuggestion]
    }

    fn content(&self) -> &'static str {
        match self {
            Self::ActionPlan => defaults::ACTION_PLAN,
            Self::BudgetSuggestion => defaults::BUDGET_SUGGESTION,
        }
    }
}

/// A prompt template
#[derive(Debug, Clone, Copy)]
pub struct Prompt {
    pub id: PromptId,
    pub content: &'static str,
}

impl Prompt {
    pub fn get(id: PromptId) -> Self {
        Self {
            id,
            content: id.content(),
        }
    }

    pub fn system_section(&self) -> Option<&'static str> {
        extract_section(self.content, "# System")
    }

    pub fn user_section(&self) -> Option<&'static str> {
        extract_section(self.content, "# User")
    }

    /// System and user sections joined, with variables replaced
    pub fn render(&self, vars: &HashMap<&str, String>) -> String {
        let body = match (self.system_section(), self.user_section()) {
            (Some(system), Some(user)) => format!("{}\n\n{}", system, user),
            (None, Some(user)) => user.to_string(),
            _ => self.content.to_string(),
        };
        substitute(&body, vars)
    }
}

fn substitute(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let pattern = format!("{{{{{}}}}}", key);
        result = result.replace(&pattern, value);
    }
    result
}

/// Text between `header` and the next top-level header
fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)? + header.len();
    let rest = &content[start..];
    let end = rest.find("\n# ").unwrap_or(rest.len());
    Some(rest[..end].trim())
}
