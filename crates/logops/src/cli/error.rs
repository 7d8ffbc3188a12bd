//! Operator-facing errors for invocation-level failures
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use std::fmt;

use logops::dispatch::{Action, DispatchError};

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(
        mut self,
        suggestions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.suggestions
            .extend(suggestions.into_iter().map(|s| s.into()));
        self
    }
}

impl From<DispatchError> for HelpfulError {
    fn from(err: DispatchError) -> Self {
        let base = HelpfulError::new(err.to_string());
        match err {
            DispatchError::MissingArgument("action") => base
                .with_context("Every invocation needs an action")
                .with_suggestion(format!("TRY: logops --action <{}>", Action::names().join("|"))),
            DispatchError::MissingArgument(_) => base
                .with_context("parse and hourly-parse run a batch of jobs")
                .with_suggestion("TRY: logops --action parse --batch one"),
            DispatchError::InvalidAction { .. } => base
                .with_context("Action names are fixed")
                .with_suggestions(
                    Action::names()
                        .into_iter()
                        .map(|name| format!("TRY: logops --action {}", name)),
                ),
            DispatchError::InvalidBatch { options, .. } => base
                .with_context("Batches are defined in the built-in pipeline table")
                .with_suggestions(
                    options
                        .into_iter()
                        .map(|b| format!("TRY: logops --action parse --batch {}", b)),
                ),
            DispatchError::InvalidSwitch(_) => base
                .with_context("Date switches use YYYY-MM and YYYY-MM-DD")
                .with_suggestions([
                    "TRY: --year-months 2024-05 2024-06",
                    "TRY: --start-year-month-day 2024-06-01 --end-year-month-day 2024-06-30",
                ]),
            DispatchError::Table(_) => base
                .with_context("A job is listed before a job it depends on")
                .with_suggestion("TRY: restore the row order in pipeline/table.rs"),
        }
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While dispatching")
            .with_suggestion("Try again");

        let display = format!("{}", err);
        assert!(display.contains("ERROR: Something went wrong"));
        assert!(display.contains("CONTEXT: While dispatching"));
        assert!(display.contains("Try again"));
    }

    #[test]
    fn test_invalid_batch_lists_options() {
        let err: HelpfulError = DispatchError::InvalidBatch {
            batch: "three".to_string(),
            options: vec!["one".to_string(), "two".to_string()],
        }
        .into();

        let display = format!("{}", err);
        assert!(display.contains("invalid batch 'three'"));
        assert!(display.contains("--batch one"));
        assert!(display.contains("--batch two"));
    }

    #[test]
    fn test_missing_action_suggests_usage() {
        let err: HelpfulError = DispatchError::MissingArgument("action").into();
        let display = format!("{}", err);
        assert!(display.contains("no action specified"));
        assert!(display.contains("hourly-parse"));
    }
}
