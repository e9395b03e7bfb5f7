#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Declarative checks over a classified section's execution results.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::execution::SectionExecution;
use crate::notebook::output_text;

/// Execution rules for one problem, as read from the assertion file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionAssertions {
    /// Whether every cell must run without an error output.
    pub no_errors:            bool,
    /// Minimum number of cells that ran cleanly.
    pub min_successful_cells: Option<usize>,
    /// Substrings that must appear in the textual output.
    pub expected_outputs:     Option<Vec<String>>,
    /// Regular expressions that must match the textual output.
    pub output_patterns:      Option<Vec<String>>,
    /// Accepted for compatibility; variable inspection is not performed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_variables:   Option<Value>,
}

impl ExecutionAssertions {
    /// Flattens the configured rules into individual checks.
    pub fn rules(&self) -> Vec<OutputRule> {
        let mut rules = Vec::new();
        if self.no_errors {
            rules.push(OutputRule::NoErrors);
        }
        rules.extend(self.min_successful_cells.map(OutputRule::MinSuccessfulCells));
        rules.extend(
            self.expected_outputs
                .iter()
                .flatten()
                .cloned()
                .map(OutputRule::ExpectedOutput),
        );
        rules.extend(
            self.output_patterns
                .iter()
                .flatten()
                .cloned()
                .map(OutputRule::OutputPattern),
        );
        if self.expected_variables.is_some() {
            tracing::debug!("expected_variables is accepted but not evaluated");
        }
        rules
    }

    /// Evaluates every rule against `section` and returns all violations.
    pub fn evaluate(&self, section: &SectionExecution) -> Vec<OutputViolation> {
        let text = output_text(&section.outputs);
        self.rules()
            .iter()
            .filter_map(|rule| rule.evaluate(section, &text).err())
            .collect()
    }
}

/// A single execution check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputRule {
    /// No cell may have failed.
    NoErrors,
    /// At least this many cells ran cleanly.
    MinSuccessfulCells(usize),
    /// The output text contains this substring.
    ExpectedOutput(String),
    /// This regular expression matches the output text.
    OutputPattern(String),
}

impl OutputRule {
    /// Checks one rule. `text` is the concatenated textual output of
    /// `section`.
    pub fn evaluate(&self, section: &SectionExecution, text: &str) -> Result<(), OutputViolation> {
        match self {
            OutputRule::NoErrors if section.has_errors => Err(OutputViolation::HasErrors),
            OutputRule::NoErrors => Ok(()),
            OutputRule::MinSuccessfulCells(min) => {
                let found = section.successful_cells.len();
                if found >= *min {
                    Ok(())
                } else {
                    Err(OutputViolation::TooFewSuccessfulCells { found, min: *min })
                }
            }
            OutputRule::ExpectedOutput(expected) if text.contains(expected.as_str()) => Ok(()),
            OutputRule::ExpectedOutput(expected) => {
                Err(OutputViolation::MissingOutput(expected.clone()))
            }
            OutputRule::OutputPattern(pattern) => match Regex::new(pattern) {
                Ok(re) if re.is_match(text) => Ok(()),
                Ok(_) => Err(OutputViolation::MissingPattern(pattern.clone())),
                Err(e) => Err(OutputViolation::InvalidPattern {
                    pattern: pattern.clone(),
                    reason:  e.to_string(),
                }),
            },
        }
    }
}

/// A failed execution rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputViolation {
    /// A cell raised although none should.
    #[error("execution has errors but none were expected")]
    HasErrors,
    /// Too few cells ran cleanly.
    #[error("has {found} successful cells, expected at least {min}")]
    TooFewSuccessfulCells {
        /// Cells that ran cleanly.
        found: usize,
        /// Required minimum.
        min:   usize,
    },
    /// An expected substring is absent from the output.
    #[error("missing expected output: '{0}'")]
    MissingOutput(String),
    /// A required pattern does not match the output.
    #[error("output missing required pattern: '{0}'")]
    MissingPattern(String),
    /// A configured pattern does not compile.
    #[error("output pattern '{pattern}' is not a valid regular expression: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Compiler message.
        reason:  String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::{Cell, Notebook, Output};

    fn section(outputs: Vec<Output>) -> SectionExecution {
        let nb = Notebook::from_cells([Cell::code("", Vec::<String>::new()).with_outputs(outputs)]);
        SectionExecution::classify(&nb, &[0])
    }

    fn assertions(json: Value) -> ExecutionAssertions {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn expected_outputs_match_stream_text() {
        let s = section(vec![Output::stream("Result: 42\n")]);
        assert!(
            assertions(serde_json::json!({"expected_outputs": ["Result: 42"]}))
                .evaluate(&s)
                .is_empty()
        );
        assert_eq!(
            assertions(serde_json::json!({"expected_outputs": ["Result: 43"]})).evaluate(&s),
            vec![OutputViolation::MissingOutput("Result: 43".into())]
        );
    }

    #[test]
    fn no_errors_fails_on_error_output() {
        let s = section(vec![Output::error("NameError", "name 'x' is not defined", vec![])]);
        assert!(s.has_errors);
        let rules = assertions(serde_json::json!({"no_errors": true, "min_successful_cells": 1}));
        assert_eq!(
            rules.evaluate(&s),
            vec![
                OutputViolation::HasErrors,
                OutputViolation::TooFewSuccessfulCells { found: 0, min: 1 },
            ]
        );
    }

    #[test]
    fn patterns_see_results_and_displays() {
        let s = section(vec![Output::execute_result("0.5"), Output::display_data("<Figure 1>")]);
        let rules = assertions(serde_json::json!({
            "output_patterns": [r"^0\.\d+", "Figure \\d"],
            "expected_variables": ["x"]
        }));
        assert!(rules.evaluate(&s).is_empty());
        assert_eq!(rules.rules().len(), 2);
    }

    #[test]
    fn no_errors_false_is_not_a_rule() {
        let rules = assertions(serde_json::json!({"no_errors": false}));
        assert!(rules.rules().is_empty());
    }
}
