#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Declarative checks over the code of a problem's `script` answers.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    notebook::{Notebook, Subproblem},
    registry::Section,
};

/// Content rules for one problem, as read from the assertion file. Every
/// rule is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentAssertions {
    /// Substrings that must occur literally.
    pub script_contains:     Option<Vec<String>>,
    /// Regular expressions that must match somewhere.
    pub script_patterns:     Option<Vec<String>>,
    /// Minimum number of non-blank lines.
    pub min_lines:           Option<usize>,
    /// Names that must be assigned to.
    pub required_variables:  Option<Vec<String>>,
    /// Names that must be defined as functions.
    pub required_functions:  Option<Vec<String>>,
    /// Substrings that must not occur anywhere.
    pub forbidden_functions: Option<Vec<String>>,
}

impl ContentAssertions {
    /// Flattens the configured rules into individual checks, grouped by kind
    /// in declaration order.
    pub fn rules(&self) -> Vec<ContentRule> {
        /// Maps an optional list through a rule constructor.
        fn each(list: &Option<Vec<String>>, make: fn(String) -> ContentRule) -> Vec<ContentRule> {
            list.iter().flatten().cloned().map(make).collect()
        }

        let mut rules = each(&self.script_contains, ContentRule::Contains);
        rules.extend(each(&self.script_patterns, ContentRule::Pattern));
        rules.extend(self.min_lines.map(ContentRule::MinLines));
        rules.extend(each(&self.required_variables, ContentRule::Variable));
        rules.extend(each(&self.required_functions, ContentRule::Function));
        rules.extend(each(&self.forbidden_functions, ContentRule::Forbidden));
        rules
    }

    /// Evaluates every rule against `code` and returns all violations.
    pub fn evaluate(&self, code: &str) -> Vec<ContentViolation> {
        self.rules()
            .iter()
            .filter_map(|rule| rule.evaluate(code).err())
            .collect()
    }
}

/// A single content check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRule {
    /// The text must contain this substring.
    Contains(String),
    /// This regular expression must match.
    Pattern(String),
    /// At least this many non-blank lines.
    MinLines(usize),
    /// The name must be assigned: `name` followed by optional whitespace
    /// and `=`.
    Variable(String),
    /// A `def name(` signature must exist.
    Function(String),
    /// The substring must not occur.
    Forbidden(String),
}

impl ContentRule {
    /// Checks `code` against this rule.
    pub fn evaluate(&self, code: &str) -> Result<(), ContentViolation> {
        match self {
            ContentRule::Contains(text) => code
                .contains(text.as_str())
                .then_some(())
                .ok_or_else(|| ContentViolation::MissingText(text.clone())),
            ContentRule::Pattern(pattern) => match Regex::new(pattern) {
                Ok(re) if re.is_match(code) => Ok(()),
                Ok(_) => Err(ContentViolation::MissingPattern(pattern.clone())),
                Err(e) => Err(ContentViolation::InvalidPattern {
                    pattern: pattern.clone(),
                    reason:  e.to_string(),
                }),
            },
            ContentRule::MinLines(min) => {
                let found = count_code_lines(code);
                if found >= *min {
                    Ok(())
                } else {
                    Err(ContentViolation::TooFewLines { found, min: *min })
                }
            }
            ContentRule::Variable(name) => {
                let re = word_regex(name, r"\s*=")?;
                re.is_match(code)
                    .then_some(())
                    .ok_or_else(|| ContentViolation::MissingVariable(name.clone()))
            }
            ContentRule::Function(name) => {
                let re = Regex::new(&format!(r"\bdef\s+{}\s*\(", regex::escape(name)))
                    .map_err(|e| ContentViolation::InvalidPattern {
                        pattern: name.clone(),
                        reason:  e.to_string(),
                    })?;
                re.is_match(code)
                    .then_some(())
                    .ok_or_else(|| ContentViolation::MissingFunction(name.clone()))
            }
            ContentRule::Forbidden(text) => {
                if code.contains(text.as_str()) {
                    Err(ContentViolation::Forbidden(text.clone()))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Builds `\b<escaped name><suffix>`.
fn word_regex(name: &str, suffix: &str) -> Result<Regex, ContentViolation> {
    Regex::new(&format!(r"\b{}{suffix}", regex::escape(name))).map_err(|e| {
        ContentViolation::InvalidPattern {
            pattern: name.to_string(),
            reason:  e.to_string(),
        }
    })
}

/// Lines that are not blank after trimming.
pub fn count_code_lines(code: &str) -> usize {
    code.split('\n').filter(|l| !l.trim().is_empty()).count()
}

/// A failed content rule. The message names the rule and the argument.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentViolation {
    /// A required substring is absent.
    #[error("script missing required text: '{0}'")]
    MissingText(String),
    /// A required pattern does not match.
    #[error("script missing required pattern: '{0}'")]
    MissingPattern(String),
    /// A configured pattern does not compile.
    #[error("script pattern '{pattern}' is not a valid regular expression: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Compiler message.
        reason:  String,
    },
    /// Too few non-blank lines.
    #[error("script has {found} lines, expected at least {min}")]
    TooFewLines {
        /// Non-blank lines present.
        found: usize,
        /// Required minimum.
        min:   usize,
    },
    /// A required assignment is absent.
    #[error("script missing required variable: '{0}'")]
    MissingVariable(String),
    /// A required function definition is absent.
    #[error("script missing required function: '{0}'")]
    MissingFunction(String),
    /// A forbidden substring is present.
    #[error("script contains forbidden function: '{0}'")]
    Forbidden(String),
}

/// Source of every code cell in the `script` sections among `sections`,
/// joined by newlines in section order.
pub fn script_code<'a>(
    notebook: &Notebook,
    sections: impl IntoIterator<Item = &'a Section>,
) -> String {
    sections
        .into_iter()
        .filter(|s| s.subproblem == Subproblem::Script)
        .flat_map(|s| s.cells.iter())
        .filter_map(|&idx| notebook.cell(idx))
        .filter(|c| c.is_code())
        .map(|c| c.source_text())
        .collect::<Vec<_>>()
        .join("\n")
}
