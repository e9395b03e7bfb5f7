#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::Display;

use bon::Builder;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, Width, object::Rows},
};

/// Which family a check belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    /// Notebook organisation; always run.
    Structure,
    /// Answer content of the selected problem.
    Content,
    /// Execution of the selected problem's script.
    Execution,
}

impl Display for CheckCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CheckCategory::Structure => "structure",
            CheckCategory::Content => "content",
            CheckCategory::Execution => "execution",
        })
    }
}

/// Outcome of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Every expectation held.
    #[default]
    Passed,
    /// At least one expectation was violated.
    Failed,
    /// Nothing meaningful could be evaluated.
    Skipped,
}

impl Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CheckStatus::Passed => "passed",
            CheckStatus::Failed => "failed",
            CheckStatus::Skipped => "skipped",
        })
    }
}

#[derive(Tabled, Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
/// A struct to store check results and display them
pub struct CheckResult {
    #[tabled(rename = "Check")]
    /// * `name`: identifier of the check
    pub(crate) name:     String,
    #[tabled(rename = "Category")]
    /// * `category`: family of the check
    pub(crate) category: CheckCategory,
    #[tabled(rename = "Status")]
    /// * `status`: outcome of the check
    #[builder(default)]
    pub(crate) status:   CheckStatus,
    #[tabled(rename = "Reason")]
    /// * `reason`: every violated expectation, one per line
    #[builder(default)]
    pub(crate) reason:   String,
}

impl CheckResult {
    /// A passed check.
    pub fn passed(category: CheckCategory, name: impl Into<String>) -> Self {
        Self::builder().name(name).category(category).build()
    }

    /// A failed check with the given reason.
    pub fn failed(
        category: CheckCategory,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::builder()
            .name(name)
            .category(category)
            .status(CheckStatus::Failed)
            .reason(reason)
            .build()
    }

    /// A skipped check with the given reason.
    pub fn skipped(
        category: CheckCategory,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::builder()
            .name(name)
            .category(category)
            .status(CheckStatus::Skipped)
            .reason(reason)
            .build()
    }

    /// Passed when `reasons` is empty, otherwise failed with the reasons
    /// joined by newlines.
    pub fn from_reasons(
        category: CheckCategory,
        name: impl Into<String>,
        reasons: Vec<String>,
    ) -> Self {
        if reasons.is_empty() {
            Self::passed(category, name)
        } else {
            Self::failed(category, name, reasons.join("\n"))
        }
    }

    /// Returns the check name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the check category.
    pub fn category(&self) -> CheckCategory {
        self.category
    }

    /// Returns the outcome.
    pub fn status(&self) -> CheckStatus {
        self.status
    }

    /// Returns the failure or skip reason; empty for passed checks.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Whether the check failed.
    pub fn is_failed(&self) -> bool {
        self.status == CheckStatus::Failed
    }
}

/// Counts of each outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Passed checks.
    pub passed:  usize,
    /// Failed checks.
    pub failed:  usize,
    /// Skipped checks.
    pub skipped: usize,
}

impl Summary {
    /// Tallies `results`.
    pub fn of(results: &[CheckResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            match r.status {
                CheckStatus::Passed => acc.passed += 1,
                CheckStatus::Failed => acc.failed += 1,
                CheckStatus::Skipped => acc.skipped += 1,
            }
            acc
        })
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Passed: {}, Failed: {}, Skipped: {}",
            self.passed, self.failed, self.skipped
        )
    }
}

/// Renders results as a table with a summary footer.
pub fn render_table(results: &[CheckResult]) -> String {
    let summary = Summary::of(results);
    Table::new(results)
        .with(Panel::header("Grading Overview"))
        .with(Panel::footer(summary.to_string()))
        .with(Modify::new(Rows::new(1..)).with(Width::wrap(48).keep_words(true)))
        .with(
            Modify::new(Rows::first())
                .with(Alignment::center())
                .with(Alignment::center_vertical()),
        )
        .with(
            Modify::new(Rows::last())
                .with(Alignment::center())
                .with(Alignment::center_vertical()),
        )
        .with(Style::modern())
        .to_string()
}

/// Prints the table to stderr followed by a coloured one-line verdict.
pub fn show_results(results: &[CheckResult]) {
    let summary = Summary::of(results);
    eprintln!("{}", render_table(results));
    let verdict = if summary.failed > 0 {
        summary.to_string().red().bold()
    } else {
        summary.to_string().green().bold()
    };
    eprintln!("{verdict}");
}
