#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Export of check results in the Gradescope autograder format.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use super::results::{CheckResult, CheckStatus, Summary};

/// Output format of test case text. Check reasons are plain text.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GradescopeOutputFormat {
    /// Plain text format.
    Text,
}

/// Visibility of the results. Students always see their check results.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GradescopeVisibility {
    /// Always visible to students.
    Visible,
}

/// Represents the status of a test case in Gradescope submissions.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GradescopeStatus {
    /// Indicates the test case passed successfully.
    Passed,
    /// Indicates the test case failed.
    Failed,
}

/// Represents the overall submission data.
#[derive(Serialize, Deserialize, Debug, TypedBuilder)]
#[builder(field_defaults(default, setter(into)))]
#[builder(doc)]
pub struct GradescopeSubmission {
    /// Optional overall score. Overrides total of test cases if specified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Optional text relevant to the entire submission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Optional default output format for test case outputs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_output_format: Option<GradescopeOutputFormat>,

    /// Optional visibility setting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<GradescopeVisibility>,

    /// Optional test cases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<Vec<GradescopeTestCase>>,
}

/// Represents an individual test case.
#[derive(Serialize, Deserialize, Debug, TypedBuilder)]
#[builder(field_defaults(default, setter(into)))]
#[builder(doc)]
pub struct GradescopeTestCase {
    /// Optional score for the test case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Optional maximum score for the test case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,

    /// Optional status of the test case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GradescopeStatus>,

    /// Optional name of the test case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Optional detailed output for the test case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Optional tags associated with the test case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl GradescopeSubmission {
    /// One test case per non-skipped check, worth one point each.
    pub fn from_results(results: &[CheckResult]) -> Self {
        let tests = results
            .iter()
            .filter(|r| r.status() != CheckStatus::Skipped)
            .map(|r| {
                let passed = r.status() == CheckStatus::Passed;
                GradescopeTestCase::builder()
                    .name(r.name().to_string())
                    .score(if passed { 1.0 } else { 0.0 })
                    .max_score(1.0)
                    .status(if passed {
                        GradescopeStatus::Passed
                    } else {
                        GradescopeStatus::Failed
                    })
                    .output(r.reason().to_string())
                    .tags(vec![r.category().to_string()])
                    .build()
            })
            .collect::<Vec<_>>();

        let score: f64 = tests.iter().filter_map(|t| t.score).sum();
        GradescopeSubmission::builder()
            .score(score)
            .output(Summary::of(results).to_string())
            .tests(tests)
            .test_output_format(GradescopeOutputFormat::Text)
            .visibility(GradescopeVisibility::Visible)
            .build()
    }

    /// Writes the submission as pretty JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Could not serialize results")?;
        std::fs::write(path, json)
            .with_context(|| format!("Could not write results to {}", path.display()))
    }
}
