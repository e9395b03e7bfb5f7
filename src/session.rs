#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! A grading run over one notebook: the notebook, its registry, the
//! assertion configuration and the execution results are each computed at
//! most once and shared by every check.

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
    time::Duration,
};

use anyhow::Result;
use bon::Builder;
use tokio::sync::OnceCell;

use crate::{
    config::AssertionConfig,
    constants::{DEFAULT_EXECUTION_TIMEOUT, DEFAULT_PARAMS_FILE, NO_PROBLEM_SELECTED},
    executor::NotebookExecutor,
    grade::{CheckCategory, CheckResult, ExecutionResults, ProblemExecution, script_code},
    notebook::Notebook,
    problems::ProblemLocator,
    registry::AnswerRegistry,
};

/// Grades one notebook with executor `E`.
#[derive(Builder)]
pub struct GradingSession<E: NotebookExecutor> {
    /// Notebook under test.
    #[builder(into)]
    notebook_path: PathBuf,
    /// Assertion file; defaults to `test_params.json` next to the notebook.
    #[builder(into)]
    params_path:   Option<PathBuf>,
    /// Runs the notebook for execution checks.
    executor:      E,
    /// Time budget handed to the executor.
    #[builder(default = DEFAULT_EXECUTION_TIMEOUT)]
    timeout:       Duration,
    /// Whether execution checks run at all.
    #[builder(default = true)]
    execute:       bool,
    /// Parsed notebook, or why it could not be read.
    #[builder(skip)]
    notebook:      OnceLock<Result<Notebook>>,
    /// Answer sections of the notebook.
    #[builder(skip)]
    registry:      OnceLock<AnswerRegistry>,
    /// Problem anchors of the notebook.
    #[builder(skip)]
    locator:       OnceLock<ProblemLocator>,
    /// Assertions read from the params file.
    #[builder(skip)]
    config:        OnceLock<AssertionConfig>,
    /// Outcome of running the notebook.
    #[builder(skip)]
    execution:     OnceCell<ExecutionResults>,
}

impl<E: NotebookExecutor> GradingSession<E> {
    /// Path of the notebook under test.
    pub fn notebook_path(&self) -> &Path {
        &self.notebook_path
    }

    /// The executor used for execution checks.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// The parsed notebook.
    pub fn notebook(&self) -> Result<&Notebook, &anyhow::Error> {
        self.notebook
            .get_or_init(|| Notebook::load(&self.notebook_path))
            .as_ref()
    }

    /// Answer registry; empty when the notebook could not be read.
    pub fn registry(&self) -> &AnswerRegistry {
        self.registry.get_or_init(|| {
            self.notebook()
                .map(AnswerRegistry::build)
                .unwrap_or_default()
        })
    }

    /// Problem anchors; none when the notebook could not be read.
    pub fn locator(&self) -> &ProblemLocator {
        self.locator.get_or_init(|| {
            self.notebook()
                .map_or_else(|_| ProblemLocator::from_cells(&[]), ProblemLocator::locate)
        })
    }

    /// Assertion configuration.
    pub fn config(&self) -> &AssertionConfig {
        self.config.get_or_init(|| {
            let path = self.params_path.clone().unwrap_or_else(|| {
                self.notebook_path
                    .parent()
                    .unwrap_or_else(|| Path::new("."))
                    .join(DEFAULT_PARAMS_FILE)
            });
            AssertionConfig::load_or_default(&path)
        })
    }

    /// Executes the notebook once and classifies its script sections.
    pub async fn execution(&self) -> &ExecutionResults {
        self.execution
            .get_or_init(|| async {
                let notebook = match self.notebook() {
                    Ok(nb) => nb,
                    Err(e) => {
                        return ExecutionResults::Failed {
                            error: format!("{e:#}"),
                        };
                    }
                };

                let executed = self.executor.execute(notebook, self.timeout).await;
                if let Err(e) = &executed {
                    tracing::warn!("Notebook execution failed: {e}");
                }
                ExecutionResults::classify(executed.as_ref(), self.registry())
            })
            .await
    }

    /// Runs every check. Content and execution checks need a problem number;
    /// without one they are reported as skipped.
    pub async fn run(&self, problem: Option<usize>) -> Vec<CheckResult> {
        let mut results = self.structure_checks();
        match problem {
            Some(p) => {
                results.extend(self.content_checks(p));
                results.extend(self.execution_checks(p).await);
            }
            None => {
                results.extend(
                    [
                        (CheckCategory::Content, "problem_responses_not_empty"),
                        (CheckCategory::Content, "problem_script_content"),
                        (CheckCategory::Execution, "problem_execution_status"),
                        (CheckCategory::Execution, "problem_execution_results"),
                    ]
                    .map(|(category, name)| {
                        CheckResult::skipped(category, name, NO_PROBLEM_SELECTED)
                    }),
                );
            }
        }
        results
    }

    /// Checks that need no problem number.
    pub fn structure_checks(&self) -> Vec<CheckResult> {
        use CheckCategory::Structure;

        let exists = if self.notebook_path.is_file() {
            CheckResult::passed(Structure, "notebook_exists")
        } else {
            CheckResult::failed(
                Structure,
                "notebook_exists",
                format!("Notebook not found: {}", self.notebook_path.display()),
            )
        };

        let (sequence, responses) = match self.notebook() {
            Err(e) => (
                CheckResult::failed(Structure, "problem_subproblem_sequence", format!("{e:#}")),
                CheckResult::failed(
                    Structure,
                    "cells_exist_after_subproblem_tags",
                    format!("{e:#}"),
                ),
            ),
            Ok(nb) => {
                let sequence = match self.locator().check_sequence(&nb.cells) {
                    Ok(()) => CheckResult::passed(Structure, "problem_subproblem_sequence"),
                    Err(e) => {
                        CheckResult::failed(Structure, "problem_subproblem_sequence", e.to_string())
                    }
                };
                let empty = self
                    .registry()
                    .iter()
                    .filter(|s| s.is_empty())
                    .map(|s| format!("No response cells found after '{}' section", s.subproblem))
                    .collect();
                (
                    sequence,
                    CheckResult::from_reasons(Structure, "cells_exist_after_subproblem_tags", empty),
                )
            }
        };

        vec![exists, sequence, responses]
    }

    /// Content checks for 1-based problem `problem`.
    pub fn content_checks(&self, problem: usize) -> Vec<CheckResult> {
        use CheckCategory::Content;
        const RESPONSES: &str = "problem_responses_not_empty";
        const SCRIPT: &str = "problem_script_content";

        let notebook = match self.notebook() {
            Ok(nb) => nb,
            Err(e) => {
                return vec![
                    CheckResult::failed(Content, RESPONSES, format!("{e:#}")),
                    CheckResult::failed(Content, SCRIPT, format!("{e:#}")),
                ];
            }
        };
        let sections = match self.locator().select(problem, self.registry()) {
            Ok(sections) => sections,
            Err(e) => {
                return vec![
                    CheckResult::failed(Content, RESPONSES, e.to_string()),
                    CheckResult::failed(Content, SCRIPT, e.to_string()),
                ];
            }
        };

        let responses = if sections.is_empty() {
            CheckResult::failed(
                Content,
                RESPONSES,
                format!("No sections found for problem {problem}"),
            )
        } else {
            let reasons = sections
                .iter()
                .filter(|s| {
                    !s.cells
                        .iter()
                        .filter_map(|&idx| notebook.cell(idx))
                        .any(|c| !c.source_text().trim().is_empty())
                })
                .map(|s| {
                    format!(
                        "All response cells are empty for '{}' section in problem {problem}",
                        s.subproblem
                    )
                })
                .collect();
            CheckResult::from_reasons(Content, RESPONSES, reasons)
        };

        let code = script_code(notebook, sections.iter().copied());
        let script = if code.trim().is_empty() {
            CheckResult::failed(
                Content,
                SCRIPT,
                format!("Problem {problem} script section contains no code"),
            )
        } else {
            let reasons = self
                .config()
                .for_problem(problem)
                .content_assertions
                .evaluate(&code)
                .into_iter()
                .map(|v| format!("Problem {problem} {v}"))
                .collect();
            CheckResult::from_reasons(Content, SCRIPT, reasons)
        };

        vec![responses, script]
    }

    /// Execution checks for 1-based problem `problem`.
    pub async fn execution_checks(&self, problem: usize) -> Vec<CheckResult> {
        use CheckCategory::Execution;
        const STATUS: &str = "problem_execution_status";
        const RESULTS: &str = "problem_execution_results";

        if !self.execute {
            return vec![
                CheckResult::skipped(Execution, STATUS, "Notebook execution disabled"),
                CheckResult::skipped(Execution, RESULTS, "Notebook execution disabled"),
            ];
        }

        let results = self.execution().await;
        let extent = match (results, self.locator().extent(problem)) {
            (ExecutionResults::Failed { error }, _) => {
                return vec![
                    CheckResult::failed(
                        Execution,
                        STATUS,
                        format!("Problem {problem} execution failed: {error}"),
                    ),
                    CheckResult::skipped(Execution, RESULTS, "Notebook execution failed"),
                ];
            }
            (_, Err(e)) => {
                return vec![
                    CheckResult::failed(Execution, STATUS, e.to_string()),
                    CheckResult::failed(Execution, RESULTS, e.to_string()),
                ];
            }
            (_, Ok(extent)) => extent,
        };

        match results.for_extent(&extent) {
            ProblemExecution::Failed(error) => vec![
                CheckResult::failed(
                    Execution,
                    STATUS,
                    format!("Problem {problem} execution failed: {error}"),
                ),
                CheckResult::skipped(Execution, RESULTS, "Notebook execution failed"),
            ],
            ProblemExecution::NoExecutionData => vec![
                CheckResult::failed(
                    Execution,
                    STATUS,
                    format!("No execution data found for problem {problem}"),
                ),
                CheckResult::skipped(
                    Execution,
                    RESULTS,
                    format!("No execution data for problem {problem}"),
                ),
            ],
            ProblemExecution::Section(section) => {
                let status = if section.attempted() == 0 {
                    CheckResult::failed(
                        Execution,
                        STATUS,
                        format!("No execution attempts found for problem {problem}"),
                    )
                } else {
                    CheckResult::passed(Execution, STATUS)
                };
                let reasons = self
                    .config()
                    .for_problem(problem)
                    .execution_assertions
                    .evaluate(section)
                    .into_iter()
                    .map(|v| format!("Problem {problem} {v}"))
                    .collect();
                vec![status, CheckResult::from_reasons(Execution, RESULTS, reasons)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        executor::ExecutionError,
        grade::CheckStatus,
        notebook::{Cell, Output},
    };

    /// Returns the notebook unchanged, or a fixed failure.
    struct Echo {
        /// Whether to fail instead.
        fail: bool,
    }

    impl NotebookExecutor for Echo {
        async fn execute(
            &self,
            notebook: &Notebook,
            _timeout: Duration,
        ) -> Result<Notebook, ExecutionError> {
            if self.fail {
                Err(ExecutionError::Failed("kernel died".into()))
            } else {
                Ok(notebook.clone())
            }
        }
    }

    fn write_notebook(name: &str, nb: &Notebook) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("nbgrade-session-{name}-{}.ipynb", std::process::id()));
        nb.save(&path).unwrap();
        path
    }

    fn one_problem() -> Notebook {
        let none = Vec::<String>::new;
        Notebook::from_cells([
            Cell::markdown("# Problem 1", ["problem"]),
            Cell::markdown("## Summarize", ["summarize"]),
            Cell::markdown("It sums things.", none()),
            Cell::markdown("## Plan", ["plan"]),
            Cell::markdown("Loop.", none()),
            Cell::markdown("## Script", ["script"]),
            Cell::code("x = 1\nprint(x)", none()).with_outputs([Output::stream("1\n")]),
            Cell::markdown("## Reflect", ["reflect"]),
            Cell::markdown("Fine.", none()),
        ])
    }

    #[tokio::test]
    async fn a_complete_problem_passes_everything() {
        let path = write_notebook("complete", &one_problem());
        let session = GradingSession::builder()
            .notebook_path(&path)
            .params_path(path.with_extension("absent.json"))
            .executor(Echo { fail: false })
            .build();

        let results = session.run(Some(1)).await;
        assert_eq!(results.len(), 7);
        assert!(
            results.iter().all(|r| r.status() == CheckStatus::Passed),
            "{results:?}"
        );
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn total_execution_failure_is_reported_once() {
        let path = write_notebook("failing", &one_problem());
        let session = GradingSession::builder()
            .notebook_path(&path)
            .executor(Echo { fail: true })
            .build();

        let checks = session.execution_checks(1).await;
        assert_eq!(checks[0].status(), CheckStatus::Failed);
        assert_eq!(
            checks[0].reason(),
            "Problem 1 execution failed: notebook executor failed: kernel died"
        );
        assert_eq!(checks[1].status(), CheckStatus::Skipped);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn unreadable_notebooks_fail_structure_checks() {
        let session = GradingSession::builder()
            .notebook_path("/definitely/not/here/hw01.ipynb")
            .executor(Echo { fail: false })
            .build();
        let checks = session.structure_checks();
        assert!(checks.iter().all(CheckResult::is_failed));
        assert!(session.registry().is_empty());
    }
}
