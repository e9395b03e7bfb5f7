#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Splits the cells of executed `script` sections into successes and
//! failures.

use std::ops::Range;

use serde::Serialize;

use crate::{
    executor::ExecutionError,
    notebook::{Cell, Notebook, Output, Subproblem},
    registry::AnswerRegistry,
};

/// The exception recorded by a failed cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellError {
    /// Exception class name.
    pub ename:     String,
    /// Exception message.
    pub evalue:    String,
    /// Formatted traceback lines.
    pub traceback: Vec<String>,
}

/// What one executed code cell produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellExecution {
    /// Index of the cell in the notebook.
    pub cell_index:      usize,
    /// Kernel execution counter.
    pub execution_count: Option<i64>,
    /// Source that was run.
    pub source:          String,
    /// Outputs in order.
    pub outputs:         Vec<Output>,
    /// The first error output, if any.
    pub error:           Option<CellError>,
}

impl CellExecution {
    /// Classifies cell `index` of an executed notebook.
    fn from_cell(index: usize, cell: &Cell) -> Self {
        let error = cell
            .outputs()
            .iter()
            .find(|o| o.is_error())
            .map(|o| CellError {
                ename:     o.ename.clone().unwrap_or_default(),
                evalue:    o.evalue.clone().unwrap_or_default(),
                traceback: o.traceback.clone().unwrap_or_default(),
            });

        Self {
            cell_index: index,
            execution_count: cell.execution_count(),
            source: cell.source_text(),
            outputs: cell.outputs().to_vec(),
            error,
        }
    }
}

/// Aggregate execution result of one section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectionExecution {
    /// Cells that ran without an error output.
    pub successful_cells: Vec<CellExecution>,
    /// Cells with an error output.
    pub failed_cells:     Vec<CellExecution>,
    /// Every output of every code cell, in order.
    pub outputs:          Vec<Output>,
    /// Whether any cell failed.
    pub has_errors:       bool,
}

impl SectionExecution {
    /// Classifies the code cells at `indices`. Indices past the end of the
    /// notebook and non-code cells are skipped.
    pub fn classify(notebook: &Notebook, indices: &[usize]) -> Self {
        let mut result = Self::default();

        for &idx in indices {
            let Some(cell) = notebook.cell(idx) else {
                continue;
            };
            if !cell.is_code() {
                continue;
            }

            let execution = CellExecution::from_cell(idx, cell);
            result.outputs.extend(execution.outputs.iter().cloned());
            if execution.error.is_some() {
                result.has_errors = true;
                result.failed_cells.push(execution);
            } else {
                result.successful_cells.push(execution);
            }
        }

        result
    }

    /// Number of cells that ran at all.
    pub fn attempted(&self) -> usize {
        self.successful_cells.len() + self.failed_cells.len()
    }
}

/// Execution results for a whole notebook.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionResults {
    /// The executor could not run the notebook; every section shares this
    /// cause.
    Failed {
        /// What went wrong.
        error: String,
    },
    /// Per-section results for every `script` section, in registry order.
    Completed {
        /// `(section key, anchor, result)` triples.
        sections: Vec<(String, usize, SectionExecution)>,
    },
}

impl ExecutionResults {
    /// Classifies every `script` section of `registry` against the executed
    /// notebook, or records the total failure.
    pub fn classify(
        executed: Result<&Notebook, &ExecutionError>,
        registry: &AnswerRegistry,
    ) -> Self {
        let notebook = match executed {
            Ok(nb) => nb,
            Err(e) => {
                return ExecutionResults::Failed {
                    error: e.to_string(),
                };
            }
        };

        let sections = registry
            .of(Subproblem::Script)
            .map(|s| (s.key(), s.anchor, SectionExecution::classify(notebook, &s.cells)))
            .collect::<Vec<_>>();

        let results = ExecutionResults::Completed { sections };
        tracing::info!(
            "Classified {} script sections, {} with errors",
            results.total_sections(),
            results.sections_with_errors()
        );
        results
    }

    /// Number of classified sections.
    pub fn total_sections(&self) -> usize {
        match self {
            ExecutionResults::Failed { .. } => 0,
            ExecutionResults::Completed { sections } => sections.len(),
        }
    }

    /// Number of classified sections with at least one failed cell.
    pub fn sections_with_errors(&self) -> usize {
        match self {
            ExecutionResults::Failed { .. } => 0,
            ExecutionResults::Completed { sections } => {
                sections.iter().filter(|(_, _, s)| s.has_errors).count()
            }
        }
    }

    /// Result of the first `script` section anchored strictly inside
    /// `extent`.
    pub fn for_extent(&self, extent: &Range<usize>) -> ProblemExecution<'_> {
        match self {
            ExecutionResults::Failed { error } => ProblemExecution::Failed(error),
            ExecutionResults::Completed { sections } => sections
                .iter()
                .find(|(_, anchor, _)| *anchor > extent.start && *anchor < extent.end)
                .map_or(ProblemExecution::NoExecutionData, |(_, _, s)| {
                    ProblemExecution::Section(s)
                }),
        }
    }
}

/// Execution data as seen from one problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProblemExecution<'a> {
    /// The notebook could not be executed at all.
    Failed(&'a str),
    /// The problem has no `script` section.
    NoExecutionData,
    /// The problem's script section result.
    Section(&'a SectionExecution),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::Cell;

    fn executed() -> Notebook {
        Notebook::from_cells([
            Cell::markdown("P1", ["problem"]),
            Cell::markdown("", ["script"]),
            Cell::code("print('Result: 42')", Vec::<String>::new())
                .with_outputs([Output::stream("Result: 42\n")]),
            Cell::markdown("notes", Vec::<String>::new()),
            Cell::code("1/0", Vec::<String>::new()).with_outputs([
                Output::stream("about to fail\n"),
                Output::error("ZeroDivisionError", "division by zero", vec!["tb".into()]),
            ]),
            Cell::markdown("", ["reflect"]),
        ])
    }

    #[test]
    fn cells_split_by_error_outputs() {
        let nb = executed();
        let section = SectionExecution::classify(&nb, &[2, 3, 4, 99]);
        assert_eq!(section.successful_cells.len(), 1);
        assert_eq!(section.failed_cells.len(), 1);
        assert!(section.has_errors);
        assert_eq!(section.outputs.len(), 3);
        assert_eq!(section.attempted(), 2);

        let err = section.failed_cells[0].error.as_ref().unwrap();
        assert_eq!(err.ename, "ZeroDivisionError");
        assert_eq!(err.evalue, "division by zero");
        assert_eq!(err.traceback, vec!["tb".to_string()]);
    }

    #[test]
    fn only_script_sections_are_classified() {
        let nb = executed();
        let registry = AnswerRegistry::build(&nb);
        let results = ExecutionResults::classify(Ok(&nb), &registry);
        assert_eq!(results.total_sections(), 1);
        assert_eq!(results.sections_with_errors(), 1);

        match results.for_extent(&(0..nb.len())) {
            ProblemExecution::Section(s) => assert_eq!(s.failed_cells[0].cell_index, 4),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(results.for_extent(&(1..nb.len())), ProblemExecution::NoExecutionData);
    }

    #[test]
    fn total_failure_short_circuits() {
        let nb = executed();
        let registry = AnswerRegistry::build(&nb);
        let error = ExecutionError::TimedOut(60);
        let results = ExecutionResults::classify(Err(&error), &registry);
        assert_eq!(results.total_sections(), 0);
        assert!(matches!(results.for_extent(&(0..6)), ProblemExecution::Failed(msg) if msg.contains("60")));
    }
}
