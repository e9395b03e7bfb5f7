#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Problem boundaries and problem-scoped selection of answer sections.

use std::ops::Range;

use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;

use crate::{
    notebook::{Cell, Notebook, Subproblem},
    registry::{AnswerRegistry, Section},
};

/// Why a problem could not be located.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProblemError {
    /// The notebook has no `problem` cell at all.
    #[error("No cells with 'problem' tag found")]
    NoProblems,
    /// The requested problem number is past the last problem.
    #[error("Problem {requested} not found in notebook")]
    NotFound {
        /// 1-based problem number asked for.
        requested: usize,
        /// Number of problems in the notebook.
        available: usize,
    },
}

/// Indices of the cells tagged `problem`, ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProblemLocator {
    /// Anchor index of each problem.
    anchors: Vec<usize>,
    /// Cell count, which closes the last problem.
    len:     usize,
}

impl ProblemLocator {
    /// Locates the problems of `notebook`.
    pub fn locate(notebook: &Notebook) -> Self {
        Self::from_cells(&notebook.cells)
    }

    /// Same as [`ProblemLocator::locate`] over a bare cell slice.
    pub fn from_cells(cells: &[Cell]) -> Self {
        Self {
            anchors: cells.iter().positions(Cell::is_problem).collect(),
            len:     cells.len(),
        }
    }

    /// Problem anchors in notebook order.
    pub fn anchors(&self) -> &[usize] {
        &self.anchors
    }

    /// Number of problems.
    pub fn count(&self) -> usize {
        self.anchors.len()
    }

    /// Fails when no problem was found.
    pub fn require_any(&self) -> Result<&[usize], ProblemError> {
        if self.anchors.is_empty() {
            Err(ProblemError::NoProblems)
        } else {
            Ok(&self.anchors)
        }
    }

    /// Extent of 1-based problem `number`: from its anchor up to the next
    /// problem anchor, or the end of the notebook.
    pub fn extent(&self, number: usize) -> Result<Range<usize>, ProblemError> {
        let not_found = ProblemError::NotFound {
            requested: number,
            available: self.count(),
        };
        let idx = number.checked_sub(1).ok_or_else(|| not_found.clone())?;
        let start = *self.anchors.get(idx).ok_or(not_found)?;
        let end = self.anchors.get(idx + 1).copied().unwrap_or(self.len);
        Ok(start..end)
    }

    /// Extents of all problems in order.
    pub fn extents(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.anchors
            .iter()
            .enumerate()
            .map(|(i, &start)| start..self.anchors.get(i + 1).copied().unwrap_or(self.len))
    }

    /// The sections of `registry` anchored inside problem `number`, in
    /// registry order. `Ok` with no sections means the problem exists but has
    /// no tagged parts.
    pub fn select<'r>(
        &self,
        number: usize,
        registry: &'r AnswerRegistry,
    ) -> Result<Vec<&'r Section>, ProblemError> {
        let extent = self.extent(number)?;
        Ok(registry
            .iter()
            .filter(|s| s.anchored_within(&extent))
            .collect())
    }

    /// Checks that every problem contains each subproblem tag at least once.
    /// Only presence is checked, not their relative order.
    pub fn check_sequence(&self, cells: &[Cell]) -> Result<(), SequenceError> {
        self.require_any().map_err(SequenceError::Problem)?;

        for extent in self.extents() {
            // Cells past the end of a shorter slice count as missing.
            let body = cells
                .get(extent.start + 1..extent.end.min(cells.len()))
                .unwrap_or_default();
            let found: Vec<Subproblem> = body
                .iter()
                .flat_map(Cell::subproblems)
                .unique()
                .collect();
            let missing: Vec<Subproblem> = Subproblem::ALL
                .into_iter()
                .filter(|sp| !found.contains(sp))
                .collect();

            if !missing.is_empty() {
                return Err(SequenceError::Missing {
                    anchor: extent.start,
                    missing,
                });
            }
        }
        Ok(())
    }
}

/// A problem that lacks required subproblem tags.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// Problems could not be located at all.
    #[error(transparent)]
    Problem(ProblemError),
    /// The problem at `anchor` lacks some subproblem tags.
    #[error("Problem at cell {anchor} missing subproblems: [{}]", format_tags(.missing))]
    Missing {
        /// Index of the `problem` cell.
        anchor:  usize,
        /// Missing tags, canonical order.
        missing: Vec<Subproblem>,
    },
}

/// Formats tags the way a list literal of strings reads.
fn format_tags(tags: &[Subproblem]) -> String {
    tags.iter().map(|t| format!("'{t}'")).join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md(tags: &[&str]) -> Cell {
        Cell::markdown("", tags.iter().copied())
    }

    fn full_problem() -> Vec<Cell> {
        vec![
            md(&["problem"]),
            md(&["summarize"]),
            md(&[]),
            md(&["plan"]),
            md(&[]),
            md(&["script"]),
            md(&[]),
            md(&["reflect"]),
            md(&[]),
        ]
    }

    #[test]
    fn anchors_are_ascending_positions() {
        let mut cells = full_problem();
        cells.extend(full_problem());
        cells.push(md(&["problem"]));
        let locator = ProblemLocator::from_cells(&cells);
        assert_eq!(locator.anchors(), &[0, 9, 18]);
        assert_eq!(locator.extent(1).unwrap(), 0..9);
        assert_eq!(locator.extent(3).unwrap(), 18..19);
        assert_eq!(locator.extents().collect::<Vec<_>>(), vec![0..9, 9..18, 18..19]);
    }

    #[test]
    fn out_of_range_numbers_are_not_found() {
        let locator = ProblemLocator::from_cells(&full_problem());
        assert_eq!(
            locator.extent(2),
            Err(ProblemError::NotFound {
                requested: 2,
                available: 1,
            })
        );
        assert!(matches!(locator.extent(0), Err(ProblemError::NotFound { .. })));
    }

    #[test]
    fn not_found_differs_from_empty_selection() {
        let mut cells = full_problem();
        cells.push(md(&["problem"]));
        cells.push(md(&[]));
        cells.push(md(&["problem"]));
        let registry = AnswerRegistry::from_cells(&cells);
        let locator = ProblemLocator::from_cells(&cells);

        assert_eq!(locator.select(1, &registry).unwrap().len(), 4);
        assert_eq!(locator.select(2, &registry).unwrap(), Vec::<&Section>::new());
        assert_eq!(locator.select(3, &registry).unwrap(), Vec::<&Section>::new());
        assert!(matches!(
            locator.select(5, &registry),
            Err(ProblemError::NotFound {
                requested: 5,
                available: 3,
            })
        ));
    }

    #[test]
    fn sequence_check_is_presence_only() {
        let cells = vec![
            md(&["problem"]),
            md(&["reflect"]),
            md(&["script"]),
            md(&["plan"]),
            md(&["summarize"]),
        ];
        let locator = ProblemLocator::from_cells(&cells);
        assert_eq!(locator.check_sequence(&cells), Ok(()));
    }

    #[test]
    fn sequence_check_reports_missing_tags() {
        let mut cells = full_problem();
        cells.push(md(&["problem"]));
        cells.push(md(&["plan"]));
        let locator = ProblemLocator::from_cells(&cells);
        let err = locator.check_sequence(&cells).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Problem at cell 9 missing subproblems: ['summarize', 'script', 'reflect']"
        );
    }

    #[test]
    fn sequence_check_tolerates_a_shorter_slice() {
        let mut cells = full_problem();
        cells.extend(full_problem());
        let locator = ProblemLocator::from_cells(&cells);

        let err = locator.check_sequence(&cells[..5]).unwrap_err();
        assert_eq!(
            err,
            SequenceError::Missing {
                anchor:  0,
                missing: vec![Subproblem::Script, Subproblem::Reflect],
            }
        );
        assert!(locator.check_sequence(&[]).is_err());
    }

    #[test]
    fn sequence_check_requires_a_problem() {
        let cells = vec![md(&["summarize"])];
        let locator = ProblemLocator::from_cells(&cells);
        assert_eq!(
            locator.check_sequence(&cells),
            Err(SequenceError::Problem(ProblemError::NoProblems))
        );
        assert_eq!(
            locator.check_sequence(&cells).unwrap_err().to_string(),
            "No cells with 'problem' tag found"
        );
    }
}
