#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The nbformat v4 document model, as far as grading needs it.

/// Cells, sources, and the tag extractor.
pub mod cell;
/// Execution outputs.
pub mod output;
/// Read-only banner markup.
pub mod readonly;
/// Recognised tags.
pub mod tags;

use std::path::Path;

use anyhow::{Context, Result};
pub use cell::{Cell, CellMetadata, CellType, Source};
pub use output::{Output, OutputKind, output_text};
pub use readonly::mark_read_only;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
pub use tags::Subproblem;

/// A notebook document. Cell order is significant; a cell's index is its
/// position in `cells`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    /// Ordered cells.
    pub cells:    Vec<Cell>,
    /// Notebook-level metadata.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Everything else (`nbformat`, `nbformat_minor`, ...).
    #[serde(flatten)]
    pub extra:    Map<String, Value>,
}

impl Notebook {
    /// Builds a notebook from cells, stamped as nbformat 4.5.
    pub fn from_cells(cells: impl IntoIterator<Item = Cell>) -> Self {
        let mut extra = Map::new();
        extra.insert("nbformat".into(), Value::from(4));
        extra.insert("nbformat_minor".into(), Value::from(5));
        Self {
            cells: cells.into_iter().collect(),
            metadata: Map::new(),
            extra,
        }
    }

    /// Parses a notebook from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Could not parse notebook JSON")
    }

    /// Reads and parses the notebook at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read notebook {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid notebook {}", path.display()))
    }

    /// Serializes the notebook as pretty JSON with two-space indentation.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Could not serialize notebook")
    }

    /// Writes the notebook to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Could not write notebook {}", path.display()))
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the notebook has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The cell at `index`, if any.
    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_document() {
        let nb = Notebook::from_json(
            r##"{
                "cells": [
                    {"cell_type": "markdown", "metadata": {"tags": ["problem"]}, "source": ["# P1"]},
                    {"cell_type": "code", "metadata": {}, "source": "print(1)", "outputs": [],
                     "execution_count": null}
                ],
                "metadata": {"kernelspec": {"name": "python3"}},
                "nbformat": 4,
                "nbformat_minor": 5
            }"##,
        )
        .unwrap();
        assert_eq!(nb.len(), 2);
        assert!(nb.cells[0].is_problem());
        assert!(nb.cells[1].is_code());
        assert_eq!(nb.extra["nbformat"], 4);
    }

    #[test]
    fn rejects_documents_without_cells() {
        assert!(Notebook::from_json(r#"{"metadata": {}}"#).is_err());
    }

    #[test]
    fn pretty_output_keeps_non_ascii() {
        let nb = Notebook::from_cells([Cell::markdown("⚠️ hi", Vec::<String>::new())]);
        let json = nb.to_json().unwrap();
        assert!(json.contains("⚠️ hi"));
        assert!(json.contains("\n  \"cells\""));
    }
}
