#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Notebook cells and the tag extractor.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{output::Output, tags::Subproblem};
use crate::constants::PROBLEM_TAG;

/// Kind of a notebook cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    /// Prose.
    Markdown,
    /// Executable code.
    Code,
    /// Unrendered text passed through as-is.
    Raw,
}

/// Multiline text as stored by nbformat: one string, or a list of lines
/// that are concatenated without a separator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source {
    /// A single string.
    Text(String),
    /// Line fragments, each usually ending in `\n`.
    Lines(Vec<String>),
}

impl Default for Source {
    fn default() -> Self {
        Source::Text(String::new())
    }
}

impl Source {
    /// Returns the full text.
    pub fn text(&self) -> String {
        match self {
            Source::Text(s) => s.clone(),
            Source::Lines(lines) => lines.concat(),
        }
    }

    /// Prepends `prefix` as its own line fragment.
    pub fn prepend(&mut self, prefix: &str) {
        let mut lines = match std::mem::take(self) {
            Source::Text(s) if s.is_empty() => Vec::new(),
            Source::Text(s) => vec![s],
            Source::Lines(lines) => lines,
        };
        lines.insert(0, prefix.to_string());
        *self = Source::Lines(lines);
    }
}

impl From<&str> for Source {
    fn from(value: &str) -> Self {
        Source::Text(value.to_string())
    }
}

impl From<String> for Source {
    fn from(value: String) -> Self {
        Source::Text(value)
    }
}

/// Cell metadata. Only the fields the grader reads or writes are typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellMetadata {
    /// Tags attached to the cell.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags:      Vec<String>,
    /// Whether the editor should allow editing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editable:  Option<bool>,
    /// Whether the editor should allow deletion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletable: Option<bool>,
    /// Everything else, preserved on save.
    #[serde(flatten)]
    pub extra:     Map<String, Value>,
}

/// A single notebook cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Kind of the cell.
    pub cell_type: CellType,
    /// Cell metadata, including tags.
    #[serde(default)]
    pub metadata:  CellMetadata,
    /// Cell body.
    #[serde(default)]
    pub source:    Source,
    /// Outputs produced by execution. Present only on code cells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs:   Option<Vec<Output>>,
    /// Everything else (`id`, `execution_count`, `attachments`, ...).
    #[serde(flatten)]
    pub extra:     Map<String, Value>,
}

impl Cell {
    /// Creates a cell of the given type with the given tags.
    pub fn new<S: Into<String>>(
        cell_type: CellType,
        source: impl Into<Source>,
        tags: impl IntoIterator<Item = S>,
    ) -> Self {
        let outputs = (cell_type == CellType::Code).then(Vec::new);
        Self {
            cell_type,
            metadata: CellMetadata {
                tags: tags.into_iter().map(Into::into).collect(),
                ..CellMetadata::default()
            },
            source: source.into(),
            outputs,
            extra: Map::new(),
        }
    }

    /// Creates a markdown cell.
    pub fn markdown<S: Into<String>>(
        source: impl Into<Source>,
        tags: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(CellType::Markdown, source, tags)
    }

    /// Creates a code cell with no outputs.
    pub fn code<S: Into<String>>(
        source: impl Into<Source>,
        tags: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(CellType::Code, source, tags)
    }

    /// Replaces the cell outputs.
    pub fn with_outputs(mut self, outputs: impl IntoIterator<Item = Output>) -> Self {
        self.outputs = Some(outputs.into_iter().collect());
        self
    }

    /// Tags attached to the cell, in metadata order.
    pub fn tags(&self) -> &[String] {
        &self.metadata.tags
    }

    /// Whether the cell carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.metadata.tags.iter().any(|t| t == tag)
    }

    /// Whether the cell opens a problem.
    pub fn is_problem(&self) -> bool {
        self.has_tag(PROBLEM_TAG)
    }

    /// Subproblem tags the cell carries, in canonical order.
    pub fn subproblems(&self) -> impl Iterator<Item = Subproblem> + '_ {
        Subproblem::ALL
            .into_iter()
            .filter(|sp| self.has_tag(sp.tag()))
    }

    /// Whether the cell ends a section: it carries `problem` or any
    /// subproblem tag.
    pub fn is_section_boundary(&self) -> bool {
        self.is_problem() || self.subproblems().next().is_some()
    }

    /// Whether this is a code cell.
    pub fn is_code(&self) -> bool {
        self.cell_type == CellType::Code
    }

    /// Full source text.
    pub fn source_text(&self) -> String {
        self.source.text()
    }

    /// Execution outputs; empty for non-code cells.
    pub fn outputs(&self) -> &[Output] {
        self.outputs.as_deref().unwrap_or(&[])
    }

    /// Execution counter recorded by the kernel, if any.
    pub fn execution_count(&self) -> Option<i64> {
        self.extra.get("execution_count").and_then(Value::as_i64)
    }
}
