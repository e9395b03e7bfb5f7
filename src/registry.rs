#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Groups notebook cells into answer sections keyed by the subproblem tag
//! that opens them.

use std::ops::Range;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::notebook::{Cell, Notebook, Subproblem};

/// The answer cells that follow one subproblem tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Tag that opened the section.
    pub subproblem: Subproblem,
    /// Index of the tagged cell.
    pub anchor:     usize,
    /// Indices of the answer cells, `anchor + 1 ..` up to the next tagged
    /// cell.
    pub cells:      Vec<usize>,
}

impl Section {
    /// Registry key, `<tag>_<anchor>`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.subproblem, self.anchor)
    }

    /// Whether no answer cells follow the anchor.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether the anchor lies strictly inside `extent`'s bounds, i.e. after
    /// the problem cell and before the next one.
    pub fn anchored_within(&self, extent: &Range<usize>) -> bool {
        self.anchor > extent.start && self.anchor < extent.end
    }
}

/// Every answer section of a notebook, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnswerRegistry {
    /// Sections ordered by anchor, then by canonical subproblem order.
    sections: Vec<Section>,
}

impl AnswerRegistry {
    /// Scans `notebook` once and records a section for every subproblem tag.
    pub fn build(notebook: &Notebook) -> Self {
        Self::from_cells(&notebook.cells)
    }

    /// Same as [`AnswerRegistry::build`] over a bare cell slice.
    pub fn from_cells(cells: &[Cell]) -> Self {
        let mut sections = Vec::new();

        for (anchor, cell) in cells.iter().enumerate() {
            for subproblem in cell.subproblems() {
                let stop = cells[anchor + 1..]
                    .iter()
                    .position(Cell::is_section_boundary)
                    .map_or(cells.len(), |offset| anchor + 1 + offset);

                sections.push(Section {
                    subproblem,
                    anchor,
                    cells: (anchor + 1..stop).collect(),
                });
            }
        }

        tracing::debug!("Registered {} answer sections", sections.len());
        Self { sections }
    }

    /// All sections in discovery order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Iterates sections in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, Section> {
        self.sections.iter()
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether no section was found.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Looks a section up by its `<tag>_<anchor>` key.
    pub fn get(&self, key: &str) -> Option<&Section> {
        let (tag, anchor) = key.rsplit_once('_')?;
        let subproblem = tag.parse::<Subproblem>().ok()?;
        let anchor = anchor.parse::<usize>().ok()?;
        self.sections
            .iter()
            .find(|s| s.subproblem == subproblem && s.anchor == anchor)
    }

    /// Sections opened by `subproblem`.
    pub fn of(&self, subproblem: Subproblem) -> impl Iterator<Item = &Section> {
        self.sections
            .iter()
            .filter(move |s| s.subproblem == subproblem)
    }

    /// The registry as a `key -> [cell indices]` JSON object, keys in
    /// discovery order.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .sections
            .iter()
            .map(|s| (s.key(), Value::from(s.cells.clone())))
            .collect();
        Value::Object(map)
    }
}

impl<'a> IntoIterator for &'a AnswerRegistry {
    type IntoIter = std::slice::Iter<'a, Section>;
    type Item = &'a Section;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md(tags: &[&str]) -> Cell {
        Cell::markdown("", tags.iter().copied())
    }

    #[test]
    fn extent_runs_to_the_next_tagged_cell() {
        let cells = vec![
            md(&["problem"]),
            md(&["summarize"]),
            md(&[]),
            md(&[]),
            md(&["plan"]),
            md(&["read_only"]),
            md(&["script"]),
            md(&["reflect"]),
        ];
        let registry = AnswerRegistry::from_cells(&cells);

        let keys: Vec<_> = registry.iter().map(Section::key).collect();
        assert_eq!(keys, ["summarize_1", "plan_4", "script_6", "reflect_7"]);
        assert_eq!(registry.get("summarize_1").unwrap().cells, vec![2, 3]);
        assert_eq!(registry.get("plan_4").unwrap().cells, vec![5]);
        assert!(registry.get("script_6").unwrap().is_empty());
        assert!(registry.get("reflect_7").unwrap().is_empty());
    }

    #[test]
    fn problem_cells_end_sections_but_open_none() {
        let cells = vec![md(&["summarize"]), md(&[]), md(&["problem"]), md(&[])];
        let registry = AnswerRegistry::from_cells(&cells);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.sections()[0].cells, vec![1]);
    }

    #[test]
    fn one_cell_with_two_tags_yields_two_sections() {
        let cells = vec![md(&["script", "plan"]), md(&[]), md(&[])];
        let registry = AnswerRegistry::from_cells(&cells);
        let keys: Vec<_> = registry.iter().map(Section::key).collect();
        assert_eq!(keys, ["plan_0", "script_0"]);
        assert!(registry.iter().all(|s| s.cells == vec![1, 2]));
    }

    #[test]
    fn lookup_rejects_malformed_keys() {
        let registry = AnswerRegistry::from_cells(&[md(&["plan"])]);
        assert!(registry.get("plan_0").is_some());
        assert!(registry.get("plan").is_none());
        assert!(registry.get("problem_0").is_none());
        assert!(registry.get("plan_x").is_none());
    }

    #[test]
    fn json_view_maps_keys_to_cells() {
        let cells = vec![md(&["reflect"]), md(&[]), md(&["summarize"]), md(&[])];
        let json = AnswerRegistry::from_cells(&cells).to_json();
        assert_eq!(json["reflect_0"], serde_json::json!([1]));
        assert_eq!(json["summarize_2"], serde_json::json!([3]));
    }

    #[test]
    fn json_view_keeps_discovery_order() {
        let cells: Vec<Cell> = (0..12)
            .map(|i| if i % 2 == 0 { md(&["plan"]) } else { md(&[]) })
            .collect();
        let registry = AnswerRegistry::from_cells(&cells);
        let json = registry.to_json();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        let expected: Vec<String> = registry.iter().map(Section::key).collect();
        assert_eq!(keys, expected.iter().collect::<Vec<_>>());
        assert_eq!(keys[5], "plan_10");
    }
}
