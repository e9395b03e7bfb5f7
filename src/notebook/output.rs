#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Cell outputs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::cell::Source;

/// nbformat output kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// Text written to stdout/stderr.
    Stream,
    /// The value of the last expression in a cell.
    ExecuteResult,
    /// A rich display produced explicitly.
    DisplayData,
    /// A raised exception.
    Error,
}

/// A single output entry of a code cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    /// What produced this output.
    pub output_type: OutputKind,
    /// Stream text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text:        Option<Source>,
    /// Mime-keyed payloads of results and displays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data:        Option<Map<String, Value>>,
    /// Exception class name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ename:       Option<String>,
    /// Exception message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evalue:      Option<String>,
    /// Formatted traceback lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback:   Option<Vec<String>>,
    /// Everything else (`name`, `metadata`, `execution_count`, ...).
    #[serde(flatten)]
    pub extra:       Map<String, Value>,
}

impl Output {
    /// An empty output of the given kind.
    fn empty(output_type: OutputKind) -> Self {
        Self {
            output_type,
            text: None,
            data: None,
            ename: None,
            evalue: None,
            traceback: None,
            extra: Map::new(),
        }
    }

    /// A stdout stream output.
    pub fn stream(text: impl Into<String>) -> Self {
        let mut out = Self::empty(OutputKind::Stream);
        out.text = Some(Source::Text(text.into()));
        out.extra.insert("name".into(), Value::from("stdout"));
        out
    }

    /// An `execute_result` carrying a plain-text representation.
    pub fn execute_result(plain: impl Into<String>) -> Self {
        let mut out = Self::empty(OutputKind::ExecuteResult);
        let mut data = Map::new();
        data.insert("text/plain".into(), Value::from(plain.into()));
        out.data = Some(data);
        out
    }

    /// A `display_data` carrying a plain-text representation.
    pub fn display_data(plain: impl Into<String>) -> Self {
        let mut out = Self::execute_result(plain);
        out.output_type = OutputKind::DisplayData;
        out
    }

    /// An `error` output.
    pub fn error(
        ename: impl Into<String>,
        evalue: impl Into<String>,
        traceback: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut out = Self::empty(OutputKind::Error);
        out.ename = Some(ename.into());
        out.evalue = Some(evalue.into());
        out.traceback = Some(traceback.into_iter().collect());
        out
    }

    /// Whether this output records a raised exception.
    pub fn is_error(&self) -> bool {
        self.output_type == OutputKind::Error
    }

    /// The textual content that output assertions match against: stream
    /// text, or the `text/plain` payload of results and displays.
    pub fn plain_text(&self) -> Option<String> {
        match self.output_type {
            OutputKind::Stream => self.text.as_ref().map(Source::text),
            OutputKind::ExecuteResult | OutputKind::DisplayData => {
                match self.data.as_ref()?.get("text/plain")? {
                    Value::String(s) => Some(s.clone()),
                    Value::Array(parts) => Some(parts.iter().filter_map(Value::as_str).collect()),
                    _ => None,
                }
            }
            OutputKind::Error => None,
        }
    }
}

/// Concatenates the textual content of `outputs` in order.
pub fn output_text<'a>(outputs: impl IntoIterator<Item = &'a Output>) -> String {
    outputs.into_iter().filter_map(Output::plain_text).collect()
}
