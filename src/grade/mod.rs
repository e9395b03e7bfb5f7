#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Content rules over script code.
pub mod content;
/// Classification of executed cells.
pub mod execution;
/// Gradescope results export.
pub mod gradescope;
/// Execution rules over cell outputs.
pub mod outputs;
/// Check outcomes and their presentation.
pub mod results;

pub use content::{ContentAssertions, ContentRule, ContentViolation, script_code};
pub use execution::{
    CellError, CellExecution, ExecutionResults, ProblemExecution, SectionExecution,
};
pub use gradescope::{GradescopeSubmission, GradescopeTestCase};
pub use outputs::{ExecutionAssertions, OutputRule, OutputViolation};
pub use results::{CheckCategory, CheckResult, CheckStatus, Summary, render_table, show_results};
