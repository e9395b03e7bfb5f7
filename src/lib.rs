//! # nbgrade
//!
//! An autograder for tagged Jupyter notebook assignments. Answer cells are
//! grouped into sections by the subproblem tag that opens them, problems are
//! located by their `problem` cells, and each problem's script is checked for
//! content and, after running the notebook, for its execution results.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Assertion file and runtime settings
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// For running notebooks through a kernel
pub mod executor;
/// For all things related to grading
pub mod grade;
/// The notebook document model
pub mod notebook;
/// Locating problems and selecting their sections
pub mod problems;
/// Subprocess helpers
pub mod process;
/// Grouping answer cells into sections
pub mod registry;
/// A grading run over one notebook
pub mod session;
/// Utility functions for convenience
pub mod util;

pub use config::{AssertionConfig, ProblemAssertions, Settings};
pub use executor::{ExecutionError, NbconvertExecutor, NotebookExecutor};
pub use grade::{CheckCategory, CheckResult, CheckStatus};
pub use notebook::{Cell, Notebook, Subproblem};
pub use problems::{ProblemError, ProblemLocator};
pub use registry::{AnswerRegistry, Section};
pub use session::GradingSession;
