#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::time::Duration;

/// Tag that marks the cell opening a top-level problem.
pub const PROBLEM_TAG: &str = "problem";

/// Tag that marks cells which students must not edit.
pub const READ_ONLY_TAG: &str = "read_only";

/// Default file holding per-problem assertions, resolved next to the notebook.
pub const DEFAULT_PARAMS_FILE: &str = "test_params.json";

/// Glob used to discover the assignment notebook when none is given.
pub const NOTEBOOK_GLOB: &str = "hw*.ipynb";

/// Default time budget for executing a whole notebook.
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Slack past the per-cell timeout before a notebook run is killed outright.
pub const EXECUTOR_GRACE: Duration = Duration::from_secs(30);

/// Kernel used by the executor unless overridden.
pub const DEFAULT_KERNEL: &str = "python3";

/// Banner prepended to read-only markdown cells.
pub const MARKDOWN_READ_ONLY_BANNER: &str = "⚠️ **READ-ONLY CELL** ⚠️\n\n";

/// Prefix used to detect an existing markdown banner.
pub const MARKDOWN_READ_ONLY_PREFIX: &str = "⚠️ **READ-ONLY";

/// Banner prepended to read-only code cells.
pub const CODE_READ_ONLY_BANNER: &str = "# ⚠️ READ-ONLY CELL - DO NOT EDIT ⚠️\n";

/// Prefix used to detect an existing code banner.
pub const CODE_READ_ONLY_PREFIX: &str = "# ⚠️ READ-ONLY";

/// Reason attached to content/execution checks when no problem was selected.
pub const NO_PROBLEM_SELECTED: &str =
    "No problem specified. Use --problem N to run content/execution tests.";
