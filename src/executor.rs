#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Running a notebook through an external kernel.

use std::{ffi::OsString, future::Future, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::{
    constants::EXECUTOR_GRACE,
    notebook::Notebook,
    process::{self, ProcessError},
};

/// Why a notebook could not be executed at all. Errors raised inside
/// individual cells are not execution errors; they are recorded as cell
/// outputs.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// No executor binary is available.
    #[error("notebook executor not available: {0}")]
    ToolMissing(String),
    /// The executor could not be started.
    #[error("could not start the notebook executor: {0}")]
    Spawn(String),
    /// The run exceeded its time budget.
    #[error("notebook execution timed out after {0}s")]
    TimedOut(u64),
    /// The executor exited unsuccessfully.
    #[error("notebook executor failed: {0}")]
    Failed(String),
    /// The executor's output was not a notebook.
    #[error("notebook executor produced an invalid notebook: {0}")]
    InvalidOutput(String),
}

impl From<ProcessError> for ExecutionError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::TimedOut(limit) => ExecutionError::TimedOut(limit.as_secs()),
            ProcessError::Spawn { .. } => ExecutionError::Spawn(err.to_string()),
            ProcessError::Io(_) => ExecutionError::Failed(err.to_string()),
        }
    }
}

/// Something that can run every cell of a notebook and hand back the
/// notebook with outputs populated. Implementations must keep going past
/// cells that raise.
pub trait NotebookExecutor: Send + Sync {
    /// Executes `notebook` within `timeout`.
    fn execute(
        &self,
        notebook: &Notebook,
        timeout: Duration,
    ) -> impl Future<Output = Result<Notebook, ExecutionError>> + Send;
}

/// Executes notebooks with `jupyter nbconvert --execute --allow-errors`,
/// streaming the document through stdin/stdout.
#[derive(Debug, Clone)]
pub struct NbconvertExecutor {
    /// Path to the `jupyter` binary, if one was found.
    jupyter:     Option<PathBuf>,
    /// Kernel to execute with.
    kernel:      String,
    /// Directory the kernel starts in, so relative data paths resolve.
    working_dir: Option<PathBuf>,
    /// Extra time on top of the per-cell timeout before the whole run is
    /// killed.
    grace:       Duration,
}

impl NbconvertExecutor {
    /// Creates an executor for `kernel`, using `jupyter` when given or
    /// looking it up on `PATH` otherwise.
    pub fn new(jupyter: Option<PathBuf>, kernel: impl Into<String>) -> Self {
        let jupyter = jupyter.or_else(|| crate::util::jupyter_path().ok());
        Self {
            jupyter,
            kernel: kernel.into(),
            working_dir: None,
            grace: EXECUTOR_GRACE,
        }
    }

    /// Overrides the slack allowed past the configured timeout.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Runs the kernel from `dir`.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Command-line arguments passed to `jupyter`.
    fn args(&self, timeout: Duration) -> Vec<OsString> {
        [
            "nbconvert".to_string(),
            "--to".into(),
            "notebook".into(),
            "--execute".into(),
            "--allow-errors".into(),
            "--stdin".into(),
            "--stdout".into(),
            format!("--ExecutePreprocessor.timeout={}", timeout.as_secs()),
            format!("--ExecutePreprocessor.kernel_name={}", self.kernel),
        ]
        .into_iter()
        .map(OsString::from)
        .collect()
    }
}

impl NotebookExecutor for NbconvertExecutor {
    async fn execute(
        &self,
        notebook: &Notebook,
        timeout: Duration,
    ) -> Result<Notebook, ExecutionError> {
        let jupyter = self.jupyter.as_ref().ok_or_else(|| {
            ExecutionError::ToolMissing("Cannot find `jupyter` on path".to_string())
        })?;
        let input = notebook
            .to_json()
            .map_err(|e| ExecutionError::InvalidOutput(e.to_string()))?
            .into_bytes();

        tracing::info!("Executing notebook with kernel `{}`...", self.kernel);
        let captured = process::run_with_input(
            jupyter,
            &self.args(timeout),
            input,
            self.working_dir.as_deref(),
            timeout + self.grace,
        )
        .await
        .map_err(|e| match e {
            // Report the budget the caller asked for, not the padded deadline.
            ProcessError::TimedOut(_) => ExecutionError::TimedOut(timeout.as_secs()),
            other => other.into(),
        })?;

        if !captured.status.success() {
            return Err(ExecutionError::Failed(captured.stderr_text()));
        }

        let stdout = String::from_utf8_lossy(&captured.stdout);
        Notebook::from_json(&stdout).map_err(|e| ExecutionError::InvalidOutput(format!("{e:#}")))
    }
}
