#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Running external tools with piped input and a hard deadline.

use std::{
    ffi::{OsStr, OsString},
    path::Path,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use thiserror::Error;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    process::{Child, Command},
    time::timeout,
};

/// Failures of the process plumbing itself, as opposed to a non-zero exit.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be started.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        /// Program that was run.
        program: String,
        /// Underlying I/O error.
        source:  std::io::Error,
    },
    /// Reading from or waiting on the child failed.
    #[error("i/o error while talking to the child process: {0}")]
    Io(#[from] std::io::Error),
    /// The deadline passed; the child has been killed.
    #[error("process did not finish within {0:?}")]
    TimedOut(Duration),
}

/// Kills the child on drop unless disarmed, so a timed-out or abandoned
/// process never outlives its caller.
struct KillOnDrop {
    /// The guarded child.
    child: Child,
    /// Whether dropping the guard kills the child.
    armed: bool,
}

impl KillOnDrop {
    /// Releases the child without killing it.
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.child.start_kill();
        }
    }
}

/// What a finished process produced.
#[derive(Debug)]
pub struct Captured {
    /// Exit status returned by the process.
    pub status: ExitStatus,
    /// Contents written to stdout.
    pub stdout: Vec<u8>,
    /// Contents written to stderr.
    pub stderr: Vec<u8>,
}

impl Captured {
    /// Stderr decoded lossily, trimmed.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Runs `program` with `args`, writes `input` to its stdin, and collects
/// stdout/stderr. The whole exchange is bounded by `deadline`.
pub async fn run_with_input(
    program: impl AsRef<OsStr>,
    args: &[OsString],
    input: Vec<u8>,
    cwd: Option<&Path>,
    deadline: Duration,
) -> Result<Captured, ProcessError> {
    let program = program.as_ref();
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let child = cmd.spawn().map_err(|source| ProcessError::Spawn {
        program: program.to_string_lossy().into_owned(),
        source,
    })?;
    let mut guard = KillOnDrop {
        child,
        armed: true,
    };

    let stdin = guard.child.stdin.take();
    let mut stdout = guard.child.stdout.take();
    let mut stderr = guard.child.stderr.take();

    let writer = tokio::spawn(async move {
        if let Some(mut handle) = stdin {
            if !input.is_empty() {
                let _ = handle.write_all(&input).await;
            }
            let _ = handle.shutdown().await;
        }
    });

    let exchange = async {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let read_out = async {
            if let Some(pipe) = stdout.as_mut() {
                pipe.read_to_end(&mut out).await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let read_err = async {
            if let Some(pipe) = stderr.as_mut() {
                pipe.read_to_end(&mut err).await?;
            }
            Ok::<(), std::io::Error>(())
        };
        tokio::try_join!(read_out, read_err)?;
        let status = guard.child.wait().await?;
        Ok::<_, ProcessError>((status, out, err))
    };

    let (status, stdout, stderr) = timeout(deadline, exchange)
        .await
        .map_err(|_| ProcessError::TimedOut(deadline))??;
    let _ = writer.await;
    guard.disarm();

    Ok(Captured {
        status,
        stdout,
        stderr,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pipes_input_through() {
        let captured = run_with_input("cat", &[], b"hello".to_vec(), None, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(captured.status.success());
        assert_eq!(captured.stdout, b"hello");
    }

    #[tokio::test]
    async fn deadline_is_enforced() {
        let err = run_with_input(
            "sleep",
            &["5".into()],
            Vec::new(),
            None,
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ProcessError::TimedOut(_)));
    }

    #[tokio::test]
    async fn missing_programs_fail_to_spawn() {
        let err = run_with_input(
            "definitely-not-a-real-program-nbgrade",
            &[],
            Vec::new(),
            None,
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }
}
