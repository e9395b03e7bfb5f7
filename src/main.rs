#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # nbgrade
//!
//! Grades a tagged assignment notebook from the command line.
//!
//! ```text
//! nbgrade check hw01.ipynb --problem 2
//! nbgrade sections
//! nbgrade readonly template/hw01.ipynb
//! ```
//!
//! Runtime defaults come from the environment (or a `.env` file):
//! `NBGRADE_TIMEOUT_SECS`, `NBGRADE_KERNEL`, `NBGRADE_JUPYTER` and
//! `NBGRADE_PARAMS_FILE`.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result, bail};
use bpaf::*;
use dotenvy::dotenv;
use nbgrade::{
    GradingSession, NbconvertExecutor, Notebook, ProblemLocator,
    config::{self, Settings},
    grade::{GradescopeSubmission, Summary, show_results},
    notebook::mark_read_only,
    registry::AnswerRegistry,
    util,
};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Options of the `check` subcommand.
#[derive(Debug, Clone)]
struct CheckArgs {
    /// Notebook to grade; discovered when omitted.
    notebook:   Option<PathBuf>,
    /// 1-based problem to run content and execution checks for.
    problem:    Option<usize>,
    /// Assertion file override.
    params:     Option<PathBuf>,
    /// Skip running the notebook.
    no_execute: bool,
    /// Executor timeout override, in seconds.
    timeout:    Option<u64>,
    /// Kernel override.
    kernel:     Option<String>,
    /// Print the results as JSON on stdout.
    json:       bool,
    /// Where to write a Gradescope results file.
    results:    Option<PathBuf>,
}

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Grade a notebook
    Check(CheckArgs),
    /// Print the answer sections of a notebook
    Sections(Option<PathBuf>),
    /// Add read-only banners to a notebook
    ReadOnly(PathBuf),
}

/// Parsed command line.
#[derive(Debug, Clone)]
struct Opts {
    /// Log at debug level.
    verbose: bool,
    /// Subcommand to run.
    cmd:     Cmd,
}

/// Parse the command line arguments and return the options
fn options() -> Opts {
    /// parses an optional notebook path
    fn nb() -> impl Parser<Option<PathBuf>> {
        positional::<PathBuf>("NOTEBOOK")
            .help("Path to the notebook; defaults to the only hw*.ipynb here")
            .optional()
    }

    let problem = short('p')
        .long("problem")
        .help("Problem number to run content and execution checks for")
        .argument::<usize>("N")
        .optional();
    let params = long("params")
        .help("Assertion file (default: test_params.json next to the notebook)")
        .argument::<PathBuf>("PATH")
        .optional();
    let no_execute = long("no-execute")
        .help("Do not run the notebook; execution checks are skipped")
        .switch();
    let timeout = long("timeout")
        .help("Seconds allowed for executing the notebook")
        .argument::<u64>("SECS")
        .optional();
    let kernel = long("kernel")
        .help("Jupyter kernel to execute with")
        .argument::<String>("NAME")
        .optional();
    let json = long("json")
        .help("Print the check results as JSON on stdout")
        .switch();
    let results = long("results")
        .help("Write a Gradescope results file")
        .argument::<PathBuf>("PATH")
        .optional();
    let notebook = nb();

    let check = construct!(CheckArgs {
        problem,
        params,
        no_execute,
        timeout,
        kernel,
        json,
        results,
        notebook,
    })
    .map(Cmd::Check)
    .to_options()
    .command("check")
    .help("Check a notebook's structure, answers, and execution");

    let sections = construct!(Cmd::Sections(nb()))
        .to_options()
        .command("sections")
        .help("Print the answer registry and problem anchors as JSON");

    let target = positional::<PathBuf>("NOTEBOOK").help("Notebook to mark");
    let read_only = construct!(Cmd::ReadOnly(target))
        .to_options()
        .command("readonly")
        .help("Add read-only banners to cells tagged read_only");

    let verbose = short('v')
        .long("verbose")
        .help("Log debug output")
        .switch();
    let cmd = construct!([check, sections, read_only]);

    construct!(Opts { verbose, cmd })
        .to_options()
        .descr("Grader for tagged assignment notebooks")
        .run()
}

/// The notebook given on the command line, or the one in the current
/// directory.
fn resolve_notebook(notebook: Option<PathBuf>) -> Result<PathBuf> {
    match notebook {
        Some(path) => Ok(path),
        None => {
            let cwd = std::env::current_dir().context("Could not read current directory")?;
            util::find_notebook(&cwd)
        }
    }
}

/// Runs the `check` subcommand.
async fn check(args: CheckArgs, settings: &Settings) -> Result<()> {
    let notebook = resolve_notebook(args.notebook)?;
    let params = args
        .params
        .unwrap_or_else(|| settings.params_path(&notebook));
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or(settings.timeout);
    let kernel = args.kernel.unwrap_or_else(|| settings.kernel.clone());

    let mut executor = NbconvertExecutor::new(settings.jupyter.clone(), kernel);
    if let Some(dir) = notebook.parent()
        && !dir.as_os_str().is_empty()
    {
        executor = executor.in_dir(dir);
    }

    tracing::info!("Grading {}", notebook.display());
    let session = GradingSession::builder()
        .notebook_path(notebook)
        .params_path(params)
        .executor(executor)
        .timeout(timeout)
        .execute(!args.no_execute)
        .build();
    let results = session.run(args.problem).await;

    show_results(&results);
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&results).context("Could not serialize results")?
        );
    }
    if let Some(path) = args.results {
        GradescopeSubmission::from_results(&results).write(&path)?;
    }

    let summary = Summary::of(&results);
    if summary.failed > 0 {
        bail!("{} check(s) failed", summary.failed);
    }
    Ok(())
}

/// Runs the `sections` subcommand.
fn sections(notebook: Option<PathBuf>) -> Result<()> {
    let path = resolve_notebook(notebook)?;
    let notebook = Notebook::load(&path)?;
    let view = serde_json::json!({
        "problems": ProblemLocator::locate(&notebook).anchors(),
        "sections": AnswerRegistry::build(&notebook).to_json(),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&view).context("Could not serialize sections")?
    );
    Ok(())
}

/// Runs the `readonly` subcommand.
fn read_only(path: PathBuf) -> Result<()> {
    let mut notebook = Notebook::load(&path)?;
    let marked = mark_read_only(&mut notebook);
    notebook.save(&path)?;
    eprintln!("Marked {marked} read-only cell(s) in {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let opts = options();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let level = if opts.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter_layer = LevelFilter::from_level(level);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let settings = config::settings();
    tracing::debug!("Settings: {settings:?}");

    match opts.cmd {
        Cmd::Check(args) => check(args, settings).await?,
        Cmd::Sections(notebook) => sections(notebook)?,
        Cmd::ReadOnly(path) => read_only(path)?,
    }

    Ok(())
}
