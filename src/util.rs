#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use glob::glob;
use itertools::Itertools;
use which::which;

use crate::constants::NOTEBOOK_GLOB;

/// Finds and returns the path to the jupyter binary
pub fn jupyter_path() -> Result<PathBuf> {
    which("jupyter").context("Cannot find a Jupyter installation on path (jupyter)")
}

/// A glob utility function to find files matching `pattern` directly inside
/// `root_dir`, sorted by path.
///
/// * `pattern`: a file name glob such as `hw*.ipynb`
/// * `root_dir`: the directory to search in
pub fn find_files(pattern: &str, root_dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = root_dir.join(pattern);
    let pattern = pattern
        .to_str()
        .context("Could not convert root_dir to string")?
        .to_string();

    Ok(glob(&pattern)
        .context("Could not create glob")?
        .filter_map(Result::ok)
        .sorted()
        .collect())
}

/// Finds the single assignment notebook in `root_dir`.
pub fn find_notebook(root_dir: &Path) -> Result<PathBuf> {
    let mut found = find_files(NOTEBOOK_GLOB, root_dir)?;
    match found.len() {
        1 => Ok(found.remove(0)),
        0 => bail!(
            "No notebook matching `{NOTEBOOK_GLOB}` in {}; pass the notebook path explicitly",
            root_dir.display()
        ),
        _ => bail!(
            "Several notebooks match `{NOTEBOOK_GLOB}` ({}); pass the notebook path explicitly",
            found.iter().map(|p| p.display()).join(", ")
        ),
    }
}
