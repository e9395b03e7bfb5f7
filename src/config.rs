#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::OnceLock,
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    constants::{DEFAULT_EXECUTION_TIMEOUT, DEFAULT_KERNEL, DEFAULT_PARAMS_FILE},
    grade::{ContentAssertions, ExecutionAssertions},
};

/// Assertions configured for one problem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemAssertions {
    /// Rules over the script code.
    pub content_assertions:   ContentAssertions,
    /// Rules over the execution results.
    pub execution_assertions: ExecutionAssertions,
}

/// Per-problem assertions keyed `problem_<N>`. Loaded once per session and
/// read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssertionConfig {
    /// Raw `problem_<N>` entries.
    problems: BTreeMap<String, ProblemAssertions>,
}

impl AssertionConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Loads the configuration at `path`. A missing or malformed file yields
    /// an empty configuration, so only structural checks are enforced.
    pub fn load_or_default(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                tracing::debug!("No assertion config at {}: {e}", path.display());
                return Self::default();
            }
        };

        match Self::from_json(&json) {
            Ok(config) => {
                tracing::info!(
                    "Loaded assertions for {} problem(s) from {}",
                    config.problems.len(),
                    path.display()
                );
                config
            }
            Err(e) => {
                tracing::warn!(
                    "Ignoring malformed assertion config {}: {e}",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Assertions for 1-based problem `number`; empty when not configured.
    pub fn for_problem(&self, number: usize) -> ProblemAssertions {
        self.problems
            .get(&format!("problem_{number}"))
            .cloned()
            .unwrap_or_default()
    }

    /// Whether nothing is configured.
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Runtime settings for a grading run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Time budget for executing the notebook.
    pub timeout:     Duration,
    /// Kernel to execute with.
    pub kernel:      String,
    /// Explicit `jupyter` binary.
    pub jupyter:     Option<PathBuf>,
    /// Assertion file name, resolved next to the notebook when relative.
    pub params_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout:     DEFAULT_EXECUTION_TIMEOUT,
            kernel:      DEFAULT_KERNEL.to_string(),
            jupyter:     None,
            params_file: PathBuf::from(DEFAULT_PARAMS_FILE),
        }
    }
}

impl Settings {
    /// Reads settings from the environment, falling back to defaults.
    ///
    /// * `NBGRADE_TIMEOUT_SECS`: executor timeout in seconds
    /// * `NBGRADE_KERNEL`: kernel name
    /// * `NBGRADE_JUPYTER`: path to the `jupyter` binary
    /// * `NBGRADE_PARAMS_FILE`: assertion file
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        Self {
            timeout:     read_timeout_secs(non_empty("NBGRADE_TIMEOUT_SECS"), defaults.timeout),
            kernel:      non_empty("NBGRADE_KERNEL").unwrap_or(defaults.kernel),
            jupyter:     non_empty("NBGRADE_JUPYTER").map(PathBuf::from),
            params_file: non_empty("NBGRADE_PARAMS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.params_file),
        }
    }

    /// Path of the assertion file for `notebook`.
    pub fn params_path(&self, notebook: &Path) -> PathBuf {
        if self.params_file.is_absolute() {
            return self.params_file.clone();
        }
        notebook
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&self.params_file)
    }
}

/// Parses a number of seconds, falling back to `default` when absent or
/// unparsable.
fn read_timeout_secs(value: Option<String>, default: Duration) -> Duration {
    value
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// Global storage for the environment-derived settings.
static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Returns the environment-derived settings, reading them on first use.
pub fn settings() -> &'static Settings {
    SETTINGS.get_or_init(Settings::from_env)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn problem_sections_are_looked_up_by_number() {
        let config = AssertionConfig::from_json(
            r#"{
                "problem_1": {
                    "content_assertions": {"min_lines": 2, "script_contains": ["np."]},
                    "execution_assertions": {"no_errors": true}
                },
                "problem_2": {"content_assertions": {}}
            }"#,
        )
        .unwrap();

        let p1 = config.for_problem(1);
        assert_eq!(p1.content_assertions.min_lines, Some(2));
        assert!(p1.execution_assertions.no_errors);
        assert_eq!(config.for_problem(2).execution_assertions, ExecutionAssertions::default());
        assert_eq!(config.for_problem(7), ProblemAssertions::default());
    }

    #[test]
    fn missing_and_malformed_files_degrade_to_empty() {
        let dir = std::env::temp_dir().join(format!("nbgrade-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        assert!(AssertionConfig::load_or_default(&dir.join("absent.json")).is_empty());

        let bad = dir.join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(AssertionConfig::load_or_default(&bad).is_empty());

        let wrong_shape = dir.join("shape.json");
        std::fs::write(&wrong_shape, r#"{"problem_1": {"content_assertions": {"min_lines": "x"}}}"#)
            .unwrap();
        assert!(AssertionConfig::load_or_default(&wrong_shape).is_empty());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn settings_read_overrides_and_fall_back() {
        let env: HashMap<&str, &str> = [
            ("NBGRADE_TIMEOUT_SECS", "120"),
            ("NBGRADE_KERNEL", " "),
            ("NBGRADE_PARAMS_FILE", "params/p.json"),
        ]
        .into_iter()
        .collect();
        let settings = Settings::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(settings.timeout, Duration::from_secs(120));
        assert_eq!(settings.kernel, "python3");
        assert_eq!(settings.jupyter, None);
        assert_eq!(
            settings.params_path(Path::new("/course/hw01.ipynb")),
            PathBuf::from("/course/params/p.json")
        );

        let bad = Settings::from_lookup(|k| (k == "NBGRADE_TIMEOUT_SECS").then(|| "soon".into()));
        assert_eq!(bad.timeout, DEFAULT_EXECUTION_TIMEOUT);
    }
}
