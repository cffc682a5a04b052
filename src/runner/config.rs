//! `runner.toml` loading.
//!
//! ```toml
//! [runner]
//! testpaths = "tests"
//! cargo_args = ["--no-fail-fast"]
//! test_args = []
//! allow = ["dead_code"]
//! workflow_suite = "integration"
//!
//! [markers]
//! unit = "fast, isolated tests"
//!
//! [[suite]]
//! name = "user_creation"
//! markers = ["unit"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::RunnerError;

/// Name of the suite holding the library's `#[cfg(test)]` modules.
pub const LIB_SUITE: &str = "lib";

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub runner: RunnerOptions,

    /// Registered markers and their descriptions.
    #[serde(default)]
    pub markers: BTreeMap<String, String>,

    #[serde(default, rename = "suite")]
    pub suites: Vec<SuiteConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerOptions {
    /// Directory searched for integration test files.
    #[serde(default = "default_testpaths")]
    pub testpaths: String,

    /// Extra arguments for every `cargo test` invocation.
    #[serde(default)]
    pub cargo_args: Vec<String>,

    /// Extra arguments for the test binaries (after `--`).
    #[serde(default)]
    pub test_args: Vec<String>,

    /// Lints allowed while building tests, passed as `-A <lint>` in `RUSTFLAGS`.
    #[serde(default)]
    pub allow: Vec<String>,

    /// Suite run by `--integration-only`.
    #[serde(default = "default_workflow_suite")]
    pub workflow_suite: String,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            testpaths: default_testpaths(),
            cargo_args: Vec::new(),
            test_args: Vec::new(),
            allow: Vec::new(),
            workflow_suite: default_workflow_suite(),
        }
    }
}

fn default_testpaths() -> String {
    "tests".to_string()
}

fn default_workflow_suite() -> String {
    "integration".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuiteConfig {
    pub name: String,
    #[serde(default)]
    pub markers: Vec<String>,
}

impl RunnerConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, RunnerError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RunnerError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// Parse a config and reject suites tagged with unregistered markers.
    pub fn parse(raw: &str) -> Result<Self, RunnerError> {
        let config: RunnerConfig = toml::from_str(raw)?;

        for suite in &config.suites {
            for marker in &suite.markers {
                config.check_marker(marker)?;
            }
        }

        Ok(config)
    }

    pub fn check_marker(&self, marker: &str) -> Result<(), RunnerError> {
        if self.markers.contains_key(marker) {
            Ok(())
        } else {
            Err(RunnerError::UnknownMarker(marker.to_string()))
        }
    }

    /// Markers assigned to `suite`; unlisted suites carry none.
    pub fn markers_for(&self, suite: &str) -> Vec<String> {
        self.suites
            .iter()
            .find(|s| s.name == suite)
            .map(|s| s.markers.clone())
            .unwrap_or_default()
    }

    /// `RUSTFLAGS` value for a test build, keeping whatever the caller already set.
    pub fn rustflags(&self, existing: Option<&str>) -> Option<String> {
        let allowed = self
            .runner
            .allow
            .iter()
            .map(|lint| format!("-A {lint}"))
            .collect::<Vec<_>>()
            .join(" ");

        match (existing.map(str::trim).filter(|s| !s.is_empty()), allowed.is_empty()) {
            (None, true) => None,
            (None, false) => Some(allowed),
            (Some(existing), true) => Some(existing.to_string()),
            (Some(existing), false) => Some(format!("{existing} {allowed}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [runner]
        testpaths = "tests"
        cargo_args = ["--no-fail-fast"]
        allow = ["dead_code", "unused_imports"]

        [markers]
        unit = "fast"
        integration = "several components"
        slow = "takes a while"

        [[suite]]
        name = "api"
        markers = ["integration"]
    "#;

    #[test]
    fn parses_sample() {
        let config = RunnerConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.runner.testpaths, "tests");
        assert_eq!(config.runner.workflow_suite, "integration");
        assert_eq!(config.markers.len(), 3);
        assert_eq!(config.markers_for("api"), vec!["integration".to_string()]);
        assert!(config.markers_for("missing").is_empty());
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = RunnerConfig::parse("").unwrap();
        assert_eq!(config.runner.testpaths, "tests");
        assert!(config.suites.is_empty());
    }

    #[test]
    fn rejects_unregistered_suite_marker() {
        let raw = r#"
            [markers]
            unit = "fast"

            [[suite]]
            name = "api"
            markers = ["flaky"]
        "#;
        assert!(matches!(
            RunnerConfig::parse(raw),
            Err(RunnerError::UnknownMarker(m)) if m == "flaky"
        ));
    }

    #[test]
    fn rustflags_appends_allowed_lints() {
        let config = RunnerConfig::parse(SAMPLE).unwrap();
        assert_eq!(
            config.rustflags(None).as_deref(),
            Some("-A dead_code -A unused_imports")
        );
        assert_eq!(
            config.rustflags(Some("-C debuginfo=0")).as_deref(),
            Some("-C debuginfo=0 -A dead_code -A unused_imports")
        );

        let bare = RunnerConfig::parse("").unwrap();
        assert_eq!(bare.rustflags(Some("  ")), None);
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runner.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = RunnerConfig::load(&path).unwrap();
        assert_eq!(config.runner.cargo_args, vec!["--no-fail-fast".to_string()]);

        assert!(matches!(
            RunnerConfig::load(&dir.path().join("nope.toml")),
            Err(RunnerError::Read { .. })
        ));
    }
}
