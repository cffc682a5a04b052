//! Suite discovery, selection and the resulting `cargo test` invocation.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::config::{LIB_SUITE, RunnerConfig};
use super::markers::MarkerExpr;
use super::RunnerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteKind {
    /// `#[cfg(test)]` modules inside the library.
    Lib,
    /// One file under the discovery path.
    Test,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite {
    pub name: String,
    pub kind: SuiteKind,
    pub markers: Vec<String>,
    pub path: Option<PathBuf>,
}

/// Shorthand selections offered by `--type`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TestType {
    #[default]
    All,
    Unit,
    Integration,
    /// Everything not marked `slow`.
    Fast,
}

impl TestType {
    pub fn marker_expr(self) -> Option<&'static str> {
        match self {
            TestType::All => None,
            TestType::Unit => Some("unit"),
            TestType::Integration => Some("integration"),
            TestType::Fast => Some("not slow"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub test_type: TestType,
    pub marker_expr: Option<String>,
    pub test: Option<String>,
    pub keyword: Option<String>,
    pub integration_only: bool,
    pub verbose: bool,
}

/// Find the suites: the library itself when `runner.toml` lists it, then every
/// `.rs` file directly under the discovery path, sorted by name.
pub fn discover(config: &RunnerConfig, root: &Path) -> Result<Vec<Suite>, RunnerError> {
    let mut suites = Vec::new();

    if config.suites.iter().any(|s| s.name == LIB_SUITE) {
        suites.push(Suite {
            name: LIB_SUITE.to_string(),
            kind: SuiteKind::Lib,
            markers: config.markers_for(LIB_SUITE),
            path: None,
        });
    }

    let dir = root.join(&config.runner.testpaths);
    let entries = std::fs::read_dir(&dir).map_err(|source| RunnerError::Read {
        path: dir.clone(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| RunnerError::Read {
                path: dir.clone(),
                source,
            })?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "rs") {
            files.push(path);
        }
    }
    files.sort();

    for path in files {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let markers = config.markers_for(name);
        if markers.is_empty() {
            tracing::warn!("Suite {} has no markers in runner.toml", name);
        }
        suites.push(Suite {
            name: name.to_string(),
            kind: SuiteKind::Test,
            markers,
            path: Some(path.clone()),
        });
    }

    Ok(suites)
}

/// `tests/test_user_creation.rs`, `test_user_creation` and `user_creation` all
/// name the same suite.
fn normalize(name: &str) -> &str {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    stem.strip_prefix("test_").unwrap_or(stem)
}

#[derive(Debug, Clone)]
pub struct TestPlan {
    pub suites: Vec<Suite>,
    pub keyword: Option<String>,
    pub verbose: bool,
}

impl TestPlan {
    pub fn build(
        config: &RunnerConfig,
        suites: Vec<Suite>,
        selection: &Selection,
    ) -> Result<Self, RunnerError> {
        let mut selected = suites;

        if selection.integration_only {
            let workflow = &config.runner.workflow_suite;
            selected.retain(|s| &s.name == workflow);
            if selected.is_empty() {
                return Err(RunnerError::UnknownSuite(workflow.clone()));
            }
        }

        if let Some(test) = &selection.test {
            let wanted = normalize(test);
            selected.retain(|s| normalize(&s.name) == wanted);
            if selected.is_empty() {
                return Err(RunnerError::UnknownSuite(test.clone()));
            }
        }

        if let Some(expr) = marker_filter(config, selection)? {
            selected.retain(|s| expr.matches(&s.markers));
        }

        if selected.is_empty() {
            return Err(RunnerError::EmptySelection);
        }

        Ok(Self {
            suites: selected,
            keyword: selection.keyword.clone(),
            verbose: selection.verbose,
        })
    }

    /// Arguments for `cargo`, starting with `test`.
    pub fn cargo_args(&self, config: &RunnerConfig) -> Vec<String> {
        let mut args = vec!["test".to_string()];
        args.extend(config.runner.cargo_args.iter().cloned());

        for suite in &self.suites {
            match suite.kind {
                SuiteKind::Lib => args.push("--lib".to_string()),
                SuiteKind::Test => {
                    args.push("--test".to_string());
                    args.push(suite.name.clone());
                }
            }
        }

        let mut test_args = config.runner.test_args.clone();
        if self.verbose {
            test_args.push("--show-output".to_string());
        }
        // libtest name filter, matched against each test's module path
        if let Some(keyword) = &self.keyword {
            test_args.push(keyword.clone());
        }
        if !test_args.is_empty() {
            args.push("--".to_string());
            args.extend(test_args);
        }

        args
    }

    pub fn command(&self, config: &RunnerConfig, root: &Path) -> Command {
        let mut command = Command::new(std::env::var("CARGO").unwrap_or_else(|_| "cargo".into()));
        command.current_dir(root).args(self.cargo_args(config));

        let existing = std::env::var("RUSTFLAGS").ok();
        if let Some(flags) = config.rustflags(existing.as_deref()) {
            command.env("RUSTFLAGS", flags);
        }
        command
    }

    /// Run the plan and report whether every selected test passed.
    pub fn run(&self, config: &RunnerConfig, root: &Path) -> Result<bool, RunnerError> {
        let mut command = self.command(config, root);
        tracing::info!("Running {:?}", command);

        let status = command.status().map_err(RunnerError::Spawn)?;
        Ok(status.success())
    }
}

/// Combine `--type` and `-m` into one expression and check every marker is registered.
fn marker_filter(
    config: &RunnerConfig,
    selection: &Selection,
) -> Result<Option<MarkerExpr>, RunnerError> {
    let from_type = selection
        .test_type
        .marker_expr()
        .map(MarkerExpr::parse)
        .transpose()?;
    let from_flag = selection
        .marker_expr
        .as_deref()
        .map(MarkerExpr::parse)
        .transpose()?;

    let expr = match (from_type, from_flag) {
        (Some(a), Some(b)) => Some(a.and(b)),
        (a, b) => a.or(b),
    };

    if let Some(expr) = &expr {
        for name in expr.names() {
            config.check_marker(name)?;
        }
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        [runner]
        cargo_args = ["--no-fail-fast"]
        workflow_suite = "integration"

        [markers]
        unit = "fast"
        integration = "several components"
        slow = "takes a while"

        [[suite]]
        name = "lib"
        markers = ["unit"]

        [[suite]]
        name = "user_creation"
        markers = ["unit"]

        [[suite]]
        name = "api"
        markers = ["integration"]

        [[suite]]
        name = "integration"
        markers = ["integration", "slow"]
    "#;

    fn workspace() -> (tempfile::TempDir, RunnerConfig, Vec<Suite>) {
        let dir = tempfile::tempdir().unwrap();
        let tests = dir.path().join("tests");
        std::fs::create_dir_all(tests.join("common")).unwrap();
        for file in ["user_creation.rs", "api.rs", "integration.rs", "notes.md"] {
            std::fs::write(tests.join(file), "").unwrap();
        }
        std::fs::write(tests.join("common").join("mod.rs"), "").unwrap();

        let config = RunnerConfig::parse(CONFIG).unwrap();
        let suites = discover(&config, dir.path()).unwrap();
        (dir, config, suites)
    }

    fn names(plan: &TestPlan) -> Vec<&str> {
        plan.suites.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn discovers_rust_files_only() {
        let (_dir, _config, suites) = workspace();
        let found: Vec<_> = suites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(found, vec!["lib", "api", "integration", "user_creation"]);
        assert_eq!(suites[0].kind, SuiteKind::Lib);
        assert_eq!(suites[2].markers, vec!["integration", "slow"]);
    }

    #[test]
    fn type_unit_selects_unit_suites() {
        let (_dir, config, suites) = workspace();
        let selection = Selection {
            test_type: TestType::Unit,
            ..Default::default()
        };
        let plan = TestPlan::build(&config, suites, &selection).unwrap();
        assert_eq!(names(&plan), vec!["lib", "user_creation"]);
    }

    #[test]
    fn type_integration_selects_integration_suites() {
        let (_dir, config, suites) = workspace();
        let selection = Selection {
            test_type: TestType::Integration,
            ..Default::default()
        };
        let plan = TestPlan::build(&config, suites, &selection).unwrap();
        assert_eq!(names(&plan), vec!["api", "integration"]);
    }

    #[test]
    fn type_fast_and_not_slow_drop_slow_suites() {
        let (_dir, config, suites) = workspace();
        let fast = Selection {
            test_type: TestType::Fast,
            ..Default::default()
        };
        let not_slow = Selection {
            marker_expr: Some("not slow".into()),
            ..Default::default()
        };

        let a = TestPlan::build(&config, suites.clone(), &fast).unwrap();
        let b = TestPlan::build(&config, suites, &not_slow).unwrap();
        assert_eq!(names(&a), vec!["lib", "api", "user_creation"]);
        assert_eq!(names(&a), names(&b));
    }

    #[test]
    fn test_flag_accepts_optional_prefix() {
        let (_dir, config, suites) = workspace();
        for name in ["test_user_creation", "user_creation", "tests/user_creation.rs"] {
            let selection = Selection {
                test: Some(name.into()),
                ..Default::default()
            };
            let plan = TestPlan::build(&config, suites.clone(), &selection).unwrap();
            assert_eq!(names(&plan), vec!["user_creation"]);
        }

        let selection = Selection {
            test: Some("test_nothing".into()),
            ..Default::default()
        };
        assert!(matches!(
            TestPlan::build(&config, suites, &selection),
            Err(RunnerError::UnknownSuite(_))
        ));
    }

    #[test]
    fn integration_only_runs_workflow_suite() {
        let (_dir, config, suites) = workspace();
        let selection = Selection {
            integration_only: true,
            ..Default::default()
        };
        let plan = TestPlan::build(&config, suites, &selection).unwrap();
        assert_eq!(names(&plan), vec!["integration"]);
    }

    #[test]
    fn empty_selection_is_an_error() {
        let (_dir, config, suites) = workspace();
        let selection = Selection {
            test_type: TestType::Fast,
            integration_only: true,
            ..Default::default()
        };
        assert!(matches!(
            TestPlan::build(&config, suites, &selection),
            Err(RunnerError::EmptySelection)
        ));
    }

    #[test]
    fn unregistered_marker_is_rejected() {
        let (_dir, config, suites) = workspace();
        let selection = Selection {
            marker_expr: Some("flaky".into()),
            ..Default::default()
        };
        assert!(matches!(
            TestPlan::build(&config, suites, &selection),
            Err(RunnerError::UnknownMarker(m)) if m == "flaky"
        ));
    }

    #[test]
    fn cargo_args_for_selection() {
        let (_dir, config, suites) = workspace();
        let selection = Selection {
            test_type: TestType::Unit,
            keyword: Some("user".into()),
            verbose: true,
            ..Default::default()
        };
        let plan = TestPlan::build(&config, suites, &selection).unwrap();
        assert_eq!(
            plan.cargo_args(&config),
            vec![
                "test",
                "--no-fail-fast",
                "--lib",
                "--test",
                "user_creation",
                "--",
                "--show-output",
                "user",
            ]
        );
    }

    #[test]
    fn keyword_filters_test_names_not_suites() {
        let (_dir, config, suites) = workspace();
        let selection = Selection {
            keyword: Some("api".into()),
            ..Default::default()
        };
        let plan = TestPlan::build(&config, suites, &selection).unwrap();
        assert_eq!(names(&plan), vec!["lib", "api", "integration", "user_creation"]);

        let args = plan.cargo_args(&config);
        assert_eq!(args.last().map(String::as_str), Some("api"));
        assert_eq!(args[args.len() - 2], "--");
    }

    #[test]
    fn cargo_args_without_test_args_have_no_separator() {
        let (_dir, config, suites) = workspace();
        let selection = Selection {
            test: Some("api".into()),
            ..Default::default()
        };
        let plan = TestPlan::build(&config, suites, &selection).unwrap();
        assert_eq!(
            plan.cargo_args(&config),
            vec!["test", "--no-fail-fast", "--test", "api"]
        );
    }
}
