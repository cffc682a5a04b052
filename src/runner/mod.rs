//! Test runner behind the `run_tests` binary.
//!
//! Suites are the integration test files under the discovery path plus the
//! library's own unit tests. `runner.toml` tags each suite with markers, and a
//! run selects suites by marker expression, type or name before handing the
//! selection to `cargo test`.

use std::path::PathBuf;

pub mod config;
pub mod markers;
pub mod plan;

pub use config::RunnerConfig;
pub use markers::MarkerExpr;
pub use plan::{Selection, Suite, TestPlan};

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid runner config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid marker expression '{expr}': {reason}")]
    MarkerSyntax { expr: String, reason: String },

    #[error("marker '{0}' is not registered in runner.toml")]
    UnknownMarker(String),

    #[error("no test suite named '{0}'")]
    UnknownSuite(String),

    #[error("no test suites match the selection")]
    EmptySelection,

    #[error("failed to start cargo: {0}")]
    Spawn(std::io::Error),
}
