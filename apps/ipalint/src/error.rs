//! Error taxonomy shared by the lint engine, snapshot tooling and CLI.
//!
//! Violations are never errors: they are normal report output. Everything
//! here aborts the current run.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration could not be loaded or does not describe a valid rule set.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse configuration {path}: {reason}")]
    ParseFailed { path: PathBuf, reason: String },

    #[error("unknown rule '{0}' in configuration")]
    UnknownRule(String),

    #[error("malformed configuration for rule '{rule}': {reason}")]
    Malformed { rule: String, reason: String },
}

/// A rule met input it cannot reason about. This points at corrupt upstream
/// data rather than a policy finding.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("unsupported value for '{key}': expected string or string array, found {kind}")]
    UnsupportedValue { key: String, kind: String },

    #[error("I/O error during evaluation: {0}")]
    Io(#[from] std::io::Error),

    #[error("entitlements unavailable: {0}")]
    Entitlements(#[from] ExtractionError),
}

/// Failures of the extraction collaborators (archive unpacking, code-signing
/// metadata, Info.plist).
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("no .app bundle found under {0}")]
    AppNotFound(PathBuf),

    #[error("{tool} failed: {message}")]
    Tool { tool: &'static str, message: String },

    #[error("invalid property list: {0}")]
    Plist(#[from] plist::Error),

    #[error("extraction cancelled")]
    Cancelled,
}

/// Snapshot generation, persistence and diffing failures.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot contains duplicate path '{0}'")]
    DuplicatePath(String),

    #[error("snapshot generation cancelled")]
    Cancelled,
}

/// A file-size literal did not match `<number> <unit>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid file size '{input}': expected '<number> <B|KB|MB|GB>'")]
pub struct SizeParseError {
    pub input: String,
}

/// Top-level error surfaced by every subcommand.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("run cancelled")]
    Cancelled,
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
