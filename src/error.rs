use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced at the engine boundary.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Analysis root is not accessible: {path}: {reason}")]
    RootInaccessible { path: PathBuf, reason: String },

    #[error("Invalid analysis result: {0}")]
    InvalidResult(String),

    #[error("Internal analysis failure: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    UnreadableFile,
    UnparsableUnit,
    NameCollision,
    WalkError,
}

/// A non-fatal condition recorded in the result instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnalysisWarning {
    pub kind: WarningKind,
    pub file_path: String,
    pub message: String,
}

impl AnalysisWarning {
    pub fn new(kind: WarningKind, file_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            file_path: file_path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WarningKind::UnreadableFile => "unreadable-file",
            WarningKind::UnparsableUnit => "unparsable-unit",
            WarningKind::NameCollision => "name-collision",
            WarningKind::WalkError => "walk-error",
        };
        write!(f, "{}", label)
    }
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.file_path, self.message)
    }
}
