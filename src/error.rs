// src/error.rs
//! Error taxonomy shared by every pipeline stage.
//!
//! Fatal conditions come back as `Err(PipelineError)`. Per-item problems that a
//! stage is allowed to survive are recorded as [`Skip`] entries in the stage's
//! summary instead, so every dropped item can be traced to an input and a reason.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Schema error: missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Parse error in {item}: {reason}")]
    Parse { item: String, reason: String },

    #[error("Missing field `{field}` in {item}")]
    MissingField { field: &'static str, item: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl PipelineError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io { path: path.as_ref().to_path_buf(), source }
    }

    pub fn json(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        Self::Json { path: path.as_ref().to_path_buf(), source }
    }

    pub fn parse(item: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse { item: item.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// A non-fatal drop: which input item, and why.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Skip {
    pub item: String,
    pub reason: String,
}

impl Skip {
    pub fn new(item: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { item: item.into(), reason: reason.into() }
    }
}

impl From<&PipelineError> for Skip {
    fn from(err: &PipelineError) -> Self {
        match err {
            PipelineError::Parse { item, reason } => Skip::new(item.clone(), reason.clone()),
            PipelineError::MissingField { field, item } => {
                Skip::new(item.clone(), format!("missing field `{field}`"))
            }
            PipelineError::Io { path, source } => Skip::new(path.display().to_string(), source.to_string()),
            PipelineError::Json { path, source } => {
                Skip::new(path.display().to_string(), format!("invalid JSON: {source}"))
            }
            other => Skip::new("-", other.to_string()),
        }
    }
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.item, self.reason)
    }
}
