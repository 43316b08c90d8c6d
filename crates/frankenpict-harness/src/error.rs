//! Harness error type.

use std::path::PathBuf;

use frankenpict_core::CoverError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Cover(#[from] CoverError),

    #[error("model {name}: {reason}")]
    Model { name: String, reason: String },

    /// Malformed command-line value or row text.
    #[error("parse error: {0}")]
    Parse(String),
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(reason: impl Into<String>) -> Self {
        Self::Parse(reason.into())
    }

    /// Stable code for logs. Core errors keep their own code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::Json(_) => "json",
            Self::Csv(_) => "csv",
            Self::Cover(err) => err.code(),
            Self::Model { .. } => "model",
            Self::Parse(_) => "parse",
        }
    }
}
