//! Error types for the relocalization judger.

use thiserror::Error;

/// Every failure aborts the current run; nothing is skipped or defaulted.
#[derive(Error, Debug)]
pub enum JudgerError {
    #[error("missing field `{field}` in {origin}")]
    MissingField { origin: String, field: String },

    #[error("malformed input {origin}: {reason}")]
    MalformedInput { origin: String, reason: String },

    #[error(
        "schema mismatch in sample {sample}: missing features {missing:?}, unexpected features {unexpected:?}"
    )]
    SchemaMismatch {
        sample: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("degenerate split: {0}")]
    DegenerateSplit(String),

    #[error("cannot normalize feature `{feature}`: {reason}")]
    NormalizationError { feature: String, reason: String },

    #[error("no convergence: {0}")]
    NoConvergence(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl JudgerError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        JudgerError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(origin: impl Into<String>, reason: impl ToString) -> Self {
        JudgerError::MalformedInput {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, JudgerError>;
