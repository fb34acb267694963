use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, MergeError>;

/// Identifies which of the two exports a failure relates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceSide {
    /// The base product list that drives the merge.
    Primary,
    /// The export consulted for supplementary stock figures.
    Secondary,
}

impl fmt::Display for SourceSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSide::Primary => write!(f, "primary"),
            SourceSide::Secondary => write!(f, "secondary"),
        }
    }
}

/// Error type covering the different failure cases that can occur when the
/// tool ingests, reconciles, or emits stock data.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when a JSON profile cannot be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the delimited-text writer.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when an input document is malformed. Aborts the whole merge.
    #[error("failed to parse {side} input: {reason}")]
    Parse { side: SourceSide, reason: String },

    /// Raised when one of the two required inputs was not supplied.
    #[error("no {side} file selected")]
    MissingFile { side: SourceSide },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when a parsed source yields zero data rows.
    #[error("{side} input contains no data rows")]
    NoData { side: SourceSide },

    /// Raised when the configuration cannot drive a merge.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl MergeError {
    pub(crate) fn parse(side: SourceSide, reason: impl Into<String>) -> Self {
        MergeError::Parse {
            side,
            reason: reason.into(),
        }
    }
}
