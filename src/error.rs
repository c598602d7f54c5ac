//! Error taxonomy for conversions.
//!
//! Every failure surfaces to the caller; nothing is retried or recovered locally.
//! Row-level failures carry the file and 1-based line they came from so a run can be
//! diagnosed without repeating it.

use crate::types::PrimitiveType;
use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the library.
pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

/// Top-level error for every conversion entry point.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Conflicting or missing options, detected before any I/O.
    #[error("invalid options: {0}")]
    Validation(String),

    /// The output is in a state the options do not allow (e.g. it already exists).
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Unparsable, unsupported or incompatible schema.
    #[error("schema error: {0}")]
    Schema(String),

    /// A data row could not be turned into a record.
    #[error("{}, line {line}: {source}", .path.display())]
    Conversion {
        path: PathBuf,
        line: u64,
        #[source]
        source: ConversionError,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: {source}", .path.display())]
    Avro {
        path: PathBuf,
        #[source]
        source: apache_avro::Error,
    },
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn avro(path: impl Into<PathBuf>, source: apache_avro::Error) -> Self {
        Self::Avro {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

/// Failure to coerce one piece of text to a primitive type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot coerce {value:?} to {ty}: {reason}")]
pub struct CoerceError {
    pub ty: PrimitiveType,
    pub value: String,
    pub reason: String,
}

impl CoerceError {
    pub fn new(ty: PrimitiveType, value: &str, reason: impl ToString) -> Self {
        Self {
            ty,
            value: value.to_owned(),
            reason: reason.to_string(),
        }
    }
}

/// Failure to turn one text row into a record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The cell at `index` (0-based) could not be coerced and no usable default exists.
    #[error("column {} ({}): {error}", .index + 1, .field)]
    Field {
        index: usize,
        field: String,
        error: CoerceError,
    },

    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },
}
