//! Error types for the data-loader crate.
//!
//! Two families live here:
//! - `DataLoadError` covers reading and parsing the raw dataset files
//! - `UnknownEntity` is the lookup failure every engine surfaces when a
//!   query names a user or item that was not in the snapshot (cold start)

use std::fmt;
use thiserror::Error;

/// Errors that can occur during data loading and parsing
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// Expected number of fields in a line doesn't match actual
    #[error("Expected at least {expected} fields but found {found} in {file} line {line}")]
    FieldCountMismatch {
        file: String,
        expected: usize,
        found: usize,
        line: usize,
    },

    /// Nothing survived cleaning
    #[error("No interactions left after cleaning {0}")]
    EmptyDataset(String),
}

/// What kind of identifier a failed lookup referred to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Item,
    /// Item resolved by its exact title rather than its id
    Title,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::User => f.write_str("user"),
            EntityKind::Item => f.write_str("item"),
            EntityKind::Title => f.write_str("title"),
        }
    }
}

/// A query referenced an identifier absent from the identifier mapping.
///
/// This is recoverable: callers get it back as a typed value and decide
/// how to present a cold-start subject.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: {id}")]
pub struct UnknownEntity {
    pub kind: EntityKind,
    pub id: String,
}

impl UnknownEntity {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::User,
            id: id.into(),
        }
    }

    pub fn item(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Item,
            id: id.into(),
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Title,
            id: title.into(),
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
