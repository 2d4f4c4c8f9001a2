use std::num::ParseIntError;

use thiserror::Error;

/// A single CSV record could not be turned into a sample.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("expected 2 fields, found {found}")]
    FieldCount { found: usize },

    #[error("{column} is not a valid integer: {value:?}")]
    InvalidInteger {
        column: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("{column} has an explicit sign: {value:?}")]
    ExplicitSign { column: &'static str, value: String },

    #[error("missing header record")]
    MissingHeader,

    #[error("unexpected header record: {found:?}")]
    UnexpectedHeader { found: String },
}

/// Attach/detach misuse. These are programmer errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("collector is already attached to a run")]
    AlreadyAttached,

    #[error("collector is not attached to a run")]
    NotAttached,

    #[error("run does not know the collector's listener")]
    UnknownListener,

    #[error("collector already holds samples")]
    NotEmpty,
}

#[derive(Debug, Error)]
pub enum StatisticError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `line` is 1-based and counts the header.
    #[error("malformed record on line {line}: {source}")]
    Format {
        line: usize,
        #[source]
        source: FormatError,
    },

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("not found: {0}")]
    NotFound(String),
}
