//! Error types for raw queries and dynamic finders.
//!
//! Every failure propagates to the immediate caller. Nothing here is retried
//! or translated; driver errors are carried unchanged inside [`StoreError`].

use may_postgres::Error as PostgresError;
use sea_query::Value;
use std::fmt;

/// Error surfaced by a repository's connection or execution primitives
#[derive(Debug)]
pub enum StoreError {
    /// `PostgreSQL` error from `may_postgres`
    PostgresError(PostgresError),
    /// Connection string rejected before connecting
    InvalidConnectionString(String),
    /// Any other store-level failure (connectivity, syntax, timeout)
    Other(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::PostgresError(e) => write!(f, "PostgreSQL error: {e}"),
            StoreError::InvalidConnectionString(s) => write!(f, "Invalid connection string: {s}"),
            StoreError::Other(s) => write!(f, "Store error: {s}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::PostgresError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PostgresError> for StoreError {
    fn from(err: PostgresError) -> Self {
        StoreError::PostgresError(err)
    }
}

/// Error type for raw queries, lookups and dynamic finder dispatch
#[derive(Debug)]
pub enum FinderError {
    /// Raw query input is not text, a sequence, or a structured query
    InvalidArgument(String),
    /// The repository cannot execute literal text queries
    UnsupportedOperation(String),
    /// Attribute tokens in a finder name and supplied arguments differ in count
    BindingArityMismatch {
        method: String,
        expected: usize,
        actual: usize,
    },
    /// Method name is not a dynamic finder and nothing further down the chain handled it
    UnknownMethod { method: String, args: Vec<Value> },
    /// Attribute is not declared on the model
    UnknownAttribute { model: String, attribute: String },
    /// No repository registered under this name
    UnknownRepository(String),
    /// No model registered under this name
    UnknownModel(String),
    /// Failure from the underlying store, propagated unchanged
    Store(StoreError),
    /// Column decoding or typed extraction failure
    ParseError(String),
    /// Configuration could not be loaded
    Config(config::ConfigError),
}

impl fmt::Display for FinderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinderError::InvalidArgument(s) => write!(f, "Invalid argument: {s}"),
            FinderError::UnsupportedOperation(s) => write!(f, "Unsupported operation: {s}"),
            FinderError::BindingArityMismatch {
                method,
                expected,
                actual,
            } => write!(
                f,
                "Binding arity mismatch: {method} expects {expected} argument(s), got {actual}"
            ),
            FinderError::UnknownMethod { method, args } => {
                write!(f, "Undefined method `{method}` called with {} argument(s)", args.len())
            }
            FinderError::UnknownAttribute { model, attribute } => {
                write!(f, "Unknown attribute `{attribute}` for model {model}")
            }
            FinderError::UnknownRepository(s) => write!(f, "Unknown repository: {s}"),
            FinderError::UnknownModel(s) => write!(f, "Unknown model: {s}"),
            FinderError::Store(e) => write!(f, "{e}"),
            FinderError::ParseError(s) => write!(f, "Parse error: {s}"),
            FinderError::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for FinderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FinderError::Store(e) => Some(e),
            FinderError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for FinderError {
    fn from(err: StoreError) -> Self {
        FinderError::Store(err)
    }
}

impl From<PostgresError> for FinderError {
    fn from(err: PostgresError) -> Self {
        FinderError::Store(StoreError::PostgresError(err))
    }
}

impl From<config::ConfigError> for FinderError {
    fn from(err: config::ConfigError) -> Self {
        FinderError::Config(err)
    }
}
