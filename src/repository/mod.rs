//! Repository contracts consumed by the raw query executor.
//!
//! A [`Repository`] is a named backing store. Repositories able to run
//! literal SQL hand out [`Connection`]s; every connection used by this crate
//! is wrapped in a [`ScopedConnection`], which closes it exactly once when it
//! goes out of scope, on success and on every error path.

pub mod mock;
pub mod postgres;

#[doc(inline)]
pub use mock::{MockRepository, MockResultSet};
#[doc(inline)]
pub use postgres::PostgresRepository;

use crate::error::FinderError;
use sea_query::{InsertStatement, PostgresQueryBuilder, SelectStatement, Value};

#[cfg(feature = "tracing")]
use crate::telemetry::tracing_helpers;

/// One row as read from the store: column name and raw value, in column order
pub type RawRow = Vec<(String, Value)>;

/// A named, connected backing store
pub trait Repository {
    fn name(&self) -> &str;

    /// Whether this store executes literal text queries over a connection
    fn supports_raw_query(&self) -> bool;

    /// Open a connection. Callers go through [`acquire`] so the connection
    /// is always released.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` for stores without raw query support and
    /// `Store` for connectivity failures.
    fn connect(&self) -> Result<Box<dyn Connection + '_>, FinderError>;

    /// Render a structured select into text and positional bind values
    fn compile_select(&self, query: &SelectStatement) -> (String, Vec<Value>) {
        let (sql, values) = query.build(PostgresQueryBuilder);
        (sql, values.0)
    }

    /// Render a structured insert into text and positional bind values
    fn compile_insert(&self, query: &InsertStatement) -> (String, Vec<Value>) {
        let (sql, values) = query.build(PostgresQueryBuilder);
        (sql, values.0)
    }
}

/// A stateful connection able to run literal SQL
pub trait Connection {
    /// Run a query and return a cursor over its rows
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Box<dyn RowCursor + '_>, FinderError>;

    /// Run a statement and return the number of rows affected
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, FinderError>;

    /// Release the connection back to its store
    fn close(&mut self);
}

/// Row-at-a-time access to a query result
pub trait RowCursor {
    /// Next row, or `None` once the result is exhausted
    fn next_row(&mut self) -> Result<Option<RawRow>, FinderError>;
}

/// Connection released when dropped
pub struct ScopedConnection<'r> {
    inner: Box<dyn Connection + 'r>,
    repository: String,
}

impl ScopedConnection<'_> {
    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn query(&mut self, sql: &str, params: &[Value]) -> Result<Box<dyn RowCursor + '_>, FinderError> {
        self.inner.query(sql, params)
    }

    pub fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, FinderError> {
        self.inner.execute(sql, params)
    }
}

impl Drop for ScopedConnection<'_> {
    fn drop(&mut self) {
        self.inner.close();
        log::debug!("released connection to repository `{}`", self.repository);
    }
}

/// Acquire a scoped connection from a raw-query capable repository.
///
/// # Errors
///
/// Returns `UnsupportedOperation` without touching the store when the
/// repository cannot run literal SQL; connection failures propagate unchanged.
pub fn acquire(repository: &dyn Repository) -> Result<ScopedConnection<'_>, FinderError> {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::acquire_connection_span(repository.name()).entered();

    ensure_raw_query_support(repository)?;
    let inner = repository.connect()?;
    log::debug!("acquired connection to repository `{}`", repository.name());
    Ok(ScopedConnection {
        inner,
        repository: repository.name().to_string(),
    })
}

/// Fail with `UnsupportedOperation` unless the repository runs literal SQL
pub fn ensure_raw_query_support(repository: &dyn Repository) -> Result<(), FinderError> {
    if repository.supports_raw_query() {
        Ok(())
    } else {
        Err(FinderError::UnsupportedOperation(format!(
            "repository `{}` does not support literal text queries; raw queries require a relational adapter with stateful connections",
            repository.name()
        )))
    }
}
