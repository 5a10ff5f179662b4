//! Scripted in-memory repository for exercising raw queries without a database.
//!
//! Result sets are queued up front and handed out in order, one per query.
//! The repository records every statement it receives and counts connections
//! acquired and released so tests can assert on resource handling.
//!
//! ```rust
//! use lifeguard_finders::repository::{MockRepository, MockResultSet};
//! use sea_query::Value;
//!
//! let repository = MockRepository::new("default").append_query_result(
//!     MockResultSet::new(["id", "name"])
//!         .row([Value::from(1i64), Value::from("Ada")])
//!         .row([Value::from(2i64), Value::from("Grace")]),
//! );
//! assert_eq!(repository.acquired(), 0);
//! ```

use super::{Connection, RawRow, Repository, RowCursor};
use crate::error::{FinderError, StoreError};
use sea_query::Value;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// Rows returned for one query
#[derive(Debug, Clone, Default)]
pub struct MockResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    fail_at: Option<usize>,
}

impl MockResultSet {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            fail_at: None,
        }
    }

    /// Append a row; values pair with columns by position
    pub fn row<I: IntoIterator<Item = Value>>(mut self, values: I) -> Self {
        self.rows.push(values.into_iter().collect());
        self
    }

    /// Make reading the row at `index` (zero-based) fail with a store error
    pub fn fail_at_row(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }
}

/// A statement received by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug)]
pub struct MockRepository {
    name: String,
    raw_query: bool,
    connect_error: Option<String>,
    results: RefCell<VecDeque<MockResultSet>>,
    affected: RefCell<VecDeque<u64>>,
    statements: RefCell<Vec<ExecutedStatement>>,
    acquired: Cell<usize>,
    released: Cell<usize>,
}

impl MockRepository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_query: true,
            connect_error: None,
            results: RefCell::new(VecDeque::new()),
            affected: RefCell::new(VecDeque::new()),
            statements: RefCell::new(Vec::new()),
            acquired: Cell::new(0),
            released: Cell::new(0),
        }
    }

    /// Behave like a store that cannot run literal SQL
    pub fn without_raw_query_support(mut self) -> Self {
        self.raw_query = false;
        self
    }

    /// Fail every connection attempt with a store error
    pub fn failing_connect(mut self, message: impl Into<String>) -> Self {
        self.connect_error = Some(message.into());
        self
    }

    pub fn append_query_result(self, result: MockResultSet) -> Self {
        self.push_query_result(result);
        self
    }

    /// Queue a result set on an already shared repository
    pub fn push_query_result(&self, result: MockResultSet) {
        self.results.borrow_mut().push_back(result);
    }

    /// Queue the affected-row count for the next `execute`
    pub fn append_exec_result(self, rows_affected: u64) -> Self {
        self.affected.borrow_mut().push_back(rows_affected);
        self
    }

    /// Statements received so far, in order
    pub fn statements(&self) -> Vec<ExecutedStatement> {
        self.statements.borrow().clone()
    }

    pub fn acquired(&self) -> usize {
        self.acquired.get()
    }

    pub fn released(&self) -> usize {
        self.released.get()
    }

    fn record(&self, sql: &str, params: &[Value]) {
        self.statements.borrow_mut().push(ExecutedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
    }
}

impl Repository for MockRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_raw_query(&self) -> bool {
        self.raw_query
    }

    fn connect(&self) -> Result<Box<dyn Connection + '_>, FinderError> {
        if !self.raw_query {
            return Err(FinderError::UnsupportedOperation(format!(
                "repository `{}` has no connections",
                self.name
            )));
        }
        if let Some(message) = &self.connect_error {
            return Err(StoreError::Other(message.clone()).into());
        }
        self.acquired.set(self.acquired.get() + 1);
        Ok(Box::new(MockConnection { repository: self }))
    }
}

struct MockConnection<'a> {
    repository: &'a MockRepository,
}

impl Connection for MockConnection<'_> {
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Box<dyn RowCursor + '_>, FinderError> {
        self.repository.record(sql, params);
        let result = self.repository.results.borrow_mut().pop_front().unwrap_or_default();
        Ok(Box::new(MockCursor { result, next: 0 }))
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, FinderError> {
        self.repository.record(sql, params);
        Ok(self.repository.affected.borrow_mut().pop_front().unwrap_or(1))
    }

    fn close(&mut self) {
        self.repository.released.set(self.repository.released.get() + 1);
    }
}

struct MockCursor {
    result: MockResultSet,
    next: usize,
}

impl RowCursor for MockCursor {
    fn next_row(&mut self) -> Result<Option<RawRow>, FinderError> {
        if self.result.fail_at == Some(self.next) {
            return Err(StoreError::Other(format!("failed reading row {}", self.next + 1)).into());
        }
        let Some(values) = self.result.rows.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        let row = self
            .result
            .columns
            .iter()
            .cloned()
            .zip(values.iter().cloned())
            .collect();
        Ok(Some(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_are_handed_out_in_order() {
        let repository = MockRepository::new("default")
            .append_query_result(MockResultSet::new(["id"]).row([Value::from(1i64)]))
            .append_query_result(MockResultSet::new(["id"]).row([Value::from(2i64)]));
        let mut conn = repository.connect().unwrap();

        let first = conn.query("SELECT 1", &[]).unwrap().next_row().unwrap();
        let second = conn.query("SELECT 2", &[]).unwrap().next_row().unwrap();
        assert_eq!(first, Some(vec![("id".to_string(), Value::from(1i64))]));
        assert_eq!(second, Some(vec![("id".to_string(), Value::from(2i64))]));
        conn.close();
        assert_eq!(repository.statements().len(), 2);
    }

    #[test]
    fn test_unqueued_query_returns_no_rows() {
        let repository = MockRepository::new("default");
        let mut conn = repository.connect().unwrap();
        let mut cursor = conn.query("SELECT * FROM users", &[]).unwrap();
        assert_eq!(cursor.next_row().unwrap(), None);
    }

    #[test]
    fn test_injected_row_failure() {
        let repository = MockRepository::new("default").append_query_result(
            MockResultSet::new(["id"])
                .row([Value::from(1i64)])
                .row([Value::from(2i64)])
                .fail_at_row(1),
        );
        let mut conn = repository.connect().unwrap();
        let mut cursor = conn.query("SELECT id FROM users", &[]).unwrap();
        assert!(cursor.next_row().unwrap().is_some());
        assert!(matches!(cursor.next_row(), Err(FinderError::Store(_))));
    }

    #[test]
    fn test_failing_connect_is_a_store_error() {
        let repository = MockRepository::new("default").failing_connect("connection refused");
        let err = repository.connect().err().unwrap();
        assert_eq!(err.to_string(), "Store error: connection refused");
        assert_eq!(repository.acquired(), 0);
    }
}
