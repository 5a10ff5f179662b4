//! Span helpers for the optional `tracing` feature.
//!
//! Events are logged through the `log` facade regardless of features; these
//! spans only add structure around the blocking calls.

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{debug_span, info_span, Span};

    /// Span covering acquisition of a scoped connection
    pub fn acquire_connection_span(repository: &str) -> Span {
        debug_span!("lifeguard_finders.acquire_connection", repository = repository)
    }

    /// Span covering one raw query from execution to record loading
    pub fn raw_query_span(model: &str, repository: &str, sql: &str) -> Span {
        info_span!(
            "lifeguard_finders.raw_query",
            model = model,
            repository = repository,
            db.statement = sql
        )
    }

    /// Span covering a single statement executed for a write (`find_or_create`)
    pub fn execute_statement_span(sql: &str) -> Span {
        info_span!("lifeguard_finders.execute", db.statement = sql)
    }

    /// Span covering dispatch of a possibly-dynamic method call
    pub fn dispatch_span(model: &str, method: &str) -> Span {
        debug_span!("lifeguard_finders.dispatch", model = model, method = method)
    }
}
