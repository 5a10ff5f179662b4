//! Raw query executor.
//!
//! Runs a literal query (text, text plus bind values, or a structured
//! `sea_query` select) against a repository, keeps only the columns that map
//! to the requested attributes, and hands the rows to the model's record
//! loader.
//!
//! # Examples
//!
//! ```rust
//! use lifeguard_finders::{Model, ModelDescriptor, RawQueryOptions, Registry};
//! use lifeguard_finders::repository::{MockRepository, MockResultSet};
//! use sea_query::Value;
//! use std::sync::Arc;
//!
//! let mut registry = Registry::new();
//! registry.register_model(
//!     ModelDescriptor::builder("User", "users")
//!         .attributes(["id", "name"])
//!         .build()?,
//! );
//! registry.register_repository(Arc::new(MockRepository::new("default").append_query_result(
//!     MockResultSet::new(["id", "name", "password_hash"])
//!         .row([Value::from(1i64), Value::from("Ada"), Value::from("x")]),
//! )));
//!
//! let users = Model::new(Arc::new(registry), "User")?;
//! let records = users.raw_query(
//!     vec![Value::from("SELECT * FROM users WHERE id = $1"), Value::from(1i64)],
//!     RawQueryOptions::default(),
//! )?;
//! assert_eq!(records.len(), 1);
//! assert!(records.first().unwrap().get("password_hash").is_none());
//! # Ok::<(), lifeguard_finders::FinderError>(())
//! ```

use crate::error::FinderError;
use crate::model::{Attribute, AttributeSet, ModelDescriptor};
use crate::record::{LoadQuery, ResultCollection, ResultRow};
use crate::registry::Registry;
use crate::repository::{acquire, ensure_raw_query_support, Repository};
use crate::value::json_to_value;
use sea_query::{SelectStatement, Value};
use serde::Deserialize;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use crate::telemetry::tracing_helpers;

/// A query in one of the accepted shapes
#[derive(Debug, Clone)]
pub enum QueryLike {
    /// Literal text, no bind values
    Text(String),
    /// `[text, bind...]`
    Sequence(Vec<Value>),
    /// Compiled by the repository into text and bind values
    Structured(SelectStatement),
}

impl From<&str> for QueryLike {
    fn from(sql: &str) -> Self {
        QueryLike::Text(sql.to_string())
    }
}

impl From<String> for QueryLike {
    fn from(sql: String) -> Self {
        QueryLike::Text(sql)
    }
}

impl From<Vec<Value>> for QueryLike {
    fn from(sequence: Vec<Value>) -> Self {
        QueryLike::Sequence(sequence)
    }
}

impl From<SelectStatement> for QueryLike {
    fn from(query: SelectStatement) -> Self {
        QueryLike::Structured(query)
    }
}

impl From<&SelectStatement> for QueryLike {
    fn from(query: &SelectStatement) -> Self {
        QueryLike::Structured(query.clone())
    }
}

impl TryFrom<serde_json::Value> for QueryLike {
    type Error = FinderError;

    /// Accept a string as text and an array as `[text, bind...]`
    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        match json {
            serde_json::Value::String(sql) => Ok(QueryLike::Text(sql)),
            serde_json::Value::Array(items) => {
                Ok(QueryLike::Sequence(items.into_iter().map(json_to_value).collect()))
            }
            other => Err(FinderError::InvalidArgument(format!(
                "query must be a string, an array of [text, bind...] or a structured query, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Attribute projection requested by the caller
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Properties {
    Name(String),
    List(Vec<String>),
    #[serde(skip)]
    Set(AttributeSet),
}

impl From<&str> for Properties {
    fn from(name: &str) -> Self {
        Properties::Name(name.to_string())
    }
}

impl From<Vec<&str>> for Properties {
    fn from(names: Vec<&str>) -> Self {
        Properties::List(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&Attribute]> for Properties {
    fn from(attributes: &[&Attribute]) -> Self {
        Properties::List(attributes.iter().map(|a| a.name().to_string()).collect())
    }
}

impl From<AttributeSet> for Properties {
    fn from(set: AttributeSet) -> Self {
        Properties::Set(set)
    }
}

/// Options for a raw query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawQueryOptions {
    /// Repository to run against; defaults to the model's default repository
    #[serde(default)]
    pub repository: Option<String>,
    /// Attributes to project; defaults to every declared attribute
    #[serde(default)]
    pub properties: Option<Properties>,
    /// Mark loaded records as refreshing already-loaded state
    #[serde(default)]
    pub reload: bool,
}

impl RawQueryOptions {
    pub fn repository(mut self, name: impl Into<String>) -> Self {
        self.repository = Some(name.into());
        self
    }

    pub fn properties(mut self, properties: impl Into<Properties>) -> Self {
        self.properties = Some(properties.into());
        self
    }

    pub fn reload(mut self, reload: bool) -> Self {
        self.reload = reload;
        self
    }

    /// Parse options from a JSON object
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for unknown keys or mistyped values.
    pub fn from_json(json: serde_json::Value) -> Result<Self, FinderError> {
        serde_json::from_value(json)
            .map_err(|e| FinderError::InvalidArgument(format!("invalid raw query options: {e}")))
    }
}

/// A raw query with every option resolved
#[derive(Debug, Clone)]
pub struct RawQuerySpec {
    pub sql: String,
    pub binds: Vec<Value>,
    pub repository: String,
    pub fields: AttributeSet,
    pub reload: bool,
}

impl RawQuerySpec {
    /// Normalize the query and resolve options against the model
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for malformed queries and `UnknownAttribute`
    /// for projections naming undeclared attributes.
    pub fn resolve(
        model: &ModelDescriptor,
        repository: &dyn Repository,
        query: QueryLike,
        options: &RawQueryOptions,
    ) -> Result<Self, FinderError> {
        let (sql, binds) = normalize_query(query, repository)?;
        let fields = resolve_properties(model, options.properties.as_ref())?;
        Ok(Self {
            sql,
            binds,
            repository: repository.name().to_string(),
            fields,
            reload: options.reload,
        })
    }
}

/// Turn any accepted query shape into text plus ordered bind values
pub fn normalize_query(
    query: QueryLike,
    repository: &dyn Repository,
) -> Result<(String, Vec<Value>), FinderError> {
    let (sql, binds) = match query {
        QueryLike::Text(sql) => (sql, Vec::new()),
        QueryLike::Sequence(sequence) => {
            let mut items = sequence.into_iter();
            let sql = match items.next() {
                Some(Value::String(Some(sql))) => sql.to_string(),
                Some(other) => {
                    return Err(FinderError::InvalidArgument(format!(
                        "first element of a raw query sequence must be the query text, got {other:?}"
                    )))
                }
                None => {
                    return Err(FinderError::InvalidArgument(
                        "raw query sequence is empty, expected [text, bind...]".to_string(),
                    ))
                }
            };
            (sql, items.collect())
        }
        QueryLike::Structured(query) => repository.compile_select(&query),
    };

    if sql.trim().is_empty() {
        return Err(FinderError::InvalidArgument("raw query text is empty".to_string()));
    }
    Ok((sql, binds))
}

/// Resolve the requested projection into a non-empty attribute set of `model`
pub fn resolve_properties(
    model: &ModelDescriptor,
    properties: Option<&Properties>,
) -> Result<AttributeSet, FinderError> {
    let declared = model.attributes();
    let fields = match properties {
        None => declared,
        Some(Properties::Name(name)) => declared.select(&[name])?,
        Some(Properties::List(names)) => declared.select(names.as_slice())?,
        Some(Properties::Set(set)) => {
            if !declared.is_superset_of(set) {
                let stray = set
                    .iter()
                    .find(|a| declared.get(a.name()) != Some(*a))
                    .map_or_else(|| set.model().to_string(), |a| a.name().to_string());
                return Err(FinderError::UnknownAttribute {
                    model: model.name().to_string(),
                    attribute: stray,
                });
            }
            set.clone()
        }
    };
    if fields.is_empty() {
        return Err(FinderError::InvalidArgument(format!(
            "raw query for {} projects no attributes",
            model.name()
        )));
    }
    Ok(fields)
}

/// Execute a raw query for `model` and load the resulting records
///
/// # Errors
///
/// Returns `InvalidArgument` for malformed input, `UnknownRepository` when
/// the target repository is not registered, `UnsupportedOperation` when it
/// cannot run literal SQL (no connection is acquired), and store failures
/// unchanged. A failure while reading rows releases the connection first and
/// returns no partial result.
pub fn execute(
    registry: &Registry,
    model: &Arc<ModelDescriptor>,
    query: QueryLike,
    options: RawQueryOptions,
) -> Result<ResultCollection, FinderError> {
    let repository_name = options
        .repository
        .as_deref()
        .unwrap_or(model.default_repository());
    let repository = registry.repository(repository_name)?;
    let spec = RawQuerySpec::resolve(model, repository.as_ref(), query, &options)?;

    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::raw_query_span(model.name(), &spec.repository, &spec.sql).entered();

    ensure_raw_query_support(repository.as_ref())?;
    log::debug!(
        "raw query for {} on `{}`: {} ({} bind value(s))",
        model.name(),
        spec.repository,
        spec.sql,
        spec.binds.len()
    );

    let rows = read_rows(repository.as_ref(), &spec)?;
    let row_count = rows.len();
    let load_query = LoadQuery {
        repository: spec.repository,
        model: Arc::clone(model),
        fields: spec.fields,
        reload: spec.reload,
    };
    let records = registry.loader_for(model.name()).load(&load_query, rows)?;
    if records.len() != row_count {
        return Err(FinderError::ParseError(format!(
            "record loader for {} returned {} record(s) for {row_count} row(s)",
            model.name(),
            records.len()
        )));
    }
    Ok(ResultCollection::new(records))
}

fn read_rows(repository: &dyn Repository, spec: &RawQuerySpec) -> Result<Vec<ResultRow>, FinderError> {
    let mut connection = acquire(repository)?;
    let mut cursor = connection.query(&spec.sql, &spec.binds)?;

    let mut rows = Vec::new();
    while let Some(raw) = cursor.next_row()? {
        // Repeated column names keep the leftmost value
        let mut row = ResultRow::new();
        for (field, value) in raw {
            if spec.fields.contains_field(&field) {
                row.entry(field).or_insert(value);
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockRepository;
    use sea_query::{Alias, Expr, ExprTrait, Query};

    fn users() -> ModelDescriptor {
        ModelDescriptor::builder("User", "users")
            .attribute(Attribute::new("id"))
            .attribute(Attribute::with_field("name", "full_name"))
            .attribute(Attribute::new("email"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_sequence_splits_text_and_binds() {
        let repository = MockRepository::new("default");
        let (sql, binds) = normalize_query(
            QueryLike::from(vec![
                Value::from("SELECT * FROM users WHERE id = $1 AND name = $2"),
                Value::from(1i64),
                Value::from("Ada"),
            ]),
            &repository,
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE id = $1 AND name = $2");
        assert_eq!(binds, vec![Value::from(1i64), Value::from("Ada")]);
    }

    #[test]
    fn test_text_has_no_binds() {
        let repository = MockRepository::new("default");
        let (sql, binds) = normalize_query("SELECT 1".into(), &repository).unwrap();
        assert_eq!(sql, "SELECT 1");
        assert!(binds.is_empty());
    }

    #[test]
    fn test_structured_query_is_compiled_by_repository() {
        let repository = MockRepository::new("default");
        let query = Query::select()
            .column(Alias::new("id"))
            .from(Alias::new("users"))
            .and_where(Expr::col(Alias::new("id")).eq(7))
            .to_owned();
        let (sql, binds) = normalize_query(query.into(), &repository).unwrap();
        assert_eq!(sql, r#"SELECT "id" FROM "users" WHERE "id" = $1"#);
        assert_eq!(binds, vec![Value::Int(Some(7))]);
    }

    #[test]
    fn test_malformed_sequences_are_invalid_arguments() {
        let repository = MockRepository::new("default");
        let empty = normalize_query(QueryLike::Sequence(Vec::new()), &repository);
        assert!(matches!(empty, Err(FinderError::InvalidArgument(_))));

        let not_text = normalize_query(vec![Value::from(1i64)].into(), &repository);
        assert!(matches!(not_text, Err(FinderError::InvalidArgument(_))));

        let blank = normalize_query("   ".into(), &repository);
        assert!(matches!(blank, Err(FinderError::InvalidArgument(_))));
    }

    #[test]
    fn test_json_query_like() {
        let query = QueryLike::try_from(serde_json::json!(["SELECT * FROM users WHERE id = $1", 3]))
            .unwrap();
        match query {
            QueryLike::Sequence(items) => {
                assert_eq!(items[1], Value::BigInt(Some(3)));
            }
            other => panic!("unexpected query shape: {other:?}"),
        }

        let err = QueryLike::try_from(serde_json::json!({"sql": "SELECT 1"})).unwrap_err();
        assert!(matches!(err, FinderError::InvalidArgument(ref msg) if msg.contains("an object")));
        assert!(QueryLike::try_from(serde_json::json!(42)).is_err());
    }

    #[test]
    fn test_properties_default_to_declared_attributes() {
        let set = resolve_properties(&users(), None).unwrap();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_properties_single_name_and_list() {
        let model = users();
        let single = resolve_properties(&model, Some(&Properties::from("id"))).unwrap();
        assert_eq!(single.fields().collect::<Vec<_>>(), vec!["id"]);

        let list = resolve_properties(&model, Some(&Properties::from(vec!["name", "id"]))).unwrap();
        assert_eq!(list.fields().collect::<Vec<_>>(), vec!["full_name", "id"]);
    }

    #[test]
    fn test_empty_projection_is_rejected() {
        let model = users();
        let empty_list = resolve_properties(&model, Some(&Properties::List(Vec::new())));
        assert!(matches!(empty_list, Err(FinderError::InvalidArgument(_))));

        let empty_set = model.attributes().select::<&str>(&[]).unwrap();
        let result = resolve_properties(&model, Some(&Properties::Set(empty_set)));
        assert!(matches!(result, Err(FinderError::InvalidArgument(_))));
    }

    #[test]
    fn test_properties_from_foreign_set_are_rejected() {
        let model = users();
        let other = ModelDescriptor::builder("Post", "posts")
            .attributes(["id", "title"])
            .build()
            .unwrap();
        let result = resolve_properties(&model, Some(&Properties::Set(other.attributes())));
        assert!(matches!(result, Err(FinderError::UnknownAttribute { .. })));
    }

    #[test]
    fn test_options_from_json() {
        let options = RawQueryOptions::from_json(serde_json::json!({
            "repository": "archive",
            "properties": ["id", "email"],
            "reload": true
        }))
        .unwrap();
        assert_eq!(options.repository.as_deref(), Some("archive"));
        assert!(options.reload);
        assert!(matches!(options.properties, Some(Properties::List(ref names)) if names.len() == 2));

        let single = RawQueryOptions::from_json(serde_json::json!({"properties": "id"})).unwrap();
        assert!(matches!(single.properties, Some(Properties::Name(ref n)) if n == "id"));

        let unknown = RawQueryOptions::from_json(serde_json::json!({"reloadd": true}));
        assert!(matches!(unknown, Err(FinderError::InvalidArgument(_))));
    }
}
