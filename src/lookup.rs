//! Generic attribute lookups.
//!
//! [`Lookup`] is the entry point the dynamic finder dispatcher delegates to.
//! The SQL it runs is rendered with `sea_query` from the model declaration and
//! executed through the raw query executor, so lookups share its projection
//! and connection handling.

use crate::error::FinderError;
use crate::model::ModelDescriptor;
use crate::record::{Record, ResultCollection};
use crate::value::is_null;
use sea_query::{Alias, Expr, ExprTrait, InsertStatement, Order, Query, SelectStatement, Value};

/// What to look up by the model's key
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Record whose key attribute equals the value
    Key(Value),
    /// Lowest key
    First,
    /// Highest key
    Last,
    /// Every record, by ascending key
    All,
}

/// Result of a lookup or dynamic finder call
#[derive(Debug, Clone, PartialEq)]
pub enum FinderOutput {
    One(Option<Record>),
    Many(ResultCollection),
}

impl FinderOutput {
    /// The single record, if this is a single-result lookup that matched
    pub fn into_record(self) -> Option<Record> {
        match self {
            FinderOutput::One(record) => record,
            FinderOutput::Many(_) => None,
        }
    }

    /// Every record found; a single result becomes a collection of zero or one
    pub fn into_collection(self) -> ResultCollection {
        match self {
            FinderOutput::One(record) => ResultCollection::new(record.into_iter().collect()),
            FinderOutput::Many(collection) => collection,
        }
    }
}

/// Ordered attribute name -> value pairs matched with equality
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions(Vec<(String, Value)>);

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition; a later condition on the same attribute replaces it
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(attribute, value);
        self
    }

    pub fn push(&mut self, attribute: impl Into<String>, value: impl Into<Value>) {
        let attribute = attribute.into();
        let value = value.into();
        match self.0.iter_mut().find(|(name, _)| *name == attribute) {
            Some(existing) => existing.1 = value,
            None => self.0.push((attribute, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_pairs(self) -> Vec<(String, Value)> {
        self.0
    }
}

impl<S: Into<String>, V: Into<Value>> FromIterator<(S, V)> for Conditions {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        let mut conditions = Conditions::new();
        for (attribute, value) in iter {
            conditions.push(attribute, value);
        }
        conditions
    }
}

/// Single- and multi-result lookups keyed by an attribute/value mapping
pub trait Lookup {
    fn descriptor(&self) -> &ModelDescriptor;

    /// First match by ascending key, or `None`
    fn find_first(&self, conditions: &Conditions) -> Result<Option<Record>, FinderError>;

    /// Every match by ascending key
    fn find_all(&self, conditions: &Conditions) -> Result<ResultCollection, FinderError>;
}

/// Render a select of every declared attribute filtered by `conditions`.
///
/// A null condition value renders as `IS NULL`.
///
/// # Errors
///
/// Returns `UnknownAttribute` for conditions on undeclared attributes.
pub fn select_statement(
    model: &ModelDescriptor,
    conditions: &Conditions,
    order: Option<Order>,
    limit: Option<u64>,
) -> Result<SelectStatement, FinderError> {
    let mut query = Query::select();
    query.from(Alias::new(model.table().to_string()));
    for field in model.attributes().fields() {
        query.column(Alias::new(field.to_string()));
    }
    for (name, value) in conditions.iter() {
        let column = Expr::col(Alias::new(model.require_attribute(name)?.field().to_string()));
        if is_null(value) {
            query.and_where(column.is_null());
        } else {
            query.and_where(column.eq(value.clone()));
        }
    }
    if let Some(order) = order {
        query.order_by(Alias::new(model.key_field().to_string()), order);
    }
    if let Some(limit) = limit {
        query.limit(limit);
    }
    Ok(query)
}

/// Render an insert of the condition values into the model's table
///
/// # Errors
///
/// Returns `UnknownAttribute` for undeclared attributes and `InvalidArgument`
/// when `values` is empty or the statement cannot be built.
pub fn insert_statement(model: &ModelDescriptor, values: &Conditions) -> Result<InsertStatement, FinderError> {
    if values.is_empty() {
        return Err(FinderError::InvalidArgument(format!(
            "cannot insert {} without any attribute values",
            model.name()
        )));
    }
    let mut columns = Vec::with_capacity(values.len());
    for (name, _) in values.iter() {
        columns.push(Alias::new(model.require_attribute(name)?.field().to_string()));
    }

    let mut insert = Query::insert();
    insert
        .into_table(Alias::new(model.table().to_string()))
        .columns(columns);
    insert
        .values(values.iter().map(|(_, value)| value.clone().into()))
        .map_err(|e| FinderError::InvalidArgument(format!("cannot build insert for {}: {e}", model.name())))?;
    Ok(insert)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attribute;
    use sea_query::PostgresQueryBuilder;

    fn users() -> ModelDescriptor {
        ModelDescriptor::builder("User", "users")
            .attribute(Attribute::with_field("id", "user_id"))
            .attribute(Attribute::new("name"))
            .attribute(Attribute::new("email"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_select_projects_declared_fields() {
        let query = select_statement(&users(), &Conditions::new(), None, None).unwrap();
        let (sql, values) = query.build(PostgresQueryBuilder);
        assert_eq!(sql, r#"SELECT "user_id", "name", "email" FROM "users""#);
        assert!(values.0.is_empty());
    }

    #[test]
    fn test_select_conditions_in_order() {
        let conditions = Conditions::new().with("name", "Ada").with("id", 3);
        let query = select_statement(&users(), &conditions, Some(Order::Asc), Some(1)).unwrap();
        let (sql, values) = query.build(PostgresQueryBuilder);
        assert_eq!(
            sql,
            r#"SELECT "user_id", "name", "email" FROM "users" WHERE "name" = $1 AND "user_id" = $2 ORDER BY "user_id" ASC LIMIT $3"#
        );
        assert_eq!(values.0[0], Value::from("Ada"));
        assert_eq!(values.0[1], Value::Int(Some(3)));
    }

    #[test]
    fn test_null_condition_renders_is_null() {
        let conditions = Conditions::new().with("email", Value::String(None));
        let query = select_statement(&users(), &conditions, None, None).unwrap();
        let (sql, values) = query.build(PostgresQueryBuilder);
        assert!(sql.ends_with(r#"WHERE "email" IS NULL"#), "{sql}");
        assert!(values.0.is_empty());
    }

    #[test]
    fn test_condition_on_undeclared_attribute() {
        let conditions = Conditions::new().with("password", "x");
        let result = select_statement(&users(), &conditions, None, None);
        assert!(matches!(result, Err(FinderError::UnknownAttribute { .. })));
    }

    #[test]
    fn test_insert_statement() {
        let values = Conditions::new().with("name", "Ada").with("email", "ada@example.com");
        let insert = insert_statement(&users(), &values).unwrap();
        let (sql, binds) = insert.build(PostgresQueryBuilder);
        assert_eq!(sql, r#"INSERT INTO "users" ("name", "email") VALUES ($1, $2)"#);
        assert_eq!(binds.0.len(), 2);
    }

    #[test]
    fn test_insert_without_values_is_rejected() {
        let result = insert_statement(&users(), &Conditions::new());
        assert!(matches!(result, Err(FinderError::InvalidArgument(_))));
    }

    #[test]
    fn test_conditions_replace_repeated_attribute() {
        let conditions: Conditions = vec![("name", "Ada"), ("name", "Grace")].into_iter().collect();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions.iter().next().map(|(_, v)| v.clone()), Some(Value::from("Grace")));
    }

    #[test]
    fn test_found_conversions() {
        let record = Record::persisted("User", vec![("id".to_string(), Value::from(1i64))]);
        let one = FinderOutput::One(Some(record.clone()));
        assert_eq!(one.clone().into_record(), Some(record));
        assert_eq!(one.into_collection().len(), 1);
        assert!(FinderOutput::One(None).into_collection().is_empty());
    }
}
