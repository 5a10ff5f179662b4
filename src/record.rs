//! Records, result collections and the record-loading routine.
//!
//! A [`RecordLoader`] receives the rows accepted by a query (already filtered
//! to the projected fields) together with the [`LoadQuery`] describing where
//! they came from, and produces one [`Record`] per row.

use crate::error::FinderError;
use crate::model::{AttributeSet, ModelDescriptor};
use crate::value::TryGetable;
use sea_query::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Storage field -> raw value for one accepted row
pub type ResultRow = BTreeMap<String, Value>;

/// Query descriptor handed to the record loader
#[derive(Debug, Clone)]
pub struct LoadQuery {
    pub repository: String,
    pub model: Arc<ModelDescriptor>,
    pub fields: AttributeSet,
    pub reload: bool,
}

/// A model instance populated from stored field values
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    model: String,
    values: Vec<(String, Value)>,
    persisted: bool,
    reloaded: bool,
}

impl Record {
    /// A record that exists in the store
    pub fn persisted(model: impl Into<String>, values: Vec<(String, Value)>) -> Self {
        Self {
            model: model.into(),
            values,
            persisted: true,
            reloaded: false,
        }
    }

    /// A record built in memory and not yet saved
    pub fn initialized(model: impl Into<String>, values: Vec<(String, Value)>) -> Self {
        Self {
            model: model.into(),
            values,
            persisted: false,
            reloaded: false,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Whether the loading query asked for already-loaded state to be refreshed
    pub fn is_reloaded(&self) -> bool {
        self.reloaded
    }

    /// Raw value of an attribute, `None` when the attribute was not loaded
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, value)| value)
    }

    /// Typed value of an attribute
    ///
    /// # Errors
    ///
    /// Returns `UnknownAttribute` if the attribute was not loaded and
    /// `ParseError` if the stored value does not convert to `T`.
    pub fn try_get<T: TryGetable>(&self, attribute: &str) -> Result<T, FinderError> {
        let value = self.get(attribute).ok_or_else(|| FinderError::UnknownAttribute {
            model: self.model.clone(),
            attribute: attribute.to_string(),
        })?;
        T::try_get(value).map_err(|e| FinderError::ParseError(format!("{}.{attribute}: {e}", self.model)))
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.get(attribute).is_some()
    }

    /// Names of the loaded attributes, in projection order
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> &[(String, Value)] {
        &self.values
    }
}

/// Conversion of a loaded record into a typed shape
///
/// ```rust
/// use lifeguard_finders::{FinderError, FromRecord, Record};
///
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl FromRecord for User {
///     fn from_record(record: &Record) -> Result<Self, FinderError> {
///         Ok(User {
///             id: record.try_get("id")?,
///             name: record.try_get("name")?,
///         })
///     }
/// }
/// ```
pub trait FromRecord: Sized {
    fn from_record(record: &Record) -> Result<Self, FinderError>;
}

/// Ordered records returned by a query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultCollection {
    records: Vec<Record>,
}

impl ResultCollection {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Convert every record, in order
    ///
    /// # Errors
    ///
    /// Returns the first conversion error.
    pub fn to_typed<T: FromRecord>(&self) -> Result<Vec<T>, FinderError> {
        self.records.iter().map(T::from_record).collect()
    }
}

impl IntoIterator for ResultCollection {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultCollection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Record-loading routine bound to a query descriptor
pub trait RecordLoader {
    /// Produce exactly one record per row, in row order
    ///
    /// # Errors
    ///
    /// Implementations return `ParseError` for rows they cannot hydrate.
    fn load(&self, query: &LoadQuery, rows: Vec<ResultRow>) -> Result<Vec<Record>, FinderError>;
}

/// Loader mapping storage fields back to attribute names.
///
/// Attributes whose field is absent from a row are left unloaded rather than
/// set to `NULL`, so a record only exposes what the query returned.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRecordLoader;

impl RecordLoader for DefaultRecordLoader {
    fn load(&self, query: &LoadQuery, rows: Vec<ResultRow>) -> Result<Vec<Record>, FinderError> {
        let records = rows
            .into_iter()
            .map(|mut row| {
                let values = query
                    .fields
                    .iter()
                    .filter_map(|attribute| {
                        row.remove(attribute.field())
                            .map(|value| (attribute.name().to_string(), value))
                    })
                    .collect();
                Record {
                    model: query.model.name().to_string(),
                    values,
                    persisted: true,
                    reloaded: query.reload,
                }
            })
            .collect();
        Ok(records)
    }
}
