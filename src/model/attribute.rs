//! Declared attributes and per-query attribute projections.

use crate::error::FinderError;
use std::sync::Arc;

/// A named field of a model mapped to a storage column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    field: String,
}

impl Attribute {
    /// Attribute whose storage field has the same name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            field: name.clone(),
            name,
        }
    }

    /// Attribute stored under a different column name
    pub fn with_field(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

/// Ordered attributes of a single model.
///
/// A set is created either from every declared attribute of a model or by
/// narrowing with [`AttributeSet::select`]; both paths only ever contain
/// attributes the model declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSet {
    model: String,
    attributes: Vec<Arc<Attribute>>,
}

impl AttributeSet {
    pub(crate) fn new(model: impl Into<String>, attributes: Vec<Arc<Attribute>>) -> Self {
        Self {
            model: model.into(),
            attributes,
        }
    }

    /// Name of the owning model
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().map(|a| a.as_ref())
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.iter().find(|a| a.name() == name)
    }

    /// Attribute mapped to the given storage field
    pub fn by_field(&self, field: &str) -> Option<&Attribute> {
        self.iter().find(|a| a.field() == field)
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.by_field(field).is_some()
    }

    /// Storage fields in attribute order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.iter().map(Attribute::field)
    }

    /// Narrow to the named attributes, in the order given.
    ///
    /// Repeated names are kept once. A name this set does not contain fails
    /// with [`FinderError::UnknownAttribute`].
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<AttributeSet, FinderError> {
        let mut selected: Vec<Arc<Attribute>> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let attribute = self
                .attributes
                .iter()
                .find(|a| a.name() == name)
                .ok_or_else(|| FinderError::UnknownAttribute {
                    model: self.model.clone(),
                    attribute: name.to_string(),
                })?;
            if !selected.iter().any(|a| a.name() == name) {
                selected.push(Arc::clone(attribute));
            }
        }
        Ok(AttributeSet::new(self.model.clone(), selected))
    }

    /// Whether every attribute of `other` also belongs to this set
    pub fn is_superset_of(&self, other: &AttributeSet) -> bool {
        self.model == other.model && other.iter().all(|a| self.iter().any(|b| b == a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_attributes() -> AttributeSet {
        AttributeSet::new(
            "User",
            vec![
                Arc::new(Attribute::new("id")),
                Arc::new(Attribute::with_field("name", "full_name")),
                Arc::new(Attribute::new("email")),
            ],
        )
    }

    #[test]
    fn test_attribute_field_defaults_to_name() {
        let attribute = Attribute::new("email");
        assert_eq!(attribute.name(), "email");
        assert_eq!(attribute.field(), "email");
    }

    #[test]
    fn test_select_preserves_requested_order() {
        let set = user_attributes().select(&["email", "id"]).unwrap();
        let names: Vec<&str> = set.iter().map(Attribute::name).collect();
        assert_eq!(names, vec!["email", "id"]);
        assert_eq!(set.model(), "User");
    }

    #[test]
    fn test_select_collapses_duplicates() {
        let set = user_attributes().select(&["id", "id", "name"]).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_select_rejects_undeclared_attribute() {
        let err = user_attributes().select(&["id", "password"]).unwrap_err();
        match err {
            FinderError::UnknownAttribute { model, attribute } => {
                assert_eq!(model, "User");
                assert_eq!(attribute, "password");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_field_lookup_uses_storage_name() {
        let set = user_attributes();
        assert!(set.contains_field("full_name"));
        assert!(!set.contains_field("name"));
        assert_eq!(set.by_field("full_name").map(Attribute::name), Some("name"));
    }

    #[test]
    fn test_narrowed_set_is_subset() {
        let full = user_attributes();
        let narrowed = full.select(&["name"]).unwrap();
        assert!(full.is_superset_of(&narrowed));
        assert!(!narrowed.is_superset_of(&full));
    }
}
