//! Model descriptors and the per-model handle callers work with.
//!
//! A [`ModelDescriptor`] is the immutable declaration of a model: its backing
//! table, declared attributes and default repository. A [`Model`] binds a
//! descriptor to a [`Registry`](crate::registry::Registry) and exposes the
//! raw query, lookup and dynamic finder operations.

pub mod attribute;
mod handle;

#[doc(inline)]
pub use attribute::{Attribute, AttributeSet};
#[doc(inline)]
pub use handle::Model;

use crate::error::FinderError;
use std::sync::Arc;

/// Immutable declaration of a model bound to a backing table
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    name: String,
    table: String,
    attributes: Vec<Arc<Attribute>>,
    key: String,
    default_repository: String,
}

impl ModelDescriptor {
    /// Start declaring a model stored in `table`
    ///
    /// # Example
    ///
    /// ```
    /// use lifeguard_finders::{Attribute, ModelDescriptor};
    ///
    /// let users = ModelDescriptor::builder("User", "users")
    ///     .attribute(Attribute::new("id"))
    ///     .attribute(Attribute::with_field("name", "full_name"))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(users.key(), "id");
    /// assert_eq!(users.default_repository(), "default");
    /// ```
    pub fn builder(name: impl Into<String>, table: impl Into<String>) -> ModelDescriptorBuilder {
        ModelDescriptorBuilder {
            name: name.into(),
            table: table.into(),
            attributes: Vec::new(),
            key: None,
            default_repository: "default".to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Name of the key attribute used by `lookup(Key)` and ordering
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default_repository(&self) -> &str {
        &self.default_repository
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().map(|a| a.as_ref()).find(|a| a.name() == name)
    }

    /// Look up a declared attribute, failing with `UnknownAttribute`
    pub fn require_attribute(&self, name: &str) -> Result<&Attribute, FinderError> {
        self.attribute(name).ok_or_else(|| FinderError::UnknownAttribute {
            model: self.name.clone(),
            attribute: name.to_string(),
        })
    }

    /// Every declared attribute, in declaration order
    pub fn attributes(&self) -> AttributeSet {
        AttributeSet::new(self.name.clone(), self.attributes.clone())
    }

    /// Storage field of the key attribute
    pub fn key_field(&self) -> &str {
        self.attribute(&self.key).map_or(self.key.as_str(), Attribute::field)
    }
}

pub struct ModelDescriptorBuilder {
    name: String,
    table: String,
    attributes: Vec<Arc<Attribute>>,
    key: Option<String>,
    default_repository: String,
}

impl ModelDescriptorBuilder {
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(Arc::new(attribute));
        self
    }

    /// Declare several attributes whose fields match their names
    pub fn attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .extend(names.into_iter().map(|n| Arc::new(Attribute::new(n))));
        self
    }

    /// Key attribute; defaults to the first declared attribute
    pub fn key(mut self, name: impl Into<String>) -> Self {
        self.key = Some(name.into());
        self
    }

    pub fn default_repository(mut self, name: impl Into<String>) -> Self {
        self.default_repository = name.into();
        self
    }

    /// Finish the declaration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when no attributes are declared or a name is
    /// declared twice, and `UnknownAttribute` when the key is not declared.
    pub fn build(self) -> Result<ModelDescriptor, FinderError> {
        if self.attributes.is_empty() {
            return Err(FinderError::InvalidArgument(format!(
                "model {} declares no attributes",
                self.name
            )));
        }
        for (i, attribute) in self.attributes.iter().enumerate() {
            if self.attributes[..i].iter().any(|a| a.name() == attribute.name()) {
                return Err(FinderError::InvalidArgument(format!(
                    "model {} declares attribute `{}` twice",
                    self.name,
                    attribute.name()
                )));
            }
        }

        let key = match self.key {
            Some(key) => {
                if !self.attributes.iter().any(|a| a.name() == key) {
                    return Err(FinderError::UnknownAttribute {
                        model: self.name,
                        attribute: key,
                    });
                }
                key
            }
            None => self.attributes[0].name().to_string(),
        };

        Ok(ModelDescriptor {
            name: self.name,
            table: self.table,
            attributes: self.attributes,
            key,
            default_repository: self.default_repository,
        })
    }
}
