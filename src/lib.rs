//! # Lifeguard Finders
//!
//! Raw SQL escape hatch and convention-based dynamic finders for
//! lifeguard-style PostgreSQL models.
//!
//! A [`Model`] binds a [`ModelDescriptor`] to a [`Registry`] of repositories
//! and record loaders, and exposes:
//!
//! - [`Model::raw_query`]: run literal SQL and load the rows as records,
//!   keeping only columns that map to declared attributes
//! - [`Model::call`]: dispatch `find_by_*` / `find_all_by_*` method names to
//!   attribute lookups
//! - [`Model::lookup`], [`Model::find_or_initialize`], [`Model::find_or_create`]
//!
//! ```rust
//! use lifeguard_finders::{Model, ModelDescriptor, Registry};
//! use lifeguard_finders::repository::{MockRepository, MockResultSet};
//! use sea_query::Value;
//! use std::sync::Arc;
//!
//! let mut registry = Registry::new();
//! registry.register_model(
//!     ModelDescriptor::builder("User", "users")
//!         .attributes(["id", "name", "email"])
//!         .build()?,
//! );
//! registry.register_repository(Arc::new(MockRepository::new("default").append_query_result(
//!     MockResultSet::new(["id", "name", "email"])
//!         .row([Value::from(1i64), Value::from("Ada"), Value::from("ada@example.com")]),
//! )));
//!
//! let users = Model::new(Arc::new(registry), "User")?;
//! let ada = users
//!     .call("find_by_name_and_email", vec![Value::from("Ada"), Value::from("ada@example.com")])?
//!     .into_record();
//! assert!(ada.is_some());
//! # Ok::<(), lifeguard_finders::FinderError>(())
//! ```

pub mod config;
pub mod error;
pub mod finder;
pub mod lookup;
pub mod model;
pub mod raw_query;
pub mod record;
pub mod registry;
pub mod repository;
pub mod telemetry;
pub mod value;

pub use config::{DatabaseConfig, DispatchConfig, FinderConfig};
pub use error::{FinderError, StoreError};
pub use finder::{ConventionDispatcher, MethodHandler, UnknownMethodHandler};
pub use lookup::{Conditions, FinderOutput, Lookup, Selector};
pub use model::{Attribute, AttributeSet, Model, ModelDescriptor};
pub use raw_query::{Properties, QueryLike, RawQueryOptions};
pub use record::{FromRecord, Record, RecordLoader, ResultCollection};
pub use registry::Registry;
pub use value::{TryGetable, ValueExtractionError};
