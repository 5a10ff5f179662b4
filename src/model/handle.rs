//! Model handle: a descriptor bound to a registry.

use super::ModelDescriptor;
use crate::config::DispatchConfig;
use crate::error::FinderError;
use crate::finder::{ConventionDispatcher, MethodHandler};
use crate::lookup::{insert_statement, select_statement, Conditions, FinderOutput, Lookup, Selector};
use crate::raw_query::{self, QueryLike, RawQueryOptions};
use crate::record::{Record, ResultCollection};
use crate::registry::Registry;
use crate::repository::acquire;
use sea_query::{Order, Value};
use std::sync::Arc;

#[cfg(feature = "tracing")]
use crate::telemetry::tracing_helpers;

/// A registered model together with the registry it resolves repositories,
/// loaders and dispatch through
#[derive(Clone)]
pub struct Model {
    registry: Arc<Registry>,
    descriptor: Arc<ModelDescriptor>,
    dispatcher: Arc<dyn MethodHandler>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Bind the model registered as `name`
    ///
    /// # Errors
    ///
    /// Returns `UnknownModel` if nothing is registered under `name`.
    pub fn new(registry: Arc<Registry>, name: &str) -> Result<Self, FinderError> {
        let descriptor = registry.model(name)?;
        Ok(Self {
            registry,
            descriptor,
            dispatcher: Arc::new(ConventionDispatcher::default()),
        })
    }

    /// Use `config` for dynamic finder argument binding
    pub fn with_dispatch_config(self, config: DispatchConfig) -> Self {
        self.with_dispatcher(ConventionDispatcher::new(config))
    }

    /// Replace the method dispatch chain
    pub fn with_dispatcher(mut self, dispatcher: impl MethodHandler + 'static) -> Self {
        self.dispatcher = Arc::new(dispatcher);
        self
    }

    pub fn descriptor(&self) -> &Arc<ModelDescriptor> {
        &self.descriptor
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Run a literal query and load its rows as records of this model.
    ///
    /// See [`raw_query::execute`] for the accepted shapes and failure modes.
    pub fn raw_query(
        &self,
        query: impl Into<QueryLike>,
        options: RawQueryOptions,
    ) -> Result<ResultCollection, FinderError> {
        raw_query::execute(&self.registry, &self.descriptor, query.into(), options)
    }

    /// Look up by key, or take the first, last or every record by key order
    pub fn lookup(&self, selector: Selector) -> Result<FinderOutput, FinderError> {
        match selector {
            Selector::Key(value) => {
                let conditions = Conditions::new().with(self.descriptor.key(), value);
                self.first_ordered(&conditions, Order::Asc).map(FinderOutput::One)
            }
            Selector::First => self.first_ordered(&Conditions::new(), Order::Asc).map(FinderOutput::One),
            Selector::Last => self.first_ordered(&Conditions::new(), Order::Desc).map(FinderOutput::One),
            Selector::All => self.find_all(&Conditions::new()).map(FinderOutput::Many),
        }
    }

    /// Call a method that is not declared on the model, such as a dynamic
    /// finder
    ///
    /// # Errors
    ///
    /// Returns `UnknownMethod` when no handler in the chain accepts the name.
    pub fn call(&self, method: &str, args: Vec<Value>) -> Result<FinderOutput, FinderError> {
        self.dispatcher.handle(self, method, args)
    }

    /// First record matching `conditions`, or an unsaved record carrying them
    pub fn find_or_initialize(&self, conditions: &Conditions) -> Result<Record, FinderError> {
        if let Some(record) = self.find_first(conditions)? {
            return Ok(record);
        }
        Ok(Record::initialized(
            self.descriptor.name(),
            conditions.clone().into_pairs(),
        ))
    }

    /// First record matching `conditions`, inserting one when none exists
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for empty `conditions` without touching the
    /// store.
    pub fn find_or_create(&self, conditions: &Conditions) -> Result<Record, FinderError> {
        if conditions.is_empty() {
            return Err(FinderError::InvalidArgument(format!(
                "find_or_create on {} needs at least one attribute value",
                self.descriptor.name()
            )));
        }
        if let Some(record) = self.find_first(conditions)? {
            return Ok(record);
        }

        let insert = insert_statement(&self.descriptor, conditions)?;
        let repository = self.registry.repository(self.descriptor.default_repository())?;
        let (sql, binds) = repository.compile_insert(&insert);

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_statement_span(&sql).entered();

        let mut connection = acquire(repository.as_ref())?;
        let affected = connection.execute(&sql, &binds)?;
        log::debug!(
            "created {} on `{}` ({affected} row(s))",
            self.descriptor.name(),
            connection.repository()
        );
        Ok(Record::persisted(
            self.descriptor.name(),
            conditions.clone().into_pairs(),
        ))
    }

    fn first_ordered(&self, conditions: &Conditions, order: Order) -> Result<Option<Record>, FinderError> {
        let query = select_statement(&self.descriptor, conditions, Some(order), Some(1))?;
        let records = self.raw_query(query, RawQueryOptions::default())?;
        Ok(records.into_records().into_iter().next())
    }
}

impl Lookup for Model {
    fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    fn find_first(&self, conditions: &Conditions) -> Result<Option<Record>, FinderError> {
        self.first_ordered(conditions, Order::Asc)
    }

    fn find_all(&self, conditions: &Conditions) -> Result<ResultCollection, FinderError> {
        let query = select_statement(&self.descriptor, conditions, Some(Order::Asc), None)?;
        self.raw_query(query, RawQueryOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attribute;
    use crate::repository::{MockRepository, MockResultSet};

    fn setup(repository: MockRepository) -> (Model, Arc<MockRepository>) {
        let repository = Arc::new(repository);
        let mut registry = Registry::new();
        registry.register_model(
            ModelDescriptor::builder("User", "users")
                .attribute(Attribute::new("id"))
                .attribute(Attribute::with_field("name", "full_name"))
                .build()
                .unwrap(),
        );
        registry.register_repository(repository.clone());
        (Model::new(Arc::new(registry), "User").unwrap(), repository)
    }

    fn ada() -> MockResultSet {
        MockResultSet::new(["id", "full_name"]).row([Value::from(1i64), Value::from("Ada")])
    }

    #[test]
    fn test_unknown_model() {
        let err = Model::new(Arc::new(Registry::new()), "Ghost").unwrap_err();
        assert!(matches!(err, FinderError::UnknownModel(_)));
    }

    #[test]
    fn test_lookup_by_key() {
        let (users, repository) = setup(MockRepository::new("default").append_query_result(ada()));
        let record = users.lookup(Selector::Key(Value::from(1i64))).unwrap().into_record().unwrap();
        assert_eq!(record.get("name"), Some(&Value::from("Ada")));

        let statements = repository.statements();
        assert_eq!(
            statements[0].sql,
            r#"SELECT "id", "full_name" FROM "users" WHERE "id" = $1 ORDER BY "id" ASC LIMIT $2"#
        );
        assert_eq!(statements[0].params[0], Value::from(1i64));
    }

    #[test]
    fn test_lookup_last_orders_descending() {
        let (users, repository) = setup(MockRepository::new("default"));
        let found = users.lookup(Selector::Last).unwrap();
        assert_eq!(found, FinderOutput::One(None));
        assert!(repository.statements()[0].sql.ends_with(r#"ORDER BY "id" DESC LIMIT $1"#));
    }

    #[test]
    fn test_lookup_all() {
        let (users, repository) = setup(MockRepository::new("default").append_query_result(
            ada().row([Value::from(2i64), Value::from("Grace")]),
        ));
        let all = users.lookup(Selector::All).unwrap().into_collection();
        assert_eq!(all.len(), 2);
        assert_eq!(
            repository.statements()[0].sql,
            r#"SELECT "id", "full_name" FROM "users" ORDER BY "id" ASC"#
        );
    }

    #[test]
    fn test_call_dispatches_dynamic_finder() {
        let (users, repository) = setup(MockRepository::new("default").append_query_result(ada()));
        let found = users.call("find_by_name", vec![Value::from("Ada")]).unwrap();
        assert!(found.into_record().is_some());
        assert!(repository.statements()[0].sql.contains(r#"WHERE "full_name" = $1"#));
    }

    #[test]
    fn test_find_or_initialize() {
        let (users, _) = setup(MockRepository::new("default").append_query_result(ada()));
        let conditions = Conditions::new().with("name", "Ada");

        let existing = users.find_or_initialize(&conditions).unwrap();
        assert!(existing.is_persisted());
        assert_eq!(existing.get("id"), Some(&Value::from(1i64)));

        let fresh = users.find_or_initialize(&conditions).unwrap();
        assert!(!fresh.is_persisted());
        assert_eq!(fresh.get("name"), Some(&Value::from("Ada")));
    }

    #[test]
    fn test_find_or_create_inserts_when_missing() {
        let (users, repository) = setup(MockRepository::new("default"));
        let record = users
            .find_or_create(&Conditions::new().with("name", "Grace"))
            .unwrap();
        assert!(record.is_persisted());

        let statements = repository.statements();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1].sql, r#"INSERT INTO "users" ("full_name") VALUES ($1)"#);
        assert_eq!(repository.acquired(), repository.released());
    }

    #[test]
    fn test_find_or_create_requires_conditions() {
        let (users, repository) = setup(MockRepository::new("default"));
        let err = users.find_or_create(&Conditions::new()).unwrap_err();
        assert!(matches!(err, FinderError::InvalidArgument(_)));
        assert_eq!(repository.acquired(), 0);
        assert!(repository.statements().is_empty());
    }
}
