//! Schema manager and dialect registry
//!
//! The manager binds to one connection, dispatches to the registered
//! extractor for the connection's dialect, and caches every introspected
//! schema by name for its own lifetime. The registry is process-wide so new
//! database engines can be plugged in without touching the manager.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::{LazyLock, RwLock};

use tracing::{debug, info, trace};

use crate::error::ModelgenError;
use crate::meta::fixture::FixtureCatalog;
use crate::meta::{Blueprint, Reference, Schema};

/// Database engine tag used for extractor dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
    /// In-memory catalog, used by tests and offline runs
    Fixture,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::Fixture => "fixture",
        };
        f.write_str(name)
    }
}

/// Engine-specific state behind a connection
pub enum Backend {
    #[cfg(feature = "postgres")]
    Postgres(RefCell<postgres::Client>),
    Fixture(FixtureCatalog),
}

/// Opaque handle to one database
pub struct Connection {
    name: String,
    dialect: Dialect,
    backend: Backend,
}

impl Connection {
    pub fn new(name: impl Into<String>, dialect: Dialect, backend: Backend) -> Self {
        Self {
            name: name.into(),
            dialect,
            backend,
        }
    }

    #[cfg(feature = "postgres")]
    pub fn postgres(name: impl Into<String>, client: postgres::Client) -> Self {
        Self::new(name, Dialect::Postgres, Backend::Postgres(RefCell::new(client)))
    }

    pub fn fixture(name: impl Into<String>, catalog: FixtureCatalog) -> Self {
        Self::new(name, Dialect::Fixture, Backend::Fixture(catalog))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    #[cfg(feature = "postgres")]
    pub fn postgres_client(&self) -> Option<&RefCell<postgres::Client>> {
        match &self.backend {
            Backend::Postgres(client) => Some(client),
            _ => None,
        }
    }

    pub fn fixture_catalog(&self) -> Option<&FixtureCatalog> {
        match &self.backend {
            Backend::Fixture(catalog) => Some(catalog),
            #[cfg(feature = "postgres")]
            _ => None,
        }
    }
}

/// Trait for dialect-specific metadata extraction
pub trait SchemaExtractor {
    /// Enumerate every schema name visible on the connection
    fn schema_names(&self, connection: &Connection) -> Result<Vec<String>, ModelgenError>;

    /// Introspect one schema into structured metadata
    fn extract(&self, connection: &Connection, schema: &str) -> Result<Schema, ModelgenError>;
}

pub type ExtractorFactory = Box<dyn Fn() -> Box<dyn SchemaExtractor> + Send + Sync>;

static DIALECTS: LazyLock<RwLock<HashMap<Dialect, ExtractorFactory>>> = LazyLock::new(|| {
    #[allow(unused_mut)]
    let mut registry: HashMap<Dialect, ExtractorFactory> = HashMap::new();

    #[cfg(feature = "postgres")]
    registry.insert(
        Dialect::Postgres,
        Box::new(|| Box::new(crate::meta::postgres::PostgresExtractor)),
    );

    RwLock::new(registry)
});

/// Register an extractor factory for a dialect
///
/// Safe to call before any manager is constructed. Registering the same
/// dialect twice overwrites the previous factory; last registration wins.
pub fn register_dialect(dialect: Dialect, factory: ExtractorFactory) {
    debug!(dialect = %dialect, "Registering dialect extractor");
    DIALECTS
        .write()
        .expect("dialect registry poisoned")
        .insert(dialect, factory);
}

fn make_extractor(dialect: Dialect) -> Option<Box<dyn SchemaExtractor>> {
    DIALECTS
        .read()
        .expect("dialect registry poisoned")
        .get(&dialect)
        .map(|factory| factory())
}

/// Caches introspected schemas for one connection
pub struct SchemaManager<'c> {
    connection: &'c Connection,
    extractor: Box<dyn SchemaExtractor>,
    schemas: RefCell<HashMap<String, Rc<Schema>>>,
    names: RefCell<Option<Vec<String>>>,
}

impl std::fmt::Debug for SchemaManager<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaManager")
            .field("connection", &self.connection.name)
            .field("schemas", &self.schemas)
            .field("names", &self.names)
            .finish()
    }
}

impl<'c> SchemaManager<'c> {
    /// Bind to a connection
    ///
    /// Fails before any introspection query when no extractor is registered
    /// for the connection's dialect.
    pub fn for_connection(connection: &'c Connection) -> Result<Self, ModelgenError> {
        let extractor = make_extractor(connection.dialect()).ok_or_else(|| {
            ModelgenError::UnsupportedDialect {
                dialect: connection.dialect().to_string(),
            }
        })?;

        Ok(Self {
            connection,
            extractor,
            schemas: RefCell::new(HashMap::new()),
            names: RefCell::new(None),
        })
    }

    pub fn connection(&self) -> &Connection {
        self.connection
    }

    /// Return the cached schema, introspecting it on first request
    ///
    /// Repeated calls with the same name return the same instance.
    pub fn schema(&self, name: &str) -> Result<Rc<Schema>, ModelgenError> {
        if let Some(schema) = self.schemas.borrow().get(name) {
            trace!(schema = ?name, "Schema cache hit");
            return Ok(Rc::clone(schema));
        }

        info!(schema = ?name, connection = ?self.connection.name(), "Introspecting schema");
        let schema = Rc::new(self.extractor.extract(self.connection, name)?);
        self.schemas
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&schema));
        Ok(schema)
    }

    /// Enumerate every schema name on the connection, memoized
    pub fn schema_names(&self) -> Result<Vec<String>, ModelgenError> {
        if let Some(names) = self.names.borrow().as_ref() {
            return Ok(names.clone());
        }

        let names = self.extractor.schema_names(self.connection)?;
        debug!(count = names.len(), "Enumerated schemas");
        *self.names.borrow_mut() = Some(names.clone());
        Ok(names)
    }

    /// Every reference on the connection that targets the given blueprint
    ///
    /// Scans all schemas in enumeration order, tables and references in
    /// declaration order. Schemas are materialized through the cache.
    pub fn referencing(
        &self,
        blueprint: &Blueprint,
    ) -> Result<Vec<(Blueprint, Reference)>, ModelgenError> {
        let mut found = Vec::new();

        for name in self.schema_names()? {
            let schema = self.schema(&name)?;
            for table in &schema.tables {
                for reference in &table.references {
                    if reference.targets(&blueprint.schema, &blueprint.table) {
                        found.push((table.clone(), reference.clone()));
                    }
                }
            }
        }

        trace!(
            table = ?blueprint.table,
            count = found.len(),
            "Collected incoming references"
        );
        Ok(found)
    }
}
