//! Fixture dialect
//!
//! An in-memory schema catalog standing in for a live database. Tests and
//! offline runs build a [`FixtureCatalog`], wrap it in a connection, and
//! register [`FixtureExtractor`] for the fixture dialect. The catalog counts
//! extractor calls so caching behavior can be asserted.

use std::cell::Cell;
use std::rc::Rc;

use tracing::trace;

use crate::error::ModelgenError;
use crate::meta::manager::{register_dialect, Connection, Dialect, SchemaExtractor};
use crate::meta::Schema;

/// In-memory collection of schemas
#[derive(Debug, Clone, Default)]
pub struct FixtureCatalog {
    schemas: Vec<Schema>,
    extractions: Rc<Cell<usize>>,
    enumerations: Rc<Cell<usize>>,
}

impl FixtureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// How many times a schema has been extracted through this catalog
    pub fn extraction_count(&self) -> usize {
        self.extractions.get()
    }

    /// How many times schema names have been enumerated
    pub fn enumeration_count(&self) -> usize {
        self.enumerations.get()
    }
}

/// Extractor over a connection's fixture catalog
pub struct FixtureExtractor;

/// Register the fixture extractor for the fixture dialect
pub fn register() {
    register_dialect(Dialect::Fixture, Box::new(|| Box::new(FixtureExtractor)));
}

impl FixtureExtractor {
    fn catalog<'c>(&self, connection: &'c Connection) -> Result<&'c FixtureCatalog, ModelgenError> {
        connection
            .fixture_catalog()
            .ok_or_else(|| ModelgenError::Connection(
                "Fixture extractor requires a fixture-backed connection".to_string(),
            ))
    }
}

impl SchemaExtractor for FixtureExtractor {
    fn schema_names(&self, connection: &Connection) -> Result<Vec<String>, ModelgenError> {
        let catalog = self.catalog(connection)?;
        catalog.enumerations.set(catalog.enumerations.get() + 1);
        Ok(catalog.schemas.iter().map(|s| s.name.clone()).collect())
    }

    fn extract(&self, connection: &Connection, schema: &str) -> Result<Schema, ModelgenError> {
        let catalog = self.catalog(connection)?;
        catalog.extractions.set(catalog.extractions.get() + 1);
        trace!(schema = ?schema, "Extracting fixture schema");

        catalog
            .schemas
            .iter()
            .find(|s| s.name == schema)
            .cloned()
            .ok_or_else(|| ModelgenError::Introspection {
                schema: schema.to_string(),
                message: "Schema is not present in the fixture catalog".to_string(),
            })
    }
}
