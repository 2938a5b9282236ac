//! # modelgen
//!
//! Generate active-record model classes from relational database schemas.
//!
//! This crate provides a CLI tool and library for introspecting database
//! metadata and generating one Python model class per table, including
//! relations inferred from the foreign-key graph.

pub mod codegen;
pub mod config;
pub mod error;
pub mod meta;
pub mod model;
pub mod storage;

pub mod prelude {
    pub use crate::codegen::imports::{import_block, CodeFragment, QualifiedName};
    pub use crate::codegen::Factory;
    pub use crate::config::{DbConfig, GeneratorConfig, Scope};
    pub use crate::error::ModelgenError;
    pub use crate::meta::{
        register_dialect, Blueprint, Column, Connection, DataType, Dialect, FixtureCatalog,
        Reference, Schema, SchemaExtractor, SchemaManager,
    };
    pub use crate::model::relations::Relation;
    pub use crate::model::{Model, ModelBuilder, Mutation, Mutator};
    pub use crate::storage::{FsStorage, MemoryStorage, Storage};
}

pub use meta::register_dialect;

#[cfg(feature = "postgres")]
pub use meta::PostgresExtractor;

use crate::codegen::Factory;
use crate::config::GeneratorConfig;
use crate::error::ModelgenError;
use crate::meta::Connection;
use crate::storage::Storage;

/// Generate the model for one table
pub fn generate_table(
    connection: &Connection,
    config: &GeneratorConfig,
    storage: &dyn Storage,
    schema: &str,
    table: &str,
) -> Result<(), ModelgenError> {
    Factory::on(connection, config, storage)?.create(schema, table)
}

/// Generate every eligible table of one schema
pub fn generate_schema(
    connection: &Connection,
    config: &GeneratorConfig,
    storage: &dyn Storage,
    schema: &str,
) -> Result<(), ModelgenError> {
    Factory::on(connection, config, storage)?.map(schema)
}

/// Generate every schema visible on the connection
pub fn generate_all_schemas(
    connection: &Connection,
    config: &GeneratorConfig,
    storage: &dyn Storage,
) -> Result<(), ModelgenError> {
    Factory::on(connection, config, storage)?.map_all()
}
