//! Schema metadata
//!
//! These types describe one database's structure and form the contract
//! between introspection (produces) and model building (consumes). They are
//! passive data, immutable once an extractor has populated them.

use heck::ToUpperCamelCase;

pub mod fixture;
mod manager;
#[cfg(feature = "postgres")]
mod postgres;

pub use fixture::{FixtureCatalog, FixtureExtractor};
pub use manager::{
    register_dialect, Backend, Connection, Dialect, ExtractorFactory, SchemaExtractor,
    SchemaManager,
};
#[cfg(feature = "postgres")]
pub use postgres::PostgresExtractor;

/// All metadata discovered for one named schema on one connection
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: String,
    pub connection: String,
    pub tables: Vec<Blueprint>,
}

impl Schema {
    pub fn table(&self, name: &str) -> Option<&Blueprint> {
        self.tables.iter().find(|t| t.table == name)
    }
}

/// Structural metadata for one table: columns plus outgoing foreign keys
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    pub schema: String,
    pub table: String,
    pub columns: Vec<Column>,
    /// Column names that form the primary key (in order)
    pub primary_key: Vec<String>,
    /// Column sets covered by a unique constraint
    pub uniques: Vec<Vec<String>>,
    /// Outgoing foreign keys, in declaration order
    pub references: Vec<Reference>,
}

impl Blueprint {
    /// Returns PascalCase singular class name from the table name
    pub fn class_name(&self) -> String {
        singularize(&self.table).to_upper_camel_case()
    }

    /// Returns the singular, convention-derived record name
    pub fn record_name(&self) -> String {
        singularize(&self.table)
    }

    pub fn is(&self, schema: &str, table: &str) -> bool {
        self.schema == schema && self.table == table
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Whether the column set is covered by the primary key or a unique
    /// constraint. Order-insensitive.
    pub fn is_unique_key(&self, columns: &[String]) -> bool {
        let same = |constraint: &[String]| {
            constraint.len() == columns.len() && columns.iter().all(|c| constraint.contains(c))
        };

        (!self.primary_key.is_empty() && same(&self.primary_key))
            || self.uniques.iter().any(|u| same(u))
    }

    /// Check if any primary key column is auto-generated
    pub fn has_auto_increment(&self) -> bool {
        self.primary_key.iter().any(|pk_name| {
            self.column(pk_name)
                .map(|col| col.is_auto_generated)
                .unwrap_or(false)
        })
    }
}

/// A table column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub is_nullable: bool,
    /// Column has a server-side default (DEFAULT value, NOW(), etc.)
    pub has_default: bool,
    /// Column is auto-generated (SERIAL, BIGSERIAL, IDENTITY)
    pub is_auto_generated: bool,
    /// Column is part of the primary key
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    SmallInt,
    Integer,
    BigInt,
    Boolean,
    Text,
    Varchar(Option<u32>),
    Char(Option<u32>),
    Real,
    DoublePrecision,
    Numeric,
    Timestamp,
    TimestampTz,
    Date,
    Time,
    TimeTz,
    Uuid,
    Json,
    JsonBinary,
    Binary,
    Array(Box<DataType>),
    /// Custom database type, stores the type name
    Enum(String),
}

/// One outgoing foreign-key constraint
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    /// Source columns, in constraint order
    pub columns: Vec<String>,
    /// Target (schema, table)
    pub on: (String, String),
    /// Target columns, aligned with `columns`
    pub references: Vec<String>,
}

impl Reference {
    pub fn targets(&self, schema: &str, table: &str) -> bool {
        self.on.0 == schema && self.on.1 == table
    }
}

/// Returns singular form of a snake_case name (basic heuristic)
pub fn singularize(name: &str) -> String {
    if name.ends_with("ies") {
        format!("{}y", &name[..name.len() - 3])
    } else if name.ends_with('s') && !name.ends_with("ss") {
        name[..name.len() - 1].to_string()
    } else {
        name.to_string()
    }
}

/// Returns plural form of a snake_case name (basic heuristic)
pub fn pluralize(name: &str) -> String {
    if name.ends_with('y') {
        format!("{}ies", &name[..name.len() - 1])
    } else if name.ends_with('s') {
        name.to_string()
    } else {
        format!("{}s", name)
    }
}
