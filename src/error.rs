use std::path::PathBuf;

use thiserror::Error;

/// modelgen errors
#[derive(Error, Debug)]
pub enum ModelgenError {
    #[error("No schema extractor registered for [{dialect}] connections")]
    UnsupportedDialect { dialect: String },

    #[error("Failed to introspect schema '{schema}': {message}")]
    Introspection { schema: String, message: String },

    #[error("Table '{table}' was not found in schema '{schema}'")]
    UnknownTable { schema: String, table: String },

    #[error("Template file not found: {path}")]
    TemplateNotFound { path: PathBuf },

    #[error("Code generation failed for table '{table}': {message}")]
    Render { table: String, message: String },

    #[error("Failed to connect to database: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}
