//! Configuration loading
//!
//! Two layers live here. [`DbConfig`] carries connection credentials loaded
//! from environment variables (optionally reading a .env file first).
//! [`GeneratorConfig`] carries generation options loaded from a TOML file,
//! scoped per connection, schema, and table; lookups walk the
//! table -> schema -> connection -> global fallback chain.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{env, fs};

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, error, trace, warn};

use crate::error::ModelgenError;

/// Database connection configuration
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl DbConfig {
    /// Load configuration from environment variables
    ///
    /// Expected variables:
    /// - DB_HOST (default: localhost)
    /// - DB_PORT (default: 5432)
    /// - DB_NAME (required)
    /// - DB_USER (required)
    /// - DB_PASSWORD (required)
    pub fn from_env() -> Result<Self, ModelgenError> {
        debug!("Loading database configuration from environment");

        let host = env::var("DB_HOST").unwrap_or_else(|_| {
            trace!("DB_HOST not set, using default");
            "localhost".to_string()
        });

        let port_str = env::var("DB_PORT").unwrap_or_else(|_| {
            trace!("DB_PORT not set, using default");
            "5432".to_string()
        });

        let port = port_str.parse::<u16>().map_err(|e| {
            error!(port = ?port_str, error = ?e, "Invalid DB_PORT value");
            ModelgenError::Config("DB_PORT must be a valid port number".to_string())
        })?;

        let database = env::var("DB_NAME").map_err(|_| {
            error!("DB_NAME environment variable is not set");
            ModelgenError::Config("DB_NAME environment variable is required".to_string())
        })?;

        let user = env::var("DB_USER").map_err(|_| {
            error!("DB_USER environment variable is not set");
            ModelgenError::Config("DB_USER environment variable is required".to_string())
        })?;

        let password = env::var("DB_PASSWORD").map_err(|_| {
            error!("DB_PASSWORD environment variable is not set");
            ModelgenError::Config("DB_PASSWORD environment variable is required".to_string())
        })?;

        debug!(host = ?host, port = ?port, database = ?database, user = ?user, "Configuration loaded");

        Ok(Self {
            host,
            port,
            database,
            user,
            password,
        })
    }

    /// Load a .env file and then read configuration from environment
    pub fn load(env_file: &Path) -> Result<Self, ModelgenError> {
        if env_file.exists() {
            debug!(path = ?env_file, "Loading environment file");
            dotenvy::from_path(env_file).map_err(|e| {
                error!(path = ?env_file, error = ?e, "Failed to load environment file");
                ModelgenError::Config(format!("Failed to load {}: {}", env_file.display(), e))
            })?;
        } else {
            warn!(path = ?env_file, "Environment file not found, using existing environment");
        }

        Self::from_env()
    }

    /// Build a PostgreSQL connection string
    pub fn postgres_connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.database, self.user, self.password
        )
    }

    /// Build a connection string with password redacted (for error messages)
    pub fn redacted_connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password=***",
            self.host, self.port, self.database, self.user
        )
    }
}

/// Template path overrides
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TemplateOptions {
    pub model: Option<PathBuf>,
    pub user_model: Option<PathBuf>,
}

/// Options recognized at every configuration scope
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScopeOptions {
    /// Output root for generated files
    pub path: Option<PathBuf>,
    /// Base dotted namespace of the generated package
    pub namespace: Option<String>,
    /// Qualified parent class of generated models
    pub parent: Option<String>,
    /// Nest output under a connection-derived folder
    pub path_connection: Option<bool>,
    /// Nest under a schema-derived namespace segment
    pub namespace_schema: Option<bool>,
    /// Allow-list of table name patterns (`*` wildcard)
    pub only: Option<Vec<String>>,
    /// Deny-list of table name patterns
    pub except: Option<Vec<String>>,
    pub timestamps: Option<bool>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    /// Primary key override
    pub primary_key: Option<String>,
    pub per_page: Option<u32>,
    /// Column-name pattern -> cast
    pub casts: Option<BTreeMap<String, String>>,
    /// Column-name patterns hidden from serialization
    pub hidden: Option<Vec<String>>,
    /// Column-name patterns allowed for mass assignment
    pub fillable: Option<Vec<String>>,
    /// Split generation into an always-rewritten base file and a
    /// write-once user file
    pub base_files: Option<bool>,
    /// Emit one NAME constant per property
    pub property_constants: Option<bool>,
    /// Expand every literal tab in rendered output to this many spaces
    pub indent_spaces: Option<u8>,
    /// Emit the connection name in the class body
    pub show_connection: Option<bool>,
    /// Table name override (table scope)
    pub table: Option<String>,
    pub template: Option<TemplateOptions>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchemaScope {
    #[serde(flatten)]
    pub options: ScopeOptions,
    pub tables: BTreeMap<String, ScopeOptions>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConnectionScope {
    #[serde(flatten)]
    pub options: ScopeOptions,
    pub schemas: BTreeMap<String, SchemaScope>,
}

/// Identifies the table a lookup is resolved for
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub connection: &'a str,
    pub schema: &'a str,
    pub table: &'a str,
}

/// Generation options, scoped per connection/schema/table
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub generator: ScopeOptions,
    pub connections: BTreeMap<String, ConnectionScope>,
}

impl GeneratorConfig {
    /// Load generation options from a TOML file
    ///
    /// A missing file yields the defaults, matching how the .env loader
    /// treats an absent environment file.
    pub fn load(path: &Path) -> Result<Self, ModelgenError> {
        if !path.exists() {
            warn!(path = ?path, "Generator config not found, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading generator config");
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| {
            error!(path = ?path, error = %e, "Failed to parse generator config");
            ModelgenError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Resolve one option through the table -> schema -> connection -> global
    /// fallback chain. The first scope that sets the option wins.
    pub fn resolve<T>(&self, scope: Scope, pick: impl Fn(&ScopeOptions) -> Option<T>) -> Option<T> {
        self.chain(scope).into_iter().find_map(pick)
    }

    fn chain(&self, scope: Scope) -> Vec<&ScopeOptions> {
        let mut chain = Vec::with_capacity(4);
        let connection = self.connections.get(scope.connection);
        let schema = connection.and_then(|c| c.schemas.get(scope.schema));

        if let Some(table) = schema.and_then(|s| s.tables.get(scope.table)) {
            chain.push(table);
        }
        if let Some(schema) = schema {
            chain.push(&schema.options);
        }
        if let Some(connection) = connection {
            chain.push(&connection.options);
        }
        chain.push(&self.generator);
        chain
    }

    pub fn path(&self, scope: Scope) -> PathBuf {
        self.resolve(scope, |o| o.path.clone())
            .unwrap_or_else(|| PathBuf::from("app/models"))
    }

    pub fn namespace(&self, scope: Scope) -> String {
        self.resolve(scope, |o| o.namespace.clone())
            .unwrap_or_else(|| "app.models".to_string())
    }

    pub fn parent(&self, scope: Scope) -> String {
        self.resolve(scope, |o| o.parent.clone())
            .unwrap_or_else(|| "models.Model".to_string())
    }

    pub fn path_connection(&self, scope: Scope) -> bool {
        self.resolve(scope, |o| o.path_connection).unwrap_or(false)
    }

    pub fn namespace_schema(&self, scope: Scope) -> bool {
        self.resolve(scope, |o| o.namespace_schema).unwrap_or(false)
    }

    pub fn only(&self, scope: Scope) -> Vec<String> {
        self.resolve(scope, |o| o.only.clone()).unwrap_or_default()
    }

    pub fn except(&self, scope: Scope) -> Vec<String> {
        self.resolve(scope, |o| o.except.clone()).unwrap_or_default()
    }

    pub fn timestamps(&self, scope: Scope) -> bool {
        self.resolve(scope, |o| o.timestamps).unwrap_or(true)
    }

    pub fn created_at(&self, scope: Scope) -> String {
        self.resolve(scope, |o| o.created_at.clone())
            .unwrap_or_else(|| "created_at".to_string())
    }

    pub fn updated_at(&self, scope: Scope) -> String {
        self.resolve(scope, |o| o.updated_at.clone())
            .unwrap_or_else(|| "updated_at".to_string())
    }

    pub fn primary_key(&self, scope: Scope) -> Option<String> {
        self.resolve(scope, |o| o.primary_key.clone())
    }

    pub fn per_page(&self, scope: Scope) -> Option<u32> {
        self.resolve(scope, |o| o.per_page)
    }

    pub fn casts(&self, scope: Scope) -> BTreeMap<String, String> {
        self.resolve(scope, |o| o.casts.clone()).unwrap_or_default()
    }

    pub fn hidden(&self, scope: Scope) -> Vec<String> {
        self.resolve(scope, |o| o.hidden.clone()).unwrap_or_default()
    }

    pub fn fillable(&self, scope: Scope) -> Option<Vec<String>> {
        self.resolve(scope, |o| o.fillable.clone())
    }

    pub fn base_files(&self, scope: Scope) -> bool {
        self.resolve(scope, |o| o.base_files).unwrap_or(false)
    }

    pub fn property_constants(&self, scope: Scope) -> bool {
        self.resolve(scope, |o| o.property_constants).unwrap_or(false)
    }

    pub fn indent_spaces(&self, scope: Scope) -> u8 {
        self.resolve(scope, |o| o.indent_spaces).unwrap_or(4)
    }

    pub fn show_connection(&self, scope: Scope) -> bool {
        self.resolve(scope, |o| o.show_connection).unwrap_or(false)
    }

    pub fn table_override(&self, scope: Scope) -> Option<String> {
        self.resolve(scope, |o| o.table.clone())
    }

    pub fn template_model(&self, scope: Scope) -> Option<PathBuf> {
        self.resolve(scope, |o| o.template.as_ref().and_then(|t| t.model.clone()))
    }

    pub fn template_user_model(&self, scope: Scope) -> Option<PathBuf> {
        self.resolve(scope, |o| {
            o.template.as_ref().and_then(|t| t.user_model.clone())
        })
    }
}

/// Match a `*`-wildcard pattern against a value
///
/// Everything except `*` is literal; the whole value must match.
pub fn wildcard_match(pattern: &str, value: &str) -> bool {
    if pattern == value {
        return true;
    }

    let regex = format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"));
    match Regex::new(&regex) {
        Ok(re) => re.is_match(value),
        Err(e) => {
            warn!(pattern = ?pattern, error = %e, "Invalid wildcard pattern");
            false
        }
    }
}

/// Whether any of the patterns matches the value
pub fn matches_any(patterns: &[String], value: &str) -> bool {
    patterns.iter().any(|p| wildcard_match(p, value))
}
