use postgres::Client;
use tracing::{debug, error, info, trace};

use crate::error::ModelgenError;
use crate::meta::manager::{Connection, SchemaExtractor};
use crate::meta::{Blueprint, Column, DataType, Reference, Schema};

/// PostgreSQL dialect extractor
pub struct PostgresExtractor;

impl PostgresExtractor {
    fn client<'c>(
        &self,
        connection: &'c Connection,
    ) -> Result<&'c std::cell::RefCell<Client>, ModelgenError> {
        connection.postgres_client().ok_or_else(|| {
            ModelgenError::Connection(
                "Postgres extractor requires a postgres-backed connection".to_string(),
            )
        })
    }
}

impl SchemaExtractor for PostgresExtractor {
    fn schema_names(&self, connection: &Connection) -> Result<Vec<String>, ModelgenError> {
        let client = self.client(connection)?;
        query_schemas(&mut client.borrow_mut())
    }

    fn extract(&self, connection: &Connection, schema_name: &str) -> Result<Schema, ModelgenError> {
        let cell = self.client(connection)?;
        let mut guard = cell.borrow_mut();
        let client = &mut *guard;

        info!(schema = ?schema_name, "Starting schema introspection");

        let table_names = query_tables(client, schema_name)?;
        debug!(count = table_names.len(), "Found tables");

        let mut tables = Vec::with_capacity(table_names.len());
        for table_name in table_names {
            debug!(table = ?table_name, "Introspecting table");

            let primary_key = query_primary_key(client, schema_name, &table_name)?;
            trace!(table = ?table_name, primary_key = ?primary_key, "Found primary key");

            let columns = query_columns(client, schema_name, &table_name, &primary_key)?;
            trace!(table = ?table_name, columns = columns.len(), "Found columns");

            let uniques = query_uniques(client, schema_name, &table_name)?;
            let references = query_references(client, schema_name, &table_name)?;
            trace!(
                table = ?table_name,
                uniques = uniques.len(),
                references = references.len(),
                "Found constraints"
            );

            tables.push(Blueprint {
                schema: schema_name.to_string(),
                table: table_name,
                columns,
                primary_key,
                uniques,
                references,
            });
        }

        info!(
            schema = ?schema_name,
            tables = tables.len(),
            "Schema introspection complete"
        );

        Ok(Schema {
            name: schema_name.to_string(),
            connection: connection.name().to_string(),
            tables,
        })
    }
}

/// Query all user schema names on the connection
fn query_schemas(client: &mut Client) -> Result<Vec<String>, ModelgenError> {
    trace!("Querying schemas");

    let sql = r#"
        SELECT n.nspname AS schema_name
        FROM pg_namespace n
        WHERE n.nspname NOT LIKE 'pg\_%'
            AND n.nspname <> 'information_schema'
        ORDER BY n.nspname
    "#;

    let rows = client
        .query(sql, &[])
        .map_err(|e| ModelgenError::Introspection {
            schema: "*".to_string(),
            message: format!("Failed to enumerate schemas: {}", e),
        })?;

    Ok(rows.iter().map(|row| row.get("schema_name")).collect())
}

/// Query all table names in a schema
fn query_tables(client: &mut Client, schema_name: &str) -> Result<Vec<String>, ModelgenError> {
    trace!(schema = ?schema_name, "Querying tables");

    let sql = r#"
        SELECT c.relname AS table_name
        FROM pg_class c
        JOIN pg_namespace n ON n.oid = c.relnamespace
        WHERE c.relkind = 'r'
            AND n.nspname = $1
        ORDER BY c.relname
    "#;

    let rows = client
        .query(sql, &[&schema_name])
        .map_err(|e| ModelgenError::Introspection {
            schema: schema_name.to_string(),
            message: format!("Failed to query tables: {}", e),
        })?;

    Ok(rows.iter().map(|row| row.get("table_name")).collect())
}

/// Query all columns for a table
fn query_columns(
    client: &mut Client,
    schema_name: &str,
    table_name: &str,
    primary_key: &[String],
) -> Result<Vec<Column>, ModelgenError> {
    trace!(schema = ?schema_name, table = ?table_name, "Querying columns");

    let sql = r#"
        SELECT
            a.attname AS column_name,
            format_type(a.atttypid, a.atttypmod) AS data_type,
            NOT a.attnotnull AS is_nullable,
            pg_get_expr(d.adbin, d.adrelid) AS default_value
        FROM pg_attribute a
        JOIN pg_class c ON c.oid = a.attrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        LEFT JOIN pg_attrdef d ON d.adrelid = c.oid AND d.adnum = a.attnum
        WHERE c.relname = $1
            AND n.nspname = $2
            AND a.attnum > 0
            AND NOT a.attisdropped
        ORDER BY a.attnum
    "#;

    let rows = client
        .query(sql, &[&table_name, &schema_name])
        .map_err(|e| {
            error!(
                schema = ?schema_name,
                table = ?table_name,
                error = ?e,
                "Failed to query columns"
            );
            ModelgenError::Introspection {
                schema: schema_name.to_string(),
                message: format!("Failed to query columns for table '{}': {}", table_name, e),
            }
        })?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let column_name: String = row.get("column_name");
        let data_type_str: String = row.get("data_type");
        let is_nullable: bool = row.get("is_nullable");
        let default_value: Option<String> = row.get("default_value");

        let is_auto_generated = is_auto_generated_column(&default_value);
        let has_default = default_value.is_some();
        let data_type = parse_data_type(&data_type_str);
        let is_primary = primary_key.contains(&column_name);

        trace!(
            column = ?column_name,
            data_type = ?data_type_str,
            parsed_type = ?data_type,
            is_nullable = ?is_nullable,
            "Parsed column"
        );

        columns.push(Column {
            name: column_name,
            data_type,
            is_nullable,
            has_default,
            is_auto_generated,
            is_primary,
        });
    }

    Ok(columns)
}

/// Query primary key columns for a table
fn query_primary_key(
    client: &mut Client,
    schema_name: &str,
    table_name: &str,
) -> Result<Vec<String>, ModelgenError> {
    trace!(schema = ?schema_name, table = ?table_name, "Querying primary key");

    let sql = r#"
        SELECT a.attname AS column_name
        FROM pg_constraint con
        JOIN pg_class c ON c.oid = con.conrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum = ANY(con.conkey)
        WHERE con.contype = 'p'
            AND c.relname = $1
            AND n.nspname = $2
        ORDER BY array_position(con.conkey, a.attnum)
    "#;

    let rows = client
        .query(sql, &[&table_name, &schema_name])
        .map_err(|e| ModelgenError::Introspection {
            schema: schema_name.to_string(),
            message: format!(
                "Failed to query primary key for table '{}': {}",
                table_name, e
            ),
        })?;

    Ok(rows.iter().map(|row| row.get("column_name")).collect())
}

/// Query unique constraints for a table, one column set per constraint
fn query_uniques(
    client: &mut Client,
    schema_name: &str,
    table_name: &str,
) -> Result<Vec<Vec<String>>, ModelgenError> {
    trace!(schema = ?schema_name, table = ?table_name, "Querying unique constraints");

    let sql = r#"
        SELECT con.conname AS constraint_name,
               a.attname AS column_name
        FROM pg_constraint con
        JOIN pg_class c ON c.oid = con.conrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum = ANY(con.conkey)
        WHERE con.contype = 'u'
            AND c.relname = $1
            AND n.nspname = $2
        ORDER BY con.oid, array_position(con.conkey, a.attnum)
    "#;

    let rows = client
        .query(sql, &[&table_name, &schema_name])
        .map_err(|e| ModelgenError::Introspection {
            schema: schema_name.to_string(),
            message: format!(
                "Failed to query unique constraints for table '{}': {}",
                table_name, e
            ),
        })?;

    let mut uniques: Vec<(String, Vec<String>)> = Vec::new();
    for row in rows {
        let constraint: String = row.get("constraint_name");
        let column: String = row.get("column_name");

        match uniques.last_mut() {
            Some((name, columns)) if *name == constraint => columns.push(column),
            _ => uniques.push((constraint, vec![column])),
        }
    }

    Ok(uniques.into_iter().map(|(_, columns)| columns).collect())
}

/// Query outgoing foreign keys for a table, in constraint order
fn query_references(
    client: &mut Client,
    schema_name: &str,
    table_name: &str,
) -> Result<Vec<Reference>, ModelgenError> {
    trace!(schema = ?schema_name, table = ?table_name, "Querying foreign keys");

    let sql = r#"
        SELECT con.conname AS constraint_name,
               sa.attname AS column_name,
               fn.nspname AS target_schema,
               fc.relname AS target_table,
               fa.attname AS target_column
        FROM pg_constraint con
        JOIN pg_class c ON c.oid = con.conrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        JOIN pg_class fc ON fc.oid = con.confrelid
        JOIN pg_namespace fn ON fn.oid = fc.relnamespace
        CROSS JOIN LATERAL unnest(con.conkey, con.confkey)
            WITH ORDINALITY AS cols(attnum, fattnum, ord)
        JOIN pg_attribute sa ON sa.attrelid = c.oid AND sa.attnum = cols.attnum
        JOIN pg_attribute fa ON fa.attrelid = fc.oid AND fa.attnum = cols.fattnum
        WHERE con.contype = 'f'
            AND c.relname = $1
            AND n.nspname = $2
        ORDER BY con.oid, cols.ord
    "#;

    let rows = client
        .query(sql, &[&table_name, &schema_name])
        .map_err(|e| ModelgenError::Introspection {
            schema: schema_name.to_string(),
            message: format!(
                "Failed to query foreign keys for table '{}': {}",
                table_name, e
            ),
        })?;

    let mut references: Vec<(String, Reference)> = Vec::new();
    for row in rows {
        let constraint: String = row.get("constraint_name");
        let column: String = row.get("column_name");
        let target_schema: String = row.get("target_schema");
        let target_table: String = row.get("target_table");
        let target_column: String = row.get("target_column");

        match references.last_mut() {
            Some((name, reference)) if *name == constraint => {
                reference.columns.push(column);
                reference.references.push(target_column);
            }
            _ => references.push((
                constraint,
                Reference {
                    columns: vec![column],
                    on: (target_schema, target_table),
                    references: vec![target_column],
                },
            )),
        }
    }

    Ok(references.into_iter().map(|(_, r)| r).collect())
}

/// Check if a column is auto-generated (SERIAL, BIGSERIAL, IDENTITY)
fn is_auto_generated_column(default_value: &Option<String>) -> bool {
    match default_value {
        Some(default) => {
            let lower = default.to_lowercase();
            // SERIAL/BIGSERIAL columns have nextval('sequence_name') as default
            lower.contains("nextval(")
                // IDENTITY columns
                || lower.contains("generated")
        }
        None => false,
    }
}

/// Parse PostgreSQL type string into DataType enum
fn parse_data_type(type_str: &str) -> DataType {
    let lower = type_str.to_lowercase();
    let trimmed = lower.trim();

    // Handle arrays first (e.g., "integer[]", "text[]", "character varying(255)[]")
    if trimmed.ends_with("[]") {
        let inner_type = &trimmed[..trimmed.len() - 2];
        let inner = parse_data_type(inner_type);
        return DataType::Array(Box::new(inner));
    }

    // Handle types with parameters
    if trimmed.starts_with("character varying") || trimmed.starts_with("varchar") {
        let len = extract_length(trimmed);
        return DataType::Varchar(len);
    }
    if trimmed.starts_with("character(") || trimmed.starts_with("char(") {
        let len = extract_length(trimmed);
        return DataType::Char(len);
    }
    if trimmed.starts_with("numeric") || trimmed.starts_with("decimal") {
        return DataType::Numeric;
    }

    // Handle timestamp variations
    if trimmed.starts_with("timestamp") {
        if trimmed.contains("with time zone") || trimmed.contains("timestamptz") {
            return DataType::TimestampTz;
        }
        return DataType::Timestamp;
    }

    // Handle time variations
    if trimmed.starts_with("time ") || trimmed == "time" {
        if trimmed.contains("with time zone") {
            return DataType::TimeTz;
        }
        return DataType::Time;
    }

    // Simple type matching
    match trimmed {
        "smallint" | "int2" => DataType::SmallInt,
        "integer" | "int" | "int4" => DataType::Integer,
        "bigint" | "int8" => DataType::BigInt,
        "boolean" | "bool" => DataType::Boolean,
        "text" => DataType::Text,
        "real" | "float4" => DataType::Real,
        "double precision" | "float8" => DataType::DoublePrecision,
        "date" => DataType::Date,
        "uuid" => DataType::Uuid,
        "json" => DataType::Json,
        "jsonb" => DataType::JsonBinary,
        "bytea" => DataType::Binary,
        "timetz" => DataType::TimeTz,
        "timestamptz" => DataType::TimestampTz,
        _ => {
            // Assume it's a custom enum type
            DataType::Enum(type_str.to_string())
        }
    }
}

/// Extract length parameter from type like "varchar(255)" or "character varying(100)"
fn extract_length(type_str: &str) -> Option<u32> {
    if let Some(start) = type_str.find('(') {
        if let Some(end) = type_str.find(')') {
            let len_str = &type_str[start + 1..end];
            // Handle numeric(10,2) - just take first number
            let first_num = len_str.split(',').next().unwrap_or(len_str);
            return first_num.trim().parse().ok();
        }
    }
    None
}
