//! Code generation
//!
//! The [`Factory`] is the top-level driver: it walks a schema's tables
//! through the include/exclude filters, builds a model per table, renders it
//! through a template, resolves the import block, and persists the result.
//! With the base/user split enabled the base file is rewritten on every run
//! while the user file is written only once, protecting hand-edits.

pub mod imports;
pub mod python;

use std::path::PathBuf;

use minijinja::{context, Environment};
use tracing::{debug, info};

use crate::codegen::imports::{import_block, CodeFragment, QualifiedName};
use crate::config::{matches_any, GeneratorConfig, Scope};
use crate::error::ModelgenError;
use crate::meta::{Blueprint, Connection, SchemaManager};
use crate::model::{Model, ModelBuilder, Mutator};
use crate::storage::Storage;

/// Top-level generation driver bound to one connection
pub struct Factory<'a> {
    manager: SchemaManager<'a>,
    config: &'a GeneratorConfig,
    storage: &'a dyn Storage,
    mutators: Vec<Mutator>,
    env: Environment<'static>,
}

impl<'a> Factory<'a> {
    /// Select the connection to work with
    pub fn on(
        connection: &'a Connection,
        config: &'a GeneratorConfig,
        storage: &'a dyn Storage,
    ) -> Result<Self, ModelgenError> {
        let manager = SchemaManager::for_connection(connection)?;

        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.add_template("model", include_str!("python/templates/model.py.jinja"))
            .expect("Failed to load model template");
        env.add_template(
            "user_model",
            include_str!("python/templates/user_model.py.jinja"),
        )
        .expect("Failed to load user model template");

        Ok(Self {
            manager,
            config,
            storage,
            mutators: Vec::new(),
            env,
        })
    }

    pub fn manager(&self) -> &SchemaManager<'a> {
        &self.manager
    }

    /// Register a mutator applied to every model built by this factory
    ///
    /// Returns a handle identifying the mutator's position in the
    /// application order.
    pub fn mutate(&mut self, mutator: impl Fn(Model) -> Model + 'static) -> usize {
        self.mutators.push(Box::new(mutator));
        self.mutators.len() - 1
    }

    /// Build one model and write its source file(s)
    pub fn create(&self, schema: &str, table: &str) -> Result<(), ModelgenError> {
        info!(schema = ?schema, table = ?table, "Generating model");

        let builder = ModelBuilder::new(&self.manager, self.config);
        let model = builder.build(schema, table, &self.mutators, true)?;

        let rendered = self.render_model(&model)?;
        let rendered = expand_indent(&rendered, model.indent_spaces);

        let base_path = self.model_path(&model, model.base_files);
        if let Some(dir) = base_path.parent() {
            self.storage.ensure_dir(dir)?;
        }
        self.storage.write(&base_path, &rendered)?;
        debug!(path = ?base_path, "Wrote model file");

        if model.base_files {
            let user_path = self.model_path(&model, false);
            if self.storage.exists(&user_path) {
                debug!(path = ?user_path, "User file exists, leaving untouched");
            } else {
                let user = self.render_user_model(&model)?;
                let user = expand_indent(&user, model.indent_spaces);
                if let Some(dir) = user_path.parent() {
                    self.storage.ensure_dir(dir)?;
                }
                self.storage.write(&user_path, &user)?;
                info!(path = ?user_path, "Created user model file");
            }
        }

        Ok(())
    }

    /// Generate every eligible table of one schema
    ///
    /// Tables must match the `only` allow-list when one is configured, and
    /// must not match the `except` deny-list. Stops on the first error.
    pub fn map(&self, schema_name: &str) -> Result<(), ModelgenError> {
        info!(schema = ?schema_name, "Mapping schema");
        let schema = self.manager.schema(schema_name)?;

        for blueprint in &schema.tables {
            if self.should_take_only(blueprint) && self.should_not_exclude(blueprint) {
                self.create(&blueprint.schema, &blueprint.table)?;
            } else {
                debug!(table = ?blueprint.table, "Table filtered out");
            }
        }
        Ok(())
    }

    /// Generate every schema visible on the connection
    pub fn map_all(&self) -> Result<(), ModelgenError> {
        for schema_name in self.manager.schema_names()? {
            self.map(&schema_name)?;
        }
        Ok(())
    }

    fn scope<'m>(&'m self, blueprint: &'m Blueprint) -> Scope<'m> {
        Scope {
            connection: self.manager.connection().name(),
            schema: &blueprint.schema,
            table: &blueprint.table,
        }
    }

    fn should_take_only(&self, blueprint: &Blueprint) -> bool {
        let only = self.config.only(self.scope(blueprint));
        only.is_empty() || matches_any(&only, &blueprint.table)
    }

    fn should_not_exclude(&self, blueprint: &Blueprint) -> bool {
        !matches_any(&self.config.except(self.scope(blueprint)), &blueprint.table)
    }

    fn model_scope<'m>(&'m self, model: &'m Model) -> Scope<'m> {
        Scope {
            connection: &model.connection,
            schema: &model.schema,
            table: &model.table,
        }
    }

    /// Render the (base) model file
    fn render_model(&self, model: &Model) -> Result<String, ModelgenError> {
        let properties = self.properties_fragment(model);
        let body = self.body_fragment(model);

        // The import block is computed last, from the names the other
        // fragments recorded.
        let class_namespace = if model.base_files {
            model.base_namespace()
        } else {
            model.namespace.clone()
        };
        let mut uses: Vec<QualifiedName> = properties.uses.clone();
        uses.push(model.parent.clone());
        uses.extend(body.uses.clone());
        let imports = import_block(&class_namespace, &uses);

        let ctx = context! {
            namespace => class_namespace,
            class => model.class_name,
            parent => model.parent.class(),
            table => model.table,
            properties => properties.text,
            body => body.text,
            imports => imports,
        };

        self.render_template(model, "model", ctx)
    }

    /// Render the write-once user file subclassing the base class
    fn render_user_model(&self, model: &Model) -> Result<String, ModelgenError> {
        let base_class = format!("{}Base", model.class_name);
        let imports = format!(
            "from {}.{} import {} as {}",
            model.base_namespace(),
            model.module_name(),
            model.class_name,
            base_class
        );

        let ctx = context! {
            namespace => model.namespace,
            class => model.class_name,
            parent => base_class,
            table => model.table,
            properties => "",
            body => self.user_body(model),
            imports => imports,
        };

        self.render_template(model, "user_model", ctx)
    }

    fn render_template(
        &self,
        model: &Model,
        name: &str,
        ctx: minijinja::Value,
    ) -> Result<String, ModelgenError> {
        let scope = self.model_scope(model);
        let override_path = match name {
            "model" => self.config.template_model(scope),
            _ => self.config.template_user_model(scope),
        };

        let rendered = match override_path {
            Some(path) => {
                if !self.storage.exists(&path) {
                    return Err(ModelgenError::TemplateNotFound { path });
                }
                debug!(path = ?path, "Using template override");
                let source = self.storage.read(&path)?;
                self.env.render_str(&source, ctx)
            }
            None => self
                .env
                .get_template(name)
                .expect("embedded template")
                .render(ctx),
        };

        rendered.map_err(|e| ModelgenError::Render {
            table: model.table.clone(),
            message: format!("Template error: {}", e),
        })
    }

    /// Docstring property block: columns first, then relation accessors
    fn properties_fragment(&self, model: &Model) -> CodeFragment {
        let mut fragment = CodeFragment::default();
        let mut lines = Vec::new();

        for property in &model.properties {
            lines.push(python::ivar(&property.name, &property.hint));
            fragment.uses.extend(property.uses.iter().cloned());
        }

        if !model.relations.is_empty() {
            lines.push("\t".to_string());
            for relation in &model.relations {
                lines.push(python::ivar(relation.name(), &relation.hint()));
            }
        }

        fragment.text = lines.join("\n");
        fragment
    }

    /// Class body: constants, fields, then mutation and relation methods
    fn body_fragment(&self, model: &Model) -> CodeFragment {
        let mut constants = Vec::new();
        let mut excluded = Vec::new();

        if model.uses_timestamps && model.has_custom_created_at() {
            constants.push(python::assign(
                "CREATED_AT",
                &python::str_lit(&model.created_at),
            ));
            excluded.push(model.created_at.clone());
        }
        if model.uses_timestamps && model.has_custom_updated_at() {
            constants.push(python::assign(
                "UPDATED_AT",
                &python::str_lit(&model.updated_at),
            ));
            excluded.push(model.updated_at.clone());
        }

        if model.property_constants {
            for property in &model.properties {
                if excluded.contains(&property.name) {
                    continue;
                }
                constants.push(python::assign(
                    &property.name.to_uppercase(),
                    &python::str_lit(&property.name),
                ));
            }
        }

        let mut fields = Vec::new();
        if model.show_connection {
            fields.push(python::assign(
                "CONNECTION",
                &python::str_lit(&model.connection),
            ));
        }
        if model.needs_table_name() {
            fields.push(python::assign(
                "TABLE",
                &python::str_lit(model.table_for_query()),
            ));
        }
        if model.has_custom_primary_key() {
            fields.push(python::assign(
                "PRIMARY_KEY",
                &python::str_lit(&model.primary_key),
            ));
        }
        if !model.increments {
            fields.push(python::assign("INCREMENTING", python::bool_lit(false)));
        }
        if let Some(per_page) = model.per_page {
            fields.push(python::assign("PER_PAGE", &per_page.to_string()));
        }
        if !model.uses_timestamps {
            fields.push(python::assign("TIMESTAMPS", python::bool_lit(false)));
        }
        if !model.casts.is_empty() {
            let entries = model
                .casts
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()));
            fields.push(python::assign("CASTS", &python::dict_lit(entries)));
        }
        // With the base/user split, hidden and fillable belong to the user
        // file where they stay editable.
        if !model.base_files {
            if !model.hidden.is_empty() {
                fields.push(python::assign("HIDDEN", &python::list_lit(&model.hidden)));
            }
            if !model.fillable.is_empty() {
                fields.push(python::assign(
                    "FILLABLE",
                    &python::list_lit(&model.fillable),
                ));
            }
        }

        let mut sections = Vec::new();
        if !constants.is_empty() {
            sections.push(constants.join("\n"));
        }
        if !fields.is_empty() {
            sections.push(fields.join("\n"));
        }
        for mutation in &model.mutations {
            sections.push(mutation.body.clone());
        }
        for relation in &model.relations {
            sections.push(relation.body());
        }

        CodeFragment::new(sections.join("\n\n"))
    }

    fn user_body(&self, model: &Model) -> String {
        let mut fields = Vec::new();
        if !model.hidden.is_empty() {
            fields.push(python::assign("HIDDEN", &python::list_lit(&model.hidden)));
        }
        if !model.fillable.is_empty() {
            fields.push(python::assign(
                "FILLABLE",
                &python::list_lit(&model.fillable),
            ));
        }

        if fields.is_empty() {
            "\tpass".to_string()
        } else {
            fields.join("\n")
        }
    }

    /// Output path for a model file
    fn model_path(&self, model: &Model, base: bool) -> PathBuf {
        let scope = self.model_scope(model);
        let mut path = self.config.path(scope);

        if self.config.path_connection(scope) {
            path.push(&model.connection);
        }
        if self.config.namespace_schema(scope) {
            path.push(&model.schema);
        }
        if base {
            path.push("base");
        }

        path.push(format!("{}.py", model.module_name()));
        path
    }
}

/// Expand every literal tab to `spaces` spaces; zero keeps tabs
fn expand_indent(text: &str, spaces: u8) -> String {
    if spaces == 0 {
        text.to_string()
    } else {
        text.replace('\t', &" ".repeat(spaces as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{
        fixture, Column, DataType, FixtureCatalog, Reference, Schema,
    };
    use crate::storage::MemoryStorage;
    use std::path::Path;

    fn column(name: &str, data_type: DataType) -> Column {
        Column {
            name: name.to_string(),
            data_type,
            is_nullable: false,
            has_default: false,
            is_auto_generated: false,
            is_primary: false,
        }
    }

    fn id_column() -> Column {
        Column {
            name: "id".to_string(),
            data_type: DataType::Integer,
            is_nullable: false,
            has_default: true,
            is_auto_generated: true,
            is_primary: true,
        }
    }

    fn reference(col: &str, table: &str) -> Reference {
        Reference {
            columns: vec![col.to_string()],
            on: ("public".to_string(), table.to_string()),
            references: vec!["id".to_string()],
        }
    }

    fn table(name: &str, mut extra: Vec<Column>, references: Vec<Reference>) -> Blueprint {
        let mut columns = vec![id_column()];
        columns.append(&mut extra);
        Blueprint {
            schema: "public".to_string(),
            table: name.to_string(),
            columns,
            primary_key: vec!["id".to_string()],
            uniques: vec![],
            references,
        }
    }

    fn accounts_catalog() -> FixtureCatalog {
        let schema = Schema {
            name: "public".to_string(),
            connection: "default".to_string(),
            tables: vec![
                table("users", vec![column("email", DataType::Text)], vec![]),
                table(
                    "user_roles",
                    vec![column("user_id", DataType::Integer)],
                    vec![reference("user_id", "users")],
                ),
                table("user_logs", vec![], vec![]),
                table("orders", vec![], vec![]),
            ],
        };
        FixtureCatalog::new().with_schema(schema)
    }

    fn config_from(toml_source: &str) -> GeneratorConfig {
        toml::from_str(toml_source).unwrap()
    }

    fn with_factory<T>(
        catalog: FixtureCatalog,
        config: &GeneratorConfig,
        storage: &MemoryStorage,
        run: impl FnOnce(&mut Factory) -> T,
    ) -> T {
        fixture::register();
        let connection = Connection::fixture("default", catalog);
        let mut factory = Factory::on(&connection, config, storage).unwrap();
        run(&mut factory)
    }

    #[test]
    fn test_create_writes_model_file() {
        let config = GeneratorConfig::default();
        let storage = MemoryStorage::new();

        with_factory(accounts_catalog(), &config, &storage, |factory| {
            factory.create("public", "users").unwrap();
        });

        let contents = storage.contents("app/models/user.py").unwrap();
        assert!(contents.contains("class User(Model):"));
        assert!(contents.contains("from models import Model"));
        assert!(contents.contains(":ivar email: str"));
        assert!(contents.contains("FILLABLE = [\"email\"]"));
    }

    #[test]
    fn test_default_indentation_expands_tabs() {
        let config = GeneratorConfig::default();
        let storage = MemoryStorage::new();

        with_factory(accounts_catalog(), &config, &storage, |factory| {
            factory.create("public", "users").unwrap();
        });

        let contents = storage.contents("app/models/user.py").unwrap();
        assert!(!contents.contains('\t'));
        assert!(contents.contains("    \"\"\""));
    }

    #[test]
    fn test_zero_indent_keeps_tabs() {
        let config = config_from("[generator]\nindent_spaces = 0\n");
        let storage = MemoryStorage::new();

        with_factory(accounts_catalog(), &config, &storage, |factory| {
            factory.create("public", "users").unwrap();
        });

        let contents = storage.contents("app/models/user.py").unwrap();
        assert!(contents.contains('\t'));
    }

    #[test]
    fn test_map_applies_only_and_except_filters() {
        let config = config_from(
            r#"
            [generator]
            only = ["user_*"]
            except = ["user_logs"]
            "#,
        );
        let storage = MemoryStorage::new();

        with_factory(accounts_catalog(), &config, &storage, |factory| {
            factory.map("public").unwrap();
        });

        assert_eq!(
            storage.paths(),
            vec![Path::new("app/models/user_role.py").to_path_buf()]
        );
    }

    #[test]
    fn test_map_exact_match_pattern() {
        let config = config_from("[generator]\nonly = [\"users\"]\n");
        let storage = MemoryStorage::new();

        with_factory(accounts_catalog(), &config, &storage, |factory| {
            factory.map("public").unwrap();
        });

        assert_eq!(
            storage.paths(),
            vec![Path::new("app/models/user.py").to_path_buf()]
        );
    }

    #[test]
    fn test_user_file_written_once_base_always_rewritten() {
        let config = config_from("[generator]\nbase_files = true\n");
        let storage = MemoryStorage::new();

        with_factory(accounts_catalog(), &config, &storage, |factory| {
            factory.create("public", "users").unwrap();

            let base = storage.contents("app/models/base/user.py").unwrap();
            let user = storage.contents("app/models/user.py").unwrap();
            assert!(base.contains("class User(Model):"));
            assert!(user.contains("class User(UserBase):"));
            assert!(user.contains(
                "from app.models.base.user import User as UserBase"
            ));

            // Hand-edit the user file, then regenerate.
            storage.insert("app/models/user.py", "# hand edited\n");
            storage.insert("app/models/base/user.py", "# stale base\n");
            factory.create("public", "users").unwrap();

            assert_eq!(
                storage.contents("app/models/user.py").unwrap(),
                "# hand edited\n"
            );
            assert!(storage
                .contents("app/models/base/user.py")
                .unwrap()
                .contains("class User(Model):"));
        });
    }

    #[test]
    fn test_base_file_moves_hidden_and_fillable_to_user_file() {
        let config = config_from(
            r#"
            [generator]
            base_files = true
            hidden = ["email"]
            "#,
        );
        let storage = MemoryStorage::new();

        with_factory(accounts_catalog(), &config, &storage, |factory| {
            factory.create("public", "users").unwrap();
        });

        let base = storage.contents("app/models/base/user.py").unwrap();
        let user = storage.contents("app/models/user.py").unwrap();
        assert!(!base.contains("HIDDEN"));
        assert!(!base.contains("FILLABLE"));
        assert!(user.contains("HIDDEN = [\"email\"]"));
        assert!(user.contains("FILLABLE = [\"email\"]"));
    }

    #[test]
    fn test_template_override_missing_is_fatal_for_table() {
        let config = config_from(
            r#"
            [generator.template]
            model = "templates/custom.py.jinja"
            "#,
        );
        let storage = MemoryStorage::new();

        let err = with_factory(accounts_catalog(), &config, &storage, |factory| {
            factory.create("public", "users").unwrap_err()
        });

        assert!(matches!(err, ModelgenError::TemplateNotFound { .. }));
    }

    #[test]
    fn test_template_override_used_when_present() {
        let config = config_from(
            r#"
            [generator.template]
            model = "templates/custom.py.jinja"
            "#,
        );
        let storage = MemoryStorage::new();
        storage.insert(
            "templates/custom.py.jinja",
            "# custom {{ class }} over {{ table }}\n",
        );

        with_factory(accounts_catalog(), &config, &storage, |factory| {
            factory.create("public", "users").unwrap();
        });

        assert_eq!(
            storage.contents("app/models/user.py").unwrap(),
            "# custom User over users\n"
        );
    }

    #[test]
    fn test_imports_sorted_and_deduplicated_in_output() {
        let schema = Schema {
            name: "public".to_string(),
            connection: "default".to_string(),
            tables: vec![table(
                "events",
                vec![
                    column("occurred_at", DataType::Timestamp),
                    column("token", DataType::Uuid),
                    column("amount", DataType::Numeric),
                    column("backup_token", DataType::Uuid),
                ],
                vec![],
            )],
        };
        let config = GeneratorConfig::default();
        let storage = MemoryStorage::new();

        with_factory(
            FixtureCatalog::new().with_schema(schema),
            &config,
            &storage,
            |factory| {
                factory.create("public", "events").unwrap();
            },
        );

        let contents = storage.contents("app/models/event.py").unwrap();
        let datetime = contents.find("from datetime import datetime").unwrap();
        let decimal = contents.find("from decimal import Decimal").unwrap();
        let uuid = contents.find("from uuid import UUID").unwrap();
        assert!(datetime < decimal && decimal < uuid);
        assert_eq!(contents.matches("from uuid import UUID").count(), 1);
    }

    #[test]
    fn test_relation_accessors_rendered() {
        let schema = Schema {
            name: "public".to_string(),
            connection: "default".to_string(),
            tables: vec![
                table("posts", vec![], vec![]),
                table("tags", vec![], vec![]),
                table(
                    "posts_tags",
                    vec![
                        column("post_id", DataType::Integer),
                        column("tag_id", DataType::Integer),
                    ],
                    vec![
                        reference("post_id", "posts"),
                        reference("tag_id", "tags"),
                    ],
                ),
            ],
        };
        let config = GeneratorConfig::default();
        let storage = MemoryStorage::new();

        with_factory(
            FixtureCatalog::new().with_schema(schema),
            &config,
            &storage,
            |factory| {
                factory.create("public", "posts").unwrap();
            },
        );

        let contents = storage.contents("app/models/post.py").unwrap();
        assert!(contents.contains("def tags(self):"));
        assert!(contents.contains(
            "self.belongs_to_many(\"app.models.Tag\", through=\"posts_tags\""
        ));
        assert!(!contents.contains("def posts_tags(self):"));
    }

    #[test]
    fn test_mutators_inject_methods() {
        let config = GeneratorConfig::default();
        let storage = MemoryStorage::new();

        with_factory(accounts_catalog(), &config, &storage, |factory| {
            let handle = factory.mutate(|mut model| {
                model.mutations.push(crate::model::Mutation {
                    name: "display_name".to_string(),
                    body: "\tdef display_name(self):\n\t\treturn self.email".to_string(),
                });
                model
            });
            assert_eq!(handle, 0);

            factory.create("public", "users").unwrap();
        });

        let contents = storage.contents("app/models/user.py").unwrap();
        assert!(contents.contains("def display_name(self):"));
    }

    #[test]
    fn test_map_all_covers_every_schema() {
        let public = Schema {
            name: "public".to_string(),
            connection: "default".to_string(),
            tables: vec![table("users", vec![], vec![])],
        };
        let audit = Schema {
            name: "audit".to_string(),
            connection: "default".to_string(),
            tables: vec![table("events", vec![], vec![])],
        };
        let config = config_from("[generator]\nnamespace_schema = true\n");
        let storage = MemoryStorage::new();

        with_factory(
            FixtureCatalog::new().with_schema(public).with_schema(audit),
            &config,
            &storage,
            |factory| {
                factory.map_all().unwrap();
            },
        );

        let paths = storage.paths();
        assert!(paths.contains(&Path::new("app/models/public/user.py").to_path_buf()));
        assert!(paths.contains(&Path::new("app/models/audit/event.py").to_path_buf()));
    }

    #[test]
    fn test_custom_timestamp_fields_become_constants() {
        let schema = Schema {
            name: "public".to_string(),
            connection: "default".to_string(),
            tables: vec![table(
                "invoices",
                vec![
                    column("created_on", DataType::Timestamp),
                    column("updated_on", DataType::Timestamp),
                ],
                vec![],
            )],
        };
        let config = config_from(
            r#"
            [generator]
            created_at = "created_on"
            updated_at = "updated_on"
            "#,
        );
        let storage = MemoryStorage::new();

        with_factory(
            FixtureCatalog::new().with_schema(schema),
            &config,
            &storage,
            |factory| {
                factory.create("public", "invoices").unwrap();
            },
        );

        let contents = storage.contents("app/models/invoice.py").unwrap();
        assert!(contents.contains("CREATED_AT = \"created_on\""));
        assert!(contents.contains("UPDATED_AT = \"updated_on\""));
        assert!(!contents.contains("TIMESTAMPS = False"));
    }

    #[test]
    fn test_body_fields_resolved_from_table_scope() {
        let config = config_from(
            r#"
            [connections.default.schemas.public.tables.orders]
            per_page = 25
            show_connection = true
            property_constants = true
            "#,
        );
        let storage = MemoryStorage::new();

        with_factory(accounts_catalog(), &config, &storage, |factory| {
            factory.create("public", "orders").unwrap();
        });

        let contents = storage.contents("app/models/order.py").unwrap();
        assert!(contents.contains("CONNECTION = \"default\""));
        assert!(contents.contains("PER_PAGE = 25"));
        assert!(contents.contains("ID = \"id\""));

        // Other tables keep the defaults.
        with_factory(accounts_catalog(), &config, &storage, |factory| {
            factory.create("public", "users").unwrap();
        });
        let contents = storage.contents("app/models/user.py").unwrap();
        assert!(!contents.contains("PER_PAGE"));
    }

    #[test]
    fn test_table_name_emitted_when_not_derivable() {
        let schema = Schema {
            name: "public".to_string(),
            connection: "default".to_string(),
            tables: vec![table("person", vec![], vec![])],
        };
        let config = GeneratorConfig::default();
        let storage = MemoryStorage::new();

        with_factory(
            FixtureCatalog::new().with_schema(schema),
            &config,
            &storage,
            |factory| {
                factory.create("public", "person").unwrap();
            },
        );

        let contents = storage.contents("app/models/person.py").unwrap();
        assert!(contents.contains("TABLE = \"person\""));
    }

    #[test]
    fn test_expand_indent() {
        assert_eq!(expand_indent("\tx\n\t\ty", 4), "    x\n        y");
        assert_eq!(expand_indent("\tx", 0), "\tx");
    }
}
