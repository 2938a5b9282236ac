//! Model building
//!
//! A [`Model`] is the generation-time view of one table: properties derived
//! from columns, inferred relations, caller-injected mutations, and resolved
//! configuration. Models are transient; they are rebuilt on every request and
//! owned by the caller. Relation targets are built as lightweight models
//! (without relations) through the same schema cache.

pub mod relations;

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::codegen::imports::QualifiedName;
use crate::codegen::python;
use crate::config::{matches_any, wildcard_match, GeneratorConfig, Scope};
use crate::error::ModelgenError;
use crate::meta::{pluralize, Blueprint, SchemaManager};
use crate::model::relations::{belongs_to, Relation, RelationTarget, ReferenceFactory};

/// A pure transformation applied to a model draft before rendering
pub type Mutator = Box<dyn Fn(Model) -> Model>;

/// One docstring property
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub hint: String,
    pub uses: Vec<QualifiedName>,
}

/// A caller-supplied method injected into the class body
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub name: String,
    /// Full method text, tab-indented one level
    pub body: String,
}

/// Generation-time view of one table
#[derive(Debug, Clone)]
pub struct Model {
    pub class_name: String,
    pub record_name: String,
    pub namespace: String,
    pub parent: QualifiedName,
    pub connection: String,
    pub schema: String,
    pub table: String,
    pub properties: Vec<Property>,
    pub relations: Vec<Relation>,
    pub mutations: Vec<Mutation>,
    pub primary_key: String,
    pub increments: bool,
    pub uses_timestamps: bool,
    pub created_at: String,
    pub updated_at: String,
    pub per_page: Option<u32>,
    pub casts: BTreeMap<String, String>,
    pub hidden: Vec<String>,
    pub fillable: Vec<String>,
    pub property_constants: bool,
    pub show_connection: bool,
    pub table_override: Option<String>,
    pub base_files: bool,
    pub indent_spaces: u8,
}

impl Model {
    /// Qualified name of the (user-facing) class
    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(format!("{}.{}", self.namespace, self.class_name))
    }

    /// Namespace of the always-rewritten base class
    pub fn base_namespace(&self) -> String {
        format!("{}.base", self.namespace)
    }

    /// Module (file stem) holding the generated class
    pub fn module_name(&self) -> &str {
        &self.record_name
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }

    pub fn has_relation(&self, name: &str) -> bool {
        self.relations.iter().any(|r| r.name() == name)
    }

    /// Whether the table name must be spelled out in the class body
    pub fn needs_table_name(&self) -> bool {
        self.table_override.is_some() || pluralize(&self.record_name) != self.table
    }

    pub fn table_for_query(&self) -> &str {
        self.table_override.as_deref().unwrap_or(&self.table)
    }

    pub fn has_custom_primary_key(&self) -> bool {
        self.primary_key != "id"
    }

    pub fn has_custom_created_at(&self) -> bool {
        self.created_at != "created_at"
    }

    pub fn has_custom_updated_at(&self) -> bool {
        self.updated_at != "updated_at"
    }

    /// What relations need to know about this model
    pub fn relation_target(&self) -> RelationTarget {
        RelationTarget {
            class_name: self.class_name.clone(),
            record_name: self.record_name.clone(),
            table: self.table.clone(),
            qualified: self.qualified_name(),
        }
    }
}

/// Assembles models from introspected metadata and scoped configuration
pub struct ModelBuilder<'a> {
    manager: &'a SchemaManager<'a>,
    config: &'a GeneratorConfig,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(manager: &'a SchemaManager<'a>, config: &'a GeneratorConfig) -> Self {
        Self { manager, config }
    }

    /// Build the model for one table
    ///
    /// `with_relations = false` produces the lightweight variant used as a
    /// relation target; it skips inference entirely and never recurses.
    pub fn build(
        &self,
        schema_name: &str,
        table: &str,
        mutators: &[Mutator],
        with_relations: bool,
    ) -> Result<Model, ModelgenError> {
        let schema = self.manager.schema(schema_name)?;
        let blueprint = schema
            .table(table)
            .ok_or_else(|| ModelgenError::UnknownTable {
                schema: schema_name.to_string(),
                table: table.to_string(),
            })?;

        let mut model = self.base_model(blueprint);

        if with_relations {
            self.add_relations(&mut model, blueprint)?;
        }

        for mutator in mutators {
            model = mutator(model);
        }

        Ok(model)
    }

    fn base_model(&self, blueprint: &Blueprint) -> Model {
        let connection = self.manager.connection().name().to_string();
        let scope = Scope {
            connection: &connection,
            schema: &blueprint.schema,
            table: &blueprint.table,
        };

        let mut namespace = self.config.namespace(scope);
        if self.config.namespace_schema(scope) {
            namespace = format!("{}.{}", namespace, blueprint.schema);
        }

        let properties: Vec<Property> = blueprint
            .columns
            .iter()
            .map(|col| {
                let (hint, uses) = python::python_type(&col.data_type, col.is_nullable);
                Property {
                    name: col.name.clone(),
                    hint,
                    uses,
                }
            })
            .collect();

        let created_at = self.config.created_at(scope);
        let updated_at = self.config.updated_at(scope);
        let uses_timestamps = self.config.timestamps(scope)
            && blueprint.has_column(&created_at)
            && blueprint.has_column(&updated_at);

        let primary_key = self
            .config
            .primary_key(scope)
            .or_else(|| blueprint.primary_key.first().cloned())
            .unwrap_or_else(|| "id".to_string());

        let configured_casts = self.config.casts(scope);
        let mut casts = BTreeMap::new();
        for column in &blueprint.columns {
            for (pattern, cast) in &configured_casts {
                if wildcard_match(pattern, &column.name) {
                    casts.insert(column.name.clone(), cast.clone());
                    break;
                }
            }
        }

        let hidden_patterns = self.config.hidden(scope);
        let hidden: Vec<String> = blueprint
            .columns
            .iter()
            .filter(|c| matches_any(&hidden_patterns, &c.name))
            .map(|c| c.name.clone())
            .collect();

        let fillable: Vec<String> = match self.config.fillable(scope) {
            Some(patterns) => blueprint
                .columns
                .iter()
                .filter(|c| matches_any(&patterns, &c.name))
                .map(|c| c.name.clone())
                .collect(),
            None => blueprint
                .columns
                .iter()
                .filter(|c| !c.is_primary && c.name != created_at && c.name != updated_at)
                .map(|c| c.name.clone())
                .collect(),
        };

        Model {
            class_name: blueprint.class_name(),
            record_name: blueprint.record_name(),
            namespace,
            parent: QualifiedName::new(self.config.parent(scope)),
            connection: connection.clone(),
            schema: blueprint.schema.clone(),
            table: blueprint.table.clone(),
            properties,
            relations: Vec::new(),
            mutations: Vec::new(),
            primary_key,
            increments: blueprint.has_auto_increment(),
            uses_timestamps,
            created_at,
            updated_at,
            per_page: self.config.per_page(scope),
            casts,
            hidden,
            fillable,
            property_constants: self.config.property_constants(scope),
            show_connection: self.config.show_connection(scope),
            table_override: self.config.table_override(scope),
            base_files: self.config.base_files(scope),
            indent_spaces: self.config.indent_spaces(scope),
        }
    }

    fn add_relations(&self, model: &mut Model, blueprint: &Blueprint) -> Result<(), ModelgenError> {
        let mut inferred: Vec<Relation> = Vec::new();

        // Outgoing references: this model belongs to the referenced table.
        for reference in &blueprint.references {
            let target = self.relation_target(&reference.on.0, &reference.on.1)?;
            inferred.push(belongs_to(reference, target));
        }

        // Incoming references: plain has-one/has-many, or many-to-many when
        // the referencing table qualifies as a pivot.
        for (related, reference) in self.manager.referencing(blueprint)? {
            let factory = ReferenceFactory::new(&model.record_name, &related, &reference);
            let mut lookup =
                |schema: &str, table: &str| self.relation_target(schema, table);
            inferred.extend(factory.make(&mut lookup)?);
        }

        // Name collisions: columns win over relations, earlier relations win
        // over later ones.
        for relation in inferred {
            if model.has_property(relation.name()) {
                debug!(
                    table = ?model.table,
                    relation = ?relation.name(),
                    "Dropping relation shadowed by a column"
                );
                continue;
            }
            if model.has_relation(relation.name()) {
                trace!(relation = ?relation.name(), "Keeping first relation with this name");
                continue;
            }
            model.relations.push(relation);
        }

        Ok(())
    }

    fn relation_target(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<RelationTarget, ModelgenError> {
        let model = self.build(schema, table, &[], false)?;
        Ok(model.relation_target())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{fixture, Column, Connection, DataType, FixtureCatalog, Reference, Schema};

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

    fn blog_catalog() -> FixtureCatalog {
        let schema = Schema {
            name: "public".to_string(),
            connection: "default".to_string(),
            tables: vec![
                table(
                    "users",
                    vec![
                        column("email", DataType::Varchar(Some(255))),
                        column("created_at", DataType::Timestamp),
                        column("updated_at", DataType::Timestamp),
                    ],
                    vec![],
                ),
                table(
                    "posts",
                    vec![column("user_id", DataType::Integer)],
                    vec![reference("user_id", "users")],
                ),
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
        FixtureCatalog::new().with_schema(schema)
    }

    fn with_manager<T>(
        catalog: FixtureCatalog,
        config: &GeneratorConfig,
        run: impl FnOnce(&ModelBuilder) -> T,
    ) -> T {
        fixture::register();
        let connection = Connection::fixture("default", catalog);
        let manager = SchemaManager::for_connection(&connection).unwrap();
        let builder = ModelBuilder::new(&manager, config);
        run(&builder)
    }

    #[test]
    fn test_build_derives_properties_and_naming() {
        let config = GeneratorConfig::default();
        with_manager(blog_catalog(), &config, |builder| {
            let model = builder.build("public", "users", &[], false).unwrap();

            assert_eq!(model.class_name, "User");
            assert_eq!(model.record_name, "user");
            assert_eq!(model.qualified_name().as_str(), "app.models.User");
            assert_eq!(model.properties.len(), 4);
            assert_eq!(model.properties[0].name, "id");
            assert_eq!(model.properties[0].hint, "int");
            assert_eq!(model.properties[1].hint, "str");
            assert!(model.uses_timestamps);
            assert!(model.increments);
            assert!(!model.needs_table_name());
        });
    }

    #[test]
    fn test_build_unknown_table() {
        let config = GeneratorConfig::default();
        with_manager(blog_catalog(), &config, |builder| {
            let err = builder.build("public", "missing", &[], false).unwrap_err();
            assert!(matches!(err, ModelgenError::UnknownTable { .. }));
        });
    }

    #[test]
    fn test_timestamps_off_without_columns() {
        let config = GeneratorConfig::default();
        with_manager(blog_catalog(), &config, |builder| {
            let model = builder.build("public", "posts", &[], false).unwrap();
            assert!(!model.uses_timestamps);
        });
    }

    #[test]
    fn test_fillable_defaults_exclude_key_and_timestamps() {
        let config = GeneratorConfig::default();
        with_manager(blog_catalog(), &config, |builder| {
            let model = builder.build("public", "users", &[], false).unwrap();
            assert_eq!(model.fillable, vec!["email".to_string()]);
        });
    }

    #[test]
    fn test_casts_and_hidden_resolved_by_pattern() {
        let config: GeneratorConfig = toml::from_str(
            r#"
            [generator]
            hidden = ["*email*"]

            [generator.casts]
            "id" = "int"
            "#,
        )
        .unwrap();

        with_manager(blog_catalog(), &config, |builder| {
            let model = builder.build("public", "users", &[], false).unwrap();
            assert_eq!(model.hidden, vec!["email".to_string()]);
            assert_eq!(model.casts.get("id"), Some(&"int".to_string()));
            assert!(!model.casts.contains_key("email"));
        });
    }

    #[test]
    fn test_outgoing_reference_becomes_belongs_to() {
        let config = GeneratorConfig::default();
        with_manager(blog_catalog(), &config, |builder| {
            let model = builder.build("public", "posts", &[], true).unwrap();

            let user = model
                .relations
                .iter()
                .find(|r| r.name() == "user")
                .expect("posts should belong to user");
            assert!(matches!(user, Relation::BelongsTo { .. }));
        });
    }

    #[test]
    fn test_pivot_yields_many_to_many_and_no_plain_has_many() {
        let config = GeneratorConfig::default();
        with_manager(blog_catalog(), &config, |builder| {
            let posts = builder.build("public", "posts", &[], true).unwrap();

            let tags = posts
                .relations
                .iter()
                .find(|r| r.name() == "tags")
                .expect("posts should reach tags through the pivot");
            assert!(matches!(tags, Relation::BelongsToMany { .. }));
            assert!(
                !posts.has_relation("posts_tags"),
                "no plain has-many into the pivot table"
            );

            let tags_model = builder.build("public", "tags", &[], true).unwrap();
            let posts_rel = tags_model
                .relations
                .iter()
                .find(|r| r.name() == "posts")
                .expect("tags should reach posts through the pivot");
            assert!(matches!(posts_rel, Relation::BelongsToMany { .. }));

            // The junction table keeps both of its belongs-to accessors.
            let pivot = builder.build("public", "posts_tags", &[], true).unwrap();
            assert!(pivot.has_relation("post"));
            assert!(pivot.has_relation("tag"));
        });
    }

    #[test]
    fn test_plain_has_many_for_non_pivot() {
        let config = GeneratorConfig::default();
        with_manager(blog_catalog(), &config, |builder| {
            let users = builder.build("public", "users", &[], true).unwrap();

            let posts = users
                .relations
                .iter()
                .find(|r| r.name() == "posts")
                .expect("users should have many posts");
            assert!(matches!(posts, Relation::HasMany { .. }));
        });
    }

    #[test]
    fn test_column_shadows_relation() {
        // posts has a column literally named "user"; the belongs-to relation
        // of the same name must be dropped.
        let schema = Schema {
            name: "public".to_string(),
            connection: "default".to_string(),
            tables: vec![
                table("users", vec![], vec![]),
                table(
                    "posts",
                    vec![
                        column("user", DataType::Text),
                        column("user_id", DataType::Integer),
                    ],
                    vec![reference("user_id", "users")],
                ),
            ],
        };
        let config = GeneratorConfig::default();

        with_manager(
            FixtureCatalog::new().with_schema(schema),
            &config,
            |builder| {
                let model = builder.build("public", "posts", &[], true).unwrap();
                assert!(!model.has_relation("user"));
                assert!(model.has_property("user"));
            },
        );
    }

    #[test]
    fn test_mutators_apply_in_registration_order() {
        let config = GeneratorConfig::default();
        let mutators: Vec<Mutator> = vec![
            Box::new(|mut model: Model| {
                model.mutations.push(Mutation {
                    name: "full_name".to_string(),
                    body: "\tdef full_name(self):\n\t\treturn self.name".to_string(),
                });
                model
            }),
            Box::new(|mut model: Model| {
                model.per_page = Some(10);
                model
            }),
        ];

        with_manager(blog_catalog(), &config, |builder| {
            let model = builder.build("public", "users", &mutators, false).unwrap();
            assert_eq!(model.mutations.len(), 1);
            assert_eq!(model.mutations[0].name, "full_name");
            assert_eq!(model.per_page, Some(10));
        });
    }

    #[test]
    fn test_namespace_schema_nesting() {
        let config: GeneratorConfig = toml::from_str(
            r#"
            [generator]
            namespace = "app.models"
            namespace_schema = true
            "#,
        )
        .unwrap();

        with_manager(blog_catalog(), &config, |builder| {
            let model = builder.build("public", "users", &[], false).unwrap();
            assert_eq!(model.namespace, "app.models.public");
            assert_eq!(model.qualified_name().as_str(), "app.models.public.User");
            assert_eq!(model.base_namespace(), "app.models.public.base");
        });
    }
}
