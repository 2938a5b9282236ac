//! Relation inference
//!
//! Turns the raw reference graph into named relation descriptors. Direct
//! associations always exist; a table additionally acts as a pivot when its
//! name contains the parent's record name and, after removing that fragment
//! once, the record name of another referenced table as well. The check is
//! purely name-based, with no composite-key requirement, so misclassification
//! is possible and accepted; it only affects generated accessors.

use tracing::{debug, trace};

use crate::codegen::imports::QualifiedName;
use crate::error::ModelgenError;
use crate::meta::{pluralize, Blueprint, Reference};

/// Resolves the target (schema, table) of a reference into emission data
pub type TargetLookup<'a> = dyn FnMut(&str, &str) -> Result<RelationTarget, ModelgenError> + 'a;

/// What a relation needs to know about the model on its far side
#[derive(Debug, Clone, PartialEq)]
pub struct RelationTarget {
    pub class_name: String,
    pub record_name: String,
    pub table: String,
    pub qualified: QualifiedName,
}

/// A named, directional association between two models
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    BelongsTo {
        name: String,
        target: RelationTarget,
        foreign_key: String,
        other_key: String,
    },
    HasOne {
        name: String,
        target: RelationTarget,
        foreign_key: String,
        local_key: String,
    },
    HasMany {
        name: String,
        target: RelationTarget,
        foreign_key: String,
        local_key: String,
    },
    BelongsToMany {
        name: String,
        target: RelationTarget,
        pivot_table: String,
        foreign_pivot_key: String,
        related_pivot_key: String,
    },
}

impl Relation {
    pub fn name(&self) -> &str {
        match self {
            Relation::BelongsTo { name, .. }
            | Relation::HasOne { name, .. }
            | Relation::HasMany { name, .. }
            | Relation::BelongsToMany { name, .. } => name,
        }
    }

    pub fn target(&self) -> &RelationTarget {
        match self {
            Relation::BelongsTo { target, .. }
            | Relation::HasOne { target, .. }
            | Relation::HasMany { target, .. }
            | Relation::BelongsToMany { target, .. } => target,
        }
    }

    /// Docstring type hint for the accessor
    pub fn hint(&self) -> String {
        match self {
            Relation::BelongsTo { target, .. } | Relation::HasOne { target, .. } => {
                target.class_name.clone()
            }
            Relation::HasMany { target, .. } | Relation::BelongsToMany { target, .. } => {
                format!("list[{}]", target.class_name)
            }
        }
    }

    /// Accessor method text, tab-indented one level
    ///
    /// Targets are referenced by dotted path rather than imported so that
    /// generated modules never import each other cyclically.
    pub fn body(&self) -> String {
        match self {
            Relation::BelongsTo {
                name,
                target,
                foreign_key,
                other_key,
            } => format!(
                "\tdef {}(self):\n\t\treturn self.belongs_to(\"{}\", foreign_key=\"{}\", other_key=\"{}\")",
                name, target.qualified, foreign_key, other_key
            ),
            Relation::HasOne {
                name,
                target,
                foreign_key,
                local_key,
            } => format!(
                "\tdef {}(self):\n\t\treturn self.has_one(\"{}\", foreign_key=\"{}\", local_key=\"{}\")",
                name, target.qualified, foreign_key, local_key
            ),
            Relation::HasMany {
                name,
                target,
                foreign_key,
                local_key,
            } => format!(
                "\tdef {}(self):\n\t\treturn self.has_many(\"{}\", foreign_key=\"{}\", local_key=\"{}\")",
                name, target.qualified, foreign_key, local_key
            ),
            Relation::BelongsToMany {
                name,
                target,
                pivot_table,
                foreign_pivot_key,
                related_pivot_key,
            } => format!(
                "\tdef {}(self):\n\t\treturn self.belongs_to_many(\"{}\", through=\"{}\", foreign_pivot_key=\"{}\", related_pivot_key=\"{}\")",
                name, target.qualified, pivot_table, foreign_pivot_key, related_pivot_key
            ),
        }
    }
}

/// Build the direct association for an outgoing reference
pub fn belongs_to(reference: &Reference, target: RelationTarget) -> Relation {
    Relation::BelongsTo {
        name: target.record_name.clone(),
        foreign_key: first(&reference.columns),
        other_key: first(&reference.references),
        target,
    }
}

/// Resolves one incoming reference into relations on the parent model
pub struct ReferenceFactory<'a> {
    /// Record name of the model being built (the reference's target)
    parent_record: &'a str,
    /// The table owning the foreign key
    related: &'a Blueprint,
    reference: &'a Reference,
}

impl<'a> ReferenceFactory<'a> {
    pub fn new(parent_record: &'a str, related: &'a Blueprint, reference: &'a Reference) -> Self {
        Self {
            parent_record,
            related,
            reference,
        }
    }

    /// Produce the relations this reference contributes to the parent
    ///
    /// When pivot partners are found, the many-to-many relations take the
    /// place of the plain has-many into the junction table. Duplicate
    /// relation names keep the first occurrence.
    pub fn make(&self, lookup: &mut TargetLookup) -> Result<Vec<Relation>, ModelgenError> {
        let partners = self.pivot_partners(lookup)?;

        if partners.is_empty() {
            return Ok(vec![self.has_one_or_many(lookup)?]);
        }

        debug!(
            pivot = ?self.related.table,
            parent = ?self.parent_record,
            partners = partners.len(),
            "Classified table as pivot"
        );

        let mut relations: Vec<Relation> = Vec::new();
        for (other, partner) in partners {
            let name = pluralize(&partner.record_name);
            if relations.iter().any(|r| r.name() == name) {
                trace!(relation = ?name, "Skipping duplicate pivot partner");
                continue;
            }
            relations.push(Relation::BelongsToMany {
                name,
                target: partner,
                pivot_table: self.related.table.clone(),
                foreign_pivot_key: first(&self.reference.columns),
                related_pivot_key: first(&other.columns),
            });
        }
        Ok(relations)
    }

    /// Candidate pivot partners for the referencing table
    ///
    /// The table name must contain the parent's record name; the fragment is
    /// removed once and every other outgoing reference whose target record
    /// name appears in the remainder qualifies, in declaration order.
    fn pivot_partners(
        &self,
        lookup: &mut TargetLookup,
    ) -> Result<Vec<(Reference, RelationTarget)>, ModelgenError> {
        let pivot = &self.related.table;
        if !pivot.contains(self.parent_record) {
            return Ok(Vec::new());
        }

        let remainder = pivot.replacen(self.parent_record, "", 1);

        let mut partners = Vec::new();
        for other in &self.related.references {
            if other == self.reference {
                continue;
            }

            let target = lookup(&other.on.0, &other.on.1)?;
            if remainder.contains(&target.record_name) {
                partners.push((other.clone(), target));
            }
        }
        Ok(partners)
    }

    fn has_one_or_many(&self, lookup: &mut TargetLookup) -> Result<Relation, ModelgenError> {
        let target = lookup(&self.related.schema, &self.related.table)?;
        let foreign_key = first(&self.reference.columns);
        let local_key = first(&self.reference.references);

        if self.related.is_unique_key(&self.reference.columns) {
            Ok(Relation::HasOne {
                name: target.record_name.clone(),
                target,
                foreign_key,
                local_key,
            })
        } else {
            Ok(Relation::HasMany {
                name: self.related.table.clone(),
                target,
                foreign_key,
                local_key,
            })
        }
    }
}

fn first(columns: &[String]) -> String {
    columns.first().cloned().unwrap_or_default()
}
