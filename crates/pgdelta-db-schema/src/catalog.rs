//! Point-in-time catalog snapshots.

use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};

use crate::objects::{
    Collation, Constraint, EnumType, Extension, Index, Privilege, RlsPolicy, SchemaDef, Sequence,
    Trigger,
};
use crate::selectable::{RelationKind, Selectable};
use crate::SchemaObject;

/// An immutable snapshot of every schema object in a database, keyed by
/// identity per category.
///
/// Build one with the `add_*` methods, call
/// [`resolve_dependencies`](Catalog::resolve_dependencies) once, and
/// treat it as read-only from then on. A diff always consumes exactly
/// two catalogs and never mutates either.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub schemas: IndexMap<String, SchemaDef>,
    pub extensions: IndexMap<String, Extension>,
    pub enums: IndexMap<String, EnumType>,
    pub sequences: IndexMap<String, Sequence>,
    pub constraints: IndexMap<String, Constraint>,
    pub indexes: IndexMap<String, Index>,
    pub privileges: IndexMap<String, Privilege>,
    pub collations: IndexMap<String, Collation>,
    pub rlspolicies: IndexMap<String, RlsPolicy>,
    pub triggers: IndexMap<String, Trigger>,
    /// Tables, views, materialized views, functions and composite
    /// types, all in one dependency graph.
    pub selectables: IndexMap<String, Selectable>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_schema(&mut self, schema: SchemaDef) {
        self.schemas.insert(schema.identity(), schema);
    }

    pub fn add_extension(&mut self, extension: Extension) {
        self.extensions.insert(extension.identity(), extension);
    }

    pub fn add_enum(&mut self, enum_type: EnumType) {
        self.enums.insert(enum_type.identity(), enum_type);
    }

    pub fn add_sequence(&mut self, sequence: Sequence) {
        self.sequences.insert(sequence.identity(), sequence);
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.insert(constraint.identity(), constraint);
    }

    pub fn add_index(&mut self, index: Index) {
        self.indexes.insert(index.identity(), index);
    }

    pub fn add_privilege(&mut self, privilege: Privilege) {
        self.privileges.insert(privilege.identity(), privilege);
    }

    pub fn add_collation(&mut self, collation: Collation) {
        self.collations.insert(collation.identity(), collation);
    }

    pub fn add_rlspolicy(&mut self, policy: RlsPolicy) {
        self.rlspolicies.insert(policy.identity(), policy);
    }

    pub fn add_trigger(&mut self, trigger: Trigger) {
        self.triggers.insert(trigger.identity(), trigger);
    }

    pub fn add_selectable(&mut self, selectable: Selectable) {
        self.selectables.insert(selectable.identity(), selectable);
    }

    fn selectables_of_kind(&self, kinds: &[RelationKind]) -> IndexMap<String, Selectable> {
        self.selectables
            .iter()
            .filter(|(_, v)| kinds.contains(&v.kind))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Plain and partitioned tables.
    pub fn tables(&self) -> IndexMap<String, Selectable> {
        self.selectables_of_kind(&[RelationKind::Table, RelationKind::PartitionedTable])
    }

    /// Views only.
    pub fn views(&self) -> IndexMap<String, Selectable> {
        self.selectables_of_kind(&[RelationKind::View])
    }

    /// Materialized views only.
    pub fn materialized_views(&self) -> IndexMap<String, Selectable> {
        self.selectables_of_kind(&[RelationKind::MaterializedView])
    }

    /// Functions only.
    pub fn functions(&self) -> IndexMap<String, Selectable> {
        self.selectables_of_kind(&[RelationKind::Function])
    }

    /// Composite types only.
    pub fn composite_types(&self) -> IndexMap<String, Selectable> {
        self.selectables_of_kind(&[RelationKind::CompositeType])
    }

    /// Extensions with versions blanked, for version-insensitive diffs.
    pub fn extensions_without_versions(&self) -> IndexMap<String, Extension> {
        self.extensions
            .iter()
            .map(|(k, v)| (k.clone(), v.without_version()))
            .collect()
    }

    /// Fill in the reverse and transitive dependency edges.
    ///
    /// Callers set `dependent_on` when constructing selectables; this
    /// derives `dependents` (symmetric edges) and `dependents_all`
    /// (transitive closure) for the whole graph. Part of snapshot
    /// construction; the catalog is immutable afterwards.
    pub fn resolve_dependencies(&mut self) {
        let mut direct: HashMap<String, Vec<String>> = HashMap::new();
        for (identity, selectable) in &self.selectables {
            for dependency in &selectable.dependent_on {
                direct
                    .entry(dependency.clone())
                    .or_default()
                    .push(identity.clone());
            }
        }

        let identities: Vec<String> = self.selectables.keys().cloned().collect();
        for identity in &identities {
            let dependents = direct.get(identity).cloned().unwrap_or_default();

            // Depth-first walk over the reverse edges gathers every
            // transitive dependent exactly once.
            let mut all: BTreeSet<String> = BTreeSet::new();
            let mut stack: Vec<String> = dependents.clone();
            while let Some(current) = stack.pop() {
                if all.insert(current.clone()) {
                    if let Some(next) = direct.get(&current) {
                        stack.extend(next.iter().cloned());
                    }
                }
            }

            if let Some(selectable) = self.selectables.get_mut(identity) {
                selectable.dependents = dependents;
                selectable.dependents_all = all.into_iter().collect();
            }
        }
    }
}
