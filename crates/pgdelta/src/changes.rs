//! Category-level change generation.
//!
//! Tables, enums, triggers and the rest each need their own migration
//! strategy layered on top of the generic planner. The [`Changes`]
//! facade at the bottom binds a pair of catalogs and hands out
//! per-category statement generators with the right strategy baked in.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use tracing::debug;

use pgdelta_db_schema::{
    Catalog, Column, Constraint, EnumType, Index, RelationKind, SchemaObject, Selectable,
    Sequence, Trigger,
};

use crate::diff::{Differences, ModifiedPair, differences};
use crate::error::Result;
use crate::planner::{PlanOptions, statements_from_differences};
use crate::statements::Statements;

const OLD_ENUM_SUFFIX: &str = "__old_version_to_be_dropped";
const PK: &str = "PRIMARY KEY";

/// Statements for replacing modified enum types.
///
/// Postgres cannot remove or reorder enum values in place, so a changed
/// enum is renamed aside, recreated under its original name, every
/// column using it recast through `text`, and the renamed old version
/// dropped. Returned as a (pre, post) pair so table creation can happen
/// in between: new tables may already reference the new enum version.
pub fn enum_modifications(
    tables_from: &IndexMap<String, Selectable>,
    tables_target: &IndexMap<String, Selectable>,
    enums_from: &IndexMap<String, EnumType>,
    enums_target: &IndexMap<String, EnumType>,
) -> (Statements, Statements) {
    let enum_diff = differences(enums_from, enums_target);
    let table_diff = differences(tables_from, tables_target);

    let mut pre = Statements::new();
    let mut recreate = Statements::new();
    let mut post = Statements::new();

    for (table_key, pair) in &table_diff.modified {
        let column_diff = differences(&pair.from.columns, &pair.target.columns);
        for (name, column) in &column_diff.modified {
            let before = &column.from;
            let column = &column.target;

            if !(column.is_enum && before.is_enum)
                || column.dbtypestr != before.dbtypestr
                || column.enum_values == before.enum_values
            {
                continue;
            }

            debug!(table = %table_key, column = %name, "recasting enum column");
            let has_default = column.default.is_some() && !column.is_generated;

            if has_default {
                pre.push(before.drop_default_statement(table_key));
            }

            recreate.push(column.change_enum_statement(&pair.target.quoted_full_name()));

            if has_default {
                if let Some(statement) = before.add_default_statement(table_key) {
                    post.push(statement);
                }
            }
        }
    }

    for pair in enum_diff.modified.values() {
        let e = &pair.target;
        let unwanted_name = format!("{}{}", e.name, OLD_ENUM_SUFFIX);

        pre.push(e.alter_rename_statement(&unwanted_name));
        pre.push(e.create_statement());
        post.push(e.drop_statement_with_rename(&unwanted_name));
    }

    (pre, recreate + post)
}

fn column_promotions(column_diff: &mut Differences<Column>) {
    let keys: Vec<String> = column_diff.modified.keys().cloned().collect();
    for key in keys {
        let Some(pair) = column_diff.modified.get(&key) else {
            continue;
        };
        let column = &pair.target;
        let before = &pair.from;

        // Generated state cannot be altered into or out of, except for
        // removal on servers that support `drop expression`, so those
        // transitions (and inheritance changes) become drop+add.
        let generated_status_changed = column.is_generated != before.is_generated;
        let inheritance_status_changed = column.is_inherited != before.is_inherited;
        let generated_status_removed = !column.is_generated && before.is_generated;
        let can_drop_generated = generated_status_removed && before.can_drop_generated;

        let drop_and_recreate_required =
            inheritance_status_changed || (generated_status_changed && !can_drop_generated);

        if drop_and_recreate_required {
            let Some(pair) = column_diff.modified.shift_remove(&key) else {
                continue;
            };
            if !pair.from.is_inherited {
                column_diff.removed.insert(key.clone(), pair.from);
            }
            if !pair.target.is_inherited {
                column_diff.added.insert(key.clone(), pair.target);
            }
        }
    }
}

/// Statements migrating the table population, including the enum dance
/// and sequence ownership changes.
pub fn table_changes(
    tables_from: &IndexMap<String, Selectable>,
    tables_target: &IndexMap<String, Selectable>,
    enums_from: &IndexMap<String, EnumType>,
    enums_target: &IndexMap<String, EnumType>,
    sequences_from: &IndexMap<String, Sequence>,
    sequences_target: &IndexMap<String, Sequence>,
) -> Statements {
    let diff = differences(tables_from, tables_target);

    let mut statements = Statements::new();
    for table in diff.removed.values() {
        statements.push(table.drop_statement());
    }

    let (enums_pre, enums_post) =
        enum_modifications(tables_from, tables_target, enums_from, enums_target);

    statements += enums_pre;

    for table in diff.added.values() {
        statements.push(table.create_statement());
        if table.rowsecurity {
            statements.push(table.alter_rls_statement());
        }
    }

    statements += enums_post;

    for pair in diff.modified.values() {
        let table = &pair.target;
        let before = &pair.from;

        // Partitioning cannot be toggled in place.
        if table.is_partitioned() != before.is_partitioned() {
            statements.push(table.drop_statement());
            statements.push(table.create_statement());
            continue;
        }

        if table.is_unlogged != before.is_unlogged {
            statements.push(table.alter_unlogged_statement());
        }

        if table.parent_table != before.parent_table {
            statements.extend(table.attach_detach_statements(before));
        }
    }

    // Inheritance children go last so parents give up their columns
    // first; the sort is stable so everything else keeps map order.
    let mut modified_order: Vec<&String> = diff.modified.keys().collect();
    modified_order.sort_by_key(|k| diff.modified[*k].target.is_inheritance_child_table);

    for table_key in modified_order {
        let pair = &diff.modified[table_key];
        let table = &pair.target;
        let before = &pair.from;

        if !table.is_alterable {
            continue;
        }

        let mut column_diff = differences(&before.columns, &table.columns);
        column_promotions(&mut column_diff);

        for column in column_diff.removed.values() {
            statements.push(table.alter_table_statement(&column.drop_column_clause()));
        }
        for column in column_diff.added.values() {
            statements.push(table.alter_table_statement(&column.add_column_clause()));
        }
        for column in column_diff.modified.values() {
            statements.extend(column.target.alter_table_statements(&column.from, table_key));
        }

        if table.rowsecurity != before.rowsecurity {
            statements.push(table.alter_rls_statement());
        }

        if table.comment != before.comment {
            statements.extend(before.comment_alter_statements(table));
        }
    }

    let sequence_diff = differences(sequences_from, sequences_target);
    for sequence in sequence_diff.added.values() {
        if !sequence.quoted_table_and_column_name().is_empty() {
            statements.push(sequence.alter_ownership_statement());
        }
    }
    for pair in sequence_diff.modified.values() {
        if pair.from.quoted_table_and_column_name() != pair.target.quoted_table_and_column_name() {
            statements.push(pair.target.alter_ownership_statement());
        }
    }

    statements
}

/// Tables and non-tables diffed separately, with replaceability and
/// forced recreations resolved across the dependency graph.
#[derive(Debug, Clone)]
pub struct SelectableDifferences {
    /// Tables (plain and partitioned) in the source snapshot.
    pub tables_from: IndexMap<String, Selectable>,
    /// Tables in the target snapshot.
    pub tables_target: IndexMap<String, Selectable>,
    /// Diff of everything that is not a table. `modified` includes
    /// unmodified objects forced to recreate because something they
    /// depend on is changing; it is sorted by identity.
    pub other: Differences<Selectable>,
    /// Modified non-tables that can be swapped in place.
    pub replaceable: BTreeSet<String>,
}

/// Split and diff the selectable graph.
///
/// An object is replaceable when its new version can take over in place
/// (`create or replace`), it is not a table, and none of the enums it
/// depends on is changing (the enum dance invalidates it regardless).
/// Anything downstream of a non-replaceable change or a removal is
/// forced into the modified bucket and pinned as not replaceable.
pub fn selectable_differences(
    selectables_from: &IndexMap<String, Selectable>,
    selectables_target: &IndexMap<String, Selectable>,
    enums_from: &IndexMap<String, EnumType>,
    enums_target: &IndexMap<String, EnumType>,
) -> SelectableDifferences {
    let partition = |map: &IndexMap<String, Selectable>, want_table: bool| {
        map.iter()
            .filter(|(_, v)| v.is_table() == want_table)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<IndexMap<String, Selectable>>()
    };

    let tables_from = partition(selectables_from, true);
    let tables_target = partition(selectables_target, true);
    let other_from = partition(selectables_from, false);
    let other_target = partition(selectables_target, false);

    let tables = differences(&tables_from, &tables_target);
    let mut other = differences(&other_from, &other_target);

    let enum_diff = differences(enums_from, enums_target);

    let mut replaceable: BTreeSet<String> = BTreeSet::new();
    let mut not_replaceable: BTreeSet<String> = BTreeSet::new();

    // (key, new version, old version, is_modified) over every changed
    // selectable, tables and non-tables alike.
    let changed: Vec<(&String, &Selectable, &Selectable, bool)> = tables
        .modified
        .iter()
        .chain(other.modified.iter())
        .map(|(k, pair)| (k, &pair.target, &pair.from, true))
        .chain(
            tables
                .removed
                .iter()
                .chain(other.removed.iter())
                .map(|(k, v)| (k, v, v, false)),
        )
        .collect();

    let mut forced: Vec<String> = Vec::new();
    for (key, new, old, is_modified) in changed {
        if is_modified && new.can_replace(old) {
            if !new.is_table() {
                let enum_dependency_changed = new
                    .dependent_on
                    .iter()
                    .any(|d| enum_diff.modified.contains_key(d));
                if !enum_dependency_changed {
                    replaceable.insert(key.clone());
                }
            }
            continue;
        }

        for dependent in &new.dependents_all {
            forced.push(dependent.clone());
            not_replaceable.insert(dependent.clone());
        }
    }

    for dependent in forced {
        if let Some(unchanged) = other.unmodified.shift_remove(&dependent) {
            debug!(selectable = %dependent, "forcing recreation of dependent");
            other.modified.insert(
                dependent,
                ModifiedPair {
                    from: unchanged.clone(),
                    target: unchanged,
                },
            );
        }
    }
    other.modified.sort_keys();

    for key in &not_replaceable {
        replaceable.remove(key);
    }

    SelectableDifferences {
        tables_from,
        tables_target,
        other,
        replaceable,
    }
}

/// Statements for triggers, treating a trigger as modified whenever the
/// selectable it hangs off is being dropped and recreated.
pub fn trigger_changes(
    triggers_from: &IndexMap<String, Trigger>,
    triggers_target: &IndexMap<String, Trigger>,
    selectables_from: &IndexMap<String, Selectable>,
    selectables_target: &IndexMap<String, Selectable>,
    enums_from: &IndexMap<String, EnumType>,
    enums_target: &IndexMap<String, EnumType>,
    options: &PlanOptions,
) -> Result<Statements> {
    let sd = selectable_differences(
        selectables_from,
        selectables_target,
        enums_from,
        enums_target,
    );

    let mut diff = differences(triggers_from, triggers_target);

    let recreating: BTreeSet<&String> = sd.other.modified.keys().collect();
    let forced: Vec<String> = diff
        .unmodified
        .iter()
        .filter(|(_, v)| {
            let owner = v.quoted_full_selectable_name();
            recreating.contains(&owner) && !sd.replaceable.contains(&owner)
        })
        .map(|(k, _)| k.clone())
        .collect();

    for key in forced {
        if let Some(trigger) = diff.unmodified.shift_remove(&key) {
            diff.modified.insert(
                key,
                ModifiedPair {
                    from: trigger.clone(),
                    target: trigger,
                },
            );
        }
    }

    statements_from_differences(&diff, options, None)
}

/// Phase restriction flags for [`selectable_changes`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectableOptions {
    /// Emit table changes only.
    pub tables_only: bool,
    /// Emit non-table changes only.
    pub non_tables_only: bool,
    /// Emit the drop phase only.
    pub drops_only: bool,
    /// Emit the creation phase only.
    pub creations_only: bool,
}

fn any_function(map: &IndexMap<String, Selectable>) -> bool {
    map.values().any(|v| v.kind == RelationKind::Function)
}

fn any_modified_function(map: &IndexMap<String, ModifiedPair<Selectable>>) -> bool {
    map.values()
        .any(|pair| pair.target.kind == RelationKind::Function)
}

/// Statements for the whole selectable graph: drop invalidated
/// non-tables, migrate tables (with the enum dance inside), then
/// recreate the non-tables in dependency order.
pub fn selectable_changes(
    selectables_from: &IndexMap<String, Selectable>,
    selectables_target: &IndexMap<String, Selectable>,
    enums_from: &IndexMap<String, EnumType>,
    enums_target: &IndexMap<String, EnumType>,
    sequences_from: &IndexMap<String, Sequence>,
    sequences_target: &IndexMap<String, Sequence>,
    options: SelectableOptions,
) -> Result<Statements> {
    let sd = selectable_differences(
        selectables_from,
        selectables_target,
        enums_from,
        enums_target,
    );

    let mut other = sd.other;
    // Composite types are migrated by their own category, as alters.
    other
        .added
        .retain(|_, v| v.kind != RelationKind::CompositeType);
    other
        .removed
        .retain(|_, v| v.kind != RelationKind::CompositeType);
    other
        .modified
        .retain(|_, pair| pair.target.kind != RelationKind::CompositeType);

    let mut statements = Statements::new();

    if !options.tables_only && !options.creations_only {
        statements += statements_from_differences(
            &other,
            &PlanOptions {
                drops_only: true,
                dependency_ordering: true,
                modifications: true,
                ..PlanOptions::default()
            },
            Some(&sd.replaceable),
        )?;
    }

    if !options.non_tables_only {
        statements += table_changes(
            &sd.tables_from,
            &sd.tables_target,
            enums_from,
            enums_target,
            sequences_from,
            sequences_target,
        );
    }

    if !options.tables_only && !options.drops_only {
        if any_function(&other.added) || any_modified_function(&other.modified) {
            statements.push("set check_function_bodies = off;");
        }

        statements += statements_from_differences(
            &other,
            &PlanOptions {
                creations_only: true,
                dependency_ordering: true,
                modifications: true,
                ..PlanOptions::default()
            },
            Some(&sd.replaceable),
        )?;

        for selectable in other.added.values() {
            if let Some(statement) = selectable.comment_statement() {
                statements.push(statement);
            }
        }
        for pair in other.modified.values() {
            statements.extend(pair.from.comment_alter_statements(&pair.target));
        }
    }

    Ok(statements)
}

fn sorted<T: Clone>(map: &IndexMap<String, T>) -> IndexMap<String, T> {
    let mut map = map.clone();
    map.sort_keys();
    map
}

fn plain<T: SchemaObject>(
    from: &IndexMap<String, T>,
    target: &IndexMap<String, T>,
    options: &PlanOptions,
) -> Result<Statements> {
    let diff = differences(from, target);
    statements_from_differences(&diff, options, None)
}

/// Category tags recognized by the facade.
///
/// Each tag dispatches to a pure function of the two snapshots and the
/// mode flags, so every entry point can be exercised on its own
/// without going through [`Changes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Schemas,
    Extensions,
    Collations,
    Enums,
    Sequences,
    Constraints,
    Functions,
    Views,
    Indexes,
    Privileges,
    Rlspolicies,
    Triggers,
    Types,
    /// Tables, views, materialized views and functions as one
    /// dependency-aware pass.
    Selectables,
}

impl Category {
    /// Statements for this category's diff between two catalogs.
    ///
    /// For [`Category::Selectables`], the `drops_only` and
    /// `creations_only` flags select the corresponding phase; the
    /// remaining planner flags are owned by the internal phases.
    pub fn statements(
        self,
        from: &Catalog,
        target: &Catalog,
        options: &PlanOptions,
    ) -> Result<Statements> {
        match self {
            Category::Schemas => plain(&from.schemas, &target.schemas, options),
            Category::Extensions => plain(
                &from.extensions,
                &target.extensions,
                &PlanOptions {
                    modifications_as_alters: true,
                    ..options.clone()
                },
            ),
            Category::Collations => plain(&from.collations, &target.collations, options),
            Category::Enums => plain(&from.enums, &target.enums, options),
            Category::Sequences => plain(
                &from.sequences,
                &target.sequences,
                &PlanOptions {
                    modifications: false,
                    ..options.clone()
                },
            ),
            Category::Constraints => plain(&from.constraints, &target.constraints, options),
            Category::Functions => plain(&from.functions(), &target.functions(), options),
            Category::Views => plain(&from.views(), &target.views(), options),
            Category::Indexes => plain(&from.indexes, &target.indexes, options),
            Category::Privileges => plain(&from.privileges, &target.privileges, options),
            Category::Rlspolicies => plain(&from.rlspolicies, &target.rlspolicies, options),
            Category::Triggers => trigger_changes(
                &sorted(&from.triggers),
                &sorted(&target.triggers),
                &sorted(&from.selectables),
                &sorted(&target.selectables),
                &from.enums,
                &target.enums,
                options,
            ),
            Category::Types => plain(
                &from.composite_types(),
                &target.composite_types(),
                &PlanOptions {
                    modifications_as_alters: true,
                    ..options.clone()
                },
            ),
            Category::Selectables => selectable_changes(
                &sorted(&from.selectables),
                &sorted(&target.selectables),
                &from.enums,
                &target.enums,
                &from.sequences,
                &target.sequences,
                SelectableOptions {
                    drops_only: options.drops_only,
                    creations_only: options.creations_only,
                    ..SelectableOptions::default()
                },
            ),
        }
    }
}

fn filtered<T: Clone>(
    map: &IndexMap<String, T>,
    mut keep: impl FnMut(&T) -> bool,
) -> IndexMap<String, T> {
    map.iter()
        .filter(|(_, v)| keep(v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Per-category change generation for a pair of catalogs.
///
/// Each method diffs one category with that category's migration
/// strategy baked in (sequences never modify in place, types alter,
/// extensions alter or ignore versions, and so on). Phase flags are
/// passed per call so a composer can interleave phases across
/// categories.
pub struct Changes<'a> {
    from: &'a Catalog,
    target: &'a Catalog,
    ignore_extension_versions: bool,
}

impl<'a> Changes<'a> {
    pub fn new(from: &'a Catalog, target: &'a Catalog) -> Self {
        Self {
            from,
            target,
            ignore_extension_versions: false,
        }
    }

    /// Ignore version differences between installed extensions.
    pub fn ignore_extension_versions(mut self, ignore: bool) -> Self {
        self.ignore_extension_versions = ignore;
        self
    }

    fn category(&self, category: Category, options: &PlanOptions) -> Result<Statements> {
        category.statements(self.from, self.target, options)
    }

    pub fn schemas(&self, options: &PlanOptions) -> Result<Statements> {
        self.category(Category::Schemas, options)
    }

    pub fn extensions(&self, options: &PlanOptions) -> Result<Statements> {
        if self.ignore_extension_versions {
            let from = self.from.extensions_without_versions();
            let target = self.target.extensions_without_versions();
            let options = PlanOptions {
                modifications: false,
                modifications_as_alters: false,
                ..options.clone()
            };
            plain(&from, &target, &options)
        } else {
            self.category(Category::Extensions, options)
        }
    }

    pub fn collations(&self, options: &PlanOptions) -> Result<Statements> {
        self.category(Category::Collations, options)
    }

    pub fn enums(&self, options: &PlanOptions) -> Result<Statements> {
        self.category(Category::Enums, options)
    }

    /// Sequences are never dropped and recreated for a modification;
    /// value changes are not schema changes.
    pub fn sequences(&self, options: &PlanOptions) -> Result<Statements> {
        self.category(Category::Sequences, options)
    }

    /// Composite types evolve attribute by attribute.
    pub fn types(&self, options: &PlanOptions) -> Result<Statements> {
        self.category(Category::Types, options)
    }

    pub fn privileges(&self, options: &PlanOptions) -> Result<Statements> {
        self.category(Category::Privileges, options)
    }

    pub fn rlspolicies(&self, options: &PlanOptions) -> Result<Statements> {
        self.category(Category::Rlspolicies, options)
    }

    pub fn pk_constraints(&self, options: &PlanOptions) -> Result<Statements> {
        let keep = |c: &Constraint| c.constraint_type == PK;
        plain(
            &filtered(&self.from.constraints, keep),
            &filtered(&self.target.constraints, keep),
            options,
        )
    }

    pub fn non_pk_constraints(&self, options: &PlanOptions) -> Result<Statements> {
        let keep = |c: &Constraint| c.constraint_type != PK;
        plain(
            &filtered(&self.from.constraints, keep),
            &filtered(&self.target.constraints, keep),
            options,
        )
    }

    fn indexes_split(
        &self,
        on_materialized_view: bool,
    ) -> (IndexMap<String, Index>, IndexMap<String, Index>) {
        let split = |catalog: &Catalog| {
            let mvs = catalog.materialized_views();
            filtered(&catalog.indexes, |i: &Index| {
                mvs.contains_key(&i.quoted_table_identity()) == on_materialized_view
            })
        };
        (split(self.from), split(self.target))
    }

    /// Indexes on materialized views, which must be recreated after the
    /// view itself.
    pub fn mv_indexes(&self, options: &PlanOptions) -> Result<Statements> {
        let (from, target) = self.indexes_split(true);
        plain(&from, &target, options)
    }

    pub fn non_mv_indexes(&self, options: &PlanOptions) -> Result<Statements> {
        let (from, target) = self.indexes_split(false);
        plain(&from, &target, options)
    }

    pub fn triggers(&self, options: &PlanOptions) -> Result<Statements> {
        self.category(Category::Triggers, options)
    }

    fn selectable_phase(&self, options: SelectableOptions) -> Result<Statements> {
        selectable_changes(
            &sorted(&self.from.selectables),
            &sorted(&self.target.selectables),
            &self.from.enums,
            &self.target.enums,
            &self.from.sequences,
            &self.target.sequences,
            options,
        )
    }

    /// The complete selectable migration in one pass.
    pub fn selectables(&self) -> Result<Statements> {
        self.selectable_phase(SelectableOptions::default())
    }

    /// Table changes only (the enum dance included).
    pub fn tables_only_selectables(&self) -> Result<Statements> {
        self.selectable_phase(SelectableOptions {
            tables_only: true,
            ..SelectableOptions::default()
        })
    }

    /// The drop phase for views, materialized views and functions.
    pub fn non_table_selectable_drops(&self) -> Result<Statements> {
        self.selectable_phase(SelectableOptions {
            non_tables_only: true,
            drops_only: true,
            ..SelectableOptions::default()
        })
    }

    /// The creation phase for views, materialized views and functions.
    pub fn non_table_selectable_creations(&self) -> Result<Statements> {
        self.selectable_phase(SelectableOptions {
            non_tables_only: true,
            creations_only: true,
            ..SelectableOptions::default()
        })
    }
}
