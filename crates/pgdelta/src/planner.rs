//! Dependency-aware statement emission.
//!
//! [`statements_from_differences`] turns a diffed object category into
//! DDL. Without dependency ordering this is a single deterministic
//! pass; with it, emission runs as a fixed-point loop over pending
//! drop/create sets, holding each statement back until nothing that
//! blocks it is still pending.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use tracing::debug;

use pgdelta_db_schema::SchemaObject;

use crate::diff::{Differences, differences};
use crate::error::{Error, Result};
use crate::statements::Statements;

/// Flags controlling which phases of a category diff are emitted.
///
/// The `*_only` flags restrict a call to one phase so that callers can
/// interleave phases of different categories (drop all the views before
/// touching tables, recreate them after). `modifications_as_alters`
/// switches modified objects from drop+recreate to in-place ALTER.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Emit only creations (plus modified recreations).
    pub creations_only: bool,
    /// Emit only drops (plus modified drops).
    pub drops_only: bool,
    /// Emit only modifications.
    pub modifications_only: bool,
    /// Process modified objects at all.
    pub modifications: bool,
    /// Modified objects become ALTER statements instead of
    /// drop+recreate.
    pub modifications_as_alters: bool,
    /// Hold statements back until their dependency edges clear.
    pub dependency_ordering: bool,
}

impl PlanOptions {
    /// Everything enabled, modifications as drop+recreate.
    pub fn full() -> Self {
        Self {
            modifications: true,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.creations_only && self.drops_only {
            return Err(Error::ConflictingOptions(
                "creations_only and drops_only cannot be combined",
            ));
        }
        Ok(())
    }
}

/// Diff two maps and emit statements for the result in one step.
pub fn statements_for_changes<T: SchemaObject>(
    things_from: &IndexMap<String, T>,
    things_target: &IndexMap<String, T>,
    options: &PlanOptions,
) -> Result<Statements> {
    let diff = differences(things_from, things_target);
    statements_from_differences(&diff, options, None)
}

fn blocked_by_dependents<T: SchemaObject>(
    value: &T,
    pending_drops: &BTreeSet<String>,
    dependency_ordering: bool,
) -> bool {
    dependency_ordering
        && value
            .dependents()
            .iter()
            .any(|d| pending_drops.contains(d))
}

fn blocked_by_dependencies<T: SchemaObject>(
    value: &T,
    pending_creations: &BTreeSet<String>,
    dependency_ordering: bool,
) -> bool {
    dependency_ordering
        && value
            .dependent_on()
            .iter()
            .any(|d| pending_creations.contains(d))
}

fn create_or_safer<T: SchemaObject>(value: &T, statements: &mut Statements) {
    match value.safer_create_statements() {
        Some(safer) => statements.extend(safer),
        None => statements.push(value.create_statement()),
    }
}

/// Emit DDL for one diffed category.
///
/// `replaceable` names modified objects that can be swapped in place
/// (`create or replace`) without dropping; it only matters for the
/// selectable phases and is `None` everywhere else.
pub fn statements_from_differences<T: SchemaObject>(
    diff: &Differences<T>,
    options: &PlanOptions,
    replaceable: Option<&BTreeSet<String>>,
) -> Result<Statements> {
    options.validate()?;

    let empty = BTreeSet::new();
    let replaceable = replaceable.unwrap_or(&empty);

    let added = &diff.added;
    let removed = &diff.removed;
    let modified = &diff.modified;

    let mut statements = Statements::new();
    let mut pending_creations: BTreeSet<String> = BTreeSet::new();
    let mut pending_drops: BTreeSet<String> = BTreeSet::new();

    let creations = !(options.drops_only || options.modifications_only);
    let drops = !(options.creations_only || options.modifications_only);
    let modifications = options.modifications
        || (options.modifications_only && !(options.creations_only || options.drops_only));

    let drop_and_recreate = modifications && !options.modifications_as_alters;
    let alters = modifications && options.modifications_as_alters;

    let not_replaceable_modified = || {
        modified
            .keys()
            .filter(|k| !replaceable.contains(*k))
            .cloned()
    };

    if drops {
        pending_drops.extend(removed.keys().cloned());
        // In a drops-only phase, modified objects that cannot be
        // replaced in place are dropped here and recreated later by a
        // matching creations-only phase.
        if options.drops_only && drop_and_recreate {
            pending_drops.extend(not_replaceable_modified());
        }
    }

    if creations {
        pending_creations.extend(added.keys().cloned());
        if options.creations_only && drop_and_recreate {
            pending_creations.extend(not_replaceable_modified());
        }
    }

    if drop_and_recreate && !options.drops_only && !options.creations_only {
        if drops {
            pending_drops.extend(not_replaceable_modified());
        }
        if creations {
            pending_creations.extend(modified.keys().cloned());
        }
    }

    if alters
        && !(options.drops_only && !options.modifications_only)
        && !(options.creations_only && !options.modifications_only)
    {
        for pair in modified.values() {
            statements.extend(pair.target.alter_statements(&pair.from));
        }
    }

    // Replaceable modified objects in a creations-only phase need no
    // ordering at all: swap them in place up front.
    if options.creations_only && drop_and_recreate {
        for (key, pair) in modified {
            if replaceable.contains(key) {
                create_or_safer(&pair.target, &mut statements);
            }
        }
    }

    loop {
        let before = pending_drops.len() + pending_creations.len();

        if drops {
            for (key, value) in removed {
                if !blocked_by_dependents(value, &pending_drops, options.dependency_ordering)
                    && pending_drops.remove(key)
                {
                    statements.push(value.drop_statement());
                }
            }
            if options.drops_only {
                for (key, pair) in modified {
                    if !blocked_by_dependents(
                        &pair.target,
                        &pending_drops,
                        options.dependency_ordering,
                    ) && pending_drops.remove(key)
                    {
                        statements.push(pair.from.drop_statement());
                    }
                }
            }
        }

        if creations {
            for (key, value) in added {
                if !blocked_by_dependencies(value, &pending_creations, options.dependency_ordering)
                    && pending_creations.remove(key)
                {
                    create_or_safer(value, &mut statements);
                }
            }
            if options.creations_only {
                for (key, pair) in modified {
                    if !blocked_by_dependencies(
                        &pair.target,
                        &pending_creations,
                        options.dependency_ordering,
                    ) && pending_creations.remove(key)
                    {
                        create_or_safer(&pair.target, &mut statements);
                    }
                }
            }
        }

        if modifications {
            for (key, pair) in modified {
                if drops
                    && !blocked_by_dependents(
                        &pair.target,
                        &pending_drops,
                        options.dependency_ordering,
                    )
                    && pending_drops.remove(key)
                {
                    statements.push(pair.from.drop_statement());
                }
                if creations
                    && !blocked_by_dependencies(
                        &pair.target,
                        &pending_creations,
                        options.dependency_ordering,
                    )
                    && pending_creations.remove(key)
                {
                    create_or_safer(&pair.target, &mut statements);
                }
            }
        }

        let after = pending_drops.len() + pending_creations.len();
        if after == 0 {
            break;
        }
        if after == before {
            let pending: Vec<String> = pending_drops
                .union(&pending_creations)
                .cloned()
                .collect();
            debug!(?pending, "no progress in dependency-ordered emission");
            return Err(Error::DependencyCycle { pending });
        }
    }

    Ok(statements)
}
