//! Assembling category changes into one ordered migration script.

use pgdelta_db_schema::Catalog;
use tracing::debug;

use crate::changes::Changes;
use crate::error::{Error, Result};
use crate::planner::PlanOptions;
use crate::statements::Statements;

/// A migration script under construction.
///
/// [`add_all_changes`](Migration::add_all_changes) interleaves the
/// per-category phases in an order that satisfies cross-category
/// dependencies: supporting objects are created up front, dependents
/// are cleared before the selectable graph is reworked, and recreated
/// afterwards. Nothing here talks to a database; the output is text.
pub struct Migration<'a> {
    changes: Changes<'a>,
    /// Statements accumulated so far, in emission order.
    pub statements: Statements,
    safety_on: bool,
}

impl<'a> Migration<'a> {
    pub fn new(from: &'a Catalog, target: &'a Catalog) -> Self {
        Self {
            changes: Changes::new(from, target),
            statements: Statements::new(),
            safety_on: true,
        }
    }

    /// Ignore version differences between installed extensions.
    pub fn ignore_extension_versions(mut self, ignore: bool) -> Self {
        self.changes = self.changes.ignore_extension_versions(ignore);
        self
    }

    /// With safety on (the default), [`sql`](Migration::sql) refuses to
    /// render a script containing drop statements.
    pub fn set_safety(&mut self, on: bool) {
        self.safety_on = on;
    }

    pub fn add(&mut self, statements: Statements) {
        self.statements += statements;
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Add extension creations and, optionally, drops. Useful on its
    /// own when preparing a database before a full sync.
    pub fn add_extension_changes(&mut self, creations: bool, drops: bool) -> Result<()> {
        if creations {
            let statements = self.changes.extensions(&creations_only())?;
            self.add(statements);
        }
        if drops {
            let statements = self.changes.extensions(&drops_only())?;
            self.add(statements);
        }
        Ok(())
    }

    /// Add every change needed to turn the source catalog into the
    /// target, in dependency-safe order.
    pub fn add_all_changes(&mut self, with_privileges: bool) -> Result<()> {
        debug!(with_privileges, "building full migration");

        self.add(self.changes.schemas(&creations_only())?);
        self.add(self.changes.extensions(&creations_only())?);
        self.add(self.changes.collations(&creations_only())?);
        self.add(self.changes.enums(&PlanOptions {
            creations_only: true,
            ..PlanOptions::default()
        })?);
        self.add(self.changes.sequences(&creations_only())?);

        // Everything hanging off a selectable goes away before the
        // selectable graph itself is touched.
        self.add(self.changes.triggers(&drops_only())?);
        self.add(self.changes.rlspolicies(&drops_only())?);
        if with_privileges {
            self.add(self.changes.privileges(&drops_only())?);
        }
        self.add(self.changes.non_pk_constraints(&drops_only())?);
        self.add(self.changes.mv_indexes(&drops_only())?);
        self.add(self.changes.non_mv_indexes(&drops_only())?);

        self.add(self.changes.selectables()?);

        self.add(self.changes.sequences(&drops_only())?);
        self.add(self.changes.enums(&PlanOptions {
            drops_only: true,
            ..PlanOptions::default()
        })?);
        self.add(self.changes.extensions(&drops_only())?);
        self.add(self.changes.types(&PlanOptions::full())?);

        self.add(self.changes.pk_constraints(&PlanOptions::full())?);
        self.add(self.changes.non_pk_constraints(&creations_only())?);
        self.add(self.changes.mv_indexes(&creations_only())?);
        self.add(self.changes.non_mv_indexes(&creations_only())?);
        self.add(self.changes.triggers(&creations_only())?);
        self.add(self.changes.rlspolicies(&creations_only())?);
        if with_privileges {
            self.add(self.changes.privileges(&creations_only())?);
        }

        self.add(self.changes.schemas(&drops_only())?);
        self.add(self.changes.collations(&drops_only())?);

        Ok(())
    }

    /// Render the script, refusing destructive output while safety is
    /// on.
    pub fn sql(&self) -> Result<String> {
        if self.safety_on && self.statements.contains_drop() {
            return Err(Error::UnsafeMigration);
        }
        Ok(self.statements.sql())
    }
}

fn creations_only() -> PlanOptions {
    PlanOptions {
        creations_only: true,
        ..PlanOptions::full()
    }
}

fn drops_only() -> PlanOptions {
    PlanOptions {
        drops_only: true,
        ..PlanOptions::full()
    }
}
