//! Declarative schema migration generation for PostgreSQL.
//!
//! Given two [`Catalog`] snapshots, this crate computes the DDL that
//! turns the first into the second. The pipeline is: diff each object
//! category by identity ([`diff`]), decide each category's migration
//! strategy ([`changes`]), emit statements in dependency order
//! ([`planner`]), and compose the categories into one script
//! ([`Migration`]).
//!
//! ```
//! use pgdelta::Migration;
//! use pgdelta_db_schema::{Catalog, Column, Selectable};
//!
//! let from = Catalog::new();
//! let mut target = Catalog::new();
//! target.add_selectable(Selectable::table(
//!     "public",
//!     "t",
//!     vec![Column::new("x", "integer")],
//! ));
//!
//! let mut m = Migration::new(&from, &target);
//! m.add_all_changes(false)?;
//! assert!(m.sql()?.contains("create table \"public\".\"t\""));
//! # Ok::<(), pgdelta::Error>(())
//! ```

pub mod changes;
pub mod diff;
pub mod planner;

mod error;
mod migration;
mod statements;

pub use changes::{Category, Changes, SelectableOptions};
pub use diff::{Differences, ModifiedPair, differences};
pub use error::{Error, Result};
pub use migration::Migration;
pub use planner::{PlanOptions, statements_for_changes, statements_from_differences};
pub use statements::Statements;

pub use pgdelta_db_schema as db_schema;
