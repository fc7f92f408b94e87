//! Schema snapshot types for pgdelta.
//!
//! This crate contains the typed, immutable schema objects that the
//! `pgdelta` diff engine consumes: one type per object category, each
//! knowing its identity, its dependency edges, and how to render its
//! own DDL. Objects are constructed wholesale from a point-in-time
//! snapshot (an introspection pass, a parsed dump, or test fixtures)
//! and never mutated afterwards.
//!
//! Statement text is lowercase with quoted qualified names, e.g.
//! `drop table "public"."t";`. Column names inside table bodies are
//! quoted only when they fall outside the safe unquoted identifier
//! character set.

pub mod sql;

mod catalog;
mod column;
mod objects;
mod selectable;

pub use catalog::Catalog;
pub use column::Column;
pub use objects::{
    Collation, Constraint, EnumType, Extension, Index, Privilege, RlsPolicy, SchemaDef, Sequence,
    Trigger,
};
pub use selectable::{RelationKind, Selectable};

/// The contract every schema object presents to the diff engine.
///
/// The optional capabilities are default methods rather than runtime
/// probing: an object without a safer creation path simply inherits
/// the `None` default and the planner falls back to
/// [`create_statement`](SchemaObject::create_statement).
pub trait SchemaObject: Clone + PartialEq {
    /// Stable key, unique within the object's category map.
    fn identity(&self) -> String;

    /// Identities of objects that depend directly on this one.
    fn dependents(&self) -> &[String] {
        &[]
    }

    /// Identities this object depends on.
    fn dependent_on(&self) -> &[String] {
        &[]
    }

    /// DDL creating this object.
    fn create_statement(&self) -> String;

    /// DDL dropping this object.
    fn drop_statement(&self) -> String;

    /// A non-destructive creation alternative (`create or replace`,
    /// `not valid` + `validate`), when the object has one.
    fn safer_create_statements(&self) -> Option<Vec<String>> {
        None
    }

    /// DDL transforming `previous` into this object without a
    /// drop+recreate, where the category supports it. The default is
    /// the destructive fallback.
    fn alter_statements(&self, previous: &Self) -> Vec<String> {
        vec![previous.drop_statement(), self.create_statement()]
    }
}

#[cfg(test)]
mod tests;
