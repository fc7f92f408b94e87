//! Error types for the diff engine.

/// Errors produced while diffing catalogs or assembling a migration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The dependency-ordered emission loop made a full pass without
    /// emitting anything while work remained pending. The graph the
    /// snapshots describe contains a cycle (or dangling edges).
    #[error("dependency cycle or unresolvable ordering among: {}", pending.join(", "))]
    DependencyCycle {
        /// Identities still pending when progress stopped.
        pending: Vec<String>,
    },

    /// Mutually exclusive planner flags were combined.
    #[error("conflicting statement options: {0}")]
    ConflictingOptions(&'static str),

    /// The migration contains drop statements but safety checks were
    /// not disabled.
    #[error("migration contains drop statements; unsafe statements not allowed")]
    UnsafeMigration,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
