//! Selectables: tables, views, materialized views, functions, and
//! composite types.
//!
//! All of these are queryable like a relation, share the column-map
//! shape, and participate in the same dependency graph, so they live in
//! one snapshot type distinguished by [`RelationKind`].

use indexmap::IndexMap;

use crate::column::Column;
use crate::sql::{quoted_qualified_with_args, sql_literal};
use crate::SchemaObject;

/// The relation kind of a selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Plain table.
    Table,
    /// Partitioned table (partition parent).
    PartitionedTable,
    /// View.
    View,
    /// Materialized view.
    MaterializedView,
    /// Function.
    Function,
    /// Composite type.
    CompositeType,
}

impl RelationKind {
    /// The object type keyword used in COMMENT ON statements.
    pub fn comment_object_type(&self) -> &'static str {
        match self {
            RelationKind::Table | RelationKind::PartitionedTable => "TABLE",
            RelationKind::View => "VIEW",
            RelationKind::MaterializedView => "MATERIALIZED VIEW",
            RelationKind::Function => "FUNCTION",
            RelationKind::CompositeType => "TYPE",
        }
    }
}

/// A selectable schema object as captured in a snapshot.
///
/// For views and materialized views, `definition` is the body after
/// `as` (ending with `;`). For functions it is the complete
/// `create function ...` text as returned by the catalog.
#[derive(Debug, Clone)]
pub struct Selectable {
    /// Schema name.
    pub schema: String,
    /// Object name.
    pub name: String,
    /// Relation kind.
    pub kind: RelationKind,
    /// Ordered columns, keyed by name. Order matters only for display
    /// and for the view column-prefix replaceability rule.
    pub columns: IndexMap<String, Column>,
    /// View/matview body, or full function definition.
    pub definition: String,
    /// Argument signature, functions only.
    pub identity_arguments: Option<String>,
    /// Result type, functions only.
    pub result_type: Option<String>,
    /// UNLOGGED flag, tables only.
    pub is_unlogged: bool,
    /// Identity of the partition parent, if attached.
    pub parent_table: Option<String>,
    /// Partition bound clause (e.g. `for values in ('a')`).
    pub partition_bound: Option<String>,
    /// Partition spec for partition parents (e.g. `list (kind)`).
    pub partition_by: Option<String>,
    /// Row-level security enabled.
    pub rowsecurity: bool,
    /// Whether column-level ALTER is possible (false for foreign
    /// tables and other non-plain storage).
    pub is_alterable: bool,
    /// Whether this table inherits columns from a parent.
    pub is_inheritance_child_table: bool,
    /// COMMENT ON text.
    pub comment: Option<String>,
    /// Identities this object depends on.
    pub dependent_on: Vec<String>,
    /// Identities depending directly on this object. Filled by
    /// [`Catalog::resolve_dependencies`](crate::Catalog::resolve_dependencies).
    pub dependents: Vec<String>,
    /// Transitive closure of `dependents`. Filled alongside it.
    pub dependents_all: Vec<String>,
}

// Dependency edges are graph metadata, not object content: a view whose
// text is untouched stays "unmodified" even when a new dependent
// appears. Forced recreation of dependents is the selectable differ's
// job, not equality's.
impl PartialEq for Selectable {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema
            && self.name == other.name
            && self.kind == other.kind
            && self.columns == other.columns
            && self.definition == other.definition
            && self.identity_arguments == other.identity_arguments
            && self.result_type == other.result_type
            && self.is_unlogged == other.is_unlogged
            && self.parent_table == other.parent_table
            && self.partition_bound == other.partition_bound
            && self.partition_by == other.partition_by
            && self.rowsecurity == other.rowsecurity
            && self.is_alterable == other.is_alterable
            && self.is_inheritance_child_table == other.is_inheritance_child_table
            && self.comment == other.comment
    }
}

impl Selectable {
    fn bare(schema: &str, name: &str, kind: RelationKind) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
            kind,
            columns: IndexMap::new(),
            definition: String::new(),
            identity_arguments: None,
            result_type: None,
            is_unlogged: false,
            parent_table: None,
            partition_bound: None,
            partition_by: None,
            rowsecurity: false,
            is_alterable: true,
            is_inheritance_child_table: false,
            comment: None,
            dependent_on: Vec::new(),
            dependents: Vec::new(),
            dependents_all: Vec::new(),
        }
    }

    /// A plain table with the given columns.
    pub fn table(schema: &str, name: &str, columns: Vec<Column>) -> Self {
        let mut s = Self::bare(schema, name, RelationKind::Table);
        s.columns = columns.into_iter().map(|c| (c.name.clone(), c)).collect();
        s
    }

    /// A view with the given body (text after `as`, ending with `;`).
    pub fn view(schema: &str, name: &str, definition: &str, columns: Vec<Column>) -> Self {
        let mut s = Self::bare(schema, name, RelationKind::View);
        s.definition = definition.to_string();
        s.columns = columns.into_iter().map(|c| (c.name.clone(), c)).collect();
        s
    }

    /// A materialized view with the given body.
    pub fn materialized_view(
        schema: &str,
        name: &str,
        definition: &str,
        columns: Vec<Column>,
    ) -> Self {
        let mut s = Self::bare(schema, name, RelationKind::MaterializedView);
        s.definition = definition.to_string();
        s.columns = columns.into_iter().map(|c| (c.name.clone(), c)).collect();
        s
    }

    /// A function. `definition` is the full `create function ...` text.
    pub fn function(
        schema: &str,
        name: &str,
        identity_arguments: &str,
        result_type: &str,
        definition: &str,
    ) -> Self {
        let mut s = Self::bare(schema, name, RelationKind::Function);
        s.identity_arguments = Some(identity_arguments.to_string());
        s.result_type = Some(result_type.to_string());
        s.definition = definition.to_string();
        s
    }

    /// A composite type with the given attributes.
    pub fn composite_type(schema: &str, name: &str, attributes: Vec<Column>) -> Self {
        let mut s = Self::bare(schema, name, RelationKind::CompositeType);
        s.columns = attributes
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();
        s
    }

    /// Schema-qualified quoted name, including the argument signature
    /// for functions.
    pub fn quoted_full_name(&self) -> String {
        quoted_qualified_with_args(&self.schema, &self.name, self.identity_arguments.as_deref())
    }

    /// True for plain and partitioned tables.
    pub fn is_table(&self) -> bool {
        matches!(
            self.kind,
            RelationKind::Table | RelationKind::PartitionedTable
        )
    }

    /// True for partition parents.
    pub fn is_partitioned(&self) -> bool {
        self.kind == RelationKind::PartitionedTable
    }

    fn column_definitions(&self) -> String {
        self.columns
            .values()
            .filter(|c| !c.is_inherited)
            .map(|c| format!("  {}", c.definition()))
            .collect::<Vec<_>>()
            .join(",\n")
    }

    /// Whether this version can replace `previous` in place.
    ///
    /// Views can be `create or replace`d only when the previous column
    /// list is a leading prefix of the new one; functions when the
    /// signature and result type are unchanged. Everything else needs
    /// drop+recreate.
    pub fn can_replace(&self, previous: &Self) -> bool {
        if self.kind != previous.kind {
            return false;
        }
        match self.kind {
            RelationKind::View => {
                if previous.columns.len() > self.columns.len() {
                    return false;
                }
                previous.columns.iter().zip(self.columns.iter()).all(
                    |((prev_name, prev_col), (new_name, new_col))| {
                        prev_name == new_name && prev_col.dbtypestr == new_col.dbtypestr
                    },
                )
            }
            RelationKind::Function => {
                self.identity_arguments == previous.identity_arguments
                    && self.result_type == previous.result_type
            }
            _ => false,
        }
    }

    /// The RLS toggle statement matching the current `rowsecurity` flag.
    pub fn alter_rls_statement(&self) -> String {
        let action = if self.rowsecurity { "enable" } else { "disable" };
        format!(
            "alter table {} {} row level security;",
            self.quoted_full_name(),
            action
        )
    }

    /// The persistence toggle statement matching the current
    /// `is_unlogged` flag.
    pub fn alter_unlogged_statement(&self) -> String {
        let persistence = if self.is_unlogged { "unlogged" } else { "logged" };
        format!(
            "alter table {} set {};",
            self.quoted_full_name(),
            persistence
        )
    }

    /// Detach from the previous parent and/or attach to the new one.
    pub fn attach_detach_statements(&self, previous: &Self) -> Vec<String> {
        let mut statements = Vec::new();
        if let Some(old_parent) = &previous.parent_table {
            statements.push(format!(
                "alter table {} detach partition {};",
                old_parent,
                self.quoted_full_name()
            ));
        }
        if let Some(parent) = &self.parent_table {
            let bound = self
                .partition_bound
                .as_deref()
                .unwrap_or("default")
                .to_string();
            statements.push(format!(
                "alter table {} attach partition {} {};",
                parent,
                self.quoted_full_name(),
                bound
            ));
        }
        statements
    }

    /// Wrap a column-level clause in an ALTER TABLE statement.
    pub fn alter_table_statement(&self, clause: &str) -> String {
        format!("alter table {} {};", self.quoted_full_name(), clause)
    }

    /// COMMENT ON statement for this object's comment, if any.
    pub fn comment_statement(&self) -> Option<String> {
        self.comment.as_ref().map(|comment| {
            format!(
                "COMMENT ON {} {} IS {};",
                self.kind.comment_object_type(),
                self.quoted_full_name(),
                sql_literal(comment)
            )
        })
    }

    /// Statements transforming this object's comment into `new`'s.
    pub fn comment_alter_statements(&self, new: &Self) -> Vec<String> {
        if self.comment == new.comment {
            return Vec::new();
        }
        match new.comment_statement() {
            Some(statement) => vec![statement],
            None => vec![format!(
                "COMMENT ON {} {} IS NULL;",
                self.kind.comment_object_type(),
                self.quoted_full_name()
            )],
        }
    }
}

/// Rewrite a stored `create function` header into `create or replace
/// function`, preserving the original spelling after the header.
fn create_or_replace_function(definition: &str) -> String {
    // Match case-insensitively on the original text so the splice
    // offsets stay valid (lowercasing can change byte lengths).
    fn header_at(definition: &str, idx: usize, header: &str) -> bool {
        definition
            .get(idx..idx + header.len())
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(header))
    }

    let offset = definition.len() - definition.trim_start().len();
    if header_at(definition, offset, "create or replace") {
        return definition.to_string();
    }
    match (offset..definition.len()).find(|&idx| header_at(definition, idx, "create")) {
        Some(idx) => format!(
            "{}create or replace{}",
            &definition[..idx],
            &definition[idx + "create".len()..]
        ),
        None => definition.to_string(),
    }
}

impl SchemaObject for Selectable {
    fn identity(&self) -> String {
        self.quoted_full_name()
    }

    fn dependents(&self) -> &[String] {
        &self.dependents
    }

    fn dependent_on(&self) -> &[String] {
        &self.dependent_on
    }

    fn create_statement(&self) -> String {
        match self.kind {
            RelationKind::Table | RelationKind::PartitionedTable => {
                let unlogged = if self.is_unlogged { "unlogged " } else { "" };
                let partition_clause = self
                    .partition_by
                    .as_ref()
                    .map(|spec| format!(" partition by {}", spec))
                    .unwrap_or_default();
                format!(
                    "create {}table {} (\n{}\n){};",
                    unlogged,
                    self.quoted_full_name(),
                    self.column_definitions(),
                    partition_clause
                )
            }
            RelationKind::View => format!(
                "create view {} as\n{}",
                self.quoted_full_name(),
                self.definition
            ),
            RelationKind::MaterializedView => format!(
                "create materialized view {} as\n{}",
                self.quoted_full_name(),
                self.definition
            ),
            RelationKind::Function => self.definition.clone(),
            RelationKind::CompositeType => format!(
                "create type {} as (\n{}\n);",
                self.quoted_full_name(),
                self.column_definitions()
            ),
        }
    }

    fn drop_statement(&self) -> String {
        let keyword = match self.kind {
            RelationKind::Table | RelationKind::PartitionedTable => "table",
            RelationKind::View => "view",
            RelationKind::MaterializedView => "materialized view",
            RelationKind::Function => "function",
            RelationKind::CompositeType => "type",
        };
        format!("drop {} {};", keyword, self.quoted_full_name())
    }

    fn safer_create_statements(&self) -> Option<Vec<String>> {
        match self.kind {
            RelationKind::View => Some(vec![format!(
                "create or replace view {} as\n{}",
                self.quoted_full_name(),
                self.definition
            )]),
            RelationKind::Function => {
                Some(vec![create_or_replace_function(&self.definition)])
            }
            // No `create or replace materialized view` exists.
            _ => None,
        }
    }

    fn alter_statements(&self, previous: &Self) -> Vec<String> {
        if self.kind != RelationKind::CompositeType || previous.kind != RelationKind::CompositeType
        {
            return vec![previous.drop_statement(), self.create_statement()];
        }

        // Composite types can evolve attribute by attribute.
        let mut statements = Vec::new();
        for (name, attr) in &previous.columns {
            if !self.columns.contains_key(name) {
                statements.push(format!(
                    "alter type {} drop attribute {};",
                    self.quoted_full_name(),
                    attr.quoted_name()
                ));
            }
        }
        for (name, attr) in &self.columns {
            match previous.columns.get(name) {
                None => statements.push(format!(
                    "alter type {} add attribute {} {};",
                    self.quoted_full_name(),
                    attr.quoted_name(),
                    attr.dbtypestr
                )),
                Some(prev) if prev.dbtypestr != attr.dbtypestr => statements.push(format!(
                    "alter type {} alter attribute {} set data type {};",
                    self.quoted_full_name(),
                    attr.quoted_name(),
                    attr.dbtypestr
                )),
                Some(_) => {}
            }
        }
        statements
    }
}
