//! Non-selectable schema object categories.

use crate::sql::{quote_ident, quoted_qualified, sql_literal, Ident, Lit};
use crate::SchemaObject;

/// A schema (namespace).
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDef {
    /// Schema name.
    pub name: String,
}

impl SchemaDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SchemaObject for SchemaDef {
    fn identity(&self) -> String {
        quote_ident(&self.name)
    }

    fn create_statement(&self) -> String {
        format!("create schema if not exists {};", Ident(&self.name))
    }

    fn drop_statement(&self) -> String {
        format!("drop schema if exists {};", Ident(&self.name))
    }
}

/// An installed extension.
#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    /// Extension name.
    pub name: String,
    /// Schema the extension is installed into.
    pub schema: String,
    /// Installed version; empty when versions are being ignored.
    pub version: String,
}

impl Extension {
    pub fn new(
        name: impl Into<String>,
        schema: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            version: version.into(),
        }
    }

    /// A copy with the version blanked, for version-insensitive diffs.
    pub fn without_version(&self) -> Self {
        Self {
            name: self.name.clone(),
            schema: self.schema.clone(),
            version: String::new(),
        }
    }
}

impl SchemaObject for Extension {
    fn identity(&self) -> String {
        quote_ident(&self.name)
    }

    fn create_statement(&self) -> String {
        if self.version.is_empty() {
            format!(
                "create extension if not exists {} with schema {};",
                Ident(&self.name),
                Ident(&self.schema)
            )
        } else {
            format!(
                "create extension if not exists {} with schema {} version {};",
                Ident(&self.name),
                Ident(&self.schema),
                Lit(&self.version)
            )
        }
    }

    fn drop_statement(&self) -> String {
        format!("drop extension if exists {};", Ident(&self.name))
    }

    fn alter_statements(&self, _previous: &Self) -> Vec<String> {
        vec![format!(
            "alter extension {} update to version {};",
            Ident(&self.name),
            Lit(&self.version)
        )]
    }
}

/// An enum type with its ordered value list.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    /// Schema name.
    pub schema: String,
    /// Type name.
    pub name: String,
    /// Ordered values.
    pub values: Vec<String>,
}

impl EnumType {
    pub fn new(schema: &str, name: &str, values: &[&str]) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn quoted_values(&self) -> String {
        self.values
            .iter()
            .map(|v| sql_literal(v))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Rename this type in place (first step of the enum dance).
    pub fn alter_rename_statement(&self, new_name: &str) -> String {
        format!(
            "alter type {} rename to {};",
            quoted_qualified(&self.schema, &self.name),
            Ident(new_name)
        )
    }

    /// Drop the renamed-away old version (last step of the enum dance).
    pub fn drop_statement_with_rename(&self, renamed_name: &str) -> String {
        format!(
            "drop type {};",
            quoted_qualified(&self.schema, renamed_name)
        )
    }
}

impl SchemaObject for EnumType {
    fn identity(&self) -> String {
        quoted_qualified(&self.schema, &self.name)
    }

    fn create_statement(&self) -> String {
        format!(
            "create type {} as enum ({});",
            quoted_qualified(&self.schema, &self.name),
            self.quoted_values()
        )
    }

    fn drop_statement(&self) -> String {
        format!("drop type {};", quoted_qualified(&self.schema, &self.name))
    }
}

/// A sequence, possibly owned by a table column.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    /// Schema name.
    pub schema: String,
    /// Sequence name.
    pub name: String,
    /// Owning table, if any.
    pub owner_table: Option<String>,
    /// Owning column, if any.
    pub owner_column: Option<String>,
}

impl Sequence {
    pub fn new(schema: &str, name: &str) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
            owner_table: None,
            owner_column: None,
        }
    }

    pub fn owned_by(mut self, table: &str, column: &str) -> Self {
        self.owner_table = Some(table.to_string());
        self.owner_column = Some(column.to_string());
        self
    }

    /// `"schema"."table"."column"` of the owning column, or empty.
    pub fn quoted_table_and_column_name(&self) -> String {
        match (&self.owner_table, &self.owner_column) {
            (Some(table), Some(column)) => format!(
                "{}.{}",
                quoted_qualified(&self.schema, table),
                Ident(column)
            ),
            _ => String::new(),
        }
    }

    /// ALTER SEQUENCE ... OWNED BY statement for the current owner.
    pub fn alter_ownership_statement(&self) -> String {
        let owner = self.quoted_table_and_column_name();
        let owner = if owner.is_empty() {
            "none".to_string()
        } else {
            owner
        };
        format!(
            "alter sequence {} owned by {};",
            quoted_qualified(&self.schema, &self.name),
            owner
        )
    }
}

impl SchemaObject for Sequence {
    fn identity(&self) -> String {
        quoted_qualified(&self.schema, &self.name)
    }

    fn create_statement(&self) -> String {
        format!(
            "create sequence {};",
            quoted_qualified(&self.schema, &self.name)
        )
    }

    fn drop_statement(&self) -> String {
        format!(
            "drop sequence {};",
            quoted_qualified(&self.schema, &self.name)
        )
    }
}

/// An index, stored with its full catalog definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    /// Schema name.
    pub schema: String,
    /// Index name.
    pub name: String,
    /// Name of the indexed relation.
    pub table_name: String,
    /// Full `create index ...` text, ending with `;`.
    pub definition: String,
}

impl Index {
    pub fn new(schema: &str, name: &str, table_name: &str, definition: &str) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
            table_name: table_name.to_string(),
            definition: definition.to_string(),
        }
    }

    /// Identity of the indexed relation, for the mv/non-mv split.
    pub fn quoted_table_identity(&self) -> String {
        quoted_qualified(&self.schema, &self.table_name)
    }
}

impl SchemaObject for Index {
    fn identity(&self) -> String {
        quoted_qualified(&self.schema, &self.name)
    }

    fn create_statement(&self) -> String {
        self.definition.clone()
    }

    fn drop_statement(&self) -> String {
        format!("drop index {};", quoted_qualified(&self.schema, &self.name))
    }
}

/// A table constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Schema name.
    pub schema: String,
    /// Constrained table.
    pub table_name: String,
    /// Constraint name.
    pub name: String,
    /// Constraint body (e.g. `foreign key (a) references "s"."t"(b)`).
    pub definition: String,
    /// Constraint type keyword (`PRIMARY KEY`, `FOREIGN KEY`, ...).
    pub constraint_type: String,
}

impl Constraint {
    pub fn new(
        schema: &str,
        table_name: &str,
        name: &str,
        definition: &str,
        constraint_type: &str,
    ) -> Self {
        Self {
            schema: schema.to_string(),
            table_name: table_name.to_string(),
            name: name.to_string(),
            definition: definition.to_string(),
            constraint_type: constraint_type.to_string(),
        }
    }

    fn quoted_table(&self) -> String {
        quoted_qualified(&self.schema, &self.table_name)
    }

    /// True for foreign keys, which have a two-step safer creation.
    pub fn is_fk(&self) -> bool {
        self.constraint_type == "FOREIGN KEY"
    }
}

impl SchemaObject for Constraint {
    fn identity(&self) -> String {
        format!("{}.{}", self.quoted_table(), Ident(&self.name))
    }

    fn create_statement(&self) -> String {
        format!(
            "alter table {} add constraint {} {};",
            self.quoted_table(),
            Ident(&self.name),
            self.definition
        )
    }

    fn drop_statement(&self) -> String {
        format!(
            "alter table {} drop constraint {};",
            self.quoted_table(),
            Ident(&self.name)
        )
    }

    fn safer_create_statements(&self) -> Option<Vec<String>> {
        if !self.is_fk() {
            return None;
        }
        // Adding NOT VALID then validating avoids a full-table lock
        // while existing rows are checked.
        Some(vec![
            format!(
                "alter table {} add constraint {} {} not valid;",
                self.quoted_table(),
                Ident(&self.name),
                self.definition
            ),
            format!(
                "alter table {} validate constraint {};",
                self.quoted_table(),
                Ident(&self.name)
            ),
        ])
    }
}

/// A granted privilege.
#[derive(Debug, Clone, PartialEq)]
pub struct Privilege {
    /// Schema name.
    pub schema: String,
    /// Object name.
    pub name: String,
    /// Object type keyword (`table`, `sequence`, ...).
    pub object_type: String,
    /// Grantee.
    pub user: String,
    /// Privilege keyword (`select`, `insert`, ...).
    pub privilege: String,
}

impl Privilege {
    pub fn new(schema: &str, name: &str, object_type: &str, user: &str, privilege: &str) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
            object_type: object_type.to_string(),
            user: user.to_string(),
            privilege: privilege.to_string(),
        }
    }
}

impl SchemaObject for Privilege {
    fn identity(&self) -> String {
        format!(
            "{}.{}.{}",
            quoted_qualified(&self.schema, &self.name),
            Ident(&self.user),
            self.privilege
        )
    }

    fn create_statement(&self) -> String {
        format!(
            "grant {} on {} {} to {};",
            self.privilege,
            self.object_type,
            quoted_qualified(&self.schema, &self.name),
            Ident(&self.user)
        )
    }

    fn drop_statement(&self) -> String {
        format!(
            "revoke {} on {} {} from {};",
            self.privilege,
            self.object_type,
            quoted_qualified(&self.schema, &self.name),
            Ident(&self.user)
        )
    }
}

/// A collation.
#[derive(Debug, Clone, PartialEq)]
pub struct Collation {
    /// Schema name.
    pub schema: String,
    /// Collation name.
    pub name: String,
    /// Provider (`icu` or `libc`).
    pub provider: String,
    /// Locale string.
    pub locale: String,
}

impl Collation {
    pub fn new(schema: &str, name: &str, provider: &str, locale: &str) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
            provider: provider.to_string(),
            locale: locale.to_string(),
        }
    }
}

impl SchemaObject for Collation {
    fn identity(&self) -> String {
        quoted_qualified(&self.schema, &self.name)
    }

    fn create_statement(&self) -> String {
        format!(
            "create collation if not exists {} (provider = {}, locale = {});",
            quoted_qualified(&self.schema, &self.name),
            self.provider,
            Lit(&self.locale)
        )
    }

    fn drop_statement(&self) -> String {
        format!(
            "drop collation if exists {};",
            quoted_qualified(&self.schema, &self.name)
        )
    }
}

/// A row-level security policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RlsPolicy {
    /// Policy name.
    pub name: String,
    /// Schema of the secured table.
    pub schema: String,
    /// Secured table.
    pub table_name: String,
    /// Policy body (everything after `on <table>`).
    pub definition: String,
}

impl RlsPolicy {
    pub fn new(schema: &str, table_name: &str, name: &str, definition: &str) -> Self {
        Self {
            name: name.to_string(),
            schema: schema.to_string(),
            table_name: table_name.to_string(),
            definition: definition.to_string(),
        }
    }

    fn quoted_table(&self) -> String {
        quoted_qualified(&self.schema, &self.table_name)
    }
}

impl SchemaObject for RlsPolicy {
    fn identity(&self) -> String {
        format!("{}.{}", self.quoted_table(), Ident(&self.name))
    }

    fn create_statement(&self) -> String {
        format!(
            "create policy {} on {} {};",
            Ident(&self.name),
            self.quoted_table(),
            self.definition
        )
    }

    fn drop_statement(&self) -> String {
        format!(
            "drop policy {} on {};",
            Ident(&self.name),
            self.quoted_table()
        )
    }
}

/// A trigger, stored with its full catalog definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    /// Schema of the owning selectable.
    pub schema: String,
    /// Owning table or view.
    pub table_name: String,
    /// Trigger name.
    pub name: String,
    /// Full `create trigger ...` text, without trailing `;`.
    pub definition: String,
}

impl Trigger {
    pub fn new(schema: &str, table_name: &str, name: &str, definition: &str) -> Self {
        Self {
            schema: schema.to_string(),
            table_name: table_name.to_string(),
            name: name.to_string(),
            definition: definition.to_string(),
        }
    }

    /// Identity of the owning selectable, for forced-recreate checks.
    pub fn quoted_full_selectable_name(&self) -> String {
        quoted_qualified(&self.schema, &self.table_name)
    }
}

impl SchemaObject for Trigger {
    fn identity(&self) -> String {
        format!(
            "{}.{}",
            self.quoted_full_selectable_name(),
            Ident(&self.name)
        )
    }

    fn create_statement(&self) -> String {
        format!("{};", self.definition)
    }

    fn drop_statement(&self) -> String {
        format!(
            "drop trigger {} on {};",
            Ident(&self.name),
            self.quoted_full_selectable_name()
        )
    }
}
