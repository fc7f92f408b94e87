//! Column definitions and column-level ALTER statement generation.

use crate::sql::maybe_quote_ident;

/// A table (or composite type) column as captured in a snapshot.
///
/// `dbtypestr` is the rendered Postgres type, schema-qualified for enum
/// columns (e.g. `"public"."mood"`). For generated columns, `default`
/// holds the generation expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Rendered Postgres type string.
    pub dbtypestr: String,
    /// Whether the column's type is an enum.
    pub is_enum: bool,
    /// The enum's ordered values at snapshot time, when `is_enum` is
    /// set. Part of equality: a column is modified when its enum's
    /// value set changes, even though the rendered type is identical.
    pub enum_values: Vec<String>,
    /// Default value expression, or generation expression for generated
    /// columns.
    pub default: Option<String>,
    /// NOT NULL flag.
    pub not_null: bool,
    /// Whether this is a generated (stored) column.
    pub is_generated: bool,
    /// Whether this column is inherited from a parent table.
    pub is_inherited: bool,
    /// Whether `drop expression` can remove the generated status in
    /// place (server-version dependent).
    pub can_drop_generated: bool,
    /// Collation, when non-default.
    pub collation: Option<String>,
}

impl Column {
    /// A plain nullable column with no default.
    pub fn new(name: impl Into<String>, dbtypestr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dbtypestr: dbtypestr.into(),
            is_enum: false,
            enum_values: Vec::new(),
            default: None,
            not_null: false,
            is_generated: false,
            is_inherited: false,
            can_drop_generated: false,
            collation: None,
        }
    }

    /// The column name, quoted only when required.
    pub fn quoted_name(&self) -> String {
        maybe_quote_ident(&self.name)
    }

    /// The column definition as used inside CREATE TABLE and ADD COLUMN:
    /// `name type [collate ...] [generated always as (...) stored | default ...] [not null]`.
    pub fn definition(&self) -> String {
        let mut out = format!("{} {}", self.quoted_name(), self.dbtypestr);
        if let Some(collation) = &self.collation {
            out.push_str(&format!(" collate {}", collation));
        }
        if self.is_generated {
            if let Some(expr) = &self.default {
                out.push_str(&format!(" generated always as ({}) stored", expr));
            }
        } else if let Some(default) = &self.default {
            out.push_str(&format!(" default {}", default));
        }
        if self.not_null {
            out.push_str(" not null");
        }
        out
    }

    /// Clause for adding this column, for use with
    /// [`Selectable::alter_table_statement`](crate::Selectable::alter_table_statement).
    pub fn add_column_clause(&self) -> String {
        format!("add column {}", self.definition())
    }

    /// Clause for dropping this column.
    pub fn drop_column_clause(&self) -> String {
        format!("drop column {}", self.quoted_name())
    }

    /// ALTER TABLE statements transforming `previous` into this column.
    ///
    /// Emits, in order: generated-expression removal (only legal when
    /// the generated status was dropped and the server supports it;
    /// other generated/inherited transitions are promoted to
    /// drop+add by the table migrator before this is called), type
    /// change, default change, then nullability change.
    pub fn alter_table_statements(&self, previous: &Self, table: &str) -> Vec<String> {
        let mut statements = Vec::new();

        if previous.is_generated && !self.is_generated && previous.can_drop_generated {
            statements.push(format!(
                "alter table {} alter column {} drop expression;",
                table,
                self.quoted_name()
            ));
        }

        if self.dbtypestr != previous.dbtypestr {
            statements.push(format!(
                "alter table {} alter column {} set data type {} using {}::{};",
                table,
                self.quoted_name(),
                self.dbtypestr,
                self.quoted_name(),
                self.dbtypestr
            ));
        }

        if self.default != previous.default && !self.is_generated {
            match &self.default {
                Some(_) => {
                    if let Some(statement) = self.add_default_statement(table) {
                        statements.push(statement);
                    }
                }
                None => statements.push(self.drop_default_statement(table)),
            }
        }

        if self.not_null != previous.not_null {
            let action = if self.not_null {
                "set not null"
            } else {
                "drop not null"
            };
            statements.push(format!(
                "alter table {} alter column {} {};",
                table,
                self.quoted_name(),
                action
            ));
        }

        statements
    }

    /// The enum re-cast statement used during enum type replacement.
    ///
    /// Goes through `text` so values survive the old type being renamed
    /// away while the new type takes over the original name.
    pub fn change_enum_statement(&self, table: &str) -> String {
        format!(
            "alter table {} alter column {} set data type {} using {}::text::{};",
            table,
            self.quoted_name(),
            self.dbtypestr,
            self.quoted_name(),
            self.dbtypestr
        )
    }

    /// Drop this column's default.
    pub fn drop_default_statement(&self, table: &str) -> String {
        format!(
            "alter table {} alter column {} drop default;",
            table,
            self.quoted_name()
        )
    }

    /// Restore this column's default, if it has one.
    pub fn add_default_statement(&self, table: &str) -> Option<String> {
        self.default.as_ref().map(|default| {
            format!(
                "alter table {} alter column {} set default {};",
                table,
                self.quoted_name(),
                default
            )
        })
    }
}
