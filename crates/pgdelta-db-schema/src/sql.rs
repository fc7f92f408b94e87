//! Identifier and literal quoting for generated DDL.

use std::fmt;

/// A PostgreSQL identifier wrapper.
///
/// Display writes the value escaped and quoted with double quotes.
///
/// # Example
/// ```
/// use pgdelta_db_schema::sql::Ident;
/// assert_eq!(format!("{}", Ident("user")), "\"user\"");
/// assert_eq!(format!("{}", Ident("bla\"h")), "\"bla\"\"h\"");
/// ```
pub struct Ident<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"")?;
        for c in self.0.as_ref().chars() {
            if c == '"' {
                write!(f, "\"\"")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "\"")
    }
}

/// A PostgreSQL string literal wrapper.
///
/// Display writes the value escaped and quoted with single quotes.
///
/// # Example
/// ```
/// use pgdelta_db_schema::sql::Lit;
/// assert_eq!(format!("{}", Lit("foo")), "'foo'");
/// assert_eq!(format!("{}", Lit("it's")), "'it''s'");
/// ```
pub struct Lit<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> fmt::Display for Lit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'")?;
        for c in self.0.as_ref().chars() {
            if c == '\'' {
                write!(f, "''")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "'")
    }
}

/// Quote a PostgreSQL identifier unconditionally.
pub fn quote_ident(name: &str) -> String {
    format!("{}", Ident(name))
}

/// Escape a string literal for SQL.
pub fn sql_literal(s: &str) -> String {
    format!("{}", Lit(s))
}

/// Quote an identifier only when it falls outside the safe unquoted
/// character set (`[a-z_][a-z0-9_]*`).
///
/// Used for column names inside CREATE TABLE bodies, where the original
/// emits `x integer` rather than `"x" integer`.
pub fn maybe_quote_ident(name: &str) -> String {
    let mut chars = name.chars();
    let safe_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    let safe_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if safe_start && safe_rest {
        name.to_string()
    } else {
        quote_ident(name)
    }
}

/// Build a schema-qualified identifier: `"schema"."name"`.
pub fn quoted_qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", Ident(schema), Ident(name))
}

/// Build a schema-qualified identifier with an argument signature:
/// `"schema"."name"(args)`.
///
/// Functions are identified this way so overloads stay distinct.
pub fn quoted_qualified_with_args(schema: &str, name: &str, args: Option<&str>) -> String {
    match args {
        Some(args) => format!("{}.{}({})", Ident(schema), Ident(name), args),
        None => quoted_qualified(schema, name),
    }
}
