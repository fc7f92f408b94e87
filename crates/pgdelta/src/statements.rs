//! Ordered accumulation of generated DDL.

use std::ops::{Add, AddAssign};
use std::sync::LazyLock;

use regex::Regex;

static DROP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bdrop\s+").unwrap());

/// An ordered, append-only list of SQL statements.
///
/// Every phase of the diff appends here; nothing ever reorders or
/// deduplicates after the fact, so emission order is final order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statements {
    statements: Vec<String>,
}

impl Statements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, statement: impl Into<String>) {
        self.statements.push(statement.into());
    }

    pub fn extend<I, S>(&mut self, statements: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statements
            .extend(statements.into_iter().map(Into::into));
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.statements.iter()
    }

    /// True when any statement contains a `drop` keyword.
    ///
    /// Textual and deliberately conservative: `drop default` and
    /// `drop not null` clauses count too, erring towards flagging a
    /// migration as destructive.
    pub fn contains_drop(&self) -> bool {
        self.statements.iter().any(|s| DROP_RE.is_match(s))
    }

    /// Render as a script: statements separated by blank lines, with a
    /// trailing blank line. Empty input renders as the empty string.
    pub fn sql(&self) -> String {
        if self.statements.is_empty() {
            return String::new();
        }
        let mut out = self.statements.join("\n\n");
        out.push_str("\n\n");
        out
    }
}

impl Add for Statements {
    type Output = Statements;

    fn add(mut self, rhs: Statements) -> Statements {
        self.statements.extend(rhs.statements);
        self
    }
}

impl AddAssign for Statements {
    fn add_assign(&mut self, rhs: Statements) {
        self.statements.extend(rhs.statements);
    }
}

impl From<Vec<String>> for Statements {
    fn from(statements: Vec<String>) -> Self {
        Self { statements }
    }
}

impl IntoIterator for Statements {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.into_iter()
    }
}

impl<'a> IntoIterator for &'a Statements {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}
