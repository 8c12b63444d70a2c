//! Relational predicate tree.
//!
//! The LDAP filter evaluator lowers filter ASTs into this form; SQL
//! backends render it into a `WHERE` clause with bound arguments.
//! Column names are the internal column names produced by the
//! attribute mapper, never raw client input.

/// A relational predicate over a single table's columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `column = value`.
    Eq(String, String),
    /// `column IS NOT NULL`.
    NotNull(String),
    /// `column LIKE pattern` with `\` as the escape character. The
    /// pattern is produced by the evaluator with `%`/`_` in
    /// user-supplied parts already escaped.
    Like(String, String),
    /// `column >= value` (lexical string compare).
    Gte(String, String),
    /// `column <= value` (lexical string compare).
    Lte(String, String),
    /// Case-insensitive `column = value`.
    EqFold(String, String),
    /// Conjunction of one or more predicates.
    And(Vec<Predicate>),
    /// Disjunction of one or more predicates.
    Or(Vec<Predicate>),
    /// Negation.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Creates an equality predicate.
    #[must_use]
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq(column.into(), value.into())
    }

    /// Creates a not-null predicate.
    #[must_use]
    pub fn not_null(column: impl Into<String>) -> Self {
        Self::NotNull(column.into())
    }

    /// Creates a LIKE predicate.
    #[must_use]
    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like(column.into(), pattern.into())
    }

    /// Wraps a predicate in a negation.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }
}
