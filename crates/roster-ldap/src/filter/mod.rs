//! LDAP search filters.
//!
//! A [`Filter`] is an immutable AST over entry attributes. Filters
//! arrive two ways: as RFC 4515 text (parsed by [`Filter::parse`]) and
//! as the BER-decoded tree `ldap3_proto` produces from the wire
//! (translated by `TryFrom<&LdapFilter>`; the context tags 0–9 of the
//! protocol map one-to-one onto the AST kinds, with extensible match
//! rejected as unsupported).
//!
//! Two independent interpreters consume the AST and must stay
//! consistent: [`eval`] lowers filters to relational predicates for
//! the store, [`matcher`] evaluates them against in-memory entries.

pub mod eval;
pub mod matcher;
mod parse;

use std::fmt;

use ldap3_proto::proto::{LdapFilter, LdapSubstringFilter};
use thiserror::Error;

pub use eval::Evaluator;
pub use matcher::matches;

/// Filter parsing and lowering errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The filter text or tree was malformed. The message carries the
    /// context-annotated cause.
    #[error("filter parse error: {0}")]
    Parse(String),

    /// Extensible match filters are not supported.
    #[error("extensible match filters are not supported")]
    ExtensibleMatch,

    /// The filter references an attribute unknown to the mode's
    /// mapper.
    #[error("unmapped attribute {0:?}")]
    UnmappedAttribute(String),

    /// After eliding objectClass terms nothing remains to lower; the
    /// caller falls back to an unfiltered fetch.
    #[error("filter reduces to an empty predicate")]
    EmptyPredicate,
}

/// Substring assertion components.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Substring {
    /// Prefix before the first wildcard.
    pub initial: Option<String>,
    /// Middle parts between wildcards, left to right.
    pub any: Vec<String>,
    /// Suffix after the last wildcard.
    pub final_: Option<String>,
}

/// A parsed LDAP filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Conjunction of one or more filters.
    And(Vec<Filter>),
    /// Disjunction of one or more filters.
    Or(Vec<Filter>),
    /// Negation of exactly one filter.
    Not(Box<Filter>),
    /// Equality match.
    Equal {
        /// Attribute name.
        attr: String,
        /// Assertion value.
        value: String,
    },
    /// Substring match.
    Substring {
        /// Attribute name.
        attr: String,
        /// Substring components.
        substring: Substring,
    },
    /// Lexical greater-or-equal match.
    GreaterOrEqual {
        /// Attribute name.
        attr: String,
        /// Assertion value.
        value: String,
    },
    /// Lexical less-or-equal match.
    LessOrEqual {
        /// Attribute name.
        attr: String,
        /// Assertion value.
        value: String,
    },
    /// Presence test.
    Present {
        /// Attribute name.
        attr: String,
    },
    /// Approximate match; treated as case-insensitive equality.
    ApproxMatch {
        /// Attribute name.
        attr: String,
        /// Assertion value.
        value: String,
    },
}

impl Filter {
    /// Parses an RFC 4515 filter string.
    ///
    /// Values may use `\xx` hex-pair escapes.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Parse`] for malformed input (empty
    /// string, unbalanced parentheses, bad child counts) and
    /// [`FilterError::ExtensibleMatch`] for `:=` assertions.
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        parse::parse(input)
    }

    /// Returns whether this is a simple filter on the `objectClass`
    /// attribute. Such terms route the search's fetch selection and
    /// are never lowered to store predicates.
    #[must_use]
    pub fn is_object_class_term(&self) -> bool {
        let attr = match self {
            Self::Equal { attr, .. }
            | Self::Substring { attr, .. }
            | Self::ApproxMatch { attr, .. }
            | Self::Present { attr } => attr,
            _ => return false,
        };
        attr.eq_ignore_ascii_case("objectClass")
    }

    /// Finds the first `objectClass=<value>` equality in the filter,
    /// recursing into AND and OR.
    #[must_use]
    pub fn first_object_class(&self) -> Option<&str> {
        match self {
            Self::Equal { attr, value } if attr.eq_ignore_ascii_case("objectClass") => {
                Some(value.as_str())
            }
            Self::And(children) | Self::Or(children) => {
                children.iter().find_map(Self::first_object_class)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Filter {
    /// Reconstructs the canonical RFC 4515 text, escaping special
    /// characters so printing round-trips through [`Filter::parse`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(children) => {
                write!(f, "(&")?;
                for child in children {
                    write!(f, "{child}")?;
                }
                write!(f, ")")
            }
            Self::Or(children) => {
                write!(f, "(|")?;
                for child in children {
                    write!(f, "{child}")?;
                }
                write!(f, ")")
            }
            Self::Not(child) => write!(f, "(!{child})"),
            Self::Equal { attr, value } => write!(f, "({attr}={})", escape_value(value)),
            Self::Present { attr } => write!(f, "({attr}=*)"),
            Self::GreaterOrEqual { attr, value } => {
                write!(f, "({attr}>={})", escape_value(value))
            }
            Self::LessOrEqual { attr, value } => write!(f, "({attr}<={})", escape_value(value)),
            Self::ApproxMatch { attr, value } => write!(f, "({attr}~={})", escape_value(value)),
            Self::Substring { attr, substring } => {
                write!(f, "({attr}=")?;
                if let Some(initial) = &substring.initial {
                    write!(f, "{}", escape_value(initial))?;
                }
                write!(f, "*")?;
                for any in &substring.any {
                    write!(f, "{}*", escape_value(any))?;
                }
                if let Some(final_) = &substring.final_ {
                    write!(f, "{}", escape_value(final_))?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Escapes filter value specials per RFC 4515 (`\xx` hex pairs).
fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '(' => out.push_str("\\28"),
            ')' => out.push_str("\\29"),
            '*' => out.push_str("\\2a"),
            '\\' => out.push_str("\\5c"),
            '\0' => out.push_str("\\00"),
            _ => out.push(ch),
        }
    }
    out
}

impl TryFrom<&LdapFilter> for Filter {
    type Error = FilterError;

    fn try_from(wire: &LdapFilter) -> Result<Self, Self::Error> {
        match wire {
            LdapFilter::And(children) => {
                Ok(Self::And(convert_children(children, "AND")?))
            }
            LdapFilter::Or(children) => Ok(Self::Or(convert_children(children, "OR")?)),
            LdapFilter::Not(child) => Ok(Self::Not(Box::new(Self::try_from(child.as_ref())?))),
            LdapFilter::Equality(attr, value) => Ok(Self::Equal {
                attr: attr.clone(),
                value: value.clone(),
            }),
            LdapFilter::Substring(attr, sub) => Ok(Self::Substring {
                attr: attr.clone(),
                substring: convert_substring(sub),
            }),
            LdapFilter::GreaterOrEqual(attr, value) => Ok(Self::GreaterOrEqual {
                attr: attr.clone(),
                value: value.clone(),
            }),
            LdapFilter::LessOrEqual(attr, value) => Ok(Self::LessOrEqual {
                attr: attr.clone(),
                value: value.clone(),
            }),
            LdapFilter::Present(attr) => Ok(Self::Present { attr: attr.clone() }),
            LdapFilter::Approx(attr, value) => Ok(Self::ApproxMatch {
                attr: attr.clone(),
                value: value.clone(),
            }),
            LdapFilter::Extensible(_) => Err(FilterError::ExtensibleMatch),
        }
    }
}

fn convert_children(children: &[LdapFilter], kind: &str) -> Result<Vec<Filter>, FilterError> {
    if children.is_empty() {
        return Err(FilterError::Parse(format!(
            "{kind} filter must have at least one child"
        )));
    }
    children.iter().map(Filter::try_from).collect()
}

fn convert_substring(sub: &LdapSubstringFilter) -> Substring {
    Substring {
        initial: sub.initial.clone().filter(|s| !s.is_empty()),
        any: sub.any.clone(),
        final_: sub.final_.clone().filter(|s| !s.is_empty()),
    }
}
