//! In-memory filter matching.
//!
//! Evaluates a filter against a materialized [`LdapEntry`]. Applied as
//! the residual filter after fetching, it must agree with what a
//! conforming LDAP server would answer for the same entry: equality is
//! case-insensitive across any of an attribute's values, substring
//! matching is anchored and consumes `any` parts left to right,
//! ordering comparisons are lexical, and boolean operators
//! short-circuit.

use super::{Filter, Substring};
use crate::entry::LdapEntry;

/// Returns whether the entry satisfies the filter.
#[must_use]
pub fn matches(filter: &Filter, entry: &LdapEntry) -> bool {
    match filter {
        Filter::And(children) => children.iter().all(|c| matches(c, entry)),
        Filter::Or(children) => children.iter().any(|c| matches(c, entry)),
        Filter::Not(child) => !matches(child, entry),
        Filter::Equal { attr, value } | Filter::ApproxMatch { attr, value } => {
            match_equal(entry, attr, value)
        }
        Filter::Present { attr } => entry.has(attr),
        Filter::Substring { attr, substring } => match_substring(entry, attr, substring),
        Filter::GreaterOrEqual { attr, value } => {
            values(entry, attr).iter().any(|v| v.as_str() >= value.as_str())
        }
        Filter::LessOrEqual { attr, value } => {
            values(entry, attr).iter().any(|v| v.as_str() <= value.as_str())
        }
    }
}

fn values<'a>(entry: &'a LdapEntry, attr: &str) -> &'a [String] {
    entry.get(attr).unwrap_or(&[])
}

fn match_equal(entry: &LdapEntry, attr: &str, value: &str) -> bool {
    values(entry, attr).iter().any(|v| v.eq_ignore_ascii_case(value))
}

fn match_substring(entry: &LdapEntry, attr: &str, substring: &Substring) -> bool {
    values(entry, attr)
        .iter()
        .any(|v| substring_matches(&v.to_lowercase(), substring))
}

/// Anchored scan: the value must start with `initial`, then contain
/// each `any` part in order without overlap, then end with `final`.
fn substring_matches(value: &str, substring: &Substring) -> bool {
    let mut remaining = value;

    if let Some(initial) = &substring.initial {
        let initial = initial.to_lowercase();
        match remaining.strip_prefix(initial.as_str()) {
            Some(rest) => remaining = rest,
            None => return false,
        }
    }

    for any in &substring.any {
        let any = any.to_lowercase();
        match remaining.find(any.as_str()) {
            Some(idx) => remaining = &remaining[idx + any.len()..],
            None => return false,
        }
    }

    if let Some(final_) = &substring.final_ {
        let final_ = final_.to_lowercase();
        if !remaining.ends_with(final_.as_str()) {
            return false;
        }
    }

    true
}
