//! Lowering filters to relational predicates.
//!
//! Comparisons are lowered case-insensitively so database-side
//! filtering and the in-memory matcher agree on the same filter.
//! `objectClass` terms route fetch selection at the handler, never row
//! selection: AND/OR children on `objectClass` are elided, and a
//! filter that consists only of such terms fails with
//! [`FilterError::EmptyPredicate`] so the caller falls back to an
//! unfiltered fetch.

use roster_storage::Predicate;

use super::{Filter, FilterError, Substring};
use crate::attrs::AttributeMapper;

/// Converts filter ASTs into store predicates using an attribute
/// mapper.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    mapper: &'a AttributeMapper,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator over the given mapper.
    #[must_use]
    pub const fn new(mapper: &'a AttributeMapper) -> Self {
        Self { mapper }
    }

    /// Lowers a filter into a predicate over the user table's columns.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnmappedAttribute`] when the filter
    /// references an attribute the mode's mapper does not know, and
    /// [`FilterError::EmptyPredicate`] when eliding `objectClass`
    /// terms leaves nothing to lower.
    pub fn evaluate(&self, filter: &Filter) -> Result<Predicate, FilterError> {
        match filter {
            Filter::And(children) => self.lower_compound(children, Predicate::And),
            Filter::Or(children) => self.lower_compound(children, Predicate::Or),
            Filter::Not(child) => Ok(self.evaluate(child)?.negate()),
            Filter::Equal { attr, value } => Ok(Predicate::EqFold(
                self.resolve(attr)?.to_string(),
                self.mapper.map_assertion_value(attr, value),
            )),
            Filter::ApproxMatch { attr, value } => Ok(Predicate::EqFold(
                self.resolve(attr)?.to_string(),
                self.mapper.map_assertion_value(attr, value),
            )),
            Filter::Present { attr } => Ok(Predicate::not_null(self.resolve(attr)?)),
            Filter::Substring { attr, substring } => Ok(Predicate::like(
                self.resolve(attr)?,
                build_like_pattern(substring),
            )),
            Filter::GreaterOrEqual { attr, value } => Ok(Predicate::Gte(
                self.resolve(attr)?.to_string(),
                self.mapper.map_assertion_value(attr, value),
            )),
            Filter::LessOrEqual { attr, value } => Ok(Predicate::Lte(
                self.resolve(attr)?.to_string(),
                self.mapper.map_assertion_value(attr, value),
            )),
        }
    }

    fn lower_compound(
        &self,
        children: &[Filter],
        combine: fn(Vec<Predicate>) -> Predicate,
    ) -> Result<Predicate, FilterError> {
        let mut predicates = Vec::with_capacity(children.len());
        for child in children {
            if child.is_object_class_term() {
                continue;
            }
            predicates.push(self.evaluate(child)?);
        }

        match predicates.len() {
            0 => Err(FilterError::EmptyPredicate),
            1 => Ok(predicates.remove(0)),
            _ => Ok(combine(predicates)),
        }
    }

    fn resolve(&self, attr: &str) -> Result<&'static str, FilterError> {
        if attr.eq_ignore_ascii_case("objectClass") {
            // Routes fetch selection at the handler level.
            return Err(FilterError::EmptyPredicate);
        }
        self.mapper
            .map_attribute(attr)
            .ok_or_else(|| FilterError::UnmappedAttribute(attr.to_string()))
    }
}

/// Builds a SQL `LIKE` pattern from substring components.
///
/// Wildcards become `%`; `%`, `_` and `\` inside user-supplied parts
/// are escaped with `\`. A missing initial produces a leading `%`; a
/// missing final leaves the pattern open-ended.
fn build_like_pattern(substring: &Substring) -> String {
    let mut pattern = String::new();

    match &substring.initial {
        Some(initial) => {
            pattern.push_str(&escape_like_value(initial));
            pattern.push('%');
        }
        None => pattern.push('%'),
    }

    for any in &substring.any {
        pattern.push_str(&escape_like_value(any));
        pattern.push('%');
    }

    if let Some(final_) = &substring.final_ {
        pattern.push_str(&escape_like_value(final_));
    }

    pattern
}

/// Escapes SQL `LIKE` metacharacters in a literal value.
fn escape_like_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::LdapMode;

    fn eval(mode: LdapMode, input: &str) -> Result<Predicate, FilterError> {
        let mapper = AttributeMapper::new(mode);
        let filter = Filter::parse(input).unwrap();
        Evaluator::new(&mapper).evaluate(&filter)
    }

    fn eval_openldap(input: &str) -> Result<Predicate, FilterError> {
        eval(LdapMode::OpenLdap, input)
    }

    #[test]
    fn lowers_equality() {
        assert_eq!(
            eval_openldap("(uid=jdoe)").unwrap(),
            Predicate::EqFold("username".to_string(), "jdoe".to_string())
        );
    }

    #[test]
    fn lowers_presence_to_not_null() {
        assert_eq!(
            eval_openldap("(telephoneNumber=*)").unwrap(),
            Predicate::NotNull("phone".to_string())
        );
    }

    #[test]
    fn lowers_substring_prefix() {
        assert_eq!(
            eval_openldap("(cn=Jo*)").unwrap(),
            Predicate::Like("display_name".to_string(), "Jo%".to_string())
        );
    }

    #[test]
    fn lowers_substring_suffix_with_leading_wildcard() {
        assert_eq!(
            eval_openldap("(mail=*@example.com)").unwrap(),
            Predicate::Like("email".to_string(), "%@example.com".to_string())
        );
    }

    #[test]
    fn lowers_substring_complex() {
        // u*mid*example.com maps to u%mid%example.com
        assert_eq!(
            eval_openldap("(mail=u*mid*example.com)").unwrap(),
            Predicate::Like("email".to_string(), "u%mid%example.com".to_string())
        );
    }

    #[test]
    fn escapes_like_metacharacters() {
        // An initial of "100%" escapes the percent, then appends the
        // wildcard for the '*'.
        let pattern = build_like_pattern(&Substring {
            initial: Some("100%".to_string()),
            any: Vec::new(),
            final_: None,
        });
        assert_eq!(pattern, "100\\%%");

        let underscore = build_like_pattern(&Substring {
            initial: None,
            any: vec!["a_b".to_string()],
            final_: None,
        });
        assert_eq!(underscore, "%a\\_b%");
    }

    #[test]
    fn lowers_ordering_comparisons() {
        assert_eq!(
            eval_openldap("(uid>=m)").unwrap(),
            Predicate::Gte("username".to_string(), "m".to_string())
        );
        assert_eq!(
            eval_openldap("(uid<=m)").unwrap(),
            Predicate::Lte("username".to_string(), "m".to_string())
        );
    }

    #[test]
    fn lowers_approx_to_case_fold() {
        assert_eq!(
            eval_openldap("(cn~=jon)").unwrap(),
            Predicate::EqFold("display_name".to_string(), "jon".to_string())
        );
    }

    #[test]
    fn lowers_boolean_operators() {
        assert_eq!(
            eval_openldap("(&(uid=a)(mail=b@c))").unwrap(),
            Predicate::And(vec![
                Predicate::EqFold("username".to_string(), "a".to_string()),
                Predicate::EqFold("email".to_string(), "b@c".to_string()),
            ])
        );
        assert_eq!(
            eval_openldap("(!(uid=alice))").unwrap(),
            Predicate::Not(Box::new(Predicate::EqFold(
                "username".to_string(),
                "alice".to_string()
            )))
        );
    }

    #[test]
    fn elides_object_class_children() {
        // The objectClass term routes bucket selection, not rows.
        assert_eq!(
            eval_openldap("(&(objectClass=inetOrgPerson)(mail=*@test.com))").unwrap(),
            Predicate::Like("email".to_string(), "%@test.com".to_string())
        );
    }

    #[test]
    fn object_class_only_filter_is_empty_predicate() {
        assert_eq!(
            eval_openldap("(objectClass=inetOrgPerson)"),
            Err(FilterError::EmptyPredicate)
        );
        assert_eq!(
            eval_openldap("(&(objectClass=inetOrgPerson)(objectClass=*))"),
            Err(FilterError::EmptyPredicate)
        );
        assert_eq!(
            eval_openldap("(!(objectClass=person))"),
            Err(FilterError::EmptyPredicate)
        );
    }

    #[test]
    fn unmapped_attribute_fails() {
        assert_eq!(
            eval_openldap("(shoeSize=42)"),
            Err(FilterError::UnmappedAttribute("shoeSize".to_string()))
        );
        // AD names are unmapped in OpenLDAP mode.
        assert_eq!(
            eval_openldap("(sAMAccountName=jdoe)"),
            Err(FilterError::UnmappedAttribute("sAMAccountName".to_string()))
        );
    }

    #[test]
    fn ad_uac_values_translate_to_status() {
        assert_eq!(
            eval(LdapMode::ActiveDirectory, "(userAccountControl=512)").unwrap(),
            Predicate::EqFold("status".to_string(), "enabled".to_string())
        );
        assert_eq!(
            eval(LdapMode::ActiveDirectory, "(userAccountControl=514)").unwrap(),
            Predicate::EqFold("status".to_string(), "disabled".to_string())
        );
    }

    #[test]
    fn single_surviving_child_is_unwrapped() {
        assert_eq!(
            eval_openldap("(&(objectClass=person)(uid=a))").unwrap(),
            Predicate::EqFold("username".to_string(), "a".to_string())
        );
    }

    mod equivalence {
        //! The two filter interpreters must agree: for filters without
        //! objectClass terms, applying the lowered predicate to a
        //! user's row yields the same truth value as the in-memory
        //! matcher on the entry projected from that row.

        use super::*;
        use crate::entry::user_entry;
        use roster_model::{User, UserStatus};

        /// Row-side interpretation of a predicate, mirroring the SQL
        /// renderer's semantics (case-folded equality and LIKE).
        fn row_matches(predicate: &Predicate, user: &User) -> bool {
            match predicate {
                Predicate::Eq(col, v) => column(user, col).is_some_and(|c| c == *v),
                Predicate::EqFold(col, v) => {
                    column(user, col).is_some_and(|c| c.eq_ignore_ascii_case(v))
                }
                Predicate::NotNull(col) => column(user, col).is_some(),
                Predicate::Like(col, pattern) => {
                    column(user, col).is_some_and(|c| like_matches(pattern, &c))
                }
                Predicate::Gte(col, v) => column(user, col).is_some_and(|c| c >= *v),
                Predicate::Lte(col, v) => column(user, col).is_some_and(|c| c <= *v),
                Predicate::And(children) => children.iter().all(|p| row_matches(p, user)),
                Predicate::Or(children) => children.iter().any(|p| row_matches(p, user)),
                Predicate::Not(inner) => !row_matches(inner, user),
            }
        }

        fn column(user: &User, col: &str) -> Option<String> {
            match col {
                "username" => Some(user.username.clone()),
                "display_name" => Some(user.display_name.clone()),
                "email" => Some(user.email.clone()),
                "phone" => user.phone.clone(),
                "status" => Some(user.status.as_str().to_string()),
                _ => None,
            }
        }

        /// Case-insensitive LIKE over `%` wildcards with `\` escapes.
        fn like_matches(pattern: &str, value: &str) -> bool {
            let value = value.to_lowercase();
            let pattern = pattern.to_lowercase();

            let mut parts: Vec<String> = Vec::new();
            let mut current = String::new();
            let mut chars = pattern.chars();
            while let Some(ch) = chars.next() {
                match ch {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            current.push(escaped);
                        }
                    }
                    '%' => {
                        parts.push(std::mem::take(&mut current));
                    }
                    _ => current.push(ch),
                }
            }
            parts.push(current);

            let Some((first, rest)) = parts.split_first() else {
                return false;
            };
            let Some((last, middle)) = rest.split_last() else {
                // No wildcard at all: exact match.
                return value == *first;
            };

            let mut remaining = match value.strip_prefix(first.as_str()) {
                Some(rest) => rest,
                None => return false,
            };
            for part in middle {
                match remaining.find(part.as_str()) {
                    Some(idx) => remaining = &remaining[idx + part.len()..],
                    None => return false,
                }
            }
            remaining.ends_with(last.as_str())
        }

        fn fixture_users() -> Vec<User> {
            let mut alice = User::new("alice", "Alice Q", "alice@test.com", "hash");
            alice.phone = Some("+1-555-0100".to_string());

            let mut bob = User::new("bob", "Bob B", "bob@example.org", "hash");
            bob.status = UserStatus::Disabled;

            let carol = User::new("carol", "Carol", "carol@test.com", "hash");

            vec![alice, bob, carol]
        }

        #[test]
        fn matcher_and_predicate_agree_on_fixtures() {
            let mapper = AttributeMapper::new(LdapMode::OpenLdap);
            let evaluator = Evaluator::new(&mapper);

            let filters = [
                "(uid=alice)",
                "(uid=ALICE)",
                "(mail=*@test.com)",
                "(telephoneNumber=*)",
                "(cn=A*)",
                "(cn=*Q)",
                "(mail=a*test*)",
                "(uid>=b)",
                "(uid<=b)",
                "(cn~=alice q)",
                "(&(uid=alice)(mail=*@test.com))",
                "(|(uid=bob)(uid=carol))",
                "(!(status=disabled))",
                "(&(mail=*@test.com)(!(uid=alice)))",
            ];

            for input in filters {
                let filter = Filter::parse(input).unwrap();
                let predicate = evaluator.evaluate(&filter).unwrap();

                for user in fixture_users() {
                    let entry = user_entry(&user, "dc=example,dc=com", LdapMode::OpenLdap);
                    let via_matcher = crate::filter::matches(&filter, &entry);
                    let via_predicate = row_matches(&predicate, &user);
                    assert_eq!(
                        via_matcher, via_predicate,
                        "interpreters disagree on {input} for {}",
                        user.username
                    );
                }
            }
        }
    }
}
