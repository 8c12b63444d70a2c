//! Predicate rendering.
//!
//! Turns a [`Predicate`] tree into a `WHERE` clause with `$n`
//! placeholders and a flat argument list. Both supported backends
//! accept `$n` placeholders.
//!
//! Equality folds and LIKE are rendered case-insensitively via
//! `LOWER(...)` so that database-side filtering agrees with the LDAP
//! in-memory matcher regardless of backend collation.

use roster_storage::Predicate;

/// A rendered predicate: SQL fragment plus bound arguments in order.
#[derive(Debug, Clone)]
pub struct RenderedPredicate {
    /// SQL `WHERE` fragment (without the `WHERE` keyword).
    pub sql: String,
    /// Arguments bound to `$1..$n` in order.
    pub args: Vec<String>,
}

/// Renders a predicate, numbering placeholders from `$1`.
#[must_use]
pub fn render(predicate: &Predicate) -> RenderedPredicate {
    let mut sql = String::new();
    let mut args = Vec::new();
    write_predicate(predicate, &mut sql, &mut args);
    RenderedPredicate { sql, args }
}

fn write_predicate(predicate: &Predicate, sql: &mut String, args: &mut Vec<String>) {
    match predicate {
        Predicate::Eq(column, value) => {
            args.push(value.clone());
            sql.push_str(&format!("{column} = ${}", args.len()));
        }
        Predicate::EqFold(column, value) => {
            args.push(value.clone());
            sql.push_str(&format!("LOWER({column}) = LOWER(${})", args.len()));
        }
        Predicate::NotNull(column) => {
            sql.push_str(&format!("{column} IS NOT NULL"));
        }
        Predicate::Like(column, pattern) => {
            args.push(pattern.clone());
            sql.push_str(&format!(
                "LOWER({column}) LIKE LOWER(${}) ESCAPE '\\'",
                args.len()
            ));
        }
        Predicate::Gte(column, value) => {
            args.push(value.clone());
            sql.push_str(&format!("{column} >= ${}", args.len()));
        }
        Predicate::Lte(column, value) => {
            args.push(value.clone());
            sql.push_str(&format!("{column} <= ${}", args.len()));
        }
        Predicate::And(children) => write_compound(children, " AND ", sql, args),
        Predicate::Or(children) => write_compound(children, " OR ", sql, args),
        Predicate::Not(inner) => {
            sql.push_str("NOT (");
            write_predicate(inner, sql, args);
            sql.push(')');
        }
    }
}

fn write_compound(children: &[Predicate], sep: &str, sql: &mut String, args: &mut Vec<String>) {
    sql.push('(');
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            sql.push_str(sep);
        }
        write_predicate(child, sql, args);
    }
    sql.push(')');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_equality() {
        let rendered = render(&Predicate::eq("username", "jdoe"));
        assert_eq!(rendered.sql, "username = $1");
        assert_eq!(rendered.args, vec!["jdoe".to_string()]);
    }

    #[test]
    fn renders_case_fold() {
        let rendered = render(&Predicate::EqFold(
            "display_name".to_string(),
            "John".to_string(),
        ));
        assert_eq!(rendered.sql, "LOWER(display_name) = LOWER($1)");
    }

    #[test]
    fn renders_not_null() {
        let rendered = render(&Predicate::not_null("phone"));
        assert_eq!(rendered.sql, "phone IS NOT NULL");
        assert!(rendered.args.is_empty());
    }

    #[test]
    fn renders_like_with_escape() {
        let rendered = render(&Predicate::like("email", "user%mid%example.com"));
        assert_eq!(
            rendered.sql,
            "LOWER(email) LIKE LOWER($1) ESCAPE '\\'"
        );
        assert_eq!(rendered.args, vec!["user%mid%example.com".to_string()]);
    }

    #[test]
    fn renders_nested_boolean() {
        let predicate = Predicate::And(vec![
            Predicate::Or(vec![
                Predicate::EqFold("display_name".to_string(), "A".to_string()),
                Predicate::EqFold("display_name".to_string(), "B".to_string()),
            ]),
            Predicate::Not(Box::new(Predicate::EqFold(
                "status".to_string(),
                "disabled".to_string(),
            ))),
        ]);
        let rendered = render(&predicate);
        assert_eq!(
            rendered.sql,
            "((LOWER(display_name) = LOWER($1) OR LOWER(display_name) = LOWER($2)) \
             AND NOT (LOWER(status) = LOWER($3)))"
        );
        assert_eq!(rendered.args.len(), 3);
    }

    #[test]
    fn numbers_placeholders_in_order() {
        let predicate = Predicate::And(vec![
            Predicate::eq("username", "a"),
            Predicate::Gte("email".to_string(), "b".to_string()),
            Predicate::Lte("email".to_string(), "c".to_string()),
        ]);
        let rendered = render(&predicate);
        assert_eq!(rendered.sql, "(username = $1 AND email >= $2 AND email <= $3)");
        assert_eq!(rendered.args, vec!["a", "b", "c"]);
    }
}
