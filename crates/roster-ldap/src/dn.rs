//! Distinguished Name building and parsing.
//!
//! DNs are derived, never stored: user and group DNs are projected
//! from the domain model using the active [`LdapMode`]'s containers.
//! Escaping covers RFC 4514's printable set; hex escapes (`\xx`) in
//! parsed values are not decoded here.

use thiserror::Error;

use crate::mode::LdapMode;

/// DN parsing and classification errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DnError {
    /// The DN string was empty.
    #[error("empty DN")]
    Empty,

    /// An RDN component was not of the form `type=value`.
    #[error("malformed RDN component {0:?}")]
    MalformedRdn(String),

    /// The DN does not name a user entry for the active mode.
    #[error("{dn:?} is not a user DN for mode {mode}")]
    NotUserDn {
        /// The offending DN.
        dn: String,
        /// The mode the DN was checked against.
        mode: &'static str,
    },
}

/// One `type=value` component of a DN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rdn {
    /// The attribute type (e.g. `uid`, `cn`, `dc`).
    pub attr_type: String,
    /// The attribute value, unescaped.
    pub value: String,
}

impl std::fmt::Display for Rdn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.attr_type, escape_rdn_value(&self.value))
    }
}

/// Builds a user DN.
///
/// OpenLDAP: `uid=<username>,ou=users,<base>`.
/// AD: `cn=<displayName>,cn=Users,<base>`.
#[must_use]
pub fn build_user_dn(username: &str, display_name: &str, base_dn: &str, mode: LdapMode) -> String {
    match mode {
        LdapMode::ActiveDirectory => format!(
            "cn={},{},{}",
            escape_rdn_value(display_name),
            user_container(mode),
            base_dn
        ),
        LdapMode::OpenLdap => format!(
            "uid={},{},{}",
            escape_rdn_value(username),
            user_container(mode),
            base_dn
        ),
    }
}

/// Builds a group DN.
///
/// OpenLDAP: `cn=<name>,ou=groups,<base>`. AD: `cn=<name>,cn=Groups,<base>`.
#[must_use]
pub fn build_group_dn(name: &str, base_dn: &str, mode: LdapMode) -> String {
    format!(
        "cn={},{},{}",
        escape_rdn_value(name),
        group_container(mode),
        base_dn
    )
}

/// Returns the container DN for user entries.
#[must_use]
pub fn user_base_dn(base_dn: &str, mode: LdapMode) -> String {
    format!("{},{}", user_container(mode), base_dn)
}

/// Returns the container DN for group entries.
#[must_use]
pub fn group_base_dn(base_dn: &str, mode: LdapMode) -> String {
    format!("{},{}", group_container(mode), base_dn)
}

/// Parses a DN string into its RDN components, leftmost first.
///
/// Splits on unescaped commas; each part splits on the first `=` with
/// surrounding whitespace trimmed on both sides. Values unescape any
/// `\<char>` to `<char>`.
///
/// # Errors
///
/// Returns [`DnError::Empty`] for an empty DN and
/// [`DnError::MalformedRdn`] for a component without `=`.
pub fn parse_dn(dn: &str) -> Result<Vec<Rdn>, DnError> {
    if dn.is_empty() {
        return Err(DnError::Empty);
    }

    let mut rdns = Vec::new();
    for part in split_dn(dn) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let Some(idx) = part.find('=') else {
            return Err(DnError::MalformedRdn(part.to_string()));
        };

        rdns.push(Rdn {
            attr_type: part[..idx].trim().to_string(),
            value: unescape_rdn_value(part[idx + 1..].trim()),
        });
    }

    if rdns.is_empty() {
        return Err(DnError::Empty);
    }

    Ok(rdns)
}

/// Returns whether the DN lies under the mode's user container.
///
/// The suffix comparison is case-insensitive.
#[must_use]
pub fn is_user_dn(dn: &str, base_dn: &str, mode: LdapMode) -> bool {
    let suffix = format!(",{}", user_base_dn(base_dn, mode));
    dn.to_lowercase().ends_with(&suffix.to_lowercase())
}

/// Returns whether the DN lies under the mode's group container.
#[must_use]
pub fn is_group_dn(dn: &str, base_dn: &str, mode: LdapMode) -> bool {
    let suffix = format!(",{}", group_base_dn(base_dn, mode));
    dn.to_lowercase().ends_with(&suffix.to_lowercase())
}

/// Extracts the identity value from a user DN.
///
/// OpenLDAP extracts the `uid` value, AD extracts the `cn` value.
///
/// # Errors
///
/// Returns [`DnError::NotUserDn`] if the DN does not end with the
/// mode's user container or the leftmost RDN is not the mode's
/// identity attribute.
pub fn extract_username(dn: &str, base_dn: &str, mode: LdapMode) -> Result<String, DnError> {
    if !is_user_dn(dn, base_dn, mode) {
        return Err(DnError::NotUserDn {
            dn: dn.to_string(),
            mode: mode.as_str(),
        });
    }

    let rdns = parse_dn(dn)?;
    let first = rdns.first().ok_or(DnError::Empty)?;

    let identity_attr = match mode {
        LdapMode::OpenLdap => "uid",
        LdapMode::ActiveDirectory => "cn",
    };

    if !first.attr_type.eq_ignore_ascii_case(identity_attr) {
        return Err(DnError::NotUserDn {
            dn: dn.to_string(),
            mode: mode.as_str(),
        });
    }

    Ok(first.value.clone())
}

const fn user_container(mode: LdapMode) -> &'static str {
    match mode {
        LdapMode::ActiveDirectory => "cn=Users",
        LdapMode::OpenLdap => "ou=users",
    }
}

const fn group_container(mode: LdapMode) -> &'static str {
    match mode {
        LdapMode::ActiveDirectory => "cn=Groups",
        LdapMode::OpenLdap => "ou=groups",
    }
}

/// Splits a DN on commas, respecting escaped commas.
fn split_dn(dn: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut buf = String::new();
    let mut escaped = false;

    for ch in dn.chars() {
        if escaped {
            buf.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' => {
                buf.push(ch);
                escaped = true;
            }
            ',' => {
                parts.push(std::mem::take(&mut buf));
            }
            _ => buf.push(ch),
        }
    }

    if !buf.is_empty() {
        parts.push(buf);
    }

    parts
}

/// Escapes special characters in an RDN value per RFC 4514.
///
/// `,` `+` `"` `\` `<` `>` `;` are always escaped; `#` is escaped at
/// the start; a space is escaped at the start or end.
fn escape_rdn_value(value: &str) -> String {
    let last_index = value
        .char_indices()
        .next_back()
        .map_or(0, |(i, _)| i);

    let mut out = String::with_capacity(value.len());
    for (i, ch) in value.char_indices() {
        match ch {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' => {
                out.push('\\');
                out.push(ch);
            }
            '#' if i == 0 => {
                out.push('\\');
                out.push(ch);
            }
            ' ' if i == 0 || i == last_index => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Removes backslash escapes from an RDN value.
fn unescape_rdn_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut escaped = false;
    for ch in value.chars() {
        if escaped {
            out.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else {
            out.push(ch);
        }
    }
    out
}
