//! In-memory LDAP entries.
//!
//! An entry is an immutable snapshot: a DN plus multi-valued
//! attributes in emission order. The in-memory matcher evaluates
//! filters against entries; the search handler projects them onto the
//! wire.

use ldap3_proto::proto::{LdapPartialAttribute, LdapSearchResultEntry};
use roster_model::{Group, User};

use crate::attrs::{AttributeMapper, LdapAttrs};
use crate::dn::{build_group_dn, build_user_dn};
use crate::mode::LdapMode;

/// An LDAP entry: DN plus ordered multi-valued attributes.
#[derive(Debug, Clone)]
pub struct LdapEntry {
    /// The entry's distinguished name.
    pub dn: String,
    /// Attributes in emission order.
    pub attrs: LdapAttrs,
}

impl LdapEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(dn: impl Into<String>, attrs: LdapAttrs) -> Self {
        Self {
            dn: dn.into(),
            attrs,
        }
    }

    /// Returns the values of an attribute, resolving the name
    /// case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    /// Returns whether the entry carries an attribute.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Projects the entry onto the requested attribute list and
    /// converts it into a wire result entry. An empty request or a
    /// `*` entry means all attributes; names are matched
    /// case-insensitively.
    #[must_use]
    pub fn into_result_entry(self, requested: &[String]) -> LdapSearchResultEntry {
        let all = requested.is_empty() || requested.iter().any(|r| r == "*");
        let attributes = self
            .attrs
            .into_iter()
            .filter(|(name, _)| {
                all || requested.iter().any(|r| r.eq_ignore_ascii_case(name))
            })
            .map(|(atype, values)| LdapPartialAttribute {
                atype,
                vals: values.into_iter().map(String::into_bytes).collect(),
            })
            .collect();

        LdapSearchResultEntry {
            dn: self.dn,
            attributes,
        }
    }
}

/// Materializes a user as an LDAP entry for the given namespace.
#[must_use]
pub fn user_entry(user: &User, base_dn: &str, mode: LdapMode) -> LdapEntry {
    let dn = build_user_dn(&user.username, &user.display_name, base_dn, mode);
    let mut attrs = AttributeMapper::new(mode).user_to_ldap_attrs(user);
    attrs.push(("dn".to_string(), vec![dn.clone()]));
    LdapEntry::new(dn, attrs)
}

/// Materializes a group as an LDAP entry, projecting members as
/// `member` DNs.
#[must_use]
pub fn group_entry(group: &Group, base_dn: &str, mode: LdapMode) -> LdapEntry {
    let dn = build_group_dn(&group.name, base_dn, mode);
    let member_dns: Vec<String> = group
        .members
        .iter()
        .map(|m| build_user_dn(&m.username, &m.display_name, base_dn, mode))
        .collect();

    let mut attrs =
        AttributeMapper::new(mode).group_to_ldap_attrs(&group.name, &group.description, &member_dns);
    attrs.push(("dn".to_string(), vec![dn.clone()]));
    LdapEntry::new(dn, attrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> LdapEntry {
        LdapEntry::new(
            "uid=jdoe,ou=users,dc=example,dc=com",
            vec![
                ("objectClass".to_string(), vec!["top".to_string(), "person".to_string()]),
                ("uid".to_string(), vec!["jdoe".to_string()]),
                ("mail".to_string(), vec!["jdoe@example.com".to_string()]),
            ],
        )
    }

    #[test]
    fn get_is_case_insensitive() {
        let e = entry();
        assert_eq!(e.get("UID").unwrap(), ["jdoe".to_string()]);
        assert_eq!(e.get("objectclass").unwrap().len(), 2);
        assert!(e.get("missing").is_none());
        assert!(e.has("Mail"));
    }

    #[test]
    fn projection_keeps_requested_attributes() {
        let result = entry().into_result_entry(&["uid".to_string(), "MAIL".to_string()]);
        assert_eq!(result.attributes.len(), 2);
        assert_eq!(result.attributes[0].atype, "uid");
        assert_eq!(result.attributes[1].atype, "mail");
        assert_eq!(result.attributes[1].vals[0], b"jdoe@example.com".to_vec());
    }

    #[test]
    fn empty_request_keeps_all_attributes() {
        let result = entry().into_result_entry(&[]);
        assert_eq!(result.attributes.len(), 3);
        assert_eq!(result.dn, "uid=jdoe,ou=users,dc=example,dc=com");
    }

    #[test]
    fn user_entry_carries_dn_attribute() {
        let user = User::new("jdoe", "John Doe", "jdoe@example.com", "hash");
        let e = user_entry(&user, "dc=example,dc=com", LdapMode::OpenLdap);

        assert_eq!(e.dn, "uid=jdoe,ou=users,dc=example,dc=com");
        assert_eq!(e.get("dn").unwrap(), [e.dn.clone()]);
        assert_eq!(e.get("uid").unwrap(), ["jdoe".to_string()]);
    }

    #[test]
    fn group_entry_projects_member_dns() {
        let alice = User::new("alice", "Alice Q", "alice@example.com", "hash");
        let mut group = Group::new("developers", "Development team");
        group.members.push(alice);

        let e = group_entry(&group, "dc=example,dc=com", LdapMode::OpenLdap);
        assert_eq!(e.dn, "cn=developers,ou=groups,dc=example,dc=com");
        assert_eq!(
            e.get("member").unwrap(),
            ["uid=alice,ou=users,dc=example,dc=com".to_string()]
        );

        let ad = group_entry(&group, "dc=example,dc=com", LdapMode::ActiveDirectory);
        assert_eq!(ad.dn, "cn=developers,cn=Groups,dc=example,dc=com");
        assert_eq!(
            ad.get("member").unwrap(),
            ["cn=Alice Q,cn=Users,dc=example,dc=com".to_string()]
        );
    }
}
