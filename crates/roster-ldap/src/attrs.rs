//! LDAP attribute mapping.
//!
//! Translates between LDAP attribute names and internal column names
//! for the active [`LdapMode`], and shapes users and groups into LDAP
//! attribute lists. The `objectClass` attribute is a sentinel handled
//! by callers; it never reaches store-level predicates.

use roster_model::{User, UserStatus};

use crate::mode::LdapMode;

/// Multi-valued LDAP attributes in emission order.
pub type LdapAttrs = Vec<(String, Vec<String>)>;

/// `userAccountControl` value for a normal enabled account.
const AD_UAC_ENABLED: &str = "512";
/// `userAccountControl` value for a disabled account.
const AD_UAC_DISABLED: &str = "514";

/// OpenLDAP attribute name to column name table.
const OPENLDAP_ATTR_MAP: &[(&str, &str)] = &[
    ("uid", "username"),
    ("cn", "display_name"),
    ("displayName", "display_name"),
    ("mail", "email"),
    ("telephoneNumber", "phone"),
    ("status", "status"),
];

/// Active Directory attribute name to column name table.
const AD_ATTR_MAP: &[(&str, &str)] = &[
    ("sAMAccountName", "username"),
    ("cn", "display_name"),
    ("displayName", "display_name"),
    ("mail", "email"),
    ("telephoneNumber", "phone"),
    ("userAccountControl", "status"),
];

/// Mode-keyed translator between LDAP attributes and internal columns.
#[derive(Debug, Clone, Copy)]
pub struct AttributeMapper {
    mode: LdapMode,
}

impl AttributeMapper {
    /// Creates a mapper for the given mode.
    #[must_use]
    pub const fn new(mode: LdapMode) -> Self {
        Self { mode }
    }

    /// Returns the mapper's mode.
    #[must_use]
    pub const fn mode(&self) -> LdapMode {
        self.mode
    }

    /// Maps an LDAP attribute name to its internal column name.
    ///
    /// Resolution is case-insensitive; unknown attributes return
    /// `None`.
    #[must_use]
    pub fn map_attribute(&self, ldap_attr: &str) -> Option<&'static str> {
        self.table()
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(ldap_attr))
            .map(|(_, column)| *column)
    }

    /// Translates an assertion value into the column's encoding.
    ///
    /// In AD mode `userAccountControl` comparisons are translated to
    /// the stored status strings (512 ⇒ enabled, 514 ⇒ disabled) so
    /// database-side filtering agrees with the entry projection.
    #[must_use]
    pub fn map_assertion_value(&self, ldap_attr: &str, value: &str) -> String {
        if self.mode == LdapMode::ActiveDirectory
            && ldap_attr.eq_ignore_ascii_case("userAccountControl")
        {
            return match value {
                AD_UAC_ENABLED => UserStatus::Enabled.as_str().to_string(),
                AD_UAC_DISABLED => UserStatus::Disabled.as_str().to_string(),
                other => other.to_string(),
            };
        }
        value.to_string()
    }

    /// Returns the objectClass values for user entries, most general
    /// first.
    #[must_use]
    pub const fn user_object_classes(&self) -> &'static [&'static str] {
        match self.mode {
            LdapMode::ActiveDirectory => &["top", "person", "organizationalPerson", "user"],
            LdapMode::OpenLdap => &["top", "person", "organizationalPerson", "inetOrgPerson"],
        }
    }

    /// Returns the objectClass values for group entries.
    #[must_use]
    pub const fn group_object_classes(&self) -> &'static [&'static str] {
        match self.mode {
            LdapMode::ActiveDirectory => &["top", "group"],
            LdapMode::OpenLdap => &["top", "groupOfNames"],
        }
    }

    /// Shapes a user into LDAP attributes for the current mode.
    ///
    /// Always includes `objectClass`, `cn` and `displayName`. OpenLDAP
    /// adds `uid`, `sn` (set to the username to satisfy
    /// `inetOrgPerson`'s MUST) and `status`; AD adds `sAMAccountName`
    /// and `userAccountControl`. `mail` and `telephoneNumber` are
    /// omitted when empty.
    #[must_use]
    pub fn user_to_ldap_attrs(&self, user: &User) -> LdapAttrs {
        let mut attrs: LdapAttrs = vec![
            (
                "objectClass".to_string(),
                self.user_object_classes().iter().map(ToString::to_string).collect(),
            ),
            ("cn".to_string(), vec![user.display_name.clone()]),
            ("displayName".to_string(), vec![user.display_name.clone()]),
        ];

        match self.mode {
            LdapMode::ActiveDirectory => {
                attrs.push(("sAMAccountName".to_string(), vec![user.username.clone()]));
                attrs.push((
                    "userAccountControl".to_string(),
                    vec![ad_account_control(user.status).to_string()],
                ));
            }
            LdapMode::OpenLdap => {
                attrs.push(("uid".to_string(), vec![user.username.clone()]));
                attrs.push(("sn".to_string(), vec![user.username.clone()]));
                attrs.push(("status".to_string(), vec![user.status.as_str().to_string()]));
            }
        }

        if !user.email.is_empty() {
            attrs.push(("mail".to_string(), vec![user.email.clone()]));
        }
        if let Some(phone) = user.phone.as_deref() {
            if !phone.is_empty() {
                attrs.push(("telephoneNumber".to_string(), vec![phone.to_string()]));
            }
        }

        attrs
    }

    /// Shapes a group into LDAP attributes for the current mode.
    ///
    /// Omits `description` when empty and `member` when there are no
    /// members.
    #[must_use]
    pub fn group_to_ldap_attrs(
        &self,
        name: &str,
        description: &str,
        member_dns: &[String],
    ) -> LdapAttrs {
        let mut attrs: LdapAttrs = vec![
            (
                "objectClass".to_string(),
                self.group_object_classes().iter().map(ToString::to_string).collect(),
            ),
            ("cn".to_string(), vec![name.to_string()]),
        ];

        if !description.is_empty() {
            attrs.push(("description".to_string(), vec![description.to_string()]));
        }
        if !member_dns.is_empty() {
            attrs.push(("member".to_string(), member_dns.to_vec()));
        }

        attrs
    }

    /// Returns whether the objectClass value names a user entry in
    /// this mode. Matching is case-insensitive and includes the
    /// structural superclasses.
    #[must_use]
    pub fn is_user_object_class(&self, object_class: &str) -> bool {
        let classes: &[&str] = match self.mode {
            LdapMode::ActiveDirectory => &["user", "person", "organizationalPerson"],
            LdapMode::OpenLdap => &["inetOrgPerson", "person", "organizationalPerson"],
        };
        classes.iter().any(|c| c.eq_ignore_ascii_case(object_class))
    }

    /// Returns whether the objectClass value names a group entry in
    /// this mode.
    #[must_use]
    pub fn is_group_object_class(&self, object_class: &str) -> bool {
        let class = match self.mode {
            LdapMode::ActiveDirectory => "group",
            LdapMode::OpenLdap => "groupOfNames",
        };
        class.eq_ignore_ascii_case(object_class)
    }

    const fn table(&self) -> &'static [(&'static str, &'static str)] {
        match self.mode {
            LdapMode::ActiveDirectory => AD_ATTR_MAP,
            LdapMode::OpenLdap => OPENLDAP_ATTR_MAP,
        }
    }
}

/// Converts a status into an AD `userAccountControl` value.
const fn ad_account_control(status: UserStatus) -> &'static str {
    match status {
        UserStatus::Enabled => AD_UAC_ENABLED,
        UserStatus::Disabled => AD_UAC_DISABLED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str, phone: Option<&str>, status: UserStatus) -> User {
        let mut u = User::new("jdoe", "John Doe", email, "hash");
        u.phone = phone.map(ToString::to_string);
        u.status = status;
        u
    }

    fn get<'a>(attrs: &'a LdapAttrs, name: &str) -> Option<&'a Vec<String>> {
        attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    #[test]
    fn map_attribute_openldap() {
        let mapper = AttributeMapper::new(LdapMode::OpenLdap);
        assert_eq!(mapper.map_attribute("uid"), Some("username"));
        assert_eq!(mapper.map_attribute("cn"), Some("display_name"));
        assert_eq!(mapper.map_attribute("displayName"), Some("display_name"));
        assert_eq!(mapper.map_attribute("mail"), Some("email"));
        assert_eq!(mapper.map_attribute("telephoneNumber"), Some("phone"));
        assert_eq!(mapper.map_attribute("status"), Some("status"));
        assert_eq!(mapper.map_attribute("foobar"), None);
        // AD-only names are unknown in OpenLDAP mode.
        assert_eq!(mapper.map_attribute("sAMAccountName"), None);
    }

    #[test]
    fn map_attribute_active_directory() {
        let mapper = AttributeMapper::new(LdapMode::ActiveDirectory);
        assert_eq!(mapper.map_attribute("sAMAccountName"), Some("username"));
        assert_eq!(mapper.map_attribute("cn"), Some("display_name"));
        assert_eq!(mapper.map_attribute("userAccountControl"), Some("status"));
        assert_eq!(mapper.map_attribute("uid"), None);
    }

    #[test]
    fn map_attribute_is_case_insensitive() {
        let mapper = AttributeMapper::new(LdapMode::OpenLdap);
        assert_eq!(mapper.map_attribute("UID"), Some("username"));
        assert_eq!(mapper.map_attribute("displayname"), Some("display_name"));
        assert_eq!(mapper.map_attribute("TELEPHONENUMBER"), Some("phone"));
    }

    #[test]
    fn assertion_value_translates_uac() {
        let mapper = AttributeMapper::new(LdapMode::ActiveDirectory);
        assert_eq!(mapper.map_assertion_value("userAccountControl", "512"), "enabled");
        assert_eq!(mapper.map_assertion_value("userAccountControl", "514"), "disabled");
        assert_eq!(mapper.map_assertion_value("userAccountControl", "66050"), "66050");
        assert_eq!(mapper.map_assertion_value("mail", "a@b"), "a@b");

        let openldap = AttributeMapper::new(LdapMode::OpenLdap);
        assert_eq!(openldap.map_assertion_value("status", "enabled"), "enabled");
    }

    #[test]
    fn user_object_classes_per_mode() {
        assert_eq!(
            AttributeMapper::new(LdapMode::OpenLdap).user_object_classes(),
            &["top", "person", "organizationalPerson", "inetOrgPerson"]
        );
        assert_eq!(
            AttributeMapper::new(LdapMode::ActiveDirectory).user_object_classes(),
            &["top", "person", "organizationalPerson", "user"]
        );
    }

    #[test]
    fn group_object_classes_per_mode() {
        assert_eq!(
            AttributeMapper::new(LdapMode::OpenLdap).group_object_classes(),
            &["top", "groupOfNames"]
        );
        assert_eq!(
            AttributeMapper::new(LdapMode::ActiveDirectory).group_object_classes(),
            &["top", "group"]
        );
    }

    #[test]
    fn user_attrs_openldap_full() {
        let mapper = AttributeMapper::new(LdapMode::OpenLdap);
        let attrs = mapper.user_to_ldap_attrs(&user(
            "jdoe@example.com",
            Some("+1-555-0100"),
            UserStatus::Enabled,
        ));

        assert_eq!(get(&attrs, "cn").unwrap(), &vec!["John Doe".to_string()]);
        assert_eq!(get(&attrs, "displayName").unwrap(), &vec!["John Doe".to_string()]);
        assert_eq!(get(&attrs, "uid").unwrap(), &vec!["jdoe".to_string()]);
        assert_eq!(get(&attrs, "sn").unwrap(), &vec!["jdoe".to_string()]);
        assert_eq!(get(&attrs, "status").unwrap(), &vec!["enabled".to_string()]);
        assert_eq!(get(&attrs, "mail").unwrap(), &vec!["jdoe@example.com".to_string()]);
        assert_eq!(
            get(&attrs, "telephoneNumber").unwrap(),
            &vec!["+1-555-0100".to_string()]
        );
    }

    #[test]
    fn user_attrs_omit_empty_optionals() {
        let mapper = AttributeMapper::new(LdapMode::OpenLdap);
        let attrs = mapper.user_to_ldap_attrs(&user("", None, UserStatus::Enabled));
        assert!(get(&attrs, "mail").is_none());
        assert!(get(&attrs, "telephoneNumber").is_none());
        assert!(get(&attrs, "uid").is_some());
    }

    #[test]
    fn user_attrs_active_directory() {
        let mapper = AttributeMapper::new(LdapMode::ActiveDirectory);

        let enabled = mapper.user_to_ldap_attrs(&user("a@b.com", None, UserStatus::Enabled));
        assert_eq!(get(&enabled, "sAMAccountName").unwrap(), &vec!["jdoe".to_string()]);
        assert_eq!(get(&enabled, "userAccountControl").unwrap(), &vec!["512".to_string()]);
        assert!(get(&enabled, "uid").is_none());
        assert!(get(&enabled, "status").is_none());

        let disabled = mapper.user_to_ldap_attrs(&user("a@b.com", None, UserStatus::Disabled));
        assert_eq!(get(&disabled, "userAccountControl").unwrap(), &vec!["514".to_string()]);
    }

    #[test]
    fn group_attrs_full_and_minimal() {
        let mapper = AttributeMapper::new(LdapMode::OpenLdap);
        let members = vec!["uid=jdoe,ou=users,dc=example,dc=com".to_string()];

        let full = mapper.group_to_ldap_attrs("developers", "Development team", &members);
        assert_eq!(get(&full, "cn").unwrap(), &vec!["developers".to_string()]);
        assert_eq!(
            get(&full, "description").unwrap(),
            &vec!["Development team".to_string()]
        );
        assert_eq!(get(&full, "member").unwrap(), &members);

        let minimal = mapper.group_to_ldap_attrs("empty-group", "", &[]);
        assert!(get(&minimal, "description").is_none());
        assert!(get(&minimal, "member").is_none());
        assert_eq!(
            get(&minimal, "objectClass").unwrap(),
            &vec!["top".to_string(), "groupOfNames".to_string()]
        );
    }

    #[test]
    fn object_class_routing_aliases() {
        let openldap = AttributeMapper::new(LdapMode::OpenLdap);
        assert!(openldap.is_user_object_class("inetOrgPerson"));
        assert!(openldap.is_user_object_class("INETORGPERSON"));
        assert!(openldap.is_user_object_class("person"));
        assert!(openldap.is_user_object_class("organizationalPerson"));
        assert!(!openldap.is_user_object_class("user"));
        assert!(openldap.is_group_object_class("groupOfNames"));
        assert!(!openldap.is_group_object_class("group"));

        let ad = AttributeMapper::new(LdapMode::ActiveDirectory);
        assert!(ad.is_user_object_class("user"));
        assert!(ad.is_user_object_class("person"));
        assert!(!ad.is_user_object_class("inetOrgPerson"));
        assert!(ad.is_group_object_class("group"));
        assert!(!ad.is_group_object_class("groupOfNames"));
    }
}
