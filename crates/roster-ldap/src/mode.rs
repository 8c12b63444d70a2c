//! LDAP schema dialect selection.

use serde::{Deserialize, Serialize};

/// The schema dialect the server emulates.
///
/// The dialect decides the identity attribute (`uid` vs.
/// `sAMAccountName`), the user and group containers, the status
/// encoding and the objectClass sets. The mode token is translated
/// once at the edge; everything downstream dispatches on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LdapMode {
    /// OpenLDAP-style schema: `inetOrgPerson` users under `ou=users`.
    OpenLdap,
    /// Active Directory-style schema: `user` entries under `cn=Users`.
    ActiveDirectory,
}

impl LdapMode {
    /// Returns the canonical configuration token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenLdap => "openldap",
            Self::ActiveDirectory => "activedirectory",
        }
    }

    /// Parses a configuration token.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "openldap" => Some(Self::OpenLdap),
            "activedirectory" => Some(Self::ActiveDirectory),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip() {
        for mode in [LdapMode::OpenLdap, LdapMode::ActiveDirectory] {
            assert_eq!(LdapMode::from_str_opt(mode.as_str()), Some(mode));
        }
        assert_eq!(LdapMode::from_str_opt("novell"), None);
    }
}
