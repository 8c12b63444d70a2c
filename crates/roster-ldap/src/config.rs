//! Runtime LDAP settings.

use serde::{Deserialize, Serialize};

use crate::mode::LdapMode;

/// Settings the LDAP front-end consults per request.
///
/// Held behind a shared lock so the HTTP API can update `base_dn` and
/// `mode` at runtime; handlers snapshot the settings once per request,
/// so a concurrent update affects subsequent requests only. The port
/// is part of the view but only takes effect on restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapSettings {
    /// Directory namespace root, e.g. `dc=example,dc=com`.
    pub base_dn: String,
    /// Schema dialect to emulate.
    pub mode: LdapMode,
    /// Listener port.
    pub port: u16,
}

impl LdapSettings {
    /// Creates settings with the given base DN and mode.
    #[must_use]
    pub fn new(base_dn: impl Into<String>, mode: LdapMode, port: u16) -> Self {
        Self {
            base_dn: base_dn.into(),
            mode,
            port,
        }
    }
}
