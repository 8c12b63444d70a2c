//! Shared application state.

use std::sync::Arc;

use roster_auth::AuthService;
use roster_ldap::LdapSettings;
use roster_storage::{GroupStore, UserStore};
use tokio::sync::RwLock;

/// State shared by all HTTP handlers.
///
/// The LDAP settings handle is the same one the LDAP front-end reads,
/// so `PUT /ldap/config` takes effect for subsequent LDAP requests.
#[derive(Clone)]
pub struct AppState {
    /// User storage provider.
    pub users: Arc<dyn UserStore>,
    /// Group storage provider.
    pub groups: Arc<dyn GroupStore>,
    /// Authentication service shared with LDAP bind.
    pub auth: Arc<AuthService>,
    /// Runtime LDAP settings.
    pub ldap: Arc<RwLock<LdapSettings>>,
}

impl AppState {
    /// Creates the shared state.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        groups: Arc<dyn GroupStore>,
        auth: Arc<AuthService>,
        ldap: Arc<RwLock<LdapSettings>>,
    ) -> Self {
        Self {
            users,
            groups,
            auth,
            ldap,
        }
    }
}
