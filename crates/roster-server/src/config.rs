//! Server configuration.
//!
//! Configuration is loaded from environment variables with sensible
//! defaults; a `.env` file is honoured when present.

use roster_ldap::LdapMode;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host both listeners bind to.
    pub host: String,

    /// HTTP API port.
    pub http_port: u16,

    /// LDAP listener port.
    pub ldap_port: u16,

    /// Directory namespace root, e.g. `dc=example,dc=com`.
    pub base_dn: String,

    /// LDAP schema dialect.
    pub ldap_mode: LdapMode,

    /// Database connection URL (`sqlite://...` or `postgres://...`).
    pub database_url: String,

    /// Minimum database connections.
    pub db_min_connections: u32,

    /// Maximum database connections.
    pub db_max_connections: u32,

    /// JWT signing secret.
    pub jwt_secret: String,

    /// Token expiration in hours.
    pub jwt_expire_hours: i64,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when `DATABASE_URL` is missing or a variable
    /// fails to parse.
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let host = std::env::var("ROSTER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let http_port = env_parsed("ROSTER_HTTP_PORT", 8080_u16)?;
        let ldap_port = env_parsed("ROSTER_LDAP_PORT", 3389_u16)?;

        let base_dn =
            std::env::var("ROSTER_BASE_DN").unwrap_or_else(|_| "dc=example,dc=com".to_string());

        let mode_token =
            std::env::var("ROSTER_LDAP_MODE").unwrap_or_else(|_| "openldap".to_string());
        let ldap_mode = LdapMode::from_str_opt(&mode_token).ok_or_else(|| {
            anyhow::anyhow!("ROSTER_LDAP_MODE must be 'openldap' or 'activedirectory'")
        })?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let db_min_connections = env_parsed("ROSTER_DB_MIN_CONNECTIONS", 1_u32)?;
        let db_max_connections = env_parsed("ROSTER_DB_MAX_CONNECTIONS", 10_u32)?;

        let jwt_secret = std::env::var("ROSTER_JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("ROSTER_JWT_SECRET environment variable is required"))?;

        let jwt_expire_hours = env_parsed("ROSTER_JWT_EXPIRE_HOURS", 24_i64)?;

        Ok(Self {
            host,
            http_port,
            ldap_port,
            base_dn,
            ldap_mode,
            database_url,
            db_min_connections,
            db_max_connections,
            jwt_secret,
            jwt_expire_hours,
        })
    }

    /// Creates a configuration for testing.
    #[must_use]
    pub fn for_testing(database_url: &str) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            http_port: 0,
            ldap_port: 0,
            base_dn: "dc=example,dc=com".to_string(),
            ldap_mode: LdapMode::OpenLdap,
            database_url: database_url.to_string(),
            db_min_connections: 1,
            db_max_connections: 5,
            jwt_secret: "test-secret".to_string(),
            jwt_expire_hours: 24,
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| anyhow::anyhow!("{name} has an invalid value: {value:?}")),
        Err(_) => Ok(default),
    }
}
