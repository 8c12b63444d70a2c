//! # roster-server
//!
//! The Roster directory server.
//!
//! Wires the SQL stores, the authentication service, the Axum HTTP API
//! and the LDAP listener together, runs both front-ends concurrently
//! and coordinates shutdown: the first fatal server error or a
//! SIGINT/SIGTERM stops both listeners, with HTTP draining under a
//! 10-second deadline.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;

pub use config::ServerConfig;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use roster_api::{create_router, AppState};
use roster_auth::{AuthService, PasswordHasherService, TokenService};
use roster_ldap::{create_ldap_server, LdapHandler, LdapSettings};
use roster_storage::{GroupStore, UserStore};
use roster_storage_sql::{create_pool, run_migrations, PoolConfig, SqlGroupStore, SqlUserStore};
use sqlx::AnyPool;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, RwLock};

/// How long HTTP connections may drain after a shutdown signal.
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(10);

/// The Roster server.
pub struct Server {
    config: ServerConfig,
    pool: AnyPool,
}

impl Server {
    /// Creates a server: connects the database pool and runs the
    /// schema migration.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be created or the migration
    /// fails.
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let pool_config = PoolConfig::new(&config.database_url)
            .max_connections(config.db_max_connections)
            .min_connections(config.db_min_connections);

        let pool = create_pool(&pool_config).await?;
        run_migrations(&pool).await?;

        tracing::info!("database pool ready");

        Ok(Self { config, pool })
    }

    /// Runs both front-ends until a shutdown signal or a fatal server
    /// error.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error from either listener.
    pub async fn run(self) -> anyhow::Result<()> {
        let users: Arc<dyn UserStore> = Arc::new(SqlUserStore::new(self.pool.clone()));
        let groups: Arc<dyn GroupStore> = Arc::new(SqlGroupStore::new(self.pool.clone()));

        let auth = Arc::new(AuthService::new(
            Arc::clone(&users),
            PasswordHasherService::with_defaults(),
            TokenService::new(&self.config.jwt_secret, self.config.jwt_expire_hours),
        ));

        let ldap_settings = Arc::new(RwLock::new(LdapSettings::new(
            &self.config.base_dn,
            self.config.ldap_mode,
            self.config.ldap_port,
        )));

        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let (err_tx, mut err_rx) = mpsc::channel::<anyhow::Error>(2);

        // LDAP listener; binding fails fast at startup.
        let ldap_handler = Arc::new(LdapHandler::new(
            Arc::clone(&users),
            Arc::clone(&groups),
            Arc::clone(&auth),
            Arc::clone(&ldap_settings),
        ));
        let ldap_addr: SocketAddr =
            format!("{}:{}", self.config.host, self.config.ldap_port).parse()?;
        let ldap_handle =
            create_ldap_server(ldap_addr, ldap_handler, shutdown_tx.subscribe()).await?;

        // HTTP listener.
        let state = AppState::new(users, groups, auth, ldap_settings);
        let app = create_router(state);

        let http_addr: SocketAddr =
            format!("{}:{}", self.config.host, self.config.http_port).parse()?;
        let http_listener = TcpListener::bind(http_addr).await?;
        tracing::info!(addr = %http_addr, "http server listening");

        let mut http_shutdown = shutdown_tx.subscribe();
        let http_err_tx = err_tx.clone();
        let http_handle = tokio::spawn(async move {
            let serve = axum::serve(http_listener, app).with_graceful_shutdown(async move {
                let _ = http_shutdown.recv().await;
            });
            if let Err(err) = serve.await {
                let _ = http_err_tx.send(anyhow::anyhow!("http server error: {err}")).await;
            }
        });

        // Wait for a shutdown signal or the first fatal server error.
        let outcome = tokio::select! {
            () = shutdown_signal() => {
                tracing::info!("shutdown signal received");
                Ok(())
            }
            Some(err) = err_rx.recv() => {
                tracing::error!(%err, "server failed");
                Err(err)
            }
        };

        // Stop both listeners; shutdown errors are reported, not fatal.
        let _ = shutdown_tx.send(());

        if tokio::time::timeout(SHUTDOWN_DEADLINE, http_handle).await.is_err() {
            tracing::error!("http server did not drain within the shutdown deadline");
        }
        if tokio::time::timeout(SHUTDOWN_DEADLINE, ldap_handle).await.is_err() {
            tracing::error!("ldap server did not stop within the shutdown deadline");
        }

        tracing::info!("servers stopped");
        outcome
    }

    /// Returns the database pool.
    #[must_use]
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Waits for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
