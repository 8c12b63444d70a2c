//! Main entry point for the Roster directory server.

#![forbid(unsafe_code)]
#![deny(warnings)]

use roster_server::{Server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        ldap_port = config.ldap_port,
        mode = config.ldap_mode.as_str(),
        "roster starting"
    );

    let server = Server::new(config).await?;
    server.run().await
}
