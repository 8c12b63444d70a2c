//! LDAP TCP listener.
//!
//! Accepts plain-TCP LDAP v3 connections, frames them with
//! [`ldap3_proto`]'s codec and drives each connection on its own task.
//! Messages on a connection are processed serially; a broadcast
//! shutdown signal stops the acceptor loop.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::sink::SinkExt;
use futures_util::stream::StreamExt;
use ldap3_proto::LdapCodec;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::handler::{LdapHandler, LdapResponse};

/// Per-connection session state.
///
/// Each bind supersedes the previous identity; a failed bind reverts
/// the connection to anonymous.
struct LdapSession {
    bound: Option<String>,
}

impl LdapSession {
    const fn new() -> Self {
        Self { bound: None }
    }
}

#[tracing::instrument(name = "ldap-conn", skip(stream, handler))]
async fn client_process(stream: TcpStream, client_addr: SocketAddr, handler: Arc<LdapHandler>) {
    let (r, w) = tokio::io::split(stream);
    let mut reader = FramedRead::new(r, LdapCodec::default());
    let mut writer = FramedWrite::new(w, LdapCodec::default());

    let mut session = LdapSession::new();

    while let Some(Ok(msg)) = reader.next().await {
        match handler.handle_message(msg).await {
            LdapResponse::Unbind => return,
            LdapResponse::Disconnect(response) => {
                let _ = writer.send(response).await;
                break;
            }
            LdapResponse::Bind(bound, response) => {
                session.bound = bound;
                if writer.send(response).await.is_err() {
                    break;
                }
            }
            LdapResponse::Respond(responses) => {
                let mut failed = false;
                for response in responses {
                    if writer.send(response).await.is_err() {
                        failed = true;
                        break;
                    }
                }
                if failed {
                    break;
                }
            }
        }
    }

    tracing::debug!(bound = ?session.bound, "ldap connection closed");
}

async fn acceptor(
    listener: TcpListener,
    handler: Arc<LdapHandler>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, client_addr)) => {
                        let handler = Arc::clone(&handler);
                        tokio::spawn(client_process(stream, client_addr, handler));
                    }
                    Err(err) => {
                        tracing::error!(%err, "ldap accept error, continuing");
                    }
                }
            }
        }
    }
    tracing::info!("ldap listener stopped");
}

/// Binds the LDAP listener and spawns the acceptor loop.
///
/// Binding happens before the task is spawned so startup failures
/// surface to the caller.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub async fn create_ldap_server(
    addr: SocketAddr,
    handler: Arc<LdapHandler>,
    shutdown_rx: broadcast::Receiver<()>,
) -> std::io::Result<tokio::task::JoinHandle<()>> {
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "ldap server listening");

    Ok(tokio::spawn(acceptor(listener, handler, shutdown_rx)))
}
