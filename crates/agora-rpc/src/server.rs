// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The Unix-socket JSON-RPC server (spec §4.I, §6).
//!
//! Startup sequence:
//!
//! 1. Resolve the socket path (`AGORA_MCP_SOCKET` override, else
//!    `/tmp/agora-mcp-<pid>.sock`) and unlink it if a stale file is there.
//! 2. Bind the listener, chmod it `0666` so any local client can connect.
//! 3. Write a discovery file at `~/.agora/sockets/<pid>` containing the
//!    socket path, so bridges can find this server by its pid.
//! 4. Accept connections forever; each gets its own task sharing one
//!    [`BusHandle`] and [`IdentityResolver`].
//!
//! On shutdown the socket file and discovery file are unlinked, since this
//! process created both.
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use agora_acl::BusEvent;

use crate::bus_actor::BusHandle;
use crate::dispatch;
use crate::identity::IdentityResolver;
use crate::wire::{JsonRpcNotification, JsonRpcRequest};

fn default_socket_path() -> PathBuf {
    if let Ok(p) = std::env::var("AGORA_MCP_SOCKET") {
        return PathBuf::from(p);
    }
    PathBuf::from(format!("/tmp/agora-mcp-{}.sock", std::process::id()))
}

fn discovery_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".agora").join("sockets"))
}

pub struct ToolServer {
    socket_path: PathBuf,
    discovery_path: Option<PathBuf>,
    bus: BusHandle,
    identity: Arc<IdentityResolver>,
}

impl ToolServer {
    pub fn new(bus: BusHandle, identity: Arc<IdentityResolver>) -> Self {
        let socket_path = default_socket_path();
        let discovery_path = discovery_dir().map(|d| d.join(std::process::id().to_string()));
        ToolServer {
            socket_path,
            discovery_path,
            bus,
            identity,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Unlinks a stale socket file, binds, chmods `0666` and writes the
    /// discovery file. Returns the bound listener.
    pub async fn bind(&self) -> io::Result<UnixListener> {
        if self.socket_path.exists() {
            debug!(path = %self.socket_path.display(), "unlinking stale socket");
            std::fs::remove_file(&self.socket_path)?;
        }
        let listener = UnixListener::bind(&self.socket_path)?;
        std::fs::set_permissions(&self.socket_path, std::fs::Permissions::from_mode(0o666))?;

        if let Some(path) = &self.discovery_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, self.socket_path.to_string_lossy().as_bytes())?;
        }

        info!(path = %self.socket_path.display(), "tool server listening");
        Ok(listener)
    }

    /// Accepts connections forever. Each connection runs its own
    /// `initialize`/`tools/list`/`tools/call` handler plus a
    /// `notifications/tools/list_changed` forwarder fed by the ACL bus.
    pub async fn serve(&self, listener: UnixListener) -> anyhow::Result<()> {
        loop {
            let (stream, _addr) = listener.accept().await?;
            let bus = self.bus.clone();
            let identity = self.identity.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, bus, identity).await {
                    warn!(error = %e, "tool socket connection ended with an error");
                }
            });
        }
    }

    /// Unlinks the socket and discovery file. Safe to call even if they were
    /// already removed by something else.
    pub fn shutdown(&self) {
        let _ = std::fs::remove_file(&self.socket_path);
        if let Some(path) = &self.discovery_path {
            let _ = std::fs::remove_file(path);
        }
    }
}

async fn write_json<T: serde::Serialize>(
    writer: &Mutex<tokio::net::unix::OwnedWriteHalf>,
    value: &T,
) -> io::Result<()> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    writer.lock().await.write_all(line.as_bytes()).await
}

async fn handle_connection(
    stream: UnixStream,
    bus: BusHandle,
    identity: Arc<IdentityResolver>,
) -> io::Result<()> {
    let (read_half, write_half) = stream.into_split();
    let writer = Mutex::new(write_half);
    let mut lines = BufReader::new(read_half).lines();
    let mut events = bus.subscribe();
    let mut conn_agent_id: Option<String> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line? {
                    Some(l) => l,
                    None => break,
                };
                if line.trim().is_empty() {
                    continue;
                }
                let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
                    Ok(req) => dispatch::handle_request(req, &bus, &identity, &mut conn_agent_id).await,
                    Err(_) => dispatch::parse_error_response(),
                };
                write_json(&writer, &response).await?;
            }
            ev = events.recv() => {
                match ev {
                    Ok(BusEvent::MessageReceived { recipient, .. }) => {
                        if conn_agent_id.as_deref() == Some(recipient.as_str()) {
                            let notif = JsonRpcNotification::new("notifications/tools/list_changed", None);
                            write_json(&writer, &notif).await?;
                        }
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_acl::Performative;
    use serde_json::json;
    use tokio::io::AsyncBufReadExt as _;

    #[tokio::test]
    async fn bind_creates_socket_with_world_rw_permissions() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("AGORA_MCP_SOCKET", dir.path().join("test.sock"));
        let (actor, bus) = BusHandle::new();
        tokio::spawn(actor.run());
        let server = ToolServer::new(bus, Arc::new(IdentityResolver::new()));
        let listener = server.bind().await.unwrap();
        let meta = std::fs::metadata(server.socket_path()).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o666);
        drop(listener);
        server.shutdown();
        assert!(!server.socket_path().exists());
        std::env::remove_var("AGORA_MCP_SOCKET");
    }

    #[tokio::test]
    async fn connection_notifies_list_changed_when_message_queued() {
        let dir = tempfile::tempdir().unwrap();
        let sock_path = dir.path().join("notify.sock");
        std::env::set_var("AGORA_MCP_SOCKET", &sock_path);
        let (actor, bus) = BusHandle::new();
        tokio::spawn(actor.run());
        bus.register_agent("claude-1").await;
        bus.register_agent("codex-1").await;

        let server = ToolServer::new(bus.clone(), Arc::new(IdentityResolver::new()));
        let listener = server.bind().await.unwrap();
        tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });

        let stream = UnixStream::connect(&sock_path).await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half).lines();

        let init = json!({"jsonrpc":"2.0","id":1,"method":"initialize","params":{"agentId":"codex-1"}});
        write_half
            .write_all(format!("{init}\n").as_bytes())
            .await
            .unwrap();
        let _ = reader.next_line().await.unwrap().unwrap();

        bus.send(
            "claude-1",
            Some(vec!["codex-1".into()]),
            Performative::Inform,
            json!({}),
            None,
            None,
            None,
            None,
        )
        .await
        .unwrap();

        let notif_line = reader.next_line().await.unwrap().unwrap();
        assert!(notif_line.contains("notifications/tools/list_changed"));
        std::env::remove_var("AGORA_MCP_SOCKET");
    }
}
