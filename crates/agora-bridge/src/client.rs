// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! A persistent, reconnecting client for the tool server's Unix socket
//! (spec §4.J, §5 "Suspension points").
//!
//! The bridge never blocks the hosting agent on a slow or absent server:
//! [`Client::call`] returns a `disconnected` error immediately if there is
//! no live connection, and the background reconnect loop retries on its own
//! schedule. Once connected, requests are matched to responses by JSON-RPC
//! `id` so concurrent `tools/call`s on the same stdio session don't race
//! each other's replies.
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use agora_rpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::discovery;

/// How long a single outgoing `tools/call` waits for its matching response
/// before the caller sees a timeout error (spec §5 "30 s timeout").
const CALL_TIMEOUT: Duration = Duration::from_secs(30);
/// How long one connect attempt is given before it's abandoned (spec §5
/// "1-5 s" connect timeout).
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
/// How long to wait between reconnect attempts while disconnected.
const RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;

/// A request queued for the writer half of an established connection.
struct Outgoing {
    request: JsonRpcRequest,
    reply: oneshot::Sender<JsonRpcResponse>,
}

/// Shared connection state: `Some` while a socket is live.
struct ConnState {
    tx: mpsc::UnboundedSender<Outgoing>,
}

pub struct Client {
    agent_id: Mutex<Option<String>>,
    agent_type: Option<String>,
    socket_path: Mutex<Option<PathBuf>>,
    conn: Arc<Mutex<Option<ConnState>>>,
    next_id: std::sync::atomic::AtomicU64,
}

impl Client {
    pub fn new(agent_type: Option<String>, explicit_agent_id: Option<String>) -> Arc<Self> {
        Arc::new(Client {
            agent_id: Mutex::new(explicit_agent_id),
            agent_type,
            socket_path: Mutex::new(None),
            conn: Arc::new(Mutex::new(None)),
            next_id: std::sync::atomic::AtomicU64::new(1),
        })
    }

    pub async fn agent_id(&self) -> Option<String> {
        self.agent_id.lock().await.clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    pub async fn socket_path(&self) -> Option<PathBuf> {
        self.socket_path.lock().await.clone()
    }

    /// Spawns the background reconnect loop. Returns immediately; the
    /// caller's stdio loop never waits on this.
    pub fn spawn_background_connect(self: &Arc<Self>) {
        let this = self.clone();
        tokio::spawn(async move {
            loop {
                if this.conn.lock().await.is_none() {
                    discovery::prune_stale();
                    let (path, attempts) = discovery::find_socket();
                    match path {
                        Some(path) => match this.clone().try_connect(&path).await {
                            Ok(()) => {
                                debug!(path = %path.display(), "bridge connected to tool server");
                            }
                            Err(e) => {
                                warn!(error = %e, path = %path.display(), "bridge connect attempt failed");
                            }
                        },
                        None => {
                            debug!(tried = attempts.len(), "no tool server socket found yet");
                        }
                    }
                }
                tokio::time::sleep(RECONNECT_INTERVAL).await;
            }
        });
    }

    async fn try_connect(self: Arc<Self>, path: &std::path::Path) -> anyhow::Result<()> {
        let stream = timeout(CONNECT_TIMEOUT, UnixStream::connect(path)).await??;
        *self.socket_path.lock().await = Some(path.to_path_buf());

        let (read_half, write_half) = stream.into_split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Outgoing>();
        *self.conn.lock().await = Some(ConnState { tx: tx.clone() });

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        // Writer task: drains queued requests onto the socket.
        let mut write_half = write_half;
        let pending_for_writer = pending.clone();
        tokio::spawn(async move {
            while let Some(out) = rx.recv().await {
                let Outgoing { request, reply } = out;
                let id = request
                    .id
                    .as_ref()
                    .and_then(Value::as_u64)
                    .unwrap_or_default();
                pending_for_writer.lock().await.insert(id, reply);
                let mut line = match serde_json::to_string(&request) {
                    Ok(l) => l,
                    Err(_) => continue,
                };
                line.push('\n');
                if write_half.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
            }
        });

        // Reader task: dispatches responses to the pending map, and logs
        // `notifications/tools/list_changed` as the wake-up signal (spec
        // §4.I) — the bridge itself has nothing further to do with it since
        // the hosting agent polls `tools/call get_pending_messages` on its
        // own schedule.
        let conn_for_reader = self.conn.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(read_half).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Ok(resp) = serde_json::from_str::<JsonRpcResponse>(&line) {
                            if let Some(id) = resp.id.as_u64() {
                                if let Some(sender) = pending.lock().await.remove(&id) {
                                    let _ = sender.send(resp);
                                    continue;
                                }
                            }
                        } else if let Ok(notif) =
                            serde_json::from_str::<JsonRpcNotification>(&line)
                        {
                            debug!(method = %notif.method, "notification from tool server");
                        }
                    }
                    Ok(None) | Err(_) => break,
                }
            }
            *conn_for_reader.lock().await = None;
        });

        self.send_initialize().await;
        Ok(())
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
    }

    /// Sends `initialize` as soon as the socket connects, so the server can
    /// resolve our identity and the bridge learns its `assignedAgentId` if
    /// it wasn't given one explicitly (spec §4.I).
    async fn send_initialize(self: &Arc<Self>) {
        let explicit = self.agent_id.lock().await.clone();
        let params = serde_json::json!({
            "agentId": explicit,
            "agentType": self.agent_type,
            "ancestorPids": discovery::ancestor_pids(),
        });
        match self.call_raw("initialize", params).await {
            Ok(result) => {
                if explicit.is_none() {
                    if let Some(id) = result.get("assignedAgentId").and_then(Value::as_str) {
                        *self.agent_id.lock().await = Some(id.to_string());
                    }
                }
            }
            Err(e) => warn!(error = %e, "bridge initialize call failed"),
        }
    }

    /// Low-level call: builds a fresh JSON-RPC request and waits up to
    /// [`CALL_TIMEOUT`] for the matching response.
    async fn call_raw(&self, method: &str, params: Value) -> Result<Value, String> {
        let conn = self.conn.lock().await;
        let Some(state) = conn.as_ref() else {
            return Err("not connected to tool server".to_string());
        };
        let id = self.next_request_id();
        let request = JsonRpcRequest {
            jsonrpc: Some("2.0".to_string()),
            id: Some(Value::from(id)),
            method: method.to_string(),
            params: Some(params),
        };
        let (reply_tx, reply_rx) = oneshot::channel();
        state
            .tx
            .send(Outgoing { request, reply: reply_tx })
            .map_err(|_| "tool server connection closed".to_string())?;
        drop(conn);

        match timeout(CALL_TIMEOUT, reply_rx).await {
            Ok(Ok(resp)) => match resp.error {
                Some(e) => Err(e.message),
                None => Ok(resp.result.unwrap_or(Value::Null)),
            },
            Ok(Err(_)) => Err("tool server connection closed before replying".to_string()),
            Err(_) => Err("tool server call timed out after 30s".to_string()),
        }
    }

    /// Forwards a `tools/call` to the server, injecting `_callerAgentId`
    /// into the arguments so the bus attributes the message correctly even
    /// if the hosting agent never called `initialize` itself (spec §4.J
    /// "inject the bridge's agentId into arguments._callerAgentId").
    pub async fn forward_tool_call(&self, name: &str, mut arguments: Value) -> Result<Value, String> {
        if !arguments.is_object() {
            arguments = serde_json::json!({});
        }
        if let Some(agent_id) = self.agent_id().await {
            arguments
                .as_object_mut()
                .expect("coerced above")
                .insert("_callerAgentId".to_string(), Value::String(agent_id));
        }
        let params = serde_json::json!({ "name": name, "arguments": arguments });
        self.call_raw("tools/call", params).await
    }
}
