// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Serves `initialize`/`tools/list`/`tools/call` on stdin/stdout, the same
//! wire protocol the tool server speaks (spec §4.J, §6).
use std::sync::Arc;

use agora_rpc::{JsonRpcRequest, JsonRpcResponse};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::warn;

use crate::catalog;
use crate::client::Client;
use crate::discovery::Attempt;

/// Builds the diagnostic payload a disconnected `tools/call` returns (spec
/// §7 "enumerates the discovery paths tried and their observed state").
fn diagnostic_payload(reason: &str, attempts: &[Attempt]) -> Value {
    let tried: Vec<Value> = attempts
        .iter()
        .map(|a| {
            json!({
                "description": a.description,
                "path": a.path.display().to_string(),
                "found": a.found,
            })
        })
        .collect();
    json!({
        "error": format!("tool server unreachable: {reason}"),
        "socket": "no live tool server socket found",
        "triedPaths": tried,
    })
}

async fn handle_initialize(client: &Arc<Client>, params: &Value) -> Value {
    let assigned = client.agent_id().await.or_else(|| {
        params
            .get("agentId")
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    json!({
        "protocolVersion": "2024-11-05",
        "capabilities": { "tools": { "listChanged": true } },
        "serverInfo": { "name": "agora-bridge", "version": env!("CARGO_PKG_VERSION") },
        "assignedAgentId": assigned,
    })
}

async fn handle_tools_call(client: &Arc<Client>, params: &Value) -> Result<Value, Value> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| json!({"error": "missing required field: name"}))?;
    let args = params.get("arguments").cloned().unwrap_or(json!({}));

    if !client.is_connected().await {
        let (_, attempts) = crate::discovery::find_socket();
        return Err(diagnostic_payload("not connected", &attempts));
    }

    client
        .forward_tool_call(name, args)
        .await
        .map_err(|e| diagnostic_payload(&e, &[]))
}

/// Processes one JSON-RPC line against the bridge's local handlers.
async fn handle_line(client: &Arc<Client>, req: JsonRpcRequest) -> JsonRpcResponse {
    let id = req.id.clone().unwrap_or(Value::Null);
    let params = req.params.clone().unwrap_or(json!({}));

    match req.method.as_str() {
        "initialize" => JsonRpcResponse::ok(id, handle_initialize(client, &params).await),
        "tools/list" => JsonRpcResponse::ok(id, json!({ "tools": catalog::catalog() })),
        "tools/call" => match handle_tools_call(client, &params).await {
            Ok(result) => JsonRpcResponse::ok(id, result),
            Err(payload) => JsonRpcResponse::ok(id, payload),
        },
        other => JsonRpcResponse::err(id, -32601, format!("unknown method: {other}")),
    }
}

/// Runs the stdin/stdout JSON-RPC loop until stdin closes (spec §4.J).
pub async fn serve(client: Arc<Client>, stdin: impl tokio::io::AsyncRead + Unpin, stdout: impl AsyncWrite + Unpin) {
    let mut lines = BufReader::new(stdin).lines();
    let mut stdout = stdout;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(l)) => l,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stdin read error");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
            Ok(req) => handle_line(&client, req).await,
            Err(_) => JsonRpcResponse::err(Value::Null, -32700, "invalid JSON-RPC request"),
        };
        let mut out = match serde_json::to_string(&response) {
            Ok(s) => s,
            Err(_) => continue,
        };
        out.push('\n');
        if stdout.write_all(out.as_bytes()).await.is_err() {
            break;
        }
        let _ = stdout.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn initialize_is_answered_locally_without_a_connection() {
        let client = Client::new(Some("claude".to_string()), Some("claude-1".to_string()));
        let req = JsonRpcRequest {
            jsonrpc: Some("2.0".to_string()),
            id: Some(json!(1)),
            method: "initialize".to_string(),
            params: Some(json!({})),
        };
        let resp = handle_line(&client, req).await;
        assert_eq!(resp.result.unwrap()["assignedAgentId"], "claude-1");
    }

    #[tokio::test]
    async fn tools_list_is_non_empty_without_a_connection() {
        let client = Client::new(None, None);
        let req = JsonRpcRequest {
            jsonrpc: Some("2.0".to_string()),
            id: Some(json!(2)),
            method: "tools/list".to_string(),
            params: None,
        };
        let resp = handle_line(&client, req).await;
        let tools = resp.result.unwrap()["tools"].as_array().unwrap().len();
        assert!(tools > 0);
    }

    #[tokio::test]
    async fn tools_call_without_connection_mentions_socket() {
        let client = Client::new(None, None);
        let req = JsonRpcRequest {
            jsonrpc: Some("2.0".to_string()),
            id: Some(json!(3)),
            method: "tools/call".to_string(),
            params: Some(json!({"name": "fipa_inform", "arguments": {}})),
        };
        let resp = handle_line(&client, req).await;
        let result = resp.result.unwrap();
        assert!(result["socket"].as_str().unwrap().contains("socket"));
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let client = Client::new(None, None);
        let req = JsonRpcRequest {
            jsonrpc: Some("2.0".to_string()),
            id: Some(json!(4)),
            method: "not/a/method".to_string(),
            params: None,
        };
        let resp = handle_line(&client, req).await;
        assert_eq!(resp.error.unwrap().code, -32601);
    }
}
