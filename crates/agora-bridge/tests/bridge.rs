// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! End-to-end bridge scenarios (spec §8 scenario 6 "Bridge with no
//! server").
use std::io::Cursor;
use std::sync::Arc;

use agora_bridge::client::Client;
use agora_bridge::stdio;
use serde_json::{json, Value};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

async fn run_request(client: &Arc<Client>, request: Value) -> Value {
    let mut input = request.to_string();
    input.push('\n');
    let mut output = Vec::new();
    stdio::serve(client.clone(), Cursor::new(input.into_bytes()), &mut output).await;
    let text = String::from_utf8(output).unwrap();
    serde_json::from_str(text.lines().next().unwrap()).unwrap()
}

#[tokio::test]
async fn tools_list_has_a_non_empty_catalog_without_any_server() {
    let client = Client::new(None, None);
    let resp = run_request(
        &client,
        json!({"jsonrpc":"2.0","id":1,"method":"tools/list"}),
    )
    .await;
    let tools = resp["result"]["tools"].as_array().unwrap();
    assert!(!tools.is_empty());
}

#[tokio::test]
async fn tools_call_without_a_server_mentions_socket_and_tried_paths() {
    std::env::set_var("AGORA_MCP_SOCKET", "/tmp/agora-bridge-test-missing.sock");
    let client = Client::new(Some("claude".to_string()), Some("claude-1".to_string()));
    let resp = run_request(
        &client,
        json!({
            "jsonrpc":"2.0","id":2,"method":"tools/call",
            "params":{"name":"fipa_inform","arguments":{"to":"codex-1","content":{}}}
        }),
    )
    .await;
    std::env::remove_var("AGORA_MCP_SOCKET");
    let payload = &resp["result"];
    assert!(payload["socket"].as_str().unwrap().contains("socket"));
    assert!(payload["triedPaths"].as_array().unwrap().len() >= 1);
}

#[tokio::test]
async fn forwards_tools_call_once_connected_to_a_fake_server() {
    let dir = tempfile::tempdir().unwrap();
    let sock_path = dir.path().join("fake.sock");
    let listener = UnixListener::bind(&sock_path).unwrap();

    // A minimal fake tool server: answers `initialize` with an assigned id
    // and echoes back whatever `tools/call` arguments it was sent so the
    // test can assert `_callerAgentId` was injected.
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();
        use tokio::io::AsyncBufReadExt;
        while let Ok(Some(line)) = lines.next_line().await {
            let req: Value = serde_json::from_str(&line).unwrap();
            let id = req["id"].clone();
            let resp = match req["method"].as_str().unwrap() {
                "initialize" => json!({"jsonrpc":"2.0","id":id,"result":{"assignedAgentId":"claude-1"}}),
                "tools/call" => {
                    json!({"jsonrpc":"2.0","id":id,"result":{"echo": req["params"]["arguments"]}})
                }
                _ => json!({"jsonrpc":"2.0","id":id,"result":{}}),
            };
            let mut line = resp.to_string();
            line.push('\n');
            if write_half.write_all(line.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    std::env::set_var("AGORA_MCP_SOCKET", &sock_path);
    let client = Client::new(Some("claude".to_string()), None);
    client.spawn_background_connect();

    // Give the reconnect loop a moment to connect and run `initialize`.
    let mut connected = false;
    for _ in 0..50 {
        if client.is_connected().await {
            connected = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    std::env::remove_var("AGORA_MCP_SOCKET");
    assert!(connected, "bridge never connected to the fake server");

    let result = client
        .forward_tool_call("fipa_inform", json!({"to": "codex-1"}))
        .await
        .unwrap();
    assert_eq!(result["echo"]["_callerAgentId"], "claude-1");
}
