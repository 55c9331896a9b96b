// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Request handling for one tool-socket connection: `initialize`,
//! `tools/list`, `tools/call` (spec §4.I). Owned per connection task — the
//! resolved agent id lives in `conn_agent_id`, not shared across clients.
use serde_json::{json, Value};

use agora_acl::Performative;

use crate::bus_actor::BusHandle;
use crate::identity::IdentityResolver;
use crate::tools;
use crate::wire::{JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND, PARSE_ERROR, TOOL_CALL_ERROR};

fn performative_from_tool_name(name: &str) -> Option<Performative> {
    Some(match name {
        "fipa_inform" => Performative::Inform,
        "fipa_request" => Performative::Request,
        "fipa_query_if" => Performative::QueryIf,
        "fipa_query_ref" => Performative::QueryRef,
        "fipa_cfp" => Performative::Cfp,
        "fipa_propose" => Performative::Propose,
        "fipa_agree" => Performative::Agree,
        "fipa_refuse" => Performative::Refuse,
        "fipa_subscribe" => Performative::Subscribe,
        _ => return None,
    })
}

fn recipients_from(args: &Value) -> Option<Vec<String>> {
    match args.get("to") {
        Some(Value::String(s)) => Some(vec![s.clone()]),
        Some(Value::Array(a)) => Some(
            a.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
        _ => None,
    }
}

fn string_field(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Honors `_callerAgentId` as a fallback over the connection's identity
/// resolved at `initialize` time.
fn effective_sender(args: &Value, conn_agent_id: &Option<String>) -> Option<String> {
    string_field(args, "_callerAgentId").or_else(|| conn_agent_id.clone())
}

async fn call_performative(
    bus: &BusHandle,
    performative: Performative,
    args: &Value,
    conn_agent_id: &Option<String>,
) -> Result<Value, String> {
    let sender = effective_sender(args, conn_agent_id)
        .ok_or_else(|| "no caller identity: pass _callerAgentId or call initialize first".to_string())?;
    let content = args.get("content").cloned().unwrap_or(Value::Null);
    let conversation_id = string_field(args, "conversationId");
    let in_reply_to = string_field(args, "inReplyTo");
    let ontology = string_field(args, "ontology");
    let language = string_field(args, "language");
    let receivers = recipients_from(args);

    bus.send(
        &sender,
        receivers,
        performative,
        content,
        conversation_id,
        in_reply_to,
        ontology,
        language,
    )
    .await
    .map(|conversation_id| json!({ "success": true, "conversationId": conversation_id }))
    .map_err(|e| e.to_string())
}

async fn call_introspection_tool(
    name: &str,
    args: &Value,
    bus: &BusHandle,
    conn_agent_id: &Option<String>,
) -> Result<Value, String> {
    match name {
        "list_agents" => Ok(json!(bus.known_agents().await)),
        "get_pending_messages" => {
            let caller = effective_sender(args, conn_agent_id)
                .ok_or_else(|| "no caller identity".to_string())?;
            let limit = args
                .get("limit")
                .and_then(Value::as_u64)
                .unwrap_or(10) as usize;
            Ok(json!(bus.take_pending(&caller, limit).await))
        }
        "get_conversations" => {
            let caller = effective_sender(args, conn_agent_id);
            Ok(json!(bus.conversations_for(caller).await))
        }
        "register_agent" => {
            let agent_id = string_field(args, "agentId")
                .ok_or_else(|| "missing required field: agentId".to_string())?;
            bus.register_agent(agent_id.clone()).await;
            Ok(json!({ "registered": agent_id }))
        }
        _ => Err(format!("unknown tool: {name}")),
    }
}

async fn handle_tools_call(
    params: &Value,
    bus: &BusHandle,
    conn_agent_id: &Option<String>,
) -> Result<Value, String> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing required field: name".to_string())?;
    let args = params.get("arguments").cloned().unwrap_or(json!({}));

    if let Some(performative) = performative_from_tool_name(name) {
        call_performative(bus, performative, &args, conn_agent_id).await
    } else {
        call_introspection_tool(name, &args, bus, conn_agent_id).await
    }
}

async fn handle_initialize(
    params: &Value,
    bus: &BusHandle,
    identity: &IdentityResolver,
    conn_agent_id: &mut Option<String>,
) -> Value {
    let explicit = string_field(params, "agentId");
    let ancestor_pids: Vec<libc::pid_t> = params
        .get("ancestorPids")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_i64).map(|p| p as libc::pid_t).collect())
        .unwrap_or_default();
    let agent_type = string_field(params, "agentType");

    let resolved = identity.resolve(explicit.as_deref(), &ancestor_pids, agent_type.as_deref());
    if let Some(id) = &resolved {
        bus.register_agent(id.clone()).await;
    }
    *conn_agent_id = resolved.clone();

    json!({
        "protocolVersion": "2024-11-05",
        "capabilities": { "tools": { "listChanged": true } },
        "serverInfo": { "name": "agora-mcp", "version": env!("CARGO_PKG_VERSION") },
        "assignedAgentId": resolved,
    })
}

async fn handle_tools_list(bus: &BusHandle, conn_agent_id: &Option<String>) -> Value {
    let pending = match conn_agent_id {
        Some(id) => bus.pending_count(id).await,
        None => 0,
    };
    json!({ "tools": tools::catalog(pending) })
}

/// Processes one parsed request, returning the response to write back.
/// `conn_agent_id` persists across calls on the same connection: it is set
/// by `initialize` and consulted (as a default) by every later call.
pub async fn handle_request(
    req: JsonRpcRequest,
    bus: &BusHandle,
    identity: &IdentityResolver,
    conn_agent_id: &mut Option<String>,
) -> JsonRpcResponse {
    let id = req.id.clone().unwrap_or(Value::Null);
    let params = req.params.clone().unwrap_or(json!({}));

    match req.method.as_str() {
        "initialize" => {
            let result = handle_initialize(&params, bus, identity, conn_agent_id).await;
            JsonRpcResponse::ok(id, result)
        }
        "tools/list" => JsonRpcResponse::ok(id, handle_tools_list(bus, conn_agent_id).await),
        "tools/call" => match handle_tools_call(&params, bus, conn_agent_id).await {
            Ok(result) => JsonRpcResponse::ok(id, result),
            Err(message) => JsonRpcResponse::err(id, TOOL_CALL_ERROR, message),
        },
        other => JsonRpcResponse::err(id, METHOD_NOT_FOUND, format!("unknown method: {other}")),
    }
}

/// Builds the parse-error response for a line that failed to deserialize
/// as a `JsonRpcRequest`.
pub fn parse_error_response() -> JsonRpcResponse {
    JsonRpcResponse::err(Value::Null, PARSE_ERROR, "invalid JSON-RPC request")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus_actor::BusHandle;

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: Some("2.0".into()),
            id: Some(json!(1)),
            method: method.into(),
            params: Some(params),
        }
    }

    #[tokio::test]
    async fn initialize_resolves_explicit_agent_id() {
        let (actor, handle) = BusHandle::new();
        tokio::spawn(actor.run());
        let identity = IdentityResolver::new();
        let mut conn_agent_id = None;

        let resp = handle_request(
            request("initialize", json!({"agentId": "claude-1"})),
            &handle,
            &identity,
            &mut conn_agent_id,
        )
        .await;

        assert_eq!(conn_agent_id.as_deref(), Some("claude-1"));
        assert_eq!(resp.result.unwrap()["assignedAgentId"], "claude-1");
    }

    #[tokio::test]
    async fn tools_list_embeds_pending_count_for_resolved_caller() {
        let (actor, handle) = BusHandle::new();
        tokio::spawn(actor.run());
        let identity = IdentityResolver::new();
        let mut conn_agent_id = None;
        handle_request(
            request("initialize", json!({"agentId": "codex-1"})),
            &handle,
            &identity,
            &mut conn_agent_id,
        )
        .await;
        handle.register_agent("claude-1").await;
        handle
            .send(
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

        let resp = handle_request(
            request("tools/list", json!({})),
            &handle,
            &identity,
            &mut conn_agent_id,
        )
        .await;
        let tools = resp.result.unwrap()["tools"].clone();
        let pending_tool = tools
            .as_array()
            .unwrap()
            .iter()
            .find(|t| t["name"] == "get_pending_messages")
            .unwrap()
            .clone();
        assert!(pending_tool["description"].as_str().unwrap().contains('1'));
    }

    #[tokio::test]
    async fn tools_call_unknown_method_is_minus_32601() {
        let (actor, handle) = BusHandle::new();
        tokio::spawn(actor.run());
        let identity = IdentityResolver::new();
        let mut conn_agent_id = None;
        let resp = handle_request(
            request("not/a/method", json!({})),
            &handle,
            &identity,
            &mut conn_agent_id,
        )
        .await;
        assert_eq!(resp.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn fipa_request_without_identity_is_a_tool_call_error() {
        let (actor, handle) = BusHandle::new();
        tokio::spawn(actor.run());
        let identity = IdentityResolver::new();
        let mut conn_agent_id = None;
        let resp = handle_request(
            request(
                "tools/call",
                json!({"name": "fipa_request", "arguments": {"to": "codex-1", "content": {}}}),
            ),
            &handle,
            &identity,
            &mut conn_agent_id,
        )
        .await;
        assert_eq!(resp.error.unwrap().code, TOOL_CALL_ERROR);
    }

    #[tokio::test]
    async fn caller_agent_id_fallback_overrides_missing_conn_identity() {
        let (actor, handle) = BusHandle::new();
        tokio::spawn(actor.run());
        handle.register_agent("claude-1").await;
        handle.register_agent("codex-1").await;
        let identity = IdentityResolver::new();
        let mut conn_agent_id = None;

        let resp = handle_request(
            request(
                "tools/call",
                json!({
                    "name": "fipa_inform",
                    "arguments": {"to": "codex-1", "content": {"x": 1}, "_callerAgentId": "claude-1"}
                }),
            ),
            &handle,
            &identity,
            &mut conn_agent_id,
        )
        .await;
        assert!(resp.result.is_some());
        assert_eq!(handle.pending_count("codex-1").await, 1);
    }
}
