// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Static `tools/list` catalog (spec §4.I): one tool per FIPA performative
//! plus the bus-introspection tools. `get_pending_messages`'s description
//! is rewritten per caller at list time so an LLM re-reading the tool list
//! notices new traffic without a separate polling tool.
use serde_json::{json, Value};

/// One performative tool per FIPA speech act, sharing a common input shape:
/// `to` (string or array of strings, optional — default is bus-defined),
/// `content` (arbitrary JSON) and `conversationId`/`inReplyTo` (optional).
const PERFORMATIVE_TOOLS: &[(&str, &str)] = &[
    ("fipa_inform", "Inform another agent of a fact."),
    ("fipa_request", "Request another agent perform an action."),
    ("fipa_query_if", "Ask whether a proposition holds."),
    ("fipa_query_ref", "Ask another agent to resolve a reference."),
    (
        "fipa_cfp",
        "Call for proposals; broadcasts to all other agents unless `to` is given.",
    ),
    ("fipa_propose", "Propose a course of action within a conversation."),
    ("fipa_agree", "Agree to a prior request or proposal."),
    ("fipa_refuse", "Refuse a prior request or proposal."),
    ("fipa_subscribe", "Subscribe to future updates on a topic."),
];

fn performative_tool_schema(name: &str, description: &str) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": {
                "to": {
                    "description": "Recipient agent id, or an array of recipient ids. Omit for the performative's default recipient list.",
                    "oneOf": [
                        {"type": "string"},
                        {"type": "array", "items": {"type": "string"}}
                    ]
                },
                "content": { "description": "Arbitrary JSON payload for the message." },
                "conversationId": {
                    "type": "string",
                    "description": "Existing conversation to continue. Omit to start a new one."
                },
                "inReplyTo": {
                    "type": "string",
                    "description": "Id of the message this replies to."
                },
                "ontology": {"type": "string"},
                "language": {"type": "string"},
                "_callerAgentId": {
                    "type": "string",
                    "description": "Fallback sender identity when the connection did not resolve one at initialize time."
                }
            },
            "required": ["content"]
        }
    })
}

fn list_agents_schema() -> Value {
    json!({
        "name": "list_agents",
        "description": "List every agent id currently known to the bus.",
        "inputSchema": {"type": "object", "properties": {}}
    })
}

fn get_pending_messages_schema(pending_count: usize) -> Value {
    json!({
        "name": "get_pending_messages",
        "description": format!(
            "Atomically take up to `limit` pending messages from your inbox. You currently have {pending_count} pending message(s)."
        ),
        "inputSchema": {
            "type": "object",
            "properties": {
                "limit": {"type": "integer", "minimum": 1, "default": 10},
                "_callerAgentId": {"type": "string"}
            }
        }
    })
}

fn get_conversations_schema() -> Value {
    json!({
        "name": "get_conversations",
        "description": "List conversations, optionally filtered to ones you participate in.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "_callerAgentId": {"type": "string"}
            }
        }
    })
}

fn register_agent_schema() -> Value {
    json!({
        "name": "register_agent",
        "description": "Register an agent id as a valid send/receive target on the bus.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "agentId": {"type": "string"}
            },
            "required": ["agentId"]
        }
    })
}

/// Builds the full `tools/list` result for a caller with `pending_count`
/// messages currently waiting in their inbox.
pub fn catalog(pending_count: usize) -> Vec<Value> {
    let mut tools: Vec<Value> = PERFORMATIVE_TOOLS
        .iter()
        .map(|(name, desc)| performative_tool_schema(name, desc))
        .collect();
    tools.push(list_agents_schema());
    tools.push(get_pending_messages_schema(pending_count));
    tools.push(get_conversations_schema());
    tools.push(register_agent_schema());
    tools
}

/// True if `name` names one of the fixed `fipa_*` performative tools.
pub fn is_performative_tool(name: &str) -> bool {
    PERFORMATIVE_TOOLS.iter().any(|(n, _)| *n == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_contains_every_required_tool() {
        let tools = catalog(0);
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        for expected in [
            "fipa_inform",
            "fipa_request",
            "fipa_query_if",
            "fipa_query_ref",
            "fipa_cfp",
            "fipa_propose",
            "fipa_agree",
            "fipa_refuse",
            "fipa_subscribe",
            "list_agents",
            "get_pending_messages",
            "get_conversations",
            "register_agent",
        ] {
            assert!(names.contains(&expected), "missing tool {expected}");
        }
    }

    #[test]
    fn pending_count_is_baked_into_the_description() {
        let tools = catalog(3);
        let tool = tools
            .iter()
            .find(|t| t["name"] == "get_pending_messages")
            .unwrap();
        assert!(tool["description"].as_str().unwrap().contains('3'));
    }

    #[test]
    fn is_performative_tool_rejects_introspection_tools() {
        assert!(is_performative_tool("fipa_request"));
        assert!(!is_performative_tool("list_agents"));
    }
}
