// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The ACL Bus: conversations, inboxes and the FIPA protocol state tables.
//! Owned exclusively by the Tool Server; all state mutation is serialized on
//! the single-threaded event loop by construction (spec §5), so no locking
//! is needed here — callers are expected to hold `&mut AclBus` for the
//! duration of a request.
use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::conversation::{Conversation, ConversationState};
use crate::error::AclError;
use crate::inbox::Inbox;
use crate::message::{AclMessage, Performative};

/// The reserved pseudo-agent id that is always considered to exist (spec
/// §4.I).
pub const USER_AGENT: &str = "user";

/// Fan-out events the compositor / tool server observe. Mirrors the "Event
/// emitter semantics" redesign in spec §9: a subscriber list per event kind,
/// modeled here as one broadcast channel carrying a tagged enum since the
/// whole bus runs on a single event loop.
#[derive(Debug, Clone)]
pub enum BusEvent {
    MessageReceived {
        recipient: String,
        message: AclMessage,
    },
    ConversationStarted {
        conversation_id: String,
    },
    ConversationCompleted {
        conversation_id: String,
    },
}

pub struct AclBus {
    conversations: HashMap<String, Conversation>,
    inboxes: HashMap<String, Inbox>,
    known_agents: std::collections::HashSet<String>,
    events: broadcast::Sender<BusEvent>,
}

impl Default for AclBus {
    fn default() -> Self {
        Self::new()
    }
}

impl AclBus {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        AclBus {
            conversations: HashMap::new(),
            inboxes: HashMap::new(),
            known_agents: std::collections::HashSet::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.events.subscribe()
    }

    /// Registers an agent id as a valid send/receive target and ensures it
    /// has an inbox. `user` is implicitly registered.
    pub fn register_agent(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.inboxes.entry(id.clone()).or_default();
        self.known_agents.insert(id);
    }

    fn agent_exists(&self, id: &str) -> bool {
        id == USER_AGENT || self.known_agents.contains(id)
    }

    /// All known agents except `sender` — the default `cfp` broadcast
    /// recipient list.
    fn all_agents_except(&self, sender: &str) -> Vec<String> {
        self.known_agents
            .iter()
            .filter(|a| a.as_str() != sender)
            .cloned()
            .collect()
    }

    /// Sends a performative. `conversation_id` must already exist if
    /// supplied; otherwise a fresh one is allocated with `sender` as
    /// initiator. Returns the conversation id the message was recorded
    /// under.
    #[allow(clippy::too_many_arguments)]
    pub fn send(
        &mut self,
        sender: &str,
        receivers: Option<Vec<String>>,
        performative: Performative,
        content: Value,
        conversation_id: Option<String>,
        in_reply_to: Option<String>,
        ontology: Option<String>,
        language: Option<String>,
    ) -> Result<String, AclError> {
        let receivers = match receivers {
            Some(r) if !r.is_empty() => r,
            _ => self.all_agents_except(sender),
        };
        for r in &receivers {
            if !self.agent_exists(r) {
                return Err(AclError::UnknownAgent(r.clone()));
            }
        }

        let now = Utc::now();
        let (conv_id, is_new) = match conversation_id {
            Some(id) => {
                if !self.conversations.contains_key(&id) {
                    return Err(AclError::UnknownConversation(id));
                }
                (id, false)
            }
            None => {
                let id = Uuid::new_v4().to_string();
                let protocol = performative.default_protocol().to_string();
                self.conversations
                    .insert(id.clone(), Conversation::new(id.clone(), sender.to_string(), protocol, now));
                (id, true)
            }
        };

        let msg = AclMessage {
            id: Uuid::new_v4().to_string(),
            timestamp: now,
            performative,
            sender: sender.to_string(),
            receiver: receivers.clone(),
            content,
            conversation_id: conv_id.clone(),
            in_reply_to,
            reply_by: None,
            ontology,
            language,
        };

        if is_new {
            let _ = self.events.send(BusEvent::ConversationStarted {
                conversation_id: conv_id.clone(),
            });
        }

        let was_terminal = self
            .conversations
            .get(&conv_id)
            .map(|c| c.state.is_terminal())
            .unwrap_or(false);

        if let Some(conv) = self.conversations.get_mut(&conv_id) {
            conv.record(msg.clone());
        }

        for receiver in &receivers {
            let inbox = self.inboxes.entry(receiver.clone()).or_default();
            inbox.push(msg.clone());
            let _ = self.events.send(BusEvent::MessageReceived {
                recipient: receiver.clone(),
                message: msg.clone(),
            });
        }

        let now_terminal = self
            .conversations
            .get(&conv_id)
            .map(|c| c.state.is_terminal())
            .unwrap_or(false);
        if !was_terminal && now_terminal {
            let _ = self.events.send(BusEvent::ConversationCompleted {
                conversation_id: conv_id.clone(),
            });
        }

        Ok(conv_id)
    }

    /// Atomically drains up to `limit` pending messages for `agent_id`.
    pub fn take_pending(&mut self, agent_id: &str, limit: usize) -> Vec<AclMessage> {
        self.inboxes
            .get_mut(agent_id)
            .map(|ib| ib.take(limit))
            .unwrap_or_default()
    }

    pub fn pending_count(&self, agent_id: &str) -> usize {
        self.inboxes.get(agent_id).map(|ib| ib.len()).unwrap_or(0)
    }

    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        self.conversations.get(id)
    }

    pub fn conversations_for(&self, agent_id: Option<&str>) -> Vec<&Conversation> {
        let mut out: Vec<&Conversation> = self
            .conversations
            .values()
            .filter(|c| agent_id.map(|a| c.participants.contains(a)).unwrap_or(true))
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        out
    }

    pub fn known_agents(&self) -> Vec<String> {
        let mut v: Vec<String> = self.known_agents.iter().cloned().collect();
        v.sort();
        v
    }

    pub fn conversation_state(&self, id: &str) -> Option<ConversationState> {
        self.conversations.get(id).map(|c| c.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn send_to_unknown_agent_is_an_error() {
        let mut bus = AclBus::new();
        bus.register_agent("claude-1");
        let err = bus
            .send(
                "claude-1",
                Some(vec!["ghost".into()]),
                Performative::Inform,
                json!({}),
                None,
                None,
                None,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, AclError::UnknownAgent(a) if a == "ghost"));
    }

    #[test]
    fn send_to_user_never_errors() {
        let mut bus = AclBus::new();
        bus.register_agent("claude-1");
        let result = bus.send(
            "claude-1",
            Some(vec![USER_AGENT.into()]),
            Performative::Inform,
            json!({"msg": "done"}),
            None,
            None,
            None,
            None,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn unknown_conversation_id_is_rejected() {
        let mut bus = AclBus::new();
        bus.register_agent("a");
        bus.register_agent("b");
        let err = bus
            .send(
                "a",
                Some(vec!["b".into()]),
                Performative::Inform,
                json!({}),
                Some("does-not-exist".into()),
                None,
                None,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, AclError::UnknownConversation(_)));
    }

    #[test]
    fn acl_round_trip_matches_spec_scenario_5() {
        let mut bus = AclBus::new();
        bus.register_agent("claude-1");
        bus.register_agent("codex-1");
        let mut events = bus.subscribe();

        let conv_id = bus
            .send(
                "claude-1",
                Some(vec!["codex-1".into()]),
                Performative::Request,
                json!({"action": "build"}),
                None,
                None,
                None,
                None,
            )
            .unwrap();

        assert_eq!(bus.pending_count("codex-1"), 1);
        let pending = bus.take_pending("codex-1", 10);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].sender, "claude-1");
        assert_eq!(pending[0].conversation_id, conv_id);
        assert_eq!(pending[0].performative, Performative::Request);

        let mut saw_message_received = false;
        while let Ok(ev) = events.try_recv() {
            if matches!(ev, BusEvent::MessageReceived { recipient, .. } if recipient == "codex-1") {
                saw_message_received = true;
            }
        }
        assert!(saw_message_received);
    }

    #[test]
    fn per_receiver_fifo_across_multiple_sends() {
        let mut bus = AclBus::new();
        bus.register_agent("a");
        bus.register_agent("b");
        for i in 0..3 {
            bus.send(
                "a",
                Some(vec!["b".into()]),
                Performative::Inform,
                json!({"i": i}),
                None,
                None,
                None,
                None,
            )
            .unwrap();
        }
        let msgs = bus.take_pending("b", 10);
        let ordered: Vec<i64> = msgs.iter().map(|m| m.content["i"].as_i64().unwrap()).collect();
        assert_eq!(ordered, vec![0, 1, 2]);
    }

    #[test]
    fn cfp_broadcasts_to_all_agents_except_sender_sharing_one_conversation() {
        let mut bus = AclBus::new();
        bus.register_agent("claude-1");
        bus.register_agent("codex-1");
        bus.register_agent("gemini-1");
        let conv_id = bus
            .send(
                "claude-1",
                None,
                Performative::Cfp,
                json!({"task": "review"}),
                None,
                None,
                None,
                None,
            )
            .unwrap();
        let codex_msgs = bus.take_pending("codex-1", 10);
        let gemini_msgs = bus.take_pending("gemini-1", 10);
        assert_eq!(codex_msgs.len(), 1);
        assert_eq!(gemini_msgs.len(), 1);
        assert_eq!(codex_msgs[0].conversation_id, conv_id);
        assert_eq!(gemini_msgs[0].conversation_id, conv_id);
    }

    #[test]
    fn conversation_closure_is_permanent() {
        let mut bus = AclBus::new();
        bus.register_agent("a");
        bus.register_agent("b");
        let conv_id = bus
            .send("a", Some(vec!["b".into()]), Performative::Request, json!({}), None, None, None, None)
            .unwrap();
        bus.send("b", Some(vec!["a".into()]), Performative::Refuse, json!({}), Some(conv_id.clone()), None, None, None)
            .unwrap();
        assert_eq!(bus.conversation_state(&conv_id), Some(ConversationState::Refused));
        bus.send("b", Some(vec!["a".into()]), Performative::Agree, json!({}), Some(conv_id.clone()), None, None, None)
            .unwrap();
        assert_eq!(bus.conversation_state(&conv_id), Some(ConversationState::Refused));
    }
}
