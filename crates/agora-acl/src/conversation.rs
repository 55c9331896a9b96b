// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{AclMessage, Performative};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Initiated,
    Pending,
    Agreed,
    Refused,
    Completed,
    Failed,
    Cancelled,
}

impl ConversationState {
    /// Once a conversation reaches one of these states no further message
    /// advances it back to a non-terminal value (spec §8 "Conversation
    /// closure").
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ConversationState::Completed
                | ConversationState::Refused
                | ConversationState::Cancelled
                | ConversationState::Failed
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub initiator: String,
    pub participants: HashSet<String>,
    pub protocol: String,
    pub state: ConversationState,
    pub messages: Vec<AclMessage>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Conversation {
    pub fn new(id: String, initiator: String, protocol: String, now: DateTime<Utc>) -> Self {
        let mut participants = HashSet::new();
        participants.insert(initiator.clone());
        Conversation {
            id,
            initiator,
            participants,
            protocol,
            state: ConversationState::Initiated,
            messages: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Appends `msg` and advances the protocol state machine. A no-op on
    /// the state once the conversation has reached a terminal state.
    pub fn record(&mut self, msg: AclMessage) {
        self.participants.insert(msg.sender.clone());
        self.participants.extend(msg.receiver.iter().cloned());
        self.last_activity = msg.timestamp;
        if !self.state.is_terminal() {
            self.state = next_state(self.protocol.as_str(), self.state, &msg, &self.initiator);
        }
        self.messages.push(msg);
    }
}

fn next_state(
    protocol: &str,
    current: ConversationState,
    msg: &AclMessage,
    initiator: &str,
) -> ConversationState {
    use ConversationState::*;
    use Performative::*;

    if msg.performative == Cancel {
        return Cancelled;
    }

    match protocol {
        "fipa-query" => match msg.performative {
            QueryIf | QueryRef => Pending,
            Inform => Completed,
            Refuse => Refused,
            _ => current,
        },
        "fipa-contract-net" => match msg.performative {
            Cfp | Propose => Pending,
            Agree => Agreed,
            Refuse => Refused,
            Inform => Completed,
            _ => current,
        },
        // "fipa-request" and anything unrecognized fall back to the
        // request/agree/refuse/inform table, the minimum the spec requires.
        _ => match msg.performative {
            Request => Pending,
            Agree => Agreed,
            Refuse => Refused,
            Inform if msg.sender != initiator => Completed,
            _ => current,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn msg(performative: Performative, sender: &str, receiver: &str, conv: &str) -> AclMessage {
        AclMessage {
            id: "m1".into(),
            timestamp: Utc::now(),
            performative,
            sender: sender.into(),
            receiver: vec![receiver.into()],
            content: json!({}),
            conversation_id: conv.into(),
            in_reply_to: None,
            reply_by: None,
            ontology: None,
            language: None,
        }
    }

    #[test]
    fn request_then_agree_then_inform_completes() {
        let mut c = Conversation::new("c1".into(), "claude-1".into(), "fipa-request".into(), Utc::now());
        c.record(msg(Performative::Request, "claude-1", "codex-1", "c1"));
        assert_eq!(c.state, ConversationState::Pending);
        c.record(msg(Performative::Agree, "codex-1", "claude-1", "c1"));
        assert_eq!(c.state, ConversationState::Agreed);
        c.record(msg(Performative::Inform, "codex-1", "claude-1", "c1"));
        assert_eq!(c.state, ConversationState::Completed);
    }

    #[test]
    fn refuse_is_terminal_and_ignores_further_messages() {
        let mut c = Conversation::new("c1".into(), "a".into(), "fipa-request".into(), Utc::now());
        c.record(msg(Performative::Request, "a", "b", "c1"));
        c.record(msg(Performative::Refuse, "b", "a", "c1"));
        assert_eq!(c.state, ConversationState::Refused);
        c.record(msg(Performative::Agree, "b", "a", "c1"));
        assert_eq!(c.state, ConversationState::Refused);
    }

    #[test]
    fn cancel_from_either_party_cancels() {
        let mut c = Conversation::new("c1".into(), "a".into(), "fipa-request".into(), Utc::now());
        c.record(msg(Performative::Request, "a", "b", "c1"));
        c.record(msg(Performative::Cancel, "b", "a", "c1"));
        assert_eq!(c.state, ConversationState::Cancelled);
    }
}
