// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::VecDeque;

use crate::message::AclMessage;

const INBOX_CAPACITY: usize = 100;

/// FIFO queue of undelivered [`AclMessage`]s for one receiver, bounded with
/// an oldest-drop policy (spec §3 "Inbox").
#[derive(Debug, Default)]
pub struct Inbox {
    queue: VecDeque<AclMessage>,
}

impl Inbox {
    pub fn push(&mut self, msg: AclMessage) {
        if self.queue.len() >= INBOX_CAPACITY {
            self.queue.pop_front();
        }
        self.queue.push_back(msg);
    }

    /// Atomically takes up to `limit` messages in FIFO order.
    pub fn take(&mut self, limit: usize) -> Vec<AclMessage> {
        let n = limit.min(self.queue.len());
        self.queue.drain(..n).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn msg(id: &str) -> AclMessage {
        AclMessage {
            id: id.into(),
            timestamp: Utc::now(),
            performative: crate::message::Performative::Inform,
            sender: "a".into(),
            receiver: vec!["b".into()],
            content: json!({}),
            conversation_id: "c".into(),
            in_reply_to: None,
            reply_by: None,
            ontology: None,
            language: None,
        }
    }

    #[test]
    fn fifo_order_across_multiple_takes() {
        let mut inbox = Inbox::default();
        inbox.push(msg("1"));
        inbox.push(msg("2"));
        inbox.push(msg("3"));
        let first = inbox.take(2);
        assert_eq!(first.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(), vec!["1", "2"]);
        let second = inbox.take(10);
        assert_eq!(second.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(), vec!["3"]);
    }

    #[test]
    fn oldest_drop_once_capacity_is_exceeded() {
        let mut inbox = Inbox::default();
        for i in 0..(INBOX_CAPACITY + 5) {
            inbox.push(msg(&i.to_string()));
        }
        assert_eq!(inbox.len(), INBOX_CAPACITY);
        let remaining = inbox.take(INBOX_CAPACITY);
        assert_eq!(remaining[0].id, "5");
    }
}
