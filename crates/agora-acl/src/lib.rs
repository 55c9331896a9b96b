// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! FIPA-style ACL message bus: conversations, performative envelopes and
//! bounded per-agent inboxes, reachable from hosted agents through the
//! Unix-socket tool server in `agora-rpc`.
mod bus;
mod conversation;
mod error;
mod inbox;
mod message;

pub use bus::{AclBus, BusEvent, USER_AGENT};
pub use conversation::{Conversation, ConversationState};
pub use error::AclError;
pub use inbox::Inbox;
pub use message::{AclMessage, Performative};
