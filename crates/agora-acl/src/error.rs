// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
#[derive(Debug, thiserror::Error)]
pub enum AclError {
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),
    #[error("unknown-conversation")]
    UnknownConversation(String),
}
