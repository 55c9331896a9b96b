// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Session-level error type (spec §7 "fatal" vs. recoverable errors).
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("pty error: {0}")]
    Pty(#[from] agora_pty::PtyError),
    #[error("layout error: {0}")]
    Layout(#[from] agora_layout::LayoutError),
    #[error("no agent with id {0:?}")]
    UnknownAgent(String),
    #[error("no agent hosted in the focused pane")]
    NoFocusedAgent,
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),
}
