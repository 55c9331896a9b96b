// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! `agora-bridge` — the per-agent sidecar (spec §4.J).
//!
//! Each hosted agent's own tool configuration invokes this binary, which
//! speaks line-delimited JSON-RPC on stdin/stdout exactly like the tool
//! server does and transparently relays `tools/call` to it over a Unix
//! socket. The hosting agent never sees a missing tool list: `initialize`
//! and `tools/list` are answered from a static catalog before a connection
//! even exists, and a disconnected `tools/call` returns a diagnostic
//! payload instead of hanging.
pub mod client;
pub mod catalog;
pub mod discovery;
pub mod stdio;

pub use client::Client;
