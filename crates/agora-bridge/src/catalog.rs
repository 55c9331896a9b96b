// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The bridge's static `tools/list` catalog (spec §4.J "answer ... `tools/
//! list` ... locally with a static tool catalog even before the server is
//! reachable"). This is the same fixed set the tool server itself exposes
//! (`agora_rpc::tools::catalog`) — the bridge doesn't know the real pending
//! count until it's connected, so it always reports zero.
use serde_json::Value;

pub fn catalog() -> Vec<Value> {
    agora_rpc::tools::catalog(0)
}
