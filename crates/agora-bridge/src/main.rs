// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Entry point for the `agora-bridge` sidecar (spec §4.J, §6 environment
//! variables). Invoked by a hosted agent's own tool configuration with
//! stdin/stdout as the transport; logs go to stderr so they never corrupt
//! the JSON-RPC stream the hosting agent reads.
use std::sync::Arc;

use agora_bridge::{client::Client, discovery, stdio};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

#[tokio::main]
async fn main() {
    init_logging();
    discovery::prune_stale();

    let agent_type = std::env::var("AGORA_AGENT_TYPE").ok();
    let agent_id = std::env::var("AGORA_AGENT_ID").ok();
    let client = Client::new(agent_type, agent_id);
    client.spawn_background_connect();

    stdio::serve(client, tokio::io::stdin(), tokio::io::stdout()).await;
}
