// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

fn default_scrollback() -> usize {
    10_000
}

fn default_leader() -> String {
    "ctrl-space".to_string()
}

fn default_theme() -> String {
    "default".to_string()
}

/// One hosted agent the session should spawn on startup — the config-file
/// side of spec §4.B's `spawn(cmd, args, env, cols, rows)`. `cmd`/`args`
/// themselves are opaque per spec §1 ("the specific command lines and flags
/// of the hosted agents" are out of scope); this struct only says *which*
/// agents to launch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Short type tag, e.g. "claude", "codex", "gemini". Used to build the
    /// `{type}-{n}` agent id and the `{APP}_AGENT_TYPE` env var passed to it.
    #[serde(rename = "type")]
    pub agent_type: String,
    pub cmd: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Default split direction when the first two agents are launched.
    #[serde(default = "default_true")]
    pub split_vertical: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            split_vertical: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Agents to spawn at startup, in order.
    #[serde(default)]
    pub agents: Vec<AgentSpec>,
    #[serde(default)]
    pub layout: LayoutConfig,
    /// Scrollback lines retained per pane grid (§3 Grid.scrollback_max).
    #[serde(default = "default_scrollback")]
    pub scrollback_max: usize,
    /// Leader key combo that enters command-pending state (§4.E).
    #[serde(default = "default_leader")]
    pub leader_key: String,
    /// Color theme name; resolved by the compositor.
    #[serde(default = "default_theme")]
    pub theme: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            agents: Vec::new(),
            layout: LayoutConfig::default(),
            scrollback_max: default_scrollback(),
            leader_key: default_leader(),
            theme: default_theme(),
        }
    }
}
