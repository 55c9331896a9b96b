// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! A Pane is just a [`PaneId`] ⇄ agent id association (spec §3 "Pane",
//! §9 "cyclic references ... broken by storing ids"). Bounds, the scroll
//! offset and the zoom flag all live in [`agora_layout::Layout`] and
//! [`agora_compositor::ScrollTable`], which already key by `PaneId`; this
//! struct only resolves a pane to the agent it hosts.
use std::collections::HashMap;

use agora_layout::PaneId;

#[derive(Default)]
pub struct PaneTable {
    agent_of: HashMap<PaneId, String>,
    pane_of: HashMap<String, PaneId>,
}

impl PaneTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pane: PaneId, agent_id: impl Into<String>) {
        let agent_id = agent_id.into();
        self.pane_of.insert(agent_id.clone(), pane);
        self.agent_of.insert(pane, agent_id);
    }

    pub fn remove_pane(&mut self, pane: PaneId) -> Option<String> {
        let agent_id = self.agent_of.remove(&pane)?;
        self.pane_of.remove(&agent_id);
        Some(agent_id)
    }

    pub fn agent_of(&self, pane: PaneId) -> Option<&str> {
        self.agent_of.get(&pane).map(String::as_str)
    }

    pub fn pane_of(&self, agent_id: &str) -> Option<PaneId> {
        self.pane_of.get(agent_id).copied()
    }
}
