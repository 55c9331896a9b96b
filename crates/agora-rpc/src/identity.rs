// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Resolves the calling agent's id for a connection that never sent an
//! explicit `agentId` (spec §4.I "Identity resolution"): prefer what the
//! request told us, fall back to matching the caller-supplied
//! `ancestorPids` against known PTY child pids, and failing that mint a
//! new external id so the caller is still addressable on the bus.
use std::collections::HashMap;
use std::sync::Mutex;

/// Maps a known PTY child pid to the agent id hosting it, so a tool-socket
/// connection whose `ancestorPids` includes that pid resolves to the right
/// agent without an explicit `agentId` param.
#[derive(Default)]
pub struct IdentityResolver {
    pid_to_agent: Mutex<HashMap<libc::pid_t, String>>,
    ext_counters: Mutex<HashMap<String, u64>>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_pid(&self, pid: libc::pid_t, agent_id: impl Into<String>) {
        self.pid_to_agent
            .lock()
            .unwrap()
            .insert(pid, agent_id.into());
    }

    pub fn unregister_pid(&self, pid: libc::pid_t) {
        self.pid_to_agent.lock().unwrap().remove(&pid);
    }

    fn resolve_by_ancestry(&self, ancestor_pids: &[libc::pid_t]) -> Option<String> {
        let table = self.pid_to_agent.lock().unwrap();
        ancestor_pids.iter().find_map(|pid| table.get(pid).cloned())
    }

    /// Allocates a fresh `{agentType}-ext-<n>` id for a caller that could
    /// not be resolved by ancestry.
    fn allocate_external(&self, agent_type: &str) -> String {
        let mut counters = self.ext_counters.lock().unwrap();
        let n = counters.entry(agent_type.to_string()).or_insert(0);
        *n += 1;
        format!("{agent_type}-ext-{n}")
    }

    /// Resolution order from spec §4.I: explicit `agentId` wins; then
    /// ancestor-pid match against a known PTY child; then a minted
    /// external id; `None` only if no `agent_type` hint was given either.
    pub fn resolve(
        &self,
        explicit_agent_id: Option<&str>,
        ancestor_pids: &[libc::pid_t],
        agent_type_hint: Option<&str>,
    ) -> Option<String> {
        if let Some(id) = explicit_agent_id {
            return Some(id.to_string());
        }
        if let Some(agent) = self.resolve_by_ancestry(ancestor_pids) {
            return Some(agent);
        }
        agent_type_hint.map(|t| self.allocate_external(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_agent_id_wins_over_everything() {
        let resolver = IdentityResolver::new();
        resolver.register_pid(123, "claude-1");
        let id = resolver.resolve(Some("codex-1"), &[123], Some("claude"));
        assert_eq!(id.as_deref(), Some("codex-1"));
    }

    #[test]
    fn ancestry_match_resolves_known_pid() {
        let resolver = IdentityResolver::new();
        resolver.register_pid(456, "gemini-1");
        let id = resolver.resolve(None, &[999, 456], Some("gemini"));
        assert_eq!(id.as_deref(), Some("gemini-1"));
    }

    #[test]
    fn unknown_caller_allocates_external_id() {
        let resolver = IdentityResolver::new();
        let first = resolver.resolve(None, &[], Some("claude")).unwrap();
        let second = resolver.resolve(None, &[], Some("claude")).unwrap();
        assert_eq!(first, "claude-ext-1");
        assert_eq!(second, "claude-ext-2");
    }

    #[test]
    fn no_hint_and_no_match_resolves_to_none() {
        let resolver = IdentityResolver::new();
        assert!(resolver.resolve(None, &[], None).is_none());
    }

    #[test]
    fn unregistering_a_pid_stops_future_ancestry_matches() {
        let resolver = IdentityResolver::new();
        resolver.register_pid(789, "codex-1");
        resolver.unregister_pid(789);
        assert!(resolver.resolve_by_ancestry(&[789]).is_none());
    }
}
