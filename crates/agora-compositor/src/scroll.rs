// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Per-pane scroll position (spec §4.D "Pane scroll offset semantics").
use std::collections::HashMap;

use agora_layout::PaneId;

/// `offset` is the absolute line index of the first visible row. While
/// `follow_tail` is set, the effective top is recomputed every frame from
/// the pane's current content height instead of being read from `offset`.
#[derive(Debug, Clone, Copy)]
pub struct PaneScroll {
    offset: usize,
    pub follow_tail: bool,
}

impl Default for PaneScroll {
    fn default() -> Self {
        PaneScroll { offset: 0, follow_tail: true }
    }
}

impl PaneScroll {
    fn max_offset(content_height: usize, pane_height: usize) -> usize {
        content_height.saturating_sub(pane_height)
    }

    /// The absolute index of the first line to render this frame.
    pub fn effective_top(&self, content_height: usize, pane_height: usize) -> usize {
        if self.follow_tail {
            Self::max_offset(content_height, pane_height)
        } else {
            self.offset.min(Self::max_offset(content_height, pane_height))
        }
    }

    /// Scrolls by `delta` lines (negative = up/back through history).
    /// Any upward scroll disables follow-tail; scrolling back to the bottom
    /// re-enables it.
    pub fn scroll_by(&mut self, delta: i64, content_height: usize, pane_height: usize) {
        let max = Self::max_offset(content_height, pane_height);
        let top = self.effective_top(content_height, pane_height) as i64;
        let next = (top + delta).clamp(0, max as i64) as usize;
        self.offset = next;
        self.follow_tail = next >= max;
    }

    /// Jumps so `line` is centered in the pane, matching search's
    /// `max(0, match.line - height/2)` jump rule, and disables follow-tail.
    pub fn jump_to(&mut self, line: usize, content_height: usize, pane_height: usize) {
        let top = agora_registers::jump_offset(line, pane_height);
        let max = Self::max_offset(content_height, pane_height);
        self.offset = top.min(max);
        self.follow_tail = self.offset >= max;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_tail = true;
    }
}

/// Scroll state for every pane that has ever been rendered. Panes default
/// to `follow_tail=true` on first access.
#[derive(Default)]
pub struct ScrollTable {
    entries: HashMap<PaneId, PaneScroll>,
}

impl ScrollTable {
    pub fn new() -> Self {
        ScrollTable::default()
    }

    pub fn get_mut(&mut self, pane: PaneId) -> &mut PaneScroll {
        self.entries.entry(pane).or_default()
    }

    pub fn get(&self, pane: PaneId) -> PaneScroll {
        self.entries.get(&pane).copied().unwrap_or_default()
    }

    pub fn remove(&mut self, pane: PaneId) {
        self.entries.remove(&pane);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_tail_pins_to_the_last_content_line() {
        let s = PaneScroll::default();
        assert_eq!(s.effective_top(100, 20), 80);
    }

    #[test]
    fn scrolling_up_disables_follow_tail() {
        let mut s = PaneScroll::default();
        s.scroll_by(-5, 100, 20);
        assert!(!s.follow_tail);
        assert_eq!(s.effective_top(100, 20), 75);
    }

    #[test]
    fn scrolling_back_to_bottom_reenables_follow_tail() {
        let mut s = PaneScroll::default();
        s.scroll_by(-5, 100, 20);
        s.scroll_by(5, 100, 20);
        assert!(s.follow_tail);
    }

    #[test]
    fn jump_to_centers_the_match_and_disables_follow_tail() {
        let mut s = PaneScroll::default();
        s.jump_to(50, 200, 20);
        assert_eq!(s.effective_top(200, 20), 40);
        assert!(!s.follow_tail);
    }
}
