// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The modal state machine (spec §3 ModalState, §4.E mode transitions).
use agora_registers::RegisterKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Insert,
    Normal,
    Visual,
    VLine,
    /// An overlay (picker/input) owns all input; nothing else sees keys.
    Overlay,
    /// Accumulating a `:` command line on the status bar.
    Command,
    /// Accumulating a `/` search pattern on the status bar.
    Search,
}

/// A motion waiting for an operator to act on it, or an operator waiting for
/// its motion (e.g. `y` before the motion key arrives, or `g` before the
/// second `g` of `gg`). Cleared on mode change and on `Esc` (spec §4.E
/// "Cancellation", §9 "pending operator buffer").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOperator {
    Yank,
    /// `d`/`c` and other editing operators: the history is read-only, so
    /// the motion is consumed and [`crate::Action::Noop`] is emitted
    /// (spec §4.E "`d` and related operators are no-ops").
    Discard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingPrefix {
    /// `g` awaiting a second key (`gg`).
    G,
    /// `f`/`F`/`t`/`T` awaiting the character to find.
    FindChar { till: bool, forward: bool },
    /// `"` awaiting the register name letter.
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPos {
    pub line: usize,
    pub col: usize,
}

impl CursorPos {
    pub fn new(line: usize, col: usize) -> Self {
        CursorPos { line, col }
    }
}

/// Full modal state for one pane's input (spec §3). Owned by the session,
/// mutated only through [`ModalState`]'s own methods so count/pending state
/// stays consistent across key events.
pub struct ModalState {
    pub mode: Mode,
    pub normal_cursor: CursorPos,
    pub visual_anchor: CursorPos,
    pub visual_cursor: CursorPos,
    count: Option<u32>,
    pub pending_operator: Option<PendingOperator>,
    pub pending_prefix: Option<PendingPrefix>,
    pub register: Option<char>,
    /// True after the leader key, until the chord's second key resolves or
    /// cancels it (spec §3 ModalState "command_pending").
    pub command_pending: bool,
    /// Set while a `:` or `/` overlay line is open.
    pub prompt_buffer: String,
    /// The mode to return to when a search/command prompt is cancelled.
    pub previous_mode: Mode,
}

impl Default for ModalState {
    fn default() -> Self {
        ModalState {
            mode: Mode::Insert,
            normal_cursor: CursorPos::default(),
            visual_anchor: CursorPos::default(),
            visual_cursor: CursorPos::default(),
            count: None,
            pending_operator: None,
            pending_prefix: None,
            register: None,
            command_pending: false,
            prompt_buffer: String::new(),
            previous_mode: Mode::Insert,
        }
    }
}

impl ModalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a count digit. A leading `0` (no digits accumulated yet) is
    /// not a count at all; the caller should treat it as the `0` motion.
    pub fn push_count_digit(&mut self, digit: u32) {
        self.count = Some(self.count.unwrap_or(0) * 10 + digit);
    }

    pub fn has_count(&self) -> bool {
        self.count.is_some()
    }

    /// Consumes and returns the accumulated count, defaulting to 1.
    pub fn take_count(&mut self) -> u32 {
        self.count.take().unwrap_or(1)
    }

    /// Clears all transient chord state: count, pending operator/prefix and
    /// register selector. Called on `Esc` and on every mode change.
    pub fn clear_pending(&mut self) {
        self.count = None;
        self.pending_operator = None;
        self.pending_prefix = None;
        self.register = None;
        self.command_pending = false;
    }

    pub fn enter_insert(&mut self) {
        self.clear_pending();
        self.mode = Mode::Insert;
    }

    pub fn enter_normal(&mut self, cursor: CursorPos) {
        self.clear_pending();
        self.normal_cursor = cursor;
        self.mode = Mode::Normal;
    }

    pub fn enter_visual(&mut self, line_mode: bool) {
        self.clear_pending();
        self.visual_anchor = self.normal_cursor;
        self.visual_cursor = self.normal_cursor;
        self.mode = if line_mode { Mode::VLine } else { Mode::Visual };
    }

    pub fn visual_register_kind(&self) -> RegisterKind {
        match self.mode {
            Mode::VLine => RegisterKind::Line,
            _ => RegisterKind::Char,
        }
    }

    pub fn enter_search(&mut self) {
        self.previous_mode = self.mode;
        self.prompt_buffer.clear();
        self.mode = Mode::Search;
    }

    pub fn enter_command(&mut self) {
        self.previous_mode = self.mode;
        self.prompt_buffer.clear();
        self.mode = Mode::Command;
    }

    /// Returns to `previous_mode`, clearing the prompt buffer. Used by both
    /// successful execution and `Esc` cancellation of search/command.
    pub fn exit_prompt(&mut self) {
        self.mode = self.previous_mode;
        self.prompt_buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_accumulates_left_to_right() {
        let mut m = ModalState::new();
        m.push_count_digit(1);
        m.push_count_digit(2);
        assert_eq!(m.take_count(), 12);
    }

    #[test]
    fn missing_count_defaults_to_one_and_clears() {
        let mut m = ModalState::new();
        assert_eq!(m.take_count(), 1);
        assert!(!m.has_count());
    }

    #[test]
    fn entering_normal_resets_pending_state() {
        let mut m = ModalState::new();
        m.push_count_digit(3);
        m.pending_operator = Some(PendingOperator::Yank);
        m.enter_normal(CursorPos::new(2, 4));
        assert!(!m.has_count());
        assert!(m.pending_operator.is_none());
        assert_eq!(m.normal_cursor, CursorPos::new(2, 4));
    }

    #[test]
    fn visual_line_mode_uses_line_register_kind() {
        let mut m = ModalState::new();
        m.enter_normal(CursorPos::new(0, 0));
        m.enter_visual(true);
        assert_eq!(m.mode, Mode::VLine);
        assert_eq!(m.visual_register_kind(), RegisterKind::Line);
    }
}
