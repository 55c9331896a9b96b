// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The overlay stack: the `OVERLAY` pseudo-mode routes every key to the top
//! entry and nothing else sees it (spec §4.G).
use crossterm::event::KeyEvent;

use crate::input_box::{InputBox, InputOutcome};
use crate::picker::{Picker, PickerOutcome};

pub enum Overlay {
    Picker(Picker),
    Input(InputBox),
}

/// What the caller should do after an overlay consumed a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackOutcome {
    /// The overlay is still open.
    Consumed,
    /// The picker at the top chose this item; the overlay has been popped.
    PickerSelected(usize),
    /// The input box at the top submitted this text; the overlay has been popped.
    InputSubmitted(String),
    /// The top overlay was dismissed without a result.
    Cancelled,
}

/// A LIFO stack of overlays (e.g. a confirmation prompt opened from within
/// a picker). Only the top entry is visible to [`OverlayStack::handle_key`].
#[derive(Default)]
pub struct OverlayStack {
    entries: Vec<Overlay>,
}

impl OverlayStack {
    pub fn new() -> Self {
        OverlayStack::default()
    }

    pub fn push(&mut self, overlay: Overlay) {
        self.entries.push(overlay);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top(&self) -> Option<&Overlay> {
        self.entries.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Overlay> {
        self.entries.last_mut()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> StackOutcome {
        let Some(top) = self.entries.last_mut() else {
            return StackOutcome::Cancelled;
        };
        match top {
            Overlay::Picker(picker) => match picker.handle_key(key) {
                PickerOutcome::Consumed => StackOutcome::Consumed,
                PickerOutcome::Selected(idx) => {
                    self.entries.pop();
                    StackOutcome::PickerSelected(idx)
                }
                PickerOutcome::Cancelled => {
                    self.entries.pop();
                    StackOutcome::Cancelled
                }
            },
            Overlay::Input(input) => match input.handle_key(key) {
                InputOutcome::Consumed => StackOutcome::Consumed,
                InputOutcome::Submitted(text) => {
                    self.entries.pop();
                    StackOutcome::InputSubmitted(text)
                }
                InputOutcome::Cancelled => {
                    self.entries.pop();
                    StackOutcome::Cancelled
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventKind, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE).with_kind(KeyEventKind::Press)
    }

    #[test]
    fn picker_selection_pops_the_stack() {
        let mut stack = OverlayStack::new();
        stack.push(Overlay::Picker(Picker::new("sessions", vec!["a".into(), "b".into()])));
        let outcome = stack.handle_key(key(KeyCode::Enter));
        assert_eq!(outcome, StackOutcome::PickerSelected(0));
        assert!(stack.is_empty());
    }

    #[test]
    fn input_cancel_pops_the_stack_without_a_result() {
        let mut stack = OverlayStack::new();
        stack.push(Overlay::Input(InputBox::new("name:")));
        let outcome = stack.handle_key(key(KeyCode::Esc));
        assert_eq!(outcome, StackOutcome::Cancelled);
        assert!(stack.is_empty());
    }

    #[test]
    fn keys_with_empty_stack_are_reported_cancelled() {
        let mut stack = OverlayStack::new();
        assert_eq!(stack.handle_key(key(KeyCode::Enter)), StackOutcome::Cancelled);
    }

    #[test]
    fn nested_overlay_only_routes_to_the_top() {
        let mut stack = OverlayStack::new();
        stack.push(Overlay::Picker(Picker::new("sessions", vec!["a".into()])));
        stack.push(Overlay::Input(InputBox::new("confirm name:")));
        stack.handle_key(key(KeyCode::Char('x')));
        match stack.top() {
            Some(Overlay::Input(b)) => assert_eq!(b.buffer, "x"),
            _ => panic!("expected the input box to remain on top"),
        }
    }
}
