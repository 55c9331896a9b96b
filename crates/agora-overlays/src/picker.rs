// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! A scrollable selection list: `j`/`k` or arrows move, `1..9` jump straight
//! to an item, Enter selects, Esc cancels (spec §4.G).
use crossterm::event::{KeyCode, KeyEvent};

/// Outcome of feeding one key event to a [`Picker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerOutcome {
    /// The key was consumed; the overlay stays open.
    Consumed,
    /// The item at this index in `items` was chosen.
    Selected(usize),
    /// Esc: close the overlay without a selection.
    Cancelled,
}

/// A bounded, scrollable list of labelled entries.
pub struct Picker {
    pub title: String,
    pub items: Vec<String>,
    pub selected: usize,
    pub scroll_offset: usize,
    pub max_visible: usize,
}

impl Picker {
    pub fn new(title: impl Into<String>, items: Vec<String>) -> Self {
        Picker {
            title: title.into(),
            items,
            selected: 0,
            scroll_offset: 0,
            max_visible: 10,
        }
    }

    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.items.len();
        self.adjust_scroll();
    }

    pub fn select_prev(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = self.selected.checked_sub(1).unwrap_or(self.items.len() - 1);
        self.adjust_scroll();
    }

    /// The visible slice of `items` given the current scroll offset.
    pub fn visible_items(&self) -> &[String] {
        let end = (self.scroll_offset + self.max_visible).min(self.items.len());
        &self.items[self.scroll_offset..end]
    }

    fn adjust_scroll(&mut self) {
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + self.max_visible {
            self.scroll_offset = self.selected + 1 - self.max_visible;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PickerOutcome {
        match key.code {
            KeyCode::Esc => PickerOutcome::Cancelled,
            KeyCode::Enter => {
                if self.items.is_empty() {
                    PickerOutcome::Cancelled
                } else {
                    PickerOutcome::Selected(self.selected)
                }
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.select_next();
                PickerOutcome::Consumed
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.select_prev();
                PickerOutcome::Consumed
            }
            KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
                let idx = c.to_digit(10).unwrap() as usize - 1;
                if idx < self.items.len() {
                    PickerOutcome::Selected(idx)
                } else {
                    PickerOutcome::Consumed
                }
            }
            _ => PickerOutcome::Consumed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE).with_kind(KeyEventKind::Press)
    }

    fn picker(n: usize) -> Picker {
        Picker::new("pick one", (0..n).map(|i| format!("item{i}")).collect())
    }

    #[test]
    fn select_next_wraps_around() {
        let mut p = picker(3);
        p.select_next();
        p.select_next();
        p.select_next();
        assert_eq!(p.selected, 0);
    }

    #[test]
    fn digit_key_jumps_straight_to_item() {
        let mut p = picker(5);
        assert_eq!(p.handle_key(key(KeyCode::Char('3'))), PickerOutcome::Selected(2));
    }

    #[test]
    fn enter_selects_current_item() {
        let mut p = picker(5);
        p.select_next();
        assert_eq!(p.handle_key(key(KeyCode::Enter)), PickerOutcome::Selected(1));
    }

    #[test]
    fn esc_cancels() {
        let mut p = picker(5);
        assert_eq!(p.handle_key(key(KeyCode::Esc)), PickerOutcome::Cancelled);
    }

    #[test]
    fn scroll_follows_selection_past_the_visible_window() {
        let mut p = picker(20);
        p.max_visible = 5;
        for _ in 0..6 {
            p.select_next();
        }
        assert!(p.scroll_offset > 0);
        assert_eq!(p.visible_items().len(), 5);
    }
}
