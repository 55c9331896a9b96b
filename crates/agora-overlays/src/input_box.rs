// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! A single-line text editor overlay: cursor, backspace, delete-word,
//! left/right (spec §4.G).
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    Consumed,
    Submitted(String),
    Cancelled,
}

fn prev_char_boundary(s: &str, pos: usize) -> usize {
    if pos == 0 {
        return 0;
    }
    let mut p = pos - 1;
    while p > 0 && !s.is_char_boundary(p) {
        p -= 1;
    }
    p
}

fn next_char_boundary(s: &str, pos: usize) -> usize {
    if pos >= s.len() {
        return s.len();
    }
    let mut p = pos + 1;
    while p < s.len() && !s.is_char_boundary(p) {
        p += 1;
    }
    p
}

fn prev_word_boundary(s: &str, pos: usize) -> usize {
    let bytes = &s.as_bytes()[..pos];
    let trimmed = bytes.iter().rposition(|&b| b != b' ').map(|i| i + 1).unwrap_or(0);
    bytes[..trimmed].iter().rposition(|&b| b == b' ').map(|i| i + 1).unwrap_or(0)
}

/// A prompt (e.g. "Save session as:") plus an editable single-line buffer.
pub struct InputBox {
    pub prompt: String,
    pub buffer: String,
    pub cursor: usize,
}

impl InputBox {
    pub fn new(prompt: impl Into<String>) -> Self {
        InputBox { prompt: prompt.into(), buffer: String::new(), cursor: 0 }
    }

    pub fn with_initial(prompt: impl Into<String>, initial: impl Into<String>) -> Self {
        let buffer: String = initial.into();
        let cursor = buffer.len();
        InputBox { prompt: prompt.into(), buffer, cursor }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> InputOutcome {
        match key.code {
            KeyCode::Esc => InputOutcome::Cancelled,
            KeyCode::Enter => InputOutcome::Submitted(self.buffer.clone()),
            KeyCode::Char(c) => {
                self.buffer.insert(self.cursor, c);
                self.cursor += c.len_utf8();
                InputOutcome::Consumed
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    let prev = prev_char_boundary(&self.buffer, self.cursor);
                    self.buffer.drain(prev..self.cursor);
                    self.cursor = prev;
                }
                InputOutcome::Consumed
            }
            KeyCode::Delete => {
                if self.cursor < self.buffer.len() {
                    let next = next_char_boundary(&self.buffer, self.cursor);
                    self.buffer.drain(self.cursor..next);
                }
                InputOutcome::Consumed
            }
            KeyCode::Left if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.cursor = prev_word_boundary(&self.buffer, self.cursor);
                InputOutcome::Consumed
            }
            KeyCode::Left => {
                self.cursor = prev_char_boundary(&self.buffer, self.cursor);
                InputOutcome::Consumed
            }
            KeyCode::Right => {
                self.cursor = next_char_boundary(&self.buffer, self.cursor);
                InputOutcome::Consumed
            }
            // Ctrl-W: delete the word behind the cursor (readline convention).
            KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                let start = prev_word_boundary(&self.buffer, self.cursor);
                self.buffer.drain(start..self.cursor);
                self.cursor = start;
                InputOutcome::Consumed
            }
            _ => InputOutcome::Consumed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers).with_kind(KeyEventKind::Press)
    }

    #[test]
    fn typed_chars_insert_at_cursor_and_advance_it() {
        let mut b = InputBox::new("name:");
        b.handle_key(key(KeyCode::Char('h'), KeyModifiers::NONE));
        b.handle_key(key(KeyCode::Char('i'), KeyModifiers::NONE));
        assert_eq!(b.buffer, "hi");
        assert_eq!(b.cursor, 2);
    }

    #[test]
    fn backspace_removes_the_char_before_cursor() {
        let mut b = InputBox::with_initial("name:", "hi");
        b.handle_key(key(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(b.buffer, "h");
        assert_eq!(b.cursor, 1);
    }

    #[test]
    fn ctrl_w_deletes_the_preceding_word() {
        let mut b = InputBox::with_initial("name:", "hello world");
        b.handle_key(key(KeyCode::Char('w'), KeyModifiers::CONTROL));
        assert_eq!(b.buffer, "hello ");
        assert_eq!(b.cursor, 6);
    }

    #[test]
    fn enter_submits_the_buffer_contents() {
        let mut b = InputBox::with_initial("name:", "agent-2");
        assert_eq!(b.handle_key(key(KeyCode::Enter, KeyModifiers::NONE)), InputOutcome::Submitted("agent-2".to_string()));
    }

    #[test]
    fn esc_cancels_without_mutating_the_buffer() {
        let mut b = InputBox::with_initial("name:", "agent-2");
        assert_eq!(b.handle_key(key(KeyCode::Esc, KeyModifiers::NONE)), InputOutcome::Cancelled);
        assert_eq!(b.buffer, "agent-2");
    }

    #[test]
    fn left_right_move_cursor_within_bounds() {
        let mut b = InputBox::with_initial("name:", "hi");
        b.handle_key(key(KeyCode::Left, KeyModifiers::NONE));
        assert_eq!(b.cursor, 1);
        b.handle_key(key(KeyCode::Left, KeyModifiers::NONE));
        b.handle_key(key(KeyCode::Left, KeyModifiers::NONE));
        assert_eq!(b.cursor, 0);
        b.handle_key(key(KeyCode::Right, KeyModifiers::NONE));
        assert_eq!(b.cursor, 1);
    }
}
