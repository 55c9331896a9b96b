// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Named yank registers (spec §3 Register, §4.F).
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::collections::HashMap;

pub const UNNAMED: char = '"';
pub const LAST_YANK: char = '0';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    Char,
    Line,
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Wraps the OSC-52 sequence a yank to the host clipboard must emit to the
/// *physical* terminal (not the child PTY).
pub fn osc52_clipboard(text: &str) -> Vec<u8> {
    let encoded = BASE64.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07").into_bytes()
}

/// All register slots, keyed by their single-character name. Holds both the
/// text and whether it was yanked as a whole line or a character span, since
/// paste semantics (not specified further here) depend on it.
#[derive(Default)]
pub struct Registers {
    slots: HashMap<char, (String, RegisterKind)>,
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: char) -> Option<&(String, RegisterKind)> {
        self.slots.get(&name)
    }

    fn set(&mut self, name: char, text: &str, kind: RegisterKind) {
        self.slots.insert(name, (text.to_string(), kind));
    }

    fn append(&mut self, name: char, text: &str, kind: RegisterKind) {
        let joined = match self.slots.get(&name) {
            Some((existing, _)) => {
                let sep = if kind == RegisterKind::Line { "\n" } else { "" };
                format!("{existing}{sep}{text}")
            }
            None => text.to_string(),
        };
        self.slots.insert(name, (joined, kind));
    }

    /// Stores a yank per spec §4.F's register rules. `name` is the register
    /// prefix the caller typed (`"ay` selects `Some('a')`), or `None` for a
    /// plain `y` with no prefix. Returns the OSC-52 bytes to forward to the
    /// physical terminal when the yank targets (or defaults to) the system
    /// clipboard.
    pub fn yank(&mut self, name: Option<char>, text: &str, kind: RegisterKind) -> Option<Vec<u8>> {
        let text = normalize_newlines(text);
        match name {
            None => {
                self.set(UNNAMED, &text, kind);
                self.set(LAST_YANK, &text, kind);
                Some(osc52_clipboard(&text))
            }
            Some(c) if c.is_ascii_uppercase() => {
                let lower = c.to_ascii_lowercase();
                self.append(lower, &text, kind);
                let full = self.slots.get(&lower).map(|(t, _)| t.clone()).unwrap_or(text);
                self.set(UNNAMED, &full, kind);
                None
            }
            Some(c @ ('+' | '*')) => {
                self.set(c, &text, kind);
                self.set(UNNAMED, &text, kind);
                Some(osc52_clipboard(&text))
            }
            Some(c) => {
                self.set(c, &text, kind);
                self.set(UNNAMED, &text, kind);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unnamed_yank_mirrors_into_quote_and_zero() {
        let mut regs = Registers::new();
        regs.yank(None, "hello", RegisterKind::Char);
        assert_eq!(regs.get(UNNAMED).unwrap().0, "hello");
        assert_eq!(regs.get(LAST_YANK).unwrap().0, "hello");
    }

    #[test]
    fn named_lowercase_yank_does_not_touch_register_zero() {
        let mut regs = Registers::new();
        regs.yank(Some('a'), "x", RegisterKind::Char);
        assert_eq!(regs.get('a').unwrap().0, "x");
        assert!(regs.get(LAST_YANK).is_none());
        assert_eq!(regs.get(UNNAMED).unwrap().0, "x");
    }

    #[test]
    fn uppercase_register_appends_to_lowercase_slot() {
        let mut regs = Registers::new();
        regs.yank(Some('a'), "first", RegisterKind::Line);
        regs.yank(Some('A'), "second", RegisterKind::Line);
        assert_eq!(regs.get('a').unwrap().0, "first\nsecond");
    }

    #[test]
    fn plus_and_star_emit_osc52_and_mirror_unnamed() {
        let mut regs = Registers::new();
        let emitted = regs.yank(Some('+'), "world", RegisterKind::Char).unwrap();
        assert_eq!(emitted, osc52_clipboard("world"));
        assert_eq!(regs.get(UNNAMED).unwrap().0, "world");
    }

    #[test]
    fn default_yank_emits_the_osc52_clipboard_sequence_for_world() {
        let mut regs = Registers::new();
        let emitted = regs.yank(None, "world", RegisterKind::Char).unwrap();
        // Matches the exact scenario 2 payload from the spec.
        assert_eq!(emitted, b"\x1b]52;c;d29ybGQ=\x07".to_vec());
    }

    #[test]
    fn crlf_is_normalized_to_lf() {
        let mut regs = Registers::new();
        regs.yank(Some('a'), "one\r\ntwo\r", RegisterKind::Line);
        assert_eq!(regs.get('a').unwrap().0, "one\ntwo\n");
    }
}
