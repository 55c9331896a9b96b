// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Post-processes an already-SGR-rendered line (from [`agora_term::Grid`])
//! to overlay the NORMAL-mode virtual cursor, a VISUAL selection, and
//! search-match highlighting (spec §4.D "Selection & cursor rendering").
//!
//! The line is walked token by token — an `ESC[...m` escape is passed
//! through untouched so the pane's own colors and attributes survive, while
//! every character column gets classified and wrapped in additional,
//! independent SGR codes (inverse/underline/background) that don't disturb
//! the underlying style. Because a pane can emit a full `ESC[0m` reset in
//! the middle of a highlighted run, the active highlight is re-asserted
//! after every escape sequence, not just at the run's start.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Highlight {
    None,
    Selected,
    Cursor,
    SearchCurrent,
    SearchOther,
}

impl Highlight {
    fn enter_code(self) -> &'static str {
        match self {
            Highlight::None => "",
            Highlight::Selected => "\x1b[7m",
            Highlight::Cursor => "\x1b[4;7m",
            Highlight::SearchCurrent => "\x1b[48;5;226m",
            Highlight::SearchOther => "\x1b[48;5;58m",
        }
    }

    fn leave_code(self) -> &'static str {
        match self {
            Highlight::None => "",
            Highlight::Selected => "\x1b[27m",
            Highlight::Cursor => "\x1b[24;27m",
            Highlight::SearchCurrent | Highlight::SearchOther => "\x1b[49m",
        }
    }
}

enum Token {
    Esc(String),
    Ch(char),
}

fn tokenize(s: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            let mut seq = String::new();
            seq.push(c);
            while let Some(&next) = chars.peek() {
                let next = chars.next().unwrap();
                seq.push(next);
                if next.is_ascii_alphabetic() {
                    break;
                }
            }
            out.push(Token::Esc(seq));
        } else {
            out.push(Token::Ch(c));
        }
    }
    out
}

/// One highlighted span of columns `[start, start+len)` on a line. `kind`
/// selects [`Highlight::SearchCurrent`] vs [`Highlight::SearchOther`].
#[derive(Debug, Clone, Copy)]
pub struct SearchSpan {
    pub start: usize,
    pub len: usize,
    pub is_current: bool,
}

fn classify(
    col: usize,
    selection: Option<(usize, usize)>,
    cursor_col: Option<usize>,
    matches: &[SearchSpan],
) -> Highlight {
    if Some(col) == cursor_col {
        return Highlight::Cursor;
    }
    if let Some((start, end)) = selection {
        if col >= start && col <= end {
            return Highlight::Selected;
        }
    }
    for m in matches {
        if col >= m.start && col < m.start + m.len {
            return if m.is_current {
                Highlight::SearchCurrent
            } else {
                Highlight::SearchOther
            };
        }
    }
    Highlight::None
}

/// Rewrites an SGR-rendered line, adding a visual selection
/// (`selection = Some((start_col, end_col_inclusive))`), the NORMAL-mode
/// virtual cursor (`cursor_col`), and/or search-match highlighting on top of
/// whatever styling is already present.
pub fn overlay_highlights(
    rendered: &str,
    selection: Option<(usize, usize)>,
    cursor_col: Option<usize>,
    matches: &[SearchSpan],
) -> String {
    if selection.is_none() && cursor_col.is_none() && matches.is_empty() {
        return rendered.to_string();
    }

    let mut out = String::with_capacity(rendered.len() + 16);
    let mut current = Highlight::None;
    let mut col = 0usize;

    for token in tokenize(rendered) {
        match token {
            Token::Esc(seq) => {
                out.push_str(&seq);
                if current != Highlight::None {
                    out.push_str(current.enter_code());
                }
            }
            Token::Ch(ch) => {
                let target = classify(col, selection, cursor_col, matches);
                if target != current {
                    if current != Highlight::None {
                        out.push_str(current.leave_code());
                    }
                    if target != Highlight::None {
                        out.push_str(target.enter_code());
                    }
                    current = target;
                }
                out.push(ch);
                col += 1;
            }
        }
    }
    if current != Highlight::None {
        out.push_str(current.leave_code());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_with_a_cursor_wraps_only_that_column() {
        let out = overlay_highlights("hello", None, Some(1), &[]);
        assert_eq!(out, "h\x1b[4;7me\x1b[24;27mllo");
    }

    #[test]
    fn selection_wraps_an_inclusive_range() {
        let out = overlay_highlights("abcdef", Some((1, 3)), None, &[]);
        assert_eq!(out, "a\x1b[7mbcd\x1b[27mef");
    }

    #[test]
    fn cursor_wins_over_a_coincident_search_match() {
        let matches = [SearchSpan { start: 0, len: 3, is_current: true }];
        let out = overlay_highlights("abc", None, Some(0), &matches);
        assert_eq!(out, "\x1b[4;7ma\x1b[24;27m\x1b[48;5;226mbc\x1b[49m");
    }

    #[test]
    fn highlight_survives_an_embedded_reset() {
        let rendered = "\x1b[0;31ma\x1b[0mb";
        let out = overlay_highlights(rendered, Some((0, 1)), None, &[]);
        assert_eq!(out, "\x1b[0;31m\x1b[7ma\x1b[0m\x1b[7mb\x1b[27m");
    }

    #[test]
    fn no_highlight_requested_returns_the_input_unchanged() {
        let out = overlay_highlights("plain", None, None, &[]);
        assert_eq!(out, "plain");
    }

    #[test]
    fn other_search_matches_use_the_dim_background() {
        let matches = [SearchSpan { start: 2, len: 2, is_current: false }];
        let out = overlay_highlights("abcdef", None, None, &matches);
        assert_eq!(out, "ab\x1b[48;5;58mcd\x1b[49mef");
    }
}
