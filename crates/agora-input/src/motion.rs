// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! NORMAL/VISUAL movement grammar (spec §4.E). Motions read content through
//! [`Grid::plain_line`] / [`Grid::content_height`] only — the grid itself is
//! never mutated by movement, matching the read-only-history non-goal.
use agora_term::Grid;

use crate::mode::CursorPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    FirstNonBlank,
    LineEnd,
    WordForward { big: bool },
    WordEnd { big: bool },
    WordBack { big: bool },
    FindChar { ch: char, forward: bool, till: bool },
    GotoTop,
    GotoBottom,
    GotoLine(usize),
    HalfPageUp,
    HalfPageDown,
    FullPageUp,
    FullPageDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Blank,
    Word,
    Punct,
}

fn class_of(c: char, big: bool) -> CharClass {
    if c.is_whitespace() {
        CharClass::Blank
    } else if big {
        CharClass::Word
    } else if c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else {
        CharClass::Punct
    }
}

fn line_chars(grid: &Grid, line: usize) -> Vec<char> {
    grid.plain_line(line).unwrap_or_default().chars().collect()
}

fn clamp_col(line_len: usize, col: usize) -> usize {
    if line_len == 0 {
        0
    } else {
        col.min(line_len - 1)
    }
}

/// Resolves one motion, `count` times, from `from`. Returns the new cursor
/// position; out-of-range lines/cols clamp to the content's extent.
pub fn resolve(grid: &Grid, from: CursorPos, motion: Motion, count: u32) -> CursorPos {
    let last_line = grid.content_height().saturating_sub(1);
    let mut pos = from;
    match motion {
        Motion::Left => pos.col = pos.col.saturating_sub(count as usize),
        Motion::Right => {
            let len = line_chars(grid, pos.line).len();
            pos.col = clamp_col(len, pos.col.saturating_add(count as usize));
        }
        Motion::Up => pos.line = pos.line.saturating_sub(count as usize),
        Motion::Down => pos.line = (pos.line + count as usize).min(last_line),
        Motion::LineStart => pos.col = 0,
        Motion::FirstNonBlank => {
            let chars = line_chars(grid, pos.line);
            pos.col = chars.iter().position(|c| !c.is_whitespace()).unwrap_or(0);
        }
        Motion::LineEnd => {
            let len = line_chars(grid, pos.line).len();
            pos.col = len.saturating_sub(1);
        }
        Motion::GotoTop => pos = CursorPos::new(0, 0),
        Motion::GotoBottom => pos = CursorPos::new(last_line, 0),
        Motion::GotoLine(n) => pos = CursorPos::new(n.min(last_line), 0),
        Motion::HalfPageUp => pos.line = pos.line.saturating_sub(grid.rows() / 2),
        Motion::HalfPageDown => pos.line = (pos.line + grid.rows() / 2).min(last_line),
        Motion::FullPageUp => pos.line = pos.line.saturating_sub(grid.rows()),
        Motion::FullPageDown => pos.line = (pos.line + grid.rows()).min(last_line),
        Motion::WordForward { big } => {
            for _ in 0..count {
                pos = word_forward(grid, pos, big, last_line);
            }
        }
        Motion::WordEnd { big } => {
            for _ in 0..count {
                pos = word_end(grid, pos, big, last_line);
            }
        }
        Motion::WordBack { big } => {
            for _ in 0..count {
                pos = word_back(grid, pos, big);
            }
        }
        Motion::FindChar { ch, forward, till } => {
            if let Some(col) = find_char(grid, pos, ch, forward, till, count) {
                pos.col = col;
            }
        }
    }
    let len = line_chars(grid, pos.line).len();
    pos.col = clamp_col(len, pos.col);
    pos
}

fn word_forward(grid: &Grid, pos: CursorPos, big: bool, last_line: usize) -> CursorPos {
    let chars = line_chars(grid, pos.line);
    if pos.col >= chars.len() {
        return if pos.line < last_line {
            CursorPos::new(pos.line + 1, 0)
        } else {
            pos
        };
    }
    let start_class = class_of(chars[pos.col], big);
    let mut col = pos.col;
    while col < chars.len() && class_of(chars[col], big) == start_class && start_class != CharClass::Blank {
        col += 1;
    }
    while col < chars.len() && class_of(chars[col], big) == CharClass::Blank {
        col += 1;
    }
    if col >= chars.len() {
        if pos.line < last_line {
            CursorPos::new(pos.line + 1, 0)
        } else {
            CursorPos::new(pos.line, chars.len().saturating_sub(1))
        }
    } else {
        CursorPos::new(pos.line, col)
    }
}

fn word_end(grid: &Grid, pos: CursorPos, big: bool, last_line: usize) -> CursorPos {
    let mut chars = line_chars(grid, pos.line);
    let mut line = pos.line;
    let mut col = pos.col + 1;
    loop {
        if col >= chars.len() {
            if line >= last_line {
                return CursorPos::new(line, chars.len().saturating_sub(1));
            }
            line += 1;
            chars = line_chars(grid, line);
            col = 0;
            continue;
        }
        while col < chars.len() && class_of(chars[col], big) == CharClass::Blank {
            col += 1;
        }
        if col >= chars.len() {
            continue;
        }
        let class = class_of(chars[col], big);
        while col + 1 < chars.len() && class_of(chars[col + 1], big) == class {
            col += 1;
        }
        return CursorPos::new(line, col);
    }
}

fn word_back(grid: &Grid, pos: CursorPos, big: bool) -> CursorPos {
    let mut chars = line_chars(grid, pos.line);
    let mut line = pos.line;
    if pos.col == 0 {
        if line == 0 {
            return pos;
        }
        line -= 1;
        chars = line_chars(grid, line);
        let col = chars.len().saturating_sub(1);
        return CursorPos::new(line, col);
    }
    let mut col = pos.col - 1;
    loop {
        while class_of(chars[col], big) == CharClass::Blank {
            if col == 0 {
                if line == 0 {
                    return CursorPos::new(0, 0);
                }
                line -= 1;
                chars = line_chars(grid, line);
                col = chars.len().saturating_sub(1);
                continue;
            }
            col -= 1;
        }
        let class = class_of(chars[col], big);
        while col > 0 && class_of(chars[col - 1], big) == class {
            col -= 1;
        }
        return CursorPos::new(line, col);
    }
}

fn find_char(
    grid: &Grid,
    pos: CursorPos,
    ch: char,
    forward: bool,
    till: bool,
    count: u32,
) -> Option<usize> {
    let chars = line_chars(grid, pos.line);
    let mut col = pos.col;
    for _ in 0..count {
        col = find_char_once(&chars, col, ch, forward)?;
    }
    if till {
        col = if forward { col.saturating_sub(1) } else { col + 1 };
    }
    Some(col)
}

fn find_char_once(chars: &[char], from: usize, ch: char, forward: bool) -> Option<usize> {
    if forward {
        (from + 1..chars.len()).find(|&i| chars[i] == ch)
    } else {
        (0..from).rev().find(|&i| chars[i] == ch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(lines: &[&str]) -> Grid {
        let mut g = Grid::new(40, lines.len().max(1), 1000);
        for (i, line) in lines.iter().enumerate() {
            for ch in line.chars() {
                g.put_grapheme(&ch.to_string(), 1);
            }
            if i + 1 < lines.len() {
                g.carriage_return();
                g.linefeed();
            }
        }
        g
    }

    #[test]
    fn dollar_motion_lands_on_last_char() {
        let grid = grid_with(&["world"]);
        let pos = resolve(&grid, CursorPos::new(0, 0), Motion::LineEnd, 1);
        assert_eq!(pos, CursorPos::new(0, 4));
    }

    #[test]
    fn word_forward_skips_the_gap_to_the_next_word() {
        let grid = grid_with(&["foo bar foo"]);
        let pos = resolve(&grid, CursorPos::new(0, 0), Motion::WordForward { big: false }, 1);
        assert_eq!(pos, CursorPos::new(0, 4));
    }

    #[test]
    fn word_forward_crosses_to_the_next_line_at_end_of_line() {
        let grid = grid_with(&["foo", "bar"]);
        let pos = resolve(&grid, CursorPos::new(0, 2), Motion::WordForward { big: false }, 1);
        assert_eq!(pos, CursorPos::new(1, 0));
    }

    #[test]
    fn word_back_returns_to_start_of_previous_word() {
        let grid = grid_with(&["foo bar"]);
        let pos = resolve(&grid, CursorPos::new(0, 4), Motion::WordBack { big: false }, 1);
        assert_eq!(pos, CursorPos::new(0, 0));
    }

    #[test]
    fn find_char_forward_locates_next_occurrence() {
        let grid = grid_with(&["a,b,c"]);
        let pos = resolve(
            &grid,
            CursorPos::new(0, 0),
            Motion::FindChar { ch: ',', forward: true, till: false },
            2,
        );
        assert_eq!(pos, CursorPos::new(0, 3));
    }

    #[test]
    fn goto_bottom_lands_on_last_content_line() {
        let grid = grid_with(&["a", "b", "c"]);
        let pos = resolve(&grid, CursorPos::new(0, 0), Motion::GotoBottom, 1);
        assert_eq!(pos.line, 2);
    }
}
