// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Pattern search over a pane's visible content (spec §3 SearchState,
//! §4.E "Search (`/`)").
use regex::RegexBuilder;

use agora_term::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// One match: absolute line, starting column, grapheme-count length.
pub type Match = (usize, usize, usize);

#[derive(Default)]
pub struct SearchState {
    pub active: bool,
    pub pattern: String,
    pub matches: Vec<Match>,
    pub index: usize,
    pub direction: Direction,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Forward
    }
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `pattern` as a case-insensitive regex and scans every line
    /// in `grid` for matches. An invalid pattern yields an empty match list
    /// rather than an error, per spec §4.E.
    pub fn execute(&mut self, grid: &Grid, pattern: &str) {
        self.pattern = pattern.to_string();
        self.matches.clear();
        self.index = 0;
        self.active = true;

        let re = match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(re) => re,
            Err(_) => return,
        };
        if pattern.is_empty() {
            return;
        }

        for line_idx in 0..grid.content_height() {
            let Some(text) = grid.plain_line(line_idx) else {
                continue;
            };
            for m in re.find_iter(&text) {
                let col = text[..m.start()].chars().count();
                let len = text[m.start()..m.end()].chars().count();
                self.matches.push((line_idx, col, len));
            }
        }
    }

    pub fn current(&self) -> Option<Match> {
        self.matches.get(self.index).copied()
    }

    /// Advances to the next match, wrapping around. No-op with no matches.
    pub fn next(&mut self) {
        if self.matches.is_empty() {
            return;
        }
        self.index = (self.index + 1) % self.matches.len();
    }

    /// Moves to the previous match, wrapping around. No-op with no matches.
    pub fn previous(&mut self) {
        if self.matches.is_empty() {
            return;
        }
        self.index = (self.index + self.matches.len() - 1) % self.matches.len();
    }

    pub fn clear(&mut self) {
        self.active = false;
    }
}

/// The scroll offset that centers `match_line` in a pane `pane_height` rows
/// tall, per spec §4.E's jump rule.
pub fn jump_offset(match_line: usize, pane_height: usize) -> usize {
    match_line.saturating_sub(pane_height / 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_term::Grid;

    fn grid_with(lines: &[&str]) -> Grid {
        let mut g = Grid::new(80, lines.len().max(1), 1000);
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
    fn search_finds_all_matches_and_cycles_per_spec_scenario_3() {
        let grid = grid_with(&["foo bar foo"]);
        let mut search = SearchState::new();
        search.execute(&grid, "foo");
        assert_eq!(search.matches, vec![(0, 0, 3), (0, 8, 3)]);
        assert_eq!(search.index, 0);
        search.next();
        assert_eq!(search.index, 1);
        search.next();
        assert_eq!(search.index, 0);
    }

    #[test]
    fn invalid_pattern_yields_no_matches_and_no_panic() {
        let grid = grid_with(&["hello"]);
        let mut search = SearchState::new();
        search.execute(&grid, "(unclosed");
        assert!(search.matches.is_empty());
    }

    #[test]
    fn previous_wraps_backward_from_index_zero() {
        let grid = grid_with(&["foo foo foo"]);
        let mut search = SearchState::new();
        search.execute(&grid, "foo");
        assert_eq!(search.index, 0);
        search.previous();
        assert_eq!(search.index, search.matches.len() - 1);
    }

    #[test]
    fn jump_offset_centers_the_match() {
        assert_eq!(jump_offset(20, 10), 15);
        assert_eq!(jump_offset(2, 10), 0);
    }
}
