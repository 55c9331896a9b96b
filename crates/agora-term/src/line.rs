// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use crate::cell::{Cell, Style};

/// A fixed-width row of [`Cell`]s. Trailing default-style blanks are not
/// significant — they exist only to keep indexing simple and are trimmed
/// away whenever a line is rendered or measured for plain text.
#[derive(Debug, Clone)]
pub struct Line {
    cells: Vec<Cell>,
}

impl Line {
    pub fn blank(width: usize) -> Self {
        Line {
            cells: (0..width).map(|_| Cell::blank()).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }

    pub fn resize(&mut self, width: usize) {
        if width > self.cells.len() {
            self.cells.resize_with(width, Cell::blank);
        } else {
            self.cells.truncate(width);
        }
    }

    pub fn cell(&self, col: usize) -> Option<&Cell> {
        self.cells.get(col)
    }

    pub fn set(&mut self, col: usize, grapheme: &str, style: Style) {
        if col < self.cells.len() {
            self.cells[col] = Cell {
                grapheme: grapheme.into(),
                style,
                wide_continuation: false,
            };
        }
    }

    pub fn set_continuation(&mut self, col: usize, style: Style) {
        if col < self.cells.len() {
            self.cells[col] = Cell {
                grapheme: "".into(),
                style,
                wide_continuation: true,
            };
        }
    }

    pub fn clear_range(&mut self, from: usize, to_exclusive: usize, style: Style) {
        let to = to_exclusive.min(self.cells.len());
        for c in self.cells.iter_mut().take(to).skip(from.min(to)) {
            *c = Cell {
                grapheme: " ".into(),
                style,
                wide_continuation: false,
            };
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Index (exclusive) of the last non-blank cell, or 0 if the whole line
    /// is blank. Used when trimming trailing default-style blanks.
    pub fn significant_len(&self) -> usize {
        for i in (0..self.cells.len()).rev() {
            if !self.cells[i].is_blank() {
                return i + 1;
            }
        }
        0
    }

    /// Plain-text content with trailing blanks trimmed; wide-character
    /// continuation cells contribute nothing.
    pub fn plain_text(&self) -> String {
        let len = self.significant_len();
        self.cells[..len]
            .iter()
            .filter(|c| !c.wide_continuation)
            .map(|c| c.grapheme.as_ref())
            .collect()
    }
}
