// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::VecDeque;

use crate::cell::Style;
use crate::line::Line;
use crate::render::render_line;

/// A scroll-backed grid of [`Line`]s: a fixed `rows x cols` viewport plus a
/// bounded scrollback history above it, a cursor, and the parser's current
/// SGR state.
///
/// `get_line(i)` addresses lines by absolute index, 0 = oldest in
/// scrollback, so callers don't need to know where the viewport starts.
pub struct Grid {
    cols: usize,
    rows: usize,
    scrollback_max: usize,
    scrollback: VecDeque<Line>,
    viewport: Vec<Line>,
    /// Saved primary-screen state while the alternate screen (DECSET 1047/1049) is active.
    alt_saved: Option<(Vec<Line>, usize, usize)>,
    pub cursor_row: usize,
    pub cursor_col: usize,
    pub style: Style,
    /// DECSTBM scroll region, inclusive, 0-indexed viewport rows.
    scroll_top: usize,
    scroll_bottom: usize,
    /// DECAWM: autowrap at right margin.
    pub autowrap: bool,
    /// Cursor sits at the right margin awaiting the next printable
    /// character before actually wrapping ("pending wrap" state).
    wrap_pending: bool,
    pub cursor_visible: bool,
    /// Highest viewport row that has actually had a grapheme written to it,
    /// relative to the current viewport. `None` means nothing has been
    /// written since the last full clear. Tracked separately from
    /// `cursor_row` because the cursor can sit on a fresh row (e.g. right
    /// after a trailing newline) that nothing has drawn into yet.
    max_written_row: Option<usize>,
}

impl Grid {
    pub fn new(cols: usize, rows: usize, scrollback_max: usize) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Grid {
            cols,
            rows,
            scrollback_max,
            scrollback: VecDeque::new(),
            viewport: (0..rows).map(|_| Line::blank(cols)).collect(),
            alt_saved: None,
            cursor_row: 0,
            cursor_col: 0,
            style: Style::default(),
            scroll_top: 0,
            scroll_bottom: rows - 1,
            autowrap: true,
            wrap_pending: false,
            cursor_visible: true,
            max_written_row: None,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn scrollback_len(&self) -> usize {
        self.scrollback.len()
    }

    /// Total addressable lines: everything in scrollback plus every
    /// viewport row that has actually received a write. A grid whose cursor
    /// has advanced onto a fresh, never-written row (e.g. right after a
    /// trailing newline) does not count that row.
    pub fn content_height(&self) -> usize {
        match self.max_written_row {
            Some(row) => self.scrollback.len() + row + 1,
            None => self.scrollback.len(),
        }
    }

    pub fn get_line(&self, absolute_index: usize) -> Option<String> {
        self.line_at(absolute_index)
            .map(|l| render_line(l, self.cols))
    }

    pub fn plain_line(&self, absolute_index: usize) -> Option<String> {
        self.line_at(absolute_index).map(|l| l.plain_text())
    }

    fn line_at(&self, absolute_index: usize) -> Option<&Line> {
        if absolute_index < self.scrollback.len() {
            self.scrollback.get(absolute_index)
        } else {
            self.viewport.get(absolute_index - self.scrollback.len())
        }
    }

    fn viewport_line_mut(&mut self, row: usize) -> &mut Line {
        &mut self.viewport[row]
    }

    /// Write one grapheme at the cursor, handling autowrap, then advance the
    /// cursor. `width` is the grapheme's display width (1 or 2).
    pub fn put_grapheme(&mut self, grapheme: &str, width: usize) {
        if self.wrap_pending {
            self.newline_within_margin();
            self.cursor_col = 0;
            self.wrap_pending = false;
        }
        if self.cursor_col + width > self.cols {
            if self.autowrap {
                self.newline_within_margin();
                self.cursor_col = 0;
            } else {
                self.cursor_col = self.cols.saturating_sub(width);
            }
        }
        let style = self.style;
        let col = self.cursor_col;
        let row = self.cursor_row;
        self.viewport_line_mut(row).set(col, grapheme, style);
        if width == 2 && col + 1 < self.cols {
            self.viewport_line_mut(row).set_continuation(col + 1, style);
        }
        self.max_written_row = Some(self.max_written_row.map_or(row, |r| r.max(row)));
        self.cursor_col += width;
        if self.cursor_col >= self.cols {
            self.wrap_pending = self.autowrap;
            if !self.autowrap {
                self.cursor_col = self.cols - 1;
            }
        }
    }

    /// Move the cursor down one row, scrolling the scroll region (or
    /// pushing into scrollback when at the bottom of the whole viewport)
    /// when already at the bottom margin.
    pub fn newline_within_margin(&mut self) {
        if self.cursor_row < self.scroll_bottom {
            self.cursor_row += 1;
        } else {
            self.scroll_up_region(1);
        }
    }

    fn scroll_up_region(&mut self, n: usize) {
        for _ in 0..n {
            if self.scroll_top == 0 && self.scroll_bottom == self.rows - 1 {
                let popped = self.viewport.remove(0);
                self.scrollback.push_back(popped);
                while self.scrollback.len() > self.scrollback_max {
                    self.scrollback.pop_front();
                }
                self.viewport.push(Line::blank(self.cols));
            } else {
                // Scrolling within a DECSTBM region does not feed scrollback.
                self.viewport.remove(self.scroll_top);
                self.viewport
                    .insert(self.scroll_bottom, Line::blank(self.cols));
            }
            self.max_written_row = self.max_written_row.and_then(|r| r.checked_sub(1));
        }
    }

    fn scroll_down_region(&mut self, n: usize) {
        for _ in 0..n {
            self.viewport.remove(self.scroll_bottom);
            self.viewport
                .insert(self.scroll_top, Line::blank(self.cols));
            self.max_written_row = self
                .max_written_row
                .map(|r| (r + 1).min(self.rows - 1));
        }
    }

    pub fn carriage_return(&mut self) {
        self.cursor_col = 0;
        self.wrap_pending = false;
    }

    pub fn linefeed(&mut self) {
        self.newline_within_margin();
        self.wrap_pending = false;
    }

    pub fn backspace(&mut self) {
        self.cursor_col = self.cursor_col.saturating_sub(1);
        self.wrap_pending = false;
    }

    pub fn tab(&mut self) {
        let next = ((self.cursor_col / 8) + 1) * 8;
        self.cursor_col = next.min(self.cols - 1);
    }

    pub fn set_scroll_region(&mut self, top: usize, bottom: usize) {
        let top = top.min(self.rows - 1);
        let bottom = bottom.min(self.rows - 1);
        if top < bottom {
            self.scroll_top = top;
            self.scroll_bottom = bottom;
        } else {
            self.scroll_top = 0;
            self.scroll_bottom = self.rows - 1;
        }
        self.cursor_row = self.scroll_top;
        self.cursor_col = 0;
    }

    pub fn move_cursor_to(&mut self, row: usize, col: usize) {
        self.cursor_row = row.min(self.rows - 1);
        self.cursor_col = col.min(self.cols - 1);
        self.wrap_pending = false;
    }

    pub fn move_cursor_rel(&mut self, d_row: i32, d_col: i32) {
        let row = (self.cursor_row as i32 + d_row).clamp(0, self.rows as i32 - 1);
        let col = (self.cursor_col as i32 + d_col).clamp(0, self.cols as i32 - 1);
        self.cursor_row = row as usize;
        self.cursor_col = col as usize;
        self.wrap_pending = false;
    }

    pub fn scroll_up_viewport(&mut self, n: usize) {
        self.scroll_up_region(n);
    }

    pub fn scroll_down_viewport(&mut self, n: usize) {
        self.scroll_down_region(n);
    }

    /// ED: erase in display. `mode`: 0 = cursor..end, 1 = start..cursor, 2/3 = whole screen.
    pub fn erase_in_display(&mut self, mode: u16) {
        let style = self.style;
        match mode {
            0 => {
                self.viewport_line_mut(self.cursor_row)
                    .clear_range(self.cursor_col, self.cols, style);
                for r in (self.cursor_row + 1)..self.rows {
                    self.viewport[r] = Line::blank(self.cols);
                }
            }
            1 => {
                self.viewport_line_mut(self.cursor_row)
                    .clear_range(0, self.cursor_col + 1, style);
                for r in 0..self.cursor_row {
                    self.viewport[r] = Line::blank(self.cols);
                }
            }
            2 | 3 => {
                for r in 0..self.rows {
                    self.viewport[r] = Line::blank(self.cols);
                }
                self.max_written_row = None;
            }
            _ => {}
        }
    }

    /// EL: erase in line. `mode`: 0 = cursor..end, 1 = start..cursor, 2 = whole line.
    pub fn erase_in_line(&mut self, mode: u16) {
        let style = self.style;
        let row = self.cursor_row;
        match mode {
            0 => self
                .viewport_line_mut(row)
                .clear_range(self.cursor_col, self.cols, style),
            1 => self
                .viewport_line_mut(row)
                .clear_range(0, self.cursor_col + 1, style),
            2 => self.viewport_line_mut(row).clear_range(0, self.cols, style),
            _ => {}
        }
    }

    pub fn reset_style(&mut self) {
        self.style = Style::default();
    }

    /// DECSET 1047/1049: switch to the alternate screen buffer, saving the
    /// primary one. A no-op if already on the alternate screen.
    pub fn enter_alt_screen(&mut self) {
        if self.alt_saved.is_some() {
            return;
        }
        let primary = std::mem::replace(
            &mut self.viewport,
            (0..self.rows).map(|_| Line::blank(self.cols)).collect(),
        );
        self.alt_saved = Some((primary, self.cursor_row, self.cursor_col));
        self.cursor_row = 0;
        self.cursor_col = 0;
    }

    pub fn leave_alt_screen(&mut self) {
        if let Some((primary, row, col)) = self.alt_saved.take() {
            self.viewport = primary;
            self.cursor_row = row.min(self.rows - 1);
            self.cursor_col = col.min(self.cols - 1);
        }
    }

    pub fn in_alt_screen(&self) -> bool {
        self.alt_saved.is_some()
    }

    /// Resize the viewport in place. `scrollback_max` is independent of
    /// rows/cols and is never changed by a resize, per spec §4.B.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        let cols = cols.max(1);
        let rows = rows.max(1);
        for line in self.viewport.iter_mut() {
            line.resize(cols);
        }
        for line in self.scrollback.iter_mut() {
            line.resize(cols);
        }
        if rows > self.viewport.len() {
            self.viewport
                .resize_with(rows, || Line::blank(cols));
        } else {
            self.viewport.truncate(rows.max(1));
        }
        self.cols = cols;
        self.rows = rows;
        self.scroll_top = 0;
        self.scroll_bottom = rows - 1;
        self.cursor_row = self.cursor_row.min(rows - 1);
        self.cursor_col = self.cursor_col.min(cols - 1);
        self.max_written_row = self.max_written_row.map(|r| r.min(rows - 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_height_grows_then_caps_at_scrollback_max_plus_rows() {
        let mut g = Grid::new(10, 3, 2);
        for i in 0..10 {
            for ch in format!("l{i}").chars() {
                g.put_grapheme(&ch.to_string(), 1);
            }
            g.carriage_return();
            g.linefeed();
        }
        // scrollback caps at 2, viewport stays 3 rows => content_height caps at 2 + (cursor_row+1) <= 2+3
        assert!(g.content_height() <= 5);
        assert_eq!(g.scrollback_len(), 2);
    }

    #[test]
    fn get_line_returns_plain_text_for_unstyled_content() {
        let mut g = Grid::new(20, 5, 100);
        for ch in "hello".chars() {
            g.put_grapheme(&ch.to_string(), 1);
        }
        let rendered = g.get_line(0).unwrap();
        assert_eq!(rendered, "hello");
    }

    #[test]
    fn erase_in_display_mode_2_clears_everything() {
        let mut g = Grid::new(10, 2, 10);
        for ch in "abc".chars() {
            g.put_grapheme(&ch.to_string(), 1);
        }
        g.erase_in_display(2);
        assert_eq!(g.plain_line(0).unwrap(), "");
    }
}
