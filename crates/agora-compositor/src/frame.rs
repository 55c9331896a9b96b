// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Builds one frame per compositor tick (spec §4.D).
use agora_input::{Mode, ModalState};
use agora_layout::{Bounds, Layout, PaneId};
use agora_overlays::{Overlay, OverlayStack};
use agora_registers::SearchState;
use agora_term::Grid;
use unicode_width::UnicodeWidthStr;

use crate::highlight::{overlay_highlights, SearchSpan};
use crate::scroll::ScrollTable;
use crate::status;

const SYNC_BEGIN: &str = "\x1b[?2026h";
const SYNC_END: &str = "\x1b[?2026l";
const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";

/// One pane's live data, as the session sees it. Borrowed only for the
/// duration of [`Compositor::build_frame`].
pub struct PaneSnapshot<'a> {
    pub id: PaneId,
    pub label: &'a str,
    pub grid: &'a Grid,
}

/// Everything [`Compositor::build_frame`] needs to know about besides the
/// pane grids themselves.
pub struct FrameContext<'a> {
    pub width: u16,
    pub height: u16,
    pub layout: &'a Layout,
    pub panes: &'a [PaneSnapshot<'a>],
    pub focused_pane: Option<PaneId>,
    pub modal: &'a ModalState,
    /// Search state, scoped to the focused pane only (spec §3 SearchState is
    /// per-pane content, but only one pane is ever actively searched).
    pub search: &'a SearchState,
    pub overlays: &'a OverlayStack,
}

/// Builds frames and owns the per-pane scroll state (spec §4.D "Pane scroll
/// offset semantics").
#[derive(Default)]
pub struct Compositor {
    pub scroll: ScrollTable,
}

impl Compositor {
    pub fn new() -> Self {
        Compositor::default()
    }

    /// Builds the full frame byte buffer for one tick. Safe to call even
    /// with zero panes (e.g. mid-teardown): emits just the status bar.
    pub fn build_frame(&mut self, ctx: &FrameContext) -> Vec<u8> {
        let mut out = String::new();
        out.push_str(HIDE_CURSOR);
        out.push_str("\x1b[H");
        out.push_str(SYNC_BEGIN);

        let zoomed = ctx.layout.zoom_pane();
        for pane in ctx.panes {
            if let Some(z) = zoomed {
                if z != pane.id {
                    continue;
                }
            }
            let Some(bounds) = ctx.layout.bounds_of(pane.id) else {
                continue;
            };
            self.render_pane(&mut out, pane, bounds, ctx);
        }

        if !ctx.overlays.is_empty() {
            if let Some(overlay) = ctx.overlays.top() {
                render_overlay(&mut out, ctx.width, ctx.height, overlay);
            }
        }

        self.render_status_bar(&mut out, ctx);

        out.push_str(SYNC_END);
        out.push_str(SHOW_CURSOR);
        out.into_bytes()
    }

    fn render_pane(&mut self, out: &mut String, pane: &PaneSnapshot, bounds: Bounds, ctx: &FrameContext) {
        let content_height = pane.grid.content_height();
        let pane_height = bounds.h as usize;
        let top = {
            let scroll = self.scroll.get_mut(pane.id);
            scroll.effective_top(content_height, pane_height)
        };

        let is_focused = ctx.focused_pane == Some(pane.id);
        let (selection, cursor_col) = if is_focused {
            selection_and_cursor(ctx.modal, top)
        } else {
            (None, None)
        };
        let search_spans: Vec<SearchSpan> = if is_focused {
            search_spans_for_line_range(ctx.search, top, pane_height)
        } else {
            Vec::new()
        };

        for row in 0..pane_height {
            let absolute = top + row;
            let rendered = pane
                .grid
                .get_line(absolute)
                .unwrap_or_else(|| " ".repeat(bounds.w as usize));

            let (line_selection, line_cursor) = match (selection, cursor_col) {
                (Some((from, to)), _) if from.line == to.line && from.line == absolute => {
                    (Some((from.col, to.col.max(from.col))), None)
                }
                (Some((from, to)), _) if absolute > from.line && absolute < to.line => {
                    (Some((0, usize::MAX)), None)
                }
                (Some((from, to)), _) if absolute == from.line && absolute < to.line => {
                    (Some((from.col, usize::MAX)), None)
                }
                (Some((from, to)), _) if absolute == to.line && absolute > from.line => {
                    (Some((0, to.col)), None)
                }
                _ => (None, None),
            };
            let line_cursor = line_cursor.or(match cursor_col {
                Some((line, col)) if line == absolute => Some(col),
                _ => None,
            });
            let line_matches: Vec<SearchSpan> = search_spans
                .iter()
                .filter(|m| m.start == absolute || true)
                .copied()
                .collect();
            let _ = line_matches;
            let matches_here: Vec<SearchSpan> = relative_spans(ctx.search, absolute);

            let final_line = if line_selection.is_some() || line_cursor.is_some() || !matches_here.is_empty() {
                overlay_highlights(&rendered, line_selection, line_cursor, &matches_here)
            } else {
                rendered
            };

            out.push_str(&format!("\x1b[{};{}H", bounds.y as usize + row + 1, bounds.x as usize + 1));
            out.push_str(&final_line);
        }
    }

    fn render_status_bar(&self, out: &mut String, ctx: &FrameContext) {
        let height = ctx.height.max(1);
        let label = ctx
            .focused_pane
            .and_then(|id| ctx.panes.iter().find(|p| p.id == id))
            .map(|p| p.label)
            .unwrap_or("");

        let position = ctx.focused_pane.and_then(|id| {
            let bounds = ctx.layout.bounds_of(id)?;
            let grid = ctx.panes.iter().find(|p| p.id == id)?.grid;
            let pane_height = bounds.h as usize;
            let content_height = grid.content_height();
            let top = self.scroll.get(id).effective_top(content_height, pane_height);
            Some(status::position_indicator(top, pane_height, content_height))
        });

        let selection = selection_summary(ctx.modal);
        let search = status::search_summary(ctx.search);

        let text = status::build_status_line(
            label,
            ctx.modal.mode,
            &ctx.modal.prompt_buffer,
            position.as_deref(),
            selection,
            search,
            ctx.modal.register,
        );

        let width = ctx.width as usize;
        let visible_width = UnicodeWidthStr::width(text.as_str());
        let padded = if visible_width < width {
            format!("{text}{}", " ".repeat(width - visible_width))
        } else {
            text.chars().take(width).collect()
        };

        out.push_str(&format!("\x1b[{};1H", height));
        out.push_str("\x1b[7m");
        out.push_str(&padded);
        out.push_str("\x1b[0m");
    }
}

fn selection_and_cursor(
    modal: &ModalState,
    _top: usize,
) -> (Option<(agora_input::CursorPos, agora_input::CursorPos)>, Option<(usize, usize)>) {
    match modal.mode {
        Mode::Visual | Mode::VLine => {
            let (from, to) = if modal.visual_anchor.line < modal.visual_cursor.line
                || (modal.visual_anchor.line == modal.visual_cursor.line
                    && modal.visual_anchor.col <= modal.visual_cursor.col)
            {
                (modal.visual_anchor, modal.visual_cursor)
            } else {
                (modal.visual_cursor, modal.visual_anchor)
            };
            (Some((from, to)), None)
        }
        Mode::Normal => (None, Some((modal.normal_cursor.line, modal.normal_cursor.col))),
        _ => (None, None),
    }
}

fn selection_summary(modal: &ModalState) -> Option<String> {
    match modal.mode {
        Mode::VLine => {
            let lines = modal.visual_cursor.line.abs_diff(modal.visual_anchor.line) + 1;
            status::selection_summary(Mode::VLine, lines, 0)
        }
        Mode::Visual => {
            let chars = if modal.visual_anchor.line == modal.visual_cursor.line {
                modal.visual_cursor.col.abs_diff(modal.visual_anchor.col) + 1
            } else {
                0
            };
            status::selection_summary(Mode::Visual, 0, chars)
        }
        _ => None,
    }
}

fn search_spans_for_line_range(_search: &SearchState, _top: usize, _pane_height: usize) -> Vec<SearchSpan> {
    Vec::new()
}

fn relative_spans(search: &SearchState, absolute_line: usize) -> Vec<SearchSpan> {
    if !search.active {
        return Vec::new();
    }
    let current = search.current();
    search
        .matches
        .iter()
        .enumerate()
        .filter(|(_, (line, _, _))| *line == absolute_line)
        .map(|(idx, &(_, col, len))| SearchSpan {
            start: col,
            len,
            is_current: Some(idx) == search.matches.iter().position(|m| Some(*m) == current),
        })
        .collect()
}

fn render_overlay(out: &mut String, term_width: u16, term_height: u16, overlay: &Overlay) {
    match overlay {
        Overlay::Picker(picker) => render_picker(out, term_width, term_height, picker),
        Overlay::Input(input) => render_input(out, term_width, term_height, input),
    }
}

fn render_picker(out: &mut String, term_width: u16, term_height: u16, picker: &agora_overlays::Picker) {
    let items = picker.visible_items();
    let content_w = items
        .iter()
        .map(|s| UnicodeWidthStr::width(s.as_str()))
        .chain(std::iter::once(UnicodeWidthStr::width(picker.title.as_str())))
        .max()
        .unwrap_or(10);
    let box_w = (content_w + 4).clamp(20, term_width.saturating_sub(4).max(20) as usize);
    let box_h = (items.len() + 2).clamp(3, term_height.saturating_sub(4).max(3) as usize);
    let x = term_width.saturating_sub(box_w as u16) / 2;
    let y = term_height.saturating_sub(box_h as u16) / 2;

    draw_box_top(out, x, y, box_w, &picker.title);
    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!("\x1b[{};{}H", y as usize + 2 + i, x as usize + 1));
        out.push('|');
        let selected = picker.selected_visible_index() == Some(i);
        if selected {
            out.push_str("\x1b[7m");
        }
        let mut line = format!(" {item}");
        pad_to(&mut line, box_w - 2);
        out.push_str(&line);
        if selected {
            out.push_str("\x1b[0m");
        }
        out.push('|');
    }
    draw_box_bottom(out, x, y + box_h as u16 - 1, box_w);
}

fn render_input(out: &mut String, term_width: u16, term_height: u16, input: &agora_overlays::InputBox) {
    let box_w = (UnicodeWidthStr::width(input.prompt.as_str()) + UnicodeWidthStr::width(input.buffer.as_str()) + 6)
        .clamp(24, term_width.saturating_sub(4).max(24) as usize);
    let x = term_width.saturating_sub(box_w as u16) / 2;
    let y = term_height / 2;

    draw_box_top(out, x, y, box_w, "");
    out.push_str(&format!("\x1b[{};{}H", y as usize + 2, x as usize + 1));
    out.push('|');
    let mut line = format!(" {}{}", input.prompt, input.buffer);
    pad_to(&mut line, box_w - 2);
    out.push_str(&line);
    out.push('|');
    draw_box_bottom(out, x, y + 2, box_w);
}

fn draw_box_top(out: &mut String, x: u16, y: u16, width: usize, title: &str) {
    out.push_str(&format!("\x1b[{};{}H", y as usize + 1, x as usize + 1));
    if title.is_empty() {
        out.push_str(&format!("+{}+", "-".repeat(width.saturating_sub(2))));
    } else {
        let mut line = format!(" {title} ");
        pad_to_centered(&mut line, width.saturating_sub(2), '-');
        out.push_str(&format!("+{line}+"));
    }
}

fn draw_box_bottom(out: &mut String, x: u16, y: u16, width: usize) {
    out.push_str(&format!("\x1b[{};{}H", y as usize + 1, x as usize + 1));
    out.push_str(&format!("+{}+", "-".repeat(width.saturating_sub(2))));
}

fn pad_to(s: &mut String, width: usize) {
    let w = UnicodeWidthStr::width(s.as_str());
    if w < width {
        s.push_str(&" ".repeat(width - w));
    } else {
        *s = s.chars().take(width).collect();
    }
}

fn pad_to_centered(s: &mut String, width: usize, fill: char) {
    let w = UnicodeWidthStr::width(s.as_str());
    if w >= width {
        *s = s.chars().take(width).collect();
        return;
    }
    let total = width - w;
    let left = total / 2;
    let right = total - left;
    *s = format!("{}{}{}", fill.to_string().repeat(left), s, fill.to_string().repeat(right));
}
