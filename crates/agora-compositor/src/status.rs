// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Pure, testable formatting helpers for the status bar (spec §4.D "Status
//! bar"). Kept free of any rendering so the position/mode math can be unit
//! tested without a terminal.
use agora_input::Mode;
use agora_registers::SearchState;

/// The `[from-to/total] {Top|Bot|N%}` scroll position indicator.
///
/// `top` is the absolute index (0 = oldest scrollback line) of the first
/// visible row; `pane_height` excludes the status row.
pub fn position_indicator(top: usize, pane_height: usize, content_height: usize) -> String {
    let height = pane_height.max(1);
    let from = top + 1;
    let to = (top + height).min(content_height).max(from);
    let label = if top + height >= content_height {
        "Bot".to_string()
    } else if top == 0 {
        "Top".to_string()
    } else {
        let denom = (content_height - height).max(1);
        format!("{}%", (top * 100) / denom)
    };
    format!("[{from}-{to}/{content_height}] {label}")
}

pub fn mode_label(mode: Mode) -> &'static str {
    match mode {
        Mode::Insert => "INSERT",
        Mode::Normal => "NORMAL",
        Mode::Visual => "VISUAL",
        Mode::VLine => "V-LINE",
        Mode::Overlay => "OVERLAY",
        Mode::Command => "COMMAND",
        Mode::Search => "SEARCH",
    }
}

/// Describes the currently focused pane's selection, if any, for the status
/// bar's "selection info" segment.
pub fn selection_summary(mode: Mode, lines: usize, chars: usize) -> Option<String> {
    match mode {
        Mode::VLine => Some(format!("{lines} line{}", if lines == 1 { "" } else { "s" })),
        Mode::Visual => Some(format!("{chars} char{}", if chars == 1 { "" } else { "s" })),
        _ => None,
    }
}

/// The `/pattern [i/n]` search status segment, absent when no search is
/// active or the search has no matches.
pub fn search_summary(search: &SearchState) -> Option<String> {
    if !search.active || search.matches.is_empty() {
        return None;
    }
    Some(format!(
        "/{} [{}/{}]",
        search.pattern,
        search.index + 1,
        search.matches.len()
    ))
}

/// Builds the full status line text (unstyled; the caller wraps it in
/// reverse video and pads/truncates to the terminal width). While a `:` or
/// `/` prompt is open the whole line becomes the prompt buffer, per spec
/// §4.E.
pub fn build_status_line(
    agent_label: &str,
    mode: Mode,
    prompt_buffer: &str,
    position: Option<&str>,
    selection: Option<String>,
    search: Option<String>,
    pending_register: Option<char>,
) -> String {
    match mode {
        Mode::Command => return format!(":{prompt_buffer}"),
        Mode::Search => return format!("/{prompt_buffer}"),
        _ => {}
    }

    let mut segs = vec![format!("-- {} --", mode_label(mode)), agent_label.to_string()];
    if let Some(reg) = pending_register {
        segs.push(format!("\"{reg}"));
    }
    if let Some(sel) = selection {
        segs.push(sel);
    }
    if let Some(s) = search {
        segs.push(s);
    }
    if let Some(p) = position {
        segs.push(p.to_string());
    }
    segs.join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_indicator_reports_top_at_the_start() {
        assert_eq!(position_indicator(0, 23, 100), "[1-23/100] Top");
    }

    #[test]
    fn position_indicator_reports_bot_at_the_end() {
        assert_eq!(position_indicator(77, 23, 100), "[78-100/100] Bot");
    }

    #[test]
    fn position_indicator_reports_bot_when_content_fits() {
        assert_eq!(position_indicator(0, 23, 10), "[1-10/10] Bot");
    }

    #[test]
    fn position_indicator_reports_a_percentage_in_the_middle() {
        let indicator = position_indicator(38, 23, 100);
        assert!(indicator.starts_with("[39-61/100] "));
        assert!(indicator.ends_with('%'));
    }

    #[test]
    fn command_mode_status_line_is_just_the_prompt() {
        let line = build_status_line("claude-1", Mode::Command, "wq", None, None, None, None);
        assert_eq!(line, ":wq");
    }

    #[test]
    fn normal_mode_status_line_includes_mode_and_position() {
        let line = build_status_line(
            "codex-1",
            Mode::Normal,
            "",
            Some("[1-23/100] Top"),
            None,
            None,
            None,
        );
        assert_eq!(line, "-- NORMAL --  codex-1  [1-23/100] Top");
    }

    #[test]
    fn pending_register_prefix_is_shown_between_agent_and_selection() {
        let line = build_status_line(
            "claude-1",
            Mode::Normal,
            "",
            None,
            Some("3 lines".to_string()),
            None,
            Some('a'),
        );
        assert_eq!(line, "-- NORMAL --  claude-1  \"a  3 lines");
    }
}
