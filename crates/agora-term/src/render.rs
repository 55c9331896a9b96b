// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Turns a [`Line`] into a byte string with minimal SGR resets: an escape
//! sequence is only emitted where the effective attribute set actually
//! changes between adjacent cells, per spec §4.A.
use crate::cell::{Attrs, Color, Style};
use crate::line::Line;

fn push_sgr(out: &mut String, style: &Style) {
    let mut codes: Vec<u8> = Vec::new();
    if style.attrs.contains(Attrs::BOLD) {
        codes.push(1);
    }
    if style.attrs.contains(Attrs::DIM) {
        codes.push(2);
    }
    if style.attrs.contains(Attrs::ITALIC) {
        codes.push(3);
    }
    if style.attrs.contains(Attrs::UNDERLINE) {
        codes.push(4);
    }
    if style.attrs.contains(Attrs::BLINK) {
        codes.push(5);
    }
    if style.attrs.contains(Attrs::INVERSE) {
        codes.push(7);
    }
    if style.attrs.contains(Attrs::INVISIBLE) {
        codes.push(8);
    }
    if style.attrs.contains(Attrs::STRIKETHROUGH) {
        codes.push(9);
    }

    let mut parts: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
    match style.fg {
        Color::Default => {}
        Color::Indexed16(n) => {
            parts.push(if n < 8 {
                format!("{}", 30 + n)
            } else {
                format!("{}", 82 + n)
            });
        }
        Color::Indexed256(n) => parts.push(format!("38;5;{n}")),
        Color::Rgb(r, g, b) => parts.push(format!("38;2;{r};{g};{b}")),
    }
    match style.bg {
        Color::Default => {}
        Color::Indexed16(n) => {
            parts.push(if n < 8 {
                format!("{}", 40 + n)
            } else {
                format!("{}", 92 + n)
            });
        }
        Color::Indexed256(n) => parts.push(format!("48;5;{n}")),
        Color::Rgb(r, g, b) => parts.push(format!("48;2;{r};{g};{b}")),
    }

    if parts.is_empty() {
        out.push_str("\x1b[0m");
    } else {
        out.push_str("\x1b[0;");
        out.push_str(&parts.join(";"));
        out.push('m');
    }
}

/// Render `line`, trimmed to `max_width` display columns, emitting minimal
/// SGR resets between adjacent cells whose effective style differs. A
/// trailing reset is emitted iff any non-default style was used.
pub fn render_line(line: &Line, max_width: usize) -> String {
    let mut out = String::new();
    let mut current: Option<Style> = None;
    let mut used_non_default = false;
    let mut col = 0usize;

    for cell in line.cells() {
        if col >= max_width {
            break;
        }
        if cell.wide_continuation {
            col += 1;
            continue;
        }
        if current != Some(cell.style) {
            push_sgr(&mut out, &cell.style);
            current = Some(cell.style);
            if cell.style != Style::default() {
                used_non_default = true;
            }
        }
        out.push_str(&cell.grapheme);
        col += 1;
    }

    if used_non_default {
        out.push_str("\x1b[0m");
    }

    out
}
