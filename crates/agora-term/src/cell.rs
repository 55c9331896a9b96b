// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use bitflags::bitflags;

bitflags! {
    /// SGR text attributes. Stored as flags so comparing "did the effective
    /// attribute set change between two cells" is a single XOR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Attrs: u16 {
        const BOLD          = 1 << 0;
        const DIM           = 1 << 1;
        const ITALIC        = 1 << 2;
        const UNDERLINE     = 1 << 3;
        const BLINK         = 1 << 4;
        const INVERSE       = 1 << 5;
        const INVISIBLE     = 1 << 6;
        const STRIKETHROUGH = 1 << 7;
    }
}

/// A terminal color, tagged by how it was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Default,
    Indexed16(u8),
    Indexed256(u8),
    Rgb(u8, u8, u8),
}

/// Current SGR state the parser accumulates; copied into each [`Cell`] as it
/// is written and restored wholesale by `SGR 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub attrs: Attrs,
    pub fg: Color,
    pub bg: Color,
}

impl Default for Style {
    fn default() -> Self {
        Style {
            attrs: Attrs::empty(),
            fg: Color::Default,
            bg: Color::Default,
        }
    }
}

/// A single terminal cell: one Unicode grapheme cluster (or a continuation
/// marker for the trailing half of a wide character) plus its style.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub grapheme: Box<str>,
    pub style: Style,
    /// True for the dummy cell following a double-width grapheme; such
    /// cells carry no text of their own and are skipped when rendering.
    pub wide_continuation: bool,
}

impl Cell {
    pub fn blank() -> Self {
        Cell {
            grapheme: " ".into(),
            style: Style::default(),
            wide_continuation: false,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.grapheme.as_ref() == " " && self.style == Style::default() && !self.wide_continuation
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::blank()
    }
}
