// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Search over visible pane content, named yank registers, and OSC-52
//! clipboard emission (spec §4.F, §4.E "Search").
mod registers;
mod search;

pub use registers::{osc52_clipboard, RegisterKind, Registers, LAST_YANK, UNNAMED};
pub use search::{jump_offset, Direction, Match, SearchState};
