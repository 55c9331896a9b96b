// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The compositor: builds one sync-updated frame per tick from the layout
//! tree, pane grids, overlays and status bar (spec §4.D).
mod frame;
mod highlight;
mod scroll;
mod status;

pub use frame::{Compositor, FrameContext, PaneSnapshot};
pub use highlight::{overlay_highlights, Highlight, SearchSpan};
pub use scroll::{PaneScroll, ScrollTable};
pub use status::{build_status_line, mode_label, position_indicator, search_summary, selection_summary};
