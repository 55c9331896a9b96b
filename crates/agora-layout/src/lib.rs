// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Binary split-tree layout engine: splits, focus, resize, zoom and
//! directional navigation over a tree of panes. Pure data structure, no I/O.
mod bounds;
mod error;
mod tree;

pub use bounds::Bounds;
pub use error::LayoutError;
pub use tree::{Direction, Layout, Orientation, PaneId};
