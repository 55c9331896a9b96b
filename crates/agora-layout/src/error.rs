// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("pane {0} is not a leaf in this layout")]
    UnknownPane(u64),
    #[error("layout is empty")]
    Empty,
}
