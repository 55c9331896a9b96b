// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
#[derive(Debug, thiserror::Error)]
pub enum PtyError {
    #[error("failed to open pty: {0}")]
    Open(#[source] anyhow::Error),
    #[error("failed to spawn command: {0}")]
    Spawn(#[source] anyhow::Error),
    #[error("failed to resize pty: {0}")]
    Resize(#[source] anyhow::Error),
    #[error("failed to signal pty child: {0}")]
    Signal(#[source] anyhow::Error),
    #[error("pty writer is gone")]
    WriterClosed,
}
