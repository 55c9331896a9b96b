// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Session glue (spec §4 overview): owns every hosted [`Agent`], the
//! layout tree, the compositor, the register/overlay state and the ACL
//! bus handle, and turns terminal/PTY events into frames. `main` owns the
//! terminal itself and the process-level signal handlers; this crate only
//! reacts to what they report through [`ControlSignal`] and a
//! `futures::Stream` of `crossterm` events.
mod agent;
mod error;
mod pane;
mod session;

pub use agent::{Agent, FeedOutcome};
pub use error::SessionError;
pub use pane::PaneTable;
pub use session::{AgentEvent, ControlSignal, Session};
