// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! One hosted AI agent: id, PTY supervisor and the Grid its output parses
//! into (spec §3 "Agent").
use std::collections::HashMap;

use agora_pty::{PtyEvents, Supervisor};
use agora_term::{Grid, Parser, TermEvent};
use chrono::{DateTime, Utc};

use crate::error::SessionError;

/// Bytes produced while feeding one chunk of an agent's PTY output through
/// the VT parser: some must go back to the child (OSC 10/11 negative
/// answers), some must reach the physical terminal untouched (OSC 52,
/// spec §4.A).
#[derive(Default)]
pub struct FeedOutcome {
    pub reply_to_child: Vec<u8>,
    pub forward_to_physical: Vec<u8>,
}

/// An agent's PTY runs at a row count decoupled from its pane's on-screen
/// height (spec §6 `{APP}_ROWS`, "virtual row count for child PTYs"): a
/// split making a pane short should not make the hosted CLI think its
/// terminal shrank. Only `cols` tracks the pane's actual width, since
/// line-wrapping must match what is actually drawn.
pub struct Agent {
    pub id: String,
    pub agent_type: String,
    pub display_name: String,
    pub spawned_at: DateTime<Utc>,
    pub grid: Grid,
    parser: Parser,
    supervisor: Supervisor,
    events: Option<PtyEvents>,
    cols: u16,
    virtual_rows: u16,
}

impl Agent {
    pub fn spawn(
        id: impl Into<String>,
        agent_type: impl Into<String>,
        cmd: &str,
        args: &[String],
        env: &HashMap<String, String>,
        cols: u16,
        virtual_rows: u16,
        scrollback_max: usize,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let (supervisor, events) = Supervisor::spawn(cmd, args, env, cols, virtual_rows)?;
        let id = id.into();
        let agent_type = agent_type.into();
        Ok(Agent {
            display_name: id.clone(),
            id,
            grid: Grid::new(cols as usize, virtual_rows as usize, scrollback_max),
            parser: Parser::new(),
            supervisor,
            events: Some(events),
            cols,
            virtual_rows,
            spawned_at: now,
            agent_type,
        })
    }

    /// Feeds one chunk of raw PTY output, already read by the session's
    /// fan-in task, through the VT parser.
    pub fn feed_chunk(&mut self, chunk: &[u8]) -> FeedOutcome {
        let mut outcome = FeedOutcome::default();
        for event in self.parser.feed(chunk, &mut self.grid) {
            match event {
                TermEvent::ReplyToChild(bytes) => outcome.reply_to_child.extend(bytes),
                TermEvent::ForwardToPhysical(bytes) => outcome.forward_to_physical.extend(bytes),
            }
        }
        outcome
    }

    pub fn write_stdin(&self, bytes: Vec<u8>) -> Result<(), SessionError> {
        self.supervisor.write(bytes)?;
        Ok(())
    }

    /// The hosted child's pid, used to register this agent with the
    /// [`agora_rpc::IdentityResolver`] for ancestor-pid resolution (spec
    /// §4.I) and for SIGTSTP/SIGCONT forwarding (spec §5).
    pub fn pid(&self) -> Option<u32> {
        self.supervisor.pid()
    }

    /// Forwards a raw signal to the hosted child (SIGSTOP/SIGCONT on
    /// SIGTSTP/SIGCONT, spec §5).
    pub fn send_signal(&self, sig: libc::c_int) -> Result<(), SessionError> {
        self.supervisor.send_signal(sig)?;
        Ok(())
    }

    /// Propagates a new pane width to the PTY and grid. `virtual_rows`
    /// changes only on SIGWINCH (spec §6), never on a layout split.
    pub fn resize_cols(&mut self, cols: u16) -> Result<(), SessionError> {
        self.resize_virtual(cols, self.virtual_rows)
    }

    pub fn resize_virtual(&mut self, cols: u16, virtual_rows: u16) -> Result<(), SessionError> {
        self.cols = cols;
        self.virtual_rows = virtual_rows;
        self.grid.resize(cols as usize, virtual_rows as usize);
        self.supervisor.resize(cols, virtual_rows)?;
        Ok(())
    }

    /// Takes the channel pair the session's per-agent fan-in task reads
    /// from. Called exactly once, right after spawning, while wiring the
    /// forwarding task; panics if called twice.
    pub fn take_events(&mut self) -> PtyEvents {
        self.events.take().expect("agent events taken twice")
    }
}
