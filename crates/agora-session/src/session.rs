// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The session: owns every [`Agent`], the layout tree, the compositor and
//! the ACL bus handle, and turns terminal/PTY events into frames (spec §4
//! overview, §5 Concurrency).
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use agora_compositor::{Compositor, FrameContext, PaneSnapshot};
use agora_config::{AgentSpec, Config};
use agora_input::{
    Action, CursorPos, InputRouter, LayoutDirection, Mode, ScrollRequest,
};
use agora_layout::{Direction as LayoutDir, Layout, PaneId};
use agora_overlays::{OverlayStack, StackOutcome};
use agora_registers::{Registers, SearchState};
use agora_rpc::{BusHandle, IdentityResolver};
use chrono::Utc;
use crossterm::event::{Event, KeyEventKind};
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{info, warn};

use crate::agent::Agent;
use crate::error::SessionError;
use crate::pane::PaneTable;

/// How often the session redraws when something is dirty (spec §4.D
/// "coalesced at a fixed frame rate").
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// One chunk of raw PTY output (or exit) tagged with the agent it came
/// from, delivered over the session's single fan-in channel (spec §5 "PTY
/// output fan-in").
pub enum AgentEvent {
    Output { agent_id: String, bytes: Vec<u8> },
    Exited { agent_id: String, code: i32 },
}

/// Process-level signals `main` forwards into the session loop (spec §5
/// SIGWINCH/SIGTSTP/SIGCONT; terminal teardown itself stays in `main`).
pub enum ControlSignal {
    Resize { cols: u16, rows: u16 },
    Winch { virtual_rows: u16 },
    ForceRedraw,
    /// SIGTSTP: every hosted PTY gets SIGSTOP before `main` restores the
    /// terminal and self-SIGSTOPs (spec §5).
    Suspend,
    /// SIGCONT: every hosted PTY gets SIGCONT before `main` re-enters the
    /// alternate screen; the session forces a redraw.
    Resume,
    Shutdown,
}

/// What the session's run loop should do after dispatching one action or
/// event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Shutdown,
}

pub struct Session {
    config: Config,
    agents: HashMap<String, Agent>,
    /// Spawn order, oldest first, so shutdown can kill agents in reverse
    /// (spec §9 Ownership/lifecycle "reverse spawn-order kill").
    spawn_order: Vec<String>,
    pane_agent: PaneTable,
    layout: Layout,
    compositor: Compositor,
    router: InputRouter,
    registers: Registers,
    search: SearchState,
    /// The session's own copy of the in-progress search pattern: by the
    /// time `Action::SearchExecute` arrives, the router has already
    /// cleared its own prompt buffer on the INSERT/NORMAL transition, so
    /// the pattern text itself only ever travels through
    /// `Action::SearchInput`/`Action::SearchBackspace`.
    search_buffer: String,
    overlays: OverlayStack,
    bus: BusHandle,
    identity: Arc<IdentityResolver>,
    /// The tool server's socket path, passed to every hosted agent as
    /// `AGORA_MCP_SOCKET` (spec §6) so its bridge sidecar can find this
    /// session without scanning `~/.agora/sockets`.
    mcp_socket: Option<String>,
    next_id: HashMap<String, u64>,
    width: u16,
    height: u16,
    virtual_rows: u16,
    dirty: bool,
    fan_in_tx: mpsc::UnboundedSender<AgentEvent>,
    fan_in_rx: mpsc::UnboundedReceiver<AgentEvent>,
}

impl Session {
    /// Builds a session and spawns every agent in `config.agents`, in
    /// order, splitting the layout per `config.layout.split_vertical`
    /// between each launch.
    pub fn new(
        config: Config,
        width: u16,
        height: u16,
        virtual_rows: u16,
        bus: BusHandle,
        identity: Arc<IdentityResolver>,
        mcp_socket: Option<String>,
    ) -> Result<Self, SessionError> {
        let (fan_in_tx, fan_in_rx) = mpsc::unbounded_channel();
        let mut session = Session {
            config: config.clone(),
            agents: HashMap::new(),
            spawn_order: Vec::new(),
            pane_agent: PaneTable::new(),
            layout: Layout::new(0),
            compositor: Compositor::new(),
            router: InputRouter::new(),
            registers: Registers::new(),
            search: SearchState::new(),
            search_buffer: String::new(),
            overlays: OverlayStack::new(),
            bus,
            identity,
            mcp_socket,
            next_id: HashMap::new(),
            width,
            height,
            virtual_rows,
            dirty: true,
            fan_in_tx,
            fan_in_rx,
        };
        // `Layout::new(0)` above seeds a placeholder leaf with no agent
        // behind it; the first real spawn replaces it by splitting a tree
        // that is about to become non-empty. Simpler: build panes one at a
        // time below and only seed `layout` with the first agent's id.
        session.layout = Layout::new(0);
        let specs = config.agents.clone();
        let direction = if config.layout.split_vertical {
            LayoutDir::Down
        } else {
            LayoutDir::Right
        };
        for (idx, spec) in specs.iter().enumerate() {
            let pane = session.spawn_agent(spec)?;
            if idx == 0 {
                // Replace the bootstrap placeholder tree with the real
                // first pane.
                session.layout = Layout::new(pane);
            } else {
                session.layout.split(direction, pane)?;
            }
        }
        session.recompute_layout();
        Ok(session)
    }

    fn next_agent_id(&mut self, agent_type: &str) -> String {
        let counter = self.next_id.entry(agent_type.to_string()).or_insert(0);
        *counter += 1;
        format!("{agent_type}-{}", *counter)
    }

    /// Builds the child environment a hosted agent is launched with: the
    /// ambient variables spec §6 promises every child (`AGORA_ROWS`,
    /// `AGORA_SCROLLBACK`, `AGORA_MCP_SOCKET`, `AGORA_AGENT_TYPE`,
    /// `AGORA_AGENT_ID`, `FORCE_COLOR=1`), overlaid with whatever the config
    /// file set explicitly for this agent.
    fn build_agent_env(&self, id: &str, spec: &AgentSpec) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("AGORA_ROWS".to_string(), self.virtual_rows.to_string());
        env.insert(
            "AGORA_SCROLLBACK".to_string(),
            self.config.scrollback_max.to_string(),
        );
        if let Some(socket) = &self.mcp_socket {
            env.insert("AGORA_MCP_SOCKET".to_string(), socket.clone());
        }
        env.insert("AGORA_AGENT_TYPE".to_string(), spec.agent_type.clone());
        env.insert("AGORA_AGENT_ID".to_string(), id.to_string());
        env.insert("FORCE_COLOR".to_string(), "1".to_string());
        env.extend(spec.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }

    /// Spawns one agent from its config spec and wires its PTY output fan-in
    /// task, but does not touch the layout tree — callers decide whether to
    /// seed a fresh tree or `split` an existing one.
    fn spawn_agent(&mut self, spec: &AgentSpec) -> Result<PaneId, SessionError> {
        let id = self.next_agent_id(&spec.agent_type);
        let env = self.build_agent_env(&id, spec);
        let mut agent = Agent::spawn(
            id.clone(),
            spec.agent_type.clone(),
            &spec.cmd,
            &spec.args,
            &env,
            self.width,
            self.virtual_rows,
            self.config.scrollback_max,
            Utc::now(),
        )?;
        let events = agent.take_events();
        let pane = next_pane_id();
        self.pane_agent.insert(pane, id.clone());

        if let Some(pid) = agent.pid() {
            self.identity.register_pid(pid as libc::pid_t, id.clone());
        }

        let bus = self.bus.clone();
        let agent_id_for_bus = id.clone();
        tokio::spawn(async move {
            bus.register_agent(agent_id_for_bus).await;
        });

        let tx = self.fan_in_tx.clone();
        let agent_id = id.clone();
        tokio::spawn(async move {
            let mut output_rx = events.output_rx;
            let mut exit_rx = events.exit_rx;
            loop {
                tokio::select! {
                    chunk = output_rx.recv() => {
                        match chunk {
                            Some(bytes) => {
                                if tx.send(AgentEvent::Output { agent_id: agent_id.clone(), bytes }).is_err() {
                                    return;
                                }
                            }
                            None => break,
                        }
                    }
                    code = &mut exit_rx => {
                        let code = code.unwrap_or(-1);
                        let _ = tx.send(AgentEvent::Exited { agent_id, code });
                        return;
                    }
                }
            }
            let code = exit_rx.await.unwrap_or(-1);
            let _ = tx.send(AgentEvent::Exited { agent_id, code });
        });

        self.agents.insert(id.clone(), agent);
        self.spawn_order.push(id);
        Ok(pane)
    }

    fn lookup_spec(&self, agent_type: &str) -> Option<AgentSpec> {
        self.config
            .agents
            .iter()
            .find(|s| s.agent_type == agent_type)
            .cloned()
    }

    fn focused_pane(&self) -> Option<PaneId> {
        self.layout.focused_pane()
    }

    fn focused_agent_id(&self) -> Option<String> {
        self.focused_pane().and_then(|p| self.pane_agent.agent_of(p).map(str::to_string))
    }

    fn pane_at(&self, x: u16, y: u16) -> Option<PaneId> {
        self.layout.leaves().into_iter().find(|&pane| {
            let Some(b) = self.layout.bounds_of(pane) else {
                return false;
            };
            x >= b.x && x < b.right() && y >= b.y && y < b.bottom()
        })
    }

    fn pane_height(&self, pane: PaneId) -> usize {
        self.layout.bounds_of(pane).map(|b| b.h as usize).unwrap_or(1)
    }

    /// Recomputes leaf bounds and propagates any width change to the
    /// affected agents' PTYs and grids. Virtual row count is untouched
    /// here — it only ever changes on SIGWINCH (spec §6 `{APP}_ROWS`).
    fn recompute_layout(&mut self) {
        let changed = self.layout.recompute(self.width, self.height.saturating_sub(0));
        for (pane, bounds) in changed {
            if let Some(agent_id) = self.pane_agent.agent_of(pane) {
                if let Some(agent) = self.agents.get_mut(agent_id) {
                    if let Err(e) = agent.resize_cols(bounds.w) {
                        warn!(agent = agent_id, error = %e, "failed to resize agent pty");
                    }
                }
            }
        }
        self.dirty = true;
    }

    /// Applies a terminal resize (spec §5 "Resize"): recomputes every
    /// leaf's bounds against the new physical size.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.recompute_layout();
    }

    /// Applies a SIGWINCH-driven virtual row change to every agent,
    /// independent of layout (spec §6 `{APP}_ROWS`).
    fn apply_winch(&mut self, virtual_rows: u16) {
        self.virtual_rows = virtual_rows;
        for (id, agent) in self.agents.iter_mut() {
            if let Some(pane) = self.pane_agent.pane_of(id) {
                if let Some(bounds) = self.layout.bounds_of(pane) {
                    if let Err(e) = agent.resize_virtual(bounds.w, virtual_rows) {
                        warn!(agent = id, error = %e, "failed to apply virtual row resize");
                    }
                }
            }
        }
        self.dirty = true;
    }

    /// Feeds one chunk of raw PTY output through the owning agent's parser
    /// and routes the resulting bytes (spec §4.A `ReplyToChild` /
    /// `ForwardToPhysical`).
    async fn handle_agent_output(&mut self, agent_id: &str, bytes: Vec<u8>, physical_out: &mut Vec<u8>) {
        let Some(agent) = self.agents.get_mut(agent_id) else {
            return;
        };
        let outcome = agent.feed_chunk(&bytes);
        if !outcome.reply_to_child.is_empty() {
            if let Err(e) = agent.write_stdin(outcome.reply_to_child) {
                warn!(agent = agent_id, error = %e, "failed writing terminal reply to child");
            }
        }
        if !outcome.forward_to_physical.is_empty() {
            physical_out.extend(outcome.forward_to_physical);
        }
        self.dirty = true;
    }

    /// Handles an agent's exit: closes its pane and, if that was the last
    /// one, converts it into a full session shutdown (spec §4.B "the
    /// session converts exit into pane close + host exit when the last
    /// agent exits").
    fn handle_agent_exit(&mut self, agent_id: &str, code: i32) -> Flow {
        info!(agent = agent_id, code, "agent exited");
        let Some(pane) = self.pane_agent.pane_of(agent_id) else {
            return Flow::Continue;
        };
        self.layout.focus(pane);
        if let Ok(closed) = self.layout.close_focused() {
            self.pane_agent.remove_pane(closed);
            self.compositor.scroll.remove(closed);
        }
        if let Some(agent) = self.agents.remove(agent_id) {
            if let Some(pid) = agent.pid() {
                self.identity.unregister_pid(pid as libc::pid_t);
            }
        }
        self.recompute_layout();
        if self.layout.is_empty() {
            return Flow::Shutdown;
        }
        Flow::Continue
    }

    /// Parses and runs a `:`-command line (spec §9 Open Questions: pane
    /// splitting/new-agent spawning has no dedicated [`Action`] variant, so
    /// it rides the existing `CommandExecute` escape hatch).
    fn run_command(&mut self, cmd: &str) -> Result<Flow, SessionError> {
        let cmd = cmd.trim();
        let mut parts = cmd.split_whitespace();
        let Some(verb) = parts.next() else {
            return Ok(Flow::Continue);
        };
        match verb {
            "q" | "quit" => {
                if let Some(id) = self.focused_agent_id() {
                    return Ok(self.handle_agent_exit(&id, 0));
                }
                Ok(Flow::Continue)
            }
            "qa" | "quitall" => Ok(Flow::Shutdown),
            "new" => {
                let Some(agent_type) = parts.next() else {
                    return Err(SessionError::UnknownCommand(cmd.to_string()));
                };
                let spec = self
                    .lookup_spec(agent_type)
                    .ok_or_else(|| SessionError::UnknownCommand(cmd.to_string()))?;
                let pane = self.spawn_agent(&spec)?;
                let direction = if self.config.layout.split_vertical {
                    LayoutDir::Down
                } else {
                    LayoutDir::Right
                };
                self.layout.split(direction, pane)?;
                self.recompute_layout();
                Ok(Flow::Continue)
            }
            "split" => {
                let Some(agent_type) = parts.next() else {
                    return Err(SessionError::UnknownCommand(cmd.to_string()));
                };
                let spec = self
                    .lookup_spec(agent_type)
                    .ok_or_else(|| SessionError::UnknownCommand(cmd.to_string()))?;
                let direction = match parts.next() {
                    Some("h") => LayoutDir::Right,
                    Some("v") => LayoutDir::Down,
                    _ if self.config.layout.split_vertical => LayoutDir::Down,
                    _ => LayoutDir::Right,
                };
                let pane = self.spawn_agent(&spec)?;
                self.layout.split(direction, pane)?;
                self.recompute_layout();
                Ok(Flow::Continue)
            }
            _ => Err(SessionError::UnknownCommand(cmd.to_string())),
        }
    }

    fn scroll_delta(&self, request: ScrollRequest, pane_height: usize) -> i64 {
        match request {
            ScrollRequest::Lines(n) => n,
            ScrollRequest::HalfPage(n) => n * (pane_height as i64 / 2).max(1),
            ScrollRequest::FullPage(n) => n * pane_height.max(1) as i64,
        }
    }

    /// Dispatches one logical [`Action`] against the session's state.
    /// `physical_out` collects any bytes that must reach the real terminal
    /// (clipboard OSC-52 sequences), separate from the regular frame.
    fn apply_action(&mut self, action: Action, physical_out: &mut Vec<u8>) -> Result<Flow, SessionError> {
        match action {
            Action::ForwardToChild(bytes) => {
                let id = self.focused_agent_id().ok_or(SessionError::NoFocusedAgent)?;
                let agent = self.agents.get(&id).ok_or(SessionError::NoFocusedAgent)?;
                agent.write_stdin(bytes)?;
            }
            Action::ForwardToPhysical(bytes) => physical_out.extend(bytes),
            Action::EnterMode(_) => self.dirty = true,
            Action::Yank { register, text, kind } => {
                if let Some(bytes) = self.registers.yank(register, &text, kind) {
                    physical_out.extend(bytes);
                }
                self.dirty = true;
            }
            Action::ScrollFocusedPane(request) => {
                if let Some(pane) = self.focused_pane() {
                    self.scroll_pane(pane, request);
                }
            }
            Action::ScrollPaneAt { x, y, request } => {
                if let Some(pane) = self.pane_at(x, y) {
                    self.scroll_pane(pane, request);
                }
            }
            Action::Redraw => self.dirty = true,
            Action::SearchStart => {
                self.search_buffer.clear();
                self.dirty = true;
            }
            Action::SearchInput(c) => {
                self.search_buffer.push(c);
                self.dirty = true;
            }
            Action::SearchBackspace => {
                self.search_buffer.pop();
                self.dirty = true;
            }
            Action::SearchExecute => {
                if let Some(id) = self.focused_agent_id() {
                    if let Some(agent) = self.agents.get(&id) {
                        self.search.execute(&agent.grid, &self.search_buffer);
                        if let Some((line, _, _)) = self.search.current() {
                            if let Some(pane) = self.focused_pane() {
                                let height = self.pane_height(pane);
                                let content_height = agent.grid.content_height();
                                self.compositor
                                    .scroll
                                    .get_mut(pane)
                                    .jump_to(line, content_height, height);
                            }
                        }
                    }
                }
                self.dirty = true;
            }
            Action::SearchNext => {
                self.search.next();
                self.jump_to_current_match();
            }
            Action::SearchPrev => {
                self.search.previous();
                self.jump_to_current_match();
            }
            Action::CommandStart => self.dirty = true,
            Action::CommandInput(_) | Action::CommandBackspace => self.dirty = true,
            Action::CommandExecute(cmd) => {
                return self.run_command(&cmd);
            }
            Action::FocusDirection(dir) => {
                self.layout.focus_direction(to_layout_direction(dir));
                self.dirty = true;
            }
            Action::CycleFocus { forward } => {
                self.layout.cycle_focus(forward);
                self.dirty = true;
            }
            Action::ToggleZoom => {
                self.layout.toggle_zoom();
                self.dirty = true;
            }
            Action::Equalize => {
                self.layout.equalize();
                self.recompute_layout();
            }
            Action::Noop => {}
        }
        Ok(Flow::Continue)
    }

    fn scroll_pane(&mut self, pane: PaneId, request: ScrollRequest) {
        let height = self.pane_height(pane);
        let Some(agent_id) = self.pane_agent.agent_of(pane).map(str::to_string) else {
            return;
        };
        let Some(agent) = self.agents.get(&agent_id) else {
            return;
        };
        let content_height = agent.grid.content_height();
        let delta = self.scroll_delta(request, height);
        self.compositor.scroll.get_mut(pane).scroll_by(delta, content_height, height);
        self.dirty = true;
    }

    fn jump_to_current_match(&mut self) {
        let Some((line, _, _)) = self.search.current() else {
            return;
        };
        let Some(pane) = self.focused_pane() else {
            return;
        };
        let Some(agent_id) = self.pane_agent.agent_of(pane).map(str::to_string) else {
            return;
        };
        let Some(agent) = self.agents.get(&agent_id) else {
            return;
        };
        let height = self.pane_height(pane);
        let content_height = agent.grid.content_height();
        self.compositor.scroll.get_mut(pane).jump_to(line, content_height, height);
        self.dirty = true;
    }

    /// Routes one terminal event either to the overlay stack (which owns
    /// all input while it's non-empty, spec §4.G) or to the modal input
    /// router.
    fn route_terminal_event(&mut self, event: Event, physical_out: &mut Vec<u8>) -> Result<Flow, SessionError> {
        if !self.overlays.is_empty() {
            if let Event::Key(key) = event {
                if key.kind == KeyEventKind::Release {
                    return Ok(Flow::Continue);
                }
                match self.overlays.handle_key(key) {
                    StackOutcome::Consumed | StackOutcome::Cancelled => {}
                    StackOutcome::PickerSelected(idx) => {
                        if let Some(pane) = self.layout.leaves().get(idx).copied() {
                            self.layout.focus(pane);
                        }
                    }
                    StackOutcome::InputSubmitted(_text) => {}
                }
                self.dirty = true;
            }
            return Ok(Flow::Continue);
        }

        if let Event::Key(key) = &event {
            if key.kind == KeyEventKind::Release {
                return Ok(Flow::Continue);
            }
        }

        let agent_cursor = self
            .focused_agent_id()
            .and_then(|id| self.agents.get(&id))
            .map(|a| CursorPos::new(a.grid.scrollback_len() + a.grid.cursor_row, a.grid.cursor_col))
            .unwrap_or_default();
        let grid_ref = self.focused_agent_id().and_then(|id| self.agents.get(&id)).map(|a| &a.grid);
        let Some(grid) = grid_ref else {
            return Ok(Flow::Continue);
        };
        let actions = self.router.handle_event(event, grid, agent_cursor);
        for action in actions {
            match self.apply_action(action, physical_out)? {
                Flow::Shutdown => return Ok(Flow::Shutdown),
                Flow::Continue => {}
            }
        }
        Ok(Flow::Continue)
    }

    fn build_frame(&mut self) -> Vec<u8> {
        let snapshots: Vec<PaneSnapshot> = self
            .layout
            .leaves()
            .into_iter()
            .filter_map(|pane| {
                let agent_id = self.pane_agent.agent_of(pane)?;
                let agent = self.agents.get(agent_id)?;
                Some(PaneSnapshot { id: pane, label: agent.display_name.as_str(), grid: &agent.grid })
            })
            .collect();
        let ctx = FrameContext {
            width: self.width,
            height: self.height,
            layout: &self.layout,
            panes: &snapshots,
            focused_pane: self.layout.focused_pane(),
            modal: &self.router.state,
            search: &self.search,
            overlays: &self.overlays,
        };
        self.compositor.build_frame(&ctx)
    }

    /// Kills every agent in reverse spawn order (spec §9 Ownership/
    /// lifecycle) by dropping its `Supervisor`, which closes the PTY and
    /// sends the child a hangup.
    fn shutdown_agents(&mut self) {
        for id in self.spawn_order.clone().into_iter().rev() {
            self.agents.remove(&id);
        }
    }

    /// Forwards `sig` to every hosted agent's child process (spec §5
    /// SIGTSTP/SIGCONT: "all child PTYs" via SIGSTOP/SIGCONT).
    fn signal_all_agents(&self, sig: libc::c_int) {
        for agent in self.agents.values() {
            if let Err(e) = agent.send_signal(sig) {
                warn!(agent = agent.id.as_str(), error = %e, "failed to forward signal to agent pty");
            }
        }
    }

    /// Runs the main event loop: terminal input, PTY output fan-in, a
    /// coalesced redraw timer and process-level control signals (spec §5).
    /// `terminal_events` and `control` are owned by `main`, which sets up
    /// the raw-mode terminal and signal handlers; this loop only knows how
    /// to react to what they report.
    pub async fn run<S>(
        &mut self,
        mut terminal_events: S,
        mut control: mpsc::UnboundedReceiver<ControlSignal>,
        mut stdout: impl std::io::Write,
    ) -> Result<(), SessionError>
    where
        S: futures::Stream<Item = std::io::Result<Event>> + Unpin,
    {
        use futures::StreamExt;

        let mut ticker = interval(FRAME_INTERVAL);
        let mut suspended = false;

        loop {
            let mut physical_out = Vec::new();
            let flow = tokio::select! {
                Some(event) = terminal_events.next() => {
                    match event {
                        Ok(event) => self.route_terminal_event(event, &mut physical_out)?,
                        Err(e) => {
                            warn!(error = %e, "terminal event stream error");
                            Flow::Continue
                        }
                    }
                }
                Some(event) = self.fan_in_rx.recv() => {
                    match event {
                        AgentEvent::Output { agent_id, bytes } => {
                            self.handle_agent_output(&agent_id, bytes, &mut physical_out).await;
                            Flow::Continue
                        }
                        AgentEvent::Exited { agent_id, code } => self.handle_agent_exit(&agent_id, code),
                    }
                }
                Some(signal) = control.recv() => {
                    match signal {
                        ControlSignal::Resize { cols, rows } => {
                            self.resize(cols, rows);
                            Flow::Continue
                        }
                        ControlSignal::Winch { virtual_rows } => {
                            self.apply_winch(virtual_rows);
                            Flow::Continue
                        }
                        ControlSignal::ForceRedraw => {
                            self.dirty = true;
                            Flow::Continue
                        }
                        ControlSignal::Suspend => {
                            self.signal_all_agents(libc::SIGSTOP);
                            suspended = true;
                            Flow::Continue
                        }
                        ControlSignal::Resume => {
                            self.signal_all_agents(libc::SIGCONT);
                            suspended = false;
                            self.dirty = true;
                            Flow::Continue
                        }
                        ControlSignal::Shutdown => Flow::Shutdown,
                    }
                }
                _ = ticker.tick() => {
                    if !suspended && self.dirty {
                        let frame = self.build_frame();
                        stdout.write_all(&frame).map_err(|_| SessionError::NoFocusedAgent)?;
                        stdout.flush().ok();
                        self.dirty = false;
                    }
                    Flow::Continue
                }
            };

            if !physical_out.is_empty() {
                stdout.write_all(&physical_out).ok();
                stdout.flush().ok();
            }

            if flow == Flow::Shutdown {
                break;
            }
        }

        self.shutdown_agents();
        Ok(())
    }
}

fn to_layout_direction(d: LayoutDirection) -> LayoutDir {
    match d {
        LayoutDirection::Left => LayoutDir::Left,
        LayoutDirection::Right => LayoutDir::Right,
        LayoutDirection::Up => LayoutDir::Up,
        LayoutDirection::Down => LayoutDir::Down,
    }
}

/// Mints a fresh [`PaneId`]. Distinct from agent ids: a pane can outlive
/// the agent that first filled it if the session later recycled the slot
/// (spec §9 "cyclic references ... broken by storing ids").
fn next_pane_id() -> PaneId {
    use std::sync::atomic::{AtomicU64, Ordering};
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}
