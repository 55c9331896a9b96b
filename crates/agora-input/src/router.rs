// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Ties raw terminal events to the modal state machine and produces the
//! [`Action`]s the session dispatches (spec §4.E).
use agora_registers::RegisterKind;
use agora_term::Grid;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::action::{Action, LayoutDirection, ScrollRequest};
use crate::mode::{CursorPos, Mode, ModalState, PendingOperator, PendingPrefix};
use crate::motion::{resolve, Motion};

fn is_leader(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char(' ') && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn key_to_bytes(key: &KeyEvent) -> Vec<u8> {
    match key.code {
        KeyCode::Char(c) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                let b = c.to_ascii_lowercase() as u8;
                if b.is_ascii_lowercase() {
                    return vec![b - b'a' + 1];
                }
            }
            let mut buf = [0u8; 4];
            c.encode_utf8(&mut buf).as_bytes().to_vec()
        }
        KeyCode::Enter => vec![b'\r'],
        KeyCode::Tab => vec![b'\t'],
        KeyCode::Backspace => vec![0x7f],
        KeyCode::Esc => vec![0x1b],
        KeyCode::Left => b"\x1b[D".to_vec(),
        KeyCode::Right => b"\x1b[C".to_vec(),
        KeyCode::Up => b"\x1b[A".to_vec(),
        KeyCode::Down => b"\x1b[B".to_vec(),
        _ => Vec::new(),
    }
}

fn line_text(grid: &Grid, line: usize) -> String {
    grid.plain_line(line).unwrap_or_default()
}

/// Extracts a char-wise yank range `[from, to]` inclusive, in reading order.
fn char_range_text(grid: &Grid, from: CursorPos, to: CursorPos) -> String {
    let (start, end) = if (from.line, from.col) <= (to.line, to.col) {
        (from, to)
    } else {
        (to, from)
    };
    if start.line == end.line {
        let chars: Vec<char> = line_text(grid, start.line).chars().collect();
        let e = end.col.min(chars.len().saturating_sub(1));
        return chars[start.col.min(e)..=e.max(start.col.min(e))].iter().collect();
    }
    let mut out = String::new();
    for line in start.line..=end.line {
        let chars: Vec<char> = line_text(grid, line).chars().collect();
        if line == start.line {
            out.push_str(&chars[start.col.min(chars.len())..].iter().collect::<String>());
            out.push('\n');
        } else if line == end.line {
            let e = end.col.min(chars.len().saturating_sub(1));
            out.push_str(&chars[..=e.min(chars.len().saturating_sub(1))].iter().collect::<String>());
        } else {
            out.push_str(&chars.iter().collect::<String>());
            out.push('\n');
        }
    }
    out
}

/// Extracts whole lines `[from_line, to_line]` inclusive.
fn line_range_text(grid: &Grid, from_line: usize, to_line: usize) -> String {
    let (start, end) = if from_line <= to_line { (from_line, to_line) } else { (to_line, from_line) };
    let mut out = String::new();
    for line in start..=end {
        out.push_str(&line_text(grid, line));
        out.push('\n');
    }
    out
}

/// Parses raw key/mouse events against the current [`ModalState`] and
/// produces the logical actions the session applies. Holds no grid state
/// itself; callers pass the focused pane's grid for motion resolution.
pub struct InputRouter {
    pub state: ModalState,
}

impl InputRouter {
    pub fn new() -> Self {
        InputRouter { state: ModalState::new() }
    }

    /// `agent_cursor` is the focused agent's live VT cursor in absolute grid
    /// coordinates; it seeds `normal_cursor`/the visual anchor on the
    /// INSERT → NORMAL/VISUAL transition (spec §4.E) and is otherwise unused.
    pub fn handle_event(&mut self, event: Event, grid: &Grid, agent_cursor: CursorPos) -> Vec<Action> {
        match event {
            Event::Key(key) => self.handle_key(key, grid, agent_cursor),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Paste(text) => self.handle_paste(text),
            _ => vec![Action::Noop],
        }
    }

    fn handle_paste(&self, text: String) -> Vec<Action> {
        match self.state.mode {
            Mode::Insert => vec![Action::ForwardToChild(text.into_bytes())],
            _ => vec![Action::Noop],
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Vec<Action> {
        match mouse.kind {
            MouseEventKind::ScrollUp => vec![Action::ScrollPaneAt {
                x: mouse.column,
                y: mouse.row,
                request: ScrollRequest::Lines(-3),
            }],
            MouseEventKind::ScrollDown => vec![Action::ScrollPaneAt {
                x: mouse.column,
                y: mouse.row,
                request: ScrollRequest::Lines(3),
            }],
            _ => vec![Action::Noop],
        }
    }

    fn handle_key(&mut self, key: KeyEvent, grid: &Grid, agent_cursor: CursorPos) -> Vec<Action> {
        if self.state.mode == Mode::Overlay {
            return vec![Action::Noop];
        }
        if let Some(action) = self.viewport_key(&key) {
            return vec![action];
        }
        if self.state.command_pending {
            return self.handle_leader_continuation(key, agent_cursor);
        }
        if matches!(self.state.mode, Mode::Insert | Mode::Normal) && is_leader(&key) {
            self.state.command_pending = true;
            return vec![Action::Noop];
        }
        match self.state.mode {
            Mode::Insert => self.handle_insert_key(key),
            Mode::Normal => self.handle_normal_key(key, grid),
            Mode::Visual | Mode::VLine => self.handle_visual_key(key, grid),
            Mode::Search => self.handle_search_key(key),
            Mode::Command => self.handle_command_key(key),
            Mode::Overlay => unreachable!(),
        }
    }

    /// The key following the leader: mode transitions (`n`/`v`/`V`, only
    /// meaningful from INSERT) and pane-layout chords available in any mode.
    fn handle_leader_continuation(&mut self, key: KeyEvent, agent_cursor: CursorPos) -> Vec<Action> {
        self.state.command_pending = false;
        if key.code == KeyCode::Esc {
            return vec![Action::Noop];
        }
        if self.state.mode == Mode::Insert {
            match key.code {
                KeyCode::Char('n') => {
                    self.state.enter_normal(agent_cursor);
                    return vec![Action::EnterMode(Mode::Normal)];
                }
                KeyCode::Char('v') => {
                    self.state.enter_normal(agent_cursor);
                    self.state.enter_visual(false);
                    return vec![Action::EnterMode(Mode::Visual)];
                }
                KeyCode::Char('V') => {
                    self.state.enter_normal(agent_cursor);
                    self.state.enter_visual(true);
                    return vec![Action::EnterMode(Mode::VLine)];
                }
                _ => {}
            }
        }
        match key.code {
            KeyCode::Char('h') => vec![Action::FocusDirection(LayoutDirection::Left)],
            KeyCode::Char('l') => vec![Action::FocusDirection(LayoutDirection::Right)],
            KeyCode::Char('k') => vec![Action::FocusDirection(LayoutDirection::Up)],
            KeyCode::Char('j') => vec![Action::FocusDirection(LayoutDirection::Down)],
            KeyCode::Char('o') => vec![Action::CycleFocus { forward: true }],
            KeyCode::Char('O') => vec![Action::CycleFocus { forward: false }],
            KeyCode::Char('z') => vec![Action::ToggleZoom],
            KeyCode::Char('=') => vec![Action::Equalize],
            _ if self.state.mode == Mode::Insert => vec![Action::ForwardToChild(key_to_bytes(&key))],
            _ => vec![Action::Noop],
        }
    }

    /// Viewport keys work in any mode and are never forwarded to a child.
    fn viewport_key(&self, key: &KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::PageUp => Some(Action::ScrollFocusedPane(ScrollRequest::FullPage(-1))),
            KeyCode::PageDown => Some(Action::ScrollFocusedPane(ScrollRequest::FullPage(1))),
            KeyCode::Up if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::ScrollFocusedPane(ScrollRequest::Lines(-1)))
            }
            KeyCode::Down if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::ScrollFocusedPane(ScrollRequest::Lines(1)))
            }
            KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Redraw),
            _ => None,
        }
    }

    fn handle_insert_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.code == KeyCode::Esc {
            return vec![Action::ForwardToChild(vec![0x1b])];
        }
        vec![Action::ForwardToChild(key_to_bytes(&key))]
    }

    fn handle_escape_in_chord_mode(&mut self) -> Vec<Action> {
        if self.state.has_count()
            || self.state.pending_operator.is_some()
            || self.state.pending_prefix.is_some()
            || self.state.register.is_some()
        {
            self.state.clear_pending();
            return vec![Action::Noop];
        }
        match self.state.mode {
            Mode::Visual | Mode::VLine => {
                let cursor = self.state.visual_cursor;
                self.state.enter_normal(cursor);
                vec![Action::EnterMode(Mode::Normal)]
            }
            Mode::Normal => {
                self.state.enter_insert();
                vec![Action::EnterMode(Mode::Insert)]
            }
            _ => vec![Action::Noop],
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent, grid: &Grid) -> Vec<Action> {
        if key.code == KeyCode::Esc {
            return self.handle_escape_in_chord_mode();
        }

        if let Some(PendingPrefix::Register) = self.state.pending_prefix {
            self.state.pending_prefix = None;
            if let KeyCode::Char(c) = key.code {
                self.state.register = Some(c);
            }
            return vec![Action::Noop];
        }
        if key.code == KeyCode::Char('"') {
            self.state.pending_prefix = Some(PendingPrefix::Register);
            return vec![Action::Noop];
        }

        if let KeyCode::Char(c) = key.code {
            if c.is_ascii_digit() {
                let d = c.to_digit(10).unwrap();
                if d != 0 || self.state.has_count() {
                    self.state.push_count_digit(d);
                    return vec![Action::Noop];
                }
            }
        }

        if key.code == KeyCode::Char('n') {
            return vec![Action::SearchNext];
        }
        if key.code == KeyCode::Char('N') {
            return vec![Action::SearchPrev];
        }
        if key.code == KeyCode::Char('/') {
            self.state.enter_search();
            return vec![Action::SearchStart];
        }
        if key.code == KeyCode::Char(':') {
            self.state.enter_command();
            return vec![Action::CommandStart];
        }
        if key.code == KeyCode::Char('v') {
            self.state.enter_visual(false);
            return vec![Action::EnterMode(Mode::Visual)];
        }
        if key.code == KeyCode::Char('V') {
            self.state.enter_visual(true);
            return vec![Action::EnterMode(Mode::VLine)];
        }

        if let Some(PendingPrefix::FindChar { till, forward }) = self.state.pending_prefix {
            self.state.pending_prefix = None;
            if let KeyCode::Char(ch) = key.code {
                let count = self.state.take_count();
                let motion = Motion::FindChar { ch, forward, till };
                return self.apply_normal_motion(motion, count, grid);
            }
            return vec![Action::Noop];
        }
        match key.code {
            KeyCode::Char('f') => {
                self.state.pending_prefix = Some(PendingPrefix::FindChar { till: false, forward: true });
                return vec![Action::Noop];
            }
            KeyCode::Char('F') => {
                self.state.pending_prefix = Some(PendingPrefix::FindChar { till: false, forward: false });
                return vec![Action::Noop];
            }
            KeyCode::Char('t') => {
                self.state.pending_prefix = Some(PendingPrefix::FindChar { till: true, forward: true });
                return vec![Action::Noop];
            }
            KeyCode::Char('T') => {
                self.state.pending_prefix = Some(PendingPrefix::FindChar { till: true, forward: false });
                return vec![Action::Noop];
            }
            _ => {}
        }

        if let Some(PendingPrefix::G) = self.state.pending_prefix {
            self.state.pending_prefix = None;
            if key.code == KeyCode::Char('g') {
                return self.complete_or_yank_lines(Motion::GotoTop, grid);
            }
            return vec![Action::Noop];
        }
        if key.code == KeyCode::Char('g') {
            self.state.pending_prefix = Some(PendingPrefix::G);
            return vec![Action::Noop];
        }
        if key.code == KeyCode::Char('G') {
            let n = self.state.take_count();
            let motion = if self.state.has_count() {
                Motion::GotoLine(n as usize)
            } else {
                Motion::GotoBottom
            };
            return self.complete_or_yank_lines(motion, grid);
        }

        if key.code == KeyCode::Char('y') {
            if self.state.pending_operator == Some(PendingOperator::Yank) {
                return self.complete_or_yank_lines(Motion::Down, grid);
            }
            self.state.pending_operator = Some(PendingOperator::Yank);
            return vec![Action::Noop];
        }
        if key.code == KeyCode::Char('d') || key.code == KeyCode::Char('c') {
            self.state.pending_operator = Some(PendingOperator::Discard);
            return vec![Action::Noop];
        }

        if let Some(motion) = key_to_motion(&key) {
            let count = self.state.take_count();
            return self.apply_normal_motion(motion, count, grid);
        }

        vec![Action::Noop]
    }

    /// `yy`, `ygg` and `yG` all yank whole lines from `normal_cursor.line` to
    /// the resolved motion's target line; any other operator just consumes
    /// the motion and discards it.
    fn complete_or_yank_lines(&mut self, motion: Motion, grid: &Grid) -> Vec<Action> {
        let count = self.state.take_count();
        let from_line = self.state.normal_cursor.line;
        let to = resolve(grid, self.state.normal_cursor, motion, count);
        match self.state.pending_operator.take() {
            Some(PendingOperator::Yank) => {
                let text = line_range_text(grid, from_line, to.line);
                let register = self.state.register.take();
                self.state.clear_pending();
                vec![Action::Yank { register, text, kind: RegisterKind::Line }]
            }
            Some(PendingOperator::Discard) => {
                self.state.clear_pending();
                vec![Action::Noop]
            }
            None => {
                self.state.normal_cursor = to;
                self.state.clear_pending();
                vec![Action::Redraw]
            }
        }
    }

    fn apply_normal_motion(&mut self, motion: Motion, count: u32, grid: &Grid) -> Vec<Action> {
        let from = self.state.normal_cursor;
        let to = resolve(grid, from, motion, count);
        match self.state.pending_operator.take() {
            Some(PendingOperator::Yank) => {
                let text = char_range_text(grid, from, to);
                let register = self.state.register.take();
                self.state.clear_pending();
                vec![Action::Yank { register, text, kind: RegisterKind::Char }]
            }
            Some(PendingOperator::Discard) => {
                self.state.clear_pending();
                vec![Action::Noop]
            }
            None => {
                self.state.normal_cursor = to;
                self.state.clear_pending();
                vec![Action::Redraw]
            }
        }
    }

    fn handle_visual_key(&mut self, key: KeyEvent, grid: &Grid) -> Vec<Action> {
        if key.code == KeyCode::Esc {
            return self.handle_escape_in_chord_mode();
        }
        if key.code == KeyCode::Char('"') {
            self.state.pending_prefix = Some(PendingPrefix::Register);
            return vec![Action::Noop];
        }
        if let Some(PendingPrefix::Register) = self.state.pending_prefix {
            self.state.pending_prefix = None;
            if let KeyCode::Char(c) = key.code {
                self.state.register = Some(c);
            }
            return vec![Action::Noop];
        }
        if let KeyCode::Char(c) = key.code {
            if c.is_ascii_digit() {
                let d = c.to_digit(10).unwrap();
                if d != 0 || self.state.has_count() {
                    self.state.push_count_digit(d);
                    return vec![Action::Noop];
                }
            }
        }
        if key.code == KeyCode::Char('/') {
            self.state.enter_search();
            return vec![Action::SearchStart];
        }
        if key.code == KeyCode::Char('y') {
            let kind = self.state.visual_register_kind();
            let text = match kind {
                RegisterKind::Line => {
                    line_range_text(grid, self.state.visual_anchor.line, self.state.visual_cursor.line)
                }
                RegisterKind::Char => char_range_text(grid, self.state.visual_anchor, self.state.visual_cursor),
            };
            let register = self.state.register.take();
            self.state.enter_insert();
            return vec![
                Action::Yank { register, text, kind },
                Action::EnterMode(Mode::Insert),
            ];
        }
        if let Some(motion) = key_to_motion(&key) {
            let count = self.state.take_count();
            self.state.visual_cursor = resolve(grid, self.state.visual_cursor, motion, count);
            self.state.clear_pending();
            return vec![Action::Redraw];
        }
        vec![Action::Noop]
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Vec<Action> {
        match key.code {
            KeyCode::Esc => {
                self.state.exit_prompt();
                vec![Action::EnterMode(self.state.mode)]
            }
            KeyCode::Enter => {
                let prev = self.state.previous_mode;
                self.state.exit_prompt();
                vec![Action::SearchExecute, Action::EnterMode(prev)]
            }
            KeyCode::Backspace => {
                self.state.prompt_buffer.pop();
                vec![Action::SearchBackspace]
            }
            KeyCode::Char(c) => {
                self.state.prompt_buffer.push(c);
                vec![Action::SearchInput(c)]
            }
            _ => vec![Action::Noop],
        }
    }

    fn handle_command_key(&mut self, key: KeyEvent) -> Vec<Action> {
        match key.code {
            KeyCode::Esc => {
                self.state.exit_prompt();
                vec![Action::EnterMode(self.state.mode)]
            }
            KeyCode::Enter => {
                let cmd = self.state.prompt_buffer.clone();
                let prev = self.state.previous_mode;
                self.state.exit_prompt();
                vec![Action::CommandExecute(cmd), Action::EnterMode(prev)]
            }
            KeyCode::Backspace => {
                self.state.prompt_buffer.pop();
                vec![Action::CommandBackspace]
            }
            KeyCode::Char(c) => {
                self.state.prompt_buffer.push(c);
                vec![Action::CommandInput(c)]
            }
            _ => vec![Action::Noop],
        }
    }
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a key event to a movement [`Motion`], independent of mode. Returns
/// `None` for keys with no motion meaning (the caller falls through to its
/// own handling, e.g. `g`/`y`/digits already consumed above).
fn key_to_motion(key: &KeyEvent) -> Option<Motion> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('h') | KeyCode::Left => Some(Motion::Left),
        KeyCode::Char('l') | KeyCode::Right => Some(Motion::Right),
        KeyCode::Char('k') | KeyCode::Up => Some(Motion::Up),
        KeyCode::Char('j') | KeyCode::Down => Some(Motion::Down),
        KeyCode::Char('0') => Some(Motion::LineStart),
        KeyCode::Char('^') => Some(Motion::FirstNonBlank),
        KeyCode::Char('$') => Some(Motion::LineEnd),
        KeyCode::Char('w') => Some(Motion::WordForward { big: false }),
        KeyCode::Char('W') => Some(Motion::WordForward { big: true }),
        KeyCode::Char('e') => Some(Motion::WordEnd { big: false }),
        KeyCode::Char('E') => Some(Motion::WordEnd { big: true }),
        KeyCode::Char('b') if !ctrl => Some(Motion::WordBack { big: false }),
        KeyCode::Char('B') => Some(Motion::WordBack { big: true }),
        KeyCode::Char('d') if ctrl => Some(Motion::HalfPageDown),
        KeyCode::Char('u') if ctrl => Some(Motion::HalfPageUp),
        KeyCode::Char('f') if ctrl => Some(Motion::FullPageDown),
        KeyCode::Char('b') if ctrl => Some(Motion::FullPageUp),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers).with_kind(KeyEventKind::Press))
    }

    fn grid_with(lines: &[&str]) -> Grid {
        let mut g = Grid::new(40, lines.len().max(1), 1000);
        for (i, line) in lines.iter().enumerate() {
            for ch in line.chars() {
                g.put_grapheme(&ch.to_string(), 1);
            }
            if i + 1 < lines.len() {
                g.carriage_return();
                g.linefeed();
            }
        }
        g
    }

    #[test]
    fn leader_n_enters_normal_mode() {
        let mut router = InputRouter::new();
        let grid = grid_with(&["hello"]);
        router.handle_event(key(KeyCode::Char(' '), KeyModifiers::CONTROL), &grid, CursorPos::default());
        assert!(router.state.command_pending);
        let actions = router.handle_event(key(KeyCode::Char('n'), KeyModifiers::NONE), &grid, CursorPos::default());
        assert_eq!(actions, vec![Action::EnterMode(Mode::Normal)]);
        assert_eq!(router.state.mode, Mode::Normal);
    }

    #[test]
    fn esc_in_insert_is_forwarded_to_child() {
        let mut router = InputRouter::new();
        let grid = grid_with(&["hi"]);
        let actions = router.handle_event(key(KeyCode::Esc, KeyModifiers::NONE), &grid, CursorPos::default());
        assert_eq!(actions, vec![Action::ForwardToChild(vec![0x1b])]);
    }

    #[test]
    fn yy_yanks_the_current_line() {
        let mut router = InputRouter::new();
        let grid = grid_with(&["hello world"]);
        router.state.enter_normal(CursorPos::new(0, 0));
        router.handle_event(key(KeyCode::Char('y'), KeyModifiers::NONE), &grid, CursorPos::default());
        let actions = router.handle_event(key(KeyCode::Char('y'), KeyModifiers::NONE), &grid, CursorPos::default());
        assert_eq!(
            actions,
            vec![Action::Yank { register: None, text: "hello world\n".to_string(), kind: RegisterKind::Line }]
        );
    }

    #[test]
    fn visual_yank_returns_to_insert_mode() {
        let mut router = InputRouter::new();
        let grid = grid_with(&["hello world"]);
        router.state.enter_normal(CursorPos::new(0, 0));
        router.state.enter_visual(false);
        router.state.visual_cursor = CursorPos::new(0, 4);
        let actions = router.handle_event(key(KeyCode::Char('y'), KeyModifiers::NONE), &grid, CursorPos::default());
        assert_eq!(
            actions,
            vec![
                Action::Yank { register: None, text: "hello".to_string(), kind: RegisterKind::Char },
                Action::EnterMode(Mode::Insert),
            ]
        );
        assert_eq!(router.state.mode, Mode::Insert);
    }

    #[test]
    fn page_up_is_a_viewport_key_in_insert_mode() {
        let mut router = InputRouter::new();
        let grid = grid_with(&["x"]);
        let actions = router.handle_event(key(KeyCode::PageUp, KeyModifiers::NONE), &grid, CursorPos::default());
        assert_eq!(actions, vec![Action::ScrollFocusedPane(ScrollRequest::FullPage(-1))]);
        assert_eq!(router.state.mode, Mode::Insert);
    }

    #[test]
    fn d_operator_is_a_graceful_noop() {
        let mut router = InputRouter::new();
        let grid = grid_with(&["hello"]);
        router.state.enter_normal(CursorPos::new(0, 0));
        router.handle_event(key(KeyCode::Char('d'), KeyModifiers::NONE), &grid, CursorPos::default());
        let actions = router.handle_event(key(KeyCode::Char('l'), KeyModifiers::NONE), &grid, CursorPos::default());
        assert_eq!(actions, vec![Action::Noop]);
        assert!(router.state.pending_operator.is_none());
    }

    #[test]
    fn mouse_wheel_up_scrolls_by_three_lines() {
        let mut router = InputRouter::new();
        let grid = grid_with(&["x"]);
        let actions = router.handle_event(
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::ScrollUp,
                column: 5,
                row: 2,
                modifiers: KeyModifiers::NONE,
            }),
            &grid,
            CursorPos::default(),
        );
        assert_eq!(
            actions,
            vec![Action::ScrollPaneAt { x: 5, y: 2, request: ScrollRequest::Lines(-3) }]
        );
    }
}
