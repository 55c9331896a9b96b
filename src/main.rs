// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
mod cli;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crossterm::event::EventStream;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tokio::sync::mpsc;

use agora_rpc::{BusHandle, IdentityResolver, ToolServer};
use agora_session::{ControlSignal, Session};

use cli::Cli;

/// `CSI ? 1049 h` + SGR mouse (`1000h`/`1006h`) + cursor hide (spec §6
/// "Physical terminal"). Escape sequences go to stdout: that's the same fd
/// the compositor draws frames to, so setup and frames never interleave
/// across different kernel write() calls racing each other.
const ENTER_SCREEN: &[u8] = b"\x1b[?1049h\x1b[?1000h\x1b[?1006h\x1b[?25l";
/// Teardown reverses setup in order: mouse off, cursor on, alternate
/// screen off (spec §6).
const LEAVE_SCREEN: &[u8] = b"\x1b[?1000l\x1b[?25h\x1b[?1049l";

fn enter_alt_screen() -> io::Result<()> {
    enable_raw_mode()?;
    let mut out = io::stdout();
    out.write_all(ENTER_SCREEN)?;
    out.flush()
}

fn leave_alt_screen() -> io::Result<()> {
    let mut out = io::stdout();
    out.write_all(LEAVE_SCREEN)?;
    out.flush()?;
    disable_raw_mode()
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

    // Tracing to stderr would corrupt the alternate-screen display since
    // both share the same tty; suppress it unless the caller opts in via
    // AGORA_LOG_FILE (any file) or --verbose (stderr, for headless
    // debugging where stderr has been redirected by the shell).
    if let Ok(path) = std::env::var("AGORA_LOG_FILE") {
        if let Ok(file) = std::fs::OpenOptions::new().create(true).append(true).open(&path) {
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_ansi(false).with_writer(std::sync::Mutex::new(file)))
                .with(filter)
                .try_init();
            return;
        }
    }
    if verbose {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .try_init();
    }
}

/// Installs a panic hook that restores the terminal before the default
/// hook prints the panic message, so a panic in raw mode/alternate screen
/// doesn't leave the user's shell unusable.
fn install_panic_hook() {
    let original = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = leave_alt_screen();
        original(info);
    }));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = agora_config::load(cli.config.as_deref()).context("loading config")?;

    let (width, height) = crossterm::terminal::size().context("reading terminal size")?;
    let rows_override = std::env::var("AGORA_ROWS").ok().and_then(|v| v.parse::<u16>().ok());
    let virtual_rows = rows_override.unwrap_or(height);

    let (bus_actor, bus) = BusHandle::new();
    tokio::spawn(bus_actor.run());
    let identity = Arc::new(IdentityResolver::new());

    let tool_server = Arc::new(ToolServer::new(bus.clone(), identity.clone()));
    let listener = tool_server.bind().await.context("binding tool socket")?;
    let socket_path = tool_server.socket_path().display().to_string();
    std::env::set_var("AGORA_MCP_SOCKET", &socket_path);
    std::env::set_var("FORCE_COLOR", "1");
    {
        let tool_server = tool_server.clone();
        tokio::spawn(async move {
            if let Err(e) = tool_server.serve(listener).await {
                tracing::warn!(error = %e, "tool server stopped");
            }
        });
    }

    let mut session = Session::new(
        config,
        width,
        height,
        virtual_rows,
        bus,
        identity,
        Some(socket_path),
    )
    .context("spawning agents")?;

    install_panic_hook();
    enter_alt_screen().context("entering alternate screen")?;

    let (control_tx, control_rx) = mpsc::unbounded_channel::<ControlSignal>();
    spawn_signal_task(control_tx, rows_override);

    let terminal_events = EventStream::new();
    let stdout = io::stdout();
    let run_result = session.run(terminal_events, control_rx, stdout).await;

    let _ = leave_alt_screen();
    tool_server.shutdown();

    run_result.context("session run loop")?;
    Ok(())
}

/// Listens for SIGINT/SIGTERM/SIGTSTP/SIGCONT/SIGWINCH and turns them into
/// [`ControlSignal`]s the session loop reacts to (spec §5). SIGTSTP/SIGINT/
/// SIGTERM require touching the real terminal, which `Session` never
/// does, so that happens here rather than in the session loop.
fn spawn_signal_task(control_tx: mpsc::UnboundedSender<ControlSignal>, rows_override: Option<u16>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let Ok(mut sigint) = signal(SignalKind::interrupt()) else { return };
        let Ok(mut sigterm) = signal(SignalKind::terminate()) else { return };
        let Ok(mut sigtstp) = signal(SignalKind::from_raw(libc::SIGTSTP)) else { return };
        let Ok(mut sigcont) = signal(SignalKind::from_raw(libc::SIGCONT)) else { return };
        let Ok(mut sigwinch) = signal(SignalKind::window_change()) else { return };

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    let _ = control_tx.send(ControlSignal::Shutdown);
                    break;
                }
                _ = sigterm.recv() => {
                    let _ = control_tx.send(ControlSignal::Shutdown);
                    break;
                }
                _ = sigtstp.recv() => {
                    let _ = control_tx.send(ControlSignal::Suspend);
                    let _ = leave_alt_screen();
                    unsafe { libc::raise(libc::SIGSTOP); }
                    // Execution resumes here once something sends SIGCONT.
                    let _ = enter_alt_screen();
                    let _ = control_tx.send(ControlSignal::Resume);
                }
                _ = sigcont.recv() => {
                    // A bare SIGCONT (not preceded by our own SIGTSTP, e.g.
                    // sent manually) still needs the terminal re-entered.
                    let _ = enter_alt_screen();
                    let _ = control_tx.send(ControlSignal::Resume);
                }
                _ = sigwinch.recv() => {
                    if let Ok((cols, rows)) = crossterm::terminal::size() {
                        let _ = control_tx.send(ControlSignal::Resize { cols, rows });
                        let virtual_rows = rows_override.unwrap_or(rows);
                        let _ = control_tx.send(ControlSignal::Winch { virtual_rows });
                    }
                }
            }
        }
    });
}
