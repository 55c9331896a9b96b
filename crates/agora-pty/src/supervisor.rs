// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::HashMap;
use std::io::{Read, Write};

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use tokio::sync::{mpsc, oneshot};

use crate::error::PtyError;

const READ_CHUNK: usize = 16 * 1024;

/// A spawned child's PTY, bridged onto the async runtime. Reads happen on a
/// dedicated blocking thread and are forwarded as byte chunks; writes queue
/// onto another blocking thread so a slow or stuck child can't stall the
/// caller. `resize` is a cheap ioctl and is issued directly.
pub struct Supervisor {
    master: Box<dyn MasterPty + Send>,
    writer_tx: mpsc::UnboundedSender<Vec<u8>>,
    pid: Option<u32>,
}

/// Channels the session drains: raw output bytes destined for the pane's
/// [`agora_term::Grid`], and a one-shot fired when the child exits.
pub struct PtyEvents {
    pub output_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    pub exit_rx: oneshot::Receiver<i32>,
}

impl Supervisor {
    /// Forks a PTY of `cols x rows`, launches `cmd` with `args` and the
    /// extra environment variables in `env`, and returns the supervisor
    /// handle plus the channels its output and exit status arrive on.
    pub fn spawn(
        cmd: &str,
        args: &[String],
        env: &HashMap<String, String>,
        cols: u16,
        rows: u16,
    ) -> Result<(Supervisor, PtyEvents), PtyError> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::Open(e.into()))?;

        let mut builder = CommandBuilder::new(cmd);
        builder.args(args);
        for (k, v) in env {
            builder.env(k, v);
        }

        let mut child = pair
            .slave
            .spawn_command(builder)
            .map_err(|e| PtyError::Spawn(e.into()))?;
        drop(pair.slave);
        let pid = child.process_id();

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| PtyError::Open(e.into()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| PtyError::Open(e.into()))?;

        let (output_tx, output_rx) = mpsc::unbounded_channel();
        tokio::task::spawn_blocking(move || read_loop(reader, output_tx));

        let (writer_tx, writer_rx) = mpsc::unbounded_channel();
        tokio::task::spawn_blocking(move || write_loop(writer, writer_rx));

        let (exit_tx, exit_rx) = oneshot::channel();
        tokio::task::spawn_blocking(move || {
            let code = match child.wait() {
                Ok(status) => status.exit_code() as i32,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to wait on child pty process");
                    -1
                }
            };
            let _ = exit_tx.send(code);
        });

        Ok((
            Supervisor {
                master: pair.master,
                writer_tx,
                pid,
            },
            PtyEvents { output_rx, exit_rx },
        ))
    }

    /// The child's pid, for ancestor-pid identity resolution (spec §4.I) and
    /// for forwarding SIGSTOP/SIGCONT (spec §5 SIGTSTP/SIGCONT). `None` on
    /// platforms where `portable_pty` can't report it.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Sends a raw signal to the child process (spec §5: SIGTSTP suspends
    /// every hosted PTY via SIGSTOP, SIGCONT resumes them). A no-op if the
    /// pid is unknown.
    pub fn send_signal(&self, sig: libc::c_int) -> Result<(), PtyError> {
        let Some(pid) = self.pid else {
            return Ok(());
        };
        // SAFETY: `pid` was reported by the PTY backend for a child we spawned
        // and have not yet reaped; kill(2) on a valid pid is always safe to call.
        let rc = unsafe { libc::kill(pid as libc::pid_t, sig) };
        if rc != 0 {
            return Err(PtyError::Signal(anyhow::anyhow!(std::io::Error::last_os_error())));
        }
        Ok(())
    }

    /// Pushes raw bytes onto the child's stdin. Silently dropped once the
    /// writer thread has shut down (child already exited).
    pub fn write(&self, bytes: Vec<u8>) -> Result<(), PtyError> {
        self.writer_tx
            .send(bytes)
            .map_err(|_| PtyError::WriterClosed)
    }

    /// Propagates a size change to the real PTY. Callers are responsible for
    /// resizing their own [`agora_term::Grid`] separately — the grid's
    /// scrollback is independent of the viewport's rows/cols.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<(), PtyError> {
        self.master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::Resize(e.into()))
    }
}

fn read_loop(mut reader: Box<dyn Read + Send>, tx: mpsc::UnboundedSender<Vec<u8>>) {
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
}

fn write_loop(mut writer: Box<dyn Write + Send>, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(bytes) = rx.blocking_recv() {
        if writer.write_all(&bytes).is_err() {
            break;
        }
        let _ = writer.flush();
    }
}
