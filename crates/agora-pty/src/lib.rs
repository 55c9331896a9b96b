// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Forks and supervises a child process on a PTY, bridging its I/O onto
//! tokio via blocking-task threads.
mod error;
mod supervisor;

pub use error::PtyError;
pub use supervisor::{PtyEvents, Supervisor};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn spawned_cat_echoes_back_written_input() {
        let (sup, mut events) =
            Supervisor::spawn("cat", &[], &HashMap::new(), 80, 24).expect("spawn cat");
        sup.write(b"hello\n".to_vec()).expect("write");

        let mut collected = Vec::new();
        while let Some(chunk) = events.output_rx.recv().await {
            collected.extend_from_slice(&chunk);
            if collected.windows(5).any(|w| w == b"hello") {
                break;
            }
        }
        assert!(String::from_utf8_lossy(&collected).contains("hello"));
    }

    #[tokio::test]
    async fn exit_event_fires_when_child_exits() {
        let (_sup, events) =
            Supervisor::spawn("true", &[], &HashMap::new(), 80, 24).expect("spawn true");
        let code = events.exit_rx.await.expect("exit event");
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn resize_does_not_error_on_live_pty() {
        let (sup, _events) =
            Supervisor::spawn("cat", &[], &HashMap::new(), 80, 24).expect("spawn cat");
        sup.resize(100, 40).expect("resize");
    }

    #[tokio::test]
    async fn pid_is_reported_for_a_live_child() {
        let (sup, _events) =
            Supervisor::spawn("cat", &[], &HashMap::new(), 80, 24).expect("spawn cat");
        assert!(sup.pid().is_some());
    }

    #[tokio::test]
    async fn send_signal_stop_then_cont_does_not_error() {
        let (sup, _events) =
            Supervisor::spawn("cat", &[], &HashMap::new(), 80, 24).expect("spawn cat");
        sup.send_signal(libc::SIGSTOP).expect("sigstop");
        sup.send_signal(libc::SIGCONT).expect("sigcont");
    }
}
