// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Socket discovery (spec §4.J, §6 "File system layout"): find the running
//! tool server's Unix socket in priority order, and prune discovery files
//! that no longer point at a live server.
use std::path::{Path, PathBuf};

/// One discovery path the bridge tried, kept around so a diagnostic payload
/// can show the user exactly where it looked (spec §7 "user-visible
/// failures").
#[derive(Debug, Clone)]
pub struct Attempt {
    pub description: String,
    pub path: PathBuf,
    pub found: bool,
}

/// The discovery directory `~/.agora/sockets/`, keyed by server pid.
fn discovery_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".agora").join("sockets"))
}

/// The legacy single-session discovery file `~/.agora-mcp-socket`.
fn legacy_discovery_file() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".agora-mcp-socket"))
}

/// True if a process with this pid is alive (`kill(pid, 0)`, spec §4.J
/// "prune discovery files whose pid is not alive").
fn pid_alive(pid: i32) -> bool {
    // SAFETY: signal 0 performs no action beyond existence/permission checks.
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}

/// Reads a discovery file's contents as a socket path, trimmed of
/// whitespace. `None` if the file can't be read or is empty.
fn read_socket_path(path: &Path) -> Option<PathBuf> {
    let text = std::fs::read_to_string(path).ok()?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

/// Removes every discovery file under `~/.agora/sockets/` whose pid is dead
/// or whose socket path no longer exists (spec §4.J, §6). Called once at
/// bridge startup; safe to call even if the directory doesn't exist.
pub fn prune_stale() {
    let Some(dir) = discovery_dir() else { return };
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Ok(pid) = file_name.parse::<i32>() else {
            continue;
        };
        let stale = !pid_alive(pid)
            || read_socket_path(&path)
                .map(|sock| !sock.exists())
                .unwrap_or(true);
        if stale {
            let _ = std::fs::remove_file(&path);
        }
    }
}

/// On Linux, walks `/proc/<pid>/stat` upward from our own pid and returns
/// the chain of ancestor pids (not including ourselves). Empty on any other
/// platform or if `/proc` is unavailable (spec §9 "the design tolerates
/// absence of `/proc`").
#[cfg(target_os = "linux")]
pub fn ancestor_pids() -> Vec<i32> {
    let mut chain = Vec::new();
    let mut pid = std::process::id() as i32;
    for _ in 0..32 {
        let stat_path = format!("/proc/{pid}/stat");
        let Ok(contents) = std::fs::read_to_string(&stat_path) else {
            break;
        };
        // Field 4 is ppid; fields 2 (comm) may contain spaces/parens, so
        // split after the last ')'.
        let Some(after_comm) = contents.rsplit_once(')') else {
            break;
        };
        let fields: Vec<&str> = after_comm.1.split_whitespace().collect();
        let Some(ppid_str) = fields.get(1) else {
            break;
        };
        let Ok(ppid) = ppid_str.parse::<i32>() else {
            break;
        };
        if ppid <= 1 {
            break;
        }
        chain.push(ppid);
        pid = ppid;
    }
    chain
}

#[cfg(not(target_os = "linux"))]
pub fn ancestor_pids() -> Vec<i32> {
    Vec::new()
}

/// Finds the tool server socket, recording every path tried along the way
/// (spec §4.J discovery order: env override, pid-keyed file preferring an
/// ancestor match, most recent active session, legacy file).
pub fn find_socket() -> (Option<PathBuf>, Vec<Attempt>) {
    let mut attempts = Vec::new();

    if let Ok(p) = std::env::var("AGORA_MCP_SOCKET") {
        let path = PathBuf::from(p);
        let found = path.exists();
        attempts.push(Attempt {
            description: "AGORA_MCP_SOCKET env override".to_string(),
            path: path.clone(),
            found,
        });
        if found {
            return (Some(path), attempts);
        }
        return (None, attempts);
    }

    let ancestors = ancestor_pids();
    if let Some(dir) = discovery_dir() {
        if let Ok(entries) = std::fs::read_dir(&dir) {
            let mut candidates: Vec<(i32, PathBuf, std::time::SystemTime)> = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                let Some(pid) = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| n.parse::<i32>().ok())
                else {
                    continue;
                };
                let Some(sock) = read_socket_path(&path) else {
                    continue;
                };
                let found = sock.exists();
                let mtime = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
                attempts.push(Attempt {
                    description: format!("discovery file for pid {pid}"),
                    path: sock.clone(),
                    found,
                });
                if found {
                    candidates.push((pid, sock, mtime));
                }
            }

            if let Some((_, sock, _)) = candidates.iter().find(|(pid, _, _)| ancestors.contains(pid)) {
                return (Some(sock.clone()), attempts);
            }

            if let Some((_, sock, _)) = candidates.iter().max_by_key(|(_, _, mtime)| *mtime) {
                return (Some(sock.clone()), attempts);
            }
        }
    }

    if let Some(legacy) = legacy_discovery_file() {
        if let Some(sock) = read_socket_path(&legacy) {
            let found = sock.exists();
            attempts.push(Attempt {
                description: "legacy discovery file ~/.agora-mcp-socket".to_string(),
                path: sock.clone(),
                found,
            });
            if found {
                return (Some(sock), attempts);
            }
        } else {
            attempts.push(Attempt {
                description: "legacy discovery file ~/.agora-mcp-socket".to_string(),
                path: legacy,
                found: false,
            });
        }
    }

    (None, attempts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_wins_when_socket_exists() {
        let dir = tempfile::tempdir().unwrap();
        let sock = dir.path().join("explicit.sock");
        std::fs::write(&sock, b"").unwrap();
        std::env::set_var("AGORA_MCP_SOCKET", &sock);
        let (found, attempts) = find_socket();
        std::env::remove_var("AGORA_MCP_SOCKET");
        assert_eq!(found, Some(sock));
        assert_eq!(attempts.len(), 1);
    }

    #[test]
    fn env_override_missing_socket_reports_not_found() {
        std::env::set_var("AGORA_MCP_SOCKET", "/tmp/agora-bridge-test-does-not-exist.sock");
        let (found, attempts) = find_socket();
        std::env::remove_var("AGORA_MCP_SOCKET");
        assert!(found.is_none());
        assert!(!attempts[0].found);
    }

    #[test]
    fn pid_alive_is_true_for_our_own_process() {
        assert!(pid_alive(std::process::id() as i32));
    }

    #[test]
    fn pid_alive_is_false_for_an_unlikely_pid() {
        assert!(!pid_alive(i32::MAX - 1));
    }
}
