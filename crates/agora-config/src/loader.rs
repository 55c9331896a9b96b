// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::Config;

/// Ordered list of config file locations searched from lowest to highest
/// priority. Later files override earlier ones.
fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("/etc/agora/config.yaml"));
    paths.push(PathBuf::from("/etc/agora/config.yml"));

    if let Some(cfg) = dirs::config_dir() {
        paths.push(cfg.join("agora/config.yaml"));
        paths.push(cfg.join("agora/config.yml"));
    }

    paths.push(PathBuf::from(".agora.yaml"));
    paths.push(PathBuf::from(".agora.yml"));

    paths
}

/// Load configuration by merging every discovered YAML file in priority
/// order, plus an optional explicit override (e.g. a `--config` CLI flag).
pub fn load(extra: Option<&Path>) -> anyhow::Result<Config> {
    let mut merged = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());

    for path in config_search_paths() {
        if path.is_file() {
            debug!(path = %path.display(), "loading config layer");
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let layer: serde_yaml::Value = serde_yaml::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?;
            merge_yaml(&mut merged, layer);
        }
    }

    if let Some(p) = extra {
        debug!(path = %p.display(), "loading explicit config");
        let text =
            std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
        let layer: serde_yaml::Value =
            serde_yaml::from_str(&text).with_context(|| format!("parsing {}", p.display()))?;
        merge_yaml(&mut merged, layer);
    }

    let config: Config = if matches!(merged, serde_yaml::Value::Mapping(ref m) if m.is_empty()) {
        Config::default()
    } else {
        serde_yaml::from_value(merged).unwrap_or_default()
    };
    Ok(config)
}

/// Deep-merge `src` into `dst`; `src` wins on scalar conflicts.
fn merge_yaml(dst: &mut serde_yaml::Value, src: serde_yaml::Value) {
    match (dst, src) {
        (serde_yaml::Value::Mapping(d), serde_yaml::Value::Mapping(s)) => {
            for (k, v) in s {
                let entry = d
                    .entry(k)
                    .or_insert(serde_yaml::Value::Mapping(serde_yaml::Mapping::new()));
                merge_yaml(entry, v);
            }
        }
        (dst, src) => *dst = src,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_with_no_extra_path_returns_defaults() {
        let cfg = load(None).unwrap();
        assert_eq!(cfg.scrollback_max, 10_000);
        assert_eq!(cfg.leader_key, "ctrl-space");
    }

    #[test]
    fn load_explicit_file_overrides_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "scrollback_max: 500\nleader_key: ctrl-a").unwrap();
        let cfg = load(Some(f.path())).unwrap();
        assert_eq!(cfg.scrollback_max, 500);
        assert_eq!(cfg.leader_key, "ctrl-a");
    }

    #[test]
    fn load_agents_list_round_trips() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "agents:\n  - type: claude\n    cmd: claude\n  - type: codex\n    cmd: codex\n    args: [\"--quiet\"]"
        )
        .unwrap();
        let cfg = load(Some(f.path())).unwrap();
        assert_eq!(cfg.agents.len(), 2);
        assert_eq!(cfg.agents[0].agent_type, "claude");
        assert_eq!(cfg.agents[1].args, vec!["--quiet".to_string()]);
    }

    #[test]
    fn load_returns_error_when_explicit_path_missing() {
        let result = load(Some(Path::new("/tmp/agora_nonexistent_config_xyz.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn merge_nested_tables_src_wins_on_scalars() {
        let mut dst: serde_yaml::Value = serde_yaml::from_str("layout:\n  split_vertical: true").unwrap();
        let src: serde_yaml::Value = serde_yaml::from_str("layout:\n  split_vertical: false").unwrap();
        merge_yaml(&mut dst, src);
        assert_eq!(dst["layout"]["split_vertical"].as_bool(), Some(false));
    }
}
