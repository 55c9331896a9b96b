// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Command-line surface. Deliberately thin: the specific command lines and
//! flags of the hosted agents live in the config file, not here, and a
//! full completions/subcommand tree is an external concern this crate
//! doesn't own.
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "agora", about = "A terminal multiplexer for hosting AI coding agents")]
pub struct Cli {
    /// Path to an explicit config file, merged on top of the usual search
    /// path (/etc/agora, $XDG_CONFIG_HOME/agora, .agora.yaml).
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Write tracing output to stderr. Off by default since stderr shares
    /// the tty with the alternate-screen display.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
