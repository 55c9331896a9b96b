// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The tool server: a newline-delimited JSON-RPC 2.0 server over a Unix
//! domain socket that lets hosted agents reach the ACL bus (spec §4.I).
mod bus_actor;
mod dispatch;
mod error;
mod identity;
mod server;
pub mod tools;
mod wire;

pub use bus_actor::{BusActor, BusHandle};
pub use error::RpcError;
pub use identity::IdentityResolver;
pub use server::ToolServer;
pub use wire::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RpcErrorObject};
