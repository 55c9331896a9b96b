// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Wraps the (synchronous, single-owner) [`agora_acl::AclBus`] in an actor
//! task so the socket server's many per-connection tasks can share it
//! without a lock: every mutation goes through one mpsc channel and is
//! processed by a single task, matching how `sven-node`'s `ControlService`
//! serializes operator commands against one owned `Agent`.
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};

use agora_acl::{AclBus, AclError, AclMessage, Conversation, Performative};

enum BusCommand {
    RegisterAgent {
        id: String,
    },
    Send {
        sender: String,
        receivers: Option<Vec<String>>,
        performative: Performative,
        content: Value,
        conversation_id: Option<String>,
        in_reply_to: Option<String>,
        ontology: Option<String>,
        language: Option<String>,
        resp: oneshot::Sender<Result<String, AclError>>,
    },
    TakePending {
        agent_id: String,
        limit: usize,
        resp: oneshot::Sender<Vec<AclMessage>>,
    },
    PendingCount {
        agent_id: String,
        resp: oneshot::Sender<usize>,
    },
    Conversations {
        agent_id: Option<String>,
        resp: oneshot::Sender<Vec<Conversation>>,
    },
    KnownAgents {
        resp: oneshot::Sender<Vec<String>>,
    },
}

pub struct BusActor {
    bus: AclBus,
    cmd_rx: mpsc::Receiver<BusCommand>,
    /// The bus's own event stream, re-broadcast to every [`BusHandle`]
    /// subscriber after each command — `AclBus` only hands out receivers,
    /// so the actor is the one live subscriber that fans them back out.
    bus_events: broadcast::Receiver<agora_acl::BusEvent>,
    out_events: broadcast::Sender<agora_acl::BusEvent>,
}

impl BusActor {
    pub async fn run(mut self) {
        while let Some(cmd) = self.cmd_rx.recv().await {
            match cmd {
                BusCommand::RegisterAgent { id } => self.bus.register_agent(id),
                BusCommand::Send {
                    sender,
                    receivers,
                    performative,
                    content,
                    conversation_id,
                    in_reply_to,
                    ontology,
                    language,
                    resp,
                } => {
                    let result = self.bus.send(
                        &sender,
                        receivers,
                        performative,
                        content,
                        conversation_id,
                        in_reply_to,
                        ontology,
                        language,
                    );
                    let _ = resp.send(result);
                }
                BusCommand::TakePending {
                    agent_id,
                    limit,
                    resp,
                } => {
                    let _ = resp.send(self.bus.take_pending(&agent_id, limit));
                }
                BusCommand::PendingCount { agent_id, resp } => {
                    let _ = resp.send(self.bus.pending_count(&agent_id));
                }
                BusCommand::Conversations { agent_id, resp } => {
                    let convs = self
                        .bus
                        .conversations_for(agent_id.as_deref())
                        .into_iter()
                        .cloned()
                        .collect();
                    let _ = resp.send(convs);
                }
                BusCommand::KnownAgents { resp } => {
                    let _ = resp.send(self.bus.known_agents());
                }
            }
            loop {
                match self.bus_events.try_recv() {
                    Ok(ev) => {
                        let _ = self.out_events.send(ev);
                    }
                    Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
        }
    }
}

/// Cheap-to-clone handle to the running [`BusActor`].
#[derive(Clone)]
pub struct BusHandle {
    cmd_tx: mpsc::Sender<BusCommand>,
    events: broadcast::Sender<agora_acl::BusEvent>,
}

impl BusHandle {
    pub fn new() -> (BusActor, BusHandle) {
        let bus = AclBus::new();
        let bus_events = bus.subscribe();
        let (out_events, _) = broadcast::channel(256);
        let (cmd_tx, cmd_rx) = mpsc::channel(256);
        (
            BusActor {
                bus,
                cmd_rx,
                bus_events,
                out_events: out_events.clone(),
            },
            BusHandle {
                cmd_tx,
                events: out_events,
            },
        )
    }

    pub fn subscribe(&self) -> broadcast::Receiver<agora_acl::BusEvent> {
        self.events.subscribe()
    }

    pub async fn register_agent(&self, id: impl Into<String>) {
        let _ = self
            .cmd_tx
            .send(BusCommand::RegisterAgent { id: id.into() })
            .await;
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn send(
        &self,
        sender: &str,
        receivers: Option<Vec<String>>,
        performative: Performative,
        content: Value,
        conversation_id: Option<String>,
        in_reply_to: Option<String>,
        ontology: Option<String>,
        language: Option<String>,
    ) -> Result<String, AclError> {
        let (resp, rx) = oneshot::channel();
        let _ = self
            .cmd_tx
            .send(BusCommand::Send {
                sender: sender.to_string(),
                receivers,
                performative,
                content,
                conversation_id,
                in_reply_to,
                ontology,
                language,
                resp,
            })
            .await;
        rx.await
            .unwrap_or(Err(AclError::UnknownAgent("bus shut down".into())))
    }

    pub async fn take_pending(&self, agent_id: &str, limit: usize) -> Vec<AclMessage> {
        let (resp, rx) = oneshot::channel();
        let _ = self
            .cmd_tx
            .send(BusCommand::TakePending {
                agent_id: agent_id.to_string(),
                limit,
                resp,
            })
            .await;
        rx.await.unwrap_or_default()
    }

    pub async fn pending_count(&self, agent_id: &str) -> usize {
        let (resp, rx) = oneshot::channel();
        let _ = self
            .cmd_tx
            .send(BusCommand::PendingCount {
                agent_id: agent_id.to_string(),
                resp,
            })
            .await;
        rx.await.unwrap_or(0)
    }

    pub async fn conversations_for(&self, agent_id: Option<String>) -> Vec<Conversation> {
        let (resp, rx) = oneshot::channel();
        let _ = self
            .cmd_tx
            .send(BusCommand::Conversations { agent_id, resp })
            .await;
        rx.await.unwrap_or_default()
    }

    pub async fn known_agents(&self) -> Vec<String> {
        let (resp, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(BusCommand::KnownAgents { resp }).await;
        rx.await.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn register_and_send_round_trips_through_the_actor() {
        let (actor, handle) = BusHandle::new();
        tokio::spawn(actor.run());

        handle.register_agent("claude-1").await;
        handle.register_agent("codex-1").await;

        let conv = handle
            .send(
                "claude-1",
                Some(vec!["codex-1".into()]),
                Performative::Request,
                json!({"action": "build"}),
                None,
                None,
                None,
                None,
            )
            .await
            .unwrap();

        let pending = handle.take_pending("codex-1", 10).await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].conversation_id, conv);
    }
}
