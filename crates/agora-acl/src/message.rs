// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A FIPA-ACL communicative act classifying the intent of a message
/// (spec §3/GLOSSARY "Performative").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Performative {
    Inform,
    Request,
    QueryIf,
    QueryRef,
    Cfp,
    Propose,
    Agree,
    Refuse,
    Subscribe,
    Cancel,
}

impl Performative {
    /// Protocol a fresh conversation defaults to when started by a message
    /// with this performative and no explicit protocol is given.
    pub fn default_protocol(self) -> &'static str {
        match self {
            Performative::Cfp | Performative::Propose => "fipa-contract-net",
            Performative::QueryIf | Performative::QueryRef => "fipa-query",
            _ => "fipa-request",
        }
    }
}

/// One FIPA-ACL envelope (spec §3 "ACLMessage").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AclMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub performative: Performative,
    pub sender: String,
    pub receiver: Vec<String>,
    pub content: serde_json::Value,
    pub conversation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_by: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ontology: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn performative_serializes_kebab_case() {
        let json = serde_json::to_string(&Performative::QueryIf).unwrap();
        assert_eq!(json, "\"query-if\"");
    }

    #[test]
    fn cfp_defaults_to_contract_net_protocol() {
        assert_eq!(Performative::Cfp.default_protocol(), "fipa-contract-net");
    }

    #[test]
    fn request_defaults_to_fipa_request_protocol() {
        assert_eq!(Performative::Request.default_protocol(), "fipa-request");
    }
}
