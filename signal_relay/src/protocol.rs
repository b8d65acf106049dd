//! Wire envelopes exchanged between clients and the relay
//!
//! Every frame is a JSON object tagged by its `type` field. Clients send one
//! of five requests (`login`, `offer`, `answer`, `candidate`, `leave`); the
//! relay answers a `login` directly, reports unrecognized requests with an
//! `error`, and forwards everything else to the addressed peer.

use crate::error::{ClientRequestError, SignalingError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Placeholder rendered for a request that carried no `type` at all
pub const MISSING_TYPE: &str = "undefined";

/// A decoded request from a client
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Claim `name` as this connection's identity
    Login { name: Option<String> },
    /// Session description offer for `name`
    Offer {
        name: Option<String>,
        offer: Option<Value>,
    },
    /// Session description answer for `name`
    Answer {
        name: Option<String>,
        answer: Option<Value>,
    },
    /// Connectivity candidate for `name`
    Candidate {
        name: Option<String>,
        candidate: Option<Value>,
    },
    /// Tear down the negotiation with `name`
    Leave { name: Option<String> },
    /// Anything else, including frames that failed to decode.
    ///
    /// `kind` holds the offending `type` as text, or `None` when absent.
    Unknown { kind: Option<String> },
}

impl ClientMessage {
    /// The envelope a malformed frame is treated as
    pub fn empty() -> Self {
        ClientMessage::Unknown { kind: None }
    }

    /// Decode a raw frame.
    ///
    /// Fails only when the bytes are not JSON. JSON that is not an object
    /// decodes as the empty envelope.
    pub fn parse(raw: &[u8]) -> Result<Self, ClientRequestError> {
        let fields = match serde_json::from_slice::<Value>(raw)? {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        Ok(Self::from_fields(fields))
    }

    fn from_fields(mut fields: Map<String, Value>) -> Self {
        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => kind,
            Some(other) => {
                return ClientMessage::Unknown {
                    kind: Some(other.to_string()),
                };
            }
            None => return Self::empty(),
        };
        let name = match fields.remove("name") {
            Some(Value::String(name)) => Some(name),
            _ => None,
        };

        match kind.as_str() {
            "login" => ClientMessage::Login { name },
            "offer" => ClientMessage::Offer {
                name,
                offer: fields.remove("offer"),
            },
            "answer" => ClientMessage::Answer {
                name,
                answer: fields.remove("answer"),
            },
            "candidate" => ClientMessage::Candidate {
                name,
                candidate: fields.remove("candidate"),
            },
            "leave" => ClientMessage::Leave { name },
            _ => ClientMessage::Unknown { kind: Some(kind) },
        }
    }
}

/// A message sent by the relay to a client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Outcome of the recipient's own login
    Login { success: bool },
    /// Forwarded offer; `name` is the sender's identity
    Offer {
        #[serde(skip_serializing_if = "Option::is_none")]
        offer: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// Forwarded answer
    Answer {
        #[serde(skip_serializing_if = "Option::is_none")]
        answer: Option<Value>,
    },
    /// Forwarded candidate
    Candidate {
        #[serde(skip_serializing_if = "Option::is_none")]
        candidate: Option<Value>,
    },
    /// The linked peer left or disconnected
    Leave,
    /// The recipient's request was not understood
    Error { message: String },
}

impl ServerMessage {
    /// Error reply for a request whose type is not one of the five kinds
    pub fn command_not_found(kind: Option<&str>) -> Self {
        ServerMessage::Error {
            message: format!("Command not found: {}", kind.unwrap_or(MISSING_TYPE)),
        }
    }

    /// Encode as a JSON text frame
    pub fn to_json(&self) -> Result<String, SignalingError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
