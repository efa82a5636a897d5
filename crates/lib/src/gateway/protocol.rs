//! Discord gateway wire types (hello, identify, dispatch payloads).

use crate::event::{ChannelId, InboundEvent, UserId};
use serde::{Deserialize, Serialize};

pub mod opcode {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

pub const READY: &str = "READY";
pub const MESSAGE_CREATE: &str = "MESSAGE_CREATE";

/// GUILD_MESSAGES | DIRECT_MESSAGES | MESSAGE_CONTENT
pub const DEFAULT_INTENTS: u64 = (1 << 9) | (1 << 12) | (1 << 15);

/// Close code sent by Discord when the token is rejected.
pub const CLOSE_AUTHENTICATION_FAILED: u16 = 4004;

/// Wire frame: `{ "op", "d", "s", "t" }`. `s` and `t` are only set on dispatches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

/// Payload of op 10.
#[derive(Debug, Clone, Deserialize)]
pub struct Hello {
    pub heartbeat_interval: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IdentifyParams {
    pub token: String,
    pub intents: u64,
    pub properties: IdentifyProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct IdentifyProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireUser {
    pub id: String,
    #[serde(default)]
    pub username: String,
}

/// READY dispatch (only the fields we read).
#[derive(Debug, Clone, Deserialize)]
pub struct Ready {
    pub user: WireUser,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// MESSAGE_CREATE dispatch (only the fields we read).
#[derive(Debug, Clone, Deserialize)]
pub struct MessageCreate {
    pub channel_id: String,
    pub author: WireUser,
    #[serde(default)]
    pub content: String,
}

impl GatewayPayload {
    pub fn heartbeat(seq: Option<u64>) -> Self {
        Self {
            op: opcode::HEARTBEAT,
            d: seq.map(serde_json::Value::from).unwrap_or(serde_json::Value::Null),
            s: None,
            t: None,
        }
    }

    pub fn identify(token: &str) -> Self {
        let params = IdentifyParams {
            token: token.to_string(),
            intents: DEFAULT_INTENTS,
            properties: IdentifyProperties {
                os: std::env::consts::OS.to_string(),
                browser: "clyde".to_string(),
                device: "clyde".to_string(),
            },
        };
        Self {
            op: opcode::IDENTIFY,
            d: serde_json::to_value(params).unwrap_or(serde_json::Value::Null),
            s: None,
            t: None,
        }
    }

    pub fn is_dispatch(&self, name: &str) -> bool {
        self.op == opcode::DISPATCH && self.t.as_deref() == Some(name)
    }
}

impl MessageCreate {
    /// Convert to an inbound event. None when an id is not a valid snowflake.
    pub fn into_event(self) -> Option<InboundEvent> {
        let author_id = self.author.id.parse::<UserId>().ok()?;
        let conversation_id = self.channel_id.parse::<ChannelId>().ok()?;
        Some(InboundEvent {
            author_id,
            conversation_id,
            text: self.content,
        })
    }
}
