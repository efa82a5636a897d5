//! Gateway: the one connection to the chat service.
//!
//! The `Gateway` trait is the seam between the session and the transport. The
//! Discord implementation pushes every observed message into an mpsc channel;
//! sends and the identity lookup go over REST.

mod discord;
mod http;
mod protocol;

use crate::event::{ChannelId, InboundEvent, UserId};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use discord::DiscordGateway;
pub use http::DiscordHttp;
pub use protocol::{GatewayPayload, MessageCreate};

/// The account the connection is authenticated as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("connection error: {0}")]
    Connection(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("unable to resolve current user: {0}")]
    Identity(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("unable to parse channel id {0:?}")]
    InvalidConversation(String),
    #[error("discord request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("discord api error: {0}")]
    Api(String),
}

/// An open, authenticated connection. `closed` resolves when the connection ends.
pub struct Connection {
    pub closed: JoinHandle<Result<(), GatewayError>>,
}

/// Push-based transport plus synchronous send.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Open the connection and authenticate. Returns once authenticated; every
    /// message observed afterwards is pushed into `events` until the connection ends.
    async fn connect(&self, events: mpsc::Sender<InboundEvent>) -> Result<Connection, GatewayError>;

    /// Look up the account the connection is authenticated as.
    async fn current_user(&self) -> Result<CurrentUser, GatewayError>;

    /// Post a message to a conversation.
    async fn send(&self, conversation: ChannelId, text: &str) -> Result<(), SendError>;
}
