//! Discord gateway connection: WebSocket handshake, heartbeats, MESSAGE_CREATE delivery.
//!
//! There is no resume or reconnect. When the server asks for one, or the socket
//! closes, the connection task ends with an error and the session reports it.

use crate::config::Settings;
use crate::event::{ChannelId, InboundEvent};
use crate::gateway::http::DiscordHttp;
use crate::gateway::protocol::{
    opcode, GatewayPayload, Hello, MessageCreate, Ready, CLOSE_AUTHENTICATION_FAILED,
    MESSAGE_CREATE, READY,
};
use crate::gateway::{Connection, CurrentUser, Gateway, GatewayError, SendError};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Gateway backed by a Discord user account.
pub struct DiscordGateway {
    token: String,
    gateway_url: String,
    http: DiscordHttp,
}

impl DiscordGateway {
    pub fn new(settings: &Settings) -> Self {
        Self {
            token: settings.token.clone(),
            gateway_url: settings.gateway_url.clone(),
            http: DiscordHttp::new(settings.api_base.clone(), settings.token.clone()),
        }
    }
}

#[async_trait]
impl Gateway for DiscordGateway {
    async fn connect(&self, events: mpsc::Sender<InboundEvent>) -> Result<Connection, GatewayError> {
        log::info!("discord gateway: connecting to {}", self.gateway_url);
        let (ws, _) = tokio_tungstenite::connect_async(self.gateway_url.as_str())
            .await
            .map_err(|e| GatewayError::Connection(e.to_string()))?;
        let (mut sink, mut stream) = ws.split();

        let first = next_payload(&mut stream).await?;
        if first.op != opcode::HELLO {
            return Err(GatewayError::Protocol(format!(
                "expected hello (op 10), got op {}",
                first.op
            )));
        }
        let hello: Hello = serde_json::from_value(first.d)
            .map_err(|e| GatewayError::Protocol(format!("hello payload: {}", e)))?;

        send_payload(&mut sink, &GatewayPayload::identify(&self.token)).await?;

        let mut seq = None;
        loop {
            let payload = next_payload(&mut stream).await?;
            if payload.s.is_some() {
                seq = payload.s;
            }
            if payload.op == opcode::INVALID_SESSION {
                return Err(GatewayError::Auth("session rejected during identify".to_string()));
            }
            if payload.is_dispatch(READY) {
                let ready: Ready = serde_json::from_value(payload.d)
                    .map_err(|e| GatewayError::Protocol(format!("ready payload: {}", e)))?;
                log::info!(
                    "discord gateway: ready as {} (session {})",
                    ready.user.username,
                    ready.session_id.as_deref().unwrap_or("-")
                );
                break;
            }
        }

        let interval = Duration::from_millis(hello.heartbeat_interval);
        let closed = tokio::spawn(async move { run_connection(sink, stream, interval, seq, events).await });
        Ok(Connection { closed })
    }

    async fn current_user(&self) -> Result<CurrentUser, GatewayError> {
        self.http.current_user().await
    }

    async fn send(&self, conversation: ChannelId, text: &str) -> Result<(), SendError> {
        self.http.send_message(conversation, text).await
    }
}

async fn send_payload(sink: &mut WsSink, payload: &GatewayPayload) -> Result<(), GatewayError> {
    let text = serde_json::to_string(payload)
        .map_err(|e| GatewayError::Protocol(e.to_string()))?;
    sink.send(Message::Text(text))
        .await
        .map_err(|e| GatewayError::Connection(e.to_string()))
}

/// Read the next JSON frame. Control frames are skipped; close frames become errors.
async fn next_payload(stream: &mut WsSource) -> Result<GatewayPayload, GatewayError> {
    while let Some(msg) = stream.next().await {
        let msg = msg.map_err(|e| GatewayError::Connection(e.to_string()))?;
        match msg {
            Message::Text(text) => {
                return serde_json::from_str(&text)
                    .map_err(|e| GatewayError::Protocol(format!("bad frame: {}", e)));
            }
            Message::Close(frame) => {
                let (code, reason) = frame
                    .map(|f| (u16::from(f.code), f.reason.to_string()))
                    .unwrap_or((0, String::new()));
                if code == CLOSE_AUTHENTICATION_FAILED {
                    return Err(GatewayError::Auth(reason));
                }
                return Err(GatewayError::Connection(format!(
                    "gateway closed ({}): {}",
                    code, reason
                )));
            }
            _ => continue,
        }
    }
    Err(GatewayError::Connection("gateway stream ended".to_string()))
}

async fn run_connection(
    mut sink: WsSink,
    mut stream: WsSource,
    interval: Duration,
    mut seq: Option<u64>,
    events: mpsc::Sender<InboundEvent>,
) -> Result<(), GatewayError> {
    let mut heartbeat = tokio::time::interval(interval);
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick completes immediately.
    heartbeat.tick().await;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                send_payload(&mut sink, &GatewayPayload::heartbeat(seq)).await?;
            }
            payload = next_payload(&mut stream) => {
                let payload = payload?;
                if payload.s.is_some() {
                    seq = payload.s;
                }
                match payload.op {
                    opcode::DISPATCH => {
                        if payload.t.as_deref() != Some(MESSAGE_CREATE) {
                            continue;
                        }
                        let event = match serde_json::from_value::<MessageCreate>(payload.d) {
                            Ok(msg) => msg.into_event(),
                            Err(e) => {
                                log::debug!("discord gateway: skipping message: {}", e);
                                None
                            }
                        };
                        if let Some(event) = event {
                            if events.send(event).await.is_err() {
                                log::debug!("discord gateway: event receiver closed, stopping");
                                return Ok(());
                            }
                        }
                    }
                    opcode::HEARTBEAT => {
                        send_payload(&mut sink, &GatewayPayload::heartbeat(seq)).await?;
                    }
                    opcode::HEARTBEAT_ACK => {}
                    opcode::RECONNECT => {
                        return Err(GatewayError::Connection("gateway requested reconnect".to_string()));
                    }
                    opcode::INVALID_SESSION => {
                        return Err(GatewayError::Connection("gateway invalidated the session".to_string()));
                    }
                    other => log::debug!("discord gateway: ignoring op {}", other),
                }
            }
        }
    }
}
