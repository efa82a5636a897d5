//! Session context: the authenticated connection, the conversation it talks in, and who we are.
//!
//! Built once by the mode controller and shared as `Arc<Session>`. The
//! conversation id and the local user are written once and read-only afterwards.

use crate::event::{ChannelId, InboundEvent, Notice, UserId};
use crate::gateway::{CurrentUser, Gateway, GatewayError, SendError};
use crate::routing::Router;
use std::sync::{Arc, OnceLock};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const EVENT_BUFFER: usize = 64;

/// Fires the readiness signal. Consumed on use, so it can only fire once.
pub struct ReadyNotifier {
    tx: oneshot::Sender<()>,
}

/// Waits for the readiness signal.
pub struct Ready {
    rx: oneshot::Receiver<()>,
}

#[derive(Debug, thiserror::Error)]
#[error("session ended before it became ready")]
pub struct SessionClosed;

/// Create a single-use readiness signal.
pub fn readiness() -> (ReadyNotifier, Ready) {
    let (tx, rx) = oneshot::channel();
    (ReadyNotifier { tx }, Ready { rx })
}

impl ReadyNotifier {
    pub fn notify(self) {
        let _ = self.tx.send(());
    }
}

impl Ready {
    /// Resolves once the session is ready, or errors if the session task ended first.
    pub async fn wait(self) -> Result<(), SessionClosed> {
        self.rx.await.map_err(|_| SessionClosed)
    }
}

pub struct Session {
    gateway: Arc<dyn Gateway>,
    router: Router,
    /// Raw channel setting, parsed on first use.
    channel_setting: String,
    conversation: OnceLock<ChannelId>,
    user: OnceLock<CurrentUser>,
}

impl Session {
    pub fn new(gateway: Arc<dyn Gateway>, router: Router, channel_setting: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            gateway,
            router,
            channel_setting: channel_setting.into(),
            conversation: OnceLock::new(),
            user: OnceLock::new(),
        })
    }

    /// The conversation all sends target. Parsed from configuration on first call and cached.
    pub fn conversation(&self) -> Result<ChannelId, SendError> {
        if let Some(id) = self.conversation.get() {
            return Ok(*id);
        }
        let id = self
            .channel_setting
            .parse::<ChannelId>()
            .map_err(|_| SendError::InvalidConversation(self.channel_setting.clone()))?;
        Ok(*self.conversation.get_or_init(|| id))
    }

    /// The local user, once identity resolution succeeded.
    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.get()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user.get().map(|u| u.id)
    }

    /// Connect, authenticate, resolve identity, signal readiness, then pump events
    /// through the router until the connection ends.
    pub async fn run(self: Arc<Self>, ready: ReadyNotifier) -> Result<(), GatewayError> {
        let (tx, mut rx) = mpsc::channel::<InboundEvent>(EVENT_BUFFER);

        let connection = match self.gateway.connect(tx).await {
            Ok(c) => c,
            Err(e) => {
                self.router
                    .notice(Notice::error(format!("Unable to establish discord connection: {}", e)));
                self.router.close();
                return Err(e);
            }
        };

        match self.gateway.current_user().await {
            Ok(user) => {
                self.router
                    .notice(Notice::info(format!("Logged in as {}", user.username)));
                let _ = self.user.set(user);
            }
            Err(e) => {
                self.router
                    .notice(Notice::error(format!("Unable to get user: {}", e)));
            }
        }

        ready.notify();

        while let Some(event) = rx.recv().await {
            self.route(event);
        }

        let result = match connection.closed.await {
            Ok(result) => result,
            Err(e) => Err(GatewayError::Connection(format!("connection task failed: {}", e))),
        };
        match &result {
            Ok(()) => log::info!("session: connection closed"),
            Err(e) => self
                .router
                .notice(Notice::error(format!("Discord connection lost: {}", e))),
        }
        self.router.close();
        result
    }

    /// Run the delivery-point filter for one observed event.
    fn route(&self, event: InboundEvent) {
        let conversation = match self.conversation() {
            Ok(id) => Some(id),
            Err(e) => {
                log::debug!("session: dropping event, {}", e);
                None
            }
        };
        if !self.router.route(conversation, event) {
            log::debug!("session: filtered out unrelated message");
        }
    }

    /// Send `text` to the conversation and wait for the result.
    pub async fn send(&self, text: &str) -> Result<(), SendError> {
        let conversation = self.conversation()?;
        self.gateway.send(conversation, text).await
    }

    /// Send in the background. Failures are reported to the sink as notices; the
    /// handle is returned so the caller can keep it.
    pub fn dispatch(self: &Arc<Self>, text: String) -> JoinHandle<Result<(), SendError>> {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            let result = session.send(&text).await;
            if let Err(e) = &result {
                session
                    .router
                    .notice(Notice::error(format!("Unable to send message: {}", e)));
            }
            result
        })
    }
}
