//! Integration test: drive a session over an in-memory gateway that answers every
//! send with a burst of messages, only one of which is from the agent in the conversation.

use async_trait::async_trait;
use lib::event::{ChannelId, InboundEvent, Notice, NoticeLevel, UserId};
use lib::gateway::{Connection, CurrentUser, Gateway, GatewayError, SendError};
use lib::oneshot::{compose_prompt, run_query, QueryError};
use lib::routing::{reply_slot, Router};
use lib::session::{readiness, Session};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

const AGENT: UserId = UserId(1081004946872352958);
const ME: UserId = UserId(555);
const CONVERSATION: u64 = 42;

struct MockGateway {
    events: Mutex<Option<mpsc::Sender<InboundEvent>>>,
    calls: Mutex<Vec<String>>,
    reply: String,
    fail_send: bool,
    hang_up: bool,
}

impl MockGateway {
    fn new(reply: &str) -> Arc<Self> {
        Self::build(reply, false, false)
    }

    fn failing() -> Arc<Self> {
        Self::build("", true, false)
    }

    /// Authenticates, then the socket closes straight away.
    fn hanging_up() -> Arc<Self> {
        Self::build("", false, true)
    }

    fn build(reply: &str, fail_send: bool, hang_up: bool) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            reply: reply.to_string(),
            fail_send,
            hang_up,
        })
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().expect("calls lock").push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

fn event(author: UserId, conversation: u64, text: &str) -> InboundEvent {
    InboundEvent {
        author_id: author,
        conversation_id: ChannelId(conversation),
        text: text.to_string(),
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn connect(&self, events: mpsc::Sender<InboundEvent>) -> Result<Connection, GatewayError> {
        self.record("connect");
        if self.hang_up {
            drop(events);
            let closed = tokio::spawn(async { Err(GatewayError::Connection("socket closed".to_string())) });
            return Ok(Connection { closed });
        }
        *self.events.lock().expect("events lock") = Some(events);
        let closed = tokio::spawn(std::future::pending::<Result<(), GatewayError>>());
        Ok(Connection { closed })
    }

    async fn current_user(&self) -> Result<CurrentUser, GatewayError> {
        self.record("current_user");
        Ok(CurrentUser {
            id: ME,
            username: "tester".to_string(),
        })
    }

    async fn send(&self, conversation: ChannelId, text: &str) -> Result<(), SendError> {
        self.record(format!("send:{}:{}", conversation, text));
        if self.fail_send {
            return Err(SendError::Api("403 Forbidden".to_string()));
        }
        let tx = self.events.lock().expect("events lock").clone();
        if let Some(tx) = tx {
            let burst = [
                event(ME, CONVERSATION, text),
                event(UserId(7), CONVERSATION, "someone else"),
                event(AGENT, 43, "wrong channel"),
                event(AGENT, CONVERSATION, &self.reply),
            ];
            for e in burst {
                let _ = tx.send(e).await;
            }
        }
        Ok(())
    }
}

#[tokio::test]
async fn one_shot_query_gets_the_agent_reply() {
    let gateway = MockGateway::new("4");
    let (slot, reply) = reply_slot();
    let session = Session::new(gateway.clone(), Router::new(AGENT, Arc::new(slot)), "42");
    let (notifier, ready) = readiness();
    tokio::spawn(Arc::clone(&session).run(notifier));

    let formatted = run_query(
        &session,
        ready,
        reply,
        compose_prompt("What is 2+2?", None),
        Some("notty".to_string()),
    )
    .await
    .expect("query");

    assert_eq!(formatted.plain, "4");
    assert_eq!(formatted.styled, "4\n");
    assert_eq!(
        gateway.calls(),
        vec!["connect", "current_user", "send:42:What is 2+2?"],
        "readiness must complete before the send"
    );
}

#[tokio::test]
async fn reply_mentions_of_self_are_replaced() {
    let gateway = MockGateway::new("<@555> the answer is <@!555>");
    let (slot, reply) = reply_slot();
    let session = Session::new(gateway, Router::new(AGENT, Arc::new(slot)), "42");
    let (notifier, ready) = readiness();
    tokio::spawn(Arc::clone(&session).run(notifier));

    let formatted = run_query(&session, ready, reply, "hi".to_string(), None)
        .await
        .expect("query");
    assert_eq!(formatted.plain, "`@You` the answer is `@You`");
}

#[tokio::test]
async fn failed_send_ends_the_query() {
    let gateway = MockGateway::failing();
    let (slot, reply) = reply_slot();
    let session = Session::new(gateway, Router::new(AGENT, Arc::new(slot)), "42");
    let (notifier, ready) = readiness();
    tokio::spawn(Arc::clone(&session).run(notifier));

    let err = run_query(&session, ready, reply, "hi".to_string(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Send(SendError::Api(_))));
}

#[tokio::test]
async fn lost_connection_ends_the_query() {
    let gateway = MockGateway::hanging_up();
    let (slot, reply) = reply_slot();
    let session = Session::new(gateway, Router::new(AGENT, Arc::new(slot)), "42");
    let (notifier, ready) = readiness();
    tokio::spawn(Arc::clone(&session).run(notifier));

    let err = run_query(&session, ready, reply, "hi".to_string(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::NoReply));
}

#[derive(Debug)]
enum Inbox {
    Reply(InboundEvent),
    Notice(Notice),
}

impl From<InboundEvent> for Inbox {
    fn from(e: InboundEvent) -> Self {
        Inbox::Reply(e)
    }
}

impl From<Notice> for Inbox {
    fn from(n: Notice) -> Self {
        Inbox::Notice(n)
    }
}

#[tokio::test]
async fn inbox_sees_login_notice_then_only_agent_replies() {
    let gateway = MockGateway::new("pong");
    let (tx, mut rx) = mpsc::unbounded_channel::<Inbox>();
    let session = Session::new(gateway, Router::new(AGENT, Arc::new(tx)), "42");
    let (notifier, ready) = readiness();
    tokio::spawn(Arc::clone(&session).run(notifier));
    ready.wait().await.expect("ready");

    match rx.recv().await {
        Some(Inbox::Notice(n)) => {
            assert_eq!(n.level, NoticeLevel::Info);
            assert_eq!(n.message, "Logged in as tester");
        }
        other => panic!("expected login notice, got {:?}", other),
    }

    let sent = session.dispatch("ping".to_string()).await.expect("join");
    assert!(sent.is_ok());

    match rx.recv().await {
        Some(Inbox::Reply(e)) => {
            assert_eq!(e.author_id, AGENT);
            assert_eq!(e.text, "pong");
        }
        other => panic!("expected agent reply, got {:?}", other),
    }
    assert!(rx.try_recv().is_err(), "nothing else gets through the filter");
}

#[tokio::test]
async fn unparseable_channel_reports_send_failure() {
    let gateway = MockGateway::new("pong");
    let (tx, mut rx) = mpsc::unbounded_channel::<Inbox>();
    let session = Session::new(gateway.clone(), Router::new(AGENT, Arc::new(tx)), "general");
    let (notifier, ready) = readiness();
    tokio::spawn(Arc::clone(&session).run(notifier));
    ready.wait().await.expect("ready");
    let _login = rx.recv().await;

    let sent = session.dispatch("ping".to_string()).await.expect("join");
    assert!(matches!(sent, Err(SendError::InvalidConversation(_))));
    match rx.recv().await {
        Some(Inbox::Notice(n)) => {
            assert_eq!(n.level, NoticeLevel::Error);
            assert!(n.message.starts_with("Unable to send message:"));
        }
        other => panic!("expected send failure notice, got {:?}", other),
    }
    assert!(!gateway.calls().iter().any(|c| c.starts_with("send:")));
}
