//! Delivery point: filters inbound events and forwards them to the one sink wired at startup.
//!
//! Only messages written by the designated agent in the resolved conversation get
//! through. Sinks never see anything else.

use crate::event::{ChannelId, InboundEvent, Notice, NoticeLevel, UserId};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

/// Consumer of filtered events and user-visible notices.
pub trait EventSink: Send + Sync {
    fn deliver(&self, event: InboundEvent);
    fn notice(&self, notice: Notice);
    /// The session has ended; nothing more will be delivered.
    fn close(&self) {}
}

/// Front-ends with an inbox (the interactive loop) take events and notices as their own message type.
impl<T> EventSink for mpsc::UnboundedSender<T>
where
    T: From<InboundEvent> + From<Notice> + Send,
{
    fn deliver(&self, event: InboundEvent) {
        if self.send(T::from(event)).is_err() {
            log::debug!("routing: inbox closed, dropping event");
        }
    }

    fn notice(&self, notice: Notice) {
        let _ = self.send(T::from(notice));
    }
}

/// Single-slot reply channel: the first delivered event fills it, later ones are dropped.
pub struct ReplySlot {
    tx: Mutex<Option<oneshot::Sender<InboundEvent>>>,
}

/// Receiving side of a `ReplySlot`.
pub type ReplyReceiver = oneshot::Receiver<InboundEvent>;

pub fn reply_slot() -> (ReplySlot, ReplyReceiver) {
    let (tx, rx) = oneshot::channel();
    (
        ReplySlot {
            tx: Mutex::new(Some(tx)),
        },
        rx,
    )
}

impl ReplySlot {
    fn take(&self) -> Option<oneshot::Sender<InboundEvent>> {
        self.tx.lock().ok().and_then(|mut g| g.take())
    }
}

impl EventSink for ReplySlot {
    fn deliver(&self, event: InboundEvent) {
        match self.take() {
            Some(tx) => {
                let _ = tx.send(event);
            }
            None => log::debug!("routing: reply slot already filled, dropping event"),
        }
    }

    fn notice(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => log::info!("{}", notice.message),
            NoticeLevel::Warning => log::warn!("{}", notice.message),
            NoticeLevel::Error => log::error!("{}", notice.message),
        }
    }

    /// Drops the sender so a waiting receiver errors instead of hanging.
    fn close(&self) {
        drop(self.take());
    }
}

/// Filter + sink. Built once by the mode controller.
#[derive(Clone)]
pub struct Router {
    agent_id: UserId,
    sink: Arc<dyn EventSink>,
}

impl Router {
    pub fn new(agent_id: UserId, sink: Arc<dyn EventSink>) -> Self {
        Self { agent_id, sink }
    }

    /// True when `event` is a reply from the agent in `conversation`.
    pub fn accepts(&self, conversation: Option<ChannelId>, event: &InboundEvent) -> bool {
        event.author_id == self.agent_id && Some(event.conversation_id) == conversation
    }

    /// Forward `event` to the sink if it passes the filter. Returns whether it was delivered.
    pub fn route(&self, conversation: Option<ChannelId>, event: InboundEvent) -> bool {
        if !self.accepts(conversation, &event) {
            return false;
        }
        self.sink.deliver(event);
        true
    }

    pub fn notice(&self, notice: Notice) {
        self.sink.notice(notice);
    }

    pub fn close(&self) {
        self.sink.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT: UserId = UserId(1081004946872352958);
    const CONV: ChannelId = ChannelId(42);

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

    fn event(author: u64, conv: u64, text: &str) -> InboundEvent {
        InboundEvent {
            author_id: UserId(author),
            conversation_id: ChannelId(conv),
            text: text.to_string(),
        }
    }

    #[test]
    fn filter_drops_other_authors_and_conversations() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Inbox>();
        let router = Router::new(AGENT, Arc::new(tx));

        assert!(!router.route(Some(CONV), event(7, CONV.0, "someone else")));
        assert!(!router.route(Some(CONV), event(AGENT.0, 43, "other channel")));
        assert!(!router.route(None, event(AGENT.0, CONV.0, "no conversation yet")));
        assert!(rx.try_recv().is_err());

        assert!(router.route(Some(CONV), event(AGENT.0, CONV.0, "4")));
        match rx.try_recv() {
            Ok(Inbox::Reply(e)) => assert_eq!(e.text, "4"),
            other => panic!("expected reply, got {:?}", other),
        }
    }

    #[test]
    fn notices_reach_inbox() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Inbox>();
        let router = Router::new(AGENT, Arc::new(tx));
        router.notice(Notice::error("boom"));
        match rx.try_recv() {
            Ok(Inbox::Notice(n)) => {
                assert_eq!(n.level, NoticeLevel::Error);
                assert_eq!(n.message, "boom");
            }
            other => panic!("expected notice, got {:?}", other),
        }
    }

    #[test]
    fn reply_slot_keeps_first_event_only() {
        let (slot, mut rx) = reply_slot();
        slot.deliver(event(AGENT.0, CONV.0, "first"));
        slot.deliver(event(AGENT.0, CONV.0, "second"));
        assert_eq!(rx.try_recv().unwrap().text, "first");
    }

    #[test]
    fn closed_reply_slot_wakes_receiver() {
        let (slot, mut rx) = reply_slot();
        let router = Router::new(AGENT, Arc::new(slot));
        router.close();
        assert!(matches!(rx.try_recv(), Err(oneshot::error::TryRecvError::Closed)));
    }
}
