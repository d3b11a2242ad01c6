//! BroadcastHub - セッションごとの pub/sub
//!
//! プロセス全体で 1 本の接続を共有するのではなく、SessionId ごとに
//! `tokio::sync::broadcast` チャネルを持ちます。別セッションへの誤配送は起きません。

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::{SessionEvent, SessionId};
use crate::ports::EventSink;

/// BroadcastHub は SessionEvent をセッション単位で配る
///
/// # 使用例
/// ```ignore
/// let hub = Arc::new(BroadcastHub::new(64));
/// let mut rx = hub.subscribe(session_id);
/// hub.publish(SessionEvent::round_ready(session_id, 1));
/// let event = rx.recv().await?;
/// ```
///
/// 購読は publish の前でも後でもよい（チャネルは最初に触れた時点で作られる）。
/// 受信側が遅れて `capacity` を超えた分は `RecvError::Lagged` になります。
pub struct BroadcastHub {
    capacity: usize,
    channels: Mutex<HashMap<SessionId, broadcast::Sender<SessionEvent>>>,
}

impl BroadcastHub {
    /// `capacity` は 0 だと panic するので 1 に切り上げる
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self, session_id: SessionId) -> broadcast::Receiver<SessionEvent> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(session_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Drop the channel for a finished session. Existing receivers see `Closed`.
    pub fn remove(&self, session_id: SessionId) {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels.remove(&session_id);
    }

    pub fn subscriber_count(&self, session_id: SessionId) -> usize {
        let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .get(&session_id)
            .map_or(0, |sender| sender.receiver_count())
    }
}

impl EventSink for BroadcastHub {
    fn publish(&self, event: SessionEvent) {
        let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = channels.get(&event.session_id) else {
            trace!(session = %event.session_id, event = event.name(), "no subscribers");
            return;
        };
        // Err only means nobody is listening right now.
        let delivered = sender.send(event.clone()).unwrap_or(0);
        trace!(session = %event.session_id, event = event.name(), round = event.round, delivered, "published");
    }
}

/// NoopEventSink は何もしない
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn publish(&self, _event: SessionEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;
    use ulid::Ulid;

    fn session_id() -> SessionId {
        SessionId::from_ulid(Ulid::new())
    }

    #[tokio::test]
    async fn subscribers_receive_their_session_only() {
        let hub = BroadcastHub::new(8);
        let a = session_id();
        let b = session_id();
        let mut rx_a = hub.subscribe(a);
        let mut rx_b = hub.subscribe(b);

        hub.publish(SessionEvent::round_ready(a, 1));

        assert_eq!(rx_a.recv().await.unwrap(), SessionEvent::round_ready(a, 1));
        assert!(matches!(rx_b.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn every_subscriber_gets_a_copy() {
        let hub = BroadcastHub::new(8);
        let id = session_id();
        let mut rx1 = hub.subscribe(id);
        let mut rx2 = hub.subscribe(id);
        assert_eq!(hub.subscriber_count(id), 2);

        hub.publish(SessionEvent::started(id, 1));

        assert_eq!(rx1.recv().await.unwrap().name(), "start");
        assert_eq!(rx2.recv().await.unwrap().name(), "start");
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let hub = BroadcastHub::new(8);
        let id = session_id();
        hub.publish(SessionEvent::round_ready(id, 1));

        // Channel exists but its only receiver is gone.
        drop(hub.subscribe(id));
        hub.publish(SessionEvent::round_ready(id, 2));
        assert_eq!(hub.subscriber_count(id), 0);
    }

    #[tokio::test]
    async fn removed_session_closes_receivers() {
        let hub = BroadcastHub::new(8);
        let id = session_id();
        let mut rx = hub.subscribe(id);

        hub.remove(id);
        assert!(rx.recv().await.is_err());
    }
}
