//! EventSink port - セッションイベントの配送
//!
//! # 実装
//! - BroadcastHub: セッションごとの tokio broadcast チャネル
//! - NoopEventSink: 何もしない（テスト・CLI の静かなモード用）

use crate::domain::SessionEvent;

/// Fire-and-forget publisher.
///
/// Delivery is at-least-once from the subscriber's point of view; a publish with no
/// listeners is not an error.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: SessionEvent);
}
