//! Events - セッションで発生したイベント
//!
//! 配送は at-least-once。クライアントは重複受信しても
//! 現在ラウンドの matchup を再取得するだけで済みます（冪等）。

use serde::{Deserialize, Serialize};

use super::ids::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    /// The host kicked the session off (round 0 -> 1).
    Started,

    /// Every taster voted and a new round's matchups are ready.
    RoundReady,
}

/// Broadcast payload: `{session_id, round}` plus the kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub session_id: SessionId,
    pub round: u32,
    pub kind: SessionEventKind,
}

impl SessionEvent {
    pub fn started(session_id: SessionId, round: u32) -> Self {
        Self {
            session_id,
            round,
            kind: SessionEventKind::Started,
        }
    }

    pub fn round_ready(session_id: SessionId, round: u32) -> Self {
        Self {
            session_id,
            round,
            kind: SessionEventKind::RoundReady,
        }
    }

    /// Event name clients subscribe to.
    pub fn name(&self) -> &'static str {
        match self.kind {
            SessionEventKind::Started => "start",
            SessionEventKind::RoundReady => "round ready",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn wire_names() {
        let id = SessionId::from_ulid(Ulid::new());
        assert_eq!(SessionEvent::started(id, 1).name(), "start");
        assert_eq!(SessionEvent::round_ready(id, 1).name(), "round ready");
    }

    #[test]
    fn payload_carries_session_and_round() {
        let id = SessionId::from_ulid(Ulid::new());
        let value = serde_json::to_value(SessionEvent::round_ready(id, 3)).unwrap();
        assert_eq!(value["round"], 3);
        assert_eq!(value["kind"], "round_ready");
        assert!(value.get("session_id").is_some());
    }
}
