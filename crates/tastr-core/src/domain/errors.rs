//! Errors - エラー型と分類
//!
//! コーディネーターは `StaleRound` / `NotFound` を加工せずに外側へ返します。
//! 重複投票（AlreadyVoted）はエラーではなく `VoteOutcome::AlreadyVoted` として扱います。

use thiserror::Error;

use super::ids::{SessionId, UserId};

/// What kind of record a `NotFound` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Category,
    Session,
    Selection,
    Item,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecordKind::Category => "category",
            RecordKind::Session => "session",
            RecordKind::Selection => "selection",
            RecordKind::Item => "item",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum TastrError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    /// The client voted for a round that already advanced; it must re-fetch and retry.
    #[error("stale round: vote was for round {submitted}, session is in round {current}")]
    StaleRound { submitted: u32, current: u32 },

    #[error("matchmaking needs at least 2 items, got {0}")]
    InvalidItemSet(usize),

    #[error("invalid vote: {0}")]
    InvalidVote(String),

    #[error("user {user} is not the host of {session}")]
    NotHost { session: SessionId, user: UserId },

    #[error("user {user} already joined {session}")]
    AlreadyJoined { session: SessionId, user: UserId },

    #[error("{0} is closed")]
    SessionClosed(SessionId),

    #[error("version conflict on {session}: expected {expected}, found {found}")]
    VersionConflict {
        session: SessionId,
        expected: u64,
        found: u64,
    },

    #[error("storage: {0}")]
    Storage(String),
}

impl TastrError {
    pub fn not_found(kind: RecordKind, id: impl ToString) -> Self {
        TastrError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Should the client refresh its view of the session and resubmit?
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TastrError::StaleRound { .. } | TastrError::VersionConflict { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_record() {
        let err = TastrError::not_found(RecordKind::Category, "Treats");
        assert_eq!(err.to_string(), "category not found: Treats");
    }

    #[test]
    fn stale_round_is_retryable() {
        let err = TastrError::StaleRound {
            submitted: 0,
            current: 1,
        };
        assert!(err.is_retryable());
        assert!(!TastrError::InvalidItemSet(1).is_retryable());
    }
}
