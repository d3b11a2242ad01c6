//! Vote log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CategoryId, ItemId, SessionId, UserId, VoteId};

/// Upsert key: one vote per taster per round.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoteKey {
    pub category_id: CategoryId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub round: u32,
}

/// An immutable record of one forced choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub vote_id: VoteId,
    pub category_id: CategoryId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub round: u32,
    pub winner_id: ItemId,
    pub loser_id: ItemId,
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    pub fn key(&self) -> VoteKey {
        VoteKey {
            category_id: self.category_id.clone(),
            session_id: self.session_id,
            user_id: self.user_id.clone(),
            round: self.round,
        }
    }
}

/// Result of `SubmitVote`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Recorded; the round is still waiting on `remaining` tasters.
    Recorded { remaining: usize },

    /// Recorded, and it was the last vote: the session moved to `new_round`.
    RoundAdvanced { new_round: u32 },

    /// A vote for this round was already on file. Nothing changed.
    AlreadyVoted,
}
