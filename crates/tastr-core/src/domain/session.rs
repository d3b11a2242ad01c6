//! Session record: round counter + waiting set.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CategoryId, SessionId, UserId};

/// What happened when a taster left the waiting set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierState {
    /// Someone is still voting in this round.
    Waiting { remaining: usize },

    /// The last taster just voted; the round must advance.
    Released,

    /// The user was not waiting (already voted, or never a taster).
    Unchanged,
}

/// A tasting session over one category.
///
/// Design:
/// - `waiting_ids` is always a subset of `taster_ids`.
/// - `round` starts at 0 (the lobby) and only increases.
/// - `version` is bumped by the store on every save (optimistic concurrency).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub category_id: CategoryId,
    pub host_id: UserId,
    pub active: bool,
    pub round: u32,
    pub taster_ids: BTreeSet<UserId>,
    pub waiting_ids: BTreeSet<UserId>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        session_id: SessionId,
        category_id: CategoryId,
        host_id: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            category_id,
            host_id,
            active: true,
            round: 0,
            taster_ids: BTreeSet::new(),
            waiting_ids: BTreeSet::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_host(&self, user: &UserId) -> bool {
        &self.host_id == user
    }

    pub fn is_taster(&self, user: &UserId) -> bool {
        self.taster_ids.contains(user)
    }

    pub fn is_lobby(&self) -> bool {
        self.round == 0
    }

    /// Add a taster. Returns false if they were already present.
    ///
    /// In the lobby the joiner must also vote before round 0 can release; later joiners
    /// enter the waiting set at the next transition. A round that started with nobody
    /// to wait for takes the joiner straight away, otherwise it could never release.
    pub fn add_taster(&mut self, user: UserId, now: DateTime<Utc>) -> bool {
        if !self.taster_ids.insert(user.clone()) {
            return false;
        }
        if self.is_lobby() || self.waiting_ids.is_empty() {
            self.waiting_ids.insert(user);
        }
        self.updated_at = now;
        true
    }

    /// Remove a voter from the waiting set.
    pub fn mark_voted(&mut self, user: &UserId, now: DateTime<Utc>) -> BarrierState {
        if !self.waiting_ids.remove(user) {
            return BarrierState::Unchanged;
        }
        self.updated_at = now;
        if self.waiting_ids.is_empty() {
            BarrierState::Released
        } else {
            BarrierState::Waiting {
                remaining: self.waiting_ids.len(),
            }
        }
    }

    /// Move to the next round and re-arm the barrier with every taster.
    pub fn advance_round(&mut self, now: DateTime<Utc>) -> u32 {
        self.round += 1;
        self.waiting_ids = self.taster_ids.clone();
        self.updated_at = now;
        self.round
    }

    pub fn close(&mut self, now: DateTime<Utc>) {
        self.active = false;
        self.updated_at = now;
    }
}
