//! Selection (matchup) records.

use serde::{Deserialize, Serialize};

use super::ids::{CategoryId, ItemId, SessionId, UserId};

/// The pair offered to one taster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Matchup {
    pub item_a: ItemId,
    pub item_b: ItemId,
}

impl Matchup {
    pub fn new(item_a: ItemId, item_b: ItemId) -> Self {
        Self { item_a, item_b }
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        &self.item_a == item || &self.item_b == item
    }
}

/// A matchup pinned to `(session, round, taster)`.
///
/// Generated once; every later fetch for the same key returns the same pair.
/// A new session starts again at round 0 and gets its own selections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub category_id: CategoryId,
    pub session_id: SessionId,
    pub round: u32,
    pub taster_id: UserId,
    pub matchup: Matchup,
}
