//! TasteHistory - 投票ログからの射影
//!
//! 保存せず、必要なたびに Vote ログから再計算します。
//! ラウンドをまたいでキャッシュすると公平性の判断が古くなるためです。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ids::{ItemId, UserId};
use super::vote::Vote;

/// How many times one taster has been served each item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TasteHistory {
    pub user_id: UserId,
    pub tasted: BTreeMap<ItemId, u32>,
}

impl TasteHistory {
    /// Every known item starts at 0; each vote counts for both the winner and the loser.
    ///
    /// Only ids in `items` are counted. Votes for items no longer in the category
    /// (an older item set) are skipped.
    pub fn from_votes<'a>(
        user_id: UserId,
        items: impl IntoIterator<Item = &'a ItemId>,
        votes: impl IntoIterator<Item = &'a Vote>,
    ) -> Self {
        let mut tasted: BTreeMap<ItemId, u32> =
            items.into_iter().map(|id| (id.clone(), 0)).collect();

        for vote in votes {
            for id in [&vote.winner_id, &vote.loser_id] {
                if let Some(count) = tasted.get_mut(id) {
                    *count += 1;
                }
            }
        }

        Self { user_id, tasted }
    }

    pub fn count(&self, item: &ItemId) -> Option<u32> {
        self.tasted.get(item).copied()
    }

    /// Mean exposure across this taster's map, or `None` for an empty map.
    pub fn mean(&self) -> Option<f64> {
        if self.tasted.is_empty() {
            return None;
        }
        let total: u64 = self.tasted.values().map(|&c| u64::from(c)).sum();
        Some(total as f64 / self.tasted.len() as f64)
    }

    /// Tasted no more than this taster's mean. Unknown items always qualify.
    pub fn is_under_exposed(&self, item: &ItemId) -> bool {
        match (self.count(item), self.mean()) {
            (None, _) => true,
            (Some(count), Some(mean)) => f64::from(count) <= mean,
            (Some(_), None) => true,
        }
    }
}
