//! Matchmaking - 各テイスターへのペア割り当て
//!
//! # 実装
//! - **PassMatchmaker**: 3 段階のパス（strict → relaxed → exhaustive）。デフォルト
//! - **ScoredMatchmaker**: 加点方式（未試食ボーナス + レーティングの近さ + 上位ボーナス）
//!
//! どちらも「アイテムが 2 つ以上あれば全員に必ずペアを返す」ことを保証します。
//! 2 つを混ぜることはせず、`MatchmakingPolicy` でどちらか一方を選びます。

mod passes;
mod policy;
mod scored;

pub use passes::PassMatchmaker;
pub use policy::{MatchmakingPolicy, MatchmakingStrategy};
pub use scored::ScoredMatchmaker;

use std::collections::{BTreeMap, BTreeSet};

use rand::RngCore;

use crate::domain::{Item, ItemId, Matchup, TasteHistory, TastrError, UserId};

/// One matchup per judge.
pub type Matchups = BTreeMap<UserId, Matchup>;

/// Pairs items for a batch of judges.
///
/// Implementations are pure (CPU only): all history and ratings are passed in.
/// The rng is injected so tests can seed it.
pub trait Matchmaker: Send + Sync {
    /// Give every judge exactly one pair of two distinct items.
    ///
    /// # Errors
    /// `InvalidItemSet` when fewer than two distinct items are available.
    fn generate(
        &self,
        items: &[Item],
        judges: &[TasteHistory],
        rng: &mut dyn RngCore,
    ) -> Result<Matchups, TastrError>;
}

/// Distinct item ids in input order, or `InvalidItemSet`.
fn distinct_item_ids(items: &[Item]) -> Result<Vec<ItemId>, TastrError> {
    let mut seen = BTreeSet::new();
    let ids: Vec<ItemId> = items
        .iter()
        .filter(|item| seen.insert(item.id.clone()))
        .map(|item| item.id.clone())
        .collect();

    if ids.len() < 2 {
        return Err(TastrError::InvalidItemSet(ids.len()));
    }
    Ok(ids)
}

/// Judges with duplicate user ids collapsed (first one wins).
fn distinct_judges(judges: &[TasteHistory]) -> Vec<&TasteHistory> {
    let mut seen = BTreeSet::new();
    judges
        .iter()
        .filter(|judge| seen.insert(judge.user_id.clone()))
        .collect()
}
