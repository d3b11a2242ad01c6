//! Pass-based matchmaking heuristic.
//!
//! Works in waves. Each wave starts from the full item pool and runs:
//! 1. strict: both items under-exposed for the judge (bounded shuffles)
//! 2. relaxed: at least one item under-exposed (bounded shuffles)
//! 3. exhaustive: anything goes, until items or judges run out
//!
//! Judges still unassigned when a wave ends get a fresh wave. Every wave assigns at
//! least one judge, so the loop terminates whenever there are two or more items.

use rand::RngCore;
use rand::seq::SliceRandom;
use tracing::trace;

use super::{Matchmaker, Matchups, distinct_item_ids, distinct_judges};
use crate::domain::{Item, ItemId, Matchup, TasteHistory, TastrError};

/// How picky a scan pass is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fit {
    /// Both items under-exposed.
    Good,
    /// At least one item under-exposed.
    Decent,
}

impl Fit {
    fn accepts(self, judge: &TasteHistory, a: &ItemId, b: &ItemId) -> bool {
        match self {
            Fit::Good => judge.is_under_exposed(a) && judge.is_under_exposed(b),
            Fit::Decent => judge.is_under_exposed(a) || judge.is_under_exposed(b),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PassMatchmaker {
    /// Shuffles tried in the strict pass.
    pub strict_retries: u32,

    /// Shuffles tried in the relaxed pass.
    pub relaxed_retries: u32,
}

impl PassMatchmaker {
    pub fn new(strict_retries: u32, relaxed_retries: u32) -> Self {
        Self {
            strict_retries,
            relaxed_retries,
        }
    }

    /// 10 strict shuffles, 10 relaxed shuffles.
    pub fn default_v1() -> Self {
        Self::new(10, 10)
    }

    /// Shuffle-and-scan: offer the first two pool items to each pending judge in turn.
    ///
    /// With `refill`, a pool that drops below two items is reset to the full set (items
    /// may then repeat across judges in the same wave).
    #[allow(clippy::too_many_arguments)]
    fn scan(
        &self,
        fit: Fit,
        retries: u32,
        refill: bool,
        full: &[ItemId],
        pool: &mut Vec<ItemId>,
        pending: &mut Vec<&TasteHistory>,
        matchups: &mut Matchups,
        rng: &mut dyn RngCore,
    ) {
        for _ in 0..retries {
            if pending.is_empty() {
                return;
            }
            pool.shuffle(rng);
            pending.retain(|judge| {
                if pool.len() < 2 {
                    if refill {
                        *pool = full.to_vec();
                    }
                    return true;
                }
                if !fit.accepts(judge, &pool[0], &pool[1]) {
                    return true;
                }
                let pair: Vec<ItemId> = pool.drain(..2).collect();
                let matchup = Matchup::new(pair[0].clone(), pair[1].clone());
                trace!(user = %judge.user_id, ?fit, a = %matchup.item_a, b = %matchup.item_b, "matched");
                matchups.insert(judge.user_id.clone(), matchup);
                false
            });
        }
    }

    /// Assign whatever is on top of the pool, no fairness constraint.
    fn exhaust(
        pool: &mut Vec<ItemId>,
        pending: &mut Vec<&TasteHistory>,
        matchups: &mut Matchups,
        rng: &mut dyn RngCore,
    ) {
        while pool.len() >= 2 && !pending.is_empty() {
            pool.shuffle(rng);
            pending.retain(|judge| {
                if pool.len() < 2 {
                    return true;
                }
                let pair: Vec<ItemId> = pool.drain(..2).collect();
                let matchup = Matchup::new(pair[0].clone(), pair[1].clone());
                trace!(user = %judge.user_id, a = %matchup.item_a, b = %matchup.item_b, "matched (exhaustive)");
                matchups.insert(judge.user_id.clone(), matchup);
                false
            });
        }
    }
}

impl Default for PassMatchmaker {
    fn default() -> Self {
        Self::default_v1()
    }
}

impl Matchmaker for PassMatchmaker {
    fn generate(
        &self,
        items: &[Item],
        judges: &[TasteHistory],
        rng: &mut dyn RngCore,
    ) -> Result<Matchups, TastrError> {
        let full = distinct_item_ids(items)?;
        let mut pending = distinct_judges(judges);
        let mut matchups = Matchups::new();

        while !pending.is_empty() {
            let mut pool = full.clone();
            self.scan(
                Fit::Good,
                self.strict_retries,
                true,
                &full,
                &mut pool,
                &mut pending,
                &mut matchups,
                rng,
            );
            self.scan(
                Fit::Decent,
                self.relaxed_retries,
                false,
                &full,
                &mut pool,
                &mut pending,
                &mut matchups,
                rng,
            );
            Self::exhaust(&mut pool, &mut pending, &mut matchups, rng);
        }

        Ok(matchups)
    }
}
