//! Scored matchmaking: pick each judge's best pair by an additive score.
//!
//! score(a, b) = under_taste(a) + under_taste(b) + closeness(a, b) + w * high(a, b)
//!
//! - under_taste(x) = max(0, target - tasted(x))
//! - closeness = 1 - 2 * |0.5 - P(a beats b)|, 1.0 for an even match
//! - high = P(pair average beats the pool average), so top performers meet each other

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use super::{Matchmaker, Matchups, distinct_item_ids, distinct_judges};
use crate::domain::{EloRating, Item, ItemId, Matchup, TasteHistory, TastrError};

#[derive(Debug, Clone)]
pub struct ScoredMatchmaker {
    /// Win probabilities come from the same curve the ratings use.
    pub elo: EloRating,

    /// Items tasted fewer times than this earn a bonus.
    pub under_taste_target: u32,

    /// Weight of the high-rating term.
    pub high_rating_weight: f64,
}

impl ScoredMatchmaker {
    pub fn new(elo: EloRating) -> Self {
        Self {
            elo,
            under_taste_target: 3,
            high_rating_weight: 0.5,
        }
    }

    pub fn under_taste_bonus(&self, judge: &TasteHistory, item: &ItemId) -> f64 {
        let tasted = judge.count(item).unwrap_or(0);
        f64::from(self.under_taste_target.saturating_sub(tasted))
    }

    pub fn closeness(&self, rating_a: f64, rating_b: f64) -> f64 {
        let p = self.elo.expected_win_prob(rating_a - rating_b);
        1.0 - 2.0 * (0.5 - p).abs()
    }

    pub fn high_rating(&self, rating_a: f64, rating_b: f64, mean_rating: f64) -> f64 {
        self.elo
            .expected_win_prob((rating_a + rating_b) / 2.0 - mean_rating)
    }

    fn score(&self, judge: &TasteHistory, a: &Item, b: &Item, mean_rating: f64) -> f64 {
        self.under_taste_bonus(judge, &a.id)
            + self.under_taste_bonus(judge, &b.id)
            + self.closeness(a.rating, b.rating)
            + self.high_rating_weight * self.high_rating(a.rating, b.rating, mean_rating)
    }
}

impl Matchmaker for ScoredMatchmaker {
    fn generate(
        &self,
        items: &[Item],
        judges: &[TasteHistory],
        rng: &mut dyn RngCore,
    ) -> Result<Matchups, TastrError> {
        let ids = distinct_item_ids(items)?;
        let pool: Vec<&Item> = ids
            .iter()
            .filter_map(|id| items.iter().find(|item| &item.id == id))
            .collect();
        let mean_rating = pool.iter().map(|item| item.rating).sum::<f64>() / pool.len() as f64;

        let mut candidates: Vec<(usize, usize)> = Vec::new();
        for i in 0..pool.len() {
            for j in (i + 1)..pool.len() {
                candidates.push((i, j));
            }
        }

        let mut matchups = Matchups::new();
        for judge in distinct_judges(judges) {
            // Shuffled so ties go to a random pair.
            candidates.shuffle(rng);
            let best = candidates
                .iter()
                .map(|&(i, j)| ((i, j), self.score(judge, pool[i], pool[j], mean_rating)))
                .max_by(|x, y| x.1.total_cmp(&y.1))
                .map(|(pair, _)| pair);

            // distinct_item_ids guarantees at least one candidate.
            let Some((i, j)) = best else {
                return Err(TastrError::InvalidItemSet(pool.len()));
            };
            let (a, b) = if rng.gen_bool(0.5) { (i, j) } else { (j, i) };
            matchups.insert(
                judge.user_id.clone(),
                Matchup::new(pool[a].id.clone(), pool[b].id.clone()),
            );
        }

        Ok(matchups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::matchmaking::test_support::{assert_complete, fresh_judges, items};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeMap;

    fn judge() -> TasteHistory {
        TasteHistory {
            user_id: UserId::new("test-user"),
            tasted: BTreeMap::from([
                (ItemId::new("food-a"), 0),
                (ItemId::new("food-b"), 0),
                (ItemId::new("food-c"), 10),
                (ItemId::new("food-d"), 10),
            ]),
        }
    }

    #[test]
    fn under_taste_bonus_caps_at_zero() {
        let m = ScoredMatchmaker::new(EloRating::default_v1());
        assert_eq!(m.under_taste_bonus(&judge(), &ItemId::new("food-a")), 3.0);
        assert_eq!(m.under_taste_bonus(&judge(), &ItemId::new("food-c")), 0.0);
    }

    #[test]
    fn closeness_peaks_for_even_matches() {
        let m = ScoredMatchmaker::new(EloRating::default_v1());
        let fair = m.closeness(1000.0, 1000.0);
        let also_fair = m.closeness(1500.0, 1500.0);
        let somewhat = m.closeness(1000.0, 1500.0);
        let lopsided = m.closeness(1500.0, 500.0);

        assert_eq!(fair, 1.0);
        assert_eq!(also_fair, 1.0);
        assert!(lopsided < 0.05);
        assert!(somewhat > lopsided && somewhat < fair);
    }

    #[test]
    fn high_rating_favors_strong_pairs() {
        let m = ScoredMatchmaker::new(EloRating::default_v1());
        assert!(m.high_rating(1500.0, 1500.0, 1100.0) > m.high_rating(1000.0, 500.0, 1100.0));
    }

    #[test]
    fn every_judge_gets_a_pair() {
        let items = items(5);
        let judges = fresh_judges(12, &items);
        let mut rng = StdRng::seed_from_u64(11);

        let matchups = ScoredMatchmaker::new(EloRating::default_v1())
            .generate(&items, &judges, &mut rng)
            .unwrap();
        assert_complete(&items, &judges, &matchups);
    }

    #[test]
    fn picks_the_untasted_pair() {
        let items: Vec<Item> = ["food-a", "food-b", "food-c", "food-d"]
            .iter()
            .map(|id| Item::new(ItemId::new(*id), *id, *id))
            .collect();
        let judge = judge();

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let matchups = ScoredMatchmaker::new(EloRating::default_v1())
                .generate(&items, std::slice::from_ref(&judge), &mut rng)
                .unwrap();
            let m = &matchups[&judge.user_id];
            assert!(m.contains(&ItemId::new("food-a")));
            assert!(m.contains(&ItemId::new("food-b")));
        }
    }

    #[test]
    fn single_item_fails() {
        let items = items(1);
        let mut rng = StdRng::seed_from_u64(1);
        let err = ScoredMatchmaker::new(EloRating::default_v1())
            .generate(&items, &fresh_judges(1, &items), &mut rng)
            .unwrap_err();
        assert!(matches!(err, TastrError::InvalidItemSet(1)));
    }
}
