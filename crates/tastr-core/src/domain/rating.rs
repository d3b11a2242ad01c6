//! Rating - ELO 方式のスキルレーティング
//!
//! 純粋関数のみ（I/O なし・副作用なし）。

use serde::{Deserialize, Serialize};

/// Every item starts at this rating.
pub const INITIAL_RATING: f64 = 1000.0;

/// ELO parameters.
///
/// `floor` is off by default, so a long losing streak can push a rating below zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EloRating {
    /// Maximum rating change per vote.
    pub k_factor: f64,

    /// Rating difference at which the stronger side is 10x as likely to win.
    pub scale: f64,

    /// Optional lower bound applied to the loser's new rating.
    pub floor: Option<f64>,
}

/// Ratings after one vote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingUpdate {
    pub winner: f64,
    pub loser: f64,
}

impl EloRating {
    /// K=32, s=400, no floor.
    pub fn default_v1() -> Self {
        Self {
            k_factor: 32.0,
            scale: 400.0,
            floor: None,
        }
    }

    /// Probability that a side leading by `diff` rating points wins.
    pub fn expected_win_prob(&self, diff: f64) -> f64 {
        1.0 / (1.0 + 10f64.powf(-diff / self.scale))
    }

    /// Apply one forced-choice outcome.
    ///
    /// The winner gains exactly what the loser gives up: `K * (1 - p)`, where `p` is the
    /// winner's expected win probability before the vote.
    pub fn update(&self, winner: f64, loser: f64) -> RatingUpdate {
        let p = self.expected_win_prob(winner - loser);
        let delta = self.k_factor * (1.0 - p);

        let mut loser_after = loser - delta;
        if let Some(floor) = self.floor {
            loser_after = loser_after.max(floor);
        }

        RatingUpdate {
            winner: winner + delta,
            loser: loser_after,
        }
    }
}

impl Default for EloRating {
    fn default() -> Self {
        Self::default_v1()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn equal_ratings_move_by_half_k() {
        let elo = EloRating::default_v1();
        let out = elo.update(1000.0, 1000.0);
        assert_eq!(out.winner, 1016.0);
        assert_eq!(out.loser, 984.0);
    }

    #[rstest]
    #[case(1000.0, 1000.0)]
    #[case(1400.0, 1000.0)]
    #[case(2400.0, 200.0)]
    #[case(1000.0, 1600.0)]
    #[case(-50.0, -300.0)]
    fn winner_gains_and_loser_drops_within_k(#[case] winner: f64, #[case] loser: f64) {
        let elo = EloRating::default_v1();
        let out = elo.update(winner, loser);

        assert!(out.winner > winner);
        assert!(out.loser < loser);
        assert!(out.winner - winner <= elo.k_factor);
        assert!(loser - out.loser <= elo.k_factor);
        assert!(((out.winner - winner) - (loser - out.loser)).abs() < 1e-9);
    }

    #[test]
    fn upset_moves_more_than_expected_win() {
        let elo = EloRating::default_v1();
        let expected = elo.update(1400.0, 1000.0);
        let upset = elo.update(1000.0, 1400.0);
        assert!(upset.winner - 1000.0 > expected.winner - 1400.0);
    }

    #[test]
    fn expected_win_prob_matches_scale() {
        let elo = EloRating::default_v1();
        assert!((elo.expected_win_prob(0.0) - 0.5).abs() < 1e-12);
        // +400 means 10:1 odds.
        assert!((elo.expected_win_prob(400.0) - 10.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn ratings_may_go_negative_without_floor() {
        let elo = EloRating::default_v1();
        let out = elo.update(10.0, 5.0);
        assert!(out.loser < 0.0);
    }

    #[test]
    fn floor_clamps_loser() {
        let elo = EloRating {
            floor: Some(0.0),
            ..EloRating::default_v1()
        };
        let out = elo.update(10.0, 5.0);
        assert_eq!(out.loser, 0.0);
    }

    #[test]
    fn deserializes_partial_config_with_defaults() {
        let elo: EloRating = serde_json::from_str(r#"{ "k_factor": 16.0 }"#).unwrap();
        assert_eq!(elo.k_factor, 16.0);
        assert_eq!(elo.scale, 400.0);
        assert_eq!(elo.floor, None);
    }
}
