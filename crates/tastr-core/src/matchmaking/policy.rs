//! Matchmaking policy: which strategy, and how hard it tries.

use serde::{Deserialize, Serialize};

use super::{Matchmaker, PassMatchmaker, ScoredMatchmaker};
use crate::domain::EloRating;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchmakingStrategy {
    /// Strict / relaxed / exhaustive passes over shuffled pools.
    #[default]
    Passes,

    /// Best pair per judge by additive score.
    Scored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingPolicy {
    pub strategy: MatchmakingStrategy,

    /// Shuffles in the strict pass (`Passes` only).
    pub strict_retries: u32,

    /// Shuffles in the relaxed pass (`Passes` only).
    pub relaxed_retries: u32,
}

impl MatchmakingPolicy {
    pub fn default_v1() -> Self {
        Self {
            strategy: MatchmakingStrategy::Passes,
            strict_retries: 10,
            relaxed_retries: 10,
        }
    }

    /// Instantiate the configured strategy. `Scored` shares the rating curve.
    pub fn build(&self, elo: &EloRating) -> Box<dyn Matchmaker> {
        match self.strategy {
            MatchmakingStrategy::Passes => Box::new(PassMatchmaker::new(
                self.strict_retries,
                self.relaxed_retries,
            )),
            MatchmakingStrategy::Scored => Box::new(ScoredMatchmaker::new(elo.clone())),
        }
    }
}

impl Default for MatchmakingPolicy {
    fn default() -> Self {
        Self::default_v1()
    }
}
