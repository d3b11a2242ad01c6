//! TastrConfig - 設定値のまとまり
//!
//! ファイルや環境変数からの読み込みは CLI 側（figment）の責務です。
//! ここでは serde で読める形とデフォルト値だけを定義します。

use serde::{Deserialize, Serialize};

use crate::domain::EloRating;
use crate::matchmaking::MatchmakingPolicy;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TastrConfig {
    pub rating: EloRating,
    pub matchmaking: MatchmakingPolicy,
    pub events: EventConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Per-session broadcast buffer. Slow subscribers beyond this lag and skip ahead.
    pub channel_capacity: usize,
}

impl EventConfig {
    pub fn default_v1() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

impl Default for EventConfig {
    fn default() -> Self {
        Self::default_v1()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchmaking::MatchmakingStrategy;

    #[test]
    fn defaults() {
        let config = TastrConfig::default();
        assert_eq!(config.rating.k_factor, 32.0);
        assert_eq!(config.rating.scale, 400.0);
        assert_eq!(config.rating.floor, None);
        assert_eq!(config.matchmaking.strategy, MatchmakingStrategy::Passes);
        assert_eq!(config.events.channel_capacity, 64);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config: TastrConfig = serde_json::from_str(
            r#"{ "rating": { "floor": 0.0 }, "matchmaking": { "strategy": "scored" } }"#,
        )
        .unwrap();

        assert_eq!(config.rating.floor, Some(0.0));
        assert_eq!(config.rating.k_factor, 32.0);
        assert_eq!(config.matchmaking.strategy, MatchmakingStrategy::Scored);
        assert_eq!(config.events, EventConfig::default_v1());
    }
}
