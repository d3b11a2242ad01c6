//! CoordinatorBuilder - RoundCoordinator の構築とワイヤリング
//!
//! - 起動時検証（Fail-fast 設計）
//! - 省略可能な依存はデフォルト実装で埋める

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::config::TastrConfig;
use super::coordinator::RoundCoordinator;
use crate::impls::NoopEventSink;
use crate::ports::{Clock, EventSink, IdGenerator, SessionStore, SystemClock, UlidGenerator};

/// CoordinatorBuilder は RoundCoordinator を構築
///
/// # 使用例
/// ```ignore
/// let hub = Arc::new(BroadcastHub::new(config.events.channel_capacity));
/// let coordinator = CoordinatorBuilder::new()
///     .store(Arc::new(InMemorySessionStore::new()))
///     .events(hub.clone())
///     .config(config)
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - store は必須（未設定なら BuildError::MissingStore）
/// - 設定値は build() 時に検証（K や scale が正でなければ BuildError::InvalidConfig）
/// - events / clock / ids は省略時 NoopEventSink / SystemClock / UlidGenerator
pub struct CoordinatorBuilder {
    store: Option<Arc<dyn SessionStore>>,
    events: Option<Arc<dyn EventSink>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    config: TastrConfig,
    rng_seed: Option<u64>,
}

/// BuildError はコーディネータ構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("No session store configured. Call .store(..) before .build().")]
    MissingStore,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CoordinatorBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            events: None,
            clock: None,
            ids: None,
            config: TastrConfig::default(),
            rng_seed: None,
        }
    }

    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn config(mut self, config: TastrConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed the shuffles (aliases and matchmaking) for reproducible runs.
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<RoundCoordinator, BuildError> {
        let store = self.store.ok_or(BuildError::MissingStore)?;
        validate(&self.config)?;

        let rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(RoundCoordinator::new(
            store,
            self.events.unwrap_or_else(|| Arc::new(NoopEventSink)),
            self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            self.ids
                .unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock))),
            &self.config,
            rng,
        ))
    }
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(config: &TastrConfig) -> Result<(), BuildError> {
    let rating = &config.rating;
    if !(rating.k_factor.is_finite() && rating.k_factor > 0.0) {
        return Err(BuildError::InvalidConfig(format!(
            "rating.k_factor must be positive, got {}",
            rating.k_factor
        )));
    }
    if !(rating.scale.is_finite() && rating.scale > 0.0) {
        return Err(BuildError::InvalidConfig(format!(
            "rating.scale must be positive, got {}",
            rating.scale
        )));
    }
    if config.events.channel_capacity == 0 {
        return Err(BuildError::InvalidConfig(
            "events.channel_capacity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemorySessionStore;

    #[test]
    fn test_build_success() {
        let coordinator = CoordinatorBuilder::new()
            .store(Arc::new(InMemorySessionStore::new()))
            .build();
        assert!(coordinator.is_ok());
    }

    #[test]
    fn test_build_missing_store() {
        let coordinator = CoordinatorBuilder::new().build();
        assert!(matches!(coordinator, Err(BuildError::MissingStore)));
    }

    #[test]
    fn test_build_rejects_non_positive_k() {
        let mut config = TastrConfig::default();
        config.rating.k_factor = 0.0;

        let coordinator = CoordinatorBuilder::new()
            .store(Arc::new(InMemorySessionStore::new()))
            .config(config)
            .build();
        assert!(matches!(
            coordinator,
            Err(BuildError::InvalidConfig(msg)) if msg.contains("k_factor")
        ));
    }

    #[test]
    fn test_build_rejects_zero_capacity() {
        let mut config = TastrConfig::default();
        config.events.channel_capacity = 0;

        let coordinator = CoordinatorBuilder::new()
            .store(Arc::new(InMemorySessionStore::new()))
            .config(config)
            .build();
        assert!(matches!(coordinator, Err(BuildError::InvalidConfig(_))));
    }
}
