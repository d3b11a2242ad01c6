//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（Clock から timestamp 部分を取る）

use ulid::Ulid;

use crate::domain::{SessionId, VoteId};
use crate::ports::Clock;

/// IdGenerator は分散環境でも衝突しない ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数タスクから共有する）
pub trait IdGenerator: Send + Sync {
    fn generate_session_id(&self) -> SessionId;

    fn generate_vote_id(&self) -> VoteId;
}

/// ULID ベースの ID 生成器
///
/// FixedClock を渡すと timestamp 部分が固定される（ランダム部分は毎回異なる）。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_session_id(&self) -> SessionId {
        SessionId::from(self.next_ulid())
    }

    fn generate_vote_id(&self) -> VoteId {
        VoteId::from(self.next_ulid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn ulid_generator_generates_unique_ids() {
        let id_gen = UlidGenerator::new(SystemClock);

        let id1 = id_gen.generate_session_id();
        let id2 = id_gen.generate_session_id();
        assert_ne!(id1, id2);
        assert!(id_gen.generate_vote_id().to_string().starts_with("vote-"));
    }

    #[test]
    fn fixed_clock_pins_the_timestamp() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id_gen = UlidGenerator::new(FixedClock::new(fixed_time));

        let id1 = id_gen.generate_session_id();
        let id2 = id_gen.generate_session_id();
        assert_ne!(id1, id2);

        assert_eq!(id1.as_ulid().timestamp_ms(), fixed_time.timestamp_millis() as u64);
        assert_eq!(id2.as_ulid().timestamp_ms(), fixed_time.timestamp_millis() as u64);
    }
}
