//! Domain model (IDs, categories, sessions, votes, ratings, ...).
//!
//! I/O を持たない純粋なモデルです。
//! - ids: SessionId / VoteId（ULID）と文字列 ID
//! - category / session / vote / selection: 永続化されるレコード
//! - history: Vote ログからの射影（保存しない）
//! - rating: ELO 更新
//! - events / errors

pub mod category;
pub mod errors;
pub mod events;
pub mod history;
pub mod ids;
pub mod rating;
pub mod selection;
pub mod session;
pub mod vote;

pub use category::{Category, Item};
pub use errors::{RecordKind, TastrError};
pub use events::{SessionEvent, SessionEventKind};
pub use history::TasteHistory;
pub use ids::{CategoryId, ItemId, SessionId, UserId, VoteId};
pub use rating::{EloRating, INITIAL_RATING, RatingUpdate};
pub use selection::{Matchup, Selection};
pub use session::{BarrierState, Session};
pub use vote::{Vote, VoteKey, VoteOutcome};
