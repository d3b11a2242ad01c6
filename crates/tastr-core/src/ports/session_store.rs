//! SessionStore port - セッション・投票・マッチアップの正本（source of truth）
//!
//! SessionStore は以下を管理します：
//! - Category（アイテムとレーティング）
//! - Session（ラウンド、テイスター、待機集合）
//! - Vote ログ（(category, session, user, round) で upsert）
//! - Selection（(session, round, taster) ごとに 1 つ）
//!
//! # 実装
//! - InMemorySessionStore（impls/inmem_store.rs）

use async_trait::async_trait;

use crate::domain::{
    Category, CategoryId, Item, Selection, Session, SessionId, TastrError, UserId, Vote, VoteKey,
};

/// SessionStore は永続化の抽象
///
/// # 設計原則
/// - `save_session` は楽観的排他制御（version 一致が必須）
/// - 1 カテゴリにつき active な Session は高々 1 つ
/// - Selection は一度作ったら上書きしない
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert or replace a category (ratings included).
    async fn save_category(&self, category: Category) -> Result<(), TastrError>;

    async fn find_category(&self, category_id: &CategoryId)
    -> Result<Option<Category>, TastrError>;

    /// Current items and ratings of a category.
    async fn get_item_ratings(&self, category_id: &CategoryId) -> Result<Vec<Item>, TastrError>;

    /// Overwrite ratings for the given items. Unknown item ids are ignored.
    async fn save_item_ratings(
        &self,
        category_id: &CategoryId,
        items: &[Item],
    ) -> Result<(), TastrError>;

    /// Return the active session for `candidate.category_id`, or store `candidate` as it.
    async fn find_or_create_session(&self, candidate: Session) -> Result<Session, TastrError>;

    async fn find_active_session(
        &self,
        category_id: &CategoryId,
    ) -> Result<Option<Session>, TastrError>;

    /// # Errors
    /// `NotFound` for an unknown id.
    async fn get_session(&self, session_id: SessionId) -> Result<Session, TastrError>;

    /// Compare-and-swap on `version`. Returns the stored copy with the bumped version.
    ///
    /// # Errors
    /// `VersionConflict` when someone else saved first.
    async fn save_session(&self, session: Session) -> Result<Session, TastrError>;

    /// Insert or replace by `VoteKey`. Returns the replaced vote, if any.
    async fn upsert_vote(&self, vote: Vote) -> Result<Option<Vote>, TastrError>;

    async fn find_vote(&self, key: &VoteKey) -> Result<Option<Vote>, TastrError>;

    /// Every vote a user cast in a category, across sessions.
    async fn votes_by_user(
        &self,
        category_id: &CategoryId,
        user_id: &UserId,
    ) -> Result<Vec<Vote>, TastrError>;

    async fn find_selection(
        &self,
        session_id: SessionId,
        round: u32,
        taster_id: &UserId,
    ) -> Result<Option<Selection>, TastrError>;

    /// Insert unless a selection for the same key exists; either way return the stored one.
    async fn insert_selection(&self, selection: Selection) -> Result<Selection, TastrError>;
}
