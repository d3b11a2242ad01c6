//! InMemorySessionStore - 開発用・テスト用の正本
//!
//! # 実装詳細
//! - すべての状態を 1 つの `InMemoryStoreState` に持ち、tokio の Mutex で排他制御
//! - `save_session` は version による compare-and-swap
//! - Selection は (session, round, taster) ごとに最初の 1 つだけを保持

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{
    Category, CategoryId, Item, RecordKind, Selection, Session, SessionId, TastrError, UserId,
    Vote, VoteKey,
};
use crate::ports::SessionStore;

type SelectionKey = (SessionId, u32, UserId);

/// In-memory store state.
#[derive(Default)]
struct InMemoryStoreState {
    categories: HashMap<CategoryId, Category>,

    sessions: HashMap<SessionId, Session>,

    /// The one active session per category.
    active: HashMap<CategoryId, SessionId>,

    /// Vote log, one entry per (category, session, user, round).
    votes: BTreeMap<VoteKey, Vote>,

    selections: HashMap<SelectionKey, Selection>,
}

/// InMemorySessionStore はプロセス内で完結する SessionStore
///
/// Clone すると同じ状態を共有します。
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    state: Arc<Mutex<InMemoryStoreState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save_category(&self, category: Category) -> Result<(), TastrError> {
        let mut state = self.state.lock().await;
        state
            .categories
            .insert(category.category_id.clone(), category);
        Ok(())
    }

    async fn find_category(
        &self,
        category_id: &CategoryId,
    ) -> Result<Option<Category>, TastrError> {
        let state = self.state.lock().await;
        Ok(state.categories.get(category_id).cloned())
    }

    async fn get_item_ratings(&self, category_id: &CategoryId) -> Result<Vec<Item>, TastrError> {
        let state = self.state.lock().await;
        state
            .categories
            .get(category_id)
            .map(|category| category.items.clone())
            .ok_or_else(|| TastrError::not_found(RecordKind::Category, category_id))
    }

    async fn save_item_ratings(
        &self,
        category_id: &CategoryId,
        items: &[Item],
    ) -> Result<(), TastrError> {
        let mut state = self.state.lock().await;
        let category = state
            .categories
            .get_mut(category_id)
            .ok_or_else(|| TastrError::not_found(RecordKind::Category, category_id))?;

        for item in items {
            if let Some(stored) = category.item_mut(&item.id) {
                stored.rating = item.rating;
            }
        }
        Ok(())
    }

    async fn find_or_create_session(&self, candidate: Session) -> Result<Session, TastrError> {
        let mut state = self.state.lock().await;

        if let Some(id) = state.active.get(&candidate.category_id)
            && let Some(existing) = state.sessions.get(id)
            && existing.active
        {
            return Ok(existing.clone());
        }

        debug!(session = %candidate.session_id, category = %candidate.category_id, "session stored");
        state
            .active
            .insert(candidate.category_id.clone(), candidate.session_id);
        state
            .sessions
            .insert(candidate.session_id, candidate.clone());
        Ok(candidate)
    }

    async fn find_active_session(
        &self,
        category_id: &CategoryId,
    ) -> Result<Option<Session>, TastrError> {
        let state = self.state.lock().await;
        Ok(state
            .active
            .get(category_id)
            .and_then(|id| state.sessions.get(id))
            .filter(|session| session.active)
            .cloned())
    }

    async fn get_session(&self, session_id: SessionId) -> Result<Session, TastrError> {
        let state = self.state.lock().await;
        state
            .sessions
            .get(&session_id)
            .cloned()
            .ok_or_else(|| TastrError::not_found(RecordKind::Session, session_id))
    }

    async fn save_session(&self, mut session: Session) -> Result<Session, TastrError> {
        let mut state = self.state.lock().await;
        let stored = state
            .sessions
            .get(&session.session_id)
            .ok_or_else(|| TastrError::not_found(RecordKind::Session, session.session_id))?;

        if stored.version != session.version {
            return Err(TastrError::VersionConflict {
                session: session.session_id,
                expected: session.version,
                found: stored.version,
            });
        }

        session.version += 1;
        if !session.active && state.active.get(&session.category_id) == Some(&session.session_id)
        {
            state.active.remove(&session.category_id);
        }
        state.sessions.insert(session.session_id, session.clone());
        Ok(session)
    }

    async fn upsert_vote(&self, vote: Vote) -> Result<Option<Vote>, TastrError> {
        let mut state = self.state.lock().await;
        Ok(state.votes.insert(vote.key(), vote))
    }

    async fn find_vote(&self, key: &VoteKey) -> Result<Option<Vote>, TastrError> {
        let state = self.state.lock().await;
        Ok(state.votes.get(key).cloned())
    }

    async fn votes_by_user(
        &self,
        category_id: &CategoryId,
        user_id: &UserId,
    ) -> Result<Vec<Vote>, TastrError> {
        let state = self.state.lock().await;
        Ok(state
            .votes
            .values()
            .filter(|vote| &vote.category_id == category_id && &vote.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_selection(
        &self,
        session_id: SessionId,
        round: u32,
        taster_id: &UserId,
    ) -> Result<Option<Selection>, TastrError> {
        let state = self.state.lock().await;
        let key = (session_id, round, taster_id.clone());
        Ok(state.selections.get(&key).cloned())
    }

    async fn insert_selection(&self, selection: Selection) -> Result<Selection, TastrError> {
        let mut state = self.state.lock().await;
        let key = (
            selection.session_id,
            selection.round,
            selection.taster_id.clone(),
        );
        Ok(state.selections.entry(key).or_insert(selection).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemId, Matchup, VoteId};
    use chrono::Utc;
    use ulid::Ulid;

    fn category() -> Category {
        Category {
            category_id: CategoryId::new("Treats"),
            items: vec![
                Item::new(ItemId::new("1"), "Cake", "A"),
                Item::new(ItemId::new("2"), "IceCream", "B"),
            ],
        }
    }

    fn session() -> Session {
        Session::new(
            SessionId::from_ulid(Ulid::new()),
            CategoryId::new("Treats"),
            UserId::new("host"),
            Utc::now(),
        )
    }

    fn vote(session_id: SessionId, user: &str, round: u32, winner: &str, loser: &str) -> Vote {
        Vote {
            vote_id: VoteId::from_ulid(Ulid::new()),
            category_id: CategoryId::new("Treats"),
            session_id,
            user_id: UserId::new(user),
            round,
            winner_id: ItemId::new(winner),
            loser_id: ItemId::new(loser),
            cast_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn find_or_create_returns_the_active_session() {
        let store = InMemorySessionStore::new();
        let first = store.find_or_create_session(session()).await.unwrap();
        let second = store.find_or_create_session(session()).await.unwrap();

        assert_eq!(first.session_id, second.session_id);
    }

    #[tokio::test]
    async fn closed_session_is_replaced() {
        let store = InMemorySessionStore::new();
        let mut first = store.find_or_create_session(session()).await.unwrap();
        first.close(Utc::now());
        store.save_session(first.clone()).await.unwrap();

        assert!(
            store
                .find_active_session(&CategoryId::new("Treats"))
                .await
                .unwrap()
                .is_none()
        );
        let second = store.find_or_create_session(session()).await.unwrap();
        assert_ne!(first.session_id, second.session_id);
    }

    #[tokio::test]
    async fn save_session_rejects_stale_version() {
        let store = InMemorySessionStore::new();
        let created = store.find_or_create_session(session()).await.unwrap();

        let saved = store.save_session(created.clone()).await.unwrap();
        assert_eq!(saved.version, 1);

        let err = store.save_session(created).await.unwrap_err();
        assert!(matches!(
            err,
            TastrError::VersionConflict {
                expected: 0,
                found: 1,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn get_unknown_session_is_not_found() {
        let store = InMemorySessionStore::new();
        let err = store
            .get_session(SessionId::from_ulid(Ulid::new()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TastrError::NotFound {
                kind: RecordKind::Session,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn upsert_vote_replaces_by_key() {
        let store = InMemorySessionStore::new();
        let session_id = SessionId::from_ulid(Ulid::new());

        assert!(
            store
                .upsert_vote(vote(session_id, "u1", 0, "1", "2"))
                .await
                .unwrap()
                .is_none()
        );
        let replaced = store
            .upsert_vote(vote(session_id, "u1", 0, "2", "1"))
            .await
            .unwrap();
        assert_eq!(replaced.map(|v| v.winner_id), Some(ItemId::new("1")));

        store
            .upsert_vote(vote(session_id, "u1", 1, "1", "2"))
            .await
            .unwrap();
        let votes = store
            .votes_by_user(&CategoryId::new("Treats"), &UserId::new("u1"))
            .await
            .unwrap();
        assert_eq!(votes.len(), 2);
    }

    #[tokio::test]
    async fn first_selection_wins_within_a_session() {
        let store = InMemorySessionStore::new();
        let session_id = SessionId::from_ulid(Ulid::new());
        let selection = |session_id: SessionId, a: &str, b: &str| Selection {
            category_id: CategoryId::new("Treats"),
            session_id,
            round: 0,
            taster_id: UserId::new("u1"),
            matchup: Matchup::new(ItemId::new(a), ItemId::new(b)),
        };

        let first = store
            .insert_selection(selection(session_id, "1", "2"))
            .await
            .unwrap();
        let second = store
            .insert_selection(selection(session_id, "2", "3"))
            .await
            .unwrap();
        assert_eq!(first, second);

        let found = store
            .find_selection(session_id, 0, &UserId::new("u1"))
            .await
            .unwrap();
        assert_eq!(found, Some(first));

        // Same category, round and taster in another session: kept apart.
        let other_session = SessionId::from_ulid(Ulid::new());
        let other = store
            .insert_selection(selection(other_session, "2", "3"))
            .await
            .unwrap();
        assert_eq!(other.matchup, Matchup::new(ItemId::new("2"), ItemId::new("3")));
        assert_eq!(
            store
                .find_selection(other_session, 0, &UserId::new("u1"))
                .await
                .unwrap(),
            Some(other)
        );
    }

    #[tokio::test]
    async fn ratings_round_trip_through_category() {
        let store = InMemorySessionStore::new();
        store.save_category(category()).await.unwrap();

        let mut items = store
            .get_item_ratings(&CategoryId::new("Treats"))
            .await
            .unwrap();
        items[0].rating = 1016.0;
        items.push(Item::new(ItemId::new("ghost"), "Ghost", "Z"));
        store
            .save_item_ratings(&CategoryId::new("Treats"), &items)
            .await
            .unwrap();

        let category = store
            .find_category(&CategoryId::new("Treats"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(category.items.len(), 2);
        assert_eq!(category.item(&ItemId::new("1")).unwrap().rating, 1016.0);
    }
}
