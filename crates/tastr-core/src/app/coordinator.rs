//! RoundCoordinator - セッションのラウンド状態機械
//!
//! # 状態
//! - round r 進行中: `waiting_ids` が空でない
//! - 進行: 最後の投票で `waiting_ids` が空になった瞬間
//!
//! # 排他制御
//! - セッションごとに 1 本の tokio Mutex（クロスセッションのロックはなし）
//! - 「待機集合から外す → 空なら次ラウンドへ」は同じロックの中で完結
//! - 保存は SessionStore の version CAS も通るので二重進行は起きない
//! - CAS が負けたら（別プロセスの書き込み）セッションを読み直して待機集合の更新をやり直す
//!
//! # イベント
//! - ロビー（round 0）からの開始（StartSession・ForceAdvance）: `Started`（"start"）
//! - それ以外の進行（自然な解放・ForceAdvance）: `RoundReady`（"round ready"）

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::rngs::StdRng;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use super::config::TastrConfig;
use crate::domain::{
    BarrierState, Category, CategoryId, EloRating, Item, ItemId, RecordKind, Selection, Session,
    SessionEvent, SessionEventKind, SessionId, TasteHistory, TastrError, UserId, Vote, VoteKey,
    VoteOutcome,
};
use crate::matchmaking::{Matchmaker, Matchups};
use crate::ports::{Clock, EventSink, IdGenerator, SessionStore};

/// Attempts at a session write before a `VersionConflict` is handed to the caller.
const MAX_SESSION_WRITES: u32 = 5;

/// RoundCoordinator は投票・マッチアップ・ラウンド進行をまとめる
///
/// CoordinatorBuilder から構築します。`Arc` で包めば複数タスクから共有できます。
pub struct RoundCoordinator {
    store: Arc<dyn SessionStore>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    elo: EloRating,
    matchmaker: Box<dyn Matchmaker>,
    rng: Mutex<StdRng>,
    session_locks: Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>,
}

impl RoundCoordinator {
    pub(crate) fn new(
        store: Arc<dyn SessionStore>,
        events: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        config: &TastrConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            events,
            clock,
            ids,
            elo: config.rating.clone(),
            matchmaker: config.matchmaking.build(&config.rating),
            rng: Mutex::new(rng),
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    // ========================================
    // Category
    // ========================================

    /// Create (or replace) a category with fresh ratings and shuffled blind aliases.
    ///
    /// # Errors
    /// `InvalidItemSet` for fewer than two names.
    pub async fn create_category(
        &self,
        category_id: CategoryId,
        names: BTreeMap<ItemId, String>,
    ) -> Result<Category, TastrError> {
        let category = {
            let mut rng = self.rng();
            Category::from_names(category_id, &names, &mut *rng)?
        };
        self.store.save_category(category.clone()).await?;

        info!(category = %category.category_id, items = category.items.len(), "category created");
        Ok(category)
    }

    pub async fn aliases(
        &self,
        category_id: &CategoryId,
    ) -> Result<BTreeMap<ItemId, String>, TastrError> {
        Ok(self.load_category(category_id).await?.aliases())
    }

    pub async fn names(
        &self,
        category_id: &CategoryId,
    ) -> Result<BTreeMap<ItemId, String>, TastrError> {
        Ok(self.load_category(category_id).await?.names())
    }

    /// Items sorted by rating, best first.
    pub async fn leaderboard(&self, category_id: &CategoryId) -> Result<Vec<Item>, TastrError> {
        Ok(self.load_category(category_id).await?.leaderboard())
    }

    /// How often `user_id` has been served each item of the category.
    pub async fn tasted(
        &self,
        category_id: &CategoryId,
        user_id: &UserId,
    ) -> Result<TasteHistory, TastrError> {
        let category = self.load_category(category_id).await?;
        self.compute_history(&category, user_id).await
    }

    // ========================================
    // Session lifecycle
    // ========================================

    /// The category's active session, created with `host_id` as host if there is none.
    pub async fn find_or_create_session(
        &self,
        category_id: &CategoryId,
        host_id: &UserId,
    ) -> Result<Session, TastrError> {
        self.load_category(category_id).await?;

        let candidate = Session::new(
            self.ids.generate_session_id(),
            category_id.clone(),
            host_id.clone(),
            self.clock.now(),
        );
        let candidate_id = candidate.session_id;
        let session = self.store.find_or_create_session(candidate).await?;

        if session.session_id == candidate_id {
            info!(session = %session.session_id, category = %category_id, host = %host_id, "session created");
        }
        Ok(session)
    }

    pub async fn is_session_running(&self, category_id: &CategoryId) -> Result<bool, TastrError> {
        Ok(self.store.find_active_session(category_id).await?.is_some())
    }

    pub async fn get_session(&self, session_id: SessionId) -> Result<Session, TastrError> {
        self.store.get_session(session_id).await
    }

    /// Add a taster. In the lobby the joiner is also added to the waiting set.
    pub async fn join_session(
        &self,
        session_id: SessionId,
        user_id: &UserId,
    ) -> Result<Session, TastrError> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;

        let mut session = self.active_session(session_id).await?;
        if !session.add_taster(user_id.clone(), self.clock.now()) {
            return Err(TastrError::AlreadyJoined {
                session: session_id,
                user: user_id.clone(),
            });
        }

        let session = self.store.save_session(session).await?;
        info!(session = %session_id, user = %user_id, round = session.round, tasters = session.taster_ids.len(), "taster joined");
        Ok(session)
    }

    /// Host kickoff: round 0 -> 1, announced as `Started`.
    ///
    /// A session that already left the lobby is returned unchanged.
    pub async fn start_session(
        &self,
        session_id: SessionId,
        host_id: &UserId,
    ) -> Result<Session, TastrError> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;

        let session = self.active_session(session_id).await?;
        ensure_host(&session, host_id)?;
        if !session.is_lobby() {
            debug!(session = %session_id, round = session.round, "already started");
            return Ok(session);
        }

        self.advance_locked(session, SessionEventKind::Started).await
    }

    /// Host override for a round stalled by tasters who never vote.
    ///
    /// From the lobby this is the same as `start_session` and is announced as `Started`.
    pub async fn force_advance(
        &self,
        session_id: SessionId,
        host_id: &UserId,
    ) -> Result<Session, TastrError> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;

        let session = self.active_session(session_id).await?;
        ensure_host(&session, host_id)?;
        warn!(session = %session_id, round = session.round, waiting = session.waiting_ids.len(), "forcing round advance");

        let kind = if session.is_lobby() {
            SessionEventKind::Started
        } else {
            SessionEventKind::RoundReady
        };
        self.advance_locked(session, kind).await
    }

    /// Deactivate the session; the next lookup for the category starts a new one.
    pub async fn close_session(
        &self,
        session_id: SessionId,
        host_id: &UserId,
    ) -> Result<Session, TastrError> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;

        let mut session = self.store.get_session(session_id).await?;
        ensure_host(&session, host_id)?;
        if !session.active {
            self.forget_session_lock(session_id);
            return Ok(session);
        }

        session.close(self.clock.now());
        let session = self.store.save_session(session).await?;
        self.forget_session_lock(session_id);
        info!(session = %session_id, round = session.round, "session closed");
        Ok(session)
    }

    // ========================================
    // Rounds
    // ========================================

    /// The pair `user_id` should taste in the current round.
    ///
    /// Generated on first request and pinned: repeated calls in the same round return
    /// the same pair.
    pub async fn request_matchup(
        &self,
        session_id: SessionId,
        user_id: &UserId,
    ) -> Result<Selection, TastrError> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;

        let session = self.active_session(session_id).await?;
        if let Some(selection) = self
            .store
            .find_selection(session_id, session.round, user_id)
            .await?
        {
            return Ok(selection);
        }

        let category = self.load_category(&session.category_id).await?;
        let history = self.compute_history(&category, user_id).await?;
        let mut matchups = self.generate(&category, &[history])?;
        let matchup = matchups
            .remove(user_id)
            .ok_or_else(|| TastrError::not_found(RecordKind::Selection, user_id))?;

        debug!(session = %session_id, user = %user_id, round = session.round, a = %matchup.item_a, b = %matchup.item_b, "matchup generated");
        self.store
            .insert_selection(Selection {
                category_id: session.category_id.clone(),
                session_id,
                round: session.round,
                taster_id: user_id.clone(),
                matchup,
            })
            .await
    }

    /// Record one forced choice and, if it was the last one outstanding, advance the round.
    ///
    /// # Errors
    /// - `StaleRound` when `round` is not the session's current round (nothing changes)
    /// - `InvalidVote` when winner and loser are the same item
    /// - `NotFound` for an unknown session or item
    /// - `SessionClosed` for an inactive session
    pub async fn submit_vote(
        &self,
        session_id: SessionId,
        user_id: &UserId,
        round: u32,
        winner_id: &ItemId,
        loser_id: &ItemId,
    ) -> Result<VoteOutcome, TastrError> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;

        let session = self.active_session(session_id).await?;
        if round != session.round {
            warn!(session = %session_id, user = %user_id, submitted = round, current = session.round, "stale vote rejected");
            return Err(TastrError::StaleRound {
                submitted: round,
                current: session.round,
            });
        }
        if winner_id == loser_id {
            return Err(TastrError::InvalidVote(format!(
                "{winner_id} cannot beat itself"
            )));
        }

        let items = self.store.get_item_ratings(&session.category_id).await?;
        let (Some(winner), Some(loser)) = (rated(&items, winner_id), rated(&items, loser_id))
        else {
            let missing = if rated(&items, winner_id).is_some() {
                loser_id
            } else {
                winner_id
            };
            return Err(TastrError::not_found(RecordKind::Item, missing));
        };

        let key = VoteKey {
            category_id: session.category_id.clone(),
            session_id,
            user_id: user_id.clone(),
            round,
        };
        if self.store.find_vote(&key).await?.is_some() {
            if !session.waiting_ids.contains(user_id) {
                debug!(session = %session_id, user = %user_id, round, "duplicate vote ignored");
                return Ok(VoteOutcome::AlreadyVoted);
            }
            // The vote was stored but the waiting set never caught up.
            warn!(session = %session_id, user = %user_id, round, "recorded vote still waiting, releasing");
            return self.release_voter(session, user_id).await;
        }
        if !session.is_taster(user_id) {
            warn!(session = %session_id, user = %user_id, round, "vote from a user who never joined");
        }

        let now = self.clock.now();
        self.store
            .upsert_vote(Vote {
                vote_id: self.ids.generate_vote_id(),
                category_id: key.category_id,
                session_id,
                user_id: user_id.clone(),
                round,
                winner_id: winner_id.clone(),
                loser_id: loser_id.clone(),
                cast_at: now,
            })
            .await?;

        let update = self.elo.update(winner.rating, loser.rating);
        let updated = [
            Item {
                rating: update.winner,
                ..winner.clone()
            },
            Item {
                rating: update.loser,
                ..loser.clone()
            },
        ];
        self.store
            .save_item_ratings(&session.category_id, &updated)
            .await?;
        debug!(
            session = %session_id,
            user = %user_id,
            round,
            winner = %winner_id,
            loser = %loser_id,
            winner_rating = update.winner,
            loser_rating = update.loser,
            "vote recorded"
        );

        self.release_voter(session, user_id).await
    }

    // ========================================
    // internals
    // ========================================

    /// Take `user_id` out of the waiting set, advancing the round if it empties.
    ///
    /// The caller holds the session lock. A `VersionConflict` means another writer got
    /// to the session first: reload it and apply the vote to the fresh copy. If that
    /// writer already moved the round on, there is nothing left to release.
    async fn release_voter(
        &self,
        mut session: Session,
        user_id: &UserId,
    ) -> Result<VoteOutcome, TastrError> {
        let session_id = session.session_id;
        let round = session.round;
        let mut attempt = 1;

        loop {
            let written = match session.mark_voted(user_id, self.clock.now()) {
                BarrierState::Released => self
                    .advance_locked(session, SessionEventKind::RoundReady)
                    .await
                    .map(|advanced| VoteOutcome::RoundAdvanced {
                        new_round: advanced.round,
                    }),
                BarrierState::Waiting { remaining } => self
                    .store
                    .save_session(session)
                    .await
                    .map(|_| VoteOutcome::Recorded { remaining }),
                BarrierState::Unchanged => {
                    return Ok(VoteOutcome::Recorded {
                        remaining: session.waiting_ids.len(),
                    });
                }
            };

            match written {
                Err(TastrError::VersionConflict { expected, found, .. })
                    if attempt < MAX_SESSION_WRITES =>
                {
                    debug!(session = %session_id, user = %user_id, attempt, expected, found, "session changed underneath, retrying");
                    attempt += 1;
                    session = self.active_session(session_id).await?;
                    if session.round != round {
                        return Ok(VoteOutcome::Recorded { remaining: 0 });
                    }
                }
                other => return other,
            }
        }
    }

    /// Round transition. The caller must hold the session lock.
    ///
    /// Saves the session first (version CAS), then pins a selection for every taster in
    /// the new round, then publishes.
    async fn advance_locked(
        &self,
        mut session: Session,
        kind: SessionEventKind,
    ) -> Result<Session, TastrError> {
        let new_round = session.advance_round(self.clock.now());
        let session = self.store.save_session(session).await?;

        let category = self.load_category(&session.category_id).await?;
        let mut judges = Vec::with_capacity(session.taster_ids.len());
        for taster in &session.taster_ids {
            judges.push(self.compute_history(&category, taster).await?);
        }
        let matchups = if judges.is_empty() {
            Matchups::new()
        } else {
            self.generate(&category, &judges)?
        };

        for (taster_id, matchup) in matchups {
            self.store
                .insert_selection(Selection {
                    category_id: session.category_id.clone(),
                    session_id: session.session_id,
                    round: new_round,
                    taster_id,
                    matchup,
                })
                .await?;
        }

        let event = match kind {
            SessionEventKind::Started => SessionEvent::started(session.session_id, new_round),
            SessionEventKind::RoundReady => SessionEvent::round_ready(session.session_id, new_round),
        };
        info!(session = %session.session_id, round = new_round, tasters = session.taster_ids.len(), event = event.name(), "round advanced");
        self.events.publish(event);

        Ok(session)
    }

    async fn load_category(&self, category_id: &CategoryId) -> Result<Category, TastrError> {
        self.store
            .find_category(category_id)
            .await?
            .ok_or_else(|| TastrError::not_found(RecordKind::Category, category_id))
    }

    async fn active_session(&self, session_id: SessionId) -> Result<Session, TastrError> {
        let session = self.store.get_session(session_id).await?;
        if !session.active {
            return Err(TastrError::SessionClosed(session_id));
        }
        Ok(session)
    }

    async fn compute_history(
        &self,
        category: &Category,
        user_id: &UserId,
    ) -> Result<TasteHistory, TastrError> {
        let votes = self
            .store
            .votes_by_user(&category.category_id, user_id)
            .await?;
        let item_ids = category.item_ids();
        Ok(TasteHistory::from_votes(user_id.clone(), &item_ids, &votes))
    }

    fn generate(
        &self,
        category: &Category,
        judges: &[TasteHistory],
    ) -> Result<Matchups, TastrError> {
        let mut rng = self.rng();
        self.matchmaker
            .generate(&category.items, judges, &mut *rng)
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn session_lock(&self, session_id: SessionId) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .session_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(session_id).or_default().clone()
    }

    fn forget_session_lock(&self, session_id: SessionId) {
        let mut locks = self
            .session_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.remove(&session_id);
    }
}

fn rated<'a>(items: &'a [Item], id: &ItemId) -> Option<&'a Item> {
    items.iter().find(|item| &item.id == id)
}

fn ensure_host(session: &Session, user_id: &UserId) -> Result<(), TastrError> {
    if session.is_host(user_id) {
        Ok(())
    } else {
        Err(TastrError::NotHost {
            session: session.session_id,
            user: user_id.clone(),
        })
    }
}
