//! tastr-core
//!
//! Blind pairwise taste tests: tasters are served two aliased items per round, pick one,
//! and every vote moves the items' ELO ratings. A round closes when every taster voted.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, category, session, vote, selection, history, rating, events, errors）
//! - **matchmaking**: ペア割り当て（PassMatchmaker, ScoredMatchmaker）
//! - **ports**: 抽象化レイヤー（SessionStore, EventSink, Clock, IdGenerator）
//! - **impls**: 実装（InMemorySessionStore, BroadcastHub）
//! - **app**: RoundCoordinator と CoordinatorBuilder

pub mod app;
pub mod domain;
pub mod impls;
pub mod matchmaking;
pub mod ports;

pub use app::{BuildError, CoordinatorBuilder, RoundCoordinator, TastrConfig};
pub use domain::TastrError;
