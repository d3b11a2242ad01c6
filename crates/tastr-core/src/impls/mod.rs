//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemorySessionStore**: プロセス内の正本
//! - **BroadcastHub**: セッションごとの broadcast チャネル
//! - **NoopEventSink**: イベントを捨てる

pub mod broadcast;
pub mod inmem_store;

// 主要な型を再エクスポート
pub use self::broadcast::{BroadcastHub, NoopEventSink};
pub use self::inmem_store::InMemorySessionStore;
