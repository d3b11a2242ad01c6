//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 永続化（SessionStore）とリアルタイム配送（EventSink）は外部の協調者であり、
//! コアは trait 越しにしか触りません。

pub mod clock;
pub mod event_sink;
pub mod id_generator;
pub mod session_store;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::EventSink;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::session_store::SessionStore;
