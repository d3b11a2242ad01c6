//! App - アプリケーションロジック
//!
//! - **coordinator**: RoundCoordinator（ラウンド状態機械）
//! - **builder**: CoordinatorBuilder（ワイヤリングと起動時検証）
//! - **config**: TastrConfig

pub mod builder;
pub mod config;
pub mod coordinator;

pub use self::builder::{BuildError, CoordinatorBuilder};
pub use self::config::{EventConfig, TastrConfig};
pub use self::coordinator::RoundCoordinator;
