//! Domain identifiers (strongly-typed IDs).
//!
//! # 2 種類の ID
//! - **システム生成**: `SessionId`, `VoteId` は ULID ベースの `Id<T>`
//! - **ユーザー指定**: `CategoryId`, `UserId`, `ItemId` は文字列の newtype
//!
//! ## Phantom Type パターン
//! `Id<T>` の `T` は実行時には使わないマーカー型で、
//! `SessionId` と `VoteId` をコンパイル時に区別します。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"session-", "vote-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// # 例
/// ```ignore
/// let session_id: SessionId = Id::from(Ulid::new());
/// let vote_id: VoteId = Id::from(Ulid::new());
/// // 異なる型なので混同できない
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionTag {}

impl IdMarker for SessionTag {
    fn prefix() -> &'static str {
        "session-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VoteTag {}

impl IdMarker for VoteTag {
    fn prefix() -> &'static str {
        "vote-"
    }
}

/// Identifier of a tasting session.
pub type SessionId = Id<SessionTag>;

/// Identifier of one vote record.
pub type VoteId = Id<VoteTag>;

// ========================================
// ユーザー指定の文字列 ID
// ========================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

string_id!(
    /// Identifier of a category (e.g. "Treats").
    CategoryId
);
string_id!(
    /// Identifier of a taster or host.
    UserId
);
string_id!(
    /// Identifier of an item inside a category.
    ItemId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ulid_ids_display_with_prefix() {
        let ulid = Ulid::new();
        let session = SessionId::from_ulid(ulid);
        let vote = VoteId::from_ulid(ulid);

        assert_eq!(session.as_ulid(), vote.as_ulid());
        assert!(session.to_string().starts_with("session-"));
        assert!(vote.to_string().starts_with("vote-"));
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;
        assert_eq!(size_of::<SessionId>(), size_of::<Ulid>());
        assert_eq!(size_of::<VoteId>(), size_of::<Ulid>());
    }

    #[test]
    fn string_ids_serialize_transparently() {
        let item = ItemId::new("1");
        assert_eq!(serde_json::to_string(&item).unwrap(), "\"1\"");

        let user: UserId = serde_json::from_str("\"u1\"").unwrap();
        assert_eq!(user, UserId::from("u1"));
        assert_eq!(user.to_string(), "u1");
    }
}
