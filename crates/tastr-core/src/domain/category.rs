//! Category and item model.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::errors::TastrError;
use super::ids::{CategoryId, ItemId};
use super::rating::INITIAL_RATING;

/// One thing being tasted.
///
/// `alias` is what tasters see, so the vote stays blind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub alias: String,
    pub rating: f64,
}

impl Item {
    pub fn new(id: ItemId, name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            alias: alias.into(),
            rating: INITIAL_RATING,
        }
    }
}

/// A category and its ordered items.
///
/// The set of item ids is fixed at creation; only ratings change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: CategoryId,
    pub items: Vec<Item>,
}

impl Category {
    /// Build a category from `item id -> name`, assigning shuffled letter aliases.
    ///
    /// Fails with `InvalidItemSet` when fewer than two names are given: nothing could
    /// ever be paired.
    pub fn from_names<R: Rng + ?Sized>(
        category_id: CategoryId,
        names: &BTreeMap<ItemId, String>,
        rng: &mut R,
    ) -> Result<Self, TastrError> {
        if names.len() < 2 {
            return Err(TastrError::InvalidItemSet(names.len()));
        }

        let mut aliases: Vec<String> = (0..names.len()).map(alias_for_index).collect();
        aliases.shuffle(rng);

        let items = names
            .iter()
            .zip(aliases)
            .map(|((id, name), alias)| Item::new(id.clone(), name.clone(), alias))
            .collect();

        Ok(Self { category_id, items })
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id.clone()).collect()
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn item_mut(&mut self, id: &ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| &item.id == id)
    }

    pub fn aliases(&self) -> BTreeMap<ItemId, String> {
        self.items
            .iter()
            .map(|item| (item.id.clone(), item.alias.clone()))
            .collect()
    }

    pub fn names(&self) -> BTreeMap<ItemId, String> {
        self.items
            .iter()
            .map(|item| (item.id.clone(), item.name.clone()))
            .collect()
    }

    /// Items sorted by rating, strongest first.
    pub fn leaderboard(&self) -> Vec<Item> {
        let mut ranked = self.items.clone();
        ranked.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        ranked
    }
}

/// 0 -> "A", 25 -> "Z", 26 -> "AA", 27 -> "AB", ...
fn alias_for_index(index: usize) -> String {
    let mut n = index;
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}
