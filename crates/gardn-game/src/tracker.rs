//! Global count of outstanding items (held in loadouts, lying on the ground,
//! or still referenced by a deleted-item log).
//!
//! The tracker is shared by every entity. Under the single-threaded tick it
//! is handed out as `&mut ItemTracker` to each mutation; a scheduler running
//! bots on several workers must serialize access to it.

use std::collections::HashMap;

use bevy_ecs::prelude::*;

use crate::content::{ItemId, ItemTable, Rarity};

#[derive(Resource, Debug, Default, Clone)]
pub struct ItemTracker {
    counts: HashMap<ItemId, u32>,
}

impl ItemTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: ItemId) {
        *self.counts.entry(id).or_insert(0) += 1;
    }

    /// Decrement; never goes below zero.
    pub fn remove(&mut self, id: ItemId) {
        if let Some(c) = self.counts.get_mut(&id) {
            *c = c.saturating_sub(1);
        }
    }

    pub fn count(&self, id: ItemId) -> u32 {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Outstanding copies of every item of the given rarity.
    pub fn count_by_rarity(&self, items: &ItemTable, rarity: Rarity) -> u32 {
        self.counts
            .iter()
            .filter(|(id, _)| items.get(**id).is_some_and(|d| d.rarity == rarity))
            .map(|(_, c)| *c)
            .sum()
    }
}
