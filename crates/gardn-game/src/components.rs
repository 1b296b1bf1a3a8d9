//! ECS components for all entities (players, cameras, mobs and drops).

use arrayvec::ArrayVec;
use bevy_ecs::prelude::*;
use bitflags::bitflags;
use glam::Vec2;

use crate::content::ItemId;

/// Number of reserve slots that follow the active block of a loadout.
pub const MAX_SLOT_COUNT: usize = 8;

/// Total slot storage: the largest active block plus the reserve block.
pub const LOADOUT_CAPACITY: usize = 2 * MAX_SLOT_COUNT;

/// Entries kept in the per-entity damage history.
pub const DAMAGE_HISTORY_LEN: usize = 8;

/// Capacity of the per-entity deleted-item log.
pub const DELETED_LOG_CAPACITY: usize = 32;

/// Simulation identity for an entity.
#[derive(Component, Debug, Clone, Copy)]
pub struct EntityId {
    pub runtime_id: u64,
}

/// Position in the world.
#[derive(Component, Debug, Clone, Copy)]
pub struct Position(pub Vec2);

/// Velocity integrated from acceleration every tick.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Velocity(pub Vec2);

/// Acceleration requested by the entity's controller for this tick.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Acceleration(pub Vec2);

/// Movement-facing angle in radians.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Facing(pub f32);

/// Rotation of the orbiting petals, owned by the combat system.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct OrbitHeading(pub f32);

/// Health points.
#[derive(Component, Debug, Clone, Copy)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn full(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Fraction of health remaining, 0 when `max` is non-positive.
    pub fn ratio(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }
}

/// Collision radius.
#[derive(Component, Debug, Clone, Copy)]
pub struct Radius(pub f32);

/// Team id; entities on the same team never target each other.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Team(pub u64);

/// Accumulated score, from which level is derived.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Score(pub u32);

/// Remaining ticks during which the entity cannot be targeted.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Immunity(pub u32);

/// Ticks this entity has been alive.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Lifetime(pub u64);

/// Ticks spent in a zone easier than the entity's level demands.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct OverlevelTimer(pub f32);

/// Link from a player to the camera that owns it.
#[derive(Component, Debug, Clone, Copy)]
pub struct CameraLink(pub Entity);

/// Marker: a camera (one per connected client or bot).
#[derive(Component, Debug)]
pub struct Camera;

/// Marker: this entity is a player flower.
#[derive(Component, Debug)]
pub struct Player;

/// Which creature definition a mob was spawned from.
#[derive(Component, Debug, Clone, Copy)]
pub struct Mob(pub crate::content::CreatureId);

/// A collectable item lying in the world.
#[derive(Component, Debug, Clone, Copy)]
pub struct Drop(pub ItemId);

/// Marker: this entity is dead (pending cleanup).
#[derive(Component, Debug)]
pub struct Dead;

/// Display name.
#[derive(Component, Debug, Clone)]
pub struct Name(pub String);

bitflags! {
    /// Behaviour flags understood by the simulation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InputFlags: u8 {
        const ATTACKING = 1 << 0;
        const DEFENDING = 1 << 1;
    }
}

/// Input flags currently held by the entity.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Input(pub InputFlags);

/// Gate for the bot decision engine, plus its per-entity tick counter.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Bot {
    pub ai_tick: u64,
    /// Thought text of the previous decision, kept after the display clears.
    pub last_thought: &'static str,
}

/// Single-line observational text shown above the entity.
#[derive(Component, Debug, Clone, Default)]
pub struct Thought {
    pub text: String,
    pub timer: u32,
}

impl Thought {
    /// Show `text` for `ticks` unless it is already being shown.
    pub fn set(&mut self, text: &str, ticks: u32) {
        if self.text != text {
            self.text.clear();
            self.text.push_str(text);
            self.timer = ticks;
        }
    }

    /// Count down once; clears the text when the timer reaches zero.
    pub fn tick(&mut self) {
        if self.timer == 0 {
            return;
        }
        self.timer -= 1;
        if self.timer == 0 {
            self.text.clear();
        }
    }
}

// ---------------------------------------------------------------------------
// Loadout
// ---------------------------------------------------------------------------

/// Fixed-capacity item slots: `active_count` active slots followed by a
/// reserve block of [`MAX_SLOT_COUNT`] slots.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Loadout {
    active_count: usize,
    slots: [Option<ItemId>; LOADOUT_CAPACITY],
}

impl Loadout {
    pub fn new(active_count: usize) -> Self {
        Self {
            active_count: active_count.min(MAX_SLOT_COUNT),
            slots: [None; LOADOUT_CAPACITY],
        }
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Resize the active block. The reserve block always starts right after it.
    pub fn set_active_count(&mut self, count: usize) {
        self.active_count = count.min(MAX_SLOT_COUNT);
    }

    /// Number of addressable slots (active + reserve).
    pub fn total(&self) -> usize {
        self.active_count + MAX_SLOT_COUNT
    }

    pub fn get(&self, slot: usize) -> Option<ItemId> {
        if slot < self.total() {
            self.slots[slot]
        } else {
            None
        }
    }

    pub fn set(&mut self, slot: usize, item: Option<ItemId>) {
        if slot < self.total() {
            self.slots[slot] = item;
        }
    }

    pub fn swap(&mut self, a: usize, b: usize) {
        if a < self.total() && b < self.total() {
            self.slots.swap(a, b);
        }
    }

    pub fn active(&self) -> &[Option<ItemId>] {
        &self.slots[..self.active_count]
    }

    pub fn reserve(&self) -> &[Option<ItemId>] {
        &self.slots[self.active_count..self.total()]
    }

    /// Every addressable slot, active block first.
    pub fn all(&self) -> &[Option<ItemId>] {
        &self.slots[..self.total()]
    }

    /// Index of the first empty slot, scanning active then reserve.
    pub fn first_empty(&self) -> Option<usize> {
        self.all().iter().position(Option::is_none)
    }
}

// ---------------------------------------------------------------------------
// Bounded histories
// ---------------------------------------------------------------------------

/// One damage event received by an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRecord {
    pub attacker: Entity,
    pub tick: u64,
    pub amount: f32,
}

/// Ring buffer of the last [`DAMAGE_HISTORY_LEN`] damage events.
#[derive(Component, Debug, Clone, Default)]
pub struct RecentDamage {
    entries: [Option<DamageRecord>; DAMAGE_HISTORY_LEN],
    cursor: usize,
}

impl RecentDamage {
    /// Overwrite the oldest entry.
    pub fn record(&mut self, attacker: Entity, tick: u64, amount: f32) {
        self.entries[self.cursor] = Some(DamageRecord {
            attacker,
            tick,
            amount,
        });
        self.cursor = (self.cursor + 1) % DAMAGE_HISTORY_LEN;
    }

    /// Raw ring contents in slot order.
    pub fn slots(&self) -> &[Option<DamageRecord>; DAMAGE_HISTORY_LEN] {
        &self.entries
    }

    /// Entries no older than `window` ticks at time `now`, in slot order.
    pub fn within(&self, now: u64, window: u64) -> impl Iterator<Item = &DamageRecord> {
        self.entries
            .iter()
            .flatten()
            .filter(move |rd| now.saturating_sub(rd.tick) <= window)
    }
}

/// FIFO log of item ids deleted from the loadout.
#[derive(Component, Debug, Clone, Default)]
pub struct DeletedItemLog {
    items: ArrayVec<ItemId, DELETED_LOG_CAPACITY>,
}

impl DeletedItemLog {
    /// Append `item`. When the log is full the oldest entry is removed first
    /// and returned so the caller can release it from the global tracker.
    pub fn push(&mut self, item: ItemId) -> Option<ItemId> {
        let evicted = if self.items.is_full() {
            Some(self.items.remove(0))
        } else {
            None
        };
        self.items.push(item);
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[ItemId] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loadout_reserve_follows_active_block() {
        let mut l = Loadout::new(5);
        assert_eq!(l.total(), 13);
        assert_eq!(l.active().len(), 5);
        assert_eq!(l.reserve().len(), MAX_SLOT_COUNT);

        l.set(13, Some(ItemId(1)));
        assert_eq!(l.get(13), None, "out of range writes are ignored");

        l.set_active_count(6);
        assert_eq!(l.total(), 14);
        assert_eq!(l.reserve().len(), MAX_SLOT_COUNT);
    }

    #[test]
    fn active_count_is_capped() {
        let l = Loadout::new(20);
        assert_eq!(l.active_count(), MAX_SLOT_COUNT);
    }

    #[test]
    fn damage_ring_overwrites_oldest() {
        let mut ring = RecentDamage::default();
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        for t in 0..DAMAGE_HISTORY_LEN as u64 {
            ring.record(a, t, 1.0);
        }
        ring.record(b, 100, 5.0);
        assert_eq!(ring.slots()[0].map(|r| r.attacker), Some(b));
        assert_eq!(ring.slots().iter().flatten().count(), DAMAGE_HISTORY_LEN);
    }

    #[test]
    fn damage_ring_window_expires_old_entries() {
        let mut ring = RecentDamage::default();
        ring.record(Entity::from_raw(1), 10, 3.0);
        ring.record(Entity::from_raw(2), 50, 4.0);
        assert_eq!(ring.within(60, 40).count(), 1);
        assert_eq!(ring.within(60, 50).count(), 2);
    }

    #[test]
    fn deleted_log_evicts_index_zero_when_full() {
        let mut log = DeletedItemLog::default();
        for i in 0..DELETED_LOG_CAPACITY as u8 {
            assert_eq!(log.push(ItemId(i + 10)), None);
        }
        assert_eq!(log.push(ItemId(7)), Some(ItemId(10)));
        assert_eq!(log.len(), DELETED_LOG_CAPACITY);
        assert_eq!(log.as_slice().last(), Some(&ItemId(7)));
        assert_eq!(log.as_slice()[0], ItemId(11));
    }

    #[test]
    fn thought_counts_down_and_clears() {
        let mut th = Thought::default();
        th.set("Hunting", 2);
        th.set("Hunting", 5);
        assert_eq!(th.timer, 2, "same text does not reset the timer");
        th.tick();
        assert_eq!(th.text, "Hunting");
        th.tick();
        assert!(th.text.is_empty());
        assert_eq!(th.timer, 0);
    }
}
