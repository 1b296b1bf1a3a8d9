//! Loadout management for bots: equip, promote, rebalance and evict items
//! within the fixed slot layout.
//!
//! Fine-grained operations (`promote_highest_rarity_once`,
//! `ensure_heal_equipped`) run every tick and move at most one item. The
//! coarse passes (`rebalance_loadout`, `maybe_trash_unwanted`) run about once
//! per second.

use arrayvec::ArrayVec;
use tracing::debug;

use crate::components::{DeletedItemLog, Loadout, LOADOUT_CAPACITY};
use crate::content::ItemId;
use crate::tracker::ItemTracker;

use super::scoring::Appraiser;

/// A reserve item must beat the worst reserve item by this much to evict it.
pub const RESERVE_EVICT_MARGIN: f32 = 0.1;
/// A candidate must beat the worst active item by this much to evict it.
pub const ACTIVE_EVICT_MARGIN: f32 = 0.5;
/// A reserve item must beat the worst active item by this much to be promoted.
pub const PROMOTE_MARGIN: f32 = 0.05;

/// A slot index with its current score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotScore {
    pub slot: usize,
    pub score: f32,
}

/// Eviction candidates: the lowest-scoring active slot (empty counts as 0)
/// and the lowest-scoring non-empty reserve slot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorstSlots {
    pub active: Option<SlotScore>,
    pub reserve: Option<SlotScore>,
}

impl WorstSlots {
    /// Worst active score, 0 when there are no active slots.
    pub fn active_score(&self) -> f32 {
        self.active.map_or(0.0, |s| s.score)
    }
}

/// Fill every active slot with `default_item` when the whole loadout is
/// empty. Reserve slots are never touched. Returns how many items were
/// granted.
pub fn ensure_basics_if_empty(loadout: &mut Loadout, default_item: ItemId) -> usize {
    if loadout.all().iter().any(Option::is_some) {
        return 0;
    }
    let active = loadout.active_count();
    for slot in 0..active {
        loadout.set(slot, Some(default_item));
    }
    active
}

pub fn has_empty_slot(loadout: &Loadout) -> bool {
    loadout.first_empty().is_some()
}

pub fn worst_slots(loadout: &Loadout, appraiser: &Appraiser) -> WorstSlots {
    let mut worst = WorstSlots::default();

    for (slot, item) in loadout.active().iter().enumerate() {
        let score = appraiser.score(*item);
        if worst.active.map_or(true, |w| score < w.score) {
            worst.active = Some(SlotScore { slot, score });
        }
    }

    let offset = loadout.active_count();
    for (i, item) in loadout.reserve().iter().enumerate() {
        if item.is_none() {
            continue;
        }
        let score = appraiser.score(*item);
        if worst.reserve.map_or(true, |w| score < w.score) {
            worst.reserve = Some(SlotScore {
                slot: offset + i,
                score,
            });
        }
    }

    worst
}

/// Delete the item in `slot`: log it, release the log's oldest entry from
/// the tracker if the log overflowed, and clear the slot.
pub fn evict(
    loadout: &mut Loadout,
    deleted: &mut DeletedItemLog,
    tracker: &mut ItemTracker,
    slot: usize,
) -> Option<ItemId> {
    let item = loadout.get(slot)?;
    if let Some(oldest) = deleted.push(item) {
        tracker.remove(oldest);
    }
    loadout.set(slot, None);
    debug!(slot, item = item.0, "evicted item");
    Some(item)
}

/// Make room for an item scoring `candidate_score`. Returns true without
/// touching anything when a slot is already free. Healing items are never
/// evicted here.
pub fn try_ensure_space(
    loadout: &mut Loadout,
    deleted: &mut DeletedItemLog,
    tracker: &mut ItemTracker,
    appraiser: &Appraiser,
    candidate_score: f32,
    worst: WorstSlots,
) -> bool {
    if has_empty_slot(loadout) {
        return true;
    }

    if let Some(r) = worst.reserve {
        if !appraiser.is_healing_slot(loadout.get(r.slot))
            && candidate_score > r.score + RESERVE_EVICT_MARGIN
        {
            return evict(loadout, deleted, tracker, r.slot).is_some();
        }
    }

    if let Some(a) = worst.active {
        if !appraiser.is_healing_slot(loadout.get(a.slot))
            && candidate_score > a.score + ACTIVE_EVICT_MARGIN
        {
            return evict(loadout, deleted, tracker, a.slot).is_some();
        }
    }

    false
}

/// Swap the best reserve item into the worst active slot when it is clearly
/// better. At most one swap per call.
pub fn promote_highest_rarity_once(loadout: &mut Loadout, appraiser: &Appraiser) -> bool {
    let Some(worst) = worst_slots(loadout, appraiser).active else {
        return false;
    };

    let offset = loadout.active_count();
    let best = loadout
        .reserve()
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_some())
        .map(|(i, item)| SlotScore {
            slot: offset + i,
            score: appraiser.score(*item),
        })
        .fold(None, |best: Option<SlotScore>, s| match best {
            Some(b) if b.score >= s.score => Some(b),
            _ => Some(s),
        });

    match best {
        Some(b) if b.score > worst.score + PROMOTE_MARGIN => {
            loadout.swap(worst.slot, b.slot);
            true
        }
        _ => false,
    }
}

/// If nothing active heals but a reserve item does, swap the first such
/// reserve item into active slot 0.
pub fn ensure_heal_equipped(loadout: &mut Loadout, appraiser: &Appraiser) -> bool {
    if loadout.active_count() == 0 {
        return false;
    }
    if loadout.active().iter().any(|s| appraiser.is_healing_slot(*s)) {
        return false;
    }
    let offset = loadout.active_count();
    let Some(i) = loadout
        .reserve()
        .iter()
        .position(|s| appraiser.is_healing_slot(*s))
    else {
        return false;
    };
    loadout.swap(0, offset + i);
    true
}

/// Rank every slot by score; the top `active_count` become the active
/// block and the rest refill the reserve in ranked order.
pub fn rebalance_loadout(loadout: &mut Loadout, appraiser: &Appraiser) {
    if loadout.active_count() == 0 {
        return;
    }
    let mut ranked: ArrayVec<(Option<ItemId>, f32), LOADOUT_CAPACITY> = loadout
        .all()
        .iter()
        .map(|s| (*s, appraiser.score(*s)))
        .collect();
    // stable: equal scores keep their relative order
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    for (slot, (item, _)) in ranked.into_iter().enumerate() {
        loadout.set(slot, item);
    }
}

/// Evict one reserve item scoring under half the worst active score.
pub fn maybe_trash_unwanted(
    loadout: &mut Loadout,
    deleted: &mut DeletedItemLog,
    tracker: &mut ItemTracker,
    appraiser: &Appraiser,
) -> Option<ItemId> {
    let worst_active = worst_slots(loadout, appraiser).active?;
    let threshold = worst_active.score * 0.5;

    let offset = loadout.active_count();
    let slot = loadout
        .reserve()
        .iter()
        .position(|s| s.is_some() && appraiser.score(*s) < threshold)?;
    evict(loadout, deleted, tracker, offset + slot)
}
