//! Item desirability.
//!
//! Scoring is a pluggable policy. [`RarityWeight`] is the canonical metric
//! and every margin used by the inventory manager and the priority evaluator
//! is expressed in its units. [`LegacyComposite`] mixes damage and healing
//! into the score and is kept selectable for comparison.

use serde::Deserialize;

use crate::content::{items, ItemDefinition, ItemId, ItemTable, Rarity};

/// Maps an item definition to a desirability score (higher is better).
pub trait ScoringPolicy: Send + Sync + std::fmt::Debug {
    fn score(&self, item: &ItemDefinition) -> f32;
}

/// Fixed per-tier weight. Unique is deliberately below Mythic.
pub fn rarity_weight(rarity: Rarity) -> f32 {
    match rarity {
        Rarity::Common => 1.0,
        Rarity::Unusual => 2.0,
        Rarity::Rare => 3.5,
        Rarity::Epic => 5.0,
        Rarity::Legendary => 7.5,
        Rarity::Mythic => 10.0,
        Rarity::Unique => 8.5,
    }
}

/// Score = rarity weight.
#[derive(Debug, Default, Clone, Copy)]
pub struct RarityWeight;

impl ScoringPolicy for RarityWeight {
    fn score(&self, item: &ItemDefinition) -> f32 {
        rarity_weight(item.rarity)
    }
}

/// Rarity-dominated composite that also rewards damage, sustain and clumps.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyComposite;

impl ScoringPolicy for LegacyComposite {
    fn score(&self, item: &ItemDefinition) -> f32 {
        let mut score = rarity_weight(item.rarity) * 10.0;
        score += item.damage * 0.4;
        score += item.constant_heal * 6.0;
        if item.count > 1 {
            score += (item.count - 1) as f32;
        }
        score
    }
}

/// Config-selectable policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringKind {
    #[default]
    Rarity,
    Composite,
}

impl ScoringKind {
    pub fn policy(self) -> &'static dyn ScoringPolicy {
        match self {
            Self::Rarity => &RarityWeight,
            Self::Composite => &LegacyComposite,
        }
    }
}

/// Items treated as healing even though they list no continuous heal.
/// Rose heals in bursts, which the item table does not model.
pub const HEALING_ALLOW_LIST: &[ItemId] = &[items::ROSE];

/// Scores and classifies item ids against an item table.
#[derive(Clone, Copy)]
pub struct Appraiser<'a> {
    items: &'a ItemTable,
    policy: &'a dyn ScoringPolicy,
}

impl<'a> Appraiser<'a> {
    pub fn new(items: &'a ItemTable, policy: &'a dyn ScoringPolicy) -> Self {
        Self { items, policy }
    }

    /// Score of a slot's content. Empty slots and unknown ids are worth 0.
    pub fn score(&self, slot: Option<ItemId>) -> f32 {
        slot.and_then(|id| self.items.get(id))
            .map_or(0.0, |def| self.policy.score(def))
    }

    pub fn score_id(&self, id: ItemId) -> f32 {
        self.score(Some(id))
    }

    pub fn is_known(&self, id: ItemId) -> bool {
        self.items.get(id).is_some()
    }

    pub fn is_healing(&self, id: ItemId) -> bool {
        if HEALING_ALLOW_LIST.contains(&id) {
            return true;
        }
        self.items.get(id).is_some_and(|d| d.constant_heal > 0.0)
    }

    pub fn is_healing_slot(&self, slot: Option<ItemId>) -> bool {
        slot.is_some_and(|id| self.is_healing(id))
    }
}
