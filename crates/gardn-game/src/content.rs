//! Static reference tables: items, creatures, zones and level curves.
//!
//! The tables are read-only at runtime; the bot engine only ever looks
//! entries up by id. Unknown ids resolve to `None` instead of failing.

use glam::Vec2;

use crate::components::MAX_SLOT_COUNT;

/// Identifier of an item definition. Id 0 is never assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u8);

/// Identifier of a creature definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CreatureId(pub u8);

/// Item rarity tiers. `Unique` sits outside the linear ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rarity {
    Common,
    Unusual,
    Rare,
    Epic,
    Legendary,
    Mythic,
    Unique,
}

/// Definition of an item (a petal).
#[derive(Debug, Clone)]
pub struct ItemDefinition {
    pub id: ItemId,
    pub name: &'static str,
    pub rarity: Rarity,
    pub damage: f32,
    /// Health restored per tick while equipped.
    pub constant_heal: f32,
    /// Number of copies orbiting per slot.
    pub count: u32,
}

/// Definition of a creature (a mob).
#[derive(Debug, Clone)]
pub struct CreatureDefinition {
    pub id: CreatureId,
    pub name: &'static str,
    pub max_health: f32,
    pub radius: f32,
    /// Items this creature may drop on death.
    pub drops: Vec<ItemId>,
}

/// Axis-aligned world region with a difficulty tier.
#[derive(Debug, Clone)]
pub struct ZoneDefinition {
    pub name: &'static str,
    pub difficulty: u32,
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    /// Creatures naturally spawned inside this zone.
    pub spawns: Vec<CreatureId>,
}

impl ZoneDefinition {
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left && p.x < self.right && p.y >= self.top && p.y < self.bottom
    }

    /// Centroid of the bounding rectangle.
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            0.5 * (self.left + self.right),
            0.5 * (self.top + self.bottom),
        )
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Item reference table.
pub struct ItemTable {
    items: Vec<ItemDefinition>,
}

impl ItemTable {
    pub fn new(items: Vec<ItemDefinition>) -> Self {
        Self { items }
    }

    pub fn get(&self, id: ItemId) -> Option<&ItemDefinition> {
        self.items.iter().find(|d| d.id == id)
    }

}

/// Creature reference table.
pub struct CreatureTable {
    creatures: Vec<CreatureDefinition>,
}

impl CreatureTable {
    pub fn new(creatures: Vec<CreatureDefinition>) -> Self {
        Self { creatures }
    }

    pub fn get(&self, id: CreatureId) -> Option<&CreatureDefinition> {
        self.creatures.iter().find(|d| d.id == id)
    }
}

/// Zone reference table.
pub struct ZoneTable {
    zones: Vec<ZoneDefinition>,
}

impl ZoneTable {
    pub fn new(zones: Vec<ZoneDefinition>) -> Self {
        Self { zones }
    }

    pub fn all(&self) -> &[ZoneDefinition] {
        &self.zones
    }

    /// Zone containing `p`, or the zone with the nearest centroid when `p`
    /// lies outside every rectangle.
    pub fn zone_at(&self, p: Vec2) -> Option<&ZoneDefinition> {
        self.zones.iter().find(|z| z.contains(p)).or_else(|| {
            self.zones.iter().min_by(|a, b| {
                a.center()
                    .distance_squared(p)
                    .total_cmp(&b.center().distance_squared(p))
            })
        })
    }

    /// First zone of exactly `difficulty`, else the hardest zone below it.
    pub fn suitable_zone(&self, difficulty: u32) -> Option<&ZoneDefinition> {
        self.zones
            .iter()
            .find(|z| z.difficulty == difficulty)
            .or_else(|| {
                self.zones
                    .iter()
                    .filter(|z| z.difficulty <= difficulty)
                    .max_by_key(|z| z.difficulty)
            })
    }

    pub fn max_difficulty(&self) -> u32 {
        self.zones.iter().map(|z| z.difficulty).max().unwrap_or(0)
    }

    /// Difficulty tier a player of `level` belongs in.
    pub fn difficulty_at_level(&self, level: u32) -> u32 {
        (level / LEVELS_PER_DIFFICULTY).min(self.max_difficulty())
    }

    /// Union of all zone rectangles as `(min, max)`.
    pub fn bounds(&self) -> (Vec2, Vec2) {
        self.zones.iter().fold(
            (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)),
            |(lo, hi), z| {
                (
                    lo.min(Vec2::new(z.left, z.top)),
                    hi.max(Vec2::new(z.right, z.bottom)),
                )
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

pub const MAX_LEVEL: u32 = 99;

/// Levels between extra active slots, and between zone difficulty tiers.
pub const LEVELS_PER_EXTRA_SLOT: u32 = 15;
pub const LEVELS_PER_DIFFICULTY: u32 = 15;

/// Active slots every level starts with.
pub const BASE_ACTIVE_SLOTS: u32 = 5;

pub fn score_to_level(score: u32) -> u32 {
    let level = 1 + (score as f64 / 10.0).sqrt().floor() as u32;
    level.min(MAX_LEVEL)
}

pub fn loadout_slots_at_level(level: u32) -> usize {
    ((BASE_ACTIVE_SLOTS + level / LEVELS_PER_EXTRA_SLOT) as usize).min(MAX_SLOT_COUNT)
}

// ---------------------------------------------------------------------------
// Built-in content
// ---------------------------------------------------------------------------

/// All reference tables bundled together.
pub struct Content {
    pub items: ItemTable,
    pub creatures: CreatureTable,
    pub zones: ZoneTable,
    /// Item given to bots whose loadout is completely empty.
    pub default_item: ItemId,
}

impl Default for Content {
    fn default() -> Self {
        Self::builtin()
    }
}

pub mod items {
    use super::ItemId;

    pub const BASIC: ItemId = ItemId(1);
    pub const LIGHT: ItemId = ItemId(2);
    pub const STINGER: ItemId = ItemId(3);
    pub const ROSE: ItemId = ItemId(4);
    pub const LEAF: ItemId = ItemId(5);
    pub const POLLEN: ItemId = ItemId(6);
    pub const MISSILE: ItemId = ItemId(7);
    pub const RICE: ItemId = ItemId(8);
    pub const TRIPLET: ItemId = ItemId(9);
    pub const HEAVY: ItemId = ItemId(10);
    pub const DAHLIA: ItemId = ItemId(11);
    pub const WING: ItemId = ItemId(12);
    pub const YUCCA: ItemId = ItemId(13);
    pub const FASTER: ItemId = ItemId(14);
    pub const THIRD_EYE: ItemId = ItemId(15);
    pub const MOON: ItemId = ItemId(16);
    pub const SQUARE: ItemId = ItemId(17);
    pub const YGGDRASIL: ItemId = ItemId(18);
}

pub mod creatures {
    use super::CreatureId;

    pub const LADYBUG: CreatureId = CreatureId(1);
    pub const BEE: CreatureId = CreatureId(2);
    pub const ROCK: CreatureId = CreatureId(3);
    pub const CACTUS: CreatureId = CreatureId(4);
    pub const HORNET: CreatureId = CreatureId(5);
    pub const BEETLE: CreatureId = CreatureId(6);
    pub const SOLDIER_ANT: CreatureId = CreatureId(7);
    pub const CENTIPEDE: CreatureId = CreatureId(8);
    pub const SPIDER: CreatureId = CreatureId(9);
    pub const QUEEN_ANT: CreatureId = CreatureId(10);
}

impl Content {
    /// The stock item, creature and zone set.
    pub fn builtin() -> Self {
        use creatures::*;
        use items::*;

        fn item(
            id: ItemId,
            name: &'static str,
            rarity: Rarity,
            damage: f32,
            constant_heal: f32,
            count: u32,
        ) -> ItemDefinition {
            ItemDefinition {
                id,
                name,
                rarity,
                damage,
                constant_heal,
                count,
            }
        }

        fn creature(
            id: CreatureId,
            name: &'static str,
            max_health: f32,
            radius: f32,
            drops: &[ItemId],
        ) -> CreatureDefinition {
            CreatureDefinition {
                id,
                name,
                max_health,
                radius,
                drops: drops.to_vec(),
            }
        }

        let items = ItemTable::new(vec![
            item(BASIC, "Basic", Rarity::Common, 10.0, 0.0, 1),
            item(LIGHT, "Light", Rarity::Common, 7.0, 0.0, 1),
            item(STINGER, "Stinger", Rarity::Unusual, 35.0, 0.0, 1),
            item(ROSE, "Rose", Rarity::Unusual, 5.0, 0.0, 1),
            item(LEAF, "Leaf", Rarity::Unusual, 8.0, 1.0, 1),
            item(POLLEN, "Pollen", Rarity::Rare, 8.0, 0.0, 3),
            item(MISSILE, "Missile", Rarity::Rare, 25.0, 0.0, 1),
            item(RICE, "Rice", Rarity::Rare, 4.0, 0.0, 1),
            item(TRIPLET, "Triplet", Rarity::Epic, 8.0, 0.0, 3),
            item(HEAVY, "Heavy", Rarity::Epic, 20.0, 0.0, 1),
            item(DAHLIA, "Dahlia", Rarity::Epic, 5.0, 0.0, 3),
            item(WING, "Wing", Rarity::Legendary, 15.0, 0.0, 1),
            item(YUCCA, "Yucca", Rarity::Legendary, 5.0, 2.5, 1),
            item(FASTER, "Faster", Rarity::Legendary, 8.0, 0.0, 1),
            item(THIRD_EYE, "Third Eye", Rarity::Mythic, 0.0, 0.0, 1),
            item(MOON, "Moon", Rarity::Mythic, 40.0, 0.0, 1),
            item(SQUARE, "Square", Rarity::Unique, 15.0, 0.0, 1),
            item(YGGDRASIL, "Yggdrasil", Rarity::Unique, 1.0, 0.0, 1),
        ]);

        let creatures = CreatureTable::new(vec![
            creature(LADYBUG, "Ladybug", 25.0, 30.0, &[LIGHT, ROSE]),
            creature(BEE, "Bee", 15.0, 20.0, &[STINGER, POLLEN]),
            creature(ROCK, "Rock", 40.0, 35.0, &[BASIC, HEAVY]),
            creature(CACTUS, "Cactus", 60.0, 40.0, &[STINGER, MISSILE]),
            creature(HORNET, "Hornet", 60.0, 40.0, &[MISSILE, WING]),
            creature(BEETLE, "Beetle", 80.0, 35.0, &[TRIPLET, DAHLIA]),
            creature(SOLDIER_ANT, "Soldier Ant", 40.0, 20.0, &[RICE, WING]),
            creature(CENTIPEDE, "Centipede", 100.0, 35.0, &[LEAF, YUCCA]),
            creature(SPIDER, "Spider", 60.0, 20.0, &[FASTER, THIRD_EYE]),
            creature(QUEEN_ANT, "Queen Ant", 400.0, 60.0, &[MOON, SQUARE]),
        ]);

        let zones = ZoneTable::new(vec![
            ZoneDefinition {
                name: "Garden",
                difficulty: 0,
                left: 0.0,
                top: 0.0,
                right: 4000.0,
                bottom: 2000.0,
                spawns: vec![LADYBUG, BEE, ROCK],
            },
            ZoneDefinition {
                name: "Desert",
                difficulty: 1,
                left: 4000.0,
                top: 0.0,
                right: 8000.0,
                bottom: 2000.0,
                spawns: vec![CACTUS, HORNET, BEE],
            },
            ZoneDefinition {
                name: "Ant Hell",
                difficulty: 2,
                left: 8000.0,
                top: 0.0,
                right: 12000.0,
                bottom: 2000.0,
                spawns: vec![SOLDIER_ANT, BEETLE, CENTIPEDE],
            },
            ZoneDefinition {
                name: "Hel",
                difficulty: 3,
                left: 12000.0,
                top: 0.0,
                right: 16000.0,
                bottom: 2000.0,
                spawns: vec![SPIDER, CENTIPEDE, QUEEN_ANT],
            },
        ]);

        Self {
            items,
            creatures,
            zones,
            default_item: BASIC,
        }
    }
}
