//! Spatial hash grid built once per tick as a read-only snapshot of every
//! entity the bot engine may look at.

use std::collections::HashMap;

use bevy_ecs::prelude::Entity;
use glam::Vec2;

use crate::components::Team;
use crate::content::{CreatureId, ItemId};

/// Cell size in world units.
const CELL_SIZE: f32 = 512.0;

/// What an entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Mob(CreatureId),
    Drop(ItemId),
}

/// An entity entry in the spatial grid.
#[derive(Debug, Clone)]
pub struct SpatialEntry {
    pub entity: Entity,
    pub runtime_id: u64,
    pub position: Vec2,
    pub radius: f32,
    /// Drops have no team.
    pub team: Option<Team>,
    pub kind: EntityKind,
    pub immune: bool,
    pub alive: bool,
}

impl SpatialEntry {
    pub fn is_mob(&self) -> bool {
        matches!(self.kind, EntityKind::Mob(_))
    }

    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    /// Hostile to `team`: has a team and it differs.
    pub fn is_hostile_to(&self, team: Team) -> bool {
        self.team.is_some_and(|t| t != team)
    }

    /// Alive and not currently immune.
    pub fn is_targetable(&self) -> bool {
        self.alive && !self.immune
    }
}

/// Bounded-region query over a tick's entity snapshot.
pub trait SpatialQuery {
    /// Visit every entry whose bounding circle overlaps the rectangle centred
    /// on `origin` with the given half extents.
    fn query(&self, origin: Vec2, half_w: f32, half_h: f32, visit: &mut dyn FnMut(&SpatialEntry));

    /// Look an entity up by id.
    fn get(&self, entity: Entity) -> Option<&SpatialEntry>;

    fn is_alive(&self, entity: Entity) -> bool {
        self.get(entity).is_some_and(|e| e.alive)
    }
}

/// A spatial hash grid for O(1) cell lookup of nearby entities.
#[derive(Default)]
pub struct SpatialGrid {
    entries: Vec<SpatialEntry>,
    cells: HashMap<(i32, i32), Vec<usize>>,
    by_entity: HashMap<Entity, usize>,
    max_radius: f32,
}

impl SpatialGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry into the grid.
    pub fn insert(&mut self, entry: SpatialEntry) {
        let idx = self.entries.len();
        self.cells
            .entry(cell_key(entry.position))
            .or_default()
            .push(idx);
        self.by_entity.insert(entry.entity, idx);
        self.max_radius = self.max_radius.max(entry.radius);
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SpatialQuery for SpatialGrid {
    fn query(&self, origin: Vec2, half_w: f32, half_h: f32, visit: &mut dyn FnMut(&SpatialEntry)) {
        // Entries are bucketed by centre, so widen the cell scan by the
        // largest radius to catch circles poking into the rectangle.
        let pad = self.max_radius;
        let lo = cell_key(origin - Vec2::new(half_w + pad, half_h + pad));
        let hi = cell_key(origin + Vec2::new(half_w + pad, half_h + pad));

        for cx in lo.0..=hi.0 {
            for cy in lo.1..=hi.1 {
                let Some(bucket) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                for &idx in bucket {
                    let e = &self.entries[idx];
                    let d = (e.position - origin).abs();
                    if d.x <= half_w + e.radius && d.y <= half_h + e.radius {
                        visit(e);
                    }
                }
            }
        }
    }

    fn get(&self, entity: Entity) -> Option<&SpatialEntry> {
        self.by_entity.get(&entity).map(|&i| &self.entries[i])
    }
}

/// Compute the cell key for a world position.
fn cell_key(p: Vec2) -> (i32, i32) {
    (
        (p.x / CELL_SIZE).floor() as i32,
        (p.y / CELL_SIZE).floor() as i32,
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn entry(id: u32, x: f32, y: f32, team: u64, kind: EntityKind) -> SpatialEntry {
        SpatialEntry {
            entity: Entity::from_raw(id),
            runtime_id: id as u64,
            position: Vec2::new(x, y),
            radius: 10.0,
            team: match kind {
                EntityKind::Drop(_) => None,
                _ => Some(Team(team)),
            },
            kind,
            immune: false,
            alive: true,
        }
    }

    fn collect(grid: &SpatialGrid, origin: Vec2, half: f32) -> Vec<u64> {
        let mut out = Vec::new();
        grid.query(origin, half, half, &mut |e| out.push(e.runtime_id));
        out.sort_unstable();
        out
    }

    #[test]
    fn query_returns_overlapping_entries_only() {
        let mut grid = SpatialGrid::new();
        grid.insert(entry(1, 100.0, 100.0, 1, EntityKind::Player));
        grid.insert(entry(2, 900.0, 100.0, 1, EntityKind::Player));
        grid.insert(entry(3, 5000.0, 5000.0, 1, EntityKind::Player));

        assert_eq!(collect(&grid, Vec2::new(0.0, 0.0), 1000.0), vec![1, 2]);
        assert_eq!(collect(&grid, Vec2::new(0.0, 0.0), 200.0), vec![1]);
    }

    #[test]
    fn query_counts_entry_radius() {
        let mut grid = SpatialGrid::new();
        grid.insert(entry(1, 205.0, 0.0, 1, EntityKind::Player));
        assert_eq!(collect(&grid, Vec2::ZERO, 200.0), vec![1]);
        assert!(collect(&grid, Vec2::ZERO, 190.0).is_empty());
    }

    #[test]
    fn large_entry_found_from_distant_cell() {
        let mut grid = SpatialGrid::new();
        grid.insert(entry(1, 0.0, 0.0, 1, EntityKind::Player));
        let mut big = entry(2, 3000.0, 0.0, 1, EntityKind::Player);
        big.radius = 1500.0;
        grid.insert(big);
        // inserted after the big one, must not shrink the scan padding
        grid.insert(entry(3, 10.0, 10.0, 1, EntityKind::Player));

        assert_eq!(collect(&grid, Vec2::ZERO, 1600.0), vec![1, 2, 3]);
        assert_eq!(collect(&grid, Vec2::ZERO, 1400.0), vec![1, 3]);
    }

    #[test]
    fn query_spans_negative_cells() {
        let mut grid = SpatialGrid::new();
        grid.insert(entry(1, -700.0, -30.0, 1, EntityKind::Player));
        assert_eq!(collect(&grid, Vec2::new(-100.0, 0.0), 800.0), vec![1]);
    }

    #[test]
    fn lookup_by_entity() {
        let mut grid = SpatialGrid::new();
        grid.insert(entry(7, 1.0, 2.0, 3, EntityKind::Player));
        let mut dead = entry(8, 1.0, 2.0, 3, EntityKind::Player);
        dead.alive = false;
        grid.insert(dead);

        assert!(grid.is_alive(Entity::from_raw(7)));
        assert!(!grid.is_alive(Entity::from_raw(8)));
        assert!(!grid.is_alive(Entity::from_raw(9)));
        assert_eq!(grid.get(Entity::from_raw(7)).map(|e| e.team), Some(Some(Team(3))));
    }

    #[test]
    fn hostility() {
        let mob = entry(1, 0.0, 0.0, 99, EntityKind::Mob(CreatureId(1)));
        assert!(mob.is_hostile_to(Team(1)));
        assert!(!mob.is_hostile_to(Team(99)));
        let drop = entry(2, 0.0, 0.0, 0, EntityKind::Drop(ItemId(1)));
        assert!(!drop.is_hostile_to(Team(1)));
    }
}
