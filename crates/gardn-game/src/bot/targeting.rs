//! Spatial target finders.
//!
//! Every finder issues one square query of half extent `radius` around the
//! origin and reduces the matches. Nearest finders only accept candidates
//! strictly closer than `radius`; drop finders only accept a positive score.

use bevy_ecs::prelude::Entity;
use glam::Vec2;

use crate::components::{RecentDamage, Team};
use crate::content::{CreatureId, CreatureTable};
use crate::spatial::{EntityKind, SpatialEntry, SpatialQuery};

use super::scoring::Appraiser;

/// A selected target. `metric` is the distance for nearest finders and the
/// item score for drop finders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub entity: Entity,
    pub position: Vec2,
    pub metric: f32,
}

impl Target {
    fn from_entry(e: &SpatialEntry, metric: f32) -> Self {
        Self {
            entity: e.entity,
            position: e.position,
            metric,
        }
    }
}

fn nearest(
    world: &dyn SpatialQuery,
    origin: Vec2,
    radius: f32,
    mut accept: impl FnMut(&SpatialEntry) -> bool,
) -> Option<Target> {
    let mut best: Option<Target> = None;
    world.query(origin, radius, radius, &mut |e| {
        if !e.is_targetable() || !accept(e) {
            return;
        }
        let d = e.position.distance(origin);
        let limit = best.map_or(radius, |b| b.metric);
        if d < limit {
            best = Some(Target::from_entry(e, d));
        }
    });
    best
}

fn highest(
    world: &dyn SpatialQuery,
    origin: Vec2,
    radius: f32,
    mut score: impl FnMut(&SpatialEntry) -> Option<f32>,
) -> Option<Target> {
    let mut best: Option<Target> = None;
    world.query(origin, radius, radius, &mut |e| {
        if !e.is_targetable() {
            return;
        }
        let Some(s) = score(e) else {
            return;
        };
        let floor = best.map_or(0.0, |b| b.metric);
        if s > floor {
            best = Some(Target::from_entry(e, s));
        }
    });
    best
}

pub fn find_nearest_mob(
    world: &dyn SpatialQuery,
    origin: Vec2,
    radius: f32,
    team: Team,
) -> Option<Target> {
    nearest(world, origin, radius, |e| e.is_mob() && e.is_hostile_to(team))
}

pub fn find_nearest_player(
    world: &dyn SpatialQuery,
    origin: Vec2,
    radius: f32,
    team: Team,
) -> Option<Target> {
    nearest(world, origin, radius, |e| {
        e.is_player() && e.is_hostile_to(team)
    })
}

/// Nearest hostile of any kind (mob or player). Used by wander repulsion.
pub fn find_nearest_threat(
    world: &dyn SpatialQuery,
    origin: Vec2,
    radius: f32,
    team: Team,
) -> Option<Target> {
    nearest(world, origin, radius, |e| {
        (e.is_mob() || e.is_player()) && e.is_hostile_to(team)
    })
}

/// Highest-scoring drop with a known item.
pub fn find_best_drop(
    world: &dyn SpatialQuery,
    origin: Vec2,
    radius: f32,
    appraiser: &Appraiser,
) -> Option<Target> {
    highest(world, origin, radius, |e| match e.kind {
        EntityKind::Drop(id) if appraiser.is_known(id) => Some(appraiser.score_id(id)),
        _ => None,
    })
}

/// Like [`find_best_drop`], restricted to healing items.
pub fn find_best_heal_drop(
    world: &dyn SpatialQuery,
    origin: Vec2,
    radius: f32,
    appraiser: &Appraiser,
) -> Option<Target> {
    highest(world, origin, radius, |e| match e.kind {
        EntityKind::Drop(id) if appraiser.is_known(id) && appraiser.is_healing(id) => {
            Some(appraiser.score_id(id))
        }
        _ => None,
    })
}

/// Nearest hostile mob whose drop list contains a healing item.
pub fn find_nearest_heal_mob(
    world: &dyn SpatialQuery,
    origin: Vec2,
    radius: f32,
    team: Team,
    creatures: &CreatureTable,
    appraiser: &Appraiser,
) -> Option<Target> {
    let drops_heal = |id: CreatureId| {
        creatures
            .get(id)
            .is_some_and(|c| c.drops.iter().any(|d| appraiser.is_healing(*d)))
    };
    nearest(world, origin, radius, |e| match e.kind {
        EntityKind::Mob(id) => e.is_hostile_to(team) && drops_heal(id),
        _ => false,
    })
}

/// Attacker that dealt the most damage within `window` ticks of `now` and is
/// still alive. Ties keep the earliest ring slot.
pub fn select_retaliation_target(
    ring: &RecentDamage,
    now: u64,
    window: u64,
    world: &dyn SpatialQuery,
) -> Option<Entity> {
    let mut best: Option<(Entity, f32)> = None;
    for rd in ring.within(now, window) {
        if !world.is_alive(rd.attacker) {
            continue;
        }
        if best.map_or(true, |(_, dmg)| rd.amount > dmg) {
            best = Some((rd.attacker, rd.amount));
        }
    }
    best.map(|(e, _)| e)
}
