//! Natural creature spawning: each zone is topped up towards its cap with
//! creatures from its own spawn list.

use std::collections::HashMap;

use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::Rng;
use serde::Deserialize;
use tracing::{trace, warn};

use crate::components::*;
use crate::content::{Content, ZoneDefinition};
use crate::game_world::{spawn_creature, TickCounter};

/// Configuration for natural creature spawning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Maximum living creatures per zone.
    pub creature_cap_per_zone: u32,
    /// Creatures added to a zone per spawn pass.
    pub batch: u32,
    /// Ticks between spawn passes.
    pub interval_ticks: u64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            creature_cap_per_zone: 30,
            batch: 3,
            interval_ticks: 40, // every 2 seconds
        }
    }
}

/// Uniform point inside a zone's rectangle.
pub fn random_point_in(zone: &ZoneDefinition, rng: &mut impl Rng) -> Vec2 {
    let x = if zone.right > zone.left {
        rng.gen_range(zone.left..zone.right)
    } else {
        zone.left
    };
    let y = if zone.bottom > zone.top {
        rng.gen_range(zone.top..zone.bottom)
    } else {
        zone.top
    };
    Vec2::new(x, y)
}

fn count_by_zone(world: &mut World, content: &Content) -> HashMap<&'static str, u32> {
    let mut counts = HashMap::new();
    let mut q = world.query_filtered::<&Position, (With<Mob>, Without<Dead>)>();
    for pos in q.iter(world) {
        if let Some(zone) = content.zones.zone_at(pos.0) {
            *counts.entry(zone.name).or_insert(0) += 1;
        }
    }
    counts
}

/// Periodically top up every zone with its native creatures.
pub fn system_natural_spawn(
    world: &mut World,
    content: &Content,
    config: &SpawnConfig,
    rng: &mut impl Rng,
) {
    let tick = world.resource::<TickCounter>().0;
    if config.interval_ticks == 0 || tick == 0 || !tick.is_multiple_of(config.interval_ticks) {
        return;
    }

    let counts = count_by_zone(world, content);

    for zone in content.zones.all() {
        if zone.spawns.is_empty() {
            continue;
        }
        let living = counts.get(zone.name).copied().unwrap_or(0);
        let room = config.creature_cap_per_zone.saturating_sub(living);
        for _ in 0..room.min(config.batch) {
            let creature = zone.spawns[rng.gen_range(0..zone.spawns.len())];
            let position = random_point_in(zone, rng);
            match spawn_creature(world, content, creature, position) {
                Ok(_) => trace!(zone = zone.name, ?creature, "natural spawn"),
                Err(e) => warn!(zone = zone.name, error = %e, "natural spawn failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_world::GameWorld;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mobs(gw: &mut GameWorld) -> usize {
        gw.world
            .query_filtered::<(), With<Mob>>()
            .iter(&gw.world)
            .count()
    }

    #[test]
    fn no_spawn_off_interval() {
        let mut gw = GameWorld::with_seed(1);
        let config = SpawnConfig {
            interval_ticks: 10,
            ..Default::default()
        };
        gw.world.resource_mut::<TickCounter>().0 = 7;
        system_natural_spawn(&mut gw.world, &gw.content, &config, &mut gw.rng);
        assert_eq!(mobs(&mut gw), 0);

        gw.world.resource_mut::<TickCounter>().0 = 0;
        system_natural_spawn(&mut gw.world, &gw.content, &config, &mut gw.rng);
        assert_eq!(mobs(&mut gw), 0);
    }

    #[test]
    fn spawns_inside_their_zone_up_to_cap() {
        let mut gw = GameWorld::with_seed(1);
        let config = SpawnConfig {
            creature_cap_per_zone: 4,
            batch: 3,
            interval_ticks: 1,
        };
        for t in 1..=5 {
            gw.world.resource_mut::<TickCounter>().0 = t;
            system_natural_spawn(&mut gw.world, &gw.content, &config, &mut gw.rng);
        }

        let zones_with_spawns = gw
            .content
            .zones
            .all()
            .iter()
            .filter(|z| !z.spawns.is_empty())
            .count();
        assert_eq!(mobs(&mut gw), 4 * zones_with_spawns);

        let content = &gw.content;
        let mut q = gw.world.query::<(&Mob, &Position)>();
        for (mob, pos) in q.iter(&gw.world) {
            let zone = content.zones.zone_at(pos.0).unwrap();
            assert!(zone.contains(pos.0));
            assert!(zone.spawns.contains(&mob.0));
        }
    }

    #[test]
    fn random_point_stays_inside() {
        let mut rng = StdRng::seed_from_u64(3);
        let content = Content::builtin();
        for zone in content.zones.all() {
            for _ in 0..50 {
                assert!(zone.contains(random_point_in(zone, &mut rng)));
            }
        }
    }
}
