//! Bot tick system: snapshots the world, runs the decision engine for every
//! live bot, and writes the committed outcome back to ECS state.

use bevy_ecs::prelude::*;
use rand::Rng;
use tracing::debug;

use crate::components::*;
use crate::content::Content;
use crate::game_world::{GameEvent, OutgoingEvents, TickCounter};
use crate::spatial::{EntityKind, SpatialEntry, SpatialGrid};
use crate::tracker::ItemTracker;

use super::arbiter::{tick_bot, BotContext, BotDecision, BotState};
use super::config::BotConfig;

/// Build the read-only spatial snapshot the finders query this tick.
pub fn build_snapshot(world: &mut World) -> SpatialGrid {
    let mut grid = SpatialGrid::new();
    let mut q = world.query_filtered::<(
        Entity,
        &EntityId,
        &Position,
        &Radius,
        Option<&Team>,
        Option<&Immunity>,
        Has<Dead>,
        Option<&Mob>,
        Option<&Drop>,
    ), Or<(With<Player>, With<Mob>, With<Drop>)>>();

    for (entity, eid, pos, radius, team, immunity, dead, mob, drop) in q.iter(world) {
        let kind = match (mob, drop) {
            (Some(m), _) => EntityKind::Mob(m.0),
            (None, Some(d)) => EntityKind::Drop(d.0),
            (None, None) => EntityKind::Player,
        };
        grid.insert(SpatialEntry {
            entity,
            runtime_id: eid.runtime_id,
            position: pos.0,
            radius: radius.0,
            team: team.copied(),
            kind,
            immune: immunity.is_some_and(|i| i.0 > 0),
            alive: !dead,
        });
    }
    grid
}

/// A bot only acts while the camera that owns it exists and is alive.
fn camera_alive(world: &World, camera: Entity) -> bool {
    world.get::<Camera>(camera).is_some() && world.get::<Dead>(camera).is_none()
}

/// Run the decision engine once for every live bot.
pub fn system_bot_tick(world: &mut World, content: &Content, config: &BotConfig, rng: &mut impl Rng) {
    let now = world.resource::<TickCounter>().0;
    let grid = build_snapshot(world);

    // Step 1: Snapshot bot state
    let bots: Vec<(BotState, Entity)> = {
        let mut q = world.query_filtered::<(
            (Entity, &EntityId, &Position, &Facing, &Radius),
            (&Health, &Score, &Team, &OverlevelTimer, &Lifetime),
            (&Bot, &Loadout, &DeletedItemLog, &RecentDamage, &CameraLink),
        ), (With<Player>, Without<Dead>)>();
        q.iter(world)
            .map(
                |(
                    (entity, eid, pos, facing, radius),
                    (health, score, team, overlevel, lifetime),
                    (bot, loadout, deleted, damage, camera),
                )| {
                    let state = BotState {
                        entity,
                        runtime_id: eid.runtime_id,
                        position: pos.0,
                        facing: facing.0,
                        radius: radius.0,
                        health: *health,
                        score: score.0,
                        team: *team,
                        overlevel_timer: overlevel.0,
                        lifetime: lifetime.0,
                        ai_tick: bot.ai_tick,
                        loadout: loadout.clone(),
                        deleted: deleted.clone(),
                        recent_damage: damage.clone(),
                    };
                    (state, camera.0)
                },
            )
            .collect()
    };

    // Step 2: Decide
    let thought_ticks = config.thought_ticks();
    let decisions: Vec<(BotState, BotDecision)> = world.resource_scope(|world, mut tracker: Mut<ItemTracker>| {
        let ctx = BotContext {
            content,
            config,
            world: &grid,
            now,
        };
        bots.into_iter()
            .filter(|(_, camera)| camera_alive(world, *camera))
            .map(|(mut state, _)| {
                let decision = tick_bot(&mut state, &ctx, &mut tracker, &mut *rng);
                (state, decision)
            })
            .collect()
    });

    // Step 3: Apply outputs to ECS state
    let mut events = Vec::new();
    for (state, decision) in decisions {
        let entity = state.entity;
        let text = decision.action.thought();
        let changed = match world.get_mut::<Bot>(entity) {
            Some(mut bot) => {
                bot.ai_tick = state.ai_tick;
                let changed = bot.last_thought != text;
                bot.last_thought = text;
                changed
            }
            None => false,
        };
        if let Some(mut loadout) = world.get_mut::<Loadout>(entity) {
            *loadout = state.loadout;
        }
        if let Some(mut deleted) = world.get_mut::<DeletedItemLog>(entity) {
            *deleted = state.deleted;
        }
        if let Some(mut accel) = world.get_mut::<Acceleration>(entity) {
            accel.0 = decision.steering.acceleration;
        }
        if let Some(mut facing) = world.get_mut::<Facing>(entity) {
            facing.0 = decision.steering.angle;
        }
        if let Some(mut input) = world.get_mut::<Input>(entity) {
            input.0 = decision.steering.input;
        }
        if changed {
            debug!(
                runtime_id = state.runtime_id,
                action = ?decision.action,
                "bot changed its mind"
            );
            events.push(GameEvent::BotThought {
                runtime_id: state.runtime_id,
                text,
            });
        }
        if let Some(mut thought) = world.get_mut::<Thought>(entity) {
            thought.set(text, thought_ticks);
        }
    }

    world.resource_mut::<OutgoingEvents>().events.extend(events);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::creatures;
    use crate::game_world::GameWorld;
    use glam::Vec2;

    #[test]
    fn snapshot_tags_entities_by_kind() {
        let mut gw = GameWorld::with_seed(5);
        let bot = gw.spawn_bot("alpha", Vec2::new(100.0, 100.0));
        let mob = gw
            .spawn_creature(creatures::BEE, Vec2::new(200.0, 100.0))
            .unwrap();
        let grid = build_snapshot(&mut gw.world);
        assert_eq!(grid.len(), 2);

        use crate::spatial::SpatialQuery;
        assert!(grid.get(bot.player).is_some_and(|e| e.is_player()));
        assert!(grid.get(mob).is_some_and(|e| e.is_mob()));
    }

    #[test]
    fn bot_without_live_camera_does_nothing() {
        let mut gw = GameWorld::with_seed(5);
        let bot = gw.spawn_bot("alpha", Vec2::new(100.0, 100.0));
        gw.world.entity_mut(bot.camera).insert(Dead);

        system_bot_tick(&mut gw.world, &gw.content, &gw.bot_config, &mut gw.rng);
        assert_eq!(gw.world.get::<Bot>(bot.player).map(|b| b.ai_tick), Some(0));
    }

    #[test]
    fn decision_is_written_back() {
        let mut gw = GameWorld::with_seed(5);
        let bot = gw.spawn_bot("alpha", Vec2::new(1000.0, 1000.0));
        gw.spawn_creature(creatures::ROCK, Vec2::new(1500.0, 1000.0))
            .unwrap();

        system_bot_tick(&mut gw.world, &gw.content, &gw.bot_config, &mut gw.rng);

        let world = &gw.world;
        assert_eq!(world.get::<Bot>(bot.player).map(|b| b.ai_tick), Some(1));
        assert!(world
            .get::<Input>(bot.player)
            .is_some_and(|i| i.0.contains(InputFlags::ATTACKING)));
        assert!(world
            .get::<Acceleration>(bot.player)
            .is_some_and(|a| a.0.x > 0.0));
        assert_eq!(
            world.get::<Thought>(bot.player).map(|t| t.text.as_str()),
            Some("Hunting")
        );
    }

    #[test]
    fn repeated_decision_emits_one_thought_event() {
        let mut gw = GameWorld::with_seed(5);
        gw.world_config.spawn.interval_ticks = u64::MAX;
        let bot = gw.spawn_bot("alpha", Vec2::new(1000.0, 1000.0));
        gw.drain_events();

        // long enough for the displayed thought to clear and reappear
        let ticks = 4 * gw.bot_config.thought_ticks();
        for _ in 0..ticks {
            gw.tick();
        }

        let thoughts: Vec<&str> = gw
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::BotThought { text, .. } => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(thoughts, vec!["Exploring"]);
        assert_eq!(
            gw.world.get::<Bot>(bot.player).map(|b| b.last_thought),
            Some("Exploring")
        );
    }
}
