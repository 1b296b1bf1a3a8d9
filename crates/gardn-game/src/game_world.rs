//! ECS game world: bevy_ecs World, entity management, tick systems, and event bus.

use std::sync::atomic::{AtomicU64, Ordering};

use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{debug, info};

use crate::bot::movement::{ENGAGE_BAND, ENGAGE_STANDOFF};
use crate::bot::system::system_bot_tick;
use crate::bot::BotConfig;
use crate::components::*;
use crate::content::{score_to_level, Content, CreatureId, ItemId};
use crate::error::GameError;
use crate::spawning::{self, SpawnConfig};
use crate::tracker::ItemTracker;

/// Team shared by every creature.
pub const MOB_TEAM: Team = Team(0);

pub const PLAYER_RADIUS: f32 = 25.0;
pub const PLAYER_HEALTH: f32 = 100.0;
/// Ticks a freshly spawned player cannot be targeted.
pub const PLAYER_SPAWN_IMMUNITY: u32 = 20;
pub const DROP_RADIUS: f32 = 10.0;
/// Ticks before a fresh drop can be collected.
pub const DROP_SPAWN_IMMUNITY: u32 = 10;
/// Petal rotation per tick.
pub const ORBIT_SPEED: f32 = 0.1;

/// Fraction of an item's damage dealt per tick by an orbiting petal.
const PETAL_DAMAGE_SCALE: f32 = 0.02;
/// Damage per tick a creature deals to a player it touches.
const MOB_CONTACT_DAMAGE: f32 = 0.5;
/// Passive regeneration per tick for every player.
const BASE_REGEN: f32 = 0.02;

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Outgoing events queued by ECS operations for whoever drives the world.
#[derive(Resource, Default)]
pub struct OutgoingEvents {
    pub events: Vec<GameEvent>,
}

/// Global tick counter.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

/// Thread-safe runtime id allocator (shared by every entity kind).
#[derive(Resource)]
pub struct EntityIdAllocator {
    next: AtomicU64,
}

impl EntityIdAllocator {
    pub fn new(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Allocate the next runtime id.
    pub fn allocate(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Next id that will be allocated.
    pub fn current(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Game events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    BotSpawned { runtime_id: u64, name: String },
    CreatureSpawned { runtime_id: u64, creature: CreatureId, position: Vec2 },
    DropSpawned { runtime_id: u64, item: ItemId, position: Vec2 },
    ItemCollected { runtime_id: u64, item: ItemId, slot: usize },
    EntityDied { runtime_id: u64 },
    /// A drop vanished uncollected.
    DropExpired { runtime_id: u64, item: ItemId },
    BotThought { runtime_id: u64, text: &'static str },
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seconds an uncollected drop stays on the ground.
    pub drop_lifetime_secs: f32,
    /// Chance that a dying creature leaves loot.
    pub loot_chance: f32,
    /// Fraction of velocity lost every tick.
    pub friction: f32,
    pub spawn: SpawnConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            drop_lifetime_secs: 30.0,
            loot_chance: 0.75,
            friction: 0.2,
            spawn: SpawnConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// GameWorld
// ---------------------------------------------------------------------------

/// Camera and player spawned for one bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotHandle {
    pub camera: Entity,
    pub player: Entity,
}

/// The ECS game world.
pub struct GameWorld {
    pub world: World,
    pub content: Content,
    pub bot_config: BotConfig,
    pub world_config: WorldConfig,
    pub rng: StdRng,
}

impl GameWorld {
    pub fn new(content: Content, bot_config: BotConfig, world_config: WorldConfig, seed: u64) -> Self {
        let mut world = World::new();
        world.insert_resource(OutgoingEvents::default());
        world.insert_resource(TickCounter::default());
        world.insert_resource(EntityIdAllocator::new(1));
        world.insert_resource(ItemTracker::new());

        Self {
            world,
            content,
            bot_config,
            world_config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Built-in content with default tuning.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(
            Content::builtin(),
            BotConfig::default(),
            WorldConfig::default(),
            seed,
        )
    }

    /// Run one game tick.
    pub fn tick(&mut self) {
        self.world.resource_mut::<TickCounter>().0 += 1;
        system_timers(&mut self.world, &self.content, &self.bot_config);
        system_bot_tick(&mut self.world, &self.content, &self.bot_config, &mut self.rng);
        system_orbit(&mut self.world);
        system_movement(&mut self.world, &self.content, self.world_config.friction);
        system_petal_contact(&mut self.world, &self.content);
        system_regen(&mut self.world, &self.content);
        system_pickup(&mut self.world);
        let drop_lifetime = self.drop_lifetime_ticks();
        system_drop_expiry(&mut self.world, drop_lifetime);
        system_cleanup_dead(&mut self.world, &self.content, &self.world_config, &mut self.rng);
        system_thought_countdown(&mut self.world);
        spawning::system_natural_spawn(
            &mut self.world,
            &self.content,
            &self.world_config.spawn,
            &mut self.rng,
        );
    }

    /// Drain all pending outgoing events.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.world.resource_mut::<OutgoingEvents>().events)
    }

    pub fn current_tick(&self) -> u64 {
        self.world.resource::<TickCounter>().0
    }

    pub fn tracker(&self) -> &ItemTracker {
        self.world.resource::<ItemTracker>()
    }

    fn drop_lifetime_ticks(&self) -> u64 {
        (self.world_config.drop_lifetime_secs * self.bot_config.tps as f32).max(1.0) as u64
    }

    /// Spawn a camera and the bot-controlled player it owns. The player
    /// starts with the default item in every active slot.
    pub fn spawn_bot(&mut self, name: &str, position: Vec2) -> BotHandle {
        let allocator = self.world.resource::<EntityIdAllocator>();
        let camera_id = allocator.allocate();
        let player_id = allocator.allocate();

        let camera = self
            .world
            .spawn((
                Camera,
                EntityId {
                    runtime_id: camera_id,
                },
                Name(name.to_string()),
            ))
            .id();

        let active = crate::content::loadout_slots_at_level(score_to_level(0));
        let mut loadout = Loadout::new(active);
        let default_item = self.content.default_item;
        for slot in 0..active {
            loadout.set(slot, Some(default_item));
        }
        {
            let mut tracker = self.world.resource_mut::<ItemTracker>();
            for _ in 0..active {
                tracker.add(default_item);
            }
        }

        let player = self
            .world
            .spawn((
                (
                    Player,
                    Bot::default(),
                    EntityId {
                        runtime_id: player_id,
                    },
                    Name(name.to_string()),
                    CameraLink(camera),
                    Team(camera_id),
                ),
                (
                    Position(position),
                    Velocity::default(),
                    Acceleration::default(),
                    Facing::default(),
                    OrbitHeading::default(),
                    Radius(PLAYER_RADIUS),
                ),
                (
                    Health::full(PLAYER_HEALTH),
                    Score::default(),
                    Immunity(PLAYER_SPAWN_IMMUNITY),
                    Lifetime::default(),
                    OverlevelTimer::default(),
                ),
                (
                    loadout,
                    DeletedItemLog::default(),
                    RecentDamage::default(),
                    Input::default(),
                    Thought::default(),
                ),
            ))
            .id();

        self.push_event(GameEvent::BotSpawned {
            runtime_id: player_id,
            name: name.to_string(),
        });
        info!(name, runtime_id = player_id, "bot spawned");

        BotHandle { camera, player }
    }

    pub fn spawn_creature(&mut self, id: CreatureId, position: Vec2) -> Result<Entity, GameError> {
        spawn_creature(&mut self.world, &self.content, id, position)
    }

    pub fn spawn_drop(&mut self, item: ItemId, position: Vec2) -> Result<Entity, GameError> {
        spawn_drop(&mut self.world, &self.content, item, position)
    }

    /// Random point inside the first zone of exactly `difficulty`.
    pub fn spawn_point(&mut self, difficulty: u32) -> Result<Vec2, GameError> {
        let zone = self
            .content
            .zones
            .all()
            .iter()
            .find(|z| z.difficulty == difficulty)
            .ok_or(GameError::NoZone(difficulty))?;
        Ok(spawning::random_point_in(zone, &mut self.rng))
    }

    /// Record a hit on `target`. Returns the remaining health, or `None` if
    /// the target cannot be damaged right now.
    pub fn damage_entity(&mut self, target: Entity, attacker: Entity, amount: f32) -> Option<f32> {
        damage_entity(&mut self.world, &self.content, target, attacker, amount)
    }

    /// Number of live bot players.
    pub fn bot_count(&mut self) -> usize {
        self.world
            .query_filtered::<(), (With<Bot>, Without<Dead>)>()
            .iter(&self.world)
            .count()
    }

    /// Items held in loadouts, waiting in deleted logs, or lying on the
    /// ground. Matches the tracker total when bookkeeping is consistent.
    pub fn outstanding_items(&mut self) -> u32 {
        let mut total = 0u32;
        let mut holders = self.world.query::<(&Loadout, &DeletedItemLog)>();
        for (loadout, deleted) in holders.iter(&self.world) {
            total += loadout.all().iter().flatten().count() as u32;
            total += deleted.len() as u32;
        }
        let mut drops = self.world.query::<&Drop>();
        total += drops.iter(&self.world).count() as u32;
        total
    }

    fn push_event(&mut self, event: GameEvent) {
        self.world.resource_mut::<OutgoingEvents>().events.push(event);
    }
}

// ---------------------------------------------------------------------------
// Spawning helpers (shared with natural spawning)
// ---------------------------------------------------------------------------

pub fn spawn_creature(
    world: &mut World,
    content: &Content,
    id: CreatureId,
    position: Vec2,
) -> Result<Entity, GameError> {
    let def = content
        .creatures
        .get(id)
        .ok_or(GameError::UnknownCreature(id.0))?;
    let runtime_id = world.resource::<EntityIdAllocator>().allocate();

    let entity = world
        .spawn((
            Mob(id),
            EntityId { runtime_id },
            Position(position),
            Velocity::default(),
            Acceleration::default(),
            Radius(def.radius),
            Health::full(def.max_health),
            MOB_TEAM,
            Immunity::default(),
            Lifetime::default(),
            RecentDamage::default(),
        ))
        .id();

    world
        .resource_mut::<OutgoingEvents>()
        .events
        .push(GameEvent::CreatureSpawned {
            runtime_id,
            creature: id,
            position,
        });
    Ok(entity)
}

/// Place `item` on the ground. The tracker counts it from here on.
pub fn spawn_drop(
    world: &mut World,
    content: &Content,
    item: ItemId,
    position: Vec2,
) -> Result<Entity, GameError> {
    if content.items.get(item).is_none() {
        return Err(GameError::UnknownItem(item.0));
    }
    let runtime_id = world.resource::<EntityIdAllocator>().allocate();
    let entity = world
        .spawn((
            Drop(item),
            EntityId { runtime_id },
            Position(position),
            Radius(DROP_RADIUS),
            Immunity(DROP_SPAWN_IMMUNITY),
            Lifetime::default(),
        ))
        .id();

    world.resource_mut::<ItemTracker>().add(item);
    world
        .resource_mut::<OutgoingEvents>()
        .events
        .push(GameEvent::DropSpawned {
            runtime_id,
            item,
            position,
        });
    Ok(entity)
}

/// Apply damage, remember the attacker, and mark the target dead at zero
/// health. A killing blow on a creature credits the attacker's score.
pub fn damage_entity(
    world: &mut World,
    content: &Content,
    target: Entity,
    attacker: Entity,
    amount: f32,
) -> Option<f32> {
    if world.get::<Dead>(target).is_some() {
        return None;
    }
    if world.get::<Immunity>(target).is_some_and(|i| i.0 > 0) {
        return None;
    }
    let tick = world.resource::<TickCounter>().0;

    let remaining = {
        let mut health = world.get_mut::<Health>(target)?;
        health.current = (health.current - amount).max(0.0);
        health.current
    };
    if let Some(mut ring) = world.get_mut::<RecentDamage>(target) {
        ring.record(attacker, tick, amount);
    }

    if remaining <= 0.0 {
        world.entity_mut(target).insert(Dead);
        let runtime_id = world.get::<EntityId>(target).map_or(0, |e| e.runtime_id);
        world
            .resource_mut::<OutgoingEvents>()
            .events
            .push(GameEvent::EntityDied { runtime_id });

        let bounty = world
            .get::<Mob>(target)
            .and_then(|m| content.creatures.get(m.0))
            .map_or(0, |def| def.max_health.round() as u32);
        if let Some(mut score) = world.get_mut::<Score>(attacker) {
            score.0 = score.0.saturating_add(bounty);
        }
    }
    Some(remaining)
}

// ---------------------------------------------------------------------------
// Systems (manual, called by GameWorld::tick)
// ---------------------------------------------------------------------------

/// Lifetimes, immunity countdown and the overlevel timer.
fn system_timers(world: &mut World, content: &Content, config: &BotConfig) {
    let mut q = world.query::<(&mut Lifetime, Option<&mut Immunity>)>();
    for (mut lifetime, immunity) in q.iter_mut(world) {
        lifetime.0 += 1;
        if let Some(mut immunity) = immunity {
            immunity.0 = immunity.0.saturating_sub(1);
        }
    }

    let deadline = config.overlevel_deadline();
    let mut q = world.query_filtered::<(&Position, &Score, &mut OverlevelTimer), Without<Dead>>();
    for (pos, score, mut timer) in q.iter_mut(world) {
        let desired = content.zones.difficulty_at_level(score_to_level(score.0));
        let overlevelled = content
            .zones
            .zone_at(pos.0)
            .is_some_and(|z| z.difficulty < desired);
        timer.0 = if overlevelled {
            (timer.0 + 1.0).min(deadline)
        } else {
            0.0
        };
    }
}

/// Stand-in for the combat system's petal rotation.
fn system_orbit(world: &mut World) {
    let mut q = world.query_filtered::<&mut OrbitHeading, Without<Dead>>();
    for mut heading in q.iter_mut(world) {
        heading.0 = (heading.0 + ORBIT_SPEED) % std::f32::consts::TAU;
    }
}

/// Integrate acceleration into velocity and velocity into position.
fn system_movement(world: &mut World, content: &Content, friction: f32) {
    let (lo, hi) = content.zones.bounds();
    let mut q = world.query_filtered::<(&mut Position, &mut Velocity, &Acceleration, &Radius), Without<Dead>>();
    for (mut pos, mut vel, accel, radius) in q.iter_mut(world) {
        vel.0 = vel.0 * (1.0 - friction) + accel.0;
        pos.0 += vel.0;
        pos.0 = pos.0.clamp(lo + Vec2::splat(radius.0), hi - Vec2::splat(radius.0));
    }
}

/// Crude contact combat: attacking players hurt hostiles inside their petal
/// ring, and creatures hurt players they touch.
fn system_petal_contact(world: &mut World, content: &Content) {
    struct Body {
        entity: Entity,
        position: Vec2,
        radius: f32,
        team: Team,
        is_mob: bool,
        petal_damage: Option<f32>,
    }

    let bodies: Vec<Body> = {
        let mut q = world.query_filtered::<(
            Entity,
            &Position,
            &Radius,
            &Team,
            Has<Mob>,
            Option<&Loadout>,
            Option<&Input>,
        ), Without<Dead>>();
        q.iter(world)
            .map(|(entity, pos, radius, team, is_mob, loadout, input)| {
                let attacking = input.is_some_and(|i| i.0.contains(InputFlags::ATTACKING));
                let petal_damage = loadout.filter(|_| attacking).map(|l| {
                    l.active()
                        .iter()
                        .flatten()
                        .filter_map(|id| content.items.get(*id))
                        .map(|d| d.damage * d.count as f32)
                        .sum::<f32>()
                        * PETAL_DAMAGE_SCALE
                });
                Body {
                    entity,
                    position: pos.0,
                    radius: radius.0,
                    team: *team,
                    is_mob,
                    petal_damage,
                }
            })
            .collect()
    };

    let mut hits = Vec::new();
    for a in &bodies {
        for b in &bodies {
            if a.team == b.team {
                continue;
            }
            let gap = a.position.distance(b.position) - b.radius;
            if let Some(dmg) = a.petal_damage {
                if gap <= a.radius + ENGAGE_STANDOFF + ENGAGE_BAND && dmg > 0.0 {
                    hits.push((b.entity, a.entity, dmg));
                }
            }
            if a.is_mob && !b.is_mob && gap <= a.radius {
                hits.push((b.entity, a.entity, MOB_CONTACT_DAMAGE));
            }
        }
    }

    for (target, attacker, amount) in hits {
        damage_entity(world, content, target, attacker, amount);
    }
}

/// Passive regeneration plus the continuous heal of equipped items.
fn system_regen(world: &mut World, content: &Content) {
    let mut q = world.query_filtered::<(&mut Health, &Loadout), Without<Dead>>();
    for (mut health, loadout) in q.iter_mut(world) {
        let heal: f32 = loadout
            .active()
            .iter()
            .flatten()
            .filter_map(|id| content.items.get(*id))
            .map(|d| d.constant_heal)
            .sum();
        health.current = (health.current + BASE_REGEN + heal).min(health.max);
    }
}

/// Move collectable drops into the first empty slot of a touching player.
fn system_pickup(world: &mut World) {
    let drops: Vec<(Entity, u64, ItemId, Vec2)> = {
        let mut q = world.query_filtered::<(Entity, &EntityId, &Drop, &Position, &Immunity), Without<Dead>>();
        q.iter(world)
            .filter(|(.., immunity)| immunity.0 == 0)
            .map(|(e, eid, drop, pos, _)| (e, eid.runtime_id, drop.0, pos.0))
            .collect()
    };
    if drops.is_empty() {
        return;
    }

    let mut events = Vec::new();
    let mut q = world.query_filtered::<(&EntityId, &Position, &Radius, &mut Loadout), (With<Player>, Without<Dead>)>();
    let mut collected = Vec::new();
    for (drop, _, item, drop_pos) in drops {
        for (eid, pos, radius, mut loadout) in q.iter_mut(world) {
            if pos.0.distance(drop_pos) > radius.0 + DROP_RADIUS {
                continue;
            }
            let Some(slot) = loadout.first_empty() else {
                continue;
            };
            loadout.set(slot, Some(item));
            events.push(GameEvent::ItemCollected {
                runtime_id: eid.runtime_id,
                item,
                slot,
            });
            collected.push(drop);
            break;
        }
    }

    for drop in collected {
        world.despawn(drop);
    }
    world.resource_mut::<OutgoingEvents>().events.extend(events);
}

/// Remove drops nobody picked up in time.
fn system_drop_expiry(world: &mut World, lifetime: u64) {
    let expired: Vec<(Entity, u64, ItemId)> = world
        .query::<(Entity, &EntityId, &Drop, &Lifetime)>()
        .iter(world)
        .filter(|(.., life)| life.0 >= lifetime)
        .map(|(e, eid, drop, _)| (e, eid.runtime_id, drop.0))
        .collect();

    for (entity, runtime_id, item) in expired {
        world.resource_mut::<ItemTracker>().remove(item);
        world
            .resource_mut::<OutgoingEvents>()
            .events
            .push(GameEvent::DropExpired { runtime_id, item });
        world.despawn(entity);
    }
}

/// Despawn dead entities. Creatures may leave loot; players release every
/// item they held and take their camera with them.
fn system_cleanup_dead(world: &mut World, content: &Content, config: &WorldConfig, rng: &mut StdRng) {
    let dead: Vec<(Entity, Vec2, Option<CreatureId>, Option<Entity>)> = world
        .query_filtered::<(Entity, Option<&Position>, Option<&Mob>, Option<&CameraLink>), With<Dead>>()
        .iter(world)
        .map(|(e, pos, mob, cam)| (e, pos.map_or(Vec2::ZERO, |p| p.0), mob.map(|m| m.0), cam.map(|c| c.0)))
        .collect();

    for (entity, position, creature, camera) in dead {
        if let Some(id) = creature {
            let drops = content.creatures.get(id).map(|d| d.drops.as_slice()).unwrap_or(&[]);
            if !drops.is_empty() && rng.gen::<f32>() < config.loot_chance {
                let item = drops[rng.gen_range(0..drops.len())];
                if let Err(e) = spawn_drop(world, content, item, position) {
                    debug!(error = %e, "loot skipped");
                }
            }
        }

        let released: Vec<ItemId> = {
            let loadout = world.get::<Loadout>(entity);
            let deleted = world.get::<DeletedItemLog>(entity);
            loadout
                .map(|l| l.all().iter().flatten().copied().collect::<Vec<_>>())
                .unwrap_or_default()
                .into_iter()
                .chain(deleted.map(|d| d.as_slice().to_vec()).unwrap_or_default())
                .collect()
        };
        if !released.is_empty() {
            let mut tracker = world.resource_mut::<ItemTracker>();
            for item in released {
                tracker.remove(item);
            }
        }

        world.despawn(entity);
        if let Some(camera) = camera {
            world.despawn(camera);
        }
    }
}

fn system_thought_countdown(world: &mut World) {
    let mut q = world.query::<&mut Thought>();
    for mut thought in q.iter_mut(world) {
        thought.tick();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{creatures, items};

    fn quiet_world() -> GameWorld {
        let mut gw = GameWorld::with_seed(3);
        // no natural spawning unless a test asks for it
        gw.world_config.spawn.interval_ticks = u64::MAX;
        gw
    }

    #[test]
    fn game_world_new() {
        let gw = GameWorld::with_seed(1);
        assert_eq!(gw.current_tick(), 0);
        assert_eq!(gw.world.resource::<EntityIdAllocator>().current(), 1);
        assert_eq!(gw.tracker().total(), 0);
    }

    #[test]
    fn spawn_bot_grants_basics() {
        let mut gw = quiet_world();
        let bot = gw.spawn_bot("alpha", Vec2::new(500.0, 500.0));
        let loadout = gw.world.get::<Loadout>(bot.player).unwrap();
        assert_eq!(loadout.active_count(), 5);
        assert!(loadout.active().iter().all(|s| *s == Some(items::BASIC)));
        assert_eq!(gw.tracker().count(items::BASIC), 5);
        assert_eq!(gw.world.get::<CameraLink>(bot.player).map(|c| c.0), Some(bot.camera));
        assert_eq!(gw.bot_count(), 1);
    }

    #[test]
    fn unknown_ids_are_errors() {
        let mut gw = quiet_world();
        assert!(matches!(
            gw.spawn_creature(CreatureId(200), Vec2::ZERO),
            Err(GameError::UnknownCreature(200))
        ));
        assert!(matches!(
            gw.spawn_drop(ItemId(0), Vec2::ZERO),
            Err(GameError::UnknownItem(0))
        ));
        assert_eq!(gw.tracker().total(), 0);
    }

    #[test]
    fn spawn_point_falls_inside_zone() {
        let mut gw = quiet_world();
        let p = gw.spawn_point(2).unwrap();
        assert_eq!(gw.content.zones.zone_at(p).map(|z| z.difficulty), Some(2));
        assert_eq!(gw.spawn_point(42), Err(GameError::NoZone(42)));
    }

    #[test]
    fn damage_records_attacker_and_kills() {
        let mut gw = quiet_world();
        let bot = gw.spawn_bot("alpha", Vec2::new(500.0, 500.0));
        let bee = gw.spawn_creature(creatures::BEE, Vec2::new(600.0, 500.0)).unwrap();

        assert_eq!(gw.damage_entity(bee, bot.player, 5.0), Some(10.0));
        let ring = gw.world.get::<RecentDamage>(bee).unwrap();
        assert_eq!(ring.slots()[0].map(|r| r.attacker), Some(bot.player));

        assert_eq!(gw.damage_entity(bee, bot.player, 50.0), Some(0.0));
        assert!(gw.world.get::<Dead>(bee).is_some());
        assert_eq!(gw.damage_entity(bee, bot.player, 1.0), None);
        assert_eq!(gw.world.get::<Score>(bot.player).map(|s| s.0), Some(15));
    }

    #[test]
    fn spawn_immunity_blocks_damage() {
        let mut gw = quiet_world();
        let a = gw.spawn_bot("alpha", Vec2::new(500.0, 500.0));
        let b = gw.spawn_bot("beta", Vec2::new(900.0, 500.0));
        assert_eq!(gw.damage_entity(a.player, b.player, 5.0), None);
    }

    #[test]
    fn dead_creature_leaves_tracked_loot() {
        let mut gw = quiet_world();
        gw.world_config.loot_chance = 1.0;
        let bot = gw.spawn_bot("alpha", Vec2::new(500.0, 500.0));
        let rock = gw.spawn_creature(creatures::ROCK, Vec2::new(3000.0, 1500.0)).unwrap();
        gw.damage_entity(rock, bot.player, 1000.0);
        gw.tick();

        assert!(!gw.world.entities().contains(rock));
        let drops: Vec<ItemId> = gw.world.query::<&Drop>().iter(&gw.world).map(|d| d.0).collect();
        assert_eq!(drops.len(), 1);
        assert!(drops[0] == items::BASIC || drops[0] == items::HEAVY);
        assert_eq!(gw.tracker().count(drops[0]), if drops[0] == items::BASIC { 6 } else { 1 });
    }

    #[test]
    fn orbit_heading_belongs_to_orbit_system() {
        let mut gw = quiet_world();
        let bot = gw.spawn_bot("alpha", Vec2::new(500.0, 500.0));
        for _ in 0..5 {
            gw.tick();
        }
        let heading = gw.world.get::<OrbitHeading>(bot.player).unwrap().0;
        assert!((heading - 5.0 * ORBIT_SPEED).abs() < 1e-5);
    }

    #[test]
    fn pickup_fills_first_empty_slot() {
        let mut gw = quiet_world();
        let bot = gw.spawn_bot("alpha", Vec2::new(500.0, 500.0));
        let drop = gw.spawn_drop(items::MOON, Vec2::new(505.0, 500.0)).unwrap();
        gw.world.get_mut::<Immunity>(drop).unwrap().0 = 0;
        let total_before = gw.tracker().total();

        system_pickup(&mut gw.world);

        let loadout = gw.world.get::<Loadout>(bot.player).unwrap();
        assert_eq!(loadout.get(5), Some(items::MOON));
        assert!(!gw.world.entities().contains(drop));
        assert_eq!(gw.tracker().total(), total_before);
    }

    #[test]
    fn expired_drop_releases_tracker() {
        let mut gw = quiet_world();
        gw.world_config.drop_lifetime_secs = 0.1;
        gw.spawn_drop(items::WING, Vec2::new(3000.0, 1000.0)).unwrap();
        assert_eq!(gw.tracker().count(items::WING), 1);
        for _ in 0..3 {
            gw.tick();
        }
        assert_eq!(gw.tracker().count(items::WING), 0);
        assert!(gw
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::DropExpired { item, .. } if *item == items::WING)));
    }

    #[test]
    fn overlevel_timer_grows_only_in_easy_zones() {
        let mut gw = quiet_world();
        let bot = gw.spawn_bot("alpha", Vec2::new(500.0, 500.0));
        gw.world.get_mut::<Score>(bot.player).unwrap().0 = 8410;
        system_timers(&mut gw.world, &gw.content, &gw.bot_config);
        system_timers(&mut gw.world, &gw.content, &gw.bot_config);
        assert_eq!(gw.world.get::<OverlevelTimer>(bot.player).unwrap().0, 2.0);

        gw.world.get_mut::<Position>(bot.player).unwrap().0 = Vec2::new(10000.0, 1000.0);
        system_timers(&mut gw.world, &gw.content, &gw.bot_config);
        assert_eq!(gw.world.get::<OverlevelTimer>(bot.player).unwrap().0, 0.0);
    }

    #[test]
    fn overlevel_timer_is_capped_at_deadline() {
        let mut gw = quiet_world();
        let bot = gw.spawn_bot("alpha", Vec2::new(500.0, 500.0));
        gw.world.get_mut::<Score>(bot.player).unwrap().0 = 8410;
        gw.world.get_mut::<OverlevelTimer>(bot.player).unwrap().0 = 1000.0;
        system_timers(&mut gw.world, &gw.content, &gw.bot_config);
        assert_eq!(
            gw.world.get::<OverlevelTimer>(bot.player).unwrap().0,
            gw.bot_config.overlevel_deadline()
        );
    }

    #[test]
    fn thought_set_by_bot_counts_down() {
        let mut gw = quiet_world();
        let bot = gw.spawn_bot("alpha", Vec2::new(500.0, 500.0));
        gw.tick();
        let thought = gw.world.get::<Thought>(bot.player).unwrap();
        assert!(!thought.text.is_empty());
        // set to thought_ticks, then counted down once in the same tick
        assert_eq!(thought.timer, gw.bot_config.thought_ticks() - 1);
    }

    #[test]
    fn dead_bot_releases_items_and_camera() {
        let mut gw = quiet_world();
        let bot = gw.spawn_bot("alpha", Vec2::new(500.0, 500.0));
        gw.world.get_mut::<Immunity>(bot.player).unwrap().0 = 0;
        let bee = gw.spawn_creature(creatures::BEE, Vec2::new(3000.0, 1500.0)).unwrap();
        gw.damage_entity(bot.player, bee, 1000.0);
        gw.tick();

        assert_eq!(gw.bot_count(), 0);
        assert!(!gw.world.entities().contains(bot.camera));
        assert_eq!(gw.tracker().count(items::BASIC), 0);
    }

    #[test]
    fn long_run_keeps_tracker_consistent() {
        let mut gw = GameWorld::with_seed(99);
        gw.world_config.spawn.interval_ticks = 5;
        gw.world_config.drop_lifetime_secs = 5.0;
        for i in 0..4 {
            gw.spawn_bot(&format!("bot{i}"), Vec2::new(300.0 + 800.0 * i as f32, 1000.0));
        }
        for _ in 0..600 {
            gw.tick();
            assert_eq!(gw.tracker().total(), gw.outstanding_items());
        }
        gw.drain_events();
    }
}
