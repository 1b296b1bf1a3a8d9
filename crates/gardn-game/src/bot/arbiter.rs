//! Per-tick decision entry point.
//!
//! `tick_bot` is a pure re-decision from the bot's current state and the
//! tick's world snapshot. It runs inventory housekeeping, scores every
//! behaviour category, attempts the winner, and falls straight back to the
//! default behaviour when the winner cannot act. Exactly one [`Steering`]
//! comes out of every call.

use bevy_ecs::prelude::Entity;
use glam::Vec2;
use rand::Rng;
use tracing::trace;

use crate::components::{DeletedItemLog, Health, InputFlags, Loadout, RecentDamage, Team};
use crate::content::{loadout_slots_at_level, score_to_level, Content};
use crate::spatial::SpatialQuery;
use crate::tracker::ItemTracker;

use super::config::BotConfig;
use super::inventory::{self, WorstSlots};
use super::movement::{self, Steering, WanderInput};
use super::priorities::{BehaviorCategory, PriorityScores, PrioritySignals};
use super::scoring::Appraiser;
use super::targeting::{self, Target};

/// The slice of a bot entity the engine reads and mutates.
#[derive(Debug, Clone)]
pub struct BotState {
    pub entity: Entity,
    pub runtime_id: u64,
    pub position: Vec2,
    pub facing: f32,
    pub radius: f32,
    pub health: Health,
    pub score: u32,
    pub team: Team,
    pub overlevel_timer: f32,
    pub lifetime: u64,
    pub ai_tick: u64,
    pub loadout: Loadout,
    pub deleted: DeletedItemLog,
    pub recent_damage: RecentDamage,
}

/// Read-only inputs shared by every bot in a tick.
pub struct BotContext<'a> {
    pub content: &'a Content,
    pub config: &'a BotConfig,
    pub world: &'a dyn SpatialQuery,
    /// Current simulation tick, the clock damage records are stamped with.
    pub now: u64,
}

/// What the bot decided to do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAction {
    Escape,
    SeekHealDrop,
    HuntHealer,
    Retaliate,
    CollectUpgrade,
    CollectDrop,
    HuntMob,
    HuntPlayer,
    Skirmish,
    Wander,
    March,
    Relocate,
}

impl BotAction {
    /// Short text shown above the bot.
    pub fn thought(self) -> &'static str {
        match self {
            Self::Escape => "Too strong for this place",
            Self::SeekHealDrop => "Grabbing something to heal",
            Self::HuntHealer => "Hunting for healing",
            Self::Retaliate => "You hit me!",
            Self::CollectUpgrade => "Ooh, an upgrade",
            Self::CollectDrop => "Picking that up",
            Self::HuntMob => "Hunting",
            Self::HuntPlayer => "Looking for a fight",
            Self::Skirmish => "Get out of my way",
            Self::Wander => "Exploring",
            Self::March => "Marching on",
            Self::Relocate => "Heading somewhere harder",
        }
    }
}

/// Outcome of one tick.
#[derive(Debug, Clone, Copy)]
pub struct BotDecision {
    /// Winning category, `None` when every priority was zero.
    pub category: Option<BehaviorCategory>,
    pub scores: PriorityScores,
    pub action: BotAction,
    pub steering: Steering,
}

/// Everything the finders turned up this tick.
struct Survey {
    worst: WorstSlots,
    best_drop: Option<Target>,
    nearest_mob: Option<Target>,
    nearest_player: Option<Target>,
    attacker: Option<Entity>,
}

pub fn tick_bot(
    state: &mut BotState,
    ctx: &BotContext,
    tracker: &mut ItemTracker,
    rng: &mut impl Rng,
) -> BotDecision {
    let config = ctx.config;
    let appraiser = Appraiser::new(&ctx.content.items, config.scoring.policy());

    // Inventory housekeeping.
    state
        .loadout
        .set_active_count(loadout_slots_at_level(score_to_level(state.score)));
    if state.ai_tick % config.rebalance_interval_ticks() == 0 {
        inventory::rebalance_loadout(&mut state.loadout, &appraiser);
        inventory::maybe_trash_unwanted(&mut state.loadout, &mut state.deleted, tracker, &appraiser);
    }
    let granted = inventory::ensure_basics_if_empty(&mut state.loadout, ctx.content.default_item);
    for _ in 0..granted {
        tracker.add(ctx.content.default_item);
    }
    inventory::promote_highest_rarity_once(&mut state.loadout, &appraiser);

    let survey = survey(state, ctx, &appraiser);
    let scores = PriorityScores::evaluate(&PrioritySignals {
        overlevel_timer: state.overlevel_timer,
        overlevel_deadline: config.overlevel_deadline(),
        health: state.health,
        has_live_attacker: survey.attacker.is_some(),
        best_drop_score: survey.best_drop.map_or(0.0, |t| t.metric),
        worst_active_score: survey.worst.active_score(),
        mob_in_range: survey.nearest_mob.is_some(),
        player_in_range: survey.nearest_player.is_some(),
    });

    let category = scores.winner();
    let attempted = match category {
        Some(c) => attempt(c, state, ctx, tracker, &appraiser, &survey, rng),
        None => None,
    };
    let (action, steering) = match attempted {
        Some(done) => done,
        None => fallback(state, ctx, &survey, rng),
    };

    trace!(
        runtime_id = state.runtime_id,
        category = category.map(BehaviorCategory::label),
        ?action,
        "bot decision"
    );

    state.ai_tick += 1;
    BotDecision {
        category,
        scores,
        action,
        steering,
    }
}

fn survey(state: &BotState, ctx: &BotContext, appraiser: &Appraiser) -> Survey {
    let radius = ctx.config.search_radius;
    Survey {
        worst: inventory::worst_slots(&state.loadout, appraiser),
        best_drop: targeting::find_best_drop(ctx.world, state.position, radius, appraiser),
        nearest_mob: targeting::find_nearest_mob(ctx.world, state.position, radius, state.team),
        nearest_player: targeting::find_nearest_player(
            ctx.world,
            state.position,
            radius,
            state.team,
        ),
        attacker: targeting::select_retaliation_target(
            &state.recent_damage,
            ctx.now,
            ctx.config.retaliation_window_ticks(),
            ctx.world,
        ),
    }
}

/// Try to act on `category`. `None` means its preconditions failed.
fn attempt(
    category: BehaviorCategory,
    state: &mut BotState,
    ctx: &BotContext,
    tracker: &mut ItemTracker,
    appraiser: &Appraiser,
    survey: &Survey,
    rng: &mut impl Rng,
) -> Option<(BotAction, Steering)> {
    let accel = ctx.config.acceleration;

    match category {
        BehaviorCategory::OverlevelEscape => {
            let dest = movement::relocation_target(state.position, state.score, &ctx.content.zones)?;
            Some((BotAction::Escape, movement::relocate(state.position, dest, accel)))
        }
        BehaviorCategory::Healing => {
            inventory::ensure_heal_equipped(&mut state.loadout, appraiser);
            let radius = ctx.config.search_radius;
            if let Some(drop) = targeting::find_best_heal_drop(ctx.world, state.position, radius, appraiser) {
                let worst = inventory::worst_slots(&state.loadout, appraiser);
                if inventory::try_ensure_space(
                    &mut state.loadout,
                    &mut state.deleted,
                    tracker,
                    appraiser,
                    drop.metric,
                    worst,
                ) {
                    let s = movement::seek(state.position, drop.position, accel, InputFlags::empty());
                    return Some((BotAction::SeekHealDrop, s));
                }
            }
            let mob = targeting::find_nearest_heal_mob(
                ctx.world,
                state.position,
                radius,
                state.team,
                &ctx.content.creatures,
                appraiser,
            )?;
            Some((BotAction::HuntHealer, engage(state, mob.position, accel, rng)))
        }
        BehaviorCategory::Retaliation => {
            let attacker = ctx.world.get(survey.attacker?)?;
            Some((BotAction::Retaliate, engage(state, attacker.position, accel, rng)))
        }
        BehaviorCategory::UpgradeDrop | BehaviorCategory::ObtainDrop => {
            let drop = survey.best_drop?;
            let made_room = inventory::try_ensure_space(
                &mut state.loadout,
                &mut state.deleted,
                tracker,
                appraiser,
                drop.metric,
                survey.worst,
            );
            if !made_room {
                return None;
            }
            let action = if category == BehaviorCategory::UpgradeDrop {
                BotAction::CollectUpgrade
            } else {
                BotAction::CollectDrop
            };
            let s = movement::seek(state.position, drop.position, accel, InputFlags::empty());
            Some((action, s))
        }
        BehaviorCategory::AggroMobs => {
            let mob = survey.nearest_mob?;
            Some((BotAction::HuntMob, engage(state, mob.position, accel, rng)))
        }
        BehaviorCategory::TargetPlayers => {
            let player = survey.nearest_player?;
            Some((BotAction::HuntPlayer, engage(state, player.position, accel, rng)))
        }
    }
}

fn engage(state: &BotState, target: Vec2, accel: f32, rng: &mut impl Rng) -> Steering {
    movement::engage(state.position, state.radius, state.runtime_id, target, accel, rng)
}

/// Default behaviour: skirmish with a close mob, else wander (or march),
/// then give zone relocation the last word.
fn fallback(
    state: &BotState,
    ctx: &BotContext,
    survey: &Survey,
    rng: &mut impl Rng,
) -> (BotAction, Steering) {
    let config = ctx.config;
    let accel = config.acceleration;

    let skirmish = survey
        .nearest_mob
        .filter(|m| m.metric < config.skirmish_radius);

    let mut chosen = if let Some(mob) = skirmish {
        (BotAction::Skirmish, engage(state, mob.position, accel, rng))
    } else if config.wander {
        let threat = targeting::find_nearest_threat(
            ctx.world,
            state.position,
            config.threat_outer_radius,
            state.team,
        );
        let input = WanderInput {
            position: state.position,
            facing: state.facing,
            runtime_id: state.runtime_id,
            lifetime: state.lifetime,
            threat: threat.map(|t| t.position),
        };
        (BotAction::Wander, movement::wander(&input, config))
    } else {
        (BotAction::March, movement::idle_march(accel))
    };

    if let Some(dest) = movement::relocation_target(state.position, state.score, &ctx.content.zones) {
        if movement::relocation_roll(state.overlevel_timer, config.overlevel_deadline(), rng) {
            chosen = (BotAction::Relocate, movement::relocate(state.position, dest, accel));
        }
    }

    chosen
}
