//! Steering primitives: orbit engagement, straight seeking, zone relocation,
//! idle march and threat-aware wandering.
//!
//! Every primitive returns a [`Steering`] instead of writing to the entity;
//! the arbiter commits exactly one per tick.

use std::f32::consts::{PI, SQRT_2, TAU};

use glam::Vec2;
use rand::Rng;

use crate::components::InputFlags;
use crate::content::{score_to_level, ZoneTable};

use super::config::BotConfig;

/// Stand-off distance beyond the bot's own radius when orbiting a target.
pub const ENGAGE_STANDOFF: f32 = 100.0;
/// Half width of the orbit band around the stand-off distance.
pub const ENGAGE_BAND: f32 = 25.0;
/// Fraction of full acceleration used while strafing around a target.
pub const ORBIT_STRAFE_FACTOR: f32 = 0.8;
/// Fraction of full acceleration used by idle movement.
pub const IDLE_SPEED_FACTOR: f32 = 0.6;

/// Repulsion weight inside the inner threat radius.
const INNER_REPULSION: f32 = 2.0;
/// Peak repulsion weight at the inner edge of the outer ring.
const OUTER_REPULSION: f32 = 0.75;

/// One committed movement outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    pub acceleration: Vec2,
    /// Movement-facing angle in radians.
    pub angle: f32,
    pub input: InputFlags,
}

/// Angle of `v` in radians, 0 along +x.
pub fn heading_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Step `current` toward `target` by at most `max_step` radians along the
/// shorter arc.
pub fn approach_angle(current: f32, target: f32, max_step: f32) -> f32 {
    let mut diff = (target - current) % TAU;
    if diff > PI {
        diff -= TAU;
    } else if diff < -PI {
        diff += TAU;
    }
    current + diff.clamp(-max_step, max_step)
}

fn along(v: Vec2, magnitude: f32) -> Vec2 {
    v.normalize_or_zero() * magnitude
}

/// Orbit `target` at the stand-off distance with the attack flag held.
///
/// Outside the band the bot closes in or backs off at full acceleration;
/// inside it the bot strafes, clockwise or counter-clockwise depending on
/// the parity of its runtime id.
pub fn engage(
    me: Vec2,
    radius: f32,
    runtime_id: u64,
    target: Vec2,
    acceleration: f32,
    rng: &mut impl Rng,
) -> Steering {
    let delta = target - me;
    let dist = delta.length();

    let accel = if dist == 0.0 {
        Vec2::from_angle(rng.gen_range(0.0..TAU)) * acceleration
    } else {
        let desired = radius + ENGAGE_STANDOFF;
        let dir = delta / dist;
        if dist > desired + ENGAGE_BAND {
            dir * acceleration
        } else if dist < desired - ENGAGE_BAND {
            -dir * acceleration
        } else {
            let orbit_sign = if runtime_id % 2 == 0 { 1.0 } else { -1.0 };
            dir.perp() * (acceleration * ORBIT_STRAFE_FACTOR * orbit_sign)
        }
    };

    Steering {
        acceleration: accel,
        angle: heading_of(accel),
        input: InputFlags::ATTACKING,
    }
}

/// Head straight for `target` at full acceleration.
pub fn seek(me: Vec2, target: Vec2, acceleration: f32, input: InputFlags) -> Steering {
    let accel = along(target - me, acceleration);
    Steering {
        acceleration: accel,
        angle: heading_of(accel),
        input,
    }
}

/// Constant rightward march with no input held.
pub fn idle_march(acceleration: f32) -> Steering {
    Steering {
        acceleration: Vec2::X * (acceleration * IDLE_SPEED_FACTOR),
        angle: 0.0,
        input: InputFlags::empty(),
    }
}

/// Centroid of the zone a bot at `position` with `score` should move to, or
/// `None` if its current zone is already hard enough.
pub fn relocation_target(position: Vec2, score: u32, zones: &ZoneTable) -> Option<Vec2> {
    let desired = zones.difficulty_at_level(score_to_level(score));
    let current = zones.zone_at(position)?;
    if current.difficulty >= desired {
        return None;
    }
    zones.suitable_zone(desired).map(|z| z.center())
}

/// Whether to relocate this tick. Certain once the overlevel timer passes
/// half the deadline, otherwise a 20% chance.
pub fn relocation_roll(overlevel_timer: f32, deadline: f32, rng: &mut impl Rng) -> bool {
    let eager = if overlevel_timer > 0.5 * deadline {
        1.0
    } else {
        0.2
    };
    rng.gen::<f32>() < eager
}

/// Head for a relocation point with the attack flag cleared.
pub fn relocate(me: Vec2, destination: Vec2, acceleration: f32) -> Steering {
    seek(me, destination, acceleration, InputFlags::empty())
}

/// Everything the wander controller reads.
#[derive(Debug, Clone, Copy)]
pub struct WanderInput {
    pub position: Vec2,
    pub facing: f32,
    pub runtime_id: u64,
    pub lifetime: u64,
    /// Position of the nearest hostile within the outer threat radius.
    pub threat: Option<Vec2>,
}

/// Desired heading before turn-rate limiting.
///
/// Two sinusoids at incommensurate frequencies give a smooth pseudo-random
/// heading that depends only on the runtime id and lifetime.
pub fn wander_heading(input: &WanderInput, config: &BotConfig) -> f32 {
    let t = input.lifetime as f32 / config.tps.max(1) as f32;
    let seed = (input.runtime_id % 4096) as f32;
    let phase_a = seed * 0.618_034;
    let phase_b = seed * 1.324_718;
    let noise = 1.3 * (0.37 * t + phase_a).sin() + 0.9 * (0.37 * SQRT_2 * t + phase_b).sin();

    let mut desired = Vec2::from_angle(noise) + Vec2::X * config.wander_bias;

    if let Some(threat) = input.threat {
        let away = input.position - threat;
        let d = away.length();
        let inner = config.threat_inner_radius;
        let outer = config.threat_outer_radius.max(inner);
        let weight = if d < inner {
            INNER_REPULSION
        } else if d < outer && outer > inner {
            OUTER_REPULSION * (outer - d) / (outer - inner)
        } else {
            0.0
        };
        desired += away.normalize_or_zero() * weight;
    }

    if desired.length_squared() < 1e-6 {
        return input.facing;
    }
    heading_of(desired)
}

/// Biased, threat-aware wander at reduced speed. Only the movement-facing
/// angle is produced; orbit state is left to the combat system.
pub fn wander(input: &WanderInput, config: &BotConfig) -> Steering {
    let target = wander_heading(input, config);
    let angle = approach_angle(input.facing, target, config.max_turn_rate);
    Steering {
        acceleration: Vec2::from_angle(angle) * (config.acceleration * IDLE_SPEED_FACTOR),
        angle,
        input: InputFlags::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Content;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn engage_closes_distance_when_far() {
        let s = engage(Vec2::ZERO, 25.0, 2, Vec2::new(500.0, 0.0), 5.0, &mut rng());
        assert!((s.acceleration - Vec2::new(5.0, 0.0)).length() < 1e-4);
        assert!(s.input.contains(InputFlags::ATTACKING));
        assert!(s.angle.abs() < 1e-4);
    }

    #[test]
    fn engage_backs_off_when_close() {
        let s = engage(Vec2::ZERO, 25.0, 2, Vec2::new(50.0, 0.0), 5.0, &mut rng());
        assert!((s.acceleration - Vec2::new(-5.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn engage_orbit_direction_follows_id_parity() {
        // desired 125, band [100, 150]
        let even = engage(Vec2::ZERO, 25.0, 2, Vec2::new(125.0, 0.0), 5.0, &mut rng());
        let odd = engage(Vec2::ZERO, 25.0, 3, Vec2::new(125.0, 0.0), 5.0, &mut rng());
        assert!((even.acceleration - Vec2::new(0.0, 4.0)).length() < 1e-4);
        assert!((odd.acceleration - Vec2::new(0.0, -4.0)).length() < 1e-4);
    }

    #[test]
    fn engage_on_top_of_target_picks_random_direction() {
        let s = engage(Vec2::ONE, 25.0, 1, Vec2::ONE, 5.0, &mut rng());
        assert!((s.acceleration.length() - 5.0).abs() < 1e-3);
    }

    #[test]
    fn idle_march_goes_right() {
        let s = idle_march(5.0);
        assert_eq!(s.acceleration, Vec2::new(3.0, 0.0));
        assert_eq!(s.angle, 0.0);
        assert!(s.input.is_empty());
    }

    #[test]
    fn relocation_only_when_underlevelled_zone() {
        let c = Content::builtin();
        assert_eq!(relocation_target(Vec2::new(100.0, 100.0), 0, &c.zones), None);
        // level 30 -> difficulty 2 -> Ant Hell centroid
        let dest = relocation_target(Vec2::new(100.0, 100.0), 8410, &c.zones);
        assert_eq!(dest, Some(Vec2::new(10000.0, 1000.0)));
        // already in a harder zone than needed
        assert_eq!(relocation_target(Vec2::new(13000.0, 100.0), 8410, &c.zones), None);
    }

    #[test]
    fn relocate_clears_input() {
        let s = relocate(Vec2::ZERO, Vec2::new(0.0, 10.0), 5.0);
        assert!(s.input.is_empty());
        assert!((s.acceleration - Vec2::new(0.0, 5.0)).length() < 1e-4);
    }

    #[test]
    fn relocation_eagerness() {
        let mut r = rng();
        assert!((0..100).all(|_| relocation_roll(150.0, 200.0, &mut r)));
        let hits = (0..2000).filter(|_| relocation_roll(0.0, 200.0, &mut r)).count();
        assert!((200..600).contains(&hits), "hits = {hits}");
    }

    #[test]
    fn approach_angle_takes_short_arc() {
        assert!((approach_angle(0.0, 0.05, 0.12) - 0.05).abs() < 1e-6);
        assert!((approach_angle(0.0, 1.0, 0.12) - 0.12).abs() < 1e-6);
        // from just below +pi to just above -pi is a small positive step
        let a = approach_angle(3.1, -3.1, 0.12);
        assert!(a > 3.1 && a <= 3.1 + 0.12 + 1e-6);
    }

    fn input(lifetime: u64) -> WanderInput {
        WanderInput {
            position: Vec2::new(1000.0, 1000.0),
            facing: 0.0,
            runtime_id: 42,
            lifetime,
            threat: None,
        }
    }

    #[test]
    fn wander_is_deterministic_and_turn_limited() {
        let cfg = BotConfig::default();
        let a = wander(&input(500), &cfg);
        let b = wander(&input(500), &cfg);
        assert_eq!(a, b);
        assert!(a.angle.abs() <= cfg.max_turn_rate + 1e-6);
        assert!((a.acceleration.length() - cfg.acceleration * IDLE_SPEED_FACTOR).abs() < 1e-4);
        assert!(a.input.is_empty());
    }

    #[test]
    fn wander_heading_is_smooth_over_time() {
        let cfg = BotConfig::default();
        let mut prev = Vec2::from_angle(wander_heading(&input(0), &cfg));
        for t in 1..400 {
            let cur = Vec2::from_angle(wander_heading(&input(t), &cfg));
            let step = prev.perp_dot(cur).atan2(prev.dot(cur));
            assert!(step.abs() < 0.2, "jump at tick {t}");
            prev = cur;
        }
    }

    #[test]
    fn wander_pushes_away_from_close_threat() {
        let cfg = BotConfig::default();
        let mut inp = input(123);
        inp.threat = Some(inp.position + Vec2::new(50.0, 0.0));
        let h = wander_heading(&inp, &cfg);
        assert!(h.cos() < 0.0, "heading {h} should point away from the threat");
    }
}
