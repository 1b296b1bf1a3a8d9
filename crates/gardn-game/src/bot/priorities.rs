//! Per-tick utility scores for each behaviour category.
//!
//! Every score lies in `[0, 1]` and is recomputed from scratch each tick.
//! The winner is the strict maximum; ties go to the category listed first
//! in [`BehaviorCategory::ORDER`].

use crate::components::Health;

/// Margin by which a drop must beat the worst active item to count as an
/// upgrade.
pub const UPGRADE_MARGIN: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorCategory {
    OverlevelEscape,
    Healing,
    Retaliation,
    UpgradeDrop,
    ObtainDrop,
    AggroMobs,
    TargetPlayers,
}

impl BehaviorCategory {
    /// Evaluation order, which is also the tie-break order.
    pub const ORDER: [BehaviorCategory; 7] = [
        Self::OverlevelEscape,
        Self::Healing,
        Self::Retaliation,
        Self::UpgradeDrop,
        Self::ObtainDrop,
        Self::AggroMobs,
        Self::TargetPlayers,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::OverlevelEscape => "overlevel_escape",
            Self::Healing => "healing",
            Self::Retaliation => "retaliation",
            Self::UpgradeDrop => "upgrade_drop",
            Self::ObtainDrop => "obtain_drop",
            Self::AggroMobs => "aggro_mobs",
            Self::TargetPlayers => "target_players",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

pub fn priority_overlevel_escape(timer: f32, deadline: f32) -> f32 {
    if deadline <= 0.0 {
        return 0.0;
    }
    (timer / deadline).clamp(0.0, 1.0) * 0.9
}

pub fn priority_healing(health: &Health) -> f32 {
    if health.max <= 0.0 {
        return 0.0;
    }
    ((1.0 - health.current / health.max) * 0.9).clamp(0.0, 0.9)
}

pub fn priority_retaliation(has_live_attacker: bool) -> f32 {
    if has_live_attacker {
        0.8
    } else {
        0.0
    }
}

pub fn priority_upgrade_drop(best_drop_score: f32, worst_active_score: f32) -> f32 {
    if best_drop_score > worst_active_score + UPGRADE_MARGIN {
        0.9
    } else {
        0.0
    }
}

/// Graded fallback for picking up drops. Zero when there is no drop.
pub fn priority_obtain_drop(best_drop_score: f32, worst_active_score: f32) -> f32 {
    if best_drop_score <= 0.0 {
        return 0.0;
    }
    ((best_drop_score - worst_active_score) / 10.0).clamp(0.0, 1.0)
}

pub fn priority_aggro_mobs(mob_in_range: bool) -> f32 {
    if mob_in_range {
        0.7
    } else {
        0.0
    }
}

pub fn priority_target_players(player_in_range: bool) -> f32 {
    if player_in_range {
        0.6
    } else {
        0.0
    }
}

/// Inputs the evaluator needs, gathered by the arbiter.
#[derive(Debug, Clone, Copy)]
pub struct PrioritySignals {
    pub overlevel_timer: f32,
    pub overlevel_deadline: f32,
    pub health: Health,
    pub has_live_attacker: bool,
    /// Score of the best visible drop, 0 when there is none.
    pub best_drop_score: f32,
    pub worst_active_score: f32,
    pub mob_in_range: bool,
    pub player_in_range: bool,
}

/// One score per category, indexed by [`BehaviorCategory`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriorityScores([f32; 7]);

impl PriorityScores {
    pub fn evaluate(s: &PrioritySignals) -> Self {
        let mut scores = [0.0; 7];
        scores[BehaviorCategory::OverlevelEscape.index()] =
            priority_overlevel_escape(s.overlevel_timer, s.overlevel_deadline);
        scores[BehaviorCategory::Healing.index()] = priority_healing(&s.health);
        scores[BehaviorCategory::Retaliation.index()] = priority_retaliation(s.has_live_attacker);
        scores[BehaviorCategory::UpgradeDrop.index()] =
            priority_upgrade_drop(s.best_drop_score, s.worst_active_score);
        scores[BehaviorCategory::ObtainDrop.index()] =
            priority_obtain_drop(s.best_drop_score, s.worst_active_score);
        scores[BehaviorCategory::AggroMobs.index()] = priority_aggro_mobs(s.mob_in_range);
        scores[BehaviorCategory::TargetPlayers.index()] =
            priority_target_players(s.player_in_range);
        Self(scores)
    }

    pub fn get(&self, category: BehaviorCategory) -> f32 {
        self.0[category.index()]
    }

    /// Strict maximum in evaluation order. `None` when every score is zero.
    pub fn winner(&self) -> Option<BehaviorCategory> {
        let mut best: Option<(BehaviorCategory, f32)> = None;
        for c in BehaviorCategory::ORDER {
            let v = self.get(c);
            if v > best.map_or(0.0, |(_, b)| b) {
                best = Some((c, v));
            }
        }
        best.map(|(c, _)| c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> PrioritySignals {
        PrioritySignals {
            overlevel_timer: 0.0,
            overlevel_deadline: 200.0,
            health: Health::full(100.0),
            has_live_attacker: false,
            best_drop_score: 0.0,
            worst_active_score: 1.0,
            mob_in_range: false,
            player_in_range: false,
        }
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn healing_example() {
        let h = Health {
            current: 20.0,
            max: 100.0,
        };
        assert!(close(priority_healing(&h), 0.72));
        assert_eq!(priority_healing(&Health { current: 5.0, max: 0.0 }), 0.0);
        assert_eq!(priority_healing(&Health { current: 150.0, max: 100.0 }), 0.0);
    }

    #[test]
    fn overlevel_at_deadline_is_point_nine() {
        assert!(close(priority_overlevel_escape(200.0, 200.0), 0.9));
        assert!(close(priority_overlevel_escape(500.0, 200.0), 0.9));
        assert!(close(priority_overlevel_escape(100.0, 200.0), 0.45));
        assert_eq!(priority_overlevel_escape(10.0, 0.0), 0.0);
    }

    #[test]
    fn drop_examples() {
        assert!(close(priority_obtain_drop(12.0, 5.0), 0.7));
        assert_eq!(priority_upgrade_drop(12.0, 5.0), 0.9);
    }

    #[test]
    fn upgrade_drop_is_binary() {
        for best in [0.0, 1.0, 1.05, 1.06, 2.0, 10.0] {
            let v = priority_upgrade_drop(best, 1.0);
            assert!(v == 0.0 || v == 0.9);
        }
        assert_eq!(priority_upgrade_drop(1.04, 1.0), 0.0);
    }

    #[test]
    fn obtain_drop_without_drop_is_zero() {
        assert_eq!(priority_obtain_drop(0.0, 0.0), 0.0);
        assert_eq!(priority_obtain_drop(1.0, 5.0), 0.0);
    }

    #[test]
    fn all_zero_has_no_winner() {
        let scores = PriorityScores::evaluate(&quiet());
        assert_eq!(scores.winner(), None);
    }

    #[test]
    fn scores_stay_in_unit_range() {
        let mut s = quiet();
        s.overlevel_timer = 1e9;
        s.health = Health { current: -50.0, max: 100.0 };
        s.has_live_attacker = true;
        s.best_drop_score = 1e6;
        s.mob_in_range = true;
        s.player_in_range = true;
        let scores = PriorityScores::evaluate(&s);
        for c in BehaviorCategory::ORDER {
            let v = scores.get(c);
            assert!((0.0..=1.0).contains(&v), "{} = {v}", c.label());
        }
    }

    #[test]
    fn ties_follow_evaluation_order() {
        // overlevel 0.9 ties upgrade 0.9; overlevel is evaluated first
        let mut s = quiet();
        s.overlevel_timer = 200.0;
        s.best_drop_score = 3.0;
        let scores = PriorityScores::evaluate(&s);
        assert_eq!(scores.winner(), Some(BehaviorCategory::OverlevelEscape));

        // obtain drop reaches 1.0 and beats the 0.9 upgrade
        s.best_drop_score = 20.0;
        let scores = PriorityScores::evaluate(&s);
        assert_eq!(scores.winner(), Some(BehaviorCategory::ObtainDrop));
    }

    #[test]
    fn mob_beats_player_and_attacker_beats_mob() {
        let mut s = quiet();
        s.mob_in_range = true;
        s.player_in_range = true;
        assert_eq!(
            PriorityScores::evaluate(&s).winner(),
            Some(BehaviorCategory::AggroMobs)
        );
        s.has_live_attacker = true;
        assert_eq!(
            PriorityScores::evaluate(&s).winner(),
            Some(BehaviorCategory::Retaliation)
        );
    }
}
