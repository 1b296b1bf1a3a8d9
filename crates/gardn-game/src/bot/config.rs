//! Tuning knobs for the bot engine, loadable from the `[bots]` config table.

use serde::Deserialize;

use super::scoring::ScoringKind;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Simulation ticks per second.
    pub tps: u32,
    /// Full acceleration magnitude applied by movement primitives.
    pub acceleration: f32,
    /// Radius of the mob, player and drop searches.
    pub search_radius: f32,
    /// Radius for opportunistic mob engagement in the default behaviour.
    pub skirmish_radius: f32,
    /// Seconds a damage record keeps an attacker eligible for retaliation.
    pub retaliation_window_secs: f32,
    /// Seconds of overlevel time before items get disabled.
    pub disable_delay_secs: f32,
    /// Seconds between full loadout rebalance passes.
    pub rebalance_secs: f32,
    /// Seconds a thought stays on screen.
    pub thought_secs: f32,
    /// Use the biased wander; when false, bots idle-march right.
    pub wander: bool,
    /// Weight of the rightward bias blended into the wander heading.
    pub wander_bias: f32,
    /// Threats closer than this push hard.
    pub threat_inner_radius: f32,
    /// Threats closer than this push gently.
    pub threat_outer_radius: f32,
    /// Maximum facing change per tick while wandering, in radians.
    pub max_turn_rate: f32,
    pub scoring: ScoringKind,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            tps: 20,
            acceleration: 5.0,
            search_radius: 900.0,
            skirmish_radius: 400.0,
            retaliation_window_secs: 2.0,
            disable_delay_secs: 10.0,
            rebalance_secs: 1.0,
            thought_secs: 3.0,
            wander: true,
            wander_bias: 0.35,
            threat_inner_radius: 150.0,
            threat_outer_radius: 350.0,
            max_turn_rate: 0.12,
            scoring: ScoringKind::default(),
        }
    }
}

impl BotConfig {
    fn secs_to_ticks(&self, secs: f32) -> u64 {
        (secs * self.tps as f32).round().max(0.0) as u64
    }

    /// Overlevel deadline in ticks.
    pub fn overlevel_deadline(&self) -> f32 {
        self.disable_delay_secs * self.tps as f32
    }

    pub fn retaliation_window_ticks(&self) -> u64 {
        self.secs_to_ticks(self.retaliation_window_secs)
    }

    /// Never zero, so it is safe as a modulus.
    pub fn rebalance_interval_ticks(&self) -> u64 {
        self.secs_to_ticks(self.rebalance_secs).max(1)
    }

    pub fn thought_ticks(&self) -> u32 {
        self.secs_to_ticks(self.thought_secs).min(u32::MAX as u64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_tick_counts() {
        let c = BotConfig::default();
        assert_eq!(c.overlevel_deadline(), 200.0);
        assert_eq!(c.retaliation_window_ticks(), 40);
        assert_eq!(c.rebalance_interval_ticks(), 20);
        assert_eq!(c.thought_ticks(), 60);
    }

    #[test]
    fn rebalance_interval_never_zero() {
        let c = BotConfig {
            rebalance_secs: 0.0,
            ..Default::default()
        };
        assert_eq!(c.rebalance_interval_ticks(), 1);
    }

    #[test]
    fn partial_table_keeps_defaults() {
        let c: BotConfig = toml::from_str(
            r#"
            search_radius = 600.0
            wander = false
            scoring = "composite"
            "#,
        )
        .unwrap();
        assert_eq!(c.search_radius, 600.0);
        assert!(!c.wander);
        assert_eq!(c.scoring, ScoringKind::Composite);
        assert_eq!(c.tps, 20);
    }
}
