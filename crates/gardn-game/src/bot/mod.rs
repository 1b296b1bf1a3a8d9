//! Bot decision engine: per-tick control of bot-driven players.
//!
//! Each tick a bot re-decides from scratch. The arbiter scores every
//! behaviour category, tries the winner once, and otherwise falls back to a
//! fixed default (skirmish, wander, zone relocation).

pub mod arbiter;
pub mod config;
pub mod inventory;
pub mod movement;
pub mod priorities;
pub mod scoring;
pub mod system;
pub mod targeting;

pub use arbiter::{tick_bot, BotAction, BotContext, BotDecision, BotState};
pub use config::BotConfig;
pub use priorities::{BehaviorCategory, PriorityScores};
pub use scoring::{Appraiser, ScoringKind, ScoringPolicy};
