//! Game logic: ECS world, reference content, and the bot decision engine
//! that drives bot-controlled players.

pub mod bot;
pub mod components;
pub mod content;
pub mod error;
pub mod game_world;
pub mod spatial;
pub mod spawning;
pub mod tracker;

pub use error::GameError;
pub use game_world::{GameEvent, GameWorld, WorldConfig};
