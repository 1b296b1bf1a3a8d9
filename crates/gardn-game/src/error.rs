//! Errors surfaced by the host world. The bot engine itself never fails.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("unknown creature id: {0}")]
    UnknownCreature(u8),

    #[error("unknown item id: {0}")]
    UnknownItem(u8),

    #[error("no zone with difficulty {0}")]
    NoZone(u32),
}
