//! Error types for fallible setup operations.
//!
//! The per-tick collision path never fails; these cover building regions and
//! managing the [`CollisionSystem`](crate::physics::CollisionSystem).

use glam::IVec2;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollisionError {
    #[error("Unknown tile shape: {0}")]
    UnknownTileShape(String),
    #[error("Tile position {pos} is outside the map size {size}")]
    TileOutOfBounds { pos: IVec2, size: IVec2 },
    #[error("Invalid size: {0}")]
    InvalidSize(String),
    #[error("Unknown collidable: {0}")]
    UnknownCollidable(u32),
    #[error("Unknown region: {0}")]
    UnknownRegion(u32),
}

pub type Result<T> = std::result::Result<T, CollisionError>;
