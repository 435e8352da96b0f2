//! Rein 2D Tile Collision
//!
//! Continuous collision detection and resolution for axis-aligned platformer
//! bodies against tile maps and moving platforms.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **geometry** - Lines, rectangles and directions in a y-down world
//! 2. **collider** - Surfaces, quads and the regions that own them (tile maps, boxes)
//! 3. **physics** - Bodies, arbiters, the contact solver and the fixed-step driver
//! 4. **ecs** - hecs ECS integration (feature = "ecs")

pub mod collider;
pub mod error;
pub mod geometry;
pub mod physics;

#[cfg(feature = "ecs")]
pub mod ecs;

// Re-export commonly used types
pub use collider::{
    ColliderId, ColliderQuad, ColliderRegion, ColliderSimple, ColliderSurface, ColliderTileMap,
    QuadId, RegionMap, SurfaceMaterial, TileMaterial, TileShape, TileShapeType,
};

pub use error::CollisionError;

pub use geometry::{AngleRange, Cardinal, Line, Ordinal, Rect, TILESIZE};

pub use physics::{
    AppliedContact, Collidable, CollidableId, CollisionConfig, CollisionFlags, CollisionSystem,
    ContactType, ContinuousContact, Response, SlipState, SurfaceTracker, TrackerSettings,
};

#[cfg(feature = "ecs")]
pub use ecs::prelude::*;

// Re-export glam for convenience
pub use glam;
