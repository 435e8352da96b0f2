//! Collision components for ECS entities.

use glam::Vec2;

use crate::physics::{CollidableId, CollisionFlags};

/// Links an entity to a body in the collision system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub CollidableId);

/// Snapshot of a body taken after the last step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyState {
    /// Bottom-centre point.
    pub position: Vec2,
    pub velocity: Vec2,
    pub flags: CollisionFlags,
    /// Whether the body still exists in the collision system.
    pub alive: bool,
}
