//! hecs integration for the collision system.
//!
//! Entities reference bodies owned by a [`CollisionSystem`](crate::physics::CollisionSystem)
//! through a [`BodyHandle`]. After each step, [`sync_bodies`] mirrors the
//! body state into [`BodyState`] components for gameplay systems to read.

pub mod components;
pub mod systems;

pub use components::physics::{BodyHandle, BodyState};
pub use systems::physics::{spawn_body, sync_bodies};

pub mod prelude {
    pub use super::components::physics::{BodyHandle, BodyState};
    pub use super::systems::physics::{spawn_body, sync_bodies};
}
