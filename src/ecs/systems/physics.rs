//! ECS collision sync system.
//!
//! Copies body state out of the collision system after each step.

use crate::ecs::components::physics::{BodyHandle, BodyState};
use crate::physics::{Collidable, CollisionSystem};

/// Register `body` with the collision system and spawn an entity for it.
pub fn spawn_body(world: &mut hecs::World, system: &mut CollisionSystem, body: Collidable) -> hecs::Entity {
    let id = system.add_collidable(body);
    let mut state = BodyState::default();
    if let Some(body) = system.collidable(id) {
        write_state(&mut state, body);
    }
    world.spawn((BodyHandle(id), state))
}

fn write_state(state: &mut BodyState, body: &Collidable) {
    state.position = body.position();
    state.velocity = body.global_vel();
    state.flags = body.flags();
    state.alive = true;
}

/// Refresh every [`BodyState`] from the body its [`BodyHandle`] refers to.
///
/// Handles whose body was removed are marked dead rather than despawned.
pub fn sync_bodies(world: &mut hecs::World, system: &CollisionSystem) {
    for (_, (handle, state)) in world.query_mut::<(&BodyHandle, &mut BodyState)>() {
        match system.collidable(handle.0) {
            Some(body) => write_state(state, body),
            None => state.alive = false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::ColliderSimple;
    use crate::geometry::Rect;
    use glam::Vec2;

    #[test]
    fn test_sync_bodies_copies_state() {
        let mut world = hecs::World::new();
        let mut system = CollisionSystem::default();
        system.add_region(ColliderSimple::new(Rect::new(0.0, 0.0, 16.0, 16.0)));

        let entity = spawn_body(
            &mut world,
            &mut system,
            Collidable::new(Vec2::new(8.0, 0.0), Vec2::new(8.0, 16.0), Vec2::new(0.0, 400.0)),
        );
        {
            let state = world.get::<&BodyState>(entity).unwrap();
            assert!(state.alive);
            assert_eq!(state.position, Vec2::new(8.0, 0.0));
        }

        for _ in 0..10 {
            system.step(1.0 / 60.0);
        }
        sync_bodies(&mut world, &system);

        let state = world.get::<&BodyState>(entity).unwrap();
        assert!(state.flags.floor);
        assert!((state.position.y).abs() < 1e-3);
    }

    #[test]
    fn test_sync_bodies_marks_removed() {
        let mut world = hecs::World::new();
        let mut system = CollisionSystem::default();
        let entity = spawn_body(
            &mut world,
            &mut system,
            Collidable::new(Vec2::ZERO, Vec2::new(8.0, 16.0), Vec2::ZERO),
        );
        let handle = *world.get::<&BodyHandle>(entity).unwrap();
        system.remove_collidable(handle.0).unwrap();

        sync_bodies(&mut world, &system);
        assert!(!world.get::<&BodyState>(entity).unwrap().alive);
    }
}
