//! Tile collision for axis-aligned platformer bodies.
//!
//! # Architecture
//!
//! The collision pipeline runs in a fixed timestep loop:
//!
//! 1. Update regions (flush queued tile edits)
//! 2. Integrate bodies (trackers, acceleration, gravity)
//! 3. Broad phase per body, growing the search area until it is stable
//! 4. Continuous test against every nearby quad
//! 5. Solve contacts: ghost edges, wedges, crushes, then apply
//! 6. Hand the frame to the body's surface trackers

pub mod arbiter;
pub mod axis;
pub mod broadphase;
pub mod collidable;
pub mod contact;
pub mod continuous;
pub mod discrete;
pub mod ghost;
pub mod response;
pub mod solver;
pub mod tracker;

use std::collections::BTreeMap;

pub use arbiter::{Arbiter, RegionArbiter};
pub use broadphase::CollidableArbiter;
pub use collidable::{Collidable, CollisionFlags, Slip, SlipState};
pub use contact::{
    compare_contact, AppliedContact, CollidableId, CollisionId, ContactType, ContinuousContact,
    DiscreteContact,
};
pub use continuous::CollisionContinuous;
pub use discrete::{CollisionDiscrete, FrameTime};
pub use ghost::{is_ghost_edge, GhostEdge};
pub use response::Response;
pub use solver::{calc_wedge_vel, CollisionSolver, CompResult};
pub use tracker::{SurfaceTracker, TrackerSettings};

use crate::collider::{ColliderId, ColliderRegion, RegionMap};
use crate::error::{CollisionError, Result};

/// Configuration for the collision simulation.
#[derive(Debug, Clone)]
pub struct CollisionConfig {
    /// Fixed timestep for collision updates in seconds. Default: 1/60.
    pub fixed_timestep: f64,
    /// Maximum number of sub-steps per frame. Default: 4.
    pub max_substeps: u32,
    /// Passes the broad phase may take to settle its search area. Default: 16.
    pub max_broadphase_passes: u32,
    /// Steps the solver may take for one body. Default: 64.
    pub max_solver_iterations: u32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 4,
            max_broadphase_passes: 16,
            max_solver_iterations: 64,
        }
    }
}

struct BodyEntry {
    body: Collidable,
    arbiter: CollidableArbiter,
}

/// Owns every body, region and arbiter and steps them together.
pub struct CollisionSystem {
    config: CollisionConfig,
    accumulator: f64,
    bodies: BTreeMap<CollidableId, BodyEntry>,
    regions: RegionMap,
    next_collidable: u32,
    next_region: u32,
}

impl CollisionSystem {
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            config,
            accumulator: 0.0,
            bodies: BTreeMap::new(),
            regions: RegionMap::new(),
            next_collidable: 0,
            next_region: 0,
        }
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    pub fn add_collidable(&mut self, body: Collidable) -> CollidableId {
        let id = CollidableId(self.next_collidable);
        self.next_collidable += 1;
        self.bodies.insert(
            id,
            BodyEntry {
                body,
                arbiter: CollidableArbiter::new(id),
            },
        );
        id
    }

    /// Remove a body together with all of its arbiters.
    pub fn remove_collidable(&mut self, id: CollidableId) -> Result<Collidable> {
        self.bodies
            .remove(&id)
            .map(|entry| entry.body)
            .ok_or(CollisionError::UnknownCollidable(id.0))
    }

    pub fn add_region(&mut self, region: impl ColliderRegion + 'static) -> ColliderId {
        let id = ColliderId(self.next_region);
        self.next_region += 1;
        self.regions.insert(id, Box::new(region));
        id
    }

    /// Remove a region, dropping every arbiter that referenced it.
    pub fn remove_region(&mut self, id: ColliderId) -> Result<Box<dyn ColliderRegion>> {
        let region = self
            .regions
            .remove(&id)
            .ok_or(CollisionError::UnknownRegion(id.0))?;
        for entry in self.bodies.values_mut() {
            entry.arbiter.erase_region(id);
        }
        Ok(region)
    }

    pub fn collidable(&self, id: CollidableId) -> Option<&Collidable> {
        self.bodies.get(&id).map(|entry| &entry.body)
    }

    pub fn collidable_mut(&mut self, id: CollidableId) -> Option<&mut Collidable> {
        self.bodies.get_mut(&id).map(|entry| &mut entry.body)
    }

    pub fn collidables(&self) -> impl Iterator<Item = (CollidableId, &Collidable)> {
        self.bodies.iter().map(|(id, entry)| (*id, &entry.body))
    }

    pub fn region(&self, id: ColliderId) -> Option<&dyn ColliderRegion> {
        self.regions.get(&id).map(|region| region.as_ref())
    }

    pub fn region_mut(&mut self, id: ColliderId) -> Option<&mut (dyn ColliderRegion + 'static)> {
        self.regions.get_mut(&id).map(|region| region.as_mut())
    }

    pub fn regions(&self) -> &RegionMap {
        &self.regions
    }

    /// Broad phase state of one body.
    pub fn collidable_arbiter(&self, id: CollidableId) -> Option<&CollidableArbiter> {
        self.bodies.get(&id).map(|entry| &entry.arbiter)
    }

    /// Number of live quad arbiters across all bodies.
    pub fn arbiter_count(&self) -> usize {
        self.bodies.values().map(|entry| entry.arbiter.arbiter_count()).sum()
    }

    /// Step the simulation forward by `delta_time` seconds.
    ///
    /// Uses a fixed timestep accumulator to ensure deterministic simulation.
    pub fn step(&mut self, delta_time: f64) {
        self.accumulator += delta_time;

        let mut substeps = 0u32;
        while self.accumulator >= self.config.fixed_timestep && substeps < self.config.max_substeps
        {
            self.fixed_step(self.config.fixed_timestep as f32);
            self.accumulator -= self.config.fixed_timestep;
            substeps += 1;
        }

        // Clamp accumulator to avoid spiral of death
        if self.accumulator > self.config.fixed_timestep * self.config.max_substeps as f64 {
            self.accumulator = 0.0;
        }
    }

    /// Advance exactly one tick of `dt` seconds.
    pub fn fixed_step(&mut self, dt: f32) {
        for region in self.regions.values_mut() {
            region.update(dt);
        }

        for entry in self.bodies.values_mut() {
            entry.body.update(&self.regions, dt);
        }

        for entry in self.bodies.values_mut() {
            entry.arbiter.gather_collisions(
                &entry.body,
                &self.regions,
                dt,
                self.config.max_broadphase_passes,
            );
            entry.arbiter.solve_collisions(
                &mut entry.body,
                &self.regions,
                self.config.max_solver_iterations,
            );
        }
    }
}

impl Default for CollisionSystem {
    fn default() -> Self {
        Self::new(CollisionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::{ColliderSimple, ColliderTileMap};
    use crate::geometry::Rect;
    use glam::Vec2;

    const DT: f64 = 1.0 / 60.0;

    fn floor_map() -> ColliderTileMap {
        ColliderTileMap::from_rows(
            &[
                ". . . .",
                ". . . .",
                "solid solid solid solid",
            ],
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_body_falls_onto_tile_map() {
        let mut system = CollisionSystem::default();
        system.add_region(floor_map());
        let id = system.add_collidable(Collidable::new(
            Vec2::new(24.0, 20.0),
            Vec2::new(8.0, 16.0),
            Vec2::new(0.0, 400.0),
        ));

        for _ in 0..120 {
            system.step(DT);
        }

        let body = system.collidable(id).unwrap();
        assert!((body.position().y - 32.0).abs() < 1e-3, "y = {}", body.position().y);
        assert!(body.flags().floor);
        assert!(system.arbiter_count() > 0);
    }

    #[test]
    fn test_resting_body_is_stable() {
        let mut system = CollisionSystem::default();
        system.add_region(floor_map());
        let id = system.add_collidable(Collidable::new(
            Vec2::new(24.0, 32.0),
            Vec2::new(8.0, 16.0),
            Vec2::new(0.0, 400.0),
        ));

        for _ in 0..10 {
            system.step(DT);
        }
        let settled = system.collidable(id).unwrap().position();
        let frame_of = |system: &CollisionSystem| -> Vec<(ContactType, Vec2, Vec2)> {
            system
                .collidable(id)
                .unwrap()
                .frame()
                .iter()
                .map(|c| (c.ty, c.contact.ortho_n, c.contact.collider_n))
                .collect()
        };
        let settled_frame = frame_of(&system);
        assert!(!settled_frame.is_empty());

        for _ in 0..60 {
            system.step(DT);
            let pos = system.collidable(id).unwrap().position();
            assert!((pos - settled).length() < 1e-3, "drifted to {pos}");
            assert_eq!(frame_of(&system), settled_frame);
        }
    }

    #[test]
    fn test_embedded_body_pushed_out_of_floor_seam() {
        let mut system = CollisionSystem::default();
        system.add_region(floor_map());
        // straddling the seam between the first two floor tiles, 3 units deep
        let id = system.add_collidable(Collidable::new(
            Vec2::new(15.5, 35.0),
            Vec2::new(8.0, 16.0),
            Vec2::new(0.0, 400.0),
        ));

        system.step(DT);
        let body = system.collidable(id).unwrap();
        assert!((body.position() - Vec2::new(15.5, 32.0)).length() < 1e-3, "pos = {}", body.position());
        assert!(body.frame().iter().all(|c| c.contact.ortho_n == Vec2::new(0.0, -1.0)));

        for _ in 0..30 {
            system.step(DT);
        }
        let body = system.collidable(id).unwrap();
        assert!((body.position() - Vec2::new(15.5, 32.0)).length() < 1e-3, "pos = {}", body.position());
        assert!(body.flags().floor);
    }

    #[test]
    fn test_arbiters_follow_the_body() {
        let mut system = CollisionSystem::default();
        system.add_region(ColliderSimple::new(Rect::new(0.0, 0.0, 16.0, 16.0)));
        let id = system.add_collidable(Collidable::new(
            Vec2::new(8.0, 0.0),
            Vec2::new(8.0, 16.0),
            Vec2::new(0.0, 400.0),
        ));

        system.step(DT);
        assert_eq!(system.arbiter_count(), 1);

        system.collidable_mut(id).unwrap().teleport(Vec2::new(500.0, 0.0));
        system.step(DT);
        assert_eq!(system.arbiter_count(), 0);
    }

    #[test]
    fn test_remove_region_drops_arbiters() {
        let mut system = CollisionSystem::default();
        let region = system.add_region(ColliderSimple::new(Rect::new(0.0, 0.0, 16.0, 16.0)));
        system.add_collidable(Collidable::new(
            Vec2::new(8.0, 0.0),
            Vec2::new(8.0, 16.0),
            Vec2::new(0.0, 400.0),
        ));
        system.step(DT);
        assert_eq!(system.arbiter_count(), 1);

        assert!(system.remove_region(region).is_ok());
        assert_eq!(system.arbiter_count(), 0);
        assert!(system.region(region).is_none());
        assert_eq!(
            system.remove_region(region).err(),
            Some(CollisionError::UnknownRegion(region.0))
        );
    }

    #[test]
    fn test_remove_collidable() {
        let mut system = CollisionSystem::default();
        let id = system.add_collidable(Collidable::new(Vec2::ZERO, Vec2::new(8.0, 16.0), Vec2::ZERO));
        assert!(system.remove_collidable(id).is_ok());
        assert!(system.collidable(id).is_none());
        assert_eq!(
            system.remove_collidable(id).err(),
            Some(CollisionError::UnknownCollidable(id.0))
        );
    }

    #[test]
    fn test_step_accumulates_fixed_ticks() {
        let mut system = CollisionSystem::default();
        let id = system.add_collidable(Collidable::new(
            Vec2::ZERO,
            Vec2::new(8.0, 16.0),
            Vec2::new(0.0, 60.0),
        ));

        // less than one tick: nothing happens
        system.step(DT * 0.5);
        assert_eq!(system.collidable(id).unwrap().position(), Vec2::ZERO);

        system.step(DT * 0.5);
        assert!(system.collidable(id).unwrap().position().y > 0.0);
    }

    #[test]
    fn test_moving_platform_carries_velocity() {
        let mut system = CollisionSystem::default();
        let platform = system.add_region(ColliderSimple::new(Rect::new(0.0, 0.0, 64.0, 16.0)));
        let id = system.add_collidable(Collidable::new(
            Vec2::new(32.0, 0.0),
            Vec2::new(8.0, 16.0),
            Vec2::new(0.0, 400.0),
        ));
        for _ in 0..5 {
            system.step(DT);
        }

        // platform rises into the body
        let region = system.region_mut(platform).unwrap();
        region.move_to(Vec2::new(0.0, -2.0), DT as f32);
        system.step(DT);

        let body = system.collidable(id).unwrap();
        assert!((body.position().y + 2.0).abs() < 1e-2, "y = {}", body.position().y);
        assert!(body.flags().floor);
    }
}
