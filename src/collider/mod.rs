//! Collision geometry: surfaces, quads and the regions that own them.
//!
//! A [`ColliderRegion`] is a movable container of [`ColliderQuad`]s in local
//! coordinates. Regions come in two flavours here: [`ColliderSimple`] (one
//! box) and [`ColliderTileMap`] (a grid of tile shapes with culled seams and
//! computed ghost points).

pub mod material;
pub mod quad;
pub mod simple;
pub mod surface;
pub mod tile;
pub mod tilemap;

pub use material::{SurfaceMaterial, TileMaterial};
pub use quad::{ColliderQuad, QuadSurface};
pub use simple::ColliderSimple;
pub use surface::{ColliderSurface, ColliderSurfaceId};
pub use tile::{ColliderTile, TileShape, TileShapeType};
pub use tilemap::ColliderTileMap;

use std::collections::BTreeMap;

use glam::Vec2;

use crate::geometry::Rect;
use crate::physics::contact::{AppliedContact, ContinuousContact};

/// Index of a quad within its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct QuadId(pub u32);

/// Handle of a region registered with a [`CollisionSystem`](crate::physics::CollisionSystem).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColliderId(pub u32);

/// All regions known to the collision system, keyed by id.
pub type RegionMap = BTreeMap<ColliderId, Box<dyn ColliderRegion>>;

/// Motion state shared by every region kind.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RegionState {
    pub position: Vec2,
    pub prev_position: Vec2,
    /// Velocity in units per second.
    pub velocity: Vec2,
    /// Change in velocity over the last move.
    pub delta_velocity: Vec2,
    /// Local bounding box of all quads.
    pub bounding_box: Rect,
    pub prev_bounding_box: Rect,
}

impl RegionState {
    pub fn new(position: Vec2, bounding_box: Rect) -> Self {
        Self {
            position,
            prev_position: position,
            bounding_box,
            prev_bounding_box: bounding_box,
            ..Default::default()
        }
    }
}

/// A positioned container of collision quads.
///
/// Implementors provide quad storage and lookup; motion state and derived
/// queries come from [`RegionState`].
pub trait ColliderRegion {
    fn state(&self) -> &RegionState;
    fn state_mut(&mut self) -> &mut RegionState;

    /// O(1) quad lookup. `None` for unknown ids.
    fn get_quad(&self, id: QuadId) -> Option<&ColliderQuad>;

    /// Append every quad whose local bounds touch the world-space `area`,
    /// together with those local bounds.
    fn quads_in_rect(&self, area: Rect, out: &mut Vec<(Rect, QuadId)>);

    /// Per-tick housekeeping such as flushing queued edits.
    fn update(&mut self, _dt: f32) {}

    /// Filter a contact before it reaches the solver.
    fn on_precontact(&self, _contact: &ContinuousContact, _touch_duration: f32) -> bool {
        true
    }

    /// Observe a contact after it was applied to a body.
    fn on_postcontact(&self, _contact: &AppliedContact) {}

    fn position(&self) -> Vec2 {
        self.state().position
    }

    fn prev_position(&self) -> Vec2 {
        self.state().prev_position
    }

    fn velocity(&self) -> Vec2 {
        self.state().velocity
    }

    fn delta_velocity(&self) -> Vec2 {
        self.state().delta_velocity
    }

    fn has_moved(&self) -> bool {
        self.state().position != self.state().prev_position
    }

    fn delta_position(&self) -> Vec2 {
        self.state().position - self.state().prev_position
    }

    /// World-space bounding box at the current position.
    fn bounding_box(&self) -> Rect {
        let s = self.state();
        s.bounding_box.translated(s.position)
    }

    /// Union of the previous and current world-space bounding boxes.
    fn swept_bounding_box(&self) -> Rect {
        let s = self.state();
        let prev = s.prev_bounding_box.translated(s.prev_position);
        let curr = s.bounding_box.translated(s.position);
        prev.bound(&curr)
    }

    fn surface(&self, id: ColliderSurfaceId) -> Option<&ColliderSurface> {
        self.get_quad(id.quad)?.surface(id.dir)
    }

    fn surface_material(&self, id: ColliderSurfaceId) -> Option<SurfaceMaterial> {
        let quad = self.get_quad(id.quad)?;
        quad.surface(id.dir)?;
        Some(quad.surface_material(id.dir))
    }

    /// Jump to `pos` without producing motion.
    fn teleport(&mut self, pos: Vec2) {
        let s = self.state_mut();
        s.prev_position = pos;
        s.position = pos;
    }

    fn set_position(&mut self, pos: Vec2, update_prev: bool) {
        let s = self.state_mut();
        if update_prev {
            s.prev_position = s.position;
        }
        s.position = pos;
    }

    /// Move to `pos` over `dt` seconds, deriving velocity and delta velocity.
    fn move_to(&mut self, pos: Vec2, dt: f32) {
        self.set_position(pos, true);
        if dt > 0.0 {
            let s = self.state_mut();
            let vel = (s.position - s.prev_position) / dt;
            s.delta_velocity = vel - s.velocity;
            s.velocity = vel;
        }
    }
}
