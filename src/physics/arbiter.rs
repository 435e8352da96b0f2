//! Persistent per-quad and per-region collision state for one body.

use std::collections::BTreeMap;

use crate::collider::{ColliderId, ColliderQuad, ColliderRegion, QuadId};
use crate::geometry::{Cardinal, Rect};

use super::collidable::Collidable;
use super::contact::{CollidableId, CollisionId, ContinuousContact};
use super::continuous::CollisionContinuous;

/// Tracks one body against one quad across ticks.
#[derive(Debug, Clone)]
pub struct Arbiter {
    id: CollisionId,
    collision: CollisionContinuous,
    alive_timer: f32,
    touch_timer: f32,
    recalc_counter: u32,
    /// Set by the region arbiter while deciding which quads survive.
    pub stale: bool,
    /// Already updated during the current broad phase.
    pub(crate) updated: bool,
}

impl Arbiter {
    pub fn new(id: CollisionId, body: &Collidable, region: &dyn ColliderRegion, quad: &ColliderQuad) -> Self {
        Self {
            id,
            collision: CollisionContinuous::new(id, body, region, quad),
            alive_timer: 0.0,
            touch_timer: 0.0,
            recalc_counter: 0,
            stale: false,
            updated: false,
        }
    }

    /// Re-run the continuous test. `dt == 0` counts as a re-evaluation within
    /// the same tick.
    pub fn update(&mut self, body: &Collidable, region: &dyn ColliderRegion, dt: f32) {
        let fallback;
        let quad = match region.get_quad(self.id.quad) {
            Some(quad) => quad,
            None => {
                // removed from the region; leaves an invalid contact behind
                fallback = ColliderQuad::default();
                &fallback
            }
        };

        if dt > 0.0 {
            self.alive_timer += dt;
            self.recalc_counter = 0;
        } else {
            self.recalc_counter += 1;
        }

        self.collision.update(body, region, quad, dt);

        if self.collision.contact().has_contact {
            self.touch_timer += dt;
        } else {
            self.touch_timer = 0.0;
        }
    }

    /// Mark the axis matching the current contact as resolved.
    pub fn set_applied(&mut self) {
        let ortho_n = self.collision.contact().ortho_n;
        self.collision.set_axis_applied(ortho_n);
    }

    pub fn id(&self) -> CollisionId {
        self.id
    }

    pub fn contact(&self) -> &ContinuousContact {
        self.collision.contact()
    }

    pub fn collision(&self) -> &CollisionContinuous {
        &self.collision
    }

    pub fn alive_duration(&self) -> f32 {
        self.alive_timer
    }

    pub fn touch_duration(&self) -> f32 {
        self.touch_timer
    }

    pub fn recalc_count(&self) -> u32 {
        self.recalc_counter
    }
}

/// All arbiters of one body within one region.
#[derive(Debug, Clone)]
pub struct RegionArbiter {
    collider: ColliderId,
    collidable: CollidableId,
    quads: Vec<(Rect, QuadId)>,
    arbiters: BTreeMap<QuadId, Arbiter>,
}

impl RegionArbiter {
    pub fn new(collider: ColliderId, collidable: CollidableId) -> Self {
        Self {
            collider,
            collidable,
            quads: Vec::new(),
            arbiters: BTreeMap::new(),
        }
    }

    pub fn collider(&self) -> ColliderId {
        self.collider
    }

    /// Sync the arbiter set with the quads inside `bounds`.
    pub fn update_region(&mut self, body: &Collidable, region: &dyn ColliderRegion, bounds: Rect) {
        self.quads.clear();

        let dp = region.delta_position();
        let mut bounds = bounds;
        if dp.x != 0.0 {
            bounds = bounds.extend(Cardinal::W, dp.x.abs()).extend(Cardinal::E, dp.x.abs());
        }
        if dp.y != 0.0 {
            bounds = bounds.extend(Cardinal::N, dp.y.abs()).extend(Cardinal::S, dp.y.abs());
        }
        region.quads_in_rect(bounds, &mut self.quads);

        for arbiter in self.arbiters.values_mut() {
            arbiter.stale = true;
        }

        for &(_, quad_id) in &self.quads {
            let Some(quad) = region.get_quad(quad_id) else {
                continue;
            };
            if !quad.has_any_surface() {
                continue;
            }

            let id = CollisionId {
                collidable: self.collidable,
                collider: self.collider,
                quad: quad_id,
            };
            self.arbiters
                .entry(quad_id)
                .or_insert_with(|| {
                    tracing::debug!(?id, "arbiter created");
                    Arbiter::new(id, body, region, quad)
                })
                .stale = false;
        }

        self.arbiters.retain(|quad, arbiter| {
            if arbiter.stale {
                tracing::debug!(quad = quad.0, collider = arbiter.id.collider.0, "arbiter removed");
            }
            !arbiter.stale
        });
    }

    /// Update every arbiter regardless of the broad phase bookkeeping.
    pub fn update_arbiters(&mut self, body: &Collidable, region: &dyn ColliderRegion, dt: f32) {
        for arbiter in self.arbiters.values_mut() {
            arbiter.update(body, region, dt);
        }
    }

    pub fn arbiters(&self) -> &BTreeMap<QuadId, Arbiter> {
        &self.arbiters
    }

    pub fn arbiters_mut(&mut self) -> &mut BTreeMap<QuadId, Arbiter> {
        &mut self.arbiters
    }

    pub fn arbiter(&self, quad: QuadId) -> Option<&Arbiter> {
        self.arbiters.get(&quad)
    }

    pub fn arbiter_mut(&mut self, quad: QuadId) -> Option<&mut Arbiter> {
        self.arbiters.get_mut(&quad)
    }

    /// Quads returned by the last region query.
    pub fn quads(&self) -> &[(Rect, QuadId)] {
        &self.quads
    }
}
