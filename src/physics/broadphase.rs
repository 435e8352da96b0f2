//! Broad phase for one body: which regions and quads it may touch this tick.
//!
//! The search area starts at the body's swept bounding box. Contacts found
//! inside it may push the body further out, so the area is grown by their
//! separations and searched again until it stops growing.

use std::collections::BTreeMap;

use super::arbiter::RegionArbiter;
use super::collidable::Collidable;
use super::contact::{CollidableId, ContinuousContact};
use super::solver::CollisionSolver;
use crate::collider::{ColliderId, RegionMap};
use crate::geometry::{Cardinal, Rect};

/// Every region arbiter of one body.
#[derive(Debug, Clone)]
pub struct CollidableArbiter {
    id: CollidableId,
    regions: BTreeMap<ColliderId, RegionArbiter>,
}

impl CollidableArbiter {
    pub fn new(id: CollidableId) -> Self {
        Self {
            id,
            regions: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> CollidableId {
        self.id
    }

    /// Find and update every arbiter the body may touch this tick.
    pub fn gather_collisions(&mut self, body: &Collidable, regions: &RegionMap, dt: f32, max_passes: u32) {
        for rarb in self.regions.values_mut() {
            for arbiter in rarb.arbiters_mut().values_mut() {
                arbiter.updated = false;
            }
        }

        let body_rect = body.rect();
        let mut push_bound = body.bounding_box();
        let mut passes = 0;

        loop {
            passes += 1;
            if passes > max_passes {
                debug_assert!(false, "broad phase exceeded {} passes", max_passes);
                tracing::warn!(collidable = self.id.0, max = max_passes, "broad phase pass cap reached");
                break;
            }

            let body_bound = push_bound;
            let bound_dist = [
                body_rect.top - body_bound.top,
                body_bound.right() - body_rect.right(),
                body_bound.bottom() - body_rect.bottom(),
                body_rect.left - body_bound.left,
            ];

            self.update_region_arbiters(body, regions, body_bound);

            let mut growth = [0.0_f32; 4];
            for rarb in self.regions.values_mut() {
                let Some(region) = regions.get(&rarb.collider()) else {
                    continue;
                };
                for arbiter in rarb.arbiters_mut().values_mut() {
                    if !arbiter.updated {
                        arbiter.update(body, region.as_ref(), dt);
                        arbiter.updated = true;
                    }
                    push_bounds_for_contact(&mut growth, &bound_dist, arbiter.contact());
                }
            }

            for dir in [Cardinal::N, Cardinal::E, Cardinal::S, Cardinal::W] {
                let amount = growth[dir.index()];
                if amount > 0.0 {
                    push_bound = push_bound.extend(dir, amount);
                }
            }

            if body_bound == push_bound {
                break;
            }
        }
    }

    fn update_region_arbiters(&mut self, body: &Collidable, regions: &RegionMap, bounds: Rect) {
        let collidable = self.id;
        self.regions.retain(|id, _| {
            let keep = regions.contains_key(id);
            if !keep {
                tracing::debug!(collidable = collidable.0, collider = id.0, "region arbiter removed");
            }
            keep
        });

        for (&id, region) in regions {
            if region.swept_bounding_box().touches(&bounds) {
                self.regions
                    .entry(id)
                    .or_insert_with(|| {
                        tracing::debug!(collidable = collidable.0, collider = id.0, "region arbiter created");
                        RegionArbiter::new(id, collidable)
                    })
                    .update_region(body, region.as_ref(), bounds);
            } else if self.regions.remove(&id).is_some() {
                tracing::debug!(collidable = collidable.0, collider = id.0, "region arbiter removed");
            }
        }
    }

    /// Filter, solve and apply every gathered contact.
    pub fn solve_collisions(&mut self, body: &mut Collidable, regions: &RegionMap, max_iterations: u32) {
        let mut contacts = Vec::new();
        for rarb in self.regions.values() {
            let Some(region) = regions.get(&rarb.collider()) else {
                continue;
            };
            for arbiter in rarb.arbiters().values() {
                let mut contact = *arbiter.contact();
                contact.touch_duration = arbiter.touch_duration();
                if region.on_precontact(&contact, contact.touch_duration) {
                    contacts.push(contact);
                }
            }
        }

        let frame = {
            let mut solver = CollisionSolver::new(body, regions, &mut self.regions, max_iterations);
            for contact in contacts {
                solver.push_contact(contact);
            }
            solver.solve()
        };

        body.set_frame(frame, regions);

        for applied in body.frame() {
            if let Some(region) = applied.region().and_then(|id| regions.get(&id)) {
                region.on_postcontact(applied);
            }
        }
    }

    /// Forget a region, e.g. when it is removed from the system.
    pub fn erase_region(&mut self, id: ColliderId) {
        self.regions.remove(&id);
    }

    pub fn region_arbiters(&self) -> &BTreeMap<ColliderId, RegionArbiter> {
        &self.regions
    }

    pub fn region_arbiter(&self, id: ColliderId) -> Option<&RegionArbiter> {
        self.regions.get(&id)
    }

    pub fn arbiter_count(&self) -> usize {
        self.regions.values().map(|r| r.arbiters().len()).sum()
    }
}

/// Record how far the search area must grow for `contact` to fit.
///
/// `growth` and `bound_dist` are indexed by [`Cardinal::index`].
fn push_bounds_for_contact(growth: &mut [f32; 4], bound_dist: &[f32; 4], contact: &ContinuousContact) {
    if !contact.has_contact {
        return;
    }
    let Some(dir) = Cardinal::from_vector(contact.ortho_n) else {
        return;
    };

    let diff = contact.separation - bound_dist[dir.index()];
    if diff > 0.0 {
        growth[dir.index()] = growth[dir.index()].max(diff);
    }

    if contact.ortho_n.x == 0.0 && contact.transposable() {
        let alt = if contact.collider_n.x >= 0.0 { Cardinal::E } else { Cardinal::W };
        let alt_sep = (contact.collider_n.y * contact.separation / contact.collider_n.x).abs();
        let diff = alt_sep - bound_dist[alt.index()];
        if diff > 0.0 {
            growth[alt.index()] = growth[alt.index()].max(diff);
        }
    }
}
