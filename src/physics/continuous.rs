//! Two-frame collision test yielding a contact with sub-step impact time.

use glam::Vec2;

use super::axis::CollisionAxis;
use super::collidable::Collidable;
use super::contact::{CollisionId, ContinuousContact};
use super::discrete::{CollisionDiscrete, FrameTime};
use crate::collider::{ColliderQuad, ColliderRegion};
use crate::geometry::Cardinal;

/// Fraction of the tick at which an axis separation crosses zero.
#[inline]
fn root(y0: f32, y1: f32) -> f32 {
    -(y0 / (y1 - y0))
}

/// Sweeps a body against one quad between the previous and current frame.
#[derive(Debug, Clone)]
pub struct CollisionContinuous {
    id: CollisionId,
    prev: CollisionDiscrete,
    curr: CollisionDiscrete,
    /// Local-space quad as of the last update.
    quad: ColliderQuad,
    last_axis: Option<usize>,
    contact: ContinuousContact,
    velocity: Vec2,
}

impl CollisionContinuous {
    pub fn new(
        id: CollisionId,
        body: &Collidable,
        region: &dyn ColliderRegion,
        quad: &ColliderQuad,
    ) -> Self {
        let mut continuous = Self {
            id,
            prev: CollisionDiscrete::new(id, body, region, quad, FrameTime::Previous),
            curr: CollisionDiscrete::new(id, body, region, quad, FrameTime::Current),
            quad: quad.clone(),
            last_axis: None,
            contact: ContinuousContact::default(),
            velocity: region.velocity(),
        };
        continuous.eval_contact(body, 0.0, region);
        continuous
    }

    /// Advance to the next tick when `dt > 0`; re-test the current frame only
    /// when `dt == 0`.
    pub fn update(
        &mut self,
        body: &Collidable,
        region: &dyn ColliderRegion,
        quad: &ColliderQuad,
        dt: f32,
    ) {
        let unchanged = self.quad == *quad;
        if !unchanged {
            self.quad = quad.clone();
        }

        if dt > 0.0 {
            if region.prev_position() == region.position() && unchanged {
                // last frame's current test is still valid as this frame's previous
                std::mem::swap(&mut self.prev, &mut self.curr);
                self.prev.set_previous();
                self.prev.update_contact(body);
            } else {
                self.prev.reset(body, region, quad, FrameTime::Previous);
            }
            self.curr.reset(body, region, quad, FrameTime::Current);
        } else {
            self.curr.update_contact(body);
        }
        self.eval_contact(body, dt, region);
    }

    pub fn id(&self) -> CollisionId {
        self.id
    }

    pub fn contact(&self) -> &ContinuousContact {
        &self.contact
    }

    pub fn discrete_contact(&self) -> ContinuousContact {
        (*self.curr.contact()).into()
    }

    pub fn discrete_prev_contact(&self) -> ContinuousContact {
        (*self.prev.contact()).into()
    }

    pub fn current(&self) -> &CollisionDiscrete {
        &self.curr
    }

    pub fn previous(&self) -> &CollisionDiscrete {
        &self.prev
    }

    #[inline]
    pub fn quad_valid(&self) -> bool {
        self.quad.has_any_surface()
    }

    pub fn set_axis_applied(&mut self, ortho_n: Vec2) {
        self.curr.set_axis_applied(ortho_n);
    }

    fn eval_contact(&mut self, body: &Collidable, dt: f32, region: &dyn ColliderRegion) {
        let prev_axes = self.prev.axes();
        let curr_axes = self.curr.axes();
        debug_assert_eq!(prev_axes.len(), curr_axes.len(), "axis count mismatch between frames");

        let mut first_exit = 1.0f32;
        let mut last_entry = 0.0f32;
        let mut touching: Option<(usize, f32)> = None;
        let mut no_collision = false;

        for (i, (p_axis, c_axis)) in prev_axes.iter().zip(curr_axes).enumerate() {
            debug_assert_eq!(p_axis.dir, c_axis.dir);

            let p_intersects = p_axis.is_intersecting() && !p_axis.applied;
            let c_intersects = c_axis.is_intersecting();

            match (p_intersects, c_intersects) {
                (false, false) => no_collision = true,
                (true, false) => {
                    first_exit = first_exit.min(root(p_axis.contact.separation, c_axis.contact.separation));
                }
                (false, true) => {
                    let r = root(p_axis.contact.separation, c_axis.contact.separation);
                    last_entry = last_entry.max(r);

                    if c_axis.is_collider_valid() && (0.0..1.0).contains(&r) {
                        let replace = touching.map_or(true, |(j, best)| {
                            r > best || (r == best && curr_axes[j].contact.separation > c_axis.contact.separation)
                        });
                        if replace {
                            touching = Some((i, r));
                        }
                    }
                }
                (true, true) => {}
            }
        }

        let is_departing = first_exit < 1.0;
        let has_intersect = first_exit >= last_entry;
        let last_repeatable = self
            .last_axis
            .and_then(|i| self.curr.axis(i))
            .is_some_and(|axis| axis.applied);

        let mut contact = ContinuousContact::default();

        if no_collision {
            contact = (*self.curr.contact()).into();
            self.last_axis = None;
        } else if let Some((ndx, _)) = touching.filter(|_| has_intersect) {
            let axis = curr_axes[ndx];
            contact = axis.contact.into();
            contact.has_contact = axis.is_intersecting();

            if contact.has_contact {
                // tunnelling: the opposite side is penetrated yet the body is leaving
                let opposite_intersecting = curr_axes.iter().enumerate().any(|(j, other)| {
                    j != ndx && other.dir == axis.dir.opposite() && other.contact.separation > 0.0
                });
                if is_departing && opposite_intersecting {
                    contact.has_contact &= self.curr.contact().has_contact;
                }
            }

            contact.has_impact_time = last_entry > 0.0;
            contact.impact_time = last_entry;
            self.last_axis = Some(ndx);
        } else if has_intersect {
            match self.last_axis.and_then(|i| self.curr.axis(i)).filter(|_| last_repeatable) {
                Some(axis) => {
                    contact = axis.contact.into();
                    contact.has_contact = axis.is_intersecting();
                }
                None => {
                    contact = (*self.curr.contact()).into();
                    self.last_axis = self.curr.chosen_axis();
                }
            }
        }

        if dt > 0.0 {
            self.velocity = region.velocity();
        }
        contact.velocity = self.velocity;
        contact.id = Some(self.id);
        contact.quad_valid = self.quad_valid();
        self.contact = contact;

        if body.has_slip_vertical() {
            if let Some(slip) = self.vertical_slip_contact(body.slip().leeway) {
                self.contact = slip;
            }
        }
    }

    /// Swap a fresh wall hit for a nearby floor or ceiling within `leeway`.
    fn vertical_slip_contact(&self, leeway: f32) -> Option<ContinuousContact> {
        if leeway <= 0.0 || !self.contact.has_contact || !self.contact.has_impact_time {
            return None;
        }
        if self.contact.ortho_n.y != 0.0 {
            return None;
        }

        let axes = self.curr.axes();
        let first = |dir| axes.iter().find(|a: &&CollisionAxis| a.dir == dir);
        let within = |axis: &&CollisionAxis| {
            axis.is_collider_valid() && axis.contact.separation >= 0.0 && axis.contact.separation <= leeway
        };
        let north = first(Cardinal::N).filter(within);
        let south = first(Cardinal::S).filter(within);

        let chosen = match (north, south) {
            (Some(n), Some(s)) => {
                if s.contact.separation > n.contact.separation {
                    n
                } else {
                    s
                }
            }
            (Some(n), None) => n,
            (None, Some(s)) => s,
            (None, None) => return None,
        };

        let mut slip: ContinuousContact = chosen.contact.into();
        slip.is_slip = true;
        slip.has_impact_time = self.contact.has_impact_time;
        slip.impact_time = self.contact.impact_time;
        slip.velocity = self.contact.velocity;
        slip.id = self.contact.id;
        slip.quad_valid = self.contact.quad_valid;
        Some(slip)
    }
}
