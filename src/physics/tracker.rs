//! Surface tracking: sticking a body to the ground it walks on.
//!
//! A [`SurfaceTracker`] watches the contacts its body receives each tick and
//! keeps hold of the one whose normal falls inside its angle range. While
//! attached, the tracker carries the body along moving platforms, applies
//! surface friction, caps traverse speed and bends the body's motion around
//! slope transitions so it does not launch off convex corners.

use glam::Vec2;

use super::collidable::Collidable;
use super::contact::AppliedContact;
use crate::collider::{ColliderRegion, ColliderSurface, RegionMap};
use crate::geometry::{angle_of, lefthand, normalize_angle, projection, righthand, AngleRange, Line};

/// Tangential speed under which stationary friction applies.
const STATIONARY_SPEED: f32 = 2.0;
/// Tangential speed above which kinetic friction applies.
const KINETIC_SPEED: f32 = 10.0;

/// Friction coefficients of a tracked surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Friction {
    pub stationary: f32,
    pub kinetic: f32,
}

/// Behaviour switches for a [`SurfaceTracker`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerSettings {
    /// Follow the motion of the region being stood on. Default: false.
    pub move_with_platforms: bool,
    /// Stay attached across slope transitions. Default: false.
    pub slope_sticking: bool,
    /// Pin the body in place when walking a slope into a wall. Default: false.
    pub slope_wall_stop: bool,
    /// Apply [`TrackerSettings::surface_friction`]. Default: false.
    pub has_friction: bool,
    /// Carry the body with conveyor surfaces. Default: false.
    pub use_surf_vel: bool,
    /// Default: zero.
    pub surface_friction: Friction,
    /// Largest change in surface angle, in radians, the tracker will follow. Default: 0.
    pub stick_angle_max: f32,
    /// Traverse speed cap. Zero disables the cap. Default: 0.
    pub max_speed: f32,
    /// Fraction of speed lost when sticking through the widest allowed angle. Default: 0.25.
    pub slope_stick_speed_factor: f32,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            move_with_platforms: false,
            slope_sticking: false,
            slope_wall_stop: false,
            has_friction: false,
            use_surf_vel: false,
            surface_friction: Friction::default(),
            stick_angle_max: 0.0,
            max_speed: 0.0,
            slope_stick_speed_factor: 0.25,
        }
    }
}

/// Adjustments a tracker asks its body to make during integration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyOffsets {
    pub position: Vec2,
    /// Added to the body's parent velocity.
    pub velocity: Vec2,
    pub acceleration: Vec2,
}

/// Tracks the surface a body is standing on (or clinging to).
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceTracker {
    /// Accepted range of contact normal angles.
    pub angle_range: AngleRange,
    pub settings: TrackerSettings,
    current: Option<AppliedContact>,
    wall: Option<AppliedContact>,
    contact_time: f32,
    air_time: f32,
}

fn region_of<'a>(regions: &'a RegionMap, contact: &AppliedContact) -> Option<&'a dyn ColliderRegion> {
    contact
        .region()
        .and_then(|id| regions.get(&id))
        .map(|r| r.as_ref())
}

fn same_region(a: &AppliedContact, b: &AppliedContact) -> bool {
    a.region() == b.region()
}

impl SurfaceTracker {
    pub fn new(angle_range: AngleRange) -> Self {
        Self {
            angle_range,
            settings: TrackerSettings::default(),
            current: None,
            wall: None,
            contact_time: 0.0,
            air_time: 0.0,
        }
    }

    pub fn with_settings(mut self, settings: TrackerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn has_contact(&self) -> bool {
        self.current.is_some_and(|c| c.contact.has_contact)
    }

    /// The tracked contact, if any.
    pub fn contact(&self) -> Option<&AppliedContact> {
        self.current.as_ref()
    }

    /// Last wall contact seen while looking for a surface.
    pub fn wall_contact(&self) -> Option<&AppliedContact> {
        self.wall.as_ref()
    }

    /// Seconds spent continuously in contact.
    pub fn contact_time(&self) -> f32 {
        self.contact_time
    }

    /// Seconds spent without contact.
    pub fn air_time(&self) -> f32 {
        self.air_time
    }

    pub fn can_make_contact_with(&self, contact: &AppliedContact) -> bool {
        let angle = angle_of(contact.contact.collider_n);
        let within_stick_max = self.current.map_or(true, |current| {
            let next_ang = angle_of(righthand(current.contact.collider_n));
            let curr_ang = angle_of(righthand(contact.contact.collider_n));
            normalize_angle(next_ang - curr_ang).abs() < self.settings.stick_angle_max.abs()
        });
        self.angle_range.within_range(angle) && within_stick_max
    }

    /// Pick the tracked contact out of a freshly solved frame.
    pub(crate) fn process_contacts(
        &mut self,
        body: &mut Collidable,
        contacts: &[AppliedContact],
        regions: &RegionMap,
    ) {
        self.wall = None;

        let mut found = None;
        for contact in contacts.iter().rev() {
            // moving away from a slip contact
            if contact.contact.is_slip && body.local_vel().dot(contact.contact.collider_n) > 0.0 {
                continue;
            }

            if self.can_make_contact_with(contact) {
                found = Some(*contact);
                break;
            } else if contact.contact.collider_n.y == 0.0 {
                self.wall = Some(*contact);
            }
        }

        match found {
            Some(contact) => {
                match self.current {
                    Some(current) if !same_region(&current, &contact) => {
                        self.end_touch(body, &current, contacts);
                        self.start_touch(body, &contact);
                    }
                    Some(_) => {}
                    None => self.start_touch(body, &contact),
                }
                self.current = Some(contact);
            }
            None => {
                if let Some(current) = self.current {
                    if !self.do_slope_wall_stop(body, regions) {
                        self.end_touch(body, &current, contacts);
                        self.current = None;
                    }
                }
            }
        }

        if !self.has_contact() {
            self.contact_time = 0.0;
        }
    }

    /// Velocity change friction applies this tick, given the body's velocity
    /// before collision.
    pub fn calc_friction(&self, prev_vel: Vec2) -> Vec2 {
        let Some(current) = self.current.filter(|c| c.contact.has_contact) else {
            return Vec2::ZERO;
        };
        let contact = &current.contact;
        if !self.settings.has_friction || (contact.has_impact_time && self.contact_time <= 0.0) {
            return Vec2::ZERO;
        }

        let tangent = projection(prev_vel, righthand(contact.collider_n), true);
        let normal = projection(prev_vel - contact.velocity, contact.collider_n, true);

        let ft = tangent.length();
        let fn_ = normal.length();

        let friction = self.settings.surface_friction;
        let mu = if ft < STATIONARY_SPEED {
            friction.stationary
        } else if ft > KINETIC_SPEED {
            friction.kinetic
        } else {
            let t = (ft - STATIONARY_SPEED) / (KINETIC_SPEED - STATIONARY_SPEED);
            friction.stationary + (friction.kinetic - friction.stationary) * t
        };

        let ff = (fn_ * mu).clamp(-ft, ft);
        tangent.normalize_or_zero() * ff
    }

    /// Platform following, speed capping and timers. Runs before the body moves.
    pub(crate) fn premove_update(
        &mut self,
        body: &mut Collidable,
        regions: &RegionMap,
        dt: f32,
    ) -> BodyOffsets {
        let mut out = BodyOffsets::default();

        if dt > 0.0 && self.has_contact() {
            out = self.do_move_with_platform(regions, out);
            out = self.do_max_speed(body, out, dt);
        }

        if self.has_contact() {
            self.contact_time += dt;
            self.air_time = 0.0;
        } else {
            self.air_time += dt;
        }
        out
    }

    /// Conveyor velocity of the tracked surface, when enabled.
    pub fn surface_velocity(&self) -> Vec2 {
        match self.current {
            Some(c) if self.settings.use_surf_vel && c.contact.has_contact => c.contact.surface_vel(),
            _ => Vec2::ZERO,
        }
    }

    /// Slope sticking. Runs after the body moved to `wish_pos`, before gravity.
    pub(crate) fn postmove_update(
        &self,
        body: &mut Collidable,
        regions: &RegionMap,
        wish_pos: Vec2,
        prev_pos: Vec2,
    ) -> BodyOffsets {
        let mut out = BodyOffsets::default();
        let Some(current) = self.current.filter(|c| c.contact.has_contact) else {
            return out;
        };

        let surface = current.contact.collider.surface;
        let left = surface.p1.x.min(surface.p2.x);
        let right = surface.p1.x.max(surface.p2.x);

        if self.settings.slope_sticking && left < right {
            out.position = self.do_slope_stick(body, regions, &current, wish_pos, prev_pos, left, right);
        }
        out
    }

    /// The body's speed along the tracked surface, signed by the surface direction.
    pub fn traverse_get_speed(&self, body: &Collidable) -> Option<f32> {
        let current = self.current.filter(|c| c.contact.has_contact)?;
        let surf = righthand(current.contact.collider_n);
        let proj = projection(body.local_vel(), surf, true);

        Some(if proj.x == 0.0 {
            0.0
        } else if (proj.x < 0.0) != (surf.x < 0.0) {
            -proj.length()
        } else {
            proj.length()
        })
    }

    pub fn traverse_set_speed(&self, body: &mut Collidable, speed: f32) {
        let Some(current) = self.current.filter(|c| c.contact.has_contact) else {
            return;
        };
        let contact = &current.contact;
        let surf_unit = righthand(contact.collider_n);

        let surf_nv = if self.settings.move_with_platforms && contact.velocity != Vec2::ZERO {
            projection(contact.velocity, contact.collider_n, true)
        } else {
            Vec2::ZERO
        };
        body.set_local_vel(surf_unit * speed + surf_nv);
    }

    pub fn traverse_add_accel(&self, body: &mut Collidable, accel: f32) {
        if let Some(current) = self.current.filter(|c| c.contact.has_contact) {
            body.add_accel(righthand(current.contact.collider_n) * accel);
        }
    }

    pub fn traverse_add_decel(&self, body: &mut Collidable, decel: f32) {
        if let Some(current) = self.current.filter(|c| c.contact.has_contact) {
            body.add_decel(righthand(current.contact.collider_n).abs() * decel);
        }
    }

    /// Latch onto a surface on the tick a body first hits it, using the
    /// contact's stick offset.
    pub(crate) fn first_collision_with(&mut self, body: &mut Collidable, contact: &AppliedContact) {
        if !self.has_contact()
            && self.can_make_contact_with(contact)
            && self.settings.slope_sticking
            && contact.contact.stick_offset != 0.0
        {
            self.start_touch(body, contact);

            let c = &contact.contact;
            body.set_position(body.position() + c.ortho_n * c.stick_offset, false);

            let vel = body.local_vel();
            let along = projection(vel, c.stick_line.vector(), false).normalize_or_zero();
            body.set_local_vel(along * vel.length());
        }
    }

    /// Drop the tracked contact immediately, e.g. on teleport.
    pub fn force_end_contact(&mut self, body: &mut Collidable) {
        if let Some(current) = self.current.take() {
            let frame = body.frame().to_vec();
            self.end_touch(body, &current, &frame);
            self.contact_time = 0.0;
        }
    }

    fn start_touch(&self, body: &mut Collidable, contact: &AppliedContact) {
        if self.settings.move_with_platforms {
            let c = &contact.contact;
            let vel = body.local_vel() - projection(c.velocity, lefthand(c.collider_n), true);
            body.set_local_vel(vel);
        }
    }

    fn end_touch(&self, body: &mut Collidable, contact: &AppliedContact, frame: &[AppliedContact]) {
        if self.settings.move_with_platforms {
            let still_touching = frame.iter().any(|c| same_region(c, contact));
            if !still_touching {
                let c = &contact.contact;
                body.add_parent_vel(projection(c.velocity, lefthand(c.collider_n), true));
            }
        }
    }

    fn do_slope_wall_stop(&self, body: &mut Collidable, regions: &RegionMap) -> bool {
        let (Some(current), Some(wall)) = (self.current, self.wall) else {
            return false;
        };
        let cn = current.contact.collider_n;

        let can_stop = self.settings.slope_wall_stop
            && cn.x != 0.0
            && (cn.x < 0.0) == (wall.contact.collider_n.x < 0.0)
            && body.local_vel().dot(current.contact.ortho_n) > 0.0;

        if can_stop {
            let region = region_of(regions, &current);

            let mut vel = Vec2::ZERO;
            if let Some(r) = region.filter(|r| self.settings.move_with_platforms && r.has_moved()) {
                vel += projection(r.delta_velocity(), cn, true);
            }
            body.set_local_vel(vel);

            let x = body.position().x;
            let surface = current.contact.collider.surface;
            let intersect = surface.intersection(&Line::new(Vec2::new(x, 0.0), Vec2::new(x, 1.0)));
            if intersect.is_finite() {
                body.set_position(intersect, false);
            }
        }
        can_stop
    }

    fn do_move_with_platform(&self, regions: &RegionMap, mut out: BodyOffsets) -> BodyOffsets {
        if !self.settings.move_with_platforms {
            return out;
        }
        if let Some(current) = self.current {
            if let Some(region) = region_of(regions, &current).filter(|r| r.has_moved()) {
                let cn = current.contact.collider_n;
                out.position += projection(region.delta_position(), lefthand(cn), true);
                out.velocity += projection(region.delta_velocity(), cn, true);
            }
        }
        out
    }

    fn do_max_speed(&self, body: &mut Collidable, mut out: BodyOffsets, dt: f32) -> BodyOffsets {
        if !(self.settings.slope_sticking && self.settings.max_speed > 0.0) {
            return out;
        }
        let (Some(current), Some(speed)) = (self.current, self.traverse_get_speed(body)) else {
            return out;
        };

        let acc = body.acceleration();
        let acc_vec = projection(acc, righthand(current.contact.collider_n), true);
        let mut acc_mag = acc_vec.length();
        if acc.x < 0.0 {
            acc_mag = -acc_mag;
        }

        if (speed + acc_mag * dt).abs() > self.settings.max_speed {
            let max = if speed < 0.0 { -self.settings.max_speed } else { self.settings.max_speed };
            self.traverse_set_speed(body, max);
            out.acceleration -= acc_vec;
        }
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn do_slope_stick(
        &self,
        body: &mut Collidable,
        regions: &RegionMap,
        current: &AppliedContact,
        wish_pos: Vec2,
        prev_pos: Vec2,
        left: f32,
        right: f32,
    ) -> Vec2 {
        let region = region_of(regions, current);
        let collider = &current.contact.collider;

        // neighbours are looked up in region space, the contact is already in world space
        let to_world = |mut surface: ColliderSurface| {
            surface.translate(region.map_or(Vec2::ZERO, |r| r.position()));
            surface
        };

        let (next, going_right): (Option<ColliderSurface>, bool) =
            if wish_pos.x > right && prev_pos.x <= right {
                (region.and_then(|r| go_right(r, collider)).map(to_world), true)
            } else if wish_pos.x < left && prev_pos.x >= left {
                (region.and_then(|r| go_left(r, collider)).map(to_world), false)
            } else if wish_pos.x > left && prev_pos.x <= left {
                (Some(*collider), true)
            } else if wish_pos.x < right && prev_pos.x >= right {
                (Some(*collider), false)
            } else {
                (None, false)
            };

        let Some(next) = next else {
            return Vec2::ZERO;
        };

        let next_ang = next.surface.angle();
        let curr_ang = angle_of(righthand(current.contact.collider_n));
        let diff = normalize_angle(next_ang - curr_ang);
        let stick_max = self.settings.stick_angle_max.abs();

        if next_ang == curr_ang
            || !self.angle_range.within_range(next_ang - std::f32::consts::FRAC_PI_2)
            || diff.abs() >= stick_max
        {
            return Vec2::ZERO;
        }

        let anchor = if going_right { next.surface.p1 } else { next.surface.p2 };
        let hyp = wish_pos - anchor;
        let theta = normalize_angle(angle_of(hyp) - next.surface.angle());

        let mut g_ang = next.surface.angle();
        if !going_right {
            g_ang += std::f32::consts::PI;
        }

        let slow = 1.0 - self.settings.slope_stick_speed_factor * (diff / stick_max).abs();
        let vel_mag = body.local_vel().length() * slow;
        body.set_local_vel(Vec2::new(g_ang.cos(), g_ang.sin()) * vel_mag);

        if theta < 0.0 {
            let dist = hyp.length() * theta.sin();
            lefthand(next.surface.vector()).normalize_or_zero() * dist
        } else {
            Vec2::ZERO
        }
    }
}

fn go_left(region: &dyn ColliderRegion, surface: &ColliderSurface) -> Option<ColliderSurface> {
    let line = surface.surface;
    if line.p1.x < line.p2.x {
        let r = region.surface(surface.prev?)?;
        (r.surface.p1.x < r.surface.p2.x).then_some(*r)
    } else if line.p1.x > line.p2.x {
        let r = region.surface(surface.next?)?;
        (r.surface.p1.x > r.surface.p2.x).then_some(*r)
    } else {
        None
    }
}

fn go_right(region: &dyn ColliderRegion, surface: &ColliderSurface) -> Option<ColliderSurface> {
    let line = surface.surface;
    if line.p1.x < line.p2.x {
        let r = region.surface(surface.next?)?;
        (r.surface.p1.x < r.surface.p2.x).then_some(*r)
    } else if line.p1.x > line.p2.x {
        let r = region.surface(surface.prev?)?;
        (r.surface.p1.x > r.surface.p2.x).then_some(*r)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::{ColliderId, ColliderSimple, ColliderTileMap, QuadId};
    use crate::geometry::{Cardinal, Rect};
    use crate::physics::contact::{CollidableId, CollisionId, ContactType, ContinuousContact};
    use glam::IVec2;

    const REGION: CollisionId = CollisionId {
        collidable: CollidableId(0),
        collider: ColliderId(0),
        quad: QuadId(0),
    };

    fn ground_tracker() -> SurfaceTracker {
        SurfaceTracker::new(AngleRange::from_degrees(-135.0, -45.0, true))
    }

    fn floor_contact(velocity: Vec2) -> AppliedContact {
        AppliedContact::new(
            ContinuousContact {
                has_contact: true,
                ortho_n: Vec2::new(0.0, -1.0),
                collider_n: Vec2::new(0.0, -1.0),
                collider: ColliderSurface::new(Line::new(Vec2::ZERO, Vec2::new(16.0, 0.0))),
                velocity,
                ..Default::default()
            },
            ContactType::Single,
            Vec2::ZERO,
        )
    }

    /// Tracker accepting anything from steep floors to flat ground.
    fn wide_tracker(settings: TrackerSettings) -> SurfaceTracker {
        SurfaceTracker::new(AngleRange::from_degrees(-170.0, -10.0, true)).with_settings(settings)
    }

    fn surface_contact(collider: ColliderSurface, collider_n: Vec2) -> AppliedContact {
        AppliedContact::new(
            ContinuousContact {
                has_contact: true,
                ortho_n: Vec2::new(0.0, -1.0),
                collider_n,
                collider,
                id: Some(REGION),
                ..Default::default()
            },
            ContactType::Single,
            Vec2::ZERO,
        )
    }

    fn region_at(position: Vec2) -> RegionMap {
        let mut region = ColliderSimple::new(Rect::new(0.0, 0.0, 16.0, 16.0));
        region.teleport(position);
        let mut regions = RegionMap::new();
        regions.insert(ColliderId(0), Box::new(region));
        regions
    }

    #[test]
    fn test_angle_range_filters_contacts() {
        let tracker = ground_tracker();
        assert!(tracker.can_make_contact_with(&floor_contact(Vec2::ZERO)));

        let mut wall = floor_contact(Vec2::ZERO);
        wall.contact.collider_n = Vec2::new(1.0, 0.0);
        assert!(!tracker.can_make_contact_with(&wall));
    }

    #[test]
    fn test_process_contacts_tracks_floor_and_wall() {
        let mut tracker = ground_tracker();
        let mut body = Collidable::new(Vec2::new(8.0, 0.0), Vec2::new(8.0, 16.0), Vec2::ZERO);
        let regions = RegionMap::new();

        let mut wall = floor_contact(Vec2::ZERO);
        wall.contact.collider_n = Vec2::new(-1.0, 0.0);
        let frame = [floor_contact(Vec2::ZERO), wall];

        tracker.process_contacts(&mut body, &frame, &regions);
        assert!(tracker.has_contact());
        assert!(tracker.wall_contact().is_some());

        tracker.process_contacts(&mut body, &[], &regions);
        assert!(!tracker.has_contact());
        assert_eq!(tracker.contact_time(), 0.0);
    }

    #[test]
    fn test_timers() {
        let mut tracker = ground_tracker();
        let mut body = Collidable::new(Vec2::ZERO, Vec2::new(8.0, 16.0), Vec2::ZERO);
        let regions = RegionMap::new();

        tracker.premove_update(&mut body, &regions, 0.5);
        assert_eq!(tracker.air_time(), 0.5);

        tracker.process_contacts(&mut body, &[floor_contact(Vec2::ZERO)], &regions);
        tracker.premove_update(&mut body, &regions, 0.25);
        assert_eq!(tracker.contact_time(), 0.25);
        assert_eq!(tracker.air_time(), 0.0);
    }

    #[test]
    fn test_friction_regimes() {
        let mut tracker = ground_tracker();
        tracker.settings.has_friction = true;
        tracker.settings.surface_friction = Friction { stationary: 1.0, kinetic: 0.5 };
        let mut body = Collidable::new(Vec2::ZERO, Vec2::new(8.0, 16.0), Vec2::ZERO);
        tracker.process_contacts(&mut body, &[floor_contact(Vec2::ZERO)], &RegionMap::new());

        // kinetic: normal 10 * 0.5 = 5 against a tangent of 20
        let f = tracker.calc_friction(Vec2::new(20.0, 10.0));
        assert!((f - Vec2::new(5.0, 0.0)).length() < 1e-5);

        // stationary friction is clamped to the tangential speed
        let f = tracker.calc_friction(Vec2::new(1.0, 10.0));
        assert!((f - Vec2::new(1.0, 0.0)).length() < 1e-5);

        tracker.settings.has_friction = false;
        assert_eq!(tracker.calc_friction(Vec2::new(20.0, 10.0)), Vec2::ZERO);
    }

    #[test]
    fn test_traverse_speed() {
        let mut tracker = ground_tracker();
        let mut body = Collidable::new(Vec2::ZERO, Vec2::new(8.0, 16.0), Vec2::ZERO);
        assert_eq!(tracker.traverse_get_speed(&body), None);

        tracker.process_contacts(&mut body, &[floor_contact(Vec2::ZERO)], &RegionMap::new());
        tracker.traverse_set_speed(&mut body, -30.0);
        assert_eq!(body.local_vel(), Vec2::new(-30.0, 0.0));
        assert_eq!(tracker.traverse_get_speed(&body), Some(-30.0));

        tracker.traverse_add_accel(&mut body, 5.0);
        assert_eq!(body.acceleration(), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_platform_velocity_carried_on_leave() {
        let mut tracker = ground_tracker();
        tracker.settings.move_with_platforms = true;
        let mut body = Collidable::new(Vec2::ZERO, Vec2::new(8.0, 16.0), Vec2::ZERO);
        let regions = RegionMap::new();

        let platform = floor_contact(Vec2::new(40.0, 0.0));
        tracker.process_contacts(&mut body, &[platform], &regions);
        // landing removes the platform's motion from local velocity
        assert_eq!(body.local_vel(), Vec2::new(-40.0, 0.0));

        tracker.process_contacts(&mut body, &[], &regions);
        assert_eq!(body.parent_vel(), Vec2::new(40.0, 0.0));
        assert_eq!(body.global_vel(), Vec2::ZERO);
    }

    #[test]
    fn test_slope_wall_stop_on_offset_region() {
        let settings = TrackerSettings { slope_wall_stop: true, ..Default::default() };
        let mut tracker = wide_tracker(settings);
        let regions = region_at(Vec2::new(100.0, 0.0));

        // contact surfaces are already in world space
        let line = Line::new(Vec2::new(100.0, 16.0), Vec2::new(116.0, 8.0));
        let slope = surface_contact(ColliderSurface::new(line), lefthand(line.vector()).normalize());
        let mut body = Collidable::new(Vec2::new(108.0, 12.5), Vec2::new(8.0, 16.0), Vec2::ZERO);
        tracker.process_contacts(&mut body, &[slope], &regions);
        assert!(tracker.has_contact());

        let mut wall = slope;
        wall.contact.ortho_n = Vec2::new(-1.0, 0.0);
        wall.contact.collider_n = Vec2::new(-1.0, 0.0);
        body.set_local_vel(Vec2::new(10.0, -10.0));
        tracker.process_contacts(&mut body, &[wall], &regions);

        assert!(tracker.has_contact());
        assert!(tracker.wall_contact().is_some());
        assert_eq!(body.local_vel(), Vec2::ZERO);
        assert!((body.position() - Vec2::new(108.0, 12.0)).length() < 1e-4, "pos = {}", body.position());
    }

    #[test]
    fn test_slope_stick_onto_current_surface_on_offset_region() {
        let settings = TrackerSettings {
            slope_sticking: true,
            stick_angle_max: 50.0_f32.to_radians(),
            ..Default::default()
        };
        let mut tracker = wide_tracker(settings);
        let regions = region_at(Vec2::new(100.0, 0.0));

        // still holding the flat normal from the seam with the ground before the slope
        let line = Line::new(Vec2::new(100.0, 16.0), Vec2::new(116.0, 0.0));
        let slope = surface_contact(ColliderSurface::new(line), Vec2::new(0.0, -1.0));
        let mut body = Collidable::new(Vec2::new(99.0, 16.0), Vec2::new(8.0, 16.0), Vec2::ZERO);
        tracker.process_contacts(&mut body, &[slope], &regions);
        body.set_local_vel(Vec2::new(30.0, 0.0));

        let out = tracker.postmove_update(&mut body, &regions, Vec2::new(102.0, 16.0), Vec2::new(99.0, 16.0));
        assert_eq!(out.position, Vec2::ZERO);

        // turned up the slope, slowed by 0.25 * (45 / 50)
        let expected = Vec2::new(1.0, -1.0).normalize() * 30.0 * 0.775;
        assert!((body.local_vel() - expected).length() < 1e-3, "vel = {}", body.local_vel());
    }

    #[test]
    fn test_slope_stick_over_seam_onto_flat_tile() {
        let settings = TrackerSettings {
            slope_sticking: true,
            stick_angle_max: 50.0_f32.to_radians(),
            ..Default::default()
        };
        let mut tracker = wide_tracker(settings);

        let mut map = ColliderTileMap::from_rows(&["slope solid"], false).unwrap();
        let region_pos = Vec2::new(100.0, 0.0);
        map.teleport(region_pos);
        let mut collider = map
            .tile_quad(IVec2::new(0, 0))
            .and_then(|q| q.surface(Cardinal::N))
            .copied()
            .unwrap();
        assert!(collider.next.is_some());
        collider.translate(region_pos);
        let mut regions = RegionMap::new();
        regions.insert(ColliderId(0), Box::new(map));

        let slope = surface_contact(collider, lefthand(collider.surface.vector()).normalize());
        let mut body = Collidable::new(Vec2::new(115.0, 1.0), Vec2::new(8.0, 16.0), Vec2::ZERO);
        tracker.process_contacts(&mut body, &[slope], &regions);
        body.set_local_vel(Vec2::new(30.0, -30.0));

        // would launch off the top of the slope without sticking
        let wish = Vec2::new(118.0, -2.0);
        let out = tracker.postmove_update(&mut body, &regions, wish, Vec2::new(115.0, 1.0));
        assert!((wish + out.position - Vec2::new(118.0, 0.0)).length() < 1e-4, "offset = {}", out.position);

        let speed = Vec2::new(30.0, -30.0).length() * 0.775;
        assert!((body.local_vel() - Vec2::new(speed, 0.0)).length() < 1e-3, "vel = {}", body.local_vel());
    }

    #[test]
    fn test_slope_stick_ignores_sharp_turns() {
        let settings = TrackerSettings {
            slope_sticking: true,
            stick_angle_max: 30.0_f32.to_radians(),
            ..Default::default()
        };
        let mut tracker = wide_tracker(settings);
        let regions = region_at(Vec2::ZERO);

        let line = Line::new(Vec2::new(0.0, 16.0), Vec2::new(16.0, 0.0));
        let slope = surface_contact(ColliderSurface::new(line), Vec2::new(0.0, -1.0));
        let mut body = Collidable::new(Vec2::new(-1.0, 16.0), Vec2::new(8.0, 16.0), Vec2::ZERO);
        tracker.process_contacts(&mut body, &[slope], &regions);
        body.set_local_vel(Vec2::new(30.0, 0.0));

        let out = tracker.postmove_update(&mut body, &regions, Vec2::new(2.0, 16.0), Vec2::new(-1.0, 16.0));
        assert_eq!(out.position, Vec2::ZERO);
        assert_eq!(body.local_vel(), Vec2::new(30.0, 0.0));
    }

    #[test]
    fn test_max_speed_caps_traverse_speed() {
        let settings = TrackerSettings {
            slope_sticking: true,
            max_speed: 50.0,
            ..Default::default()
        };
        let mut tracker = ground_tracker().with_settings(settings);
        let regions = RegionMap::new();
        let mut body = Collidable::new(Vec2::ZERO, Vec2::new(8.0, 16.0), Vec2::ZERO);
        tracker.process_contacts(&mut body, &[floor_contact(Vec2::ZERO)], &regions);

        // 30 + 600 / 60 stays under the cap
        body.set_local_vel(Vec2::new(30.0, 0.0));
        body.add_accel(Vec2::new(600.0, 0.0));
        let out = tracker.premove_update(&mut body, &regions, 1.0 / 60.0);
        assert_eq!(out.acceleration, Vec2::ZERO);
        assert_eq!(body.local_vel(), Vec2::new(30.0, 0.0));

        // 45 + 600 / 60 does not
        body.set_local_vel(Vec2::new(45.0, 0.0));
        let out = tracker.premove_update(&mut body, &regions, 1.0 / 60.0);
        assert_eq!(out.acceleration, Vec2::new(-600.0, 0.0));
        assert_eq!(body.local_vel(), Vec2::new(50.0, 0.0));
    }

    #[test]
    fn test_platform_motion_offsets_body() {
        let settings = TrackerSettings { move_with_platforms: true, ..Default::default() };
        let mut tracker = ground_tracker().with_settings(settings);
        let mut regions = region_at(Vec2::ZERO);
        let mut body = Collidable::new(Vec2::new(8.0, 0.0), Vec2::new(8.0, 16.0), Vec2::ZERO);

        let line = Line::new(Vec2::ZERO, Vec2::new(16.0, 0.0));
        let floor = surface_contact(ColliderSurface::new(line), Vec2::new(0.0, -1.0));
        tracker.process_contacts(&mut body, &[floor], &regions);

        if let Some(region) = regions.get_mut(&ColliderId(0)) {
            region.move_to(Vec2::new(5.0, -2.0), 0.5);
        }
        let out = tracker.premove_update(&mut body, &regions, 0.5);

        // carried along the surface, pushed along its normal by velocity
        assert_eq!(out.position, Vec2::new(5.0, 0.0));
        assert_eq!(out.velocity, Vec2::new(0.0, -4.0));
    }
}
