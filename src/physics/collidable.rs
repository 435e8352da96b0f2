//! Axis-aligned moving bodies.

use glam::Vec2;

use super::contact::{AppliedContact, ContactType, ContinuousContact};
use super::response::Response;
use super::tracker::SurfaceTracker;
use crate::collider::RegionMap;
use crate::geometry::{angle_of, reduce, AngleRange, Cardinal, Rect, TILESIZE};

/// Which axis, if any, a body may slip past one-way edges on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlipState {
    #[default]
    None,
    Vertical,
    Horizontal,
}

/// Slip configuration: the body may clip past edges within `leeway` units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Slip {
    pub state: SlipState,
    pub leeway: f32,
}

/// Summary of the contacts a body received on its last solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollisionFlags {
    pub floor: bool,
    pub ceiling: bool,
    /// Pushed east by a wall on the body's left.
    pub wall_left: bool,
    /// Pushed west by a wall on the body's right.
    pub wall_right: bool,
    pub crush_horizontal: bool,
    pub crush_vertical: bool,
    pub wedge: bool,
}

impl CollisionFlags {
    pub fn has_wall(&self) -> bool {
        self.wall_left || self.wall_right
    }

    pub fn is_crushed(&self) -> bool {
        self.crush_horizontal || self.crush_vertical
    }
}

/// A rectangular body positioned by its bottom-centre point.
///
/// Velocity is held in three parts. Local velocity is what the body's own
/// acceleration, deceleration and friction act on. Parent velocity is motion
/// inherited from platforms and is folded back into local velocity the next
/// time a contact resolves. Surface velocity is the conveyor speed of the
/// tracked surfaces, refreshed every tick. The global velocity is their sum.
#[derive(Debug, Clone)]
pub struct Collidable {
    rect: Rect,
    prev_rect: Rect,
    pos: Vec2,
    prev_pos: Vec2,

    local_vel: Vec2,
    parent_vel: Vec2,
    surface_vel: Vec2,
    precollision_vel: Vec2,

    acc: Vec2,
    accel_accum: Vec2,
    decel_accum: Vec2,
    friction: Vec2,
    gravity: Vec2,

    slip: Slip,
    response: Response,
    trackers: Vec<SurfaceTracker>,
    frame: Vec<AppliedContact>,
    flags: CollisionFlags,
}

fn rect_at(position: Vec2, size: Vec2) -> Rect {
    Rect::new(position.x - size.x / 2.0, position.y - size.y, size.x, size.y)
}

fn bottom_centre(rect: &Rect) -> Vec2 {
    Vec2::new(rect.left + rect.width / 2.0, rect.top + rect.height)
}

impl Collidable {
    pub fn new(position: Vec2, size: Vec2, gravity: Vec2) -> Self {
        if size.x > TILESIZE {
            tracing::warn!(
                "collidable width {} > {} not recommended, may break collision",
                size.x,
                TILESIZE
            );
        }
        let rect = rect_at(position, size);
        Self {
            rect,
            prev_rect: rect,
            pos: bottom_centre(&rect),
            prev_pos: bottom_centre(&rect),
            local_vel: Vec2::ZERO,
            parent_vel: Vec2::ZERO,
            surface_vel: Vec2::ZERO,
            precollision_vel: Vec2::ZERO,
            acc: Vec2::ZERO,
            accel_accum: Vec2::ZERO,
            decel_accum: Vec2::ZERO,
            friction: Vec2::ZERO,
            gravity,
            slip: Slip::default(),
            response: Response::default(),
            trackers: Vec::new(),
            frame: Vec::new(),
            flags: CollisionFlags::default(),
        }
    }

    /// Bottom-centre point.
    pub fn position(&self) -> Vec2 {
        self.pos
    }

    pub fn prev_position(&self) -> Vec2 {
        self.prev_pos
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn prev_rect(&self) -> Rect {
        self.prev_rect
    }

    /// Union of the current and previous rects.
    pub fn bounding_box(&self) -> Rect {
        self.rect.bound(&self.prev_rect)
    }

    pub fn size(&self) -> Vec2 {
        self.rect.size()
    }

    /// Move the bottom-centre point. With `swap_prev` the current rect becomes
    /// the previous one first.
    pub fn set_position(&mut self, position: Vec2, swap_prev: bool) {
        debug_assert!(position.is_finite(), "non-finite collidable position");
        if swap_prev {
            self.prev_rect = self.rect;
            self.prev_pos = bottom_centre(&self.prev_rect);
        }
        self.rect.left = position.x - self.rect.width / 2.0;
        self.rect.top = position.y - self.rect.height;
        self.pos = bottom_centre(&self.rect);
    }

    /// Resize around the current centre. Dimensions are at least 1.
    pub fn set_size(&mut self, size: Vec2) {
        if size.x > TILESIZE {
            tracing::warn!(
                "collidable width {} > {} not recommended, may break collision",
                size.x,
                TILESIZE
            );
        }
        let size = size.max(Vec2::ONE);
        let mid = self.rect.mid();
        self.rect = Rect::from_pos_size(mid - size / 2.0, size);
        self.pos = bottom_centre(&self.rect);
    }

    /// Jump to `position` without sweeping, dropping any tracked surfaces.
    pub fn teleport(&mut self, position: Vec2) {
        self.set_position(position, false);
        self.prev_rect = self.rect;
        self.prev_pos = self.pos;

        let mut trackers = std::mem::take(&mut self.trackers);
        for tracker in &mut trackers {
            tracker.force_end_contact(self);
        }
        self.trackers = trackers;
    }

    pub fn local_vel(&self) -> Vec2 {
        self.local_vel
    }

    pub fn set_local_vel(&mut self, vel: Vec2) {
        self.local_vel = vel;
    }

    pub fn parent_vel(&self) -> Vec2 {
        self.parent_vel
    }

    pub fn set_parent_vel(&mut self, vel: Vec2) {
        self.parent_vel = vel;
    }

    pub fn add_parent_vel(&mut self, vel: Vec2) {
        self.parent_vel += vel;
    }

    pub fn surface_vel(&self) -> Vec2 {
        self.surface_vel
    }

    /// Sum of local, parent and surface velocity.
    pub fn global_vel(&self) -> Vec2 {
        self.local_vel + self.parent_vel + self.surface_vel
    }

    /// Set the global velocity, absorbing parent velocity into the local part.
    pub fn set_global_vel(&mut self, vel: Vec2) {
        self.parent_vel = Vec2::ZERO;
        self.local_vel = vel - self.surface_vel;
    }

    /// Local velocity right after the last integration.
    pub fn precollision_vel(&self) -> Vec2 {
        self.precollision_vel
    }

    /// Acceleration accumulated for the next update.
    pub fn acceleration(&self) -> Vec2 {
        self.accel_accum
    }

    /// Acceleration used by the last update.
    pub fn last_acceleration(&self) -> Vec2 {
        self.acc
    }

    pub fn add_accel(&mut self, accel: Vec2) {
        self.accel_accum += accel;
    }

    /// Deceleration pulls each local velocity component toward zero.
    pub fn add_decel(&mut self, decel: Vec2) {
        self.decel_accum += decel;
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    /// Friction computed by the trackers on the last solve.
    pub fn friction(&self) -> Vec2 {
        self.friction
    }

    pub fn slip(&self) -> Slip {
        self.slip
    }

    pub fn set_slip(&mut self, state: SlipState, leeway: f32) {
        self.slip = Slip { state, leeway };
    }

    pub fn has_slip_vertical(&self) -> bool {
        self.slip.state == SlipState::Vertical
    }

    pub fn response(&self) -> Response {
        self.response
    }

    pub fn set_response(&mut self, response: Response) {
        self.response = response;
    }

    /// Attach a tracker, returning its index.
    pub fn add_tracker(&mut self, tracker: SurfaceTracker) -> usize {
        self.trackers.push(tracker);
        self.trackers.len() - 1
    }

    pub fn trackers(&self) -> &[SurfaceTracker] {
        &self.trackers
    }

    pub fn tracker(&self, index: usize) -> Option<&SurfaceTracker> {
        self.trackers.get(index)
    }

    pub fn tracker_mut(&mut self, index: usize) -> Option<&mut SurfaceTracker> {
        self.trackers.get_mut(index)
    }

    /// Contacts applied on the last solve, in application order.
    pub fn frame(&self) -> &[AppliedContact] {
        &self.frame
    }

    pub fn flags(&self) -> CollisionFlags {
        self.flags
    }

    /// First applied contact that pushed the body toward `dir`.
    pub fn contact(&self, dir: Cardinal) -> Option<&AppliedContact> {
        self.frame
            .iter()
            .find(|c| Cardinal::from_vector(c.contact.ortho_n) == Some(dir))
    }

    /// First applied contact whose surface normal lies in `range`.
    pub fn contact_in_range(&self, range: &AngleRange) -> Option<&AppliedContact> {
        self.frame
            .iter()
            .find(|c| range.within_range(angle_of(c.contact.collider_n)))
    }

    /// Integrate one tick: friction, tracker offsets, acceleration,
    /// deceleration, slope sticking and gravity, in that order.
    pub(crate) fn update(&mut self, regions: &RegionMap, dt: f32) {
        if dt <= 0.0 {
            return;
        }

        let prev_pos = self.pos;
        let mut next_pos = self.pos;

        self.local_vel -= self.friction;

        let mut trackers = std::mem::take(&mut self.trackers);
        let mut surface_vel = Vec2::ZERO;
        for tracker in &mut trackers {
            let offsets = tracker.premove_update(self, regions, dt);
            next_pos += offsets.position;
            self.parent_vel += offsets.velocity;
            self.accel_accum += offsets.acceleration;
            surface_vel += tracker.surface_velocity();
        }
        self.surface_vel = surface_vel;
        self.acc = self.accel_accum;

        self.local_vel += self.acc * dt;
        self.local_vel.x = reduce(self.local_vel.x, self.decel_accum.x * dt, 0.0);
        self.local_vel.y = reduce(self.local_vel.y, self.decel_accum.y * dt, 0.0);

        next_pos += self.global_vel() * dt;

        for tracker in &trackers {
            let offsets = tracker.postmove_update(self, regions, next_pos, prev_pos);
            next_pos += offsets.position;
            self.parent_vel += offsets.velocity;
        }
        self.trackers = trackers;

        self.local_vel += self.gravity * dt;
        next_pos += self.gravity * dt * dt;

        self.precollision_vel = self.local_vel;
        self.set_position(next_pos, true);

        self.accel_accum = Vec2::ZERO;
        self.decel_accum = Vec2::ZERO;
    }

    /// Push the body out along the contact and update its velocity.
    pub(crate) fn apply_contact(&mut self, contact: &ContinuousContact, ty: ContactType) {
        let precontact_vel = self.global_vel();
        self.set_position(self.pos + contact.ortho_n * contact.separation, false);

        if ty.is_crush() {
            self.local_vel = Vec2::ZERO;
            self.parent_vel = Vec2::ZERO;
        } else if ty.is_wedge() {
            self.set_global_vel(contact.velocity);
        } else if (precontact_vel - contact.velocity).dot(contact.collider_n) <= 0.0 {
            let vel = self.response.apply(precontact_vel, contact);
            self.set_global_vel(vel);
        }

        if contact.has_impact_time {
            let applied = AppliedContact::new(*contact, ty, precontact_vel);
            let mut trackers = std::mem::take(&mut self.trackers);
            for tracker in &mut trackers {
                tracker.first_collision_with(self, &applied);
            }
            self.trackers = trackers;
        }
    }

    /// Store the solved frame and let the trackers react to it.
    pub(crate) fn set_frame(&mut self, frame: Vec<AppliedContact>, regions: &RegionMap) {
        let mut flags = CollisionFlags::default();
        for applied in &frame {
            match applied.ty {
                ContactType::Single => match Cardinal::from_vector(applied.contact.ortho_n) {
                    Some(Cardinal::N) => flags.floor = true,
                    Some(Cardinal::S) => flags.ceiling = true,
                    Some(Cardinal::E) => flags.wall_left = true,
                    Some(Cardinal::W) => flags.wall_right = true,
                    None => {}
                },
                ContactType::CrushHorizontal => flags.crush_horizontal = true,
                ContactType::CrushVertical => flags.crush_vertical = true,
                ContactType::WedgeSame | ContactType::WedgeOpposite | ContactType::WedgeWall => {
                    flags.wedge = true
                }
                ContactType::NoSolution => {}
            }
        }
        self.flags = flags;
        self.frame = frame;
        self.friction = Vec2::ZERO;

        let contacts = self.frame.clone();
        let mut trackers = std::mem::take(&mut self.trackers);
        for tracker in &mut trackers {
            tracker.process_contacts(self, &contacts, regions);
            self.friction += tracker.calc_friction(self.precollision_vel);
        }
        self.trackers = trackers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor(sep: f32) -> ContinuousContact {
        ContinuousContact {
            has_contact: true,
            separation: sep,
            ortho_n: Vec2::new(0.0, -1.0),
            collider_n: Vec2::new(0.0, -1.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_position_is_bottom_centre() {
        let body = Collidable::new(Vec2::new(8.0, 32.0), Vec2::new(8.0, 16.0), Vec2::ZERO);
        assert_eq!(body.rect(), Rect::new(4.0, 16.0, 8.0, 16.0));
        assert_eq!(body.position(), Vec2::new(8.0, 32.0));
    }

    #[test]
    fn test_set_position_swaps_prev() {
        let mut body = Collidable::new(Vec2::ZERO, Vec2::new(8.0, 16.0), Vec2::ZERO);
        body.set_position(Vec2::new(10.0, 0.0), true);
        assert_eq!(body.prev_position(), Vec2::ZERO);
        assert_eq!(body.bounding_box(), Rect::new(-4.0, -16.0, 18.0, 16.0));

        body.teleport(Vec2::new(50.0, 50.0));
        assert_eq!(body.prev_rect(), body.rect());
    }

    #[test]
    fn test_set_size_keeps_centre() {
        let mut body = Collidable::new(Vec2::new(0.0, 16.0), Vec2::new(8.0, 16.0), Vec2::ZERO);
        body.set_size(Vec2::new(4.0, 0.0));
        assert_eq!(body.rect(), Rect::new(-2.0, 7.5, 4.0, 1.0));
    }

    #[test]
    fn test_update_integrates_gravity() {
        let mut body = Collidable::new(Vec2::ZERO, Vec2::new(8.0, 16.0), Vec2::new(0.0, 100.0));
        body.update(&RegionMap::new(), 0.5);
        assert_eq!(body.local_vel(), Vec2::new(0.0, 50.0));
        assert_eq!(body.position(), Vec2::new(0.0, 25.0));
        assert_eq!(body.prev_position(), Vec2::ZERO);

        // zero dt does nothing
        body.update(&RegionMap::new(), 0.0);
        assert_eq!(body.position(), Vec2::new(0.0, 25.0));
    }

    #[test]
    fn test_decel_stops_at_zero() {
        let mut body = Collidable::new(Vec2::ZERO, Vec2::new(8.0, 16.0), Vec2::ZERO);
        body.set_local_vel(Vec2::new(10.0, 0.0));
        body.add_decel(Vec2::new(100.0, 0.0));
        body.update(&RegionMap::new(), 0.5);
        assert_eq!(body.local_vel(), Vec2::ZERO);
        assert_eq!(body.acceleration(), Vec2::ZERO);
    }

    #[test]
    fn test_apply_floor_contact() {
        let mut body = Collidable::new(Vec2::new(0.0, 2.0), Vec2::new(8.0, 16.0), Vec2::ZERO);
        body.set_local_vel(Vec2::new(20.0, 60.0));
        body.set_parent_vel(Vec2::new(5.0, 0.0));

        body.apply_contact(&floor(2.0), ContactType::Single);
        assert_eq!(body.position(), Vec2::ZERO);
        assert_eq!(body.local_vel(), Vec2::new(25.0, 0.0));
        assert_eq!(body.parent_vel(), Vec2::ZERO);
    }

    #[test]
    fn test_apply_contact_moving_away_keeps_velocity() {
        let mut body = Collidable::new(Vec2::ZERO, Vec2::new(8.0, 16.0), Vec2::ZERO);
        body.set_local_vel(Vec2::new(0.0, -60.0));
        body.apply_contact(&floor(0.5), ContactType::Single);
        assert_eq!(body.local_vel(), Vec2::new(0.0, -60.0));
    }

    #[test]
    fn test_crush_zeroes_velocity() {
        let mut body = Collidable::new(Vec2::ZERO, Vec2::new(8.0, 16.0), Vec2::ZERO);
        body.set_local_vel(Vec2::new(3.0, 4.0));
        body.apply_contact(&floor(1.0), ContactType::CrushVertical);
        assert_eq!(body.global_vel(), Vec2::ZERO);
    }

    #[test]
    fn test_set_frame_flags() {
        let mut body = Collidable::new(Vec2::ZERO, Vec2::new(8.0, 16.0), Vec2::ZERO);
        let mut wall = floor(1.0);
        wall.ortho_n = Vec2::new(-1.0, 0.0);
        let frame = vec![
            AppliedContact::new(floor(1.0), ContactType::Single, Vec2::ZERO),
            AppliedContact::new(wall, ContactType::Single, Vec2::ZERO),
        ];
        body.set_frame(frame, &RegionMap::new());

        let flags = body.flags();
        assert!(flags.floor && flags.wall_right);
        assert!(!flags.ceiling && !flags.is_crushed());
        assert!(body.contact(Cardinal::W).is_some());
        assert!(body.contact(Cardinal::S).is_none());
    }
}
