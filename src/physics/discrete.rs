//! Single-frame collision test between a body and one quad.
//!
//! The quad is turned into a small set of [`CollisionAxis`] candidates:
//! one per floor, ceiling and wall surface, corner axes where a surface's
//! ghost turns concave, and filler axes from the quad's bounding area for the
//! sides it lacks. The body is in contact when it penetrates every axis; the
//! axis of least separation is the one to resolve along.

use glam::Vec2;

use super::axis::CollisionAxis;
use super::collidable::{Collidable, Slip, SlipState};
use super::contact::{CollisionId, DiscreteContact};
use crate::collider::{ColliderQuad, ColliderRegion, ColliderSurface};
use crate::geometry::{lefthand, Cardinal, Line, Ordinal, Rect, TILESIZE};

/// Distance from a valley corner within which the floor is flattened.
pub const VALLEY_FLATTEN_THRESH: f32 = 0.25;

/// Which body rect a discrete test runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTime {
    /// Previous body rect against the region's previous position.
    Previous,
    /// Current body rect against the region's current position.
    Current,
}

#[derive(Debug, Clone, Copy, Default)]
struct BodyData {
    rect: Rect,
    prev: Rect,
    vel: Vec2,
    mid: Vec2,
    half: Vec2,
    slip: Slip,
}

impl BodyData {
    fn new(body: &Collidable, time: FrameTime) -> Self {
        let (rect, vel) = match time {
            FrameTime::Current => (body.rect(), body.local_vel()),
            FrameTime::Previous => (body.prev_rect(), Vec2::ZERO),
        };
        Self {
            rect,
            prev: body.prev_rect(),
            vel,
            mid: rect.mid(),
            half: rect.half(),
            slip: body.slip(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisPreStep {
    dir: Cardinal,
    quad_index: Option<Cardinal>,
    surface: ColliderSurface,
    valid: bool,
    real: bool,
}

impl AxisPreStep {
    fn real(dir: Cardinal, side: Cardinal, surface: ColliderSurface) -> Self {
        Self { dir, quad_index: Some(side), surface, valid: true, real: true }
    }

    fn corner(dir: Cardinal, side: Cardinal, point: Vec2, ghostp0: Vec2, ghostp3: Vec2) -> Self {
        Self {
            dir,
            quad_index: Some(side),
            surface: ColliderSurface::with_ghosts(Line::new(point, point), ghostp0, ghostp3),
            valid: true,
            real: false,
        }
    }

    fn filler(dir: Cardinal, line: Line) -> Self {
        Self {
            dir,
            quad_index: None,
            surface: ColliderSurface::with_ghosts(line, line.p1, line.p2),
            valid: false,
            real: false,
        }
    }
}

/// Collision state of one body against one quad at a single instant.
#[derive(Debug, Clone)]
pub struct CollisionDiscrete {
    id: CollisionId,
    time: FrameTime,
    /// Quad translated into world space.
    quad: ColliderQuad,
    t_area: Rect,
    collider_deltap: Vec2,
    body: BodyData,
    valleys: [bool; 4],
    axes: Vec<CollisionAxis>,
    contact: DiscreteContact,
    chosen_axis: Option<usize>,
}

impl CollisionDiscrete {
    pub fn new(
        id: CollisionId,
        body: &Collidable,
        region: &dyn ColliderRegion,
        quad: &ColliderQuad,
        time: FrameTime,
    ) -> Self {
        let mut discrete = Self {
            id,
            time,
            quad: quad.clone(),
            t_area: Rect::default(),
            collider_deltap: Vec2::ZERO,
            body: BodyData::default(),
            valleys: [false; 4],
            axes: Vec::with_capacity(6),
            contact: DiscreteContact::default(),
            chosen_axis: None,
        };
        discrete.reset(body, region, quad, time);
        discrete
    }

    /// Rebuild all axes from scratch.
    pub fn reset(
        &mut self,
        body: &Collidable,
        region: &dyn ColliderRegion,
        quad: &ColliderQuad,
        time: FrameTime,
    ) {
        self.time = time;
        self.quad = quad.clone();

        match time {
            FrameTime::Current => {
                self.quad.translate(region.position());
                self.collider_deltap = region.delta_position();
            }
            FrameTime::Previous => {
                self.quad.translate(region.prev_position());
                self.collider_deltap = Vec2::ZERO;
            }
        }

        let mut area = self.quad.bounds();
        if area.height == 0.0 {
            if self.quad.is_one_way(Cardinal::N) || self.quad.is_boundary(Cardinal::N) {
                area.height = TILESIZE;
            } else if self.quad.is_one_way(Cardinal::S) || self.quad.is_boundary(Cardinal::S) {
                area.top -= TILESIZE;
                area.height = TILESIZE;
            }
        } else if area.width == 0.0 {
            if self.quad.is_one_way(Cardinal::W) || self.quad.is_boundary(Cardinal::W) {
                area.width = TILESIZE;
            } else if self.quad.is_one_way(Cardinal::E) || self.quad.is_boundary(Cardinal::E) {
                area.left -= TILESIZE;
                area.width = TILESIZE;
            }
        }
        self.t_area = area;

        self.body = BodyData::new(body, time);
        self.create_axes();
        self.update_contact(body);
    }

    /// Re-test the existing axes against the body's rect.
    pub fn update_contact(&mut self, body: &Collidable) {
        self.body = BodyData::new(body, self.time);
        for i in 0..self.axes.len() {
            let mut axis = self.axes[i];
            match axis.dir {
                Cardinal::N => self.update_floor(&mut axis),
                Cardinal::S => self.update_ceil(&mut axis),
                Cardinal::E => {
                    axis.contact.separation =
                        self.t_area.right() - self.body.mid.x + axis.separation_offset;
                    axis.contact.position = Vec2::new(self.t_area.right(), self.wall_y(&axis));
                }
                Cardinal::W => {
                    axis.contact.separation =
                        self.body.mid.x - self.t_area.left + axis.separation_offset;
                    axis.contact.position = Vec2::new(self.t_area.left, self.wall_y(&axis));
                }
            }
            self.axes[i] = axis;
        }
        self.eval_contact();
    }

    /// Demote this test to the previous frame, keeping its axes.
    pub fn set_previous(&mut self) {
        self.time = FrameTime::Previous;
    }

    pub fn time(&self) -> FrameTime {
        self.time
    }

    pub fn contact(&self) -> &DiscreteContact {
        &self.contact
    }

    pub fn axes(&self) -> &[CollisionAxis] {
        &self.axes
    }

    pub fn axis(&self, index: usize) -> Option<&CollisionAxis> {
        self.axes.get(index)
    }

    /// Axis the contact was taken from, when every axis intersects.
    pub fn chosen_axis(&self) -> Option<usize> {
        self.chosen_axis
    }

    pub fn quad(&self) -> &ColliderQuad {
        &self.quad
    }

    pub fn quad_area(&self) -> Rect {
        self.t_area
    }

    /// Mark every axis resolving along `ortho_n` as applied.
    pub fn set_axis_applied(&mut self, ortho_n: Vec2) {
        for axis in &mut self.axes {
            if axis.contact.ortho_n == ortho_n {
                axis.applied = true;
            }
        }
    }

    fn create_axes(&mut self) {
        self.axes.clear();
        self.valleys = [false; 4];

        let mut non_verticals: Vec<AxisPreStep> = Vec::with_capacity(4);
        let mut verticals: Vec<AxisPreStep> = Vec::with_capacity(4);

        let mut has_floor = false;
        let mut has_ceil = false;
        let mut has_east = false;
        let mut has_west = false;
        let mut has_east_corner = false;
        let mut has_west_corner = false;

        for side in Cardinal::ALL {
            let Some(surf) = self.quad.surface(side).copied() else {
                continue;
            };
            let line = surf.surface;
            let v = line.vector();

            if v.x == 0.0 {
                if v.y > 0.0 {
                    has_east = true;
                    verticals.push(AxisPreStep::real(Cardinal::E, side, surf));
                } else {
                    debug_assert!(v.y != 0.0, "degenerate quad surface");
                    has_west = true;
                    verticals.push(AxisPreStep::real(Cardinal::W, side, surf));
                }
            } else if v.x > 0.0 {
                has_floor = true;
                non_verticals.push(AxisPreStep::real(Cardinal::N, side, surf));

                if !has_east_corner && surf.ghostp3.x <= line.p2.x && surf.ghostp3.y >= line.p2.y {
                    has_east_corner = true;
                    verticals.push(AxisPreStep::corner(Cardinal::E, side, line.p2, line.p1, surf.ghostp3));
                }
                if !has_west_corner && surf.ghostp0.x >= line.p1.x && surf.ghostp0.y >= line.p1.y {
                    has_west_corner = true;
                    verticals.push(AxisPreStep::corner(Cardinal::W, side, line.p1, surf.ghostp0, line.p2));
                }
            } else {
                has_ceil = true;
                non_verticals.push(AxisPreStep::real(Cardinal::S, side, surf));

                if !has_east_corner && surf.ghostp0.x <= line.p1.x && surf.ghostp0.y <= line.p1.y {
                    has_east_corner = true;
                    verticals.push(AxisPreStep::corner(Cardinal::E, side, line.p1, surf.ghostp0, line.p2));
                }
                if !has_west_corner && surf.ghostp3.x >= line.p2.x && surf.ghostp3.y <= line.p2.y {
                    has_west_corner = true;
                    verticals.push(AxisPreStep::corner(Cardinal::W, side, line.p2, line.p1, surf.ghostp3));
                }
            }
        }

        let t = self.t_area;
        let (tl, tr, br, bl) = (t.top_left(), t.top_right(), t.bot_right(), t.bot_left());
        if !has_floor {
            non_verticals.push(AxisPreStep::filler(Cardinal::N, Line::new(tl, tr)));
        }
        if !has_ceil {
            non_verticals.push(AxisPreStep::filler(Cardinal::S, Line::new(br, bl)));
        }
        if !has_east && !has_east_corner {
            verticals.push(AxisPreStep::filler(Cardinal::E, Line::new(tr, br)));
        }
        if !has_west && !has_west_corner {
            verticals.push(AxisPreStep::filler(Cardinal::W, Line::new(bl, tl)));
        }

        non_verticals.sort_by_key(|p| p.dir);
        verticals.sort_by_key(|p| p.dir);

        for pre in &non_verticals {
            let axis = match pre.dir {
                Cardinal::N => self.create_floor(pre),
                _ => self.create_ceil(pre),
            };
            self.axes.push(axis);
        }

        for pre in &verticals {
            let keep = match pre.dir {
                Cardinal::E => (has_east && has_east_corner && pre.real) || !has_east || !has_east_corner,
                Cardinal::W => (has_west && has_west_corner && pre.real) || !has_west || !has_west_corner,
                _ => false,
            };
            if keep {
                let axis = self.create_wall(pre);
                self.axes.push(axis);
            }
        }
    }

    fn base_axis(&self, pre: &AxisPreStep) -> CollisionAxis {
        let ortho = pre.dir.to_vector();
        let contact = DiscreteContact {
            collider: pre.surface,
            ortho_n: ortho,
            collider_n: ortho,
            material: Some(self.quad.surface_material(pre.dir)),
            id: Some(self.id),
            ..Default::default()
        };
        CollisionAxis::new(contact, pre.dir, pre.quad_index, pre.valid, pre.real)
    }

    fn slip_leeway(&self, state: SlipState, moving: bool) -> f32 {
        if self.body.slip.state == state && moving {
            self.body.slip.leeway
        } else {
            0.0
        }
    }

    fn create_floor(&self, pre: &AxisPreStep) -> CollisionAxis {
        let mut axis = self.base_axis(pre);

        if self.time == FrameTime::Current && self.quad.is_one_way(Cardinal::N) {
            let cp_mid = self.body.prev.mid();
            let cp_half = self.body.prev.half();
            let surf = &pre.surface;
            let dx = self.collider_deltap.x;

            let (line, valid_ghost) = if cp_mid.x < surf.surface.p1.x - dx {
                (surf.ghost_prev(), !surf.g0virtual)
            } else if cp_mid.x > surf.surface.p2.x - dx {
                (surf.ghost_next(), !surf.g3virtual)
            } else {
                (surf.surface, true)
            };
            let line = line.shifted(-self.collider_deltap);
            let slipv = self.slip_leeway(SlipState::Vertical, self.body.vel.y >= 0.0);

            axis.axis_valid = !line.is_vertical()
                && (valid_ghost || slipv != 0.0)
                && line
                    .y_for_x(cp_mid.x)
                    .is_some_and(|y| y >= cp_mid.y + cp_half.y - slipv);
        }
        axis
    }

    fn create_ceil(&self, pre: &AxisPreStep) -> CollisionAxis {
        let mut axis = self.base_axis(pre);

        if self.time == FrameTime::Current && self.quad.is_one_way(Cardinal::S) {
            let cp_mid = self.body.prev.mid();
            let cp_half = self.body.prev.half();
            let surf = &pre.surface;
            let dx = self.collider_deltap.x;

            let (line, valid_ghost) = if cp_mid.x < surf.surface.p2.x - dx {
                (surf.ghost_next(), !surf.g3virtual)
            } else if cp_mid.x > surf.surface.p1.x - dx {
                (surf.ghost_prev(), !surf.g0virtual)
            } else {
                (surf.surface, true)
            };
            let line = line.shifted(-self.collider_deltap);
            let slipv = self.slip_leeway(SlipState::Vertical, self.body.vel.y <= 0.0);

            axis.axis_valid = !line.is_vertical()
                && (valid_ghost || slipv != 0.0)
                && line
                    .y_for_x(cp_mid.x)
                    .is_some_and(|y| y <= cp_mid.y - cp_half.y + slipv);
        }
        axis
    }

    fn create_wall(&mut self, pre: &AxisPreStep) -> CollisionAxis {
        let mut axis = self.base_axis(pre);
        let dir = pre.dir;

        let p_mid = self.body.prev.mid() + self.collider_deltap;
        let extend = self.wall_can_extend(&axis, dir, p_mid);
        let has_valley = self.wall_has_valley(&axis, dir);

        if self.time == FrameTime::Current && self.quad.is_one_way(dir) {
            let t = self.t_area;
            axis.axis_valid = match dir {
                Cardinal::E => {
                    let sliph = self.slip_leeway(SlipState::Horizontal, self.body.vel.x <= 0.0);
                    self.body.prev.left >= t.right() - sliph
                }
                _ => {
                    let sliph = self.slip_leeway(SlipState::Horizontal, self.body.vel.x >= 0.0);
                    self.body.prev.right() <= t.left + sliph
                }
            };
        }

        axis.separation_offset = (if extend { self.body.half.x } else { 0.0 })
            + (if has_valley { VALLEY_FLATTEN_THRESH } else { 0.0 });
        axis
    }

    /// Whether a wall resolves by the body's whole half width rather than its centre.
    fn wall_can_extend(&self, axis: &CollisionAxis, dir: Cardinal, p_mid: Vec2) -> bool {
        let north = self.quad.surface(Cardinal::N);
        let south = self.quad.surface(Cardinal::S);
        let mut extend = axis.is_collider_valid();

        if !extend && (self.quad.is_one_way(Cardinal::N) || self.quad.is_one_way(Cardinal::S)) {
            // a one-way that doesn't continue on this side
            extend = match dir {
                Cardinal::E => north.is_some_and(|n| n.g3virtual) || south.is_some_and(|s| s.g0virtual),
                Cardinal::W => north.is_some_and(|n| n.g0virtual) || south.is_some_and(|s| s.g3virtual),
                _ => false,
            };
        } else if self.time == FrameTime::Current && extend {
            let t_mid = self.t_area.mid();
            let t_half = self.t_area.half();
            let c_mid = self.body.mid;

            let passing = match dir {
                Cardinal::E => p_mid.x <= t_mid.x + t_half.x && c_mid.x > t_mid.x + t_half.x,
                _ => p_mid.x >= t_mid.x - t_half.x && c_mid.x < t_mid.x - t_half.x,
            };
            let same_way = |a: &Line, b: &Line| (a.p1.x < a.p2.x) == (b.p1.x < b.p2.x);

            let mut prev_above = false;
            let mut prev_below = false;

            if let Some(n) = north.filter(|_| passing) {
                let line = n.surface;
                let next = if dir == Cardinal::E { n.ghost_next() } else { n.ghost_prev() };
                let still_passing = if dir == Cardinal::E {
                    line.p2.x == t_mid.x + t_half.x
                } else {
                    line.p1.x == t_mid.x - t_half.x
                };
                prev_above = !next.is_vertical() && p_mid.y < t_mid.y && still_passing && same_way(&next, &line);
            }

            if let Some(s) = south.filter(|_| passing) {
                let line = s.surface;
                let next = if dir == Cardinal::W { s.ghost_next() } else { s.ghost_prev() };
                let still_passing = if dir == Cardinal::E {
                    line.p1.x == t_mid.x + t_half.x
                } else {
                    line.p2.x == t_mid.x - t_half.x
                };
                prev_below = !next.is_vertical() && p_mid.y > t_mid.y && still_passing && same_way(&next, &line);
            }

            if prev_above || prev_below {
                extend = false;
            }
        }
        extend
    }

    /// Record concave floor/ceiling corners next to a filler wall.
    fn wall_has_valley(&mut self, axis: &CollisionAxis, dir: Cardinal) -> bool {
        if axis.is_collider_valid() {
            return false;
        }

        let mut has_valley = false;
        for other in &self.axes {
            let Some(ord) = Ordinal::combine(other.dir, dir) else {
                continue;
            };
            if !other.is_collider_real() {
                continue;
            }

            let surf = &other.contact.collider;
            let (p1, p2) = (surf.surface.p1, surf.surface.p2);
            let concave = match ord {
                Ordinal::NW => p1.y > surf.ghostp0.y && p1.y > p2.y,
                Ordinal::NE => p2.y > surf.ghostp3.y && p2.y > p1.y,
                Ordinal::SE => p1.y < surf.ghostp0.y && p1.y < p2.y,
                Ordinal::SW => p2.y < surf.ghostp3.y && p2.y < p1.y,
            };
            if concave {
                self.valleys[ord.index()] = true;
                has_valley = true;
            }
        }
        has_valley
    }

    fn clamp_x(&self, x: f32) -> f32 {
        x.max(self.t_area.left).min(self.t_area.right())
    }

    fn wall_y(&self, axis: &CollisionAxis) -> f32 {
        let line = axis.contact.collider.surface;
        self.body.mid.y.max(line.p1.y.min(line.p2.y)).min(line.p1.y.max(line.p2.y))
    }

    fn has_quad_surface(&self, axis: &CollisionAxis) -> bool {
        axis.quad_index.is_some_and(|side| self.quad.surface(side).is_some())
    }

    fn update_floor(&self, axis: &mut CollisionAxis) {
        let t = self.t_area;
        let mid = self.body.mid;
        let bottom = mid.y + self.body.half.y;
        let surf = axis.contact.collider;
        let line = surf.surface;
        let clamped = self.clamp_x(mid.x);

        let mut y = t.top;
        if !line.is_horizontal() {
            y = line.y_for_x(mid.x).unwrap_or(t.top);
            axis.contact.collider_n = lefthand(line.vector()).normalize_or_zero();

            if self.body.prev.bottom() <= t.top - self.collider_deltap.y
                && y <= t.top
                && self.has_quad_surface(axis)
                && clamped != mid.x
            {
                if (mid.x > t.right() && surf.ghost_next().p2.y >= t.top)
                    || (mid.x < t.left && surf.ghost_prev().p1.y >= t.top)
                {
                    axis.contact.collider_n = Vec2::new(0.0, -1.0);
                }
                y = t.top;
            }
        }

        axis.contact.separation = bottom - y;
        axis.contact.position = Vec2::new(clamped, y);

        axis.contact.stick_offset = 0.0;
        axis.contact.stick_line = Line::default();

        let p_mid = self.body.prev.mid();
        let left = surf.ghost_prev();
        let right = surf.ghost_next();
        let stick = if left.p1.x < left.p2.x && mid.x < t.left && p_mid.x >= t.left {
            Some(left)
        } else if right.p1.x < right.p2.x && mid.x > t.right() && p_mid.x <= t.right() {
            Some(right)
        } else {
            None
        };
        if let Some((stick_line, stick_y)) = stick.and_then(|l| Some((l, l.y_for_x(mid.x)?))) {
            axis.contact.stick_offset = y - stick_y;
            axis.contact.stick_line = stick_line;
        }
    }

    fn update_ceil(&self, axis: &mut CollisionAxis) {
        let t = self.t_area;
        let mid = self.body.mid;
        let top = mid.y - self.body.half.y;
        let surf = axis.contact.collider;
        let line = surf.surface;
        let clamped = self.clamp_x(mid.x);

        let mut y = t.bottom();
        if !line.is_horizontal() {
            y = line.y_for_x(mid.x).unwrap_or(t.bottom());
            axis.contact.collider_n = lefthand(line.vector()).normalize_or_zero();

            if self.body.prev.top >= t.bottom() - self.collider_deltap.y
                && y >= t.bottom()
                && self.has_quad_surface(axis)
                && clamped != mid.x
            {
                if (mid.x > t.right() && surf.ghost_prev().p1.y <= t.bottom())
                    || (mid.x < t.left && surf.ghost_next().p2.y <= t.bottom())
                {
                    axis.contact.collider_n = Vec2::new(0.0, 1.0);
                }
                y = t.bottom();
            }
        }

        axis.contact.separation = y - top;
        axis.contact.position = Vec2::new(clamped, y);

        axis.contact.stick_offset = 0.0;
        axis.contact.stick_line = Line::default();

        // ceilings run right to left
        let p_mid = self.body.prev.mid();
        let left = surf.ghost_next();
        let right = surf.ghost_prev();
        let stick = if left.p1.x > left.p2.x && mid.x < t.left && p_mid.x >= t.left {
            Some(left)
        } else if right.p1.x > right.p2.x && mid.x > t.right() && p_mid.x <= t.right() {
            Some(right)
        } else {
            None
        };
        if let Some((stick_line, stick_y)) = stick.and_then(|l| Some((l, l.y_for_x(mid.x)?))) {
            axis.contact.stick_offset = stick_y - y;
            axis.contact.stick_line = stick_line;
        }
    }

    fn eval_contact(&mut self) {
        let t = self.t_area;
        let mid = self.body.mid;
        let half = self.body.half;
        let valley = |ord: Ordinal| self.valleys[ord.index()];
        let (ne, nw, se, sw) = (valley(Ordinal::NE), valley(Ordinal::NW), valley(Ordinal::SE), valley(Ordinal::SW));

        let mut no_contact = 0usize;
        for axis in &mut self.axes {
            let (p1, p2) = (axis.contact.collider.surface.p1, axis.contact.collider.surface.p2);
            match axis.dir {
                Cardinal::N => {
                    if (ne && mid.x > t.right() - VALLEY_FLATTEN_THRESH)
                        || (nw && mid.x < t.left + VALLEY_FLATTEN_THRESH)
                    {
                        axis.contact.collider_n = axis.contact.ortho_n;
                        let flat_sep = (mid.y + half.y) - p1.y.max(p2.y);
                        axis.contact.separation = axis.contact.separation.max(flat_sep);
                    }
                    axis.contact.has_valley = ne || nw;
                }
                Cardinal::S => {
                    if (se && mid.x > t.right() - VALLEY_FLATTEN_THRESH)
                        || (sw && mid.x < t.left + VALLEY_FLATTEN_THRESH)
                    {
                        axis.contact.collider_n = axis.contact.ortho_n;
                        let flat_sep = p1.y.min(p2.y) - (mid.y - half.y);
                        axis.contact.separation = axis.contact.separation.max(flat_sep);
                    }
                    axis.contact.has_valley = se || sw;
                }
                _ => {}
            }

            axis.contact.has_contact = axis.axis_valid && axis.is_intersecting();
            if !axis.contact.has_contact {
                no_contact += 1;
            }
        }

        let mut best: Option<usize> = None;
        let mut second: Option<usize> = None;
        let mut oneway: Option<usize> = None;

        if no_contact == 0 {
            for (i, axis) in self.axes.iter().enumerate() {
                let better = best.map_or(true, |b| axis.contact.separation < self.axes[b].contact.separation);
                if axis.is_collider_valid() && better {
                    best = Some(i);
                }
            }
        } else if no_contact == 1 {
            for (i, axis) in self.axes.iter().enumerate() {
                if axis.is_collider_valid() && !axis.is_intersecting() {
                    second = Some(i);
                }
                if self.quad.is_one_way(axis.dir) {
                    oneway = Some(i);
                }
            }
        }

        self.chosen_axis = best;
        let mut contact = best
            .or(second)
            .or(oneway)
            .map_or_else(DiscreteContact::default, |i| self.axes[i].contact);
        contact.has_contact = no_contact == 0 && best.is_some();
        contact.id = Some(self.id);
        self.contact = contact;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::{ColliderId, ColliderSimple, ColliderTileMap, QuadId};
    use glam::IVec2;
    use crate::physics::contact::CollidableId;

    const ID: CollisionId = CollisionId {
        collidable: CollidableId(0),
        collider: ColliderId(0),
        quad: QuadId(0),
    };

    fn body_at(pos: Vec2) -> Collidable {
        Collidable::new(pos, Vec2::new(8.0, 16.0), Vec2::ZERO)
    }

    fn block() -> ColliderSimple {
        ColliderSimple::new(Rect::new(0.0, 0.0, 16.0, 16.0))
    }

    fn test_against(body: &Collidable, region: &ColliderSimple) -> CollisionDiscrete {
        CollisionDiscrete::new(ID, body, region, region.quad(), FrameTime::Current)
    }

    #[test]
    fn test_box_axes() {
        let region = block();
        let discrete = test_against(&body_at(Vec2::new(8.0, 0.5)), &region);
        let dirs: Vec<Cardinal> = discrete.axes().iter().map(|a| a.dir).collect();
        // the box's corner axes are shadowed by its real walls
        assert_eq!(dirs, vec![Cardinal::N, Cardinal::S, Cardinal::E, Cardinal::W]);
        assert!(discrete.axes().iter().all(|a| a.is_collider_real()));
    }

    #[test]
    fn test_resting_on_floor() {
        let region = block();
        let discrete = test_against(&body_at(Vec2::new(8.0, 0.5)), &region);
        let contact = discrete.contact();
        assert!(contact.has_contact);
        assert_eq!(contact.ortho_n, Vec2::new(0.0, -1.0));
        assert!((contact.separation - 0.5).abs() < 1e-5);
        assert_eq!(contact.position, Vec2::new(8.0, 0.0));
        assert_eq!(contact.id, Some(ID));
        assert_eq!(discrete.chosen_axis(), Some(0));
    }

    #[test]
    fn test_above_floor_falls_back_to_nearest_axis() {
        let region = block();
        let discrete = test_against(&body_at(Vec2::new(8.0, -1.0)), &region);
        let contact = discrete.contact();
        assert!(!contact.has_contact);
        assert_eq!(contact.ortho_n, Vec2::new(0.0, -1.0));
        assert!((contact.separation + 1.0).abs() < 1e-5);
        assert_eq!(discrete.chosen_axis(), None);
    }

    #[test]
    fn test_wall_uses_half_width() {
        let region = block();
        let discrete = test_against(&body_at(Vec2::new(18.0, 16.0)), &region);
        let contact = discrete.contact();
        assert!(contact.has_contact);
        assert_eq!(contact.ortho_n, Vec2::new(1.0, 0.0));
        assert!((contact.separation - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_one_way_from_below() {
        let mut region = block();
        region.make_one_way();
        let discrete = test_against(&body_at(Vec2::new(8.0, 10.0)), &region);

        let floor = discrete.axis(0).copied().unwrap_or_default();
        assert_eq!(floor.dir, Cardinal::N);
        assert!(!floor.axis_valid);

        let contact = discrete.contact();
        assert!(!contact.has_contact);
        assert_eq!(contact.ortho_n, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_one_way_from_above() {
        let mut region = block();
        region.make_one_way();
        let mut body = body_at(Vec2::new(8.0, -1.0));
        body.set_position(Vec2::new(8.0, 0.5), true);

        let discrete = test_against(&body, &region);
        let contact = discrete.contact();
        assert!(contact.has_contact);
        assert!((contact.separation - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_previous_frame_uses_prev_rect() {
        let region = block();
        let mut body = body_at(Vec2::new(8.0, -4.0));
        body.set_position(Vec2::new(8.0, 2.0), true);

        let prev = CollisionDiscrete::new(ID, &body, &region, region.quad(), FrameTime::Previous);
        assert!(!prev.contact().has_contact);

        let curr = test_against(&body, &region);
        assert!(curr.contact().has_contact);
        assert!((curr.contact().separation - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_slope_floor_normal() {
        let mut region = block();
        // 45 degree slope rising to the east
        let slope = ColliderSurface::new(Line::new(Vec2::new(0.0, 16.0), Vec2::new(16.0, 0.0)));
        region.quad_mut().set_surface(Cardinal::N, slope);
        region.quad_mut().remove_surface(Cardinal::E);

        let discrete = test_against(&body_at(Vec2::new(8.0, 9.0)), &region);
        let contact = discrete.contact();
        assert!(contact.has_contact);
        assert!((contact.separation - 1.0).abs() < 1e-4);
        let n = Vec2::new(-1.0, -1.0).normalize();
        assert!((contact.collider_n - n).length() < 1e-5);
    }

    #[test]
    fn test_set_axis_applied() {
        let region = block();
        let mut discrete = test_against(&body_at(Vec2::new(8.0, 0.5)), &region);
        discrete.set_axis_applied(Vec2::new(0.0, -1.0));
        assert!(discrete.axes()[0].applied);
        assert!(!discrete.axes()[1].applied);
    }

    #[test]
    fn test_filler_never_picked_on_floor_row() {
        let map = ColliderTileMap::from_rows(&[".", ".", "solid solid"], false).unwrap();
        let quad = map.tile_quad(IVec2::new(0, 2)).unwrap();
        assert!(quad.surface(Cardinal::E).is_none());

        // 3 deep into the floor, half a unit past the culled east side
        let body = body_at(Vec2::new(15.5, 35.0));
        let discrete = CollisionDiscrete::new(ID, &body, &map, quad, FrameTime::Current);
        let east = discrete.axes().iter().find(|a| a.dir == Cardinal::E).copied().unwrap_or_default();
        assert!(!east.is_collider_valid());
        assert!(east.is_intersecting());

        let contact = discrete.contact();
        assert!(contact.has_contact);
        assert_eq!(contact.ortho_n, Vec2::new(0.0, -1.0));
        assert!((contact.separation - 3.0).abs() < 1e-5);
        assert_eq!(discrete.chosen_axis(), Some(0));
    }

    #[test]
    fn test_flat_one_way_gets_tile_deep_area() {
        let mut region = ColliderSimple::new(Rect::new(0.0, 0.0, 16.0, 0.0));
        region.make_one_way();
        let discrete = test_against(&body_at(Vec2::new(8.0, -1.0)), &region);
        assert_eq!(discrete.quad_area(), Rect::new(0.0, 0.0, 16.0, TILESIZE));
    }
}
