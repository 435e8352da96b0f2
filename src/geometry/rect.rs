//! Axis-aligned rectangles in y-down coordinates.

use glam::Vec2;

use super::direction::Cardinal;

/// Rectangle stored as top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    #[inline]
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    /// Rectangle spanning two corners.
    #[inline]
    pub fn from_corners(top_left: Vec2, bot_right: Vec2) -> Self {
        Self::from_pos_size(top_left, bot_right - top_left)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    #[inline]
    pub fn half(&self) -> Vec2 {
        self.size() * 0.5
    }

    #[inline]
    pub fn mid(&self) -> Vec2 {
        Vec2::new(self.left + self.width * 0.5, self.top + self.height * 0.5)
    }

    #[inline]
    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    #[inline]
    pub fn top_right(&self) -> Vec2 {
        Vec2::new(self.right(), self.top)
    }

    #[inline]
    pub fn bot_right(&self) -> Vec2 {
        Vec2::new(self.right(), self.bottom())
    }

    #[inline]
    pub fn bot_left(&self) -> Vec2 {
        Vec2::new(self.left, self.bottom())
    }

    #[inline]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.left + offset.x, self.top + offset.y, self.width, self.height)
    }

    /// Overlap with positive area.
    pub fn intersects(&self, other: &Rect) -> bool {
        let (l, t, r, b) = self.min_max();
        let (ol, ot, or, ob) = other.min_max();
        l.max(ol) < r.min(or) && t.max(ot) < b.min(ob)
    }

    /// Overlap or shared edge.
    pub fn touches(&self, other: &Rect) -> bool {
        let (l, t, r, b) = self.min_max();
        let (ol, ot, or, ob) = other.min_max();
        l.max(ol) <= r.min(or) && t.max(ot) <= b.min(ob)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let (l, t, r, b) = self.min_max();
        point.x >= l && point.x <= r && point.y >= t && point.y <= b
    }

    /// Smallest rectangle containing both.
    pub fn bound(&self, other: &Rect) -> Rect {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }

    /// Grow the side facing `dir` outward by `amount`.
    pub fn extend(&self, dir: Cardinal, amount: f32) -> Rect {
        let mut out = *self;
        match dir {
            Cardinal::N => {
                out.top -= amount;
                out.height += amount;
            }
            Cardinal::E => out.width += amount,
            Cardinal::S => out.height += amount,
            Cardinal::W => {
                out.left -= amount;
                out.width += amount;
            }
        }
        out
    }

    fn min_max(&self) -> (f32, f32, f32, f32) {
        (
            self.left.min(self.right()),
            self.top.min(self.bottom()),
            self.left.max(self.right()),
            self.top.max(self.bottom()),
        )
    }
}
