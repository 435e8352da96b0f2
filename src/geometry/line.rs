//! Directed line segments.

use glam::Vec2;

use super::lefthand;

/// A directed segment from `p1` to `p2`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Line {
    pub p1: Vec2,
    pub p2: Vec2,
}

impl Line {
    #[inline]
    pub const fn new(p1: Vec2, p2: Vec2) -> Self {
        Self { p1, p2 }
    }

    /// `p2 - p1`.
    #[inline]
    pub fn vector(&self) -> Vec2 {
        self.p2 - self.p1
    }

    #[inline]
    pub fn reversed(&self) -> Self {
        Self::new(self.p2, self.p1)
    }

    #[inline]
    pub fn is_vertical(&self) -> bool {
        self.p1.x == self.p2.x
    }

    #[inline]
    pub fn is_horizontal(&self) -> bool {
        self.p1.y == self.p2.y
    }

    /// Outward normal: the left hand side of the direction of travel.
    #[inline]
    pub fn normal(&self) -> Vec2 {
        lefthand(self.vector()).normalize_or_zero()
    }

    #[inline]
    pub fn midpoint(&self) -> Vec2 {
        self.p1 + self.vector() * 0.5
    }

    #[inline]
    pub fn shifted(&self, offset: Vec2) -> Self {
        Self::new(self.p1 + offset, self.p2 + offset)
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.vector().length()
    }

    /// Angle of the direction vector in radians.
    #[inline]
    pub fn angle(&self) -> f32 {
        let v = self.vector();
        v.y.atan2(v.x)
    }

    /// Y coordinate of the infinite line at `x`. `None` for vertical lines.
    pub fn y_for_x(&self, x: f32) -> Option<f32> {
        let v = self.vector();
        if v.x == 0.0 {
            return None;
        }
        let scale = (x - self.p1.x) / v.x;
        Some(scale * v.y + self.p1.y)
    }

    /// Intersection of the two infinite lines. NaN components when parallel.
    pub fn intersection(&self, other: &Line) -> Vec2 {
        let det_a = self.p1.x * self.p2.y - self.p1.y * self.p2.x;
        let det_b = other.p1.x * other.p2.y - other.p1.y * other.p2.x;

        let mx_a = self.p1.x - self.p2.x;
        let mx_b = other.p1.x - other.p2.x;
        let my_a = self.p1.y - self.p2.y;
        let my_b = other.p1.y - other.p2.y;

        let denom = mx_a * my_b - my_a * mx_b;
        if denom == 0.0 {
            return Vec2::NAN;
        }

        let x = (det_a * mx_b - det_b * mx_a) / denom;
        let y = (det_a * my_b - det_b * my_a) / denom;
        if !x.is_finite() || !y.is_finite() {
            return Vec2::NAN;
        }
        Vec2::new(x, y)
    }
}
