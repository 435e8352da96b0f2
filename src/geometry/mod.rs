//! 2D geometry primitives used by the collision pipeline.
//!
//! All coordinates are y-down: north is `(0, -1)`.

pub mod direction;
pub mod line;
pub mod rect;

pub use direction::{Cardinal, Ordinal};
pub use line::Line;
pub use rect::Rect;

use std::f32::consts::PI;

use glam::Vec2;

/// Width and height of one tile in world units.
pub const TILESIZE: f32 = 16.0;

/// Rotate a vector a quarter turn toward its left side: `(y, -x)`.
#[inline]
pub fn lefthand(v: Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}

/// Rotate a vector a quarter turn toward its right side: `(-y, x)`.
#[inline]
pub fn righthand(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Project `a` onto `onto`. Axis-aligned targets keep the matching component
/// exactly, avoiding rounding on flat surfaces.
pub fn projection(a: Vec2, onto: Vec2, onto_is_unit: bool) -> Vec2 {
    if onto == Vec2::ZERO {
        return Vec2::ZERO;
    }
    if onto.x == 0.0 {
        return Vec2::new(0.0, a.y);
    }
    if onto.y == 0.0 {
        return Vec2::new(a.x, 0.0);
    }

    let dp = a.dot(onto);
    if onto_is_unit {
        onto * dp
    } else {
        onto * (dp / onto.length_squared())
    }
}

/// Move `value` toward `zero` by `amount` without overshooting it.
#[inline]
pub fn reduce(value: f32, amount: f32, zero: f32) -> f32 {
    if value > zero {
        (value - amount).max(zero)
    } else if value < zero {
        (value + amount).min(zero)
    } else {
        value
    }
}

/// Wrap an angle in radians into `(-PI, PI]`.
pub fn normalize_angle(rad: f32) -> f32 {
    let mut r = rad % (2.0 * PI);
    if r > PI {
        r -= 2.0 * PI;
    } else if r <= -PI {
        r += 2.0 * PI;
    }
    r
}

/// Angle of a vector in radians.
#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Closed (or open) range of angles. Ranges with `min > max` wrap through PI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleRange {
    pub min: f32,
    pub max: f32,
    pub inclusive: bool,
}

impl AngleRange {
    pub fn new(min: f32, max: f32, inclusive: bool) -> Self {
        Self {
            min: normalize_angle(min),
            max: normalize_angle(max),
            inclusive,
        }
    }

    pub fn from_degrees(min: f32, max: f32, inclusive: bool) -> Self {
        Self::new(min.to_radians(), max.to_radians(), inclusive)
    }

    pub fn within_range(&self, angle: f32) -> bool {
        let a = normalize_angle(angle);
        let above = |lo: f32| if self.inclusive { a >= lo } else { a > lo };
        let below = |hi: f32| if self.inclusive { a <= hi } else { a < hi };
        if self.min <= self.max {
            above(self.min) && below(self.max)
        } else {
            above(self.min) || below(self.max)
        }
    }
}
