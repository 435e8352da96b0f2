//! Cardinal and ordinal directions in a y-down world.

use glam::Vec2;

/// One of the four axis-aligned directions.
///
/// The discriminant order (N, E, S, W) is relied upon for sorting axes and
/// indexing per-side arrays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cardinal {
    #[default]
    N = 0,
    E = 1,
    S = 2,
    W = 3,
}

impl Cardinal {
    pub const ALL: [Cardinal; 4] = [Cardinal::N, Cardinal::E, Cardinal::S, Cardinal::W];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Wraps around, so `from_index(5) == E`.
    #[inline]
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    #[inline]
    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    /// Unit vector pointing in this direction (north is negative y).
    #[inline]
    pub fn to_vector(self) -> Vec2 {
        match self {
            Cardinal::N => Vec2::new(0.0, -1.0),
            Cardinal::E => Vec2::new(1.0, 0.0),
            Cardinal::S => Vec2::new(0.0, 1.0),
            Cardinal::W => Vec2::new(-1.0, 0.0),
        }
    }

    /// Direction of an axis-aligned vector. Diagonal or zero vectors have none.
    pub fn from_vector(v: Vec2) -> Option<Self> {
        if v.x == 0.0 && v.y < 0.0 {
            Some(Cardinal::N)
        } else if v.x == 0.0 && v.y > 0.0 {
            Some(Cardinal::S)
        } else if v.y == 0.0 && v.x > 0.0 {
            Some(Cardinal::E)
        } else if v.y == 0.0 && v.x < 0.0 {
            Some(Cardinal::W)
        } else {
            None
        }
    }

    /// True for N and S.
    #[inline]
    pub fn is_vertical(self) -> bool {
        matches!(self, Cardinal::N | Cardinal::S)
    }

    /// True for E and W.
    #[inline]
    pub fn is_horizontal(self) -> bool {
        !self.is_vertical()
    }

    #[inline]
    pub fn to_bits(self) -> u8 {
        1 << self.index()
    }

    /// Angle in radians of this direction's vector, in `(-PI, PI]`.
    pub fn to_angle(self) -> f32 {
        let v = self.to_vector();
        v.y.atan2(v.x)
    }
}

/// One of the four diagonal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ordinal {
    NE = 0,
    SE = 1,
    SW = 2,
    NW = 3,
}

impl Ordinal {
    pub const ALL: [Ordinal; 4] = [Ordinal::NE, Ordinal::SE, Ordinal::SW, Ordinal::NW];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Combine a vertical and a horizontal cardinal, in either order.
    pub fn combine(a: Cardinal, b: Cardinal) -> Option<Self> {
        let (v, h) = if a.is_vertical() { (a, b) } else { (b, a) };
        match (v, h) {
            (Cardinal::N, Cardinal::E) => Some(Ordinal::NE),
            (Cardinal::N, Cardinal::W) => Some(Ordinal::NW),
            (Cardinal::S, Cardinal::E) => Some(Ordinal::SE),
            (Cardinal::S, Cardinal::W) => Some(Ordinal::SW),
            _ => None,
        }
    }
}
