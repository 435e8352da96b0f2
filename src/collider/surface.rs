//! A single collidable edge inside a quad, plus its ghost neighbours.

use glam::Vec2;

use super::QuadId;
use crate::geometry::{Cardinal, Line};

/// Address of one surface: the owning quad and the slot it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColliderSurfaceId {
    pub quad: QuadId,
    pub dir: Cardinal,
}

/// Directed edge `p1 -> p2` with the points of the neighbouring surfaces.
///
/// `ghostp0` is the start of the previous surface around the perimeter and
/// `ghostp3` the end of the next one. A virtual ghost has no real neighbour and
/// simply continues the surface direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderSurface {
    pub surface: Line,
    pub ghostp0: Vec2,
    pub ghostp3: Vec2,
    pub g0virtual: bool,
    pub g3virtual: bool,
    pub id: Option<ColliderSurfaceId>,
    pub prev: Option<ColliderSurfaceId>,
    pub next: Option<ColliderSurfaceId>,
}

impl Default for ColliderSurface {
    fn default() -> Self {
        Self {
            surface: Line::default(),
            ghostp0: Vec2::ZERO,
            ghostp3: Vec2::ZERO,
            g0virtual: true,
            g3virtual: true,
            id: None,
            prev: None,
            next: None,
        }
    }
}

impl ColliderSurface {
    /// Surface with virtual ghosts extending the line on both ends.
    pub fn new(surface: Line) -> Self {
        let v = surface.vector();
        Self {
            surface,
            ghostp0: surface.p1 - v,
            ghostp3: surface.p2 + v,
            ..Default::default()
        }
    }

    /// Aggregate used for generated corner axes: no ids, real ghost points.
    pub(crate) fn with_ghosts(surface: Line, ghostp0: Vec2, ghostp3: Vec2) -> Self {
        Self {
            surface,
            ghostp0,
            ghostp3,
            ..Default::default()
        }
    }

    #[inline]
    pub fn ghost_prev(&self) -> Line {
        Line::new(self.ghostp0, self.surface.p1)
    }

    #[inline]
    pub fn ghost_next(&self) -> Line {
        Line::new(self.surface.p2, self.ghostp3)
    }

    /// Same edge traversed the other way.
    pub fn reversed(&self) -> Self {
        Self {
            surface: self.surface.reversed(),
            ghostp0: self.ghostp3,
            ghostp3: self.ghostp0,
            g0virtual: self.g3virtual,
            g3virtual: self.g0virtual,
            id: self.id,
            prev: self.next,
            next: self.prev,
        }
    }

    pub(crate) fn translate(&mut self, offset: Vec2) {
        self.surface = self.surface.shifted(offset);
        self.ghostp0 += offset;
        self.ghostp3 += offset;
    }
}
