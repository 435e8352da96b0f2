//! Convex shapes made of up to four surfaces, one per cardinal slot.

use std::sync::Arc;

use glam::Vec2;

use super::material::{SurfaceMaterial, TileMaterial};
use super::surface::{ColliderSurface, ColliderSurfaceId};
use super::QuadId;
use crate::geometry::{Cardinal, Line, Rect};

/// One slot of a quad.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadSurface {
    pub has_surface: bool,
    pub collider: ColliderSurface,
    pub material: SurfaceMaterial,
}

impl PartialEq for QuadSurface {
    fn eq(&self, other: &Self) -> bool {
        self.has_surface == other.has_surface && self.collider.surface == other.collider.surface
    }
}

/// Convex collision shape with at most four surfaces, indexed by [`Cardinal`].
///
/// The slot a surface occupies names its facing in the source shape; the
/// collision tests classify surfaces by their direction vector instead.
#[derive(Debug, Clone, Default)]
pub struct ColliderQuad {
    pub surfaces: [QuadSurface; 4],
    pub has_one_way: bool,
    pub has_boundary: bool,
    pub one_way_dir: Cardinal,
    pub material: Option<Arc<TileMaterial>>,
    pub mat_facing: Cardinal,
    quad_id: Option<QuadId>,
}

impl PartialEq for ColliderQuad {
    fn eq(&self, other: &Self) -> bool {
        self.surfaces == other.surfaces
    }
}

impl ColliderQuad {
    /// Closed box with real ghosts linking its own four sides. The quad starts
    /// with id 0; [`set_id`](Self::set_id) carries the links over.
    pub fn from_rect(shape: Rect) -> Self {
        let points = [
            shape.top_left(),
            shape.top_right(),
            shape.bot_right(),
            shape.bot_left(),
        ];

        let mut quad = Self::default();
        for dir in Cardinal::ALL {
            let i = dir.index();
            quad.surfaces[i] = QuadSurface {
                has_surface: true,
                collider: ColliderSurface {
                    surface: Line::new(points[i], points[(i + 1) % 4]),
                    ghostp0: points[(i + 3) % 4],
                    ghostp3: points[(i + 2) % 4],
                    g0virtual: false,
                    g3virtual: false,
                    id: None,
                    prev: Some(ColliderSurfaceId { quad: QuadId(0), dir: Cardinal::from_index(i + 3) }),
                    next: Some(ColliderSurfaceId { quad: QuadId(0), dir: Cardinal::from_index(i + 1) }),
                },
                material: SurfaceMaterial::default(),
            };
        }
        quad.set_id(QuadId(0));
        quad
    }

    #[inline]
    pub fn id(&self) -> Option<QuadId> {
        self.quad_id
    }

    /// Assign the quad id. Surface ids follow, as do links into this quad.
    pub fn set_id(&mut self, id: QuadId) {
        let old = self.quad_id.replace(id);
        for dir in Cardinal::ALL {
            let collider = &mut self.surfaces[dir.index()].collider;
            collider.id = Some(ColliderSurfaceId { quad: id, dir });
            for link in [&mut collider.prev, &mut collider.next].into_iter().flatten() {
                if Some(link.quad) == old {
                    link.quad = id;
                }
            }
        }
    }

    #[inline]
    pub fn is_one_way(&self, dir: Cardinal) -> bool {
        self.has_one_way && self.one_way_dir == dir
    }

    #[inline]
    pub fn is_boundary(&self, dir: Cardinal) -> bool {
        self.has_boundary && self.one_way_dir == dir
    }

    pub fn has_any_surface(&self) -> bool {
        self.surfaces.iter().any(|s| s.has_surface)
    }

    pub fn surface(&self, side: Cardinal) -> Option<&ColliderSurface> {
        let slot = &self.surfaces[side.index()];
        slot.has_surface.then_some(&slot.collider)
    }

    pub fn surface_mut(&mut self, side: Cardinal) -> Option<&mut ColliderSurface> {
        let slot = &mut self.surfaces[side.index()];
        if slot.has_surface {
            Some(&mut slot.collider)
        } else {
            None
        }
    }

    pub fn set_surface(&mut self, side: Cardinal, surface: ColliderSurface) {
        let slot = &mut self.surfaces[side.index()];
        slot.has_surface = true;
        slot.collider = surface;
        if let Some(id) = self.quad_id {
            slot.collider.id = Some(ColliderSurfaceId { quad: id, dir: side });
        }
    }

    pub fn remove_surface(&mut self, side: Cardinal) {
        self.surfaces[side.index()].has_surface = false;
    }

    pub fn clear_surfaces(&mut self) {
        for s in &mut self.surfaces {
            s.has_surface = false;
        }
    }

    /// Material for a face, falling back to the slot's own material.
    pub fn surface_material(&self, side: Cardinal) -> SurfaceMaterial {
        match &self.material {
            Some(mat) => mat.surface(side, self.mat_facing),
            None => self.surfaces[side.index()].material,
        }
    }

    pub fn translate(&mut self, offset: Vec2) {
        for s in &mut self.surfaces {
            s.collider.translate(offset);
        }
    }

    /// Bounds of every surface point, present or not.
    pub fn bounds(&self) -> Rect {
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        for s in &self.surfaces {
            for p in [s.collider.surface.p1, s.collider.surface.p2] {
                min = min.min(p);
                max = max.max(p);
            }
        }
        Rect::from_corners(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rect_is_clockwise_and_linked() {
        let mut quad = ColliderQuad::from_rect(Rect::new(0.0, 0.0, 16.0, 32.0));
        quad.set_id(QuadId(3));

        let north = quad.surface(Cardinal::N).copied().unwrap_or_default();
        assert_eq!(north.surface, Line::new(Vec2::new(0.0, 0.0), Vec2::new(16.0, 0.0)));
        assert_eq!(north.surface.normal(), Vec2::new(0.0, -1.0));
        assert_eq!(north.ghostp0, Vec2::new(0.0, 32.0));
        assert_eq!(north.ghostp3, Vec2::new(16.0, 32.0));
        assert_eq!(north.prev, Some(ColliderSurfaceId { quad: QuadId(3), dir: Cardinal::W }));
        assert_eq!(north.next, Some(ColliderSurfaceId { quad: QuadId(3), dir: Cardinal::E }));

        let east = quad.surface(Cardinal::E).copied().unwrap_or_default();
        assert_eq!(east.surface.normal(), Vec2::new(1.0, 0.0));
        assert_eq!(quad.bounds(), Rect::new(0.0, 0.0, 16.0, 32.0));
    }

    #[test]
    fn test_remove_and_translate() {
        let mut quad = ColliderQuad::from_rect(Rect::new(0.0, 0.0, 16.0, 16.0));
        quad.remove_surface(Cardinal::S);
        assert!(quad.surface(Cardinal::S).is_none());
        assert!(quad.has_any_surface());

        quad.translate(Vec2::new(16.0, 0.0));
        let north = quad.surface(Cardinal::N).copied().unwrap_or_default();
        assert_eq!(north.surface.p1, Vec2::new(16.0, 0.0));

        quad.clear_surfaces();
        assert!(!quad.has_any_surface());
    }
}
