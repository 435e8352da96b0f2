//! Tile shapes and their conversion into collision quads.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use glam::{IVec2, Vec2};

use super::material::TileMaterial;
use super::quad::ColliderQuad;
use super::surface::ColliderSurface;
use super::QuadId;
use crate::error::CollisionError;
use crate::geometry::{Cardinal, Line, TILESIZE};

/// Prototype geometry of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileShapeType {
    #[default]
    Empty,
    Solid,
    Half,
    HalfVert,
    Slope,
    Shallow1,
    Shallow2,
    Steep1,
    Steep2,
    Oneway,
    OnewayVert,
    LevelBoundary,
    LevelBoundaryWall,
}

impl TileShapeType {
    pub const ALL: [TileShapeType; 13] = [
        TileShapeType::Empty,
        TileShapeType::Solid,
        TileShapeType::Half,
        TileShapeType::HalfVert,
        TileShapeType::Slope,
        TileShapeType::Shallow1,
        TileShapeType::Shallow2,
        TileShapeType::Steep1,
        TileShapeType::Steep2,
        TileShapeType::Oneway,
        TileShapeType::OnewayVert,
        TileShapeType::LevelBoundary,
        TileShapeType::LevelBoundaryWall,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TileShapeType::Empty => "empty",
            TileShapeType::Solid => "solid",
            TileShapeType::Half => "half",
            TileShapeType::HalfVert => "halfvert",
            TileShapeType::Slope => "slope",
            TileShapeType::Shallow1 => "shallow1",
            TileShapeType::Shallow2 => "shallow2",
            TileShapeType::Steep1 => "steep1",
            TileShapeType::Steep2 => "steep2",
            TileShapeType::Oneway => "oneway",
            TileShapeType::OnewayVert => "onewayvert",
            TileShapeType::LevelBoundary => "levelboundary",
            TileShapeType::LevelBoundaryWall => "levelboundary_wall",
        }
    }

    /// Mirroring across the vertical axis leaves the shape unchanged.
    pub fn has_hori_symmetry(self) -> bool {
        matches!(
            self,
            TileShapeType::Empty
                | TileShapeType::Solid
                | TileShapeType::Half
                | TileShapeType::Oneway
                | TileShapeType::LevelBoundary
        )
    }

    /// Mirroring across the horizontal axis leaves the shape unchanged.
    pub fn has_vert_symmetry(self) -> bool {
        matches!(
            self,
            TileShapeType::Empty
                | TileShapeType::Solid
                | TileShapeType::HalfVert
                | TileShapeType::OnewayVert
                | TileShapeType::LevelBoundaryWall
        )
    }

    /// Unit-square points; surface `i` runs from point `i` to point `i + 1`.
    fn prototype(self) -> ([Vec2; 4], u8) {
        const ALL_SIDES: u8 = 0b1111;
        let n = Cardinal::N.to_bits();
        let e = Cardinal::E.to_bits();
        let s = Cardinal::S.to_bits();
        let w = Cardinal::W.to_bits();
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        match self {
            TileShapeType::Empty | TileShapeType::Solid => (square, ALL_SIDES),
            TileShapeType::Half => (
                [Vec2::new(0.0, 0.5), Vec2::new(1.0, 0.5), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)],
                ALL_SIDES,
            ),
            TileShapeType::HalfVert => (
                [Vec2::new(0.0, 0.0), Vec2::new(0.5, 0.0), Vec2::new(0.5, 1.0), Vec2::new(0.0, 1.0)],
                ALL_SIDES,
            ),
            TileShapeType::Oneway | TileShapeType::LevelBoundary => (square, n),
            TileShapeType::OnewayVert | TileShapeType::LevelBoundaryWall => (square, e),
            TileShapeType::Slope => (
                [Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)],
                n | e | s,
            ),
            TileShapeType::Shallow1 => (
                [Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.5), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)],
                n | e | s,
            ),
            TileShapeType::Shallow2 => (
                [Vec2::new(0.0, 0.5), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)],
                ALL_SIDES,
            ),
            TileShapeType::Steep1 => (
                [Vec2::new(0.5, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)],
                ALL_SIDES,
            ),
            TileShapeType::Steep2 => (
                [Vec2::new(1.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.5, 1.0)],
                e | s | w,
            ),
        }
    }
}

/// A tile prototype plus mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileShape {
    pub ty: TileShapeType,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl TileShape {
    /// Flips that would not change the geometry are dropped.
    pub fn new(ty: TileShapeType, flip_h: bool, flip_v: bool) -> Self {
        Self {
            ty,
            flip_h: flip_h && !ty.has_hori_symmetry(),
            flip_v: flip_v && !ty.has_vert_symmetry(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ty == TileShapeType::Empty
    }

    pub fn is_one_way(&self) -> bool {
        matches!(self.ty, TileShapeType::Oneway | TileShapeType::OnewayVert)
    }

    pub fn is_boundary(&self) -> bool {
        matches!(self.ty, TileShapeType::LevelBoundary | TileShapeType::LevelBoundaryWall)
    }

    /// Whether this shape has a surface lying on the tile edge facing `side`.
    /// Only such surfaces take part in seam culling with the neighbour.
    pub fn touches(&self, side: Cardinal) -> bool {
        if self.is_empty() || self.is_one_way() {
            return false;
        }
        let quad = ColliderTile::new(IVec2::ZERO, *self).to_quad(QuadId(0));
        let Some(s) = quad.surface(side) else {
            return false;
        };
        let Line { p1, p2 } = s.surface;
        match side {
            Cardinal::N => p1.y == 0.0 && p2.y == 0.0,
            Cardinal::E => p1.x == TILESIZE && p2.x == TILESIZE,
            Cardinal::S => p1.y == TILESIZE && p2.y == TILESIZE,
            Cardinal::W => p1.x == 0.0 && p2.x == 0.0,
        }
    }
}

impl FromStr for TileShape {
    type Err = CollisionError;

    /// Parse `"<shape>[-<flips>]"`, e.g. `"slope-hv"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (shape_str, flip_str) = match s.split_once('-') {
            Some((shape, flips)) => (shape, flips),
            None => (s, ""),
        };

        let ty = TileShapeType::ALL
            .into_iter()
            .find(|t| t.label() == shape_str)
            .ok_or_else(|| CollisionError::UnknownTileShape(s.to_string()))?;

        Ok(Self::new(
            ty,
            flip_str.contains(['h', 'H']),
            flip_str.contains(['v', 'V']),
        ))
    }
}

impl fmt::Display for TileShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ty.label())?;
        if self.flip_h || self.flip_v {
            f.write_str("-")?;
            if self.flip_h {
                f.write_str("h")?;
            }
            if self.flip_v {
                f.write_str("v")?;
            }
        }
        Ok(())
    }
}

/// A shape placed on the tile grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColliderTile {
    pub position: IVec2,
    pub shape: TileShape,
    pub material: Option<Arc<TileMaterial>>,
    pub mat_facing: Cardinal,
}

impl ColliderTile {
    pub fn new(position: IVec2, shape: TileShape) -> Self {
        Self {
            position,
            shape,
            material: None,
            mat_facing: Cardinal::N,
        }
    }

    pub fn with_material(mut self, material: Arc<TileMaterial>, facing: Cardinal) -> Self {
        self.material = Some(material);
        self.mat_facing = facing;
        self
    }

    /// Build the quad in region-local coordinates. Ghosts start virtual.
    pub fn to_quad(&self, id: QuadId) -> ColliderQuad {
        let (points, bits) = self.shape.ty.prototype();
        let TileShape { flip_h, flip_v, .. } = self.shape;
        let offset = self.position.as_vec2() * TILESIZE;

        let mut quad = ColliderQuad::default();
        for dir in Cardinal::ALL {
            let i = dir.index();
            let mut line = Line::new(points[i] * TILESIZE, points[(i + 1) % 4] * TILESIZE);

            if flip_h {
                line.p1.x = TILESIZE - line.p1.x;
                line.p2.x = TILESIZE - line.p2.x;
            }
            if flip_v {
                line.p1.y = TILESIZE - line.p1.y;
                line.p2.y = TILESIZE - line.p2.y;
            }
            // keep surfaces clockwise
            if flip_h != flip_v {
                line = line.reversed();
            }

            let slot = &mut quad.surfaces[i];
            slot.has_surface = bits & dir.to_bits() != 0;
            slot.collider = ColliderSurface::new(line.shifted(offset));
        }

        if flip_h {
            swap_facing(&mut quad, Cardinal::E);
        }
        if flip_v {
            swap_facing(&mut quad, Cardinal::N);
        }

        match self.shape.ty {
            TileShapeType::Oneway => {
                quad.has_one_way = true;
                quad.one_way_dir = if flip_v { Cardinal::S } else { Cardinal::N };
            }
            TileShapeType::OnewayVert => {
                quad.has_one_way = true;
                quad.one_way_dir = if flip_h { Cardinal::W } else { Cardinal::E };
            }
            TileShapeType::LevelBoundary => {
                quad.has_boundary = true;
                quad.one_way_dir = if flip_v { Cardinal::S } else { Cardinal::N };
            }
            TileShapeType::LevelBoundaryWall => {
                quad.has_boundary = true;
                quad.one_way_dir = if flip_h { Cardinal::W } else { Cardinal::E };
            }
            _ => {}
        }

        if let Some(mat) = &self.material {
            for dir in Cardinal::ALL {
                quad.surfaces[dir.index()].material = mat.surface(dir, self.mat_facing);
            }
        }
        quad.material = self.material.clone();
        quad.mat_facing = self.mat_facing;
        quad.set_id(id);
        quad
    }
}

/// Move the surfaces of `dir` and its opposite into each other's slot.
fn swap_facing(quad: &mut ColliderQuad, dir: Cardinal) {
    let a = dir.index();
    let b = dir.opposite().index();
    let (lhs, rhs) = (quad.surfaces[a], quad.surfaces[b]);

    if lhs.has_surface && rhs.has_surface {
        quad.surfaces[a].collider = rhs.collider;
        quad.surfaces[b].collider = lhs.collider;
    } else if lhs.has_surface {
        quad.surfaces[b] = lhs;
        quad.surfaces[a].has_surface = false;
    } else if rhs.has_surface {
        quad.surfaces[a] = rhs;
        quad.surfaces[b].has_surface = false;
    }
}
