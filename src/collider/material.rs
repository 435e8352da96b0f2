//! Per-surface material properties.

use crate::geometry::Cardinal;

/// Properties of a single collider face.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceMaterial {
    /// Conveyor speed along the surface tangent, in units per second.
    pub velocity: f32,
}

/// Materials for the four faces of a tile.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TileMaterial {
    pub name: String,
    pub surfaces: [SurfaceMaterial; 4],
}

impl TileMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            surfaces: [SurfaceMaterial::default(); 4],
        }
    }

    /// Material with the same conveyor speed on every face.
    pub fn conveyor(name: impl Into<String>, velocity: f32) -> Self {
        Self {
            name: name.into(),
            surfaces: [SurfaceMaterial { velocity }; 4],
        }
    }

    /// Material on `side` of a tile whose material frame is rotated to `facing`.
    pub fn surface(&self, side: Cardinal, facing: Cardinal) -> SurfaceMaterial {
        let ndx = (side.index() as i32 - facing.index() as i32).rem_euclid(4) as usize;
        self.surfaces[ndx]
    }
}
