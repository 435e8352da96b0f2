//! A single candidate resolution direction of a body/quad pair.

use super::contact::DiscreteContact;
use crate::geometry::Cardinal;

/// One separating axis tested by [`CollisionDiscrete`](super::discrete::CollisionDiscrete).
///
/// Real axes come from a quad surface. Corner axes come from concave ghost
/// turns and filler axes from the quad's bounding area; neither is backed by
/// a real surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollisionAxis {
    pub contact: DiscreteContact,
    pub dir: Cardinal,
    /// Quad side this axis was built from.
    pub quad_index: Option<Cardinal>,
    /// False when the body came from the wrong side of a one-way surface.
    pub axis_valid: bool,
    /// Set once the solver resolved the body along this axis this tick.
    pub applied: bool,
    /// Extra separation on walls, from extension and valley offsets.
    pub separation_offset: f32,
    collider_valid: bool,
    collider_real: bool,
}

impl CollisionAxis {
    pub(crate) fn new(
        contact: DiscreteContact,
        dir: Cardinal,
        quad_index: Option<Cardinal>,
        collider_valid: bool,
        collider_real: bool,
    ) -> Self {
        Self {
            contact,
            dir,
            quad_index,
            axis_valid: true,
            applied: false,
            separation_offset: 0.0,
            collider_valid,
            collider_real,
        }
    }

    /// Backed by a surface or a corner, as opposed to a filler.
    #[inline]
    pub fn is_collider_valid(&self) -> bool {
        self.collider_valid
    }

    /// Backed by an actual quad surface.
    #[inline]
    pub fn is_collider_real(&self) -> bool {
        self.collider_real
    }

    /// Fillers count touching (zero separation) as intersecting.
    #[inline]
    pub fn is_intersecting(&self) -> bool {
        if self.collider_valid {
            self.contact.separation > 0.0
        } else {
            self.contact.separation >= 0.0
        }
    }
}
