//! Contact data structures for collision response.

use std::cmp::Ordering;
use std::fmt;

use glam::Vec2;

use crate::collider::{ColliderId, ColliderSurface, QuadId, SurfaceMaterial};
use crate::geometry::{righthand, Line};

/// Handle of a body registered with a [`CollisionSystem`](super::CollisionSystem).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollidableId(pub u32);

/// Identity of one (body, region, quad) pairing. Ordered lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollisionId {
    pub collidable: CollidableId,
    pub collider: ColliderId,
    pub quad: QuadId,
}

/// How a contact was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContactType {
    #[default]
    NoSolution,
    /// Typical case, from a single arbiter.
    Single,
    /// Wedge between two surfaces leaning the same way.
    WedgeSame,
    /// Wedge between two surfaces leaning opposite ways.
    WedgeOpposite,
    /// Wedge where one of the surfaces is a wall.
    WedgeWall,
    CrushHorizontal,
    CrushVertical,
}

impl ContactType {
    #[inline]
    pub fn is_crush(self) -> bool {
        matches!(self, ContactType::CrushHorizontal | ContactType::CrushVertical)
    }

    #[inline]
    pub fn is_wedge(self) -> bool {
        matches!(
            self,
            ContactType::WedgeSame | ContactType::WedgeOpposite | ContactType::WedgeWall
        )
    }
}

impl fmt::Display for ContactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContactType::NoSolution => "No solution",
            ContactType::Single => "Single",
            ContactType::WedgeSame => "Wedge same",
            ContactType::WedgeOpposite => "Wedge opposite",
            ContactType::WedgeWall => "Wedge wall",
            ContactType::CrushHorizontal => "Crush horizontal",
            ContactType::CrushVertical => "Crush vertical",
        })
    }
}

/// Contact for a single frame: a body against one surface of one quad.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DiscreteContact {
    /// Surface in contact, in world space.
    pub collider: ColliderSurface,
    /// Resolution direction. Zero when unresolvable.
    pub ortho_n: Vec2,
    /// Normal of the touched surface.
    pub collider_n: Vec2,
    pub separation: f32,
    pub position: Vec2,
    /// Distance along `ortho_n` to stay attached to the surface next tick.
    pub stick_offset: f32,
    pub stick_line: Line,
    pub has_contact: bool,
    pub has_valley: bool,
    pub material: Option<SurfaceMaterial>,
    pub id: Option<CollisionId>,
}

impl DiscreteContact {
    #[inline]
    pub fn is_resolvable(&self) -> bool {
        self.ortho_n != Vec2::ZERO
    }

    /// Conveyor velocity of the surface along its tangent.
    pub fn surface_vel(&self) -> Vec2 {
        self.material
            .map_or(Vec2::ZERO, |m| righthand(self.collider_n) * m.velocity)
    }
}

/// Contact over a whole tick, with sub-step timing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinuousContact {
    pub collider: ColliderSurface,
    pub ortho_n: Vec2,
    pub collider_n: Vec2,
    pub separation: f32,
    pub position: Vec2,
    pub stick_offset: f32,
    pub stick_line: Line,
    pub has_contact: bool,
    pub has_valley: bool,
    pub material: Option<SurfaceMaterial>,
    pub id: Option<CollisionId>,

    /// Fraction of the tick at which the body started intersecting, or -1.
    pub impact_time: f32,
    pub has_impact_time: bool,
    pub is_slip: bool,
    pub quad_valid: bool,
    /// World-space velocity of the surface.
    pub velocity: Vec2,
    pub touch_duration: f32,
    pub is_transposed: bool,
}

impl Default for ContinuousContact {
    fn default() -> Self {
        DiscreteContact::default().into()
    }
}

impl From<DiscreteContact> for ContinuousContact {
    fn from(c: DiscreteContact) -> Self {
        Self {
            collider: c.collider,
            ortho_n: c.ortho_n,
            collider_n: c.collider_n,
            separation: c.separation,
            position: c.position,
            stick_offset: c.stick_offset,
            stick_line: c.stick_line,
            has_contact: c.has_contact,
            has_valley: c.has_valley,
            material: c.material,
            id: c.id,
            impact_time: -1.0,
            has_impact_time: false,
            is_slip: false,
            quad_valid: false,
            velocity: Vec2::ZERO,
            touch_duration: 0.0,
            is_transposed: false,
        }
    }
}

impl ContinuousContact {
    #[inline]
    pub fn is_resolvable(&self) -> bool {
        self.ortho_n != Vec2::ZERO
    }

    pub fn surface_vel(&self) -> Vec2 {
        self.material
            .map_or(Vec2::ZERO, |m| righthand(self.collider_n) * m.velocity)
    }

    /// A steep floor or ceiling hit mid-tick that could resolve sideways instead.
    pub fn transposable(&self) -> bool {
        !self.is_transposed
            && self.ortho_n.x == 0.0
            && self.collider_n.x.abs() > self.collider_n.y.abs()
            && self.has_impact_time
            && !self.has_valley
    }

    /// Swap a vertical resolution for the equivalent horizontal one.
    pub fn transpose(&mut self) {
        if self.is_transposed {
            return;
        }
        let ortho = if self.collider_n.x < 0.0 {
            Vec2::new(-1.0, 0.0)
        } else {
            Vec2::new(1.0, 0.0)
        };
        self.separation = (self.collider_n.y * self.separation / self.collider_n.x).abs();
        self.ortho_n = ortho;
        self.is_transposed = true;
    }
}

/// A contact as applied to a body by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AppliedContact {
    pub contact: ContinuousContact,
    pub ty: ContactType,
    /// Global velocity of the body just before this contact was applied.
    pub precontact_velocity: Vec2,
}

impl AppliedContact {
    pub fn new(contact: ContinuousContact, ty: ContactType, precontact_velocity: Vec2) -> Self {
        Self {
            contact,
            ty,
            precontact_velocity,
        }
    }

    /// Region the contact came from. `None` for synthetic contacts.
    #[inline]
    pub fn region(&self) -> Option<ColliderId> {
        self.contact.id.map(|id| id.collider)
    }
}

fn float_order(a: f32, b: f32) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Preference order between contacts: `Less` means `lhs` should be resolved first.
///
/// Contacts in contact precede those without, then those with an impact time,
/// then earlier impacts, smaller separations and finally slower surfaces.
pub fn compare_contact(lhs: &ContinuousContact, rhs: &ContinuousContact) -> Ordering {
    if lhs.has_contact != rhs.has_contact {
        return if lhs.has_contact { Ordering::Less } else { Ordering::Greater };
    }
    if lhs.has_impact_time != rhs.has_impact_time {
        return if lhs.has_impact_time { Ordering::Less } else { Ordering::Greater };
    }
    if lhs.has_impact_time && lhs.impact_time != rhs.impact_time {
        return float_order(lhs.impact_time, rhs.impact_time);
    }
    if lhs.separation != rhs.separation {
        return float_order(lhs.separation, rhs.separation);
    }
    float_order(lhs.velocity.length_squared(), rhs.velocity.length_squared())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(sep: f32) -> ContinuousContact {
        ContinuousContact {
            has_contact: true,
            separation: sep,
            ortho_n: Vec2::new(0.0, -1.0),
            collider_n: Vec2::new(0.0, -1.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_compare_prefers_contact_then_impact() {
        let a = contact(2.0);
        let mut b = contact(1.0);
        b.has_contact = false;
        assert_eq!(compare_contact(&a, &b), Ordering::Less);

        let mut c = contact(5.0);
        c.has_impact_time = true;
        c.impact_time = 0.5;
        assert_eq!(compare_contact(&c, &a), Ordering::Less);

        let mut d = c;
        d.impact_time = 0.25;
        assert_eq!(compare_contact(&c, &d), Ordering::Greater);
    }

    #[test]
    fn test_compare_separation_then_velocity() {
        let a = contact(1.0);
        let b = contact(2.0);
        assert_eq!(compare_contact(&a, &b), Ordering::Less);

        let mut c = contact(1.0);
        c.velocity = Vec2::new(10.0, 0.0);
        assert_eq!(compare_contact(&a, &c), Ordering::Less);
        assert_eq!(compare_contact(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_transpose_steep_floor() {
        let mut c = contact(4.0);
        c.collider_n = Vec2::new(-2.0, -1.0).normalize();
        c.has_impact_time = true;
        c.impact_time = 0.5;
        assert!(c.transposable());

        c.transpose();
        assert_eq!(c.ortho_n, Vec2::new(-1.0, 0.0));
        assert!((c.separation - 2.0).abs() < 1e-5);
        assert!(c.is_transposed);
        assert!(!c.transposable());
    }

    #[test]
    fn test_flat_floor_not_transposable() {
        let mut c = contact(1.0);
        c.has_impact_time = true;
        assert!(!c.transposable());
    }

    #[test]
    fn test_surface_vel() {
        let mut c = contact(0.0);
        assert_eq!(c.surface_vel(), Vec2::ZERO);
        c.material = Some(SurfaceMaterial { velocity: 50.0 });
        // floor normal (0,-1): tangent points east
        assert_eq!(c.surface_vel(), Vec2::new(50.0, 0.0));
    }
}
