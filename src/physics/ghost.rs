//! Classification of contacts produced by the seams between adjacent quads.

use super::contact::ContinuousContact;
use crate::geometry::lefthand;

/// How strongly a candidate contact is shadowed by a basis contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum GhostEdge {
    #[default]
    None,
    /// Shadowed only by preference, e.g. a wall behind a floor.
    Partial,
    /// Entirely behind the basis surface.
    Full,
}

/// Classify `candidate` against `basis`.
///
/// A basis that is unresolvable, or a one-way the body is not touching, never
/// shadows anything.
pub fn is_ghost_edge(basis: &ContinuousContact, candidate: &ContinuousContact) -> GhostEdge {
    if !basis.is_resolvable() {
        return GhostEdge::None;
    }

    let is_one_way = !basis.has_contact && basis.separation > 0.0 && basis.impact_time == -1.0;

    let basis_line = basis.collider.surface;
    let cand_line = candidate.collider.surface;

    let normal = lefthand(basis_line.vector()).normalize_or_zero();
    let d1 = normal.dot(cand_line.p1 - basis_line.p2);
    let d2 = normal.dot(cand_line.p2 - basis_line.p1);

    let shares_p1 = basis_line.p1 == cand_line.p2;
    let shares_p2 = basis_line.p2 == cand_line.p1;

    // fully behind the basis
    let behind = if shares_p1 {
        d1 < 0.0 && d2 <= 0.0
    } else if shares_p2 {
        d1 <= 0.0 && d2 < 0.0
    } else {
        (d1 <= 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 <= 0.0)
    };

    // walls lose to floors and ceilings
    let vertical_behind =
        !basis_line.is_vertical() && cand_line.is_vertical() && d1 <= 0.0 && d2 <= 0.0;

    let opposite = basis_line == cand_line.reversed();

    if !is_one_way && (behind || vertical_behind || opposite) {
        if behind {
            GhostEdge::Full
        } else {
            GhostEdge::Partial
        }
    } else {
        GhostEdge::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::ColliderSurface;
    use crate::geometry::Line;
    use glam::Vec2;

    fn contact(from: Vec2, to: Vec2, ortho_n: Vec2, separation: f32, has_contact: bool) -> ContinuousContact {
        ContinuousContact {
            collider: ColliderSurface::new(Line::new(from, to)),
            ortho_n,
            collider_n: ortho_n,
            separation,
            has_contact,
            quad_valid: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_two_platforms() {
        let c1 = contact(Vec2::new(0.0, 16.0), Vec2::new(16.0, 0.0), Vec2::new(0.0, -1.0), 1.0, true);
        let c2 = contact(Vec2::new(16.0, 0.0), Vec2::new(32.0, 0.0), Vec2::new(0.0, -1.0), 15.0, true);
        assert_ne!(is_ghost_edge(&c1, &c2), GhostEdge::None);
        assert_ne!(is_ghost_edge(&c2, &c1), GhostEdge::None);
    }

    #[test]
    fn test_slope_to_one_way() {
        let down = Vec2::new(0.0, -1.0);
        let mut c1 = contact(Vec2::new(54.0, 32.0), Vec2::new(70.0, 32.0), down, 0.138_889_31, true);
        let mut c2 = contact(Vec2::new(70.0, 32.0), Vec2::new(86.0, 48.0), down, 0.138_889_31, true);
        c1.velocity = Vec2::new(179.99998, 0.0);
        c2.velocity = Vec2::new(179.99998, 0.0);
        assert_eq!(is_ghost_edge(&c1, &c2), GhostEdge::Full);
        assert_eq!(is_ghost_edge(&c2, &c1), GhostEdge::Full);
    }

    #[test]
    fn test_slope_ceiling_to_wall() {
        let c1 = contact(Vec2::new(16.0, 0.0), Vec2::new(16.0, 16.0), Vec2::new(1.0, 0.0), 4.0, true);
        let c2 = contact(Vec2::new(16.0, 16.0), Vec2::new(0.0, 32.0), Vec2::new(0.0, 1.0), 4.0, true);
        assert_eq!(is_ghost_edge(&c1, &c2), GhostEdge::Full);
        assert_eq!(is_ghost_edge(&c2, &c1), GhostEdge::Full);
    }

    #[test]
    fn test_under_one_way() {
        let one_way = contact(Vec2::new(816.0, 80.0), Vec2::new(832.0, 80.0), Vec2::new(0.0, -1.0), 18.249_954, false);
        let wall = contact(Vec2::new(832.0, 96.0), Vec2::new(832.0, 80.0), Vec2::new(-1.0, 0.0), 3.180_542, true);
        assert_eq!(is_ghost_edge(&one_way, &wall), GhostEdge::None);
        assert_eq!(is_ghost_edge(&wall, &one_way), GhostEdge::None);
    }

    #[test]
    fn test_floor_shadows_wall_below() {
        let floor = contact(Vec2::new(0.0, 0.0), Vec2::new(16.0, 0.0), Vec2::new(0.0, 1.0), 2.0, true);
        let wall = contact(Vec2::new(0.0, 0.0), Vec2::new(0.0, 16.0), Vec2::new(1.0, 0.0), 2.0, true);
        assert_eq!(is_ghost_edge(&floor, &wall), GhostEdge::Full);

        let ceil = contact(Vec2::new(32.0, 32.0), Vec2::new(16.0, 32.0), Vec2::new(0.0, 1.0), 2.0, true);
        let wall = contact(Vec2::new(32.0, 0.0), Vec2::new(32.0, 16.0), Vec2::new(1.0, 0.0), 2.0, true);
        assert_eq!(is_ghost_edge(&ceil, &wall), GhostEdge::Full);
    }

    #[test]
    fn test_opposite_surface_is_partial() {
        let floor = contact(Vec2::new(0.0, 0.0), Vec2::new(16.0, 0.0), Vec2::new(0.0, -1.0), 2.0, true);
        let ceil = contact(Vec2::new(16.0, 0.0), Vec2::new(0.0, 0.0), Vec2::new(0.0, 1.0), 2.0, true);
        assert_eq!(is_ghost_edge(&floor, &ceil), GhostEdge::Partial);
    }

    #[test]
    fn test_unresolvable_basis() {
        let basis = contact(Vec2::new(0.0, 0.0), Vec2::new(16.0, 0.0), Vec2::ZERO, 2.0, true);
        let cand = contact(Vec2::new(16.0, 0.0), Vec2::new(16.0, 16.0), Vec2::new(1.0, 0.0), 2.0, true);
        assert_eq!(is_ghost_edge(&basis, &cand), GhostEdge::None);
    }

    #[test]
    fn test_ordering() {
        assert!(GhostEdge::None < GhostEdge::Partial);
        assert!(GhostEdge::Partial < GhostEdge::Full);
    }
}
