//! Velocity response applied to a body after a contact resolves.

use glam::Vec2;

use super::contact::ContinuousContact;
use crate::geometry::{projection, righthand};

/// How a body's velocity reacts to a resolved contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Response {
    /// Slide along the surface that was hit.
    #[default]
    Standard,
    /// Slide along the axis the contact was resolved on.
    Flatten,
}

impl Response {
    /// Velocity after the contact: the surface's own motion along the normal
    /// plus the body's motion along the tangent.
    pub fn apply(self, velocity: Vec2, contact: &ContinuousContact) -> Vec2 {
        let normal = match self {
            Response::Standard => contact.collider_n,
            Response::Flatten => contact.ortho_n,
        };
        projection(contact.velocity, normal, true) + projection(velocity, righthand(normal), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_on_floor_keeps_horizontal() {
        let contact = ContinuousContact {
            ortho_n: Vec2::new(0.0, -1.0),
            collider_n: Vec2::new(0.0, -1.0),
            ..Default::default()
        };
        let v = Response::Standard.apply(Vec2::new(30.0, 200.0), &contact);
        assert_eq!(v, Vec2::new(30.0, 0.0));
    }

    #[test]
    fn test_standard_slope_follows_surface() {
        let n = Vec2::new(1.0, -1.0).normalize();
        let contact = ContinuousContact {
            ortho_n: Vec2::new(0.0, -1.0),
            collider_n: n,
            ..Default::default()
        };
        let v = Response::Standard.apply(Vec2::new(0.0, 100.0), &contact);
        // velocity ends up parallel to the slope
        assert!(v.dot(n).abs() < 1e-4);
        assert!(v.x > 0.0 && v.y > 0.0);
    }

    #[test]
    fn test_flatten_uses_ortho_axis() {
        let contact = ContinuousContact {
            ortho_n: Vec2::new(0.0, -1.0),
            collider_n: Vec2::new(1.0, -1.0).normalize(),
            velocity: Vec2::new(0.0, -10.0),
            ..Default::default()
        };
        let v = Response::Flatten.apply(Vec2::new(25.0, 100.0), &contact);
        assert_eq!(v, Vec2::new(25.0, -10.0));
    }
}
