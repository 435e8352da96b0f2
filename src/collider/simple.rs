//! Single-box collider region, typically a moving platform.

use glam::Vec2;

use super::{ColliderQuad, ColliderRegion, ColliderSurface, QuadId, RegionState};
use crate::geometry::{Cardinal, Rect};
use crate::physics::contact::{AppliedContact, ContinuousContact};

type PrecontactFn = Box<dyn Fn(&ContinuousContact, f32) -> bool + Send + Sync>;
type PostcontactFn = Box<dyn Fn(&AppliedContact) + Send + Sync>;

/// Region holding one rectangular quad with id 0.
pub struct ColliderSimple {
    state: RegionState,
    quad: ColliderQuad,
    on_precontact: Option<PrecontactFn>,
    on_postcontact: Option<PostcontactFn>,
}

impl ColliderSimple {
    /// Box in local coordinates; the region starts at the origin.
    pub fn new(shape: Rect) -> Self {
        Self {
            state: RegionState::new(Vec2::ZERO, shape),
            quad: ColliderQuad::from_rect(shape),
            on_precontact: None,
            on_postcontact: None,
        }
    }

    pub fn quad(&self) -> &ColliderQuad {
        &self.quad
    }

    /// Mutable access to the quad, e.g. to make it one-way.
    pub fn quad_mut(&mut self) -> &mut ColliderQuad {
        &mut self.quad
    }

    /// Keep only the north face and make it pass-through from below.
    pub fn make_one_way(&mut self) {
        for dir in [Cardinal::E, Cardinal::S, Cardinal::W] {
            self.quad.remove_surface(dir);
        }
        if let Some(north) = self.quad.surface(Cardinal::N).map(|s| s.surface) {
            self.quad.set_surface(Cardinal::N, ColliderSurface::new(north));
        }
        self.quad.has_one_way = true;
        self.quad.one_way_dir = Cardinal::N;
    }

    pub fn set_on_precontact(
        &mut self,
        f: impl Fn(&ContinuousContact, f32) -> bool + Send + Sync + 'static,
    ) {
        self.on_precontact = Some(Box::new(f));
    }

    pub fn set_on_postcontact(&mut self, f: impl Fn(&AppliedContact) + Send + Sync + 'static) {
        self.on_postcontact = Some(Box::new(f));
    }
}

impl ColliderRegion for ColliderSimple {
    fn state(&self) -> &RegionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RegionState {
        &mut self.state
    }

    fn get_quad(&self, id: QuadId) -> Option<&ColliderQuad> {
        (id == QuadId(0)).then_some(&self.quad)
    }

    fn quads_in_rect(&self, area: Rect, out: &mut Vec<(Rect, QuadId)>) {
        let mut bbox = area.translated(-self.position());

        let deltap = self.delta_position();
        bbox = bbox.extend(if deltap.x < 0.0 { Cardinal::W } else { Cardinal::E }, deltap.x.abs());
        bbox = bbox.extend(if deltap.y < 0.0 { Cardinal::N } else { Cardinal::S }, deltap.y.abs());

        if self.state.bounding_box.touches(&bbox) {
            out.push((self.state.bounding_box, QuadId(0)));
        }
    }

    fn on_precontact(&self, contact: &ContinuousContact, touch_duration: f32) -> bool {
        self.on_precontact
            .as_ref()
            .map_or(true, |f| f(contact, touch_duration))
    }

    fn on_postcontact(&self, contact: &AppliedContact) {
        if let Some(f) = &self.on_postcontact {
            f(contact);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quads_in_rect_follows_position() {
        let mut region = ColliderSimple::new(Rect::new(0.0, 0.0, 16.0, 16.0));
        let mut out = Vec::new();

        region.quads_in_rect(Rect::new(20.0, 0.0, 4.0, 4.0), &mut out);
        assert!(out.is_empty());

        region.teleport(Vec2::new(10.0, 0.0));
        region.quads_in_rect(Rect::new(20.0, 0.0, 4.0, 4.0), &mut out);
        assert_eq!(out, vec![(Rect::new(0.0, 0.0, 16.0, 16.0), QuadId(0))]);
    }

    #[test]
    fn test_precontact_callback_filters() {
        let mut region = ColliderSimple::new(Rect::new(0.0, 0.0, 16.0, 16.0));
        let contact = ContinuousContact::default();
        assert!(region.on_precontact(&contact, 0.0));

        region.set_on_precontact(|_, _| false);
        assert!(!region.on_precontact(&contact, 0.0));
    }

    #[test]
    fn test_make_one_way() {
        let mut region = ColliderSimple::new(Rect::new(0.0, 0.0, 16.0, 16.0));
        region.make_one_way();
        assert!(region.quad().is_one_way(Cardinal::N));
        assert!(region.quad().surface(Cardinal::N).is_some());
        assert!(region.quad().surface(Cardinal::E).is_none());
        let north = region.quad().surface(Cardinal::N).copied().unwrap_or_default();
        assert!(north.g0virtual && north.g3virtual);
    }
}
