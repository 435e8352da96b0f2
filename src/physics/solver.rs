//! Resolution of every contact touching one body in a tick.
//!
//! Contacts are first filtered pairwise for seam artifacts, then bucketed by
//! resolution direction. Floor/ceiling pairs may produce synthetic wedge
//! contacts and steep slopes may be transposed into walls. The horizontal
//! axis is solved before the vertical one; each application moves the body
//! and re-evaluates the contacts still waiting.

use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;

use super::arbiter::RegionArbiter;
use super::collidable::Collidable;
use super::contact::{compare_contact, AppliedContact, ContactType, ContinuousContact};
use super::ghost::{is_ghost_edge, GhostEdge};
use crate::collider::{ColliderId, RegionMap};
use crate::geometry::{Cardinal, Line, Rect};

/// Result of weighing two contacts against each other.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompResult {
    pub discard_first: bool,
    pub discard_second: bool,
    pub ty: ContactType,
    /// Replacement contact, e.g. for a crush.
    pub contact: Option<ContinuousContact>,
}

/// Decide whether either contact is a seam artifact of the other.
pub fn compare(lhs: &ContinuousContact, rhs: &ContinuousContact) -> CompResult {
    let mut comp = CompResult {
        discard_first: !lhs.quad_valid,
        discard_second: !rhs.quad_valid,
        ..Default::default()
    };

    if comp.discard_first || comp.discard_second {
        return comp;
    }

    let g1 = is_ghost_edge(rhs, lhs);
    let g2 = is_ghost_edge(lhs, rhs);

    let mut first_ghost = g1 != GhostEdge::None;
    let mut second_ghost = g2 != GhostEdge::None;

    if first_ghost && second_ghost {
        if g1 == g2 {
            match compare_contact(lhs, rhs) {
                Ordering::Equal => {
                    first_ghost = false;
                    second_ghost = false;
                }
                order => {
                    first_ghost = order == Ordering::Greater;
                    second_ghost = !first_ghost;
                }
            }
        } else {
            first_ghost = g2 < g1;
            second_ghost = !first_ghost;
        }
    }

    comp.discard_first = first_ghost;
    comp.discard_second = second_ghost;
    comp
}

/// Horizontal velocity that keeps a body wedged between two moving surfaces.
///
/// `n1`/`n2` are the surface normals and `v1`/`v2` their velocities. At the
/// returned velocity the vertical gap between both surfaces stays constant.
/// Surfaces that are parallel or vertical give zero.
pub fn calc_wedge_vel(n1: Vec2, n2: Vec2, v1: Vec2, v2: Vec2) -> Vec2 {
    const EPS: f32 = 1e-6;
    if n1.y.abs() < EPS || n2.y.abs() < EPS {
        return Vec2::ZERO;
    }

    let slope_diff = -n1.x / n1.y + n2.x / n2.y;
    if slope_diff.abs() < EPS {
        return Vec2::ZERO;
    }

    let gap_rate = n1.dot(v1) / n1.y - n2.dot(v2) / n2.y;
    Vec2::new(-gap_rate / slope_diff, 0.0)
}

fn is_squeezing(a: &ContinuousContact, b: &ContinuousContact) -> bool {
    a.separation + b.separation >= 0.0 && (a.has_contact || b.has_contact) && a.ortho_n == -b.ortho_n
}

fn is_crushing(a: &ContinuousContact, b: &ContinuousContact) -> bool {
    let sum = a.collider_n + b.collider_n;
    sum.x.abs() < 1e-5 && sum.y.abs() < 1e-5
}

/// Floor and ceiling face away from each other.
fn is_diverging_v(north: &Line, south: &Line) -> bool {
    let n_mid = north.midpoint();
    let s_mid = south.midpoint();
    (s_mid - n_mid).dot(north.normal()) < 0.0 && (n_mid - s_mid).dot(south.normal()) < 0.0
}

/// Merge two opposing contacts into one moving the body halfway.
fn crush_contact(a: &ContinuousContact, b: &ContinuousContact) -> ContinuousContact {
    let (mut deeper, other) = if a.separation > b.separation { (*a, b) } else { (*b, a) };
    deeper.separation = (deeper.separation - other.separation) / 2.0;
    deeper
}

pub fn pick_h(east: &ContinuousContact, west: &ContinuousContact, body: &Rect) -> CompResult {
    let e_wide = east.separation >= body.width;
    let w_wide = west.separation >= body.width;

    if e_wide != w_wide {
        return CompResult {
            discard_first: e_wide,
            discard_second: w_wide,
            ..Default::default()
        };
    }

    if east.separation + west.separation > 0.0 {
        return CompResult {
            discard_first: true,
            discard_second: true,
            ty: ContactType::CrushHorizontal,
            contact: Some(crush_contact(east, west)),
        };
    }

    if east.has_contact != west.has_contact {
        return CompResult {
            discard_first: !east.has_contact,
            discard_second: !west.has_contact,
            ..Default::default()
        };
    }
    CompResult::default()
}

pub fn pick_v(north: &ContinuousContact, south: &ContinuousContact, body: &Rect) -> CompResult {
    if north.separation + south.separation > body.height
        || is_diverging_v(&north.collider.surface, &south.collider.surface)
    {
        let discard_first = south.separation < north.separation;
        return CompResult {
            discard_first,
            discard_second: !discard_first,
            ..Default::default()
        };
    }

    if is_squeezing(north, south) && is_crushing(north, south) {
        return CompResult {
            discard_first: true,
            discard_second: true,
            ty: ContactType::CrushVertical,
            contact: Some(crush_contact(north, south)),
        };
    }

    if north.has_contact != south.has_contact {
        return CompResult {
            discard_first: !north.has_contact,
            discard_second: !south.has_contact,
            ..Default::default()
        };
    }
    CompResult::default()
}

type Picker = fn(&ContinuousContact, &ContinuousContact, &Rect) -> CompResult;

#[derive(Debug, Clone, Copy)]
struct Entry {
    contact: ContinuousContact,
    ty: ContactType,
}

impl Entry {
    fn single(contact: ContinuousContact) -> Self {
        Self { contact, ty: ContactType::Single }
    }
}

type Stack = VecDeque<Entry>;

#[derive(Debug, Default)]
struct Stacks {
    north: Stack,
    east: Stack,
    south: Stack,
    west: Stack,
    north_alt: Stack,
    south_alt: Stack,
}

impl Stacks {
    fn push(&mut self, entry: Entry) {
        let stack = match Cardinal::from_vector(entry.contact.ortho_n) {
            Some(Cardinal::E) => &mut self.east,
            Some(Cardinal::W) => &mut self.west,
            Some(Cardinal::N) if entry.contact.transposable() => &mut self.north_alt,
            Some(Cardinal::N) => &mut self.north,
            Some(Cardinal::S) if entry.contact.transposable() => &mut self.south_alt,
            Some(Cardinal::S) => &mut self.south,
            None => {
                tracing::trace!(id = ?entry.contact.id, "discarding contact without direction");
                return;
            }
        };
        stack.push_back(entry);
    }

    /// Steep floors and ceilings may resolve sideways when nothing else
    /// contradicts it.
    fn can_apply_alt(&self) -> bool {
        let alts = || self.north_alt.iter().chain(&self.south_alt);
        let all_west = self.east.is_empty() && alts().all(|e| e.contact.collider_n.x < 0.0);
        let all_east = self.west.is_empty() && alts().all(|e| e.contact.collider_n.x > 0.0);
        let flat = self
            .north
            .iter()
            .chain(&self.south)
            .all(|e| e.contact.collider_n.x == 0.0);
        flat && (all_west || all_east)
    }
}

fn sort_stack(stack: &mut Stack) {
    stack.make_contiguous().sort_by(|a, b| compare_contact(&a.contact, &b.contact));
}

/// Solves the contacts of one body for the current tick.
pub struct CollisionSolver<'a> {
    body: &'a mut Collidable,
    regions: &'a RegionMap,
    arbiters: &'a mut BTreeMap<ColliderId, RegionArbiter>,
    max_iterations: u32,
    iterations: u32,
    contacts: Vec<ContinuousContact>,
    frame: Vec<AppliedContact>,
}

impl<'a> CollisionSolver<'a> {
    pub fn new(
        body: &'a mut Collidable,
        regions: &'a RegionMap,
        arbiters: &'a mut BTreeMap<ColliderId, RegionArbiter>,
        max_iterations: u32,
    ) -> Self {
        Self {
            body,
            regions,
            arbiters,
            max_iterations,
            iterations: 0,
            contacts: Vec::new(),
            frame: Vec::new(),
        }
    }

    pub fn push_contact(&mut self, contact: ContinuousContact) {
        self.contacts.push(contact);
    }

    /// Resolve everything pushed so far, returning the applied contacts in
    /// application order.
    pub fn solve(mut self) -> Vec<AppliedContact> {
        if self.contacts.is_empty() {
            return self.frame;
        }

        self.compare_all();

        let mut stacks = Stacks::default();
        for contact in std::mem::take(&mut self.contacts) {
            stacks.push(Entry::single(contact));
        }

        self.detect_wedges(&mut stacks);

        if stacks.can_apply_alt() {
            let alts: Vec<Entry> = stacks.north_alt.drain(..).chain(stacks.south_alt.drain(..)).collect();
            for mut entry in alts {
                entry.contact.transpose();
                stacks.push(entry);
            }
        } else {
            let north_alt: Vec<Entry> = stacks.north_alt.drain(..).collect();
            let south_alt: Vec<Entry> = stacks.south_alt.drain(..).collect();
            stacks.north.extend(north_alt);
            stacks.south.extend(south_alt);
        }

        sort_stack(&mut stacks.east);
        sort_stack(&mut stacks.west);

        if self.solve_axis(&mut stacks.east, &mut stacks.west, pick_h) {
            self.refresh_stack(&mut stacks.north);
            self.refresh_stack(&mut stacks.south);
        }

        sort_stack(&mut stacks.north);
        sort_stack(&mut stacks.south);

        self.solve_axis(&mut stacks.north, &mut stacks.south, pick_v);

        self.frame
    }

    fn compare_all(&mut self) {
        let mut i = 0;
        while i + 1 < self.contacts.len() {
            let mut j = i + 1;
            let mut removed_first = false;
            while j < self.contacts.len() {
                let result = compare(&self.contacts[i], &self.contacts[j]);
                if result.discard_first {
                    self.contacts.remove(i);
                    removed_first = true;
                    break;
                } else if result.discard_second {
                    self.contacts.remove(j);
                } else {
                    j += 1;
                }
            }
            if !removed_first {
                i += 1;
            }
        }
    }

    fn detect_wedges(&self, stacks: &mut Stacks) {
        let mut created = Vec::new();
        for north in &stacks.north {
            for south in &stacks.south {
                if let Some(entry) = self.detect_wedge(&north.contact, &south.contact) {
                    created.push(entry);
                }
            }
        }
        for entry in created {
            stacks.push(entry);
        }
    }

    /// Synthesise a horizontal contact pushing the body out of a floor/ceiling pinch.
    fn detect_wedge(&self, north: &ContinuousContact, south: &ContinuousContact) -> Option<Entry> {
        if !is_squeezing(north, south)
            || is_crushing(north, south)
            || is_diverging_v(&north.collider.surface, &south.collider.surface)
        {
            return None;
        }

        let rect = self.body.rect();
        let pos = self.body.position();

        let floor = north.collider.surface;
        let ceil = south.collider.surface.shifted(Vec2::new(0.0, rect.height));
        let intersect = floor.intersection(&ceil);

        if intersect.is_nan() {
            tracing::warn!(?floor, ?ceil, "bad intersection");
            return None;
        }
        if intersect.x == pos.x {
            return None;
        }

        let (n1, n2) = (north.collider_n, south.collider_n);
        let side = if n1.x + n2.x < 0.0 { -1.0 } else { 1.0 };
        let ty = if n1.x == 0.0 || n2.x == 0.0 {
            ContactType::WedgeWall
        } else if (n1.x < 0.0) == (n2.x < 0.0) {
            ContactType::WedgeSame
        } else {
            ContactType::WedgeOpposite
        };

        let contact = ContinuousContact {
            id: None,
            separation: (intersect.x - pos.x).abs(),
            has_contact: true,
            quad_valid: true,
            position: Vec2::new(pos.x, rect.mid().y),
            ortho_n: Vec2::new(side, 0.0),
            collider_n: Vec2::new(side, 0.0),
            velocity: calc_wedge_vel(n1, n2, north.velocity, south.velocity),
            ..Default::default()
        };
        Some(Entry { contact, ty })
    }

    /// Count one solver step. False once the cap is hit.
    fn step(&mut self) -> bool {
        self.iterations += 1;
        if self.iterations > self.max_iterations {
            debug_assert!(false, "solver exceeded {} iterations", self.max_iterations);
            tracing::warn!(max = self.max_iterations, "solver iteration cap reached");
            return false;
        }
        true
    }

    fn solve_axis(&mut self, stack_a: &mut Stack, stack_b: &mut Stack, picker: Picker) -> bool {
        let mut any_applied = false;

        while let (Some(a), Some(b)) = (stack_a.front().copied(), stack_b.front().copied()) {
            if !self.step() {
                return any_applied;
            }

            let mut r = picker(&a.contact, &b.contact, &self.body.rect());

            if let Some(contact) = r.contact {
                if self.apply(&contact, r.ty) {
                    any_applied = true;
                    if r.ty.is_crush() {
                        return true;
                    }
                }

                if !r.discard_first {
                    if let Some(front) = stack_a.front_mut() {
                        self.refresh(&mut front.contact);
                    }
                }
                if !r.discard_second {
                    if let Some(front) = stack_b.front_mut() {
                        self.refresh(&mut front.contact);
                    }
                }

                r.discard_first = stack_a.front().map_or(true, |e| !e.contact.has_contact);
                r.discard_second = stack_b.front().map_or(true, |e| !e.contact.has_contact);
            }

            if !r.discard_first && !r.discard_second {
                let a_sep = stack_a.front().map_or(0.0, |e| e.contact.separation);
                let b_sep = stack_b.front().map_or(0.0, |e| e.contact.separation);
                any_applied |= self.apply_then_update(stack_a, stack_b, a_sep < b_sep);
            } else {
                if self.can_apply_else_discard(r.discard_first, stack_a) {
                    any_applied |= self.apply_then_update(stack_a, stack_b, true);
                }
                if self.can_apply_else_discard(r.discard_second, stack_b) {
                    any_applied |= self.apply_then_update(stack_b, stack_a, true);
                }
            }
        }

        any_applied |= self.apply_stack(stack_a);
        any_applied |= self.apply_stack(stack_b);
        any_applied
    }

    fn can_apply_else_discard(&mut self, discard: bool, stack: &mut Stack) -> bool {
        if discard {
            if let Some(entry) = stack.pop_front() {
                tracing::trace!(id = ?entry.contact.id, "discarding contact");
            }
        }
        !discard
    }

    /// Apply the front of `stack` (or `other` when `which` is false), then
    /// refresh both.
    fn apply_then_update(&mut self, stack: &mut Stack, other: &mut Stack, which: bool) -> bool {
        let applied = if which {
            self.apply_first(stack)
        } else {
            self.apply_first(other)
        };
        if applied {
            self.refresh_stack(stack);
            self.refresh_stack(other);
        }
        applied
    }

    fn apply_stack(&mut self, stack: &mut Stack) -> bool {
        let mut any_applied = false;
        while !stack.is_empty() {
            if !self.step() {
                stack.clear();
                break;
            }
            if self.apply_first(stack) {
                any_applied = true;
                self.refresh_stack(stack);
            }
        }
        any_applied
    }

    /// Apply the front contact, preferring among equal separations the one
    /// closest to the body centre.
    fn apply_first(&mut self, stack: &mut Stack) -> bool {
        let Some(first) = stack.front() else {
            return false;
        };

        let mid = self.body.rect().mid();
        let sep = first.contact.separation;
        let mut pick = 0;
        for (i, entry) in stack.iter().enumerate().skip(1) {
            if entry.contact.separation != sep {
                break;
            }
            let current = &stack[pick].contact;
            let closer = if current.ortho_n.y == 0.0 {
                (entry.contact.position.y - mid.y).abs() < (current.position.y - mid.y).abs()
            } else {
                (entry.contact.position.x - mid.x).abs() < (current.position.x - mid.x).abs()
            };
            if closer {
                pick = i;
            }
        }

        match stack.remove(pick) {
            Some(entry) => self.apply(&entry.contact, entry.ty),
            None => false,
        }
    }

    fn apply(&mut self, contact: &ContinuousContact, ty: ContactType) -> bool {
        if !contact.has_contact {
            tracing::trace!(id = ?contact.id, "skipping contact without contact");
            return false;
        }

        tracing::trace!(
            id = ?contact.id,
            %ty,
            separation = contact.separation,
            ortho_n = ?contact.ortho_n,
            "applying contact"
        );

        let prev_vel = self.body.global_vel();
        self.body.apply_contact(contact, ty);
        self.frame.push(AppliedContact::new(*contact, ty, prev_vel));

        if let Some(id) = contact.id {
            let region = self.regions.get(&id.collider);
            let arbiter = self
                .arbiters
                .get_mut(&id.collider)
                .and_then(|r| r.arbiter_mut(id.quad));
            if let (Some(region), Some(arbiter)) = (region, arbiter) {
                arbiter.set_applied();
                arbiter.update(&*self.body, region.as_ref(), 0.0);
            }
        }
        true
    }

    /// Re-evaluate a waiting contact against the body's new position.
    fn refresh(&mut self, contact: &mut ContinuousContact) {
        let Some(id) = contact.id else {
            return;
        };
        let Some(region) = self.regions.get(&id.collider) else {
            return;
        };
        let Some(arbiter) = self
            .arbiters
            .get_mut(&id.collider)
            .and_then(|r| r.arbiter_mut(id.quad))
        else {
            return;
        };

        arbiter.update(&*self.body, region.as_ref(), 0.0);

        let transposed = contact.is_transposed;
        *contact = *arbiter.contact();
        if transposed {
            if contact.collider_n.x != 0.0 && contact.ortho_n.x == 0.0 {
                contact.transpose();
            } else if contact.ortho_n.x == 0.0 {
                // no longer a slope, can't stay in a horizontal stack
                contact.has_contact = false;
            }
        }
    }

    fn refresh_stack(&mut self, stack: &mut Stack) {
        for entry in stack.iter_mut() {
            self.refresh(&mut entry.contact);
        }
    }
}
