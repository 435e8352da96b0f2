//! Grid of tile shapes exposed as a collider region.
//!
//! Edits are queued and flushed by [`ColliderTileMap::apply_changes`], which
//! culls the seams between touching tiles and recomputes the ghost points of
//! every tile around each change.

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Context;
use glam::{IVec2, Vec2};

use super::material::TileMaterial;
use super::quad::ColliderQuad;
use super::surface::{ColliderSurface, ColliderSurfaceId};
use super::tile::{ColliderTile, TileShape, TileShapeType};
use super::{ColliderRegion, QuadId, RegionState};
use crate::error::{CollisionError, Result};
use crate::geometry::{angle_of, normalize_angle, Cardinal, Line, Rect, TILESIZE};
use crate::physics::contact::{AppliedContact, ContinuousContact};

type TilePrecontactFn = Box<dyn Fn(IVec2, &ContinuousContact, f32) -> bool + Send + Sync>;
type TilePostcontactFn = Box<dyn Fn(IVec2, &AppliedContact) + Send + Sync>;

#[derive(Debug, Clone, Default)]
struct TileSlot {
    has_tile: bool,
    tile: ColliderTile,
}

#[derive(Debug, Clone)]
enum Edit {
    Set(ColliderTile),
    Remove(IVec2),
}

impl Edit {
    fn position(&self) -> IVec2 {
        match self {
            Edit::Set(tile) => tile.position,
            Edit::Remove(pos) => *pos,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Ghosts {
    g0: Vec2,
    g3: Vec2,
    g0virtual: bool,
    g3virtual: bool,
    prev: Option<ColliderSurfaceId>,
    next: Option<ColliderSurfaceId>,
}

/// A tile grid region. Tile positions are in tiles, quads in local units.
pub struct ColliderTileMap {
    state: RegionState,
    has_border: bool,
    size_min: IVec2,
    size_max: IVec2,
    quads: Vec<ColliderQuad>,
    tiles: Vec<TileSlot>,
    edits: VecDeque<Edit>,
    on_precontact: Option<TilePrecontactFn>,
    on_postcontact: Option<TilePostcontactFn>,
}

impl ColliderTileMap {
    /// Empty map of `size` tiles. With `border`, one extra ring of tiles is
    /// reserved around the map for [`set_borders`](Self::set_borders).
    pub fn new(size: IVec2, border: bool) -> Result<Self> {
        if size.x <= 0 || size.y <= 0 {
            return Err(CollisionError::InvalidSize(format!(
                "tile map size must be positive, got {size}"
            )));
        }

        let (size_min, size_max) = if border {
            (IVec2::splat(-1), size + IVec2::ONE)
        } else {
            (IVec2::ZERO, size)
        };

        let extent = size_max - size_min;
        let count = (extent.x * extent.y) as usize;
        let quads = (0..count)
            .map(|n| {
                let mut quad = ColliderQuad::default();
                quad.set_id(QuadId(n as u32));
                quad
            })
            .collect();

        let bbox = Rect::from_corners(size_min.as_vec2() * TILESIZE, size_max.as_vec2() * TILESIZE);

        Ok(Self {
            state: RegionState::new(Vec2::ZERO, bbox),
            has_border: border,
            size_min,
            size_max,
            quads,
            tiles: vec![TileSlot::default(); count],
            edits: VecDeque::new(),
            on_precontact: None,
            on_postcontact: None,
        })
    }

    /// Build a map from whitespace separated shape names, one string per row.
    /// `.` stands for an empty tile.
    pub fn from_rows(rows: &[&str], border: bool) -> anyhow::Result<Self> {
        let width = rows
            .iter()
            .map(|row| row.split_whitespace().count())
            .max()
            .unwrap_or(0);
        let size = IVec2::new(width as i32, rows.len() as i32);
        let mut map = Self::new(size, border).context("Failed to create tile map")?;

        for (y, row) in rows.iter().enumerate() {
            for (x, token) in row.split_whitespace().enumerate() {
                if token == "." {
                    continue;
                }
                let shape: TileShape = token
                    .parse()
                    .with_context(|| format!("Invalid tile at ({x}, {y})"))?;
                map.set_tile(IVec2::new(x as i32, y as i32), shape)
                    .with_context(|| format!("Invalid tile at ({x}, {y})"))?;
            }
        }

        map.apply_changes();
        Ok(map)
    }

    /// Size of the playable area in tiles, excluding any border.
    pub fn size(&self) -> IVec2 {
        if self.has_border {
            self.size_max - self.size_min - IVec2::splat(2)
        } else {
            self.size_max - self.size_min
        }
    }

    pub fn has_border(&self) -> bool {
        self.has_border
    }

    /// Queue a tile. Takes effect on the next [`apply_changes`](Self::apply_changes).
    pub fn set_tile(&mut self, position: IVec2, shape: TileShape) -> Result<()> {
        self.queue_tile(ColliderTile::new(position, shape))
    }

    pub fn set_tile_with_material(
        &mut self,
        position: IVec2,
        shape: TileShape,
        material: Arc<TileMaterial>,
        facing: Cardinal,
    ) -> Result<()> {
        self.queue_tile(ColliderTile::new(position, shape).with_material(material, facing))
    }

    pub fn remove_tile(&mut self, position: IVec2) -> Result<()> {
        self.check_bounds(position)?;
        self.edits.push_back(Edit::Remove(position));
        Ok(())
    }

    fn queue_tile(&mut self, tile: ColliderTile) -> Result<()> {
        self.check_bounds(tile.position)?;
        self.edits.push_back(Edit::Set(tile));
        Ok(())
    }

    fn check_bounds(&self, position: IVec2) -> Result<()> {
        if self.index_of(position).is_some() {
            Ok(())
        } else {
            Err(CollisionError::TileOutOfBounds {
                pos: position,
                size: self.size_max - self.size_min,
            })
        }
    }

    /// Fill or clear the border ring. `sides` is a bitmask of [`Cardinal::to_bits`].
    /// No-op on maps created without a border.
    pub fn set_borders(&mut self, sides: u8) {
        if !self.has_border {
            return;
        }
        let size = self.size();

        for side in Cardinal::ALL {
            let positions: Vec<IVec2> = match side {
                Cardinal::N => (0..size.x).map(|x| IVec2::new(x, -1)).collect(),
                Cardinal::E => (0..size.y).map(|y| IVec2::new(size.x, y)).collect(),
                Cardinal::S => (0..size.x).map(|x| IVec2::new(x, size.y)).collect(),
                Cardinal::W => (0..size.y).map(|y| IVec2::new(-1, y)).collect(),
            };

            if sides & side.to_bits() != 0 {
                let ty = if side.is_vertical() {
                    TileShapeType::LevelBoundary
                } else {
                    TileShapeType::LevelBoundaryWall
                };
                let shape = TileShape::new(ty, side == Cardinal::E, side == Cardinal::N);
                for pos in positions {
                    self.edits.push_back(Edit::Set(ColliderTile::new(pos, shape)));
                }
            } else {
                for pos in positions {
                    self.edits.push_back(Edit::Remove(pos));
                }
            }
        }
        self.apply_changes();
    }

    pub fn set_on_precontact(
        &mut self,
        f: impl Fn(IVec2, &ContinuousContact, f32) -> bool + Send + Sync + 'static,
    ) {
        self.on_precontact = Some(Box::new(f));
    }

    pub fn set_on_postcontact(&mut self, f: impl Fn(IVec2, &AppliedContact) + Send + Sync + 'static) {
        self.on_postcontact = Some(Box::new(f));
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Tile at `position`, if one is set.
    pub fn tile(&self, position: IVec2) -> Option<&ColliderTile> {
        let ndx = self.index_of(position)?;
        let slot = &self.tiles[ndx];
        slot.has_tile.then_some(&slot.tile)
    }

    /// Quad of the tile at `position`, if one is set.
    pub fn tile_quad(&self, position: IVec2) -> Option<&ColliderQuad> {
        let ndx = self.index_of(position)?;
        self.tiles[ndx].has_tile.then_some(&self.quads[ndx])
    }

    fn index_of(&self, position: IVec2) -> Option<usize> {
        if position.cmplt(self.size_min).any() || position.cmpge(self.size_max).any() {
            return None;
        }
        let width = self.size_max.x - self.size_min.x;
        let local = position - self.size_min;
        Some((local.x + local.y * width) as usize)
    }

    fn position_of(&self, ndx: usize) -> IVec2 {
        let width = self.size_max.x - self.size_min.x;
        let ndx = ndx as i32;
        IVec2::new(ndx % width, ndx / width) + self.size_min
    }

    fn tile_position_of(&self, id: QuadId) -> Option<IVec2> {
        let ndx = id.0 as usize;
        (ndx < self.tiles.len()).then(|| self.position_of(ndx))
    }

    /// Flush queued edits and rebuild ghosts around every changed tile.
    pub fn apply_changes(&mut self) {
        if self.edits.is_empty() {
            return;
        }

        let extent = self.size_max - self.size_min;
        let mut impacted = vec![false; (extent.x * extent.y) as usize];
        let mut edit_count = 0usize;

        while let Some(edit) = self.edits.pop_front() {
            let pos = edit.position();
            let changed = match edit {
                Edit::Set(tile) => self.apply_set(tile),
                Edit::Remove(pos) => self.apply_remove(pos),
            };
            if !changed {
                continue;
            }
            edit_count += 1;

            for yy in -1..=1 {
                for xx in -1..=1 {
                    if let Some(ndx) = self.index_of(pos + IVec2::new(xx, yy)) {
                        impacted[ndx] = true;
                    }
                }
            }
        }

        if edit_count == 0 {
            return;
        }

        let mut rebuilt = 0usize;
        for (ndx, _) in impacted.iter().enumerate().filter(|(_, hit)| **hit) {
            self.update_ghosts(self.position_of(ndx));
            rebuilt += 1;
        }
        tracing::debug!("Tile map applied {} edits, rebuilt {} tiles", edit_count, rebuilt);
    }

    fn apply_remove(&mut self, position: IVec2) -> bool {
        let Some(ndx) = self.index_of(position) else {
            return false;
        };
        if !self.tiles[ndx].has_tile {
            return false;
        }

        let shape = self.tiles[ndx].tile.shape;
        for side in Cardinal::ALL {
            if !shape.touches(side) {
                continue;
            }
            let adj_pos = position + side.to_vector().as_ivec2();
            let Some(adj_ndx) = self.index_of(adj_pos) else {
                continue;
            };
            let adj = &self.tiles[adj_ndx];
            if !adj.has_tile || !adj.tile.shape.touches(side.opposite()) {
                continue;
            }

            let original = adj.tile.to_quad(QuadId(adj_ndx as u32));
            if let Some(surface) = original.surface(side.opposite()).copied() {
                self.quads[adj_ndx].set_surface(side.opposite(), surface);
            }
        }

        self.tiles[ndx].has_tile = false;
        true
    }

    fn apply_set(&mut self, tile: ColliderTile) -> bool {
        let Some(ndx) = self.index_of(tile.position) else {
            return false;
        };

        if self.tiles[ndx].has_tile {
            if self.tiles[ndx].tile.shape == tile.shape {
                return false;
            }
            self.apply_remove(tile.position);
        }

        if tile.shape.is_empty() {
            return true;
        }

        let mut quad = tile.to_quad(QuadId(ndx as u32));
        for side in Cardinal::ALL {
            if !tile.shape.touches(side) {
                continue;
            }
            let adj_pos = tile.position + side.to_vector().as_ivec2();
            let Some(adj_ndx) = self.index_of(adj_pos) else {
                continue;
            };
            if !self.tiles[adj_ndx].has_tile
                || !self.tiles[adj_ndx].tile.shape.touches(side.opposite())
            {
                continue;
            }

            let adj_quad = &mut self.quads[adj_ndx];
            let (Some(added), Some(adjacent)) =
                (quad.surface_mut(side), adj_quad.surface_mut(side.opposite()))
            else {
                continue;
            };

            let (cull_added, cull_adjacent) = cull_touching(&mut added.surface, &mut adjacent.surface);
            if cull_added {
                quad.remove_surface(side);
            }
            if cull_adjacent {
                adj_quad.remove_surface(side.opposite());
            }
        }

        self.quads[ndx] = quad;
        self.tiles[ndx] = TileSlot { has_tile: true, tile };
        true
    }

    fn update_ghosts(&mut self, position: IVec2) {
        let Some(ndx) = self.index_of(position) else {
            return;
        };
        if !self.tiles[ndx].has_tile {
            return;
        }

        let mut nearby: Vec<&ColliderQuad> = Vec::with_capacity(9);
        for yy in -1..=1 {
            for xx in -1..=1 {
                if let Some(quad) = self.tile_quad(position + IVec2::new(xx, yy)) {
                    nearby.push(quad);
                }
            }
        }

        let quad = &self.quads[ndx];
        let mut computed: [Option<Ghosts>; 4] = [None; 4];
        for dir in Cardinal::ALL {
            if let Some(surface) = quad.surface(dir) {
                computed[dir.index()] = Some(find_ghosts(&nearby, surface.surface, quad.has_one_way));
            }
        }

        let quad = &mut self.quads[ndx];
        for dir in Cardinal::ALL {
            let (Some(ghosts), Some(surf)) = (computed[dir.index()], quad.surface_mut(dir)) else {
                continue;
            };
            surf.ghostp0 = ghosts.g0;
            surf.ghostp3 = ghosts.g3;
            surf.g0virtual = ghosts.g0virtual;
            surf.g3virtual = ghosts.g3virtual;
            surf.prev = ghosts.prev;
            surf.next = ghosts.next;
        }
    }
}

/// Resolve the seam between a newly added surface and the touching surface
/// of its neighbour. Returns which of the two should be removed.
fn cull_touching(added: &mut Line, adjacent: &mut Line) -> (bool, bool) {
    if added.p1 == adjacent.p2 && added.p2 == adjacent.p1 {
        return (true, true);
    }
    if added.p1 != adjacent.p2 && added.p2 != adjacent.p1 {
        return (false, false);
    }

    let span = |line: &Line| {
        let d = line.p1 - line.p2;
        if d.x == 0.0 { d.y.abs() } else { d.x.abs() }
    };
    let len_added = span(added);
    let len_adjacent = span(adjacent);

    if len_added + len_adjacent <= TILESIZE {
        return (false, false);
    }

    if len_added > len_adjacent {
        if added.p1 == adjacent.p2 {
            added.p1 = adjacent.p1;
        } else {
            added.p2 = adjacent.p2;
        }
        (false, true)
    } else if len_adjacent > len_added {
        if adjacent.p1 == added.p2 {
            adjacent.p1 = added.p1;
        } else {
            adjacent.p2 = added.p2;
        }
        (true, false)
    } else {
        (false, false)
    }
}

/// Pick the neighbouring surfaces that continue `surface` on either end.
fn find_ghosts(nearby: &[&ColliderQuad], surface: Line, is_one_way: bool) -> Ghosts {
    let mut cand_g0: Vec<&ColliderSurface> = Vec::new();
    let mut cand_g3: Vec<&ColliderSurface> = Vec::new();

    for quad in nearby {
        if !is_one_way && quad.has_one_way {
            continue;
        }
        for slot in quad.surfaces.iter().filter(|s| s.has_surface) {
            if slot.collider.surface.p2 == surface.p1 {
                cand_g0.push(&slot.collider);
            } else if slot.collider.surface.p1 == surface.p2 {
                cand_g3.push(&slot.collider);
            }
        }
    }

    let v = surface.vector();
    let ideal = angle_of(v);

    // true when `v1` continues the surface better than `v2`
    let better = |v1: Vec2, v2: Vec2| -> bool {
        if v1.x != 0.0 && v2.x != 0.0 && v.x != 0.0 && ((v1.x < 0.0) != (v2.x < 0.0)) {
            return (v1.x < 0.0) == (v.x < 0.0);
        }
        normalize_angle(angle_of(v1) - ideal).abs() < normalize_angle(angle_of(v2) - ideal).abs()
    };

    let pick = |cands: &[&ColliderSurface], dir_of: &dyn Fn(&ColliderSurface) -> Vec2| {
        let mut best: Option<&ColliderSurface> = None;
        for &c in cands {
            match best {
                Some(b) if !better(dir_of(c), dir_of(b)) => {}
                _ => best = Some(c),
            }
        }
        best.copied()
    };

    let prev = pick(&cand_g0, &|c| surface.p1 - c.surface.p1);
    let next = pick(&cand_g3, &|c| c.surface.p2 - surface.p2);

    Ghosts {
        g0: prev.map_or(surface.p1 - v, |p| p.surface.p1),
        g3: next.map_or(surface.p2 + v, |n| n.surface.p2),
        g0virtual: prev.is_none(),
        g3virtual: next.is_none(),
        prev: prev.and_then(|p| p.id),
        next: next.and_then(|n| n.id),
    }
}

impl ColliderRegion for ColliderTileMap {
    fn state(&self) -> &RegionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RegionState {
        &mut self.state
    }

    fn get_quad(&self, id: QuadId) -> Option<&ColliderQuad> {
        let ndx = id.0 as usize;
        let slot = self.tiles.get(ndx)?;
        slot.has_tile.then(|| &self.quads[ndx])
    }

    fn quads_in_rect(&self, area: Rect, out: &mut Vec<(Rect, QuadId)>) {
        let local = area.translated(-self.position());

        let mut left = (local.left / TILESIZE).floor() as i32;
        let mut top = (local.top / TILESIZE).floor() as i32;
        let mut width = (local.right() / TILESIZE).ceil() as i32 - left;
        let mut height = (local.bottom() / TILESIZE).ceil() as i32 - top;

        if width == 0 {
            left -= 1;
            width += 2;
        } else if height == 0 {
            top -= 1;
            height += 2;
        }

        for yy in top..top + height {
            for xx in left..left + width {
                let pos = IVec2::new(xx, yy);
                if let Some(ndx) = self.index_of(pos).filter(|&n| self.tiles[n].has_tile) {
                    let bounds = Rect::new(xx as f32 * TILESIZE, yy as f32 * TILESIZE, TILESIZE, TILESIZE);
                    out.push((bounds, QuadId(ndx as u32)));
                }
            }
        }
    }

    fn update(&mut self, _dt: f32) {
        self.apply_changes();
    }

    fn on_precontact(&self, contact: &ContinuousContact, touch_duration: f32) -> bool {
        let Some(f) = &self.on_precontact else {
            return true;
        };
        let tile = contact
            .collider
            .id
            .and_then(|id| self.tile_position_of(id.quad));
        match tile {
            Some(pos) => f(pos, contact, touch_duration),
            None => true,
        }
    }

    fn on_postcontact(&self, contact: &AppliedContact) {
        let Some(f) = &self.on_postcontact else {
            return;
        };
        if let Some(pos) = contact
            .contact
            .collider
            .id
            .and_then(|id| self.tile_position_of(id.quad))
        {
            f(pos, contact);
        }
    }
}
