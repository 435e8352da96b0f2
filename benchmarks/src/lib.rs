//! Scene builders shared by the collision benchmarks.

use anyhow::Context;
use glam::{IVec2, Vec2};
use rein_tilecollide::physics::ContinuousContact;
use rein_tilecollide::{
    Collidable, CollisionSystem, ColliderSurface, ColliderTileMap, Line, TileShape, TileShapeType,
};

/// Flat floor with a slope every eighth tile.
pub fn setup_tile_map(width: i32) -> anyhow::Result<ColliderTileMap> {
    let height = 8;
    let mut map = ColliderTileMap::new(IVec2::new(width, height), false)
        .context("Failed to create benchmark tile map")?;

    let solid = TileShape::new(TileShapeType::Solid, false, false);
    let slope = TileShape::new(TileShapeType::Slope, false, false);
    for x in 0..width {
        map.set_tile(IVec2::new(x, height - 1), solid)?;
        if x % 8 == 4 {
            map.set_tile(IVec2::new(x, height - 2), slope)?;
        }
    }
    map.apply_changes();
    Ok(map)
}

/// `bodies` walkers spread over a tile map wide enough to hold them.
pub fn setup_walkers(bodies: usize) -> anyhow::Result<CollisionSystem> {
    let width = (bodies as i32 * 2).max(16);
    let mut system = CollisionSystem::default();
    system.add_region(setup_tile_map(width)?);

    for n in 0..bodies {
        let mut body = Collidable::new(
            Vec2::new(n as f32 * 32.0 + 8.0, 100.0),
            Vec2::new(8.0, 16.0),
            Vec2::new(0.0, 400.0),
        );
        body.set_local_vel(Vec2::new(60.0, 0.0));
        system.add_collidable(body);
    }
    Ok(system)
}

/// Contact against an arbitrary line, resolving along `ortho_n`.
pub fn contact(from: Vec2, to: Vec2, ortho_n: Vec2, separation: f32) -> ContinuousContact {
    let line = Line::new(from, to);
    ContinuousContact {
        collider: ColliderSurface::new(line),
        ortho_n,
        collider_n: line.normal(),
        separation,
        has_contact: true,
        quad_valid: true,
        ..Default::default()
    }
}

/// A row of collinear floor contacts, the common case on flat ground.
pub fn floor_row(count: usize) -> Vec<ContinuousContact> {
    (0..count)
        .map(|n| {
            let x = n as f32 * 16.0;
            contact(Vec2::new(x, 16.0), Vec2::new(x + 16.0, 16.0), Vec2::new(0.0, -1.0), 0.5)
        })
        .collect()
}

/// A slope pinching against a flat ceiling.
pub fn wedge_pair() -> Vec<ContinuousContact> {
    vec![
        contact(Vec2::new(0.0, 16.0), Vec2::new(16.0, 0.0), Vec2::new(0.0, -1.0), 8.0),
        contact(Vec2::new(16.0, 2.0), Vec2::new(0.0, 2.0), Vec2::new(0.0, 1.0), 2.0),
    ]
}
