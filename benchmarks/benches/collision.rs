//! Collision benchmarks (criterion - wall-clock time).
//!
//! Run all:    cargo bench --manifest-path benchmarks/Cargo.toml --bench collision
//! Filter:     cargo bench --manifest-path benchmarks/Cargo.toml --bench collision -- solver

use std::collections::BTreeMap;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec2;
use rein_tilecollide::physics::{is_ghost_edge, CollisionSolver, GhostEdge};
use rein_tilecollide::{Collidable, RegionMap};
use rein_tilecollide_bench::*;

// ---------------------------------------------------------------------------
// Full step
// ---------------------------------------------------------------------------

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step/walkers");
    for &n in &[1, 10, 50, 200] {
        let Ok(mut system) = setup_walkers(n) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| system.fixed_step(1.0 / 60.0));
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

fn bench_solver(c: &mut Criterion) {
    let regions = RegionMap::new();

    {
        let mut group = c.benchmark_group("solver/floor_row");
        for &n in &[1, 4, 16] {
            let contacts = floor_row(n);
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
                b.iter(|| {
                    let mut body = Collidable::new(Vec2::new(8.0, 16.5), Vec2::new(8.0, 16.0), Vec2::ZERO);
                    let mut arbiters = BTreeMap::new();
                    let mut solver = CollisionSolver::new(&mut body, &regions, &mut arbiters, 64);
                    for contact in &contacts {
                        solver.push_contact(*contact);
                    }
                    solver.solve()
                });
            });
        }
        group.finish();
    }

    c.bench_function("solver/wedge", |b| {
        let contacts = wedge_pair();
        b.iter(|| {
            let mut body = Collidable::new(Vec2::new(8.0, 16.0), Vec2::new(8.0, 16.0), Vec2::ZERO);
            let mut arbiters = BTreeMap::new();
            let mut solver = CollisionSolver::new(&mut body, &regions, &mut arbiters, 64);
            for contact in &contacts {
                solver.push_contact(*contact);
            }
            solver.solve()
        });
    });
}

// ---------------------------------------------------------------------------
// Ghost edges
// ---------------------------------------------------------------------------

fn bench_ghost(c: &mut Criterion) {
    let contacts = floor_row(16);
    c.bench_function("ghost/floor_row_pairs", |b| {
        b.iter(|| {
            let mut ghosts = 0;
            for lhs in &contacts {
                for rhs in &contacts {
                    if is_ghost_edge(lhs, rhs) != GhostEdge::None {
                        ghosts += 1;
                    }
                }
            }
            ghosts
        });
    });
}

criterion_group!(benches, bench_step, bench_solver, bench_ghost);
criterion_main!(benches);
