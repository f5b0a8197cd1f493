use criterion::{black_box, criterion_group, criterion_main, Criterion};
use navpath::{MeshBuffers, NavGraph, PathFindingOptions, Pathfinder, SearchContext, Vec3};

fn grid_mesh(width: usize, height: usize, cell: f32) -> MeshBuffers {
    let mut vertices = Vec::with_capacity((width + 1) * (height + 1));
    for z in 0..=height {
        for x in 0..=width {
            vertices.push([x as f32 * cell, 0.0, z as f32 * cell]);
        }
    }
    let idx = |x: usize, z: usize| (z * (width + 1) + x) as u32;
    let mut indices = Vec::with_capacity(width * height * 6);
    for z in 0..height {
        for x in 0..width {
            indices.extend([idx(x, z), idx(x + 1, z), idx(x + 1, z + 1)]);
            indices.extend([idx(x, z), idx(x + 1, z + 1), idx(x, z + 1)]);
        }
    }
    MeshBuffers::new(vertices, indices)
}

fn bench_nav_mesh(c: &mut Criterion) {
    let mesh = grid_mesh(64, 64, 1.0);
    let pathfinder = Pathfinder::init(&mesh).expect("valid mesh");
    let start = Vec3::new(0.1, 0.0, 0.3);
    let goal = Vec3::new(63.9, 0.0, 63.7);

    let mut group = c.benchmark_group("navpath/navmesh");

    group.bench_function("build_graph", |b| {
        b.iter(|| {
            let graph = NavGraph::build(&mesh, &Default::default()).expect("valid mesh");
            black_box(graph.edge_count());
        })
    });

    group.bench_function("find_path_alloc", |b| {
        b.iter(|| {
            let path = pathfinder
                .find_path_alloc(start, goal, PathFindingOptions::simplified())
                .expect("path");
            black_box(path.points.len());
        })
    });

    let mut ctx = SearchContext::with_capacity(pathfinder.graph().edge_count());
    let mut out = Vec::new();
    group.bench_function("find_path_into_reuse", |b| {
        b.iter(|| {
            let found = pathfinder.find_path(
                start,
                goal,
                &mut out,
                Some(&mut ctx),
                PathFindingOptions::simplified(),
            );
            black_box(found && !out.is_empty());
        })
    });

    group.bench_function("edge_path_raw", |b| {
        b.iter(|| {
            let edges = pathfinder
                .find_edge_path(start, goal, Some(&mut ctx), PathFindingOptions::raw())
                .expect("edge path");
            black_box(edges.edges.len());
        })
    });

    group.finish();
}

criterion_group!(benches, bench_nav_mesh);
criterion_main!(benches);
