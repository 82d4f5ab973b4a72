//! Benchmarks for the slicing pipeline.
//!
//! Run with: cargo bench
//!
//! To compare against baseline:
//! 1. First run: cargo bench -- --save-baseline main
//! 2. After changes: cargo bench -- --baseline main

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use layer_slicer::gcode::{generate_gcode, LayerPaths};
use layer_slicer::slice::layer_boundary;
use layer_slicer::{slice_model, Mesh, SlicerSettings};

fn bench_layer_boundary(c: &mut Criterion) {
    let pyramid = Mesh::pyramid(40.0, 30.0);
    c.bench_function("layer_boundary_pyramid", |b| {
        b.iter(|| layer_boundary(black_box(pyramid.vertices()), black_box(15.1)))
    });
}

fn bench_slice_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("slice_model");
    group.sample_size(10);

    let settings = SlicerSettings::default();
    let meshes = [
        ("cube_20", Mesh::cube(20.0).placed_on_bed()),
        ("pyramid_40", Mesh::pyramid(40.0, 30.0)),
    ];
    for (name, mesh) in &meshes {
        group.bench_with_input(BenchmarkId::from_parameter(name), mesh, |b, mesh| {
            b.iter(|| slice_model(black_box(mesh.vertices()), &settings))
        });
    }
    group.finish();
}

fn bench_generate_gcode(c: &mut Criterion) {
    let settings = SlicerSettings::default();
    let cube = Mesh::cube(20.0).placed_on_bed();
    let Ok(slices) = slice_model(cube.vertices(), &settings) else {
        return;
    };
    let layers: Vec<LayerPaths> = slices.iter().map(|s| LayerPaths::from_slice(s, &settings)).collect();

    c.bench_function("generate_gcode_cube_20", |b| {
        b.iter(|| generate_gcode(black_box(&layers), &settings))
    });
}

criterion_group!(benches, bench_layer_boundary, bench_slice_model, bench_generate_gcode);
criterion_main!(benches);
