use cutoff_neighbors::{CutoffNeighborFinder, NearestNeighborFinder, NeighborList, SimulationCell, Vector3D};

use criterion::{Criterion, BenchmarkId, black_box, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};

/// Generate `count` particles at random positions in the given cell, at a
/// density close to the one of liquid water
fn random_positions(cell: &SimulationCell, count: usize) -> Vec<Vector3D> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0xdeadbeef);
    return (0..count).map(|_| {
        let fractional = Vector3D::new(rng.gen(), rng.gen(), rng.gen());
        cell.cartesian(fractional)
    }).collect();
}

fn cell_for(count: usize) -> SimulationCell {
    // ~0.1 particles per cubic unit
    let length = f64::cbrt(count as f64 / 0.1);
    return SimulationCell::cubic(length);
}

fn build_finder(c: &mut Criterion) {
    let mut group = c.benchmark_group("CutoffNeighborFinder::new");
    group.noise_threshold(0.05);

    for &count in black_box(&[100, 1000, 10000]) {
        let cell = cell_for(count);
        let positions = random_positions(&cell, count);

        group.bench_with_input(BenchmarkId::from_parameter(count), &positions, |b, positions| b.iter(|| {
            CutoffNeighborFinder::new(5.0, positions, cell).unwrap()
        }));
    }
}

fn query(c: &mut Criterion) {
    let mut group = c.benchmark_group("CutoffNeighborFinder::find (per particle)");
    group.noise_threshold(0.05);

    for &cutoff in black_box(&[3.0, 5.0, 8.0]) {
        let cell = cell_for(5000);
        let positions = random_positions(&cell, 5000);
        let finder = CutoffNeighborFinder::new(cutoff, &positions, cell).unwrap();

        group.bench_function(format!("cutoff = {}", cutoff), |b| b.iter_custom(|repeat| {
            let start = std::time::Instant::now();
            for _ in 0..repeat {
                for i in 0..100 {
                    black_box(finder.find(i).unwrap().count());
                }
            }
            start.elapsed() / 100
        }));
    }

    // small cell, large cutoff
    let cell = SimulationCell::triclinic(3.0, 3.2, 3.5, 80.0, 95.0, 105.0);
    let positions = random_positions(&cell, 8);
    let finder = CutoffNeighborFinder::new(8.0, &positions, cell).unwrap();
    group.bench_function("small cell", |b| b.iter(|| {
        black_box(finder.find(0).unwrap().count())
    }));
}

fn neighbor_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("NeighborList::new");
    group.noise_threshold(0.05);
    group.sample_size(20);

    for &count in black_box(&[1000, 10000]) {
        let cell = cell_for(count);
        let positions = random_positions(&cell, count);
        let finder = CutoffNeighborFinder::new(5.0, &positions, cell).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(count), &finder, |b, finder| b.iter(|| {
            NeighborList::new(finder)
        }));
    }
}

fn nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("NearestNeighborFinder::find (per particle)");
    group.noise_threshold(0.05);

    let cell = cell_for(5000);
    let positions = random_positions(&cell, 5000);
    for &count in black_box(&[1, 12, 50]) {
        let finder = NearestNeighborFinder::new(count, &positions, cell).unwrap();

        group.bench_function(format!("k = {}", count), |b| b.iter_custom(|repeat| {
            let start = std::time::Instant::now();
            for _ in 0..repeat {
                for i in 0..100 {
                    black_box(finder.find(i).unwrap());
                }
            }
            start.elapsed() / 100
        }));
    }
}

criterion_group!(all, build_finder, query, neighbor_list, nearest);
criterion_main!(all);
