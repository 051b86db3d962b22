use criterion::{criterion_group, criterion_main, Criterion};
use density_tree::test_data::{blobs, four_blobs};
use density_tree::{fit, DensityTreeParamsBuilder, ImprovementThreshold};

fn bench_density_tree_builder(c: &mut Criterion) {
    let x = four_blobs(500, 42);

    let mut group = c.benchmark_group("DensityTreeBuilder");

    group.bench_function("TargetLeaves", |b| {
        let params = DensityTreeParamsBuilder::new().n_leaves(16).build();
        b.iter(|| fit(x.view(), &params))
    });

    group.bench_function("Bounded", |b| {
        let params = DensityTreeParamsBuilder::new()
            .bounded(5, 0.02, ImprovementThreshold::Always)
            .build();
        b.iter(|| fit(x.view(), &params))
    });

    let centers: Vec<Vec<f64>> = (0..4)
        .map(|i| (0..8).map(|d| if d == i { 20.0 } else { 0.0 }).collect())
        .collect();
    let wide = blobs(&centers, 250, 1.0, 7);
    group.bench_function("BoundedRandomDims", |b| {
        let params = DensityTreeParamsBuilder::new()
            .bounded(5, 0.02, ImprovementThreshold::Always)
            .max_dims(3, 11)
            .build();
        b.iter(|| fit(wide.view(), &params))
    });
    group.finish();
}

criterion_group!(benches, bench_density_tree_builder);
criterion_main!(benches);
