use criterion::{
    criterion_group, criterion_main, AxisScale, BatchSize, BenchmarkId, Criterion,
    PlotConfiguration, Throughput,
};
use pointkd::split_rule::{LongestMedian, SlidingMidpoint};
use pointkd::test_utils::rand_points;
use pointkd::PointKdTree;

const BUCKET_SIZE: usize = 16;

pub fn refine(c: &mut Criterion) {
    let mut group = c.benchmark_group("Refine");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in [1_000, 10_000, 100_000] {
        group.throughput(Throughput::Elements(size as u64));
        let points = rand_points::<3>(size);

        group.bench_with_input(BenchmarkId::new("sliding midpoint 3D", size), &size, |b, _| {
            b.iter_batched(
                || {
                    let mut tree: PointKdTree<f64, 3> = PointKdTree::with_capacity(size);
                    tree.insert_set(points.iter().copied());
                    tree
                },
                |mut tree| {
                    tree.refine(&SlidingMidpoint, BUCKET_SIZE).ok();
                    tree
                },
                BatchSize::LargeInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("longest median 3D", size), &size, |b, _| {
            b.iter_batched(
                || {
                    let mut tree: PointKdTree<f64, 3> = PointKdTree::with_capacity(size);
                    tree.insert_set(points.iter().copied());
                    tree
                },
                |mut tree| {
                    tree.refine(&LongestMedian, BUCKET_SIZE).ok();
                    tree
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, refine);
criterion_main!(benches);
