use pointkd::accept::AcceptExcept;
use pointkd::norm_bijection::{Euclidean, Manhattan, NormBijection};
use pointkd::search_algorithm::BestFirst;
use pointkd::split_rule::SlidingMidpoint;
use pointkd::test_utils::{build_tree, circle_points, linear_search, rand_point, rand_points};
use pointkd::{NearestNeighbour, PointKdTree};
use rand::Rng;
use rstest::rstest;

#[rstest]
fn scenario_counts(#[values(1, 3)] bucket_size: usize) {
    let points = [
        [-4f64, 4f64],
        [-3f64, 2f64],
        [1f64, 3f64],
        [4f64, 3f64],
        [2f64, 2f64],
        [1f64, 1f64],
        [-3f64, 0f64],
        [3f64, 0f64],
        [3f64, -1f64],
        [-5f64, -2f64],
        [-4f64, -2f64],
        [-3f64, -2f64],
        [-2f64, -2f64],
        [0f64, -2f64],
        [5f64, -3f64],
    ];
    let expected = [0, 0, 1, 0, 2, 1, 0, 1, 1, 1, 2, 2, 1, 0, 0];
    let (tree, ids) = build_tree(&points, &SlidingMidpoint, bucket_size);

    for (&id, &count) in ids.iter().zip(expected.iter()) {
        let found = tree
            .count_nearest_from(id)
            .unwrap()
            .accept(AcceptExcept(id))
            .max_distance(2.25f64)
            .run()
            .unwrap();
        assert_eq!(found, count);
    }
}

#[test]
fn counts_agree_with_linear_search_and_search_nearest() {
    let points = rand_points::<3>(2_000);
    let (tree, _) = build_tree(&points, &SlidingMidpoint, 8);
    let mut rng = rand::rng();

    for _ in 0..40 {
        let query = rand_point::<3>();
        let radius = rng.random_range(0.05f64..0.8f64);
        let bijected = Euclidean.to_bijection(radius);

        let expected =
            linear_search(&tree, &Euclidean, &query, usize::MAX, bijected, |_| true).len();
        let counted = tree.count_nearest(&query).max_distance(bijected).run().unwrap();
        assert_eq!(counted, expected);

        let mut reported = 0;
        tree.search_nearest(&query)
            .k_nearest(points.len())
            .max_distance(bijected)
            .search_algorithm(BestFirst)
            .report(|_: NearestNeighbour<f64>| reported += 1)
            .run()
            .unwrap();
        assert_eq!(reported, expected);
    }
}

#[test]
fn approximate_count_is_bracketed() {
    let points = rand_points::<2>(3_000);
    let (tree, _) = build_tree(&points, &SlidingMidpoint, 8);
    let max_relative_error = 0.5f64;

    for _ in 0..40 {
        let query = rand_point::<2>();
        let radius = 0.3f64;
        let inner = linear_search(
            &tree,
            &Manhattan,
            &query,
            usize::MAX,
            Manhattan.to_bijection(radius / (1f64 + max_relative_error)),
            |_| true,
        )
        .len();
        let outer = linear_search(&tree, &Manhattan, &query, usize::MAX, radius, |_| true).len();

        let counted = tree
            .count_nearest(&query)
            .norm_bijection(Manhattan)
            .max_distance(radius)
            .max_relative_error(max_relative_error)
            .run()
            .unwrap();
        assert!(inner <= counted && counted <= outer, "{inner} <= {counted} <= {outer}");
    }
}

#[test]
fn circle_is_counted_only_past_its_radius() {
    #[cfg(feature = "tracing")]
    pointkd::test_utils::init_tracing();
    let points = circle_points(10_000, 2f64);
    let (tree, _) = build_tree(&points, &SlidingMidpoint, 16);
    let origin = [0f64, 0f64];

    let outside = tree
        .count_nearest(&origin)
        .max_distance(Euclidean.to_bijection(2.001f64))
        .run()
        .unwrap();
    assert_eq!(outside, points.len());

    let inside = tree
        .count_nearest(&origin)
        .max_distance(Euclidean.to_bijection(1.999f64))
        .run()
        .unwrap();
    assert_eq!(inside, 0);
}

#[test]
fn time_windows_limit_counts() {
    let mut tree: PointKdTree<f64, 1> = PointKdTree::new();
    tree.insert_set((0..100).map(|i| [i as f64]));
    tree.refine(&SlidingMidpoint, 4).unwrap();

    assert_eq!(tree.count_nearest(&[0f64]).time_intervals(&[20, 30, 70]).run(), Ok(40));
    assert_eq!(tree.count_nearest(&[0f64]).time_intervals(&[]).run(), Ok(0));
    assert_eq!(
        tree.count_nearest(&[0f64])
            .time_intervals(&[0, 50])
            .max_distance(100f64)
            .run(),
        Ok(10)
    );
}
