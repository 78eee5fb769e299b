#![cfg(feature = "serde")]

use pointkd::norm_bijection::{Minkowski, NormBijection};
use pointkd::search_algorithm::BestFirst;
use pointkd::split_rule::SlidingMidpoint;
use pointkd::{NearestNeighbour, PointKdTree};

#[test]
fn query_results_survive_json() {
    let mut tree: PointKdTree<f64, 2> = PointKdTree::new();
    tree.insert_set([[0f64, 0f64], [1f64, 2f64], [3f64, 1f64]]);
    tree.refine(&SlidingMidpoint, 1).unwrap();

    let mut found = Vec::new();
    tree.search_nearest(&[2f64, 2f64])
        .k_nearest(2)
        .report(|n: NearestNeighbour<f64>| found.push(n))
        .run()
        .unwrap();

    let json = serde_json::to_string(&found).unwrap();
    let restored: Vec<NearestNeighbour<f64>> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, found);
}

#[test]
fn query_settings_survive_json() {
    let norm = Minkowski::new(3f64).unwrap();
    let json = serde_json::to_string(&norm).unwrap();
    assert_eq!(json, r#"{"power":3.0}"#);
    let restored: Minkowski<f64> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, norm);
    assert_eq!(restored.distance(&[0f64, 0f64], &[1f64, 2f64]), 9f64);

    let json = serde_json::to_string(&BestFirst).unwrap();
    let strategy: BestFirst = serde_json::from_str(&json).unwrap();
    assert_eq!(strategy, BestFirst);

    let json = serde_json::to_string(&SlidingMidpoint).unwrap();
    let rule: SlidingMidpoint = serde_json::from_str(&json).unwrap();
    assert_eq!(rule, SlidingMidpoint);
}

#[test]
fn minkowski_power_is_validated_when_deserialized() {
    assert!(serde_json::from_str::<Minkowski<f64>>(r#"{"power":0.5}"#).is_err());
    assert!(serde_json::from_str::<Minkowski<f64>>(r#"{"power":-2.0}"#).is_err());

    let json = r#"{"power":3.0,"inverted_power":7.0}"#;
    let norm: Minkowski<f64> = serde_json::from_str(json).unwrap();
    assert_eq!(norm, Minkowski::new(3f64).unwrap());
    assert!((norm.to_norm(8f64) - 2f64).abs() < 1e-12);
}
