use fedavg::{
    FedAvgError,
    aggregation::{ClientReport, MetricAggregator, MissingMetricPolicy, WeightedAverage},
};

fn reports() -> Vec<ClientReport> {
    vec![
        ClientReport::new(600, [("accuracy", 0.8123), ("loss", 0.51)]),
        ClientReport::new(17, [("accuracy", 0.1), ("loss", 2.3)]),
        ClientReport::new(1, [("accuracy", 1.0), ("loss", 0.0)]),
        ClientReport::new(333, [("accuracy", 0.3333333), ("loss", 1.7)]),
        ClientReport::new(0, [("accuracy", 0.9), ("loss", 0.2)]),
    ]
}

/// Heap's algorithm, every ordering of `items`.
fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    fn heap<T: Clone>(k: usize, items: &mut Vec<T>, out: &mut Vec<Vec<T>>) {
        if k <= 1 {
            out.push(items.clone());
            return;
        }
        heap(k - 1, items, out);
        for i in 0..k - 1 {
            let j = if k % 2 == 0 { i } else { 0 };
            items.swap(j, k - 1);
            heap(k - 1, items, out);
        }
    }

    let mut items = items.to_vec();
    let mut out = Vec::new();
    heap(items.len(), &mut items, &mut out);
    out
}

#[test]
fn aggregate_is_bit_identical_under_every_permutation() {
    let policies = [
        MissingMetricPolicy::Intersection,
        MissingMetricPolicy::ZeroFill,
        MissingMetricPolicy::Require(vec!["accuracy".into()]),
    ];

    for policy in policies {
        let agg = WeightedAverage::new(policy);
        let expected = agg.aggregate(&reports()).unwrap();

        let all = permutations(&reports());
        assert_eq!(all.len(), 120);

        for ordering in all {
            let got = agg.aggregate(&ordering).unwrap();
            assert_eq!(got.len(), expected.len());
            for (name, value) in &expected {
                assert_eq!(got[name].to_bits(), value.to_bits(), "metric {name}");
            }
        }
    }
}

#[test]
fn aggregate_is_idempotent() {
    let agg = WeightedAverage::default();
    let reports = reports();
    assert_eq!(agg.aggregate(&reports).unwrap(), agg.aggregate(&reports).unwrap());
}

#[test]
fn weighted_mean_matches_the_definition() {
    let agg = WeightedAverage::default();
    let reports = reports();
    let out = agg.aggregate(&reports).unwrap();

    let total: u64 = reports.iter().map(|r| r.sample_count).sum();
    let expected: f64 = reports
        .iter()
        .map(|r| r.sample_count as f64 * r.metrics["accuracy"])
        .sum::<f64>()
        / total as f64;

    assert!((out["accuracy"] - expected).abs() < 1e-12);
}

#[test]
fn reports_deserialize_from_json() {
    let reports: Vec<ClientReport> = serde_json::from_str(
        r#"[{"sample_count": 5, "metrics": {"accuracy": 1.0}},
            {"sample_count": 5, "metrics": {"accuracy": 0.0}}]"#,
    )
    .unwrap();

    let out = WeightedAverage::default().aggregate(&reports).unwrap();
    assert_eq!(out["accuracy"], 0.5);
}

#[test]
fn zero_total_samples_fails_instead_of_defaulting() {
    let reports = vec![ClientReport::new(0, [("accuracy", 0.5)])];
    assert!(matches!(
        WeightedAverage::default().aggregate(&reports),
        Err(FedAvgError::DivisionByZero { .. })
    ));
}
