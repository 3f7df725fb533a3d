#![cfg(feature = "parallel")]

use approx::assert_relative_eq;
use bulkoptics::{
    AggregationConfig, Complex64, MemoizedSource, OpticalEfficiency, SizeDistribution, aggregate,
    aggregate_parallel,
};

fn source(
    _: Complex64,
    wavelength: f64,
    _: f64,
    diameter: f64,
) -> bulkoptics::Result<OpticalEfficiency> {
    let x = std::f64::consts::PI * diameter / wavelength;
    let qext = 2.0 * x * x / (1.0 + x * x);
    Ok(OpticalEfficiency::from_extinction_scattering(qext, 0.95 * qext))
}

#[test]
fn test_parallel_matches_sequential() {
    let diameters: Vec<f64> = (1..=5000).map(|i| i as f64).collect();
    let conc: Vec<f64> = diameters.iter().map(|d| 1e4 / d).collect();
    let dist = SizeDistribution::new(&diameters, &conc).unwrap();
    let m = Complex64::new(1.5, 0.001);

    let seq = aggregate(m, 589.0, 1.0, &dist, &source).unwrap();
    let par = aggregate_parallel(&AggregationConfig::default(), m, 589.0, 1.0, &dist, &source)
        .unwrap();

    assert_relative_eq!(seq.bext, par.bext, max_relative = 1e-12);
    assert_relative_eq!(seq.bsca, par.bsca, max_relative = 1e-12);
    assert_relative_eq!(seq.babs, par.babs, max_relative = 1e-12);
}

#[test]
fn test_parallel_with_shared_memo() {
    let dist = SizeDistribution::new(&[100.0, 200.0, 300.0], &[10.0, 20.0, 30.0]).unwrap();
    let m = Complex64::new(1.5, 0.001);
    let memo = MemoizedSource::new(source);

    let config = AggregationConfig::default();
    let first = aggregate_parallel(&config, m, 589.0, 1.0, &dist, &memo).unwrap();
    let second = aggregate_parallel(&config, m, 589.0, 1.0, &dist, &memo).unwrap();
    assert_eq!(first, second);
    assert_eq!(memo.cached_len(), 3);
}

#[test]
fn test_parallel_empty_distribution() {
    let m = Complex64::new(1.5, 0.001);
    let b = aggregate_parallel(
        &AggregationConfig::default(),
        m,
        589.0,
        1.0,
        &SizeDistribution::empty(),
        &source,
    )
    .unwrap();
    assert_eq!(b.single_scattering_albedo(), None);
}
