//! End-to-end scenarios: sampled histograms and lognormal aerosols.

use std::f64::consts::PI;

use approx::assert_relative_eq;
use bulkoptics::{
    AggregationConfig, BinGrid, Complex64, Lognormal, OpticalEfficiency, SizeDistribution,
    Spacing, aggregate, bin_contributions, diameter_sweep, lognormal_geomean_sweep,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

/// Rayleigh-like growth saturating at the large-particle limit Qext = 2.
fn smooth_source(
    _: Complex64,
    wavelength: f64,
    _: f64,
    diameter: f64,
) -> bulkoptics::Result<OpticalEfficiency> {
    let x = PI * diameter / wavelength;
    let x4 = x.powi(4);
    let qext = 2.0 * x4 / (1.0 + x4);
    Ok(OpticalEfficiency::from_extinction_scattering(qext, 0.98 * qext))
}

/// Normal draws folded to positive diameters.
fn normal_samples(rng: &mut StdRng, mean: f64, sd: f64, n: usize) -> Vec<f64> {
    let normal = Normal::new(mean, sd).unwrap();
    (0..n)
        .map(|_| normal.sample(rng).abs().max(1.0))
        .collect()
}

#[test]
fn test_histogram_aggregation_matches_manual_loop() {
    let mut rng = StdRng::seed_from_u64(2024);
    let samples = normal_samples(&mut rng, 200.0, 75.0, 2000);
    let dist = SizeDistribution::from_samples(&samples, 50).unwrap();
    assert_eq!(dist.total_concentration(), 2000.0);

    let m = Complex64::new(1.5, 0.001);
    let b = aggregate(m, 589.0, 1.0, &dist, &smooth_source).unwrap();

    let manual: f64 = dist
        .bins()
        .iter()
        .map(|bin| {
            let q = smooth_source(m, 589.0, 1.0, bin.diameter).unwrap();
            q.qext * PI * (bin.diameter / 2.0).powi(2) * bin.concentration * 1e-6
        })
        .sum();
    assert_relative_eq!(b.bext, manual, max_relative = 1e-12);
}

#[test]
fn test_extinction_peak_sits_above_count_peak() {
    let ln = Lognormal::new(200.0, 1.5, 2000.0).unwrap();
    let dist = ln.binned(10.0, 1000.0, 250).unwrap();
    let m = Complex64::new(1.5, 0.001);
    let contribs =
        bin_contributions(&AggregationConfig::default(), m, 589.0, 1.0, &dist, &smooth_source)
            .unwrap();

    let argmax = |values: Vec<f64>| {
        values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap()
    };
    let count_peak = argmax(dist.concentrations());
    let bext_peak = argmax(contribs.iter().map(|c| c.bext).collect());
    assert!(dist.diameters()[bext_peak] > dist.diameters()[count_peak]);
}

#[test]
fn test_size_sweep_saturates() {
    let m = Complex64::new(1.5, 0.001);
    let sweep =
        diameter_sweep(m, 589.0, 1.0, (10.0, 5000.0), 500, Spacing::Linear, &smooth_source)
            .unwrap();
    assert_eq!(sweep.len(), 500);
    assert!(sweep.qext[0] < 1e-3);
    assert_relative_eq!(sweep.qext[499], 2.0, max_relative = 1e-3);
}

#[test]
fn test_geomean_sweep_is_monotonic() {
    let m = Complex64::new(1.5, 0.001);
    let template = Lognormal::new(1.0, 1.5, 2000.0).unwrap();
    let grid = BinGrid {
        lower: 10.0,
        upper: 20_000.0,
        n_bins: 250,
    };
    let means: Vec<f64> = (1..40).map(|i| i as f64 * 50.0).collect();
    let out = lognormal_geomean_sweep(m, 589.0, 1.0, &means, template, grid, &smooth_source)
        .unwrap();
    assert_eq!(out.len(), means.len());
    for pair in out.windows(2) {
        assert!(pair[1].bext > pair[0].bext);
    }
}
