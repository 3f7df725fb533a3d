//! Ensemble optical coefficients of a size distribution.
//!
//! Each bin contributes `Q · π(D/2)² · N · scale` to the bulk extinction,
//! scattering and absorption coefficients. The contributions are reduced
//! without mutating shared state, so the same per-bin map can run
//! sequentially or on the rayon pool (`parallel` feature).

use std::f64::consts::PI;
use std::ops::{Add, AddAssign};

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::config::{AggregationConfig, Quadrature, Summation};
use crate::constants::COMPENSATED_SUM_THRESHOLD;
use crate::distribution::{SizeBin, SizeDistribution};
use crate::efficiency::{EfficiencySource, OpticalEfficiency, validate_optical_parameters};
use crate::error::{OpticsError, Result};

/// Bulk extinction, scattering and absorption coefficients
/// (1/Mm with the default unit scale).
///
/// `bsca_g` (Σ g·b_sca) and `bback` are only present when every bin's
/// efficiency carried the asymmetry parameter or the backscattering
/// efficiency.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BulkCoefficients {
    pub bext: f64,
    pub bsca: f64,
    pub babs: f64,
    #[serde(default)]
    pub bsca_g: Option<f64>,
    #[serde(default)]
    pub bback: Option<f64>,
}

impl BulkCoefficients {
    pub fn new(bext: f64, bsca: f64, babs: f64) -> Self {
        Self {
            bext,
            bsca,
            babs,
            bsca_g: None,
            bback: None,
        }
    }

    /// Scattering-weighted asymmetry parameter G = Σ g·b_sca / Bsca.
    pub fn asymmetry_parameter(&self) -> Option<f64> {
        match self.bsca_g {
            Some(sg) if self.bsca != 0.0 => Some(sg / self.bsca),
            _ => None,
        }
    }

    /// Radiation pressure coefficient Bpr = Bext - G·Bsca.
    pub fn radiation_pressure(&self) -> Option<f64> {
        self.bsca_g.map(|sg| self.bext - sg)
    }

    /// Bsca / Bext, or `None` when Bext is exactly zero.
    pub fn single_scattering_albedo(&self) -> Option<f64> {
        if self.bext == 0.0 {
            None
        } else {
            Some(self.bsca / self.bext)
        }
    }

    /// Every coefficient multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            bext: self.bext * factor,
            bsca: self.bsca * factor,
            babs: self.babs * factor,
            bsca_g: self.bsca_g.map(|v| v * factor),
            bback: self.bback.map(|v| v * factor),
        }
    }

    /// Extinction optical depth τ = Bext · z over a path of length `path_length`,
    /// expressed in the inverse of the coefficient unit (Mm by default).
    pub fn optical_depth(&self, path_length: f64) -> f64 {
        self.bext * path_length
    }
}

/// The optional terms survive only when both sides carry them.
impl Add for BulkCoefficients {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            bext: self.bext + rhs.bext,
            bsca: self.bsca + rhs.bsca,
            babs: self.babs + rhs.babs,
            bsca_g: self.bsca_g.zip(rhs.bsca_g).map(|(a, b)| a + b),
            bback: self.bback.zip(rhs.bback).map(|(a, b)| a + b),
        }
    }
}

impl AddAssign for BulkCoefficients {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// The share of one bin in the bulk coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinContribution {
    pub diameter: f64,
    pub concentration: f64,
    pub efficiency: OpticalEfficiency,
    /// Geometric cross-section π(D/2)²
    pub cross_section: f64,
    pub bext: f64,
    pub bsca: f64,
    pub babs: f64,
    pub bsca_g: Option<f64>,
    pub bback: Option<f64>,
}

/// Bulk coefficients of `distribution` with the default configuration:
/// diameters in nm, concentrations in #/cm³, result in 1/Mm.
///
/// An empty distribution yields zeros without querying `source`. Errors
/// from `source` are returned unchanged.
pub fn aggregate<S>(
    refractive_index: Complex64,
    wavelength: f64,
    medium_index: f64,
    distribution: &SizeDistribution,
    source: &S,
) -> Result<BulkCoefficients>
where
    S: EfficiencySource + ?Sized,
{
    aggregate_with(
        &AggregationConfig::default(),
        refractive_index,
        wavelength,
        medium_index,
        distribution,
        source,
    )
}

/// Validate raw diameter and concentration arrays, then aggregate.
///
/// Invalid arrays fail with `InvalidDistribution` before `source` is queried.
pub fn aggregate_arrays<S>(
    refractive_index: Complex64,
    wavelength: f64,
    medium_index: f64,
    diameters: &[f64],
    concentrations: &[f64],
    source: &S,
) -> Result<BulkCoefficients>
where
    S: EfficiencySource + ?Sized,
{
    let distribution = SizeDistribution::new(diameters, concentrations)?;
    aggregate(refractive_index, wavelength, medium_index, &distribution, source)
}

/// Bulk coefficients of `distribution` under an explicit configuration.
///
/// `config` sets the unit scale, the summation policy and whether the
/// concentrations are counts per bin or a number density dN/dD.
/// Optical parameters are checked before anything else, so an invalid
/// index or wavelength fails even for an empty distribution.
pub fn aggregate_with<S>(
    config: &AggregationConfig,
    refractive_index: Complex64,
    wavelength: f64,
    medium_index: f64,
    distribution: &SizeDistribution,
    source: &S,
) -> Result<BulkCoefficients>
where
    S: EfficiencySource + ?Sized,
{
    validate_optical_parameters(refractive_index, wavelength, medium_index)?;
    if distribution.is_empty() {
        return Ok(BulkCoefficients::default());
    }

    let bins = distribution.bins();
    let weights = quadrature_weights(config.quadrature, bins);
    let contributions = bins.iter().zip(&weights).map(|(bin, &weight)| {
        contribution(
            config,
            refractive_index,
            wavelength,
            medium_index,
            bin,
            weight,
            source,
        )
    });
    let total = reduce(config.summation, bins.len(), contributions)?;
    log::debug!(
        "aggregated {} bins at {} nm: bext={:.6e} bsca={:.6e} babs={:.6e}",
        bins.len(),
        wavelength,
        total.bext,
        total.bsca,
        total.babs
    );
    Ok(total)
}

/// Per-bin contributions, in bin order, without summing them.
pub fn bin_contributions<S>(
    config: &AggregationConfig,
    refractive_index: Complex64,
    wavelength: f64,
    medium_index: f64,
    distribution: &SizeDistribution,
    source: &S,
) -> Result<Vec<BinContribution>>
where
    S: EfficiencySource + ?Sized,
{
    validate_optical_parameters(refractive_index, wavelength, medium_index)?;
    let bins = distribution.bins();
    let weights = quadrature_weights(config.quadrature, bins);
    bins.iter()
        .zip(&weights)
        .map(|(bin, &weight)| {
            contribution(
                config,
                refractive_index,
                wavelength,
                medium_index,
                bin,
                weight,
                source,
            )
        })
        .collect()
}

/// [`aggregate_with`] with the per-bin queries spread over the rayon pool.
///
/// Agrees with the sequential version up to floating-point rounding.
#[cfg(feature = "parallel")]
pub fn aggregate_parallel<S>(
    config: &AggregationConfig,
    refractive_index: Complex64,
    wavelength: f64,
    medium_index: f64,
    distribution: &SizeDistribution,
    source: &S,
) -> Result<BulkCoefficients>
where
    S: EfficiencySource + Sync + ?Sized,
{
    use rayon::prelude::*;

    validate_optical_parameters(refractive_index, wavelength, medium_index)?;
    if distribution.is_empty() {
        return Ok(BulkCoefficients::default());
    }

    let bins = distribution.bins();
    let weights = quadrature_weights(config.quadrature, bins);
    let contributions: Vec<BinContribution> = bins
        .par_iter()
        .zip(weights.par_iter())
        .map(|(bin, &weight)| {
            contribution(
                config,
                refractive_index,
                wavelength,
                medium_index,
                bin,
                weight,
                source,
            )
        })
        .collect::<Result<Vec<_>>>()?;
    log::debug!(
        "queried {} bins on {} threads",
        bins.len(),
        rayon::current_num_threads()
    );
    reduce(config.summation, bins.len(), contributions.into_iter().map(Ok))
}

fn contribution<S>(
    config: &AggregationConfig,
    refractive_index: Complex64,
    wavelength: f64,
    medium_index: f64,
    bin: &SizeBin,
    weight: f64,
    source: &S,
) -> Result<BinContribution>
where
    S: EfficiencySource + ?Sized,
{
    let q = source.efficiency(refractive_index, wavelength, medium_index, bin.diameter)?;
    if !q.is_consistent(config.consistency_tolerance) {
        log::warn!(
            "inconsistent efficiency at D={} nm: qext={} qsca={} qabs={}",
            bin.diameter,
            q.qext,
            q.qsca,
            q.qabs
        );
    }

    let radius = bin.diameter / 2.0;
    let cross_section = PI * radius * radius;
    let k = cross_section * bin.concentration * weight * config.unit_scale.factor();
    Ok(BinContribution {
        diameter: bin.diameter,
        concentration: bin.concentration,
        efficiency: q,
        cross_section,
        bext: q.qext * k,
        bsca: q.qsca * k,
        babs: q.qabs * k,
        bsca_g: q.g.map(|g| g * q.qsca * k),
        bback: q.qback.map(|qb| qb * k),
    })
}

/// Weight of each bin in the reduction.
///
/// Counts per bin are summed directly. A number density is integrated with
/// the trapezoidal rule, which gives each node half the width of its
/// neighbouring intervals.
fn quadrature_weights(quadrature: Quadrature, bins: &[SizeBin]) -> Vec<f64> {
    match quadrature {
        Quadrature::BinSum => vec![1.0; bins.len()],
        Quadrature::Trapezoid => {
            let n = bins.len();
            (0..n)
                .map(|i| {
                    let left = if i > 0 {
                        bins[i].diameter - bins[i - 1].diameter
                    } else {
                        0.0
                    };
                    let right = if i + 1 < n {
                        bins[i + 1].diameter - bins[i].diameter
                    } else {
                        0.0
                    };
                    0.5 * (left + right)
                })
                .collect()
        }
    }
}

fn reduce<I>(summation: Summation, len: usize, contributions: I) -> Result<BulkCoefficients>
where
    I: IntoIterator<Item = Result<BinContribution>>,
{
    let compensated = match summation {
        Summation::Auto => len > COMPENSATED_SUM_THRESHOLD,
        Summation::Sequential => false,
        Summation::Compensated => true,
    };
    let acc = contributions
        .into_iter()
        .try_fold(Accumulator::new(compensated), |mut acc, c| {
            acc.push(&c?);
            Ok::<_, OpticsError>(acc)
        })?;
    Ok(acc.finish())
}

/// Neumaier's improved Kahan summation.
#[derive(Debug, Clone, Copy, Default)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    fn total(&self) -> f64 {
        self.sum + self.compensation
    }
}

struct Accumulator {
    compensated: bool,
    ext: CompensatedSum,
    sca: CompensatedSum,
    abs: CompensatedSum,
    // None once a bin lacks the term.
    sca_g: Option<CompensatedSum>,
    back: Option<CompensatedSum>,
    bins: usize,
}

impl Accumulator {
    fn new(compensated: bool) -> Self {
        Self {
            compensated,
            ext: CompensatedSum::default(),
            sca: CompensatedSum::default(),
            abs: CompensatedSum::default(),
            sca_g: Some(CompensatedSum::default()),
            back: Some(CompensatedSum::default()),
            bins: 0,
        }
    }

    fn push(&mut self, c: &BinContribution) {
        let compensated = self.compensated;
        let add = |acc: &mut CompensatedSum, x: f64| {
            if compensated {
                acc.add(x);
            } else {
                acc.sum += x;
            }
        };
        add(&mut self.ext, c.bext);
        add(&mut self.sca, c.bsca);
        add(&mut self.abs, c.babs);
        self.sca_g = self.sca_g.take().zip(c.bsca_g).map(|(mut acc, x)| {
            add(&mut acc, x);
            acc
        });
        self.back = self.back.take().zip(c.bback).map(|(mut acc, x)| {
            add(&mut acc, x);
            acc
        });
        self.bins += 1;
    }

    fn finish(&self) -> BulkCoefficients {
        let optional = |acc: Option<CompensatedSum>| {
            acc.filter(|_| self.bins > 0).map(|a| a.total())
        };
        BulkCoefficients {
            bext: self.ext.total(),
            bsca: self.sca.total(),
            babs: self.abs.total(),
            bsca_g: optional(self.sca_g),
            bback: optional(self.back),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::efficiency::ConstantEfficiency;

    fn stub() -> ConstantEfficiency {
        ConstantEfficiency(OpticalEfficiency::new(2.5, 2.0, 0.5))
    }

    fn m() -> Complex64 {
        Complex64::new(1.5, 0.001)
    }

    #[test]
    fn test_compensated_sum_recovers_small_terms() {
        let mut naive = 0.0;
        let mut comp = CompensatedSum::default();
        for x in [1.0, 1e100, 1.0, -1e100] {
            naive += x;
            comp.add(x);
        }
        assert_eq!(naive, 0.0);
        assert_eq!(comp.total(), 2.0);
    }

    #[test]
    fn test_trapezoid_weights() {
        let dist = SizeDistribution::new(&[100.0, 200.0, 400.0], &[1.0, 1.0, 1.0]).unwrap();
        let w = quadrature_weights(Quadrature::Trapezoid, dist.bins());
        assert_eq!(w, vec![50.0, 150.0, 100.0]);

        let single = SizeDistribution::new(&[100.0], &[1.0]).unwrap();
        assert_eq!(quadrature_weights(Quadrature::Trapezoid, single.bins()), vec![0.0]);
    }

    #[test]
    fn test_bin_contributions_report_cross_sections() {
        let dist = SizeDistribution::new(&[200.0, 400.0], &[2000.0, 10.0]).unwrap();
        let contribs =
            bin_contributions(&AggregationConfig::default(), m(), 589.0, 1.0, &dist, &stub())
                .unwrap();
        assert_eq!(contribs.len(), 2);
        assert!((contribs[0].cross_section - PI * 1e4).abs() < 1e-6);
        assert!((contribs[0].bext - 157.079_632_679).abs() < 1e-6);
        assert!((contribs[1].cross_section - PI * 4e4).abs() < 1e-6);
    }

    #[test]
    fn test_compensated_and_sequential_agree_on_small_input() {
        let dist = SizeDistribution::new(&[100.0, 150.0, 220.0], &[10.0, 20.0, 5.0]).unwrap();
        let seq = AggregationConfig {
            summation: Summation::Sequential,
            ..AggregationConfig::default()
        };
        let comp = AggregationConfig {
            summation: Summation::Compensated,
            ..AggregationConfig::default()
        };
        let a = aggregate_with(&seq, m(), 589.0, 1.0, &dist, &stub()).unwrap();
        let b = aggregate_with(&comp, m(), 589.0, 1.0, &dist, &stub()).unwrap();
        assert!((a.bext - b.bext).abs() <= 1e-12 * a.bext);
    }

    #[test]
    fn test_asymmetry_and_backscatter_carry_through() {
        let source = ConstantEfficiency(
            OpticalEfficiency::new(2.5, 2.0, 0.5)
                .with_asymmetry(0.7)
                .with_backscatter(0.2),
        );
        let dist = SizeDistribution::new(&[200.0, 400.0], &[2000.0, 10.0]).unwrap();
        let b = aggregate(m(), 589.0, 1.0, &dist, &source).unwrap();
        assert!((b.asymmetry_parameter().unwrap() - 0.7).abs() < 1e-12);
        assert!((b.radiation_pressure().unwrap() - (b.bext - 0.7 * b.bsca)).abs() < 1e-9);
        assert!((b.bback.unwrap() - b.bext * 0.2 / 2.5).abs() < 1e-9);

        let plain = aggregate(m(), 589.0, 1.0, &dist, &stub()).unwrap();
        assert_eq!(plain.bsca_g, None);
        assert_eq!(plain.bback, None);
        assert_eq!(plain.asymmetry_parameter(), None);
    }

    #[test]
    fn test_optional_terms_need_every_bin() {
        let source = |_: Complex64, _: f64, _: f64, d: f64| -> Result<OpticalEfficiency> {
            let q = OpticalEfficiency::new(2.0, 1.0, 1.0);
            Ok(if d < 300.0 { q.with_asymmetry(0.5) } else { q })
        };
        let dist = SizeDistribution::new(&[200.0, 400.0], &[1.0, 1.0]).unwrap();
        let b = aggregate(m(), 589.0, 1.0, &dist, &source).unwrap();
        assert_eq!(b.bsca_g, None);
        assert!(b.bext > 0.0);
    }

    #[test]
    fn test_optical_depth() {
        let b = BulkCoefficients::new(150.0, 120.0, 30.0);
        assert!((b.optical_depth(0.002) - 0.3).abs() < 1e-12);
    }
}
