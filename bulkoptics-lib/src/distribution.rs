//! Particle size distributions.
//!
//! A [`SizeDistribution`] is an immutable, validated list of bins with
//! strictly increasing diameters. It can be built from raw arrays, from a
//! histogram of sampled diameters, or from an analytic [`Lognormal`].

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{OpticsError, Result};
use crate::grid::logspace;

/// One bin of a size distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeBin {
    /// Particle diameter (nm by convention)
    pub diameter: f64,
    /// Number concentration (#/cm³ by convention)
    pub concentration: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SizeDistribution {
    bins: Vec<SizeBin>,
}

impl SizeDistribution {
    /// Build from parallel diameter and concentration arrays.
    pub fn new(diameters: &[f64], concentrations: &[f64]) -> Result<Self> {
        if diameters.len() != concentrations.len() {
            return Err(OpticsError::InvalidDistribution(format!(
                "diameters ({}) and concentrations ({}) lengths must match",
                diameters.len(),
                concentrations.len()
            )));
        }
        let bins = diameters
            .iter()
            .zip(concentrations)
            .map(|(&diameter, &concentration)| SizeBin {
                diameter,
                concentration,
            })
            .collect();
        Self::from_bins(bins)
    }

    pub fn from_bins(bins: Vec<SizeBin>) -> Result<Self> {
        validate_bins(&bins)?;
        Ok(Self { bins })
    }

    /// A distribution with no bins.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Histogram of sampled diameters, equivalent to `numpy.histogram`.
    ///
    /// Bins span `[min, max]` of the samples with equal width; the last bin
    /// is closed on the right. Each bin is represented by its midpoint and
    /// its count. Empty bins are kept with zero concentration.
    pub fn from_samples(samples: &[f64], n_bins: usize) -> Result<Self> {
        if n_bins == 0 {
            return Err(OpticsError::InvalidParameter(
                "histogram needs at least one bin".to_string(),
            ));
        }
        if samples.is_empty() {
            return Ok(Self::empty());
        }
        if let Some(bad) = samples.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
            return Err(OpticsError::InvalidDistribution(format!(
                "sampled diameter must be positive and finite, got {bad}"
            )));
        }

        let mut lo = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        // Identical samples: widen to [v/2, 3v/2] so every midpoint stays positive.
        if lo == hi {
            let half = 0.5 * lo;
            lo -= half;
            hi += half;
        }
        let width = (hi - lo) / n_bins as f64;

        let mut counts = vec![0.0; n_bins];
        for &s in samples {
            let idx = (((s - lo) / width) as usize).min(n_bins - 1);
            counts[idx] += 1.0;
        }

        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| SizeBin {
                diameter: lo + (i as f64 + 0.5) * width,
                concentration: count,
            })
            .collect();
        Self::from_bins(bins)
    }

    pub fn bins(&self) -> &[SizeBin] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn diameters(&self) -> Vec<f64> {
        self.bins.iter().map(|b| b.diameter).collect()
    }

    pub fn concentrations(&self) -> Vec<f64> {
        self.bins.iter().map(|b| b.concentration).collect()
    }

    pub fn total_concentration(&self) -> f64 {
        self.bins.iter().map(|b| b.concentration).sum()
    }

    /// Every concentration multiplied by `factor` (> 0).
    pub fn scaled(&self, factor: f64) -> Result<Self> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(OpticsError::InvalidParameter(format!(
                "scale factor must be positive and finite, got {factor}"
            )));
        }
        Ok(Self {
            bins: self
                .bins
                .iter()
                .map(|b| SizeBin {
                    diameter: b.diameter,
                    concentration: b.concentration * factor,
                })
                .collect(),
        })
    }

    /// Union of two distributions. Bins sharing a diameter are merged by
    /// summing their concentrations.
    pub fn merge(&self, other: &SizeDistribution) -> SizeDistribution {
        let mut bins: Vec<SizeBin> = Vec::with_capacity(self.len() + other.len());
        let (mut a, mut b) = (self.bins.iter().peekable(), other.bins.iter().peekable());
        loop {
            let next = match (a.peek(), b.peek()) {
                (Some(x), Some(y)) if x.diameter <= y.diameter => a.next(),
                (Some(_), Some(_)) => b.next(),
                (Some(_), None) => a.next(),
                (None, Some(_)) => b.next(),
                (None, None) => break,
            };
            let Some(&bin) = next else { break };
            match bins.last_mut() {
                Some(last) if last.diameter == bin.diameter => {
                    last.concentration += bin.concentration;
                }
                _ => bins.push(bin),
            }
        }
        SizeDistribution { bins }
    }
}

impl<'de> Deserialize<'de> for SizeDistribution {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            bins: Vec<SizeBin>,
        }
        let raw = Raw::deserialize(deserializer)?;
        SizeDistribution::from_bins(raw.bins).map_err(serde::de::Error::custom)
    }
}

fn validate_bins(bins: &[SizeBin]) -> Result<()> {
    for (i, bin) in bins.iter().enumerate() {
        if !(bin.diameter.is_finite() && bin.diameter > 0.0) {
            return Err(OpticsError::InvalidDistribution(format!(
                "bin {i}: diameter must be positive and finite, got {}",
                bin.diameter
            )));
        }
        if !(bin.concentration.is_finite() && bin.concentration >= 0.0) {
            return Err(OpticsError::InvalidDistribution(format!(
                "bin {i}: concentration must be non-negative and finite, got {}",
                bin.concentration
            )));
        }
    }
    if let Some(i) = bins.windows(2).position(|w| w[1].diameter <= w[0].diameter) {
        return Err(OpticsError::InvalidDistribution(format!(
            "diameters must be strictly increasing: bin {} ({}) follows {}",
            i + 1,
            bins[i + 1].diameter,
            bins[i].diameter
        )));
    }
    Ok(())
}

/// Lognormal number size distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lognormal {
    /// Geometric mean diameter
    pub geo_mean: f64,
    /// Geometric standard deviation (> 1)
    pub geo_std_dev: f64,
    /// Total number concentration
    pub total_concentration: f64,
}

impl Lognormal {
    pub fn new(geo_mean: f64, geo_std_dev: f64, total_concentration: f64) -> Result<Self> {
        let dist = Self {
            geo_mean,
            geo_std_dev,
            total_concentration,
        };
        dist.validate()?;
        Ok(dist)
    }

    fn validate(&self) -> Result<()> {
        if !(self.geo_mean.is_finite() && self.geo_mean > 0.0) {
            return Err(OpticsError::InvalidParameter(format!(
                "geometric mean must be positive, got {}",
                self.geo_mean
            )));
        }
        if !(self.geo_std_dev.is_finite() && self.geo_std_dev > 1.0) {
            return Err(OpticsError::InvalidParameter(format!(
                "geometric standard deviation must exceed 1, got {}",
                self.geo_std_dev
            )));
        }
        if !(self.total_concentration.is_finite() && self.total_concentration >= 0.0) {
            return Err(OpticsError::InvalidParameter(format!(
                "total concentration must be non-negative, got {}",
                self.total_concentration
            )));
        }
        Ok(())
    }

    /// dN/dlnD at diameter `d`.
    pub fn density_per_ln_d(&self, d: f64) -> f64 {
        let ln_sigma = self.geo_std_dev.ln();
        let z = (d.ln() - self.geo_mean.ln()) / ln_sigma;
        self.total_concentration / ((2.0 * PI).sqrt() * ln_sigma) * (-0.5 * z * z).exp()
    }

    /// dN/dD at diameter `d`.
    pub fn density_per_d(&self, d: f64) -> f64 {
        self.density_per_ln_d(d) / d
    }

    /// Discretize into `n_bins` log-spaced bins over `[lower, upper]`.
    ///
    /// Bin concentrations are dN/dlnD at the bin diameter times the constant
    /// log-width of the grid, so they are counts per bin.
    pub fn binned(&self, lower: f64, upper: f64, n_bins: usize) -> Result<SizeDistribution> {
        self.validate()?;
        let diameters = logspace(lower, upper, n_bins)?;
        let d_ln = (upper / lower).ln() / (n_bins - 1) as f64;
        let concentrations: Vec<f64> = diameters
            .iter()
            .map(|&d| self.density_per_ln_d(d) * d_ln)
            .collect();
        SizeDistribution::new(&diameters, &concentrations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_length_mismatch() {
        let err = SizeDistribution::new(&[100.0, 200.0], &[1.0]).unwrap_err();
        assert!(matches!(err, OpticsError::InvalidDistribution(_)));
    }

    #[test]
    fn test_new_rejects_bad_bins() {
        assert!(SizeDistribution::new(&[-5.0, 100.0], &[1.0, 1.0]).is_err());
        assert!(SizeDistribution::new(&[0.0], &[1.0]).is_err());
        assert!(SizeDistribution::new(&[100.0], &[-1.0]).is_err());
        assert!(SizeDistribution::new(&[100.0], &[f64::NAN]).is_err());
        assert!(SizeDistribution::new(&[200.0, 100.0], &[1.0, 1.0]).is_err());
        assert!(SizeDistribution::new(&[100.0, 100.0], &[1.0, 1.0]).is_err());
    }

    #[test]
    fn test_histogram_matches_numpy() {
        // np.histogram([1, 2, 2, 3, 4], 3) -> counts [1, 2, 2], edges [1, 2, 3, 4]
        let dist = SizeDistribution::from_samples(&[1.0, 2.0, 2.0, 3.0, 4.0], 3).unwrap();
        assert_eq!(dist.concentrations(), vec![1.0, 2.0, 2.0]);
        let d = dist.diameters();
        assert!((d[0] - 1.5).abs() < 1e-12);
        assert!((d[1] - 2.5).abs() < 1e-12);
        assert!((d[2] - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_histogram_keeps_empty_bins() {
        let dist = SizeDistribution::from_samples(&[10.0, 90.0], 4).unwrap();
        assert_eq!(dist.concentrations(), vec![1.0, 0.0, 0.0, 1.0]);
        assert_eq!(dist.total_concentration(), 2.0);
    }

    #[test]
    fn test_histogram_of_identical_small_samples() {
        let dist = SizeDistribution::from_samples(&[0.3, 0.3, 0.3], 10).unwrap();
        assert_eq!(dist.len(), 10);
        assert_eq!(dist.total_concentration(), 3.0);
        assert!(dist.diameters().iter().all(|&d| d > 0.0));
        let d = dist.diameters();
        assert!((d[0] - 0.165).abs() < 1e-12);
        assert!((d[9] - 0.435).abs() < 1e-12);
        assert!(dist.concentrations().contains(&3.0));
    }

    #[test]
    fn test_histogram_rejects_non_positive_samples() {
        assert!(SizeDistribution::from_samples(&[100.0, -3.0], 5).is_err());
        assert!(SizeDistribution::from_samples(&[100.0], 0).is_err());
        assert!(SizeDistribution::from_samples(&[], 5).unwrap().is_empty());
    }

    #[test]
    fn test_merge_interleaves_and_combines() {
        let a = SizeDistribution::new(&[100.0, 300.0], &[1.0, 3.0]).unwrap();
        let b = SizeDistribution::new(&[200.0, 300.0, 400.0], &[2.0, 1.0, 4.0]).unwrap();
        let merged = a.merge(&b);
        assert_eq!(merged.diameters(), vec![100.0, 200.0, 300.0, 400.0]);
        assert_eq!(merged.concentrations(), vec![1.0, 2.0, 4.0, 4.0]);
    }

    #[test]
    fn test_scaled() {
        let dist = SizeDistribution::new(&[100.0, 200.0], &[1.0, 2.0]).unwrap();
        assert_eq!(dist.scaled(3.0).unwrap().concentrations(), vec![3.0, 6.0]);
        assert!(dist.scaled(0.0).is_err());
        assert!(dist.scaled(-1.0).is_err());
    }

    #[test]
    fn test_lognormal_bins_recover_total() {
        let ln = Lognormal::new(200.0, 1.5, 2000.0).unwrap();
        let dist = ln.binned(10.0, 5000.0, 250).unwrap();
        assert_eq!(dist.len(), 250);
        let total = dist.total_concentration();
        assert!((total - 2000.0).abs() / 2000.0 < 1e-3, "total = {total}");
    }

    #[test]
    fn test_lognormal_peaks_at_geo_mean() {
        let ln = Lognormal::new(200.0, 1.5, 1.0).unwrap();
        assert!(ln.density_per_ln_d(200.0) > ln.density_per_ln_d(150.0));
        assert!(ln.density_per_ln_d(200.0) > ln.density_per_ln_d(260.0));
    }

    #[test]
    fn test_lognormal_validation() {
        assert!(Lognormal::new(0.0, 1.5, 10.0).is_err());
        assert!(Lognormal::new(200.0, 1.0, 10.0).is_err());
        assert!(Lognormal::new(200.0, 1.5, -1.0).is_err());
        let ln = Lognormal::new(200.0, 1.5, 10.0).unwrap();
        assert!(ln.binned(100.0, 50.0, 10).is_err());
        assert!(ln.binned(10.0, 1000.0, 1).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let dist = SizeDistribution::new(&[100.0], &[5.0]).unwrap();
        let bytes = postcard::to_allocvec(&dist).unwrap();
        let back: SizeDistribution = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(back, dist);

        let bad = postcard::to_allocvec(&vec![SizeBin {
            diameter: -1.0,
            concentration: 1.0,
        }])
        .unwrap();
        assert!(postcard::from_bytes::<SizeDistribution>(&bad).is_err());
    }
}
