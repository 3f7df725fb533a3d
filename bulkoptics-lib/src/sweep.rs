//! Sweeps over a single independent variable.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::aggregate::{BulkCoefficients, aggregate};
use crate::distribution::{Lognormal, SizeDistribution};
use crate::efficiency::{EfficiencySource, OpticalEfficiency, validate_optical_parameters};
use crate::error::{OpticsError, Result};
use crate::grid::{Spacing, axis};

/// Single-particle efficiencies along a sweep axis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EfficiencySweep {
    /// Diameter or wavelength at each point
    pub axis: Vec<f64>,
    pub qext: Vec<f64>,
    pub qsca: Vec<f64>,
    pub qabs: Vec<f64>,
}

impl EfficiencySweep {
    /// Qsca / Qext at each point, `None` where Qext is zero.
    pub fn albedo(&self) -> Vec<Option<f64>> {
        self.qext
            .iter()
            .zip(&self.qsca)
            .map(|(&e, &s)| if e == 0.0 { None } else { Some(s / e) })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.axis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axis.is_empty()
    }
}

/// Efficiencies over a range of diameters at fixed wavelength.
pub fn diameter_sweep<S>(
    refractive_index: Complex64,
    wavelength: f64,
    medium_index: f64,
    diameter_range: (f64, f64),
    points: usize,
    spacing: Spacing,
    source: &S,
) -> Result<EfficiencySweep>
where
    S: EfficiencySource + ?Sized,
{
    validate_optical_parameters(refractive_index, wavelength, medium_index)?;
    let diameters = axis(diameter_range, points, spacing)?;
    collect_sweep(diameters, |d| {
        source.efficiency(refractive_index, wavelength, medium_index, d)
    })
}

/// Efficiencies over a range of wavelengths at fixed diameter.
pub fn wavelength_sweep<S>(
    refractive_index: Complex64,
    diameter: f64,
    medium_index: f64,
    wavelength_range: (f64, f64),
    points: usize,
    spacing: Spacing,
    source: &S,
) -> Result<EfficiencySweep>
where
    S: EfficiencySource + ?Sized,
{
    let wavelengths = axis(wavelength_range, points, spacing)?;
    // The axis is increasing; its first point is the smallest wavelength.
    validate_optical_parameters(refractive_index, wavelengths[0], medium_index)?;
    if !(diameter.is_finite() && diameter > 0.0) {
        return Err(OpticsError::InvalidParameter(format!(
            "diameter must be positive, got {diameter}"
        )));
    }
    collect_sweep(wavelengths, |wl| {
        source.efficiency(refractive_index, wl, medium_index, diameter)
    })
}

fn collect_sweep<F>(axis: Vec<f64>, mut query: F) -> Result<EfficiencySweep>
where
    F: FnMut(f64) -> Result<OpticalEfficiency>,
{
    let mut sweep = EfficiencySweep {
        qext: Vec::with_capacity(axis.len()),
        qsca: Vec::with_capacity(axis.len()),
        qabs: Vec::with_capacity(axis.len()),
        axis: Vec::new(),
    };
    for &x in &axis {
        let q = query(x)?;
        sweep.qext.push(q.qext);
        sweep.qsca.push(q.qsca);
        sweep.qabs.push(q.qabs);
    }
    sweep.axis = axis;
    Ok(sweep)
}

/// Bulk coefficients of one distribution at each wavelength.
pub fn bulk_wavelength_sweep<S>(
    refractive_index: Complex64,
    wavelengths: &[f64],
    medium_index: f64,
    distribution: &SizeDistribution,
    source: &S,
) -> Result<Vec<BulkCoefficients>>
where
    S: EfficiencySource + ?Sized,
{
    wavelengths
        .iter()
        .map(|&wl| aggregate(refractive_index, wl, medium_index, distribution, source))
        .collect()
}

/// Log-spaced binning shared by every point of a lognormal sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinGrid {
    pub lower: f64,
    pub upper: f64,
    pub n_bins: usize,
}

/// Bulk coefficients of a lognormal distribution as its geometric mean varies.
///
/// `template` supplies the geometric standard deviation and total
/// concentration; its own geometric mean is ignored.
pub fn lognormal_geomean_sweep<S>(
    refractive_index: Complex64,
    wavelength: f64,
    medium_index: f64,
    geo_means: &[f64],
    template: Lognormal,
    grid: BinGrid,
    source: &S,
) -> Result<Vec<BulkCoefficients>>
where
    S: EfficiencySource + ?Sized,
{
    geo_means
        .iter()
        .map(|&mu| {
            let dist = Lognormal::new(mu, template.geo_std_dev, template.total_concentration)?
                .binned(grid.lower, grid.upper, grid.n_bins)?;
            aggregate(refractive_index, wavelength, medium_index, &dist, source)
        })
        .collect()
}
