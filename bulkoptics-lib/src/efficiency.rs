//! Single-particle optical efficiencies and the sources that provide them.
//!
//! The Mie/Rayleigh calculation itself lives outside this crate. Anything
//! that can answer "what are Qext, Qsca and Qabs for this diameter" plugs
//! in through [`EfficiencySource`].

use std::collections::HashMap;
use std::sync::Mutex;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{OpticsError, Result};

/// Dimensionless extinction, scattering and absorption efficiencies.
///
/// Sources that also compute the asymmetry parameter or the backscattering
/// efficiency can attach them; they are carried into the bulk result.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OpticalEfficiency {
    pub qext: f64,
    pub qsca: f64,
    pub qabs: f64,
    /// Asymmetry parameter g = <cos θ>
    #[serde(default)]
    pub g: Option<f64>,
    /// Backscattering efficiency
    #[serde(default)]
    pub qback: Option<f64>,
}

impl OpticalEfficiency {
    pub fn new(qext: f64, qsca: f64, qabs: f64) -> Self {
        Self {
            qext,
            qsca,
            qabs,
            g: None,
            qback: None,
        }
    }

    /// Build from extinction and scattering, with Qabs = Qext - Qsca.
    pub fn from_extinction_scattering(qext: f64, qsca: f64) -> Self {
        Self::new(qext, qsca, qext - qsca)
    }

    pub fn with_asymmetry(self, g: f64) -> Self {
        Self { g: Some(g), ..self }
    }

    pub fn with_backscatter(self, qback: f64) -> Self {
        Self {
            qback: Some(qback),
            ..self
        }
    }

    /// Radiation pressure efficiency Qpr = Qext - g·Qsca, when g is known.
    pub fn radiation_pressure(&self) -> Option<f64> {
        self.g.map(|g| self.qext - g * self.qsca)
    }

    /// Qsca / Qext, `None` when Qext is zero.
    pub fn albedo(&self) -> Option<f64> {
        if self.qext == 0.0 {
            None
        } else {
            Some(self.qsca / self.qext)
        }
    }

    /// Whether Qext = Qsca + Qabs holds within `rel_tol` and no term is negative.
    pub fn is_consistent(&self, rel_tol: f64) -> bool {
        let residual = (self.qext - (self.qsca + self.qabs)).abs();
        let scale = self.qext.abs().max(f64::MIN_POSITIVE);
        self.qsca >= 0.0 && self.qabs >= 0.0 && residual <= rel_tol * scale
    }
}

/// External single-particle scattering calculator.
///
/// Implementations decide for themselves whether a diameter needs the full
/// Mie series or the Rayleigh limit. Failures are returned as-is to the
/// caller of the aggregation; wrap foreign errors in [`OpticsError::Source`].
pub trait EfficiencySource {
    /// Efficiencies for one particle.
    ///
    /// # Arguments
    /// * `refractive_index` - Particle refractive index n + ik
    /// * `wavelength` - Wavelength in the same unit as `diameter`
    /// * `medium_index` - Refractive index of the surrounding medium
    /// * `diameter` - Particle diameter
    fn efficiency(
        &self,
        refractive_index: Complex64,
        wavelength: f64,
        medium_index: f64,
        diameter: f64,
    ) -> Result<OpticalEfficiency>;
}

impl<F> EfficiencySource for F
where
    F: Fn(Complex64, f64, f64, f64) -> Result<OpticalEfficiency>,
{
    fn efficiency(
        &self,
        refractive_index: Complex64,
        wavelength: f64,
        medium_index: f64,
        diameter: f64,
    ) -> Result<OpticalEfficiency> {
        self(refractive_index, wavelength, medium_index, diameter)
    }
}

/// Returns the same efficiency for every query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantEfficiency(pub OpticalEfficiency);

impl EfficiencySource for ConstantEfficiency {
    fn efficiency(&self, _: Complex64, _: f64, _: f64, _: f64) -> Result<OpticalEfficiency> {
        Ok(self.0)
    }
}

type QueryKey = [u64; 5];

/// Caches the results of an inner source by exact query.
///
/// Errors from the inner source are returned and not cached.
pub struct MemoizedSource<S> {
    inner: S,
    cache: Mutex<HashMap<QueryKey, OpticalEfficiency>>,
}

impl<S: EfficiencySource> MemoizedSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of cached queries.
    pub fn cached_len(&self) -> usize {
        self.lock().len()
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<QueryKey, OpticalEfficiency>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S: EfficiencySource> EfficiencySource for MemoizedSource<S> {
    fn efficiency(
        &self,
        refractive_index: Complex64,
        wavelength: f64,
        medium_index: f64,
        diameter: f64,
    ) -> Result<OpticalEfficiency> {
        let key = [
            refractive_index.re.to_bits(),
            refractive_index.im.to_bits(),
            wavelength.to_bits(),
            medium_index.to_bits(),
            diameter.to_bits(),
        ];
        if let Some(q) = self.lock().get(&key) {
            return Ok(*q);
        }
        let q = self
            .inner
            .efficiency(refractive_index, wavelength, medium_index, diameter)?;
        self.lock().insert(key, q);
        Ok(q)
    }
}

/// Checks the optical parameters shared by every query of one pass.
pub(crate) fn validate_optical_parameters(
    refractive_index: Complex64,
    wavelength: f64,
    medium_index: f64,
) -> Result<()> {
    if !(refractive_index.re > 0.0) || !refractive_index.re.is_finite() {
        return Err(OpticsError::InvalidParameter(format!(
            "refractive index real part must be positive, got {}",
            refractive_index.re
        )));
    }
    if !(refractive_index.im >= 0.0) || !refractive_index.im.is_finite() {
        return Err(OpticsError::InvalidParameter(format!(
            "refractive index imaginary part must be non-negative, got {}",
            refractive_index.im
        )));
    }
    if !(wavelength > 0.0) || !wavelength.is_finite() {
        return Err(OpticsError::InvalidParameter(format!(
            "wavelength must be positive, got {wavelength}"
        )));
    }
    if !(medium_index > 0.0) || !medium_index.is_finite() {
        return Err(OpticsError::InvalidParameter(format!(
            "medium refractive index must be positive, got {medium_index}"
        )));
    }
    Ok(())
}
