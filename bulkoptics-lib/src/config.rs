//! Aggregation settings: unit conversion and numerical policy.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CONSISTENCY_TOLERANCE, NM2_PER_CM3_TO_INV_MM};
use crate::error::{OpticsError, Result};

/// Length units used for diameters, concentration volumes and coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthUnit {
    Nanometer,
    Micrometer,
    Centimeter,
    Meter,
    Kilometer,
    Megameter,
}

impl LengthUnit {
    /// Size of one unit in meters.
    pub fn meters(self) -> f64 {
        match self {
            Self::Nanometer => 1e-9,
            Self::Micrometer => 1e-6,
            Self::Centimeter => 1e-2,
            Self::Meter => 1.0,
            Self::Kilometer => 1e3,
            Self::Megameter => 1e6,
        }
    }
}

/// Factor converting Q · D² · N into a bulk coefficient.
///
/// With diameters in `diameter`, concentrations per cubic `concentration`
/// and coefficients per `coefficient`, the factor is
/// `diameter_m² / concentration_m³ · coefficient_m`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitScale {
    factor: f64,
}

impl UnitScale {
    pub fn new(diameter: LengthUnit, concentration: LengthUnit, coefficient: LengthUnit) -> Self {
        let d = diameter.meters();
        let v = concentration.meters();
        Self {
            factor: d * d / (v * v * v) * coefficient.meters(),
        }
    }

    /// A literal conversion factor.
    pub fn custom(factor: f64) -> Result<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(OpticsError::InvalidParameter(format!(
                "unit scale must be positive and finite, got {factor}"
            )));
        }
        Ok(Self { factor })
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl Default for UnitScale {
    /// Diameters in nm, concentrations in #/cm³, coefficients in 1/Mm.
    fn default() -> Self {
        Self {
            factor: NM2_PER_CM3_TO_INV_MM,
        }
    }
}

/// How per-bin contributions are summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Summation {
    /// Sequential below the compensated-sum threshold, compensated above it.
    #[default]
    Auto,
    Sequential,
    /// Neumaier compensated summation.
    Compensated,
}

/// Interpretation of bin concentrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quadrature {
    /// Concentrations are particle counts per bin; contributions are summed.
    #[default]
    BinSum,
    /// Concentrations are a number density dN/dD; integrated over diameter
    /// with the trapezoidal rule.
    Trapezoid,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    pub unit_scale: UnitScale,
    pub summation: Summation,
    pub quadrature: Quadrature,
    /// Relative tolerance for warning on Qext != Qsca + Qabs.
    pub consistency_tolerance: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            unit_scale: UnitScale::default(),
            summation: Summation::Auto,
            quadrature: Quadrature::BinSum,
            consistency_tolerance: DEFAULT_CONSISTENCY_TOLERANCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scale_matches_nm_cm3_megameter() {
        let derived = UnitScale::new(
            LengthUnit::Nanometer,
            LengthUnit::Centimeter,
            LengthUnit::Megameter,
        );
        let rel = (derived.factor() - UnitScale::default().factor()).abs() / 1e-6;
        assert!(rel < 1e-9, "factor = {}", derived.factor());
    }

    #[test]
    fn test_micrometer_scale_is_unity() {
        let s = UnitScale::new(
            LengthUnit::Micrometer,
            LengthUnit::Centimeter,
            LengthUnit::Megameter,
        );
        assert!((s.factor() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_custom_scale_rejects_non_positive() {
        assert!(UnitScale::custom(0.0).is_err());
        assert!(UnitScale::custom(f64::NAN).is_err());
        assert!(UnitScale::custom(1e-3).is_ok());
    }
}
