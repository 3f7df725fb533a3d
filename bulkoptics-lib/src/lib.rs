//! Bulk optical coefficients of particle size distributions.
//!
//! Per-particle efficiencies come from an external single-particle
//! scattering calculator plugged in through [`EfficiencySource`]; this crate
//! weights them by geometric cross-section and number concentration and sums
//! them into extinction, scattering and absorption coefficients.

pub mod aggregate;
pub mod config;
pub mod constants;
pub mod distribution;
pub mod efficiency;
pub mod error;
pub mod grid;
pub mod interp;
#[cfg(feature = "tables")]
pub mod library;
pub mod sweep;
pub mod tabulated;

#[cfg(feature = "parallel")]
pub use aggregate::aggregate_parallel;
pub use aggregate::{
    BinContribution, BulkCoefficients, aggregate, aggregate_arrays, aggregate_with,
    bin_contributions,
};
pub use config::{AggregationConfig, LengthUnit, Quadrature, Summation, UnitScale};
pub use distribution::{Lognormal, SizeBin, SizeDistribution};
pub use efficiency::{ConstantEfficiency, EfficiencySource, MemoizedSource, OpticalEfficiency};
pub use error::{OpticsError, Result};
pub use grid::Spacing;
#[cfg(feature = "tables")]
pub use library::EfficiencyLibrary;
pub use sweep::{
    BinGrid, EfficiencySweep, bulk_wavelength_sweep, diameter_sweep, lognormal_geomean_sweep,
    wavelength_sweep,
};
pub use tabulated::TabulatedEfficiency;
pub use bulkoptics_data;
pub use num_complex::Complex64;
