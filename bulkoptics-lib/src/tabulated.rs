//! Efficiency source backed by a precomputed table.

use bulkoptics_data::EfficiencyTable;
use num_complex::Complex64;

use crate::constants::TABLE_MATCH_TOLERANCE;
use crate::efficiency::{EfficiencySource, OpticalEfficiency};
use crate::error::{OpticsError, Result};
use crate::interp::interp_one;

/// Interpolates Q versus diameter from an [`EfficiencyTable`].
///
/// Only answers queries for the table's own (refractive index, wavelength,
/// medium index) and within its diameter range.
#[derive(Debug, Clone)]
pub struct TabulatedEfficiency {
    table: EfficiencyTable,
}

impl TabulatedEfficiency {
    pub fn new(table: EfficiencyTable) -> Result<Self> {
        let n = table.diameter.len();
        if n == 0 {
            return Err(OpticsError::DataError("efficiency table has no rows".to_string()));
        }
        if table.qext.len() != n || table.qsca.len() != n || table.qabs.len() != n {
            return Err(OpticsError::DataError(format!(
                "efficiency table columns differ in length: \
                 diameter={n}, qext={}, qsca={}, qabs={}",
                table.qext.len(),
                table.qsca.len(),
                table.qabs.len()
            )));
        }
        let columns = [&table.diameter, &table.qext, &table.qsca, &table.qabs];
        if columns.iter().any(|c| c.iter().any(|v| !v.is_finite())) {
            return Err(OpticsError::DataError(
                "efficiency table contains non-finite values".to_string(),
            ));
        }
        if table.diameter[0] <= 0.0 || table.diameter.windows(2).any(|w| w[1] <= w[0]) {
            return Err(OpticsError::DataError(
                "table diameters must be positive and strictly increasing".to_string(),
            ));
        }
        Ok(Self { table })
    }

    pub fn table(&self) -> &EfficiencyTable {
        &self.table
    }

    pub fn refractive_index(&self) -> Complex64 {
        Complex64::new(self.table.refractive_index_re, self.table.refractive_index_im)
    }

    /// Tabulated diameter range (min, max).
    pub fn diameter_range(&self) -> (f64, f64) {
        let d = &self.table.diameter;
        (d[0], d[d.len() - 1])
    }

    /// Whether this table was computed for the given optical parameters.
    pub fn matches(&self, refractive_index: Complex64, wavelength: f64, medium_index: f64) -> bool {
        close(self.table.refractive_index_re, refractive_index.re)
            && close(self.table.refractive_index_im, refractive_index.im)
            && close(self.table.wavelength, wavelength)
            && close(self.table.medium_index, medium_index)
    }
}

impl EfficiencySource for TabulatedEfficiency {
    fn efficiency(
        &self,
        refractive_index: Complex64,
        wavelength: f64,
        medium_index: f64,
        diameter: f64,
    ) -> Result<OpticalEfficiency> {
        if !self.matches(refractive_index, wavelength, medium_index) {
            return Err(OpticsError::TableMismatch(format!(
                "table is for m={}, wavelength={}, medium={}; queried m={refractive_index}, \
                 wavelength={wavelength}, medium={medium_index}",
                self.refractive_index(),
                self.table.wavelength,
                self.table.medium_index
            )));
        }
        let (min, max) = self.diameter_range();
        if !(diameter >= min && diameter <= max) {
            return Err(OpticsError::OutOfRange {
                value: diameter,
                min,
                max,
            });
        }

        let d = &self.table.diameter;
        Ok(OpticalEfficiency::new(
            interp_one(diameter, d, &self.table.qext),
            interp_one(diameter, d, &self.table.qsca),
            interp_one(diameter, d, &self.table.qabs),
        ))
    }
}

#[inline]
fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= TABLE_MATCH_TOLERANCE * a.abs().max(b.abs())
}
