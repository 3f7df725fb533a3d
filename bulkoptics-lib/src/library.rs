//! Collections of efficiency tables loaded from a compressed blob.
//!
//! Requires the `tables` feature.

use bulkoptics_data::EfficiencyTableSet;
use num_complex::Complex64;

use crate::efficiency::{EfficiencySource, OpticalEfficiency};
use crate::error::{OpticsError, Result};
use crate::tabulated::TabulatedEfficiency;

/// Precomputed efficiency tables, one per (refractive index, wavelength,
/// medium index) triple.
///
/// As an [`EfficiencySource`] it forwards each query to the table computed
/// for the queried optical parameters.
#[derive(Debug, Clone)]
pub struct EfficiencyLibrary {
    version: String,
    tables: Vec<TabulatedEfficiency>,
}

impl EfficiencyLibrary {
    /// Decode a zstd-compressed postcard blob written by `bulkoptics-generate`.
    pub fn from_compressed(bytes: &[u8]) -> Result<Self> {
        let mut decoder = ruzstd::decoding::StreamingDecoder::new(bytes)
            .map_err(|e| OpticsError::DataError(format!("failed to create zstd decoder: {e:?}")))?;
        let mut decompressed = Vec::new();
        std::io::Read::read_to_end(&mut decoder, &mut decompressed)
            .map_err(|e| OpticsError::DataError(format!("failed to decompress tables: {e}")))?;
        Self::from_postcard(&decompressed)
    }

    /// Decode an uncompressed postcard blob.
    pub fn from_postcard(bytes: &[u8]) -> Result<Self> {
        let set: EfficiencyTableSet = postcard::from_bytes(bytes)
            .map_err(|e| OpticsError::DataError(format!("failed to deserialize tables: {e}")))?;
        Self::from_set(set)
    }

    pub fn from_set(set: EfficiencyTableSet) -> Result<Self> {
        let tables = set
            .tables
            .into_iter()
            .map(TabulatedEfficiency::new)
            .collect::<Result<Vec<_>>>()?;
        log::debug!("loaded {} efficiency tables (version {})", tables.len(), set.version);
        Ok(Self {
            version: set.version,
            tables,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn tables(&self) -> &[TabulatedEfficiency] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// The table computed for the given optical parameters.
    pub fn find(
        &self,
        refractive_index: Complex64,
        wavelength: f64,
        medium_index: f64,
    ) -> Result<&TabulatedEfficiency> {
        self.tables
            .iter()
            .find(|t| t.matches(refractive_index, wavelength, medium_index))
            .ok_or_else(|| {
                OpticsError::TableMismatch(format!(
                    "no table for m={refractive_index}, wavelength={wavelength}, \
                     medium={medium_index}"
                ))
            })
    }
}

impl EfficiencySource for EfficiencyLibrary {
    fn efficiency(
        &self,
        refractive_index: Complex64,
        wavelength: f64,
        medium_index: f64,
        diameter: f64,
    ) -> Result<OpticalEfficiency> {
        self.find(refractive_index, wavelength, medium_index)?
            .efficiency(refractive_index, wavelength, medium_index, diameter)
    }
}
