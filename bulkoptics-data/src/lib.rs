#![no_std]

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

/// A set of precomputed efficiency tables, deserialized from a compressed blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EfficiencyTableSet {
    pub version: String,
    pub tables: Vec<EfficiencyTable>,
}

/// Mie efficiencies versus particle diameter for one fixed
/// (refractive index, wavelength, medium index) triple.
///
/// Produced offline by an external single-particle calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EfficiencyTable {
    /// Real part of the particle refractive index
    pub refractive_index_re: f64,
    /// Imaginary (absorbing) part of the particle refractive index
    pub refractive_index_im: f64,
    /// Wavelength, same length unit as `diameter`
    pub wavelength: f64,
    pub medium_index: f64,
    /// Strictly increasing diameters
    pub diameter: Vec<f64>,
    pub qext: Vec<f64>,
    pub qsca: Vec<f64>,
    pub qabs: Vec<f64>,
}
