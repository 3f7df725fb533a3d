//! WASM bindings for bulkoptics.
//!
//! Build with:
//! ```sh
//! wasm-pack build -p bulkoptics-wasm
//! ```

use js_sys::{Array, Float64Array};
use num_complex::Complex64;
use wasm_bindgen::prelude::*;

use bulkoptics::{
    BulkCoefficients, ConstantEfficiency, EfficiencyLibrary, Lognormal, OpticalEfficiency,
    SizeDistribution, aggregate,
};

fn to_js(e: bulkoptics::OpticsError) -> JsError {
    JsError::new(&e.to_string())
}

/// `[bext, bsca, babs, ssa]`, with `ssa` NaN when Bext is zero.
fn flatten(b: BulkCoefficients) -> Vec<f64> {
    vec![
        b.bext,
        b.bsca,
        b.babs,
        b.single_scattering_albedo().unwrap_or(f64::NAN),
    ]
}

/// `[diameters, concentrations]` as two typed arrays.
fn to_columns(dist: &SizeDistribution) -> Array {
    let out = Array::new();
    out.push(&Float64Array::from(&dist.diameters()[..]));
    out.push(&Float64Array::from(&dist.concentrations()[..]));
    out
}

// ── Aggregation ──

/// Bulk coefficients (1/Mm) with the same efficiencies for every bin.
///
/// Diameters in nm, concentrations in #/cm³. Returns
/// `[bext, bsca, babs, ssa]`.
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn aggregate_constant(
    m_re: f64,
    m_im: f64,
    wavelength: f64,
    medium_index: f64,
    diameters: &[f64],
    concentrations: &[f64],
    qext: f64,
    qsca: f64,
) -> Result<Vec<f64>, JsError> {
    let dist = SizeDistribution::new(diameters, concentrations).map_err(to_js)?;
    let source = ConstantEfficiency(OpticalEfficiency::from_extinction_scattering(qext, qsca));
    let b = aggregate(
        Complex64::new(m_re, m_im),
        wavelength,
        medium_index,
        &dist,
        &source,
    )
    .map_err(to_js)?;
    Ok(flatten(b))
}

/// Bulk coefficients (1/Mm) using a compressed efficiency table library.
#[wasm_bindgen]
pub fn aggregate_tabulated(
    library: &[u8],
    m_re: f64,
    m_im: f64,
    wavelength: f64,
    medium_index: f64,
    diameters: &[f64],
    concentrations: &[f64],
) -> Result<Vec<f64>, JsError> {
    let lib = EfficiencyLibrary::from_compressed(library).map_err(to_js)?;
    let dist = SizeDistribution::new(diameters, concentrations).map_err(to_js)?;
    let b = aggregate(
        Complex64::new(m_re, m_im),
        wavelength,
        medium_index,
        &dist,
        &lib,
    )
    .map_err(to_js)?;
    Ok(flatten(b))
}

// ── Size distributions ──

/// Log-spaced bins of a lognormal distribution, as `[diameters, counts]`.
#[wasm_bindgen]
pub fn lognormal_bins(
    geo_mean: f64,
    geo_std_dev: f64,
    total_concentration: f64,
    lower: f64,
    upper: f64,
    n_bins: usize,
) -> Result<Array, JsError> {
    let dist = Lognormal::new(geo_mean, geo_std_dev, total_concentration)
        .and_then(|ln| ln.binned(lower, upper, n_bins))
        .map_err(to_js)?;
    Ok(to_columns(&dist))
}

/// Equal-width histogram of measured diameters, as `[midpoints, counts]`.
#[wasm_bindgen]
pub fn histogram_bins(samples: &[f64], n_bins: usize) -> Result<Array, JsError> {
    let dist = SizeDistribution::from_samples(samples, n_bins).map_err(to_js)?;
    Ok(to_columns(&dist))
}
