use serde::{Deserialize, Serialize};

use crate::error::{OpticsError, Result};

/// Point spacing of a sweep axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Spacing {
    Linear,
    Log,
}

/// `points` evenly spaced values over the closed interval `[start, end]`.
pub fn linspace(start: f64, end: f64, points: usize) -> Result<Vec<f64>> {
    check_range(start, end, points)?;
    let step = (end - start) / (points - 1) as f64;
    Ok((0..points)
        .map(|i| if i == points - 1 { end } else { start + i as f64 * step })
        .collect())
}

/// `points` values evenly spaced in log10 over `[start, end]`.
///
/// Both bounds must be positive.
pub fn logspace(start: f64, end: f64, points: usize) -> Result<Vec<f64>> {
    if start <= 0.0 || end <= 0.0 {
        return Err(OpticsError::InvalidParameter(format!(
            "log-spaced range must be positive, got [{start}, {end}]"
        )));
    }
    let mut values: Vec<f64> = linspace(start.log10(), end.log10(), points)?
        .into_iter()
        .map(|e| 10f64.powf(e))
        .collect();
    // Endpoints are exact.
    values[0] = start;
    values[points - 1] = end;
    Ok(values)
}

/// Axis values for a sweep over `range` with the given spacing.
pub fn axis(range: (f64, f64), points: usize, spacing: Spacing) -> Result<Vec<f64>> {
    match spacing {
        Spacing::Linear => linspace(range.0, range.1, points),
        Spacing::Log => logspace(range.0, range.1, points),
    }
}

fn check_range(start: f64, end: f64, points: usize) -> Result<()> {
    if points < 2 {
        return Err(OpticsError::InvalidParameter(format!(
            "need at least 2 points, got {points}"
        )));
    }
    if !start.is_finite() || !end.is_finite() || start >= end {
        return Err(OpticsError::InvalidParameter(format!(
            "range must be finite and increasing, got [{start}, {end}]"
        )));
    }
    Ok(())
}
