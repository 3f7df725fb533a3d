/// Scale from nm² · #/cm³ to inverse megameters (1/Mm).
pub const NM2_PER_CM3_TO_INV_MM: f64 = 1e-6;

/// Bin count above which compensated summation is used by default.
pub const COMPENSATED_SUM_THRESHOLD: usize = 10_000;

/// Default relative tolerance for the Qext = Qsca + Qabs check.
pub const DEFAULT_CONSISTENCY_TOLERANCE: f64 = 1e-6;

/// Relative tolerance when matching a query against a tabulated triple.
pub const TABLE_MATCH_TOLERANCE: f64 = 1e-9;
