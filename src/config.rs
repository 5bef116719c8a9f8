//! Engine-wide tuning constants.

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Magnitudes beyond this are treated as divergence when sampling a limit.
pub const INF_THRESHOLD: f64 = 1e10;
/// Values closer to zero than this print as `0`.
pub const ZERO_THRESHOLD: f64 = 1e-10;
/// Decimal places kept when printing a non-integer result.
pub const DISPLAY_DECIMALS: usize = 10;
/// Decimal places kept for limits found by sampling.
pub const LIMIT_DECIMALS: usize = 6;
/// Largest step between consecutive samples of a converging limit.
pub const LIMIT_TOLERANCE: f64 = 1e-4;
/// Rounds of L'Hôpital's rule tried on a vanishing quotient.
pub const LHOPITAL_MAX_DEPTH: usize = 4;
/// Offsets from the limit point, largest first. Limits at infinity are
/// sampled at the reciprocals through `x = 1/t`.
pub const LIMIT_OFFSETS: [f64; 8] = [1e-1, 1e-2, 1e-3, 1e-4, 1e-5, 1e-6, 1e-7, 1e-8];
/// Per-step growth in magnitude that marks sampled values as divergent.
pub const DIVERGENCE_RATIO: f64 = 2.0;
/// Upper bound on the number of terms a finite sum may expand to.
pub const MAX_SUM_TERMS: i64 = 100_000;
/// Largest integer exponent folded exactly on rational constants.
pub const MAX_EXACT_POWER: i64 = 32;
/// Highest polynomial degree integrated by repeated integration by parts.
pub const MAX_PARTS_DEGREE: i64 = 8;
/// Interior points checked for singularities before a definite integral.
pub const INTEGRAL_CHECK_POINTS: usize = 64;

/// Default plotting window.
pub const GRAPH_MIN_X: f64 = -10.0;
pub const GRAPH_MAX_X: f64 = 10.0;
pub const GRAPH_SAMPLES: usize = 2001;

/// Displayed in place of any failed result.
pub const ERROR_MARKER: &str = "ERROR";
pub const INF_MARKER: &str = "inf";
pub const NEG_INF_MARKER: &str = "-inf";
