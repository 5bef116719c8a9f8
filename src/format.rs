//! Result post-processing and number formatting.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::config::{DISPLAY_DECIMALS, ERROR_MARKER, INF_MARKER, NEG_INF_MARKER, ZERO_THRESHOLD};
use crate::error::EvaluationResult;

lazy_static! {
    /// A bare number whose fraction is all zeros, `4.0` or `-2.000`.
    static ref ZERO_FRACTION: Regex = Regex::new(r"^(-?\d+)\.0+$").unwrap();
}

/// Turn an evaluation result into the display string.
///
/// Failures collapse to [`ERROR_MARKER`]; the kind only reaches the log.
pub fn format(result: &EvaluationResult) -> String {
    match result {
        Ok(text) => {
            let display = canonical(text);
            if display.is_empty() {
                warn!(kind = "UnsupportedExpression", "empty result");
                return ERROR_MARKER.to_string();
            }
            display
        }
        Err(kind) => {
            warn!(kind = kind.name(), detail = %kind, "calculation failed");
            ERROR_MARKER.to_string()
        }
    }
}

fn canonical(text: &str) -> String {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = compact.strip_prefix('+').unwrap_or(&compact);
    ZERO_FRACTION.replace(compact, "$1").into_owned()
}

/// Display form of a finite or infinite real.
pub fn format_number(value: f64) -> String {
    format_rounded(value, DISPLAY_DECIMALS)
}

/// Round to `decimals` places and trim trailing zeros.
pub fn format_rounded(value: f64, decimals: usize) -> String {
    if value.is_infinite() {
        let marker = if value > 0.0 { INF_MARKER } else { NEG_INF_MARKER };
        return marker.to_string();
    }
    if value.abs() < ZERO_THRESHOLD {
        return "0".to_string();
    }
    if value.fract() == 0.0 {
        return format!("{:.0}", value);
    }

    let scale = 10f64.powi(decimals as i32);
    let rounded = (value * scale).round() / scale;
    if rounded.abs() < ZERO_THRESHOLD {
        return "0".to_string();
    }
    let s = format!("{:.*}", decimals, rounded);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// `[a,b,c]` with each component in display form.
pub fn format_vector(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format_number(*v)).collect();
    format!("[{}]", parts.join(","))
}
