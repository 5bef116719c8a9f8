//! Numeric strategies: plain arithmetic, finite sums and the four-function
//! calculator.

use lazy_static::lazy_static;
use regex::Regex;

use super::{bind_var, eval_number, finite, wrong_params};
use crate::classify::{EvaluationRequest, Mode, Params};
use crate::config::MAX_SUM_TERMS;
use crate::error::{ErrorKind, EvaluationResult};
use crate::format::format_number;
use crate::normalize::Expression;

lazy_static! {
    /// Everything the four-function keypad can produce once normalized.
    static ref FOUR_FUNCTION: Regex = Regex::new(r"^[0-9.+\-*/()]+$").unwrap();
}

/// Arithmetic and trigonometry over the reals, in radians.
pub fn arithmetic(request: &EvaluationRequest) -> EvaluationResult {
    let value = eval_number(request.raw.as_str())?;
    Ok(format_number(value))
}

/// `Σ` over an integer range, both ends included.
pub fn summation(request: &EvaluationRequest) -> EvaluationResult {
    let Params::Summation { inner, var, from, to } = &request.params else {
        return Err(wrong_params(request, Mode::Summation));
    };

    let start = integer_bound(from)?;
    let end = integer_bound(to)?;
    if end < start {
        return Err(ErrorKind::unsupported(format!("empty range {}..{}", start, end)));
    }
    if end - start >= MAX_SUM_TERMS {
        return Err(ErrorKind::unsupported(format!(
            "sum over {}..{} exceeds {} terms",
            start, end, MAX_SUM_TERMS
        )));
    }

    let term = bind_var(inner, var)?;
    let total: f64 = (start..=end).map(|k| term(k as f64)).sum();
    Ok(format_number(finite(total, inner)?))
}

fn integer_bound(text: &str) -> Result<i64, ErrorKind> {
    let value = eval_number(text)?;
    if value.fract() != 0.0 || value.abs() > i64::MAX as f64 / 2.0 {
        return Err(ErrorKind::unsupported(format!("summation bound {} is not an integer", text)));
    }
    Ok(value as i64)
}

/// The four-function calculator: digits, `.`, `+ - * /` and parentheses only.
pub fn four_function(expr: &Expression) -> EvaluationResult {
    if !FOUR_FUNCTION.is_match(expr.as_str()) {
        return Err(ErrorKind::unsupported(format!(
            "'{}' is not four-function arithmetic",
            expr
        )));
    }
    let value = eval_number(expr.as_str())?;
    Ok(format_number(value))
}
