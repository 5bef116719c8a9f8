//! Evaluation backend: one strategy per mode behind a single dispatch table.

mod calculus;
mod limit;
mod numeric;

pub use limit::Limit;
pub use numeric::four_function;

use tracing::debug;

use crate::classify::{EvaluationRequest, Mode};
use crate::error::{ErrorKind, EvaluationResult};
use crate::vector;

/// Evaluates one classified request.
pub type Strategy = fn(&EvaluationRequest) -> EvaluationResult;

pub fn strategy(mode: Mode) -> Strategy {
    match mode {
        Mode::Arithmetic => numeric::arithmetic,
        Mode::Derivative => calculus::derivative,
        Mode::Integral => calculus::integral,
        Mode::Limit => limit::limit,
        Mode::Summation => numeric::summation,
        Mode::Vector => vector::literal,
    }
}

/// Run the strategy for `request`. A success is never empty.
pub fn evaluate(request: &EvaluationRequest) -> EvaluationResult {
    let mode = request.mode();
    let result = strategy(mode)(request);
    debug!(?mode, raw = %request.raw, ?result, "evaluated");

    match result {
        Ok(text) if text.trim().is_empty() => {
            Err(ErrorKind::unsupported(format!("no result for {}", request.raw)))
        }
        other => other,
    }
}

/// Reject NaN and infinities, which only arise outside the real domain.
pub(crate) fn finite(value: f64, source: &str) -> Result<f64, ErrorKind> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ErrorKind::domain(format!("{} is undefined ({})", source, value)))
    }
}

/// Evaluate a constant expression such as a bound or a vector component.
pub(crate) fn eval_number(text: &str) -> Result<f64, ErrorKind> {
    if text.is_empty() {
        return Err(ErrorKind::unsupported("empty expression"));
    }
    let value = meval::eval_str(text)?;
    finite(value, text)
}

/// Compile `text` into a function of the single variable `var`.
pub(crate) fn bind_var(text: &str, var: &str) -> Result<impl Fn(f64) -> f64, ErrorKind> {
    if text.is_empty() {
        return Err(ErrorKind::unsupported("empty expression"));
    }
    let expr = text.parse::<meval::Expr>()?;
    Ok(expr.bind(var)?)
}

fn wrong_params(request: &EvaluationRequest, expected: Mode) -> ErrorKind {
    ErrorKind::unsupported(format!(
        "{:?} strategy given a {:?} request",
        expected,
        request.mode()
    ))
}
