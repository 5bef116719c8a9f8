//! Symbolic strategies: derivatives and integrals.

use super::{bind_var, eval_number, finite, wrong_params};
use crate::classify::{EvaluationRequest, Mode, Params};
use crate::config::INTEGRAL_CHECK_POINTS;
use crate::error::{ErrorKind, EvaluationResult};
use crate::format::format_number;
use crate::symbolic;

pub fn derivative(request: &EvaluationRequest) -> EvaluationResult {
    let Params::Derivative { inner, var } = &request.params else {
        return Err(wrong_params(request, Mode::Derivative));
    };
    let tree = symbolic::parse(inner)?;
    Ok(tree.diff(var)?.to_string())
}

/// Indefinite integral without `+C`, or `F(b) - F(a)` when bounds are given.
pub fn integral(request: &EvaluationRequest) -> EvaluationResult {
    let Params::Integral { inner, var, bounds } = &request.params else {
        return Err(wrong_params(request, Mode::Integral));
    };
    let antiderivative = symbolic::parse(inner)?.integrate(var)?;

    let Some((lower, upper)) = bounds else {
        return Ok(antiderivative.to_string());
    };

    let a = eval_number(lower)?;
    let b = eval_number(upper)?;
    check_integrable(inner, var, a, b)?;

    let f = bind_var(&antiderivative.with_log_abs().to_string(), var)?;
    let value = finite(f(b) - f(a), inner)?;
    Ok(format_number(value))
}

/// Refuse bounds that straddle a point where the integrand is undefined.
fn check_integrable(inner: &str, var: &str, a: f64, b: f64) -> Result<(), ErrorKind> {
    let integrand = bind_var(inner, var)?;
    let step = (b - a) / INTEGRAL_CHECK_POINTS as f64;
    for i in 0..=INTEGRAL_CHECK_POINTS {
        let x = a + step * i as f64;
        if !integrand(x).is_finite() {
            return Err(ErrorKind::domain(format!(
                "{} is undefined at {} = {}",
                inner, var, x
            )));
        }
    }
    Ok(())
}
