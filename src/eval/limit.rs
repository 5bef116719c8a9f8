//! Limits by substitution, L'Hôpital's rule and one-sided sampling.
//!
//! A limit at infinity is rewritten through `x = 1/t` into a one-sided limit
//! at zero, so it takes the same path as a finite point.
//!
//! Every path is bounded: substitution is one evaluation, L'Hôpital stops
//! after `LHOPITAL_MAX_DEPTH` rounds and sampling walks a fixed sequence.

use std::f64::{INFINITY, NEG_INFINITY};

use tracing::debug;

use super::{bind_var, eval_number, wrong_params};
use crate::classify::{EvaluationRequest, Mode, Params, Side};
use crate::config::{
    DIVERGENCE_RATIO, INF_THRESHOLD, LHOPITAL_MAX_DEPTH, LIMIT_DECIMALS, LIMIT_OFFSETS,
    LIMIT_TOLERANCE, ZERO_THRESHOLD,
};
use crate::error::{ErrorKind, EvaluationResult};
use crate::format::{format_number, format_rounded};
use crate::symbolic::{self, Expr};

/// A resolved limit. `sampled` values are only trusted to `LIMIT_DECIMALS`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Limit {
    pub value: f64,
    pub sampled: bool,
}

impl Limit {
    fn exact(value: f64) -> Self {
        Limit {
            value,
            sampled: false,
        }
    }

    pub fn display(&self) -> String {
        if self.sampled {
            format_rounded(self.value, LIMIT_DECIMALS)
        } else {
            format_number(self.value)
        }
    }
}

pub fn limit(request: &EvaluationRequest) -> EvaluationResult {
    let Params::Limit {
        inner,
        var,
        target,
        side,
    } = &request.params
    else {
        return Err(wrong_params(request, Mode::Limit));
    };

    let point = parse_point(target)?;
    let tree = symbolic::parse(inner)?;
    let result = limit_of(&tree, var, point, *side, 0)?;
    debug!(inner = %inner, point, ?side, ?result, "limit resolved");
    Ok(result.display())
}

fn parse_point(target: &str) -> Result<f64, ErrorKind> {
    match target {
        "oo" | "+oo" | "inf" | "+inf" => Ok(INFINITY),
        "-oo" | "-inf" => Ok(NEG_INFINITY),
        _ => eval_number(target),
    }
}

/// `side` is `None` when the caller gave no direction. Sampling then comes
/// from the right, and a point where only the left side is defined still
/// yields its value.
fn limit_of(
    tree: &Expr,
    var: &str,
    point: f64,
    side: Option<Side>,
    depth: usize,
) -> Result<Limit, ErrorKind> {
    if point.is_infinite() {
        // x -> ±oo is t = 1/x -> 0±
        let flipped = tree.substitute(var, &Expr::var(var).recip());
        let from = if point > 0.0 { Side::Right } else { Side::Left };
        return limit_of(&flipped, var, 0.0, Some(from), depth);
    }

    let f = bind_var(&tree.to_string(), var)?;
    let samples: Vec<f64> = LIMIT_OFFSETS
        .iter()
        .map(|&offset| match side.unwrap_or_default() {
            Side::Right => f(point + offset),
            Side::Left => f(point - offset),
        })
        .collect();

    // A finite value at the point stands unless the approach disagrees with
    // it; `1^inf` and `exp(-inf)` evaluate without being limits.
    let direct = f(point);
    if direct.is_finite() {
        if samples.iter().all(|v| v.is_nan()) {
            return match side {
                Some(side) => Err(ErrorKind::unsupported(format!(
                    "{} is undefined on the {:?} of {}",
                    tree, side, point
                ))),
                None => Ok(Limit::exact(direct)),
            };
        }
        let agrees = |v: f64| (v - direct).abs() <= LIMIT_TOLERANCE * direct.abs().max(1.0);
        return Ok(match analyze_samples(&samples, false) {
            Ok(found) if !agrees(found.value) => found,
            _ => Limit::exact(direct),
        });
    }

    if depth < LHOPITAL_MAX_DEPTH {
        if let Some(reduced) = lhopital(tree, var, point)? {
            match limit_of(&reduced, var, point, side, depth + 1) {
                Ok(found) => return Ok(found),
                Err(err) => debug!(%reduced, %err, "L'Hôpital did not settle"),
            }
        }
    }

    analyze_samples(&samples, direct.is_infinite())
}

/// `f'/g'` when `tree` is a quotient `f/g` of the form `0/0` or `∞/∞` at `point`.
fn lhopital(tree: &Expr, var: &str, point: f64) -> Result<Option<Expr>, ErrorKind> {
    let Some((numer, denom)) = tree.as_quotient() else {
        return Ok(None);
    };
    let n = bind_var(&numer.to_string(), var)?(point);
    let d = bind_var(&denom.to_string(), var)?(point);

    let both_vanish = n.abs() < ZERO_THRESHOLD && d.abs() < ZERO_THRESHOLD;
    let both_infinite = n.is_infinite() && d.is_infinite();
    if !(both_vanish || both_infinite) {
        return Ok(None);
    }
    Ok(Some(numer.diff(var)? / denom.diff(var)?))
}

/// Classify a sample sequence ordered toward the limit point.
///
/// Divergence needs one sign throughout and strictly growing magnitude that
/// ends beyond `INF_THRESHOLD`, keeps multiplying by `DIVERGENCE_RATIO` over
/// the last steps, or meets an infinite value at the point itself.
///
/// Convergence needs a run of steps each within `LIMIT_TOLERANCE`: three
/// samples at the end of the sequence, or four anywhere. Samples very close
/// to the point lose digits to cancellation, so the first such run wins and
/// the value reported is the one before its smallest step.
fn analyze_samples(samples: &[f64], infinite_at_point: bool) -> Result<Limit, ErrorKind> {
    let vals: Vec<f64> = samples.iter().copied().filter(|v| !v.is_nan()).collect();
    if vals.len() < 3 {
        return Err(ErrorKind::unsupported("too few defined samples near the limit point"));
    }

    let grows = vals
        .windows(2)
        .all(|w| w[1].abs() > w[0].abs() || w[1].is_infinite());
    let last = vals[vals.len() - 1];
    let accelerating = vals
        .windows(2)
        .rev()
        .take(3)
        .all(|w| w[1].abs() >= w[0].abs() * DIVERGENCE_RATIO);
    let escapes = last.abs() > INF_THRESHOLD || infinite_at_point || accelerating;
    if grows && escapes {
        if vals.iter().all(|v| *v > 0.0) {
            return Ok(Limit::exact(INFINITY));
        }
        if vals.iter().all(|v| *v < 0.0) {
            return Ok(Limit::exact(NEG_INFINITY));
        }
    }

    let step = |i: usize| (vals[i] - vals[i - 1]).abs();
    let settled = |i: usize| step(i) < LIMIT_TOLERANCE * vals[i].abs().max(1.0);

    let mut i = 1;
    while i < vals.len() {
        if !settled(i) {
            i += 1;
            continue;
        }
        let start = i;
        while i < vals.len() && settled(i) {
            i += 1;
        }
        let steps = i - start;
        if steps >= 3 || (steps == 2 && i == vals.len()) {
            let best = (start..i)
                .min_by(|&a, &b| step(a).total_cmp(&step(b)))
                .unwrap_or(start);
            return Ok(Limit {
                value: vals[best - 1],
                sampled: true,
            });
        }
    }

    Err(ErrorKind::unsupported("limit does not settle"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, Conditions};
    use crate::normalize::normalize;

    fn lim(s: &str) -> EvaluationResult {
        limit(&classify(&normalize(s), &Conditions::default()).unwrap())
    }

    #[test]
    fn test_direct_substitution() {
        assert_eq!(lim("lim[x^2+1] as x->2").unwrap(), "5");
        assert_eq!(lim("lim[cos(x)] as x->0").unwrap(), "1");
        assert_eq!(lim("lim[x] as x->pi/2").unwrap(), format_number(std::f64::consts::FRAC_PI_2));
    }

    #[test]
    fn test_lhopital() {
        assert_eq!(lim("lim[sin(x)/x] as x->0").unwrap(), "1");
        assert_eq!(lim("lim[(1-cos(x))/x^2] as x->0").unwrap(), "0.5");
        assert_eq!(lim("lim[(x^2-1)/(x-1)] as x->1").unwrap(), "2");
    }

    #[test]
    fn test_one_sided_infinities() {
        assert_eq!(lim("lim[1/x] as x->0").unwrap(), "inf");
        assert_eq!(lim("lim[1/x] as x->0+").unwrap(), "inf");
        assert_eq!(lim("lim[1/x] as x->0-").unwrap(), "-inf");
        assert_eq!(lim("lim[ln(x)] as x->0").unwrap(), "-inf");
        assert_eq!(lim("lim[1/x^2] as x->0-").unwrap(), "inf");
    }

    #[test]
    fn test_limits_at_infinity() {
        assert_eq!(lim("lim[1/x] as x->oo").unwrap(), "0");
        assert_eq!(lim("lim[x^2] as x->oo").unwrap(), "inf");
        assert_eq!(lim("lim[x^3] as x->-oo").unwrap(), "-inf");
        assert_eq!(lim("lim[(x^2-1)/(x^2+1)] as x->∞").unwrap(), "1");
        assert_eq!(lim("lim[exp(-x)] as x->inf").unwrap(), "0");
    }

    #[test]
    fn test_limits_at_infinity_through_cancellation() {
        assert_eq!(lim("lim[x^2*(1-cos(1/x))] as x->oo").unwrap(), "0.5");
        assert_eq!(lim("lim[x*(sqrt(x^2+1)-x)] as x->oo").unwrap(), "0.5");
        assert_eq!(lim("lim[(1+1/x)^x] as x->oo").unwrap(), "2.718282");
        assert_eq!(lim("lim[x/(x+1)] as x->oo").unwrap(), "1");
        assert_eq!(lim("lim[x^2/(x+1)] as x->oo").unwrap(), "inf");
        assert_eq!(lim("lim[exp(-x)] as x->-oo").unwrap(), "inf");
    }

    #[test]
    fn test_one_sided_limit_needs_that_side() {
        assert!(matches!(
            lim("lim[sqrt(x)] as x->0-"),
            Err(ErrorKind::UnsupportedExpression(_))
        ));
        assert_eq!(lim("lim[sqrt(x)] as x->0+").unwrap(), "0");
        assert_eq!(lim("lim[sqrt(x)] as x->0").unwrap(), "0");
        assert_eq!(lim("lim[sqrt(-x)] as x->0").unwrap(), "0");
    }

    #[test]
    fn test_sample_runs() {
        let settled = [0.49, 0.4999, 0.499999, 0.5, 0.5000001, 0.52, 0.0];
        let found = analyze_samples(&settled, false).unwrap();
        assert!(found.sampled);
        assert_eq!(found.display(), "0.5");

        let noise = [0.3, -0.8, 0.6, 0.1, -0.9, 0.4];
        assert!(analyze_samples(&noise, false).is_err());

        let growing = [9.0, 99.0, 999.0, 9999.0];
        assert_eq!(analyze_samples(&growing, false).unwrap().value, INFINITY);
    }

    #[test]
    fn test_sampling_without_a_quotient() {
        assert_eq!(lim("lim[exp(1/x)] as x->0-").unwrap(), "0");
    }

    #[test]
    fn test_unsettled_limits() {
        assert!(matches!(
            lim("lim[sin(1/x)] as x->0"),
            Err(ErrorKind::UnsupportedExpression(_))
        ));
        assert!(matches!(
            lim("lim[sin(x)] as x->oo"),
            Err(ErrorKind::UnsupportedExpression(_))
        ));
    }
}
