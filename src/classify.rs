//! Operator classification: decides which strategy evaluates an expression
//! and pulls its parameters out of the marker text.
//!
//! Markers are tried in a fixed priority order (limit, integral, derivative,
//! summation, vector literal) and the first prefix that matches owns the
//! input. A matched prefix with broken structure is a `MalformedMarker`;
//! it never falls through to plain arithmetic.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ErrorKind;
use crate::normalize::{normalize, Expression};

lazy_static! {
    /// `[<var>->]<value>[+|-]`, the limit point of a limit marker.
    static ref LIMIT_POINT: Regex = Regex::new(r"^(?:([A-Za-z])->)?(.+?)([+-])?$").unwrap();

    /// `d<var>`, the differential closing an integral marker.
    static ref DIFFERENTIAL: Regex = Regex::new(r"^d([A-Za-z])$").unwrap();
}

const LIMIT_PREFIX: &str = "lim[";
const INTEGRAL_PREFIX: &str = "∫[";
const DERIVATIVE_PREFIX: &str = "d/d";
const SUMMATION_PREFIX: &str = "Σ";

const DEFAULT_VAR: &str = "x";
const DEFAULT_INDEX: &str = "n";

/// Auxiliary entries shown next to the main input box.
///
/// All optional raw text; they are normalized here. Inline markers always
/// win over a condition carrying the same information.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conditions {
    /// Differentiation variable for `d/d[...]` without an inline variable.
    pub wrt: Option<String>,
    /// Limit point, `x->0` or a bare value.
    pub limit: Option<String>,
    pub lower: Option<String>,
    pub upper: Option<String>,
    pub sum_from: Option<String>,
    pub sum_to: Option<String>,
}

impl Conditions {
    fn normalized(field: &Option<String>) -> Option<String> {
        field
            .as_deref()
            .map(normalize)
            .filter(|e| !e.is_empty())
            .map(Expression::into_string)
    }
}

/// Direction a one-sided limit approaches from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Side {
    Left,
    #[default]
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    Arithmetic,
    Derivative,
    Integral,
    Limit,
    Summation,
    Vector,
}

/// Mode plus the parameters its strategy needs, all still unevaluated text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Params {
    Arithmetic,
    Derivative {
        inner: String,
        var: String,
    },
    Integral {
        inner: String,
        var: String,
        bounds: Option<(String, String)>,
    },
    Limit {
        inner: String,
        var: String,
        target: String,
        /// `None` when no `+`/`-` suffix was given.
        side: Option<Side>,
    },
    Summation {
        inner: String,
        var: String,
        from: String,
        to: String,
    },
    Vector {
        operands: Vec<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvaluationRequest {
    pub raw: Expression,
    pub params: Params,
}

impl EvaluationRequest {
    pub fn mode(&self) -> Mode {
        match self.params {
            Params::Arithmetic => Mode::Arithmetic,
            Params::Derivative { .. } => Mode::Derivative,
            Params::Integral { .. } => Mode::Integral,
            Params::Limit { .. } => Mode::Limit,
            Params::Summation { .. } => Mode::Summation,
            Params::Vector { .. } => Mode::Vector,
        }
    }
}

/// Build the request for a normalized expression.
pub fn classify(expr: &Expression, conditions: &Conditions) -> Result<EvaluationRequest, ErrorKind> {
    let text = expr.as_str();

    let params = if let Some(rest) = text.strip_prefix(LIMIT_PREFIX) {
        classify_limit(rest, conditions)?
    } else if let Some(rest) = text.strip_prefix(INTEGRAL_PREFIX) {
        classify_integral(rest, conditions)?
    } else if let Some(rest) = text.strip_prefix(DERIVATIVE_PREFIX) {
        classify_derivative(rest, conditions)?
    } else if let Some(rest) = text.strip_prefix(SUMMATION_PREFIX) {
        classify_summation(rest, conditions)?
    } else if text.starts_with('[') && text.ends_with(']') {
        classify_vector(text)?
    } else {
        Params::Arithmetic
    };

    Ok(EvaluationRequest {
        raw: expr.clone(),
        params,
    })
}

/// Split `inner]tail` at the `]` closing an already-consumed `[`.
fn split_bracket(rest: &str) -> Result<(&str, &str), ErrorKind> {
    let mut depth = 1usize;
    for (i, b) in rest.bytes().enumerate() {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&rest[..i], &rest[i + 1..]));
                }
            }
            _ => {}
        }
    }
    Err(ErrorKind::malformed("unbalanced brackets"))
}

fn single_letter(text: &str) -> bool {
    text.len() == 1 && text.bytes().all(|b| b.is_ascii_alphabetic())
}

fn classify_limit(rest: &str, conditions: &Conditions) -> Result<Params, ErrorKind> {
    let (inner, tail) = split_bracket(rest)?;

    let point = if tail.is_empty() {
        Conditions::normalized(&conditions.limit)
            .ok_or_else(|| ErrorKind::malformed("limit without a limit point"))?
    } else {
        let clause = tail
            .strip_prefix("as")
            .ok_or_else(|| ErrorKind::malformed(format!("unexpected text after limit: {}", tail)))?;
        if !clause.contains("->") {
            return Err(ErrorKind::malformed("limit clause is missing '->'"));
        }
        clause.to_string()
    };

    let caps = LIMIT_POINT
        .captures(&point)
        .ok_or_else(|| ErrorKind::malformed(format!("bad limit point: {}", point)))?;
    let var = caps.get(1).map_or(DEFAULT_VAR, |m| m.as_str());
    if point.contains("->") && caps.get(1).is_none() {
        return Err(ErrorKind::malformed(format!("bad limit variable in {}", point)));
    }
    let side = caps.get(3).map(|m| match m.as_str() {
        "-" => Side::Left,
        _ => Side::Right,
    });

    Ok(Params::Limit {
        inner: inner.to_string(),
        var: var.to_string(),
        target: caps[2].to_string(),
        side,
    })
}

fn classify_integral(rest: &str, conditions: &Conditions) -> Result<Params, ErrorKind> {
    let (inner, tail) = split_bracket(rest)?;
    let var = DIFFERENTIAL
        .captures(tail)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| ErrorKind::malformed(format!("integral must end in d<var>, got '{}'", tail)))?;

    let lower = Conditions::normalized(&conditions.lower);
    let upper = Conditions::normalized(&conditions.upper);
    let bounds = match (lower, upper) {
        (Some(a), Some(b)) => Some((a, b)),
        (None, None) => None,
        _ => return Err(ErrorKind::malformed("definite integral needs both bounds")),
    };

    Ok(Params::Integral {
        inner: inner.to_string(),
        var,
        bounds,
    })
}

fn classify_derivative(rest: &str, conditions: &Conditions) -> Result<Params, ErrorKind> {
    let open = rest
        .find('[')
        .ok_or_else(|| ErrorKind::malformed("derivative without a bracket"))?;
    let inline_var = &rest[..open];
    let (inner, tail) = split_bracket(&rest[open + 1..])?;
    if !tail.is_empty() {
        return Err(ErrorKind::malformed(format!("unexpected text after derivative: {}", tail)));
    }

    let var = if inline_var.is_empty() {
        Conditions::normalized(&conditions.wrt).unwrap_or_else(|| DEFAULT_VAR.to_string())
    } else {
        inline_var.to_string()
    };
    if !single_letter(&var) {
        return Err(ErrorKind::malformed(format!("bad differentiation variable '{}'", var)));
    }

    Ok(Params::Derivative {
        inner: inner.to_string(),
        var,
    })
}

fn classify_summation(rest: &str, conditions: &Conditions) -> Result<Params, ErrorKind> {
    let open = rest
        .find('[')
        .ok_or_else(|| ErrorKind::malformed("summation without a bracket"))?;
    let var = match &rest[..open] {
        "" => DEFAULT_INDEX,
        v if single_letter(v) => v,
        v => return Err(ErrorKind::malformed(format!("bad summation index '{}'", v))),
    };
    let (inner, tail) = split_bracket(&rest[open + 1..])?;
    if !tail.is_empty() {
        return Err(ErrorKind::malformed(format!("unexpected text after summation: {}", tail)));
    }

    let from = Conditions::normalized(&conditions.sum_from);
    let to = Conditions::normalized(&conditions.sum_to);
    let (Some(from), Some(to)) = (from, to) else {
        return Err(ErrorKind::malformed("summation needs both bounds"));
    };

    Ok(Params::Summation {
        inner: inner.to_string(),
        var: var.to_string(),
        from,
        to,
    })
}

/// `[..]+[..]+...` split into its top-level bracketed operands.
fn classify_vector(text: &str) -> Result<Params, ErrorKind> {
    let mut operands = Vec::new();
    let mut rest = text;
    loop {
        let body = rest
            .strip_prefix('[')
            .ok_or_else(|| ErrorKind::malformed(format!("expected a vector literal at '{}'", rest)))?;
        let (inner, tail) = split_bracket(body)?;
        operands.push(format!("[{}]", inner));
        if tail.is_empty() {
            break;
        }
        rest = tail
            .strip_prefix('+')
            .ok_or_else(|| ErrorKind::unsupported(format!("vectors can only be added, got '{}'", tail)))?;
    }
    Ok(Params::Vector { operands })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_str(s: &str) -> Result<Params, ErrorKind> {
        classify(&normalize(s), &Conditions::default()).map(|r| r.params)
    }

    fn classify_with(s: &str, conditions: &Conditions) -> Result<Params, ErrorKind> {
        classify(&normalize(s), conditions).map(|r| r.params)
    }

    #[test]
    fn test_arithmetic_passes_through() {
        let expr = normalize("2 + 2");
        let request = classify(&expr, &Conditions::default()).unwrap();
        assert_eq!(request.mode(), Mode::Arithmetic);
        assert_eq!(request.raw.as_str(), "2+2");
    }

    #[test]
    fn test_limit_marker() {
        assert_eq!(
            classify_str("lim[sin(x)/x] as x->0").unwrap(),
            Params::Limit {
                inner: "sin(x)/x".into(),
                var: "x".into(),
                target: "0".into(),
                side: None,
            }
        );
        match classify_str("lim[1/x] as x->0-").unwrap() {
            Params::Limit { target, side, .. } => {
                assert_eq!(target, "0");
                assert_eq!(side, Some(Side::Left));
            }
            other => panic!("unexpected {other:?}"),
        }
        match classify_str("lim[1/t] as t->-oo").unwrap() {
            Params::Limit { var, target, side, .. } => {
                assert_eq!(var, "t");
                assert_eq!(target, "-oo");
                assert_eq!(side, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_limit_point_from_conditions() {
        let conditions = Conditions {
            limit: Some("x -> 2".into()),
            ..Default::default()
        };
        match classify_with("lim[x^2]", &conditions).unwrap() {
            Params::Limit { target, .. } => assert_eq!(target, "2"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_malformed_limits() {
        for bad in ["lim[1/x as x->0", "lim[1/x] as x0", "lim[1/x]", "lim[1/x] x->0", "lim[1/x] as xy->0"] {
            assert!(
                matches!(classify_str(bad), Err(ErrorKind::MalformedMarker(_))),
                "{bad} should be malformed"
            );
        }
    }

    #[test]
    fn test_integral_marker() {
        assert_eq!(
            classify_str("∫[x^2]dx").unwrap(),
            Params::Integral {
                inner: "x^2".into(),
                var: "x".into(),
                bounds: None,
            }
        );
        let conditions = Conditions {
            lower: Some("0".into()),
            upper: Some("pi".into()),
            ..Default::default()
        };
        match classify_with("∫[sin(t)]dt", &conditions).unwrap() {
            Params::Integral { var, bounds, .. } => {
                assert_eq!(var, "t");
                assert_eq!(bounds, Some(("0".into(), "pi".into())));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_malformed_integrals() {
        assert!(matches!(classify_str("∫[x]"), Err(ErrorKind::MalformedMarker(_))));
        assert!(matches!(classify_str("∫[x dx"), Err(ErrorKind::MalformedMarker(_))));
        let one_bound = Conditions {
            lower: Some("0".into()),
            ..Default::default()
        };
        assert!(matches!(
            classify_with("∫[x]dx", &one_bound),
            Err(ErrorKind::MalformedMarker(_))
        ));
    }

    #[test]
    fn test_derivative_marker() {
        assert_eq!(
            classify_str("d/dx[x^2]").unwrap(),
            Params::Derivative {
                inner: "x^2".into(),
                var: "x".into(),
            }
        );
        let conditions = Conditions {
            wrt: Some("t".into()),
            ..Default::default()
        };
        match classify_with("d/d[t^3]", &conditions).unwrap() {
            Params::Derivative { var, .. } => assert_eq!(var, "t"),
            other => panic!("unexpected {other:?}"),
        }
        match classify_str("d/d[x^3]").unwrap() {
            Params::Derivative { var, .. } => assert_eq!(var, "x"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(classify_str("d/dx[x]+1"), Err(ErrorKind::MalformedMarker(_))));
        assert!(matches!(classify_str("d/dx x"), Err(ErrorKind::MalformedMarker(_))));
    }

    #[test]
    fn test_summation_marker() {
        let conditions = Conditions {
            sum_from: Some("1".into()),
            sum_to: Some("10".into()),
            ..Default::default()
        };
        assert_eq!(
            classify_with("Σ[n^2]", &conditions).unwrap(),
            Params::Summation {
                inner: "n^2".into(),
                var: "n".into(),
                from: "1".into(),
                to: "10".into(),
            }
        );
        assert!(matches!(classify_str("Σk[k]"), Err(ErrorKind::MalformedMarker(_))));
    }

    #[test]
    fn test_vector_literals() {
        assert_eq!(
            classify_str("[1, 2] + [2, 3]").unwrap(),
            Params::Vector {
                operands: vec!["[1,2]".into(), "[2,3]".into()],
            }
        );
        assert_eq!(
            classify_str("[[1,2],[3,4]]").unwrap(),
            Params::Vector {
                operands: vec!["[[1,2],[3,4]]".into()],
            }
        );
        assert!(matches!(
            classify_str("[1,2]*[3,4]"),
            Err(ErrorKind::UnsupportedExpression(_))
        ));
    }
}
