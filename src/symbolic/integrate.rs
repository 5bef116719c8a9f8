//! Rule-based antidifferentiation.
//!
//! Covers linearity, the power rule, linear substitution `u = a*x+b` into
//! the elementary functions, `b^u`, squared sine and cosine, the arctangent
//! and arcsine kernels, and integration by parts for `x^n` against
//! `sin cos exp sinh cosh` or `ln(x)`. Anything else is rejected rather than
//! guessed. The constant of integration is never added.

use num_rational::Rational64;
use num_traits::{CheckedAdd, One, Signed};

use super::{Expr, Func};
use crate::config::MAX_PARTS_DEGREE;
use crate::error::ErrorKind;

impl Expr {
    /// Antiderivative with respect to `var`, without `+C`.
    pub fn integrate(&self, var: &str) -> Result<Expr, ErrorKind> {
        let x = Expr::var(var);
        if !self.depends_on(var) {
            return Ok(self.clone() * x);
        }

        match self {
            Expr::Var(_) => Ok(x.pow(Expr::int(2)) / Expr::int(2)),
            Expr::Add(terms) => {
                let parts = terms
                    .iter()
                    .map(|t| t.integrate(var))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Expr::Add(parts).simplify())
            }
            Expr::Mul(factors) => integrate_product(factors, var),
            Expr::Pow(base, exp) => integrate_power(base, exp, var),
            Expr::Func(func, arg) => integrate_func(*func, arg, var),
            Expr::Num(_) | Expr::Const(_) => Ok(self.clone() * x),
        }
    }
}

fn no_rule(expr: &Expr) -> ErrorKind {
    ErrorKind::unsupported(format!("no integration rule for {}", expr))
}

/// `k + 1`, the exponent after one application of the power rule.
fn raised_exponent(k: Rational64) -> Result<Rational64, ErrorKind> {
    k.checked_add(&Rational64::one())
        .ok_or_else(|| ErrorKind::unsupported(format!("exponent {} is too large", k)))
}

/// Slope `a` when `u = a*var + b` with `a` free of `var` and non-zero.
fn linear_slope(u: &Expr, var: &str) -> Option<Expr> {
    let slope = u.diff(var).ok()?;
    if slope.depends_on(var) || slope.is_zero() {
        return None;
    }
    Some(slope)
}

/// Exponent `k` when `expr` is `var^k`.
fn monomial_degree(expr: &Expr, var: &str) -> Option<Rational64> {
    match expr {
        Expr::Var(name) if name == var => Some(Rational64::one()),
        Expr::Pow(base, exp) => match (&**base, exp.as_num()) {
            (Expr::Var(name), Some(k)) if name == var => Some(k),
            _ => None,
        },
        _ => None,
    }
}

// =============================================================================
// PRODUCTS
// =============================================================================

fn integrate_product(factors: &[Expr], var: &str) -> Result<Expr, ErrorKind> {
    let (constant, dependent): (Vec<Expr>, Vec<Expr>) =
        factors.iter().cloned().partition(|f| !f.depends_on(var));

    let coeff = Expr::Mul(constant).simplify();
    let body = Expr::Mul(dependent).simplify();
    if !coeff.is_one() {
        return Ok(coeff * body.integrate(var)?);
    }

    let factors = match body {
        Expr::Mul(factors) => factors,
        single => return single.integrate(var),
    };

    if factors.iter().any(|f| matches!(f, Expr::Add(_))) {
        return expand(&factors).integrate(var);
    }

    if let [a, b] = factors.as_slice() {
        if let Some(result) = by_parts(a, b, var)?.or(by_parts(b, a, var)?) {
            return Ok(result);
        }
    }

    Err(no_rule(&Expr::Mul(factors)))
}

/// Distribute a product over the sums among its factors.
fn expand(factors: &[Expr]) -> Expr {
    let mut terms = vec![Expr::int(1)];
    for factor in factors {
        let summands: Vec<Expr> = match factor {
            Expr::Add(inner) => inner.clone(),
            other => vec![other.clone()],
        };
        terms = terms
            .iter()
            .flat_map(|t| summands.iter().map(move |s| t.clone() * s.clone()))
            .collect();
    }
    Expr::Add(terms).simplify()
}

/// `∫ x^n * g` for a monomial `x^n` and a kernel `g` with a known antiderivative.
fn by_parts(poly: &Expr, kernel: &Expr, var: &str) -> Result<Option<Expr>, ErrorKind> {
    let Some(n) = monomial_degree(poly, var) else {
        return Ok(None);
    };
    let Expr::Func(func, arg) = kernel else {
        return Ok(None);
    };
    let x = Expr::var(var);

    // ∫ x^n ln(x) = x^(n+1) ln(x)/(n+1) - x^(n+1)/(n+1)^2
    if *func == Func::Ln && **arg == x {
        if n == -Rational64::one() {
            return Ok(Some(kernel.clone().pow(Expr::int(2)) / Expr::int(2)));
        }
        let m = Expr::Num(raised_exponent(n)?);
        let raised = x.pow(m.clone());
        return Ok(Some(
            raised.clone() * kernel.clone() / m.clone() - raised / m.clone().pow(Expr::int(2)),
        ));
    }

    let cyclic = matches!(func, Func::Sin | Func::Cos | Func::Exp | Func::Sinh | Func::Cosh);
    if !cyclic
        || !n.is_integer()
        || !n.is_positive()
        || *n.numer() > MAX_PARTS_DEGREE
        || linear_slope(arg, var).is_none()
    {
        return Ok(None);
    }

    // ∫ x^n g = x^n G - n ∫ x^(n-1) G, where G is again a kernel times a constant.
    let antiderivative = kernel.integrate(var)?;
    let lowered = Expr::Num(n) * x.clone().pow(Expr::Num(n - Rational64::one()));
    let rest = (lowered * antiderivative.clone()).integrate(var)?;
    Ok(Some(poly.clone() * antiderivative - rest))
}

// =============================================================================
// POWERS
// =============================================================================

fn integrate_power(base: &Expr, exp: &Expr, var: &str) -> Result<Expr, ErrorKind> {
    let power = Expr::Pow(Box::new(base.clone()), Box::new(exp.clone()));
    let x = Expr::var(var);

    // b^u -> b^u / (a*ln(b))
    if !base.depends_on(var) {
        let slope = linear_slope(exp, var).ok_or_else(|| no_rule(&power))?;
        let ln_base = Expr::apply(Func::Ln, base.clone());
        return Ok(power.simplify() / (slope * ln_base));
    }
    let Some(k) = exp.as_num() else {
        return Err(no_rule(&power));
    };

    let square = x.clone().pow(Expr::int(2));
    if k == -Rational64::one() && *base == square.clone() + Expr::int(1) {
        return Ok(Expr::apply(Func::Atan, x));
    }
    if k == Rational64::new(-1, 2) && *base == Expr::int(1) - square {
        return Ok(Expr::apply(Func::Asin, x));
    }

    if let Expr::Func(func @ (Func::Sin | Func::Cos), arg) = base {
        if k == Rational64::from_integer(2) {
            if let Some(slope) = linear_slope(arg, var) {
                return Ok(squared_trig(*func, arg, slope));
            }
        }
    }

    let slope = linear_slope(base, var).ok_or_else(|| no_rule(&power))?;
    if k == -Rational64::one() {
        return Ok(Expr::apply(Func::Ln, base.clone()) / slope);
    }
    let raised = Expr::Num(raised_exponent(k)?);
    Ok(base.clone().pow(raised.clone()) / (raised * slope))
}

/// `∫ sin(u)^2 = (u/2 - sin(2u)/4)/a` and `∫ cos(u)^2 = (u/2 + sin(2u)/4)/a`.
fn squared_trig(func: Func, u: &Expr, slope: Expr) -> Expr {
    let half = u.clone() / Expr::int(2);
    let wave = Expr::apply(Func::Sin, Expr::int(2) * u.clone()) / Expr::int(4);
    let inner = match func {
        Func::Sin => half - wave,
        _ => half + wave,
    };
    inner / slope
}

// =============================================================================
// FUNCTIONS
// =============================================================================

fn integrate_func(func: Func, arg: &Expr, var: &str) -> Result<Expr, ErrorKind> {
    let call = Expr::Func(func, Box::new(arg.clone()));
    let slope = linear_slope(arg, var).ok_or_else(|| no_rule(&call))?;
    let u = arg.clone();
    let one_minus_square = || Expr::int(1) - u.clone().pow(Expr::int(2));

    let in_u = match func {
        Func::Sin => -Expr::apply(Func::Cos, u.clone()),
        Func::Cos => Expr::apply(Func::Sin, u.clone()),
        Func::Tan => -Expr::apply(Func::Ln, Expr::apply(Func::Cos, u.clone())),
        Func::Exp => Expr::apply(Func::Exp, u.clone()),
        Func::Sinh => Expr::apply(Func::Cosh, u.clone()),
        Func::Cosh => Expr::apply(Func::Sinh, u.clone()),
        Func::Tanh => Expr::apply(Func::Ln, Expr::apply(Func::Cosh, u.clone())),
        Func::Ln => u.clone() * Expr::apply(Func::Ln, u.clone()) - u.clone(),
        Func::Atan => {
            u.clone() * Expr::apply(Func::Atan, u.clone())
                - Expr::apply(Func::Ln, u.clone().pow(Expr::int(2)) + Expr::int(1)) / Expr::int(2)
        }
        Func::Asin => {
            u.clone() * Expr::apply(Func::Asin, u.clone())
                + one_minus_square().pow(Expr::ratio(1, 2))
        }
        Func::Acos => {
            u.clone() * Expr::apply(Func::Acos, u.clone())
                - one_minus_square().pow(Expr::ratio(1, 2))
        }
        Func::Abs => return Err(no_rule(&call)),
    };
    Ok(in_u / slope)
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use super::*;

    fn integral(text: &str) -> String {
        parse(text).unwrap().integrate("x").unwrap().to_string()
    }

    fn rejects(text: &str) -> bool {
        matches!(
            parse(text).unwrap().integrate("x"),
            Err(ErrorKind::UnsupportedExpression(_))
        )
    }

    #[test]
    fn test_power_rule() {
        assert_eq!(integral("x"), "x^2/2");
        assert_eq!(integral("3*x^2"), "x^3");
        assert_eq!(integral("5"), "5*x");
        assert_eq!(integral("1/x"), "ln(x)");
        assert_eq!(integral("x^-2"), "-1/x");
        assert_eq!(integral("x^2+1"), "x^3/3+x");
    }

    #[test]
    fn test_linear_substitution() {
        assert_eq!(integral("cos(x)"), "sin(x)");
        assert_eq!(integral("sin(x)"), "-cos(x)");
        assert_eq!(integral("sin(2*x)"), "-cos(2*x)/2");
        assert_eq!(integral("exp(3*x)"), "exp(3*x)/3");
        assert_eq!(integral("1/(2*x+1)"), "ln(2*x+1)/2");
    }

    #[test]
    fn test_special_kernels() {
        assert_eq!(integral("1/(x^2+1)"), "atan(x)");
        assert_eq!(integral("sin(x)^2"), "x/2-sin(2*x)/4");
        assert_eq!(integral("2^x"), "2^x/ln(2)");
    }

    #[test]
    fn test_by_parts_differentiates_back() {
        for text in ["x*exp(x)", "x^2*sin(x)", "x*cos(2*x)", "x*ln(x)"] {
            let f = parse(text).unwrap();
            let back = f.integrate("x").unwrap().diff("x").unwrap();
            assert_eq!((back - f).simplify(), Expr::int(0), "round trip for {text}");
        }
    }

    #[test]
    fn test_expands_products_of_sums() {
        assert_eq!(integral("x*(x+1)"), "x^3/3+x^2/2");
    }

    #[test]
    fn test_unsupported_forms() {
        assert!(rejects("sin(x^2)"));
        assert!(rejects("abs(x)"));
        assert!(rejects("x^x"));
        assert!(rejects("sin(x)*cos(x)"));
    }

    #[test]
    fn test_exponent_overflow_is_rejected() {
        assert!(rejects("x^9223372036854775807"));
        assert!(rejects("(2*x+1)^9223372036854775807"));
        assert!(rejects("x^9223372036854775807*ln(x)"));
        assert_eq!(integral("x^100"), "x^101/101");
    }
}
