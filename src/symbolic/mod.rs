//! Symbolic expression trees over real variables.
//!
//! Trees are kept in a canonical form by [`Expr::simplify`]: sums and
//! products are flat and sorted, numbers are exact rationals, subtraction
//! is a sum with a `-1` coefficient and division is a negative power.
//! The printer renders that form without whitespace in a syntax `meval`
//! can parse back, so any tree can be turned into a numeric closure.

mod diff;
mod integrate;
mod parse;
mod simplify;

pub use parse::parse;

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_rational::Rational64;
use num_traits::{One, Signed, Zero};

/// Named constants the parser recognizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    pub fn name(self) -> &'static str {
        match self {
            Constant::Pi => "pi",
            Constant::E => "e",
        }
    }
}

/// Elementary functions of one argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Abs,
}

impl Func {
    pub fn from_name(name: &str) -> Option<Func> {
        let func = match name {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "asin" => Func::Asin,
            "acos" => Func::Acos,
            "atan" => Func::Atan,
            "sinh" => Func::Sinh,
            "cosh" => Func::Cosh,
            "tanh" => Func::Tanh,
            "exp" => Func::Exp,
            "ln" | "log" => Func::Ln,
            "abs" => Func::Abs,
            _ => return None,
        };
        Some(func)
    }

    pub fn name(self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Asin => "asin",
            Func::Acos => "acos",
            Func::Atan => "atan",
            Func::Sinh => "sinh",
            Func::Cosh => "cosh",
            Func::Tanh => "tanh",
            Func::Exp => "exp",
            Func::Ln => "ln",
            Func::Abs => "abs",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Num(Rational64),
    Const(Constant),
    Var(String),
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Func(Func, Box<Expr>),
}

impl Expr {
    pub fn int(n: i64) -> Expr {
        Expr::Num(Rational64::from_integer(n))
    }

    pub fn ratio(numer: i64, denom: i64) -> Expr {
        Expr::Num(Rational64::new(numer, denom))
    }

    pub fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    pub fn pow(self, exponent: Expr) -> Expr {
        Expr::Pow(Box::new(self), Box::new(exponent)).simplify()
    }

    pub fn apply(func: Func, arg: Expr) -> Expr {
        Expr::Func(func, Box::new(arg)).simplify()
    }

    pub fn recip(self) -> Expr {
        self.pow(Expr::int(-1))
    }

    pub fn as_num(&self) -> Option<Rational64> {
        match self {
            Expr::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Num(n) if n.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Num(n) if n.is_one())
    }

    /// Whether `var` occurs anywhere in the tree.
    pub fn depends_on(&self, var: &str) -> bool {
        match self {
            Expr::Num(_) | Expr::Const(_) => false,
            Expr::Var(name) => name == var,
            Expr::Add(items) | Expr::Mul(items) => items.iter().any(|e| e.depends_on(var)),
            Expr::Pow(base, exp) => base.depends_on(var) || exp.depends_on(var),
            Expr::Func(_, arg) => arg.depends_on(var),
        }
    }

    /// Whether the tree contains any variable at all.
    pub fn has_vars(&self) -> bool {
        match self {
            Expr::Num(_) | Expr::Const(_) => false,
            Expr::Var(_) => true,
            Expr::Add(items) | Expr::Mul(items) => items.iter().any(Expr::has_vars),
            Expr::Pow(base, exp) => base.has_vars() || exp.has_vars(),
            Expr::Func(_, arg) => arg.has_vars(),
        }
    }

    /// Split a canonical product into numerator and denominator.
    ///
    /// Returns `None` when nothing sits in the denominator.
    pub fn as_quotient(&self) -> Option<(Expr, Expr)> {
        let factors: &[Expr] = match self {
            Expr::Mul(factors) => factors,
            Expr::Pow(..) => std::slice::from_ref(self),
            _ => return None,
        };

        let mut numer = Vec::new();
        let mut denom = Vec::new();
        for factor in factors {
            match negative_power(factor) {
                Some((base, positive)) => denom.push(base.clone().pow(Expr::Num(positive))),
                None => numer.push(factor.clone()),
            }
        }
        if denom.is_empty() {
            return None;
        }
        Some((
            Expr::Mul(numer).simplify(),
            Expr::Mul(denom).simplify(),
        ))
    }

    /// Replace every occurrence of `var` with `value`, then simplify.
    pub fn substitute(&self, var: &str, value: &Expr) -> Expr {
        self.map_leaves(&|leaf| match leaf {
            Expr::Var(name) if name == var => value.clone(),
            other => other.clone(),
        })
        .simplify()
    }

    /// The same tree with every variable `ln(u)` read as `ln(abs(u))`, the
    /// form of a logarithmic antiderivative that is real on both sides of
    /// `u = 0`.
    pub fn with_log_abs(&self) -> Expr {
        match self {
            Expr::Func(Func::Ln, arg) if arg.has_vars() => {
                let inner = match &**arg {
                    Expr::Func(Func::Abs, _) => arg.with_log_abs(),
                    other => Expr::Func(Func::Abs, Box::new(other.with_log_abs())),
                };
                Expr::Func(Func::Ln, Box::new(inner))
            }
            Expr::Func(func, arg) => Expr::Func(*func, Box::new(arg.with_log_abs())),
            Expr::Add(terms) => Expr::Add(terms.iter().map(Expr::with_log_abs).collect()),
            Expr::Mul(factors) => Expr::Mul(factors.iter().map(Expr::with_log_abs).collect()),
            Expr::Pow(base, exp) => {
                Expr::Pow(Box::new(base.with_log_abs()), Box::new(exp.with_log_abs()))
            }
            Expr::Num(_) | Expr::Const(_) | Expr::Var(_) => self.clone(),
        }
    }

    fn map_leaves(&self, leaf: &impl Fn(&Expr) -> Expr) -> Expr {
        match self {
            Expr::Add(terms) => Expr::Add(terms.iter().map(|t| t.map_leaves(leaf)).collect()),
            Expr::Mul(factors) => Expr::Mul(factors.iter().map(|f| f.map_leaves(leaf)).collect()),
            Expr::Pow(base, exp) => {
                Expr::Pow(Box::new(base.map_leaves(leaf)), Box::new(exp.map_leaves(leaf)))
            }
            Expr::Func(func, arg) => Expr::Func(*func, Box::new(arg.map_leaves(leaf))),
            Expr::Num(_) | Expr::Const(_) | Expr::Var(_) => leaf(self),
        }
    }
}

/// `base^-k` as `(base, k)`.
fn negative_power(expr: &Expr) -> Option<(&Expr, Rational64)> {
    match expr {
        Expr::Pow(base, exp) => match exp.as_num() {
            Some(k) if k.is_negative() => Some((base, -k)),
            _ => None,
        },
        _ => None,
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::Add(vec![self, rhs]).simplify()
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::Add(vec![self, Expr::Mul(vec![Expr::int(-1), rhs])]).simplify()
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::Mul(vec![self, rhs]).simplify()
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        Expr::Mul(vec![
            self,
            Expr::Pow(Box::new(rhs), Box::new(Expr::int(-1))),
        ])
        .simplify()
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Mul(vec![Expr::int(-1), self]).simplify()
    }
}

// =============================================================================
// PRINTING
// =============================================================================

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(n) => write!(f, "{}", n),
            Expr::Const(c) => f.write_str(c.name()),
            Expr::Var(name) => f.write_str(name),
            Expr::Add(terms) => write_sum(f, terms),
            Expr::Mul(factors) => write_product(f, factors),
            Expr::Pow(base, exp) => {
                if negative_power(self).is_some() {
                    write_product(f, std::slice::from_ref(self))
                } else {
                    write_power(f, base, exp)
                }
            }
            Expr::Func(func, arg) => write!(f, "{}({})", func.name(), arg),
        }
    }
}

fn write_sum(f: &mut fmt::Formatter<'_>, terms: &[Expr]) -> fmt::Result {
    for (i, term) in terms.iter().enumerate() {
        match negated(term) {
            Some(positive) => write!(f, "-{}", positive)?,
            None if i == 0 => write!(f, "{}", term)?,
            None => write!(f, "+{}", term)?,
        }
    }
    Ok(())
}

/// The absolute value of a term whose leading coefficient is negative.
fn negated(term: &Expr) -> Option<Expr> {
    match term {
        Expr::Num(n) if n.is_negative() => Some(Expr::Num(-*n)),
        Expr::Mul(factors) => match factors.split_first() {
            Some((Expr::Num(c), rest)) if c.is_negative() => {
                let c = -*c;
                if !c.is_one() {
                    let mut all = vec![Expr::Num(c)];
                    all.extend(rest.iter().cloned());
                    Some(Expr::Mul(all))
                } else if rest.len() == 1 {
                    Some(rest[0].clone())
                } else {
                    Some(Expr::Mul(rest.to_vec()))
                }
            }
            _ => None,
        },
        _ => None,
    }
}

fn write_product(f: &mut fmt::Formatter<'_>, factors: &[Expr]) -> fmt::Result {
    let (coeff, rest) = match factors.split_first() {
        Some((Expr::Num(c), rest)) => (*c, rest),
        _ => (Rational64::one(), factors),
    };

    let mut numer: Vec<String> = Vec::new();
    let mut denom: Vec<String> = Vec::new();
    for factor in rest {
        match negative_power(factor) {
            Some((base, positive)) if positive.is_one() => denom.push(factor_text(base)),
            Some((base, positive)) => denom.push(factor_text(&Expr::Pow(
                Box::new(base.clone()),
                Box::new(Expr::Num(positive)),
            ))),
            None => numer.push(factor_text(factor)),
        }
    }

    if coeff.is_negative() {
        f.write_str("-")?;
    }
    let coeff = coeff.abs();
    if !coeff.numer().is_one() || numer.is_empty() {
        numer.insert(0, coeff.numer().to_string());
    }
    if !coeff.denom().is_one() {
        denom.insert(0, coeff.denom().to_string());
    }

    f.write_str(&numer.join("*"))?;
    match denom.len() {
        0 => Ok(()),
        1 => write!(f, "/{}", denom[0]),
        _ => write!(f, "/({})", denom.join("*")),
    }
}

fn factor_text(factor: &Expr) -> String {
    match factor {
        Expr::Add(_) | Expr::Mul(_) => format!("({})", factor),
        Expr::Num(n) if n.is_negative() || !n.is_integer() => format!("({})", factor),
        _ => factor.to_string(),
    }
}

fn write_power(f: &mut fmt::Formatter<'_>, base: &Expr, exp: &Expr) -> fmt::Result {
    if exp.as_num() == Some(Rational64::new(1, 2)) {
        return write!(f, "sqrt({})", base);
    }

    match base {
        Expr::Add(_) | Expr::Mul(_) | Expr::Pow(..) => write!(f, "({})", base)?,
        Expr::Num(n) if n.is_negative() || !n.is_integer() => write!(f, "({})", base)?,
        _ => write!(f, "{}", base)?,
    }

    match exp {
        Expr::Num(n) if n.is_integer() && !n.is_negative() => write!(f, "^{}", exp),
        Expr::Var(_) | Expr::Const(_) | Expr::Func(..) => write!(f, "^{}", exp),
        _ => write!(f, "^({})", exp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::var("x")
    }

    #[test]
    fn test_prints_rational_coefficients_as_denominators() {
        let half_square = Expr::ratio(1, 2) * x().pow(Expr::int(2));
        assert_eq!(half_square.to_string(), "x^2/2");

        let three_halves = Expr::ratio(3, 2) * x().pow(Expr::int(2));
        assert_eq!(three_halves.to_string(), "3*x^2/2");
    }

    #[test]
    fn test_prints_negative_powers_as_quotients() {
        assert_eq!(x().recip().to_string(), "1/x");
        assert_eq!((-x().pow(Expr::int(-2))).to_string(), "-1/x^2");
        assert_eq!((Expr::int(1) / (x() + Expr::int(1))).to_string(), "1/(x+1)");
    }

    #[test]
    fn test_prints_sums_in_degree_order() {
        let poly = Expr::int(1) + x() * Expr::int(2) + x().pow(Expr::int(2));
        assert_eq!(poly.to_string(), "x^2+2*x+1");

        let mixed = Expr::apply(Func::Cos, x()) - x();
        assert_eq!(mixed.to_string(), "-x+cos(x)");
    }

    #[test]
    fn test_prints_square_roots() {
        assert_eq!(x().pow(Expr::ratio(1, 2)).to_string(), "sqrt(x)");
        assert_eq!(x().pow(Expr::ratio(-1, 2)).to_string(), "1/sqrt(x)");
    }

    #[test]
    fn test_quotient_split() {
        let q = Expr::apply(Func::Sin, x()) / x();
        let (numer, denom) = q.as_quotient().unwrap();
        assert_eq!(numer, Expr::apply(Func::Sin, x()));
        assert_eq!(denom, x());
        assert!(x().as_quotient().is_none());
    }

    #[test]
    fn test_dependency() {
        let e = Expr::var("y") * Expr::apply(Func::Sin, x());
        assert!(e.depends_on("x"));
        assert!(e.depends_on("y"));
        assert!(!e.depends_on("t"));
        assert!(!Expr::Const(Constant::Pi).has_vars());
    }

    #[test]
    fn test_substitute_reciprocal() {
        let poly = x().pow(Expr::int(2)) + x();
        assert_eq!(
            poly.substitute("x", &x().recip()),
            x().pow(Expr::int(-2)) + x().recip()
        );
        let wave = Expr::apply(Func::Cos, x().recip());
        assert_eq!(wave.substitute("x", &x().recip()), Expr::apply(Func::Cos, x()));
        assert_eq!(wave.substitute("y", &Expr::int(3)), wave);
    }

    #[test]
    fn test_log_abs_form() {
        let log = Expr::apply(Func::Ln, x());
        assert_eq!(log.with_log_abs().to_string(), "ln(abs(x))");
        assert_eq!(log.with_log_abs().with_log_abs(), log.with_log_abs());

        let shifted = Expr::apply(Func::Ln, Expr::int(2) * x() + Expr::int(1)) / Expr::int(2);
        assert_eq!(shifted.with_log_abs().to_string(), "ln(abs(2*x+1))/2");
        assert_eq!(Expr::apply(Func::Ln, Expr::int(2)).with_log_abs().to_string(), "ln(2)");
    }
}
