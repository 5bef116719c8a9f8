//! Canonicalization of expression trees.

use std::cmp::Ordering;

use num_rational::Rational64;
use num_traits::{CheckedAdd, CheckedMul, One, Signed, Zero};

use super::{Constant, Expr, Func};
use crate::config::MAX_EXACT_POWER;

impl Expr {
    /// Rewrite into canonical form. Idempotent.
    pub fn simplify(&self) -> Expr {
        match self {
            Expr::Num(_) | Expr::Const(_) | Expr::Var(_) => self.clone(),
            Expr::Add(terms) => simplify_add(terms.iter().map(Expr::simplify).collect()),
            Expr::Mul(factors) => simplify_mul(factors.iter().map(Expr::simplify).collect()),
            Expr::Pow(base, exp) => simplify_pow(base.simplify(), exp.simplify()),
            Expr::Func(func, arg) => simplify_func(*func, arg.simplify()),
        }
    }
}

// =============================================================================
// SUMS
// =============================================================================

fn simplify_add(terms: Vec<Expr>) -> Expr {
    let mut constant = Rational64::zero();
    let mut overflow: Vec<Expr> = Vec::new();
    let mut groups: Vec<(Expr, Rational64)> = Vec::new();

    for term in flatten(terms, |e| match e {
        Expr::Add(inner) => Ok(inner),
        other => Err(other),
    }) {
        if let Expr::Num(n) = term {
            match constant.checked_add(&n) {
                Some(sum) => constant = sum,
                None => overflow.push(Expr::Num(n)),
            }
            continue;
        }

        let (coeff, rest) = split_coefficient(term);
        match groups.iter_mut().find(|(r, _)| *r == rest) {
            Some((_, total)) => match total.checked_add(&coeff) {
                Some(sum) => *total = sum,
                None => overflow.push(with_coefficient(coeff, rest)),
            },
            None => groups.push((rest, coeff)),
        }
    }

    let mut out: Vec<Expr> = groups
        .into_iter()
        .filter(|(_, c)| !c.is_zero())
        .map(|(rest, c)| with_coefficient(c, rest))
        .collect();
    out.extend(overflow);
    if !constant.is_zero() {
        out.push(Expr::Num(constant));
    }
    out.sort_by(term_order);

    match out.len() {
        0 => Expr::int(0),
        1 => out.remove(0),
        _ => Expr::Add(out),
    }
}

/// `c*rest` as `(c, rest)`; terms without a leading number get `c = 1`.
fn split_coefficient(term: Expr) -> (Rational64, Expr) {
    match term {
        Expr::Mul(mut factors) => match factors.first() {
            Some(Expr::Num(c)) => {
                let c = *c;
                factors.remove(0);
                let rest = if factors.len() == 1 {
                    factors.remove(0)
                } else {
                    Expr::Mul(factors)
                };
                (c, rest)
            }
            _ => (Rational64::one(), Expr::Mul(factors)),
        },
        other => (Rational64::one(), other),
    }
}

fn with_coefficient(coeff: Rational64, rest: Expr) -> Expr {
    if coeff.is_one() {
        return rest;
    }
    match rest {
        Expr::Mul(factors) => {
            let mut all = Vec::with_capacity(factors.len() + 1);
            all.push(Expr::Num(coeff));
            all.extend(factors);
            Expr::Mul(all)
        }
        other => Expr::Mul(vec![Expr::Num(coeff), other]),
    }
}

// =============================================================================
// PRODUCTS
// =============================================================================

fn simplify_mul(factors: Vec<Expr>) -> Expr {
    let mut coeff = Rational64::one();
    let mut rest: Vec<Expr> = Vec::new();
    let mut powers: Vec<(Expr, Expr)> = Vec::new();

    for factor in flatten(factors, |e| match e {
        Expr::Mul(inner) => Ok(inner),
        other => Err(other),
    }) {
        if let Expr::Num(n) = factor {
            match coeff.checked_mul(&n) {
                Some(product) => coeff = product,
                None => rest.push(Expr::Num(n)),
            }
            continue;
        }

        let (base, exp) = split_power(factor);
        match powers.iter_mut().find(|(b, _)| *b == base) {
            Some((_, total)) => *total = simplify_add(vec![total.clone(), exp]),
            None => powers.push((base, exp)),
        }
    }

    if coeff.is_zero() {
        return Expr::int(0);
    }

    // Folding a power can yield a number or a product, which needs another pass.
    let mut refold = false;
    for (base, exp) in powers {
        match simplify_pow(base, exp) {
            Expr::Num(n) => {
                refold = true;
                rest.push(Expr::Num(n));
            }
            Expr::Mul(inner) => {
                refold = true;
                rest.extend(inner);
            }
            other => rest.push(other),
        }
    }
    if refold {
        rest.push(Expr::Num(coeff));
        return simplify_mul(rest);
    }

    // Numeric coefficients distribute over a lone sum: 2*(x+1) -> 2*x+2.
    if rest.len() == 1 && !coeff.is_one() {
        if let Expr::Add(terms) = &rest[0] {
            let scaled = terms
                .iter()
                .map(|t| simplify_mul(vec![Expr::Num(coeff), t.clone()]))
                .collect();
            return simplify_add(scaled);
        }
    }

    rest.sort_by(factor_order);
    if rest.is_empty() {
        return Expr::Num(coeff);
    }
    if coeff.is_one() && rest.len() == 1 {
        return rest.remove(0);
    }
    let mut all = Vec::with_capacity(rest.len() + 1);
    if !coeff.is_one() {
        all.push(Expr::Num(coeff));
    }
    all.extend(rest);
    Expr::Mul(all)
}

fn split_power(factor: Expr) -> (Expr, Expr) {
    match factor {
        Expr::Pow(base, exp) => (*base, *exp),
        other => (other, Expr::int(1)),
    }
}

// =============================================================================
// POWERS
// =============================================================================

fn simplify_pow(base: Expr, exp: Expr) -> Expr {
    if exp.is_zero() || base.is_one() {
        return Expr::int(1);
    }
    if exp.is_one() {
        return base;
    }
    if base == Expr::Const(Constant::E) {
        return simplify_func(Func::Exp, exp);
    }

    let Some(k) = exp.as_num() else {
        return Expr::Pow(Box::new(base), Box::new(exp));
    };

    match base {
        Expr::Num(b) => match rational_power(b, k) {
            Some(value) => Expr::Num(value),
            None => Expr::Pow(Box::new(Expr::Num(b)), Box::new(Expr::Num(k))),
        },
        Expr::Pow(inner, inner_exp) if k.is_integer() => {
            let combined = simplify_mul(vec![*inner_exp, Expr::Num(k)]);
            simplify_pow(*inner, combined)
        }
        Expr::Mul(factors) if k.is_integer() => simplify_mul(
            factors
                .into_iter()
                .map(|f| simplify_pow(f, Expr::Num(k)))
                .collect(),
        ),
        other => Expr::Pow(Box::new(other), Box::new(Expr::Num(k))),
    }
}

/// Exact `b^k` for integer `k` and for square roots of perfect squares.
fn rational_power(b: Rational64, k: Rational64) -> Option<Rational64> {
    if b.is_zero() {
        return if k.is_positive() { Some(b) } else { None };
    }
    let (b, k) = match *k.denom() {
        1 => (b, *k.numer()),
        2 if !b.is_negative() => {
            let root = Rational64::new(exact_sqrt(*b.numer())?, exact_sqrt(*b.denom())?);
            (root, *k.numer())
        }
        _ => return None,
    };
    if k.abs() > MAX_EXACT_POWER {
        return None;
    }

    let mut acc = Rational64::one();
    for _ in 0..k.abs() {
        acc = acc.checked_mul(&b)?;
    }
    Some(if k < 0 { acc.recip() } else { acc })
}

fn exact_sqrt(n: i64) -> Option<i64> {
    if n < 0 {
        return None;
    }
    let root = (n as f64).sqrt().round() as i64;
    (root.checked_mul(root)? == n).then_some(root)
}

// =============================================================================
// FUNCTIONS
// =============================================================================

fn simplify_func(func: Func, arg: Expr) -> Expr {
    match (func, &arg) {
        (Func::Exp, Expr::Func(Func::Ln, inner)) | (Func::Ln, Expr::Func(Func::Exp, inner)) => {
            return (**inner).clone();
        }
        (Func::Ln, Expr::Const(Constant::E)) => return Expr::int(1),
        (Func::Abs, Expr::Num(n)) => return Expr::Num(n.abs()),
        (Func::Sin | Func::Tan, Expr::Const(Constant::Pi)) => return Expr::int(0),
        (Func::Cos, Expr::Const(Constant::Pi)) => return Expr::int(-1),
        _ => {}
    }

    if arg.is_zero() {
        match func {
            Func::Sin | Func::Tan | Func::Asin | Func::Atan | Func::Sinh | Func::Tanh => {
                return Expr::int(0)
            }
            Func::Cos | Func::Cosh | Func::Exp => return Expr::int(1),
            _ => {}
        }
    }
    if arg.is_one() && matches!(func, Func::Ln | Func::Acos) {
        return Expr::int(0);
    }

    Expr::Func(func, Box::new(arg))
}

// =============================================================================
// ORDERING
// =============================================================================

fn flatten(items: Vec<Expr>, open: impl Fn(Expr) -> Result<Vec<Expr>, Expr>) -> Vec<Expr> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match open(item) {
            Ok(inner) => out.extend(inner),
            Err(single) => out.push(single),
        }
    }
    out
}

/// Total polynomial degree, or `None` for non-polynomial terms.
fn degree(expr: &Expr) -> Option<Rational64> {
    match expr {
        Expr::Num(_) | Expr::Const(_) => Some(Rational64::zero()),
        Expr::Var(_) => Some(Rational64::one()),
        Expr::Pow(base, exp) => match (&**base, exp.as_num()) {
            (Expr::Var(_), Some(k)) => Some(k),
            _ if !expr.has_vars() => Some(Rational64::zero()),
            _ => None,
        },
        Expr::Mul(factors) => factors.iter().try_fold(Rational64::zero(), |acc, f| {
            degree(f).and_then(|d| acc.checked_add(&d))
        }),
        _ if !expr.has_vars() => Some(Rational64::zero()),
        _ => None,
    }
}

/// Polynomial terms by falling degree, then other terms, then constants.
fn term_order(a: &Expr, b: &Expr) -> Ordering {
    let key = |e: &Expr| {
        let (_, rest) = split_coefficient(e.clone());
        let class = match degree(&rest) {
            Some(d) if d.is_zero() => 2,
            Some(_) => 0,
            None => 1,
        };
        (class, degree(&rest), rest.to_string())
    };
    let (class_a, deg_a, text_a) = key(a);
    let (class_b, deg_b, text_b) = key(b);
    class_a
        .cmp(&class_b)
        .then_with(|| deg_b.cmp(&deg_a))
        .then_with(|| text_a.cmp(&text_b))
}

fn factor_order(a: &Expr, b: &Expr) -> Ordering {
    fn rank(e: &Expr) -> u8 {
        let base = match e {
            Expr::Pow(base, _) => &**base,
            other => other,
        };
        match base {
            Expr::Num(_) => 0,
            Expr::Const(_) => 1,
            Expr::Var(_) => 2,
            Expr::Add(_) => 3,
            Expr::Func(..) => 4,
            _ => 5,
        }
    }
    rank(a)
        .cmp(&rank(b))
        .then_with(|| a.to_string().cmp(&b.to_string()))
}
