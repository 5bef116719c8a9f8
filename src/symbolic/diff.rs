//! Symbolic differentiation.

use super::{Expr, Func};
use crate::error::ErrorKind;

impl Expr {
    /// Derivative with respect to `var`, simplified.
    pub fn diff(&self, var: &str) -> Result<Expr, ErrorKind> {
        if !self.depends_on(var) {
            return Ok(Expr::int(0));
        }

        let derivative = match self {
            Expr::Num(_) | Expr::Const(_) => Expr::int(0),
            Expr::Var(name) => Expr::int(if name == var { 1 } else { 0 }),
            Expr::Add(terms) => Expr::Add(
                terms
                    .iter()
                    .map(|t| t.diff(var))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Expr::Mul(factors) => product_rule(factors, var)?,
            Expr::Pow(base, exp) => power_rule(base, exp, var)?,
            Expr::Func(func, arg) => chain_rule(*func, arg, var)?,
        };
        Ok(derivative.simplify())
    }
}

/// `(f*g*h)' = f'*g*h + f*g'*h + f*g*h'`
fn product_rule(factors: &[Expr], var: &str) -> Result<Expr, ErrorKind> {
    let mut terms = Vec::with_capacity(factors.len());
    for (i, factor) in factors.iter().enumerate() {
        if !factor.depends_on(var) {
            continue;
        }
        let mut term = factors.to_vec();
        term[i] = factor.diff(var)?;
        terms.push(Expr::Mul(term));
    }
    Ok(Expr::Add(terms))
}

fn power_rule(base: &Expr, exp: &Expr, var: &str) -> Result<Expr, ErrorKind> {
    let power = Expr::Pow(Box::new(base.clone()), Box::new(exp.clone()));

    // u^k -> k*u^(k-1)*u'
    if !exp.depends_on(var) {
        let lowered = base.clone().pow(exp.clone() - Expr::int(1));
        return Ok(Expr::Mul(vec![exp.clone(), lowered, base.diff(var)?]));
    }

    // b^v -> b^v*ln(b)*v'
    if !base.depends_on(var) {
        let ln_base = Expr::apply(Func::Ln, base.clone());
        return Ok(Expr::Mul(vec![power, ln_base, exp.diff(var)?]));
    }

    // u^v -> u^v*(v'*ln(u) + v*u'/u)
    let ln_base = Expr::apply(Func::Ln, base.clone());
    let inner = exp.diff(var)? * ln_base + exp.clone() * base.diff(var)? / base.clone();
    Ok(Expr::Mul(vec![power, inner]))
}

fn chain_rule(func: Func, arg: &Expr, var: &str) -> Result<Expr, ErrorKind> {
    let u = arg.clone();
    let outer = match func {
        Func::Sin => Expr::apply(Func::Cos, u),
        Func::Cos => -Expr::apply(Func::Sin, u),
        Func::Tan => Expr::apply(Func::Tan, u).pow(Expr::int(2)) + Expr::int(1),
        Func::Asin => (Expr::int(1) - u.pow(Expr::int(2))).pow(Expr::ratio(-1, 2)),
        Func::Acos => -(Expr::int(1) - u.pow(Expr::int(2))).pow(Expr::ratio(-1, 2)),
        Func::Atan => (u.pow(Expr::int(2)) + Expr::int(1)).recip(),
        Func::Sinh => Expr::apply(Func::Cosh, u),
        Func::Cosh => Expr::apply(Func::Sinh, u),
        Func::Tanh => Expr::int(1) - Expr::apply(Func::Tanh, u).pow(Expr::int(2)),
        Func::Exp => Expr::apply(Func::Exp, u),
        Func::Ln => u.recip(),
        Func::Abs => {
            return Err(ErrorKind::unsupported(format!(
                "derivative of abs({}) is not defined everywhere",
                arg
            )))
        }
    };
    Ok(Expr::Mul(vec![outer, arg.diff(var)?]))
}
