//! Recursive-descent parser from normalized text to [`Expr`].
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! sum     := product (('+' | '-') product)*
//! product := unary (('*' | '/') unary | <implicit> unary)*
//! unary   := ('-' | '+') unary | power
//! power   := atom ('^' unary)?
//! atom    := number | '(' sum ')' | name '(' sum ')' | name
//! ```

use num_rational::Rational64;

use super::{Constant, Expr, Func};
use crate::error::ErrorKind;

/// Parse and canonicalize an expression.
pub fn parse(input: &str) -> Result<Expr, ErrorKind> {
    let mut parser = Parser {
        chars: input.chars().filter(|c| !c.is_whitespace()).collect(),
        pos: 0,
    };
    if parser.chars.is_empty() {
        return Err(ErrorKind::unsupported("empty expression"));
    }

    let expr = parser.sum()?;
    if let Some(c) = parser.peek() {
        return Err(ErrorKind::unsupported(format!(
            "unexpected '{}' at position {}",
            c, parser.pos
        )));
    }
    Ok(expr.simplify())
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn sum(&mut self) -> Result<Expr, ErrorKind> {
        let mut terms = vec![self.product()?];
        loop {
            if self.eat('+') {
                terms.push(self.product()?);
            } else if self.eat('-') {
                terms.push(Expr::Mul(vec![Expr::int(-1), self.product()?]));
            } else {
                break;
            }
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::Add(terms)
        })
    }

    fn product(&mut self) -> Result<Expr, ErrorKind> {
        let mut factors = vec![self.unary()?];
        loop {
            if self.eat('*') {
                factors.push(self.unary()?);
            } else if self.eat('/') {
                let denom = self.unary()?;
                factors.push(Expr::Pow(Box::new(denom), Box::new(Expr::int(-1))));
            } else if self.starts_atom() {
                factors.push(self.unary()?);
            } else {
                break;
            }
        }
        Ok(if factors.len() == 1 {
            factors.remove(0)
        } else {
            Expr::Mul(factors)
        })
    }

    fn starts_atom(&self) -> bool {
        self.peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '(' || c == '.')
    }

    fn unary(&mut self) -> Result<Expr, ErrorKind> {
        if self.eat('-') {
            return Ok(Expr::Mul(vec![Expr::int(-1), self.unary()?]));
        }
        if self.eat('+') {
            return self.unary();
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr, ErrorKind> {
        let base = self.atom()?;
        if self.eat('^') {
            let exp = self.unary()?;
            return Ok(Expr::Pow(Box::new(base), Box::new(exp)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, ErrorKind> {
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let inner = self.sum()?;
                if !self.eat(')') {
                    return Err(ErrorKind::unsupported("unbalanced parentheses"));
                }
                Ok(inner)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.name(),
            Some(c) => Err(ErrorKind::unsupported(format!("unexpected '{}'", c))),
            None => Err(ErrorKind::unsupported("unexpected end of expression")),
        }
    }

    fn number(&mut self) -> Result<Expr, ErrorKind> {
        let start = self.pos;
        let mut int_digits = String::new();
        let mut frac_digits = String::new();

        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            int_digits.push(c);
            self.pos += 1;
        }
        if self.eat('.') {
            while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                frac_digits.push(c);
                self.pos += 1;
            }
        }
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(ErrorKind::unsupported("lone decimal point"));
        }

        let mut exponent: i32 = 0;
        let has_exponent = matches!(self.peek(), Some('e') | Some('E'))
            && self
                .chars
                .get(self.pos + 1)
                .is_some_and(|c| c.is_ascii_digit());
        if has_exponent {
            self.pos += 1;
            let mut digits = String::new();
            while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                digits.push(c);
                self.pos += 1;
            }
            exponent = digits
                .parse()
                .map_err(|_| ErrorKind::unsupported("exponent out of range"))?;
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        exact_decimal(&int_digits, &frac_digits, exponent)
            .or_else(|| text.parse::<f64>().ok().and_then(Rational64::approximate_float))
            .map(Expr::Num)
            .ok_or_else(|| ErrorKind::unsupported(format!("number '{}' out of range", text)))
    }

    fn name(&mut self) -> Result<Expr, ErrorKind> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        if name == "sqrt" || Func::from_name(&name).is_some() {
            if !self.eat('(') {
                return Err(ErrorKind::unsupported(format!("'{}' needs an argument", name)));
            }
            let arg = self.sum()?;
            if !self.eat(')') {
                return Err(ErrorKind::unsupported("unbalanced parentheses"));
            }
            return Ok(match Func::from_name(&name) {
                Some(func) => Expr::Func(func, Box::new(arg)),
                None => Expr::Pow(Box::new(arg), Box::new(Expr::ratio(1, 2))),
            });
        }

        if name == "pi" {
            Ok(Expr::Const(Constant::Pi))
        } else if name == "e" {
            Ok(Expr::Const(Constant::E))
        } else if name.len() == 1 {
            Ok(Expr::Var(name))
        } else {
            Err(ErrorKind::UnknownSymbol(name))
        }
    }
}

/// `int.frac * 10^exponent` as an exact rational, if it fits in 64 bits.
fn exact_decimal(int_digits: &str, frac_digits: &str, exponent: i32) -> Option<Rational64> {
    let digits = format!("{}{}", int_digits, frac_digits);
    let mantissa: i64 = digits.parse().ok()?;
    let scale = exponent - frac_digits.len() as i32;
    let power = 10i64.checked_pow(scale.unsigned_abs())?;
    if scale >= 0 {
        Some(Rational64::from_integer(mantissa.checked_mul(power)?))
    } else {
        Some(Rational64::new(mantissa, power))
    }
}
