//! Rewrites raw calculator input into the canonical form the backends parse.
//!
//! Normalization never fails: anything it cannot make sense of is passed
//! through and rejected later by the classifier or an evaluation strategy.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

/// Display symbols and their backend spelling, applied in order.
const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("×", "*"),
    ("·", "*"),
    ("÷", "/"),
    ("−", "-"),
    ("π", "pi"),
    ("∞", "oo"),
    ("∑", "Σ"),
    ("**", "^"),
];

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    /// A closing parenthesis directly followed by the start of another factor.
    static ref CLOSE_THEN_FACTOR: Regex = Regex::new(r"\)([0-9A-Za-z(])").unwrap();

    /// `log` is the natural logarithm; the backend spells it `ln`.
    static ref LOG_CALL: Regex = Regex::new(r"\blog\(").unwrap();
}

/// A normalized calculator expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expression(String);

impl Expression {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize raw user input.
///
/// Deterministic and idempotent: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(raw: &str) -> Expression {
    let mut s = WHITESPACE.replace_all(raw, "").into_owned();

    for (from, to) in SUBSTITUTIONS {
        s = s.replace(from, to);
    }

    s = CLOSE_THEN_FACTOR.replace_all(&s, ")*$1").into_owned();
    s = insert_implicit_products(&s);
    s = LOG_CALL.replace_all(&s, "ln(").into_owned();

    Expression(s)
}

/// Insert `*` where a number runs straight into a letter or `(`.
///
/// Digits inside identifiers (`atan2`, `x2`) are left alone. The `e` of a
/// scientific literal such as `1e5` stays part of the number, so `1e5x`
/// becomes `1e5*x`.
fn insert_implicit_products(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 4);
    let mut in_identifier = false;
    let mut exponent_marker = false;

    for (i, &c) in chars.iter().enumerate() {
        out.push(c);

        if exponent_marker {
            exponent_marker = false;
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            in_identifier = true;
            continue;
        }
        if !(c.is_ascii_digit() || c == '.') {
            in_identifier = false;
            continue;
        }
        if in_identifier {
            continue;
        }

        let Some(&next) = chars.get(i + 1) else {
            continue;
        };
        if starts_exponent(&chars, i + 1) {
            exponent_marker = true;
        } else if next.is_ascii_alphabetic() || next == '(' {
            out.push('*');
        }
    }

    out
}

/// `e` followed by a digit continues a numeric literal.
fn starts_exponent(chars: &[char], at: usize) -> bool {
    matches!(chars.get(at), Some('e') | Some('E'))
        && chars.get(at + 1).is_some_and(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(s: &str) -> String {
        normalize(s).into_string()
    }

    #[test]
    fn test_strips_whitespace() {
        assert_eq!(norm(" 2 +\t2 "), "2+2");
        assert_eq!(norm("lim[1/x] as x->0"), "lim[1/x]asx->0");
    }

    #[test]
    fn test_display_symbols() {
        assert_eq!(norm("6×7"), "6*7");
        assert_eq!(norm("8÷2"), "8/2");
        assert_eq!(norm("2**3"), "2^3");
        assert_eq!(norm("sin(π/2)"), "sin(pi/2)");
        assert_eq!(norm("x->∞"), "x->oo");
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(norm("2x"), "2*x");
        assert_eq!(norm("3(x+1)"), "3*(x+1)");
        assert_eq!(norm("2π"), "2*pi");
        assert_eq!(norm("(x+1)(x-1)"), "(x+1)*(x-1)");
        assert_eq!(norm("(x)2"), "(x)*2");
        assert_eq!(norm("2.5x"), "2.5*x");
    }

    #[test]
    fn test_scientific_literal_before_variable() {
        assert_eq!(norm("1e5x"), "1e5*x");
        assert_eq!(norm("1.5e3x"), "1.5e3*x");
        assert_eq!(norm("2e3(x+1)"), "2e3*(x+1)");
        assert_eq!(norm("2exp(x)"), "2*exp(x)");
    }

    #[test]
    fn test_identifiers_and_literals_untouched() {
        assert_eq!(norm("atan2(1,2)"), "atan2(1,2)");
        assert_eq!(norm("x2+1"), "x2+1");
        assert_eq!(norm("1e5+1"), "1e5+1");
        assert_eq!(norm("d/dx[x^2]"), "d/dx[x^2]");
        assert_eq!(norm("∫[x]dx"), "∫[x]dx");
    }

    #[test]
    fn test_log_is_natural() {
        assert_eq!(norm("log(x)"), "ln(x)");
        assert_eq!(norm("2log(x)"), "2*ln(x)");
        assert_eq!(norm("catalog(x)"), "catalog(x)");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "2 + 2",
            "2x^2 + 3x",
            "2log(x)",
            "(1+x)(2)π",
            "lim[sin(x)/x] as x -> 0",
            "∫[x ** 2]dx",
            "d/dx[ 2 x (x+1) ]",
            "[1, 2] + [3, 4]",
            "1e5x",
            "××÷",
            "",
        ];
        for input in inputs {
            let once = normalize(input);
            let twice = normalize(once.as_str());
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }
}
