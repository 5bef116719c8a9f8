//! Vector operation engine over bracketed literals.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::classify::{EvaluationRequest, Mode, Params};
use crate::error::{ErrorKind, EvaluationResult};
use crate::eval::eval_number;
use crate::format::{format_number, format_vector};
use crate::normalize::normalize;
use crate::symbolic;

/// Variable vector components are differentiated against.
const DERIV_VAR: &str = "x";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationTag {
    Add,
    Sub,
    Dot,
    Cross,
    Det,
    Norm,
    Length,
    Deriv,
}

impl OperationTag {
    /// Whether the operation needs a second operand.
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            OperationTag::Add | OperationTag::Sub | OperationTag::Dot | OperationTag::Cross
        )
    }
}

impl FromStr for OperationTag {
    type Err = ErrorKind;

    /// Accepts the short names and the labels on the vector page buttons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = match s.trim().to_ascii_lowercase().as_str() {
            "add" | "addition" | "+" => OperationTag::Add,
            "sub" | "subtract" | "subtraction" | "-" => OperationTag::Sub,
            "dot" | "dot product" => OperationTag::Dot,
            "cross" | "cross product" => OperationTag::Cross,
            "det" | "determinant" => OperationTag::Det,
            "norm" => OperationTag::Norm,
            "length" | "magnitude" => OperationTag::Length,
            "deriv" | "derivative" => OperationTag::Deriv,
            other => {
                return Err(ErrorKind::unsupported(format!(
                    "unknown vector operation '{}'",
                    other
                )))
            }
        };
        Ok(tag)
    }
}

/// A parsed bracketed literal.
#[derive(Clone, Debug, PartialEq)]
pub enum VectorOperand {
    Vector(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
}

impl VectorOperand {
    fn as_vector(&self, op: OperationTag) -> Result<&[f64], ErrorKind> {
        match self {
            VectorOperand::Vector(values) => Ok(values),
            VectorOperand::Matrix(_) => Err(ErrorKind::UnsupportedShape(format!(
                "{:?} is defined on vectors, not matrices",
                op
            ))),
        }
    }
}

impl fmt::Display for VectorOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorOperand::Vector(values) => f.write_str(&format_vector(values)),
            VectorOperand::Matrix(rows) => {
                let rows: Vec<String> = rows.iter().map(|r| format_vector(r)).collect();
                write!(f, "[{}]", rows.join(","))
            }
        }
    }
}

/// Components of `[a,b,...]`, split on top-level commas.
fn components(text: &str) -> Result<Vec<&str>, ErrorKind> {
    let inner = text
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .ok_or_else(|| ErrorKind::unsupported(format!("'{}' is not a bracketed literal", text)))?;

    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, b) in inner.bytes().enumerate() {
        match b {
            b'[' | b'(' => depth += 1,
            b']' | b')' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        if depth < 0 {
            return Err(ErrorKind::unsupported(format!("unbalanced literal '{}'", text)));
        }
    }
    if depth != 0 {
        return Err(ErrorKind::unsupported(format!("unbalanced literal '{}'", text)));
    }
    parts.push(&inner[start..]);

    if parts.iter().any(|p| p.is_empty()) {
        return Err(ErrorKind::unsupported(format!("empty component in '{}'", text)));
    }
    Ok(parts)
}

/// Parse a literal such as `[1, 2]`, `[sqrt(2), pi]` or `[[1,2],[3,4]]`.
pub fn parse_operand(text: &str) -> Result<VectorOperand, ErrorKind> {
    let normalized = normalize(text);
    let parts = components(normalized.as_str())?;

    if parts.iter().all(|p| p.starts_with('[')) {
        let rows = parts
            .iter()
            .map(|row| -> Result<Vec<f64>, ErrorKind> {
                components(row)?.into_iter().map(eval_number).collect()
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(VectorOperand::Matrix(rows));
    }

    let values = parts
        .into_iter()
        .map(eval_number)
        .collect::<Result<Vec<f64>, ErrorKind>>()?;
    Ok(VectorOperand::Vector(values))
}

fn same_length<'a>(
    op: OperationTag,
    a: &'a VectorOperand,
    b: Option<&'a VectorOperand>,
) -> Result<(&'a [f64], &'a [f64]), ErrorKind> {
    let b = b.ok_or_else(|| ErrorKind::unsupported(format!("{:?} needs a second operand", op)))?;
    let (a, b) = (a.as_vector(op)?, b.as_vector(op)?);
    if a.len() != b.len() {
        return Err(ErrorKind::ShapeMismatch(format!(
            "{:?} of lengths {} and {}",
            op,
            a.len(),
            b.len()
        )));
    }
    Ok((a, b))
}

/// Apply `op` to already-parsed operands.
pub fn vector_evaluate(
    op: OperationTag,
    a: &VectorOperand,
    b: Option<&VectorOperand>,
) -> EvaluationResult {
    if b.is_some() && !op.is_binary() {
        debug!(?op, "second operand ignored");
    }

    match op {
        OperationTag::Add | OperationTag::Sub => {
            let (a, b) = same_length(op, a, b)?;
            let sign = if op == OperationTag::Add { 1.0 } else { -1.0 };
            let sum: Vec<f64> = a.iter().zip(b).map(|(x, y)| x + sign * y).collect();
            Ok(format_vector(&sum))
        }
        OperationTag::Dot => {
            let (a, b) = same_length(op, a, b)?;
            Ok(format_number(dot(a, b)))
        }
        OperationTag::Cross => {
            let (a, b) = same_length(op, a, b)?;
            let (&[a1, a2, a3], &[b1, b2, b3]) = (a, b) else {
                return Err(ErrorKind::ShapeMismatch(format!(
                    "cross product needs 3 components, got {}",
                    a.len()
                )));
            };
            Ok(format_vector(&[
                a2 * b3 - a3 * b2,
                a3 * b1 - a1 * b3,
                a1 * b2 - a2 * b1,
            ]))
        }
        OperationTag::Det => Ok(format_number(determinant(a)?)),
        OperationTag::Norm | OperationTag::Length => {
            let v = a.as_vector(op)?;
            Ok(format_number(v.iter().fold(0.0_f64, |acc, c| acc.hypot(*c))))
        }
        OperationTag::Deriv => {
            let v = a.as_vector(op)?;
            Ok(format_vector(&vec![0.0; v.len()]))
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Determinant of a 2×2 or 3×3 matrix, by cofactor expansion.
fn determinant(operand: &VectorOperand) -> Result<f64, ErrorKind> {
    let VectorOperand::Matrix(rows) = operand else {
        return Err(ErrorKind::UnsupportedShape("determinant of a vector".to_string()));
    };
    let n = rows.len();
    if rows.iter().any(|r| r.len() != n) {
        return Err(ErrorKind::UnsupportedShape(format!("{} rows of uneven length", n)));
    }
    match rows.as_slice() {
        [r0, r1] => Ok(r0[0] * r1[1] - r0[1] * r1[0]),
        [r0, r1, r2] => Ok(r0[0] * (r1[1] * r2[2] - r1[2] * r2[1])
            - r0[1] * (r1[0] * r2[2] - r1[2] * r2[0])
            + r0[2] * (r1[0] * r2[1] - r1[1] * r2[0])),
        _ => Err(ErrorKind::UnsupportedShape(format!(
            "determinant is defined for 2x2 and 3x3, got {}x{}",
            n, n
        ))),
    }
}

/// Differentiate each component of a symbolic vector such as `[x, x^2]`.
fn differentiate_components(text: &str) -> EvaluationResult {
    let normalized = normalize(text);
    let derived = components(normalized.as_str())?
        .into_iter()
        .map(|c| Ok(symbolic::parse(c)?.diff(DERIV_VAR)?.to_string()))
        .collect::<Result<Vec<String>, ErrorKind>>()?;
    Ok(format!("[{}]", derived.join(",")))
}

/// The string boundary used by the vector page.
pub fn evaluate_vector(op: &str, a: &str, b: Option<&str>) -> EvaluationResult {
    let op: OperationTag = op.parse()?;
    if op == OperationTag::Deriv {
        return differentiate_components(a);
    }

    let a = parse_operand(a)?;
    let b = b
        .filter(|text| !text.trim().is_empty())
        .map(parse_operand)
        .transpose()?;
    vector_evaluate(op, &a, b.as_ref())
}

/// Strategy for vector literals typed into the main entry box.
///
/// A single literal is echoed in canonical form; `A+B+...` is summed.
pub fn literal(request: &EvaluationRequest) -> EvaluationResult {
    let Params::Vector { operands } = &request.params else {
        return Err(ErrorKind::unsupported(format!(
            "{:?} strategy given a {:?} request",
            Mode::Vector,
            request.mode()
        )));
    };

    let mut parsed = operands.iter().map(|text| parse_operand(text));
    let first = parsed
        .next()
        .ok_or_else(|| ErrorKind::unsupported("no vector operands"))??;

    let mut total = first;
    for operand in parsed {
        let operand = operand?;
        let (a, b) = same_length(OperationTag::Add, &total, Some(&operand))?;
        let sum = a.iter().zip(b).map(|(x, y)| x + y).collect();
        total = VectorOperand::Vector(sum);
    }
    Ok(total.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc(op: &str, a: &str, b: Option<&str>) -> EvaluationResult {
        evaluate_vector(op, a, b)
    }

    #[test]
    fn test_parse_operands() {
        assert_eq!(
            parse_operand("[1, 2]").unwrap(),
            VectorOperand::Vector(vec![1.0, 2.0])
        );
        assert_eq!(
            parse_operand("[[1,2],[3,4]]").unwrap(),
            VectorOperand::Matrix(vec![vec![1.0, 2.0], vec![3.0, 4.0]])
        );
        assert_eq!(
            parse_operand("[2^2, max(1,3)]").unwrap(),
            VectorOperand::Vector(vec![4.0, 3.0])
        );
        assert!(parse_operand("[]").is_err());
        assert!(parse_operand("[1,,2]").is_err());
        assert!(parse_operand("1,2").is_err());
    }

    #[test]
    fn test_operation_names() {
        assert_eq!("Dot Product".parse::<OperationTag>().unwrap(), OperationTag::Dot);
        assert_eq!(" norm ".parse::<OperationTag>().unwrap(), OperationTag::Norm);
        assert!("curl".parse::<OperationTag>().is_err());
    }

    #[test]
    fn test_binary_operations() {
        assert_eq!(calc("add", "[1,2]", Some("[2,3]")).unwrap(), "[3,5]");
        assert_eq!(calc("sub", "[1,2]", Some("[2,3]")).unwrap(), "[-1,-1]");
        assert_eq!(calc("dot", "[1,2]", Some("[3,4]")).unwrap(), "11");
        assert_eq!(calc("cross", "[1,0,0]", Some("[0,1,0]")).unwrap(), "[0,0,1]");
    }

    #[test]
    fn test_shape_mismatch() {
        assert!(matches!(
            calc("add", "[1,2]", Some("[1,2,3]")),
            Err(ErrorKind::ShapeMismatch(_))
        ));
        assert!(matches!(
            calc("dot", "[1]", Some("[1,2]")),
            Err(ErrorKind::ShapeMismatch(_))
        ));
        assert!(matches!(
            calc("cross", "[1,2]", Some("[3,4]")),
            Err(ErrorKind::ShapeMismatch(_))
        ));
        assert!(matches!(
            calc("add", "[1,2]", None),
            Err(ErrorKind::UnsupportedExpression(_))
        ));
    }

    #[test]
    fn test_determinants() {
        assert_eq!(calc("det", "[[1,2],[3,4]]", None).unwrap(), "-2");
        assert_eq!(
            calc("det", "[[2,0,0],[0,3,0],[0,0,4]]", None).unwrap(),
            "24"
        );
        let four = "[[1,0,0,0],[0,1,0,0],[0,0,1,0],[0,0,0,1]]";
        assert!(matches!(calc("det", four, None), Err(ErrorKind::UnsupportedShape(_))));
        assert!(matches!(
            calc("det", "[[1,2],[3]]", None),
            Err(ErrorKind::UnsupportedShape(_))
        ));
        assert!(matches!(calc("det", "[1,2]", None), Err(ErrorKind::UnsupportedShape(_))));
    }

    #[test]
    fn test_magnitudes() {
        assert_eq!(calc("norm", "[3,4]", None).unwrap(), "5");
        assert_eq!(calc("length", "[1,2,2]", None).unwrap(), "3");
        assert_eq!(calc("norm", "[1,1]", None).unwrap(), "1.4142135624");
    }

    #[test]
    fn test_magnitude_of_large_components() {
        let norm = calc("norm", "[1e200,1e200]", None).unwrap();
        assert!(norm.starts_with("141421356237"), "got {norm}");
        assert_eq!(norm.len(), 201);
        assert_eq!(calc("norm", "[-3e300,4e300]", None).unwrap().len(), 301);
    }

    #[test]
    fn test_componentwise_derivative() {
        assert_eq!(calc("deriv", "[x, x^2, x^3]", None).unwrap(), "[1,2*x,3*x^2]");
        assert_eq!(calc("deriv", "[sin(x), 5]", None).unwrap(), "[cos(x),0]");
        assert!(calc("deriv", "[x, foo(x)]", None).is_err());
    }

    #[test]
    fn test_literal_echo_and_sum() {
        let echo = VectorOperand::Matrix(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(echo.to_string(), "[[1,2],[3,4]]");
        assert_eq!(VectorOperand::Vector(vec![1.5, 2.0]).to_string(), "[1.5,2]");
    }
}
