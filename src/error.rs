//! Failure taxonomy shared by every stage of the pipeline.

use thiserror::Error;

/// Why a calculation produced no answer.
///
/// Each variant carries a short detail for logs and tests; the user only
/// ever sees the generic error marker.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// A marker prefix (`lim[`, `∫[`, `d/dx[`, ...) with broken structure.
    #[error("malformed marker: {0}")]
    MalformedMarker(String),
    /// The value is undefined over the reals (division by zero, `sqrt(-1)`).
    #[error("domain error: {0}")]
    DomainError(String),
    /// An identifier that is neither a known function, constant nor variable.
    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),
    /// Valid input the engine has no rule for.
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),
    /// Vector operands whose lengths do not fit the operation.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    /// An operand shape the operation is not defined for.
    #[error("unsupported shape: {0}")]
    UnsupportedShape(String),
}

impl ErrorKind {
    pub fn unsupported(detail: impl Into<String>) -> Self {
        ErrorKind::UnsupportedExpression(detail.into())
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        ErrorKind::MalformedMarker(detail.into())
    }

    pub fn domain(detail: impl Into<String>) -> Self {
        ErrorKind::DomainError(detail.into())
    }

    /// Stable variant name, used as a structured logging field.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::MalformedMarker(_) => "MalformedMarker",
            ErrorKind::DomainError(_) => "DomainError",
            ErrorKind::UnknownSymbol(_) => "UnknownSymbol",
            ErrorKind::UnsupportedExpression(_) => "UnsupportedExpression",
            ErrorKind::ShapeMismatch(_) => "ShapeMismatch",
            ErrorKind::UnsupportedShape(_) => "UnsupportedShape",
        }
    }
}

/// Translate a `meval` failure into the engine's taxonomy.
impl From<meval::Error> for ErrorKind {
    fn from(err: meval::Error) -> Self {
        match err {
            meval::Error::UnknownVariable(name) => ErrorKind::UnknownSymbol(name),
            meval::Error::Function(name, meval::FuncEvalError::UnknownFunction) => {
                ErrorKind::UnknownSymbol(name)
            }
            other => ErrorKind::UnsupportedExpression(other.to_string()),
        }
    }
}

/// Outcome of one evaluation: a non-empty display string or a typed failure.
pub type EvaluationResult = Result<String, ErrorKind>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meval_unknown_variable_maps_to_unknown_symbol() {
        let err = meval::eval_str("foo + 1").unwrap_err();
        assert_eq!(ErrorKind::from(err), ErrorKind::UnknownSymbol("foo".to_string()));
    }

    #[test]
    fn test_meval_parse_failure_is_unsupported() {
        let err = meval::eval_str("(1 + 2").unwrap_err();
        assert!(matches!(ErrorKind::from(err), ErrorKind::UnsupportedExpression(_)));
    }

    #[test]
    fn test_names_are_stable() {
        assert_eq!(ErrorKind::domain("x").name(), "DomainError");
        assert_eq!(ErrorKind::malformed("x").name(), "MalformedMarker");
    }
}
