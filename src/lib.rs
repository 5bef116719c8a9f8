//! Expression evaluation engine for the scientific and four-function
//! calculators.
//!
//! One calculation runs the whole pipeline on the calling thread:
//!
//! ```text
//! raw text -> normalize -> classify -> eval strategy -> format -> display
//! ```
//!
//! Every stage is a plain function over owned values, so concurrent calls
//! share nothing.

pub mod classify;
pub mod config;
pub mod error;
pub mod eval;
pub mod format;
pub mod graph;
pub mod normalize;
pub mod solver;
pub mod symbolic;
pub mod vector;

use tracing::debug;

pub use classify::{classify, Conditions, EvaluationRequest, Mode, Params, Side};
pub use error::{ErrorKind, EvaluationResult};
pub use eval::evaluate;
pub use format::format;
pub use graph::{graph, GraphError, PlotError, Plotter, Series};
pub use normalize::{normalize, Expression};
pub use solver::{generate_answer, AnswerGenerator, SolverError};
pub use vector::{vector_evaluate, OperationTag, VectorOperand};

/// Evaluate `expression` and return the display string or `"ERROR"`.
pub fn calculate(expression: &str) -> String {
    calculate_with(expression, &Conditions::default())
}

/// [`calculate`] with the auxiliary condition entries filled in.
pub fn calculate_with(expression: &str, conditions: &Conditions) -> String {
    format(&evaluate_expression(expression, conditions))
}

/// Typed form of [`calculate_with`], keeping the failure kind.
pub fn evaluate_expression(expression: &str, conditions: &Conditions) -> EvaluationResult {
    let normalized = normalize(expression);
    debug!(raw = expression, normalized = %normalized, "calculate");
    let request = classify(&normalized, conditions)?;
    evaluate(&request)
}

/// Apply a vector operation to raw bracketed literals.
pub fn vector_calculate(operation: &str, a: &str, b: Option<&str>) -> String {
    format(&vector::evaluate_vector(operation, a, b))
}

/// The four-function calculator. Anything beyond `+ - * /`, decimals and
/// parentheses is an error.
pub fn basic_calculate(expression: &str) -> String {
    let normalized = normalize(expression);
    format(&eval::four_function(&normalized))
}
