//! Boundary to the worked-answer backend.
//!
//! The backend is opaque text in, text out. This module only prepares the
//! problem, calls it, and maps failures onto the display marker.

use thiserror::Error;
use tracing::warn;

use crate::config::ERROR_MARKER;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolverError {
    #[error("empty problem")]
    EmptyProblem,
    #[error("answer backend failed: {0}")]
    Backend(String),
}

/// Produces an explanatory answer for a problem statement.
pub trait AnswerGenerator {
    fn answer(&self, problem: &str) -> Result<String, SolverError>;
}

/// Typed form of [`generate_answer`].
pub fn solve(problem: &str, generator: &impl AnswerGenerator) -> Result<String, SolverError> {
    let problem = problem.trim();
    if problem.is_empty() {
        return Err(SolverError::EmptyProblem);
    }
    let answer = generator.answer(problem)?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(SolverError::Backend("empty answer".to_string()));
    }
    Ok(answer.to_string())
}

/// Ask `generator` to work `problem`; `"ERROR"` when nothing usable comes back.
pub fn generate_answer(problem: &str, generator: &impl AnswerGenerator) -> String {
    match solve(problem, generator) {
        Ok(answer) => answer,
        Err(err) => {
            warn!(%err, "answer generation failed");
            ERROR_MARKER.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Echo {
        asked: RefCell<Vec<String>>,
    }

    impl AnswerGenerator for Echo {
        fn answer(&self, problem: &str) -> Result<String, SolverError> {
            self.asked.borrow_mut().push(problem.to_string());
            Ok(format!("  Step 1: {}\n", problem))
        }
    }

    struct Offline;

    impl AnswerGenerator for Offline {
        fn answer(&self, _problem: &str) -> Result<String, SolverError> {
            Err(SolverError::Backend("connection refused".into()))
        }
    }

    #[test]
    fn test_trims_and_delegates() {
        let echo = Echo {
            asked: RefCell::new(Vec::new()),
        };
        assert_eq!(generate_answer("  solve x+1=2 ", &echo), "Step 1: solve x+1=2");
        assert_eq!(echo.asked.borrow().as_slice(), ["solve x+1=2"]);
    }

    #[test]
    fn test_empty_problem_never_reaches_backend() {
        let echo = Echo {
            asked: RefCell::new(Vec::new()),
        };
        assert_eq!(solve("   ", &echo), Err(SolverError::EmptyProblem));
        assert!(echo.asked.borrow().is_empty());
    }

    #[test]
    fn test_backend_failure_shows_marker() {
        assert_eq!(generate_answer("integrate x", &Offline), "ERROR");
    }
}
