//! Curve sampling for the plot collaborator.
//!
//! Rendering is not done here: the expression is sampled on a fixed grid
//! and the resulting [`Series`] is handed to a [`Plotter`].

use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::config::{GRAPH_MAX_X, GRAPH_MIN_X, GRAPH_SAMPLES};
use crate::error::ErrorKind;
use crate::eval::bind_var;
use crate::normalize::normalize;

const GRAPH_VAR: &str = "x";

/// `y = f(x)` sampled left to right; `None` where `f` is undefined.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub expression: String,
    pub points: Vec<(f64, Option<f64>)>,
}

impl Series {
    /// Finite values only.
    pub fn defined(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().filter_map(|&(x, y)| y.map(|y| (x, y)))
    }
}

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("plot backend unavailable: {0}")]
    Unavailable(String),
    #[error("rendering failed: {0}")]
    Render(String),
}

/// Draws a sampled curve.
pub trait Plotter {
    fn plot(&mut self, series: &Series) -> Result<(), PlotError>;
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error(transparent)]
    Expression(#[from] ErrorKind),
    #[error(transparent)]
    Plot(#[from] PlotError),
}

fn linspace(start: f64, end: f64, num: usize) -> Vec<f64> {
    if num <= 1 {
        return vec![start];
    }
    let step = (end - start) / (num - 1) as f64;
    (0..num).map(|i| start + step * i as f64).collect()
}

/// Sample `expression` (optionally written `y = ...`) over the plotting window.
pub fn sample(expression: &str) -> Result<Series, ErrorKind> {
    let normalized = normalize(expression);
    let text = normalized.as_str();
    let text = text.strip_prefix("y=").unwrap_or(text);
    if text.is_empty() {
        return Err(ErrorKind::unsupported("nothing to plot"));
    }

    // Surface unknown symbols once, before fanning out.
    bind_var(text, GRAPH_VAR)?;

    let grid = linspace(GRAPH_MIN_X, GRAPH_MAX_X, GRAPH_SAMPLES);
    let points: Vec<(f64, Option<f64>)> = grid
        .par_iter()
        .map_init(
            || bind_var(text, GRAPH_VAR).ok(),
            |f, &x| {
                let y = f.as_ref().map(|f| f(x)).filter(|y| y.is_finite());
                (x, y)
            },
        )
        .collect();

    let series = Series {
        expression: text.to_string(),
        points,
    };
    if series.defined().next().is_none() {
        return Err(ErrorKind::domain(format!("{} is undefined on the plotting window", text)));
    }
    debug!(expression = %series.expression, samples = series.points.len(), "sampled curve");
    Ok(series)
}

/// Sample `expression` and hand the curve to `plotter`.
pub fn graph(expression: &str, plotter: &mut impl Plotter) -> Result<(), GraphError> {
    let series = sample(expression)?;
    plotter.plot(&series)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<Series>,
    }

    impl Plotter for Recorder {
        fn plot(&mut self, series: &Series) -> Result<(), PlotError> {
            self.seen.push(series.clone());
            Ok(())
        }
    }

    struct Broken;

    impl Plotter for Broken {
        fn plot(&mut self, _series: &Series) -> Result<(), PlotError> {
            Err(PlotError::Unavailable("no display".into()))
        }
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 3), vec![0.0, 0.5, 1.0]);
        assert_eq!(linspace(2.0, 5.0, 1), vec![2.0]);
    }

    #[test]
    fn test_samples_whole_window() {
        let series = sample("y = x^2").unwrap();
        assert_eq!(series.expression, "x^2");
        assert_eq!(series.points.len(), GRAPH_SAMPLES);
        assert_eq!(series.points[0], (GRAPH_MIN_X, Some(100.0)));
        assert_eq!(series.points[GRAPH_SAMPLES - 1], (GRAPH_MAX_X, Some(100.0)));
    }

    #[test]
    fn test_gaps_where_undefined() {
        let series = sample("sqrt(x)").unwrap();
        assert_eq!(series.points[0].1, None);
        assert!(series.defined().all(|(x, _)| x >= 0.0));
    }

    #[test]
    fn test_rejects_bad_expressions() {
        assert!(matches!(sample("x + foo"), Err(ErrorKind::UnknownSymbol(_))));
        assert!(matches!(sample("sqrt(-1-x^2)"), Err(ErrorKind::DomainError(_))));
    }

    #[test]
    fn test_hands_series_to_plotter() {
        let mut recorder = Recorder::default();
        graph("sin(x)", &mut recorder).unwrap();
        assert_eq!(recorder.seen.len(), 1);

        let err = graph("sin(x)", &mut Broken).unwrap_err();
        assert!(matches!(err, GraphError::Plot(PlotError::Unavailable(_))));
    }
}
