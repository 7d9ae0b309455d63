//! Trajectory sampler.
//!
//! Evaluates a formula repeatedly while one named parameter steps from zero
//! to a horizon. Every point is an independent evaluation with the
//! cumulative parameter value, so time-dependent models never carry state
//! between samples.
//!
//! The point count is fixed before anything is evaluated:
//! `ceil(horizon / step) + 1` points at `i · step`, with the last point
//! placed exactly on the horizon.

use crate::types::{project_metric, Formula, Parameters};
use crate::{Error, Result};
use serde::Serialize;
use tracing::debug;

/// Default ceiling on points per trajectory
pub const DEFAULT_MAX_POINTS: usize = 5000;

/// Slack on `horizon / step` so representation error does not add a point
const RATIO_TOLERANCE: f64 = 1e-9;

#[derive(Clone, Debug, Serialize)]
pub struct TrajectoryPoint<O> {
    pub x: f64,
    pub result: O,
}

/// Ordered samples of one formula
#[derive(Clone, Debug, Serialize)]
pub struct Trajectory<O> {
    pub model: &'static str,
    pub parameter: String,
    pub points: Vec<TrajectoryPoint<O>>,
}

impl<O: Serialize> Trajectory<O> {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(x, metric)` pairs for one named output field
    pub fn project(&self, metric: &str) -> Result<Vec<(f64, f64)>> {
        self.points
            .iter()
            .map(|p| Ok((p.x, project_metric(&p.result, metric)?)))
            .collect()
    }
}

/// Number of points for `step` and `horizon`, checked against `max_points`
pub fn point_count(step: f64, horizon: f64, max_points: usize) -> Result<usize> {
    if !step.is_finite() || step <= 0.0 {
        return Err(Error::InvalidSampling(format!(
            "step must be finite and positive, got {}",
            step
        )));
    }
    if !horizon.is_finite() || horizon < 0.0 {
        return Err(Error::InvalidSampling(format!(
            "horizon must be finite and non-negative, got {}",
            horizon
        )));
    }

    let steps = (horizon / step - RATIO_TOLERANCE).ceil().max(0.0);
    let requested = steps + 1.0;
    if requested > max_points as f64 {
        return Err(Error::TrajectoryTooLarge {
            requested: requested as usize,
            max: max_points,
        });
    }
    Ok(requested as usize)
}

/// Lazy sequence of trajectory points
///
/// Stops after the first error.
pub struct TrajectoryIter<'a, F: Formula> {
    fixed: F::Input,
    parameter: &'a str,
    step: f64,
    horizon: f64,
    count: usize,
    index: usize,
}

impl<'a, F: Formula> TrajectoryIter<'a, F> {
    pub fn count_hint(&self) -> usize {
        self.count
    }
}

impl<F: Formula> Iterator for TrajectoryIter<'_, F> {
    type Item = Result<TrajectoryPoint<F::Output>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }

        let i = self.index;
        let x = if i + 1 == self.count {
            self.horizon
        } else {
            i as f64 * self.step
        };

        let mut input = self.fixed.clone();
        let point = input
            .set_param(self.parameter, x)
            .and_then(|_| F::evaluate(&input))
            .map(|result| TrajectoryPoint { x, result });

        self.index = if point.is_ok() { i + 1 } else { self.count };
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.index;
        (0, Some(remaining))
    }
}

/// Start a lazy trajectory over `parameter`
///
/// Fails up front for bad sampling, an oversized grid, or a parameter the
/// model does not carry. Nothing is evaluated until the iterator is pulled.
pub fn trajectory<'a, F: Formula>(
    fixed: &F::Input,
    parameter: &'a str,
    step: f64,
    horizon: f64,
    max_points: usize,
) -> Result<TrajectoryIter<'a, F>> {
    if !F::Input::param_names().iter().any(|&p| p == parameter) {
        return Err(Error::UnknownParameter {
            model: F::NAME,
            name: parameter.to_string(),
        });
    }

    let count = point_count(step, horizon, max_points)?;
    debug!(
        model = F::NAME,
        parameter, step, horizon, count, "planned trajectory"
    );

    Ok(TrajectoryIter {
        fixed: fixed.clone(),
        parameter,
        step,
        horizon,
        count,
        index: 0,
    })
}

/// Evaluate a whole trajectory; any failing point fails the call
pub fn simulate<F: Formula>(
    fixed: &F::Input,
    parameter: &str,
    step: f64,
    horizon: f64,
    max_points: usize,
) -> Result<Trajectory<F::Output>> {
    let points = trajectory::<F>(fixed, parameter, step, horizon, max_points)?
        .collect::<Result<Vec<_>>>()?;

    Ok(Trajectory {
        model: F::NAME,
        parameter: parameter.to_string(),
        points,
    })
}
