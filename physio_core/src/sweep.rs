//! Two-parameter sweep grid for heatmaps.
//!
//! Cells are evaluated row by row (`y` outer, `x` inner) and stored as
//! `cells[y][x]`. A cell whose inputs fall outside the model's validity
//! interval, or whose result leaves the model domain, holds the sentinel
//! instead of failing the whole grid.

use crate::types::{project_metric, Formula, Parameters};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_MAX_AXIS_LEN: usize = 64;
/// Value written into cells the model cannot evaluate, for metrics the
/// catalog gives no sentinel of their own
pub const DEFAULT_SENTINEL: f64 = 480.0;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Axis {
    pub name: String,
    pub values: Vec<f64>,
}

impl Axis {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// `count` evenly spaced values from `start` to `end` inclusive
    pub fn linspace(name: impl Into<String>, start: f64, end: f64, count: usize) -> Self {
        let values = match count {
            0 => Vec::new(),
            1 => vec![start],
            n => {
                let step = (end - start) / (n - 1) as f64;
                (0..n)
                    .map(|i| if i + 1 == n { end } else { start + step * i as f64 })
                    .collect()
            }
        };
        Self::new(name, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn check_len(&self, max: usize) -> Result<()> {
        if self.values.is_empty() || self.values.len() > max {
            return Err(Error::SweepTooLarge {
                axis: self.name.clone(),
                len: self.values.len(),
                max,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SweepLimits {
    pub max_axis_len: usize,
    pub sentinel: f64,
}

impl Default for SweepLimits {
    fn default() -> Self {
        Self {
            max_axis_len: DEFAULT_MAX_AXIS_LEN,
            sentinel: DEFAULT_SENTINEL,
        }
    }
}

/// Dense grid of projected values indexed `[y][x]`
#[derive(Clone, Debug, Serialize)]
pub struct SweepGrid {
    pub model: &'static str,
    pub metric: String,
    pub x: Axis,
    pub y: Axis,
    pub cells: Vec<Vec<f64>>,
    /// Cells holding the sentinel
    pub replaced: usize,
}

impl SweepGrid {
    pub fn get(&self, xi: usize, yi: usize) -> Option<f64> {
        self.cells.get(yi).and_then(|row| row.get(xi)).copied()
    }
}

/// Sweep two parameters and project a named output field
pub fn sweep<F: Formula>(
    fixed: &F::Input,
    x: Axis,
    y: Axis,
    metric: &str,
    limits: &SweepLimits,
) -> Result<SweepGrid> {
    let mut grid = sweep_with::<F, _>(fixed, x, y, limits, |out| {
        project_metric(out, metric)
    })?;
    grid.metric = metric.to_string();
    Ok(grid)
}

/// Sweep two parameters with a custom projection
///
/// Projection errors always propagate; only evaluation failures that
/// [`Error::is_domain_failure`] accepts are replaced by the sentinel.
pub fn sweep_with<F, P>(
    fixed: &F::Input,
    x: Axis,
    y: Axis,
    limits: &SweepLimits,
    projection: P,
) -> Result<SweepGrid>
where
    F: Formula,
    P: Fn(&F::Output) -> Result<f64>,
{
    x.check_len(limits.max_axis_len)?;
    y.check_len(limits.max_axis_len)?;
    debug!(
        model = F::NAME,
        x = %x.name,
        y = %y.name,
        nx = x.len(),
        ny = y.len(),
        "sweeping grid"
    );

    let mut cells = Vec::with_capacity(y.len());
    let mut replaced = 0;

    for &yv in &y.values {
        let mut row = Vec::with_capacity(x.len());
        for &xv in &x.values {
            let mut input = fixed.clone();
            let outcome = input
                .set_param(&y.name, yv)
                .and_then(|_| input.set_param(&x.name, xv))
                .and_then(|_| F::evaluate(&input));

            let value = match outcome {
                Ok(out) => projection(&out)?,
                Err(e) if e.is_domain_failure() => {
                    debug!(x = xv, y = yv, error = %e, "cell replaced by sentinel");
                    replaced += 1;
                    limits.sentinel
                }
                Err(e) => return Err(e),
            };
            row.push(value);
        }
        cells.push(row);
    }

    Ok(SweepGrid {
        model: F::NAME,
        metric: String::new(),
        x,
        y,
        cells,
        replaced,
    })
}
