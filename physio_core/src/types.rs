//! Core types shared by every calculator.
//!
//! This module defines the fundamental building blocks:
//! - Validity intervals for formula inputs
//! - Threshold tables for categorical interpretation
//! - The `Parameters` and `Formula` traits driven by the sampler and sweep

use crate::{Error, Result};
use serde::Serialize;

// ============================================================================
// Validity Intervals
// ============================================================================

/// Closed interval `[min, max]` an input must fall in
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ValidRange {
    pub min: f64,
    pub max: f64,
}

impl ValidRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// True when `value` is finite and inside the closed interval
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    /// Pass `value` through, or name the offending field
    pub fn check(&self, field: &'static str, value: f64) -> Result<f64> {
        if self.contains(value) {
            Ok(value)
        } else {
            Err(Error::OutOfRangeInput {
                field,
                value,
                min: self.min,
                max: self.max,
            })
        }
    }

    /// Soft clamp into the interval (only for documented fit domains)
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

// ============================================================================
// Threshold Tables
// ============================================================================

/// Ascending lower bounds mapped to tiers with half-open `[b_i, b_{i+1})`
/// semantics. Anything below the first bound is the floor tier.
#[derive(Clone, Copy, Debug)]
pub struct ThresholdTable<T: 'static> {
    floor: T,
    steps: &'static [(f64, T)],
}

impl<T: Copy> ThresholdTable<T> {
    pub const fn new(floor: T, steps: &'static [(f64, T)]) -> Self {
        Self { floor, steps }
    }

    pub fn classify(&self, value: f64) -> T {
        let mut tier = self.floor;
        for &(bound, next) in self.steps {
            if value >= bound {
                tier = next;
            } else {
                break;
            }
        }
        tier
    }
}

// ============================================================================
// Formula Traits
// ============================================================================

/// Input record whose scalar fields can be addressed by name
pub trait Parameters {
    /// Names accepted by [`Parameters::set_param`]
    fn param_names() -> &'static [&'static str]
    where
        Self: Sized;

    /// Assign a field by name. Range checks happen at evaluation time,
    /// except for boolean flags which must be 0 or 1 here.
    fn set_param(&mut self, name: &str, value: f64) -> Result<()>;

    /// Names accepted by [`Parameters::set_option`]
    fn option_names() -> &'static [&'static str]
    where
        Self: Sized,
    {
        &[]
    }

    /// Assign a text-valued selector (table key, chemical) by name
    fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        Err(Error::UnknownOption {
            kind: "selector",
            value: format!("{}={}", name, value),
            expected: "no text options for this model",
        })
    }
}

/// A closed-form point estimator
pub trait Formula {
    type Input: Parameters + Clone + Default + Serialize;
    type Output: Serialize + Clone;

    /// Catalog name of the model
    const NAME: &'static str;

    fn evaluate(input: &Self::Input) -> Result<Self::Output>;
}

const FLAG: ValidRange = ValidRange::new(0.0, 1.0);

/// Boolean inputs travel through the scalar parameter API as 0/1
pub(crate) fn flag(field: &'static str, value: f64) -> Result<bool> {
    FLAG.check(field, value).map(|v| v >= 0.5)
}

pub(crate) fn unknown_param(model: &'static str, name: &str) -> Error {
    Error::UnknownParameter {
        model,
        name: name.to_string(),
    }
}

/// Pull a numeric field out of a result record by name
///
/// Dotted paths (`a.b`) descend into nested records. Booleans project to 0/1.
pub fn project_metric<T: Serialize>(output: &T, metric: &str) -> Result<f64> {
    let value = serde_json::to_value(output)?;
    let mut cursor = &value;
    for part in metric.split('.') {
        cursor = cursor
            .get(part)
            .ok_or_else(|| Error::UnknownMetric(metric.to_string()))?;
    }

    match cursor {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::UnknownMetric(metric.to_string())),
        serde_json::Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        _ => Err(Error::UnknownMetric(format!("{} is not numeric", metric))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Band {
        Low,
        Mid,
        High,
    }

    const BANDS: ThresholdTable<Band> =
        ThresholdTable::new(Band::Low, &[(10.0, Band::Mid), (20.0, Band::High)]);

    #[test]
    fn test_threshold_boundary_goes_up() {
        assert_eq!(BANDS.classify(9.999), Band::Low);
        assert_eq!(BANDS.classify(10.0), Band::Mid);
        assert_eq!(BANDS.classify(19.999), Band::Mid);
        assert_eq!(BANDS.classify(20.0), Band::High);
        assert_eq!(BANDS.classify(-1e9), Band::Low);
    }

    #[test]
    fn test_range_check_names_field() {
        let range = ValidRange::new(0.0, 100.0);
        assert_eq!(range.check("rh", 100.0).unwrap(), 100.0);

        match range.check("rh", 101.0) {
            Err(Error::OutOfRangeInput { field, value, .. }) => {
                assert_eq!(field, "rh");
                assert_eq!(value, 101.0);
            }
            other => panic!("Expected OutOfRangeInput, got {:?}", other),
        }
    }

    #[test]
    fn test_range_rejects_nan() {
        let range = ValidRange::new(0.0, 1.0);
        assert!(range.check("x", f64::NAN).is_err());
        assert!(range.check("x", f64::INFINITY).is_err());
    }

    #[test]
    fn test_flag_rejects_non_finite() {
        assert!(flag("outdoor", 1.0).unwrap());
        assert!(!flag("outdoor", 0.0).unwrap());
        for bad in [f64::NAN, f64::INFINITY, 2.0, -1.0] {
            match flag("outdoor", bad) {
                Err(Error::OutOfRangeInput { field, .. }) => assert_eq!(field, "outdoor"),
                other => panic!("Expected OutOfRangeInput for {}, got {:?}", bad, other),
            }
        }
    }

    #[derive(Serialize)]
    struct Inner {
        depth: f64,
    }

    #[derive(Serialize)]
    struct Outer {
        value: f64,
        ok: bool,
        label: &'static str,
        inner: Inner,
    }

    #[test]
    fn test_project_metric() {
        let out = Outer {
            value: 2.5,
            ok: true,
            label: "x",
            inner: Inner { depth: 7.0 },
        };

        assert_eq!(project_metric(&out, "value").unwrap(), 2.5);
        assert_eq!(project_metric(&out, "ok").unwrap(), 1.0);
        assert_eq!(project_metric(&out, "inner.depth").unwrap(), 7.0);
        assert!(matches!(
            project_metric(&out, "label"),
            Err(Error::UnknownMetric(_))
        ));
        assert!(matches!(
            project_metric(&out, "missing"),
            Err(Error::UnknownMetric(_))
        ));
    }
}
