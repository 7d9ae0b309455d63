//! Circadian performance (Mitler cosine model).
//!
//! `P(t) = (cos(2π (t − φ) / 24) − SD / 8) / K`

use crate::types::{unknown_param, Formula, Parameters, ThresholdTable, ValidRange};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const TIME: ValidRange = ValidRange::new(0.0, 168.0);
const PHASE: ValidRange = ValidRange::new(0.0, 24.0);
const SLEEP_DEBT: ValidRange = ValidRange::new(0.0, 48.0);
const SENSITIVITY: ValidRange = ValidRange::new(0.1, 10.0);

/// Hours of sleep debt that cancel one unit of the circadian swing
const DEBT_SCALE_H: f64 = 8.0;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    Low,
    Moderate,
    High,
}

const PERFORMANCE: ThresholdTable<PerformanceTier> = ThresholdTable::new(
    PerformanceTier::Low,
    &[
        (-0.5, PerformanceTier::Moderate),
        (0.5, PerformanceTier::High),
    ],
);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CircadianInput {
    /// Elapsed time (h)
    pub time_h: f64,
    /// Time of peak performance (h after midnight)
    pub phase_h: f64,
    pub sleep_debt_h: f64,
    /// Individual sensitivity divisor
    pub k: f64,
}

impl Default for CircadianInput {
    fn default() -> Self {
        Self {
            time_h: 0.0,
            phase_h: 16.0,
            sleep_debt_h: 0.0,
            k: 1.0,
        }
    }
}

impl Parameters for CircadianInput {
    fn param_names() -> &'static [&'static str] {
        &["time_h", "phase_h", "sleep_debt_h", "k"]
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "time_h" => self.time_h = value,
            "phase_h" => self.phase_h = value,
            "sleep_debt_h" => self.sleep_debt_h = value,
            "k" => self.k = value,
            _ => return Err(unknown_param(CircadianPerformance::NAME, name)),
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CircadianResult {
    pub performance: f64,
    /// Cosine term alone, before debt and sensitivity
    pub circadian_component: f64,
    pub effectiveness_pct: f64,
    pub clock_hour: f64,
    pub tier: PerformanceTier,
}

pub struct CircadianPerformance;

impl Formula for CircadianPerformance {
    type Input = CircadianInput;
    type Output = CircadianResult;
    const NAME: &'static str = "circadian";

    fn evaluate(input: &CircadianInput) -> Result<CircadianResult> {
        circadian_performance(input)
    }
}

pub fn circadian_performance(input: &CircadianInput) -> Result<CircadianResult> {
    let t = TIME.check("time_h", input.time_h)?;
    let phase = PHASE.check("phase_h", input.phase_h)?;
    let debt = SLEEP_DEBT.check("sleep_debt_h", input.sleep_debt_h)?;
    let k = SENSITIVITY.check("k", input.k)?;

    let circadian = (2.0 * PI * (t - phase) / 24.0).cos();
    let performance = (circadian - debt / DEBT_SCALE_H) / k;

    Ok(CircadianResult {
        performance,
        circadian_component: circadian,
        effectiveness_pct: (50.0 * (1.0 + performance)).clamp(0.0, 100.0),
        clock_hour: t.rem_euclid(24.0),
        tier: PERFORMANCE.classify(performance),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use approx::assert_abs_diff_eq;

    fn input(time_h: f64, phase_h: f64, sleep_debt_h: f64, k: f64) -> CircadianInput {
        CircadianInput {
            time_h,
            phase_h,
            sleep_debt_h,
            k,
        }
    }

    #[test]
    fn test_peak_and_trough() {
        let peak = circadian_performance(&input(16.0, 16.0, 0.0, 1.0)).unwrap();
        assert_abs_diff_eq!(peak.performance, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(peak.effectiveness_pct, 100.0, epsilon = 1e-9);
        assert_eq!(peak.tier, PerformanceTier::High);

        let trough = circadian_performance(&input(4.0, 16.0, 0.0, 1.0)).unwrap();
        assert_abs_diff_eq!(trough.performance, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(trough.effectiveness_pct, 0.0, epsilon = 1e-9);
        assert_eq!(trough.tier, PerformanceTier::Low);
    }

    #[test]
    fn test_sleep_debt_and_sensitivity() {
        // cos(0) = 1, minus 2.5/8, divided by 1.5
        let r = circadian_performance(&input(6.0, 6.0, 2.5, 1.5)).unwrap();
        assert_abs_diff_eq!(r.performance, (1.0 - 0.3125) / 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(r.circadian_component, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_effectiveness_clamped() {
        let r = circadian_performance(&input(4.0, 16.0, 48.0, 0.1)).unwrap();
        assert!(r.performance < -1.0);
        assert_eq!(r.effectiveness_pct, 0.0);
    }

    #[test]
    fn test_clock_hour_wraps() {
        let r = circadian_performance(&input(50.5, 6.0, 0.0, 1.0)).unwrap();
        assert_abs_diff_eq!(r.clock_hour, 2.5, epsilon = 1e-12);

        let same_hour = circadian_performance(&input(2.5, 6.0, 0.0, 1.0)).unwrap();
        assert_abs_diff_eq!(r.performance, same_hour.performance, epsilon = 1e-9);
    }

    #[test]
    fn test_k_lower_bound() {
        assert!(matches!(
            circadian_performance(&input(0.0, 6.0, 0.0, 0.05)),
            Err(Error::OutOfRangeInput { field: "k", .. })
        ));
        assert!(circadian_performance(&input(169.0, 6.0, 0.0, 1.0)).is_err());
    }

    #[test]
    fn test_set_param_by_name() {
        let mut i = CircadianInput::default();
        i.set_param("sleep_debt_h", 4.0).unwrap();
        assert_eq!(i.sleep_debt_h, 4.0);
        assert!(matches!(
            i.set_param("phase", 1.0),
            Err(Error::UnknownParameter { model: "circadian", .. })
        ));
    }
}
