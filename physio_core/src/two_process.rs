//! Two-process model of sleep regulation (Borbély).
//!
//! Process S (homeostatic pressure) rises exponentially while awake and
//! decays while asleep. Process C is a 24 h cosine that shifts both sleep
//! thresholds. The schedule is a fixed day: `wake_duration_h` awake starting
//! at t = 0, then sleep for the rest of the 24 h.
//!
//! S is re-derived from t = 0 on every call by stepping over whole
//! episodes in closed form, so a trajectory never carries state between
//! samples.

use crate::types::{unknown_param, Formula, Parameters, ThresholdTable, ValidRange};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const TIME: ValidRange = ValidRange::new(0.0, 336.0);
const WAKE_DURATION: ValidRange = ValidRange::new(1.0, 23.0);
const INITIAL_PRESSURE: ValidRange = ValidRange::new(0.0, 1.0);
const ACROPHASE: ValidRange = ValidRange::new(0.0, 24.0);
const AMPLITUDE: ValidRange = ValidRange::new(0.0, 0.5);

/// Time constant of S while awake (h)
pub const TAU_RISE_H: f64 = 18.2;
/// Time constant of S while asleep (h)
pub const TAU_DECAY_H: f64 = 4.2;
pub const UPPER_THRESHOLD_MEAN: f64 = 0.6;
pub const LOWER_THRESHOLD_MEAN: f64 = 0.17;
const DAY_H: f64 = 24.0;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertnessTier {
    Low,
    Moderate,
    High,
}

const ALERTNESS: ThresholdTable<AlertnessTier> = ThresholdTable::new(
    AlertnessTier::Low,
    &[(0.3, AlertnessTier::Moderate), (0.6, AlertnessTier::High)],
);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TwoProcessInput {
    pub time_h: f64,
    pub wake_duration_h: f64,
    /// S at t = 0
    pub initial_pressure: f64,
    /// Peak of process C (h)
    pub acrophase_h: f64,
    pub amplitude: f64,
}

impl Default for TwoProcessInput {
    fn default() -> Self {
        Self {
            time_h: 0.0,
            wake_duration_h: 16.0,
            initial_pressure: 0.3,
            acrophase_h: 18.0,
            amplitude: 0.12,
        }
    }
}

impl Parameters for TwoProcessInput {
    fn param_names() -> &'static [&'static str] {
        &[
            "time_h",
            "wake_duration_h",
            "initial_pressure",
            "acrophase_h",
            "amplitude",
        ]
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "time_h" => self.time_h = value,
            "wake_duration_h" => self.wake_duration_h = value,
            "initial_pressure" => self.initial_pressure = value,
            "acrophase_h" => self.acrophase_h = value,
            "amplitude" => self.amplitude = value,
            _ => return Err(unknown_param(TwoProcess::NAME, name)),
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TwoProcessResult {
    pub homeostatic: f64,
    pub circadian: f64,
    pub upper_threshold: f64,
    pub lower_threshold: f64,
    pub awake: bool,
    pub alertness: f64,
    pub tier: AlertnessTier,
}

pub struct TwoProcess;

impl Formula for TwoProcess {
    type Input = TwoProcessInput;
    type Output = TwoProcessResult;
    const NAME: &'static str = "two_process";

    fn evaluate(input: &TwoProcessInput) -> Result<TwoProcessResult> {
        two_process(input)
    }
}

fn advance(s: f64, hours: f64, awake: bool) -> f64 {
    if awake {
        1.0 - (1.0 - s) * (-hours / TAU_RISE_H).exp()
    } else {
        s * (-hours / TAU_DECAY_H).exp()
    }
}

/// Process S at `t` hours and whether the subject is awake then
///
/// An episode ending exactly at `t` counts as finished.
fn homeostatic_pressure(t: f64, s0: f64, wake_h: f64) -> (f64, bool) {
    let sleep_h = DAY_H - wake_h;
    let mut s = s0;
    let mut start = 0.0;
    let mut awake = true;

    loop {
        let length = if awake { wake_h } else { sleep_h };
        if start + length > t {
            break;
        }
        s = advance(s, length, awake);
        start += length;
        awake = !awake;
    }

    (advance(s, t - start, awake), awake)
}

pub fn two_process(input: &TwoProcessInput) -> Result<TwoProcessResult> {
    let t = TIME.check("time_h", input.time_h)?;
    let wake_h = WAKE_DURATION.check("wake_duration_h", input.wake_duration_h)?;
    let s0 = INITIAL_PRESSURE.check("initial_pressure", input.initial_pressure)?;
    let acrophase = ACROPHASE.check("acrophase_h", input.acrophase_h)?;
    let amplitude = AMPLITUDE.check("amplitude", input.amplitude)?;

    let (s, awake) = homeostatic_pressure(t, s0, wake_h);
    let c = amplitude * (2.0 * PI * (t - acrophase) / DAY_H).cos();
    let alertness = 1.0 - s + c;

    Ok(TwoProcessResult {
        homeostatic: s,
        circadian: c,
        upper_threshold: UPPER_THRESHOLD_MEAN + c,
        lower_threshold: LOWER_THRESHOLD_MEAN + c,
        awake,
        alertness,
        tier: ALERTNESS.classify(alertness),
    })
}
