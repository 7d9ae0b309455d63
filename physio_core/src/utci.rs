//! Universal Thermal Climate Index, bivariate approximation.
//!
//! Uses the air-temperature and wind-speed terms of the sixth-order UTCI
//! operational polynomial. Mean radiant temperature is taken equal to air
//! temperature and the vapour-pressure terms are omitted, so the index
//! describes shaded, dry conditions.
//!
//! Wind speed is soft-clamped into the fitted domain of the polynomial
//! (0.5 to 17 m/s at 10 m). The clamped value is reported in the result.

use crate::types::{unknown_param, Formula, Parameters, ThresholdTable, ValidRange};
use crate::Result;
use serde::{Deserialize, Serialize};

const AIR_TEMP: ValidRange = ValidRange::new(-50.0, 50.0);
const WIND_INPUT: ValidRange = ValidRange::new(0.0, 30.0);
/// Fitted domain of the polynomial
pub const WIND_FIT: ValidRange = ValidRange::new(0.5, 17.0);

/// (power of Ta, power of va, coefficient)
const COEFFICIENTS: [(i32, i32, f64); 28] = [
    (0, 0, 6.07562052e-01),
    (1, 0, -2.27712343e-02),
    (2, 0, 8.06470249e-04),
    (3, 0, -1.54271372e-04),
    (4, 0, -3.24651735e-06),
    (5, 0, 7.32602852e-08),
    (6, 0, 1.35959073e-09),
    (0, 1, -2.25836520e+00),
    (1, 1, 8.80326035e-02),
    (2, 1, 2.16844454e-03),
    (3, 1, -1.53347087e-05),
    (4, 1, -5.72983704e-07),
    (5, 1, -2.55090145e-09),
    (0, 2, -7.51269505e-01),
    (1, 2, -4.08350271e-03),
    (2, 2, -5.21670675e-05),
    (3, 2, 1.94544667e-06),
    (4, 2, 1.14099531e-08),
    (0, 3, 1.58137256e-01),
    (1, 3, -6.57263143e-05),
    (2, 3, 2.22697524e-07),
    (3, 3, -4.16117031e-08),
    (0, 4, -1.27762753e-02),
    (1, 4, 9.66891875e-06),
    (2, 4, 2.52785852e-09),
    (0, 5, 4.56306672e-04),
    (1, 5, -1.74202546e-07),
    (0, 6, -5.91491269e-06),
];

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ThermalStress {
    ExtremeCold,
    VeryStrongCold,
    StrongCold,
    ModerateCold,
    SlightCold,
    NoStress,
    ModerateHeat,
    StrongHeat,
    VeryStrongHeat,
    ExtremeHeat,
}

const STRESS_SCALE: ThresholdTable<ThermalStress> = ThresholdTable::new(
    ThermalStress::ExtremeCold,
    &[
        (-40.0, ThermalStress::VeryStrongCold),
        (-27.0, ThermalStress::StrongCold),
        (-13.0, ThermalStress::ModerateCold),
        (0.0, ThermalStress::SlightCold),
        (9.0, ThermalStress::NoStress),
        (26.0, ThermalStress::ModerateHeat),
        (32.0, ThermalStress::StrongHeat),
        (38.0, ThermalStress::VeryStrongHeat),
        (46.0, ThermalStress::ExtremeHeat),
    ],
);

/// Stress category for a UTCI value (°C)
pub fn utci_stress(utci_c: f64) -> ThermalStress {
    STRESS_SCALE.classify(utci_c)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UtciInput {
    pub air_temp_c: f64,
    /// Wind speed at 10 m (m/s)
    pub wind_speed: f64,
}

impl Default for UtciInput {
    fn default() -> Self {
        Self {
            air_temp_c: 20.0,
            wind_speed: 2.0,
        }
    }
}

impl Parameters for UtciInput {
    fn param_names() -> &'static [&'static str] {
        &["air_temp_c", "wind_speed"]
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "air_temp_c" => self.air_temp_c = value,
            "wind_speed" => self.wind_speed = value,
            _ => return Err(unknown_param(Utci::NAME, name)),
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct UtciResult {
    pub utci_c: f64,
    /// UTCI minus air temperature
    pub offset_c: f64,
    /// Wind speed actually fed to the polynomial
    pub wind_speed_used: f64,
    pub wind_clamped: bool,
    pub stress: ThermalStress,
}

pub struct Utci;

impl Formula for Utci {
    type Input = UtciInput;
    type Output = UtciResult;
    const NAME: &'static str = "utci";

    fn evaluate(input: &UtciInput) -> Result<UtciResult> {
        utci(input)
    }
}

/// Evaluate the bivariate UTCI polynomial
pub fn utci(input: &UtciInput) -> Result<UtciResult> {
    let ta = AIR_TEMP.check("air_temp_c", input.air_temp_c)?;
    let raw_wind = WIND_INPUT.check("wind_speed", input.wind_speed)?;
    let va = WIND_FIT.clamp(raw_wind);

    let offset: f64 = COEFFICIENTS
        .iter()
        .map(|&(i, j, c)| c * ta.powi(i) * va.powi(j))
        .sum();
    let utci_c = ta + offset;

    Ok(UtciResult {
        utci_c,
        offset_c: offset,
        wind_speed_used: va,
        wind_clamped: va != raw_wind,
        stress: utci_stress(utci_c),
    })
}
