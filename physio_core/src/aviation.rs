//! Aviation supplements: route cosmic-radiation dose and +Gz tolerance.
//!
//! Both are simplified fits with fixed coefficients, meant for screening
//! rather than dosimetry or aeromedical certification.

use crate::types::{flag, unknown_param, Formula, Parameters, ThresholdTable, ValidRange};
use crate::Result;
use serde::{Deserialize, Serialize};

const FEET_TO_M: f64 = 0.3048;

// ============================================================================
// Cosmic Radiation
// ============================================================================

const ALTITUDE_FT: ValidRange = ValidRange::new(0.0, 60_000.0);
const LATITUDE: ValidRange = ValidRange::new(-90.0, 90.0);
const FLIGHT_HOURS: ValidRange = ValidRange::new(0.0, 20.0);

const SEA_LEVEL_RATE_USV_H: f64 = 0.03;
const SCALE_HEIGHT_KM: f64 = 2.6;
/// Geomagnetic shielding stops changing poleward of this latitude
const LATITUDE_KNEE_DEG: f64 = 60.0;
/// Annual public dose reference (µSv)
pub const ANNUAL_REFERENCE_USV: f64 = 1000.0;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DoseTier {
    Low,
    Moderate,
    High,
}

const DOSE_FRACTION: ThresholdTable<DoseTier> = ThresholdTable::new(
    DoseTier::Low,
    &[(0.1, DoseTier::Moderate), (0.5, DoseTier::High)],
);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CosmicInput {
    pub altitude_ft: f64,
    pub latitude_deg: f64,
    pub flight_hours: f64,
}

impl Default for CosmicInput {
    fn default() -> Self {
        Self {
            altitude_ft: 35_000.0,
            latitude_deg: 45.0,
            flight_hours: 8.0,
        }
    }
}

impl Parameters for CosmicInput {
    fn param_names() -> &'static [&'static str] {
        &["altitude_ft", "latitude_deg", "flight_hours"]
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "altitude_ft" => self.altitude_ft = value,
            "latitude_deg" => self.latitude_deg = value,
            "flight_hours" => self.flight_hours = value,
            _ => return Err(unknown_param(CosmicDose::NAME, name)),
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CosmicResult {
    pub dose_rate_usv_h: f64,
    pub dose_usv: f64,
    /// Dose as a fraction of the annual public reference
    pub annual_fraction: f64,
    pub latitude_factor: f64,
    pub tier: DoseTier,
}

pub struct CosmicDose;

impl Formula for CosmicDose {
    type Input = CosmicInput;
    type Output = CosmicResult;
    const NAME: &'static str = "cosmic";

    fn evaluate(input: &CosmicInput) -> Result<CosmicResult> {
        cosmic_dose(input)
    }
}

pub fn cosmic_dose(input: &CosmicInput) -> Result<CosmicResult> {
    let altitude_ft = ALTITUDE_FT.check("altitude_ft", input.altitude_ft)?;
    let latitude = LATITUDE.check("latitude_deg", input.latitude_deg)?;
    let hours = FLIGHT_HOURS.check("flight_hours", input.flight_hours)?;

    let altitude_km = altitude_ft * FEET_TO_M / 1000.0;
    let shielding = latitude.abs().min(LATITUDE_KNEE_DEG) / LATITUDE_KNEE_DEG;
    let latitude_factor = 1.0 + shielding.powi(2);
    let rate = SEA_LEVEL_RATE_USV_H * (altitude_km / SCALE_HEIGHT_KM).exp() * latitude_factor;
    let dose = rate * hours;
    let fraction = dose / ANNUAL_REFERENCE_USV;

    Ok(CosmicResult {
        dose_rate_usv_h: rate,
        dose_usv: dose,
        annual_fraction: fraction,
        latitude_factor,
        tier: DOSE_FRACTION.classify(fraction),
    })
}

// ============================================================================
// G-LOC Tolerance
// ============================================================================

const APPLIED_GZ: ValidRange = ValidRange::new(1.0, 12.0);
const ONSET_RATE: ValidRange = ValidRange::new(0.05, 15.0);

/// Relaxed tolerance under rapid onset (G)
const BASELINE_TOLERANCE_G: f64 = 4.8;
const GRADUAL_ONSET_MAX_G_S: f64 = 0.1;
const GRADUAL_ONSET_BONUS_G: f64 = 0.7;
const STRAINING_BONUS_G: f64 = 1.5;
const SUIT_BONUS_G: f64 = 1.0;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GTier {
    LossLikely,
    Marginal,
    Tolerable,
}

const G_MARGIN: ThresholdTable<GTier> = ThresholdTable::new(
    GTier::LossLikely,
    &[(0.0, GTier::Marginal), (1.0, GTier::Tolerable)],
);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GlocInput {
    pub applied_gz: f64,
    pub onset_rate_g_s: f64,
    /// Anti-G straining manoeuvre performed
    pub straining: bool,
    pub anti_g_suit: bool,
}

impl Default for GlocInput {
    fn default() -> Self {
        Self {
            applied_gz: 4.0,
            onset_rate_g_s: 1.0,
            straining: false,
            anti_g_suit: false,
        }
    }
}

impl Parameters for GlocInput {
    fn param_names() -> &'static [&'static str] {
        &["applied_gz", "onset_rate_g_s", "straining", "anti_g_suit"]
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "applied_gz" => self.applied_gz = value,
            "onset_rate_g_s" => self.onset_rate_g_s = value,
            "straining" => self.straining = flag("straining", value)?,
            "anti_g_suit" => self.anti_g_suit = flag("anti_g_suit", value)?,
            _ => return Err(unknown_param(GlocTolerance::NAME, name)),
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GlocResult {
    pub tolerance_gz: f64,
    pub margin_gz: f64,
    pub gradual_onset: bool,
    pub tier: GTier,
}

pub struct GlocTolerance;

impl Formula for GlocTolerance {
    type Input = GlocInput;
    type Output = GlocResult;
    const NAME: &'static str = "gloc";

    fn evaluate(input: &GlocInput) -> Result<GlocResult> {
        gloc_tolerance(input)
    }
}

pub fn gloc_tolerance(input: &GlocInput) -> Result<GlocResult> {
    let applied = APPLIED_GZ.check("applied_gz", input.applied_gz)?;
    let onset = ONSET_RATE.check("onset_rate_g_s", input.onset_rate_g_s)?;

    let gradual_onset = onset <= GRADUAL_ONSET_MAX_G_S;
    let mut tolerance = BASELINE_TOLERANCE_G;
    if gradual_onset {
        tolerance += GRADUAL_ONSET_BONUS_G;
    }
    if input.straining {
        tolerance += STRAINING_BONUS_G;
    }
    if input.anti_g_suit {
        tolerance += SUIT_BONUS_G;
    }
    let margin = tolerance - applied;

    Ok(GlocResult {
        tolerance_gz: tolerance,
        margin_gz: margin,
        gradual_onset,
        tier: G_MARGIN.classify(margin),
    })
}
