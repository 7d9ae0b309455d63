//! Altitude hypoxia: alveolar gas equation, empirical SpO2, and time of
//! useful consciousness.

use crate::atmosphere::{pressure_at, PA_PER_MMHG};
use crate::types::{unknown_param, Formula, Parameters, ThresholdTable, ValidRange};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Water vapour pressure at body temperature (mmHg)
pub const PH2O_MMHG: f64 = 47.0;

// ============================================================================
// Alveolar Gas Equation
// ============================================================================

const ALVEOLAR_ALTITUDE: ValidRange = ValidRange::new(-610.0, 20000.0);
const FIO2: ValidRange = ValidRange::new(0.0, 1.0);
const PACO2: ValidRange = ValidRange::new(10.0, 80.0);
const RQ: ValidRange = ValidRange::new(0.7, 1.0);

/// Oxygenation tier by alveolar PO2
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OxygenationTier {
    Critical,
    Severe,
    Moderate,
    Mild,
    Normal,
}

const PAO2_TIERS: ThresholdTable<OxygenationTier> = ThresholdTable::new(
    OxygenationTier::Critical,
    &[
        (30.0, OxygenationTier::Severe),
        (45.0, OxygenationTier::Moderate),
        (60.0, OxygenationTier::Mild),
        (75.0, OxygenationTier::Normal),
    ],
);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlveolarInput {
    /// Geopotential altitude (m)
    pub altitude_m: f64,
    /// Inspired oxygen fraction
    pub fio2: f64,
    /// Arterial CO2 partial pressure (mmHg)
    pub paco2_mmhg: f64,
    /// Respiratory quotient
    pub rq: f64,
}

impl Default for AlveolarInput {
    fn default() -> Self {
        Self {
            altitude_m: 0.0,
            fio2: 0.2095,
            paco2_mmhg: 40.0,
            rq: 0.8,
        }
    }
}

impl Parameters for AlveolarInput {
    fn param_names() -> &'static [&'static str] {
        &["altitude_m", "fio2", "paco2_mmhg", "rq"]
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "altitude_m" => self.altitude_m = value,
            "fio2" => self.fio2 = value,
            "paco2_mmhg" => self.paco2_mmhg = value,
            "rq" => self.rq = value,
            _ => return Err(unknown_param(AlveolarGas::NAME, name)),
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct AlveolarResult {
    pub barometric_mmhg: f64,
    pub inspired_po2_mmhg: f64,
    pub alveolar_po2_mmhg: f64,
    pub tier: OxygenationTier,
}

pub struct AlveolarGas;

impl Formula for AlveolarGas {
    type Input = AlveolarInput;
    type Output = AlveolarResult;
    const NAME: &'static str = "alveolar";

    fn evaluate(input: &AlveolarInput) -> Result<AlveolarResult> {
        alveolar_gas(input)
    }
}

/// `PAO2 = FiO2 (PB − PH2O) − PaCO2 / RQ`, floored at zero
///
/// Above roughly 19 km the barometric pressure drops below the water vapour
/// pressure at body temperature. Inspired PO2 is then floored at zero too.
pub fn alveolar_gas(input: &AlveolarInput) -> Result<AlveolarResult> {
    let altitude_m = ALVEOLAR_ALTITUDE.check("altitude_m", input.altitude_m)?;
    let fio2 = FIO2.check("fio2", input.fio2)?;
    let paco2 = PACO2.check("paco2_mmhg", input.paco2_mmhg)?;
    let rq = RQ.check("rq", input.rq)?;

    let barometric_mmhg = pressure_at(altitude_m)? / PA_PER_MMHG;
    let inspired = fio2 * (barometric_mmhg - PH2O_MMHG).max(0.0);
    let alveolar = (inspired - paco2 / rq).max(0.0);

    Ok(AlveolarResult {
        barometric_mmhg,
        inspired_po2_mmhg: inspired,
        alveolar_po2_mmhg: alveolar,
        tier: PAO2_TIERS.classify(alveolar),
    })
}

// ============================================================================
// SpO2 vs Altitude
// ============================================================================

const SPO2_ALTITUDE: ValidRange = ValidRange::new(0.0, 30000.0);

/// Empirical (altitude ft, SpO2 %) breakpoints, interpolated linearly
const SPO2_CURVE: [(f64, f64); 11] = [
    (0.0, 98.0),
    (5000.0, 95.0),
    (8000.0, 93.0),
    (10000.0, 90.0),
    (12000.0, 87.0),
    (15000.0, 82.0),
    (18000.0, 75.0),
    (20000.0, 70.0),
    (22000.0, 65.0),
    (25000.0, 60.0),
    (30000.0, 50.0),
];

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HypoxiaTier {
    Severe,
    Moderate,
    Mild,
    Normal,
}

const SPO2_TIERS: ThresholdTable<HypoxiaTier> = ThresholdTable::new(
    HypoxiaTier::Severe,
    &[
        (80.0, HypoxiaTier::Moderate),
        (90.0, HypoxiaTier::Mild),
        (95.0, HypoxiaTier::Normal),
    ],
);

/// Time of useful consciousness band (seconds)
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct TucBand {
    pub min_seconds: f64,
    pub max_seconds: f64,
}

/// FAA table, highest matching floor wins
const TUC_TABLE: [(f64, TucBand); 5] = [
    (18000.0, TucBand { min_seconds: 1200.0, max_seconds: 1800.0 }),
    (22000.0, TucBand { min_seconds: 300.0, max_seconds: 600.0 }),
    (25000.0, TucBand { min_seconds: 180.0, max_seconds: 300.0 }),
    (28000.0, TucBand { min_seconds: 150.0, max_seconds: 180.0 }),
    (30000.0, TucBand { min_seconds: 60.0, max_seconds: 120.0 }),
];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Spo2Input {
    /// Cabin/pressure altitude (ft)
    pub altitude_ft: f64,
}

impl Default for Spo2Input {
    fn default() -> Self {
        Self { altitude_ft: 0.0 }
    }
}

impl Parameters for Spo2Input {
    fn param_names() -> &'static [&'static str] {
        &["altitude_ft"]
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "altitude_ft" => self.altitude_ft = value,
            _ => return Err(unknown_param(Spo2Altitude::NAME, name)),
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Spo2Result {
    pub spo2_pct: f64,
    pub tier: HypoxiaTier,
    pub time_of_useful_consciousness: Option<TucBand>,
}

pub struct Spo2Altitude;

impl Formula for Spo2Altitude {
    type Input = Spo2Input;
    type Output = Spo2Result;
    const NAME: &'static str = "spo2";

    fn evaluate(input: &Spo2Input) -> Result<Spo2Result> {
        spo2_at_altitude(input)
    }
}

fn interpolate(curve: &[(f64, f64)], x: f64) -> f64 {
    for pair in curve.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if x <= x1 {
            return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
        }
    }
    curve[curve.len() - 1].1
}

/// Resting SpO2 breathing air at a pressure altitude
pub fn spo2_at_altitude(input: &Spo2Input) -> Result<Spo2Result> {
    let altitude_ft = SPO2_ALTITUDE.check("altitude_ft", input.altitude_ft)?;
    let spo2 = interpolate(&SPO2_CURVE, altitude_ft);

    let tuc = TUC_TABLE
        .iter()
        .rev()
        .find(|(floor, _)| altitude_ft >= *floor)
        .map(|(_, band)| *band);

    Ok(Spo2Result {
        spo2_pct: spo2,
        tier: SPO2_TIERS.classify(spo2),
        time_of_useful_consciousness: tuc,
    })
}
