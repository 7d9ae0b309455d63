//! Predicted Heat Strain (ISO 7933), single-pass approximation.
//!
//! The heat balance is solved once per call: the clothing surface
//! temperature comes from one linear pass with a fixed radiative coefficient
//! rather than the iterative loop of the full standard. Heat storage is then
//! accumulated over the requested exposure duration, so a trajectory over
//! duration re-evaluates this function with the cumulative time at each
//! sample.

use crate::types::{flag, unknown_param, Formula, Parameters, ThresholdTable, ValidRange};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

const AIR_TEMP: ValidRange = ValidRange::new(15.0, 50.0);
const RADIANT_TEMP: ValidRange = ValidRange::new(15.0, 110.0);
const HUMIDITY: ValidRange = ValidRange::new(0.0, 100.0);
/// ISO 7933 upper limit on partial water vapour pressure (kPa)
const MAX_VAPOUR_PRESSURE_KPA: f64 = 4.5;
const AIR_VELOCITY: ValidRange = ValidRange::new(0.0, 3.0);
const METABOLIC: ValidRange = ValidRange::new(100.0, 450.0);
const CLOTHING: ValidRange = ValidRange::new(0.1, 1.0);
const DURATION: ValidRange = ValidRange::new(0.0, 480.0);
const BODY_MASS: ValidRange = ValidRange::new(40.0, 150.0);
const HEIGHT: ValidRange = ValidRange::new(1.4, 2.1);

/// Resting rectal temperature (°C)
const TRE_REST: f64 = 36.8;
/// Core temperature limit for allowable exposure (°C)
const TRE_LIMIT: f64 = 38.0;
/// Beyond this the model output is meaningless (°C)
pub const TRE_MODEL_MAX: f64 = 42.0;
/// Whole-body specific heat (J/(kg·K))
const BODY_SPECIFIC_HEAT: f64 = 3490.0;
/// Latent heat of sweat evaporation (J/g)
const LATENT_HEAT: f64 = 2430.0;
/// Linearized radiative coefficient (W/(m²·K))
const RADIATIVE_COEFF: f64 = 4.7;
/// Clothing moisture permeability index
const PERMEABILITY: f64 = 0.38;
/// Lewis relation (K/kPa)
const LEWIS: f64 = 16.5;
/// clo → m²·K/W
const CLO: f64 = 0.155;
/// Longest exposure the model considers (min)
pub const MAX_EXPOSURE_MIN: f64 = 480.0;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrainTier {
    Low,
    Moderate,
    High,
    Extreme,
}

const TRE_TIERS: ThresholdTable<StrainTier> = ThresholdTable::new(
    StrainTier::Low,
    &[
        (37.5, StrainTier::Moderate),
        (38.0, StrainTier::High),
        (39.0, StrainTier::Extreme),
    ],
);

/// What ends the allowable exposure first
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LimitingFactor {
    None,
    CoreTemperature,
    Dehydration,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhsInput {
    /// Air temperature (°C)
    pub air_temp_c: f64,
    /// Mean radiant temperature (°C)
    pub radiant_temp_c: f64,
    /// Relative humidity (%)
    pub relative_humidity: f64,
    /// Air velocity (m/s)
    pub air_velocity: f64,
    /// Metabolic rate (W/m²)
    pub metabolic_rate: f64,
    /// Static clothing insulation (clo)
    pub clothing_clo: f64,
    /// Cumulative exposure (min)
    pub duration_min: f64,
    pub body_mass_kg: f64,
    pub height_m: f64,
    pub acclimatized: bool,
    /// Free access to drinking water
    pub drinking: bool,
}

impl Default for PhsInput {
    fn default() -> Self {
        Self {
            air_temp_c: 30.0,
            radiant_temp_c: 30.0,
            relative_humidity: 50.0,
            air_velocity: 0.3,
            metabolic_rate: 150.0,
            clothing_clo: 0.5,
            duration_min: 60.0,
            body_mass_kg: 75.0,
            height_m: 1.8,
            acclimatized: true,
            drinking: true,
        }
    }
}

impl Parameters for PhsInput {
    fn param_names() -> &'static [&'static str] {
        &[
            "air_temp_c",
            "radiant_temp_c",
            "relative_humidity",
            "air_velocity",
            "metabolic_rate",
            "clothing_clo",
            "duration_min",
            "body_mass_kg",
            "height_m",
            "acclimatized",
            "drinking",
        ]
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "air_temp_c" => self.air_temp_c = value,
            "radiant_temp_c" => self.radiant_temp_c = value,
            "relative_humidity" => self.relative_humidity = value,
            "air_velocity" => self.air_velocity = value,
            "metabolic_rate" => self.metabolic_rate = value,
            "clothing_clo" => self.clothing_clo = value,
            "duration_min" => self.duration_min = value,
            "body_mass_kg" => self.body_mass_kg = value,
            "height_m" => self.height_m = value,
            "acclimatized" => self.acclimatized = flag("acclimatized", value)?,
            "drinking" => self.drinking = flag("drinking", value)?,
            _ => return Err(unknown_param(PredictedHeatStrain::NAME, name)),
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PhsResult {
    pub duration_min: f64,
    pub vapour_pressure_kpa: f64,
    pub body_surface_m2: f64,
    pub skin_temp_c: f64,
    pub clothing_temp_c: f64,
    pub convective_coeff: f64,
    /// Convective + radiative loss (W/m², negative is a gain)
    pub dry_heat_loss: f64,
    pub respiratory_loss: f64,
    pub required_evaporation: f64,
    pub max_evaporation: f64,
    pub required_wettedness: f64,
    pub predicted_evaporation: f64,
    pub sweat_rate_w_m2: f64,
    pub heat_storage_w_m2: f64,
    pub rectal_temp_c: f64,
    pub sweat_rate_g_h: f64,
    pub water_loss_g: f64,
    pub dehydration_pct: f64,
    pub dlim_core_min: f64,
    pub dlim_water_min: f64,
    pub allowable_exposure_min: f64,
    pub limiting_factor: LimitingFactor,
    pub tier: StrainTier,
}

pub struct PredictedHeatStrain;

impl Formula for PredictedHeatStrain {
    type Input = PhsInput;
    type Output = PhsResult;
    const NAME: &'static str = "phs";

    fn evaluate(input: &PhsInput) -> Result<PhsResult> {
        predicted_heat_strain(input)
    }
}

/// Saturated vapour pressure (kPa), Tetens form
pub fn saturation_vapour_pressure(temp_c: f64) -> f64 {
    0.6105 * (17.27 * temp_c / (temp_c + 237.3)).exp()
}

/// DuBois body surface area (m²)
pub fn dubois_area(mass_kg: f64, height_m: f64) -> f64 {
    0.202 * mass_kg.powf(0.425) * height_m.powf(0.725)
}

/// Evaporative efficiency of sweating at a given wettedness
fn sweat_efficiency(wettedness: f64) -> f64 {
    if wettedness <= 1.0 {
        1.0 - wettedness * wettedness / 2.0
    } else if wettedness < 1.7 {
        (2.0 - wettedness).powi(2) / 2.0
    } else {
        0.05
    }
}

/// Evaluate the heat balance at the cumulative exposure duration
pub fn predicted_heat_strain(input: &PhsInput) -> Result<PhsResult> {
    let ta = AIR_TEMP.check("air_temp_c", input.air_temp_c)?;
    let tr = RADIANT_TEMP.check("radiant_temp_c", input.radiant_temp_c)?;
    let mut rh = HUMIDITY.check("relative_humidity", input.relative_humidity)?;
    let va = AIR_VELOCITY.check("air_velocity", input.air_velocity)?;
    let met = METABOLIC.check("metabolic_rate", input.metabolic_rate)?;
    let clo = CLOTHING.check("clothing_clo", input.clothing_clo)?;
    let duration_min = DURATION.check("duration_min", input.duration_min)?;
    let mass = BODY_MASS.check("body_mass_kg", input.body_mass_kg)?;
    let height = HEIGHT.check("height_m", input.height_m)?;

    // The vapour pressure limit caps humidity at the given air temperature
    let psat = saturation_vapour_pressure(ta);
    let humid_limit =
        ValidRange::new(0.0, (100.0 * MAX_VAPOUR_PRESSURE_KPA / psat).min(100.0));
    rh = humid_limit.check("relative_humidity", rh)?;
    let pa = rh / 100.0 * psat;
    let adu = dubois_area(mass, height);

    // Clothed equilibrium skin temperature at resting core temperature
    let tsk = 12.165 + 0.02017 * ta + 0.04361 * tr + 0.19354 * pa - 0.25315 * va
        + 0.005346 * met
        + 0.51274 * TRE_REST;

    let hc = (3.5 + 5.2 * va).max(2.38 * (tsk - ta).abs().powf(0.25));
    let hr = RADIATIVE_COEFF;
    let icl = clo * CLO;
    let fcl = 1.0 + 0.3 * clo;

    // One linear pass; the standard iterates this to convergence
    let tcl = (tsk + icl * fcl * (hc * ta + hr * tr)) / (1.0 + icl * fcl * (hc + hr));
    let dry = fcl * (hc * (tcl - ta) + hr * (tcl - tr));

    let cres = 0.0014 * met * (34.0 - ta);
    let eres = 0.0173 * met * (5.624 - pa);
    let ereq = met - cres - eres - dry;

    let psk = saturation_vapour_pressure(tsk);
    let emax = ((psk - pa) * LEWIS * PERMEABILITY / (icl + 1.0 / (fcl * hc))).max(0.0);

    let (wmax, swmax) = if input.acclimatized {
        (1.0, 500.0)
    } else {
        (0.85, 400.0)
    };

    let wreq = if emax > 0.0 { ereq.max(0.0) / emax } else { wmax };
    let wp = wreq.min(wmax);
    let rp = sweat_efficiency(wp);

    let ep = ereq.max(0.0).min(wmax * emax).min(swmax * rp);
    let sweat_w_m2 = ep / rp;
    let storage = (ereq - ep).max(0.0);

    let seconds = duration_min * 60.0;
    let rectal_temp_c = TRE_REST + storage * adu * seconds / (mass * BODY_SPECIFIC_HEAT);
    if rectal_temp_c > TRE_MODEL_MAX {
        return Err(Error::ModelDomain {
            quantity: "rectal_temp_c",
            value: rectal_temp_c,
            limit: TRE_MODEL_MAX,
        });
    }

    let sweat_rate_g_h = sweat_w_m2 * adu * 3600.0 / LATENT_HEAT;
    let water_loss_g = sweat_rate_g_h * duration_min / 60.0;
    let dehydration_pct = water_loss_g / (mass * 1000.0) * 100.0;

    let dlim_core_min = if storage > 0.0 {
        ((TRE_LIMIT - TRE_REST) * mass * BODY_SPECIFIC_HEAT / (storage * adu) / 60.0)
            .min(MAX_EXPOSURE_MIN)
    } else {
        MAX_EXPOSURE_MIN
    };

    let max_loss_pct = if input.drinking { 5.0 } else { 3.0 };
    let dlim_water_min = if sweat_rate_g_h > 0.0 {
        (max_loss_pct / 100.0 * mass * 1000.0 / (sweat_rate_g_h / 60.0)).min(MAX_EXPOSURE_MIN)
    } else {
        MAX_EXPOSURE_MIN
    };

    let allowable = dlim_core_min.min(dlim_water_min);
    let limiting_factor = if allowable >= MAX_EXPOSURE_MIN {
        LimitingFactor::None
    } else if dlim_core_min <= dlim_water_min {
        LimitingFactor::CoreTemperature
    } else {
        LimitingFactor::Dehydration
    };

    tracing::trace!(
        ta,
        duration_min,
        storage,
        rectal_temp_c,
        "PHS evaluated"
    );

    Ok(PhsResult {
        duration_min,
        vapour_pressure_kpa: pa,
        body_surface_m2: adu,
        skin_temp_c: tsk,
        clothing_temp_c: tcl,
        convective_coeff: hc,
        dry_heat_loss: dry,
        respiratory_loss: cres + eres,
        required_evaporation: ereq,
        max_evaporation: emax,
        required_wettedness: wreq,
        predicted_evaporation: ep,
        sweat_rate_w_m2: sweat_w_m2,
        heat_storage_w_m2: storage,
        rectal_temp_c,
        sweat_rate_g_h,
        water_loss_g,
        dehydration_pct,
        dlim_core_min,
        dlim_water_min,
        allowable_exposure_min: allowable,
        limiting_factor,
        tier: TRE_TIERS.classify(rectal_temp_c),
    })
}
