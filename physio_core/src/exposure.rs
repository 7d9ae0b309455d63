//! Occupational chemical exposure.
//!
//! This module provides:
//! - A read-only table of common solvents and gases with ACGIH TLVs
//! - ppm / mg·m⁻³ conversion at 25 °C and 1 atm
//! - 8-hour time-weighted averages
//! - The additive mixed-exposure index `EM = Σ Cᵢ / TLVᵢ`

use crate::types::{unknown_param, Formula, Parameters, ThresholdTable, ValidRange};
use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Molar volume of an ideal gas at 25 °C, 1 atm (L/mol)
pub const MOLAR_VOLUME_L: f64 = 24.45;
/// Reference shift length for the TWA (h)
pub const REFERENCE_SHIFT_H: f64 = 8.0;
const MAX_SAMPLED_H: f64 = 24.0;

const CONCENTRATION: ValidRange = ValidRange::new(0.0, 1.0e6);
const SAMPLE_HOURS: ValidRange = ValidRange::new(0.0, MAX_SAMPLED_H);

#[derive(Clone, Debug, Serialize)]
pub struct Chemical {
    /// Lookup key used on the command line
    pub key: &'static str,
    pub name: &'static str,
    pub cas: &'static str,
    /// g/mol
    pub molecular_weight: f64,
    pub tlv_twa_ppm: f64,
    pub stel_ppm: Option<f64>,
}

/// Chemical table - built once and shared
static CHEMICALS: Lazy<HashMap<&'static str, Chemical>> = Lazy::new(build_chemical_table);

fn build_chemical_table() -> HashMap<&'static str, Chemical> {
    let rows: [(&str, &str, &str, f64, f64, Option<f64>); 15] = [
        ("acetone", "Acetone", "67-64-1", 58.08, 250.0, Some(500.0)),
        ("toluene", "Toluene", "108-88-3", 92.14, 20.0, None),
        ("xylene", "Xylene (mixed isomers)", "1330-20-7", 106.16, 100.0, Some(150.0)),
        ("benzene", "Benzene", "71-43-2", 78.11, 0.5, Some(2.5)),
        ("n-hexane", "n-Hexane", "110-54-3", 86.18, 50.0, None),
        ("methanol", "Methanol", "67-56-1", 32.04, 200.0, Some(250.0)),
        ("isopropanol", "Isopropanol", "67-63-0", 60.10, 200.0, Some(400.0)),
        ("styrene", "Styrene", "100-42-5", 104.15, 20.0, Some(40.0)),
        ("ethylbenzene", "Ethylbenzene", "100-41-4", 106.17, 20.0, None),
        ("formaldehyde", "Formaldehyde", "50-00-0", 30.03, 0.1, Some(0.3)),
        ("ammonia", "Ammonia", "7664-41-7", 17.03, 25.0, Some(35.0)),
        ("carbon-monoxide", "Carbon monoxide", "630-08-0", 28.01, 25.0, None),
        ("hydrogen-sulfide", "Hydrogen sulfide", "7783-06-4", 34.08, 1.0, Some(5.0)),
        ("mek", "Methyl ethyl ketone", "78-93-3", 72.11, 200.0, Some(300.0)),
        ("trichloroethylene", "Trichloroethylene", "79-01-6", 131.39, 10.0, Some(25.0)),
    ];

    rows.into_iter()
        .map(|(key, name, cas, molecular_weight, tlv_twa_ppm, stel_ppm)| {
            (
                key,
                Chemical {
                    key,
                    name,
                    cas,
                    molecular_weight,
                    tlv_twa_ppm,
                    stel_ppm,
                },
            )
        })
        .collect()
}

/// All chemicals, sorted by key
pub fn chemicals() -> Vec<&'static Chemical> {
    let mut all: Vec<_> = CHEMICALS.values().collect();
    all.sort_by_key(|c| c.key);
    all
}

/// Find a chemical by key, display name, or CAS number (case-insensitive)
pub fn lookup_chemical(query: &str) -> Result<&'static Chemical> {
    let needle = query.trim().to_ascii_lowercase();
    if let Some(chem) = CHEMICALS.get(needle.as_str()) {
        return Ok(chem);
    }
    CHEMICALS
        .values()
        .find(|c| c.cas == needle || c.name.eq_ignore_ascii_case(&needle))
        .ok_or_else(|| Error::UnknownChemical(query.to_string()))
}

pub fn ppm_to_mg_m3(ppm: f64, molecular_weight: f64) -> f64 {
    ppm * molecular_weight / MOLAR_VOLUME_L
}

pub fn mg_m3_to_ppm(mg_m3: f64, molecular_weight: f64) -> f64 {
    mg_m3 * MOLAR_VOLUME_L / molecular_weight
}

// ============================================================================
// Time-Weighted Average
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ExposureSample {
    pub concentration_ppm: f64,
    pub hours: f64,
}

/// `TWA = Σ Cᵢ tᵢ / 8`. Unsampled time counts as zero exposure.
pub fn time_weighted_average(samples: &[ExposureSample]) -> Result<f64> {
    let mut dose = 0.0;
    let mut total_hours = 0.0;
    for sample in samples {
        let c = CONCENTRATION.check("concentration_ppm", sample.concentration_ppm)?;
        let t = SAMPLE_HOURS.check("hours", sample.hours)?;
        dose += c * t;
        total_hours += t;
    }
    SAMPLE_HOURS.check("total_hours", total_hours)?;
    Ok(dose / REFERENCE_SHIFT_H)
}

// ============================================================================
// Mixed Exposure
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExposureTier {
    Acceptable,
    ActionLevel,
    Exceeds,
}

const EXPOSURE_INDEX: ThresholdTable<ExposureTier> = ThresholdTable::new(
    ExposureTier::Acceptable,
    &[(0.5, ExposureTier::ActionLevel), (1.0, ExposureTier::Exceeds)],
);

/// One measured agent in a mixture
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentExposure {
    pub chemical: String,
    pub concentration_ppm: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct AgentRatio {
    pub chemical: &'static str,
    pub concentration_ppm: f64,
    pub concentration_mg_m3: f64,
    pub tlv_twa_ppm: f64,
    pub ratio: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct MixedExposureResult {
    pub index: f64,
    pub agents: Vec<AgentRatio>,
    pub tier: ExposureTier,
}

pub fn mixed_exposure(agents: &[AgentExposure]) -> Result<MixedExposureResult> {
    let ratios = agents
        .iter()
        .map(|agent| {
            let chem = lookup_chemical(&agent.chemical)?;
            let c = CONCENTRATION.check("concentration_ppm", agent.concentration_ppm)?;
            Ok(AgentRatio {
                chemical: chem.key,
                concentration_ppm: c,
                concentration_mg_m3: ppm_to_mg_m3(c, chem.molecular_weight),
                tlv_twa_ppm: chem.tlv_twa_ppm,
                ratio: c / chem.tlv_twa_ppm,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let index = ratios.iter().map(|r| r.ratio).sum();
    tracing::trace!(agents = ratios.len(), index, "mixed exposure");

    Ok(MixedExposureResult {
        index,
        agents: ratios,
        tier: EXPOSURE_INDEX.classify(index),
    })
}

// ============================================================================
// Two-agent Formula
// ============================================================================

/// Fixed pair of agents whose concentrations can be swept
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExposureInput {
    pub first: String,
    pub first_ppm: f64,
    pub second: String,
    pub second_ppm: f64,
}

impl Default for ExposureInput {
    fn default() -> Self {
        Self {
            first: "acetone".to_string(),
            first_ppm: 100.0,
            second: "toluene".to_string(),
            second_ppm: 5.0,
        }
    }
}

impl Parameters for ExposureInput {
    fn param_names() -> &'static [&'static str] {
        &["first_ppm", "second_ppm"]
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "first_ppm" => self.first_ppm = value,
            "second_ppm" => self.second_ppm = value,
            _ => return Err(unknown_param(MixedExposure::NAME, name)),
        }
        Ok(())
    }

    fn option_names() -> &'static [&'static str] {
        &["first", "second"]
    }

    /// Agents are stored by table key, so CAS numbers and names also work
    fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        let slot = match name {
            "first" => &mut self.first,
            "second" => &mut self.second,
            _ => return Err(unknown_param(MixedExposure::NAME, name)),
        };
        *slot = lookup_chemical(value)?.key.to_string();
        Ok(())
    }
}

pub struct MixedExposure;

impl Formula for MixedExposure {
    type Input = ExposureInput;
    type Output = MixedExposureResult;
    const NAME: &'static str = "exposure";

    fn evaluate(input: &ExposureInput) -> Result<MixedExposureResult> {
        mixed_exposure(&[
            AgentExposure {
                chemical: input.first.clone(),
                concentration_ppm: input.first_ppm,
            },
            AgentExposure {
                chemical: input.second.clone(),
                concentration_ppm: input.second_ppm,
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn agent(chemical: &str, concentration_ppm: f64) -> AgentExposure {
        AgentExposure {
            chemical: chemical.to_string(),
            concentration_ppm,
        }
    }

    #[test]
    fn test_table_is_complete() {
        let all = chemicals();
        assert_eq!(all.len(), 15);
        assert!(all.windows(2).all(|w| w[0].key < w[1].key));
        assert!(all.iter().all(|c| c.tlv_twa_ppm > 0.0));
        assert!(all
            .iter()
            .filter_map(|c| c.stel_ppm.map(|s| (s, c.tlv_twa_ppm)))
            .all(|(stel, twa)| stel > twa));
    }

    #[test]
    fn test_lookup_variants() {
        assert_eq!(lookup_chemical("Toluene").unwrap().key, "toluene");
        assert_eq!(lookup_chemical("71-43-2").unwrap().key, "benzene");
        assert_eq!(lookup_chemical("methyl ethyl ketone").unwrap().key, "mek");
        assert!(matches!(
            lookup_chemical("unobtainium"),
            Err(Error::UnknownChemical(name)) if name == "unobtainium"
        ));
    }

    #[test]
    fn test_unit_conversion() {
        // 100 ppm toluene ≈ 376.8 mg/m³
        let mg = ppm_to_mg_m3(100.0, 92.14);
        assert_relative_eq!(mg, 376.85, epsilon = 0.01);
        assert_relative_eq!(mg_m3_to_ppm(mg, 92.14), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_twa_over_full_shift() {
        let samples = [
            ExposureSample {
                concentration_ppm: 100.0,
                hours: 2.0,
            },
            ExposureSample {
                concentration_ppm: 50.0,
                hours: 4.0,
            },
        ];
        // (200 + 200) / 8, the two unsampled hours count as zero
        assert_relative_eq!(time_weighted_average(&samples).unwrap(), 50.0);
    }

    #[test]
    fn test_twa_limits() {
        let too_long = [
            ExposureSample {
                concentration_ppm: 1.0,
                hours: 16.0,
            },
            ExposureSample {
                concentration_ppm: 1.0,
                hours: 9.0,
            },
        ];
        assert!(matches!(
            time_weighted_average(&too_long),
            Err(Error::OutOfRangeInput {
                field: "total_hours",
                ..
            })
        ));

        let negative = [ExposureSample {
            concentration_ppm: -1.0,
            hours: 1.0,
        }];
        assert!(matches!(
            time_weighted_average(&negative),
            Err(Error::OutOfRangeInput {
                field: "concentration_ppm",
                ..
            })
        ));
    }

    #[test]
    fn test_mixed_exposure_sum_of_ratios() {
        let result =
            mixed_exposure(&[agent("acetone", 125.0), agent("toluene", 10.0)]).unwrap();
        assert_relative_eq!(result.index, 1.0);
        assert_eq!(result.tier, ExposureTier::Exceeds);
        assert_relative_eq!(result.agents[0].ratio, 0.5);
        assert_relative_eq!(result.agents[1].ratio, 0.5);
    }

    #[test]
    fn test_mixed_exposure_tiers() {
        let low = mixed_exposure(&[agent("acetone", 100.0)]).unwrap();
        assert_eq!(low.tier, ExposureTier::Acceptable);

        let action = mixed_exposure(&[agent("acetone", 125.0)]).unwrap();
        assert_eq!(action.tier, ExposureTier::ActionLevel);
    }

    #[test]
    fn test_unknown_agent_fails_whole_mixture() {
        let err = mixed_exposure(&[agent("acetone", 1.0), agent("kryptonite", 1.0)]);
        assert!(matches!(err, Err(Error::UnknownChemical(_))));
    }

    #[test]
    fn test_two_agent_formula() {
        let out = MixedExposure::evaluate(&ExposureInput::default()).unwrap();
        // 100/250 + 5/20
        assert_relative_eq!(out.index, 0.65);
        assert_eq!(out.tier, ExposureTier::ActionLevel);
    }
}
