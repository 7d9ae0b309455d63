//! Target acquisition probability from the Johnson criteria.
//!
//! The number of resolvable cycles across a target is compared with the
//! N50 for a discrimination task, then mapped to a probability through the
//! target transfer probability function.

use crate::types::{unknown_param, Formula, Parameters, ValidRange};
use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

const TARGET_SIZE: ValidRange = ValidRange::new(0.0, 100.0);
const RANGE: ValidRange = ValidRange::new(0.0, 50_000.0);
const RESOLUTION: ValidRange = ValidRange::new(0.01, 50.0);

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DiscriminationLevel {
    Detection,
    Orientation,
    Recognition,
    Identification,
}

/// Cycle criteria family
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CycleCriteria {
    /// Classic line-pair criteria
    Johnson,
    /// Targeting task performance metric
    Ttp,
}

impl FromStr for DiscriminationLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "detection" | "detect" => Ok(Self::Detection),
            "orientation" => Ok(Self::Orientation),
            "recognition" | "recognize" => Ok(Self::Recognition),
            "identification" | "identify" => Ok(Self::Identification),
            other => Err(Error::UnknownOption {
                kind: "discrimination level",
                value: other.to_string(),
                expected: "detection, orientation, recognition, identification",
            }),
        }
    }
}

impl FromStr for CycleCriteria {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "johnson" => Ok(Self::Johnson),
            "ttp" => Ok(Self::Ttp),
            other => Err(Error::UnknownOption {
                kind: "cycle criteria",
                value: other.to_string(),
                expected: "johnson, ttp",
            }),
        }
    }
}

/// N50 cycles keyed by (criteria, level). TTP has no orientation task.
static N50_TABLE: Lazy<HashMap<(CycleCriteria, DiscriminationLevel), f64>> = Lazy::new(|| {
    use CycleCriteria::*;
    use DiscriminationLevel::*;

    HashMap::from([
        ((Johnson, Detection), 1.0),
        ((Johnson, Orientation), 1.4),
        ((Johnson, Recognition), 4.0),
        ((Johnson, Identification), 6.4),
        ((Ttp, Detection), 0.75),
        ((Ttp, Recognition), 3.0),
        ((Ttp, Identification), 6.0),
    ])
});

pub fn n50(criteria: CycleCriteria, level: DiscriminationLevel) -> Result<f64> {
    N50_TABLE
        .get(&(criteria, level))
        .copied()
        .ok_or_else(|| {
            Error::UndefinedCombination(format!(
                "{:?} criteria have no {:?} task",
                criteria, level
            ))
        })
}

/// Target transfer probability function
pub fn transfer_probability(cycles: f64, n50: f64) -> f64 {
    let ratio = cycles / n50;
    let exponent = 2.7 + 0.7 * ratio;
    let r = ratio.powf(exponent);
    r / (1.0 + r)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AcquisitionInput {
    /// Critical dimension of the target (m)
    pub target_size_m: f64,
    pub range_m: f64,
    /// Sensor resolution (cycles per milliradian)
    pub resolution_cyc_per_mrad: f64,
    pub level: DiscriminationLevel,
    pub criteria: CycleCriteria,
}

impl Default for AcquisitionInput {
    fn default() -> Self {
        Self {
            target_size_m: 2.3,
            range_m: 1000.0,
            resolution_cyc_per_mrad: 2.0,
            level: DiscriminationLevel::Recognition,
            criteria: CycleCriteria::Johnson,
        }
    }
}

impl Parameters for AcquisitionInput {
    fn param_names() -> &'static [&'static str] {
        &["target_size_m", "range_m", "resolution_cyc_per_mrad"]
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "target_size_m" => self.target_size_m = value,
            "range_m" => self.range_m = value,
            "resolution_cyc_per_mrad" => self.resolution_cyc_per_mrad = value,
            _ => return Err(unknown_param(TargetAcquisition::NAME, name)),
        }
        Ok(())
    }

    fn option_names() -> &'static [&'static str] {
        &["level", "criteria"]
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "level" => self.level = value.parse()?,
            "criteria" => self.criteria = value.parse()?,
            _ => return Err(unknown_param(TargetAcquisition::NAME, name)),
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct AcquisitionResult {
    pub subtense_mrad: f64,
    pub resolved_cycles: f64,
    pub n50: f64,
    /// Resolved cycles over N50
    pub cycle_ratio: f64,
    pub probability: f64,
}

pub struct TargetAcquisition;

impl Formula for TargetAcquisition {
    type Input = AcquisitionInput;
    type Output = AcquisitionResult;
    const NAME: &'static str = "target";

    fn evaluate(input: &AcquisitionInput) -> Result<AcquisitionResult> {
        target_acquisition(input)
    }
}

pub fn target_acquisition(input: &AcquisitionInput) -> Result<AcquisitionResult> {
    let size = TARGET_SIZE.check("target_size_m", input.target_size_m)?;
    let range = RANGE.check("range_m", input.range_m)?;
    let resolution = RESOLUTION.check(
        "resolution_cyc_per_mrad",
        input.resolution_cyc_per_mrad,
    )?;

    if range == 0.0 {
        return Err(Error::InvalidGeometry("range must be greater than zero".into()));
    }
    if size == 0.0 {
        return Err(Error::InvalidGeometry(
            "target size must be greater than zero".into(),
        ));
    }

    let n50 = n50(input.criteria, input.level)?;
    let subtense_mrad = size / range * 1000.0;
    let resolved_cycles = subtense_mrad * resolution;

    Ok(AcquisitionResult {
        subtense_mrad,
        resolved_cycles,
        n50,
        cycle_ratio: resolved_cycles / n50,
        probability: transfer_probability(resolved_cycles, n50),
    })
}
