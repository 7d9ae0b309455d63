//! Wet Bulb Globe Temperature and heat-stress screening limits.
//!
//! The screening limits follow the ACGIH table keyed by criteria family,
//! workload, and work/rest regime. Some cells are intentionally empty
//! (heavy continuous work has no published limit); asking for one is an
//! error rather than a silent default.

use crate::types::{flag, unknown_param, Formula, Parameters, ThresholdTable, ValidRange};
use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

const WET_BULB: ValidRange = ValidRange::new(-10.0, 45.0);
const GLOBE: ValidRange = ValidRange::new(-10.0, 80.0);
const DRY_BULB: ValidRange = ValidRange::new(-10.0, 60.0);
const WBGT: ValidRange = ValidRange::new(-10.0, 60.0);

// ============================================================================
// Risk Classification
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HeatRisk {
    Low,
    Moderate,
    High,
    Extreme,
}

/// <28 Low, [28,30) Moderate, [30,32) High, ≥32 Extreme
const WBGT_RISK: ThresholdTable<HeatRisk> = ThresholdTable::new(
    HeatRisk::Low,
    &[
        (28.0, HeatRisk::Moderate),
        (30.0, HeatRisk::High),
        (32.0, HeatRisk::Extreme),
    ],
);

/// Risk tier for an already-measured WBGT (°C)
pub fn classify_wbgt(wbgt_c: f64) -> Result<HeatRisk> {
    let wbgt_c = WBGT.check("wbgt_c", wbgt_c)?;
    Ok(WBGT_RISK.classify(wbgt_c))
}

// ============================================================================
// Screening Limit Tables
// ============================================================================

/// Which limit table applies
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CriteriaFamily {
    /// Threshold limit value for acclimatized workers
    Tlv,
    /// Action limit for unacclimatized workers
    ActionLimit,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Workload {
    Light,
    Moderate,
    Heavy,
    VeryHeavy,
}

/// Share of each hour spent working
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkRest {
    /// 75-100 % work
    Continuous,
    /// 50-75 % work
    ThreeQuarter,
    /// 25-50 % work
    Half,
    /// 0-25 % work
    Quarter,
}

impl FromStr for CriteriaFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tlv" => Ok(Self::Tlv),
            "action" | "action_limit" | "al" => Ok(Self::ActionLimit),
            other => Err(Error::UnknownOption {
                kind: "criteria family",
                value: other.to_string(),
                expected: "tlv, action",
            }),
        }
    }
}

impl FromStr for Workload {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "moderate" => Ok(Self::Moderate),
            "heavy" => Ok(Self::Heavy),
            "very_heavy" | "very-heavy" | "veryheavy" => Ok(Self::VeryHeavy),
            other => Err(Error::UnknownOption {
                kind: "workload",
                value: other.to_string(),
                expected: "light, moderate, heavy, very_heavy",
            }),
        }
    }
}

impl FromStr for WorkRest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "continuous" | "100" => Ok(Self::Continuous),
            "three_quarter" | "75" => Ok(Self::ThreeQuarter),
            "half" | "50" => Ok(Self::Half),
            "quarter" | "25" => Ok(Self::Quarter),
            other => Err(Error::UnknownOption {
                kind: "work/rest regime",
                value: other.to_string(),
                expected: "continuous, three_quarter, half, quarter",
            }),
        }
    }
}

type LimitKey = (CriteriaFamily, WorkRest, Workload);

/// Screening limits (WBGT °C). Missing keys have no published value.
static SCREENING_LIMITS: Lazy<HashMap<LimitKey, f64>> = Lazy::new(|| {
    use CriteriaFamily::*;
    use WorkRest::*;
    use Workload::*;

    let rows: [(LimitKey, f64); 26] = [
        ((Tlv, Continuous, Light), 31.0),
        ((Tlv, Continuous, Moderate), 28.0),
        ((Tlv, ThreeQuarter, Light), 31.0),
        ((Tlv, ThreeQuarter, Moderate), 29.0),
        ((Tlv, ThreeQuarter, Heavy), 27.5),
        ((Tlv, Half, Light), 32.0),
        ((Tlv, Half, Moderate), 30.0),
        ((Tlv, Half, Heavy), 29.0),
        ((Tlv, Half, VeryHeavy), 28.0),
        ((Tlv, Quarter, Light), 32.5),
        ((Tlv, Quarter, Moderate), 31.5),
        ((Tlv, Quarter, Heavy), 30.5),
        ((Tlv, Quarter, VeryHeavy), 30.0),
        ((ActionLimit, Continuous, Light), 28.0),
        ((ActionLimit, Continuous, Moderate), 25.0),
        ((ActionLimit, ThreeQuarter, Light), 28.5),
        ((ActionLimit, ThreeQuarter, Moderate), 26.0),
        ((ActionLimit, ThreeQuarter, Heavy), 24.0),
        ((ActionLimit, Half, Light), 29.5),
        ((ActionLimit, Half, Moderate), 27.0),
        ((ActionLimit, Half, Heavy), 25.5),
        ((ActionLimit, Half, VeryHeavy), 24.5),
        ((ActionLimit, Quarter, Light), 30.0),
        ((ActionLimit, Quarter, Moderate), 29.0),
        ((ActionLimit, Quarter, Heavy), 28.0),
        ((ActionLimit, Quarter, VeryHeavy), 27.0),
    ];

    rows.into_iter().collect()
});

/// Look up the screening limit for a combination
pub fn screening_limit(
    family: CriteriaFamily,
    work_rest: WorkRest,
    workload: Workload,
) -> Result<f64> {
    SCREENING_LIMITS
        .get(&(family, work_rest, workload))
        .copied()
        .ok_or_else(|| {
            Error::UndefinedCombination(format!(
                "{:?} has no {:?} limit for {:?} work",
                family, work_rest, workload
            ))
        })
}

// ============================================================================
// WBGT Formula
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WbgtInput {
    /// Natural wet-bulb temperature (°C)
    pub natural_wet_bulb_c: f64,
    /// Black globe temperature (°C)
    pub globe_c: f64,
    /// Dry-bulb air temperature (°C)
    pub dry_bulb_c: f64,
    /// Solar load present
    pub outdoor: bool,
    pub criteria: CriteriaFamily,
    pub work_rest: WorkRest,
    pub workload: Workload,
}

impl Default for WbgtInput {
    fn default() -> Self {
        Self {
            natural_wet_bulb_c: 22.0,
            globe_c: 35.0,
            dry_bulb_c: 30.0,
            outdoor: true,
            criteria: CriteriaFamily::Tlv,
            work_rest: WorkRest::Continuous,
            workload: Workload::Moderate,
        }
    }
}

impl Parameters for WbgtInput {
    fn param_names() -> &'static [&'static str] {
        &["natural_wet_bulb_c", "globe_c", "dry_bulb_c", "outdoor"]
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "natural_wet_bulb_c" => self.natural_wet_bulb_c = value,
            "globe_c" => self.globe_c = value,
            "dry_bulb_c" => self.dry_bulb_c = value,
            "outdoor" => self.outdoor = flag("outdoor", value)?,
            _ => return Err(unknown_param(Wbgt::NAME, name)),
        }
        Ok(())
    }

    fn option_names() -> &'static [&'static str] {
        &["criteria", "work_rest", "workload"]
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "criteria" => self.criteria = value.parse()?,
            "work_rest" => self.work_rest = value.parse()?,
            "workload" => self.workload = value.parse()?,
            _ => return Err(unknown_param(Wbgt::NAME, name)),
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct WbgtResult {
    pub wbgt_c: f64,
    pub risk: HeatRisk,
    pub limit_c: f64,
    pub exceeds_limit: bool,
    /// Limit minus WBGT; negative when exceeded
    pub margin_c: f64,
}

pub struct Wbgt;

impl Formula for Wbgt {
    type Input = WbgtInput;
    type Output = WbgtResult;
    const NAME: &'static str = "wbgt";

    fn evaluate(input: &WbgtInput) -> Result<WbgtResult> {
        wbgt(input)
    }
}

/// Compose WBGT from its three temperatures and screen it
pub fn wbgt(input: &WbgtInput) -> Result<WbgtResult> {
    let tnwb = WET_BULB.check("natural_wet_bulb_c", input.natural_wet_bulb_c)?;
    let tg = GLOBE.check("globe_c", input.globe_c)?;
    let tdb = DRY_BULB.check("dry_bulb_c", input.dry_bulb_c)?;

    let wbgt_c = if input.outdoor {
        0.7 * tnwb + 0.2 * tg + 0.1 * tdb
    } else {
        0.7 * tnwb + 0.3 * tg
    };

    let limit_c = screening_limit(input.criteria, input.work_rest, input.workload)?;

    Ok(WbgtResult {
        wbgt_c,
        risk: WBGT_RISK.classify(wbgt_c),
        limit_c,
        exceeds_limit: wbgt_c > limit_c,
        margin_c: limit_c - wbgt_c,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_risk_boundaries() {
        assert_eq!(classify_wbgt(27.9).unwrap(), HeatRisk::Low);
        assert_eq!(classify_wbgt(28.0).unwrap(), HeatRisk::Moderate);
        assert_eq!(classify_wbgt(29.999).unwrap(), HeatRisk::Moderate);
        assert_eq!(classify_wbgt(30.0).unwrap(), HeatRisk::High);
        assert_eq!(classify_wbgt(31.9).unwrap(), HeatRisk::High);
        assert_eq!(classify_wbgt(32.0).unwrap(), HeatRisk::Extreme);
    }

    #[test]
    fn test_classify_range() {
        assert!(matches!(
            classify_wbgt(61.0),
            Err(Error::OutOfRangeInput { field: "wbgt_c", .. })
        ));
    }

    #[test]
    fn test_outdoor_and_indoor_weights() {
        let mut input = WbgtInput {
            natural_wet_bulb_c: 25.0,
            globe_c: 40.0,
            dry_bulb_c: 30.0,
            ..WbgtInput::default()
        };
        let outdoor = wbgt(&input).unwrap();
        assert_relative_eq!(outdoor.wbgt_c, 17.5 + 8.0 + 3.0, epsilon = 1e-9);

        input.outdoor = false;
        let indoor = wbgt(&input).unwrap();
        assert_relative_eq!(indoor.wbgt_c, 17.5 + 12.0, epsilon = 1e-9);
    }

    #[test]
    fn test_limit_lookup() {
        assert_eq!(
            screening_limit(CriteriaFamily::Tlv, WorkRest::Half, Workload::Heavy).unwrap(),
            29.0
        );
        assert_eq!(
            screening_limit(
                CriteriaFamily::ActionLimit,
                WorkRest::Quarter,
                Workload::VeryHeavy
            )
            .unwrap(),
            27.0
        );
    }

    #[test]
    fn test_undefined_combination() {
        let err =
            screening_limit(CriteriaFamily::Tlv, WorkRest::Continuous, Workload::Heavy)
                .unwrap_err();
        assert!(matches!(err, Error::UndefinedCombination(_)));

        let input = WbgtInput {
            workload: Workload::VeryHeavy,
            work_rest: WorkRest::ThreeQuarter,
            ..WbgtInput::default()
        };
        assert!(matches!(wbgt(&input), Err(Error::UndefinedCombination(_))));
    }

    #[test]
    fn test_exceeds_limit() {
        let input = WbgtInput {
            natural_wet_bulb_c: 27.0,
            globe_c: 40.0,
            dry_bulb_c: 33.0,
            ..WbgtInput::default()
        };
        let r = wbgt(&input).unwrap();
        // 18.9 + 8.0 + 3.3 = 30.2 against the 28.0 continuous moderate TLV
        assert!(r.exceeds_limit);
        assert!(r.margin_c < 0.0);
        assert_eq!(r.risk, HeatRisk::High);
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!("TLV".parse::<CriteriaFamily>().unwrap(), CriteriaFamily::Tlv);
        assert_eq!("very-heavy".parse::<Workload>().unwrap(), Workload::VeryHeavy);
        assert_eq!("50".parse::<WorkRest>().unwrap(), WorkRest::Half);
        assert!(matches!(
            "brisk".parse::<Workload>(),
            Err(Error::UnknownOption { kind: "workload", .. })
        ));
    }

    #[test]
    fn test_each_field_rejected() {
        for (field, value) in [
            ("natural_wet_bulb_c", 46.0),
            ("globe_c", 81.0),
            ("dry_bulb_c", -11.0),
        ] {
            let mut input = WbgtInput::default();
            input.set_param(field, value).unwrap();
            match wbgt(&input) {
                Err(Error::OutOfRangeInput { field: f, .. }) => assert_eq!(f, field),
                other => panic!("Expected OutOfRangeInput for {}, got {:?}", field, other),
            }
        }
    }
}
