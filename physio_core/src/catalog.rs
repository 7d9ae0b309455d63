//! Catalog of the built-in models.
//!
//! Every entry is derived from its `Formula` implementation, so the name and
//! parameter list cannot drift from the code that evaluates it.

use crate::acquisition::TargetAcquisition;
use crate::atmosphere::StandardAtmosphere;
use crate::aviation::{CosmicDose, GlocTolerance};
use crate::circadian::CircadianPerformance;
use crate::exposure::MixedExposure;
use crate::heat::Wbgt;
use crate::hypoxia::{AlveolarGas, Spo2Altitude};
use crate::phs::{PredictedHeatStrain, TRE_MODEL_MAX};
use crate::two_process::TwoProcess;
use crate::types::{Formula, Parameters};
use crate::utci::Utci;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    Atmosphere,
    Hypoxia,
    Thermal,
    Fatigue,
    Chemical,
    Vision,
    Aviation,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 7] = [
        ModelFamily::Atmosphere,
        ModelFamily::Hypoxia,
        ModelFamily::Thermal,
        ModelFamily::Fatigue,
        ModelFamily::Chemical,
        ModelFamily::Vision,
        ModelFamily::Aviation,
    ];
}

/// Static description of one model
#[derive(Clone, Debug, Serialize)]
pub struct ModelInfo {
    pub name: &'static str,
    pub title: &'static str,
    pub family: ModelFamily,
    pub params: &'static [&'static str],
    /// Text-valued selectors (table keys, chemicals)
    pub options: &'static [&'static str],
    /// Output field plotted by default
    pub default_metric: &'static str,
    /// Parameter that plays the role of elapsed time, if any
    pub time_param: Option<&'static str>,
    /// Value a sweep writes for cells outside the model domain, per metric.
    /// Metrics not listed use the configured sweep sentinel.
    pub sentinels: &'static [(&'static str, f64)],
}

impl ModelInfo {
    fn with_sentinels(mut self, sentinels: &'static [(&'static str, f64)]) -> Self {
        self.sentinels = sentinels;
        self
    }

    /// Documented out-of-domain value for `metric`, if the model has one
    pub fn sentinel(&self, metric: &str) -> Option<f64> {
        self.sentinels
            .iter()
            .find(|(name, _)| *name == metric)
            .map(|&(_, value)| value)
    }
}

fn info<F: Formula>(
    title: &'static str,
    family: ModelFamily,
    default_metric: &'static str,
    time_param: Option<&'static str>,
) -> ModelInfo {
    ModelInfo {
        name: F::NAME,
        title,
        family,
        params: F::Input::param_names(),
        options: F::Input::option_names(),
        default_metric,
        time_param,
        sentinels: &[],
    }
}

pub struct Catalog {
    pub models: HashMap<&'static str, ModelInfo>,
}

/// Cached default catalog - built once and reused
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

fn build_default_catalog() -> Catalog {
    use ModelFamily::*;

    let entries = [
        info::<StandardAtmosphere>("ISO standard atmosphere", Atmosphere, "pressure_pa", None),
        info::<AlveolarGas>("Alveolar gas equation", Hypoxia, "alveolar_po2_mmhg", None),
        info::<Spo2Altitude>("SpO2 at altitude", Hypoxia, "spo2_pct", None),
        info::<Wbgt>("WBGT heat stress", Thermal, "wbgt_c", None),
        info::<PredictedHeatStrain>(
            "Predicted heat strain",
            Thermal,
            "rectal_temp_c",
            Some("duration_min"),
        )
        // Past the core limit the exposure budget is spent
        .with_sentinels(&[
            ("rectal_temp_c", TRE_MODEL_MAX),
            ("allowable_exposure_min", 0.0),
            ("dlim_core_min", 0.0),
        ]),
        info::<Utci>("Universal thermal climate index", Thermal, "utci_c", None),
        info::<CircadianPerformance>(
            "Circadian performance",
            Fatigue,
            "effectiveness_pct",
            Some("time_h"),
        ),
        info::<TwoProcess>("Two-process sleep regulation", Fatigue, "alertness", Some("time_h")),
        info::<MixedExposure>("Mixed chemical exposure", Chemical, "index", None),
        info::<TargetAcquisition>("Target acquisition", Vision, "probability", None),
        info::<CosmicDose>("Cosmic radiation dose", Aviation, "dose_usv", Some("flight_hours")),
        info::<GlocTolerance>("G-LOC tolerance", Aviation, "margin_gz", None),
    ];

    Catalog {
        models: entries.into_iter().map(|m| (m.name, m)).collect(),
    }
}

impl Catalog {
    pub fn get(&self, name: &str) -> Result<&ModelInfo> {
        self.models
            .get(name)
            .ok_or_else(|| Error::UnknownModel(name.to_string()))
    }

    /// Models ordered by family, then name
    pub fn sorted(&self) -> Vec<&ModelInfo> {
        let mut models: Vec<_> = self.models.values().collect();
        models.sort_by_key(|m| {
            let family = ModelFamily::ALL
                .iter()
                .position(|f| *f == m.family)
                .unwrap_or(usize::MAX);
            (family, m.name)
        });
        models
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (key, model) in &self.models {
            if key != &model.name {
                errors.push(format!(
                    "Model key '{}' doesn't match model.name '{}'",
                    key, model.name
                ));
            }
            if model.params.is_empty() {
                errors.push(format!("Model '{}' has no parameters", key));
            }
            if model.default_metric.is_empty() {
                errors.push(format!("Model '{}' has no default metric", key));
            }
            for (metric, value) in model.sentinels {
                if !value.is_finite() {
                    errors.push(format!(
                        "Model '{}' sentinel for '{}' is not finite",
                        key, metric
                    ));
                }
            }
            if let Some(time) = model.time_param {
                if !model.params.contains(&time) {
                    errors.push(format!(
                        "Model '{}' time parameter '{}' is not a parameter",
                        key, time
                    ));
                }
            }
        }

        for family in ModelFamily::ALL {
            if !self.models.values().any(|m| m.family == family) {
                errors.push(format!("Catalog has no {:?} models", family));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        let catalog = get_default_catalog();
        assert_eq!(catalog.models.len(), 12);
        assert!(catalog.validate().is_empty(), "{:?}", catalog.validate());
    }

    #[test]
    fn test_lookup() {
        let catalog = get_default_catalog();
        assert_eq!(catalog.get("phs").unwrap().time_param, Some("duration_min"));
        assert!(matches!(
            catalog.get("hrv"),
            Err(Error::UnknownModel(name)) if name == "hrv"
        ));
    }

    #[test]
    fn test_sorted_groups_families() {
        let names: Vec<_> = get_default_catalog()
            .sorted()
            .iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names.first(), Some(&"atmosphere"));
        assert_eq!(names.last(), Some(&"gloc"));
        let circadian = names.iter().position(|n| *n == "circadian").unwrap();
        let wbgt = names.iter().position(|n| *n == "wbgt").unwrap();
        assert!(wbgt < circadian);
    }

    #[test]
    fn test_sentinels_per_metric() {
        let phs = get_default_catalog().get("phs").unwrap();
        assert_eq!(phs.sentinel("rectal_temp_c"), Some(42.0));
        assert_eq!(phs.sentinel("allowable_exposure_min"), Some(0.0));
        assert_eq!(phs.sentinel("sweat_rate_g_h"), None);
        assert_eq!(get_default_catalog().get("utci").unwrap().sentinel("utci_c"), None);
    }

    #[test]
    fn test_options_listed() {
        let catalog = get_default_catalog();
        assert_eq!(catalog.get("exposure").unwrap().options, &["first", "second"]);
        assert_eq!(
            catalog.get("wbgt").unwrap().options,
            &["criteria", "work_rest", "workload"]
        );
        assert!(catalog.get("utci").unwrap().options.is_empty());
    }

    #[test]
    fn test_validate_reports_bad_time_param() {
        let mut catalog = Catalog {
            models: get_default_catalog().models.clone(),
        };
        if let Some(model) = catalog.models.get_mut("utci") {
            model.time_param = Some("minutes");
        }
        let errors = catalog.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("minutes"));
    }
}
