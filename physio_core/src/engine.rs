//! Name-based dispatch over the built-in models.
//!
//! The CLI only knows model names and `name=value` overrides. This module
//! turns those into typed inputs, runs the point estimator, sampler, or
//! sweep, and hands back serializable results. Numeric overrides go through
//! `Parameters::set_param`; text selectors such as WBGT tables or exposure
//! agents go through `Parameters::set_option`.

use crate::acquisition::TargetAcquisition;
use crate::atmosphere::StandardAtmosphere;
use crate::aviation::{CosmicDose, GlocTolerance};
use crate::catalog::get_default_catalog;
use crate::circadian::CircadianPerformance;
use crate::exposure::MixedExposure;
use crate::heat::Wbgt;
use crate::hypoxia::{AlveolarGas, Spo2Altitude};
use crate::phs::PredictedHeatStrain;
use crate::sampler::simulate;
use crate::sweep::{sweep, Axis, SweepGrid, SweepLimits};
use crate::two_process::TwoProcess;
use crate::types::{unknown_param, Formula, Parameters};
use crate::utci::Utci;
use crate::{Error, Result};
use serde_json::Value;

/// Assignments applied over a model's default input
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    /// `name=value` scalars, applied in order
    pub values: Vec<(String, f64)>,
    /// `name=text` selectors, applied before the scalars
    pub options: Vec<(String, String)>,
}

impl Overrides {
    pub fn values(values: Vec<(String, f64)>) -> Self {
        Self {
            values,
            options: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len() + self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sampling request for [`simulate_model`]
#[derive(Clone, Debug)]
pub struct SimulateRequest<'a> {
    /// Stepped parameter; the model's time parameter when `None`
    pub parameter: Option<&'a str>,
    pub step: f64,
    pub horizon: f64,
    pub max_points: usize,
}

macro_rules! dispatch {
    ($name:expr, $func:ident ( $($arg:expr),* )) => {
        match $name {
            "atmosphere" => $func::<StandardAtmosphere>($($arg),*),
            "alveolar" => $func::<AlveolarGas>($($arg),*),
            "spo2" => $func::<Spo2Altitude>($($arg),*),
            "wbgt" => $func::<Wbgt>($($arg),*),
            "phs" => $func::<PredictedHeatStrain>($($arg),*),
            "utci" => $func::<Utci>($($arg),*),
            "circadian" => $func::<CircadianPerformance>($($arg),*),
            "two_process" => $func::<TwoProcess>($($arg),*),
            "exposure" => $func::<MixedExposure>($($arg),*),
            "target" => $func::<TargetAcquisition>($($arg),*),
            "cosmic" => $func::<CosmicDose>($($arg),*),
            "gloc" => $func::<GlocTolerance>($($arg),*),
            other => Err(Error::UnknownModel(other.to_string())),
        }
    };
}

/// Default input of `F` with `overrides` applied in order
pub fn input_with<F: Formula>(overrides: &Overrides) -> Result<F::Input> {
    let mut input = F::Input::default();
    for (name, value) in &overrides.options {
        if !F::Input::option_names().iter().any(|&o| o == name) {
            return Err(unknown_param(F::NAME, name));
        }
        input.set_option(name, value)?;
    }
    for (name, value) in &overrides.values {
        input.set_param(name, *value)?;
    }
    Ok(input)
}

fn default_input_as<F: Formula>() -> Result<Value> {
    Ok(serde_json::to_value(F::Input::default())?)
}

fn run_as<F: Formula>(overrides: &Overrides) -> Result<Value> {
    let input = input_with::<F>(overrides)?;
    let output = F::evaluate(&input)?;
    Ok(serde_json::to_value(output)?)
}

fn simulate_as<F: Formula>(
    overrides: &Overrides,
    parameter: &str,
    request: &SimulateRequest<'_>,
) -> Result<Value> {
    let input = input_with::<F>(overrides)?;
    let trajectory = simulate::<F>(
        &input,
        parameter,
        request.step,
        request.horizon,
        request.max_points,
    )?;
    Ok(serde_json::to_value(trajectory)?)
}

fn sweep_as<F: Formula>(
    overrides: &Overrides,
    x: Axis,
    y: Axis,
    metric: &str,
    limits: &SweepLimits,
) -> Result<SweepGrid> {
    let input = input_with::<F>(overrides)?;
    sweep::<F>(&input, x, y, metric, limits)
}

/// Default input record of a model, as JSON
pub fn default_input(model: &str) -> Result<Value> {
    dispatch!(model, default_input_as())
}

/// Evaluate one model at its default input plus `overrides`
pub fn run_model(model: &str, overrides: &Overrides) -> Result<Value> {
    tracing::debug!(model, overrides = overrides.len(), "running model");
    dispatch!(model, run_as(overrides))
}

/// Sample a model over one parameter
///
/// The result serializes as `{ model, parameter, points: [{ x, result }] }`.
pub fn simulate_model(
    model: &str,
    overrides: &Overrides,
    request: &SimulateRequest<'_>,
) -> Result<Value> {
    let info = get_default_catalog().get(model)?;
    let parameter = request.parameter.or(info.time_param).ok_or_else(|| {
        Error::InvalidSampling(format!(
            "model '{}' has no time parameter; choose one of: {}",
            model,
            info.params.join(", ")
        ))
    })?;
    dispatch!(model, simulate_as(overrides, parameter, request))
}

/// Sweep a model over two parameters, projecting `metric`
/// (the model's default metric when `None`)
///
/// Cells outside the model domain take the catalog's sentinel for `metric`
/// when it has one, otherwise `limits.sentinel`.
pub fn sweep_model(
    model: &str,
    overrides: &Overrides,
    x: Axis,
    y: Axis,
    metric: Option<&str>,
    limits: &SweepLimits,
) -> Result<SweepGrid> {
    let info = get_default_catalog().get(model)?;
    let metric = metric.unwrap_or(info.default_metric);
    let limits = SweepLimits {
        sentinel: info.sentinel(metric).unwrap_or(limits.sentinel),
        ..*limits
    };
    tracing::debug!(model, metric, sentinel = limits.sentinel, "sweep sentinel");
    dispatch!(model, sweep_as(overrides, x, y, metric, &limits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure::{mixed_exposure, AgentExposure};
    use crate::sampler::DEFAULT_MAX_POINTS;
    use crate::types::project_metric;

    fn request(step: f64, horizon: f64) -> SimulateRequest<'static> {
        SimulateRequest {
            parameter: None,
            step,
            horizon,
            max_points: DEFAULT_MAX_POINTS,
        }
    }

    #[test]
    fn test_every_catalog_model_runs_at_defaults() {
        for info in get_default_catalog().sorted() {
            let out = run_model(info.name, &Overrides::default())
                .unwrap_or_else(|e| panic!("{} failed at defaults: {}", info.name, e));
            project_metric(&out, info.default_metric)
                .unwrap_or_else(|e| panic!("{} default metric: {}", info.name, e));
            assert!(default_input(info.name).unwrap().is_object());
        }
    }

    #[test]
    fn test_every_model_is_deterministic() {
        for info in get_default_catalog().sorted() {
            let first = run_model(info.name, &Overrides::default()).unwrap();
            let second = run_model(info.name, &Overrides::default()).unwrap();
            assert_eq!(first, second, "{} differs between runs", info.name);

            // A one-cell sweep at the default point reproduces the direct result
            let param = info.params[0];
            let at = default_input(info.name).unwrap()[param].as_f64().unwrap();
            let grid = sweep_model(
                info.name,
                &Overrides::default(),
                Axis::new(param, vec![at]),
                Axis::new(param, vec![at]),
                None,
                &SweepLimits::default(),
            )
            .unwrap();
            let direct = project_metric(&first, info.default_metric).unwrap();
            assert_eq!(
                grid.cells[0][0].to_bits(),
                direct.to_bits(),
                "{} sweep cell differs from eval",
                info.name
            );
        }
    }

    #[test]
    fn test_overrides_apply_in_order() {
        let overrides = Overrides::values(vec![
            ("altitude_m".to_string(), 5000.0),
            ("altitude_m".to_string(), 0.0),
        ]);
        let out = run_model("atmosphere", &overrides).unwrap();
        let pressure = out["pressure_pa"].as_f64().unwrap();
        assert!((pressure - 101325.0).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_model_and_parameter() {
        assert!(matches!(
            run_model("hrv", &Overrides::default()),
            Err(Error::UnknownModel(_))
        ));
        let overrides = Overrides::values(vec![("depth_m".to_string(), 1.0)]);
        assert!(matches!(
            run_model("atmosphere", &overrides),
            Err(Error::UnknownParameter { model: "atmosphere", .. })
        ));
    }

    #[test]
    fn test_simulate_uses_time_parameter() {
        let overrides = Overrides::values(vec![
            ("phase_h".to_string(), 6.0),
            ("sleep_debt_h".to_string(), 2.5),
            ("k".to_string(), 1.5),
        ]);
        let traj = simulate_model("circadian", &overrides, &request(0.25, 48.0)).unwrap();
        let points = traj["points"].as_array().unwrap();
        assert_eq!(points.len(), 193);
        assert_eq!(traj["parameter"], "time_h");
        assert_eq!(points[192]["x"].as_f64(), Some(48.0));
    }

    #[test]
    fn test_simulate_needs_parameter_for_static_models() {
        assert!(matches!(
            simulate_model("utci", &Overrides::default(), &request(1.0, 10.0)),
            Err(Error::InvalidSampling(_))
        ));

        let explicit = SimulateRequest {
            parameter: Some("air_temp_c"),
            ..request(10.0, 40.0)
        };
        let traj = simulate_model("utci", &Overrides::default(), &explicit).unwrap();
        assert_eq!(traj["points"].as_array().unwrap().len(), 5);
    }

    fn hot_phs() -> Overrides {
        Overrides::values(vec![
            ("air_temp_c".to_string(), 40.0),
            ("radiant_temp_c".to_string(), 45.0),
            ("relative_humidity".to_string(), 40.0),
            ("metabolic_rate".to_string(), 250.0),
        ])
    }

    #[test]
    fn test_sweep_uses_metric_sentinel() {
        let allowable = sweep_model(
            "phs",
            &hot_phs(),
            Axis::new("duration_min", vec![10.0, 240.0, 480.0]),
            Axis::new("air_velocity", vec![0.3]),
            Some("allowable_exposure_min"),
            &SweepLimits::default(),
        )
        .unwrap();

        let mut at_10 = hot_phs();
        at_10.values.push(("duration_min".to_string(), 10.0));
        let direct = run_model("phs", &at_10).unwrap()["allowable_exposure_min"]
            .as_f64()
            .unwrap();

        // Past the model domain the budget reads as spent, never as the cap
        assert_eq!(allowable.cells[0], vec![direct, 0.0, 0.0]);
        assert!(direct > 0.0 && direct < 60.0);
        assert_eq!(allowable.replaced, 2);

        let core = sweep_model(
            "phs",
            &hot_phs(),
            Axis::new("duration_min", vec![10.0, 480.0]),
            Axis::new("air_velocity", vec![0.3]),
            None,
            &SweepLimits::default(),
        )
        .unwrap();
        assert_eq!(core.metric, "rectal_temp_c");
        assert_eq!(core.cells[0][1], 42.0);
    }

    #[test]
    fn test_sweep_falls_back_to_configured_sentinel() {
        let limits = SweepLimits {
            sentinel: -1.0,
            ..SweepLimits::default()
        };
        let grid = sweep_model(
            "utci",
            &Overrides::default(),
            Axis::new("air_temp_c", vec![60.0]),
            Axis::new("wind_speed", vec![1.0]),
            None,
            &limits,
        )
        .unwrap();
        assert_eq!(grid.cells[0][0], -1.0);
    }

    #[test]
    fn test_options_select_exposure_agents() {
        let overrides = Overrides {
            values: Vec::new(),
            options: vec![
                ("first".to_string(), "benzene".to_string()),
                ("second".to_string(), "1330-20-7".to_string()),
            ],
        };
        let grid = sweep_model(
            "exposure",
            &overrides,
            Axis::new("first_ppm", vec![0.0, 0.25]),
            Axis::new("second_ppm", vec![50.0]),
            None,
            &SweepLimits::default(),
        )
        .unwrap();

        let expected = |benzene: f64| {
            mixed_exposure(&[
                AgentExposure {
                    chemical: "benzene".to_string(),
                    concentration_ppm: benzene,
                },
                AgentExposure {
                    chemical: "xylene".to_string(),
                    concentration_ppm: 50.0,
                },
            ])
            .unwrap()
            .index
        };
        assert_eq!(grid.cells[0], vec![expected(0.0), expected(0.25)]);

        let defaults = run_model("exposure", &Overrides::default()).unwrap();
        assert_ne!(defaults["index"].as_f64(), Some(expected(0.0)));
    }

    #[test]
    fn test_options_select_tables() {
        let overrides = Overrides {
            values: Vec::new(),
            options: vec![
                ("workload".to_string(), "heavy".to_string()),
                ("work_rest".to_string(), "quarter".to_string()),
            ],
        };
        let tuned = run_model("wbgt", &overrides).unwrap();
        let base = run_model("wbgt", &Overrides::default()).unwrap();
        assert_ne!(tuned["limit_c"], base["limit_c"]);

        let target = Overrides {
            values: Vec::new(),
            options: vec![("criteria".to_string(), "ttp".to_string())],
        };
        assert_eq!(
            run_model("target", &target).unwrap()["n50"].as_f64(),
            Some(3.0)
        );
    }

    #[test]
    fn test_bad_options_rejected() {
        let not_an_option = Overrides {
            values: Vec::new(),
            options: vec![("fio2".to_string(), "high".to_string())],
        };
        assert!(matches!(
            run_model("alveolar", &not_an_option),
            Err(Error::UnknownParameter { model: "alveolar", .. })
        ));

        let bad_value = Overrides {
            values: Vec::new(),
            options: vec![("workload".to_string(), "extreme".to_string())],
        };
        assert!(matches!(
            run_model("wbgt", &bad_value),
            Err(Error::UnknownOption { kind: "workload", .. })
        ));

        let bad_agent = Overrides {
            values: Vec::new(),
            options: vec![("first".to_string(), "kryptonite".to_string())],
        };
        assert!(matches!(
            run_model("exposure", &bad_agent),
            Err(Error::UnknownChemical(_))
        ));
    }

    #[test]
    fn test_sweep_default_metric() {
        let grid = sweep_model(
            "cosmic",
            &Overrides::default(),
            Axis::new("altitude_ft", vec![0.0, 30_000.0, 40_000.0]),
            Axis::new("latitude_deg", vec![0.0, 60.0]),
            None,
            &SweepLimits::default(),
        )
        .unwrap();
        assert_eq!(grid.metric, "dose_usv");
        assert_eq!(grid.cells.len(), 2);
        assert!(grid.cells[1][2] > grid.cells[0][2]);
        assert!(grid.cells[0][2] > grid.cells[0][0]);
    }
}
