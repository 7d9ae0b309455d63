use clap::{Args, Parser, Subcommand};
use physio_core::acquisition::{self, AcquisitionInput, CycleCriteria, DiscriminationLevel};
use physio_core::atmosphere::{self, AtmosphereInput};
use physio_core::aviation::{self, CosmicInput, GlocInput};
use physio_core::circadian::{self, CircadianInput};
use physio_core::exposure::{self, AgentExposure, ExposureSample};
use physio_core::heat::{self, CriteriaFamily, WbgtInput, WorkRest, Workload};
use physio_core::hypoxia::{self, AlveolarInput, Spo2Input};
use physio_core::phs::{self, PhsInput};
use physio_core::two_process::{self, TwoProcessInput};
use physio_core::utci::{self, UtciInput};
use physio_core::*;
use serde_json::{json, Value};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "physio")]
#[command(about = "Human-factors and physiology calculators", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (table, json, csv)
    #[arg(long, global = true)]
    format: Option<OutputFormat>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List models, or show one model's parameters and defaults
    Models {
        name: Option<String>,
    },

    /// List the chemical exposure table
    Chemicals,

    /// ISO standard atmosphere at an altitude
    Atmosphere {
        #[arg(long, allow_negative_numbers = true)]
        altitude_m: Option<f64>,
    },

    /// Alveolar oxygen from the alveolar gas equation
    Alveolar {
        #[arg(long)]
        altitude_m: Option<f64>,
        #[arg(long)]
        fio2: Option<f64>,
        #[arg(long)]
        paco2_mmhg: Option<f64>,
        #[arg(long)]
        rq: Option<f64>,
    },

    /// Expected SpO2 and time of useful consciousness at altitude
    Spo2 {
        #[arg(long)]
        altitude_ft: Option<f64>,
    },

    /// WBGT index and ACGIH screening limit
    Wbgt(WbgtArgs),

    /// Predicted heat strain over an exposure
    Phs(PhsArgs),

    /// Universal thermal climate index
    Utci {
        #[arg(long, allow_negative_numbers = true)]
        air_temp_c: Option<f64>,
        #[arg(long)]
        wind_speed: Option<f64>,
    },

    /// Circadian performance (Mitler model)
    Circadian {
        #[arg(long)]
        time_h: Option<f64>,
        #[arg(long)]
        phase_h: Option<f64>,
        #[arg(long)]
        sleep_debt_h: Option<f64>,
        #[arg(long)]
        k: Option<f64>,
    },

    /// Two-process sleep regulation
    TwoProcess {
        #[arg(long)]
        time_h: Option<f64>,
        #[arg(long)]
        wake_duration_h: Option<f64>,
        #[arg(long)]
        initial_pressure: Option<f64>,
        #[arg(long)]
        acrophase_h: Option<f64>,
        #[arg(long)]
        amplitude: Option<f64>,
    },

    /// Mixed chemical exposure index and time-weighted average
    Exposure {
        /// Agent concentration as NAME=PPM (repeatable)
        #[arg(long = "agent", value_parser = parse_assignment, required_unless_present = "sample")]
        agents: Vec<(String, f64)>,

        /// Exposure sample as PPM:HOURS (repeatable)
        #[arg(long = "sample", value_parser = parse_sample)]
        sample: Vec<ExposureSample>,
    },

    /// Target acquisition probability (Johnson criteria)
    Target {
        #[arg(long)]
        target_size_m: Option<f64>,
        #[arg(long)]
        range_m: Option<f64>,
        #[arg(long)]
        resolution: Option<f64>,
        /// detection, orientation, recognition, identification
        #[arg(long)]
        level: Option<DiscriminationLevel>,
        /// johnson or ttp
        #[arg(long)]
        criteria: Option<CycleCriteria>,
    },

    /// Cosmic radiation dose for a flight
    Cosmic {
        #[arg(long)]
        altitude_ft: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        latitude_deg: Option<f64>,
        #[arg(long)]
        flight_hours: Option<f64>,
    },

    /// +Gz tolerance and G-LOC margin
    Gloc {
        #[arg(long)]
        applied_gz: Option<f64>,
        #[arg(long)]
        onset_rate: Option<f64>,
        #[arg(long)]
        straining: bool,
        #[arg(long)]
        anti_g_suit: bool,
    },

    /// Evaluate any model by name with NAME=VALUE overrides
    Eval {
        model: String,
        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// Sample a model over time (or another parameter)
    Simulate {
        model: String,

        /// Parameter to step (defaults to the model's time parameter)
        #[arg(long)]
        param: Option<String>,

        #[arg(long)]
        step: f64,

        #[arg(long)]
        horizon: f64,

        /// Output field shown in table format
        #[arg(long)]
        metric: Option<String>,

        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// Sweep a model over two parameters
    Sweep {
        model: String,

        /// X axis as NAME=START:END:COUNT or NAME=V1,V2,...
        #[arg(long, value_parser = parse_axis, allow_hyphen_values = true)]
        x: Axis,

        /// Y axis as NAME=START:END:COUNT or NAME=V1,V2,...
        #[arg(long, value_parser = parse_axis, allow_hyphen_values = true)]
        y: Axis,

        /// Output field projected into each cell
        #[arg(long)]
        metric: Option<String>,

        #[command(flatten)]
        overrides: OverrideArgs,
    },
}

#[derive(Args)]
struct WbgtArgs {
    #[arg(long, allow_negative_numbers = true)]
    natural_wet_bulb_c: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    globe_c: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    dry_bulb_c: Option<f64>,
    /// No solar load
    #[arg(long)]
    indoor: bool,
    /// tlv or action
    #[arg(long)]
    criteria: Option<CriteriaFamily>,
    /// continuous, three_quarter, half, quarter
    #[arg(long)]
    work_rest: Option<WorkRest>,
    /// light, moderate, heavy, very_heavy
    #[arg(long)]
    workload: Option<Workload>,
}

#[derive(Args)]
struct PhsArgs {
    #[arg(long)]
    air_temp_c: Option<f64>,
    #[arg(long)]
    radiant_temp_c: Option<f64>,
    #[arg(long)]
    relative_humidity: Option<f64>,
    #[arg(long)]
    air_velocity: Option<f64>,
    #[arg(long)]
    metabolic_rate: Option<f64>,
    #[arg(long)]
    clothing_clo: Option<f64>,
    #[arg(long)]
    duration_min: Option<f64>,
    #[arg(long)]
    body_mass_kg: Option<f64>,
    #[arg(long)]
    height_m: Option<f64>,
    #[arg(long)]
    unacclimatized: bool,
    /// No free access to drinking water
    #[arg(long)]
    no_drinking: bool,
}

#[derive(Args)]
struct OverrideArgs {
    /// Parameter override as NAME=VALUE (repeatable)
    #[arg(long = "set", value_parser = parse_assignment, allow_hyphen_values = true)]
    set: Vec<(String, f64)>,

    /// Text option as NAME=VALUE, e.g. workload=heavy or first=benzene (repeatable)
    #[arg(long = "opt", value_parser = parse_option)]
    opt: Vec<(String, String)>,
}

impl From<OverrideArgs> for Overrides {
    fn from(args: OverrideArgs) -> Self {
        Overrides {
            values: args.set,
            options: args.opt,
        }
    }
}

fn parse_assignment(s: &str) -> std::result::Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    Ok((name.trim().to_string(), value))
}

fn parse_option(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn parse_sample(s: &str) -> std::result::Result<ExposureSample, String> {
    let (ppm, hours) = s
        .split_once(':')
        .ok_or_else(|| format!("expected PPM:HOURS, got '{}'", s))?;
    let number = |text: &str| {
        text.trim()
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", text))
    };
    Ok(ExposureSample {
        concentration_ppm: number(ppm)?,
        hours: number(hours)?,
    })
}

fn parse_axis(s: &str) -> std::result::Result<Axis, String> {
    let (name, values) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUES, got '{}'", s))?;
    let number = |text: &str| {
        text.trim()
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", text))
    };

    let parts: Vec<&str> = values.split(':').collect();
    match parts.as_slice() {
        [start, end, count] => {
            let count: usize = count
                .trim()
                .parse()
                .map_err(|_| format!("'{}' is not a count", count))?;
            Ok(Axis::linspace(name.trim(), number(start)?, number(end)?, count))
        }
        [list] => {
            let values = list
                .split(',')
                .map(number)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(Axis::new(name.trim(), values))
        }
        _ => Err(format!("expected START:END:COUNT or a list, got '{}'", values)),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    physio_core::logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let format = cli.format.unwrap_or(config.output.format);
    tracing::debug!(%format, max_points = config.sampler.max_points, "resolved settings");

    match cli.command {
        Commands::Models { name } => cmd_models(name.as_deref(), format),
        Commands::Chemicals => cmd_chemicals(format),
        Commands::Atmosphere { altitude_m } => {
            let mut input = AtmosphereInput::default();
            set(&mut input.altitude_m, altitude_m);
            emit(&atmosphere::standard_atmosphere(&input)?, format)
        }
        Commands::Alveolar {
            altitude_m,
            fio2,
            paco2_mmhg,
            rq,
        } => {
            let mut input = AlveolarInput::default();
            set(&mut input.altitude_m, altitude_m);
            set(&mut input.fio2, fio2);
            set(&mut input.paco2_mmhg, paco2_mmhg);
            set(&mut input.rq, rq);
            emit(&hypoxia::alveolar_gas(&input)?, format)
        }
        Commands::Spo2 { altitude_ft } => {
            let mut input = Spo2Input::default();
            set(&mut input.altitude_ft, altitude_ft);
            emit(&hypoxia::spo2_at_altitude(&input)?, format)
        }
        Commands::Wbgt(args) => cmd_wbgt(args, format),
        Commands::Phs(args) => cmd_phs(args, format),
        Commands::Utci {
            air_temp_c,
            wind_speed,
        } => {
            let mut input = UtciInput::default();
            set(&mut input.air_temp_c, air_temp_c);
            set(&mut input.wind_speed, wind_speed);
            emit(&utci::utci(&input)?, format)
        }
        Commands::Circadian {
            time_h,
            phase_h,
            sleep_debt_h,
            k,
        } => {
            let mut input = CircadianInput::default();
            set(&mut input.time_h, time_h);
            set(&mut input.phase_h, phase_h);
            set(&mut input.sleep_debt_h, sleep_debt_h);
            set(&mut input.k, k);
            emit(&circadian::circadian_performance(&input)?, format)
        }
        Commands::TwoProcess {
            time_h,
            wake_duration_h,
            initial_pressure,
            acrophase_h,
            amplitude,
        } => {
            let mut input = TwoProcessInput::default();
            set(&mut input.time_h, time_h);
            set(&mut input.wake_duration_h, wake_duration_h);
            set(&mut input.initial_pressure, initial_pressure);
            set(&mut input.acrophase_h, acrophase_h);
            set(&mut input.amplitude, amplitude);
            emit(&two_process::two_process(&input)?, format)
        }
        Commands::Exposure { agents, sample } => cmd_exposure(agents, sample, format),
        Commands::Target {
            target_size_m,
            range_m,
            resolution,
            level,
            criteria,
        } => {
            let mut input = AcquisitionInput::default();
            set(&mut input.target_size_m, target_size_m);
            set(&mut input.range_m, range_m);
            set(&mut input.resolution_cyc_per_mrad, resolution);
            set(&mut input.level, level);
            set(&mut input.criteria, criteria);
            emit(&acquisition::target_acquisition(&input)?, format)
        }
        Commands::Cosmic {
            altitude_ft,
            latitude_deg,
            flight_hours,
        } => {
            let mut input = CosmicInput::default();
            set(&mut input.altitude_ft, altitude_ft);
            set(&mut input.latitude_deg, latitude_deg);
            set(&mut input.flight_hours, flight_hours);
            emit(&aviation::cosmic_dose(&input)?, format)
        }
        Commands::Gloc {
            applied_gz,
            onset_rate,
            straining,
            anti_g_suit,
        } => {
            let mut input = GlocInput {
                straining,
                anti_g_suit,
                ..GlocInput::default()
            };
            set(&mut input.applied_gz, applied_gz);
            set(&mut input.onset_rate_g_s, onset_rate);
            emit(&aviation::gloc_tolerance(&input)?, format)
        }
        Commands::Eval { model, overrides } => {
            emit(&run_model(&model, &Overrides::from(overrides))?, format)
        }
        Commands::Simulate {
            model,
            param,
            step,
            horizon,
            metric,
            overrides,
        } => {
            let request = SimulateRequest {
                parameter: param.as_deref(),
                step,
                horizon,
                max_points: config.sampler.max_points,
            };
            let trajectory = simulate_model(&model, &Overrides::from(overrides), &request)?;
            cmd_show_trajectory(&model, &trajectory, metric.as_deref(), format)
        }
        Commands::Sweep {
            model,
            x,
            y,
            metric,
            overrides,
        } => {
            let grid = sweep_model(
                &model,
                &Overrides::from(overrides),
                x,
                y,
                metric.as_deref(),
                &config.sweep_limits(),
            )?;
            cmd_show_sweep(&grid, format)
        }
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn cmd_wbgt(args: WbgtArgs, format: OutputFormat) -> Result<()> {
    let mut input = WbgtInput::default();
    set(&mut input.natural_wet_bulb_c, args.natural_wet_bulb_c);
    set(&mut input.globe_c, args.globe_c);
    set(&mut input.dry_bulb_c, args.dry_bulb_c);
    set(&mut input.criteria, args.criteria);
    set(&mut input.work_rest, args.work_rest);
    set(&mut input.workload, args.workload);
    if args.indoor {
        input.outdoor = false;
    }
    emit(&heat::wbgt(&input)?, format)
}

fn cmd_phs(args: PhsArgs, format: OutputFormat) -> Result<()> {
    let mut input = PhsInput::default();
    set(&mut input.air_temp_c, args.air_temp_c);
    set(&mut input.radiant_temp_c, args.radiant_temp_c);
    set(&mut input.relative_humidity, args.relative_humidity);
    set(&mut input.air_velocity, args.air_velocity);
    set(&mut input.metabolic_rate, args.metabolic_rate);
    set(&mut input.clothing_clo, args.clothing_clo);
    set(&mut input.duration_min, args.duration_min);
    set(&mut input.body_mass_kg, args.body_mass_kg);
    set(&mut input.height_m, args.height_m);
    if args.unacclimatized {
        input.acclimatized = false;
    }
    if args.no_drinking {
        input.drinking = false;
    }
    emit(&phs::predicted_heat_strain(&input)?, format)
}

fn cmd_exposure(
    agents: Vec<(String, f64)>,
    samples: Vec<ExposureSample>,
    format: OutputFormat,
) -> Result<()> {
    let mut report = serde_json::Map::new();

    if !agents.is_empty() {
        let agents: Vec<AgentExposure> = agents
            .into_iter()
            .map(|(chemical, concentration_ppm)| AgentExposure {
                chemical,
                concentration_ppm,
            })
            .collect();
        let mixed = exposure::mixed_exposure(&agents)?;
        report.insert("mixed".into(), serde_json::to_value(mixed)?);
    }
    if !samples.is_empty() {
        let twa = exposure::time_weighted_average(&samples)?;
        report.insert("twa_ppm".into(), json!(twa));
    }

    emit(&Value::Object(report), format)
}

fn cmd_models(name: Option<&str>, format: OutputFormat) -> Result<()> {
    let catalog = get_default_catalog();

    match name {
        Some(name) => {
            let info = catalog.get(name)?;
            let detail = json!({
                "info": info,
                "defaults": engine::default_input(name)?,
            });
            emit(&detail, format)
        }
        None => {
            if format != OutputFormat::Table {
                let models = serde_json::to_value(catalog.sorted())?;
                return emit_rows(models.as_array().map(Vec::as_slice).unwrap_or(&[]), format);
            }
            println!("{:<12} {:<10} {:<34} PARAMETERS", "MODEL", "FAMILY", "TITLE");
            for info in catalog.sorted() {
                let mut params = info.params.join(", ");
                if !info.options.is_empty() {
                    params.push_str(&format!(" (--opt {})", info.options.join(", ")));
                }
                println!(
                    "{:<12} {:<10} {:<34} {}",
                    info.name,
                    format!("{:?}", info.family).to_lowercase(),
                    info.title,
                    params
                );
            }
            Ok(())
        }
    }
}

fn cmd_chemicals(format: OutputFormat) -> Result<()> {
    let chemicals = serde_json::to_value(exposure::chemicals())?;
    let rows = chemicals.as_array().map(Vec::as_slice).unwrap_or(&[]);
    if format != OutputFormat::Table {
        return emit_rows(rows, format);
    }

    println!(
        "{:<18} {:<24} {:<10} {:>7} {:>8} {:>8}",
        "KEY", "NAME", "CAS", "MW", "TWA ppm", "STEL ppm"
    );
    for chem in exposure::chemicals() {
        let stel = chem
            .stel_ppm
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<18} {:<24} {:<10} {:>7.2} {:>8} {:>8}",
            chem.key, chem.name, chem.cas, chem.molecular_weight, chem.tlv_twa_ppm, stel
        );
    }
    Ok(())
}

fn cmd_show_trajectory(
    model: &str,
    trajectory: &Value,
    metric: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(trajectory),
        OutputFormat::Csv => export::write_trajectory_csv(trajectory, io::stdout().lock()),
        OutputFormat::Table => {
            let metric = match metric {
                Some(m) => m,
                None => get_default_catalog().get(model)?.default_metric,
            };
            let parameter = trajectory["parameter"].as_str().unwrap_or("x");
            let points = trajectory["points"].as_array().map(Vec::as_slice).unwrap_or(&[]);

            let mut out = io::stdout().lock();
            writeln!(out, "{:>12} {:>14}", parameter, metric)?;
            for point in points {
                let x = point["x"].as_f64().unwrap_or(f64::NAN);
                let y = project_metric(&point["result"], metric)?;
                writeln!(out, "{:>12.4} {:>14.4}", x, y)?;
            }
            writeln!(out, "({} points)", points.len())?;
            Ok(())
        }
    }
}

fn cmd_show_sweep(grid: &SweepGrid, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&serde_json::to_value(grid)?),
        OutputFormat::Csv => export::write_sweep_csv(grid, io::stdout().lock()),
        OutputFormat::Table => {
            let mut out = io::stdout().lock();
            writeln!(
                out,
                "{} {} (rows: {}, columns: {})",
                grid.model, grid.metric, grid.y.name, grid.x.name
            )?;
            write!(out, "{:>10}", "")?;
            for x in &grid.x.values {
                write!(out, " {:>10.3}", x)?;
            }
            writeln!(out)?;
            for (y, row) in grid.y.values.iter().zip(&grid.cells) {
                write!(out, "{:>10.3}", y)?;
                for cell in row {
                    write!(out, " {:>10.3}", cell)?;
                }
                writeln!(out)?;
            }
            if grid.replaced > 0 {
                writeln!(out, "({} cells outside the model domain)", grid.replaced)?;
            }
            Ok(())
        }
    }
}

/// Print a single result record
fn emit<T: serde::Serialize>(result: &T, format: OutputFormat) -> Result<()> {
    let value = serde_json::to_value(result)?;
    match format {
        OutputFormat::Json => print_json(&value),
        OutputFormat::Csv => emit_rows(std::slice::from_ref(&value), format),
        OutputFormat::Table => {
            display_record(&value);
            Ok(())
        }
    }
}

fn emit_rows(rows: &[Value], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => export::write_rows_csv(rows, io::stdout().lock()),
        _ => print_json(&Value::Array(rows.to_vec())),
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn display_record(value: &Value) {
    let fields = export::flatten(value);
    let width = fields.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, text) in fields {
        let shown = match text.parse::<f64>() {
            Ok(n) if n.fract() != 0.0 => format!("{:.4}", n),
            _ => text,
        };
        println!("  {:<width$}  {}", name, shown, width = width);
    }
}
