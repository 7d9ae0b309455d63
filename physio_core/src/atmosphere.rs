//! Layered standard atmosphere (ISO 2533:1975 / US Standard Atmosphere 1976).
//!
//! Each layer has a base altitude, base temperature, lapse rate, and base
//! pressure. Gradient layers use the power law, isothermal layers the
//! exponential form of the hydrostatic equation.

use crate::types::{unknown_param, Formula, Parameters, ValidRange};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Standard gravity (m/s²)
pub const G0: f64 = 9.80665;
/// Molar mass of dry air (kg/mol)
pub const MOLAR_MASS_AIR: f64 = 0.0289644;
/// Universal gas constant (J/(mol·K))
pub const GAS_CONSTANT: f64 = 8.3144598;
/// Specific gas constant of dry air (J/(kg·K))
pub const R_AIR: f64 = 287.05287;
/// Ratio of specific heats for air
pub const GAMMA_AIR: f64 = 1.4;
/// Sea-level reference pressure (Pa)
pub const SEA_LEVEL_PRESSURE_PA: f64 = 101325.0;
/// Pascals per millimetre of mercury
pub const PA_PER_MMHG: f64 = 133.322387415;

const KELVIN_OFFSET: f64 = 273.15;

pub const ALTITUDE_RANGE: ValidRange = ValidRange::new(-610.0, 84852.0);

/// Named atmospheric layer
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AtmosphereLayer {
    Troposphere,
    Tropopause,
    LowerStratosphere,
    UpperStratosphere,
    Stratopause,
    LowerMesosphere,
    UpperMesosphere,
}

struct LayerBase {
    layer: AtmosphereLayer,
    altitude_m: f64,
    temperature_k: f64,
    lapse_k_per_m: f64,
    pressure_pa: f64,
}

const LAYERS: [LayerBase; 7] = [
    LayerBase {
        layer: AtmosphereLayer::Troposphere,
        altitude_m: 0.0,
        temperature_k: 288.15,
        lapse_k_per_m: -0.0065,
        pressure_pa: 101325.0,
    },
    LayerBase {
        layer: AtmosphereLayer::Tropopause,
        altitude_m: 11000.0,
        temperature_k: 216.65,
        lapse_k_per_m: 0.0,
        pressure_pa: 22632.06,
    },
    LayerBase {
        layer: AtmosphereLayer::LowerStratosphere,
        altitude_m: 20000.0,
        temperature_k: 216.65,
        lapse_k_per_m: 0.001,
        pressure_pa: 5474.889,
    },
    LayerBase {
        layer: AtmosphereLayer::UpperStratosphere,
        altitude_m: 32000.0,
        temperature_k: 228.65,
        lapse_k_per_m: 0.0028,
        pressure_pa: 868.0187,
    },
    LayerBase {
        layer: AtmosphereLayer::Stratopause,
        altitude_m: 47000.0,
        temperature_k: 270.65,
        lapse_k_per_m: 0.0,
        pressure_pa: 110.9063,
    },
    LayerBase {
        layer: AtmosphereLayer::LowerMesosphere,
        altitude_m: 51000.0,
        temperature_k: 270.65,
        lapse_k_per_m: -0.0028,
        pressure_pa: 66.93887,
    },
    LayerBase {
        layer: AtmosphereLayer::UpperMesosphere,
        altitude_m: 71000.0,
        temperature_k: 214.65,
        lapse_k_per_m: -0.002,
        pressure_pa: 3.956420,
    },
];

/// Standard atmosphere input
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AtmosphereInput {
    /// Geopotential altitude (m)
    pub altitude_m: f64,
}

impl Default for AtmosphereInput {
    fn default() -> Self {
        Self { altitude_m: 0.0 }
    }
}

impl Parameters for AtmosphereInput {
    fn param_names() -> &'static [&'static str] {
        &["altitude_m"]
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "altitude_m" => self.altitude_m = value,
            _ => return Err(unknown_param(StandardAtmosphere::NAME, name)),
        }
        Ok(())
    }
}

/// Atmospheric state at one altitude
#[derive(Clone, Debug, Serialize)]
pub struct AtmosphereResult {
    pub altitude_m: f64,
    pub layer: AtmosphereLayer,
    pub temperature_k: f64,
    pub temperature_c: f64,
    pub pressure_pa: f64,
    pub pressure_mmhg: f64,
    pub pressure_ratio: f64,
    pub density_kg_m3: f64,
    pub speed_of_sound_m_s: f64,
}

/// ISO 2533 standard atmosphere
pub struct StandardAtmosphere;

impl Formula for StandardAtmosphere {
    type Input = AtmosphereInput;
    type Output = AtmosphereResult;
    const NAME: &'static str = "atmosphere";

    fn evaluate(input: &AtmosphereInput) -> Result<AtmosphereResult> {
        standard_atmosphere(input)
    }
}

fn layer_for(altitude_m: f64) -> &'static LayerBase {
    LAYERS
        .iter()
        .rev()
        .find(|layer| altitude_m >= layer.altitude_m)
        .unwrap_or(&LAYERS[0])
}

/// Temperature (K) and pressure (Pa) at a validated altitude
fn temperature_and_pressure(altitude_m: f64) -> (AtmosphereLayer, f64, f64) {
    let base = layer_for(altitude_m);
    let dh = altitude_m - base.altitude_m;

    if base.lapse_k_per_m == 0.0 {
        let exponent = -G0 * MOLAR_MASS_AIR * dh / (GAS_CONSTANT * base.temperature_k);
        (base.layer, base.temperature_k, base.pressure_pa * exponent.exp())
    } else {
        let temperature = base.temperature_k + base.lapse_k_per_m * dh;
        let exponent = G0 * MOLAR_MASS_AIR / (GAS_CONSTANT * base.lapse_k_per_m);
        let pressure = base.pressure_pa * (base.temperature_k / temperature).powf(exponent);
        (base.layer, temperature, pressure)
    }
}

/// Barometric pressure (Pa) at an altitude, for other formulas
pub fn pressure_at(altitude_m: f64) -> Result<f64> {
    let altitude_m = ALTITUDE_RANGE.check("altitude_m", altitude_m)?;
    Ok(temperature_and_pressure(altitude_m).2)
}

/// Evaluate the layered standard atmosphere
pub fn standard_atmosphere(input: &AtmosphereInput) -> Result<AtmosphereResult> {
    let altitude_m = ALTITUDE_RANGE.check("altitude_m", input.altitude_m)?;
    let (layer, temperature_k, pressure_pa) = temperature_and_pressure(altitude_m);

    Ok(AtmosphereResult {
        altitude_m,
        layer,
        temperature_k,
        temperature_c: temperature_k - KELVIN_OFFSET,
        pressure_pa,
        pressure_mmhg: pressure_pa / PA_PER_MMHG,
        pressure_ratio: pressure_pa / SEA_LEVEL_PRESSURE_PA,
        density_kg_m3: pressure_pa / (R_AIR * temperature_k),
        speed_of_sound_m_s: (GAMMA_AIR * R_AIR * temperature_k).sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use approx::assert_relative_eq;

    fn at(altitude_m: f64) -> AtmosphereResult {
        standard_atmosphere(&AtmosphereInput { altitude_m }).unwrap()
    }

    #[test]
    fn test_sea_level_reference() {
        let sl = at(0.0);
        assert_relative_eq!(sl.temperature_c, 15.0, epsilon = 1e-9);
        assert_relative_eq!(sl.pressure_pa, 101325.0, epsilon = 1e-9);
        assert_relative_eq!(sl.density_kg_m3, 1.225, epsilon = 1e-3);
        assert_relative_eq!(sl.speed_of_sound_m_s, 340.29, epsilon = 0.01);
        assert_relative_eq!(sl.pressure_mmhg, 760.0, epsilon = 1e-3);
        assert_eq!(sl.layer, AtmosphereLayer::Troposphere);
    }

    #[test]
    fn test_layer_boundaries_are_continuous() {
        for &h in &[11000.0, 20000.0, 32000.0, 47000.0, 51000.0, 71000.0] {
            let below = at(h - 1e-6);
            let above = at(h);
            assert_relative_eq!(below.temperature_k, above.temperature_k, max_relative = 1e-6);
            assert_relative_eq!(below.pressure_pa, above.pressure_pa, max_relative = 1e-3);
        }
    }

    #[test]
    fn test_tropopause_is_isothermal() {
        let low = at(11000.0);
        let high = at(19999.0);
        assert_relative_eq!(low.temperature_c, -56.5, epsilon = 1e-9);
        assert_relative_eq!(high.temperature_c, -56.5, epsilon = 1e-9);
        assert!(high.pressure_pa < low.pressure_pa);
        assert_eq!(low.layer, AtmosphereLayer::Tropopause);
    }

    #[test]
    fn test_stratospheric_inversion_warms() {
        let a = at(25000.0);
        let b = at(40000.0);
        assert!(b.temperature_k > a.temperature_k);
        assert_eq!(b.layer, AtmosphereLayer::UpperStratosphere);
    }

    #[test]
    fn test_known_altitude() {
        // 5000 m: 255.65 K, ~54020 Pa
        let r = at(5000.0);
        assert_relative_eq!(r.temperature_k, 255.65, epsilon = 1e-9);
        assert_relative_eq!(r.pressure_pa, 54020.0, max_relative = 1e-3);
    }

    #[test]
    fn test_below_sea_level_uses_troposphere() {
        let r = at(-500.0);
        assert!(r.pressure_pa > SEA_LEVEL_PRESSURE_PA);
        assert_relative_eq!(r.temperature_k, 291.4, epsilon = 1e-9);
    }

    #[test]
    fn test_out_of_range_altitude() {
        let err = standard_atmosphere(&AtmosphereInput { altitude_m: 84853.0 }).unwrap_err();
        assert!(matches!(err, Error::OutOfRangeInput { field: "altitude_m", .. }));

        let err = standard_atmosphere(&AtmosphereInput { altitude_m: -611.0 }).unwrap_err();
        assert!(matches!(err, Error::OutOfRangeInput { field: "altitude_m", .. }));
    }

    #[test]
    fn test_deterministic() {
        let a = at(8848.0);
        let b = at(8848.0);
        assert_eq!(a.pressure_pa.to_bits(), b.pressure_pa.to_bits());
        assert_eq!(a.density_kg_m3.to_bits(), b.density_kg_m3.to_bits());
    }
}
