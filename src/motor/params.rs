use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::error::MotorError;
use crate::utils::constants::COPPER_TEMP_COEFF;

/// Brushless motor specification, from datasheet or bench measurement.
///
/// The equivalent-circuit model treats the motor as a back-EMF source behind
/// the winding resistance: `V_bemf = RPM / Kv`, `I = (V − V_bemf) / Rm`,
/// with the no-load current removed before torque production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorParameters {
    /// Velocity constant (RPM/V).
    pub kv: f64,
    /// Phase-to-phase winding resistance at `temp_ref` (Ω).
    pub rm_cold: f64,
    /// No-load current (A) measured at `i0_rpm_ref`.
    pub i0_ref: f64,
    /// RPM at which `i0_ref` was measured.
    pub i0_rpm_ref: f64,
    /// Temperature at which `rm_cold` was measured (°C).
    #[serde(default = "default_temp_ref")]
    pub temp_ref: f64,
    /// Maximum continuous current rating (A).
    #[serde(default = "default_i_max")]
    pub i_max: f64,
    /// Maximum continuous power rating (W).
    #[serde(default = "default_p_max")]
    pub p_max: f64,
    /// Magnetic saturation coefficient; `None` disables the correction.
    #[serde(default)]
    pub k_sat: Option<f64>,
    #[serde(default = "default_poles")]
    pub poles: u32,
    #[serde(default = "default_mass_g")]
    pub mass_g: f64,
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_temp_ref() -> f64 {
    25.0
}
fn default_i_max() -> f64 {
    50.0
}
fn default_p_max() -> f64 {
    1000.0
}
fn default_poles() -> u32 {
    14
}
fn default_mass_g() -> f64 {
    100.0
}
fn default_source() -> String {
    "user".to_string()
}

impl MotorParameters {
    /// Torque constant Kt = 60/(2π·Kv) (N·m/A).
    pub fn kt(&self) -> f64 {
        60.0 / (2.0 * PI * self.kv)
    }

    /// Winding resistance (Ω) at the given winding temperature.
    pub fn resistance_at(&self, winding_temp_c: f64) -> f64 {
        self.rm_cold * (1.0 + COPPER_TEMP_COEFF * (winding_temp_c - self.temp_ref))
    }

    /// No-load current (A) at the given RPM. Iron losses grow with speed,
    /// approximated as I0 ∝ √RPM around the measurement point.
    pub fn i0_at(&self, rpm: f64) -> f64 {
        if self.i0_rpm_ref <= 0.0 || rpm <= 0.0 {
            return if rpm <= 0.0 { 0.0 } else { self.i0_ref };
        }
        self.i0_ref * (rpm / self.i0_rpm_ref).sqrt()
    }

    /// Effective torque constant including magnetic saturation, clamped to
    /// [0.8·Kt, Kt].
    pub fn kt_effective(&self, current_a: f64) -> f64 {
        let kt = self.kt();
        let Some(k_sat) = self.k_sat else {
            return kt;
        };
        let ratio = current_a / self.i_max;
        let factor = (1.0 - k_sat * ratio * ratio).clamp(0.8, 1.0);
        kt * factor
    }

    pub fn validate(&self, id: &str) -> Result<(), MotorError> {
        let check = |name: &str, v: f64| {
            if v > 0.0 {
                Ok(())
            } else {
                Err(MotorError::InvalidParameter(format!(
                    "{id}: {name} must be positive, got {v}"
                )))
            }
        };
        check("kv", self.kv)?;
        check("rm_cold", self.rm_cold)?;
        check("i0_rpm_ref", self.i0_rpm_ref)?;
        check("i_max", self.i_max)?;
        check("p_max", self.p_max)?;
        if self.i0_ref < 0.0 {
            return Err(MotorError::InvalidParameter(format!(
                "{id}: i0_ref must be non-negative, got {}",
                self.i0_ref
            )));
        }
        Ok(())
    }
}
