use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::error::BatteryError;
use crate::utils::constants::CELL_IR_TEMP_COEFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellChemistry {
    #[serde(rename = "NMC")]
    Nmc,
    #[serde(rename = "NCA")]
    Nca,
    #[serde(rename = "LFP")]
    Lfp,
    #[serde(rename = "LCO")]
    Lco,
    #[serde(rename = "LiPo")]
    LiPo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormFactor {
    #[serde(rename = "21700")]
    Cylindrical21700,
    #[serde(rename = "18650")]
    Cylindrical18650,
    #[serde(rename = "26650")]
    Cylindrical26650,
    #[serde(rename = "pouch")]
    Pouch,
}

impl FormFactor {
    pub fn is_cylindrical(self) -> bool {
        !matches!(self, Self::Pouch)
    }
}

/// Complete specification for a battery cell.
///
/// Electrical values are at 25 °C and 50 % SOC unless noted; the DC IR is
/// the figure that drives every sag and heating estimate, so it should come
/// from independent testing where available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSpec {
    pub name: String,
    pub manufacturer: String,
    pub chemistry: CellChemistry,
    pub form_factor: FormFactor,

    /// Rated capacity (mAh) at 0.2C discharge.
    pub capacity_mah: f64,
    #[serde(default = "default_nominal_voltage")]
    pub nominal_voltage: f64,
    #[serde(default = "default_max_voltage")]
    pub max_voltage: f64,
    #[serde(default = "default_min_voltage")]
    pub min_voltage: f64,
    #[serde(default = "default_max_continuous")]
    pub max_continuous_discharge_a: f64,
    #[serde(default = "default_peak")]
    pub peak_discharge_a: f64,
    /// DC internal resistance (mΩ) at 25 °C, 50 % SOC.
    #[serde(default = "default_dc_ir")]
    pub dc_ir_mohm: f64,

    #[serde(default = "default_mass")]
    pub mass_g: f64,
    #[serde(default)]
    pub diameter_mm: Option<f64>,
    #[serde(default)]
    pub length_mm: Option<f64>,
    #[serde(default)]
    pub width_mm: Option<f64>,
    #[serde(default)]
    pub height_mm: Option<f64>,
    #[serde(default)]
    pub thickness_mm: Option<f64>,

    /// Specific heat capacity (J/g·°C); ~1.0 for lithium-ion.
    #[serde(default = "default_specific_heat")]
    pub specific_heat_j_per_g_c: f64,
    #[serde(default = "default_max_temp")]
    pub max_temp_c: f64,

    #[serde(default = "default_data_source")]
    pub data_source: String,
    #[serde(default)]
    pub verified: bool,
}

fn default_nominal_voltage() -> f64 {
    3.6
}
fn default_max_voltage() -> f64 {
    4.2
}
fn default_min_voltage() -> f64 {
    2.5
}
fn default_max_continuous() -> f64 {
    10.0
}
fn default_peak() -> f64 {
    20.0
}
fn default_dc_ir() -> f64 {
    20.0
}
fn default_mass() -> f64 {
    70.0
}
fn default_specific_heat() -> f64 {
    1.0
}
fn default_max_temp() -> f64 {
    60.0
}
fn default_data_source() -> String {
    "manufacturer".to_string()
}

impl CellSpec {
    pub fn validate(&self) -> Result<(), BatteryError> {
        let positive = |field: &'static str, v: f64| {
            if v > 0.0 {
                Ok(())
            } else {
                Err(BatteryError::NonPositiveField {
                    name: self.name.clone(),
                    field,
                })
            }
        };
        positive("capacity_mah", self.capacity_mah)?;
        positive("nominal_voltage", self.nominal_voltage)?;
        positive("max_voltage", self.max_voltage)?;
        positive("min_voltage", self.min_voltage)?;
        positive("max_continuous_discharge_a", self.max_continuous_discharge_a)?;
        positive("peak_discharge_a", self.peak_discharge_a)?;
        positive("dc_ir_mohm", self.dc_ir_mohm)?;
        positive("mass_g", self.mass_g)?;
        positive("specific_heat_j_per_g_c", self.specific_heat_j_per_g_c)?;

        if self.form_factor.is_cylindrical() {
            if self.diameter_mm.is_none() || self.length_mm.is_none() {
                return Err(BatteryError::MissingCylindricalDimensions(
                    self.name.clone(),
                ));
            }
        } else if self.width_mm.is_none() || self.height_mm.is_none() || self.thickness_mm.is_none()
        {
            return Err(BatteryError::MissingPouchDimensions(self.name.clone()));
        }
        Ok(())
    }

    pub fn dc_ir_ohm(&self) -> f64 {
        self.dc_ir_mohm / 1000.0
    }

    /// Nominal energy per cell (Wh).
    pub fn energy_wh(&self) -> f64 {
        (self.capacity_mah / 1000.0) * self.nominal_voltage
    }

    /// Gravimetric energy density (Wh/kg).
    pub fn energy_density_wh_per_kg(&self) -> f64 {
        self.energy_wh() / (self.mass_g / 1000.0)
    }

    /// Cell volume (mL).
    pub fn volume_ml(&self) -> f64 {
        if self.form_factor.is_cylindrical() {
            let radius_cm = self.diameter_mm.unwrap_or(0.0) / 2.0 / 10.0;
            let height_cm = self.length_mm.unwrap_or(0.0) / 10.0;
            PI * radius_cm * radius_cm * height_cm
        } else {
            self.width_mm.unwrap_or(0.0) * self.height_mm.unwrap_or(0.0)
                * self.thickness_mm.unwrap_or(0.0)
                / 1000.0
        }
    }

    /// Volumetric energy density (Wh/L).
    pub fn energy_density_wh_per_l(&self) -> f64 {
        let vol = self.volume_ml();
        if vol > 0.0 {
            self.energy_wh() / (vol / 1000.0)
        } else {
            0.0
        }
    }

    pub fn max_continuous_power_w(&self) -> f64 {
        self.max_continuous_discharge_a * self.nominal_voltage
    }

    pub fn c_rate_continuous(&self) -> f64 {
        self.max_continuous_discharge_a / (self.capacity_mah / 1000.0)
    }

    /// DC IR (mΩ) adjusted for temperature. IR rises below 25 °C and falls
    /// above it, floored at 50 % of the reference value.
    pub fn ir_at_temp(&self, temp_c: f64) -> f64 {
        let temp_factor = 1.0 + CELL_IR_TEMP_COEFF * (25.0 - temp_c);
        self.dc_ir_mohm * temp_factor.max(0.5)
    }

    /// DC IR (mΩ) adjusted for state of charge. U-shaped: lowest around
    /// 50 %, up to +30 % at either extreme.
    pub fn ir_at_soc(&self, soc_percent: f64) -> f64 {
        self.dc_ir_mohm * soc_factor(soc_percent)
    }

    /// DC IR (mΩ) adjusted for both SOC and temperature.
    pub fn ir_adjusted(&self, soc_percent: f64, temp_c: f64) -> f64 {
        let temp_factor = (1.0 + CELL_IR_TEMP_COEFF * (25.0 - temp_c)).max(0.5);
        self.dc_ir_mohm * soc_factor(soc_percent) * temp_factor
    }

    pub fn summary(&self) -> String {
        format!(
            "{} {} ({:?}, {:?})\n\
             Capacity: {:.0} mAh ({:.1} Wh)\n\
             Discharge: {:.0} A continuous, {:.0} A peak\n\
             DC IR: {:.1} mΩ, Mass: {:.0} g ({:.0} Wh/kg)\n\
             Source: {} (verified: {})",
            self.manufacturer,
            self.name,
            self.chemistry,
            self.form_factor,
            self.capacity_mah,
            self.energy_wh(),
            self.max_continuous_discharge_a,
            self.peak_discharge_a,
            self.dc_ir_mohm,
            self.mass_g,
            self.energy_density_wh_per_kg(),
            self.data_source,
            self.verified,
        )
    }
}

fn soc_factor(soc_percent: f64) -> f64 {
    let delta = (soc_percent - 50.0) / 50.0;
    1.0 + 0.3 * delta * delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::database::CellDatabase;
    use approx::assert_relative_eq;

    #[test]
    fn p45b_reference_resistance() {
        // Molicel P45B, 10 A at 50% SOC and 25 °C: R ≈ 12 mΩ,
        // sag = 10 × 0.012 = 0.120 V
        let db = CellDatabase::builtin();
        let cell = db.get("Molicel P45B").unwrap();
        let r = cell.ir_adjusted(50.0, 25.0);
        assert!(r >= 11.0 && r <= 13.0, "R = {r} mΩ");
        let sag = 10.0 * r / 1000.0;
        assert_relative_eq!(sag, 0.120, max_relative = 0.1);
    }

    #[test]
    fn ir_is_u_shaped_in_soc() {
        let db = CellDatabase::builtin();
        let cell = db.get("Molicel P45B").unwrap();
        let low = cell.ir_at_soc(0.0);
        let mid = cell.ir_at_soc(50.0);
        let high = cell.ir_at_soc(100.0);
        assert_relative_eq!(mid, cell.dc_ir_mohm);
        assert_relative_eq!(low, cell.dc_ir_mohm * 1.3);
        assert_relative_eq!(high, cell.dc_ir_mohm * 1.3);
    }

    #[test]
    fn ir_temperature_floor() {
        let db = CellDatabase::builtin();
        let cell = db.get("Molicel P45B").unwrap();
        assert!(cell.ir_at_temp(0.0) > cell.dc_ir_mohm);
        assert!(cell.ir_at_temp(45.0) < cell.dc_ir_mohm);
        // Hot enough that the 0.5 floor engages
        assert_relative_eq!(cell.ir_at_temp(200.0), cell.dc_ir_mohm * 0.5);
    }

    #[test]
    fn cylindrical_cells_need_dimensions() {
        let db = CellDatabase::builtin();
        let mut cell = db.get("Molicel P45B").unwrap().clone();
        cell.diameter_mm = None;
        assert!(matches!(
            cell.validate(),
            Err(BatteryError::MissingCylindricalDimensions(_))
        ));
    }

    #[test]
    fn derived_properties_are_sane() {
        let db = CellDatabase::builtin();
        let cell = db.get("Molicel P45B").unwrap();
        // 4.5 Ah × 3.6 V ≈ 16.2 Wh; ~230 Wh/kg for a 70 g 21700
        assert_relative_eq!(cell.energy_wh(), 16.2, max_relative = 0.01);
        assert!(cell.energy_density_wh_per_kg() > 200.0);
        // 21700 volume ≈ 25.9 mL
        assert_relative_eq!(cell.volume_ml(), 25.9, max_relative = 0.05);
        assert!(cell.c_rate_continuous() > 5.0);
    }
}
