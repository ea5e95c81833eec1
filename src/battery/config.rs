use serde::{Deserialize, Serialize};

use super::thermal::ThermalEnvironment;

/// Pack-level analysis configuration: cooling situation, temperature and
/// voltage limits, and which accessory masses to include.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    pub thermal_environment: ThermalEnvironment,
    pub ambient_temp_c: f64,
    pub max_cell_temp_c: f64,
    /// Per-cell discharge cutoff voltage (V).
    pub cutoff_voltage: f64,
    pub include_interconnect_mass: bool,
    pub include_enclosure_mass: bool,
    pub include_bms_mass: bool,
    pub enable_geometry: bool,
    pub cell_gap_mm: f64,
    /// Extra thickness fraction for pouch swelling.
    pub lipo_swell_margin: f64,
    pub lipo_tab_protrusion_mm: f64,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            thermal_environment: ThermalEnvironment::ShrinkwrapStillAir,
            ambient_temp_c: 25.0,
            max_cell_temp_c: 60.0,
            cutoff_voltage: 3.0,
            include_interconnect_mass: true,
            include_enclosure_mass: true,
            include_bms_mass: false,
            enable_geometry: false,
            cell_gap_mm: 0.5,
            lipo_swell_margin: 0.08,
            lipo_tab_protrusion_mm: 12.0,
        }
    }
}

impl PackConfig {
    /// Per-cell thermal resistance (°C/W) for the configured environment.
    pub fn thermal_resistance(&self) -> f64 {
        self.thermal_environment.thermal_resistance()
    }
}
