use serde::{Deserialize, Serialize};

use super::cell::{CellSpec, FormFactor};
use super::config::PackConfig;
use super::electrical;
use super::energy;
use super::error::BatteryError;
use super::geometry::{self, CellArrangement, CenterOfGravity, PackDimensions};
use super::limits::{self, LimitingFactor};
use super::thermal::{ThermalModel, ThermalState};
use crate::utils::constants::{
    BMS_MASS_PER_S_G, ENCLOSURE_MASS_PER_CELL_G, NICKEL_STRIP_MASS_PER_CONNECTION_G,
    WIRE_MASS_PER_CONNECTION_G,
};

/// Mass contributions of a pack (g).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassBreakdown {
    pub cells_g: f64,
    pub interconnects_g: f64,
    pub enclosure_g: f64,
    pub bms_g: f64,
    pub total_g: f64,
}

/// A battery pack: a cell specification in an S×P arrangement plus the
/// analysis configuration.
///
/// This is the integration surface for the rest of the engine:
/// `loaded_voltage` for the flight solve, `max_continuous_current` for the
/// power budget, `mass_kg` for the weight build-up, `steady_state_temp` for
/// thermal screening.
#[derive(Debug, Clone)]
pub struct BatteryPack {
    cell: CellSpec,
    series: u32,
    parallel: u32,
    config: PackConfig,
    thermal_model: ThermalModel,
    thermal_state: ThermalState,
}

impl BatteryPack {
    pub fn new(
        cell: CellSpec,
        series: u32,
        parallel: u32,
        config: PackConfig,
    ) -> Result<Self, BatteryError> {
        if !(1..=12).contains(&series) {
            return Err(BatteryError::InvalidSeries(series));
        }
        if !(1..=8).contains(&parallel) {
            return Err(BatteryError::InvalidParallel(parallel));
        }
        cell.validate()?;

        let mut pack = Self {
            cell,
            series,
            parallel,
            config,
            // Placeholder; rebuilt below once the total mass is known
            thermal_model: ThermalModel::new(1.0, 1.0, 1.0),
            thermal_state: ThermalState::at_ambient(config.ambient_temp_c),
        };

        // Cells are parallel thermal paths: pack R_th = per-cell R_th / N.
        // This keeps pack heat × pack R_th equal to per-cell heat × per-cell R_th.
        let pack_thermal_resistance = config.thermal_resistance() / pack.total_cells() as f64;
        pack.thermal_model = ThermalModel::new(
            pack.total_mass_g(),
            pack.cell.specific_heat_j_per_g_c,
            pack_thermal_resistance,
        );

        Ok(pack)
    }

    pub fn cell(&self) -> &CellSpec {
        &self.cell
    }

    pub fn series(&self) -> u32 {
        self.series
    }

    pub fn parallel(&self) -> u32 {
        self.parallel
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    pub fn thermal_model(&self) -> &ThermalModel {
        &self.thermal_model
    }

    pub fn total_cells(&self) -> u32 {
        self.series * self.parallel
    }

    /// Configuration string, e.g. "6S2P".
    pub fn configuration(&self) -> String {
        format!("{}S{}P", self.series, self.parallel)
    }

    pub fn nominal_voltage(&self) -> f64 {
        self.cell.nominal_voltage * self.series as f64
    }

    pub fn max_voltage(&self) -> f64 {
        self.cell.max_voltage * self.series as f64
    }

    pub fn min_voltage(&self) -> f64 {
        self.cell.min_voltage * self.series as f64
    }

    pub fn cutoff_voltage(&self) -> f64 {
        self.config.cutoff_voltage * self.series as f64
    }

    pub fn capacity_mah(&self) -> f64 {
        energy::pack_capacity_mah(&self.cell, self.parallel)
    }

    pub fn energy_wh(&self) -> f64 {
        energy::pack_energy_wh(&self.cell, self.series, self.parallel)
    }

    // -------------------------------------------------------------------
    // Mass
    // -------------------------------------------------------------------

    pub fn cell_mass_g(&self) -> f64 {
        self.cell.mass_g * self.total_cells() as f64
    }

    pub fn interconnect_mass_g(&self) -> f64 {
        if !self.config.include_interconnect_mass {
            return 0.0;
        }
        // Two connections per cell (+ and −)
        let connections = self.total_cells() as f64 * 2.0;
        let per_connection = if self.cell.form_factor == FormFactor::Pouch {
            WIRE_MASS_PER_CONNECTION_G
        } else {
            NICKEL_STRIP_MASS_PER_CONNECTION_G
        };
        connections * per_connection
    }

    pub fn enclosure_mass_g(&self) -> f64 {
        if !self.config.include_enclosure_mass {
            return 0.0;
        }
        self.total_cells() as f64 * ENCLOSURE_MASS_PER_CELL_G
    }

    pub fn bms_mass_g(&self) -> f64 {
        if !self.config.include_bms_mass {
            return 0.0;
        }
        self.series as f64 * BMS_MASS_PER_S_G
    }

    pub fn total_mass_g(&self) -> f64 {
        self.cell_mass_g() + self.interconnect_mass_g() + self.enclosure_mass_g() + self.bms_mass_g()
    }

    pub fn mass_kg(&self) -> f64 {
        self.total_mass_g() / 1000.0
    }

    pub fn mass_breakdown(&self) -> MassBreakdown {
        MassBreakdown {
            cells_g: self.cell_mass_g(),
            interconnects_g: self.interconnect_mass_g(),
            enclosure_g: self.enclosure_mass_g(),
            bms_g: self.bms_mass_g(),
            total_g: self.total_mass_g(),
        }
    }

    // -------------------------------------------------------------------
    // Electrical
    // -------------------------------------------------------------------

    pub fn pack_ir_mohm(&self, soc: f64, temp_c: Option<f64>) -> f64 {
        let temp = temp_c.unwrap_or(self.config.ambient_temp_c);
        electrical::pack_ir_mohm(&self.cell, self.series, self.parallel, soc, temp)
    }

    pub fn open_circuit_voltage(&self, soc: f64) -> f64 {
        electrical::pack_ocv(&self.cell, self.series, soc)
    }

    pub fn voltage_sag(&self, current_a: f64, soc: f64, temp_c: Option<f64>) -> f64 {
        let temp = temp_c.unwrap_or(self.config.ambient_temp_c);
        electrical::voltage_sag(&self.cell, self.series, self.parallel, current_a, soc, temp)
    }

    pub fn loaded_voltage(&self, current_a: f64, soc: f64, temp_c: Option<f64>) -> f64 {
        let temp = temp_c.unwrap_or(self.config.ambient_temp_c);
        electrical::loaded_voltage(&self.cell, self.series, self.parallel, current_a, soc, temp)
    }

    pub fn current_for_power(&self, power_w: f64, soc: f64, temp_c: Option<f64>) -> f64 {
        let temp = temp_c.unwrap_or(self.config.ambient_temp_c);
        electrical::current_for_power(&self.cell, self.series, self.parallel, power_w, soc, temp)
    }

    pub fn heat_generation_w(&self, current_a: f64, soc: f64, temp_c: Option<f64>) -> f64 {
        let temp = temp_c.unwrap_or(self.config.ambient_temp_c);
        electrical::heat_generation(&self.cell, self.series, self.parallel, current_a, soc, temp)
    }

    // -------------------------------------------------------------------
    // Limits
    // -------------------------------------------------------------------

    pub fn max_continuous_current(&self, soc: f64) -> (f64, LimitingFactor) {
        limits::max_continuous_current(
            &self.cell,
            self.series,
            self.parallel,
            self.config.ambient_temp_c,
            self.config.max_cell_temp_c,
            self.config.thermal_resistance(),
            self.config.cutoff_voltage,
            soc,
        )
    }

    pub fn max_continuous_power(&self, soc: f64) -> (f64, LimitingFactor) {
        limits::max_continuous_power(
            &self.cell,
            self.series,
            self.parallel,
            self.config.ambient_temp_c,
            self.config.max_cell_temp_c,
            self.config.thermal_resistance(),
            self.config.cutoff_voltage,
            soc,
        )
    }

    // -------------------------------------------------------------------
    // Energy and runtime
    // -------------------------------------------------------------------

    pub fn end_soc(&self, current_a: f64, start_soc: f64) -> f64 {
        energy::end_soc(
            &self.cell,
            self.series,
            self.parallel,
            current_a,
            start_soc,
            self.config.cutoff_voltage,
            self.config.ambient_temp_c,
        )
    }

    pub fn usable_energy_wh(&self, current_a: f64, start_soc: f64) -> f64 {
        energy::usable_energy_wh(
            &self.cell,
            self.series,
            self.parallel,
            current_a,
            start_soc,
            self.config.cutoff_voltage,
            self.config.ambient_temp_c,
        )
    }

    pub fn runtime_minutes(&self, current_a: f64, start_soc: f64) -> f64 {
        energy::runtime_minutes(
            &self.cell,
            self.series,
            self.parallel,
            current_a,
            start_soc,
            self.config.cutoff_voltage,
            self.config.ambient_temp_c,
        )
    }

    pub fn energy_density_wh_per_kg(&self) -> f64 {
        energy::energy_density_wh_per_kg(&self.cell, self.series, self.parallel, self.total_mass_g())
    }

    // -------------------------------------------------------------------
    // Thermal
    // -------------------------------------------------------------------

    /// Self-consistent steady-state cell temperature at a constant current.
    ///
    /// IR depends on temperature and heat depends on IR, so the steady
    /// state is found by re-evaluating the heat at each temperature
    /// estimate until it settles (0.1 °C, at most 10 passes).
    pub fn steady_state_temp(&self, current_a: f64, soc: f64) -> f64 {
        let mut temp_estimate = self.config.ambient_temp_c;

        for _ in 0..10 {
            let heat = self.heat_generation_w(current_a, soc, Some(temp_estimate));
            let new_temp = self
                .thermal_model
                .steady_state_temp(heat, self.config.ambient_temp_c);
            if (new_temp - temp_estimate).abs() < 0.1 {
                return new_temp;
            }
            temp_estimate = new_temp;
        }

        temp_estimate
    }

    pub fn thermal_state(&self) -> ThermalState {
        self.thermal_state
    }

    /// Advance the internal transient thermal state by `dt_s` at the given
    /// current, returning the new cell temperature.
    pub fn step_thermal(&mut self, current_a: f64, dt_s: f64, t_ambient: Option<f64>) -> f64 {
        if let Some(ambient) = t_ambient {
            self.thermal_state.ambient_temp_c = ambient;
        }
        let heat = self.heat_generation_w(current_a, 50.0, Some(self.thermal_state.cell_temp_c));
        self.thermal_state = self.thermal_model.step(self.thermal_state, heat, dt_s);
        self.thermal_state.cell_temp_c
    }

    pub fn reset_thermal(&mut self, temp_c: Option<f64>) {
        let start = temp_c.unwrap_or(self.config.ambient_temp_c);
        self.thermal_state = ThermalState {
            cell_temp_c: start,
            ambient_temp_c: self.config.ambient_temp_c,
            heat_generation_w: 0.0,
            heat_dissipation_w: 0.0,
            time_s: 0.0,
        };
    }

    // -------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------

    pub fn dimensions(&self, arrangement: CellArrangement) -> Result<PackDimensions, BatteryError> {
        if !self.config.enable_geometry {
            return Err(BatteryError::GeometryDisabled);
        }
        Ok(geometry::pack_dimensions(
            &self.cell,
            self.series,
            self.parallel,
            arrangement,
            self.config.cell_gap_mm,
            self.config.lipo_swell_margin,
            self.config.lipo_tab_protrusion_mm,
        ))
    }

    pub fn center_of_gravity(
        &self,
        arrangement: CellArrangement,
    ) -> Result<CenterOfGravity, BatteryError> {
        let dims = self.dimensions(arrangement)?;
        Ok(geometry::pack_cog(&dims))
    }

    // -------------------------------------------------------------------
    // Reporting
    // -------------------------------------------------------------------

    pub fn summary(&self) -> String {
        let (max_i, limit) = self.max_continuous_current(50.0);
        let (max_p, _) = self.max_continuous_power(50.0);
        let masses = self.mass_breakdown();

        format!(
            "Battery Pack: {} ({} {})\n\
             Voltage: {:.1} V nominal ({:.1}-{:.1} V)\n\
             Capacity: {:.0} mAh, {:.1} Wh\n\
             Pack IR: {:.1} mΩ (50% SOC, 25 °C)\n\
             Max continuous: {:.1} A / {:.0} W ({} limited)\n\
             Mass: {:.0} g ({:.0} Wh/kg)",
            self.configuration(),
            self.cell.manufacturer,
            self.cell.name,
            self.nominal_voltage(),
            self.min_voltage(),
            self.max_voltage(),
            self.capacity_mah(),
            self.energy_wh(),
            self.pack_ir_mohm(50.0, Some(25.0)),
            max_i,
            max_p,
            limit,
            masses.total_g,
            self.energy_density_wh_per_kg(),
        )
    }
}
