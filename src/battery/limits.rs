use serde::{Deserialize, Serialize};

use super::cell::CellSpec;
use super::electrical::{loaded_voltage, pack_ir_mohm, pack_ocv};
use crate::utils::constants::ENTROPIC_HEAT_FACTOR;

/// Which constraint binds the pack's maximum continuous current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitingFactor {
    /// No constraint active (zero current).
    None,
    Thermal,
    Rating,
    Voltage,
}

impl std::fmt::Display for LimitingFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Thermal => "thermal",
            Self::Rating => "rating",
            Self::Voltage => "voltage",
        };
        f.write_str(s)
    }
}

/// Maximum pack current under the per-cell thermal constraint.
///
/// The cell IR is evaluated at `max_temp_c`, so that running at this current
/// settles the self-consistent steady state exactly on the limit:
/// I_cell = √(ΔT_max / (R_cell·ε'·R_th_cell)), pack current = I_cell·P.
pub fn max_current_thermal(
    cell: &CellSpec,
    parallel: u32,
    ambient_temp_c: f64,
    max_temp_c: f64,
    thermal_resistance_c_per_w: f64,
    soc: f64,
) -> f64 {
    let max_rise = max_temp_c - ambient_temp_c;
    if max_rise <= 0.0 {
        return 0.0;
    }

    let cell_ir_ohm = cell.ir_adjusted(soc, max_temp_c) / 1000.0;
    let denominator = cell_ir_ohm * ENTROPIC_HEAT_FACTOR * thermal_resistance_c_per_w;
    if denominator <= 0.0 {
        return f64::INFINITY;
    }

    (max_rise / denominator).sqrt() * parallel as f64
}

/// Maximum pack current from the manufacturer's continuous rating.
pub fn max_current_rating(cell: &CellSpec, parallel: u32) -> f64 {
    cell.max_continuous_discharge_a * parallel as f64
}

/// Maximum pack current before the loaded voltage hits the floor:
/// I = (OCV − V_min)/R_pack, zero when the OCV already sits below it.
pub fn max_current_voltage(
    cell: &CellSpec,
    series: u32,
    parallel: u32,
    min_pack_voltage: f64,
    soc: f64,
    temp_c: f64,
) -> f64 {
    let v_oc = pack_ocv(cell, series, soc);
    if v_oc <= min_pack_voltage {
        return 0.0;
    }
    let r_pack_ohm = pack_ir_mohm(cell, series, parallel, soc, temp_c) / 1000.0;
    if r_pack_ohm <= 0.0 {
        return f64::INFINITY;
    }
    (v_oc - min_pack_voltage) / r_pack_ohm
}

/// Most restrictive of the thermal, rating and voltage limits, with the
/// binding constraint tagged.
#[allow(clippy::too_many_arguments)]
pub fn max_continuous_current(
    cell: &CellSpec,
    series: u32,
    parallel: u32,
    ambient_temp_c: f64,
    max_temp_c: f64,
    thermal_resistance_c_per_w: f64,
    min_voltage_per_cell: f64,
    soc: f64,
) -> (f64, LimitingFactor) {
    let i_thermal = max_current_thermal(
        cell,
        parallel,
        ambient_temp_c,
        max_temp_c,
        thermal_resistance_c_per_w,
        soc,
    );
    let i_rating = max_current_rating(cell, parallel);
    let i_voltage = max_current_voltage(
        cell,
        series,
        parallel,
        min_voltage_per_cell * series as f64,
        soc,
        max_temp_c,
    );

    let limits = [
        (i_thermal, LimitingFactor::Thermal),
        (i_rating, LimitingFactor::Rating),
        (i_voltage, LimitingFactor::Voltage),
    ];

    let mut binding = limits[0];
    for candidate in &limits[1..] {
        if candidate.0 < binding.0 {
            binding = *candidate;
        }
    }
    binding
}

/// Maximum continuous power P = I_max·V_loaded(I_max), with the same tag.
#[allow(clippy::too_many_arguments)]
pub fn max_continuous_power(
    cell: &CellSpec,
    series: u32,
    parallel: u32,
    ambient_temp_c: f64,
    max_temp_c: f64,
    thermal_resistance_c_per_w: f64,
    min_voltage_per_cell: f64,
    soc: f64,
) -> (f64, LimitingFactor) {
    let (max_current, factor) = max_continuous_current(
        cell,
        series,
        parallel,
        ambient_temp_c,
        max_temp_c,
        thermal_resistance_c_per_w,
        min_voltage_per_cell,
        soc,
    );
    let v_loaded = loaded_voltage(cell, series, parallel, max_current, soc, max_temp_c);
    (max_current * v_loaded, factor)
}

/// C-rate for a pack current.
pub fn c_rate_at_current(cell: &CellSpec, parallel: u32, current_a: f64) -> f64 {
    let capacity_ah = cell.capacity_mah * parallel as f64 / 1000.0;
    if capacity_ah <= 0.0 {
        return 0.0;
    }
    current_a / capacity_ah
}

/// Pack current for a C-rate.
pub fn current_at_c_rate(cell: &CellSpec, parallel: u32, c_rate: f64) -> f64 {
    c_rate * cell.capacity_mah * parallel as f64 / 1000.0
}
