use super::cell::CellSpec;
use super::electrical::loaded_voltage;
use crate::utils::constants::PEUKERT_EXPONENT_LI_ION;

const END_SOC_ITERATIONS: usize = 30;
const END_SOC_TOLERANCE: f64 = 0.5;

/// Total pack capacity (mAh).
pub fn pack_capacity_mah(cell: &CellSpec, parallel: u32) -> f64 {
    cell.capacity_mah * parallel as f64
}

/// Nominal pack energy (Wh).
pub fn pack_energy_wh(cell: &CellSpec, series: u32, parallel: u32) -> f64 {
    pack_capacity_mah(cell, parallel) / 1000.0 * cell.nominal_voltage * series as f64
}

/// Effective capacity (mAh) at a discharge current.
///
/// Lithium-ion loses little capacity to rate, so a light Peukert correction
/// applies only above 1C (pack current against pack capacity):
/// C_eff = C·(I_1C/I)^(k−1).
pub fn effective_capacity_mah(cell: &CellSpec, parallel: u32, current_a: f64) -> f64 {
    let nominal = pack_capacity_mah(cell, parallel);
    let one_c_current = nominal / 1000.0;
    if current_a <= one_c_current || one_c_current <= 0.0 {
        return nominal;
    }
    let ratio = one_c_current / current_a;
    nominal * ratio.powf(PEUKERT_EXPONENT_LI_ION - 1.0)
}

/// SOC at which the loaded voltage reaches the cutoff, by bisection.
///
/// Loaded voltage is monotonic in SOC; the search converges on the lowest
/// SOC that still clears cutoff (the usable floor).
pub fn end_soc(
    cell: &CellSpec,
    series: u32,
    parallel: u32,
    current_a: f64,
    start_soc: f64,
    cutoff_voltage_per_cell: f64,
    temp_c: f64,
) -> f64 {
    let cutoff_pack = cutoff_voltage_per_cell * series as f64;
    let mut soc_low = 0.0;
    let mut soc_high = start_soc;

    for _ in 0..END_SOC_ITERATIONS {
        let soc_mid = (soc_low + soc_high) / 2.0;
        let v = loaded_voltage(cell, series, parallel, current_a, soc_mid, temp_c);
        if v > cutoff_pack {
            // Still above cutoff here; the transition is lower down
            soc_high = soc_mid;
        } else {
            soc_low = soc_mid;
        }
        if soc_high - soc_low < END_SOC_TOLERANCE {
            break;
        }
    }

    soc_high
}

/// Usable energy (Wh) from `start_soc` down to the cutoff floor, with the
/// Peukert-corrected capacity and the mid-discharge loaded voltage.
pub fn usable_energy_wh(
    cell: &CellSpec,
    series: u32,
    parallel: u32,
    current_a: f64,
    start_soc: f64,
    cutoff_voltage_per_cell: f64,
    temp_c: f64,
) -> f64 {
    let soc_end = end_soc(
        cell,
        series,
        parallel,
        current_a,
        start_soc,
        cutoff_voltage_per_cell,
        temp_c,
    );

    let used_fraction = (start_soc - soc_end).max(0.0) / 100.0;
    let usable_ah = effective_capacity_mah(cell, parallel, current_a) * used_fraction / 1000.0;

    let mid_soc = (start_soc + soc_end) / 2.0;
    let avg_voltage = loaded_voltage(cell, series, parallel, current_a, mid_soc, temp_c);

    usable_ah * avg_voltage
}

/// Runtime (minutes) at constant current until cutoff. Infinite at zero
/// draw.
pub fn runtime_minutes(
    cell: &CellSpec,
    series: u32,
    parallel: u32,
    current_a: f64,
    start_soc: f64,
    cutoff_voltage_per_cell: f64,
    temp_c: f64,
) -> f64 {
    if current_a <= 0.0 {
        return f64::INFINITY;
    }

    let energy = usable_energy_wh(
        cell,
        series,
        parallel,
        current_a,
        start_soc,
        cutoff_voltage_per_cell,
        temp_c,
    );

    let soc_end = end_soc(
        cell,
        series,
        parallel,
        current_a,
        start_soc,
        cutoff_voltage_per_cell,
        temp_c,
    );
    let mid_soc = (start_soc + soc_end) / 2.0;
    let avg_voltage = loaded_voltage(cell, series, parallel, current_a, mid_soc, temp_c);

    let power_w = avg_voltage * current_a;
    if power_w <= 0.0 {
        return f64::INFINITY;
    }

    energy / power_w * 60.0
}

/// Pack gravimetric energy density (Wh/kg) against a supplied total mass.
pub fn energy_density_wh_per_kg(
    cell: &CellSpec,
    series: u32,
    parallel: u32,
    total_mass_g: f64,
) -> f64 {
    if total_mass_g <= 0.0 {
        return 0.0;
    }
    pack_energy_wh(cell, series, parallel) / (total_mass_g / 1000.0)
}
