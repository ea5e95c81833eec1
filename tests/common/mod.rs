#![allow(dead_code)]

use powertrain::battery::{CellDatabase, ThermalEnvironment};
use powertrain::drag::DragModel;
use powertrain::integrated::{
    BatteryIterationConfig, CruiseSpeedSpec, IntegratedConfig, PropFilter,
};
use powertrain::motor::{MotorCatalog, MotorParameters};
use powertrain::prop::{PropDatabase, PropSample, PropTable};

/// Synthetic propeller surface shaped like real fixed-pitch data: thrust
/// grows with RPM² and bleeds off with airspeed, shaft power grows with
/// RPM³. Scaled by nominal diameter so different ids behave differently.
pub fn synthetic_prop(id: &str, thrust_scale: f64, power_scale: f64) -> PropTable {
    let mut samples = Vec::new();
    for &v in &[0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0] {
        for rpm_k in 2..=14 {
            let rpm = rpm_k as f64 * 1000.0;
            let r = rpm / 10_000.0;
            samples.push(PropSample {
                v_ms: v,
                rpm,
                thrust_n: thrust_scale * r * r - 0.10 * v,
                power_w: power_scale * r * r * r + 1.2 * v,
            });
        }
    }
    PropTable::from_samples(id, &samples).unwrap()
}

pub fn prop_db() -> PropDatabase {
    let mut db = PropDatabase::new();
    db.insert(synthetic_prop("10x5", 9.0, 190.0));
    db.insert(synthetic_prop("12x6", 14.0, 320.0));
    db
}

/// The bench cruiser used throughout the suite: Kv 900, 30 mΩ cold,
/// 1.5 A no-load at 9000 RPM.
pub fn bench_motor() -> MotorParameters {
    MotorParameters {
        kv: 900.0,
        rm_cold: 0.030,
        i0_ref: 1.5,
        i0_rpm_ref: 9_000.0,
        temp_ref: 25.0,
        i_max: 45.0,
        p_max: 900.0,
        k_sat: None,
        poles: 14,
        mass_g: 85.0,
        source: "bench".to_string(),
    }
}

pub fn motor_catalog() -> MotorCatalog {
    let mut catalog = MotorCatalog::new();
    catalog.insert("Bench 900", bench_motor());
    catalog.set_category("test_cruisers", ["Bench 900"]);
    catalog
}

pub fn cell_db() -> CellDatabase {
    CellDatabase::builtin()
}

/// The reference test airframe: a small FPV wing.
pub fn test_wing(weight_n: f64) -> DragModel {
    DragModel::fixed_wing(0.030, 0.22, 1.3, weight_n, 0.82).unwrap()
}

/// A small but non-trivial batch: 1 motor × 2 props × 1 cell ×
/// 2 arrangements × 1 environment × 2 speeds = 8 combinations, where the
/// 45 m/s speed sits outside the prop envelope and must come back invalid.
pub fn small_batch_config() -> IntegratedConfig {
    IntegratedConfig {
        wing_area_m2: 0.22,
        wingspan_m: 1.3,
        dry_mass_kg: 0.8,
        cd0: 0.030,
        oswald_efficiency: 0.82,
        num_motors: 1,
        altitude_m: 0.0,
        winding_temp_c: 80.0,
        motor_categories: vec!["test_cruisers".to_string()],
        prop_filter: PropFilter::default(),
        battery: BatteryIterationConfig {
            cell_ids: vec!["Molicel P45B".to_string()],
            series_options: vec![3, 4],
            parallel_options: vec![1],
            parallel_by_series: None,
            thermal_environments: vec![ThermalEnvironment::DroneInFlight],
            analysis_soc: 50.0,
            ambient_temp_c: 25.0,
            max_cell_temp_c: 60.0,
            cutoff_voltage_per_cell: 3.0,
        },
        cruise_speeds: CruiseSpeedSpec::Range {
            min_ms: 15.0,
            max_ms: 45.0,
            step_ms: 30.0,
        },
        evaluate_max_speed: true,
        speed_sweep: None,
    }
}
