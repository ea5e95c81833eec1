mod common;

use approx::assert_relative_eq;
use powertrain::battery::{
    BatteryPack, LimitingFactor, PackConfig, ThermalEnvironment,
};
use powertrain::integrated::ThermalEvaluator;

use common::cell_db;

fn p45b_pack(series: u32, parallel: u32, env: ThermalEnvironment) -> BatteryPack {
    let cell = cell_db().get("Molicel P45B").unwrap().clone();
    let config = PackConfig {
        thermal_environment: env,
        ..PackConfig::default()
    };
    BatteryPack::new(cell, series, parallel, config).unwrap()
}

#[test]
fn voltage_sag_scales_linearly_with_current() {
    let pack = p45b_pack(6, 2, ThermalEnvironment::DroneInFlight);
    let base = pack.voltage_sag(12.0, 50.0, None);
    for k in [2.0, 3.0, 4.0] {
        let scaled = pack.voltage_sag(12.0 * k, 50.0, None);
        assert_relative_eq!(scaled, base * k, max_relative = 0.01);
    }
}

#[test]
fn heat_generation_scales_quadratically() {
    let pack = p45b_pack(6, 2, ThermalEnvironment::DroneInFlight);
    let h10 = pack.heat_generation_w(10.0, 50.0, Some(25.0));
    let h20 = pack.heat_generation_w(20.0, 50.0, Some(25.0));
    let h30 = pack.heat_generation_w(30.0, 50.0, Some(25.0));
    assert_relative_eq!(h20 / h10, 4.0, epsilon = 0.2);
    assert_relative_eq!(h30 / h10, 9.0, epsilon = 0.5);
}

#[test]
fn end_soc_lands_on_the_cutoff_voltage() {
    // The usable-energy floor: loaded voltage at the end SOC must match
    // the cutoff within 1%.
    for &(series, parallel, current) in &[(6u32, 2u32, 30.0), (4, 1, 12.0), (3, 1, 8.0)] {
        let pack = p45b_pack(series, parallel, ThermalEnvironment::DroneInFlight);
        let end = pack.end_soc(current, 100.0);
        let v_end = pack.loaded_voltage(current, end, None);
        let cutoff = pack.cutoff_voltage();
        assert!(
            (v_end - cutoff).abs() < 0.01 * cutoff,
            "{series}S{parallel}P at {current} A: {v_end:.3} V vs cutoff {cutoff:.3} V"
        );
    }
}

#[test]
fn steady_state_temperature_monotonic_in_ambient() {
    let cell = cell_db().get("Molicel P45B").unwrap().clone();
    let mut prev = 0.0;
    for ambient in [15.0, 25.0, 35.0] {
        let config = PackConfig {
            thermal_environment: ThermalEnvironment::DroneInFlight,
            ambient_temp_c: ambient,
            ..PackConfig::default()
        };
        let pack = BatteryPack::new(cell.clone(), 6, 2, config).unwrap();
        let t = pack.steady_state_temp(25.0, 50.0);
        assert!(t > prev, "T_ss {t} at ambient {ambient}");
        prev = t;
    }
}

#[test]
fn max_continuous_current_monotonic_in_ambient() {
    let cell = cell_db().get("Molicel P45B").unwrap().clone();
    let mut prev = f64::INFINITY;
    for ambient in [10.0, 20.0, 30.0, 40.0, 50.0] {
        let config = PackConfig {
            thermal_environment: ThermalEnvironment::ShrinkwrapStillAir,
            ambient_temp_c: ambient,
            ..PackConfig::default()
        };
        let pack = BatteryPack::new(cell.clone(), 6, 2, config).unwrap();
        let (i, _) = pack.max_continuous_current(50.0);
        assert!(i <= prev, "limit rose at ambient {ambient}");
        prev = i;
    }
}

#[test]
fn cooling_hierarchy_orders_steady_state_temperature() {
    let still = p45b_pack(6, 2, ThermalEnvironment::StillAir).steady_state_temp(30.0, 50.0);
    let flight = p45b_pack(6, 2, ThermalEnvironment::DroneInFlight).steady_state_temp(30.0, 50.0);
    let active = p45b_pack(6, 2, ThermalEnvironment::ActiveCooling).steady_state_temp(30.0, 50.0);
    assert!(still >= flight && flight >= active, "{still} / {flight} / {active}");
}

#[test]
fn thermal_limit_is_self_consistent() {
    // When the binding limit is thermal, solving the steady state at the
    // limit current must recover the configured maximum temperature.
    let evaluator = ThermalEvaluator::new();
    for env in [
        ThermalEnvironment::ShrinkwrapStillAir,
        ThermalEnvironment::StillAir,
        ThermalEnvironment::LightAirflow,
    ] {
        let pack = p45b_pack(6, 2, env);
        let (i_max, factor) = pack.max_continuous_current(50.0);
        if factor != LimitingFactor::Thermal {
            continue;
        }
        let eval = evaluator.evaluate_at_current(&pack, i_max, 50.0);
        assert!(
            (eval.steady_state_temp_c - pack.config().max_cell_temp_c).abs() < 1.0,
            "{}: T_ss {:.2} vs limit {:.1}",
            env.name(),
            eval.steady_state_temp_c,
            pack.config().max_cell_temp_c
        );
    }
}

#[test]
fn runtime_and_energy_are_consistent() {
    let pack = p45b_pack(6, 2, ThermalEnvironment::DroneInFlight);
    let current = 15.0;
    let runtime = pack.runtime_minutes(current, 100.0);
    let energy = pack.usable_energy_wh(current, 100.0);

    // runtime ≈ energy / (V_mid × I)
    let end = pack.end_soc(current, 100.0);
    let v_mid = pack.loaded_voltage(current, (100.0 + end) / 2.0, None);
    assert_relative_eq!(runtime, energy / (v_mid * current) * 60.0, max_relative = 1e-9);

    // and both shrink with harder discharge
    assert!(pack.runtime_minutes(45.0, 100.0) < runtime);
    assert!(pack.usable_energy_wh(45.0, 100.0) < energy + 1e-9);
}

#[test]
fn lfp_pack_uses_its_own_ocv_curve() {
    let cell = cell_db().get("A123 ANR26650M1B").unwrap().clone();
    let config = PackConfig {
        cutoff_voltage: 2.5,
        ..PackConfig::default()
    };
    let pack = BatteryPack::new(cell, 4, 1, config).unwrap();
    assert_relative_eq!(pack.open_circuit_voltage(100.0), 4.0 * 3.60, epsilon = 1e-9);
    assert_relative_eq!(pack.open_circuit_voltage(0.0), 4.0 * 2.50, epsilon = 1e-9);
}
