use std::sync::Arc;

use chrono::Utc;
use rayon::prelude::*;

use super::config::{BatchConfigError, IntegratedConfig};
use super::progress::{BatchProgress, CancelToken, ProgressCounters};
use super::result::{IntegratedBatchResult, IntegratedResult};
use super::thermal_evaluator::ThermalEvaluator;
use crate::battery::{BatteryPack, CellDatabase, LimitingFactor, PackConfig, ThermalEnvironment};
use crate::drag::DragModel;
use crate::flight::{FlightConditions, FlightResult, FlightSolver, SolveIssue};
use crate::motor::MotorCatalog;
use crate::prop::PropDatabase;
use crate::utils::constants::GRAVITY;

/// One combination to evaluate.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub index: usize,
    pub motor_id: String,
    pub prop_id: String,
    pub cell_id: String,
    pub series: u32,
    pub parallel: u32,
    pub environment: ThermalEnvironment,
    pub cruise_speed_ms: f64,
}

/// Batch engine over the motor × prop × cell × (S,P) × thermal × speed
/// space.
///
/// The component stores are shared read-only across the worker pool; each
/// work item is an independent pure computation, so the batch parallelizes
/// over items with no locking beyond the progress counters.
pub struct IntegratedSolver {
    config: IntegratedConfig,
    motors: Arc<MotorCatalog>,
    props: Arc<PropDatabase>,
    cells: Arc<CellDatabase>,
    motor_ids: Vec<String>,
    prop_ids: Vec<String>,
}

impl IntegratedSolver {
    pub fn new(
        config: IntegratedConfig,
        motors: Arc<MotorCatalog>,
        props: Arc<PropDatabase>,
        cells: Arc<CellDatabase>,
    ) -> Result<Self, BatchConfigError> {
        config.validate()?;

        let motor_ids = motors
            .motors_in_categories(&config.motor_categories)
            .map_err(|e| BatchConfigError::Validation(e.to_string()))?;
        if motor_ids.is_empty() {
            return Err(BatchConfigError::Validation(
                "selected motor categories contain no motors".to_string(),
            ));
        }

        let prop_ids: Vec<String> = props
            .iter()
            .filter(|table| {
                let dims = table.diameter_in().zip(table.pitch_in());
                config.prop_filter.accepts(dims)
            })
            .map(|table| table.id().to_string())
            .collect();
        if prop_ids.is_empty() {
            return Err(BatchConfigError::Validation(
                "prop filter excludes every propeller in the database".to_string(),
            ));
        }

        Ok(Self {
            config,
            motors,
            props,
            cells,
            motor_ids,
            prop_ids,
        })
    }

    pub fn config(&self) -> &IntegratedConfig {
        &self.config
    }

    pub fn selected_motors(&self) -> &[String] {
        &self.motor_ids
    }

    pub fn selected_props(&self) -> &[String] {
        &self.prop_ids
    }

    /// Deterministic enumeration of every combination, in the fixed
    /// motor → prop → cell → (S,P) → environment → speed nesting order.
    pub fn permutations(&self) -> Vec<WorkItem> {
        let arrangements = self.config.battery.arrangements();
        let speeds = self.config.cruise_speeds.speeds();
        let mut items = Vec::with_capacity(self.permutation_count());
        let mut index = 0;

        for motor_id in &self.motor_ids {
            for prop_id in &self.prop_ids {
                for cell_id in &self.config.battery.cell_ids {
                    for &(series, parallel) in &arrangements {
                        for &environment in &self.config.battery.thermal_environments {
                            for &cruise_speed_ms in &speeds {
                                items.push(WorkItem {
                                    index,
                                    motor_id: motor_id.clone(),
                                    prop_id: prop_id.clone(),
                                    cell_id: cell_id.clone(),
                                    series,
                                    parallel,
                                    environment,
                                    cruise_speed_ms,
                                });
                                index += 1;
                            }
                        }
                    }
                }
            }
        }

        items
    }

    pub fn permutation_count(&self) -> usize {
        self.motor_ids.len()
            * self.prop_ids.len()
            * self.config.battery.cell_ids.len()
            * self.config.battery.arrangements().len()
            * self.config.battery.thermal_environments.len()
            * self.config.cruise_speeds.speeds().len()
    }

    /// Run the whole batch across the rayon worker pool.
    ///
    /// The observer is invoked at every work-item boundary. Setting the
    /// cancel token stops dispatch of further items; items already in
    /// flight complete and their results are kept.
    pub fn run_batch(
        &self,
        observer: Option<&(dyn Fn(&BatchProgress) + Send + Sync)>,
        cancel: Option<&CancelToken>,
    ) -> IntegratedBatchResult {
        let items = self.permutations();
        let counters = ProgressCounters::new(items.len());
        let started_at = Utc::now();

        let collected: Vec<Option<IntegratedResult>> = items
            .par_iter()
            .map(|item| {
                if cancel.is_some_and(|token| token.is_cancelled()) {
                    return None;
                }

                let result = self.solve_item(item);

                let efficiency = if result.valid {
                    result.cruise.system_efficiency
                } else {
                    0.0
                };
                counters.record_item(
                    result.valid,
                    efficiency,
                    &item.motor_id,
                    &item.prop_id,
                    &format!("{:.1} m/s", item.cruise_speed_ms),
                );
                if let Some(callback) = observer {
                    callback(&counters.snapshot());
                }

                Some(result)
            })
            .collect();

        let cancelled = cancel.is_some_and(|token| token.is_cancelled());
        let mut results: Vec<IntegratedResult> = collected.into_iter().flatten().collect();
        // Worker output order is unspecified; restore permutation order
        results.sort_by_key(|r| r.index);

        let valid_count = results.iter().filter(|r| r.valid).count();
        let invalid_count = results.len() - valid_count;

        let best_by_efficiency = best_index(&results, |r| r.cruise.system_efficiency);
        let best_by_runtime = best_index(&results, |r| r.cruise_runtime_minutes);
        let best_by_max_speed = best_index(&results, |r| r.max_achievable_speed_ms);

        IntegratedBatchResult {
            results,
            total_permutations: items.len(),
            valid_count,
            invalid_count,
            cancelled,
            started_at,
            elapsed_seconds: counters.elapsed_s(),
            best_by_efficiency,
            best_by_runtime,
            best_by_max_speed,
        }
    }

    fn solve_item(&self, item: &WorkItem) -> IntegratedResult {
        // 1. Resolve the cell; an unknown id fails only this item
        let cell = match self.cells.get(&item.cell_id) {
            Ok(cell) => cell.clone(),
            Err(err) => return self.structural_failure(item, err.to_string()),
        };

        // 2. Pack for this arrangement and environment
        let battery_cfg = &self.config.battery;
        let pack_config = PackConfig {
            thermal_environment: item.environment,
            ambient_temp_c: battery_cfg.ambient_temp_c,
            max_cell_temp_c: battery_cfg.max_cell_temp_c,
            cutoff_voltage: battery_cfg.cutoff_voltage_per_cell,
            ..PackConfig::default()
        };
        let pack = match BatteryPack::new(cell, item.series, item.parallel, pack_config) {
            Ok(pack) => pack,
            Err(err) => return self.structural_failure(item, err.to_string()),
        };

        // 3. Airframe drag with the all-up weight of this combination
        let weight_n = (self.config.dry_mass_kg + pack.mass_kg()) * GRAVITY;
        let drag_model = match DragModel::fixed_wing(
            self.config.cd0,
            self.config.wing_area_m2,
            self.config.wingspan_m,
            weight_n,
            self.config.oswald_efficiency,
        ) {
            Ok(model) => model,
            Err(err) => return self.structural_failure(item, err.to_string()),
        };

        let conditions = FlightConditions {
            altitude_m: self.config.altitude_m,
            temp_offset_k: 0.0,
            winding_temp_c: self.config.winding_temp_c,
            num_motors: self.config.num_motors,
        };
        let solver = FlightSolver::new(&self.motors, &self.props);
        let soc = battery_cfg.analysis_soc;

        // 4. Cruise solve with the sag coupling: loaded voltage depends on
        // current, current on voltage; a short outer loop settles both.
        let mut v_battery = pack.nominal_voltage();
        let mut cruise = match solver.solve_cruise(
            &item.motor_id,
            &item.prop_id,
            &drag_model,
            v_battery,
            item.cruise_speed_ms,
            &conditions,
        ) {
            Ok(result) => result,
            Err(err) => return self.structural_failure(item, err.to_string()),
        };

        for _ in 0..5 {
            if !cruise.valid {
                break;
            }
            let previous_current = cruise.battery_current_a;
            let v_loaded = pack.loaded_voltage(previous_current, soc, None);
            let next = match solver.solve_cruise(
                &item.motor_id,
                &item.prop_id,
                &drag_model,
                v_loaded,
                item.cruise_speed_ms,
                &conditions,
            ) {
                Ok(result) => result,
                Err(err) => return self.structural_failure(item, err.to_string()),
            };
            v_battery = v_loaded;
            let converged = next.valid
                && previous_current > 0.0
                && ((next.battery_current_a - previous_current) / previous_current).abs() < 0.01;
            cruise = next;
            if converged {
                break;
            }
        }

        // 5. Combination validity
        let mut valid = cruise.valid;
        let mut reason: Option<String> = cruise.issue.map(|issue| issue.tag().to_string());
        if valid && cruise.issue.is_some() {
            // Soft flight flags (throttle/current) invalidate the combination
            valid = false;
        }

        if valid {
            let v_loaded = pack.loaded_voltage(cruise.battery_current_a, soc, None);
            if v_loaded < pack.cutoff_voltage() {
                valid = false;
                reason = Some(SolveIssue::PackVoltageFloor.tag().to_string());
            }
        }

        let evaluator = ThermalEvaluator::new();
        let cruise_thermal = cruise
            .valid
            .then(|| evaluator.evaluate_at_current(&pack, cruise.battery_current_a, soc));

        if valid {
            if let Some(eval) = &cruise_thermal {
                if !eval.within_limits {
                    valid = false;
                    reason = Some(
                        match eval.limiting_factor {
                            LimitingFactor::Thermal => SolveIssue::ThermalExceeded,
                            LimitingFactor::Voltage => SolveIssue::PackVoltageFloor,
                            _ => SolveIssue::PackRatingExceeded,
                        }
                        .tag()
                        .to_string(),
                    );
                }
            }
        }

        // 6. Optional speed sweep at the settled battery voltage
        let speed_sweep = match (&self.config.speed_sweep, cruise.valid) {
            (Some(sweep), true) => {
                let num_points =
                    ((sweep.max_ms - sweep.min_ms) / sweep.step_ms).round() as usize + 1;
                solver
                    .solve_speed_sweep(
                        &item.motor_id,
                        &item.prop_id,
                        &drag_model,
                        v_battery,
                        (sweep.min_ms, sweep.max_ms),
                        num_points.max(2),
                        &conditions,
                    )
                    .unwrap_or_default()
            }
            _ => Vec::new(),
        };

        // 7. Optional max-speed search
        let max_speed_result: Option<FlightResult> =
            if self.config.evaluate_max_speed && cruise.valid {
                solver
                    .find_max_speed(
                        &item.motor_id,
                        &item.prop_id,
                        &drag_model,
                        v_battery,
                        &conditions,
                    )
                    .ok()
                    .filter(|r| r.valid)
            } else {
                None
            };
        let max_achievable_speed_ms = max_speed_result
            .as_ref()
            .map(|r| r.airspeed_ms)
            .unwrap_or(0.0);

        // 8. Thermal at the max-speed current, and the throttle ceiling
        // when cruise holds but full speed does not
        let max_speed_thermal = max_speed_result
            .as_ref()
            .map(|r| evaluator.evaluate_at_current(&pack, r.battery_current_a, soc));

        let thermal_throttle_limit_pct = match (&cruise_thermal, &max_speed_thermal) {
            (Some(cruise_eval), Some(max_eval))
                if cruise_eval.within_limits && !max_eval.within_limits =>
            {
                let (throttle, _) = evaluator.find_max_safe_throttle(
                    &pack,
                    soc,
                    cruise.throttle_pct,
                    cruise.battery_current_a,
                    max_eval.current_a,
                    None,
                    1.0,
                );
                Some(throttle)
            }
            _ => None,
        };

        // 9. Figures of merit
        let cruise_runtime_minutes = if cruise.valid && cruise.battery_current_a > 0.0 {
            pack.runtime_minutes(cruise.battery_current_a, 100.0)
        } else {
            0.0
        };
        let power_density_w_kg = pack.max_continuous_power(soc).0 / pack.mass_kg();

        IntegratedResult {
            index: item.index,
            motor_id: item.motor_id.clone(),
            prop_id: item.prop_id.clone(),
            cell_id: item.cell_id.clone(),
            series: item.series,
            parallel: item.parallel,
            thermal_environment: item.environment,
            pack_config: pack.configuration(),
            pack_voltage_nominal: pack.nominal_voltage(),
            pack_capacity_mah: pack.capacity_mah(),
            pack_energy_wh: pack.energy_wh(),
            pack_mass_kg: pack.mass_kg(),
            cruise,
            speed_sweep,
            max_speed_result,
            max_achievable_speed_ms,
            cruise_thermal,
            max_speed_thermal,
            thermal_throttle_limit_pct,
            cruise_runtime_minutes,
            energy_density_wh_kg: pack.energy_density_wh_per_kg(),
            power_density_w_kg,
            valid,
            invalidity_reason: if valid { None } else { reason },
        }
    }

    fn structural_failure(&self, item: &WorkItem, message: String) -> IntegratedResult {
        IntegratedResult {
            index: item.index,
            motor_id: item.motor_id.clone(),
            prop_id: item.prop_id.clone(),
            cell_id: item.cell_id.clone(),
            series: item.series,
            parallel: item.parallel,
            thermal_environment: item.environment,
            pack_config: format!("{}S{}P", item.series, item.parallel),
            pack_voltage_nominal: 0.0,
            pack_capacity_mah: 0.0,
            pack_energy_wh: 0.0,
            pack_mass_kg: 0.0,
            cruise: FlightResult::skeleton(
                &item.motor_id,
                &item.prop_id,
                item.cruise_speed_ms,
                self.config.altitude_m,
                0.0,
                self.config.num_motors,
            ),
            speed_sweep: Vec::new(),
            max_speed_result: None,
            max_achievable_speed_ms: 0.0,
            cruise_thermal: None,
            max_speed_thermal: None,
            thermal_throttle_limit_pct: None,
            cruise_runtime_minutes: 0.0,
            energy_density_wh_kg: 0.0,
            power_density_w_kg: 0.0,
            valid: false,
            invalidity_reason: Some(message),
        }
    }
}

/// First-listed maximum, so ties resolve by permutation order.
fn best_index<F: Fn(&IntegratedResult) -> f64>(
    results: &[IntegratedResult],
    metric: F,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, result) in results.iter().enumerate() {
        if !result.valid {
            continue;
        }
        let value = metric(result);
        if best.map_or(true, |(_, best_value)| value > best_value) {
            best = Some((i, value));
        }
    }
    best.map(|(i, _)| i)
}
