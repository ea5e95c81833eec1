use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::thermal_evaluator::ThermalEvaluation;
use crate::battery::ThermalEnvironment;
use crate::flight::FlightResult;
use crate::utils::constants::MS_TO_MPH;

/// Complete evaluation of one motor × prop × pack × environment × speed
/// combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratedResult {
    /// Position in the deterministic permutation order.
    pub index: usize,

    pub motor_id: String,
    pub prop_id: String,
    pub cell_id: String,
    pub series: u32,
    pub parallel: u32,
    pub thermal_environment: ThermalEnvironment,

    // Pack summary
    /// e.g. "6S2P".
    pub pack_config: String,
    pub pack_voltage_nominal: f64,
    pub pack_capacity_mah: f64,
    pub pack_energy_wh: f64,
    pub pack_mass_kg: f64,

    // Flight
    pub cruise: FlightResult,
    #[serde(default)]
    pub speed_sweep: Vec<FlightResult>,
    pub max_speed_result: Option<FlightResult>,
    /// 0 when max-speed evaluation was disabled or failed.
    pub max_achievable_speed_ms: f64,

    // Thermal
    pub cruise_thermal: Option<ThermalEvaluation>,
    pub max_speed_thermal: Option<ThermalEvaluation>,
    /// Highest thermally safe throttle (%) when full throttle exceeds
    /// limits but cruise does not.
    pub thermal_throttle_limit_pct: Option<f64>,

    // Figures of merit
    pub cruise_runtime_minutes: f64,
    pub energy_density_wh_kg: f64,
    pub power_density_w_kg: f64,

    pub valid: bool,
    pub invalidity_reason: Option<String>,
}

impl IntegratedResult {
    pub fn is_thermally_limited(&self) -> bool {
        self.valid && self.thermal_throttle_limit_pct.is_some()
    }

    /// One-line summary for reports.
    pub fn summary_line(&self) -> String {
        if !self.valid {
            return format!(
                "{} + {} + {} {} ({}): invalid ({})",
                self.motor_id,
                self.prop_id,
                self.cell_id,
                self.pack_config,
                self.thermal_environment.name(),
                self.invalidity_reason.as_deref().unwrap_or("unknown"),
            );
        }
        format!(
            "{} + {} + {} {} ({}): {:.1}% eff, {:.1} A, {:.1} min, {:.1} m/s cruise",
            self.motor_id,
            self.prop_id,
            self.cell_id,
            self.pack_config,
            self.thermal_environment.name(),
            self.cruise.system_efficiency * 100.0,
            self.cruise.battery_current_a,
            self.cruise_runtime_minutes,
            self.cruise.airspeed_ms,
        )
    }
}

/// Everything a finished (or cancelled) batch produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegratedBatchResult {
    pub results: Vec<IntegratedResult>,
    pub total_permutations: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub elapsed_seconds: f64,

    // Indices into `results`
    pub best_by_efficiency: Option<usize>,
    pub best_by_runtime: Option<usize>,
    pub best_by_max_speed: Option<usize>,
}

impl IntegratedBatchResult {
    pub fn best_by_efficiency(&self) -> Option<&IntegratedResult> {
        self.best_by_efficiency.map(|i| &self.results[i])
    }

    pub fn best_by_runtime(&self) -> Option<&IntegratedResult> {
        self.best_by_runtime.map(|i| &self.results[i])
    }

    pub fn best_by_max_speed(&self) -> Option<&IntegratedResult> {
        self.best_by_max_speed.map(|i| &self.results[i])
    }
}

/// mph view of an airspeed, for summary strings.
pub fn ms_to_mph(speed_ms: f64) -> f64 {
    speed_ms * MS_TO_MPH
}
