use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::result::{ms_to_mph, IntegratedBatchResult, IntegratedResult};

/// Ranking metric for sorting valid results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    SystemEfficiency,
    Runtime,
    MaxSpeed,
    PowerDensity,
    EnergyDensity,
    /// Lower is better.
    CruiseCurrent,
}

impl RankMetric {
    fn value(self, result: &IntegratedResult) -> f64 {
        match self {
            Self::SystemEfficiency => result.cruise.system_efficiency,
            Self::Runtime => result.cruise_runtime_minutes,
            Self::MaxSpeed => result.max_achievable_speed_ms,
            Self::PowerDensity => result.power_density_w_kg,
            Self::EnergyDensity => result.energy_density_wh_kg,
            Self::CruiseCurrent => result.cruise.battery_current_a,
        }
    }

    fn higher_is_better(self) -> bool {
        !matches!(self, Self::CruiseCurrent)
    }
}

/// Min/max/mean of one metric across the valid results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl MetricStats {
    fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(Self { min, max, mean })
    }
}

/// Batch-level statistics block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStatistics {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub thermal_limited: usize,
    pub elapsed_seconds: f64,
    pub efficiency: Option<MetricStats>,
    pub runtime_minutes: Option<MetricStats>,
    pub max_speed_ms: Option<MetricStats>,
    pub cruise_current_a: Option<MetricStats>,
}

/// Post-batch filtering, ranking and reporting over an
/// `IntegratedBatchResult`.
pub struct ResultAnalyzer<'a> {
    batch: &'a IntegratedBatchResult,
}

impl<'a> ResultAnalyzer<'a> {
    pub fn new(batch: &'a IntegratedBatchResult) -> Self {
        Self { batch }
    }

    // -------------------------------------------------------------------
    // Filtering
    // -------------------------------------------------------------------

    pub fn valid_results(&self) -> Vec<&IntegratedResult> {
        self.batch.results.iter().filter(|r| r.valid).collect()
    }

    pub fn invalid_results(&self) -> Vec<&IntegratedResult> {
        self.batch.results.iter().filter(|r| !r.valid).collect()
    }

    /// Valid results whose full-throttle point is thermally capped.
    pub fn thermal_limited_results(&self) -> Vec<&IntegratedResult> {
        self.batch
            .results
            .iter()
            .filter(|r| r.is_thermally_limited())
            .collect()
    }

    pub fn results_for_battery(
        &self,
        cell_id: Option<&str>,
        series: Option<u32>,
        parallel: Option<u32>,
        thermal_environment: Option<&str>,
    ) -> Vec<&IntegratedResult> {
        self.valid_results()
            .into_iter()
            .filter(|r| cell_id.map_or(true, |id| r.cell_id == id))
            .filter(|r| series.map_or(true, |s| r.series == s))
            .filter(|r| parallel.map_or(true, |p| r.parallel == p))
            .filter(|r| {
                thermal_environment.map_or(true, |env| r.thermal_environment.name() == env)
            })
            .collect()
    }

    pub fn results_for_motor_prop(&self, motor_id: &str, prop_id: &str) -> Vec<&IntegratedResult> {
        self.valid_results()
            .into_iter()
            .filter(|r| r.motor_id == motor_id && r.prop_id == prop_id)
            .collect()
    }

    // -------------------------------------------------------------------
    // Ranking
    // -------------------------------------------------------------------

    /// Valid results sorted by the metric, best first. The sort is stable,
    /// so ties keep permutation order and the ranking is reproducible
    /// across runs and worker counts.
    pub fn ranked_by(&self, metric: RankMetric) -> Vec<&IntegratedResult> {
        let mut results = self.valid_results();
        results.sort_by(|a, b| {
            let (va, vb) = (metric.value(a), metric.value(b));
            let ordering = va.partial_cmp(&vb).unwrap_or(std::cmp::Ordering::Equal);
            if metric.higher_is_better() {
                ordering.reverse()
            } else {
                ordering
            }
        });
        results
    }

    pub fn top_by(&self, metric: RankMetric, n: usize) -> Vec<&IntegratedResult> {
        let mut ranked = self.ranked_by(metric);
        ranked.truncate(n);
        ranked
    }

    /// Best motor/prop pick for each battery configuration, keyed by
    /// `cell_config_environment`.
    pub fn best_for_each_battery_config(&self) -> BTreeMap<String, &IntegratedResult> {
        let mut best: BTreeMap<String, &IntegratedResult> = BTreeMap::new();
        for result in self.valid_results() {
            let key = format!(
                "{}_{}_{}",
                result.cell_id,
                result.pack_config,
                result.thermal_environment.name()
            );
            match best.get(&key) {
                Some(current)
                    if current.cruise.system_efficiency >= result.cruise.system_efficiency => {}
                _ => {
                    best.insert(key, result);
                }
            }
        }
        best
    }

    /// Best battery pick for each motor/prop pairing.
    pub fn best_for_each_motor_prop(&self) -> BTreeMap<String, &IntegratedResult> {
        let mut best: BTreeMap<String, &IntegratedResult> = BTreeMap::new();
        for result in self.valid_results() {
            let key = format!("{}_{}", result.motor_id, result.prop_id);
            match best.get(&key) {
                Some(current)
                    if current.cruise.system_efficiency >= result.cruise.system_efficiency => {}
                _ => {
                    best.insert(key, result);
                }
            }
        }
        best
    }

    // -------------------------------------------------------------------
    // Statistics and reporting
    // -------------------------------------------------------------------

    pub fn statistics(&self) -> BatchStatistics {
        let valid = self.valid_results();

        let efficiencies: Vec<f64> = valid.iter().map(|r| r.cruise.system_efficiency).collect();
        let runtimes: Vec<f64> = valid.iter().map(|r| r.cruise_runtime_minutes).collect();
        let max_speeds: Vec<f64> = valid
            .iter()
            .map(|r| r.max_achievable_speed_ms)
            .filter(|&v| v > 0.0)
            .collect();
        let currents: Vec<f64> = valid.iter().map(|r| r.cruise.battery_current_a).collect();

        BatchStatistics {
            total: self.batch.results.len(),
            valid: valid.len(),
            invalid: self.batch.results.len() - valid.len(),
            thermal_limited: self.thermal_limited_results().len(),
            elapsed_seconds: self.batch.elapsed_seconds,
            efficiency: MetricStats::from_values(&efficiencies),
            runtime_minutes: MetricStats::from_values(&runtimes),
            max_speed_ms: MetricStats::from_values(&max_speeds),
            cruise_current_a: MetricStats::from_values(&currents),
        }
    }

    pub fn summary_report(&self) -> String {
        let stats = self.statistics();
        let mut lines = vec![
            "=".repeat(60),
            "INTEGRATED ANALYSIS SUMMARY".to_string(),
            "=".repeat(60),
            String::new(),
            format!("Total combinations: {}", stats.total),
            format!("Valid: {} | Invalid: {}", stats.valid, stats.invalid),
            format!("Thermally limited: {}", stats.thermal_limited),
            format!("Elapsed: {:.1} s", stats.elapsed_seconds),
            String::new(),
        ];

        if let Some(eff) = stats.efficiency {
            lines.push(format!(
                "Efficiency: {:.1}% - {:.1}% (avg {:.1}%)",
                eff.min * 100.0,
                eff.max * 100.0,
                eff.mean * 100.0
            ));
        }
        if let Some(runtime) = stats.runtime_minutes {
            lines.push(format!(
                "Runtime: {:.1} - {:.1} min (avg {:.1})",
                runtime.min, runtime.max, runtime.mean
            ));
        }
        if let Some(speed) = stats.max_speed_ms {
            lines.push(format!(
                "Max speed: {:.1} - {:.1} m/s ({:.0} - {:.0} mph)",
                speed.min,
                speed.max,
                ms_to_mph(speed.min),
                ms_to_mph(speed.max)
            ));
        }

        if let Some(best) = self.batch.best_by_efficiency() {
            lines.push(String::new());
            lines.push(format!("Best by efficiency: {}", best.summary_line()));
        }
        if let Some(best) = self.batch.best_by_runtime() {
            lines.push(format!("Best by runtime:    {}", best.summary_line()));
        }
        if let Some(best) = self.batch.best_by_max_speed() {
            lines.push(format!("Best by max speed:  {}", best.summary_line()));
        }

        lines.push("=".repeat(60));
        lines.join("\n")
    }
}
