use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::battery::ThermalEnvironment;

#[derive(Error, Debug)]
pub enum BatchConfigError {
    #[error("Invalid batch configuration: {0}")]
    Validation(String),

    #[error("Failed to read batch configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse batch configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Cruise speed selection: one speed, or a swept range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CruiseSpeedSpec {
    Single(f64),
    Range { min_ms: f64, max_ms: f64, step_ms: f64 },
}

impl CruiseSpeedSpec {
    /// Materialize the selected speed list.
    pub fn speeds(&self) -> Vec<f64> {
        match *self {
            Self::Single(v) => vec![v],
            Self::Range { min_ms, max_ms, step_ms } => {
                let mut speeds = Vec::new();
                let mut v = min_ms;
                while v <= max_ms + 1e-9 {
                    speeds.push(v);
                    v += step_ms;
                }
                speeds
            }
        }
    }
}

/// Propeller filter on parsed diameter/pitch (inches). Props whose names
/// cannot be parsed are excluded whenever a filter range is set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PropFilter {
    pub diameter_in: Option<(f64, f64)>,
    pub pitch_in: Option<(f64, f64)>,
}

impl PropFilter {
    pub fn accepts(&self, dims: Option<(f64, f64)>) -> bool {
        match (self.diameter_in, self.pitch_in) {
            (None, None) => true,
            _ => {
                let Some((diameter, pitch)) = dims else {
                    return false;
                };
                if let Some((lo, hi)) = self.diameter_in {
                    if diameter < lo || diameter > hi {
                        return false;
                    }
                }
                if let Some((lo, hi)) = self.pitch_in {
                    if pitch < lo || pitch > hi {
                        return false;
                    }
                }
                true
            }
        }
    }
}

/// Battery iteration dimensions for the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryIterationConfig {
    pub cell_ids: Vec<String>,
    #[serde(default)]
    pub series_options: Vec<u32>,
    #[serde(default)]
    pub parallel_options: Vec<u32>,
    /// Overrides `parallel_options` per series count when present.
    #[serde(default)]
    pub parallel_by_series: Option<BTreeMap<u32, Vec<u32>>>,
    pub thermal_environments: Vec<ThermalEnvironment>,
    #[serde(default = "default_analysis_soc")]
    pub analysis_soc: f64,
    #[serde(default = "default_ambient")]
    pub ambient_temp_c: f64,
    #[serde(default = "default_max_cell_temp")]
    pub max_cell_temp_c: f64,
    #[serde(default = "default_cutoff")]
    pub cutoff_voltage_per_cell: f64,
}

fn default_analysis_soc() -> f64 {
    50.0
}
fn default_ambient() -> f64 {
    25.0
}
fn default_max_cell_temp() -> f64 {
    60.0
}
fn default_cutoff() -> f64 {
    3.0
}

impl BatteryIterationConfig {
    /// The (S, P) pairs this configuration spans.
    pub fn arrangements(&self) -> Vec<(u32, u32)> {
        let mut pairs = Vec::new();
        match &self.parallel_by_series {
            Some(map) => {
                for (&series, parallels) in map {
                    for &parallel in parallels {
                        pairs.push((series, parallel));
                    }
                }
            }
            None => {
                for &series in &self.series_options {
                    for &parallel in &self.parallel_options {
                        pairs.push((series, parallel));
                    }
                }
            }
        }
        pairs
    }
}

/// Optional per-combination speed sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedSweepSpec {
    pub min_ms: f64,
    pub max_ms: f64,
    pub step_ms: f64,
}

/// Complete configuration for an integrated batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratedConfig {
    // Airframe
    pub wing_area_m2: f64,
    pub wingspan_m: f64,
    /// Aircraft mass without the battery (kg).
    pub dry_mass_kg: f64,
    #[serde(default = "default_cd0")]
    pub cd0: f64,
    #[serde(default = "default_oswald")]
    pub oswald_efficiency: f64,
    #[serde(default = "default_num_motors")]
    pub num_motors: u32,
    #[serde(default)]
    pub altitude_m: f64,
    #[serde(default = "default_winding_temp")]
    pub winding_temp_c: f64,

    // Component filters
    pub motor_categories: Vec<String>,
    #[serde(default)]
    pub prop_filter: PropFilter,

    // Battery iteration
    pub battery: BatteryIterationConfig,

    // Speeds
    pub cruise_speeds: CruiseSpeedSpec,
    #[serde(default)]
    pub evaluate_max_speed: bool,
    #[serde(default)]
    pub speed_sweep: Option<SpeedSweepSpec>,
}

fn default_cd0() -> f64 {
    0.025
}
fn default_oswald() -> f64 {
    0.8
}
fn default_num_motors() -> u32 {
    1
}
fn default_winding_temp() -> f64 {
    80.0
}

impl IntegratedConfig {
    pub fn validate(&self) -> Result<(), BatchConfigError> {
        let err = |msg: String| Err(BatchConfigError::Validation(msg));

        if self.wing_area_m2 <= 0.0 {
            return err(format!("wing_area_m2 must be positive, got {}", self.wing_area_m2));
        }
        if self.wingspan_m <= 0.0 {
            return err(format!("wingspan_m must be positive, got {}", self.wingspan_m));
        }
        if self.dry_mass_kg <= 0.0 {
            return err(format!("dry_mass_kg must be positive, got {}", self.dry_mass_kg));
        }
        if self.oswald_efficiency <= 0.0 || self.oswald_efficiency > 1.0 {
            return err(format!(
                "oswald_efficiency must be in (0, 1], got {}",
                self.oswald_efficiency
            ));
        }
        if self.num_motors == 0 {
            return err("num_motors must be at least 1".to_string());
        }
        if self.motor_categories.is_empty() {
            return err("motor_categories must name at least one category".to_string());
        }
        if self.battery.cell_ids.is_empty() {
            return err("battery.cell_ids must name at least one cell".to_string());
        }
        if self.battery.thermal_environments.is_empty() {
            return err("battery.thermal_environments must name at least one environment".to_string());
        }
        if self.battery.arrangements().is_empty() {
            return err("battery iteration spans no (series, parallel) arrangements".to_string());
        }
        for (series, parallel) in self.battery.arrangements() {
            if !(1..=12).contains(&series) {
                return err(format!("series option {series} outside 1-12"));
            }
            if !(1..=8).contains(&parallel) {
                return err(format!("parallel option {parallel} outside 1-8"));
            }
        }
        if !(0.0..=100.0).contains(&self.battery.analysis_soc) {
            return err(format!(
                "analysis_soc must be 0-100, got {}",
                self.battery.analysis_soc
            ));
        }
        if self.cruise_speeds.speeds().is_empty() {
            return err("cruise_speeds spans no speeds".to_string());
        }
        if let CruiseSpeedSpec::Range { min_ms, max_ms, step_ms } = self.cruise_speeds {
            if step_ms <= 0.0 || max_ms < min_ms {
                return err(format!(
                    "invalid cruise speed range {min_ms}..{max_ms} step {step_ms}"
                ));
            }
        }
        if let Some(sweep) = self.speed_sweep {
            if sweep.step_ms <= 0.0 || sweep.max_ms < sweep.min_ms {
                return err(format!(
                    "invalid speed sweep {}..{} step {}",
                    sweep.min_ms, sweep.max_ms, sweep.step_ms
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn base_config() -> IntegratedConfig {
        IntegratedConfig {
            wing_area_m2: 0.15,
            wingspan_m: 1.0,
            dry_mass_kg: 0.6,
            cd0: 0.025,
            oswald_efficiency: 0.8,
            num_motors: 1,
            altitude_m: 0.0,
            winding_temp_c: 80.0,
            motor_categories: vec!["fixed_wing_sport".to_string()],
            prop_filter: PropFilter::default(),
            battery: BatteryIterationConfig {
                cell_ids: vec!["Molicel P45B".to_string()],
                series_options: vec![4, 6],
                parallel_options: vec![1, 2],
                parallel_by_series: None,
                thermal_environments: vec![ThermalEnvironment::DroneInFlight],
                analysis_soc: 50.0,
                ambient_temp_c: 25.0,
                max_cell_temp_c: 60.0,
                cutoff_voltage_per_cell: 3.0,
            },
            cruise_speeds: CruiseSpeedSpec::Single(16.0),
            evaluate_max_speed: false,
            speed_sweep: None,
        }
    }

    #[test]
    fn valid_config_passes() {
        base_config().validate().unwrap();
    }

    #[test]
    fn arrangements_cross_series_and_parallel() {
        let config = base_config();
        assert_eq!(
            config.battery.arrangements(),
            vec![(4, 1), (4, 2), (6, 1), (6, 2)]
        );
    }

    #[test]
    fn per_series_map_overrides_parallel_options() {
        let mut config = base_config();
        let mut map = BTreeMap::new();
        map.insert(4, vec![2, 3]);
        map.insert(6, vec![1]);
        config.battery.parallel_by_series = Some(map);
        assert_eq!(
            config.battery.arrangements(),
            vec![(4, 2), (4, 3), (6, 1)]
        );
    }

    #[test]
    fn speed_range_materializes_inclusive_grid() {
        let spec = CruiseSpeedSpec::Range {
            min_ms: 10.0,
            max_ms: 20.0,
            step_ms: 5.0,
        };
        assert_eq!(spec.speeds(), vec![10.0, 15.0, 20.0]);
        assert_eq!(CruiseSpeedSpec::Single(14.0).speeds(), vec![14.0]);
    }

    #[test]
    fn prop_filter_logic() {
        let open = PropFilter::default();
        assert!(open.accepts(None));
        assert!(open.accepts(Some((10.0, 5.0))));

        let narrow = PropFilter {
            diameter_in: Some((9.0, 11.0)),
            pitch_in: Some((4.0, 6.0)),
        };
        assert!(narrow.accepts(Some((10.0, 5.0))));
        assert!(!narrow.accepts(Some((12.0, 5.0))));
        assert!(!narrow.accepts(Some((10.0, 7.0))));
        // Unparsable names are excluded once a filter is active
        assert!(!narrow.accepts(None));
    }

    #[test]
    fn validation_rejects_bad_ranges() {
        let mut config = base_config();
        config.battery.series_options = vec![13];
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.oswald_efficiency = 1.5;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.motor_categories.clear();
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.cruise_speeds = CruiseSpeedSpec::Range {
            min_ms: 20.0,
            max_ms: 10.0,
            step_ms: 2.0,
        };
        assert!(config.validate().is_err());
    }
}
