use serde::{Deserialize, Serialize};

use crate::battery::{BatteryPack, LimitingFactor};

/// Thermal status of a pack at one operating current.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalEvaluation {
    pub current_a: f64,
    pub steady_state_temp_c: f64,
    pub heat_generation_w: f64,
    /// Distance to the configured maximum cell temperature (°C).
    pub thermal_margin_c: f64,
    pub within_limits: bool,
    pub limiting_factor: LimitingFactor,
    pub max_continuous_current_a: f64,
}

/// Evaluates battery thermal limits at flight operating points.
///
/// A pack can be fine at cruise yet exceed its limits at full throttle;
/// in that case a bisection finds the highest throttle that still holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThermalEvaluator;

impl ThermalEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Thermal status at a constant current, using the pack's
    /// self-consistent steady-state temperature (IR re-evaluated at the
    /// settled temperature, not at ambient).
    pub fn evaluate_at_current(
        &self,
        pack: &BatteryPack,
        current_a: f64,
        soc: f64,
    ) -> ThermalEvaluation {
        let config = pack.config();

        if current_a <= 0.0 {
            // No heating at all, so the margin is unbounded
            return ThermalEvaluation {
                current_a: 0.0,
                steady_state_temp_c: config.ambient_temp_c,
                heat_generation_w: 0.0,
                thermal_margin_c: f64::INFINITY,
                within_limits: true,
                limiting_factor: LimitingFactor::None,
                max_continuous_current_a: pack.max_continuous_current(soc).0,
            };
        }

        let steady_temp = pack.steady_state_temp(current_a, soc);
        let heat_w = pack.heat_generation_w(current_a, soc, Some(steady_temp));
        let (max_i, mut limiting_factor) = pack.max_continuous_current(soc);

        let temp_ok = steady_temp <= config.max_cell_temp_c;
        let current_ok = current_a <= max_i;
        let within_limits = temp_ok && current_ok;

        if !within_limits && !temp_ok {
            limiting_factor = LimitingFactor::Thermal;
        }

        ThermalEvaluation {
            current_a,
            steady_state_temp_c: steady_temp,
            heat_generation_w: heat_w,
            thermal_margin_c: config.max_cell_temp_c - steady_temp,
            within_limits,
            limiting_factor,
            max_continuous_current_a: max_i,
        }
    }

    /// Quick validity check for a cruise current.
    pub fn is_cruise_valid(&self, pack: &BatteryPack, cruise_current: f64, soc: f64) -> bool {
        self.evaluate_at_current(pack, cruise_current, soc)
            .within_limits
    }

    /// Highest throttle that stays within limits, between the cruise
    /// setting and 100 %.
    ///
    /// Returns (0, 0) when even cruise exceeds limits, (100, I_max) when
    /// full throttle is fine. Otherwise a bisection over throttle with the
    /// supplied throttle→current map (linear interpolation between the
    /// cruise and full-throttle currents when none is given).
    #[allow(clippy::too_many_arguments)]
    pub fn find_max_safe_throttle(
        &self,
        pack: &BatteryPack,
        soc: f64,
        cruise_throttle: f64,
        cruise_current: f64,
        max_throttle_current: f64,
        throttle_to_current: Option<&dyn Fn(f64) -> f64>,
        tolerance_pct: f64,
    ) -> (f64, f64) {
        if !self.is_cruise_valid(pack, cruise_current, soc) {
            return (0.0, 0.0);
        }
        if self
            .evaluate_at_current(pack, max_throttle_current, soc)
            .within_limits
        {
            return (100.0, max_throttle_current);
        }

        let linear = |throttle: f64| {
            if (100.0 - cruise_throttle).abs() < f64::EPSILON {
                return cruise_current;
            }
            let frac = (throttle - cruise_throttle) / (100.0 - cruise_throttle);
            cruise_current + frac * (max_throttle_current - cruise_current)
        };

        let mut low = cruise_throttle;
        let mut high = 100.0;
        let mut safe_throttle = cruise_throttle;
        let mut safe_current = cruise_current;

        for _ in 0..20 {
            let mid = (low + high) / 2.0;
            let mid_current = match throttle_to_current {
                Some(map) => map(mid),
                None => linear(mid),
            };

            if self
                .evaluate_at_current(pack, mid_current, soc)
                .within_limits
            {
                safe_throttle = mid;
                safe_current = mid_current;
                low = mid;
            } else {
                high = mid;
            }

            if high - low < tolerance_pct {
                break;
            }
        }

        (safe_throttle, safe_current)
    }

    /// Current at which the thermal limit engages, verified by bisection
    /// against the self-consistent evaluation. When the pack is not
    /// thermally limited this is just its rating/voltage ceiling.
    pub fn find_thermal_limit_current(&self, pack: &BatteryPack, soc: f64) -> f64 {
        let (max_i, limiting_factor) = pack.max_continuous_current(soc);
        if limiting_factor != LimitingFactor::Thermal {
            return max_i;
        }

        let mut low = 0.0;
        let mut high = max_i * 1.5;

        for _ in 0..20 {
            let mid = (low + high) / 2.0;
            if self.evaluate_at_current(pack, mid, soc).within_limits {
                low = mid;
            } else {
                high = mid;
            }
            if high - low < 0.5 {
                break;
            }
        }

        low
    }

    /// Temperature-vs-current curve over a range, for screening plots.
    pub fn thermal_curve(
        &self,
        pack: &BatteryPack,
        soc: f64,
        current_range: (f64, f64),
        num_points: usize,
    ) -> Vec<ThermalEvaluation> {
        let n = num_points.max(2);
        let (lo, hi) = current_range;
        (0..n)
            .map(|i| {
                let current = lo + (hi - lo) * i as f64 / (n - 1) as f64;
                self.evaluate_at_current(pack, current, soc)
            })
            .collect()
    }
}
