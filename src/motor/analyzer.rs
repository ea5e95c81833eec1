use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::error::MotorError;
use super::params::MotorParameters;
use crate::utils::math::clamp01;

/// Electrical and mechanical state of a motor at one operating point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorState {
    pub rpm: f64,
    pub current_a: f64,
    pub torque_nm: f64,
    pub v_bemf: f64,
    pub i0_a: f64,
    pub i_torque_a: f64,
    pub rm_ohm: f64,
    pub p_elec_w: f64,
    pub p_mech_w: f64,
    pub efficiency: f64,
    pub p_loss_copper_w: f64,
    pub p_loss_iron_w: f64,
}

/// Operating envelope summary at a supply voltage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorLimits {
    pub rpm_no_load: f64,
    pub torque_stall_nm: f64,
    pub i_max_a: f64,
    pub p_max_w: f64,
    pub kt: f64,
    pub kv: f64,
    pub rm_cold_ohm: f64,
    pub rm_hot_ohm: f64,
}

/// Efficiency grid over (RPM, torque), for contour rendering by callers.
/// Cells beyond the motor's capability are `None`.
#[derive(Debug, Clone)]
pub struct EfficiencyMap {
    pub rpm_values: Vec<f64>,
    pub torque_values: Vec<f64>,
    /// Row-major: `efficiency[ti * rpm_values.len() + ri]`.
    pub efficiency: Vec<Option<f64>>,
    pub current: Vec<Option<f64>>,
}

/// Equilibrium solver settings; the defaults match the damped-Newton scheme
/// the model was tuned with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MotorSolverSettings {
    pub max_iterations: usize,
    pub damping: f64,
    pub rpm_tolerance: f64,
    /// Abandon threshold as a multiple of `i_max`.
    pub overcurrent_factor: f64,
}

impl Default for MotorSolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            damping: 0.7,
            rpm_tolerance: 1.0,
            overcurrent_factor: 1.5,
        }
    }
}

impl MotorParameters {
    /// Motor state with the RPM imposed by the load (direct-drive prop).
    ///
    /// Fails when the back-EMF at this RPM meets or exceeds the supply.
    pub fn state_at_rpm(
        &self,
        v_supply: f64,
        rpm: f64,
        winding_temp_c: f64,
    ) -> Result<MotorState, MotorError> {
        let rm = self.resistance_at(winding_temp_c);
        let v_bemf = rpm / self.kv;

        if v_bemf >= v_supply {
            return Err(MotorError::BackEmfExceedsSupply {
                v_bemf,
                v_supply,
                rpm,
            });
        }

        let current = (v_supply - v_bemf) / rm;
        let i0 = self.i0_at(rpm);
        let i_torque = current - i0;
        let kt_eff = self.kt_effective(current);
        let torque = i_torque * kt_eff;

        let p_elec = v_supply * current;
        let p_mech = torque * (rpm * 2.0 * PI / 60.0);
        let efficiency = if p_elec > 0.0 {
            clamp01(p_mech / p_elec)
        } else {
            0.0
        };

        Ok(MotorState {
            rpm,
            current_a: current,
            torque_nm: torque,
            v_bemf,
            i0_a: i0,
            i_torque_a: i_torque,
            rm_ohm: rm,
            p_elec_w: p_elec,
            p_mech_w: p_mech,
            efficiency,
            p_loss_copper_w: current * current * rm,
            p_loss_iron_w: i0 * v_bemf,
        })
    }

    /// Equilibrium operating point against a constant load torque.
    ///
    /// Damped Newton iteration on RPM with the analytic slope
    /// ∂τ/∂RPM ≈ −Kt/(Rm·Kv), bounded to [100, 1.1·Kv·V]. Abandons when the
    /// implied current passes the overcurrent threshold.
    pub fn solve_operating_point(
        &self,
        v_supply: f64,
        torque_load_nm: f64,
        winding_temp_c: f64,
        settings: &MotorSolverSettings,
    ) -> Result<MotorState, MotorError> {
        let rm = self.resistance_at(winding_temp_c);
        let kt = self.kt();

        // Start from 80% of no-load speed
        let mut rpm = self.kv * v_supply * 0.8;

        for _ in 0..settings.max_iterations {
            let v_bemf = rpm / self.kv;
            if v_supply <= v_bemf {
                rpm *= 0.9;
                continue;
            }

            let current = (v_supply - v_bemf) / rm;
            if current > self.i_max * settings.overcurrent_factor {
                return Err(MotorError::ExcessiveCurrent {
                    current,
                    limit: self.i_max * settings.overcurrent_factor,
                });
            }

            let i_torque = current - self.i0_at(rpm);
            let torque_motor = i_torque * self.kt_effective(current);
            let torque_error = torque_motor - torque_load_nm;

            let d_torque_d_rpm = -kt / (rm * self.kv);
            let rpm_correction = if d_torque_d_rpm.abs() > 1e-10 {
                -torque_error / d_torque_d_rpm
            } else {
                0.0
            };

            let rpm_new = (rpm + settings.damping * rpm_correction)
                .clamp(100.0, self.kv * v_supply * 1.1);

            if (rpm_new - rpm).abs() < settings.rpm_tolerance {
                return self.state_at_rpm(v_supply, rpm_new, winding_temp_c);
            }
            rpm = rpm_new;
        }

        Err(MotorError::NonConvergent {
            iterations: settings.max_iterations,
        })
    }

    /// Output torque for a given current draw at an RPM.
    pub fn torque_from_current(&self, current_a: f64, rpm: f64) -> f64 {
        let i_torque = current_a - self.i0_at(rpm);
        i_torque * self.kt_effective(current_a)
    }

    /// Current required to produce a torque at an RPM.
    pub fn current_from_torque(&self, torque_nm: f64, rpm: f64) -> f64 {
        torque_nm / self.kt() + self.i0_at(rpm)
    }

    /// Torque available at rated current for this RPM.
    pub fn max_torque_at_rpm(&self, rpm: f64) -> f64 {
        let i_torque_max = self.i_max - self.i0_at(rpm);
        i_torque_max * self.kt_effective(self.i_max)
    }

    /// Operating envelope at a supply voltage, with hot resistance taken at
    /// the given winding temperature.
    pub fn limits(&self, v_supply: f64, winding_temp_c: f64) -> MotorLimits {
        let rm_hot = self.resistance_at(winding_temp_c);
        let i_stall = v_supply / rm_hot;
        MotorLimits {
            rpm_no_load: self.kv * v_supply,
            torque_stall_nm: i_stall * self.kt(),
            i_max_a: self.i_max,
            p_max_w: self.p_max,
            kt: self.kt(),
            kv: self.kv,
            rm_cold_ohm: self.rm_cold,
            rm_hot_ohm: rm_hot,
        }
    }

    /// Efficiency at an (RPM, torque) point fed from `v_supply`.
    pub fn efficiency_at(
        &self,
        rpm: f64,
        torque_nm: f64,
        v_supply: f64,
    ) -> f64 {
        let current = self.current_from_torque(torque_nm, rpm);
        let p_elec = v_supply * current;
        let p_mech = torque_nm * (rpm * 2.0 * PI / 60.0);
        if p_elec > 0.0 {
            p_mech / p_elec
        } else {
            0.0
        }
    }

    /// Efficiency grid across RPM and torque ranges. Ranges default to
    /// 10–95 % of no-load speed and 5–90 % of the max torque at the low end
    /// of the RPM range.
    pub fn efficiency_map(
        &self,
        v_supply: f64,
        rpm_range: Option<(f64, f64)>,
        torque_range: Option<(f64, f64)>,
        num_points: usize,
    ) -> EfficiencyMap {
        let rpm_no_load = self.kv * v_supply;
        let (rpm_lo, rpm_hi) = rpm_range.unwrap_or((rpm_no_load * 0.1, rpm_no_load * 0.95));
        let (tq_lo, tq_hi) = torque_range.unwrap_or_else(|| {
            let max_torque = self.max_torque_at_rpm(rpm_lo);
            (0.05 * max_torque, 0.9 * max_torque)
        });

        let n = num_points.max(2);
        let rpm_values: Vec<f64> = (0..n)
            .map(|i| rpm_lo + (rpm_hi - rpm_lo) * i as f64 / (n - 1) as f64)
            .collect();
        let torque_values: Vec<f64> = (0..n)
            .map(|i| tq_lo + (tq_hi - tq_lo) * i as f64 / (n - 1) as f64)
            .collect();

        let mut efficiency = vec![None; n * n];
        let mut current = vec![None; n * n];

        for (ti, &torque) in torque_values.iter().enumerate() {
            for (ri, &rpm) in rpm_values.iter().enumerate() {
                if torque > self.max_torque_at_rpm(rpm) {
                    continue;
                }
                let i = self.current_from_torque(torque, rpm);
                let idx = ti * n + ri;
                current[idx] = Some(i);
                if i > self.i_max {
                    continue;
                }
                efficiency[idx] = Some(self.efficiency_at(rpm, torque, v_supply));
            }
        }

        EfficiencyMap {
            rpm_values,
            torque_values,
            efficiency,
            current,
        }
    }

    /// Steady-state winding temperature from total loss and a thermal
    /// resistance to ambient.
    pub fn estimate_winding_temp(
        &self,
        p_loss_w: f64,
        ambient_temp_c: f64,
        thermal_resistance_c_per_w: f64,
    ) -> f64 {
        ambient_temp_c + p_loss_w * thermal_resistance_c_per_w
    }
}
