use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

use super::result::{FlightResult, SolveIssue};
use crate::drag::DragModel;
use crate::motor::{MotorCatalog, MotorError, MotorParameters};
use crate::prop::{PropDatabase, PropError, PropTable};
use crate::utils::math::clamp01;

/// Structural failures only; numeric failures are reported through
/// `FlightResult::issue`.
#[derive(Error, Debug)]
pub enum FlightSolverError {
    #[error(transparent)]
    Motor(#[from] MotorError),

    #[error(transparent)]
    Prop(#[from] PropError),
}

/// Shared flight conditions for a solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConditions {
    pub altitude_m: f64,
    pub temp_offset_k: f64,
    pub winding_temp_c: f64,
    pub num_motors: u32,
}

impl Default for FlightConditions {
    fn default() -> Self {
        Self {
            altitude_m: 0.0,
            temp_offset_k: 0.0,
            winding_temp_c: 80.0,
            num_motors: 1,
        }
    }
}

/// One point of a throttle sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrottlePoint {
    pub throttle_pct: f64,
    pub airspeed_ms: f64,
    pub thrust_n: f64,
    pub battery_current_a: f64,
    pub battery_power_w: f64,
    pub system_efficiency: f64,
    pub valid: bool,
}

/// Level-flight equilibrium solver coupling the drag model, the propeller
/// database and the motor catalog.
///
/// For level cruise the fixed point is thrust = drag at the requested
/// airspeed: the prop table is inverted for the equilibrium RPM, and the
/// motor current follows from the shaft torque at that RPM.
pub struct FlightSolver<'a> {
    motors: &'a MotorCatalog,
    props: &'a PropDatabase,
}

impl<'a> FlightSolver<'a> {
    pub fn new(motors: &'a MotorCatalog, props: &'a PropDatabase) -> Self {
        Self { motors, props }
    }

    /// Solve cruise equilibrium at one airspeed.
    ///
    /// An `Err` means a structural problem (unknown motor or prop id);
    /// every numeric outcome, including infeasible ones, comes back as a
    /// `FlightResult` with `valid`/`issue` set.
    pub fn solve_cruise(
        &self,
        motor_id: &str,
        prop_id: &str,
        drag_model: &DragModel,
        v_battery: f64,
        airspeed_ms: f64,
        conditions: &FlightConditions,
    ) -> Result<FlightResult, FlightSolverError> {
        let motor = self.motors.get(motor_id)?;
        let prop = self.props.get(prop_id)?;
        Ok(self.solve_cruise_inner(motor_id, motor, prop, drag_model, v_battery, airspeed_ms, conditions))
    }

    fn solve_cruise_inner(
        &self,
        motor_id: &str,
        motor: &MotorParameters,
        prop: &PropTable,
        drag_model: &DragModel,
        v_battery: f64,
        airspeed_ms: f64,
        conditions: &FlightConditions,
    ) -> FlightResult {
        let mut result = FlightResult::skeleton(
            motor_id,
            prop.id(),
            airspeed_ms,
            conditions.altitude_m,
            v_battery,
            conditions.num_motors,
        );

        // 1. Drag at the cruise condition; level flight means T = D
        let drag = drag_model.drag(airspeed_ms, conditions.altitude_m, conditions.temp_offset_k);
        result.drag_n = drag;
        result.thrust_required_n = drag;
        let thrust_per_motor = drag / conditions.num_motors as f64;
        result.per_motor_thrust_n = thrust_per_motor;

        // 2. Prop operating point for the required thrust
        let (prop_power, prop_rpm) = match prop.power_for_thrust(airspeed_ms, thrust_per_motor) {
            Ok(solution) => solution,
            Err(err) => {
                result.issue = Some(match err {
                    PropError::ThrustUnachievable { .. } => SolveIssue::ThrustUnachievable,
                    PropError::OutOfEnvelope { .. } => SolveIssue::PropOutOfEnvelope,
                    _ => SolveIssue::SolverNonConvergent,
                });
                return result;
            }
        };
        result.prop_rpm = prop_rpm;
        result.prop_power_w = prop_power;
        result.prop_efficiency = prop.efficiency_at(airspeed_ms, prop_rpm);

        // 3. Motor validity at the equilibrium RPM (back-EMF headroom)
        let full_state = match motor.state_at_rpm(v_battery, prop_rpm, conditions.winding_temp_c) {
            Ok(state) => state,
            Err(_) => {
                result.issue = Some(SolveIssue::BackEmfSaturation);
                return result;
            }
        };

        // 4. Current from the shaft torque the prop actually demands.
        // Kt sags with current, so refine the estimate a few times.
        let omega = prop_rpm * 2.0 * PI / 60.0;
        let torque = if omega > 0.0 { prop_power / omega } else { 0.0 };
        let mut current = torque / motor.kt() + full_state.i0_a;
        for _ in 0..3 {
            current = torque / motor.kt_effective(current) + full_state.i0_a;
        }

        // 5. Terminal voltage and throttle
        let v_motor = full_state.v_bemf + current * full_state.rm_ohm;
        let throttle = v_motor / v_battery * 100.0;
        let p_elec = v_motor * current;
        let p_mech = torque * omega;

        result.motor_current_a = current;
        result.per_motor_current_a = current;
        result.motor_voltage = v_motor;
        result.motor_power_elec_w = p_elec;
        result.motor_power_mech_w = p_mech;
        result.motor_efficiency = if p_elec > 0.0 {
            clamp01(p_mech / p_elec)
        } else {
            0.0
        };
        result.motor_torque_nm = torque;
        result.throttle_pct = throttle;

        // 6. System totals across all motors
        result.battery_current_a = current * conditions.num_motors as f64;
        result.battery_power_w = p_elec * conditions.num_motors as f64;
        result.system_efficiency = if result.battery_power_w > 0.0 {
            drag * airspeed_ms / result.battery_power_w
        } else {
            0.0
        };

        // Soft limit flags: the point is solved, but not flyable as-is
        if throttle > 100.0 {
            result.issue = Some(SolveIssue::ThrottleSaturated);
        } else if current > motor.i_max {
            result.issue = Some(SolveIssue::OverCurrent);
        }

        result.valid = true;
        result
    }

    /// Solve a grid of airspeeds.
    pub fn solve_speed_sweep(
        &self,
        motor_id: &str,
        prop_id: &str,
        drag_model: &DragModel,
        v_battery: f64,
        speed_range: (f64, f64),
        num_points: usize,
        conditions: &FlightConditions,
    ) -> Result<Vec<FlightResult>, FlightSolverError> {
        let motor = self.motors.get(motor_id)?;
        let prop = self.props.get(prop_id)?;

        let n = num_points.max(2);
        let (lo, hi) = speed_range;
        Ok((0..n)
            .map(|i| {
                let speed = lo + (hi - lo) * i as f64 / (n - 1) as f64;
                self.solve_cruise_inner(motor_id, motor, prop, drag_model, v_battery, speed, conditions)
            })
            .collect())
    }

    /// Maximum airspeed holding a valid equilibrium at ≤100 % throttle.
    /// Bisection over [1, 100] m/s to 0.1 m/s.
    pub fn find_max_speed(
        &self,
        motor_id: &str,
        prop_id: &str,
        drag_model: &DragModel,
        v_battery: f64,
        conditions: &FlightConditions,
    ) -> Result<FlightResult, FlightSolverError> {
        let motor = self.motors.get(motor_id)?;
        let prop = self.props.get(prop_id)?;

        let mut speed_low = 1.0_f64;
        let mut speed_high = 100.0_f64;
        let mut best: Option<FlightResult> = None;

        for _ in 0..20 {
            let speed_mid = (speed_low + speed_high) / 2.0;
            let result = self.solve_cruise_inner(
                motor_id, motor, prop, drag_model, v_battery, speed_mid, conditions,
            );

            if result.valid && result.issue.is_none() && result.throttle_pct <= 100.0 {
                best = Some(result);
                speed_low = speed_mid;
            } else {
                speed_high = speed_mid;
            }

            if speed_high - speed_low < 0.1 {
                break;
            }
        }

        Ok(best.unwrap_or_else(|| {
            let mut result = FlightResult::skeleton(
                motor_id,
                prop.id(),
                0.0,
                conditions.altitude_m,
                v_battery,
                conditions.num_motors,
            );
            result.issue = Some(SolveIssue::ThrottleSaturated);
            result
        }))
    }

    /// Airspeed with the highest system efficiency, from a dense sweep of
    /// [5, 50] m/s.
    pub fn find_best_efficiency_speed(
        &self,
        motor_id: &str,
        prop_id: &str,
        drag_model: &DragModel,
        v_battery: f64,
        conditions: &FlightConditions,
    ) -> Result<Option<FlightResult>, FlightSolverError> {
        let sweep = self.solve_speed_sweep(
            motor_id,
            prop_id,
            drag_model,
            v_battery,
            (5.0, 50.0),
            30,
            conditions,
        )?;

        Ok(sweep
            .into_iter()
            .filter(|r| r.valid && r.issue.is_none())
            .max_by(|a, b| a.system_efficiency.total_cmp(&b.system_efficiency)))
    }

    /// Sweep throttle settings, finding the equilibrium airspeed for each
    /// by multiplicative adjustment of a speed guess until thrust matches
    /// drag, then solving that cruise point.
    #[allow(clippy::too_many_arguments)]
    pub fn solve_throttle_sweep(
        &self,
        motor_id: &str,
        prop_id: &str,
        drag_model: &DragModel,
        v_battery: f64,
        throttle_range: (f64, f64),
        num_points: usize,
        conditions: &FlightConditions,
    ) -> Result<Vec<ThrottlePoint>, FlightSolverError> {
        let motor = self.motors.get(motor_id)?;
        let prop = self.props.get(prop_id)?;

        let n = num_points.max(2);
        let (lo, hi) = throttle_range;
        let mut points = Vec::with_capacity(n);

        for i in 0..n {
            let throttle = lo + (hi - lo) * i as f64 / (n - 1) as f64;
            let v_motor = v_battery * throttle / 100.0;
            let rpm_guess = motor.kv * v_motor * 0.85;

            let mut airspeed_guess = 10.0_f64;
            for _ in 0..30 {
                let thrust = prop.thrust_or_sentinel(airspeed_guess, rpm_guess);
                if thrust < 0.0 {
                    break;
                }
                let total_thrust = thrust * conditions.num_motors as f64;
                let drag = drag_model.drag(
                    airspeed_guess,
                    conditions.altitude_m,
                    conditions.temp_offset_k,
                );
                if (total_thrust - drag).abs() < 0.1 {
                    break;
                }
                if total_thrust > drag {
                    airspeed_guess *= 1.05;
                } else {
                    airspeed_guess *= 0.95;
                }
                airspeed_guess = airspeed_guess.clamp(1.0, 100.0);
            }

            let result = self.solve_cruise_inner(
                motor_id,
                motor,
                prop,
                drag_model,
                v_battery,
                airspeed_guess,
                conditions,
            );
            let usable = result.valid && result.issue.is_none();
            points.push(ThrottlePoint {
                throttle_pct: throttle,
                airspeed_ms: if usable { result.airspeed_ms } else { 0.0 },
                thrust_n: if usable { result.thrust_required_n } else { 0.0 },
                battery_current_a: if usable { result.battery_current_a } else { 0.0 },
                battery_power_w: if usable { result.battery_power_w } else { 0.0 },
                system_efficiency: if usable { result.system_efficiency } else { 0.0 },
                valid: usable,
            });
        }

        Ok(points)
    }
}
