use serde::{Deserialize, Serialize};

/// Why an operating point failed, or which soft limit it tripped.
///
/// `ThrottleSaturated` and `OverCurrent` are soft flags on an otherwise
/// solved cruise point; the batch engine treats them as invalidating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveIssue {
    PropOutOfEnvelope,
    ThrustUnachievable,
    BackEmfSaturation,
    OverCurrent,
    ThrottleSaturated,
    PackVoltageFloor,
    PackRatingExceeded,
    ThermalExceeded,
    SolverNonConvergent,
    MissingComponent,
}

impl SolveIssue {
    pub fn tag(self) -> &'static str {
        match self {
            Self::PropOutOfEnvelope => "prop_envelope",
            Self::ThrustUnachievable => "thrust_unachievable",
            Self::BackEmfSaturation => "back_emf_saturation",
            Self::OverCurrent => "over_current",
            Self::ThrottleSaturated => "throttle_saturated",
            Self::PackVoltageFloor => "pack_voltage_floor",
            Self::PackRatingExceeded => "pack_rating_exceeded",
            Self::ThermalExceeded => "thermal_exceeded",
            Self::SolverNonConvergent => "solver_non_convergent",
            Self::MissingComponent => "missing_component",
        }
    }
}

impl std::fmt::Display for SolveIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Complete level-flight equilibrium solution for one airspeed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightResult {
    pub valid: bool,
    pub issue: Option<SolveIssue>,

    // Flight condition
    pub airspeed_ms: f64,
    pub altitude_m: f64,

    // Airframe
    pub drag_n: f64,
    /// Equals drag for level flight.
    pub thrust_required_n: f64,

    // Propeller
    pub prop_id: String,
    pub prop_rpm: f64,
    pub prop_power_w: f64,
    pub prop_efficiency: f64,

    // Motor
    pub motor_id: String,
    pub motor_current_a: f64,
    pub motor_voltage: f64,
    pub motor_power_elec_w: f64,
    pub motor_power_mech_w: f64,
    pub motor_efficiency: f64,
    pub motor_torque_nm: f64,

    // System
    pub throttle_pct: f64,
    pub battery_voltage: f64,
    pub battery_current_a: f64,
    pub battery_power_w: f64,
    /// Useful propulsive power over battery electrical power.
    pub system_efficiency: f64,

    // Multi-motor
    pub num_motors: u32,
    pub per_motor_current_a: f64,
    pub per_motor_thrust_n: f64,
}

impl FlightResult {
    pub(crate) fn skeleton(
        motor_id: &str,
        prop_id: &str,
        airspeed_ms: f64,
        altitude_m: f64,
        battery_voltage: f64,
        num_motors: u32,
    ) -> Self {
        Self {
            valid: false,
            issue: None,
            airspeed_ms,
            altitude_m,
            drag_n: 0.0,
            thrust_required_n: 0.0,
            prop_id: prop_id.to_string(),
            prop_rpm: 0.0,
            prop_power_w: 0.0,
            prop_efficiency: 0.0,
            motor_id: motor_id.to_string(),
            motor_current_a: 0.0,
            motor_voltage: 0.0,
            motor_power_elec_w: 0.0,
            motor_power_mech_w: 0.0,
            motor_efficiency: 0.0,
            motor_torque_nm: 0.0,
            throttle_pct: 0.0,
            battery_voltage,
            battery_current_a: 0.0,
            battery_power_w: 0.0,
            system_efficiency: 0.0,
            num_motors,
            per_motor_current_a: 0.0,
            per_motor_thrust_n: 0.0,
        }
    }

    pub fn summary(&self) -> String {
        if !self.valid {
            let issue = self
                .issue
                .map(|i| i.tag())
                .unwrap_or("unknown");
            return format!(
                "No equilibrium at {:.1} m/s: {issue}",
                self.airspeed_ms
            );
        }
        format!(
            "Flight equilibrium @ {:.1} m/s\n\
             Drag/Thrust: {:.2} N\n\
             Throttle: {:.1}%  RPM: {:.0}\n\
             Motor: {:.1} A, {:.1}% eff\n\
             Prop: {:.0} W shaft, {:.1}% eff\n\
             Battery: {:.1} A, {:.0} W\n\
             System efficiency: {:.1}%",
            self.airspeed_ms,
            self.drag_n,
            self.throttle_pct,
            self.prop_rpm,
            self.motor_current_a,
            self.motor_efficiency * 100.0,
            self.prop_power_w,
            self.prop_efficiency * 100.0,
            self.battery_current_a,
            self.battery_power_w,
            self.system_efficiency * 100.0,
        )
    }
}
