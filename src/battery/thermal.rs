use serde::{Deserialize, Serialize};

use crate::utils::constants::ENTROPIC_HEAT_FACTOR;

/// Cooling situation of the pack, each mapping to a typical per-cell
/// thermal resistance to ambient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThermalEnvironment {
    StillAir,
    ShrinkwrapStillAir,
    LightAirflow,
    DroneInFlight,
    HighAirflow,
    ActiveCooling,
    ActiveCoolingFlight,
    LiquidCooling,
}

impl ThermalEnvironment {
    /// Per-cell thermal resistance (°C/W) for this environment.
    pub fn thermal_resistance(self) -> f64 {
        match self {
            Self::StillAir => 20.0,
            Self::ShrinkwrapStillAir => 28.0,
            Self::LightAirflow => 12.0,
            Self::DroneInFlight => 8.0,
            Self::HighAirflow => 6.0,
            Self::ActiveCooling => 5.0,
            Self::ActiveCoolingFlight => 3.0,
            Self::LiquidCooling => 2.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::StillAir => "still_air",
            Self::ShrinkwrapStillAir => "shrinkwrap_still_air",
            Self::LightAirflow => "light_airflow",
            Self::DroneInFlight => "drone_in_flight",
            Self::HighAirflow => "high_airflow",
            Self::ActiveCooling => "active_cooling",
            Self::ActiveCoolingFlight => "active_cooling_flight",
            Self::LiquidCooling => "liquid_cooling",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::StillAir => "Bare cells, no airflow",
            Self::ShrinkwrapStillAir => "Shrink-wrapped pack, still air",
            Self::LightAirflow => "Natural convection or light forced air",
            Self::DroneInFlight => "Pack exposed to prop wash in flight",
            Self::HighAirflow => "Strong ducted airflow over the pack",
            Self::ActiveCooling => "Active fan cooling",
            Self::ActiveCoolingFlight => "Active cooling plus flight airflow",
            Self::LiquidCooling => "Liquid cooled pack",
        }
    }

    pub fn all() -> [Self; 8] {
        [
            Self::StillAir,
            Self::ShrinkwrapStillAir,
            Self::LightAirflow,
            Self::DroneInFlight,
            Self::HighAirflow,
            Self::ActiveCooling,
            Self::ActiveCoolingFlight,
            Self::LiquidCooling,
        ]
    }
}

impl std::str::FromStr for ThermalEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|env| env.name() == s)
            .ok_or_else(|| format!("unknown thermal environment '{s}'"))
    }
}

/// Instantaneous thermal state for transient simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalState {
    pub cell_temp_c: f64,
    pub ambient_temp_c: f64,
    pub heat_generation_w: f64,
    pub heat_dissipation_w: f64,
    pub time_s: f64,
}

impl ThermalState {
    pub fn at_ambient(ambient_temp_c: f64) -> Self {
        Self {
            cell_temp_c: ambient_temp_c,
            ambient_temp_c,
            heat_generation_w: 0.0,
            heat_dissipation_w: 0.0,
            time_s: 0.0,
        }
    }

    pub fn temp_rise_c(&self) -> f64 {
        self.cell_temp_c - self.ambient_temp_c
    }

    pub fn net_heat_w(&self) -> f64 {
        self.heat_generation_w - self.heat_dissipation_w
    }
}

/// Lumped-mass first-order thermal model.
///
/// dT/dt = (P_heat − (T − T_amb)/R_th) / C_th with C_th = m·c_p.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalModel {
    pub total_mass_g: f64,
    pub specific_heat_j_per_g_c: f64,
    pub thermal_resistance_c_per_w: f64,
}

impl ThermalModel {
    pub fn new(
        total_mass_g: f64,
        specific_heat_j_per_g_c: f64,
        thermal_resistance_c_per_w: f64,
    ) -> Self {
        Self {
            total_mass_g,
            specific_heat_j_per_g_c,
            thermal_resistance_c_per_w,
        }
    }

    /// Thermal mass C_th (J/°C).
    pub fn thermal_mass_j_per_c(&self) -> f64 {
        self.total_mass_g * self.specific_heat_j_per_g_c
    }

    /// Time constant τ = C_th·R_th (s); time to 63.2 % of a temperature step.
    pub fn time_constant_s(&self) -> f64 {
        self.thermal_mass_j_per_c() * self.thermal_resistance_c_per_w
    }

    /// Joule heat inflated by the entropic factor.
    pub fn heat_generation(&self, current_a: f64, total_ir_ohm: f64) -> f64 {
        current_a * current_a * total_ir_ohm * ENTROPIC_HEAT_FACTOR
    }

    /// T_ss = T_amb + P·R_th.
    pub fn steady_state_temp(&self, heat_w: f64, ambient_temp_c: f64) -> f64 {
        ambient_temp_c + heat_w * self.thermal_resistance_c_per_w
    }

    /// Instantaneous dT/dt (°C/s).
    pub fn temp_rise_rate(&self, heat_w: f64, cell_temp_c: f64, ambient_temp_c: f64) -> f64 {
        let dissipated = (cell_temp_c - ambient_temp_c) / self.thermal_resistance_c_per_w;
        (heat_w - dissipated) / self.thermal_mass_j_per_c()
    }

    /// One explicit-Euler step of the transient simulation.
    pub fn step(&self, state: ThermalState, heat_w: f64, dt_s: f64) -> ThermalState {
        let dissipated =
            (state.cell_temp_c - state.ambient_temp_c) / self.thermal_resistance_c_per_w;
        let rate = self.temp_rise_rate(heat_w, state.cell_temp_c, state.ambient_temp_c);
        ThermalState {
            cell_temp_c: state.cell_temp_c + rate * dt_s,
            ambient_temp_c: state.ambient_temp_c,
            heat_generation_w: heat_w,
            heat_dissipation_w: dissipated,
            time_s: state.time_s + dt_s,
        }
    }

    /// Time to reach a target temperature under constant heat input, from
    /// the exponential approach T(t) = T_ss − (T_ss − T_start)·e^(−t/τ).
    /// Returns +∞ when the target sits at or above the steady state.
    pub fn time_to_temperature(
        &self,
        target_temp_c: f64,
        heat_w: f64,
        ambient_temp_c: f64,
        start_temp_c: Option<f64>,
    ) -> f64 {
        let start = start_temp_c.unwrap_or(ambient_temp_c);
        let steady = self.steady_state_temp(heat_w, ambient_temp_c);

        if target_temp_c >= steady {
            return f64::INFINITY;
        }
        if start >= target_temp_c {
            return 0.0;
        }
        let denominator = steady - start;
        if denominator <= 0.0 {
            return 0.0;
        }
        -self.time_constant_s() * ((steady - target_temp_c) / denominator).ln()
    }

    /// Current that pins the steady state at `max_temp_c`:
    /// I = √((T_max − T_amb)/(R_th·R_total·ε')).
    pub fn max_current_thermal(
        &self,
        max_temp_c: f64,
        ambient_temp_c: f64,
        total_ir_ohm: f64,
    ) -> f64 {
        let max_rise = max_temp_c - ambient_temp_c;
        if max_rise <= 0.0 {
            return 0.0;
        }
        let max_heat = max_rise / self.thermal_resistance_c_per_w;
        let denominator = total_ir_ohm * ENTROPIC_HEAT_FACTOR;
        if denominator <= 0.0 {
            return f64::INFINITY;
        }
        (max_heat / denominator).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn model() -> ThermalModel {
        // 12-cell pack of 70 g cells, drone-in-flight cooling
        ThermalModel::new(840.0, 1.0, 8.0 / 12.0)
    }

    #[test]
    fn environments_order_by_cooling_quality() {
        use ThermalEnvironment::*;
        assert!(StillAir.thermal_resistance() >= DroneInFlight.thermal_resistance());
        assert!(DroneInFlight.thermal_resistance() >= ActiveCooling.thermal_resistance());
        assert!(ActiveCooling.thermal_resistance() >= LiquidCooling.thermal_resistance());
        assert!(ShrinkwrapStillAir.thermal_resistance() > StillAir.thermal_resistance());
    }

    #[test]
    fn environment_names_round_trip() {
        for env in ThermalEnvironment::all() {
            let parsed: ThermalEnvironment = env.name().parse().unwrap();
            assert_eq!(parsed, env);
        }
        assert!("vacuum".parse::<ThermalEnvironment>().is_err());
    }

    #[test]
    fn steady_state_is_linear_in_heat() {
        let m = model();
        assert_relative_eq!(m.steady_state_temp(0.0, 25.0), 25.0);
        let t30 = m.steady_state_temp(30.0, 25.0);
        assert_relative_eq!(t30, 25.0 + 30.0 * 8.0 / 12.0);
    }

    #[test]
    fn transient_approaches_steady_state() {
        let m = model();
        let heat = 20.0;
        let steady = m.steady_state_temp(heat, 25.0);
        let mut state = ThermalState::at_ambient(25.0);

        // Integrate out to 5 time constants with a fine step
        let tau = m.time_constant_s();
        let dt = tau / 200.0;
        while state.time_s < 5.0 * tau {
            state = m.step(state, heat, dt);
        }
        assert_relative_eq!(state.cell_temp_c, steady, max_relative = 0.02);
    }

    #[test]
    fn time_to_temperature_matches_analytic_tau() {
        let m = model();
        let heat = 20.0;
        let steady = m.steady_state_temp(heat, 25.0);
        // 63.2% of the step happens in one time constant
        let target = 25.0 + (steady - 25.0) * (1.0 - (-1.0_f64).exp());
        let t = m.time_to_temperature(target, heat, 25.0, None);
        assert_relative_eq!(t, m.time_constant_s(), max_relative = 1e-6);
    }

    #[test]
    fn unreachable_target_is_infinite() {
        let m = model();
        let steady = m.steady_state_temp(10.0, 25.0);
        assert_eq!(
            m.time_to_temperature(steady + 1.0, 10.0, 25.0, None),
            f64::INFINITY
        );
        assert_eq!(m.time_to_temperature(20.0, 10.0, 25.0, Some(30.0)), 0.0);
    }

    #[test]
    fn thermal_current_limit_inverts_steady_state() {
        let m = model();
        let ir = 0.036;
        let i_max = m.max_current_thermal(60.0, 25.0, ir);
        let heat = m.heat_generation(i_max, ir);
        assert_relative_eq!(m.steady_state_temp(heat, 25.0), 60.0, max_relative = 1e-9);
        assert_eq!(m.max_current_thermal(60.0, 70.0, ir), 0.0);
    }
}
