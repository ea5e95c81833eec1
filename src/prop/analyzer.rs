use super::error::PropError;
use super::interp::OUT_OF_ENVELOPE;
use super::table::PropTable;
use crate::utils::math::brent;

const RPM_ROOT_TOLERANCE: f64 = 0.5;
const RPM_ROOT_MAX_ITER: usize = 40;

impl PropTable {
    /// Thrust (N) at an operating point.
    pub fn thrust_at(&self, v_ms: f64, rpm: f64) -> Result<f64, PropError> {
        self.thrust
            .query(v_ms, rpm)
            .ok_or_else(|| self.out_of_envelope(v_ms, rpm))
    }

    /// Shaft power (W) at an operating point.
    pub fn power_at(&self, v_ms: f64, rpm: f64) -> Result<f64, PropError> {
        self.power
            .query(v_ms, rpm)
            .ok_or_else(|| self.out_of_envelope(v_ms, rpm))
    }

    /// Raw thrust lookup with the numeric out-of-envelope sentinel (−99).
    pub fn thrust_or_sentinel(&self, v_ms: f64, rpm: f64) -> f64 {
        self.thrust.query_or_sentinel(v_ms, rpm)
    }

    /// Raw power lookup with the numeric out-of-envelope sentinel (−99).
    pub fn power_or_sentinel(&self, v_ms: f64, rpm: f64) -> f64 {
        self.power.query_or_sentinel(v_ms, rpm)
    }

    /// Propulsive efficiency T·V/P; zero at zero airspeed or non-positive
    /// power, and zero outside the envelope.
    pub fn efficiency_at(&self, v_ms: f64, rpm: f64) -> f64 {
        if v_ms == 0.0 {
            return 0.0;
        }
        let (Some(thrust), Some(power)) =
            (self.thrust.query(v_ms, rpm), self.power.query(v_ms, rpm))
        else {
            return 0.0;
        };
        if power <= 0.0 || thrust < 0.0 {
            return 0.0;
        }
        thrust * v_ms / power
    }

    /// Thrust at the top of the tested RPM range for this airspeed.
    pub fn max_thrust_at(&self, v_ms: f64) -> Result<f64, PropError> {
        self.thrust_at(v_ms, self.envelope().max_rpm)
    }

    /// Solve for the RPM that produces `thrust_n` at airspeed `v_ms`.
    ///
    /// Bracketed root find over the tested RPM range. Fails with
    /// `ThrustUnachievable` when the demand exceeds the thrust available at
    /// maximum RPM.
    pub fn rpm_for_thrust(&self, v_ms: f64, thrust_n: f64) -> Result<f64, PropError> {
        let env = self.envelope();
        let max_thrust = self.thrust_at(v_ms, env.max_rpm)?;

        if thrust_n > max_thrust {
            return Err(PropError::ThrustUnachievable {
                prop: self.id().to_string(),
                requested_n: thrust_n,
                available_n: max_thrust,
                v_ms,
            });
        }

        let residual = |rpm: f64| {
            let t = self.thrust_or_sentinel(v_ms, rpm);
            if t == OUT_OF_ENVELOPE {
                f64::NAN
            } else {
                t - thrust_n
            }
        };

        brent(
            residual,
            env.min_rpm,
            env.max_rpm,
            RPM_ROOT_TOLERANCE,
            RPM_ROOT_MAX_ITER,
        )
        .ok_or_else(|| PropError::RootSearchFailed {
            prop: self.id().to_string(),
            v_ms,
        })
    }

    /// Shaft power and RPM required to produce `thrust_n` at `v_ms`.
    pub fn power_for_thrust(&self, v_ms: f64, thrust_n: f64) -> Result<(f64, f64), PropError> {
        let rpm = self.rpm_for_thrust(v_ms, thrust_n)?;
        let power = self.power_at(v_ms, rpm)?;
        Ok((power, rpm))
    }

    fn out_of_envelope(&self, v_ms: f64, rpm: f64) -> PropError {
        PropError::OutOfEnvelope {
            prop: self.id().to_string(),
            v_ms,
            rpm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prop::table::PropSample;
    use approx::assert_relative_eq;

    /// Synthetic table: thrust rises with RPM and falls with speed,
    /// power rises with RPM.
    fn table() -> PropTable {
        let mut samples = Vec::new();
        for &v in &[0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0] {
            for rpm_k in 2..=12 {
                let rpm = rpm_k as f64 * 1000.0;
                let thrust = 8.0 * (rpm / 10_000.0).powi(2) - 0.12 * v;
                let power = 180.0 * (rpm / 10_000.0).powi(3) + 1.5 * v;
                samples.push(PropSample {
                    v_ms: v,
                    rpm,
                    thrust_n: thrust,
                    power_w: power,
                });
            }
        }
        PropTable::from_samples("10x5", &samples).unwrap()
    }

    #[test]
    fn thrust_and_power_interpolate_inside_envelope() {
        let t = table();
        let thrust = t.thrust_at(10.0, 8000.0).unwrap();
        assert!(thrust > 0.0);
        let power = t.power_at(10.0, 8000.0).unwrap();
        assert!(power > 0.0);
    }

    #[test]
    fn out_of_envelope_is_an_error_and_sentinel() {
        let t = table();
        assert!(matches!(
            t.thrust_at(50.0, 8000.0),
            Err(PropError::OutOfEnvelope { .. })
        ));
        assert_eq!(t.thrust_or_sentinel(50.0, 8000.0), OUT_OF_ENVELOPE);
        assert_eq!(t.power_or_sentinel(10.0, 500.0), OUT_OF_ENVELOPE);
    }

    #[test]
    fn rpm_for_thrust_round_trips() {
        let t = table();
        for &rpm in &[4000.0, 7000.0, 11_000.0] {
            let thrust = t.thrust_at(12.0, rpm).unwrap();
            let solved = t.rpm_for_thrust(12.0, thrust).unwrap();
            assert_relative_eq!(solved, rpm, max_relative = 1e-3);
        }
    }

    #[test]
    fn excess_thrust_demand_fails() {
        let t = table();
        let max = t.max_thrust_at(10.0).unwrap();
        let err = t.rpm_for_thrust(10.0, max * 1.5).unwrap_err();
        assert!(matches!(err, PropError::ThrustUnachievable { .. }));
    }

    #[test]
    fn efficiency_behaves_at_boundaries() {
        let t = table();
        assert_eq!(t.efficiency_at(0.0, 8000.0), 0.0);
        let eta = t.efficiency_at(15.0, 9000.0);
        assert!(eta > 0.0 && eta <= 1.0, "eta = {eta}");
        // Outside envelope
        assert_eq!(t.efficiency_at(50.0, 8000.0), 0.0);
    }
}
