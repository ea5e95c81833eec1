use serde::{Deserialize, Serialize};

use super::error::PropError;
use super::interp::GridInterpolator;

/// One measured sample point from the propeller performance database.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropSample {
    pub v_ms: f64,
    pub rpm: f64,
    pub thrust_n: f64,
    pub power_w: f64,
}

/// Tested (airspeed, RPM) envelope of a propeller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropEnvelope {
    pub min_speed_ms: f64,
    pub max_speed_ms: f64,
    pub min_rpm: f64,
    pub max_rpm: f64,
}

/// Performance tables for a single propeller.
///
/// Holds the thrust and power interpolation surfaces built from the sample
/// set, plus the diameter/pitch parsed from the identifier when it follows
/// the usual `"DxP"` naming (dimensions in inches).
#[derive(Debug, Clone)]
pub struct PropTable {
    id: String,
    diameter_in: Option<f64>,
    pitch_in: Option<f64>,
    pub(super) thrust: GridInterpolator,
    pub(super) power: GridInterpolator,
    envelope: PropEnvelope,
}

impl PropTable {
    pub fn from_samples(id: impl Into<String>, samples: &[PropSample]) -> Result<Self, PropError> {
        let id = id.into();

        let thrust_points: Vec<(f64, f64, f64)> =
            samples.iter().map(|s| (s.v_ms, s.rpm, s.thrust_n)).collect();
        let power_points: Vec<(f64, f64, f64)> =
            samples.iter().map(|s| (s.v_ms, s.rpm, s.power_w)).collect();

        let thrust = GridInterpolator::from_points(&thrust_points)
            .ok_or_else(|| PropError::InsufficientData { id: id.clone() })?;
        let power = GridInterpolator::from_points(&power_points)
            .ok_or_else(|| PropError::InsufficientData { id: id.clone() })?;

        let (min_speed_ms, max_speed_ms) = thrust.x_range();
        let (min_rpm, max_rpm) = thrust.y_range();
        let envelope = PropEnvelope {
            min_speed_ms,
            max_speed_ms,
            min_rpm,
            max_rpm,
        };

        let (diameter_in, pitch_in) = match parse_prop_dimensions(&id) {
            Some((d, p)) => (Some(d), Some(p)),
            None => (None, None),
        };

        Ok(Self {
            id,
            diameter_in,
            pitch_in,
            thrust,
            power,
            envelope,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn diameter_in(&self) -> Option<f64> {
        self.diameter_in
    }

    pub fn pitch_in(&self) -> Option<f64> {
        self.pitch_in
    }

    pub fn envelope(&self) -> PropEnvelope {
        self.envelope
    }
}

/// Parse diameter and pitch (inches) from a `"DxP"`-style identifier,
/// tolerating trailing type suffixes ("10x5", "7x7E", "9x4.5EP").
pub fn parse_prop_dimensions(id: &str) -> Option<(f64, f64)> {
    let (dia_part, pitch_part) = id.split_once(['x', 'X'])?;
    let diameter = dia_part.trim().parse::<f64>().ok()?;
    let pitch = leading_number(pitch_part.trim())?;
    if diameter <= 0.0 || pitch <= 0.0 {
        return None;
    }
    Some((diameter, pitch))
}

fn leading_number(s: &str) -> Option<f64> {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    s[..end].parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_common_prop_names() {
        assert_eq!(parse_prop_dimensions("10x5"), Some((10.0, 5.0)));
        assert_eq!(parse_prop_dimensions("7x7E"), Some((7.0, 7.0)));
        assert_eq!(parse_prop_dimensions("9x4.5EP"), Some((9.0, 4.5)));
        assert_eq!(parse_prop_dimensions("12X6"), Some((12.0, 6.0)));
        assert_eq!(parse_prop_dimensions("unnamed"), None);
        assert_eq!(parse_prop_dimensions("x5"), None);
    }

    #[test]
    fn builds_envelope_from_samples() {
        let mut samples = Vec::new();
        for &v in &[0.0, 10.0, 20.0] {
            for &rpm in &[5000.0, 10000.0] {
                samples.push(PropSample {
                    v_ms: v,
                    rpm,
                    thrust_n: rpm / 1000.0 - v * 0.1,
                    power_w: rpm / 100.0,
                });
            }
        }
        let table = PropTable::from_samples("10x5", &samples).unwrap();
        let env = table.envelope();
        assert_relative_eq!(env.min_speed_ms, 0.0);
        assert_relative_eq!(env.max_speed_ms, 20.0);
        assert_relative_eq!(env.min_rpm, 5000.0);
        assert_relative_eq!(env.max_rpm, 10000.0);
        assert_eq!(table.diameter_in(), Some(10.0));
        assert_eq!(table.pitch_in(), Some(5.0));
    }

    #[test]
    fn rejects_degenerate_sample_sets() {
        let samples = [
            PropSample {
                v_ms: 0.0,
                rpm: 1000.0,
                thrust_n: 1.0,
                power_w: 10.0,
            },
            PropSample {
                v_ms: 0.0,
                rpm: 2000.0,
                thrust_n: 2.0,
                power_w: 20.0,
            },
        ];
        assert!(matches!(
            PropTable::from_samples("bad", &samples),
            Err(PropError::InsufficientData { .. })
        ));
    }
}
