use crate::utils::constants::{
    AIR_GAS_CONSTANT, GRAVITY, ISA_LAPSE_RATE, ISA_SEA_LEVEL_PRESSURE, ISA_SEA_LEVEL_TEMP,
};

/// ISA air density (kg/m³) at the given altitude with an optional
/// temperature offset from the standard atmosphere.
///
/// Valid through the troposphere; altitude is clamped to [0, 11 000] m.
pub fn air_density(altitude_m: f64, temp_offset_k: f64) -> f64 {
    let altitude = altitude_m.clamp(0.0, 11_000.0);

    let temp_std = ISA_SEA_LEVEL_TEMP + ISA_LAPSE_RATE * altitude;
    let pressure = ISA_SEA_LEVEL_PRESSURE
        * (temp_std / ISA_SEA_LEVEL_TEMP).powf(-GRAVITY / (AIR_GAS_CONSTANT * ISA_LAPSE_RATE));

    let temp = temp_std + temp_offset_k;
    pressure / (AIR_GAS_CONSTANT * temp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::SEA_LEVEL_AIR_DENSITY;
    use approx::assert_relative_eq;

    #[test]
    fn sea_level_density_matches_isa() {
        assert_relative_eq!(air_density(0.0, 0.0), SEA_LEVEL_AIR_DENSITY, epsilon = 1e-3);
    }

    #[test]
    fn density_decreases_with_altitude() {
        let rho_0 = air_density(0.0, 0.0);
        let rho_1000 = air_density(1000.0, 0.0);
        let rho_3000 = air_density(3000.0, 0.0);
        assert!(rho_1000 < rho_0);
        assert!(rho_3000 < rho_1000);
        // ~11% down per 1000 m is the usual rule of thumb
        assert_relative_eq!(rho_1000, 1.112, epsilon = 5e-3);
    }

    #[test]
    fn warm_day_lowers_density() {
        assert!(air_density(0.0, 15.0) < air_density(0.0, 0.0));
        assert!(air_density(0.0, -15.0) > air_density(0.0, 0.0));
    }
}
