pub const GRAVITY: f64 = 9.80665; // m/s^2
pub const AIR_GAS_CONSTANT: f64 = 287.05287; // J/(kg·K)
pub const ISA_SEA_LEVEL_TEMP: f64 = 288.15; // K
pub const ISA_SEA_LEVEL_PRESSURE: f64 = 101325.0; // Pa
pub const ISA_LAPSE_RATE: f64 = -0.0065; // K/m
pub const SEA_LEVEL_AIR_DENSITY: f64 = 1.225; // kg/m^3

/// Resistivity temperature coefficient of copper windings (1/°C).
pub const COPPER_TEMP_COEFF: f64 = 0.00393;

/// Cell DC-IR temperature coefficient, fraction per °C below 25 °C.
pub const CELL_IR_TEMP_COEFF: f64 = 0.007;

/// Multiplier applied to Joule heat to account for entropic heating.
pub const ENTROPIC_HEAT_FACTOR: f64 = 1.1;

/// Peukert exponent for lithium-ion cells, applied above 1C discharge.
pub const PEUKERT_EXPONENT_LI_ION: f64 = 1.05;

// Pack accessory mass estimates
pub const NICKEL_STRIP_MASS_PER_CONNECTION_G: f64 = 0.8;
pub const WIRE_MASS_PER_CONNECTION_G: f64 = 1.5;
pub const ENCLOSURE_MASS_PER_CELL_G: f64 = 2.0;
pub const BMS_MASS_PER_S_G: f64 = 5.0;

pub const MS_TO_MPH: f64 = 2.23694;
