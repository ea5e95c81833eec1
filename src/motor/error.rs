use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MotorError {
    #[error("Motor '{0}' not found in catalog")]
    UnknownMotor(String),

    #[error("Motor category '{0}' not found in catalog")]
    UnknownCategory(String),

    #[error(
        "Back-EMF ({v_bemf:.2} V) meets or exceeds supply ({v_supply:.2} V) \
         at {rpm:.0} RPM"
    )]
    BackEmfExceedsSupply { v_bemf: f64, v_supply: f64, rpm: f64 },

    #[error("Operating point requires {current:.1} A, beyond {limit:.1} A abandon threshold")]
    ExcessiveCurrent { current: f64, limit: f64 },

    #[error("Equilibrium solver did not converge within {iterations} iterations")]
    NonConvergent { iterations: usize },

    #[error("Invalid motor parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to read motor presets: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse motor presets: {0}")]
    Json(#[from] serde_json::Error),
}
