use std::io;
use thiserror::Error;

use crate::battery::BatteryError;
use crate::integrated::BatchConfigError;
use crate::motor::MotorError;
use crate::prop::PropError;

/// Top-level error for callers driving the engine end to end.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Propeller error: {0}")]
    Prop(#[from] PropError),

    #[error("Motor error: {0}")]
    Motor(#[from] MotorError),

    #[error("Battery error: {0}")]
    Battery(#[from] BatteryError),

    #[error("Batch configuration error: {0}")]
    Config(#[from] BatchConfigError),
}
