mod analyzer;
mod catalog;
mod error;
mod params;

pub use analyzer::{EfficiencyMap, MotorLimits, MotorSolverSettings, MotorState};
pub use catalog::MotorCatalog;
pub use error::MotorError;
pub use params::MotorParameters;
