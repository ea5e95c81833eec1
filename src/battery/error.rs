use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatteryError {
    #[error("Cell '{0}' not found in database")]
    UnknownCell(String),

    #[error("Series count must be 1-12, got {0}")]
    InvalidSeries(u32),

    #[error("Parallel count must be 1-8, got {0}")]
    InvalidParallel(u32),

    #[error("Cylindrical cell '{0}' requires diameter_mm and length_mm")]
    MissingCylindricalDimensions(String),

    #[error("Pouch cell '{0}' requires width_mm, height_mm and thickness_mm")]
    MissingPouchDimensions(String),

    #[error("Cell '{name}': {field} must be positive")]
    NonPositiveField { name: String, field: &'static str },

    #[error("Geometry calculations disabled; enable them in the pack configuration")]
    GeometryDisabled,

    #[error("Failed to read cell database: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse cell database: {0}")]
    Json(#[from] serde_json::Error),
}
