use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PropError {
    #[error("Propeller '{0}' not found in database")]
    UnknownProp(String),

    #[error("Propeller '{id}' has too few sample points to interpolate")]
    InsufficientData { id: String },

    #[error(
        "Operating point outside tested envelope for '{prop}' \
         (speed {v_ms:.1} m/s, {rpm:.0} RPM)"
    )]
    OutOfEnvelope { prop: String, v_ms: f64, rpm: f64 },

    #[error(
        "Thrust request ({requested_n:.2} N) exceeds '{prop}' capability \
         ({available_n:.2} N at {v_ms:.1} m/s)"
    )]
    ThrustUnachievable {
        prop: String,
        requested_n: f64,
        available_n: f64,
        v_ms: f64,
    },

    #[error("RPM root search failed for '{prop}' at {v_ms:.1} m/s")]
    RootSearchFailed { prop: String, v_ms: f64 },

    #[error("Failed to read propeller database: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse propeller database: {0}")]
    Json(#[from] serde_json::Error),
}
