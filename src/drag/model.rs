use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

use crate::environment::air_density;

#[derive(Error, Debug)]
pub enum DragModelError {
    #[error("Negative parameter: {0}")]
    NegativeParameter(&'static str),

    #[error("Oswald efficiency must be in (0, 1], got {0}")]
    InvalidOswaldEfficiency(f64),

    #[error("Fixed-wing weight must be positive, got {0} N")]
    NonPositiveWeight(f64),
}

/// Aerodynamic drag model.
///
/// One variant per estimation method, from a direct force input up to the
/// full fixed-wing model with lift-induced drag. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DragModel {
    /// Direct drag value, independent of airspeed.
    Raw { force_n: f64 },

    /// D = q · Cd · A
    Coefficient { cd: f64, reference_area_m2: f64 },

    /// D = q · f, with f the equivalent flat-plate area (Cd · S shorthand).
    FlatPlate { flat_plate_area_m2: f64 },

    /// Multirotor frame drag from frontal area: D = q · Cd_frame · A_frontal.
    Multirotor { frontal_area_m2: f64, frame_cd: f64 },

    /// Parasitic plus lift-induced drag for level flight (L = W).
    FixedWing {
        cd0: f64,
        wing_area_m2: f64,
        wingspan_m: f64,
        weight_n: f64,
        oswald_efficiency: f64,
    },
}

/// Drag components at one flight condition, for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragBreakdown {
    pub velocity_ms: f64,
    pub altitude_m: f64,
    pub air_density: f64,
    pub dynamic_pressure_pa: f64,
    pub parasitic_n: f64,
    pub induced_n: f64,
    pub total_n: f64,
}

impl DragModel {
    /// Fixed-wing constructor enforcing the model invariants.
    pub fn fixed_wing(
        cd0: f64,
        wing_area_m2: f64,
        wingspan_m: f64,
        weight_n: f64,
        oswald_efficiency: f64,
    ) -> Result<Self, DragModelError> {
        let model = Self::FixedWing {
            cd0,
            wing_area_m2,
            wingspan_m,
            weight_n,
            oswald_efficiency,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), DragModelError> {
        use DragModelError::*;
        match *self {
            Self::Raw { force_n } => {
                if force_n < 0.0 {
                    return Err(NegativeParameter("force_n"));
                }
            }
            Self::Coefficient {
                cd,
                reference_area_m2,
            } => {
                if cd < 0.0 {
                    return Err(NegativeParameter("cd"));
                }
                if reference_area_m2 < 0.0 {
                    return Err(NegativeParameter("reference_area_m2"));
                }
            }
            Self::FlatPlate { flat_plate_area_m2 } => {
                if flat_plate_area_m2 < 0.0 {
                    return Err(NegativeParameter("flat_plate_area_m2"));
                }
            }
            Self::Multirotor {
                frontal_area_m2,
                frame_cd,
            } => {
                if frontal_area_m2 < 0.0 {
                    return Err(NegativeParameter("frontal_area_m2"));
                }
                if frame_cd < 0.0 {
                    return Err(NegativeParameter("frame_cd"));
                }
            }
            Self::FixedWing {
                cd0,
                wing_area_m2,
                wingspan_m,
                weight_n,
                oswald_efficiency,
            } => {
                if cd0 < 0.0 {
                    return Err(NegativeParameter("cd0"));
                }
                if wing_area_m2 < 0.0 {
                    return Err(NegativeParameter("wing_area_m2"));
                }
                if wingspan_m < 0.0 {
                    return Err(NegativeParameter("wingspan_m"));
                }
                if weight_n <= 0.0 {
                    return Err(NonPositiveWeight(weight_n));
                }
                if oswald_efficiency <= 0.0 || oswald_efficiency > 1.0 {
                    return Err(InvalidOswaldEfficiency(oswald_efficiency));
                }
            }
        }
        Ok(())
    }

    /// Wing aspect ratio b²/S; zero for non-fixed-wing variants.
    pub fn aspect_ratio(&self) -> f64 {
        match *self {
            Self::FixedWing {
                wing_area_m2,
                wingspan_m,
                ..
            } if wing_area_m2 > 0.0 => wingspan_m * wingspan_m / wing_area_m2,
            _ => 0.0,
        }
    }

    /// Drag (N) at the given airspeed, altitude and ISA temperature offset.
    pub fn drag(&self, velocity_ms: f64, altitude_m: f64, temp_offset_k: f64) -> f64 {
        let rho = air_density(altitude_m, temp_offset_k);
        self.drag_with_density(velocity_ms, rho)
    }

    /// Drag (N) with an explicit air density.
    pub fn drag_with_density(&self, velocity_ms: f64, rho: f64) -> f64 {
        let q = 0.5 * rho * velocity_ms * velocity_ms;
        match *self {
            Self::Raw { force_n } => force_n,
            Self::Coefficient {
                cd,
                reference_area_m2,
            } => q * cd * reference_area_m2,
            Self::FlatPlate { flat_plate_area_m2 } => q * flat_plate_area_m2,
            Self::Multirotor {
                frontal_area_m2,
                frame_cd,
            } => q * frame_cd * frontal_area_m2,
            Self::FixedWing { .. } => {
                let (parasitic, induced) = self.fixed_wing_components(q);
                parasitic + induced
            }
        }
    }

    /// Parasitic and induced drag split at the given flight condition.
    ///
    /// Only the fixed-wing variant produces induced drag; all other variants
    /// report their entire drag as parasitic.
    pub fn breakdown(&self, velocity_ms: f64, altitude_m: f64) -> DragBreakdown {
        let rho = air_density(altitude_m, 0.0);
        let q = 0.5 * rho * velocity_ms * velocity_ms;
        let total = self.drag_with_density(velocity_ms, rho);

        let (parasitic, induced) = match self {
            Self::FixedWing { .. } => self.fixed_wing_components(q),
            _ => (total, 0.0),
        };

        DragBreakdown {
            velocity_ms,
            altitude_m,
            air_density: rho,
            dynamic_pressure_pa: q,
            parasitic_n: parasitic,
            induced_n: induced,
            total_n: total,
        }
    }

    fn fixed_wing_components(&self, q: f64) -> (f64, f64) {
        let Self::FixedWing {
            cd0,
            wing_area_m2,
            weight_n,
            oswald_efficiency,
            ..
        } = *self
        else {
            return (0.0, 0.0);
        };

        let parasitic = q * wing_area_m2 * cd0;

        // Level flight: L = W, so Cl = W / (q·S)
        let cl = if q > 0.0 && wing_area_m2 > 0.0 {
            weight_n / (q * wing_area_m2)
        } else {
            0.0
        };

        let ar = self.aspect_ratio();
        let cdi = if ar > 0.0 && oswald_efficiency > 0.0 {
            cl * cl / (PI * ar * oswald_efficiency)
        } else {
            0.0
        };

        (parasitic, q * wing_area_m2 * cdi)
    }
}
