use super::cell::CellChemistry;
use crate::utils::math::interp_table;

/// SOC (%) → open-circuit voltage (V) for NMC-like chemistries
/// (NMC, NCA, LCO, LiPo share the same curve shape).
const SOC_TO_OCV_NMC: &[(f64, f64)] = &[
    (0.0, 3.00),
    (10.0, 3.40),
    (20.0, 3.55),
    (30.0, 3.62),
    (40.0, 3.67),
    (50.0, 3.71),
    (60.0, 3.76),
    (70.0, 3.82),
    (80.0, 3.89),
    (90.0, 4.02),
    (100.0, 4.20),
];

/// SOC (%) → OCV (V) for LFP: a flat plateau with steep knees.
const SOC_TO_OCV_LFP: &[(f64, f64)] = &[
    (0.0, 2.50),
    (10.0, 3.10),
    (20.0, 3.20),
    (30.0, 3.25),
    (40.0, 3.28),
    (50.0, 3.30),
    (60.0, 3.32),
    (70.0, 3.33),
    (80.0, 3.34),
    (90.0, 3.38),
    (100.0, 3.60),
];

/// Cell open-circuit voltage at a state of charge, by table interpolation.
/// SOC is clamped to [0, 100].
pub fn soc_to_ocv(soc_percent: f64, chemistry: CellChemistry) -> f64 {
    let soc = soc_percent.clamp(0.0, 100.0);
    let table = match chemistry {
        CellChemistry::Lfp => SOC_TO_OCV_LFP,
        _ => SOC_TO_OCV_NMC,
    };
    interp_table(table, soc)
}
