use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::cell::{CellChemistry, CellSpec, FormFactor};
use super::error::BatteryError;

/// Cell specification database, keyed by cell identifier
/// (`"<manufacturer> <model>"`).
#[derive(Debug, Clone, Default)]
pub struct CellDatabase {
    cells: BTreeMap<String, CellSpec>,
}

#[derive(Deserialize)]
struct RawDatabase {
    cells: BTreeMap<String, CellSpec>,
}

impl CellDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in cells. Resistance figures follow independent testing
    /// (Battery Mooch) where marked verified; the rest are datasheet or
    /// estimated values.
    pub fn builtin() -> Self {
        let mut db = Self::new();

        db.insert(CellSpec {
            name: "P45B".to_string(),
            manufacturer: "Molicel".to_string(),
            chemistry: CellChemistry::Nmc,
            form_factor: FormFactor::Cylindrical21700,
            capacity_mah: 4500.0,
            nominal_voltage: 3.6,
            max_voltage: 4.2,
            min_voltage: 2.5,
            max_continuous_discharge_a: 45.0,
            peak_discharge_a: 90.0,
            dc_ir_mohm: 12.0,
            mass_g: 70.0,
            diameter_mm: Some(21.7),
            length_mm: Some(70.15),
            width_mm: None,
            height_mm: None,
            thickness_mm: None,
            specific_heat_j_per_g_c: 1.0,
            max_temp_c: 60.0,
            data_source: "mooch".to_string(),
            verified: true,
        });

        db.insert(CellSpec {
            name: "P42A".to_string(),
            manufacturer: "Molicel".to_string(),
            chemistry: CellChemistry::Nmc,
            form_factor: FormFactor::Cylindrical21700,
            capacity_mah: 4200.0,
            nominal_voltage: 3.6,
            max_voltage: 4.2,
            min_voltage: 2.5,
            max_continuous_discharge_a: 45.0,
            peak_discharge_a: 85.0,
            dc_ir_mohm: 16.0,
            mass_g: 70.0,
            diameter_mm: Some(21.7),
            length_mm: Some(70.15),
            width_mm: None,
            height_mm: None,
            thickness_mm: None,
            specific_heat_j_per_g_c: 1.0,
            max_temp_c: 60.0,
            data_source: "mooch".to_string(),
            verified: true,
        });

        db.insert(CellSpec {
            name: "40T".to_string(),
            manufacturer: "Samsung".to_string(),
            chemistry: CellChemistry::Nmc,
            form_factor: FormFactor::Cylindrical21700,
            capacity_mah: 4000.0,
            nominal_voltage: 3.6,
            max_voltage: 4.2,
            min_voltage: 2.5,
            max_continuous_discharge_a: 35.0,
            peak_discharge_a: 70.0,
            dc_ir_mohm: 13.0,
            mass_g: 67.0,
            diameter_mm: Some(21.2),
            length_mm: Some(70.5),
            width_mm: None,
            height_mm: None,
            thickness_mm: None,
            specific_heat_j_per_g_c: 1.0,
            max_temp_c: 60.0,
            data_source: "mooch".to_string(),
            verified: true,
        });

        db.insert(CellSpec {
            name: "30Q".to_string(),
            manufacturer: "Samsung".to_string(),
            chemistry: CellChemistry::Nmc,
            form_factor: FormFactor::Cylindrical18650,
            capacity_mah: 3000.0,
            nominal_voltage: 3.6,
            max_voltage: 4.2,
            min_voltage: 2.5,
            max_continuous_discharge_a: 15.0,
            peak_discharge_a: 30.0,
            dc_ir_mohm: 18.0,
            mass_g: 48.0,
            diameter_mm: Some(18.4),
            length_mm: Some(65.1),
            width_mm: None,
            height_mm: None,
            thickness_mm: None,
            specific_heat_j_per_g_c: 1.0,
            max_temp_c: 60.0,
            data_source: "mooch".to_string(),
            verified: true,
        });

        db.insert(CellSpec {
            name: "VTC6".to_string(),
            manufacturer: "Sony".to_string(),
            chemistry: CellChemistry::Nmc,
            form_factor: FormFactor::Cylindrical18650,
            capacity_mah: 3000.0,
            nominal_voltage: 3.6,
            max_voltage: 4.2,
            min_voltage: 2.5,
            max_continuous_discharge_a: 15.0,
            peak_discharge_a: 30.0,
            dc_ir_mohm: 13.0,
            mass_g: 46.6,
            diameter_mm: Some(18.4),
            length_mm: Some(65.1),
            width_mm: None,
            height_mm: None,
            thickness_mm: None,
            specific_heat_j_per_g_c: 1.0,
            max_temp_c: 60.0,
            data_source: "datasheet".to_string(),
            verified: false,
        });

        db.insert(CellSpec {
            name: "ANR26650M1B".to_string(),
            manufacturer: "A123".to_string(),
            chemistry: CellChemistry::Lfp,
            form_factor: FormFactor::Cylindrical26650,
            capacity_mah: 2500.0,
            nominal_voltage: 3.3,
            max_voltage: 3.6,
            min_voltage: 2.0,
            max_continuous_discharge_a: 50.0,
            peak_discharge_a: 120.0,
            dc_ir_mohm: 6.0,
            mass_g: 76.0,
            diameter_mm: Some(26.0),
            length_mm: Some(65.0),
            width_mm: None,
            height_mm: None,
            thickness_mm: None,
            specific_heat_j_per_g_c: 1.0,
            max_temp_c: 60.0,
            data_source: "datasheet".to_string(),
            verified: false,
        });

        db.insert(CellSpec {
            name: "R-Line 1300".to_string(),
            manufacturer: "Tattu".to_string(),
            chemistry: CellChemistry::LiPo,
            form_factor: FormFactor::Pouch,
            capacity_mah: 1300.0,
            nominal_voltage: 3.7,
            max_voltage: 4.2,
            min_voltage: 3.0,
            max_continuous_discharge_a: 65.0,
            peak_discharge_a: 130.0,
            dc_ir_mohm: 8.0,
            mass_g: 41.0,
            diameter_mm: None,
            length_mm: None,
            width_mm: Some(35.0),
            height_mm: Some(75.0),
            thickness_mm: Some(7.5),
            specific_heat_j_per_g_c: 1.1,
            max_temp_c: 60.0,
            data_source: "estimate".to_string(),
            verified: false,
        });

        db
    }

    /// Load cells from a JSON file of the form `{"cells": {id: {...}}}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BatteryError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(json: &str) -> Result<Self, BatteryError> {
        let raw: RawDatabase = serde_json::from_str(json)?;
        let mut db = Self::new();
        for (id, cell) in raw.cells {
            cell.validate()?;
            db.cells.insert(id, cell);
        }
        Ok(db)
    }

    pub fn insert(&mut self, cell: CellSpec) {
        let id = format!("{} {}", cell.manufacturer, cell.name);
        self.cells.insert(id, cell);
    }

    pub fn get(&self, id: &str) -> Result<&CellSpec, BatteryError> {
        self.cells
            .get(id)
            .ok_or_else(|| BatteryError::UnknownCell(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.cells.contains_key(id)
    }

    /// All cell identifiers, sorted.
    pub fn list(&self) -> Vec<&str> {
        self.cells.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
