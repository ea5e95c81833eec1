use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::error::MotorError;
use super::params::MotorParameters;

/// Motor preset catalog: parameters keyed by motor identifier, plus named
/// categories used as a user-facing filter.
#[derive(Debug, Clone, Default)]
pub struct MotorCatalog {
    motors: BTreeMap<String, MotorParameters>,
    categories: BTreeMap<String, Vec<String>>,
}

#[derive(Deserialize)]
struct RawCatalog {
    motors: BTreeMap<String, MotorParameters>,
    #[serde(default)]
    categories: BTreeMap<String, Vec<String>>,
}

impl MotorCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in presets: a small set of bench-characterized motors grouped
    /// by typical airframe class.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();

        let presets: [(&str, f64, f64, f64, f64, f64, f64, u32, f64); 8] = [
            // (id, kv, rm_cold, i0_ref, i0_rpm_ref, i_max, p_max, poles, mass_g)
            ("EMAX ECO II 2207-1900", 1900.0, 0.045, 1.2, 15_000.0, 35.0, 620.0, 14, 34.0),
            ("T-Motor F40 Pro IV 1950", 1950.0, 0.040, 1.4, 15_000.0, 38.0, 680.0, 14, 30.4),
            ("iFlight XING 2306-1700", 1700.0, 0.052, 1.1, 14_000.0, 32.0, 560.0, 14, 31.7),
            ("T-Motor AT2308-1450", 1450.0, 0.072, 0.8, 11_000.0, 26.0, 440.0, 14, 41.0),
            ("SunnySky X2814-900", 900.0, 0.060, 1.1, 9_000.0, 35.0, 650.0, 14, 107.0),
            ("Scorpion SII-3014-830", 830.0, 0.046, 1.3, 8_000.0, 42.0, 900.0, 14, 123.0),
            ("T-Motor AS2317-880", 880.0, 0.055, 1.2, 8_500.0, 36.0, 700.0, 14, 92.0),
            ("SunnySky X2212-980", 980.0, 0.082, 0.9, 9_500.0, 24.0, 420.0, 14, 58.0),
        ];

        for (id, kv, rm_cold, i0_ref, i0_rpm_ref, i_max, p_max, poles, mass_g) in presets {
            catalog.insert(
                id,
                MotorParameters {
                    kv,
                    rm_cold,
                    i0_ref,
                    i0_rpm_ref,
                    temp_ref: 25.0,
                    i_max,
                    p_max,
                    k_sat: None,
                    poles,
                    mass_g,
                    source: "preset".to_string(),
                },
            );
        }

        catalog.set_category(
            "5in_freestyle",
            [
                "EMAX ECO II 2207-1900",
                "T-Motor F40 Pro IV 1950",
                "iFlight XING 2306-1700",
            ],
        );
        catalog.set_category(
            "7in_longrange",
            ["T-Motor AT2308-1450", "iFlight XING 2306-1700"],
        );
        catalog.set_category(
            "fixed_wing_sport",
            [
                "SunnySky X2814-900",
                "Scorpion SII-3014-830",
                "T-Motor AS2317-880",
                "SunnySky X2212-980",
            ],
        );

        catalog
    }

    /// Load presets from a JSON file of the form
    /// `{"motors": {id: {...}}, "categories": {name: [ids]}}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MotorError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(json: &str) -> Result<Self, MotorError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for (id, params) in raw.motors {
            params.validate(&id)?;
            catalog.motors.insert(id, params);
        }
        catalog.categories = raw.categories;
        Ok(catalog)
    }

    pub fn insert(&mut self, id: impl Into<String>, params: MotorParameters) {
        self.motors.insert(id.into(), params);
    }

    pub fn set_category(
        &mut self,
        name: impl Into<String>,
        motor_ids: impl IntoIterator<Item = impl Into<String>>,
    ) {
        self.categories
            .insert(name.into(), motor_ids.into_iter().map(Into::into).collect());
    }

    pub fn get(&self, id: &str) -> Result<&MotorParameters, MotorError> {
        self.motors
            .get(id)
            .ok_or_else(|| MotorError::UnknownMotor(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.motors.contains_key(id)
    }

    /// All motor identifiers, sorted.
    pub fn list(&self) -> Vec<&str> {
        self.motors.keys().map(String::as_str).collect()
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }

    /// Union of the motors in the named categories, sorted and deduplicated.
    /// Ids listed in a category but missing from the catalog are skipped.
    pub fn motors_in_categories(&self, names: &[String]) -> Result<Vec<String>, MotorError> {
        let mut selected = BTreeSet::new();
        for name in names {
            let ids = self
                .categories
                .get(name)
                .ok_or_else(|| MotorError::UnknownCategory(name.clone()))?;
            for id in ids {
                if self.motors.contains_key(id) {
                    selected.insert(id.clone());
                }
            }
        }
        Ok(selected.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.motors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_consistent() {
        let catalog = MotorCatalog::builtin();
        assert!(catalog.len() >= 8);
        for id in catalog.list() {
            let m = catalog.get(id).unwrap();
            m.validate(id).unwrap();
        }
        // Every category member exists
        for name in catalog.category_names() {
            let ids = catalog
                .motors_in_categories(&[name.to_string()])
                .unwrap();
            assert!(!ids.is_empty());
        }
    }

    #[test]
    fn category_union_deduplicates() {
        let catalog = MotorCatalog::builtin();
        let both = catalog
            .motors_in_categories(&["5in_freestyle".to_string(), "7in_longrange".to_string()])
            .unwrap();
        // XING 2306 appears in both categories, once in the union
        let xing_count = both
            .iter()
            .filter(|id| id.contains("XING 2306"))
            .count();
        assert_eq!(xing_count, 1);
        assert!(both.len() >= 4);
    }

    #[test]
    fn unknown_category_is_an_error() {
        let catalog = MotorCatalog::builtin();
        assert!(matches!(
            catalog.motors_in_categories(&["racing_27in".to_string()]),
            Err(MotorError::UnknownCategory(_))
        ));
    }

    #[test]
    fn json_round_trip() {
        let json = r#"{
            "motors": {
                "Bench 2207": {
                    "kv": 1800, "rm_cold": 0.05, "i0_ref": 1.0, "i0_rpm_ref": 14000,
                    "i_max": 30, "p_max": 500
                }
            },
            "categories": {"bench": ["Bench 2207"]}
        }"#;
        let catalog = MotorCatalog::from_json_str(json).unwrap();
        let m = catalog.get("Bench 2207").unwrap();
        assert_eq!(m.kv, 1800.0);
        assert_eq!(m.temp_ref, 25.0); // default applied
        assert_eq!(m.poles, 14);
        assert_eq!(
            catalog.motors_in_categories(&["bench".to_string()]).unwrap(),
            vec!["Bench 2207".to_string()]
        );
    }

    #[test]
    fn invalid_preset_rejected() {
        let json = r#"{
            "motors": {
                "Broken": {"kv": 0, "rm_cold": 0.05, "i0_ref": 1.0, "i0_rpm_ref": 14000}
            }
        }"#;
        assert!(matches!(
            MotorCatalog::from_json_str(json),
            Err(MotorError::InvalidParameter(_))
        ));
    }
}
