use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::error::PropError;
use super::table::{PropSample, PropTable};

/// Read-only collection of propeller performance tables, keyed by the
/// propeller identifier. Loaded once, then shared across a whole batch.
#[derive(Debug, Clone, Default)]
pub struct PropDatabase {
    props: BTreeMap<String, PropTable>,
}

#[derive(Deserialize)]
struct RawDatabase {
    props: BTreeMap<String, Vec<PropSample>>,
}

impl PropDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a database from a JSON file of the form
    /// `{"props": {"10x5": [{"v_ms": .., "rpm": .., "thrust_n": .., "power_w": ..}, ..]}}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PropError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(json: &str) -> Result<Self, PropError> {
        let raw: RawDatabase = serde_json::from_str(json)?;
        let mut db = Self::new();
        for (id, samples) in raw.props {
            db.insert(PropTable::from_samples(id, &samples)?);
        }
        Ok(db)
    }

    pub fn insert(&mut self, table: PropTable) {
        self.props.insert(table.id().to_string(), table);
    }

    pub fn get(&self, id: &str) -> Result<&PropTable, PropError> {
        self.props
            .get(id)
            .ok_or_else(|| PropError::UnknownProp(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.props.contains_key(id)
    }

    /// All propeller identifiers, sorted.
    pub fn list(&self) -> Vec<&str> {
        self.props.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropTable> {
        self.props.values()
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}
