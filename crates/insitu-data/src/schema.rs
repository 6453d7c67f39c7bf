//! Serde data file structs for game content definitions.
//!
//! These structs define the on-disk format for resources, machines, recipes
//! and harvest actions. They are deserialized from RON, JSON, or TOML data
//! files and then resolved into catalog types by the loader.
//!
//! Every file is a map from key to definition. Map order is significant: it
//! fixes display order, starting machine order and each machine's first
//! recipe, so maps are read into [`Entries`] rather than a hash map.

use serde::Deserialize;
use serde::de::{Deserializer, MapAccess, Visitor};
use std::fmt;
use std::marker::PhantomData;

// ===========================================================================
// Ordered maps
// ===========================================================================

/// A map read in document order, duplicates included.
#[derive(Debug, Clone, PartialEq)]
pub struct Entries<T>(pub Vec<(String, T)>);

impl<T> Entries<T> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for Entries<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

struct EntriesVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
    type Value = Entries<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of keys to definitions")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, T>()? {
            entries.push((key, value));
        }
        Ok(Entries(entries))
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Entries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

// ===========================================================================
// Resources
// ===========================================================================

fn default_unit() -> String {
    "u".to_string()
}

/// A resource definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceData {
    /// Display name. Empty falls back to the key.
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default, rename = "starting amount", alias = "starting_amount")]
    pub starting_amount: f64,
}

// ===========================================================================
// Machines
// ===========================================================================

/// A machine type definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineData {
    #[serde(default)]
    pub name: String,
    /// Resource key -> amount.
    #[serde(default)]
    pub cost: Entries<f64>,
    /// Instances present when a session starts.
    #[serde(default, rename = "starting amount", alias = "starting_amount")]
    pub starting_count: u32,
}

// ===========================================================================
// Recipes
// ===========================================================================

/// A recipe definition in a data file. Rates are per second.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    /// Machine type keys allowed to run this recipe.
    #[serde(default)]
    pub machines: Vec<String>,
    #[serde(default)]
    pub inputs: Entries<f64>,
    #[serde(default)]
    pub outputs: Entries<f64>,
}

// ===========================================================================
// Harvest actions
// ===========================================================================

/// A manual harvest action in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestData {
    /// Button label.
    pub action: String,
    pub resource: String,
    pub amount: f64,
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_entries_keep_document_order() {
        let json = r#"{ "zinc": 1.0, "argon": 2.0, "mercury": 3.0 }"#;
        let entries: Entries<f64> = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zinc", "argon", "mercury"]);
    }

    #[test]
    fn json_entries_keep_duplicates() {
        let json = r#"{ "a": 1.0, "a": 2.0 }"#;
        let entries: Entries<f64> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn toml_entries_keep_document_order() {
        let toml_str = "zinc = 1.0\nargon = 2.0\nmercury = 3.0\n";
        let entries: Entries<f64> = toml::from_str(toml_str).unwrap();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zinc", "argon", "mercury"]);
    }

    #[test]
    fn ron_entries_keep_document_order() {
        let ron_str = r#"{ "zinc": 1.0, "argon": 2.0, "mercury": 3.0 }"#;
        let entries: Entries<f64> = ron::from_str(ron_str).unwrap();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zinc", "argon", "mercury"]);
    }

    #[test]
    fn resource_defaults() {
        let r: ResourceData = serde_json::from_str("{}").unwrap();
        assert_eq!(r.name, "");
        assert_eq!(r.unit, "u");
        assert_eq!(r.starting_amount, 0.0);
    }

    #[test]
    fn resource_starting_amount_spelled_with_space() {
        let r: ResourceData =
            serde_json::from_str(r#"{ "name": "Ice", "unit": "g", "starting amount": 50 }"#)
                .unwrap();
        assert_eq!(r.name, "Ice");
        assert_eq!(r.starting_amount, 50.0);
    }

    #[test]
    fn machine_from_json() {
        let m: MachineData = serde_json::from_str(
            r#"{ "name": "Drill", "cost": { "iron": 20, "energy": 5 }, "starting amount": 2 }"#,
        )
        .unwrap();
        assert_eq!(m.name, "Drill");
        assert_eq!(
            m.cost.0,
            vec![("iron".to_string(), 20.0), ("energy".to_string(), 5.0)]
        );
        assert_eq!(m.starting_count, 2);
    }

    #[test]
    fn machine_from_ron() {
        let m: MachineData =
            ron::from_str(r#"(name: "Drill", cost: { "iron": 20.0 }, starting_amount: 1)"#)
                .unwrap();
        assert_eq!(m.cost.len(), 1);
        assert_eq!(m.starting_count, 1);
    }

    #[test]
    fn recipe_defaults_to_empty() {
        let r: RecipeData = serde_json::from_str("{}").unwrap();
        assert!(r.machines.is_empty());
        assert!(r.inputs.is_empty());
        assert!(r.outputs.is_empty());
    }

    #[test]
    fn harvest_requires_all_fields() {
        let ok: Result<HarvestData, _> =
            serde_json::from_str(r#"{ "action": "Dig", "resource": "regolith", "amount": 5 }"#);
        assert!(ok.is_ok());
        let missing: Result<HarvestData, _> = serde_json::from_str(r#"{ "action": "Dig" }"#);
        assert!(missing.is_err());
    }
}
