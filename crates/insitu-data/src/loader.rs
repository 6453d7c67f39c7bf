//! Resolution pipeline: reads data files, resolves cross-references, builds
//! the catalog.
//!
//! A data directory holds `resources`, `machines` and `recipes` files, plus
//! an optional `harvest` file, each in RON, JSON or TOML.

use crate::schema::{Entries, HarvestData, MachineData, RecipeData, ResourceData};
use insitu_core::catalog::{Catalog, CatalogBuilder, CatalogError, ResourceAmount};
use insitu_core::id::{MachineTypeId, ResourceId};
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A key reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    #[error("duplicate key '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// A resource listed twice in one cost, inputs or outputs map.
    #[error("resource '{name}' listed more than once in '{entry}' in {file}")]
    DuplicateResource {
        file: PathBuf,
        entry: String,
        name: String,
    },

    /// The resolved catalog failed validation.
    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file from its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for `{base_name}.ron`, `.toml` or `.json`.
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// more than one format exists for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if !candidate.exists() {
            continue;
        }
        if let Some(ref existing) = found {
            return Err(DataLoadError::ConflictingFormats {
                a: existing.clone(),
                b: candidate,
            });
        }
        found = Some(candidate);
    }

    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &'static str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name,
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let parse_error = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(e.to_string())),
    }
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a key, returning an `UnresolvedRef` error if it is missing.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Return a `DuplicateName` error if `name` is already in the map.
pub fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

// ===========================================================================
// Game data
// ===========================================================================

/// The raw contents of a data directory, before resolution.
#[derive(Debug, Clone)]
pub struct GameData {
    pub resources: Entries<ResourceData>,
    pub machines: Entries<MachineData>,
    pub recipes: Entries<RecipeData>,
    pub harvest: Entries<HarvestData>,
    pub sources: DataSources,
}

/// Files each section was read from, for error reporting.
#[derive(Debug, Clone)]
pub struct DataSources {
    pub resources: PathBuf,
    pub machines: PathBuf,
    pub recipes: PathBuf,
    pub harvest: Option<PathBuf>,
}

/// Read every data file in `dir` without resolving references.
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let sources = DataSources {
        resources: require_data_file(dir, "resources")?,
        machines: require_data_file(dir, "machines")?,
        recipes: require_data_file(dir, "recipes")?,
        harvest: find_data_file(dir, "harvest")?,
    };

    let harvest = match &sources.harvest {
        Some(path) => deserialize_file(path)?,
        None => Entries::default(),
    };

    Ok(GameData {
        resources: deserialize_file(&sources.resources)?,
        machines: deserialize_file(&sources.machines)?,
        recipes: deserialize_file(&sources.recipes)?,
        harvest,
        sources,
    })
}

/// Read and resolve the data files in `dir` into a catalog.
pub fn load_catalog(dir: &Path) -> Result<Catalog, DataLoadError> {
    load_game_data(dir)?.into_catalog()
}

impl GameData {
    /// Resolve string keys into typed ids and build the catalog.
    ///
    /// Resolution order is resources, machines, recipes, harvest; each
    /// section may only reference sections resolved before it.
    pub fn into_catalog(self) -> Result<Catalog, DataLoadError> {
        let mut builder = CatalogBuilder::new();

        // Resources.
        let file = &self.sources.resources;
        let mut resource_ids: HashMap<String, ResourceId> = HashMap::new();
        for (key, data) in self.resources.iter() {
            check_duplicate(&resource_ids, key, file)?;
            let name = display_name(&data.name, key);
            let id = builder.register_resource(key, name, &data.unit, data.starting_amount);
            resource_ids.insert(key.to_string(), id);
        }

        // Machines.
        let file = &self.sources.machines;
        let mut machine_ids: HashMap<String, MachineTypeId> = HashMap::new();
        for (key, data) in self.machines.iter() {
            check_duplicate(&machine_ids, key, file)?;
            let cost = resolve_amounts(key, &data.cost, &resource_ids, file)?;
            let name = display_name(&data.name, key);
            let id = builder.register_machine(key, name, cost, data.starting_count);
            machine_ids.insert(key.to_string(), id);
        }

        // Recipes.
        let file = &self.sources.recipes;
        let mut recipe_keys: HashMap<String, ()> = HashMap::new();
        for (key, data) in self.recipes.iter() {
            check_duplicate(&recipe_keys, key, file)?;
            let machines = data
                .machines
                .iter()
                .map(|m| resolve_name(&machine_ids, m, file, "machine").copied())
                .collect::<Result<Vec<_>, _>>()?;
            let inputs = resolve_amounts(key, &data.inputs, &resource_ids, file)?;
            let outputs = resolve_amounts(key, &data.outputs, &resource_ids, file)?;
            builder.register_recipe(key, machines, inputs, outputs);
            recipe_keys.insert(key.to_string(), ());
        }

        // Harvest actions.
        if let Some(file) = &self.sources.harvest {
            let mut harvest_keys: HashMap<String, ()> = HashMap::new();
            for (key, data) in self.harvest.iter() {
                check_duplicate(&harvest_keys, key, file)?;
                let resource = *resolve_name(&resource_ids, &data.resource, file, "resource")?;
                builder.register_harvest(key, &data.action, resource, data.amount);
                harvest_keys.insert(key.to_string(), ());
            }
        }

        Ok(builder.build()?)
    }
}

fn display_name<'a>(name: &'a str, key: &'a str) -> &'a str {
    if name.is_empty() { key } else { name }
}

fn resolve_amounts(
    entry: &str,
    entries: &Entries<f64>,
    resource_ids: &HashMap<String, ResourceId>,
    file: &Path,
) -> Result<Vec<ResourceAmount>, DataLoadError> {
    let mut seen = HashSet::new();
    let mut amounts = Vec::with_capacity(entries.len());
    for (key, &amount) in entries.iter() {
        if !seen.insert(key) {
            return Err(DataLoadError::DuplicateResource {
                file: file.to_path_buf(),
                entry: entry.to_string(),
                name: key.to_string(),
            });
        }
        let resource = *resolve_name(resource_ids, key, file, "resource")?;
        amounts.push(ResourceAmount::new(resource, amount));
    }
    Ok(amounts)
}

// ===========================================================================
// Tests
// ===========================================================================
