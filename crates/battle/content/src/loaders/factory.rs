//! Content factory for building battles from a data directory.

use std::path::{Path, PathBuf};

use battle_core::{BattleConfig, CatalogOracle, CatalogSnapshot};

use crate::loaders::{CatalogLoader, ConfigLoader, Encounter, EncounterLoader, LoadResult};

/// Content factory that loads all battle content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml        (optional)
/// ├── catalog.ron
/// └── encounters/
///     ├── frost_cavern.ron
///     └── ember_wyrm.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load tuning from `config.toml`, or the defaults when the file is absent.
    pub fn load_config(&self) -> LoadResult<BattleConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            tracing::debug!(target: "content::config", path = %path.display(), "no config file, using defaults");
            return Ok(BattleConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load the skill/item/duo catalog from `catalog.ron`.
    pub fn load_catalog(&self) -> LoadResult<CatalogSnapshot> {
        let path = self.data_dir.join("catalog.ron");
        CatalogLoader::load(&path)
    }

    /// Load and validate an encounter.
    ///
    /// `name` is either a file stem under `encounters/` or a path to a
    /// `.ron` file.
    pub fn load_encounter(&self, name: &str, catalog: &dyn CatalogOracle) -> LoadResult<Encounter> {
        EncounterLoader::load(&self.encounter_path(name), catalog)
    }

    /// Resolves an encounter name to the file it is read from.
    pub fn encounter_path(&self, name: &str) -> PathBuf {
        let candidate = Path::new(name);
        if candidate.extension().is_some_and(|ext| ext == "ron") {
            candidate.to_path_buf()
        } else {
            self.data_dir.join("encounters").join(format!("{}.ron", name))
        }
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
