// Keycombo Config API - Combo Store
// Owns the authoritative combo list and its keymap file

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::combo::{to_runtime_combos, Combo, RuntimeCombo};
use crate::config::xml::{parse_combos, write_combos, ParseError, KEYMAP_TEMPLATE};

/// Directory name under the user config dir
pub const APP_DIR: &str = "keycombo";

/// File name of the keymap document
pub const KEYMAP_FILE: &str = "keymap.xml";

/// Store handle shared by the configuration bridge and the engine
pub type SharedComboStore = Arc<RwLock<ComboStore>>;

/// Errors from locating, reading or writing the keymap file
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("keymap path not initialized")]
    PathUnresolved,

    #[error("failed to create keymap directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to create keymap template {}: {source}", .path.display())]
    Seed { path: PathBuf, source: io::Error },

    #[error("keymap config not loaded ({}): {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write keymap {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("keymap {}: {source}", .path.display())]
    Parse { path: PathBuf, source: ParseError },

    #[error("failed to serialize keymap: {0}")]
    Serialize(#[from] quick_xml::Error),
}

/// Outcome of a successful load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    /// Malformed combo elements that were dropped
    pub skipped: usize,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped == 0
    }
}

/// The combo list in token form, backed by a keymap file.
///
/// The list only changes through `load`, `reload` and `save`.
#[derive(Debug, Default)]
pub struct ComboStore {
    path: Option<PathBuf>,
    combos: Vec<Combo>,
}

impl ComboStore {
    /// Empty store; the default location is resolved on the first load
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store bound to an explicit keymap file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            combos: Vec::new(),
        }
    }

    /// `<config_dir>/keycombo/keymap.xml`, without touching the filesystem
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(KEYMAP_FILE))
    }

    /// Keymap file in use, once resolved
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn combos(&self) -> &[Combo] {
        &self.combos
    }

    pub fn is_empty(&self) -> bool {
        self.combos.is_empty()
    }

    /// Matching form of the current list, rebuilt on every call
    pub fn runtime_combos(&self) -> Vec<RuntimeCombo> {
        to_runtime_combos(&self.combos)
    }

    pub fn into_shared(self) -> SharedComboStore {
        Arc::new(RwLock::new(self))
    }

    /// Read the keymap file, seeding the template when it does not exist yet.
    ///
    /// An unreadable file leaves the current list alone. A document that is
    /// not well-formed leaves the list empty.
    pub fn load(&mut self) -> Result<LoadReport, StoreError> {
        let path = self.ensure_path().map_err(log_store_error)?;

        let xml = fs::read_to_string(&path).map_err(|source| {
            log_store_error(StoreError::Read {
                path: path.clone(),
                source,
            })
        })?;

        self.combos.clear();
        let parsed = parse_combos(&xml).map_err(|source| {
            log_store_error(StoreError::Parse {
                path: path.clone(),
                source,
            })
        })?;

        if parsed.skipped > 0 {
            log::warn!(
                "Keymap {}: skipped {} combo(s) without an <in> binding",
                path.display(),
                parsed.skipped
            );
        }
        let report = LoadReport {
            loaded: parsed.combos.len(),
            skipped: parsed.skipped,
        };
        self.combos = parsed.combos;
        log::debug!("loaded {} combo(s) from {}", report.loaded, path.display());
        Ok(report)
    }

    /// Discard unsaved edits and read the keymap file again
    pub fn reload(&mut self) -> Result<LoadReport, StoreError> {
        self.load()
    }

    /// Replace the whole list, then write it to the keymap file.
    ///
    /// The file is overwritten in place. If writing fails the new list is
    /// still the one in memory.
    pub fn save(&mut self, combos: Vec<Combo>) -> Result<(), StoreError> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => return Err(log_store_error(StoreError::PathUnresolved)),
        };

        self.combos = combos;
        let xml = write_combos(&self.combos).map_err(|e| log_store_error(e.into()))?;
        fs::write(&path, xml).map_err(|source| {
            log_store_error(StoreError::Write {
                path: path.clone(),
                source,
            })
        })?;

        log::debug!("saved {} combo(s) to {}", self.combos.len(), path.display());
        Ok(())
    }

    /// Resolve the keymap path and make sure a file exists there
    fn ensure_path(&mut self) -> Result<PathBuf, StoreError> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => resolve_default_dir()
                .ok_or(StoreError::PathUnresolved)?
                .join(KEYMAP_FILE),
        };

        if !path.exists() {
            seed_template(&path)?;
        }

        self.path = Some(path.clone());
        Ok(path)
    }
}

/// Preferred config directory, or the executable's directory when it cannot be created
fn resolve_default_dir() -> Option<PathBuf> {
    if let Some(dir) = dirs::config_dir().map(|dir| dir.join(APP_DIR)) {
        match fs::create_dir_all(&dir) {
            Ok(()) => return Some(dir),
            Err(e) => log::warn!(
                "Failed to create keymap directory ({}): {}. Falling back to application dir.",
                dir.display(),
                e
            ),
        }
    }

    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

fn seed_template(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, KEYMAP_TEMPLATE).map_err(|source| StoreError::Seed {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("created keymap template at {}", path.display());
    Ok(())
}

fn log_store_error(error: StoreError) -> StoreError {
    log::warn!("{}", error);
    error
}
