// Keycombo Configuration Bridge
// Typed records and operations for the combo editor screen

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::combo::{Combo, KeySpec};
use crate::config::{parse_chord_string, ChordParseError, LoadReport, SharedComboStore, StoreError};
use crate::input::{capture_key_spec, key_event_to_tokens, ToolkitModifiers};
use crate::scancode::NativeKeymap;

fn is_false(value: &bool) -> bool {
    !*value
}

/// A key spec as handed to the editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeySpecRecord {
    #[serde(default)]
    pub scancode: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
    /// The editor should fill this spec from the next key press
    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_detect: bool,
}

/// A combo as handed to the editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboRecord {
    pub input: KeySpecRecord,
    #[serde(default)]
    pub outputs: Vec<KeySpecRecord>,
    #[serde(default)]
    pub description: String,
    /// Freshly created combo still waiting for its keys
    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_detect_mode: bool,
}

impl From<&KeySpec> for KeySpecRecord {
    fn from(spec: &KeySpec) -> Self {
        Self {
            scancode: spec.scancode.clone(),
            modifiers: spec.modifiers.clone(),
            auto_detect: false,
        }
    }
}

impl From<KeySpecRecord> for KeySpec {
    fn from(record: KeySpecRecord) -> Self {
        KeySpec::new(record.scancode, record.modifiers)
    }
}

impl From<&Combo> for ComboRecord {
    fn from(combo: &Combo) -> Self {
        Self {
            input: KeySpecRecord::from(&combo.input),
            outputs: combo.outputs.iter().map(KeySpecRecord::from).collect(),
            description: combo.description.clone(),
            auto_detect_mode: false,
        }
    }
}

impl From<ComboRecord> for Combo {
    fn from(record: ComboRecord) -> Self {
        Combo::new(
            record.input.into(),
            record.outputs.into_iter().map(KeySpec::from).collect(),
            record.description,
        )
    }
}

/// Operations the combo editor needs, backed by the shared store.
///
/// Saving or reloading changes the store only; engines holding a runtime
/// snapshot pick the change up on their next `refresh`.
#[derive(Clone)]
pub struct ComboBridge {
    store: SharedComboStore,
    keymap: NativeKeymap,
}

impl ComboBridge {
    pub fn new(store: SharedComboStore, keymap: NativeKeymap) -> Self {
        Self { store, keymap }
    }

    pub fn store(&self) -> &SharedComboStore {
        &self.store
    }

    /// Current combos, in declaration order
    pub fn load_combos(&self) -> Vec<ComboRecord> {
        self.store.read().combos().iter().map(ComboRecord::from).collect()
    }

    /// Replace every combo and persist the new list
    pub fn save_combos(&self, records: Vec<ComboRecord>) -> Result<(), StoreError> {
        let combos = records.into_iter().map(Combo::from).collect();
        self.store.write().save(combos)
    }

    /// Discard unsaved edits and read the keymap file again
    pub fn reload_combos(&self) -> Result<LoadReport, StoreError> {
        self.store.write().reload()
    }

    /// Key spec waiting for the next key press
    pub fn empty_key_spec(&self) -> KeySpecRecord {
        KeySpecRecord {
            auto_detect: true,
            ..KeySpecRecord::from(&KeySpec::empty())
        }
    }

    /// New combo with one placeholder input and one placeholder output
    pub fn empty_combo(&self) -> ComboRecord {
        ComboRecord {
            input: self.empty_key_spec(),
            outputs: vec![self.empty_key_spec()],
            description: String::new(),
            auto_detect_mode: true,
        }
    }

    /// Key spec for a key press seen by the toolkit
    pub fn capture_key(&self, native_scancode: u32, toolkit_modifiers: u32) -> KeySpecRecord {
        let flags = ToolkitModifiers::from_bits_truncate(toolkit_modifiers);
        KeySpecRecord::from(&capture_key_spec(native_scancode, flags, self.keymap))
    }

    /// `+`-joined token string for a key press seen by the toolkit
    pub fn key_event_to_tokens(&self, native_scancode: u32, toolkit_modifiers: u32) -> String {
        let flags = ToolkitModifiers::from_bits_truncate(toolkit_modifiers);
        key_event_to_tokens(native_scancode, flags, self.keymap)
    }

    /// Key spec from a `+`-joined token string typed by the user
    pub fn parse_tokens(&self, text: &str) -> Result<KeySpecRecord, ChordParseError> {
        parse_chord_string(text).map(|spec| KeySpecRecord::from(&spec))
    }

    /// Keymap file in use, once resolved
    pub fn keymap_path(&self) -> Option<PathBuf> {
        self.store.read().path().map(PathBuf::from)
    }
}
