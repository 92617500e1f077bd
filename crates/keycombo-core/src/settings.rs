// Keycombo Settings Module
// User settings that switch combos on/off and describe the input backend

#![cfg(feature = "settings")]

use std::path::{Path, PathBuf};

use crate::config::store::APP_DIR;
use crate::scancode::NativeKeymap;
use crate::transform::EngineSettings;

/// Settings for the combo engine
///
/// These settings are loaded from a TOML file (default: ~/.config/keycombo/settings.toml).
#[derive(Debug, Clone)]
pub struct Settings {
    /// Master switch for user combos
    combos_enabled: bool,

    /// Explicit keymap file instead of the default location
    keymap_path: Option<PathBuf>,

    /// Whether absolute pointer capture is engaged; combos only fire then
    absolute_mouse_mode: bool,

    /// Numbering used by the windowing layer for physical keys
    native_keymap: NativeKeymap,

    /// Path to the settings file (for reload)
    source_path: Option<PathBuf>,
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid setting value: {0}")]
    InvalidValue(String),
}

/// TOML representation for deserializing settings
#[derive(Debug, Clone, serde::Deserialize, Default)]
struct SettingsToml {
    #[serde(default)]
    combos: Option<CombosSection>,

    #[serde(default)]
    input: Option<InputSection>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct CombosSection {
    #[serde(default)]
    enabled: Option<toml::Value>,
    #[serde(default)]
    keymap: Option<PathBuf>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct InputSection {
    #[serde(default)]
    absolute_mouse_mode: Option<toml::Value>,
    #[serde(default)]
    native_keymap: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    /// Settings used when no file exists
    pub fn new() -> Self {
        Self {
            combos_enabled: true,
            keymap_path: None,
            absolute_mouse_mode: false,
            native_keymap: NativeKeymap::default(),
            source_path: None,
        }
    }

    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(&path)?;
        let mut settings = Self::from_toml(&content)?;
        settings.source_path = Some(path.as_ref().to_path_buf());
        Ok(settings)
    }

    /// Load settings from TOML string
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let toml_settings: SettingsToml =
            toml::from_str(content).map_err(|e| SettingsError::TomlParse(e.to_string()))?;

        let mut settings = Self::new();

        if let Some(combos) = toml_settings.combos {
            if let Some(enabled) = combos.enabled {
                settings.combos_enabled = parse_bool_value(&enabled)?;
            }
            settings.keymap_path = combos.keymap;
        }

        if let Some(input) = toml_settings.input {
            if let Some(absolute) = input.absolute_mouse_mode {
                settings.absolute_mouse_mode = parse_bool_value(&absolute)?;
            }
            if let Some(keymap) = input.native_keymap {
                settings.native_keymap = keymap.parse().map_err(SettingsError::InvalidValue)?;
            }
        }

        Ok(settings)
    }

    /// Get the default settings path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR).join("settings.toml"))
    }

    /// Load from default location (~/.config/keycombo/settings.toml)
    pub fn load_default() -> Result<Self, SettingsError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        // Return default settings if file doesn't exist
        Ok(Self::new())
    }

    pub fn combos_enabled(&self) -> bool {
        self.combos_enabled
    }

    pub fn set_combos_enabled(&mut self, enabled: bool) {
        self.combos_enabled = enabled;
    }

    /// Keymap file override, if configured
    pub fn keymap_path(&self) -> Option<&Path> {
        self.keymap_path.as_deref()
    }

    pub fn absolute_mouse_mode(&self) -> bool {
        self.absolute_mouse_mode
    }

    pub fn native_keymap(&self) -> NativeKeymap {
        self.native_keymap
    }

    /// File these settings were read from
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Values the engine consumes, resolved once
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            combos_enabled: self.combos_enabled,
            absolute_mouse_mode: self.absolute_mouse_mode,
            native_keymap: self.native_keymap,
        }
    }

    /// Reload settings from the file they were read from
    pub fn reload(&mut self) -> Result<(), SettingsError> {
        if let Some(ref path) = self.source_path {
            let new_settings = Self::from_file(path)?;
            *self = new_settings;
            Ok(())
        } else {
            Err(SettingsError::InvalidValue("No source path set".to_string()))
        }
    }
}

/// Parse a TOML value as a boolean
fn parse_bool_value(value: &toml::Value) -> Result<bool, SettingsError> {
    match value {
        toml::Value::Boolean(b) => Ok(*b),
        toml::Value::Integer(1) => Ok(true),
        toml::Value::Integer(0) => Ok(false),
        toml::Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(SettingsError::InvalidValue(format!(
                "Cannot convert '{}' to boolean",
                s
            ))),
        },
        _ => Err(SettingsError::InvalidValue(format!(
            "Cannot convert {:?} to boolean",
            value
        ))),
    }
}

/// Create default settings content for a new installation
pub fn default_settings_content() -> &'static str {
    r#"# Keycombo Settings
# Place this file at: ~/.config/keycombo/settings.toml

[combos]
# Turn user key combos on or off
enabled = true

# Optional keymap file (defaults to keymap.xml next to this file)
# keymap = "/path/to/keymap.xml"

[input]
# Combos only fire while the pointer is captured in absolute mode
absolute_mouse_mode = false

# How the windowing layer numbers keys: "evdev", "xkb" or "win32"
native_keymap = "xkb"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_settings_default() {
        let settings = Settings::new();
        assert!(settings.combos_enabled());
        assert!(!settings.absolute_mouse_mode());
        assert_eq!(settings.native_keymap(), NativeKeymap::Xkb);
        assert_eq!(settings.keymap_path(), None);
    }

    #[test]
    fn test_settings_from_toml() {
        let toml = r#"
[combos]
enabled = false
keymap = "/tmp/keymap.xml"

[input]
absolute_mouse_mode = true
native_keymap = "win32"
"#;

        let settings = Settings::from_toml(toml).unwrap();
        assert!(!settings.combos_enabled());
        assert_eq!(settings.keymap_path(), Some(Path::new("/tmp/keymap.xml")));
        assert!(settings.absolute_mouse_mode());
        assert_eq!(settings.native_keymap(), NativeKeymap::Win32);
    }

    #[test]
    fn test_settings_with_string_values() {
        let toml = r#"
[combos]
enabled = "off"

[input]
absolute_mouse_mode = "yes"
"#;

        let settings = Settings::from_toml(toml).unwrap();
        assert!(!settings.combos_enabled());
        assert!(settings.absolute_mouse_mode());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            Settings::from_toml("[combos]\nenabled = \"maybe\"\n"),
            Err(SettingsError::InvalidValue(_))
        ));
        assert!(matches!(
            Settings::from_toml("[input]\nnative_keymap = \"amiga\"\n"),
            Err(SettingsError::InvalidValue(_))
        ));
        assert!(matches!(
            Settings::from_toml("[combos"),
            Err(SettingsError::TomlParse(_))
        ));
    }

    #[test]
    fn test_default_content_parses() {
        let settings = Settings::from_toml(default_settings_content()).unwrap();
        let engine = settings.engine_settings();
        assert!(engine.combos_enabled);
        assert!(!engine.absolute_mouse_mode);
        assert_eq!(engine.native_keymap, NativeKeymap::Xkb);
    }

    #[test]
    fn test_reload_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[combos]\nenabled = true").unwrap();

        let mut settings = Settings::from_file(file.path()).unwrap();
        assert!(settings.combos_enabled());

        std::fs::write(file.path(), "[combos]\nenabled = false\n").unwrap();
        settings.reload().unwrap();
        assert!(!settings.combos_enabled());
        assert_eq!(settings.source_path(), Some(file.path()));
    }

    #[test]
    fn test_reload_without_source_fails() {
        let mut settings = Settings::new();
        assert!(settings.reload().is_err());
    }
}
