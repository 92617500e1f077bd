// Keycombo Core Library
// User key combos for a remote streaming client: store, matcher and playback

pub mod action;
pub mod bridge;
pub mod combo;
pub mod config;
pub mod input;
pub mod modifier;
pub mod output;
pub mod scancode;
pub mod transform;

#[cfg(feature = "settings")]
pub mod settings;

pub use action::Action;
pub use bridge::{ComboBridge, ComboRecord, KeySpecRecord};
pub use combo::{to_runtime_combos, Combo, KeyBinding, KeySpec, RuntimeCombo};
pub use config::{
    parse_chord_string, parse_combos, write_combos, ChordParseError, ComboStore, LoadReport,
    ParseError, SharedComboStore, StoreError,
};
pub use input::{
    capture_key_spec, key_event_to_tokens, EventOrigin, KeyEvent, KeySink, NativeKeyEvent,
    ToolkitModifiers,
};
pub use modifier::{
    modifiers_from_tokens, native_to_modifiers, BindingSide, ModifierFamily, ModifierKey,
    ModifierToken, Modifiers,
};
pub use output::{Playback, PlaybackState};
pub use scancode::{
    native_to_scancode, scancode_to_token, token_to_scancode, NativeKeymap, Scancode,
    ScancodeTable,
};
pub use transform::{find_combo_match, ComboEngine, ComboMatchResult, Disposition, EngineSettings};

#[cfg(feature = "settings")]
pub use settings::{Settings, SettingsError};
