// Keycombo Config API
// Combo persistence, the keymap document format and chord string parsing

pub mod combo_parser;
pub mod store;
pub mod xml;

pub use combo_parser::{parse_chord_string, ChordParseError};
pub use store::{ComboStore, LoadReport, SharedComboStore, StoreError, KEYMAP_FILE};
pub use xml::{parse_combos, write_combos, ParseError, ParsedCombos, KEYMAP_TEMPLATE};
