// Keycombo Transform Module
// Combo matching and the engine that applies it to incoming key events

pub mod combo;
pub mod engine;

pub use combo::{find_combo_match, ComboMatchResult};
pub use engine::{ComboEngine, Disposition, EngineSettings};
