// Keycombo Combo Types
// Token-form combos for editing and persistence, runtime bindings for matching

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::modifier::{modifiers_from_tokens, BindingSide, Modifiers};
use crate::scancode::{token_to_scancode, Scancode};

/// Separator used when a key spec is shown as a single string
pub const CHORD_SEPARATOR: char = '+';

/// A key plus modifiers, exactly as written in the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySpec {
    /// Scancode token, e.g. `SDL_SCANCODE_F1`
    pub scancode: String,
    /// Modifier tokens in written order, e.g. `["KMOD_LCTRL", "KMOD_LALT"]`
    pub modifiers: Vec<String>,
}

impl KeySpec {
    pub fn new(scancode: impl Into<String>, modifiers: Vec<String>) -> Self {
        Self {
            scancode: scancode.into(),
            modifiers,
        }
    }

    /// Placeholder spec waiting for the next physical key press
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when the scancode does not resolve to a known key
    pub fn is_autodetect(&self) -> bool {
        token_to_scancode(&self.scancode).is_unknown()
    }

    /// Resolve into a binding using the convention of `side`
    pub fn to_binding(&self, side: BindingSide) -> KeyBinding {
        KeyBinding {
            scancode: token_to_scancode(&self.scancode),
            modifiers: modifiers_from_tokens(&self.modifiers, side),
        }
    }
}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}{}", modifier, CHORD_SEPARATOR)?;
        }
        write!(f, "{}", self.scancode)
    }
}

/// A user-defined combo in token form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combo {
    pub input: KeySpec,
    /// Played back in order; empty means the input is only blocked
    pub outputs: Vec<KeySpec>,
    pub description: String,
}

impl Combo {
    pub fn new(input: KeySpec, outputs: Vec<KeySpec>, description: impl Into<String>) -> Self {
        Self {
            input,
            outputs,
            description: description.into(),
        }
    }

    /// Fresh combo for an editor: autodetect input and one autodetect output
    pub fn template() -> Self {
        Self::new(KeySpec::empty(), vec![KeySpec::empty()], String::new())
    }

    pub fn is_blocker(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Project into the runtime form used by the matcher
    pub fn to_runtime(&self) -> RuntimeCombo {
        let runtime = RuntimeCombo {
            input: self.input.to_binding(BindingSide::Input),
            outputs: self
                .outputs
                .iter()
                .map(|out| out.to_binding(BindingSide::Output))
                .collect(),
            description: self.description.clone(),
        };
        log::debug!(
            "combo {} -> {:?} with {} output(s)",
            self.input,
            runtime.input,
            runtime.outputs.len()
        );
        runtime
    }
}

/// A resolved key plus modifier mask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub scancode: Scancode,
    pub modifiers: Modifiers,
}

impl KeyBinding {
    pub fn new(scancode: Scancode, modifiers: Modifiers) -> Self {
        Self {
            scancode,
            modifiers,
        }
    }

    /// Whether a key event with `scancode` and `modifiers` triggers this binding.
    ///
    /// Unknown scancodes never match. Event modifiers are folded so an
    /// unqualified family in the binding accepts either physical side, then
    /// the masks must be equal.
    pub fn matches(&self, scancode: Scancode, modifiers: Modifiers) -> bool {
        if scancode.is_unknown() || scancode != self.scancode {
            return false;
        }
        modifiers.fold_for(self.modifiers) == self.modifiers
    }
}

/// A combo resolved for matching and playback
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeCombo {
    pub input: KeyBinding,
    pub outputs: Vec<KeyBinding>,
    pub description: String,
}

impl RuntimeCombo {
    pub fn is_blocker(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// Build the runtime table for a list of token combos
pub fn to_runtime_combos(combos: &[Combo]) -> Vec<RuntimeCombo> {
    combos.iter().map(Combo::to_runtime).collect()
}
