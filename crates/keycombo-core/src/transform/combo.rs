// Keycombo Transform Combo Matching
// Core combo matching logic

use crate::combo::RuntimeCombo;
use crate::modifier::Modifiers;
use crate::Scancode;

/// Result of a combo match operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboMatchResult<'a> {
    /// No combo found
    NotFound,
    /// Found a combo without outputs; the event is only blocked
    Block(&'a RuntimeCombo),
    /// Found a combo whose outputs should be played back
    Playback(&'a RuntimeCombo),
}

impl<'a> ComboMatchResult<'a> {
    pub fn combo(&self) -> Option<&'a RuntimeCombo> {
        match *self {
            ComboMatchResult::NotFound => None,
            ComboMatchResult::Block(combo) | ComboMatchResult::Playback(combo) => Some(combo),
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, ComboMatchResult::NotFound)
    }
}

/// Try to find a matching combo in declaration order
///
/// # Arguments
/// * `combos` - Runtime combos, first match wins
/// * `scancode` - Canonical scancode of the incoming event
/// * `modifiers` - Modifier state of the incoming event, sides kept
///
/// # Returns
/// A `ComboMatchResult` indicating what was found
pub fn find_combo_match(
    combos: &[RuntimeCombo],
    scancode: Scancode,
    modifiers: Modifiers,
) -> ComboMatchResult<'_> {
    for combo in combos {
        if !combo.input.matches(scancode, modifiers) {
            continue;
        }
        return if combo.is_blocker() {
            ComboMatchResult::Block(combo)
        } else {
            ComboMatchResult::Playback(combo)
        };
    }

    ComboMatchResult::NotFound
}
