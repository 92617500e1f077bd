// Keycombo Config API - Chord String Parser
// Parses chord strings like "KMOD_LCTRL+KMOD_LALT+SDL_SCANCODE_F1" into key specs

use std::collections::HashSet;

use crate::combo::{KeySpec, CHORD_SEPARATOR};
use crate::modifier::ModifierToken;
use crate::scancode::{scancode_to_token, token_to_scancode};

/// Errors that can occur during chord parsing
#[derive(Debug, Clone, PartialEq)]
pub enum ChordParseError {
    /// Empty input string
    EmptyInput,
    /// Key name not recognized
    UnknownKey(String),
    /// Modifier token not recognized
    UnknownModifier(String),
    /// Input ends with a separator (e.g., "KMOD_CTRL+")
    TrailingSeparator,
}

impl std::fmt::Display for ChordParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChordParseError::EmptyInput => write!(f, "chord string cannot be empty"),
            ChordParseError::UnknownKey(name) => write!(f, "unknown key name: '{}'", name),
            ChordParseError::UnknownModifier(name) => write!(f, "unknown modifier: '{}'", name),
            ChordParseError::TrailingSeparator => {
                write!(f, "chord string cannot end with '{}'", CHORD_SEPARATOR)
            }
        }
    }
}

impl std::error::Error for ChordParseError {}

/// Parse a `+`-joined chord string into a key spec with canonical tokens
///
/// The last component is the key, everything before it a modifier.
/// Tokens are matched leniently (`ctrl+alt+f1` works) but written back in
/// canonical form. Repeated modifiers are kept once.
///
/// # Examples
/// ```
/// use keycombo_core::config::parse_chord_string;
/// let spec = parse_chord_string("Ctrl+Alt+F1").unwrap();
/// assert_eq!(spec.scancode, "SDL_SCANCODE_F1");
/// assert_eq!(spec.modifiers, vec!["KMOD_CTRL", "KMOD_ALT"]);
/// ```
pub fn parse_chord_string(exp: &str) -> Result<KeySpec, ChordParseError> {
    let trimmed = exp.trim();
    if trimmed.is_empty() {
        return Err(ChordParseError::EmptyInput);
    }
    if trimmed.ends_with(CHORD_SEPARATOR) {
        return Err(ChordParseError::TrailingSeparator);
    }

    let parts: Vec<&str> = trimmed.split(CHORD_SEPARATOR).map(str::trim).collect();
    let (key_str, modifier_strs) = match parts.split_last() {
        Some(split) => split,
        None => return Err(ChordParseError::EmptyInput),
    };

    let scancode = token_to_scancode(key_str);
    let key_token = scancode_to_token(scancode)
        .ok_or_else(|| ChordParseError::UnknownKey(key_str.to_string()))?;

    let mut modifiers = Vec::new();
    let mut seen_modifiers = HashSet::new();
    for modifier_str in modifier_strs {
        let modifier = ModifierToken::parse(modifier_str)
            .ok_or_else(|| ChordParseError::UnknownModifier(modifier_str.to_string()))?;
        if seen_modifiers.insert(modifier) {
            modifiers.push(modifier.as_str().to_string());
        }
    }

    Ok(KeySpec::new(key_token, modifiers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_key() {
        let spec = parse_chord_string("SDL_SCANCODE_A").unwrap();
        assert!(spec.modifiers.is_empty());
        assert_eq!(spec.scancode, "SDL_SCANCODE_A");
    }

    #[test]
    fn test_parse_full_chord() {
        let spec = parse_chord_string("KMOD_LCTRL+KMOD_LALT+SDL_SCANCODE_F1").unwrap();
        assert_eq!(spec.modifiers, vec!["KMOD_LCTRL", "KMOD_LALT"]);
        assert_eq!(spec.scancode, "SDL_SCANCODE_F1");
    }

    #[test]
    fn test_parse_lenient_spelling() {
        let spec = parse_chord_string(" ctrl + Shift + delete ").unwrap();
        assert_eq!(spec.modifiers, vec!["KMOD_CTRL", "KMOD_SHIFT"]);
        assert_eq!(spec.scancode, "SDL_SCANCODE_DELETE");

        let spec = parse_chord_string("RSuper+esc").unwrap();
        assert_eq!(spec.modifiers, vec!["KMOD_RGUI"]);
        assert_eq!(spec.scancode, "SDL_SCANCODE_ESCAPE");
    }

    #[test]
    fn test_display_output_parses_back() {
        let spec = parse_chord_string("KMOD_CTRL+KMOD_RSHIFT+SDL_SCANCODE_TAB").unwrap();
        assert_eq!(parse_chord_string(&spec.to_string()).unwrap(), spec);
    }

    #[test]
    fn test_parse_empty_string() {
        assert_eq!(parse_chord_string(""), Err(ChordParseError::EmptyInput));
        assert_eq!(parse_chord_string("   "), Err(ChordParseError::EmptyInput));
    }

    #[test]
    fn test_parse_trailing_separator() {
        assert_eq!(
            parse_chord_string("KMOD_CTRL+"),
            Err(ChordParseError::TrailingSeparator)
        );
    }

    #[test]
    fn test_parse_unknown_key() {
        let result = parse_chord_string("KMOD_CTRL+SDL_SCANCODE_NOTAKEY");
        assert!(matches!(result, Err(ChordParseError::UnknownKey(_))));
        let result = parse_chord_string("KMOD_CTRL+SDL_SCANCODE_UNKNOWN");
        assert!(matches!(result, Err(ChordParseError::UnknownKey(_))));
    }

    #[test]
    fn test_parse_unknown_modifier() {
        let result = parse_chord_string("KMOD_HYPER+SDL_SCANCODE_A");
        assert_eq!(
            result,
            Err(ChordParseError::UnknownModifier("KMOD_HYPER".to_string()))
        );
    }

    #[test]
    fn test_parse_duplicate_modifiers() {
        let spec = parse_chord_string("Ctrl+KMOD_CTRL+A").unwrap();
        assert_eq!(spec.modifiers, vec!["KMOD_CTRL"]);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ChordParseError::UnknownKey("Q2".to_string()).to_string(),
            "unknown key name: 'Q2'"
        );
        assert_eq!(
            ChordParseError::TrailingSeparator.to_string(),
            "chord string cannot end with '+'"
        );
    }
}
