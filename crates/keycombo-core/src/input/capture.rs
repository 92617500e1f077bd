// Keycombo Input Layer - Key Capture
// Turn a key press seen by the GUI toolkit into a key spec

use bitflags::bitflags;

use crate::combo::{KeySpec, CHORD_SEPARATOR};
use crate::modifier::{native_to_modifiers, ModifierFamily, ModifierKey, Modifiers};
use crate::scancode::{native_to_scancode, scancode_to_token, NativeKeymap, Scancode, UNKNOWN_TOKEN};

bitflags! {
    /// Modifier flags as reported by the GUI toolkit, without sides
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ToolkitModifiers: u32 {
        const SHIFT = 0x0200_0000;
        const CONTROL = 0x0400_0000;
        const ALT = 0x0800_0000;
        const META = 0x1000_0000;
    }
}

impl ToolkitModifiers {
    /// Convert to a modifier mask for a press of `pressed`.
    ///
    /// Toolkits report a modifier key as already held while it is being
    /// pressed, so the family the pressed key belongs to is left out.
    pub fn to_modifiers(self, pressed: Scancode) -> Modifiers {
        let own_family = ModifierKey::from_scancode(pressed).map(ModifierKey::family);
        let mut modifiers = Modifiers::empty();
        for (flag, family) in [
            (ToolkitModifiers::SHIFT, ModifierFamily::Shift),
            (ToolkitModifiers::CONTROL, ModifierFamily::Ctrl),
            (ToolkitModifiers::ALT, ModifierFamily::Alt),
            (ToolkitModifiers::META, ModifierFamily::Gui),
        ] {
            if self.contains(flag) && own_family != Some(family) {
                modifiers |= family.both();
            }
        }
        modifiers
    }
}

/// Build a key spec from a captured native key press
pub fn capture_key_spec(native: u32, toolkit: ToolkitModifiers, keymap: NativeKeymap) -> KeySpec {
    let scancode = native_to_scancode(native, keymap);
    let modifiers = toolkit.to_modifiers(scancode);
    let token = scancode_to_token(scancode).unwrap_or(UNKNOWN_TOKEN);
    KeySpec::new(token, native_to_modifiers(modifiers))
}

/// `+`-joined display string for a captured native key press.
///
/// A key without a token contributes nothing, leaving only the modifiers.
pub fn key_event_to_tokens(native: u32, toolkit: ToolkitModifiers, keymap: NativeKeymap) -> String {
    let scancode = native_to_scancode(native, keymap);
    let mut tokens = toolkit.to_modifiers(scancode).tokens();
    if let Some(token) = scancode_to_token(scancode) {
        tokens.push(token);
    }
    tokens.join(&CHORD_SEPARATOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_plain_key() {
        // evdev KEY_A
        let spec = capture_key_spec(30, ToolkitModifiers::empty(), NativeKeymap::Evdev);
        assert_eq!(spec.scancode, "SDL_SCANCODE_A");
        assert!(spec.modifiers.is_empty());
    }

    #[test]
    fn test_capture_uses_unqualified_families() {
        let flags = ToolkitModifiers::CONTROL | ToolkitModifiers::ALT;
        let spec = capture_key_spec(67, flags, NativeKeymap::Xkb);
        assert_eq!(spec.scancode, "SDL_SCANCODE_F1");
        assert_eq!(spec.modifiers, vec!["KMOD_CTRL", "KMOD_ALT"]);
    }

    #[test]
    fn test_modifier_key_excludes_its_own_family() {
        // Pressing left shift while the toolkit already reports SHIFT
        let flags = ToolkitModifiers::SHIFT | ToolkitModifiers::CONTROL;
        assert_eq!(flags.to_modifiers(Scancode::LSHIFT), Modifiers::CTRL);
        assert_eq!(
            key_event_to_tokens(42, flags, NativeKeymap::Evdev),
            "KMOD_CTRL+SDL_SCANCODE_LSHIFT"
        );
    }

    #[test]
    fn test_unknown_key_capture() {
        let spec = capture_key_spec(0, ToolkitModifiers::META, NativeKeymap::Evdev);
        assert_eq!(spec.scancode, UNKNOWN_TOKEN);
        assert!(spec.is_autodetect());
        assert_eq!(key_event_to_tokens(0, ToolkitModifiers::META, NativeKeymap::Evdev), "KMOD_GUI");
    }

    #[test]
    fn test_tokens_string_for_chord() {
        let flags = ToolkitModifiers::CONTROL | ToolkitModifiers::SHIFT;
        // win32 extended Delete
        assert_eq!(
            key_event_to_tokens(0x153, flags, NativeKeymap::Win32),
            "KMOD_CTRL+KMOD_SHIFT+SDL_SCANCODE_DELETE"
        );
    }
}
