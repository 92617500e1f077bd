// Keycombo Modifier System
// Sided modifier masks, the physical modifier keys and their tokens

use std::fmt;

use bitflags::bitflags;
use smallvec::SmallVec;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::Scancode;

bitflags! {
    /// Modifier state of a key event or requirement of a binding.
    ///
    /// Every family has a left and a right bit. A family written without a
    /// side (`KMOD_CTRL`) sets both bits.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u16 {
        const LSHIFT = 0x0001;
        const RSHIFT = 0x0002;
        const LCTRL = 0x0040;
        const RCTRL = 0x0080;
        const LALT = 0x0100;
        const RALT = 0x0200;
        const LGUI = 0x0400;
        const RGUI = 0x0800;

        const SHIFT = Self::LSHIFT.bits() | Self::RSHIFT.bits();
        const CTRL = Self::LCTRL.bits() | Self::RCTRL.bits();
        const ALT = Self::LALT.bits() | Self::RALT.bits();
        const GUI = Self::LGUI.bits() | Self::RGUI.bits();
    }
}

/// Ordered list of physical modifier keys
pub type ModifierKeys = SmallVec<[ModifierKey; 8]>;

impl Modifiers {
    /// Interpret a native sided modifier mask, dropping lock and unknown bits
    pub fn from_native(raw: u16) -> Self {
        Self::from_bits_truncate(raw)
    }

    /// Widen `self` so it can be compared against `binding`.
    ///
    /// For each family the binding requires without a side, any physical
    /// side held in `self` sets both bits of that family.
    pub fn fold_for(self, binding: Modifiers) -> Modifiers {
        let mut folded = self;
        for family in ModifierFamily::ALL {
            let both = family.both();
            if binding.contains(both) && self.intersects(both) {
                folded |= both;
            }
        }
        folded
    }

    /// Physical keys present in this mask, in canonical order
    pub fn keys(self) -> ModifierKeys {
        ModifierKey::iter()
            .filter(|key| self.contains(key.flag()))
            .collect()
    }

    /// Expand into tokens: a whole family becomes its unqualified token
    pub fn tokens(self) -> Vec<&'static str> {
        let mut tokens = Vec::new();
        for family in ModifierFamily::ALL {
            let held = self & family.both();
            if held == family.both() {
                tokens.push(family.token());
            } else if held == family.left() {
                tokens.push(family.key(Side::Left).token());
            } else if held == family.right() {
                tokens.push(family.key(Side::Right).token());
            }
        }
        tokens
    }
}

/// Expand a modifier mask into owned tokens for a key spec
pub fn native_to_modifiers(modifiers: Modifiers) -> Vec<String> {
    modifiers.tokens().into_iter().map(str::to_string).collect()
}

/// Which physical side of the keyboard a modifier sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// A modifier family regardless of side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierFamily {
    Ctrl,
    Shift,
    Alt,
    Gui,
}

impl ModifierFamily {
    /// Families in canonical order
    pub const ALL: [ModifierFamily; 4] = [
        ModifierFamily::Ctrl,
        ModifierFamily::Shift,
        ModifierFamily::Alt,
        ModifierFamily::Gui,
    ];

    pub fn both(self) -> Modifiers {
        match self {
            ModifierFamily::Ctrl => Modifiers::CTRL,
            ModifierFamily::Shift => Modifiers::SHIFT,
            ModifierFamily::Alt => Modifiers::ALT,
            ModifierFamily::Gui => Modifiers::GUI,
        }
    }

    pub fn left(self) -> Modifiers {
        self.key(Side::Left).flag()
    }

    pub fn right(self) -> Modifiers {
        self.key(Side::Right).flag()
    }

    /// The physical key of this family on `side`
    pub fn key(self, side: Side) -> ModifierKey {
        match (self, side) {
            (ModifierFamily::Ctrl, Side::Left) => ModifierKey::LCtrl,
            (ModifierFamily::Ctrl, Side::Right) => ModifierKey::RCtrl,
            (ModifierFamily::Shift, Side::Left) => ModifierKey::LShift,
            (ModifierFamily::Shift, Side::Right) => ModifierKey::RShift,
            (ModifierFamily::Alt, Side::Left) => ModifierKey::LAlt,
            (ModifierFamily::Alt, Side::Right) => ModifierKey::RAlt,
            (ModifierFamily::Gui, Side::Left) => ModifierKey::LGui,
            (ModifierFamily::Gui, Side::Right) => ModifierKey::RGui,
        }
    }

    /// Unqualified token, e.g. `KMOD_CTRL`
    pub fn token(self) -> &'static str {
        match self {
            ModifierFamily::Ctrl => "KMOD_CTRL",
            ModifierFamily::Shift => "KMOD_SHIFT",
            ModifierFamily::Alt => "KMOD_ALT",
            ModifierFamily::Gui => "KMOD_GUI",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "CTRL" | "CONTROL" => Some(ModifierFamily::Ctrl),
            "SHIFT" => Some(ModifierFamily::Shift),
            "ALT" | "OPT" | "OPTION" => Some(ModifierFamily::Alt),
            "GUI" | "META" | "SUPER" | "WIN" | "CMD" | "COMMAND" => Some(ModifierFamily::Gui),
            _ => None,
        }
    }
}

/// A physical modifier key.
///
/// Declaration order is the canonical order used for release, press and
/// restore sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum ModifierKey {
    LCtrl,
    RCtrl,
    LShift,
    RShift,
    LAlt,
    RAlt,
    LGui,
    RGui,
}

impl ModifierKey {
    pub fn flag(self) -> Modifiers {
        match self {
            ModifierKey::LCtrl => Modifiers::LCTRL,
            ModifierKey::RCtrl => Modifiers::RCTRL,
            ModifierKey::LShift => Modifiers::LSHIFT,
            ModifierKey::RShift => Modifiers::RSHIFT,
            ModifierKey::LAlt => Modifiers::LALT,
            ModifierKey::RAlt => Modifiers::RALT,
            ModifierKey::LGui => Modifiers::LGUI,
            ModifierKey::RGui => Modifiers::RGUI,
        }
    }

    /// The key that has to be pressed to produce this modifier
    pub fn scancode(self) -> Scancode {
        match self {
            ModifierKey::LCtrl => Scancode::LCTRL,
            ModifierKey::RCtrl => Scancode::RCTRL,
            ModifierKey::LShift => Scancode::LSHIFT,
            ModifierKey::RShift => Scancode::RSHIFT,
            ModifierKey::LAlt => Scancode::LALT,
            ModifierKey::RAlt => Scancode::RALT,
            ModifierKey::LGui => Scancode::LGUI,
            ModifierKey::RGui => Scancode::RGUI,
        }
    }

    pub fn family(self) -> ModifierFamily {
        match self {
            ModifierKey::LCtrl | ModifierKey::RCtrl => ModifierFamily::Ctrl,
            ModifierKey::LShift | ModifierKey::RShift => ModifierFamily::Shift,
            ModifierKey::LAlt | ModifierKey::RAlt => ModifierFamily::Alt,
            ModifierKey::LGui | ModifierKey::RGui => ModifierFamily::Gui,
        }
    }

    /// Sided token, e.g. `KMOD_LCTRL`
    pub fn token(self) -> &'static str {
        match self {
            ModifierKey::LCtrl => "KMOD_LCTRL",
            ModifierKey::RCtrl => "KMOD_RCTRL",
            ModifierKey::LShift => "KMOD_LSHIFT",
            ModifierKey::RShift => "KMOD_RSHIFT",
            ModifierKey::LAlt => "KMOD_LALT",
            ModifierKey::RAlt => "KMOD_RALT",
            ModifierKey::LGui => "KMOD_LGUI",
            ModifierKey::RGui => "KMOD_RGUI",
        }
    }

    /// The modifier produced by a physical key, if it is one
    pub fn from_scancode(scancode: Scancode) -> Option<Self> {
        ModifierKey::iter().find(|key| key.scancode() == scancode)
    }
}

impl fmt::Display for ModifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Which way a binding is used when its modifier tokens are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingSide {
    /// Trigger chord: an unqualified family matches either physical side
    Input,
    /// Synthesized chord: an unqualified family resolves to its left key
    Output,
}

/// A parsed modifier token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierToken {
    Sided(ModifierKey),
    Family(ModifierFamily),
}

impl ModifierToken {
    /// Parse a modifier token.
    ///
    /// Accepts `KMOD_LCTRL`, `LCtrl`, `L_CONTROL`, `Ctrl`, `Super` and friends,
    /// in any letter case. Returns `None` for anything else.
    pub fn parse(token: &str) -> Option<Self> {
        let upper = token.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("KMOD_").unwrap_or(&upper);
        if name.is_empty() {
            return None;
        }

        if let Some(family) = ModifierFamily::from_name(name) {
            return Some(ModifierToken::Family(family));
        }

        for (prefix, side) in [
            ("L_", Side::Left),
            ("R_", Side::Right),
            ("L", Side::Left),
            ("R", Side::Right),
        ] {
            if let Some(rest) = name.strip_prefix(prefix) {
                if let Some(family) = ModifierFamily::from_name(rest) {
                    return Some(ModifierToken::Sided(family.key(side)));
                }
            }
        }
        None
    }

    /// Bits this token contributes to a binding used as `side`
    pub fn bits(self, side: BindingSide) -> Modifiers {
        match (self, side) {
            (ModifierToken::Sided(key), _) => key.flag(),
            (ModifierToken::Family(family), BindingSide::Input) => family.both(),
            (ModifierToken::Family(family), BindingSide::Output) => family.left(),
        }
    }

    /// Canonical spelling of this token
    pub fn as_str(self) -> &'static str {
        match self {
            ModifierToken::Sided(key) => key.token(),
            ModifierToken::Family(family) => family.token(),
        }
    }
}

impl fmt::Display for ModifierToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Build a modifier mask from tokens; unrecognised tokens are ignored
pub fn modifiers_from_tokens<S: AsRef<str>>(tokens: &[S], side: BindingSide) -> Modifiers {
    let mut modifiers = Modifiers::empty();
    for token in tokens {
        match ModifierToken::parse(token.as_ref()) {
            Some(parsed) => modifiers |= parsed.bits(side),
            None => log::debug!("ignoring unknown modifier token '{}'", token.as_ref()),
        }
    }
    modifiers
}
