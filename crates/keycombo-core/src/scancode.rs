// Keycombo Scancode Table
// Canonical scancodes, persisted tokens and native platform key codes

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

include!(concat!(env!("OUT_DIR"), "/scancode_codes.rs"));

/// Prefix shared by every persisted scancode token
pub const TOKEN_PREFIX: &str = "SDL_SCANCODE_";

/// Token written for a key that has no canonical scancode
pub const UNKNOWN_TOKEN: &str = "SDL_SCANCODE_UNKNOWN";

impl Scancode {
    pub const UNKNOWN: Scancode = Scancode(0);
    pub const A: Scancode = Scancode(4);
    pub const C: Scancode = Scancode(6);
    pub const L: Scancode = Scancode(15);
    pub const V: Scancode = Scancode(25);
    pub const RETURN: Scancode = Scancode(40);
    pub const ESCAPE: Scancode = Scancode(41);
    pub const TAB: Scancode = Scancode(43);
    pub const F1: Scancode = Scancode(58);
    pub const F2: Scancode = Scancode(59);
    pub const F3: Scancode = Scancode(60);
    pub const DELETE: Scancode = Scancode(76);
    pub const LCTRL: Scancode = Scancode(224);
    pub const LSHIFT: Scancode = Scancode(225);
    pub const LALT: Scancode = Scancode(226);
    pub const LGUI: Scancode = Scancode(227);
    pub const RCTRL: Scancode = Scancode(228);
    pub const RSHIFT: Scancode = Scancode(229);
    pub const RALT: Scancode = Scancode(230);
    pub const RGUI: Scancode = Scancode(231);

    /// Returns true for the UNKNOWN sentinel
    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }
}

/// How the windowing layer numbers physical keys.
///
/// Resolved once at startup and handed to the engine as a plain value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeKeymap {
    /// Linux input-event-codes.h numbering
    Evdev,
    /// X11 / Wayland keycodes (evdev + 8)
    #[default]
    Xkb,
    /// PC set-1 make codes, extended keys carry 0x100
    Win32,
}

impl NativeKeymap {
    pub fn as_str(self) -> &'static str {
        match self {
            NativeKeymap::Evdev => "evdev",
            NativeKeymap::Xkb => "xkb",
            NativeKeymap::Win32 => "win32",
        }
    }
}

impl fmt::Display for NativeKeymap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NativeKeymap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "evdev" => Ok(NativeKeymap::Evdev),
            "xkb" | "x11" | "wayland" => Ok(NativeKeymap::Xkb),
            "win32" | "windows" => Ok(NativeKeymap::Win32),
            other => Err(format!("Unknown native keymap: {}", other)),
        }
    }
}

/// XKB keycodes sit this far above evdev codes
const XKB_EVDEV_OFFSET: u32 = 8;

/// (canonical scancode, bare name, evdev code, set-1 code); 0 means no native code
const SCANCODE_ENTRIES: &[(u16, &str, u16, u16)] = &[
    (4, "A", 30, 0x1E),
    (5, "B", 48, 0x30),
    (6, "C", 46, 0x2E),
    (7, "D", 32, 0x20),
    (8, "E", 18, 0x12),
    (9, "F", 33, 0x21),
    (10, "G", 34, 0x22),
    (11, "H", 35, 0x23),
    (12, "I", 23, 0x17),
    (13, "J", 36, 0x24),
    (14, "K", 37, 0x25),
    (15, "L", 38, 0x26),
    (16, "M", 50, 0x32),
    (17, "N", 49, 0x31),
    (18, "O", 24, 0x18),
    (19, "P", 25, 0x19),
    (20, "Q", 16, 0x10),
    (21, "R", 19, 0x13),
    (22, "S", 31, 0x1F),
    (23, "T", 20, 0x14),
    (24, "U", 22, 0x16),
    (25, "V", 47, 0x2F),
    (26, "W", 17, 0x11),
    (27, "X", 45, 0x2D),
    (28, "Y", 21, 0x15),
    (29, "Z", 44, 0x2C),
    (30, "1", 2, 0x02),
    (31, "2", 3, 0x03),
    (32, "3", 4, 0x04),
    (33, "4", 5, 0x05),
    (34, "5", 6, 0x06),
    (35, "6", 7, 0x07),
    (36, "7", 8, 0x08),
    (37, "8", 9, 0x09),
    (38, "9", 10, 0x0A),
    (39, "0", 11, 0x0B),
    (40, "RETURN", 28, 0x1C),
    (41, "ESCAPE", 1, 0x01),
    (42, "BACKSPACE", 14, 0x0E),
    (43, "TAB", 15, 0x0F),
    (44, "SPACE", 57, 0x39),
    (45, "MINUS", 12, 0x0C),
    (46, "EQUALS", 13, 0x0D),
    (47, "LEFTBRACKET", 26, 0x1A),
    (48, "RIGHTBRACKET", 27, 0x1B),
    (49, "BACKSLASH", 43, 0x2B),
    (51, "SEMICOLON", 39, 0x27),
    (52, "APOSTROPHE", 40, 0x28),
    (53, "GRAVE", 41, 0x29),
    (54, "COMMA", 51, 0x33),
    (55, "PERIOD", 52, 0x34),
    (56, "SLASH", 53, 0x35),
    (57, "CAPSLOCK", 58, 0x3A),
    (58, "F1", 59, 0x3B),
    (59, "F2", 60, 0x3C),
    (60, "F3", 61, 0x3D),
    (61, "F4", 62, 0x3E),
    (62, "F5", 63, 0x3F),
    (63, "F6", 64, 0x40),
    (64, "F7", 65, 0x41),
    (65, "F8", 66, 0x42),
    (66, "F9", 67, 0x43),
    (67, "F10", 68, 0x44),
    (68, "F11", 87, 0x57),
    (69, "F12", 88, 0x58),
    (70, "PRINTSCREEN", 99, 0x137),
    (71, "SCROLLLOCK", 70, 0x46),
    (72, "PAUSE", 119, 0x45),
    (73, "INSERT", 110, 0x152),
    (74, "HOME", 102, 0x147),
    (75, "PAGEUP", 104, 0x149),
    (76, "DELETE", 111, 0x153),
    (77, "END", 107, 0x14F),
    (78, "PAGEDOWN", 109, 0x151),
    (79, "RIGHT", 106, 0x14D),
    (80, "LEFT", 105, 0x14B),
    (81, "DOWN", 108, 0x150),
    (82, "UP", 103, 0x148),
    (83, "NUMLOCKCLEAR", 69, 0x145),
    (84, "KP_DIVIDE", 98, 0x135),
    (85, "KP_MULTIPLY", 55, 0x37),
    (86, "KP_MINUS", 74, 0x4A),
    (87, "KP_PLUS", 78, 0x4E),
    (88, "KP_ENTER", 96, 0x11C),
    (89, "KP_1", 79, 0x4F),
    (90, "KP_2", 80, 0x50),
    (91, "KP_3", 81, 0x51),
    (92, "KP_4", 75, 0x4B),
    (93, "KP_5", 76, 0x4C),
    (94, "KP_6", 77, 0x4D),
    (95, "KP_7", 71, 0x47),
    (96, "KP_8", 72, 0x48),
    (97, "KP_9", 73, 0x49),
    (98, "KP_0", 82, 0x52),
    (99, "KP_PERIOD", 83, 0x53),
    (100, "NONUSBACKSLASH", 86, 0x56),
    (101, "APPLICATION", 127, 0x15D),
    (102, "POWER", 116, 0x15E),
    (103, "KP_EQUALS", 117, 0x59),
    (104, "F13", 183, 0x64),
    (105, "F14", 184, 0x65),
    (106, "F15", 185, 0x66),
    (107, "F16", 186, 0x67),
    (108, "F17", 187, 0x68),
    (109, "F18", 188, 0x69),
    (110, "F19", 189, 0x6A),
    (111, "F20", 190, 0x6B),
    (112, "F21", 191, 0x6C),
    (113, "F22", 192, 0x6D),
    (114, "F23", 193, 0x6E),
    (115, "F24", 194, 0x76),
    (118, "MENU", 139, 0),
    (127, "MUTE", 113, 0x120),
    (128, "VOLUMEUP", 115, 0x130),
    (129, "VOLUMEDOWN", 114, 0x12E),
    (224, "LCTRL", 29, 0x1D),
    (225, "LSHIFT", 42, 0x2A),
    (226, "LALT", 56, 0x38),
    (227, "LGUI", 125, 0x15B),
    (228, "RCTRL", 97, 0x11D),
    (229, "RSHIFT", 54, 0x36),
    (230, "RALT", 100, 0x138),
    (231, "RGUI", 126, 0x15C),
    (258, "AUDIONEXT", 163, 0x119),
    (259, "AUDIOPREV", 165, 0x110),
    (260, "AUDIOSTOP", 166, 0x124),
    (261, "AUDIOPLAY", 164, 0x122),
];

/// Extra spellings accepted when reading tokens (alias, canonical name)
const SCANCODE_ALIASES: &[(&str, &str)] = &[
    ("ESC", "ESCAPE"),
    ("ENTER", "RETURN"),
    ("DEL", "DELETE"),
    ("INS", "INSERT"),
    ("PGUP", "PAGEUP"),
    ("PGDN", "PAGEDOWN"),
    ("BKSP", "BACKSPACE"),
    ("DOT", "PERIOD"),
    ("EQUAL", "EQUALS"),
    ("NUMLOCK", "NUMLOCKCLEAR"),
];

/// Bidirectional mapping between canonical scancodes, tokens and native codes.
///
/// Built once on first use and read-only afterwards, so concurrent readers
/// need no synchronisation.
#[derive(Debug)]
pub struct ScancodeTable {
    /// Canonical token per scancode, in table order
    tokens: IndexMap<Scancode, String>,
    /// Normalized bare names and aliases
    by_name: HashMap<String, Scancode>,
    from_evdev: HashMap<u32, Scancode>,
    from_win32: HashMap<u32, Scancode>,
    to_evdev: HashMap<Scancode, u32>,
    to_win32: HashMap<Scancode, u32>,
}

impl ScancodeTable {
    fn build() -> Self {
        let mut table = Self {
            tokens: IndexMap::with_capacity(SCANCODE_ENTRIES.len()),
            by_name: HashMap::with_capacity(SCANCODE_ENTRIES.len() + SCANCODE_ALIASES.len()),
            from_evdev: HashMap::new(),
            from_win32: HashMap::new(),
            to_evdev: HashMap::new(),
            to_win32: HashMap::new(),
        };

        for &(code, name, evdev, set1) in SCANCODE_ENTRIES {
            let scancode = Scancode(code);
            table
                .tokens
                .insert(scancode, format!("{}{}", TOKEN_PREFIX, name));
            table.by_name.insert(name.to_string(), scancode);

            if evdev != 0 {
                table.from_evdev.insert(u32::from(evdev), scancode);
                table.to_evdev.insert(scancode, u32::from(evdev));
            }
            if set1 != 0 {
                table.from_win32.insert(u32::from(set1), scancode);
                table.to_win32.insert(scancode, u32::from(set1));
            }
        }

        for &(alias, canonical) in SCANCODE_ALIASES {
            if let Some(&scancode) = table.by_name.get(canonical) {
                table.by_name.entry(alias.to_string()).or_insert(scancode);
            }
        }

        log::debug!(
            "scancode table built: {} scancodes, {} names",
            table.tokens.len(),
            table.by_name.len()
        );
        table
    }

    /// Get the shared table, building it on first call
    pub fn initialize() -> &'static ScancodeTable {
        static TABLE: OnceLock<ScancodeTable> = OnceLock::new();
        TABLE.get_or_init(Self::build)
    }

    /// Persisted token for a scancode; `None` when unmapped
    pub fn scancode_to_token(&self, scancode: Scancode) -> Option<&str> {
        self.tokens.get(&scancode).map(String::as_str)
    }

    /// Scancode for a token; `Scancode::UNKNOWN` when the token is not recognised
    pub fn token_to_scancode(&self, token: &str) -> Scancode {
        let normalized = normalize_token(token);
        if normalized.is_empty() {
            return Scancode::UNKNOWN;
        }
        self.by_name
            .get(&normalized)
            .copied()
            .unwrap_or(Scancode::UNKNOWN)
    }

    /// Canonical scancode for a native physical key code
    pub fn native_to_scancode(&self, native: u32, keymap: NativeKeymap) -> Scancode {
        let found = match keymap {
            NativeKeymap::Evdev => self.from_evdev.get(&native),
            NativeKeymap::Xkb => native
                .checked_sub(XKB_EVDEV_OFFSET)
                .and_then(|evdev| self.from_evdev.get(&evdev)),
            NativeKeymap::Win32 => self.from_win32.get(&native),
        };
        found.copied().unwrap_or(Scancode::UNKNOWN)
    }

    /// Native code for a canonical scancode, if the keymap has one
    pub fn scancode_to_native(&self, scancode: Scancode, keymap: NativeKeymap) -> Option<u32> {
        match keymap {
            NativeKeymap::Evdev => self.to_evdev.get(&scancode).copied(),
            NativeKeymap::Xkb => self
                .to_evdev
                .get(&scancode)
                .map(|evdev| evdev + XKB_EVDEV_OFFSET),
            NativeKeymap::Win32 => self.to_win32.get(&scancode).copied(),
        }
    }

    /// All canonical tokens in table order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.values().map(String::as_str)
    }

    /// All mapped scancodes in table order
    pub fn scancodes(&self) -> impl Iterator<Item = Scancode> + '_ {
        self.tokens.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Upper-case, unify separators and strip the token prefix
fn normalize_token(token: &str) -> String {
    let upper: String = token
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect();
    match upper.strip_prefix(TOKEN_PREFIX) {
        Some(bare) => bare.to_string(),
        None => upper,
    }
}

/// Get the shared scancode table
pub fn initialize() -> &'static ScancodeTable {
    ScancodeTable::initialize()
}

/// Persisted token for a scancode; `None` when unmapped
pub fn scancode_to_token(scancode: Scancode) -> Option<&'static str> {
    ScancodeTable::initialize().scancode_to_token(scancode)
}

/// Scancode for a persisted token; UNKNOWN when unrecognised
pub fn token_to_scancode(token: &str) -> Scancode {
    ScancodeTable::initialize().token_to_scancode(token)
}

/// Canonical scancode for a native key code
pub fn native_to_scancode(native: u32, keymap: NativeKeymap) -> Scancode {
    ScancodeTable::initialize().native_to_scancode(native, keymap)
}
