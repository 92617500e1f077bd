// Keycombo Key Action
// Press, release and auto-repeat state of a key event

use std::fmt;

/// Represents the action state of a key event.
///
/// Auto-repeat is reported by the windowing layer as a second press with
/// the repeat flag set; it is kept apart so callers can tell the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Release,
    Press,
    Repeat,
}

impl Action {
    /// Build from the pressed/repeat pair delivered by the windowing layer
    pub fn from_native(pressed: bool, repeat: bool) -> Self {
        match (pressed, repeat) {
            (false, _) => Action::Release,
            (true, false) => Action::Press,
            (true, true) => Action::Repeat,
        }
    }

    /// Returns true if the action is either PRESS or REPEAT
    pub fn is_pressed(self) -> bool {
        matches!(self, Action::Press | Action::Repeat)
    }

    pub fn is_released(self) -> bool {
        matches!(self, Action::Release)
    }

    pub fn is_repeat(self) -> bool {
        matches!(self, Action::Repeat)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Action::Release => "release",
            Action::Press => "press",
            Action::Repeat => "repeat",
        })
    }
}
