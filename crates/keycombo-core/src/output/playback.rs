// Keycombo Playback Sequencing
// Ordered synthetic key events reproducing a combo's output chords

use crate::combo::KeyBinding;
use crate::input::KeyEvent;
use crate::modifier::{ModifierKey, ModifierKeys, Modifiers};

/// Where the playback currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Lifting the modifiers the user is physically holding
    ReleasingInputModifiers { next: usize },
    /// Pressing the modifiers of output `output`
    PressingOutputModifiers { output: usize, next: usize },
    PressKey { output: usize },
    ReleaseKey { output: usize },
    /// Lifting the modifiers of output `output` in reverse order
    ReleasingOutputModifiers { output: usize, remaining: usize },
    /// Putting the user's modifiers back down
    RestoringInputModifiers { next: usize },
    Idle,
}

/// Synthesizes the key events for one combo playback.
///
/// The iterator yields, in order:
/// 1. a release for every input modifier, in canonical order
/// 2. per output: presses of its modifiers in canonical order, a press and a
///    release of its key, then releases of its modifiers in reverse order
/// 3. a press for every input modifier, in canonical order
///
/// Every event is tagged synthetic and carries the running modifier state:
/// a press already includes its own bit, a release still includes the bit
/// being released. Outputs with an unknown scancode are skipped.
#[derive(Debug, Clone)]
pub struct Playback {
    input_keys: ModifierKeys,
    outputs: Vec<(KeyBinding, ModifierKeys)>,
    active: Modifiers,
    state: PlaybackState,
}

impl Playback {
    /// Start a playback for a trigger held with `input_modifiers`
    pub fn new(input_modifiers: Modifiers, outputs: &[KeyBinding]) -> Self {
        let outputs = outputs
            .iter()
            .filter(|binding| !binding.scancode.is_unknown())
            .map(|binding| (*binding, binding.modifiers.keys()))
            .collect();

        Self {
            input_keys: input_modifiers.keys(),
            outputs,
            active: input_modifiers,
            state: PlaybackState::ReleasingInputModifiers { next: 0 },
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Modifier state the downstream layer has seen so far
    pub fn active_modifiers(&self) -> Modifiers {
        self.active
    }

    fn press_modifier(&mut self, key: ModifierKey) -> KeyEvent {
        self.active |= key.flag();
        KeyEvent::press(key.scancode(), self.active).synthetic()
    }

    fn release_modifier(&mut self, key: ModifierKey) -> KeyEvent {
        let event = KeyEvent::release(key.scancode(), self.active).synthetic();
        self.active.remove(key.flag());
        event
    }

    /// First state of output `output`, or the restore phase past the last one
    fn enter_output(&self, output: usize) -> PlaybackState {
        if output < self.outputs.len() {
            PlaybackState::PressingOutputModifiers { output, next: 0 }
        } else {
            PlaybackState::RestoringInputModifiers { next: 0 }
        }
    }
}

impl Iterator for Playback {
    type Item = KeyEvent;

    fn next(&mut self) -> Option<KeyEvent> {
        loop {
            match self.state {
                PlaybackState::ReleasingInputModifiers { next } => {
                    if let Some(&key) = self.input_keys.get(next) {
                        self.state = PlaybackState::ReleasingInputModifiers { next: next + 1 };
                        return Some(self.release_modifier(key));
                    }
                    self.state = self.enter_output(0);
                }
                PlaybackState::PressingOutputModifiers { output, next } => {
                    if let Some(&key) = self.outputs[output].1.get(next) {
                        self.state = PlaybackState::PressingOutputModifiers {
                            output,
                            next: next + 1,
                        };
                        return Some(self.press_modifier(key));
                    }
                    self.state = PlaybackState::PressKey { output };
                }
                PlaybackState::PressKey { output } => {
                    self.state = PlaybackState::ReleaseKey { output };
                    let scancode = self.outputs[output].0.scancode;
                    return Some(KeyEvent::press(scancode, self.active).synthetic());
                }
                PlaybackState::ReleaseKey { output } => {
                    self.state = PlaybackState::ReleasingOutputModifiers {
                        output,
                        remaining: self.outputs[output].1.len(),
                    };
                    let scancode = self.outputs[output].0.scancode;
                    return Some(KeyEvent::release(scancode, self.active).synthetic());
                }
                PlaybackState::ReleasingOutputModifiers { output, remaining } => {
                    if remaining > 0 {
                        let key = self.outputs[output].1[remaining - 1];
                        self.state = PlaybackState::ReleasingOutputModifiers {
                            output,
                            remaining: remaining - 1,
                        };
                        return Some(self.release_modifier(key));
                    }
                    self.state = self.enter_output(output + 1);
                }
                PlaybackState::RestoringInputModifiers { next } => {
                    if let Some(&key) = self.input_keys.get(next) {
                        self.state = PlaybackState::RestoringInputModifiers { next: next + 1 };
                        return Some(self.press_modifier(key));
                    }
                    self.state = PlaybackState::Idle;
                }
                PlaybackState::Idle => return None,
            }
        }
    }
}
