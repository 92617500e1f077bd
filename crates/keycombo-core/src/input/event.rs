// Keycombo Input Layer - Key Events
// Canonical key events, their native counterparts and the downstream sink

use std::fmt;

use crate::action::Action;
use crate::modifier::Modifiers;
use crate::scancode::{native_to_scancode, NativeKeymap, Scancode};

/// Where a key event came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EventOrigin {
    /// Delivered by the windowing layer from a real keyboard
    #[default]
    Physical,
    /// Produced by combo playback; never matched against combos
    Synthetic,
}

/// A key event in canonical form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub scancode: Scancode,
    /// Modifier state carried by the event
    pub modifiers: Modifiers,
    pub action: Action,
    pub origin: EventOrigin,
}

impl KeyEvent {
    pub fn new(scancode: Scancode, modifiers: Modifiers, action: Action) -> Self {
        Self {
            scancode,
            modifiers,
            action,
            origin: EventOrigin::Physical,
        }
    }

    pub fn press(scancode: Scancode, modifiers: Modifiers) -> Self {
        Self::new(scancode, modifiers, Action::Press)
    }

    pub fn release(scancode: Scancode, modifiers: Modifiers) -> Self {
        Self::new(scancode, modifiers, Action::Release)
    }

    /// Same event tagged as produced by playback
    pub fn synthetic(mut self) -> Self {
        self.origin = EventOrigin::Synthetic;
        self
    }

    pub fn is_synthetic(&self) -> bool {
        self.origin == EventOrigin::Synthetic
    }

    /// Translate a native event using the keymap flavour of the windowing layer
    pub fn from_native(event: &NativeKeyEvent, keymap: NativeKeymap) -> Self {
        Self::new(
            native_to_scancode(event.scancode, keymap),
            Modifiers::from_native(event.modifiers),
            Action::from_native(event.pressed, event.repeat),
        )
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<7} {}", self.action, self.scancode)?;
        let tokens = self.modifiers.tokens();
        if !tokens.is_empty() {
            write!(f, " [{}]", tokens.join("|"))?;
        }
        if self.is_synthetic() {
            write!(f, " (synthetic)")?;
        }
        Ok(())
    }
}

/// A key event exactly as the windowing layer reports it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NativeKeyEvent {
    /// Physical key id in the numbering of the active `NativeKeymap`
    pub scancode: u32,
    /// Sided modifier mask; bits outside the known modifiers are ignored
    pub modifiers: u16,
    pub pressed: bool,
    pub repeat: bool,
}

/// Downstream event path that receives synthesized key events
pub trait KeySink {
    fn send(&mut self, event: KeyEvent);
}

impl KeySink for Vec<KeyEvent> {
    fn send(&mut self, event: KeyEvent) {
        self.push(event);
    }
}

impl<S: KeySink + ?Sized> KeySink for &mut S {
    fn send(&mut self, event: KeyEvent) {
        (**self).send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_native_xkb() {
        // xkb keycode 67 is evdev KEY_F1 (59) + 8
        let native = NativeKeyEvent {
            scancode: 67,
            modifiers: (Modifiers::LCTRL | Modifiers::LALT).bits(),
            pressed: true,
            repeat: false,
        };
        let event = KeyEvent::from_native(&native, NativeKeymap::Xkb);
        assert_eq!(event.scancode, Scancode::F1);
        assert_eq!(event.modifiers, Modifiers::LCTRL | Modifiers::LALT);
        assert_eq!(event.action, Action::Press);
        assert_eq!(event.origin, EventOrigin::Physical);
    }

    #[test]
    fn test_from_native_repeat_and_release() {
        let mut native = NativeKeyEvent {
            scancode: 59,
            modifiers: 0,
            pressed: true,
            repeat: true,
        };
        assert_eq!(KeyEvent::from_native(&native, NativeKeymap::Evdev).action, Action::Repeat);
        native.pressed = false;
        assert_eq!(KeyEvent::from_native(&native, NativeKeymap::Evdev).action, Action::Release);
    }

    #[test]
    fn test_vec_sink_collects_in_order() {
        let mut sink: Vec<KeyEvent> = Vec::new();
        sink.send(KeyEvent::press(Scancode::A, Modifiers::empty()));
        sink.send(KeyEvent::release(Scancode::A, Modifiers::empty()).synthetic());
        assert_eq!(sink.len(), 2);
        assert!(!sink[0].is_synthetic());
        assert!(sink[1].is_synthetic());
    }
}
