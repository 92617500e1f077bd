// Keycombo Combo Engine
// Intercepts trigger chords on the input path and plays back their outputs
//
// Events reach the engine one at a time from the windowing layer. The engine
// decides whether the event is forwarded unchanged, swallowed, or replaced by
// a synthesized sequence pushed into the caller's sink. Synthesized events
// may be fed straight back into the engine; they are recognised by their
// origin tag and by the playback flag, and always forwarded.

use std::cell::{Cell, RefCell};

use smallvec::SmallVec;

use crate::combo::RuntimeCombo;
use crate::config::SharedComboStore;
use crate::input::{KeyEvent, KeySink, NativeKeyEvent};
use crate::modifier::Modifiers;
use crate::output::Playback;
use crate::scancode::NativeKeymap;
use crate::transform::combo::{find_combo_match, ComboMatchResult};
use crate::Scancode;

/// Configuration for the combo engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Master switch for user combos
    pub combos_enabled: bool,
    /// Combos are only active while the pointer is captured in absolute mode
    pub absolute_mouse_mode: bool,
    /// Numbering of native key events
    pub native_keymap: NativeKeymap,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            combos_enabled: true,
            absolute_mouse_mode: false,
            native_keymap: NativeKeymap::default(),
        }
    }
}

/// What the caller should do with the original event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Not a trigger; send the event on unchanged
    Forward,
    /// A trigger; drop the event
    Swallow,
    /// A trigger; the event is dropped and `emitted` events went to the sink
    Replaced { emitted: usize },
}

impl Disposition {
    /// Whether the original event must not reach the remote session
    pub fn is_intercepted(&self) -> bool {
        !matches!(self, Disposition::Forward)
    }
}

/// Clears the playback flag when playback ends
struct PlaybackGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> PlaybackGuard<'a> {
    fn engage(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for PlaybackGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Combo engine for a single input path
///
/// Holds a snapshot of the runtime combo table taken from the shared store.
/// Call [`ComboEngine::refresh`] after the store was loaded or saved.
pub struct ComboEngine {
    store: SharedComboStore,
    /// Runtime combos in declaration order
    combos: Vec<RuntimeCombo>,
    settings: EngineSettings,
    /// Set while a playback is emitting events
    playing: Cell<bool>,
    /// Trigger keys whose press was swallowed and whose release is pending
    held_triggers: RefCell<SmallVec<[Scancode; 4]>>,
}

impl ComboEngine {
    /// Create an engine over `store` with a fresh runtime snapshot
    pub fn new(store: SharedComboStore, settings: EngineSettings) -> Self {
        let combos = store.read().runtime_combos();
        log::debug!("combo engine starting with {} combo(s)", combos.len());
        Self {
            store,
            combos,
            settings,
            playing: Cell::new(false),
            held_triggers: RefCell::new(SmallVec::new()),
        }
    }

    /// Rebuild the runtime snapshot from the store.
    ///
    /// Triggers still held keep having their release swallowed.
    pub fn refresh(&mut self) {
        self.combos = self.store.read().runtime_combos();
        log::debug!("combo engine refreshed: {} combo(s)", self.combos.len());
    }

    pub fn store(&self) -> &SharedComboStore {
        &self.store
    }

    pub fn combos(&self) -> &[RuntimeCombo] {
        &self.combos
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.combos_enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.settings.combos_enabled
    }

    pub fn set_absolute_mouse_mode(&mut self, absolute: bool) {
        self.settings.absolute_mouse_mode = absolute;
    }

    /// True while a playback is emitting events
    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }

    /// Translate a native event and handle it
    pub fn handle_native_event(&self, event: &NativeKeyEvent, sink: &mut dyn KeySink) -> Disposition {
        let event = KeyEvent::from_native(event, self.settings.native_keymap);
        self.handle_key_event(&event, sink)
    }

    /// Handle a single key event
    ///
    /// This is the main entry point on the input path. Trigger presses
    /// play back their outputs into `sink` and blocker presses are dropped.
    /// Releases and auto-repeats follow what happened to the press: they are
    /// swallowed when the press was intercepted and forwarded otherwise.
    pub fn handle_key_event(&self, event: &KeyEvent, sink: &mut dyn KeySink) -> Disposition {
        // Our own events, and anything arriving mid-playback, pass through
        if event.is_synthetic() || self.playing.get() {
            return Disposition::Forward;
        }

        if event.action.is_released() {
            if self.release_held(event.scancode) {
                log::debug!("swallowing release of trigger {}", event.scancode);
                return Disposition::Swallow;
            }
            return Disposition::Forward;
        }

        let held_repeat = event.action.is_repeat() && self.is_held(event.scancode);
        if event.action.is_repeat() && !held_repeat {
            return Disposition::Forward;
        }

        let combo = match self.find_match(event) {
            // The press never reached the session; neither may its repeats
            ComboMatchResult::NotFound if held_repeat => return Disposition::Swallow,
            ComboMatchResult::NotFound => return Disposition::Forward,
            ComboMatchResult::Block(_) => {
                log::info!(
                    "User combo configured as blocker; swallowing event (scancode={}, mods={:?})",
                    event.scancode,
                    event.modifiers
                );
                self.hold(event.scancode);
                return Disposition::Swallow;
            }
            ComboMatchResult::Playback(combo) => combo,
        };

        self.hold(event.scancode);
        let emitted = self.play(combo, event.modifiers, sink);
        Disposition::Replaced { emitted }
    }

    /// Match `event` against the snapshot when combos are active
    pub fn find_match(&self, event: &KeyEvent) -> ComboMatchResult<'_> {
        if !self.settings.absolute_mouse_mode
            || !self.settings.combos_enabled
            || self.playing.get()
            || self.combos.is_empty()
            || event.is_synthetic()
        {
            return ComboMatchResult::NotFound;
        }
        find_combo_match(&self.combos, event.scancode, event.modifiers)
    }

    fn play(&self, combo: &RuntimeCombo, input_modifiers: Modifiers, sink: &mut dyn KeySink) -> usize {
        let _guard = PlaybackGuard::engage(&self.playing);

        let mut emitted = 0;
        for event in Playback::new(input_modifiers, &combo.outputs) {
            sink.send(event);
            emitted += 1;
        }

        log::info!(
            "played user combo {:?} ({} output(s), {} event(s))",
            combo.description,
            combo.outputs.len(),
            emitted
        );
        emitted
    }

    fn is_held(&self, scancode: Scancode) -> bool {
        self.held_triggers.borrow().contains(&scancode)
    }

    fn hold(&self, scancode: Scancode) {
        let mut held = self.held_triggers.borrow_mut();
        if !held.contains(&scancode) {
            held.push(scancode);
        }
    }

    /// Forget a held trigger; true when it was held
    fn release_held(&self, scancode: Scancode) -> bool {
        let mut held = self.held_triggers.borrow_mut();
        match held.iter().position(|&s| s == scancode) {
            Some(index) => {
                held.swap_remove(index);
                true
            }
            None => false,
        }
    }
}
