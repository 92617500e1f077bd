// Keycombo Input Layer
// Key events from the windowing layer and key capture for the editor

mod capture;
mod event;

pub use capture::{capture_key_spec, key_event_to_tokens, ToolkitModifiers};
pub use event::{EventOrigin, KeyEvent, KeySink, NativeKeyEvent};
