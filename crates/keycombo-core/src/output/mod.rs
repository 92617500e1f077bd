// Keycombo Output Layer
// Synthesized key sequences sent downstream

mod playback;

pub use playback::{Playback, PlaybackState};
