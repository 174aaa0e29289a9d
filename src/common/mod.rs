//! Common algorithms and utilities.

mod autocorr;
mod midi;
mod sample_window;

pub use autocorr::{windowed_autocorr, CorrelationEngine};
pub use midi::{freq_to_midi_note, note_number_to_string};
pub use sample_window::SampleWindow;
