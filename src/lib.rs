//! Real time tracking of the [pitch](https://en.wikipedia.org/wiki/Pitch_%28music%29)
//! of monophonic sounds, one estimate per input sample.
//!
//! Features
//! * Incrementally updated autocorrelation over a sliding window, no
//! per window recomputation
//! * Continuity seeded lag selection that avoids octave jumps
//! * Rejection of ambiguous estimates, reported as unvoiced
//! * A lock-free result channel for handing estimates from the audio thread
//! to any number of consumers
//! * No allocations while processing, suitable for real time audio use.
//!
//! Estimates are normalized pitch coordinates in `[0, 1]`, log scaled between
//! a base frequency and a maximum display pitch (55 Hz and 880 Hz by default).
//!
//! # Examples
//!
//! Streaming API, used for passing chunks of arbitrary size to a tracker.
//! ```
//! use pitch_trace::{Pipeline, TrackerConfig};
//!
//! let (mut pipeline, outputs) = Pipeline::new(TrackerConfig::default()).unwrap();
//! let mut reader = outputs.pitch.subscribe();
//!
//! // Called from the audio thread.
//! let chunk: Vec<f32> = (0..4096)
//!     .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 48000.0).sin())
//!     .collect();
//! pipeline.process(&chunk);
//!
//! // Called from any other thread.
//! let pitches = reader.try_read();
//! assert_eq!(pitches.len(), chunk.len());
//! if let Some(coordinate) = pitches[pitches.len() - 1].coordinate() {
//!     let frequency = outputs.table.coordinate_to_frequency(coordinate);
//!     assert!(frequency > 215.0 && frequency < 225.0);
//! }
//! ```
//! Decision API, for inspecting the per sample analysis directly.
//! ```
//! use pitch_trace::{PitchTracker, TrackerConfig, tracker::Decision};
//!
//! let mut tracker = PitchTracker::from_config(TrackerConfig::default()).unwrap();
//! tracker.process(&[0.0; 256], |decision| {
//!     assert_eq!(decision, Decision::Silent);
//! });
//! ```

pub mod channel;
pub mod common;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod table;
pub mod tracker;

pub use channel::{result_channel, ReadReport, Reader, ResultChannel};
pub use config::{LagRange, TrackerConfig};
pub use error::{ConfigError, TableError};
pub use pipeline::{Pipeline, PipelineOutputs};
pub use table::PitchTable;
pub use tracker::{Decision, FrameOutcome, Pitch, PitchTracker};
