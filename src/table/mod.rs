//! Mapping from lag to normalized, log scaled pitch coordinate.
//!
//! The coordinate of a lag is
//!
//! > y(lag) = log2((sample_rate / lag) / base_frequency) / log2(max_display_pitch / base_frequency)
//!
//! so `base_frequency` maps to 0, `max_display_pitch` maps to 1 and each octave
//! covers the same distance. The table holds one coordinate per lag in
//! `lag_min..lag_max` and is built once, before processing starts, either
//! directly with [PitchTable::build] or by loading an artifact written by the
//! `gen_table` tool (see [artifact]).

pub mod artifact;
mod grid;

pub use grid::{Gridline, GridlineKind, Gridlines};

use log::debug;

use crate::config::{LagRange, TrackerConfig};
use crate::error::ConfigError;

/// Precomputed pitch coordinates, indexed by `lag - lag_min`. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchTable {
    sample_rate: f32,
    base_frequency: f32,
    max_display_pitch: f32,
    lags: LagRange,
    coordinates: Box<[f32]>,
}

impl PitchTable {
    /// Builds the table for the pitch bounds of `config`.
    pub fn build(config: &TrackerConfig) -> Result<Self, ConfigError> {
        Self::from_bounds(
            config.sample_rate,
            config.base_frequency,
            config.max_display_pitch,
        )
    }

    /// Builds the table from the three scaling constants. Only the
    /// constants involved are validated.
    pub fn from_bounds(
        sample_rate: f32,
        base_frequency: f32,
        max_display_pitch: f32,
    ) -> Result<Self, ConfigError> {
        let config = TrackerConfig {
            sample_rate,
            base_frequency,
            max_display_pitch,
            ..TrackerConfig::default()
        };
        let lags = config.validate()?;

        let sample_rate_f64 = sample_rate as f64;
        let base_frequency_f64 = base_frequency as f64;
        let octave_span = (max_display_pitch as f64 / base_frequency_f64).log2();
        let coordinates: Box<[f32]> = (lags.min..lags.max)
            .map(|lag| {
                let frequency = sample_rate_f64 / lag as f64;
                ((frequency / base_frequency_f64).log2() / octave_span) as f32
            })
            .collect();

        debug!(
            "Built pitch table for {} Hz..{} Hz at {} Hz, lags {}..{}",
            base_frequency, max_display_pitch, sample_rate, lags.min, lags.max
        );

        Ok(PitchTable {
            sample_rate,
            base_frequency,
            max_display_pitch,
            lags,
            coordinates,
        })
    }

    /// Wraps coordinates loaded from elsewhere. `coordinates` must hold one
    /// value per lag of the bounds' lag range.
    pub(crate) fn from_parts(
        sample_rate: f32,
        base_frequency: f32,
        max_display_pitch: f32,
        coordinates: Box<[f32]>,
    ) -> Result<Self, ConfigError> {
        let config = TrackerConfig {
            sample_rate,
            base_frequency,
            max_display_pitch,
            ..TrackerConfig::default()
        };
        let lags = config.validate()?;
        if coordinates.len() != lags.len() {
            return Err(ConfigError::TableMismatch {
                expected_len: lags.len(),
                actual_len: coordinates.len(),
            });
        }
        Ok(PitchTable {
            sample_rate,
            base_frequency,
            max_display_pitch,
            lags,
            coordinates,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn base_frequency(&self) -> f32 {
        self.base_frequency
    }

    pub fn max_display_pitch(&self) -> f32 {
        self.max_display_pitch
    }

    pub fn lag_range(&self) -> LagRange {
        self.lags
    }

    pub fn lag_min(&self) -> usize {
        self.lags.min
    }

    pub fn lag_max(&self) -> usize {
        self.lags.max
    }

    /// All coordinates in ascending lag order, i.e. descending pitch.
    pub fn coordinates(&self) -> &[f32] {
        &self.coordinates
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// The coordinate of `lag`, or `None` if `lag` is outside `lag_min..lag_max`.
    #[inline]
    pub fn coordinate(&self, lag: usize) -> Option<f32> {
        lag.checked_sub(self.lags.min)
            .and_then(|index| self.coordinates.get(index))
            .copied()
    }

    /// Maps a frequency in Hz to a coordinate. Frequencies outside the
    /// display range give values outside `[0, 1]`.
    pub fn frequency_to_coordinate(&self, frequency: f32) -> f32 {
        let octave_span = (self.max_display_pitch as f64 / self.base_frequency as f64).log2();
        ((frequency as f64 / self.base_frequency as f64).log2() / octave_span) as f32
    }

    /// The inverse of [frequency_to_coordinate](PitchTable::frequency_to_coordinate).
    pub fn coordinate_to_frequency(&self, coordinate: f32) -> f32 {
        let ratio = self.max_display_pitch as f64 / self.base_frequency as f64;
        (self.base_frequency as f64 * ratio.powf(coordinate as f64)) as f32
    }

    /// Checks that this table was built for the pitch bounds of `config`.
    pub fn matches(&self, config: &TrackerConfig) -> bool {
        self.sample_rate == config.sample_rate
            && self.base_frequency == config.base_frequency
            && self.max_display_pitch == config.max_display_pitch
    }

    /// One gridline per semitone from the base frequency up to the
    /// maximum display pitch.
    pub fn gridlines(&self) -> Gridlines {
        Gridlines::new(self)
    }
}
