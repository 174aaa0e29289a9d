//! Tracker configuration. All values are fixed when a tracker is created.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The range of lags, in samples, that the tracker evaluates.
///
/// `min` corresponds to the maximum display pitch and `max` (exclusive)
/// to the base frequency. `max` is also the length of the analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagRange {
    pub min: usize,
    pub max: usize,
}

impl LagRange {
    /// Computes `ceil(sample_rate / max_display_pitch)..floor(sample_rate / base_frequency) + 1`.
    pub fn from_bounds(sample_rate: f64, base_frequency: f64, max_display_pitch: f64) -> Self {
        LagRange {
            min: (sample_rate / max_display_pitch).ceil() as usize,
            max: (sample_rate / base_frequency).floor() as usize + 1,
        }
    }

    /// The number of lags in the range.
    pub fn len(&self) -> usize {
        self.max.saturating_sub(self.min)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, lag: usize) -> bool {
        lag >= self.min && lag < self.max
    }

    /// The analysis window length in samples.
    pub fn window_len(&self) -> usize {
        self.max
    }
}

/// Tracker settings. Missing fields take their [Default] values when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// The audio sample rate in Hz.
    pub sample_rate: f32,
    /// The lowest pitch in Hz, mapped to coordinate 0.
    pub base_frequency: f32,
    /// The highest pitch in Hz, mapped to coordinate 1.
    pub max_display_pitch: f32,
    /// Windows with an RMS level below this value are unvoiced.
    pub amplitude_threshold: f32,
    /// The maximum allowed coordinate distance between the three best candidates.
    pub stability_tolerance: f32,
    /// Lags with a correlation above `continuity_band` times the
    /// global maximum are pitch candidates.
    pub continuity_band: f32,
    /// Result channel capacity. Defaults to one second of entries.
    pub channel_capacity: Option<usize>,
    /// Also publish the unfiltered best candidate on a second channel.
    pub publish_raw: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            sample_rate: 48000.0,
            base_frequency: 55.0,
            max_display_pitch: 880.0,
            amplitude_threshold: 0.005,
            stability_tolerance: 0.025,
            continuity_band: 0.8,
            channel_capacity: None,
            publish_raw: false,
        }
    }
}

impl TrackerConfig {
    /// Checks all fields and returns the resulting lag range.
    pub fn validate(&self) -> Result<LagRange, ConfigError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if !(self.base_frequency.is_finite() && self.base_frequency > 0.0) {
            return Err(ConfigError::InvalidBaseFrequency(self.base_frequency));
        }
        if !(self.max_display_pitch.is_finite() && self.max_display_pitch > self.base_frequency) {
            return Err(ConfigError::PitchBoundsNotIncreasing {
                base_frequency: self.base_frequency,
                max_display_pitch: self.max_display_pitch,
            });
        }
        if self.max_display_pitch > 0.5 * self.sample_rate {
            return Err(ConfigError::MaxPitchAboveNyquist {
                max_display_pitch: self.max_display_pitch,
                sample_rate: self.sample_rate,
            });
        }
        if !(self.amplitude_threshold.is_finite() && self.amplitude_threshold >= 0.0) {
            return Err(ConfigError::InvalidAmplitudeThreshold(
                self.amplitude_threshold,
            ));
        }
        if !(self.stability_tolerance.is_finite() && self.stability_tolerance > 0.0) {
            return Err(ConfigError::InvalidStabilityTolerance(
                self.stability_tolerance,
            ));
        }
        if !(self.continuity_band > 0.0 && self.continuity_band <= 1.0) {
            return Err(ConfigError::InvalidContinuityBand(self.continuity_band));
        }
        if self.channel_capacity == Some(0) {
            return Err(ConfigError::ZeroChannelCapacity);
        }

        let lags = self.lag_range();
        if lags.is_empty() {
            return Err(ConfigError::EmptyLagRange {
                lag_min: lags.min,
                lag_max: lags.max,
            });
        }
        Ok(lags)
    }

    /// The lag range implied by the pitch bounds. Not validated.
    pub fn lag_range(&self) -> LagRange {
        LagRange::from_bounds(
            self.sample_rate as f64,
            self.base_frequency as f64,
            self.max_display_pitch as f64,
        )
    }

    /// The energy below which a window is unvoiced, `amplitude_threshold² × L`.
    pub fn gate_energy(&self) -> f64 {
        let threshold = self.amplitude_threshold as f64;
        threshold * threshold * self.lag_range().window_len() as f64
    }

    /// The result channel capacity, falling back to one second of entries.
    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
            .unwrap_or(self.sample_rate as usize)
            .max(1)
    }
}
