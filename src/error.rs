//! Errors reported when building trackers, tables and table artifacts.
//! None of these can occur while processing samples.

use std::fmt;

/// An invalid [TrackerConfig](crate::config::TrackerConfig) field.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidSampleRate(f32),
    InvalidBaseFrequency(f32),
    /// The maximum display pitch must be above the base frequency.
    PitchBoundsNotIncreasing {
        base_frequency: f32,
        max_display_pitch: f32,
    },
    /// The maximum display pitch must not exceed half the sample rate.
    MaxPitchAboveNyquist {
        max_display_pitch: f32,
        sample_rate: f32,
    },
    InvalidAmplitudeThreshold(f32),
    InvalidStabilityTolerance(f32),
    InvalidContinuityBand(f32),
    ZeroChannelCapacity,
    /// The pitch bounds are too close to contain a single integer lag.
    EmptyLagRange { lag_min: usize, lag_max: usize },
    /// Table coordinates do not cover the lag range of their constants.
    TableMismatch {
        expected_len: usize,
        actual_len: usize,
    },
    /// A table built for other pitch bounds was passed to a tracker.
    TableBoundsMismatch {
        sample_rate: f32,
        base_frequency: f32,
        max_display_pitch: f32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidSampleRate(value) => {
                write!(f, "sample rate must be positive and finite, got {}", value)
            }
            ConfigError::InvalidBaseFrequency(value) => {
                write!(f, "base frequency must be positive and finite, got {}", value)
            }
            ConfigError::PitchBoundsNotIncreasing {
                base_frequency,
                max_display_pitch,
            } => write!(
                f,
                "max display pitch {} Hz must be greater than base frequency {} Hz",
                max_display_pitch, base_frequency
            ),
            ConfigError::MaxPitchAboveNyquist {
                max_display_pitch,
                sample_rate,
            } => write!(
                f,
                "max display pitch {} Hz exceeds half the sample rate {} Hz",
                max_display_pitch, sample_rate
            ),
            ConfigError::InvalidAmplitudeThreshold(value) => write!(
                f,
                "amplitude threshold must be non-negative and finite, got {}",
                value
            ),
            ConfigError::InvalidStabilityTolerance(value) => write!(
                f,
                "stability tolerance must be positive and finite, got {}",
                value
            ),
            ConfigError::InvalidContinuityBand(value) => {
                write!(f, "continuity band must be in (0, 1], got {}", value)
            }
            ConfigError::ZeroChannelCapacity => write!(f, "channel capacity must not be zero"),
            ConfigError::EmptyLagRange { lag_min, lag_max } => {
                write!(f, "lag range {}..{} is empty", lag_min, lag_max)
            }
            ConfigError::TableMismatch {
                expected_len,
                actual_len,
            } => write!(
                f,
                "pitch table has {} entries, the configuration needs {}",
                actual_len, expected_len
            ),
            ConfigError::TableBoundsMismatch {
                sample_rate,
                base_frequency,
                max_display_pitch,
            } => write!(
                f,
                "pitch table was built for {} Hz..{} Hz at {} Hz, which differs from the configuration",
                base_frequency, max_display_pitch, sample_rate
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors from parsing a table artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum TableError {
    MissingHeader,
    /// A header field is missing or not a number.
    InvalidHeader(String),
    /// The constants in the header do not describe a valid table.
    InvalidConstants(ConfigError),
    /// A value line could not be parsed. `line` is 1-based.
    InvalidValue { line: usize, text: String },
    /// A value is NaN, infinite or outside `[0, 1]`.
    CoordinateOutOfRange { line: usize, value: f32 },
    /// A value is not below the value on the previous line. Coordinates
    /// decrease strictly with the lag.
    NotDecreasing { line: usize, value: f32, previous: f32 },
    LengthMismatch { expected: usize, actual: usize },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::MissingHeader => write!(f, "table artifact has no header line"),
            TableError::InvalidHeader(field) => {
                write!(f, "table artifact header field `{}` is missing or invalid", field)
            }
            TableError::InvalidConstants(err) => {
                write!(f, "table artifact constants are invalid: {}", err)
            }
            TableError::InvalidValue { line, text } => {
                write!(f, "invalid table value `{}` on line {}", text, line)
            }
            TableError::CoordinateOutOfRange { line, value } => {
                write!(f, "table value {} on line {} is not within [0, 1]", value, line)
            }
            TableError::NotDecreasing {
                line,
                value,
                previous,
            } => write!(
                f,
                "table value {} on line {} does not decrease from {}",
                value, line, previous
            ),
            TableError::LengthMismatch { expected, actual } => write!(
                f,
                "table artifact has {} values, its header implies {}",
                actual, expected
            ),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableError::InvalidConstants(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for TableError {
    fn from(err: ConfigError) -> Self {
        TableError::InvalidConstants(err)
    }
}
