use std::sync::Arc;

use log::{debug, trace};

use crate::common::{CorrelationEngine, SampleWindow};
use crate::config::{LagRange, TrackerConfig};
use crate::error::ConfigError;
use crate::table::PitchTable;

use super::decision::Decision;
use super::selection::LagSelector;

/// What [PitchTracker::process_frame] did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Processed { sample_count: usize },
    /// The frame had no data. Nothing was changed.
    Skipped,
}

/// Tracks the pitch of a single audio stream, one decision per sample.
///
/// * Keeps the last `2 × lag_max` samples in a [SampleWindow]
/// * Updates the autocorrelation of the last `lag_max` samples incrementally,
///   for lags `lag_min - 1..lag_max`
/// * Gates, selects and stability checks the lag with a [LagSelector]
///
/// A tracker is owned by the thread processing audio. It never allocates
/// after construction.
pub struct PitchTracker {
    config: TrackerConfig,
    lags: LagRange,
    table: Arc<PitchTable>,
    window: SampleWindow,
    correlation: CorrelationEngine,
    selector: LagSelector,
    processed_sample_count: u64,
    skipped_frame_count: u64,
}

impl PitchTracker {
    /// Creates a tracker using a prebuilt `table`, which must have been
    /// built for the pitch bounds of `config`.
    pub fn new(config: TrackerConfig, table: Arc<PitchTable>) -> Result<Self, ConfigError> {
        let lags = config.validate()?;
        if !table.matches(&config) {
            return Err(ConfigError::TableBoundsMismatch {
                sample_rate: table.sample_rate(),
                base_frequency: table.base_frequency(),
                max_display_pitch: table.max_display_pitch(),
            });
        }
        if table.len() != lags.len() {
            return Err(ConfigError::TableMismatch {
                expected_len: lags.len(),
                actual_len: table.len(),
            });
        }

        debug!(
            "Created pitch tracker: lags {}..{}, window length {}, gate energy {}",
            lags.min,
            lags.max,
            lags.window_len(),
            config.gate_energy()
        );

        Ok(PitchTracker {
            selector: LagSelector::new(&config, lags),
            window: SampleWindow::new(lags.window_len()),
            correlation: CorrelationEngine::new(lags.min - 1, lags.max),
            config,
            lags,
            table,
            processed_sample_count: 0,
            skipped_frame_count: 0,
        })
    }

    /// Creates a tracker, building its table from `config`.
    pub fn from_config(config: TrackerConfig) -> Result<Self, ConfigError> {
        let table = PitchTable::build(&config)?;
        PitchTracker::new(config, Arc::new(table))
    }

    /// Pushes one sample and analyzes the window ending at it. Samples
    /// that are NaN or infinite are processed as `0.0`.
    #[inline]
    pub fn process_sample(&mut self, sample: f32) -> Decision {
        let sample = if sample.is_finite() { sample } else { 0.0 };
        let outgoing = self.window.push(sample);
        self.correlation.update(&self.window, sample, outgoing);
        self.processed_sample_count += 1;
        self.selector.select(
            self.correlation.energy(),
            self.correlation.correlation(),
            &self.table,
        )
    }

    /// Processes a chunk of samples of any length, calling `decision_handler`
    /// once per sample. Decisions do not depend on how the stream is chunked.
    pub fn process<F>(&mut self, samples: &[f32], mut decision_handler: F)
    where
        F: FnMut(Decision),
    {
        for &sample in samples {
            let decision = self.process_sample(sample);
            decision_handler(decision);
        }
    }

    /// Like [process](PitchTracker::process), but for frames that may be
    /// missing, e.g. from a capture callback. A missing or empty frame is
    /// skipped without touching any state.
    pub fn process_frame<F>(&mut self, frame: Option<&[f32]>, decision_handler: F) -> FrameOutcome
    where
        F: FnMut(Decision),
    {
        match frame {
            Some(samples) if !samples.is_empty() => {
                self.process(samples, decision_handler);
                FrameOutcome::Processed {
                    sample_count: samples.len(),
                }
            }
            _ => {
                self.skipped_frame_count += 1;
                trace!(
                    "Skipped empty frame after {} samples",
                    self.processed_sample_count
                );
                FrameOutcome::Skipped
            }
        }
    }

    /// Clears the window, the correlation and the previous lag, as if no
    /// samples had been processed. Counters are kept.
    pub fn reset(&mut self) {
        self.window.reset();
        self.correlation.reset();
        self.selector.reset();
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn table(&self) -> &Arc<PitchTable> {
        &self.table
    }

    pub fn lag_range(&self) -> LagRange {
        self.lags
    }

    /// Returns the number of samples in the analyzed window.
    pub fn window_len(&self) -> usize {
        self.window.window_len()
    }

    /// The lag the continuity search currently starts from.
    pub fn previous_lag(&self) -> Option<usize> {
        self.selector.previous_lag()
    }

    /// The energy of the current window.
    pub fn energy(&self) -> f64 {
        self.correlation.energy()
    }

    /// The correlation of the current window, indexed by `lag - lag_min`.
    pub fn correlation(&self) -> &[f64] {
        &self.correlation.correlation()[1..]
    }

    /// Returns the number of samples processed since the tracker was created.
    pub fn processed_sample_count(&self) -> u64 {
        self.processed_sample_count
    }

    /// Returns the number of skipped frames since the tracker was created.
    pub fn skipped_frame_count(&self) -> u64 {
        self.skipped_frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::windowed_autocorr;
    use crate::tracker::Pitch;

    fn generate_sine(sample_rate: f32, frequency: f32, amplitude: f32, sample_count: usize) -> Vec<f32> {
        (0..sample_count)
            .map(|i| {
                let phase =
                    2.0 * std::f64::consts::PI * frequency as f64 * i as f64 / sample_rate as f64;
                amplitude * phase.sin() as f32
            })
            .collect()
    }

    fn default_tracker() -> PitchTracker {
        PitchTracker::from_config(TrackerConfig::default()).unwrap()
    }

    #[test]
    fn test_pure_tone_locks_on_period() {
        let mut tracker = default_tracker();
        let window_len = tracker.window_len();
        // A period of 218.25 samples fits the window exactly four times.
        let frequency = 48000.0 / 218.25;
        let signal = generate_sine(48000.0, frequency, 0.5, 4 * window_len);
        let expected = tracker.table().coordinate(218).unwrap();

        let mut decisions = Vec::new();
        tracker.process(&signal, |decision| decisions.push(decision));
        assert_eq!(decisions.len(), signal.len());

        for decision in &decisions[2 * window_len..] {
            match decision {
                Decision::Stable(best) => {
                    assert_eq!(best.lag, 218);
                    assert_eq!(decision.pitch(), Pitch::Voiced(expected));
                }
                other => panic!("expected a stable decision, got {:?}", other),
            }
        }
        assert_eq!(tracker.previous_lag(), Some(218));
    }

    #[test]
    fn test_silence_is_unvoiced() {
        let mut tracker = default_tracker();
        let window_len = tracker.window_len();
        let mut count = 0;
        tracker.process(&vec![0.0; 3 * window_len], |decision| {
            assert_eq!(decision, Decision::Silent);
            count += 1;
        });
        assert_eq!(count, 3 * window_len);

        // Below the amplitude threshold of 0.005.
        let quiet = generate_sine(48000.0, 220.0, 0.001, 3 * window_len);
        tracker.process(&quiet, |decision| {
            assert_eq!(decision.pitch(), Pitch::Unvoiced);
            assert_eq!(decision, Decision::Silent);
        });
        assert_eq!(tracker.previous_lag(), None);
    }

    #[test]
    fn test_missing_frames_are_skipped() {
        let mut tracker = default_tracker();
        let signal = generate_sine(48000.0, 220.0, 0.5, 2000);
        tracker.process(&signal[..1000], |_| {});
        let energy = tracker.energy();
        let correlation = tracker.correlation().to_vec();

        let mut called = false;
        assert_eq!(
            tracker.process_frame(None, |_| called = true),
            FrameOutcome::Skipped
        );
        assert_eq!(
            tracker.process_frame(Some(&[]), |_| called = true),
            FrameOutcome::Skipped
        );
        assert!(!called);
        assert_eq!(tracker.skipped_frame_count(), 2);
        assert_eq!(tracker.processed_sample_count(), 1000);
        assert_eq!(tracker.energy(), energy);
        assert_eq!(tracker.correlation(), &correlation[..]);

        assert_eq!(
            tracker.process_frame(Some(&signal[1000..]), |_| {}),
            FrameOutcome::Processed { sample_count: 1000 }
        );
        assert_eq!(tracker.processed_sample_count(), 2000);
    }

    #[test]
    fn test_chunk_size_does_not_matter() {
        let signal = generate_sine(48000.0, 330.0, 0.3, 5000);

        let mut whole = Vec::new();
        let mut tracker = default_tracker();
        tracker.process(&signal, |decision| whole.push(decision));

        let mut chunked = Vec::new();
        let mut tracker = default_tracker();
        let chunk_sizes = [1, 7, 64, 480, 1, 333];
        let mut offset = 0;
        let mut chunk_index = 0;
        while offset < signal.len() {
            let size = chunk_sizes[chunk_index % chunk_sizes.len()].min(signal.len() - offset);
            tracker.process(&signal[offset..offset + size], |decision| chunked.push(decision));
            offset += size;
            chunk_index += 1;
        }

        assert_eq!(whole, chunked);
    }

    #[test]
    fn test_correlation_matches_brute_force() {
        let mut tracker = default_tracker();
        let lags = tracker.lag_range();
        let signal: Vec<f32> = generate_sine(48000.0, 150.0, 0.4, 2500)
            .iter()
            .zip(generate_sine(48000.0, 523.0, 0.2, 2500))
            .map(|(a, b)| a + b)
            .collect();
        tracker.process(&signal, |_| {});

        let mut expected = vec![0.0; lags.len()];
        windowed_autocorr(&signal, lags.window_len(), lags.min, &mut expected);
        for (actual, expected) in tracker.correlation().iter().zip(expected.iter()) {
            assert!((actual - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_reset_forgets_signal() {
        let mut tracker = default_tracker();
        let signal = generate_sine(48000.0, 220.0, 0.5, 3000);
        tracker.process(&signal, |_| {});
        assert!(tracker.previous_lag().is_some());

        tracker.reset();
        assert_eq!(tracker.previous_lag(), None);
        assert_eq!(tracker.energy(), 0.0);
        assert_eq!(tracker.process_sample(0.0), Decision::Silent);
        assert_eq!(tracker.processed_sample_count(), 3001);
    }

    #[test]
    fn test_tone_sweep_tracks_whole_range() {
        let frequencies = [58.0, 65.0, 75.0, 85.0, 110.0, 220.0, 300.0, 440.0, 850.0, 870.0];
        for &frequency in frequencies.iter() {
            let mut tracker = default_tracker();
            let expected = tracker.table().frequency_to_coordinate(frequency);
            let signal = generate_sine(48000.0, frequency, 0.5, 48000);

            let mut decisions = Vec::new();
            tracker.process(&signal, |decision| decisions.push(decision));
            for decision in &decisions[24000..] {
                match decision {
                    Decision::Stable(best) => assert!(
                        (best.coordinate - expected).abs() < 0.005,
                        "{} Hz read as lag {}",
                        frequency,
                        best.lag
                    ),
                    other => panic!("{} Hz: expected a stable decision, got {:?}", frequency, other),
                }
            }
        }
    }

    #[test]
    fn test_non_finite_samples_count_as_silence() {
        let mut signal = generate_sine(48000.0, 220.0, 0.5, 3000);
        let mut zeroed = signal.clone();
        for &index in [500, 1200, 1201, 2500].iter() {
            zeroed[index] = 0.0;
        }
        signal[500] = f32::NAN;
        signal[1200] = f32::INFINITY;
        signal[1201] = f32::NEG_INFINITY;
        signal[2500] = f32::NAN;

        let mut expected = Vec::new();
        let mut tracker = default_tracker();
        tracker.process(&zeroed, |decision| expected.push(decision));

        let mut actual = Vec::new();
        let mut tracker = default_tracker();
        tracker.process(&signal, |decision| actual.push(decision));

        assert_eq!(actual, expected);
        assert!(tracker.energy().is_finite());
        assert!(tracker.correlation().iter().all(|value| value.is_finite()));
        assert!(actual.last().unwrap().is_stable());
    }

    #[test]
    fn test_rejects_table_for_other_bounds() {
        let table = Arc::new(PitchTable::from_bounds(44100.0, 55.0, 880.0).unwrap());
        assert!(matches!(
            PitchTracker::new(TrackerConfig::default(), table),
            Err(ConfigError::TableBoundsMismatch { .. })
        ));
        let invalid = TrackerConfig {
            continuity_band: 0.0,
            ..TrackerConfig::default()
        };
        assert!(PitchTracker::from_config(invalid).is_err());
    }
}
