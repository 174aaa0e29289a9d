use std::sync::Arc;

use log::info;

use crate::channel::{result_channel, Publisher, ResultChannel};
use crate::config::TrackerConfig;
use crate::error::ConfigError;
use crate::table::PitchTable;
use crate::tracker::{FrameOutcome, PitchTracker};

/// The consumer side of a [Pipeline].
#[derive(Clone)]
pub struct PipelineOutputs {
    /// One entry per sample: the stable pitch or unvoiced.
    pub pitch: ResultChannel,
    /// One entry per sample: the best candidate even when the candidates
    /// disagree. Only present if `publish_raw` is set.
    pub raw: Option<ResultChannel>,
    /// The table the published coordinates come from.
    pub table: Arc<PitchTable>,
}

/// A [PitchTracker] publishing every decision. This is what an audio
/// capture callback drives.
pub struct Pipeline {
    tracker: PitchTracker,
    pitch: Publisher,
    raw: Option<Publisher>,
}

impl Pipeline {
    pub fn new(config: TrackerConfig) -> Result<(Pipeline, PipelineOutputs), ConfigError> {
        let table = Arc::new(PitchTable::build(&config)?);
        Pipeline::with_table(config, table)
    }

    /// Creates a pipeline using a prebuilt table, see [PitchTracker::new].
    pub fn with_table(
        config: TrackerConfig,
        table: Arc<PitchTable>,
    ) -> Result<(Pipeline, PipelineOutputs), ConfigError> {
        let capacity = config.channel_capacity();
        let publish_raw = config.publish_raw;
        let tracker = PitchTracker::new(config, table.clone())?;

        let (pitch, pitch_channel) = result_channel(capacity);
        let (raw, raw_channel) = if publish_raw {
            let (publisher, channel) = result_channel(capacity);
            (Some(publisher), Some(channel))
        } else {
            (None, None)
        };

        info!(
            "Pitch pipeline ready: {} Hz, lags {}..{}, channel capacity {}{}",
            tracker.config().sample_rate,
            tracker.lag_range().min,
            tracker.lag_range().max,
            capacity,
            if publish_raw { ", publishing raw pitch" } else { "" }
        );

        Ok((
            Pipeline { tracker, pitch, raw },
            PipelineOutputs {
                pitch: pitch_channel,
                raw: raw_channel,
                table,
            },
        ))
    }

    /// Processes a chunk, publishing one entry per sample to each channel.
    pub fn process(&mut self, samples: &[f32]) {
        self.process_frame(Some(samples));
    }

    /// Processes a frame that may be missing. Missing and empty frames
    /// publish nothing.
    pub fn process_frame(&mut self, frame: Option<&[f32]>) -> FrameOutcome {
        let pitch = &mut self.pitch;
        let raw = &mut self.raw;
        self.tracker.process_frame(frame, |decision| {
            pitch.publish(decision.pitch());
            if let Some(raw) = raw.as_mut() {
                raw.publish(decision.raw_pitch());
            }
        })
    }

    pub fn tracker(&self) -> &PitchTracker {
        &self.tracker
    }

    /// Resets the tracker. Published entries are kept.
    pub fn reset(&mut self) {
        self.tracker.reset();
    }

    /// Returns the number of entries published per channel.
    pub fn published_count(&self) -> u64 {
        self.pitch.published_count()
    }
}
