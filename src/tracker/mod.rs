//! Per sample pitch tracking: the [PitchTracker] and the decisions it makes.

mod decision;
mod detector;
mod selection;

pub use decision::{Candidate, Decision, Pitch};
pub use detector::{FrameOutcome, PitchTracker};
pub use selection::{Candidates, LagSelector, CANDIDATE_COUNT};
