/// A normalized pitch coordinate in `[0, 1]`, or no reliable pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pitch {
    Voiced(f32),
    Unvoiced,
}

impl Pitch {
    /// The value stored for [Pitch::Unvoiced] in flat buffers.
    pub const UNVOICED_SENTINEL: f32 = -1.0;

    pub fn is_voiced(&self) -> bool {
        matches!(self, Pitch::Voiced(_))
    }

    pub fn coordinate(&self) -> Option<f32> {
        match self {
            Pitch::Voiced(coordinate) => Some(*coordinate),
            Pitch::Unvoiced => None,
        }
    }

    /// Flattens to a single `f32`, using [Pitch::UNVOICED_SENTINEL] for unvoiced.
    pub fn to_f32(self) -> f32 {
        match self {
            Pitch::Voiced(coordinate) => coordinate,
            Pitch::Unvoiced => Self::UNVOICED_SENTINEL,
        }
    }

    /// The inverse of [to_f32](Pitch::to_f32). Any negative or NaN value is unvoiced.
    pub fn from_f32(value: f32) -> Pitch {
        if value >= 0.0 {
            Pitch::Voiced(value)
        } else {
            Pitch::Unvoiced
        }
    }
}

/// A candidate pitch period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// The lag in samples.
    pub lag: usize,
    /// The autocorrelation at `lag`.
    pub correlation: f64,
    /// The pitch coordinate of `lag`.
    pub coordinate: f32,
}

/// The outcome of analyzing the window ending at one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// The window energy is below the amplitude threshold.
    Silent,
    /// The window has energy but no lag with positive correlation.
    Aperiodic,
    /// The three best candidates are too far apart to trust the best one.
    /// `spread` is the largest coordinate distance between any two of them.
    Ambiguous { best: Candidate, spread: f32 },
    /// The three best candidates agree. Holds the best one.
    Stable(Candidate),
}

impl Decision {
    /// The pitch to publish: the best candidate's coordinate for stable
    /// windows, unvoiced otherwise.
    pub fn pitch(&self) -> Pitch {
        match self {
            Decision::Stable(best) => Pitch::Voiced(best.coordinate),
            _ => Pitch::Unvoiced,
        }
    }

    /// The best candidate's coordinate whether or not the candidates agree.
    pub fn raw_pitch(&self) -> Pitch {
        match self {
            Decision::Stable(best) | Decision::Ambiguous { best, .. } => {
                Pitch::Voiced(best.coordinate)
            }
            _ => Pitch::Unvoiced,
        }
    }

    pub fn best(&self) -> Option<&Candidate> {
        match self {
            Decision::Stable(best) | Decision::Ambiguous { best, .. } => Some(best),
            _ => None,
        }
    }

    pub fn is_stable(&self) -> bool {
        matches!(self, Decision::Stable(_))
    }
}
