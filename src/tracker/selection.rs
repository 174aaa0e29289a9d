use crate::config::{LagRange, TrackerConfig};
use crate::table::PitchTable;

use super::decision::{Candidate, Decision};

/// The number of candidates compared by the stability check.
pub const CANDIDATE_COUNT: usize = 3;

/// The highest correlation lags found during a band scan, best first.
/// On equal correlation, the most recently inserted lag ranks first.
#[derive(Debug, Clone, Copy)]
pub struct Candidates {
    entries: [(usize, f64); CANDIDATE_COUNT],
    count: usize,
}

impl Candidates {
    pub fn new() -> Self {
        Candidates {
            entries: [(0, 0.0); CANDIDATE_COUNT],
            count: 0,
        }
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// `(lag, correlation)` pairs, best first.
    pub fn as_slice(&self) -> &[(usize, f64)] {
        &self.entries[..self.count]
    }

    /// Inserts `lag` at its rank, dropping the lowest ranked entry if full.
    pub fn insert(&mut self, lag: usize, correlation: f64) {
        let position = self.entries[..self.count]
            .iter()
            .position(|&(_, existing)| correlation >= existing)
            .unwrap_or(self.count);
        if position >= CANDIDATE_COUNT {
            return;
        }
        let last = self.count.min(CANDIDATE_COUNT - 1);
        for i in (position..last).rev() {
            self.entries[i + 1] = self.entries[i];
        }
        self.entries[position] = (lag, correlation);
        self.count = (self.count + 1).min(CANDIDATE_COUNT);
    }

    /// Appends `lag` after the existing entries regardless of rank, if not full.
    fn fill(&mut self, lag: usize, correlation: f64) {
        while self.count < CANDIDATE_COUNT {
            self.entries[self.count] = (lag, correlation);
            self.count += 1;
        }
    }
}

impl Default for Candidates {
    fn default() -> Self {
        Candidates::new()
    }
}

/// Decides voiced/unvoiced and picks the pitch lag for one window, keeping
/// the lag chosen for the previous window to favor continuity.
///
/// 1. Windows with energy below `amplitude_threshold² × L` are [Decision::Silent].
/// 2. Lags on the falling flank of the peak at lag zero are ignored. The
///    flank runs from `lag_min - 1` to the first local minimum. A scan of the
///    remaining lags finds the largest correlation, ties going to the
///    smallest lag. If it is not positive, the window is [Decision::Aperiodic].
/// 3. Starting at the previous lag (or the end of the flank), a scan in
///    each direction skips lags below `continuity_band` times the largest
///    correlation, then collects lags while they stay above it. The three
///    best collected lags are the candidates. Missing candidates are filled
///    with the globally best lag.
/// 4. If any two candidates map to coordinates further apart than
///    `stability_tolerance`, the window is [Decision::Ambiguous]. Otherwise
///    it is [Decision::Stable] and the best candidate becomes the previous lag.
///
/// Silent and aperiodic windows clear the previous lag, ambiguous ones keep it.
pub struct LagSelector {
    lag_min: usize,
    gate_energy: f64,
    continuity_band: f64,
    stability_tolerance: f32,
    previous_lag: Option<usize>,
    candidates: Candidates,
}

impl LagSelector {
    pub fn new(config: &TrackerConfig, lags: LagRange) -> Self {
        LagSelector {
            lag_min: lags.min,
            gate_energy: config.gate_energy(),
            continuity_band: config.continuity_band as f64,
            stability_tolerance: config.stability_tolerance,
            previous_lag: None,
            candidates: Candidates::new(),
        }
    }

    /// The lag chosen for the most recent stable window, if the
    /// signal has been voiced since.
    pub fn previous_lag(&self) -> Option<usize> {
        self.previous_lag
    }

    /// The candidates of the most recent voiced, periodic window.
    pub fn candidates(&self) -> &Candidates {
        &self.candidates
    }

    pub fn reset(&mut self) {
        self.previous_lag = None;
        self.candidates.clear();
    }

    /// Analyzes one window. `correlation` holds one value per lag in
    /// `lag_min - 1..lag_max`, i.e. one more than `table`. The extra leading
    /// lag only serves to tell whether the correlation at `lag_min` is still
    /// falling off the peak at lag zero.
    pub fn select(&mut self, energy: f64, correlation: &[f64], table: &PitchTable) -> Decision {
        debug_assert_eq!(correlation.len(), table.len() + 1);
        debug_assert_eq!(self.lag_min, table.lag_min());

        if energy < self.gate_energy || correlation.len() < 2 {
            self.previous_lag = None;
            return Decision::Silent;
        }
        let below_min = correlation[0];
        let correlation = &correlation[1..];

        // Skip the flank of the peak at lag zero, up to its first minimum.
        let mut first_index = 0;
        let mut previous = below_min;
        while first_index < correlation.len() && correlation[first_index] < previous {
            previous = correlation[first_index];
            first_index += 1;
        }

        let mut best_correlation = 0.0;
        let mut best_index = first_index;
        for (index, &value) in correlation.iter().enumerate().skip(first_index) {
            if value > best_correlation {
                best_correlation = value;
                best_index = index;
            }
        }
        if best_correlation <= 0.0 {
            self.previous_lag = None;
            return Decision::Aperiodic;
        }

        let band = self.continuity_band * best_correlation;
        let seed = self
            .previous_lag
            .map(|lag| lag.saturating_sub(self.lag_min))
            .unwrap_or(0)
            .max(first_index)
            .min(correlation.len() - 1);

        self.candidates.clear();
        let mut found = false;
        for (index, &value) in correlation.iter().enumerate().skip(seed) {
            if value > band {
                found = true;
                self.candidates.insert(self.lag_min + index, value);
            } else if found {
                break;
            }
        }
        // The seed itself was handled by the forward scan.
        found = correlation[seed] > band;
        for index in (first_index..seed).rev() {
            let value = correlation[index];
            if value > band {
                found = true;
                self.candidates.insert(self.lag_min + index, value);
            } else if found {
                break;
            }
        }
        self.candidates
            .fill(self.lag_min + best_index, best_correlation);

        let coordinates = table.coordinates();
        let entries = self.candidates.as_slice();
        let mut spread: f32 = 0.0;
        for (i, &(lag_a, _)) in entries.iter().enumerate() {
            for &(lag_b, _) in entries.iter().skip(i + 1) {
                let distance =
                    (coordinates[lag_a - self.lag_min] - coordinates[lag_b - self.lag_min]).abs();
                spread = spread.max(distance);
            }
        }

        let (best_lag, best_value) = entries[0];
        let best = Candidate {
            lag: best_lag,
            correlation: best_value,
            coordinate: coordinates[best_lag - self.lag_min],
        };
        if spread > self.stability_tolerance {
            Decision::Ambiguous { best, spread }
        } else {
            self.previous_lag = Some(best_lag);
            Decision::Stable(best)
        }
    }
}
