use super::sample_window::SampleWindow;

/// Running autocorrelation and energy of the most recent `L` samples, where
/// `L` is the window length of the [SampleWindow] passed to
/// [update](CorrelationEngine::update).
///
/// For each lag in `lag_min..lag_max`, `correlation[lag - lag_min]` equals
///
/// > sum_{i=0}^{L-1} x(t-i) * x(t-i-lag)
///
/// at the current time `t`. Instead of recomputing the sums, each new sample
/// adds the product entering the window and subtracts the product leaving it,
/// which costs O(lag count) per sample. Products of two `f32`s are exact in
/// `f64`, so the added and subtracted terms cancel exactly and only the
/// rounding of the sums themselves accumulates.
pub struct CorrelationEngine {
    lag_min: usize,
    energy: f64,
    correlation: Box<[f64]>,
}

impl CorrelationEngine {
    pub fn new(lag_min: usize, lag_max: usize) -> Self {
        if lag_max <= lag_min {
            panic!("Lag max must be greater than lag min")
        }
        CorrelationEngine {
            lag_min,
            energy: 0.0,
            correlation: vec![0.0; lag_max - lag_min].into_boxed_slice(),
        }
    }

    pub fn lag_min(&self) -> usize {
        self.lag_min
    }

    pub fn lag_max(&self) -> usize {
        self.lag_min + self.correlation.len()
    }

    /// The sum of squared samples in the window.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Correlation per lag, indexed by `lag - lag_min`.
    pub fn correlation(&self) -> &[f64] {
        &self.correlation
    }

    /// The correlation at `lag`, or `None` if `lag` is out of range.
    pub fn correlation_at(&self, lag: usize) -> Option<f64> {
        lag.checked_sub(self.lag_min)
            .and_then(|index| self.correlation.get(index))
            .copied()
    }

    pub fn reset(&mut self) {
        self.energy = 0.0;
        self.correlation.iter_mut().for_each(|c| *c = 0.0);
    }

    /// Accounts for one sample entering and one leaving the window.
    /// `window` must already contain `incoming`, i.e. this is called
    /// right after `window.push(incoming)` returned `outgoing`.
    #[inline]
    pub fn update(&mut self, window: &SampleWindow, incoming: f32, outgoing: f32) {
        debug_assert!(self.lag_max() <= window.window_len());
        let incoming = incoming as f64;
        let outgoing = outgoing as f64;
        self.energy += incoming * incoming - outgoing * outgoing;

        for (index, c) in self.correlation.iter_mut().enumerate() {
            let lag = self.lag_min + index;
            *c += incoming * window.incoming_at_lag(lag) as f64
                - outgoing * window.outgoing_at_lag(lag) as f64;
        }
    }
}

/// Computes the autocorrelation of the last `window_len` samples of
/// `signal` by direct summation, for each lag in `lag_min..lag_min + result.len()`.
/// Samples before the start of `signal` are treated as zeros.
pub fn windowed_autocorr(signal: &[f32], window_len: usize, lag_min: usize, result: &mut [f64]) {
    let end = signal.len();
    let sample = |index: isize| -> f64 {
        if index < 0 {
            0.0
        } else {
            signal[index as usize] as f64
        }
    };

    for (offset, value) in result.iter_mut().enumerate() {
        let lag = (lag_min + offset) as isize;
        let mut sum = 0.0;
        for i in 0..window_len as isize {
            let t = end as isize - 1 - i;
            sum += sample(t) * sample(t - lag);
        }
        *value = sum;
    }
}
