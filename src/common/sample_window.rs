/// A circular buffer holding the `2 * lag_max` most recent samples.
///
/// Two cursors, the add position and the remove position, are always
/// `lag_max` slots apart. Each [push](SampleWindow::push) writes the new
/// sample at the add position, returns the sample at the remove position,
/// which is leaving the analysis window, and advances both cursors.
/// After a push, [incoming_at_lag](SampleWindow::incoming_at_lag) and
/// [outgoing_at_lag](SampleWindow::outgoing_at_lag) read the samples `lag`
/// steps before the pushed and evicted samples respectively.
pub struct SampleWindow {
    samples: Box<[f32]>,
    lag_max: usize,
    add_pos: usize,
    remove_pos: usize,
}

impl SampleWindow {
    pub fn new(lag_max: usize) -> Self {
        if lag_max == 0 {
            panic!("Lag max must be greater than 0")
        }
        SampleWindow {
            samples: vec![0.0; 2 * lag_max].into_boxed_slice(),
            lag_max,
            add_pos: lag_max,
            remove_pos: 0,
        }
    }

    /// The number of samples in the analysis window.
    pub fn window_len(&self) -> usize {
        self.lag_max
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Zeroes all samples and restores the initial cursor positions.
    pub fn reset(&mut self) {
        self.samples.iter_mut().for_each(|s| *s = 0.0);
        self.add_pos = self.lag_max;
        self.remove_pos = 0;
    }

    /// Appends `sample` and returns the sample leaving the analysis window.
    #[inline]
    pub fn push(&mut self, sample: f32) -> f32 {
        self.samples[self.add_pos] = sample;
        let evicted = self.samples[self.remove_pos];

        self.add_pos += 1;
        if self.add_pos == self.samples.len() {
            self.add_pos = 0;
        }
        self.remove_pos += 1;
        if self.remove_pos == self.samples.len() {
            self.remove_pos = 0;
        }

        evicted
    }

    /// The sample `lag` steps before the most recently pushed one.
    /// `lag` must be less than `lag_max`.
    #[inline]
    pub fn incoming_at_lag(&self, lag: usize) -> f32 {
        self.samples[self.lagged_index(self.add_pos, lag)]
    }

    /// The sample `lag` steps before the most recently evicted one.
    /// `lag` must be less than `lag_max`.
    #[inline]
    pub fn outgoing_at_lag(&self, lag: usize) -> f32 {
        self.samples[self.lagged_index(self.remove_pos, lag)]
    }

    // `cursor` has already been advanced past the sample of interest, hence the extra 1.
    #[inline]
    fn lagged_index(&self, cursor: usize, lag: usize) -> usize {
        debug_assert!(lag < self.lag_max);
        let capacity = self.samples.len();
        let index = cursor + capacity - 1 - lag;
        if index >= capacity {
            index - capacity
        } else {
            index
        }
    }
}
