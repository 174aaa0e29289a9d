//! A lock-free, single producer, multiple consumer channel of [Pitch] values.
//!
//! The producer writes into a fixed size ring and never waits for
//! readers. Each [Reader] keeps its own cursor. A reader that falls more
//! than the capacity behind loses the oldest unread entries and is told
//! how many through [ReadReport::dropped].
//!
//! ```
//! use pitch_trace::channel::result_channel;
//! use pitch_trace::tracker::Pitch;
//!
//! let (mut publisher, channel) = result_channel(4);
//! let mut reader = channel.subscribe();
//! for i in 0..6 {
//!     publisher.publish(Pitch::Voiced(i as f32 * 0.1));
//! }
//! let mut entries = Vec::new();
//! let report = reader.try_read_into(&mut entries);
//! assert_eq!(report.read, 4);
//! assert_eq!(report.dropped, 2);
//! assert_eq!(entries[0], Pitch::Voiced(0.2));
//! ```

use std::sync::atomic::{fence, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use log::debug;

use crate::tracker::Pitch;

/// Ring storage shared by the publisher and all readers.
///
/// Entries are numbered by a monotonic 64 bit count. Entry `n` lives in
/// slot `n % capacity`. `claimed` is the number of entries whose write has
/// started and `published` the number whose write has finished, so a slot
/// read by a reader holds entry `n` unless `claimed > n + capacity` when
/// the read completes.
struct Shared {
    slots: Box<[AtomicU32]>,
    claimed: AtomicU64,
    published: AtomicU64,
}

impl Shared {
    fn capacity(&self) -> u64 {
        self.slots.len() as u64
    }
}

/// Creates a channel holding at most `capacity` unread entries per reader.
pub fn result_channel(capacity: usize) -> (Publisher, ResultChannel) {
    if capacity == 0 {
        panic!("Channel capacity must be greater than 0")
    }
    let unvoiced = Pitch::Unvoiced.to_f32().to_bits();
    let shared = Arc::new(Shared {
        slots: (0..capacity).map(|_| AtomicU32::new(unvoiced)).collect(),
        claimed: AtomicU64::new(0),
        published: AtomicU64::new(0),
    });
    (
        Publisher {
            shared: shared.clone(),
            count: 0,
        },
        ResultChannel { shared },
    )
}

/// The writing end. There is exactly one per channel.
pub struct Publisher {
    shared: Arc<Shared>,
    count: u64,
}

impl Publisher {
    /// Appends `pitch`, overwriting the oldest entry once the ring is full.
    /// Wait free.
    #[inline]
    pub fn publish(&mut self, pitch: Pitch) {
        let count = self.count;
        let slot = &self.shared.slots[(count % self.shared.capacity()) as usize];

        self.shared.claimed.store(count + 1, Ordering::Relaxed);
        // Orders the claim before the slot write for readers that fence after reading.
        fence(Ordering::Release);
        slot.store(pitch.to_f32().to_bits(), Ordering::Relaxed);
        self.shared.published.store(count + 1, Ordering::Release);

        self.count = count + 1;
    }

    /// Returns the number of entries published so far.
    pub fn published_count(&self) -> u64 {
        self.count
    }

    /// A handle for subscribing readers to this channel.
    pub fn channel(&self) -> ResultChannel {
        ResultChannel {
            shared: self.shared.clone(),
        }
    }
}

/// A cloneable handle for subscribing readers, safe to pass to other threads.
#[derive(Clone)]
pub struct ResultChannel {
    shared: Arc<Shared>,
}

impl ResultChannel {
    /// Creates a reader that will see entries published from now on.
    pub fn subscribe(&self) -> Reader {
        let cursor = self.shared.published.load(Ordering::Acquire);
        Reader {
            shared: self.shared.clone(),
            cursor,
            dropped_count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.shared.slots.len()
    }

    /// Returns the number of entries published so far.
    pub fn published_count(&self) -> u64 {
        self.shared.published.load(Ordering::Acquire)
    }
}

/// The outcome of one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadReport {
    /// The number of entries delivered.
    pub read: usize,
    /// The number of entries that were overwritten before they could be read.
    pub dropped: u64,
}

/// An independent read cursor into a channel.
pub struct Reader {
    shared: Arc<Shared>,
    cursor: u64,
    dropped_count: u64,
}

impl Reader {
    /// The number of entries published but not yet read, capped at the capacity.
    pub fn available(&self) -> usize {
        let published = self.shared.published.load(Ordering::Acquire);
        (published - self.cursor).min(self.shared.capacity()) as usize
    }

    /// The count of the next entry this reader will return.
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// Returns the total number of entries dropped since the reader subscribed.
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }

    /// Appends all available entries to `entries`, oldest first.
    pub fn try_read_into(&mut self, entries: &mut Vec<Pitch>) -> ReadReport {
        let offset = entries.len();
        entries.resize(offset + self.shared.slots.len(), Pitch::Unvoiced);
        let report = self.read_into_slice(&mut entries[offset..]);
        entries.truncate(offset + report.read);
        report
    }

    /// Returns all available entries, oldest first.
    pub fn try_read(&mut self) -> Vec<Pitch> {
        let mut entries = Vec::with_capacity(self.available());
        self.try_read_into(&mut entries);
        entries
    }

    /// Reads up to `buffer.len()` of the oldest available entries into the
    /// start of `buffer`. Does not allocate.
    pub fn read_into_slice(&mut self, buffer: &mut [Pitch]) -> ReadReport {
        let capacity = self.shared.capacity();
        let published = self.shared.published.load(Ordering::Acquire);

        let mut dropped = 0;
        if published - self.cursor > capacity {
            dropped = published - capacity - self.cursor;
            self.cursor = published - capacity;
        }

        let start = self.cursor;
        let end = published.min(start + buffer.len() as u64);
        let count = (end - start) as usize;
        for (offset, value) in buffer[..count].iter_mut().enumerate() {
            let slot = &self.shared.slots[((start + offset as u64) % capacity) as usize];
            *value = Pitch::from_f32(f32::from_bits(slot.load(Ordering::Relaxed)));
        }

        // Any entry the producer started overwriting during the copy is discarded.
        fence(Ordering::Acquire);
        let claimed = self.shared.claimed.load(Ordering::Relaxed);
        let overwritten = claimed
            .saturating_sub(capacity)
            .saturating_sub(start)
            .min(count as u64) as usize;
        if overwritten > 0 {
            buffer.copy_within(overwritten..count, 0);
            dropped += overwritten as u64;
        }

        self.cursor = end;
        if dropped > 0 {
            self.dropped_count += dropped;
            debug!(
                "Reader fell behind, dropped {} entries ({} in total)",
                dropped, self.dropped_count
            );
        }

        ReadReport {
            read: count - overwritten,
            dropped,
        }
    }
}
