//! Fixed-capacity ring of recent magnitude samples.

/// Circular buffer of the most recent magnitude readings.
///
/// The write index always stays in `[0, capacity)` and wraps modulo the
/// capacity, overwriting the oldest entry; `full` latches once the buffer has
/// wrapped at least once. Collection never fails.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<u8>,
    index: usize,
    full: bool,
}

impl SampleBuffer {
    /// Default ring capacity.
    pub const DEFAULT_CAPACITY: usize = 10;

    /// Create a buffer holding `capacity` samples (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0; capacity.max(1)],
            index: 0,
            full: false,
        }
    }

    /// Append a sample, overwriting the oldest entry once the ring has
    /// wrapped. Returns `true` when this write wrapped the index back to 0 —
    /// i.e. one full window of samples has just completed, the moment callers
    /// dump the ring for diagnostics.
    pub fn collect(&mut self, value: u8) -> bool {
        self.samples[self.index] = value;
        self.index = (self.index + 1) % self.samples.len();
        if self.index == 0 {
            self.full = true;
            true
        } else {
            false
        }
    }

    /// `true` once at least `capacity` samples have been collected.
    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Current write index (the slot the next sample lands in).
    pub fn index(&self) -> usize {
        self.index
    }

    /// The raw ring contents in slot order. Only meaningful once
    /// [`SampleBuffer::is_full`] is true.
    pub fn snapshot(&self) -> &[u8] {
        &self.samples
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
