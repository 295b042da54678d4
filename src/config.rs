//! Reader tuning parameters.

/// Configuration shared by the container parser and the sample decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Capacity of the `BufReader` wrapped around the file (default: 16 KiB).
    pub buffer_capacity: usize,
}

impl ReaderConfig {
    /// Default `BufReader` capacity.
    pub const DEFAULT_BUFFER_CAPACITY: usize = 1024 * 16;

    /// Returns a config with the given buffer capacity, clamped to at least one byte.
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(1);
        self
    }

    pub(crate) fn effective_capacity(&self) -> usize {
        self.buffer_capacity.max(1)
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: Self::DEFAULT_BUFFER_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_clamped() {
        let config = ReaderConfig::default().with_buffer_capacity(0);
        assert_eq!(config.buffer_capacity, 1);

        let raw = ReaderConfig { buffer_capacity: 0 };
        assert_eq!(raw.effective_capacity(), 1);
    }
}
