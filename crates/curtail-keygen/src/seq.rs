use crate::KeyGenerator;
use curtail_core::ShortKey;
use std::sync::atomic::{AtomicU64, Ordering};

/// Deterministic prefix-plus-counter key generator.
///
/// Produces keys like `cu000000`, `cu000001`, … — unique within a single
/// instance, which makes tests and single-node dev setups predictable. The
/// counter is zero-padded to fill the requested length; the prefix is
/// assumed to be shorter than the lengths it is asked for.
#[derive(Debug)]
pub struct SeqGenerator {
    counter: AtomicU64,
    prefix: String,
}

impl Clone for SeqGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::SeqCst)),
            prefix: self.prefix.clone(),
        }
    }
}

impl SeqGenerator {
    /// Creates a generator with the given prefix, counting from zero.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            counter: AtomicU64::new(0),
            prefix: prefix.into(),
        }
    }

    /// Creates a generator counting from a specific offset.
    ///
    /// Useful for resuming from a known state or splitting counter ranges
    /// across nodes.
    pub fn with_offset(prefix: impl Into<String>, offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
            prefix: prefix.into(),
        }
    }
}

impl KeyGenerator for SeqGenerator {
    fn generate(&self, length: usize) -> ShortKey {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        let digits = length.saturating_sub(self.prefix.len()).max(1);
        ShortKey::new(format!(
            "{}{:0width$}",
            self.prefix,
            count,
            width = digits
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_sequential_keys() {
        let generator = SeqGenerator::with_prefix("cu");

        assert_eq!(generator.generate(8).as_str(), "cu000000");
        assert_eq!(generator.generate(8).as_str(), "cu000001");
        assert_eq!(generator.generate(8).as_str(), "cu000002");
    }

    #[test]
    fn pads_counter_to_requested_length() {
        let generator = SeqGenerator::with_prefix("node-a");

        assert_eq!(generator.generate(10).as_str(), "node-a0000");
        assert_eq!(generator.generate(10).as_str().len(), 10);
    }

    #[test]
    fn counts_from_an_offset() {
        let generator = SeqGenerator::with_offset("cu", 1000);

        assert_eq!(generator.generate(8).as_str(), "cu001000");
        assert_eq!(generator.generate(8).as_str(), "cu001001");
    }

    #[test]
    fn clone_preserves_counter_state() {
        let generator = SeqGenerator::with_prefix("cu");
        generator.generate(8);
        generator.generate(8);

        let cloned = generator.clone();

        assert_eq!(generator.generate(8).as_str(), "cu000002");
        assert_eq!(cloned.generate(8).as_str(), "cu000002");
    }
}
