use crate::KeyGenerator;
use curtail_core::ShortKey;
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Uniform random keys over the 62-symbol alphanumeric alphabet.
///
/// Draws from the thread-local RNG, so concurrent callers never contend on
/// shared state. No uniqueness guarantee is made: collision handling rests
/// entirely on the backend's key constraints. A production-grade setup
/// would retry generation against an existence check; this one, matching
/// the storage contract, does not.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGenerator;

impl RandomGenerator {
    /// Creates a new random key generator.
    pub fn new() -> Self {
        Self
    }
}

impl KeyGenerator for RandomGenerator {
    fn generate(&self, length: usize) -> ShortKey {
        let key: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect();
        ShortKey::new(key)
    }
}
