//! Short-key generation for the Curtail URL shortener.
//!
//! Generators are pure: they produce candidate keys without consulting
//! storage. Uniqueness is the backend's concern — a generated key is only
//! as unique as the key space makes it.

pub mod random;
pub mod seq;

pub use random::RandomGenerator;
pub use seq::SeqGenerator;

use curtail_core::ShortKey;

/// Trait for producing short keys.
///
/// Implementations must be safe for concurrent invocation without callers
/// serializing on shared generator state.
pub trait KeyGenerator: Send + Sync + 'static {
    /// Produces a key of exactly `length` characters.
    fn generate(&self, length: usize) -> ShortKey;
}
