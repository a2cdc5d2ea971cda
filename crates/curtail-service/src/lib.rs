//! URL shortening service layer.
//!
//! Wires a key generator and a storage backend together and adds the
//! batch-create and bulk-deletion flows on top of the repository
//! contract. Core types are re-exported from `curtail_core`.

pub mod bulk;
pub mod error;
pub mod service;

pub use error::ShortenerError;
pub use service::{ServiceSettings, ShortenerService};
