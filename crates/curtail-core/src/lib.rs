//! Core types and traits for the Curtail URL shortener.
//!
//! This crate provides the vocabulary shared by the shortening service and
//! both storage backends: the record entity, the repository capability
//! contract, and the storage error taxonomy.

pub mod error;
pub mod key;
pub mod record;
pub mod repository;

pub use error::{Result, StorageError};
pub use key::ShortKey;
pub use record::{BatchCreated, BatchItem, OwnedUrl, ShortRecord, Stats};
pub use repository::Repository;
