//! vietsent Core
//!
//! Types and error handling shared across the vietsent crates.
//!
//! This crate provides:
//! - The closed three-way [`Sentiment`] label set
//! - The persisted [`HistoryRecord`] shape
//! - The error taxonomy used by classification, storage and the service layer

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{HistoryRecord, Sentiment};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{HistoryRecord, Sentiment};
}
