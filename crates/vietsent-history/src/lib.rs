//! vietsent History
//!
//! Durable, append-only log of classifications with a retention bound.
//! Every append assigns an id and a UTC timestamp, then trims the log to the
//! configured number of most recent records in the same transaction.

pub mod persistence;

pub use persistence::{HistoryConfig, HistoryRepository};
