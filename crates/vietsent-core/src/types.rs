//! Core types for vietsent

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical sentiment label.
///
/// This is a closed set: nothing else is ever emitted externally or written
/// to storage. Raw model vocabularies are mapped onto it before any decision
/// is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// All labels, in a stable order
    pub const ALL: [Sentiment; 3] = [Self::Positive, Self::Neutral, Self::Negative];

    /// Storage/wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "POSITIVE",
            Self::Neutral => "NEUTRAL",
            Self::Negative => "NEGATIVE",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = Error;

    /// Parses the canonical names only (case-insensitive). Raw classifier
    /// vocabularies go through the label mapper instead.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "POSITIVE" => Ok(Self::Positive),
            "NEUTRAL" => Ok(Self::Neutral),
            "NEGATIVE" => Ok(Self::Negative),
            other => Err(Error::validation(format!("unknown sentiment label: {other}"))),
        }
    }
}

/// A persisted classification.
///
/// Created only by the history repository's append operation and never
/// updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Monotonically increasing id assigned at insertion
    pub id: i64,

    /// Trimmed input text
    pub text: String,

    /// Calibrated label
    pub sentiment: Sentiment,

    /// Calibrated confidence (0.0-1.0)
    pub confidence: f64,

    /// Insertion time (UTC)
    pub created_at: DateTime<Utc>,
}
