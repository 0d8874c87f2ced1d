//! External sentiment model trait and common types

use async_trait::async_trait;
use std::sync::Arc;
use vietsent_core::{Error, Result};

/// Trait for sentiment models whose raw output feeds the calibrator
#[async_trait]
pub trait SentimentModel: Send + Sync {
    /// Run inference on already normalized text
    async fn predict(&self, text: &str) -> Result<RawPrediction>;

    /// Get the model name
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: SentimentModel + ?Sized> SentimentModel for Arc<T> {
    async fn predict(&self, text: &str) -> Result<RawPrediction> {
        (**self).predict(text).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Uncalibrated model output
#[derive(Debug, Clone)]
pub struct RawPrediction {
    /// Label in the model's own vocabulary
    pub label: String,

    /// Probability of `label` (0.0-1.0)
    pub score: f32,

    /// All class scores, in model label order
    pub all_scores: Vec<(String, f32)>,

    /// Latency in microseconds
    pub latency_us: u64,
}

impl RawPrediction {
    /// Create a new prediction
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
            all_scores: Vec::new(),
            latency_us: 0,
        }
    }

    /// Reject output the calibrator cannot use
    pub fn validate(&self) -> Result<()> {
        if !self.score.is_finite() || !(0.0..=1.0).contains(&self.score) {
            return Err(Error::classifier_unavailable(format!(
                "model returned unusable score {} for label '{}'",
                self.score, self.label
            )));
        }
        if self.label.trim().is_empty() {
            return Err(Error::classifier_unavailable("model returned an empty label"));
        }
        Ok(())
    }
}
