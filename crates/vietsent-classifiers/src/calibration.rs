//! Sentiment calibration
//!
//! Combines the external classifier's label and confidence with the lexical
//! score. The lexical signal overrides the model when it is strong in
//! either direction; weak model output falls back to neutral only when the
//! lexical signal is also weak; otherwise the model label stands.
//!
//! Decision order (first match wins):
//! 1. `lexical >= positive_override` -> POSITIVE
//! 2. `lexical <= negative_override` -> NEGATIVE
//! 3. (model says NEUTRAL or `confidence < neutral_confidence_floor`)
//!    and `|lexical| < neutral_lexical_band` -> NEUTRAL
//! 4. the mapped model label
//!
//! Confidence: `clamp(confidence * model_weight + min(|lexical| * lexical_gain, lexical_cap), 0, 1)`.

use crate::labels::map_label;
use serde::{Deserialize, Serialize};
use vietsent_core::Sentiment;

/// Thresholds and weights for the calibration policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPolicy {
    #[serde(default = "default_positive_override")]
    pub positive_override: f64,

    #[serde(default = "default_negative_override")]
    pub negative_override: f64,

    #[serde(default = "default_neutral_confidence_floor")]
    pub neutral_confidence_floor: f64,

    #[serde(default = "default_neutral_lexical_band")]
    pub neutral_lexical_band: f64,

    #[serde(default = "default_model_weight")]
    pub model_weight: f64,

    #[serde(default = "default_lexical_gain")]
    pub lexical_gain: f64,

    #[serde(default = "default_lexical_cap")]
    pub lexical_cap: f64,
}

impl Default for CalibrationPolicy {
    fn default() -> Self {
        Self {
            positive_override: default_positive_override(),
            negative_override: default_negative_override(),
            neutral_confidence_floor: default_neutral_confidence_floor(),
            neutral_lexical_band: default_neutral_lexical_band(),
            model_weight: default_model_weight(),
            lexical_gain: default_lexical_gain(),
            lexical_cap: default_lexical_cap(),
        }
    }
}

fn default_positive_override() -> f64 {
    0.3
}

fn default_negative_override() -> f64 {
    -0.3
}

fn default_neutral_confidence_floor() -> f64 {
    0.55
}

fn default_neutral_lexical_band() -> f64 {
    0.15
}

fn default_model_weight() -> f64 {
    0.7
}

fn default_lexical_gain() -> f64 {
    4.0
}

fn default_lexical_cap() -> f64 {
    0.35
}

/// A jointly produced label and confidence.
///
/// Only [`Calibrator`] can construct one, so every sentiment/confidence pair
/// that leaves this crate went through the policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibrated {
    sentiment: Sentiment,
    confidence: f64,
}

impl Calibrated {
    pub fn sentiment(&self) -> Sentiment {
        self.sentiment
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// Final classification returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    text: String,
    sentiment: Sentiment,
    confidence: f64,
}

impl ClassificationResult {
    /// Attach the (trimmed) input text to a calibrated decision
    pub fn new(text: &str, calibrated: Calibrated) -> Self {
        Self {
            text: text.trim().to_string(),
            sentiment: calibrated.sentiment,
            confidence: calibrated.confidence,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sentiment(&self) -> Sentiment {
        self.sentiment
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// Applies a [`CalibrationPolicy`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Calibrator {
    policy: CalibrationPolicy,
}

impl Calibrator {
    pub fn new(policy: CalibrationPolicy) -> Self {
        Self { policy }
    }

    /// Calibrate a raw classifier label
    pub fn calibrate(&self, raw_label: &str, raw_confidence: f64, lexical_score: f64) -> Calibrated {
        self.calibrate_mapped(map_label(raw_label), raw_confidence, lexical_score)
    }

    /// Calibrate an already mapped model label
    pub fn calibrate_mapped(
        &self,
        model_label: Sentiment,
        raw_confidence: f64,
        lexical_score: f64,
    ) -> Calibrated {
        let confidence = sanitize(raw_confidence, 0.0, 1.0);
        let lexical = sanitize(lexical_score, -1.0, 1.0);

        Calibrated {
            sentiment: self.decide(model_label, confidence, lexical),
            confidence: self.blend_confidence(confidence, lexical),
        }
    }

    /// Decision used when the classifier failed or returned garbage: the
    /// model is treated as NEUTRAL with zero confidence and the lexical
    /// signal still goes through the regular policy.
    pub fn degraded(&self, lexical_score: f64) -> Calibrated {
        self.calibrate_mapped(Sentiment::Neutral, 0.0, lexical_score)
    }

    fn decide(&self, model_label: Sentiment, confidence: f64, lexical: f64) -> Sentiment {
        let policy = &self.policy;

        if lexical >= policy.positive_override {
            return Sentiment::Positive;
        }
        if lexical <= policy.negative_override {
            return Sentiment::Negative;
        }
        let weak_model =
            model_label == Sentiment::Neutral || confidence < policy.neutral_confidence_floor;
        if weak_model && lexical.abs() < policy.neutral_lexical_band {
            return Sentiment::Neutral;
        }
        model_label
    }

    /// Blend model confidence with lexical agreement
    pub fn blend_confidence(&self, raw_confidence: f64, lexical_score: f64) -> f64 {
        let policy = &self.policy;
        let boost = (lexical_score.abs() * policy.lexical_gain).min(policy.lexical_cap);
        (raw_confidence * policy.model_weight + boost).clamp(0.0, 1.0)
    }
}

/// Calibrate with the default policy, returning the bare pair
pub fn calibrate(raw_label: &str, raw_confidence: f64, lexical_score: f64) -> (Sentiment, f64) {
    let calibrated = Calibrator::default().calibrate(raw_label, raw_confidence, lexical_score);
    (calibrated.sentiment, calibrated.confidence)
}

fn sanitize(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(min, max)
    }
}
