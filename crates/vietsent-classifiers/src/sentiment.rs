//! Normalize, infer, score and calibrate
//!
//! [`SentimentAnalyzer`] is the classification pipeline without validation
//! or persistence. Model failures never escape it: they are logged, counted
//! and replaced by the calibrator's degraded decision.

use crate::calibration::{Calibrator, ClassificationResult};
use crate::classifier::SentimentModel;
use crate::lexicon::lexical_score;
use crate::text::normalize_text;
use std::sync::Arc;
use std::time::Instant;
use vietsent_core::Result;

/// Longest input passed to the model, in characters
pub const DEFAULT_MAX_INPUT_CHARS: usize = 512;

/// Outcome of one analysis
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Calibrated result
    pub result: ClassificationResult,

    /// Model label before mapping, absent in the degraded path
    pub raw_label: Option<String>,

    /// Lexical score of the normalized text
    pub lexical_score: f64,

    /// Why the model output was discarded, if it was
    pub degraded: Option<String>,
}

impl Analysis {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

pub struct SentimentAnalyzer {
    model: Arc<dyn SentimentModel>,
    calibrator: Calibrator,
    max_input_chars: usize,
}

impl SentimentAnalyzer {
    pub fn new(model: Arc<dyn SentimentModel>) -> Self {
        Self::with_calibrator(model, Calibrator::default())
    }

    pub fn with_calibrator(model: Arc<dyn SentimentModel>, calibrator: Calibrator) -> Self {
        Self {
            model,
            calibrator,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars.max(1);
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Classify `text`. Always produces a result.
    pub async fn analyze(&self, text: &str) -> Analysis {
        let start = Instant::now();
        let normalized = normalize_text(text);
        let lexical = lexical_score(&normalized);
        let model_input = truncate_chars(&normalized, self.max_input_chars);

        let analysis = match self.predict(model_input).await {
            Ok((label, score)) => {
                let calibrated = self.calibrator.calibrate(&label, score, lexical);
                Analysis {
                    result: ClassificationResult::new(text, calibrated),
                    raw_label: Some(label),
                    lexical_score: lexical,
                    degraded: None,
                }
            }
            Err(e) => {
                tracing::warn!(
                    model = %self.model.name(),
                    error = %e,
                    "sentiment model failed, using degraded calibration"
                );
                metrics::counter!("vietsent_degraded_total").increment(1);

                Analysis {
                    result: ClassificationResult::new(text, self.calibrator.degraded(lexical)),
                    raw_label: None,
                    lexical_score: lexical,
                    degraded: Some(e.to_string()),
                }
            }
        };

        tracing::debug!(
            sentiment = %analysis.result.sentiment(),
            confidence = analysis.result.confidence(),
            lexical,
            elapsed_us = start.elapsed().as_micros() as u64,
            "analyzed text"
        );
        analysis
    }

    async fn predict(&self, model_input: &str) -> Result<(String, f64)> {
        let prediction = self.model.predict(model_input).await?;
        prediction.validate()?;
        Ok((prediction.label, f64::from(prediction.score)))
    }
}

/// Prefix of at most `max_chars` characters
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::RawPrediction;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use vietsent_core::{Error, Sentiment};

    struct FixedModel {
        label: &'static str,
        score: f32,
        seen: Mutex<Vec<String>>,
    }

    impl FixedModel {
        fn new(label: &'static str, score: f32) -> Self {
            Self {
                label,
                score,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SentimentModel for FixedModel {
        async fn predict(&self, text: &str) -> Result<RawPrediction> {
            self.seen.lock().push(text.to_string());
            Ok(RawPrediction::new(self.label, self.score))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct BrokenModel;

    #[async_trait]
    impl SentimentModel for BrokenModel {
        async fn predict(&self, _text: &str) -> Result<RawPrediction> {
            Err(Error::classifier_unavailable("out of memory"))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("đẹp quá", 3), "đẹp");
        assert_eq!(truncate_chars("vui", 10), "vui");
        assert_eq!(truncate_chars("", 1), "");
    }

    #[tokio::test]
    async fn test_model_sees_normalized_text() {
        let model = Arc::new(FixedModel::new("neutral", 0.9));
        let analyzer = SentimentAnalyzer::new(model.clone());

        analyzer.analyze("  Hok   biet  ").await;
        assert_eq!(model.seen.lock().as_slice(), ["không biết"]);
    }

    #[tokio::test]
    async fn test_model_input_is_truncated() {
        let model = Arc::new(FixedModel::new("neutral", 0.9));
        let analyzer = SentimentAnalyzer::new(model.clone()).with_max_input_chars(512);

        let long = "á".repeat(600);
        analyzer.analyze(&long).await;
        assert_eq!(model.seen.lock()[0].chars().count(), 512);
    }

    #[tokio::test]
    async fn test_result_keeps_trimmed_original_text() {
        let analyzer = SentimentAnalyzer::new(Arc::new(FixedModel::new("positive", 0.9)));
        let analysis = analyzer.analyze("  Hok biet  ").await;
        assert_eq!(analysis.result.text(), "Hok biet");
        assert_eq!(analysis.raw_label.as_deref(), Some("positive"));
        assert!(!analysis.is_degraded());
    }

    #[tokio::test]
    async fn test_failing_model_degrades_to_neutral() {
        let analyzer = SentimentAnalyzer::new(Arc::new(BrokenModel));
        let analysis = analyzer.analyze("Bình thường").await;

        assert!(analysis.is_degraded());
        assert_eq!(analysis.result.sentiment(), Sentiment::Neutral);
        assert_eq!(analysis.result.confidence(), 0.0);
        assert!(analysis.degraded.unwrap().contains("out of memory"));
    }

    #[tokio::test]
    async fn test_unusable_score_degrades() {
        let analyzer = SentimentAnalyzer::new(Arc::new(FixedModel::new("positive", f32::NAN)));
        let analysis = analyzer.analyze("Bình thường").await;
        assert!(analysis.is_degraded());
        assert_eq!(analysis.result.sentiment(), Sentiment::Neutral);
    }

    #[test]
    fn test_model_failures_and_unknown_labels_are_counted() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();

        let broken = SentimentAnalyzer::new(Arc::new(BrokenModel));
        let healthy = SentimentAnalyzer::new(Arc::new(FixedModel::new("positive", 0.9)));
        let unknown = SentimentAnalyzer::new(Arc::new(FixedModel::new("joy", 0.9)));

        metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                broken.analyze("Bình thường").await;
                broken.analyze("vui quá").await;
                healthy.analyze("Bình thường").await;
                unknown.analyze("Bình thường").await;
            })
        });

        let rendered = handle.render();
        assert!(rendered.contains("vietsent_degraded_total 2"), "{rendered}");
        assert!(rendered.contains("vietsent_unknown_labels_total 1"), "{rendered}");
    }

    #[tokio::test]
    async fn test_degraded_path_still_honors_lexical_override() {
        let analyzer = SentimentAnalyzer::new(Arc::new(BrokenModel));
        let analysis = analyzer.analyze("vui quá").await;
        // vui qua: one positive token in two
        assert_eq!(analysis.result.sentiment(), Sentiment::Positive);
        assert!((analysis.result.confidence() - 0.35).abs() < 1e-9);
    }
}
