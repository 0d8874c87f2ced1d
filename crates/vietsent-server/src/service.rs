//! Classification service
//!
//! Validates input, runs the analyzer and records every produced result in
//! history, degraded ones included. Storage failures reach the caller
//! together with the result that could not be recorded.

use crate::config::ServiceConfig;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info};
use vietsent_classifiers::{
    Calibrator, ClassificationResult, ModelHandle, SentimentAnalyzer, SentimentModel,
};
use vietsent_core::{Error, HistoryRecord, Result};
use vietsent_history::HistoryRepository;

/// Why a classification request did not complete
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Input rejected before any model or storage work
    #[error("{0}")]
    Validation(String),

    /// Text was classified but the result could not be recorded
    #[error("classification succeeded but was not recorded: {source}")]
    Persistence {
        result: ClassificationResult,
        #[source]
        source: Error,
    },
}

impl ClassifyError {
    /// Result computed before the failure, if any
    pub fn result(&self) -> Option<&ClassificationResult> {
        match self {
            ClassifyError::Validation(_) => None,
            ClassifyError::Persistence { result, .. } => Some(result),
        }
    }
}

/// A recorded classification
#[derive(Debug, Clone)]
pub struct Classified {
    pub result: ClassificationResult,

    /// History entry written for this result
    pub record: HistoryRecord,

    /// Set when the model output was replaced by the degraded decision
    pub warning: Option<String>,
}

pub struct ClassificationService {
    analyzer: SentimentAnalyzer,
    history: Arc<HistoryRepository>,
    min_text_length: usize,
}

impl ClassificationService {
    pub fn new(
        analyzer: SentimentAnalyzer,
        history: Arc<HistoryRepository>,
        min_text_length: usize,
    ) -> Self {
        Self {
            analyzer,
            history,
            min_text_length,
        }
    }

    /// Reject text shorter than the configured minimum
    pub fn validate(&self, text: &str) -> std::result::Result<(), ClassifyError> {
        if text.trim().chars().count() < self.min_text_length {
            return Err(ClassifyError::Validation(format!(
                "Câu quá ngắn! Hãy nhập tối thiểu {} ký tự.",
                self.min_text_length
            )));
        }
        Ok(())
    }

    /// Classify `text` and record the result
    pub async fn classify(&self, text: &str) -> std::result::Result<Classified, ClassifyError> {
        self.validate(text)?;

        let start = Instant::now();
        let analysis = self.analyzer.analyze(text).await;
        let result = analysis.result;

        metrics::counter!("vietsent_requests_total", "sentiment" => result.sentiment().as_str())
            .increment(1);

        let history = Arc::clone(&self.history);
        let (record_text, sentiment, confidence) =
            (result.text().to_string(), result.sentiment(), result.confidence());
        let appended = blocking(move || history.append(&record_text, sentiment, confidence)).await;

        metrics::histogram!("vietsent_classify_latency_us")
            .record(start.elapsed().as_micros() as f64);

        match appended {
            Ok(record) => {
                debug!(
                    id = record.id,
                    sentiment = %record.sentiment,
                    confidence = record.confidence,
                    degraded = analysis.degraded.is_some(),
                    "classification recorded"
                );
                Ok(Classified {
                    result,
                    record,
                    warning: analysis.degraded,
                })
            }
            Err(source) => {
                error!(error = %source, "failed to record classification");
                metrics::counter!("vietsent_storage_errors_total").increment(1);
                Err(ClassifyError::Persistence { result, source })
            }
        }
    }

    /// Most recent records, newest first
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        let history = Arc::clone(&self.history);
        blocking(move || history.list_recent(limit)).await
    }

    pub async fn clear(&self) -> Result<()> {
        let history = Arc::clone(&self.history);
        blocking(move || history.clear()).await?;
        info!("history cleared");
        Ok(())
    }

    pub async fn count(&self) -> Result<usize> {
        let history = Arc::clone(&self.history);
        blocking(move || history.count()).await
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::storage(format!("history task failed: {e}")))?
}

/// Analyzer over a lazily loaded model handle
pub fn build_analyzer(config: &ServiceConfig) -> (SentimentAnalyzer, Arc<ModelHandle>) {
    let handle = Arc::new(ModelHandle::new(config.model.clone()));
    let model: Arc<dyn SentimentModel> = handle.clone();
    let analyzer =
        SentimentAnalyzer::with_calibrator(model, Calibrator::new(config.calibration))
            .with_max_input_chars(config.model.inference.max_input_chars);
    (analyzer, handle)
}

/// Build the service and its model handle from configuration.
///
/// The model is not loaded here; the handle loads it on first use.
pub fn build_service(config: &ServiceConfig) -> Result<(ClassificationService, Arc<ModelHandle>)> {
    let history = Arc::new(HistoryRepository::open(&config.history)?);
    let (analyzer, handle) = build_analyzer(config);

    info!(
        model = %handle.name(),
        history = %config.history.path.display(),
        retain = config.history.retain,
        "classification service ready"
    );

    Ok((
        ClassificationService::new(analyzer, history, config.min_text_length),
        handle,
    ))
}
