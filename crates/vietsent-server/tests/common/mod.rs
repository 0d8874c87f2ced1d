//! Shared fixtures for service and API tests

#![allow(dead_code)]

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use vietsent_classifiers::{RawPrediction, SentimentAnalyzer, SentimentModel};
use vietsent_core::{Error, Result};
use vietsent_history::HistoryRepository;
use vietsent_server::{AppState, ClassificationService, ServerConfig};

/// Fixed-label model that counts its calls
pub struct MockModel {
    label: String,
    score: f32,
    calls: AtomicU32,
}

impl MockModel {
    pub fn new(label: &str, score: f32) -> Self {
        Self {
            label: label.to_string(),
            score,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SentimentModel for MockModel {
    async fn predict(&self, _text: &str) -> Result<RawPrediction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RawPrediction::new(self.label.clone(), self.score))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Model whose inference always fails
pub struct FailingModel;

#[async_trait]
impl SentimentModel for FailingModel {
    async fn predict(&self, _text: &str) -> Result<RawPrediction> {
        Err(Error::classifier_unavailable("simulated inference failure"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

pub fn service_with(
    model: Arc<dyn SentimentModel>,
    history: Arc<HistoryRepository>,
    min_text_length: usize,
) -> ClassificationService {
    ClassificationService::new(SentimentAnalyzer::new(model), history, min_text_length)
}

pub fn in_memory_service(model: Arc<dyn SentimentModel>, retain: i64) -> ClassificationService {
    service_with(
        model,
        Arc::new(HistoryRepository::open_in_memory(retain).unwrap()),
        4,
    )
}

/// State with a local (not globally installed) Prometheus recorder
pub fn app_state(service: ClassificationService) -> AppState {
    let handle = PrometheusBuilder::new().build_recorder().handle();
    AppState::new(Arc::new(service), handle, &ServerConfig::default())
}
