//! Load-once handle to the configured sentiment model
//!
//! The handle is constructed explicitly and injected into whatever needs the
//! model. The first `predict` (or an explicit [`ModelHandle::get`]) loads the
//! model on a blocking thread; concurrent first callers wait on the same
//! load. The load runs on a task owned by the handle, so a caller that is
//! cancelled mid-load does not abandon it. A failed load is returned to that
//! caller and retried on the next call.

use crate::classifier::{RawPrediction, SentimentModel};
use crate::model_config::ModelSpec;
use crate::model_loader::load_model;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use vietsent_core::{Error, Result};

/// Function that builds a model from its spec
pub type ModelLoader = Arc<dyn Fn(&ModelSpec) -> Result<Arc<dyn SentimentModel>> + Send + Sync>;

pub struct ModelHandle {
    spec: ModelSpec,
    name: String,
    model: Arc<OnceCell<Arc<dyn SentimentModel>>>,
    loader: ModelLoader,
}

impl ModelHandle {
    /// Handle that loads `spec` with the default loader
    pub fn new(spec: ModelSpec) -> Self {
        Self::with_loader(spec, Arc::new(load_model))
    }

    /// Handle with a custom loader
    pub fn with_loader(spec: ModelSpec, loader: ModelLoader) -> Self {
        Self {
            name: spec.display_name(),
            spec,
            model: Arc::new(OnceCell::new()),
            loader,
        }
    }

    /// Handle around an already constructed model
    pub fn preloaded(model: Arc<dyn SentimentModel>) -> Self {
        let name = model.name().to_string();
        let spec = ModelSpec {
            name: name.clone(),
            ..ModelSpec::builtin()
        };
        Self {
            name,
            spec,
            model: Arc::new(OnceCell::new_with(Some(model))),
            loader: Arc::new(|spec: &ModelSpec| {
                Err(Error::internal(format!(
                    "preloaded handle for '{}' cannot reload",
                    spec.display_name()
                )))
            }),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    /// The loaded model, loading it on first use
    pub async fn get(&self) -> Result<Arc<dyn SentimentModel>> {
        if let Some(model) = self.model.get() {
            return Ok(Arc::clone(model));
        }

        let cell = Arc::clone(&self.model);
        let spec = self.spec.clone();
        let loader = Arc::clone(&self.loader);
        let name = self.name.clone();

        tokio::spawn(async move {
            cell.get_or_try_init(|| async move {
                tracing::info!(model = %name, "Loading sentiment model");
                tokio::task::spawn_blocking(move || loader(&spec))
                    .await
                    .map_err(|e| {
                        Error::classifier_unavailable(format!("model load task failed: {e}"))
                    })?
            })
            .await
            .cloned()
        })
        .await
        .map_err(|e| Error::classifier_unavailable(format!("model load task failed: {e}")))?
    }
}

#[async_trait]
impl SentimentModel for ModelHandle {
    async fn predict(&self, text: &str) -> Result<RawPrediction> {
        self.get().await?.predict(text).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
