//! Model loading for the configured sentiment model
//!
//! The builtin keyword model is always available. BERT and DistilBERT
//! sequence classifiers are loaded through Candle when the `ml-models`
//! feature is enabled.

use crate::classifier::SentimentModel;
use crate::lexicon_model::LexiconModel;
use crate::model_config::{ModelSource, ModelSpec};
use std::sync::Arc;
use vietsent_core::Result;

#[cfg(feature = "ml-models")]
pub use transformer::TransformerModel;

/// Load the model described by `spec`.
///
/// Blocking: may download weights and memory-map them. Async callers should
/// run it on a blocking thread.
pub fn load_model(spec: &ModelSpec) -> Result<Arc<dyn SentimentModel>> {
    match &spec.source {
        ModelSource::Builtin => {
            tracing::info!(model = %spec.display_name(), "Using builtin lexicon model");
            Ok(Arc::new(LexiconModel::with_name(spec.display_name())?))
        }
        _ => load_transformer(spec),
    }
}

#[cfg(feature = "ml-models")]
fn load_transformer(spec: &ModelSpec) -> Result<Arc<dyn SentimentModel>> {
    Ok(Arc::new(TransformerModel::load(spec)?))
}

#[cfg(not(feature = "ml-models"))]
fn load_transformer(spec: &ModelSpec) -> Result<Arc<dyn SentimentModel>> {
    Err(vietsent_core::Error::classifier_unavailable(format!(
        "model '{}' requires the ml-models feature",
        spec.display_name()
    )))
}

#[cfg(feature = "ml-models")]
mod transformer {
    use crate::classifier::{RawPrediction, SentimentModel};
    use crate::model_config::{Architecture, ModelSource, ModelSpec};
    use async_trait::async_trait;
    use candle_core::{DType, Device, IndexOp, Tensor, D};
    use candle_nn::{Linear, Module, VarBuilder};
    use candle_transformers::models::bert::{BertModel, Config as BertConfig};
    use candle_transformers::models::distilbert::{Config as DistilBertConfig, DistilBertModel};
    use hf_hub::{api::sync::Api, Repo, RepoType};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Instant;
    use tokenizers::{Tokenizer, TruncationDirection};
    use vietsent_core::{Error, Result};

    /// BERT-family sequence classifier
    pub struct TransformerModel {
        name: String,
        inner: Arc<Inference>,
    }

    struct Inference {
        tokenizer: Tokenizer,
        backbone: Backbone,
        classifier: Linear,
        device: Device,
        labels: Vec<String>,
        max_length: usize,
    }

    enum Backbone {
        Bert {
            model: BertModel,
            pooler: Option<Linear>,
        },
        DistilBert {
            model: DistilBertModel,
            pre_classifier: Option<Linear>,
        },
    }

    fn unavailable<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> Error {
        move |e| Error::classifier_unavailable(format!("{context}: {e}"))
    }

    impl TransformerModel {
        pub fn load(spec: &ModelSpec) -> Result<Self> {
            let model_path = resolve_model_path(&spec.source)?;
            let tokenizer = load_tokenizer(&model_path)?;

            let config_str = std::fs::read_to_string(model_path.join("config.json"))
                .map_err(unavailable("Failed to read config.json"))?;
            let config_json: serde_json::Value =
                serde_json::from_str(&config_str).map_err(unavailable("Failed to parse config.json"))?;

            let architecture = resolve_architecture(spec.architecture, &config_json)?;
            let labels = resolve_labels(&spec.labels, &config_json);

            let device = get_device(&spec.inference.device)?;
            let vb = load_var_builder(&model_path, &device)?;

            let (backbone, hidden_size) = match architecture {
                Architecture::DistilBert => {
                    let config: DistilBertConfig = serde_json::from_str(&config_str)
                        .map_err(unavailable("Failed to parse DistilBERT config"))?;
                    let hidden_size = config_json
                        .get("dim")
                        .or_else(|| config_json.get("hidden_size"))
                        .and_then(|v| v.as_u64())
                        .unwrap_or(768) as usize;

                    let model = DistilBertModel::load(vb.pp("distilbert"), &config)
                        .map_err(unavailable("Failed to load DistilBERT model"))?;
                    let pre_classifier = optional_linear(&vb, hidden_size, "pre_classifier");

                    (
                        Backbone::DistilBert {
                            model,
                            pre_classifier,
                        },
                        hidden_size,
                    )
                }
                Architecture::Bert | Architecture::Auto => {
                    let config: BertConfig = serde_json::from_str(&config_str)
                        .map_err(unavailable("Failed to parse BERT config"))?;
                    let hidden_size = config.hidden_size;

                    let model = BertModel::load(vb.pp("bert"), &config)
                        .map_err(unavailable("Failed to load BERT model"))?;
                    let pooler = optional_linear(&vb, hidden_size, "bert.pooler.dense");

                    (Backbone::Bert { model, pooler }, hidden_size)
                }
            };

            let classifier = load_classification_head(&vb, hidden_size, labels.len())?;

            tracing::info!(
                model = %spec.display_name(),
                ?architecture,
                ?labels,
                "Loaded transformer sentiment model"
            );

            Ok(Self {
                name: spec.display_name(),
                inner: Arc::new(Inference {
                    tokenizer,
                    backbone,
                    classifier,
                    device,
                    labels,
                    max_length: spec.inference.max_length,
                }),
            })
        }
    }

    #[async_trait]
    impl SentimentModel for TransformerModel {
        async fn predict(&self, text: &str) -> Result<RawPrediction> {
            let inner = Arc::clone(&self.inner);
            let text = text.to_string();
            tokio::task::spawn_blocking(move || inner.run(&text))
                .await
                .map_err(unavailable("Inference task failed"))?
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    impl Inference {
        fn run(&self, text: &str) -> Result<RawPrediction> {
            let start = Instant::now();

            let mut encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(unavailable("Tokenization failed"))?;
            encoding.truncate(self.max_length, 0, TruncationDirection::Right);

            let cls_embedding = match &self.backbone {
                Backbone::Bert { model, pooler } => {
                    let input_ids = Tensor::new(encoding.get_ids(), &self.device)
                        .and_then(|t| t.unsqueeze(0))
                        .map_err(unavailable("Failed to create input tensor"))?;
                    let token_type_ids = Tensor::new(encoding.get_type_ids(), &self.device)
                        .and_then(|t| t.unsqueeze(0))
                        .map_err(unavailable("Failed to create token type tensor"))?;

                    let hidden_states = model
                        .forward(&input_ids, &token_type_ids, None)
                        .map_err(unavailable("Model forward pass failed"))?;
                    let cls = first_token(&hidden_states)?;

                    match pooler {
                        Some(pooler) => pooler
                            .forward(&cls)
                            .and_then(|t| t.tanh())
                            .map_err(unavailable("Pooler failed"))?,
                        None => cls,
                    }
                }
                Backbone::DistilBert {
                    model,
                    pre_classifier,
                } => {
                    let input_ids: Vec<i64> =
                        encoding.get_ids().iter().map(|&x| x as i64).collect();
                    let input_ids = Tensor::new(input_ids.as_slice(), &self.device)
                        .and_then(|t| t.unsqueeze(0))
                        .map_err(unavailable("Failed to create input tensor"))?;

                    // DistilBERT expects 1 where attention is masked out
                    let mask_inverted: Vec<u8> = encoding
                        .get_attention_mask()
                        .iter()
                        .map(|&x| if x == 0 { 1u8 } else { 0u8 })
                        .collect();
                    let attention_mask = Tensor::new(mask_inverted.as_slice(), &self.device)
                        .and_then(|t| t.unsqueeze(0))
                        .map_err(unavailable("Failed to create attention mask"))?;

                    let hidden_states = model
                        .forward(&input_ids, &attention_mask)
                        .map_err(unavailable("Model forward pass failed"))?;
                    let cls = first_token(&hidden_states)?;

                    match pre_classifier {
                        Some(pre_classifier) => pre_classifier
                            .forward(&cls)
                            .and_then(|t| t.relu())
                            .map_err(unavailable("Pre-classifier failed"))?,
                        None => cls,
                    }
                }
            };

            let logits = self
                .classifier
                .forward(&cls_embedding)
                .map_err(unavailable("Classification head failed"))?;
            let probs: Vec<f32> = candle_nn::ops::softmax(&logits, D::Minus1)
                .and_then(|t| t.squeeze(0))
                .and_then(|t| t.to_vec1())
                .map_err(unavailable("Softmax failed"))?;

            let (label, score) = pick_top(&self.labels, &probs);
            let all_scores = self
                .labels
                .iter()
                .enumerate()
                .map(|(idx, label)| (label.clone(), probs.get(idx).copied().unwrap_or(0.0)))
                .collect();

            Ok(RawPrediction {
                label,
                score,
                all_scores,
                latency_us: start.elapsed().as_micros() as u64,
            })
        }
    }

    fn first_token(hidden_states: &Tensor) -> Result<Tensor> {
        hidden_states
            .i((0, 0, ..))
            .and_then(|t| t.unsqueeze(0))
            .map_err(unavailable("Failed to get CLS token"))
    }

    /// Highest-probability label and its score
    pub(super) fn pick_top(labels: &[String], probs: &[f32]) -> (String, f32) {
        let (max_idx, max_prob) = probs
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(idx, prob)| (idx, *prob))
            .unwrap_or((0, 0.0));

        let label = labels
            .get(max_idx)
            .cloned()
            .unwrap_or_else(|| format!("label_{max_idx}"));
        (label, max_prob)
    }

    pub(super) fn resolve_architecture(
        configured: Architecture,
        config_json: &serde_json::Value,
    ) -> Result<Architecture> {
        if configured != Architecture::Auto {
            return Ok(configured);
        }
        match config_json.get("model_type").and_then(|v| v.as_str()) {
            Some("distilbert") => Ok(Architecture::DistilBert),
            Some("bert") => Ok(Architecture::Bert),
            Some(other) => Err(Error::classifier_unavailable(format!(
                "unsupported model_type '{other}' (expected bert or distilbert)"
            ))),
            None => Err(Error::classifier_unavailable(
                "config.json has no model_type; set the architecture explicitly",
            )),
        }
    }

    /// Label names in output index order
    pub(super) fn resolve_labels(overrides: &[String], config_json: &serde_json::Value) -> Vec<String> {
        if !overrides.is_empty() {
            return overrides.to_vec();
        }

        let mut indexed: Vec<(usize, String)> = config_json
            .get("id2label")
            .and_then(|v| v.as_object())
            .map(|map| {
                map.iter()
                    .filter_map(|(idx, label)| {
                        Some((idx.parse::<usize>().ok()?, label.as_str()?.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        if !indexed.is_empty() {
            indexed.sort_by_key(|(idx, _)| *idx);
            return indexed.into_iter().map(|(_, label)| label).collect();
        }

        let num_labels = config_json
            .get("num_labels")
            .or_else(|| config_json.get("_num_labels"))
            .and_then(|v| v.as_u64())
            .unwrap_or(3) as usize;

        match num_labels {
            2 => vec!["negative".to_string(), "positive".to_string()],
            n => (0..n).map(|idx| format!("label_{idx}")).collect(),
        }
    }

    fn resolve_model_path(source: &ModelSource) -> Result<PathBuf> {
        match source {
            ModelSource::Local { path } => {
                if !path.exists() {
                    return Err(Error::classifier_unavailable(format!(
                        "Model path does not exist: {}",
                        path.display()
                    )));
                }
                Ok(path.clone())
            }
            ModelSource::HuggingFace { repo, revision } => download_from_huggingface(repo, revision),
            ModelSource::Builtin => Err(Error::classifier_unavailable(
                "builtin model has no weights to load",
            )),
        }
    }

    fn download_from_huggingface(repo: &str, revision: &str) -> Result<PathBuf> {
        tracing::info!(repo, revision, "Fetching model from HuggingFace");

        let api = Api::new().map_err(unavailable("Failed to initialize HuggingFace API"))?;
        let repo_obj = api.repo(Repo::with_revision(
            repo.to_string(),
            RepoType::Model,
            revision.to_string(),
        ));

        let config_path = repo_obj
            .get("config.json")
            .map_err(unavailable("Failed to download config.json"))?;
        repo_obj
            .get("model.safetensors")
            .map_err(unavailable("Failed to download model.safetensors"))?;
        if repo_obj.get("tokenizer.json").is_err() {
            tracing::debug!("tokenizer.json not found, trying vocab.txt");
            repo_obj
                .get("vocab.txt")
                .map_err(unavailable("No tokenizer found (tried tokenizer.json, vocab.txt)"))?;
        }

        let model_dir = config_path
            .parent()
            .ok_or_else(|| Error::classifier_unavailable("Invalid cache path"))?;

        tracing::info!("Model available at: {}", model_dir.display());
        Ok(model_dir.to_path_buf())
    }

    fn get_device(device: &str) -> Result<Device> {
        match device.to_lowercase().as_str() {
            "cuda" | "cuda:0" => Device::new_cuda(0).map_err(unavailable("Failed to initialize CUDA")),
            "mps" | "metal" => Device::new_metal(0).map_err(unavailable("Failed to initialize Metal")),
            _ => Ok(Device::Cpu),
        }
    }

    fn load_var_builder(model_path: &Path, device: &Device) -> Result<VarBuilder<'static>> {
        let weights_path = model_path.join("model.safetensors");
        if !weights_path.exists() {
            return Err(Error::classifier_unavailable(format!(
                "model.safetensors not found in {}",
                model_path.display()
            )));
        }

        // SAFETY: the weights file is not modified while mapped
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)
                .map_err(unavailable("Failed to load weights"))?
        };
        Ok(vb)
    }

    fn load_tokenizer(model_path: &Path) -> Result<Tokenizer> {
        let tokenizer_json_path = model_path.join("tokenizer.json");
        if tokenizer_json_path.exists() {
            return Tokenizer::from_file(&tokenizer_json_path)
                .map_err(unavailable("Failed to load tokenizer.json"));
        }

        let vocab_path = model_path.join("vocab.txt");
        if vocab_path.exists() {
            use tokenizers::models::wordpiece::WordPiece;
            use tokenizers::normalizers::BertNormalizer;
            use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
            use tokenizers::processors::bert::BertProcessing;

            let wordpiece = WordPiece::from_file(vocab_path.to_string_lossy().as_ref())
                .unk_token("[UNK]".to_string())
                .build()
                .map_err(unavailable("Failed to build WordPiece model"))?;

            let mut tokenizer = Tokenizer::new(wordpiece);
            tokenizer.with_normalizer(Some(BertNormalizer::default()));
            tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));
            tokenizer.with_post_processor(Some(BertProcessing::new(
                ("[SEP]".to_string(), 102),
                ("[CLS]".to_string(), 101),
            )));
            return Ok(tokenizer);
        }

        Err(Error::classifier_unavailable(format!(
            "No tokenizer found in {} (tried tokenizer.json, vocab.txt)",
            model_path.display()
        )))
    }

    /// Square projection the checkpoint may omit. Logits from a checkpoint
    /// without it are unreliable, so its absence is logged.
    pub(super) fn optional_linear(vb: &VarBuilder, hidden_size: usize, prefix: &str) -> Option<Linear> {
        match candle_nn::linear(hidden_size, hidden_size, vb.pp(prefix)) {
            Ok(linear) => Some(linear),
            Err(e) => {
                tracing::warn!(
                    layer = prefix,
                    error = %e,
                    "Checkpoint has no weights for layer, predictions may be unreliable"
                );
                None
            }
        }
    }

    fn load_classification_head(vb: &VarBuilder, hidden_size: usize, num_labels: usize) -> Result<Linear> {
        for prefix in ["classifier", "score"] {
            if let Ok(linear) = candle_nn::linear(hidden_size, num_labels, vb.pp(prefix)) {
                tracing::debug!(prefix, hidden_size, num_labels, "Loaded classification head");
                return Ok(linear);
            }
        }
        Err(Error::classifier_unavailable(format!(
            "No classification head with {num_labels} labels found (tried classifier, score)"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builtin_source_loads_lexicon_model() {
        let model = load_model(&ModelSpec::builtin()).unwrap();
        assert_eq!(model.name(), "builtin");

        let prediction = model.predict("tuyệt vời").await.unwrap();
        assert_eq!(prediction.label, "positive");
    }

    #[test]
    fn test_missing_local_model_is_unavailable() {
        let spec = ModelSpec {
            source: ModelSource::Local {
                path: "/nonexistent/vietsent-model".into(),
            },
            ..ModelSpec::builtin()
        };
        let err = load_model(&spec).err().unwrap();
        assert!(matches!(err, vietsent_core::Error::ClassifierUnavailable(_)));
    }

    #[cfg(feature = "ml-models")]
    mod transformer_helpers {
        use super::super::transformer::{
            optional_linear, pick_top, resolve_architecture, resolve_labels,
        };
        use crate::model_config::Architecture;
        use candle_core::{DType, Device};
        use candle_nn::VarBuilder;
        use serde_json::json;
        use std::collections::HashMap;

        #[test]
        fn test_missing_optional_layer_is_none() {
            let empty = VarBuilder::from_tensors(HashMap::new(), DType::F32, &Device::Cpu);
            assert!(optional_linear(&empty, 8, "pre_classifier").is_none());

            let zeros = VarBuilder::zeros(DType::F32, &Device::Cpu);
            assert!(optional_linear(&zeros, 8, "pre_classifier").is_some());
        }

        #[test]
        fn test_labels_follow_id2label_order() {
            let config = json!({
                "id2label": {"2": "negative", "0": "positive", "1": "neutral"}
            });
            assert_eq!(resolve_labels(&[], &config), vec!["positive", "neutral", "negative"]);
        }

        #[test]
        fn test_label_override_wins() {
            let config = json!({"id2label": {"0": "LABEL_0"}});
            let overrides = vec!["NEG".to_string(), "POS".to_string()];
            assert_eq!(resolve_labels(&overrides, &config), overrides);
        }

        #[test]
        fn test_labels_without_id2label() {
            assert_eq!(resolve_labels(&[], &json!({"num_labels": 2})), vec!["negative", "positive"]);
            assert_eq!(resolve_labels(&[], &json!({})), vec!["label_0", "label_1", "label_2"]);
        }

        #[test]
        fn test_architecture_detection() {
            assert_eq!(
                resolve_architecture(Architecture::Auto, &json!({"model_type": "distilbert"})).unwrap(),
                Architecture::DistilBert
            );
            assert_eq!(
                resolve_architecture(Architecture::Bert, &json!({"model_type": "distilbert"})).unwrap(),
                Architecture::Bert
            );
            assert!(resolve_architecture(Architecture::Auto, &json!({"model_type": "t5"})).is_err());
        }

        #[test]
        fn test_pick_top() {
            let labels = vec!["positive".to_string(), "neutral".to_string(), "negative".to_string()];
            let (label, score) = pick_top(&labels, &[0.1, 0.2, 0.7]);
            assert_eq!(label, "negative");
            assert!((score - 0.7).abs() < 1e-6);

            let (label, _) = pick_top(&labels[..1], &[0.4, 0.6]);
            assert_eq!(label, "label_1");
        }
    }
}
