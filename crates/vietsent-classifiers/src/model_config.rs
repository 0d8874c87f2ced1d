//! Sentiment model configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Model used when nothing else is configured
pub const DEFAULT_MODEL: &str = "lxyuan/distilbert-base-multilingual-cased-sentiments-student";

/// Identifier selecting the built-in keyword model
pub const BUILTIN_MODEL: &str = "builtin";

/// Configuration for the external sentiment model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Model name, used in logs and responses
    #[serde(default)]
    pub name: String,

    /// Where to load the model from
    pub source: ModelSource,

    /// Backbone architecture
    #[serde(default)]
    pub architecture: Architecture,

    /// Inference settings
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Label names overriding the model's `id2label`
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Model source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModelSource {
    /// Keyword model compiled into the binary
    Builtin,

    /// Load from local filesystem
    Local { path: PathBuf },

    /// Download from HuggingFace Hub
    HuggingFace {
        repo: String,
        #[serde(default = "default_revision")]
        revision: String,
    },
}

fn default_revision() -> String {
    "main".to_string()
}

/// Transformer backbone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Architecture {
    /// Read `model_type` from the model's config.json
    #[default]
    Auto,
    Bert,
    #[serde(alias = "distilbert")]
    DistilBert,
}

/// Inference configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Device to run on (cpu, cuda, metal)
    #[serde(default = "default_device")]
    pub device: String,

    /// Maximum sequence length in tokens
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Input is cut to this many characters before tokenization
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_max_length() -> usize {
    512
}

fn default_max_input_chars() -> usize {
    crate::sentiment::DEFAULT_MAX_INPUT_CHARS
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            max_length: default_max_length(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self::from_identifier(DEFAULT_MODEL)
    }
}

impl ModelSpec {
    /// Build a spec from a bare identifier.
    ///
    /// `builtin` selects the keyword model, an existing directory is loaded
    /// from disk, anything else is treated as a HuggingFace repo id.
    pub fn from_identifier(identifier: &str) -> Self {
        let identifier = identifier.trim();
        let source = match identifier {
            BUILTIN_MODEL | "lexicon" => ModelSource::Builtin,
            path if Path::new(path).is_dir() => ModelSource::Local {
                path: PathBuf::from(path),
            },
            repo => ModelSource::HuggingFace {
                repo: repo.to_string(),
                revision: default_revision(),
            },
        };

        Self {
            name: identifier.to_string(),
            source,
            architecture: Architecture::Auto,
            inference: InferenceConfig::default(),
            labels: Vec::new(),
        }
    }

    /// The builtin keyword model
    pub fn builtin() -> Self {
        Self::from_identifier(BUILTIN_MODEL)
    }

    /// Name for logs, falling back to the source
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        match &self.source {
            ModelSource::Builtin => BUILTIN_MODEL.to_string(),
            ModelSource::Local { path } => path.display().to_string(),
            ModelSource::HuggingFace { repo, .. } => repo.clone(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.source, ModelSource::Builtin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_multilingual_distilbert() {
        let spec = ModelSpec::default();
        assert_eq!(
            spec.source,
            ModelSource::HuggingFace {
                repo: DEFAULT_MODEL.to_string(),
                revision: "main".to_string()
            }
        );
        assert_eq!(spec.inference.max_length, 512);
    }

    #[test]
    fn test_builtin_identifier() {
        assert!(ModelSpec::from_identifier("builtin").is_builtin());
        assert!(ModelSpec::from_identifier(" lexicon ").is_builtin());
    }

    #[test]
    fn test_existing_directory_is_local() {
        let dir = std::env::temp_dir();
        let spec = ModelSpec::from_identifier(dir.to_str().unwrap());
        assert!(matches!(spec.source, ModelSource::Local { .. }));
    }

    #[test]
    fn test_parse_huggingface_spec() {
        let yaml = r#"
name: "phobert-sentiment"
source:
  type: huggingface
  repo: "wonrax/phobert-base-vietnamese-sentiment"
architecture: bert
inference:
  device: "cpu"
  max_length: 256
labels: [NEG, POS, NEU]
"#;

        let spec: ModelSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.architecture, Architecture::Bert);
        assert_eq!(spec.inference.max_length, 256);
        assert_eq!(spec.labels.len(), 3);
        match &spec.source {
            ModelSource::HuggingFace { revision, .. } => assert_eq!(revision, "main"),
            other => panic!("Expected huggingface source, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_local_and_builtin_sources() {
        let yaml = r#"
source:
  type: local
  path: "./models/sentiment"
architecture: distilbert
"#;
        let spec: ModelSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.architecture, Architecture::DistilBert);
        assert_eq!(spec.display_name(), "./models/sentiment");

        let spec: ModelSpec = serde_yaml::from_str("source:\n  type: builtin\n").unwrap();
        assert!(spec.is_builtin());
        assert_eq!(spec.architecture, Architecture::Auto);
    }
}
