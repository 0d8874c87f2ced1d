//! vietsent Classifiers
//!
//! Vietnamese sentiment classification: text normalization, a fixed lexicon
//! scorer, mapping of model label vocabularies, and the calibrator that
//! blends a model's output with the lexical signal.
//!
//! The model itself sits behind [`SentimentModel`]. A keyword model is built
//! in; BERT and DistilBERT checkpoints load through Candle with the
//! `ml-models` feature (on by default).

pub mod calibration;
pub mod classifier;
pub mod labels;
pub mod lexicon;
pub mod lexicon_model;
pub mod model_config;
pub mod model_loader;
pub mod provider;
pub mod sentiment;
pub mod text;

pub use calibration::{calibrate, Calibrated, CalibrationPolicy, ClassificationResult, Calibrator};
pub use classifier::{RawPrediction, SentimentModel};
pub use labels::map_label;
pub use lexicon::{lexical_score, Lexicon};
pub use lexicon_model::LexiconModel;
pub use model_config::{Architecture, InferenceConfig, ModelSource, ModelSpec};
pub use model_loader::load_model;
pub use provider::ModelHandle;
pub use sentiment::{Analysis, SentimentAnalyzer};
pub use text::{normalize_text, strip_accents};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::calibration::{Calibrator, ClassificationResult};
    pub use crate::classifier::{RawPrediction, SentimentModel};
    pub use crate::model_config::ModelSpec;
    pub use crate::provider::ModelHandle;
    pub use crate::sentiment::{Analysis, SentimentAnalyzer};
}
