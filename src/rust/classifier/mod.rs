mod error;
mod encoding;
mod inference;
mod prediction;
#[allow(clippy::module_inception)]
mod classifier;
pub mod builder;
mod utils;

pub use error::ClassifierError;
pub use encoding::{EncodedBatch, Encoder, DEFAULT_MAX_LENGTH};
pub use inference::TextScoring;
pub use prediction::{Category, Prediction, ProbabilityDistribution};
pub use classifier::Classifier;
pub use builder::{ClassifierBuilder, ModelConfig, DEFAULT_BATCH_SIZE};

#[cfg(test)]
pub(crate) use encoding::tests::WORD_LEVEL_TOKENIZER;

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file
    pub model_path: String,
    /// Path to the tokenizer file
    pub tokenizer_path: String,
    /// Number of classes in the model head
    pub num_labels: usize,
    /// Class names in head order
    pub labels: Vec<String>,
    /// Tokens seen by the model before truncation
    pub max_length: usize,
    /// Texts scored per forward pass
    pub batch_size: usize,
}
