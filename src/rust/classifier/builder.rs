use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use ort::session::Session;
use serde::Deserialize;
use log::{info, error};

use super::error::ClassifierError;
use super::encoding::{Encoder, DEFAULT_MAX_LENGTH};
use super::classifier::Classifier;
use super::prediction::Category;
use crate::{BuiltinTokenizer, ModelManager, runtime::{RuntimeConfig, create_session_builder}};

/// Number of perturbed texts scored per forward pass by default.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// The subset of a Hugging Face `config.json` the detector cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub id2label: HashMap<String, String>,
    #[serde(default)]
    pub num_labels: Option<usize>,
}

impl ModelConfig {
    /// Number of classes declared by the config, if it declares any.
    pub fn declared_labels(&self) -> Option<usize> {
        self.num_labels.or_else(|| (!self.id2label.is_empty()).then(|| self.id2label.len()))
    }
}

/// A builder for loading a Classifier with a fluent interface.
#[derive(Default, Debug)]
pub struct ClassifierBuilder {
    model_path: Option<String>,
    tokenizer_path: Option<String>,
    session: Option<Session>,
    model_config: Option<ModelConfig>,
    max_length: Option<usize>,
    batch_size: Option<usize>,
    runtime_config: RuntimeConfig,
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution.
    /// Must be called before `with_model_dir` to take effect.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Sets the maximum number of tokens the model sees. Defaults to 180.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Sets how many texts are scored per forward pass. Defaults to 32.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Loads the fine-tuned model from a directory containing `model.onnx` and,
    /// optionally, a Hugging Face `config.json`.
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or a
    ///   `LoadError` if:
    ///   - A model is already set
    ///   - The directory or `model.onnx` is missing
    ///   - `config.json` cannot be parsed
    ///   - The session cannot be created or its structure is invalid
    pub fn with_model_dir<P: AsRef<Path>>(mut self, dir: P) -> Result<Self, ClassifierError> {
        if self.model_path.is_some() {
            return Err(ClassifierError::BuildError("Model path already set".to_string()));
        }

        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ClassifierError::LoadError(format!("Model directory not found: {}", dir.display())));
        }
        let model_path = dir.join("model.onnx");
        if !model_path.exists() {
            return Err(ClassifierError::LoadError(format!("Model file not found: {}", model_path.display())));
        }

        let config_path = dir.join("config.json");
        let model_config = if config_path.exists() {
            let reader = File::open(&config_path)
                .map_err(|e| ClassifierError::LoadError(format!("Failed to open model config: {}", e)))?;
            serde_json::from_reader::<_, ModelConfig>(reader)
                .map_err(|e| ClassifierError::LoadError(format!("Failed to parse model config: {}", e)))?
        } else {
            info!("No config.json next to the model, relying on the session signature");
            ModelConfig::default()
        };

        // Create session using the shared environment
        let session = create_session_builder(&self.runtime_config)
            .and_then(|builder| builder.commit_from_file(&model_path))
            .map_err(|e| {
                error!("Failed to load model: {}", e);
                ClassifierError::LoadError(format!("Failed to load model: {}", e))
            })?;

        Self::validate_model(&session, &model_config)?;
        info!("Model structure validated successfully");

        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.model_config = Some(model_config);
        self.session = Some(session);
        Ok(self)
    }

    /// Uses a `tokenizer.json` file on disk.
    pub fn with_tokenizer_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ClassifierError> {
        if self.tokenizer_path.is_some() {
            return Err(ClassifierError::BuildError("Tokenizer path already set".to_string()));
        }
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ClassifierError::BuildError("Tokenizer path cannot be empty".to_string()));
        }
        if !path.exists() {
            return Err(ClassifierError::LoadError(format!("Tokenizer file not found: {}", path.display())));
        }
        self.tokenizer_path = Some(path.to_string_lossy().to_string());
        Ok(self)
    }

    /// Uses a built-in tokenizer from the default cache. The tokenizer must have been
    /// fetched beforehand with `ModelManager::ensure_tokenizer_downloaded()`.
    pub fn with_builtin_tokenizer(self, tokenizer: BuiltinTokenizer) -> Result<Self, ClassifierError> {
        let manager = ModelManager::new_default()
            .map_err(|e| ClassifierError::LoadError(format!("Failed to create model manager: {}", e)))?;
        let path: PathBuf = manager.require_tokenizer(tokenizer).map_err(|_| {
            ClassifierError::LoadError(format!(
                "Tokenizer '{}' is not downloaded. Please download it first using ModelManager::ensure_tokenizer_downloaded()",
                tokenizer
            ))
        })?;
        self.with_tokenizer_file(path)
    }

    /// Builds the Classifier instance
    ///
    /// # Returns
    /// * `Result<Classifier, ClassifierError>` - The classifier if successful, or an error if:
    ///   - The model or tokenizer has not been set
    ///   - The tokenizer fails to load
    ///   - The batch size is zero
    pub fn build(mut self) -> Result<Classifier, ClassifierError> {
        let (model_path, tokenizer_path) = match (self.model_path.take(), self.tokenizer_path.take()) {
            (Some(model), Some(tokenizer)) => (model, tokenizer),
            _ => return Err(ClassifierError::BuildError("Model and tokenizer paths must be set".to_string())),
        };
        let session = self.session.take()
            .ok_or_else(|| ClassifierError::BuildError("No ONNX model loaded".into()))?;

        let batch_size = self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            return Err(ClassifierError::ValidationError("Batch size must be positive".into()));
        }

        let encoder = Encoder::from_file(&tokenizer_path, self.max_length.unwrap_or(DEFAULT_MAX_LENGTH))
            .map_err(|e| {
                error!("Failed to load tokenizer: {}", e);
                e
            })?;
        info!("Tokenizer loaded successfully (max length {})", encoder.max_length());

        let token_type_ids = session.inputs.iter().any(|input| input.name == "token_type_ids");
        let labels = Self::labels(self.model_config.as_ref());

        Ok(Classifier {
            model_path,
            tokenizer_path,
            encoder: Arc::new(encoder),
            session: Arc::new(session),
            labels,
            batch_size,
            token_type_ids,
        })
    }

    /// Class names in head order: from `id2label` when it is complete, otherwise the
    /// fixed detector table.
    fn labels(config: Option<&ModelConfig>) -> Vec<String> {
        let from_config = config.and_then(|config| {
            (0..config.id2label.len())
                .map(|i| config.id2label.get(&i.to_string()).cloned())
                .collect::<Option<Vec<_>>>()
        });
        match from_config {
            Some(labels) if labels.len() == Category::ALL.len() => labels,
            _ => Category::ALL.iter().map(|c| c.label().to_string()).collect(),
        }
    }

    /// Validates that the model has the expected input/output structure
    ///
    /// # Returns
    /// * `Result<(), ClassifierError>` - Ok if validation passes, or a `LoadError` if:
    ///   - The model doesn't have `input_ids` and `attention_mask` inputs
    ///   - The model doesn't have any output tensors
    ///   - The config or the output shape declares a head that is not 3-way
    fn validate_model(session: &Session, config: &ModelConfig) -> Result<(), ClassifierError> {
        for required in ["input_ids", "attention_mask"] {
            if !session.inputs.iter().any(|input| input.name == required) {
                return Err(ClassifierError::LoadError(format!("Model is missing the '{}' input", required)));
            }
        }

        let output = session.outputs.iter()
            .find(|output| output.name == "logits")
            .or_else(|| session.outputs.first())
            .ok_or_else(|| ClassifierError::LoadError("Model must have at least 1 output for logits".to_string()))?;

        let expected = Category::ALL.len();
        if let Some(declared) = config.declared_labels() {
            if declared != expected {
                return Err(ClassifierError::LoadError(format!(
                    "Model config declares {} labels, expected {}", declared, expected
                )));
            }
        }
        if let Some(&head) = output.output_type.tensor_dimensions().and_then(|dims| dims.last()) {
            if head > 0 && head as usize != expected {
                return Err(ClassifierError::LoadError(format!(
                    "Model head has {} outputs, expected {}", head, expected
                )));
            }
        }

        Ok(())
    }
}
