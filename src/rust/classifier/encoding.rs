use std::path::Path;
use std::str::FromStr;
use ndarray::Array2;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use log::debug;

use super::error::ClassifierError;

/// Default number of tokens the model sees; anything past it is dropped.
pub const DEFAULT_MAX_LENGTH: usize = 180;

/// Model-ready tensors for a batch of texts.
///
/// All rows share the length of the longest encoded text in the batch.
#[derive(Debug, Clone)]
pub struct EncodedBatch {
    pub input_ids: Array2<i64>,
    pub attention_mask: Array2<i64>,
    pub token_type_ids: Array2<i64>,
}

impl EncodedBatch {
    pub fn batch_size(&self) -> usize {
        self.input_ids.nrows()
    }

    pub fn sequence_length(&self) -> usize {
        self.input_ids.ncols()
    }
}

/// Wraps a tokenizer configured for padded, truncated batch encoding.
///
/// Truncation is lossy: tokens past `max_length` never reach the model, so two
/// texts that share their first `max_length` tokens encode identically.
#[derive(Debug, Clone)]
pub struct Encoder {
    tokenizer: Tokenizer,
    max_length: usize,
}

impl Encoder {
    pub fn new(mut tokenizer: Tokenizer, max_length: usize) -> Result<Self, ClassifierError> {
        if max_length == 0 {
            return Err(ClassifierError::ValidationError("Maximum sequence length must be positive".into()));
        }

        let pad_token = ["[PAD]", "<pad>"]
            .into_iter()
            .find(|token| tokenizer.token_to_id(token).is_some())
            .unwrap_or("[PAD]");
        let pad_id = tokenizer.token_to_id(pad_token).unwrap_or(0);

        tokenizer
            .with_padding(Some(PaddingParams {
                strategy: PaddingStrategy::BatchLongest,
                pad_id,
                pad_token: pad_token.to_string(),
                ..Default::default()
            }))
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| ClassifierError::TokenizerError(format!("Failed to configure truncation: {}", e)))?;

        Ok(Self { tokenizer, max_length })
    }

    pub fn from_file<P: AsRef<Path>>(path: P, max_length: usize) -> Result<Self, ClassifierError> {
        let tokenizer = Tokenizer::from_file(path.as_ref())
            .map_err(|e| ClassifierError::LoadError(format!("Failed to load tokenizer: {}", e)))?;
        Self::new(tokenizer, max_length)
    }

    /// Builds an encoder from the JSON serialization of a tokenizer.
    pub fn from_json(json: &str, max_length: usize) -> Result<Self, ClassifierError> {
        let tokenizer = Tokenizer::from_str(json)
            .map_err(|e| ClassifierError::LoadError(format!("Failed to parse tokenizer: {}", e)))?;
        Self::new(tokenizer, max_length)
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Counts the tokens of `text` before truncation, without special tokens.
    pub fn count_tokens(&self, text: &str) -> Result<usize, ClassifierError> {
        let mut tokenizer = self.tokenizer.clone();
        tokenizer
            .with_truncation(None)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;
        tokenizer.encode(text, false)
            .map(|encoding| encoding.get_ids().len())
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))
    }

    pub fn encode_batch(&self, texts: &[&str]) -> Result<EncodedBatch, ClassifierError> {
        if texts.is_empty() {
            return Err(ClassifierError::ValidationError("Cannot encode an empty batch".into()));
        }

        let encodings = self.tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| ClassifierError::TokenizerError(format!("Encoding failed: {}", e)))?;

        let rows = encodings.len();
        let cols = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
        debug!("Encoded batch of {} texts into {} tokens per row", rows, cols);

        let mut input_ids = Vec::with_capacity(rows * cols);
        let mut attention_mask = Vec::with_capacity(rows * cols);
        let mut token_type_ids = Vec::with_capacity(rows * cols);
        for encoding in &encodings {
            if encoding.get_ids().len() != cols {
                return Err(ClassifierError::TokenizerError("Batch rows were not padded to equal length".into()));
            }
            input_ids.extend(encoding.get_ids().iter().map(|&id| id as i64));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
            token_type_ids.extend(encoding.get_type_ids().iter().map(|&t| t as i64));
        }

        let shape = (rows, cols);
        let to_array = |data: Vec<i64>, name: &str| {
            Array2::from_shape_vec(shape, data)
                .map_err(|e| ClassifierError::TokenizerError(format!("Failed to create {} array: {}", name, e)))
        };

        Ok(EncodedBatch {
            input_ids: to_array(input_ids, "input_ids")?,
            attention_mask: to_array(attention_mask, "attention_mask")?,
            token_type_ids: to_array(token_type_ids, "token_type_ids")?,
        })
    }
}
