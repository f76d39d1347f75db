use std::collections::HashMap;
use ndarray::{Array2, Ix2};
use ort::session::Session;
use ort::value::Tensor;
use log::debug;

use super::encoding::{EncodedBatch, Encoder};
use super::error::ClassifierError;
use super::prediction::{Prediction, ProbabilityDistribution};
use super::utils::softmax;

/// Anything that maps texts to class probability distributions.
///
/// This is the seam between the detector and its consumers: the controller and
/// the explainer only ever see a `TextScoring`, so a fine-tuned ONNX model and a
/// scripted test double are interchangeable.
pub trait TextScoring {
    /// Scores a batch of texts, returning one distribution per text in input order.
    fn predict_proba(&self, texts: &[&str]) -> Result<Vec<ProbabilityDistribution>, ClassifierError>;

    /// Returns the probability distribution for a single text.
    ///
    /// # Errors
    /// - `EmptyInput` if the text is empty or whitespace only
    /// - Forwards all errors from `predict_proba()`
    fn predict_distribution(&self, text: &str) -> Result<ProbabilityDistribution, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::EmptyInput);
        }
        self.predict_proba(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| ClassifierError::PredictionError("Model returned no distribution".into()))
    }

    /// Predicts the arg-max class of the text together with its probability.
    fn predict(&self, text: &str) -> Result<Prediction, ClassifierError> {
        self.predict_distribution(text)?.prediction()
    }
}

/// Runs an ONNX sequence-classification model over encoded batches.
///
/// The ONNX model is expected to:
/// - Accept `input_ids` and `attention_mask` (and optionally `token_type_ids`),
///   all of shape [batch_size, sequence_length]
/// - Output logits of shape [batch_size, num_labels], named `logits` or first
pub(crate) trait SequenceLogits {
    fn encoder(&self) -> &Encoder;

    fn session(&self) -> &Session;

    /// Whether the model declares a `token_type_ids` input
    fn uses_token_type_ids(&self) -> bool;

    /// Runs the forward pass. The session is only read, never updated.
    fn logits(&self, batch: &EncodedBatch) -> Result<Array2<f32>, ClassifierError> {
        let tensor = |array: &Array2<i64>, name: &str| {
            Tensor::from_array(array.clone())
                .map_err(|e| ClassifierError::ModelError(format!("Failed to create {} tensor: {}", name, e)))
        };

        let mut input_tensors = HashMap::new();
        input_tensors.insert("input_ids", tensor(&batch.input_ids, "input_ids")?);
        input_tensors.insert("attention_mask", tensor(&batch.attention_mask, "attention_mask")?);
        if self.uses_token_type_ids() {
            input_tensors.insert("token_type_ids", tensor(&batch.token_type_ids, "token_type_ids")?);
        }

        let outputs = self.session().run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
        let logits = match outputs.get("logits") {
            Some(value) => value,
            None => &outputs[0],
        };
        let view = logits.try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::ModelError(format!("Failed to extract logits: {}", e)))?;
        let logits = view.into_dimensionality::<Ix2>()
            .map_err(|e| ClassifierError::ModelError(format!("Logits must be two-dimensional: {}", e)))?
            .to_owned();

        if logits.nrows() != batch.batch_size() {
            return Err(ClassifierError::ModelError(format!(
                "Model returned {} rows for a batch of {}", logits.nrows(), batch.batch_size()
            )));
        }
        Ok(logits)
    }

    /// Tokenizes, runs the model and normalizes each row with softmax.
    fn score_batch(&self, texts: &[&str]) -> Result<Vec<ProbabilityDistribution>, ClassifierError> {
        let batch = self.encoder().encode_batch(texts)?;
        let logits = self.logits(&batch)?;
        debug!("Scored {} texts, logits shape {:?}", texts.len(), logits.shape());
        Ok(distributions_from_logits(&logits))
    }
}

/// One softmax distribution per logits row, in row order.
pub(crate) fn distributions_from_logits(logits: &Array2<f32>) -> Vec<ProbabilityDistribution> {
    logits.rows()
        .into_iter()
        .map(|row| ProbabilityDistribution::new(softmax(row).to_vec()))
        .collect()
}

/// Scores `texts` in consecutive chunks of at most `batch_size` and concatenates
/// the results in input order.
pub(crate) fn score_in_chunks<F>(
    texts: &[&str],
    batch_size: usize,
    mut score_chunk: F,
) -> Result<Vec<ProbabilityDistribution>, ClassifierError>
where
    F: FnMut(&[&str]) -> Result<Vec<ProbabilityDistribution>, ClassifierError>,
{
    let mut distributions = Vec::with_capacity(texts.len());
    for chunk in texts.chunks(batch_size.max(1)) {
        let scored = score_chunk(chunk)?;
        if scored.len() != chunk.len() {
            return Err(ClassifierError::PredictionError(format!(
                "Model returned {} distributions for a chunk of {}", scored.len(), chunk.len()
            )));
        }
        distributions.extend(scored);
    }
    Ok(distributions)
}

impl<T: TextScoring + ?Sized> TextScoring for &T {
    fn predict_proba(&self, texts: &[&str]) -> Result<Vec<ProbabilityDistribution>, ClassifierError> {
        (**self).predict_proba(texts)
    }
}

impl<T: TextScoring + ?Sized> TextScoring for std::sync::Arc<T> {
    fn predict_proba(&self, texts: &[&str]) -> Result<Vec<ProbabilityDistribution>, ClassifierError> {
        (**self).predict_proba(texts)
    }
}
