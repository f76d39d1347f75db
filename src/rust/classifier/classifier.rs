use std::sync::Arc;
use ort::session::Session;

use super::encoding::Encoder;
use super::error::ClassifierError;
use super::inference::{score_in_chunks, SequenceLogits, TextScoring};
use super::prediction::ProbabilityDistribution;

/// A fine-tuned BERT hate speech classifier backed by ONNX Runtime.
///
/// # Thread Safety
///
/// This type is automatically `Send + Sync` because all of its fields are thread-safe:
/// - `String`, `Vec` and `usize` fields are `Send + Sync`
/// - `Encoder` and `Session` are wrapped in `Arc`
///
/// It is built once at startup and only read afterwards, so a single instance can be
/// handed to every interaction without locking.
///
/// ```rust,no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use hate_detector::{Classifier, BuiltinTokenizer, TextScoring};
///
/// let classifier = Classifier::builder()
///     .with_model_dir("final_fine_tuned_bert")?
///     .with_builtin_tokenizer(BuiltinTokenizer::BertBaseUncased)?
///     .build()?;
///
/// let prediction = classifier.predict("I love this community")?;
/// println!("class {} ({:.2}%)", prediction.index, prediction.confidence_percent());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Classifier {
    pub model_path: String,
    pub tokenizer_path: String,
    pub encoder: Arc<Encoder>,
    pub session: Arc<Session>,
    pub labels: Vec<String>,
    pub batch_size: usize,
    pub(crate) token_type_ids: bool,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl SequenceLogits for Classifier {
    fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    fn session(&self) -> &Session {
        &self.session
    }

    fn uses_token_type_ids(&self) -> bool {
        self.token_type_ids
    }
}

impl TextScoring for Classifier {
    /// Scores texts in chunks of `batch_size`, padding each chunk to its longest member.
    fn predict_proba(&self, texts: &[&str]) -> Result<Vec<ProbabilityDistribution>, ClassifierError> {
        score_in_chunks(texts, self.batch_size, |chunk| self.score_batch(chunk))
    }
}

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            num_labels: self.labels.len(),
            labels: self.labels.clone(),
            max_length: self.encoder.max_length(),
            batch_size: self.batch_size,
        }
    }

    /// Counts the tokens of `text` before truncation.
    pub fn count_tokens(&self, text: &str) -> Result<usize, ClassifierError> {
        self.encoder.count_tokens(text)
    }
}
