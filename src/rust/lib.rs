//! Hate speech detection with word-level explanations.
//!
//! A fine-tuned BERT classifier (exported to ONNX) labels a text as Hateful,
//! Normal or Offensive, and a local perturbation explainer shows which words
//! drove that label.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use hate_detector::{
//!     BuiltinTokenizer, Classifier, Controller, ExplainerConfig, ModelManager, Outcome,
//!     TextExplainer, Trigger,
//! };
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let manager = ModelManager::new_default()?;
//! let tokenizer = manager.ensure_tokenizer_downloaded(BuiltinTokenizer::BertBaseUncased).await?;
//!
//! let classifier = Classifier::builder()
//!     .with_model_dir("final_fine_tuned_bert")?
//!     .with_tokenizer_file(tokenizer)?
//!     .build()?;
//!
//! let explainer = TextExplainer::new(ExplainerConfig::default())?;
//! let mut controller = Controller::new(&classifier, explainer, StdRng::seed_from_u64(0));
//! if let Outcome::Displayed(result) = controller.handle(Trigger::Edited("I love this community".into()))? {
//!     println!("{}", result.summary());
//!     print!("{}", result.figure);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Sharing
//!
//! The classifier is read-only after it is built. Build it once and pass references
//! to whatever needs to score text; no global state is involved.

pub mod classifier;
pub mod config;
pub mod controller;
pub mod explain;
pub mod model_manager;
pub mod models;
pub mod repl;
mod runtime;

pub use classifier::{
    Category, Classifier, ClassifierBuilder, ClassifierError, ClassifierInfo, EncodedBatch, Encoder,
    Prediction, ProbabilityDistribution, TextScoring,
};
pub use config::{DetectorConfig, TokenizerSource};
pub use controller::{Controller, DisplayResult, Outcome, State, Trigger};
pub use explain::{Explanation, ExplainerConfig, FeatureSelection, Figure, TextExplainer, WordWeight};
pub use model_manager::{ModelManager, ModelError};
pub use models::{BuiltinTokenizer, TokenizerInfo};
pub use runtime::{OptimizationLevel, RuntimeConfig, create_session_builder};

pub fn init_logger() {
    env_logger::init();
}
