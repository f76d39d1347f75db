use std::path::{Path, PathBuf};
use rand::{rngs::StdRng, SeedableRng};

use crate::classifier::{Classifier, ClassifierError, DEFAULT_BATCH_SIZE, DEFAULT_MAX_LENGTH};
use crate::explain::{ExplainerConfig, TextExplainer};
use crate::model_manager::{ModelError, ModelManager};
use crate::models::BuiltinTokenizer;
use crate::runtime::RuntimeConfig;

/// Where the tokenizer comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizerSource {
    /// Fetched by identifier into the local cache
    Builtin(BuiltinTokenizer),
    /// A `tokenizer.json` already on disk
    File(PathBuf),
}

/// Everything needed to stand the detector up.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub model_dir: PathBuf,
    pub tokenizer: TokenizerSource,
    pub max_length: usize,
    pub batch_size: usize,
    pub explainer: ExplainerConfig,
    /// Seed for perturbation sampling; `None` draws one from the OS
    pub seed: Option<u64>,
    pub runtime: RuntimeConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("final_fine_tuned_bert"),
            tokenizer: TokenizerSource::Builtin(BuiltinTokenizer::BertBaseUncased),
            max_length: DEFAULT_MAX_LENGTH,
            batch_size: DEFAULT_BATCH_SIZE,
            explainer: ExplainerConfig::default(),
            seed: None,
            runtime: RuntimeConfig::default(),
        }
    }
}

impl DetectorConfig {
    /// Makes sure the tokenizer file is available locally and returns its path.
    pub async fn resolve_tokenizer(&self, manager: &ModelManager, fresh: bool) -> Result<PathBuf, ModelError> {
        match &self.tokenizer {
            TokenizerSource::File(path) => Ok(path.clone()),
            TokenizerSource::Builtin(tokenizer) => {
                if fresh {
                    log::info!("Fresh download requested - removing any cached tokenizer files...");
                    manager.remove_download(*tokenizer)?;
                }
                manager.ensure_tokenizer_downloaded(*tokenizer).await
            }
        }
    }

    /// Loads the classifier described by this configuration.
    pub fn load_classifier(&self, tokenizer_path: &Path) -> Result<Classifier, ClassifierError> {
        Classifier::builder()
            .with_runtime_config(self.runtime)
            .with_max_length(self.max_length)
            .with_batch_size(self.batch_size)
            .with_model_dir(&self.model_dir)?
            .with_tokenizer_file(tokenizer_path)?
            .build()
    }

    pub fn explainer(&self) -> Result<TextExplainer, ClassifierError> {
        TextExplainer::new(self.explainer.clone())
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
