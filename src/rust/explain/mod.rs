//! Local, perturbation-based explanations of text predictions.
//!
//! The explainer removes random subsets of words from the input, scores every
//! variant with the model, and fits a weighted linear surrogate on word presence.
//! The surrogate's coefficients tell how much each word pushed the probability of
//! the explained class up (positive) or down (negative) around this one input.
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use hate_detector::{ProbabilityDistribution, TextExplainer, ExplainerConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let explainer = TextExplainer::new(ExplainerConfig::default())?;
//! let mut rng = StdRng::seed_from_u64(7);
//! let explanation = explainer.explain(
//!     "you are lovely",
//!     |texts: &[&str]| Ok(texts.iter().map(|t| {
//!         let p = if t.contains("lovely") { 0.9 } else { 0.2 };
//!         ProbabilityDistribution::new(vec![(1.0 - p) / 2.0, p, (1.0 - p) / 2.0])
//!     }).collect()),
//!     1,
//!     &mut rng,
//! )?;
//! assert_eq!(explanation.as_list()[0].word, "lovely");
//! # Ok(())
//! # }
//! ```

mod render;
mod surrogate;
mod words;

use std::collections::HashMap;
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use serde::Serialize;
use log::{debug, info};

use crate::classifier::{ClassifierError, ProbabilityDistribution, TextScoring};

pub use render::Figure;
pub use words::{IndexedText, WordSplitter, DEFAULT_SPLIT_EXPRESSION};

/// How the explained words are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureSelection {
    /// Forward selection for up to 6 features, highest weights beyond that
    #[default]
    Auto,
    ForwardSelection,
    HighestWeights,
    /// Fit on every word of the text, then report the `num_features` largest weights
    All,
}

#[derive(Debug, Clone)]
pub struct ExplainerConfig {
    /// Maximum number of words in an explanation
    pub num_features: usize,
    /// Size of the perturbation neighbourhood, including the original text
    pub num_samples: usize,
    /// Width of the exponential kernel over distances in [0, 100]
    pub kernel_width: f64,
    pub feature_selection: FeatureSelection,
    /// Pattern separating words
    pub split_expression: String,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            num_features: 6,
            num_samples: 100,
            kernel_width: 25.0,
            feature_selection: FeatureSelection::Auto,
            split_expression: DEFAULT_SPLIT_EXPRESSION.to_string(),
        }
    }
}

/// One explained word and its signed weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordWeight {
    pub word: String,
    pub weight: f64,
}

/// Word importances for one class of one input.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    /// The class whose probability was explained
    pub target_label: usize,
    /// Explained words ordered by decreasing absolute weight
    pub words: Vec<WordWeight>,
    pub intercept: f64,
    /// Weighted R² of the surrogate on the neighbourhood
    pub score: f64,
    /// Surrogate prediction for the unperturbed text
    pub local_prediction: f64,
    /// Model probability of the target class for the unperturbed text
    pub model_prediction: f64,
}

impl Explanation {
    pub fn as_list(&self) -> &[WordWeight] {
        &self.words
    }

    pub fn as_map(&self) -> HashMap<String, f64> {
        self.words.iter().map(|w| (w.word.clone(), w.weight)).collect()
    }

    /// Renders the weights as a bar chart titled with the class name.
    pub fn figure(&self, class_name: &str) -> Figure {
        Figure::new(
            format!("Local explanation for class {}", class_name),
            self.words.iter().map(|w| (w.word.clone(), w.weight)).collect(),
        )
    }
}

/// Explains predictions of any scoring function over texts.
#[derive(Debug, Clone)]
pub struct TextExplainer {
    config: ExplainerConfig,
    splitter: WordSplitter,
}

impl TextExplainer {
    pub fn new(config: ExplainerConfig) -> Result<Self, ClassifierError> {
        if config.num_features == 0 {
            return Err(ClassifierError::ValidationError("Number of features must be positive".into()));
        }
        if config.num_samples == 0 {
            return Err(ClassifierError::ValidationError("Number of samples must be positive".into()));
        }
        if !(config.kernel_width > 0.0) {
            return Err(ClassifierError::ValidationError("Kernel width must be positive".into()));
        }
        let splitter = WordSplitter::new(&config.split_expression)?;
        Ok(Self { config, splitter })
    }

    pub fn config(&self) -> &ExplainerConfig {
        &self.config
    }

    /// Explains the model's probability for `target_label` on `text`.
    pub fn explain_model<M, R>(
        &self,
        model: &M,
        text: &str,
        target_label: usize,
        rng: &mut R,
    ) -> Result<Explanation, ClassifierError>
    where
        M: TextScoring + ?Sized,
        R: Rng + ?Sized,
    {
        self.explain(text, |texts: &[&str]| model.predict_proba(texts), target_label, rng)
    }

    /// Explains `scoring_fn`'s probability for `target_label` on `text`.
    ///
    /// `scoring_fn` receives the original text followed by `num_samples - 1`
    /// perturbed variants in a single batch and must return one distribution each.
    /// All randomness comes from `rng`; a seeded generator gives repeatable results.
    ///
    /// # Errors
    /// - `PredictionError` if the scores don't match the batch or lack `target_label`
    /// - Forwards all errors from `scoring_fn`
    pub fn explain<F, R>(
        &self,
        text: &str,
        mut scoring_fn: F,
        target_label: usize,
        rng: &mut R,
    ) -> Result<Explanation, ClassifierError>
    where
        F: FnMut(&[&str]) -> Result<Vec<ProbabilityDistribution>, ClassifierError>,
        R: Rng + ?Sized,
    {
        let indexed = IndexedText::new(text, &self.splitter);
        let num_words = indexed.num_words();
        let num_samples = self.config.num_samples;

        let mut data = Array2::<f64>::ones((num_samples, num_words));
        let mut variants = Vec::with_capacity(num_samples);
        variants.push(indexed.raw().to_string());
        if num_words > 0 {
            for i in 1..num_samples {
                let size = rng.gen_range(1..=num_words);
                let inactive = rand::seq::index::sample(rng, num_words, size).into_vec();
                for &word in &inactive {
                    data[[i, word]] = 0.0;
                }
                variants.push(indexed.inverse_removing(&inactive));
            }
        }

        let batch: Vec<&str> = variants.iter().map(String::as_str).collect();
        let distributions = scoring_fn(&batch)?;
        if distributions.len() != batch.len() {
            return Err(ClassifierError::PredictionError(format!(
                "Scoring returned {} distributions for {} texts", distributions.len(), batch.len()
            )));
        }
        let labels: Array1<f64> = distributions.iter()
            .map(|d| d.get(target_label).map(f64::from))
            .collect::<Option<_>>()
            .ok_or_else(|| ClassifierError::PredictionError(format!(
                "Label {} is outside the model's distribution", target_label
            )))?;
        let model_prediction = labels[0];

        if num_words == 0 {
            info!("No words to explain in the input, returning an empty explanation");
            return Ok(Explanation {
                target_label,
                words: Vec::new(),
                intercept: model_prediction,
                score: 1.0,
                local_prediction: model_prediction,
                model_prediction,
            });
        }

        let distances = surrogate::distances_to_original(data.view());
        let weights = distances.mapv(|d| surrogate::kernel(d, self.config.kernel_width));

        let num_features = self.config.num_features;
        let selection = match self.config.feature_selection {
            FeatureSelection::Auto if num_features <= 6 => FeatureSelection::ForwardSelection,
            FeatureSelection::Auto => FeatureSelection::HighestWeights,
            other => other,
        };
        let used = match selection {
            FeatureSelection::ForwardSelection => {
                surrogate::forward_selection(data.view(), labels.view(), weights.view(), num_features)?
            }
            FeatureSelection::HighestWeights => {
                surrogate::highest_weights(data.view(), labels.view(), weights.view(), num_features)?
            }
            _ => (0..num_words).collect(),
        };

        let x = data.select(Axis(1), &used);
        let fit = surrogate::weighted_ridge(x.view(), labels.view(), weights.view(), 1.0)?;
        let score = fit.score(x.view(), labels.view(), weights.view());
        let local_prediction = fit.predict_row(x.row(0));
        debug!("Intercept {:.4}", fit.intercept);
        debug!("Prediction_local {:.4}", local_prediction);
        debug!("Right {:.4}", model_prediction);

        let mut words: Vec<WordWeight> = used.iter()
            .zip(fit.coef.iter())
            .map(|(&feature, &weight)| WordWeight {
                word: indexed.word(feature).to_string(),
                weight,
            })
            .collect();
        words.sort_by(|a, b| b.weight.abs().total_cmp(&a.weight.abs()));
        words.truncate(num_features);

        info!(
            "Explained label {} with {} of {} words (R² {:.3})",
            target_label, words.len(), num_words, score
        );
        Ok(Explanation {
            target_label,
            words,
            intercept: fit.intercept,
            score,
            local_prediction,
            model_prediction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn keyword_scores(texts: &[&str]) -> Result<Vec<ProbabilityDistribution>, ClassifierError> {
        Ok(texts.iter()
            .map(|text| {
                let hate = if text.contains("hate") { 0.6 } else { 0.0 };
                let normal = if text.contains("love") { 0.3 } else { 0.0 };
                let raw = [0.1 + hate, 0.1 + normal, 0.1];
                let sum: f64 = raw.iter().sum();
                ProbabilityDistribution::new(raw.iter().map(|v| (v / sum) as f32).collect())
            })
            .collect())
    }

    #[test]
    fn test_signs_follow_evidence() {
        let explainer = TextExplainer::new(ExplainerConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let explanation = explainer
            .explain("I hate Mondays but love Fridays", keyword_scores, 0, &mut rng)
            .unwrap();
        let weights = explanation.as_map();
        assert_eq!(explanation.as_list()[0].word, "hate");
        assert!(weights["hate"] > 0.0);
        assert!(weights.get("love").map_or(true, |w| *w < 0.0));
        assert!(explanation.words.len() <= 6);
    }

    #[test]
    fn test_every_selection_respects_num_features() {
        let mut rng = StdRng::seed_from_u64(3);
        for selection in [FeatureSelection::All, FeatureSelection::HighestWeights, FeatureSelection::ForwardSelection] {
            let explainer = TextExplainer::new(ExplainerConfig {
                num_features: 2,
                feature_selection: selection,
                ..Default::default()
            }).unwrap();
            let explanation = explainer.explain("a b c d hate e f", keyword_scores, 0, &mut rng).unwrap();
            assert_eq!(explanation.words.len(), 2, "{:?}", selection);
            assert_eq!(explanation.words[0].word, "hate");
        }
    }

    #[test]
    fn test_scoring_length_mismatch() {
        let explainer = TextExplainer::new(ExplainerConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let result = explainer.explain(
            "some words here",
            |_: &[&str]| Ok(vec![ProbabilityDistribution::new(vec![1.0, 0.0, 0.0])]),
            0,
            &mut rng,
        );
        assert!(matches!(result, Err(ClassifierError::PredictionError(_))));
    }

    #[test]
    fn test_target_label_out_of_range() {
        let explainer = TextExplainer::new(ExplainerConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let result = explainer.explain("some words", keyword_scores, 5, &mut rng);
        assert!(matches!(result, Err(ClassifierError::PredictionError(_))));
    }

    #[test]
    fn test_invalid_config() {
        let config = ExplainerConfig { num_samples: 0, ..Default::default() };
        assert!(TextExplainer::new(config).is_err());
        let config = ExplainerConfig { num_features: 0, ..Default::default() };
        assert!(TextExplainer::new(config).is_err());
    }

    #[test]
    fn test_text_without_words() {
        let explainer = TextExplainer::new(ExplainerConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let explanation = explainer.explain("?!", keyword_scores, 1, &mut rng).unwrap();
        assert!(explanation.words.is_empty());
        assert_eq!(explanation.local_prediction, explanation.model_prediction);
    }

    #[test]
    fn test_highest_weights_selection() {
        let config = ExplainerConfig {
            num_features: 2,
            feature_selection: FeatureSelection::HighestWeights,
            ..Default::default()
        };
        let explainer = TextExplainer::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let explanation = explainer
            .explain("I hate Mondays but love Fridays", keyword_scores, 0, &mut rng)
            .unwrap();
        assert_eq!(explanation.words.len(), 2);
        assert_eq!(explanation.words[0].word, "hate");
    }
}
