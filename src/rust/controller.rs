//! The interaction loop behind the detector's input box and predict button.

use rand::Rng;
use log::{info, warn};
use serde::Serialize;

use crate::classifier::{Category, ClassifierError, Prediction, TextScoring};
use crate::explain::{Explanation, Figure, TextExplainer};

/// What set the handler off. Both triggers run the same handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// The user finished editing the text field
    Edited(String),
    /// The user pressed predict on the current text
    Predict,
}

/// Everything shown for one prediction.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayResult {
    pub text: String,
    pub category: Category,
    pub emoji: &'static str,
    pub label: &'static str,
    /// Confidence in percent, rounded to two decimals
    pub confidence: f64,
    pub explanation: Explanation,
    #[serde(skip)]
    pub figure: Figure,
}

impl DisplayResult {
    pub fn summary(&self) -> String {
        // {:?} keeps the trailing ".0" on whole percentages
        format!("{}  {} with Confidence: {:?}%", self.emoji, self.label, self.confidence)
    }
}

#[derive(Debug, Clone, Default)]
pub enum State {
    #[default]
    Idle,
    Displaying(DisplayResult),
}

/// Result of handling one trigger.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A new result replaced whatever was shown before
    Displayed(DisplayResult),
    /// Nothing to classify; the display is unchanged
    Ignored,
    /// The interaction failed; the previous result, if any, stays on screen
    Failed(String),
}

/// Runs predict-and-explain for each trigger and keeps the last result.
///
/// The model is borrowed for the controller's lifetime; it is built once and
/// only read here.
pub struct Controller<'m, M: TextScoring + ?Sized, R: Rng> {
    model: &'m M,
    explainer: TextExplainer,
    rng: R,
    text: String,
    state: State,
}

impl<'m, M: TextScoring + ?Sized, R: Rng> Controller<'m, M, R> {
    pub fn new(model: &'m M, explainer: TextExplainer, rng: R) -> Self {
        Self {
            model,
            explainer,
            rng,
            text: String::new(),
            state: State::Idle,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// The current content of the text field.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The result on display, if any.
    pub fn current(&self) -> Option<&DisplayResult> {
        match &self.state {
            State::Displaying(result) => Some(result),
            State::Idle => None,
        }
    }

    /// Handles one trigger.
    ///
    /// Recoverable failures come back as `Outcome::Failed` and leave the display
    /// as it was. Only errors that make further interactions meaningless, such as
    /// a class index outside the label table, are returned as `Err`.
    pub fn handle(&mut self, trigger: Trigger) -> Result<Outcome, ClassifierError> {
        if let Trigger::Edited(text) = trigger {
            self.text = text;
        }

        let text = self.text.clone();
        match self.predict_and_explain(&text) {
            Ok(result) => {
                info!("{}", result.summary());
                self.state = State::Displaying(result.clone());
                Ok(Outcome::Displayed(result))
            }
            Err(ClassifierError::EmptyInput) => {
                info!("Ignoring empty input");
                Ok(Outcome::Ignored)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("Interaction failed: {}", e);
                Ok(Outcome::Failed(e.to_string()))
            }
        }
    }

    fn predict_and_explain(&mut self, text: &str) -> Result<DisplayResult, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::EmptyInput);
        }

        let prediction: Prediction = self.model.predict(text)?;
        let category = prediction.category()?;
        let explanation = self.explainer.explain_model(self.model, text, prediction.index, &mut self.rng)?;
        let figure = explanation.figure(category.label());

        Ok(DisplayResult {
            text: text.to_string(),
            category,
            emoji: category.emoji(),
            label: category.label(),
            confidence: prediction.confidence_percent(),
            explanation,
            figure,
        })
    }
}
