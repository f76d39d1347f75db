use std::fmt;
use serde::Serialize;

use super::error::ClassifierError;
use super::utils::argmax;

/// Class probabilities for one text, in model head order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityDistribution(Vec<f32>);

impl ProbabilityDistribution {
    pub fn new(probabilities: Vec<f32>) -> Self {
        Self(probabilities)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.0.get(index).copied()
    }

    /// The arg-max class and its probability.
    pub fn prediction(&self) -> Result<Prediction, ClassifierError> {
        argmax(&self.0)
            .map(|(index, confidence)| Prediction { index, confidence })
            .ok_or_else(|| ClassifierError::PredictionError("Empty probability distribution".into()))
    }
}

/// The arg-max class index together with its probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub index: usize,
    pub confidence: f32,
}

impl Prediction {
    pub fn category(&self) -> Result<Category, ClassifierError> {
        Category::from_index(self.index)
    }

    /// Confidence as a percentage rounded to two decimals.
    pub fn confidence_percent(&self) -> f64 {
        (self.confidence as f64 * 100.0 * 100.0).round() / 100.0
    }
}

/// The fixed label table of the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Hateful,
    Normal,
    Offensive,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Hateful, Category::Normal, Category::Offensive];

    pub fn from_index(index: usize) -> Result<Self, ClassifierError> {
        Self::ALL.get(index)
            .copied()
            .ok_or(ClassifierError::UnknownLabel(index))
    }

    pub fn index(self) -> usize {
        match self {
            Self::Hateful => 0,
            Self::Normal => 1,
            Self::Offensive => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hateful => "Hateful",
            Self::Normal => "Normal",
            Self::Offensive => "Offensive",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Hateful => "😡",
            Self::Normal => "😊",
            Self::Offensive => "😠",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
