use ort::Error as OrtError;
use std::fmt;

/// Represents the different types of errors that can occur while detecting and explaining.
#[derive(Debug)]
pub enum ClassifierError {
    /// The model or tokenizer could not be loaded at startup
    LoadError(String),
    /// Error occurred while loading or using the tokenizer
    TokenizerError(String),
    /// Error occurred while running the ONNX model
    ModelError(String),
    /// Error occurred during the build phase
    BuildError(String),
    /// Error occurred while making predictions or scoring perturbations
    PredictionError(String),
    /// Error occurred due to invalid input parameters
    ValidationError(String),
    /// The input text was empty or contained only whitespace
    EmptyInput,
    /// The model produced a class index outside the fixed label table
    UnknownLabel(usize),
}

impl ClassifierError {
    /// Returns true for errors that leave the detector unable to serve any further request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::LoadError(_) | Self::UnknownLabel(_))
    }
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadError(msg) => write!(f, "Load error: {}", msg),
            Self::TokenizerError(msg) => write!(f, "Tokenizer error: {}", msg),
            Self::ModelError(msg) => write!(f, "Model error: {}", msg),
            Self::BuildError(msg) => write!(f, "Build error: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::EmptyInput => write!(f, "Input text cannot be empty"),
            Self::UnknownLabel(index) => write!(
                f,
                "Unknown label index {}: the model head does not match the Hateful/Normal/Offensive table",
                index
            ),
        }
    }
}

impl std::error::Error for ClassifierError {}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::ModelError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        assert!(ClassifierError::UnknownLabel(3).is_fatal());
        assert!(ClassifierError::LoadError("missing".into()).is_fatal());
        assert!(!ClassifierError::EmptyInput.is_fatal());
        assert!(!ClassifierError::ModelError("oops".into()).is_fatal());
    }

    #[test]
    fn test_display() {
        assert_eq!(ClassifierError::EmptyInput.to_string(), "Input text cannot be empty");
        assert!(ClassifierError::UnknownLabel(7).to_string().contains("7"));
    }
}
