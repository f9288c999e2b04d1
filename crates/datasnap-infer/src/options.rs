//! Options controlling an analysis run.

use datasnap_model::SemanticType;
use regex::Regex;

use crate::error::{InferenceError, Result};

/// Default number of rows sampled per analysis.
pub const DEFAULT_SAMPLE_SIZE: usize = 1000;

/// Default confidence below which an inference is flagged for review.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// A user-supplied regex that votes for a semantic type.
#[derive(Debug, Clone)]
pub struct CustomPattern {
    pub name: String,
    pub semantic_type: SemanticType,
    regex: Regex,
}

impl CustomPattern {
    /// Compile a custom pattern.
    pub fn new(
        name: impl Into<String>,
        semantic_type: SemanticType,
        pattern: &str,
    ) -> Result<Self> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|e| InferenceError::InvalidPattern {
            name: name.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            name,
            semantic_type,
            regex,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

/// Options for [`crate::TypeInferenceEngine::analyze_data_types`].
#[derive(Debug, Clone)]
pub struct InferenceOptions {
    /// Number of rows to sample. Defaults to `min(1000, rows)`.
    pub sample_size: Option<usize>,

    /// Inferences below this confidence are flagged `needs_review`.
    pub confidence_threshold: f64,

    /// Score time, email, url, phone, currency, percentage, uuid and json.
    pub test_advanced_types: bool,

    /// Extra patterns competing with the built-in scorer of their type.
    pub custom_patterns: Vec<CustomPattern>,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            sample_size: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            test_advanced_types: true,
            custom_patterns: Vec::new(),
        }
    }
}

impl InferenceOptions {
    /// Set the sample size.
    #[must_use]
    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = Some(size);
        self
    }

    /// Set the review threshold.
    #[must_use]
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Enable or disable the advanced type scorers.
    #[must_use]
    pub fn with_advanced_types(mut self, enabled: bool) -> Self {
        self.test_advanced_types = enabled;
        self
    }

    /// Add a custom pattern for a semantic type.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::InvalidPattern`] if the regex does not compile.
    pub fn with_custom_pattern(
        mut self,
        name: impl Into<String>,
        semantic_type: SemanticType,
        pattern: &str,
    ) -> Result<Self> {
        self.custom_patterns
            .push(CustomPattern::new(name, semantic_type, pattern)?);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = InferenceOptions::default();
        assert_eq!(options.sample_size, None);
        assert!(options.test_advanced_types);
        assert!((options.confidence_threshold - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_custom_pattern() {
        let err = InferenceOptions::default()
            .with_custom_pattern("broken", SemanticType::String, "(unclosed")
            .unwrap_err();
        assert!(matches!(err, InferenceError::InvalidPattern { .. }));
    }
}
