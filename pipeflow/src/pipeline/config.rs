//! Pipeline configuration.

use crate::errors::{PipeflowError, PipelineValidationError};
use serde::{Deserialize, Serialize};

/// How a stage's inputs are resolved when the previous stage forwarded too few values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArityPolicy {
    /// Missing positions are filled from the pipeline's original arguments.
    #[default]
    Fallback,
    /// The previous stage must forward exactly as many values as the stage declares.
    Exact,
}

/// Configuration for a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name used in diagnostics.
    pub name: String,
    /// Input resolution policy.
    pub arity_policy: ArityPolicy,
    /// Whether adjacent stage types are checked when the pipeline is built.
    pub validate_types: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "pipeline".to_string(),
            arity_policy: ArityPolicy::Fallback,
            validate_types: true,
        }
    }
}

impl PipelineConfig {
    /// Creates a config with the given name and default settings.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, PipeflowError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PipeflowError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the arity policy.
    #[must_use]
    pub fn with_arity_policy(mut self, policy: ArityPolicy) -> Self {
        self.arity_policy = policy;
        self
    }

    /// Enables or disables build-time type checks.
    #[must_use]
    pub fn with_type_validation(mut self, enabled: bool) -> Self {
        self.validate_types = enabled;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or whitespace-only.
    pub fn validate(&self) -> Result<(), PipelineValidationError> {
        if self.name.trim().is_empty() {
            return Err(PipelineValidationError::new(
                "Pipeline name cannot be empty or whitespace-only",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();

        assert_eq!(config.name, "pipeline");
        assert_eq!(config.arity_policy, ArityPolicy::Fallback);
        assert!(config.validate_types);
    }

    #[test]
    fn test_builder_setters() {
        let config = PipelineConfig::new("text")
            .with_arity_policy(ArityPolicy::Exact)
            .with_type_validation(false);

        assert_eq!(config.name, "text");
        assert_eq!(config.arity_policy, ArityPolicy::Exact);
        assert!(!config.validate_types);
    }

    #[test]
    fn test_from_json_with_defaults() {
        let config = PipelineConfig::from_json_str(r#"{"arity_policy": "exact"}"#).unwrap();

        assert_eq!(
            config,
            PipelineConfig::default().with_arity_policy(ArityPolicy::Exact)
        );
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = PipelineConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, PipeflowError::Serialization(_)));

        let err = PipelineConfig::from_json_str(r#"{"arity_policy": "lenient"}"#).unwrap_err();
        assert!(matches!(err, PipeflowError::Serialization(_)));
    }

    #[test]
    fn test_empty_name_is_invalid() {
        assert!(PipelineConfig::new("   ").validate().is_err());

        let err = PipelineConfig::from_json_str(r#"{"name": ""}"#).unwrap_err();
        assert!(matches!(err, PipeflowError::Validation(_)));
    }

    #[test]
    fn test_serialization_round_trip() {
        let config = PipelineConfig::new("cpf").with_type_validation(false);
        let json = serde_json::to_string(&config).unwrap();

        assert!(json.contains("\"arity_policy\":\"fallback\""));
        assert_eq!(PipelineConfig::from_json_str(&json).unwrap(), config);
    }
}
