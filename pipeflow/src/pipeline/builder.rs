//! Pipeline builder with validation.

use super::{ArityPolicy, Pipeline, PipelineConfig};
use crate::core::Value;
use crate::errors::PipelineValidationError;
use crate::observability::{NoOpTracingEmitter, TracingEmitter};
use crate::stages::{BoxedStage, IntoStage};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Candidate {
    Stage(BoxedStage),
    Erased(Value),
}

/// Builder for creating validated pipelines.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    candidates: Vec<Candidate>,
    emitter: Arc<dyn TracingEmitter>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::with_config(PipelineConfig::default())
    }
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(PipelineConfig::new(name))
    }

    /// Creates a builder from an existing configuration.
    #[must_use]
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            config,
            candidates: Vec::new(),
            emitter: Arc::new(NoOpTracingEmitter),
        }
    }

    /// Replaces the configuration, keeping the stages added so far.
    #[must_use]
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the arity policy.
    #[must_use]
    pub fn arity_policy(mut self, policy: ArityPolicy) -> Self {
        self.config.arity_policy = policy;
        self
    }

    /// Sets the span emitter used by the built pipeline.
    #[must_use]
    pub fn emitter(mut self, emitter: Arc<dyn TracingEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// Appends a function or closure as the next stage.
    #[must_use]
    pub fn stage<Args>(self, stage: impl IntoStage<Args>) -> Self {
        self.boxed_stage(stage.into_stage())
    }

    /// Appends a function or closure under an explicit name.
    #[must_use]
    pub fn named_stage<Args>(self, name: impl Into<String>, stage: impl IntoStage<Args>) -> Self {
        self.boxed_stage(stage.into_named_stage(name))
    }

    /// Appends an already-built stage. A [`Pipeline`] can be appended this way.
    #[must_use]
    pub fn boxed_stage(mut self, stage: BoxedStage) -> Self {
        self.candidates.push(Candidate::Stage(stage));
        self
    }

    /// Appends a type-erased candidate.
    ///
    /// The value must hold a [`BoxedStage`] or a [`Pipeline`]; anything else
    /// makes [`build`](Self::build) fail with `CONTRACT-PIPE-NOT_CALLABLE`.
    #[must_use]
    pub fn candidate(mut self, candidate: Value) -> Self {
        self.candidates.push(Candidate::Erased(candidate));
        self
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns the number of stages added so far.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.candidates.len()
    }

    /// Builds the pipeline.
    ///
    /// An empty builder is valid and yields a pipeline that returns its arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, a candidate is not
    /// callable, or two adjacent stages are statically incompatible.
    pub fn build(self) -> Result<Pipeline, PipelineValidationError> {
        self.config.validate()?;

        let stages = self
            .candidates
            .into_iter()
            .enumerate()
            .map(|(position, candidate)| resolve(position, candidate))
            .collect::<Result<Vec<_>, _>>()?;

        if self.config.validate_types {
            check_adjacent(&stages, self.config.arity_policy)?;
        }

        tracing::debug!(
            pipeline = %self.config.name,
            stages = stages.len(),
            arity_policy = ?self.config.arity_policy,
            "Built pipeline"
        );
        Ok(Pipeline::new(self.config, stages, self.emitter))
    }
}

fn resolve(position: usize, candidate: Candidate) -> Result<BoxedStage, PipelineValidationError> {
    let value = match candidate {
        Candidate::Stage(stage) => return Ok(stage),
        Candidate::Erased(value) => value,
    };
    let value = match value.take::<BoxedStage>() {
        Ok(stage) => return Ok(stage),
        Err(value) => value,
    };
    match value.take::<Pipeline>() {
        Ok(pipeline) => Ok(Arc::new(pipeline)),
        Err(value) => Err(PipelineValidationError::not_callable(
            position,
            value.type_name(),
        )),
    }
}

/// Checks every producer/consumer pair whose output types are known.
fn check_adjacent(stages: &[BoxedStage], policy: ArityPolicy) -> Result<(), PipelineValidationError> {
    for (index, pair) in stages.windows(2).enumerate() {
        let (producer, consumer) = (&pair[0], &pair[1]);
        let Some(produced) = producer.signature().outputs() else {
            continue;
        };
        let expected = consumer.signature().inputs();
        let position = index + 1;

        if policy == ArityPolicy::Exact && produced.len() != expected.len() {
            return Err(PipelineValidationError::arity_mismatch(
                position,
                producer.name(),
                consumer.name(),
                produced.len(),
                expected.len(),
            ));
        }

        for (input, (out, param)) in produced.iter().zip(expected).enumerate() {
            if out.is_dynamic() || param.accepts(*out) {
                continue;
            }
            return Err(PipelineValidationError::incompatible_stages(
                position,
                producer.name(),
                consumer.name(),
                input,
                *out,
                *param,
            ));
        }
    }
    Ok(())
}

/// Builds a pipeline from type-erased candidates with the default configuration.
///
/// # Errors
///
/// Returns `CONTRACT-PIPE-NOT_CALLABLE` for the first candidate that holds
/// neither a [`BoxedStage`] nor a [`Pipeline`], or a type error between
/// adjacent stages.
pub fn pipe(stages: impl IntoIterator<Item = Value>) -> Result<Pipeline, PipelineValidationError> {
    stages
        .into_iter()
        .fold(PipelineBuilder::default(), PipelineBuilder::candidate)
        .build()
}

/// Builds a pipeline from functions and closures.
///
/// ```rust,ignore
/// let pipeline = pipe![sum, double, show]?;
/// ```
#[macro_export]
macro_rules! pipe {
    ($($stage:expr),* $(,)?) => {
        $crate::pipeline::PipelineBuilder::default()
            $(.stage($stage))*
            .build()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TypeInfo;
    use crate::observability::LoggingTracingEmitter;
    use pretty_assertions::assert_eq;

    fn trim(s: String) -> String {
        s.trim().to_string()
    }

    fn upper(s: String) -> String {
        s.to_uppercase()
    }

    #[test]
    fn test_builder_creation() {
        let builder = PipelineBuilder::new("text");
        assert_eq!(builder.name(), "text");
        assert_eq!(builder.stage_count(), 0);
    }

    #[test]
    fn test_builder_add_stages() {
        let builder = PipelineBuilder::new("text").stage(trim).stage(upper);
        assert_eq!(builder.stage_count(), 2);

        let pipeline = builder.build().unwrap();
        assert_eq!(pipeline.stage_count(), 2);
        assert_eq!(pipeline.name(), "text");
    }

    #[test]
    fn test_builder_empty_pipeline_is_valid() {
        let pipeline = PipelineBuilder::new("empty").build().unwrap();
        assert_eq!(pipeline.stage_count(), 0);
        assert_eq!(pipeline.expected_inputs(), 0);
    }

    #[test]
    fn test_builder_rejects_blank_name() {
        let err = PipelineBuilder::new(" ").stage(trim).build().unwrap_err();
        assert!(err.message.contains("name"));
    }

    #[test]
    fn test_named_stage() {
        let pipeline = PipelineBuilder::new("text")
            .named_stage("trim", trim)
            .named_stage("upper", upper)
            .build()
            .unwrap();
        assert_eq!(pipeline.stage_names(), vec!["trim", "upper"]);
    }

    #[test]
    fn test_not_callable_candidate() {
        let err = PipelineBuilder::new("bad")
            .candidate(Value::new(trim.into_stage()))
            .candidate(Value::new(42_i32))
            .build()
            .unwrap_err();

        assert_eq!(err.code(), Some("CONTRACT-PIPE-NOT_CALLABLE"));
        assert_eq!(err.position, Some(1));
        assert!(err.message.contains("i32"));
    }

    #[test]
    fn test_erased_pipeline_candidate() {
        let inner = PipelineBuilder::new("inner").stage(trim).build().unwrap();
        let pipeline = pipe([Value::new(inner), Value::new(upper.into_stage())]).unwrap();

        assert_eq!(pipeline.stage_names()[0], "inner");
        let output = pipeline.call(crate::args!["  go ".to_string()]).unwrap();
        assert_eq!(output.get::<String>(), Some("GO".to_string()));
    }

    #[test]
    fn test_incompatible_adjacent_stages() {
        let err = PipelineBuilder::new("bad")
            .named_stage("trim", trim)
            .named_stage("half", |n: i32| n / 2)
            .build()
            .unwrap_err();

        assert_eq!(err.code(), Some("CONTRACT-PIPE-TYPE_MISMATCH"));
        assert_eq!(err.position, Some(1));
        assert_eq!(err.stages, vec!["trim".to_string(), "half".to_string()]);
        let info = err.error_info.unwrap();
        assert_eq!(info.context.get("produced"), Some(&TypeInfo::of::<String>().name().to_string()));
        assert_eq!(info.context.get("expected"), Some(&"i32".to_string()));
    }

    #[test]
    fn test_type_validation_can_be_disabled() {
        let pipeline = PipelineBuilder::with_config(
            PipelineConfig::new("lenient").with_type_validation(false),
        )
        .stage(trim)
        .stage(|n: i32| n / 2)
        .build();
        assert!(pipeline.is_ok());
    }

    #[test]
    fn test_dynamic_consumer_accepts_anything() {
        let pipeline = PipelineBuilder::new("dynamic")
            .stage(trim)
            .stage(|v: Value| v.type_name().len())
            .build();
        assert!(pipeline.is_ok());
    }

    #[test]
    fn test_exact_policy_checks_counts() {
        let err = PipelineBuilder::new("exact")
            .arity_policy(ArityPolicy::Exact)
            .named_stage("trim", trim)
            .named_stage("repeat", |s: String, n: usize| s.repeat(n))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), Some("CONTRACT-PIPE-ARITY"));

        let fallback = PipelineBuilder::new("fallback")
            .stage(trim)
            .stage(|s: String, n: usize| s.repeat(n))
            .build();
        assert!(fallback.is_ok());
    }

    #[test]
    fn test_pipe_macro() {
        let pipeline = crate::pipe![trim, upper].unwrap();
        let output = pipeline.call(crate::args![" x ".to_string()]).unwrap();
        assert_eq!(output.get::<String>(), Some("X".to_string()));
    }

    #[test]
    fn test_config_replacement_keeps_stages() {
        let builder = PipelineBuilder::new("a")
            .stage(trim)
            .emitter(Arc::new(LoggingTracingEmitter))
            .config(PipelineConfig::new("b"));
        assert_eq!(builder.name(), "b");
        assert_eq!(builder.stage_count(), 1);
    }
}
